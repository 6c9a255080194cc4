use std::{future::Future, sync::Arc};

use crate::{
    app::App,
    domain::time::{format_duration, parse_clock_time, parse_duration, resolve_date_token},
};

use super::{
    io::{print_error, print_highlighted, print_info, print_plain, LineIo},
    mux::{Mux, Request},
};

/// Registers every command verb. Help text doubles as the `help` listing.
pub fn register(app: Arc<App>) -> Mux {
    let mut mux = Mux::new();

    route(&mut mux, &app, "add", &["Hours"], "Adds a new task record.", add_record);
    route(&mut mux, &app, "rec", &[], "Starts a new time recorder.", start_record);
    route(
        &mut mux,
        &app,
        "rec at",
        &["At"],
        "Starts a time recorder at a specific hour.",
        start_record_at,
    );
    route(
        &mut mux,
        &app,
        "end",
        &[],
        "Ends the current time recorder, the spent time is calculated from the initial time.",
        stop_record,
    );
    route(
        &mut mux,
        &app,
        "end at",
        &["At"],
        "Similar to end but you can set the hour when the time recorder ended.",
        stop_record_at,
    );
    route(
        &mut mux,
        &app,
        "drop",
        &[],
        "Drops the current working time recorder, all the information will be lost.",
        drop_record,
    );
    route(
        &mut mux,
        &app,
        "commit",
        &["Amount"],
        "Commits all the pending time on the current date against the daily quota.",
        commit_all,
    );
    route(
        &mut mux,
        &app,
        "send pool",
        &[],
        "Sends all the pending time to the pool.",
        send_to_pool,
    );
    route(
        &mut mux,
        &app,
        "poure",
        &[],
        "Poures all the time on the pool to the current date.",
        pour_pool,
    );
    route(
        &mut mux,
        &app,
        "list",
        &[],
        "Lists all the records on the current date.",
        list_local,
    );
    route(
        &mut mux,
        &app,
        "change date",
        &["Date"],
        "Changes the current working date.",
        change_date,
    );
    route(
        &mut mux,
        &app,
        "debt",
        &[],
        "Shows the accumulated debt by day.",
        get_debt,
    );

    mux
}

fn route<F, Fut>(
    mux: &mut Mux,
    app: &Arc<App>,
    verb: &'static str,
    arg_names: &'static [&'static str],
    help: &'static str,
    handler: F,
) where
    F: Fn(Arc<App>, Request, Arc<dyn LineIo>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let app = app.clone();
    mux.handle(
        verb,
        arg_names,
        help,
        Box::new(move |req, io| Box::pin(handler(app.clone(), req, io))),
    );
}

async fn add_record(app: Arc<App>, req: Request, io: Arc<dyn LineIo>) {
    let hours = match parse_duration(req.arg("Hours").unwrap_or_default()) {
        Ok(hours) => hours,
        Err(e) => return print_error(io.as_ref(), &e.into()).await,
    };

    match app.add_record(hours).await {
        Ok(()) => print_info(io.as_ref(), &format!("{hours:.2} hours inserted!")).await,
        Err(e) => print_error(io.as_ref(), &e).await,
    }
}

async fn start_record(app: Arc<App>, _req: Request, io: Arc<dyn LineIo>) {
    match app.start_record().await {
        Ok(()) => print_info(io.as_ref(), "Record started!").await,
        Err(e) => print_error(io.as_ref(), &e).await,
    }
}

async fn start_record_at(app: Arc<App>, req: Request, io: Arc<dyn LineIo>) {
    let at = match parse_clock_time(req.arg("At").unwrap_or_default()) {
        Ok(at) => at,
        Err(e) => return print_error(io.as_ref(), &e.into()).await,
    };

    match app.start_record_at(at).await {
        Ok(()) => {
            print_info(io.as_ref(), &format!("Record started at {}!", at.format("%H:%M"))).await
        }
        Err(e) => print_error(io.as_ref(), &e).await,
    }
}

async fn stop_record(app: Arc<App>, _req: Request, io: Arc<dyn LineIo>) {
    match app.stop_record().await {
        Ok(hours) => print_info(io.as_ref(), &format!("{hours:.2} hours inserted!")).await,
        Err(e) => print_error(io.as_ref(), &e).await,
    }
}

async fn stop_record_at(app: Arc<App>, req: Request, io: Arc<dyn LineIo>) {
    let at = match parse_clock_time(req.arg("At").unwrap_or_default()) {
        Ok(at) => at,
        Err(e) => return print_error(io.as_ref(), &e.into()).await,
    };

    match app.stop_record_at(at).await {
        Ok(hours) => print_info(io.as_ref(), &format!("{hours:.2} hours inserted!")).await,
        Err(e) => print_error(io.as_ref(), &e).await,
    }
}

async fn drop_record(app: Arc<App>, _req: Request, io: Arc<dyn LineIo>) {
    match app.drop_record().await {
        Ok(hours) => print_info(io.as_ref(), &format!("{hours:.2} hours dropped!")).await,
        Err(e) => print_error(io.as_ref(), &e).await,
    }
}

async fn commit_all(app: Arc<App>, req: Request, io: Arc<dyn LineIo>) {
    // an absent or unreadable amount falls back to the configured quota
    let amount = req
        .arg("Amount")
        .and_then(|value| value.parse::<f64>().ok());

    match app.commit_all(amount).await {
        Ok(()) => print_info(io.as_ref(), "Records committed!").await,
        Err(e) => print_error(io.as_ref(), &e).await,
    }
}

async fn send_to_pool(app: Arc<App>, _req: Request, io: Arc<dyn LineIo>) {
    match app.send_to_pool().await {
        Ok(()) => print_info(io.as_ref(), "Records saved to pool!").await,
        Err(e) => print_error(io.as_ref(), &e).await,
    }
}

async fn pour_pool(app: Arc<App>, _req: Request, io: Arc<dyn LineIo>) {
    match app.pour_pool().await {
        Ok(()) => print_info(io.as_ref(), "Pool poured!").await,
        Err(e) => print_error(io.as_ref(), &e).await,
    }
}

async fn list_local(app: Arc<App>, _req: Request, io: Arc<dyn LineIo>) {
    let list = match app.list_local().await {
        Ok(list) => list,
        Err(e) => return print_error(io.as_ref(), &e).await,
    };

    if list.is_empty() {
        print_info(io.as_ref(), "No records found").await;
        return;
    }

    print_highlighted(io.as_ref(), "Result").await;
    for (i, line) in list.iter().enumerate() {
        print_plain(io.as_ref(), &format!("{}. {line}", i + 1)).await;
    }
}

async fn change_date(app: Arc<App>, req: Request, io: Arc<dyn LineIo>) {
    let date = match resolve_date_token(req.arg("Date").unwrap_or_default(), app.now()) {
        Ok(date) => date,
        Err(e) => return print_error(io.as_ref(), &e.into()).await,
    };

    app.change_date(date);
    print_info(io.as_ref(), "Date changed!").await;
}

async fn get_debt(app: Arc<App>, _req: Request, io: Arc<dyn LineIo>) {
    let debt = match app.get_debt().await {
        Ok(debt) => debt,
        Err(e) => return print_error(io.as_ref(), &e).await,
    };

    if debt.is_empty() {
        print_info(io.as_ref(), "No debt found").await;
        return;
    }

    print_highlighted(io.as_ref(), "Result").await;
    for (date, hours) in debt.iter() {
        print_plain(
            io.as_ref(),
            &format!("{}: {}", date.format("%Y-%m-%d"), format_duration(*hours)),
        )
        .await;
    }
    print_plain(
        io.as_ref(),
        &format!("Total debt: {}", format_duration(debt.total())),
    )
    .await;
}
