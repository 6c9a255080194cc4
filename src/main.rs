use std::{path::PathBuf, sync::Arc};

use anyhow::Result;
use clap::Parser;
use tally::{
    app::App,
    domain::repository::ConfigRepository,
    repl::{handlers, io::ConsoleIo, io::LineIo, Repl},
    storage,
    utils::{
        clock::DefaultClock,
        dir::create_application_default_path,
        logging::enable_logging,
    },
};
use tracing::level_filters::LevelFilter;

#[derive(Parser, Debug)]
#[command(name = "Tally", version, long_about = None)]
#[command(about = "Interactive command-line tracker for daily work quotas", long_about = None)]
struct Args {
    #[arg(
        long,
        help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
    #[arg(long = "log-filter", help = "Overrides the configured log level")]
    log: Option<LevelFilter>,
    /// This option is for debugging purposes only.
    #[arg(long = "log-console")]
    log_console: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let dir = args.dir.map_or_else(create_application_default_path, Ok)?;

    let store = storage::open(&dir, Box::new(DefaultClock)).await?;
    enable_logging(&dir, args.log, &store.config.log_level(), args.log_console)?;

    let app = Arc::new(App::new(
        Box::new(store.config),
        Box::new(store.records),
        Box::new(store.track),
        Box::new(store.stats),
        Box::new(DefaultClock),
    ));

    let mux = handlers::register(app.clone());
    let io: Arc<dyn LineIo> = Arc::new(ConsoleIo::new());

    Repl::new(app, mux, io, "exit").run().await
}
