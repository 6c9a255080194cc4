use std::{collections::HashMap, future::Future, pin::Pin, sync::Arc, time::Duration};

use anyhow::Result;
use tokio::time::timeout;
use tracing::warn;

use super::io::{print_error, print_highlighted, print_plain, LineIo};

/// Commands run to completion or get abandoned; this bounds how long the
/// loop waits before giving the prompt back.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

/// One parsed input line: the verb plus its inline `;`-separated argument
/// values, later bound to names by the mux.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    verb: String,
    inline: Vec<String>,
    args: HashMap<String, String>,
}

impl Request {
    pub fn parse(line: &str) -> Self {
        let mut parts = line.split(';');
        let verb = parts.next().unwrap_or_default().trim().to_string();
        let inline = parts.map(|s| s.trim().to_string()).collect();

        Self {
            verb,
            inline,
            args: HashMap::new(),
        }
    }

    pub fn verb(&self) -> &str {
        &self.verb
    }

    pub fn arg(&self, name: &str) -> Option<&str> {
        self.args.get(name).map(String::as_str)
    }

    fn set_arg(&mut self, name: &str, value: String) {
        self.args.insert(name.to_string(), value);
    }
}

pub type CommandFuture = Pin<Box<dyn Future<Output = ()> + Send>>;
pub type CommandFn = Box<dyn Fn(Request, Arc<dyn LineIo>) -> CommandFuture + Send + Sync>;

struct Entry {
    run: CommandFn,
    arg_names: &'static [&'static str],
    help: &'static str,
}

/// Verb lookup table driving the dispatch loop. `help` is built in.
pub struct Mux {
    entries: HashMap<&'static str, Entry>,
}

impl Mux {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn handle(
        &mut self,
        verb: &'static str,
        arg_names: &'static [&'static str],
        help: &'static str,
        run: CommandFn,
    ) {
        if self.entries.insert(verb, Entry { run, arg_names, help }).is_some() {
            panic!("handler for verb {verb} already exists");
        }
    }

    /// Resolves and executes one request. Never fails the session: problems
    /// are printed and the loop goes on.
    pub async fn serve(&self, mut req: Request, io: &Arc<dyn LineIo>) {
        if req.verb() == "help" {
            self.help(io.as_ref()).await;
            return;
        }

        let Some(entry) = self.entries.get(req.verb()) else {
            print_error(
                io.as_ref(),
                &anyhow::anyhow!("command not found: {}", req.verb()),
            )
            .await;
            return;
        };

        if let Err(e) = bind_args(&mut req, entry.arg_names, io.as_ref()).await {
            print_error(io.as_ref(), &e).await;
            return;
        }

        if timeout(COMMAND_TIMEOUT, (entry.run)(req, io.clone()))
            .await
            .is_err()
        {
            warn!("command exceeded {COMMAND_TIMEOUT:?}");
            print_error(io.as_ref(), &anyhow::anyhow!("command timed out")).await;
        }
    }

    async fn help(&self, io: &dyn LineIo) {
        print_highlighted(io, "Command list").await;

        let mut verbs: Vec<_> = self.entries.keys().copied().collect();
        verbs.sort_unstable();

        for (i, verb) in verbs.into_iter().enumerate() {
            let help = self.entries[verb].help;
            print_plain(io, &format!("{i}. {{{{ {verb} }}}} : {help}")).await;
        }
    }
}

impl Default for Mux {
    fn default() -> Self {
        Self::new()
    }
}

/// Binds inline values to argument names in order, then asks for whatever is
/// still missing.
async fn bind_args(req: &mut Request, names: &[&str], io: &dyn LineIo) -> Result<()> {
    let inline = req.inline.clone();

    for (&name, value) in names.iter().zip(inline.iter()) {
        req.set_arg(name, value.clone());
    }

    for &name in names.iter().skip(inline.len()) {
        let value = io.read_with_prompt(&format!("- {name}: ")).await?;
        req.set_arg(name, value.trim().to_string());
    }

    Ok(())
}
