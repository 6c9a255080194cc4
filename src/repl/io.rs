use std::{
    io::Write,
    sync::Mutex,
};

use ansi_term::Colour::{Green, Red};
use ansi_term::Style;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

/// Line-oriented surface between the dispatch loop and the terminal.
#[async_trait]
pub trait LineIo: Send + Sync {
    /// Next input line. Errors once input is closed.
    async fn read(&self) -> Result<String>;
    /// Reads one line under an inline prompt. Background prompt rewrites are
    /// suppressed for the duration so they can't clobber the question.
    async fn read_with_prompt(&self, prompt: &str) -> Result<String>;
    async fn write(&self, line: &str) -> Result<()>;
    async fn set_prompt(&self, prompt: &str) -> Result<()>;
}

pub async fn print_info(io: &dyn LineIo, msg: &str) {
    let _ = io.write(&Green.paint(msg).to_string()).await;
}

pub async fn print_error(io: &dyn LineIo, err: &anyhow::Error) {
    let _ = io.write(&Red.paint(format!("{err:#}")).to_string()).await;
}

pub async fn print_highlighted(io: &dyn LineIo, msg: &str) {
    let _ = io.write(&Style::new().bold().paint(msg).to_string()).await;
}

pub async fn print_plain(io: &dyn LineIo, msg: &str) {
    let _ = io.write(msg).await;
}

struct PromptState {
    prompt: String,
    suppressed: bool,
}

/// Console implementation. The prompt line is rewritten in place; output
/// lines clear it first and repaint it after.
pub struct ConsoleIo {
    state: Mutex<PromptState>,
    reader: tokio::sync::Mutex<Lines<BufReader<Stdin>>>,
}

impl ConsoleIo {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(PromptState {
                prompt: String::new(),
                suppressed: false,
            }),
            reader: tokio::sync::Mutex::new(BufReader::new(tokio::io::stdin()).lines()),
        }
    }

    fn paint_line(&self, line: &str) {
        let mut stdout = std::io::stdout().lock();
        let _ = write!(stdout, "\r\x1b[2K{line}");
        let _ = stdout.flush();
    }
}

impl Default for ConsoleIo {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LineIo for ConsoleIo {
    async fn read(&self) -> Result<String> {
        let mut reader = self.reader.lock().await;
        reader
            .next_line()
            .await?
            .ok_or_else(|| anyhow!("input closed"))
    }

    async fn read_with_prompt(&self, prompt: &str) -> Result<String> {
        {
            let mut state = self.state.lock().unwrap();
            state.suppressed = true;
            self.paint_line(prompt);
        }

        let result = self.read().await;

        self.state.lock().unwrap().suppressed = false;
        result
    }

    async fn write(&self, line: &str) -> Result<()> {
        let state = self.state.lock().unwrap();
        {
            let mut stdout = std::io::stdout().lock();
            let _ = writeln!(stdout, "\r\x1b[2K{line}");
        }
        if !state.suppressed {
            self.paint_line(&state.prompt);
        }
        Ok(())
    }

    async fn set_prompt(&self, prompt: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.prompt = prompt.to_string();
        if !state.suppressed {
            self.paint_line(&state.prompt);
        }
        Ok(())
    }
}
