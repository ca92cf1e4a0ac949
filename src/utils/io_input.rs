use crate::utils::logging::PLAIN;
use anyhow::Context;
use dialoguer::console::{style, Term};
use std::io::stdin;
use tracing::info;

/// Phrases that end an interactive session.
const QUIT_PHRASES: [&str; 2] = ["exit", "quit"];

pub trait InputSource: Send + 'static {
    /// Next non-empty line, or `None` when the session is over.
    fn next(&mut self) -> anyhow::Result<Option<String>>;
}

pub(crate) fn is_quit_phrase(line: &str) -> bool {
    QUIT_PHRASES
        .iter()
        .any(|phrase| line.trim().eq_ignore_ascii_case(phrase))
}

pub struct StdinInputSource;

impl InputSource for StdinInputSource {
    fn next(&mut self) -> anyhow::Result<Option<String>> {
        let term = Term::stdout();

        loop {
            info!(target: PLAIN,
                "{}\n> ",
                style("User").cyan().bold()
            );

            // Put the cursor back onto the "> " spot
            term.move_cursor_up(1).context("Failed to move cursor up")?;
            term.move_cursor_right(2)
                .context("Failed to move cursor right")?;

            let mut line = String::new();
            let read = stdin().read_line(&mut line).context("Failed to read stdin")?;
            if read == 0 {
                return Ok(None);
            }

            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if is_quit_phrase(line) {
                return Ok(None);
            }
            return Ok(Some(line.to_string()));
        }
    }
}

pub struct VecInputSource {
    buf: std::vec::IntoIter<String>,
}

impl VecInputSource {
    pub fn new(lines: Vec<String>) -> Self {
        Self {
            buf: lines.into_iter(),
        }
    }
}

impl InputSource for VecInputSource {
    fn next(&mut self) -> anyhow::Result<Option<String>> {
        for line in self.buf.by_ref() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if is_quit_phrase(line) {
                return Ok(None);
            }
            return Ok(Some(line.to_string()));
        }
        Ok(None)
    }
}
