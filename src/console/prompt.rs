//! Token-oriented terminal prompter.
//!
//! Input is consumed in two shapes: whitespace-delimited tokens (menu codes,
//! numbers) and rest-of-line text (names, units). A token read leaves the rest
//! of its line pending, so `1 2` on one line answers two consecutive prompts.
//! Text reads skip leading whitespace, including blank lines, first.

use std::io::{BufRead, Write};

use colored::Colorize;

use crate::core::errors::{RegistryError, Result};

const INVALID_CHOICE: &str = "Invalid choice. Please try again.";
const INVALID_NUMBER: &str = "Invalid number. Please try again.";

/// Prompt/answer channel over any reader and writer.
pub struct Prompter<R, W> {
    reader: R,
    writer: W,
    pending: String,
    color: bool,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    /// Uncolored prompter with nothing buffered.
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            pending: String::new(),
            color: false,
        }
    }

    /// Highlight warnings in red.
    #[must_use]
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Release the reader and writer.
    pub fn into_parts(self) -> (R, W) {
        (self.reader, self.writer)
    }

    /// Write a prompt without a newline and flush it.
    pub fn prompt(&mut self, text: &str) -> Result<()> {
        write!(self.writer, "{text}")?;
        self.writer.flush()?;
        Ok(())
    }

    /// Write one line.
    pub fn say(&mut self, line: &str) -> Result<()> {
        writeln!(self.writer, "{line}")?;
        Ok(())
    }

    /// Write one warning line.
    pub fn warn(&mut self, line: &str) -> Result<()> {
        if self.color {
            writeln!(self.writer, "{}", line.red())?;
        } else {
            writeln!(self.writer, "{line}")?;
        }
        Ok(())
    }

    /// Write a preformatted block verbatim.
    pub fn block(&mut self, text: &str) -> Result<()> {
        self.writer.write_all(text.as_bytes())?;
        self.writer.flush()?;
        Ok(())
    }

    /// Prompt and read the next whitespace-delimited token.
    pub fn ask_token(&mut self, prompt: &str) -> Result<String> {
        self.prompt(prompt)?;
        self.next_token()
    }

    /// Prompt and read the rest of a line, trimmed.
    pub fn ask_text(&mut self, prompt: &str) -> Result<String> {
        self.prompt(prompt)?;
        self.skip_whitespace()?;
        let line = std::mem::take(&mut self.pending);
        Ok(line.trim().to_string())
    }

    /// Prompt for a finite number, re-prompting on malformed input.
    pub fn ask_number(&mut self, prompt: &str) -> Result<f64> {
        loop {
            let token = self.ask_token(prompt)?;
            match token.parse::<f64>() {
                Ok(value) if value.is_finite() => return Ok(value),
                _ => self.warn(INVALID_NUMBER)?,
            }
        }
    }

    /// Prompt for a 1-based menu choice until `pick` accepts it.
    pub fn ask_choice<T>(&mut self, prompt: &str, pick: impl Fn(i64) -> Option<T>) -> Result<T> {
        loop {
            let token = self.ask_token(prompt)?;
            match token.parse::<i64>().ok().and_then(&pick) {
                Some(choice) => return Ok(choice),
                None => self.warn(INVALID_CHOICE)?,
            }
        }
    }

    fn next_token(&mut self) -> Result<String> {
        self.skip_whitespace()?;
        let end = self
            .pending
            .find(char::is_whitespace)
            .unwrap_or(self.pending.len());
        Ok(self.pending.drain(..end).collect())
    }

    /// Drop leading whitespace, pulling new lines until non-blank input is pending.
    fn skip_whitespace(&mut self) -> Result<()> {
        loop {
            let trimmed = self.pending.trim_start().len();
            let skip = self.pending.len() - trimmed;
            self.pending.replace_range(..skip, "");
            if !self.pending.is_empty() {
                return Ok(());
            }
            if self.reader.read_line(&mut self.pending)? == 0 {
                return Err(RegistryError::InputClosed);
            }
        }
    }
}
