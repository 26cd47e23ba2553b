//! Line-oriented input helpers that re-prompt until they get a usable value.

use std::io::{BufRead, Write};
use std::str::FromStr;

use crate::error::{Error, Result};

/// An input/output pair used by the interactive shell.
///
/// Every prompt fails with [`Error::InputClosed`] once the input is exhausted.
#[derive(Debug)]
pub struct Console<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    /// Wrap an input and an output.
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// The output side, for rendering tables and messages.
    pub fn output(&mut self) -> &mut W {
        &mut self.output
    }

    /// Write a line to the output.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the output cannot be written.
    pub fn say(&mut self, message: impl std::fmt::Display) -> Result<()> {
        writeln!(self.output, "{message}")?;
        Ok(())
    }

    fn ask(&mut self, prompt: &str) -> Result<()> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;
        Ok(())
    }

    fn read_line(&mut self) -> Result<String> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(Error::InputClosed);
        }
        let trimmed = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed);
        Ok(line)
    }

    /// Prompt for a whole line of free text, e.g. a passenger name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InputClosed`] at end of input.
    pub fn prompt_line(&mut self, prompt: &str) -> Result<String> {
        self.ask(prompt)?;
        self.read_line()
    }

    /// Prompt for a single whitespace-free word. Blank lines are skipped and
    /// anything after the first word is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InputClosed`] at end of input.
    pub fn prompt_word(&mut self, prompt: &str) -> Result<String> {
        self.ask(prompt)?;
        loop {
            if let Some(word) = self.read_line()?.split_whitespace().next() {
                return Ok(word.to_string());
            }
        }
    }

    fn prompt_number<T: FromStr>(&mut self, prompt: &str) -> Result<T> {
        self.ask(prompt)?;
        loop {
            let line = self.read_line()?;
            if let Some(value) = line.split_whitespace().next().and_then(|w| w.parse().ok()) {
                return Ok(value);
            }
            self.ask("Invalid input. Please enter a valid number: ")?;
        }
    }

    /// Prompt for an integer, re-asking until one is entered.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InputClosed`] at end of input.
    pub fn prompt_integer(&mut self, prompt: &str) -> Result<i64> {
        self.prompt_number(prompt)
    }

    /// Prompt for a reservation code (a non-negative integer).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InputClosed`] at end of input.
    pub fn prompt_code(&mut self, prompt: &str) -> Result<u64> {
        self.prompt_number(prompt)
    }

    /// Prompt for a positive integer, re-asking on zero or negative values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InputClosed`] at end of input.
    pub fn prompt_positive_integer(&mut self, prompt: &str, complaint: &str) -> Result<i64> {
        loop {
            let value = self.prompt_integer(prompt)?;
            if value > 0 {
                return Ok(value);
            }
            self.say(complaint)?;
        }
    }

    /// Prompt for a positive, finite price.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InputClosed`] at end of input.
    pub fn prompt_price(&mut self, prompt: &str) -> Result<f32> {
        self.ask(prompt)?;
        loop {
            let line = self.read_line()?;
            match line
                .split_whitespace()
                .next()
                .and_then(|w| w.parse::<f32>().ok())
                .filter(|v| v.is_finite())
            {
                Some(value) if value > 0.0 => return Ok(value),
                Some(_) => {
                    self.say("Value must be positive. Please re-enter.")?;
                    self.ask(prompt)?;
                }
                None => self.ask("Invalid input. Please enter a valid price (e.g., 4500.00): ")?,
            }
        }
    }
}
