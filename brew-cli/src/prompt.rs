//! Interactive terminal prompts
//!
//! Prompts block until the user answers. End of input counts as declining.

use std::fmt::Display;
use std::io::{self, BufRead, Write};

use anyhow::{bail, Context};
use brew_detect::{ConnectSignal, DetectError, DiscoveryStep};

pub struct Prompt<R, W> {
    input: R,
    output: W,
}

impl Prompt<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Prompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Print a line of output
    pub fn say(&mut self, message: impl Display) -> io::Result<()> {
        writeln!(self.output, "{message}")
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Ask a yes/no question; anything but "y" or "yes" is a no
    pub fn confirm(&mut self, question: &str) -> io::Result<bool> {
        write!(self.output, "{question} (y/n): ")?;
        let answer = self.read_line()?.unwrap_or_default().to_ascii_lowercase();
        Ok(matches!(answer.as_str(), "y" | "yes"))
    }

    /// Show a numbered menu and return the index of the chosen item
    pub fn choose<T: Display>(&mut self, title: &str, items: &[T]) -> anyhow::Result<usize> {
        if items.is_empty() {
            bail!("Nothing to choose from for \"{}\"", title.trim_end_matches(':'));
        }

        writeln!(self.output, "\n{title}")?;
        for (idx, item) in items.iter().enumerate() {
            writeln!(self.output, "{}. {}", idx + 1, item)?;
        }

        loop {
            write!(self.output, "\nEnter the number of your choice: ")?;
            let Some(answer) = self.read_line()? else {
                bail!("No selection made");
            };
            match answer.parse::<usize>() {
                Ok(n) if (1..=items.len()).contains(&n) => return Ok(n - 1),
                _ => writeln!(
                    self.output,
                    "Please enter a number between 1 and {}",
                    items.len()
                )
                .context("Failed to write prompt")?,
            }
        }
    }

    /// Wait for Enter
    fn pause(&mut self, message: &str) -> io::Result<bool> {
        write!(self.output, "{message}")?;
        Ok(self.read_line()?.is_some())
    }
}

impl<R: BufRead, W: Write> ConnectSignal for Prompt<R, W> {
    fn wait_for(&mut self, step: DiscoveryStep) -> Result<(), DetectError> {
        let message = match step {
            DiscoveryStep::Disconnect => {
                "\nPlease disconnect the device to flash (if it is connected), then press Enter..."
            }
            DiscoveryStep::Connect => "Please connect the device to flash, then press Enter...",
        };
        match self.pause(message) {
            Ok(true) => Ok(()),
            Ok(false) => Err(DetectError::Aborted("input closed".to_string())),
            Err(e) => Err(DetectError::Aborted(e.to_string())),
        }
    }
}
