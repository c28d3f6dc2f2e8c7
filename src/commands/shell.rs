use std::io::{BufRead, Write};

use colored::Colorize;
use snafu::{ResultExt, Snafu};
use tracing::{debug, info, warn};

use crate::commands::{Command, Outcome};
use crate::filesystem::DirectoryTree;

const GREETING: &str = "Starting tree shell.";
const FAREWELL: &str = "Program terminating normally";

/// Interactive loop reading commands line by line and running them against
/// one tree for the whole session.
pub struct Shell {
    tree: DirectoryTree,
    prompt: String,
    color: bool,
}

impl Shell {
    pub fn new(tree: DirectoryTree, prompt: impl Into<String>) -> Self {
        Self {
            tree,
            prompt: prompt.into(),
            color: false,
        }
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn tree(&self) -> &DirectoryTree {
        &self.tree
    }

    /// Runs until `exit` or end of input. Command failures are reported on
    /// `output` and the session goes on; only I/O failures end it early.
    pub fn run(&mut self, mut input: impl BufRead, output: &mut impl Write) -> Result<(), ShellError> {
        writeln!(output, "{GREETING}").context(WriteSnafu)?;

        let mut line = String::new();
        loop {
            write!(output, "{}", self.prompt).context(WriteSnafu)?;
            output.flush().context(WriteSnafu)?;

            line.clear();
            if input.read_line(&mut line).context(ReadSnafu)? == 0 {
                info!("End of input reached, leaving the shell");
                return Ok(());
            }
            if line.trim().is_empty() {
                continue;
            }

            let result = Command::try_from(line.as_str())
                .and_then(|command| command.execute(&mut self.tree));
            match result {
                Ok(Outcome::Silent) => {}
                Ok(Outcome::Print(text)) => {
                    if !text.is_empty() {
                        writeln!(output, "{text}").context(WriteSnafu)?;
                    }
                }
                Ok(Outcome::Exit) => {
                    writeln!(output, "{FAREWELL}").context(WriteSnafu)?;
                    return Ok(());
                }
                Err(err) => {
                    debug!("Command '{}' failed: {:?}", line.trim(), err);
                    self.report(output, &err.to_string())?;
                }
            }
        }
    }

    fn report(&self, output: &mut impl Write, message: &str) -> Result<(), ShellError> {
        let written = if self.color {
            writeln!(output, "{} {}", "ERROR:".red().bold(), message)
        } else {
            writeln!(output, "ERROR: {message}")
        };
        written
            .inspect_err(|err| warn!("Failed to report error to the user: {}", err))
            .context(WriteSnafu)
    }
}

#[derive(Debug, Snafu)]
pub enum ShellError {
    #[snafu(display("Failed to read a command"))]
    ReadError { source: std::io::Error },
    #[snafu(display("Failed to write shell output"))]
    WriteError { source: std::io::Error },
}
