mod command;
mod shell;

pub use command::{Command, Outcome};
pub use shell::{Shell, ShellError};
