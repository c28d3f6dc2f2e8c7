use std::num::NonZeroUsize;
use std::path::PathBuf;

use clap::Parser;

use crate::application::data::LogLevel;
use crate::config::CONFIG_FILE_NAME;

/// Shell-like session over an in-memory directory tree
#[derive(Parser, Debug, Clone)]
#[command(version)]
pub struct Cli {
    #[clap(long, short, default_value = "warn", value_enum)]
    pub log_level: LogLevel,

    /// YAML file holding the shell settings
    #[clap(long, short, default_value = CONFIG_FILE_NAME)]
    pub config: PathBuf,

    /// Maximum number of entries per directory, overrides the config file
    #[clap(long, short)]
    pub max_children: Option<NonZeroUsize>,

    /// Text shown before every command, overrides the config file
    #[clap(long, short)]
    pub prompt: Option<String>,
}
