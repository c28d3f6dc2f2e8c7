use std::num::NonZeroUsize;
use std::path::PathBuf;

use crate::cli::Cli;
use crate::config::ShellConfig;

/// Settings given on the command line
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub config_path: PathBuf,
    pub max_children: Option<NonZeroUsize>,
    pub prompt: Option<String>,
}

impl RuntimeConfig {
    /// Command line values win over the ones from the config file
    pub fn override_config(&self, mut config: ShellConfig) -> ShellConfig {
        if let Some(max_children) = self.max_children {
            config.max_children = max_children.get();
        }
        if let Some(prompt) = &self.prompt {
            config.prompt = prompt.clone();
        }
        config
    }
}

impl From<Cli> for RuntimeConfig {
    fn from(cli: Cli) -> Self {
        Self {
            config_path: cli.config,
            max_children: cli.max_children,
            prompt: cli.prompt,
        }
    }
}
