use std::io;

use snafu::Snafu;
use snafu::prelude::*;
use tracing::{debug, info};

use crate::application::RuntimeConfig;
use crate::commands::{Shell, ShellError};
use crate::config::{ShellConfig, ShellConfigError};
use crate::filesystem::DirectoryTree;

pub struct Application;

impl Application {
    pub async fn run(app_config: impl Into<RuntimeConfig>) -> Result<(), ApplicationError> {
        let app_config: RuntimeConfig = app_config.into();
        let file_config = ShellConfig::read(&app_config.config_path)
            .await
            .context(ConfigSnafu)?;
        let config = app_config.override_config(file_config);
        debug!("Effective config: {:?}", config);

        let tree = DirectoryTree::new(config.max_children);
        info!(
            "Tree ready, at most {} entries per directory",
            tree.max_children()
        );

        let color = supports_color::on(supports_color::Stream::Stdout).is_some();
        let mut shell = Shell::new(tree, config.prompt).with_color(color);
        shell
            .run(io::stdin().lock(), &mut io::stdout().lock())
            .context(SessionSnafu)?;
        debug!(
            "Session ended in {}",
            shell.tree().present_working_directory()
        );

        Ok(())
    }
}

#[derive(Debug, Snafu)]
pub enum ApplicationError {
    #[snafu(display("Critical failure encountered during configuration stage"))]
    ConfigError { source: ShellConfigError },
    #[snafu(display("Critical failure encountered during the shell session"))]
    SessionError { source: ShellError },
}
