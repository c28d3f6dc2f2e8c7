use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use compio::fs;
use hashlink::LinkedHashMap;
use saphyr::{LoadableYamlNode, Scalar, Yaml};
use snafu::prelude::*;
use tracing::{debug, info};

use crate::filesystem::DEFAULT_MAX_CHILDREN;

pub const CONFIG_FILE_NAME: &str = "treesh.yaml";

const MAX_CHILDREN_KEY: &str = "max_children";
const PROMPT_KEY: &str = "prompt";
const DEFAULT_PROMPT: &str = "[treesh]: $ ";

/// Settings read from `treesh.yaml`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    pub max_children: usize,
    pub prompt: String,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            max_children: DEFAULT_MAX_CHILDREN,
            prompt: DEFAULT_PROMPT.to_string(),
        }
    }
}

impl ShellConfig {
    /// Reads the config file at `path`. A missing file yields the defaults.
    pub async fn read(path: &Path) -> Result<Self, ShellConfigError> {
        debug!("Opening config file: {}", path.display());
        let bytes = match fs::read(path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!("No config file at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(err) => {
                return Err(err).context(ReadSnafu {
                    file_path: path.to_path_buf(),
                });
            }
        };
        debug!("Successfully read config file: {} bytes", bytes.len());

        let contents = String::from_utf8(bytes).context(EncodingSnafu {
            file_path: path.to_path_buf(),
        })?;
        contents.as_str().try_into()
    }

    fn parse_max_children(value: &Yaml) -> Result<usize, ShellConfigError> {
        match value {
            Yaml::Value(Scalar::Integer(n)) if *n >= 1 => usize::try_from(*n)
                .ok()
                .context(InvalidMaxChildrenSnafu {
                    value: n.to_string(),
                }),
            other => InvalidMaxChildrenSnafu {
                value: format!("{other:?}"),
            }
            .fail(),
        }
    }

    fn apply(
        mut self,
        top_level: &LinkedHashMap<Yaml, Yaml>,
    ) -> Result<Self, ShellConfigError> {
        for (key, value) in top_level {
            match key.as_str() {
                Some(MAX_CHILDREN_KEY) => self.max_children = Self::parse_max_children(value)?,
                Some(PROMPT_KEY) => {
                    self.prompt = value
                        .as_str()
                        .context(PromptNotStringSnafu)?
                        .to_string();
                }
                _ => debug!("Skipping unknown config entry: {:?}", key),
            }
        }
        Ok(self)
    }
}

impl TryFrom<&str> for ShellConfig {
    type Error = ShellConfigError;

    fn try_from(contents: &str) -> Result<Self, Self::Error> {
        let documents = Yaml::load_from_str(contents).context(ParseSnafu)?;
        let Some(document) = documents.first() else {
            // An empty file configures nothing
            return Ok(Self::default());
        };

        let top_level = document.as_mapping().context(TopLevelNotMapSnafu)?;
        let config = Self::default().apply(top_level)?;
        debug!("Loaded config: {:?}", config);
        Ok(config)
    }
}

#[derive(Debug, Snafu)]
pub enum ShellConfigError {
    #[snafu(display("Failed to read the config file: {}", file_path.display()))]
    ReadError {
        file_path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Config file {} is not valid UTF-8", file_path.display()))]
    EncodingError {
        file_path: PathBuf,
        source: std::string::FromUtf8Error,
    },
    #[snafu(display("Failed to parse the config file"))]
    ParseError { source: saphyr::ScanError },
    #[snafu(display("Top level of config should be a map"))]
    TopLevelNotMapError,
    #[snafu(display("'max_children' should be a positive integer, got {}", value))]
    InvalidMaxChildrenError { value: String },
    #[snafu(display("'prompt' should be a string"))]
    PromptNotStringError,
}
