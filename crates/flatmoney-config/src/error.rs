use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not access configuration: {0}")]
    Io(#[from] io::Error),

    #[error("configuration file {path} is not valid JSON: {reason}")]
    Serde { path: PathBuf, reason: String },

    #[error("invalid configuration value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("unknown configuration key `{0}`")]
    UnknownKey(String),
}
