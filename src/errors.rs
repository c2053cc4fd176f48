use thiserror::Error;

use flatmoney_config::ConfigError;
use flatmoney_core::{CoreError, MaskError};
use flatmoney_domain::UnknownMonth;

/// User-facing error for the command line.
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Invalid input: {0}")]
    Input(String),
}

impl AppError {
    /// Process exit status: 3 for a corrupted ledger, 2 for bad arguments, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Core(err) if err.is_session_fatal() => 3,
            AppError::Input(_) => 2,
            _ => 1,
        }
    }
}

impl From<MaskError> for AppError {
    fn from(err: MaskError) -> Self {
        AppError::Core(CoreError::Mask(err))
    }
}

impl From<UnknownMonth> for AppError {
    fn from(err: UnknownMonth) -> Self {
        AppError::Input(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Core(CoreError::Io(err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Core(CoreError::Serde(err.to_string()))
    }
}
