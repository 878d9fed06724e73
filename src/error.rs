//! Error types for VarnaNav

use thiserror::Error;

/// VarnaNav error type
#[derive(Error, Debug)]
pub enum VarnaError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unrecognized command: {0}")]
    Command(String),

    #[error("Hardware error: {0}")]
    Hardware(String),
}

impl From<toml::de::Error> for VarnaError {
    fn from(e: toml::de::Error) -> Self {
        VarnaError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, VarnaError>;
