use std::path::PathBuf;

use thiserror::Error;

/// Failures while loading a tax table supplied as data.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read tax table {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid tax table JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid tax table: {0}")]
    InvalidTable(String),
}

/// A request or command line that cannot be turned into engine inputs.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("{0}")]
    Invalid(String),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),
}

impl InputError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        InputError::Invalid(msg.into())
    }
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to write output: {0}")]
    Output(#[from] serde_json::Error),
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}
