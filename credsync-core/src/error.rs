//! Error types for credsync-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while building a [`Config`](crate::Config) or
/// loading local data files.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is not set.
    #[error("required environment variable was not set: {var}")]
    Missing { var: &'static str },

    /// A required environment variable is set to an empty string.
    #[error("environment variable {var} is empty")]
    Empty { var: &'static str },

    /// The writer server address is not an http(s) URL.
    #[error("invalid server address '{value}': expected an http:// or https:// URL")]
    InvalidServer { value: String },

    /// A numeric setting did not parse as a positive integer.
    #[error("invalid value '{value}' for {var}: expected a positive integer")]
    InvalidNumber { var: &'static str, value: String },

    /// The legacy rules file could not be read.
    #[error("failed to read legacy rules at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The legacy rules file is not valid password-rules JSON.
    #[error("failed to parse legacy rules at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
