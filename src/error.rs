use std::path::PathBuf;

use reqwest::StatusCode;

/// Failures of a single schema download. None of them are retried.
#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("Invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("Invalid header '{name}': {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("Failed to create HTTP client")]
    Client(#[source] reqwest::Error),

    #[error("Failed to connect to {endpoint}")]
    Connection {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Timed out waiting for schema from {endpoint}")]
    Timeout {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request to {endpoint} failed")]
    Transfer {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Schema from {endpoint} is not valid UTF-8")]
    Decode {
        endpoint: String,
        #[source]
        source: std::string::FromUtf8Error,
    },

    #[error("{endpoint} responded with {status}")]
    HttpStatus {
        endpoint: String,
        status: StatusCode,
        body: String,
    },

    #[error("Failed to write schema file: {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FetchError {
    /// Classifies a transport failure. A connect timeout counts as a
    /// connection failure, everything else that elapsed is a read timeout.
    /// Redirect, body and decode failures are neither.
    pub fn from_transport(endpoint: &str, source: reqwest::Error) -> Self {
        let endpoint = endpoint.to_string();
        if source.is_timeout() && !source.is_connect() {
            Self::Timeout { endpoint, source }
        } else if source.is_connect() || source.is_request() {
            Self::Connection { endpoint, source }
        } else {
            Self::Transfer { endpoint, source }
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
