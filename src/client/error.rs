use std::path::PathBuf;
use thiserror::Error;

/// Errors returned by [`StoreClient`](super::StoreClient) operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never produced a response (connection refused, DNS, timeout,
    /// body read interrupted).
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} answered with HTTP {status}")]
    Status {
        endpoint: String,
        status: reqwest::StatusCode,
    },

    /// The store answered but the body is not what the protocol promises.
    #[error("malformed response from {endpoint}: {reason}")]
    Malformed { endpoint: String, reason: String },

    #[error("{0} is not offered by the configured store protocol")]
    Unsupported(&'static str),

    #[error("invalid store URL: {0}")]
    InvalidUrl(String),

    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ClientError {
    /// True when the failure happened below the protocol: no usable answer
    /// arrived from the store.
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport { .. })
    }
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;
