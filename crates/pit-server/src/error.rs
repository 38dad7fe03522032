use std::net::SocketAddr;
use thiserror::Error;

pub type ServerResult<T> = Result<T, ServerError>;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[from] std::io::Error),

    #[error(transparent)]
    InvalidValue(#[from] pit_core::CoreError),

    #[error(transparent)]
    Control(#[from] pit_controls::ControlError),

    #[error("Unsupported export format: {0}")]
    UnsupportedFormat(String),

    #[error("Malformed command: {0}")]
    MalformedCommand(#[from] serde_json::Error),
}
