//! pit-session: cook session history, persistence and reporting.

pub mod csv;
pub mod estimate;
pub mod session;
pub mod store;
pub mod types;

pub use csv::{to_csv, CSV_HEADER};
pub use estimate::{estimate_done, EstimateParams};
pub use session::{unix_now, Session};
pub use store::SessionStore;
pub use types::*;

use std::path::PathBuf;

pub type SessionResult<T> = Result<T, SessionError>;

#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error("Session file I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Session file {path} is not a valid snapshot: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}
