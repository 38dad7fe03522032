//! Error types for simulation setup.
//!
//! Ticking the model never fails; these only surface while loading or
//! selecting profiles.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Unknown profile: \"{name}\" (available: {})", .available.join(", "))]
    UnknownProfile {
        name: String,
        available: Vec<String>,
    },

    #[error("Failed to read profile file: {path}")]
    ProfileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse profile file {path}: {source}")]
    ProfileParse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
}

pub type SimResult<T> = Result<T, SimError>;
