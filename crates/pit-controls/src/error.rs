//! Error types for control system operations.

use thiserror::Error;

/// Errors that can occur in control system operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ControlError {
    /// Unrecognised fan mode name.
    #[error("Unknown fan mode: {name}")]
    UnknownFanMode { name: String },
}
