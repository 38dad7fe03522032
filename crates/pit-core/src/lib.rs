//! pit-core: stable foundation for the smoker simulator.
//!
//! Contains:
//! - numeric (finite checks, defaulting and the exponential-approach factor)
//! - clock (simulated-clock formatting for logs)
//! - error (shared error types)

pub mod clock;
pub mod error;
pub mod numeric;

// Re-exports: nice ergonomics for downstream crates
pub use clock::format_sim_time;
pub use error::{CoreError, CoreResult};
pub use numeric::*;
