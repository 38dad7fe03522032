//! Control primitives for the smoker simulator.
//!
//! The simulated controller mirrors what the real firmware runs on the pit
//! probe: a PID loop producing a single 0-100 % demand, which a split-range
//! stage then distributes across the blower fan and the intake damper.
//!
//! # Design Principles
//!
//! - **Pure state transitions**: controllers return a new state and an output
//!   instead of mutating hidden fields, so callers can snapshot them freely
//! - **Bounded outputs**: every output is clamped to its configured range
//! - **Serializable**: configurations and states derive serde traits

pub mod controller;
pub mod error;
pub mod split_range;

pub use controller::{PidController, PidState};
pub use error::ControlError;
pub use split_range::{split_range, FanMode, SplitRangeOutput, DEFAULT_FAN_ON_THRESHOLD};
