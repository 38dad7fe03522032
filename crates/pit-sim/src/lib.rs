//! Reduced-order thermal simulation of a charcoal smoker.
//!
//! Provides:
//! - `ThermalModel`: pure state transition advancing pit, probe, fire and lid
//!   state by an elapsed simulated-time increment
//! - `Profile`: immutable cook configuration with a scripted event schedule
//! - `ModelState`: every mutable field, serializable for resumable sessions
//! - Built-in profiles for the common test scenarios
//!
//! The model is an empirical approximation: exponential approaches toward
//! fire-driven targets, a PID loop on the pit, and bounded noise on the
//! reported values. It aims for plausible, controllable data rather than
//! combustion accuracy.

pub mod error;
pub mod events;
pub mod model;
pub mod noise;
pub mod profile;
pub mod state;

pub use error::{SimError, SimResult};
pub use events::{EventKind, EventSchedule, Probe, ScheduledEvent};
pub use model::{Fault, ModelSample, ThermalModel};
pub use noise::NoiseSource;
pub use profile::{builtin_profiles, find_profile, profile_names, Profile, StallParams};
pub use state::ModelState;
