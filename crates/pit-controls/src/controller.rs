//! PID controller for the pit temperature loop.
//!
//! Parallel (non-interacting) form:
//!
//! ```text
//! out = kp * e + ki * ∫e dt + kd * de/dt,   e = sp - pv
//! ```
//!
//! Includes:
//! - Symmetric integral clamping (anti-windup)
//! - Output clamping
//! - Derivative on the raw error difference between calls

use serde::{Deserialize, Serialize};

/// PID controller configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PidController {
    /// Proportional gain.
    pub kp: f64,
    /// Integral gain (per second).
    pub ki: f64,
    /// Derivative gain (seconds).
    pub kd: f64,
    /// Minimum output value.
    pub out_min: f64,
    /// Maximum output value.
    pub out_max: f64,
    /// Integral accumulator is clamped to `[-integral_limit, integral_limit]`.
    pub integral_limit: f64,
}

impl PidController {
    /// The tuning used by the simulated smoker: Kp 4, Ki 0.02, Kd 5,
    /// integral ±2000, output 0-100 %.
    pub fn smoker() -> Self {
        Self {
            kp: 4.0,
            ki: 0.02,
            kd: 5.0,
            out_min: 0.0,
            out_max: 100.0,
            integral_limit: 2000.0,
        }
    }

    /// Compute controller output given process variable and setpoint.
    ///
    /// # Arguments
    ///
    /// * `state` - Controller state (integral and previous error)
    /// * `pv` - Process variable (measured value)
    /// * `sp` - Setpoint (desired value)
    /// * `dt` - Time since last update (seconds)
    ///
    /// # Returns
    ///
    /// Updated state and output value. A non-positive `dt` contributes no
    /// integral or derivative action.
    pub fn update(&self, state: &PidState, pv: f64, sp: f64, dt: f64) -> (PidState, f64) {
        // Error: e = sp - pv (positive error means PV is below setpoint)
        let error = sp - pv;

        let p_term = self.kp * error;

        let integral = if dt > 0.0 {
            (state.integral + error * dt).clamp(-self.integral_limit, self.integral_limit)
        } else {
            state.integral
        };
        let i_term = self.ki * integral;

        let derivative = if dt > 0.0 {
            (error - state.prev_error) / dt
        } else {
            0.0
        };
        let d_term = self.kd * derivative;

        let output = (p_term + i_term + d_term).clamp(self.out_min, self.out_max);

        let new_state = PidState {
            integral,
            prev_error: error,
        };

        (new_state, output)
    }
}

/// PID controller state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PidState {
    /// Integral accumulator (error × seconds).
    #[serde(default)]
    pub integral: f64,
    /// Error seen on the previous update, for the derivative term.
    #[serde(default)]
    pub prev_error: f64,
}

impl PidState {
    /// Drop accumulated integral action, keeping the derivative history.
    pub fn reset_integral(&mut self) {
        self.integral = 0.0;
    }
}
