//! Split-range coordination of fan and damper.
//!
//! The controller produces one demand in percent. Depending on the fan mode
//! that demand is spread across the blower and the intake damper.

use crate::error::ControlError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Controller demand above which the fan starts in `FanAndDamper` mode.
pub const DEFAULT_FAN_ON_THRESHOLD: f64 = 30.0;

/// How the controller demand maps onto fan and damper.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FanMode {
    /// Fan and damper both follow the demand directly.
    #[default]
    Coupled,
    /// Damper follows the demand; the fan joins above the fan-on threshold.
    FanAndDamper,
    /// Damper held fully open; the fan carries the demand.
    FanOnly,
    /// Damper does the work up to at least 50 %, then the fan assists.
    DamperPrimary,
}

impl FanMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FanMode::Coupled => "coupled",
            FanMode::FanAndDamper => "fan_and_damper",
            FanMode::FanOnly => "fan_only",
            FanMode::DamperPrimary => "damper_primary",
        }
    }
}

impl fmt::Display for FanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FanMode {
    type Err = ControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "coupled" => Ok(FanMode::Coupled),
            "fan_and_damper" => Ok(FanMode::FanAndDamper),
            "fan_only" => Ok(FanMode::FanOnly),
            "damper_primary" => Ok(FanMode::DamperPrimary),
            other => Err(ControlError::UnknownFanMode {
                name: other.to_string(),
            }),
        }
    }
}

/// Fan and damper positions, both in percent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitRangeOutput {
    pub fan_percent: f64,
    pub damper_percent: f64,
}

/// Distribute a 0-100 % demand across fan and damper.
pub fn split_range(demand: f64, mode: FanMode, fan_on_threshold: f64) -> SplitRangeOutput {
    let demand = demand.clamp(0.0, 100.0);
    let threshold = fan_on_threshold.clamp(0.0, 99.0);

    let (fan_percent, damper_percent) = match mode {
        FanMode::Coupled => (demand, demand),
        FanMode::FanOnly => (demand, 100.0),
        FanMode::DamperPrimary => {
            let dp_threshold = threshold.max(50.0);
            if demand > dp_threshold {
                (ramp_above(demand, dp_threshold), 100.0)
            } else {
                (0.0, demand)
            }
        }
        FanMode::FanAndDamper => {
            let fan = if demand > threshold {
                ramp_above(demand, threshold)
            } else {
                0.0
            };
            (fan, demand)
        }
    };

    SplitRangeOutput {
        fan_percent,
        damper_percent,
    }
}

fn ramp_above(demand: f64, threshold: f64) -> f64 {
    (demand - threshold) / (100.0 - threshold) * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coupled_follows_demand() {
        let out = split_range(42.0, FanMode::Coupled, DEFAULT_FAN_ON_THRESHOLD);
        assert_eq!(out.fan_percent, 42.0);
        assert_eq!(out.damper_percent, 42.0);
    }

    #[test]
    fn fan_and_damper_starts_fan_above_threshold() {
        let low = split_range(20.0, FanMode::FanAndDamper, 30.0);
        assert_eq!(low.fan_percent, 0.0);
        assert_eq!(low.damper_percent, 20.0);

        let high = split_range(65.0, FanMode::FanAndDamper, 30.0);
        assert!((high.fan_percent - 50.0).abs() < 1e-9);
        assert_eq!(high.damper_percent, 65.0);
    }

    #[test]
    fn damper_primary_uses_at_least_half() {
        let mid = split_range(40.0, FanMode::DamperPrimary, 30.0);
        assert_eq!(mid.fan_percent, 0.0);
        assert_eq!(mid.damper_percent, 40.0);

        let full = split_range(100.0, FanMode::DamperPrimary, 30.0);
        assert_eq!(full.fan_percent, 100.0);
        assert_eq!(full.damper_percent, 100.0);
    }

    #[test]
    fn fan_only_opens_damper() {
        let out = split_range(10.0, FanMode::FanOnly, 30.0);
        assert_eq!(out.fan_percent, 10.0);
        assert_eq!(out.damper_percent, 100.0);
    }

    #[test]
    fn fan_mode_names_round_trip_through_from_str() {
        for mode in [
            FanMode::Coupled,
            FanMode::FanAndDamper,
            FanMode::FanOnly,
            FanMode::DamperPrimary,
        ] {
            assert_eq!(mode.as_str().parse::<FanMode>().unwrap(), mode);
        }
        assert!("turbo".parse::<FanMode>().is_err());
    }
}
