use crate::CoreError;

/// Floating point type used throughout the simulator.
pub type Real = f64;

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, CoreError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CoreError::NonFinite { what, value: v })
    }
}

/// Check that `v` is finite and inside `[min, max]`.
pub fn ensure_in_range(v: Real, min: Real, max: Real, what: &'static str) -> Result<Real, CoreError> {
    let v = ensure_finite(v, what)?;
    if v < min || v > max {
        return Err(CoreError::OutOfRange {
            what,
            value: v,
            min,
            max,
        });
    }
    Ok(v)
}

/// Return `v` when finite, otherwise `default`.
pub fn finite_or(v: Real, default: Real) -> Real {
    if v.is_finite() { v } else { default }
}

/// Return `v` when finite and strictly positive, otherwise `default`.
pub fn positive_or(v: Real, default: Real) -> Real {
    if v.is_finite() && v > 0.0 { v } else { default }
}

/// Fraction of the remaining gap covered by a first-order lag with time
/// constant `tau` over `dt`: `1 - exp(-dt / tau)`.
///
/// Exact for any step size, so a single large `dt` never overshoots the
/// target. Returns 0 for a non-positive `dt`.
pub fn approach_factor(dt: Real, tau: Real) -> Real {
    if dt <= 0.0 || tau <= 0.0 {
        return 0.0;
    }
    1.0 - (-dt / tau).exp()
}

/// Round to one decimal place, the resolution reported by the probes.
pub fn round_tenth(v: Real) -> Real {
    (v * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(Real::NAN, "test").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Non-finite"));
    }

    #[test]
    fn ensure_in_range_rejects_outside() {
        assert!(ensure_in_range(250.0, 0.0, 1000.0, "sp").is_ok());
        assert!(ensure_in_range(-1.0, 0.0, 1000.0, "sp").is_err());
        assert!(ensure_in_range(Real::INFINITY, 0.0, 1000.0, "sp").is_err());
    }

    #[test]
    fn defaulting_helpers() {
        assert_eq!(finite_or(Real::NAN, 70.0), 70.0);
        assert_eq!(finite_or(-3.0, 70.0), -3.0);
        assert_eq!(positive_or(0.0, 4.0), 4.0);
        assert_eq!(positive_or(2.5, 4.0), 2.5);
    }

    #[test]
    fn round_tenth_rounds() {
        assert_eq!(round_tenth(225.04), 225.0);
        assert_eq!(round_tenth(225.06), 225.1);
    }

    proptest! {
        #[test]
        fn approach_factor_is_a_fraction(dt in 0.0f64..1.0e6, tau in 1.0f64..1.0e4) {
            let a = approach_factor(dt, tau);
            prop_assert!((0.0..=1.0).contains(&a));
        }

        #[test]
        fn two_half_steps_equal_one_step(dt in 0.1f64..1000.0, tau in 1.0f64..5000.0) {
            let half = approach_factor(dt / 2.0, tau);
            let whole = approach_factor(dt, tau);
            let combined = 1.0 - (1.0 - half) * (1.0 - half);
            prop_assert!((combined - whole).abs() < 1e-9);
        }
    }
}
