//! Delimited session report.

use crate::types::Reading;
use std::fmt::Write;

pub const CSV_HEADER: &str = "timestamp,pit,meat1,meat2,fan,damper,setpoint,lid";

/// Render readings as CSV: a header line followed by one row per reading.
/// A missing probe value is an empty field.
pub fn to_csv(readings: &[Reading]) -> String {
    let mut out = String::with_capacity(CSV_HEADER.len() + 1 + readings.len() * 48);
    out.push_str(CSV_HEADER);
    out.push('\n');
    for (i, r) in readings.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        // Writing into a String cannot fail.
        let _ = write!(
            out,
            "{},{},{},{},{},{},{},{}",
            r.ts,
            r.pit,
            OptionalField(r.meat1),
            OptionalField(r.meat2),
            r.fan,
            r.damper,
            r.sp,
            r.lid
        );
    }
    out
}

struct OptionalField(Option<f64>);

impl std::fmt::Display for OptionalField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(v) => write!(f, "{v}"),
            None => Ok(()),
        }
    }
}
