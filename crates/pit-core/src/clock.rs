//! Simulated-clock formatting.

/// Format simulated seconds as `HH:MM:SS` for log lines.
///
/// Negative or non-finite inputs format as `00:00:00`.
pub fn format_sim_time(sim_time_s: f64) -> String {
    let total = if sim_time_s.is_finite() && sim_time_s > 0.0 {
        sim_time_s.floor() as u64
    } else {
        0
    };
    let h = total / 3600;
    let m = (total % 3600) / 60;
    let s = total % 60;
    format!("{:02}:{:02}:{:02}", h, m, s)
}
