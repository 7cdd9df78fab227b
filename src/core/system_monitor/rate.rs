//! Conversion of cumulative counters into per-second rates.

/// Rate per second between two cumulative counter readings.
///
/// Returns 0 when the counter went backwards (wrap, reset, device swap) or
/// when the elapsed time is not a positive finite number.
pub fn rate(prev_cumulative: u64, curr_cumulative: u64, elapsed_secs: f64) -> f64 {
    if curr_cumulative < prev_cumulative {
        return 0.0;
    }
    if !elapsed_secs.is_finite() || elapsed_secs <= 0.0 {
        return 0.0;
    }

    (curr_cumulative - prev_cumulative) as f64 / elapsed_secs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_basic() {
        assert_eq!(rate(100, 150, 1.0), 50.0);
        assert_eq!(rate(0, 2048, 2.0), 1024.0);
    }

    #[test]
    fn test_rate_counter_decrease_is_clamped() {
        assert_eq!(rate(150, 100, 1.0), 0.0);
        assert_eq!(rate(u64::MAX, 0, 1.0), 0.0);
    }

    #[test]
    fn test_rate_non_positive_elapsed() {
        assert_eq!(rate(100, 200, 0.0), 0.0);
        assert_eq!(rate(100, 200, -1.0), 0.0);
        assert_eq!(rate(100, 200, f64::NAN), 0.0);
        assert_eq!(rate(100, 200, f64::INFINITY), 0.0);
    }

    #[test]
    fn test_rate_unchanged_counter() {
        assert_eq!(rate(500, 500, 0.5), 0.0);
    }
}
