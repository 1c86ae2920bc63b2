//! Timestamp representation.

/// Sensor timestamp in nanoseconds.
pub type Timestamp = i64;

const NSEC_PER_SEC: f64 = 1e9;

/// Convert a nanosecond timestamp (or duration) to seconds.
#[inline]
pub fn nsec_to_sec(nsec: Timestamp) -> f64 {
    nsec as f64 / NSEC_PER_SEC
}

/// Convert seconds to nanoseconds, rounding to the nearest tick.
#[inline]
pub fn sec_to_nsec(sec: f64) -> Timestamp {
    (sec * NSEC_PER_SEC).round() as Timestamp
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nsec_to_sec() {
        assert_eq!(nsec_to_sec(1_500_000_000), 1.5);
        assert_eq!(nsec_to_sec(0), 0.0);
        assert_eq!(nsec_to_sec(-2_000_000_000), -2.0);
    }

    #[test]
    fn test_sec_to_nsec_rounds() {
        assert_eq!(sec_to_nsec(0.005), 5_000_000);
        assert_eq!(sec_to_nsec(1e-9), 1);
        assert_eq!(sec_to_nsec(-0.25), -250_000_000);
    }
}
