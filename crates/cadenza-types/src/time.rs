//! Time-domain helpers.
//!
//! Every timestamp in the engine is a signed count of microseconds in the
//! active clock domain (wall or audio). Seconds only appear at configuration
//! boundaries and are converted exactly once.

/// Microseconds in the active clock domain.
pub type TimeUs = i64;

pub const MICROS_PER_SEC: i64 = 1_000_000;

/// Convert seconds to microseconds, rounding to the nearest microsecond.
pub fn secs_to_us(secs: f64) -> TimeUs {
    (secs * MICROS_PER_SEC as f64).round() as TimeUs
}

pub fn us_to_ms(us: TimeUs) -> f64 {
    us as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secs_round_to_nearest_microsecond() {
        assert_eq!(secs_to_us(0.2), 200_000);
        assert_eq!(secs_to_us(10.2), 10_200_000);
        assert_eq!(secs_to_us(0.05), 50_000);
        assert_eq!(secs_to_us(-0.5), -500_000);
    }

    #[test]
    fn microseconds_to_milliseconds() {
        assert!((us_to_ms(50_000) - 50.0).abs() < f64::EPSILON);
    }
}
