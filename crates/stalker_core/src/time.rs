//! Simulation time.
//!
//! Time is kept as integer milliseconds so that scheduled callbacks order
//! exactly; fractional seconds only appear at the configuration boundary.

/// Milliseconds since the runtime started.
pub type TimeMs = u64;

/// Convert seconds to whole milliseconds, clamping negatives to zero.
#[must_use]
pub fn ms_from_secs(secs: f64) -> TimeMs {
    if !secs.is_finite() || secs <= 0.0 {
        return 0;
    }
    (secs * 1000.0).round() as TimeMs
}

/// Scale an authored delay by a playback rate.
///
/// Timelines are authored at rate 1.0; a rate of 2.0 plays twice as fast.
/// Non-positive rates fall back to the authored delay.
#[must_use]
pub fn scaled_delay(authored_ms: TimeMs, rate: f64) -> TimeMs {
    if !rate.is_finite() || rate <= 0.0 {
        return authored_ms;
    }
    (authored_ms as f64 / rate).round() as TimeMs
}

/// True if `since` is set and no more than `window` has elapsed until `now`.
#[must_use]
pub fn within(now: TimeMs, since: Option<TimeMs>, window: TimeMs) -> bool {
    since.is_some_and(|t| now >= t && now - t <= window)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ms_from_secs() {
        assert_eq!(ms_from_secs(0.2), 200);
        assert_eq!(ms_from_secs(1.5), 1500);
        assert_eq!(ms_from_secs(-1.0), 0);
        assert_eq!(ms_from_secs(f64::NAN), 0);
    }

    #[test]
    fn test_scaled_delay() {
        assert_eq!(scaled_delay(1000, 2.0), 500);
        assert_eq!(scaled_delay(1000, 0.5), 2000);
        assert_eq!(scaled_delay(300, 1.25), 240);
        assert_eq!(scaled_delay(300, 0.0), 300);
    }

    #[test]
    fn test_within() {
        assert!(within(1500, Some(1000), 500));
        assert!(!within(1501, Some(1000), 500));
        assert!(!within(1000, None, 500));
        assert!(!within(900, Some(1000), 500));
    }
}
