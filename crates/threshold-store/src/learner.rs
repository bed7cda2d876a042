//! Success-rate to threshold mapping.

use formpilot_core_types::HandlerThreshold;

use crate::config::{LearnerConfig, ThresholdBand};

/// Derive a handler's threshold from its observed success rate.
///
/// Monotone in the rate: a climbing success rate lowers the threshold
/// toward the band minimum (trust earned, less confidence required); a
/// falling rate raises it back toward the seed. Small samples are damped
/// so a single early success cannot collapse the threshold.
pub fn derive_threshold(config: &LearnerConfig, band: ThresholdBand, record: &HandlerThreshold) -> f64 {
    let rate = record.success_rate();
    let damping = if config.damping_attempts == 0 {
        1.0
    } else {
        f64::from(record.total_attempts.min(config.damping_attempts))
            / f64::from(config.damping_attempts)
    };
    let threshold = band.seed - (band.seed - band.min) * rate * damping;
    band.clamp(threshold)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(attempts: u32, successes: u32) -> HandlerThreshold {
        let mut r = HandlerThreshold::seeded("demographics", 0.8);
        r.total_attempts = attempts;
        r.successful_attempts = successes;
        r
    }

    fn config() -> LearnerConfig {
        LearnerConfig::default()
    }

    #[test]
    fn test_no_attempts_keeps_seed() {
        let band = ThresholdBand::new(0.8, 0.5, 0.95);
        assert_eq!(derive_threshold(&config(), band, &record(0, 0)), 0.8);
    }

    #[test]
    fn test_successes_lower_threshold_monotonically() {
        let band = ThresholdBand::new(0.8, 0.5, 0.95);
        let mut last = f64::MAX;
        for attempts in 1..=10 {
            let t = derive_threshold(&config(), band, &record(attempts, attempts));
            assert!(t <= last, "threshold rose at attempt {}", attempts);
            assert!(t >= band.min);
            last = t;
        }
        // Full damping reached: all-success threshold sits at the band floor.
        assert_eq!(last, band.min);
    }

    #[test]
    fn test_failures_never_lower_threshold() {
        let band = ThresholdBand::new(0.8, 0.5, 0.95);
        let mut last = 0.0;
        for attempts in 1..=10 {
            let t = derive_threshold(&config(), band, &record(attempts, 0));
            assert!(t >= last);
            assert!(t <= band.seed);
            last = t;
        }
        assert_eq!(last, band.seed);
    }

    #[test]
    fn test_threshold_stays_in_band() {
        let band = ThresholdBand::new(0.95, 0.6, 0.98);
        for (attempts, successes) in [(1, 1), (3, 2), (10, 10), (20, 1), (50, 25)] {
            let t = derive_threshold(&config(), band, &record(attempts, successes));
            assert!(t >= band.min && t <= band.max, "{} out of band", t);
        }
    }
}
