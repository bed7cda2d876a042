//! Learner configuration: seed thresholds and per-handler bands.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Seed threshold plus the [min, max] band a handler's learned threshold
/// may move within. Ambiguous categories seed high; simple ones lower.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdBand {
    pub seed: f64,
    pub min: f64,
    pub max: f64,
}

impl ThresholdBand {
    pub fn new(seed: f64, min: f64, max: f64) -> Self {
        Self { seed, min, max }
    }

    pub fn clamp(&self, threshold: f64) -> f64 {
        threshold.clamp(self.min, self.max)
    }
}

impl Default for ThresholdBand {
    fn default() -> Self {
        Self {
            seed: 0.5,
            min: 0.1,
            max: 0.95,
        }
    }
}

/// Configuration for the threshold learner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearnerConfig {
    /// Per-handler bands; handlers not listed use `default_band`
    pub bands: HashMap<String, ThresholdBand>,
    pub default_band: ThresholdBand,
    /// Attempt count at which the success rate takes full effect;
    /// smaller samples move the threshold proportionally less
    pub damping_attempts: u32,
}

impl LearnerConfig {
    pub fn band(&self, handler: &str) -> ThresholdBand {
        self.bands.get(handler).copied().unwrap_or(self.default_band)
    }

    pub fn with_band(mut self, handler: impl Into<String>, band: ThresholdBand) -> Self {
        self.bands.insert(handler.into(), band);
        self
    }
}

impl Default for LearnerConfig {
    fn default() -> Self {
        let mut bands = HashMap::new();
        bands.insert("demographics".to_string(), ThresholdBand::new(0.55, 0.3, 0.95));
        bands.insert(
            "brand_familiarity".to_string(),
            ThresholdBand::new(0.6, 0.35, 0.95),
        );
        bands.insert("rating_matrix".to_string(), ThresholdBand::new(0.95, 0.6, 0.98));
        bands.insert("multi_select".to_string(), ThresholdBand::new(0.6, 0.35, 0.95));
        bands.insert("trust_rating".to_string(), ThresholdBand::new(0.95, 0.6, 0.98));
        bands.insert(
            "recency_activities".to_string(),
            ThresholdBand::new(0.6, 0.35, 0.95),
        );
        bands.insert(
            "research_required".to_string(),
            ThresholdBand::new(0.95, 0.6, 0.98),
        );
        bands.insert("unknown".to_string(), ThresholdBand::new(0.5, 0.25, 0.95));
        Self {
            bands,
            default_band: ThresholdBand::default(),
            damping_attempts: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlisted_handler_uses_default_band() {
        let config = LearnerConfig::default();
        assert_eq!(config.band("never-seen"), ThresholdBand::default());
    }

    #[test]
    fn test_ambiguous_categories_seed_high() {
        let config = LearnerConfig::default();
        assert!(config.band("rating_matrix").seed >= 0.95);
        assert!(config.band("trust_rating").seed >= 0.95);
        assert!(config.band("demographics").seed < 0.7);
    }

    #[test]
    fn test_band_clamp() {
        let band = ThresholdBand::new(0.8, 0.5, 0.95);
        assert_eq!(band.clamp(0.2), 0.5);
        assert_eq!(band.clamp(0.99), 0.95);
        assert_eq!(band.clamp(0.7), 0.7);
    }
}
