//! Store implementations: in-memory and JSON-file-backed.

use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use chrono::Utc;
use formpilot_core_types::{AutomationOutcome, HandlerThreshold};
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::config::LearnerConfig;
use crate::errors::{Result, StoreError};
use crate::learner::derive_threshold;
use crate::model::ThresholdSnapshot;

/// Durable handler-name → threshold-record map with atomic get/update.
///
/// The learner behind `record_outcome` is the only writer of learned
/// state in the whole engine.
pub trait ThresholdStore: Send + Sync {
    /// Current dynamic threshold, seeding a fresh record on first use.
    fn current_threshold(&self, handler: &str) -> f64;

    /// Snapshot of one handler's record (seeded if absent).
    fn handler_record(&self, handler: &str) -> HandlerThreshold;

    /// Observed success rate, 0 for unseen handlers.
    fn success_rate(&self, handler: &str) -> f64 {
        self.handler_record(handler).success_rate()
    }

    /// Fold one outcome into the handler's record, derive the new
    /// threshold, persist, and return the updated record.
    fn record_outcome(&self, outcome: &AutomationOutcome) -> Result<HandlerThreshold>;

    /// The append-only outcome log.
    fn outcome_log(&self) -> Vec<AutomationOutcome>;
}

#[derive(Debug, Default)]
struct StoreState {
    snapshot: ThresholdSnapshot,
}

/// In-memory store; the default for tests and ephemeral sessions.
pub struct MemoryThresholdStore {
    config: LearnerConfig,
    state: RwLock<StoreState>,
}

impl MemoryThresholdStore {
    pub fn new(config: LearnerConfig) -> Self {
        Self {
            config,
            state: RwLock::new(StoreState {
                snapshot: ThresholdSnapshot::new(),
            }),
        }
    }

    fn from_snapshot(config: LearnerConfig, snapshot: ThresholdSnapshot) -> Self {
        Self {
            config,
            state: RwLock::new(StoreState { snapshot }),
        }
    }

    fn seeded_record(&self, handler: &str) -> HandlerThreshold {
        HandlerThreshold::seeded(handler, self.config.band(handler).seed)
    }

    fn apply_outcome(&self, outcome: &AutomationOutcome) -> HandlerThreshold {
        let mut state = self.state.write();
        let record = state
            .snapshot
            .records
            .entry(outcome.handler_name.clone())
            .or_insert_with(|| {
                HandlerThreshold::seeded(
                    &outcome.handler_name,
                    self.config.band(&outcome.handler_name).seed,
                )
            });

        record.total_attempts += 1;
        if outcome.success {
            record.successful_attempts += 1;
            record.last_success = Some(outcome.timestamp);
        }
        record.last_updated = Utc::now();

        let band = self.config.band(&outcome.handler_name);
        record.threshold = derive_threshold(&self.config, band, record);

        debug!(
            handler = %outcome.handler_name,
            success = outcome.success,
            success_rate = record.success_rate(),
            threshold = record.threshold,
            "recorded automation outcome"
        );

        let updated = record.clone();
        state.snapshot.outcomes.push(outcome.clone());
        updated
    }

    fn snapshot(&self) -> ThresholdSnapshot {
        self.state.read().snapshot.clone()
    }
}

impl ThresholdStore for MemoryThresholdStore {
    fn current_threshold(&self, handler: &str) -> f64 {
        self.handler_record(handler).threshold
    }

    fn handler_record(&self, handler: &str) -> HandlerThreshold {
        self.state
            .read()
            .snapshot
            .records
            .get(handler)
            .cloned()
            .unwrap_or_else(|| self.seeded_record(handler))
    }

    fn record_outcome(&self, outcome: &AutomationOutcome) -> Result<HandlerThreshold> {
        Ok(self.apply_outcome(outcome))
    }

    fn outcome_log(&self) -> Vec<AutomationOutcome> {
        self.state.read().snapshot.outcomes.clone()
    }
}

/// File-backed store. Loads the JSON snapshot at open, rewrites it after
/// every recorded outcome so learned state survives restarts.
pub struct JsonThresholdStore {
    path: PathBuf,
    inner: MemoryThresholdStore,
}

impl std::fmt::Debug for JsonThresholdStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonThresholdStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl JsonThresholdStore {
    pub fn open(path: impl Into<PathBuf>, config: LearnerConfig) -> Result<Self> {
        let path = path.into();
        let snapshot = if path.exists() {
            let file = File::open(&path)?;
            let snapshot: ThresholdSnapshot = serde_json::from_reader(BufReader::new(file))?;
            info!(
                path = %path.display(),
                handlers = snapshot.records.len(),
                outcomes = snapshot.outcomes.len(),
                "loaded threshold snapshot"
            );
            snapshot
        } else {
            ThresholdSnapshot::new()
        };
        Ok(Self {
            path,
            inner: MemoryThresholdStore::from_snapshot(config, snapshot),
        })
    }

    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, &self.inner.snapshot())?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ThresholdStore for JsonThresholdStore {
    fn current_threshold(&self, handler: &str) -> f64 {
        self.inner.current_threshold(handler)
    }

    fn handler_record(&self, handler: &str) -> HandlerThreshold {
        self.inner.handler_record(handler)
    }

    fn record_outcome(&self, outcome: &AutomationOutcome) -> Result<HandlerThreshold> {
        let updated = self.inner.apply_outcome(outcome);
        self.persist()?;
        Ok(updated)
    }

    fn outcome_log(&self) -> Vec<AutomationOutcome> {
        self.inner.outcome_log()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ThresholdBand;

    fn success(handler: &str) -> AutomationOutcome {
        AutomationOutcome::success(handler, handler, 0.9)
    }

    fn failure(handler: &str) -> AutomationOutcome {
        AutomationOutcome::failure(handler, handler, 0.9, "element not found")
    }

    #[test]
    fn test_first_use_seeds_configured_default() {
        let store = MemoryThresholdStore::new(LearnerConfig::default());
        assert_eq!(store.current_threshold("rating_matrix"), 0.95);
        assert_eq!(store.current_threshold("demographics"), 0.55);
        let record = store.handler_record("demographics");
        assert_eq!(record.total_attempts, 0);
    }

    #[test]
    fn test_outcome_updates_counters_and_log() {
        let store = MemoryThresholdStore::new(LearnerConfig::default());
        let updated = store.record_outcome(&success("demographics")).unwrap();
        assert_eq!(updated.total_attempts, 1);
        assert_eq!(updated.successful_attempts, 1);
        assert!(updated.last_success.is_some());

        let updated = store.record_outcome(&failure("demographics")).unwrap();
        assert_eq!(updated.total_attempts, 2);
        assert_eq!(updated.successful_attempts, 1);
        assert_eq!(store.outcome_log().len(), 2);
    }

    #[test]
    fn test_ten_successes_decrease_monotonically_within_band() {
        // Threshold 0.80 seed with floor 0.5: ten straight successes must
        // walk the threshold down without ever crossing the floor.
        let config = LearnerConfig::default()
            .with_band("demographics", ThresholdBand::new(0.8, 0.5, 0.95));
        let store = MemoryThresholdStore::new(config);

        let mut last = store.current_threshold("demographics");
        assert_eq!(last, 0.8);
        for _ in 0..10 {
            let updated = store.record_outcome(&success("demographics")).unwrap();
            assert!(updated.threshold <= last);
            assert!(updated.threshold >= 0.5);
            last = updated.threshold;
        }
        assert_eq!(last, 0.5);
    }

    #[test]
    fn test_failures_raise_threshold_back_toward_seed() {
        let config = LearnerConfig::default()
            .with_band("demographics", ThresholdBand::new(0.8, 0.5, 0.95));
        let store = MemoryThresholdStore::new(config);

        for _ in 0..5 {
            store.record_outcome(&success("demographics")).unwrap();
        }
        let lowered = store.current_threshold("demographics");
        assert!(lowered < 0.8);

        let mut last = lowered;
        for _ in 0..10 {
            let updated = store.record_outcome(&failure("demographics")).unwrap();
            assert!(updated.threshold >= last);
            last = updated.threshold;
        }
        assert!(last <= 0.8 + 1e-9);
    }

    #[test]
    fn test_json_store_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("thresholds.json");

        {
            let store = JsonThresholdStore::open(&path, LearnerConfig::default()).unwrap();
            for _ in 0..5 {
                store.record_outcome(&success("demographics")).unwrap();
            }
        }

        let reopened = JsonThresholdStore::open(&path, LearnerConfig::default()).unwrap();
        let record = reopened.handler_record("demographics");
        assert_eq!(record.total_attempts, 5);
        assert_eq!(record.successful_attempts, 5);
        assert!(record.threshold < 0.55);
        assert_eq!(reopened.outcome_log().len(), 5);
    }

    #[test]
    fn test_corrupt_snapshot_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("thresholds.json");
        std::fs::write(&path, "not json").unwrap();

        let err = JsonThresholdStore::open(&path, LearnerConfig::default()).unwrap_err();
        assert!(matches!(err, StoreError::CorruptSnapshot(_)));
    }
}
