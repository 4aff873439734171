use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::sorting::{
    actuator::{ActuatorPolicy, ActuatorState},
    classify::{ClassificationResult, PurityClassifier},
    common::error::{Result, SortError},
    config::SorterConfig,
    engine::timing::PipelineTimings,
    frame::{Frame, select_region_with_min},
    snapshot::{JsonFileStore, SnapshotStore},
    stats::{SessionStats, StatsAccumulator},
};

/// Everything one scan produced.
#[derive(Debug)]
pub struct ScanOutcome {
    pub result: ClassificationResult,
    /// Target state for the indicator lights and gate.
    pub actuator: ActuatorState,
    /// Session statistics including this scan.
    pub stats: SessionStats,
    /// Set when the scan was recorded in memory but the snapshot write failed.
    pub persist_error: Option<SortError>,
}

pub struct SortingEngine<S: SnapshotStore = JsonFileStore> {
    config: SorterConfig,
    classifier: PurityClassifier,
    policy: ActuatorPolicy,
    stats: Arc<StatsAccumulator<S>>,
}

impl SortingEngine<JsonFileStore> {
    /// Engine backed by the JSON snapshot at `config.snapshot_path`, resuming
    /// any session already recorded there.
    pub fn new(config: SorterConfig) -> Self {
        let store = JsonFileStore::new(config.snapshot_path.clone());
        Self::with_store(config, store)
    }
}

impl<S: SnapshotStore> SortingEngine<S> {
    pub fn with_store(config: SorterConfig, store: S) -> Self {
        Self::with_accumulator(config, Arc::new(StatsAccumulator::restore(store)))
    }

    /// Shares an existing accumulator, e.g. one a dashboard already reads.
    pub fn with_accumulator(config: SorterConfig, stats: Arc<StatsAccumulator<S>>) -> Self {
        Self {
            classifier: PurityClassifier::new(config.blue_threshold),
            policy: ActuatorPolicy::new(config.angles),
            config,
            stats,
        }
    }

    pub fn config(&self) -> &SorterConfig {
        &self.config
    }

    /// Handle for concurrent readers of the session statistics.
    pub fn stats(&self) -> &Arc<StatsAccumulator<S>> {
        &self.stats
    }

    pub fn rest_state(&self) -> ActuatorState {
        self.policy.rest()
    }

    /// Classifies a frame without recording it.
    pub fn classify(&self, frame: &Frame) -> Result<ClassificationResult> {
        let region = select_region_with_min(frame, self.config.min_frame_dimension)?;
        self.classifier.classify_region(&region)
    }

    pub fn scan(&self, frame: &Frame) -> Result<ScanOutcome> {
        self.scan_with_timings(frame).map(|(outcome, _)| outcome)
    }

    /// Runs one scan. Invalid frames fail before any statistics change; a
    /// snapshot failure is reported in the outcome and does not fail the scan.
    #[instrument(skip(self, frame), fields(width = frame.width(), height = frame.height()))]
    pub fn scan_with_timings(&self, frame: &Frame) -> Result<(ScanOutcome, PipelineTimings)> {
        let mut timings = PipelineTimings::new();

        let region = timings.time("region", || {
            select_region_with_min(frame, self.config.min_frame_dimension)
        })?;

        let result = {
            let _span = tracing::info_span!("classify", pixels = region.pixel_count()).entered();
            timings.time("classify", || self.classifier.classify_region(&region))?
        };

        let actuator = self.policy.target(result.category);

        let update = {
            let _span = tracing::info_span!("record").entered();
            timings.time("record", || self.stats.record_scan(&result))
        };
        if let Some(err) = &update.persist_error {
            warn!(error = %err, "Scan recorded in memory only");
        }

        info!(
            category = ?result.category,
            purity = result.purity_percent,
            composition = %result.composition_label,
            gate = actuator.gate_angle_degrees,
            total = update.stats.total_scanned,
            "Scan complete"
        );

        let outcome = ScanOutcome {
            result,
            actuator,
            stats: update.stats,
            persist_error: update.persist_error,
        };
        Ok((outcome, timings))
    }
}
