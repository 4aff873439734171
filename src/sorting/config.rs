//! Sorter configuration

use std::path::PathBuf;

use crate::sorting::actuator::GateAngles;
use crate::sorting::classify::DEFAULT_BLUE_THRESHOLD;
use crate::sorting::common::error::{Result, SortError};
use crate::sorting::frame::MIN_FRAME_DIMENSION;

/// Servo travel in degrees.
pub const MAX_GATE_ANGLE: u16 = 180;

pub const DEFAULT_SNAPSHOT_PATH: &str = "fibertrace_data.json";

#[derive(Debug, Clone)]
pub struct SorterConfig {
    pub angles: GateAngles,
    /// Blue-dominance threshold in intensity units.
    pub blue_threshold: f64,
    /// Frames narrower or shorter than this are rejected.
    pub min_frame_dimension: usize,
    pub snapshot_path: PathBuf,
}

impl Default for SorterConfig {
    fn default() -> Self {
        Self {
            angles: GateAngles::default(),
            blue_threshold: DEFAULT_BLUE_THRESHOLD,
            min_frame_dimension: MIN_FRAME_DIMENSION,
            snapshot_path: PathBuf::from(DEFAULT_SNAPSHOT_PATH),
        }
    }
}

impl SorterConfig {
    pub fn builder() -> SorterConfigBuilder {
        SorterConfigBuilder::default()
    }
}

/// Builder for SorterConfig
#[derive(Default)]
pub struct SorterConfigBuilder {
    good_angle: Option<u16>,
    bad_angle: Option<u16>,
    center_angle: Option<u16>,
    blue_threshold: Option<f64>,
    min_frame_dimension: Option<usize>,
    snapshot_path: Option<PathBuf>,
}

impl SorterConfigBuilder {
    pub fn good_angle(mut self, degrees: u16) -> Self {
        self.good_angle = Some(degrees);
        self
    }

    pub fn bad_angle(mut self, degrees: u16) -> Self {
        self.bad_angle = Some(degrees);
        self
    }

    pub fn center_angle(mut self, degrees: u16) -> Self {
        self.center_angle = Some(degrees);
        self
    }

    pub fn blue_threshold(mut self, threshold: f64) -> Self {
        self.blue_threshold = Some(threshold);
        self
    }

    pub fn min_frame_dimension(mut self, min: usize) -> Self {
        self.min_frame_dimension = Some(min);
        self
    }

    pub fn snapshot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot_path = Some(path.into());
        self
    }

    pub fn build(self) -> Result<SorterConfig> {
        let default = SorterConfig::default();
        let angles = GateAngles {
            good: self.good_angle.unwrap_or(default.angles.good),
            bad: self.bad_angle.unwrap_or(default.angles.bad),
            center: self.center_angle.unwrap_or(default.angles.center),
        };

        for (name, angle) in [("good", angles.good), ("bad", angles.bad), ("center", angles.center)] {
            if angle > MAX_GATE_ANGLE {
                return Err(SortError::InvalidConfig(format!(
                    "{name} angle {angle} exceeds {MAX_GATE_ANGLE} degrees"
                )));
            }
        }

        let blue_threshold = self.blue_threshold.unwrap_or(default.blue_threshold);
        if !blue_threshold.is_finite() {
            return Err(SortError::InvalidConfig(format!(
                "blue threshold must be finite, got {blue_threshold}"
            )));
        }

        Ok(SorterConfig {
            angles,
            blue_threshold,
            min_frame_dimension: self.min_frame_dimension.unwrap_or(default.min_frame_dimension),
            snapshot_path: self.snapshot_path.unwrap_or(default.snapshot_path),
        })
    }
}
