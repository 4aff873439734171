//! Textile purity sorting
//!
//! This module provides the FiberTrace sorting engine: frame sources, region
//! selection, purity classification, actuator policy and drivers, and the
//! persisted session statistics that reporting surfaces read.

pub mod actuator;
pub mod classify;
pub mod common;
pub mod config;
pub mod engine;
pub mod frame;
pub mod report;
pub mod snapshot;
pub mod source;
pub mod stats;

pub use common::{
    Result,
    SortError,
};

pub use frame::{
    select_region,
    Frame,
    Region,
    MIN_FRAME_DIMENSION,
};

pub use classify::{
    Category,
    ChannelAverages,
    ClassificationResult,
    PurityClassifier,
    DEFAULT_BLUE_THRESHOLD,
};

pub use actuator::{
    angle_to_duty,
    ActuatorDriver,
    ActuatorPolicy,
    ActuatorState,
    GateAngles,
    HardwareDriver,
    Indicator,
    IndicatorConfig,
    IndicatorLines,
    LoggingDriver,
    ServoConfig,
};

#[cfg(target_os = "linux")]
pub use actuator::GpiodIndicators;

pub use stats::{
    SessionStats,
    StatsAccumulator,
    StatsUpdate,
};

pub use snapshot::{
    JsonFileStore,
    MemoryStore,
    SnapshotStore,
};

pub use report::SessionReport;

pub use config::{
    SorterConfig,
    SorterConfigBuilder,
    DEFAULT_SNAPSHOT_PATH,
    MAX_GATE_ANGLE,
};

pub use engine::{
    PipelineTimings,
    ScanOutcome,
    SortingEngine,
};

pub use source::{
    open_still,
    probe_camera,
    CameraConfig,
    CommandCaptureSource,
    FrameSource,
};
