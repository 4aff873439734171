//! Scan orchestration
//!
//! Region selection, classification, actuator policy and statistics in one
//! call. The engine never drives hardware; callers hand the returned
//! [`ActuatorState`](crate::sorting::ActuatorState) to a driver.

mod pipeline;
mod timing;


pub use pipeline::{ScanOutcome, SortingEngine};
pub use timing::{PipelineTimings, StepTiming, Timer};
