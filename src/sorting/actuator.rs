//! Actuator policy and drivers
//!
//! The policy maps a category to the state the indicator lights and sorting
//! gate should take. Drivers turn that state into physical signals; the
//! classification path never talks to hardware itself.

mod driver;
mod hardware_driver;
mod indicator;
mod logging_driver;
mod policy;

pub use driver::ActuatorDriver;
pub use hardware_driver::{HardwareDriver, ServoConfig};
#[cfg(target_os = "linux")]
pub use indicator::GpiodIndicators;
pub use indicator::{IndicatorConfig, IndicatorLines};
pub use logging_driver::LoggingDriver;
pub use policy::{angle_to_duty, ActuatorPolicy, ActuatorState, GateAngles, Indicator};
