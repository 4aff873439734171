use tracing::info;

use crate::sorting::actuator::driver::ActuatorDriver;
use crate::sorting::actuator::policy::{angle_to_duty, ActuatorState};
use crate::sorting::common::error::Result;

/// Dry-run driver: records and logs every command instead of touching pins.
#[derive(Debug, Default)]
pub struct LoggingDriver {
    history: Vec<ActuatorState>,
}

impl LoggingDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> &[ActuatorState] {
        &self.history
    }

    pub fn last(&self) -> Option<&ActuatorState> {
        self.history.last()
    }
}

impl ActuatorDriver for LoggingDriver {
    fn apply(&mut self, state: &ActuatorState) -> Result<()> {
        match state.indicator {
            Some(indicator) => info!(
                indicator = %indicator,
                angle = state.gate_angle_degrees,
                duty = angle_to_duty(state.gate_angle_degrees),
                "Actuate (dry run)"
            ),
            None => info!(
                angle = state.gate_angle_degrees,
                "Indicators off, gate to rest (dry run)"
            ),
        }
        self.history.push(*state);
        Ok(())
    }
}
