use crate::sorting::actuator::policy::ActuatorState;
use crate::sorting::common::error::Result;

pub trait ActuatorDriver {
    fn apply(&mut self, state: &ActuatorState) -> Result<()>;

    /// Returns the hardware to `rest` and stops driving it.
    fn release(&mut self, rest: &ActuatorState) -> Result<()> {
        self.apply(rest)
    }
}
