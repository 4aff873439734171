//! Indicator LED lines.
//!
//! The two LEDs are plain GPIO outputs requested from a character-device chip
//! as one line set, so both change in a single request.

use crate::sorting::common::error::Result;
#[cfg(target_os = "linux")]
use crate::sorting::common::error::SortError;

pub trait IndicatorLines {
    fn set(&mut self, green: bool, red: bool) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct IndicatorConfig {
    /// Chip name or path, e.g. `gpiochip0`.
    pub chip: String,
    /// Line offsets on the chip (BCM numbers on a Raspberry Pi).
    pub green_line: u32,
    pub red_line: u32,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            chip: "gpiochip0".to_string(),
            green_line: 17,
            red_line: 27,
        }
    }
}

#[cfg(target_os = "linux")]
pub struct GpiodIndicators {
    lines: gpiod::Lines<gpiod::Output>,
    chip: String,
}

#[cfg(target_os = "linux")]
impl GpiodIndicators {
    /// Requests both lines as outputs, initially off.
    pub fn open(config: &IndicatorConfig) -> Result<Self> {
        let chip = gpiod::Chip::new(&config.chip)
            .map_err(|e| SortError::Actuator(format!("{}: {}", config.chip, e)))?;
        let options = gpiod::Options::output([config.green_line, config.red_line])
            .values([false, false])
            .consumer("fibertrace");
        let lines = chip.request_lines(options).map_err(|e| {
            SortError::Actuator(format!(
                "{} lines {}/{}: {}",
                config.chip, config.green_line, config.red_line, e
            ))
        })?;

        tracing::info!(
            chip = %config.chip,
            green = config.green_line,
            red = config.red_line,
            "Indicator lines ready"
        );
        Ok(Self {
            lines,
            chip: config.chip.clone(),
        })
    }
}

#[cfg(target_os = "linux")]
impl IndicatorLines for GpiodIndicators {
    fn set(&mut self, green: bool, red: bool) -> Result<()> {
        self.lines
            .set_values([green, red])
            .map_err(|e| SortError::Actuator(format!("{}: {}", self.chip, e)))
    }
}
