//! Driver for the indicator LEDs and the gate servo.
//!
//! LEDs go through [`IndicatorLines`]; the servo is a hardware PWM channel
//! under the sysfs PWM class. After each gate move the driver waits for the
//! servo to settle and then stops sending pulses, which keeps cheap servos
//! from jittering while they hold position.

use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use tracing::{debug, info};

use crate::sorting::actuator::driver::ActuatorDriver;
use crate::sorting::actuator::indicator::IndicatorLines;
use crate::sorting::actuator::policy::{angle_to_duty, ActuatorState, Indicator};
use crate::sorting::common::error::{Result, SortError};

#[derive(Debug, Clone)]
pub struct ServoConfig {
    /// Usually `/sys/class/pwm`.
    pub pwm_root: PathBuf,
    pub pwm_chip: u32,
    pub pwm_channel: u32,
    /// 50 Hz.
    pub period_ns: u64,
    /// Time the servo needs to reach a new angle.
    pub settle: Duration,
}

impl Default for ServoConfig {
    fn default() -> Self {
        Self {
            pwm_root: PathBuf::from("/sys/class/pwm"),
            pwm_chip: 0,
            pwm_channel: 0,
            period_ns: 20_000_000,
            settle: Duration::from_millis(400),
        }
    }
}

struct PwmServo {
    config: ServoConfig,
    dir: PathBuf,
}

impl PwmServo {
    /// Exports and configures the channel, leaving it enabled with no pulses.
    fn open(config: ServoConfig) -> Result<Self> {
        let chip = config.pwm_root.join(format!("pwmchip{}", config.pwm_chip));
        let dir = chip.join(format!("pwm{}", config.pwm_channel));

        if !dir.exists() {
            write_attr(&chip.join("export"), &config.pwm_channel.to_string())?;
            if !dir.exists() {
                return Err(SortError::Actuator(format!(
                    "{} did not appear after export",
                    dir.display()
                )));
            }
        }
        write_attr(&dir.join("period"), &config.period_ns.to_string())?;
        write_attr(&dir.join("duty_cycle"), "0")?;
        write_attr(&dir.join("enable"), "1")?;

        Ok(Self { config, dir })
    }

    fn duty_ns(&self, angle: u16) -> u64 {
        (self.config.period_ns as f64 * angle_to_duty(angle) / 100.0).round() as u64
    }

    fn move_to(&self, angle: u16) -> Result<()> {
        let duty_cycle = self.dir.join("duty_cycle");
        let duty = self.duty_ns(angle);
        debug!(angle, duty_ns = duty, "Moving gate");

        write_attr(&duty_cycle, &duty.to_string())?;
        if !self.config.settle.is_zero() {
            thread::sleep(self.config.settle);
        }
        write_attr(&duty_cycle, "0")
    }

    fn disable(&self) -> Result<()> {
        write_attr(&self.dir.join("enable"), "0")
    }
}

pub struct HardwareDriver<L: IndicatorLines> {
    indicators: L,
    servo: PwmServo,
}

impl<L: IndicatorLines> HardwareDriver<L> {
    /// Takes already-requested indicator lines and sets up the servo channel.
    /// Both LEDs start off.
    pub fn open(mut indicators: L, servo: ServoConfig) -> Result<Self> {
        indicators.set(false, false)?;
        let servo = PwmServo::open(servo)?;

        info!(pwm = %servo.dir.display(), "Actuator driver ready");
        Ok(Self { indicators, servo })
    }
}

impl<L: IndicatorLines> ActuatorDriver for HardwareDriver<L> {
    fn apply(&mut self, state: &ActuatorState) -> Result<()> {
        self.indicators.set(
            state.indicator == Some(Indicator::Green),
            state.indicator == Some(Indicator::Red),
        )?;
        self.servo.move_to(state.gate_angle_degrees)
    }

    fn release(&mut self, rest: &ActuatorState) -> Result<()> {
        self.apply(rest)?;
        self.indicators.set(false, false)?;
        self.servo.disable()
    }
}

fn write_attr(path: &Path, value: &str) -> Result<()> {
    std::fs::write(path, value)
        .map_err(|e| SortError::Actuator(format!("{}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::sorting::actuator::ActuatorPolicy;
    use crate::sorting::classify::Category;

    /// Records every `(green, red)` pair it is asked to show.
    #[derive(Clone, Default)]
    struct RecordingLines {
        states: Rc<RefCell<Vec<(bool, bool)>>>,
    }

    impl RecordingLines {
        fn last(&self) -> Option<(bool, bool)> {
            self.states.borrow().last().copied()
        }
    }

    impl IndicatorLines for RecordingLines {
        fn set(&mut self, green: bool, red: bool) -> Result<()> {
            self.states.borrow_mut().push((green, red));
            Ok(())
        }
    }

    struct DeadLines;

    impl IndicatorLines for DeadLines {
        fn set(&mut self, _green: bool, _red: bool) -> Result<()> {
            Err(SortError::Actuator("line busy".to_string()))
        }
    }

    fn fake_pwm() -> (tempfile::TempDir, ServoConfig) {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(root.path().join("pwmchip0/pwm0")).unwrap();
        let config = ServoConfig {
            pwm_root: root.path().to_path_buf(),
            settle: Duration::ZERO,
            ..ServoConfig::default()
        };
        (root, config)
    }

    fn read(root: &Path, attr: &str) -> String {
        std::fs::read_to_string(root.join(attr)).unwrap()
    }

    #[test]
    fn test_open_configures_outputs() {
        let (root, config) = fake_pwm();
        let lines = RecordingLines::default();
        HardwareDriver::open(lines.clone(), config).unwrap();

        assert_eq!(lines.last(), Some((false, false)));
        assert_eq!(read(root.path(), "pwmchip0/pwm0/period"), "20000000");
        assert_eq!(read(root.path(), "pwmchip0/pwm0/enable"), "1");
    }

    #[test]
    fn test_apply_blend_lights_red() {
        let (root, config) = fake_pwm();
        let lines = RecordingLines::default();
        let mut driver = HardwareDriver::open(lines.clone(), config).unwrap();
        let policy = ActuatorPolicy::default();

        driver.apply(&policy.target(Category::Blend)).unwrap();

        assert_eq!(lines.last(), Some((false, true)));
        // Pulses stop once the gate has settled.
        assert_eq!(read(root.path(), "pwmchip0/pwm0/duty_cycle"), "0");
    }

    #[test]
    fn test_duty_for_angles() {
        let (_root, config) = fake_pwm();
        let servo = PwmServo::open(config).unwrap();
        assert_eq!(servo.duty_ns(0), 500_000);
        assert_eq!(servo.duty_ns(90), 1_500_000);
        assert_eq!(servo.duty_ns(180), 2_500_000);
    }

    #[test]
    fn test_release_turns_off_and_disables_pwm() {
        let (root, config) = fake_pwm();
        let lines = RecordingLines::default();
        let mut driver = HardwareDriver::open(lines.clone(), config).unwrap();
        let policy = ActuatorPolicy::default();

        driver.apply(&policy.target(Category::Pure)).unwrap();
        assert_eq!(lines.last(), Some((true, false)));

        driver.release(&policy.rest()).unwrap();
        assert_eq!(lines.last(), Some((false, false)));
        assert_eq!(read(root.path(), "pwmchip0/pwm0/enable"), "0");
    }

    #[test]
    fn test_missing_pwm_channel_after_export_fails() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(root.path().join("pwmchip0")).unwrap();
        let config = ServoConfig {
            pwm_root: root.path().to_path_buf(),
            settle: Duration::ZERO,
            ..ServoConfig::default()
        };

        let result = HardwareDriver::open(RecordingLines::default(), config);
        assert!(matches!(result, Err(SortError::Actuator(_))));
    }

    #[test]
    fn test_indicator_failure_is_actuator_error() {
        let (_root, config) = fake_pwm();
        let result = HardwareDriver::open(DeadLines, config);
        assert!(matches!(result, Err(SortError::Actuator(msg)) if msg.contains("line busy")));
    }
}
