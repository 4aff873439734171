use std::fmt;

use crate::sorting::classify::Category;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    Green,
    Red,
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Indicator::Green => write!(f, "green"),
            Indicator::Red => write!(f, "red"),
        }
    }
}

/// Gate servo positions in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateAngles {
    /// Points the gate at the pure-bale bin.
    pub good: u16,
    /// Points the gate at the blend bin.
    pub bad: u16,
    /// Neutral resting position.
    pub center: u16,
}

impl Default for GateAngles {
    fn default() -> Self {
        Self {
            good: 40,
            bad: 140,
            center: 90,
        }
    }
}

/// A command for the hardware: which indicator to light and where to point
/// the gate. `indicator` is `None` only in the rest state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActuatorState {
    pub indicator: Option<Indicator>,
    pub gate_angle_degrees: u16,
}

impl ActuatorState {
    pub fn is_rest(&self) -> bool {
        self.indicator.is_none()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ActuatorPolicy {
    angles: GateAngles,
}

impl ActuatorPolicy {
    pub fn new(angles: GateAngles) -> Self {
        Self { angles }
    }

    pub fn target(&self, category: Category) -> ActuatorState {
        match category {
            Category::Pure => ActuatorState {
                indicator: Some(Indicator::Green),
                gate_angle_degrees: self.angles.good,
            },
            Category::Blend => ActuatorState {
                indicator: Some(Indicator::Red),
                gate_angle_degrees: self.angles.bad,
            },
        }
    }

    /// State before any scan and after the hardware is released.
    pub fn rest(&self) -> ActuatorState {
        ActuatorState {
            indicator: None,
            gate_angle_degrees: self.angles.center,
        }
    }
}

/// Duty cycle in percent for a standard 50 Hz hobby servo.
///
/// 0 degrees maps to 2.5%, 180 degrees to 12.5%.
pub fn angle_to_duty(angle: u16) -> f64 {
    2.5 + angle as f64 / 18.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_default_policy_targets() {
        let policy = ActuatorPolicy::default();

        let pure = policy.target(Category::Pure);
        assert_eq!(pure.indicator, Some(Indicator::Green));
        assert_eq!(pure.gate_angle_degrees, 40);

        let blend = policy.target(Category::Blend);
        assert_eq!(blend.indicator, Some(Indicator::Red));
        assert_eq!(blend.gate_angle_degrees, 140);

        let rest = policy.rest();
        assert!(rest.is_rest());
        assert_eq!(rest.gate_angle_degrees, 90);
    }

    #[test]
    fn test_configured_angles() {
        let policy = ActuatorPolicy::new(GateAngles { good: 10, bad: 170, center: 95 });
        assert_eq!(policy.target(Category::Pure).gate_angle_degrees, 10);
        assert_eq!(policy.target(Category::Blend).gate_angle_degrees, 170);
        assert_eq!(policy.rest().gate_angle_degrees, 95);
    }

    #[test]
    fn test_angle_to_duty() {
        assert_abs_diff_eq!(angle_to_duty(0), 2.5);
        assert_abs_diff_eq!(angle_to_duty(90), 7.5);
        assert_abs_diff_eq!(angle_to_duty(180), 12.5);
    }
}
