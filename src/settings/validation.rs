//! Constraint checks for acceleration parameters.
//!
//! Violations are reported, never enforced: an accelerator built from violating
//! parameters degrades to a constant scale instead of failing.

use super::{AccelArgs, GainMode};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum AccelViolation {
    #[error("gamma can not be 0")]
    ZeroGamma,

    #[error("motivity must be greater than 1")]
    MotivityTooLow,

    #[error("synchronous speed must be positive")]
    NonPositiveSynchronousSpeed,
}

/// Lists every constraint `args` violates, in a stable order.
///
/// All curve shapes currently share the same constraints, so `_mode` does not
/// change the outcome.
pub fn accel_errors(_mode: GainMode, args: &AccelArgs) -> Vec<AccelViolation> {
    let mut errors = Vec::new();

    if args.gamma == 0.0 {
        errors.push(AccelViolation::ZeroGamma);
    }
    if args.motivity <= 1.0 {
        errors.push(AccelViolation::MotivityTooLow);
    }
    if args.synchronous_speed <= 0.0 {
        errors.push(AccelViolation::NonPositiveSynchronousSpeed);
    }

    errors
}

/// Violations per axis for a whole record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsErrors {
    pub x: Vec<AccelViolation>,
    pub y: Vec<AccelViolation>,
}

impl SettingsErrors {
    pub fn is_empty(&self) -> bool {
        self.x.is_empty() && self.y.is_empty()
    }

    /// Human-readable lines prefixed with the axis name.
    pub fn messages(&self) -> Vec<String> {
        self.x
            .iter()
            .map(|e| format!("x: {e}"))
            .chain(self.y.iter().map(|e| format!("y: {e}")))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_args_are_valid() {
        for mode in GainMode::ALL {
            assert!(accel_errors(mode, &AccelArgs::default()).is_empty());
        }
    }

    #[test]
    fn every_violation_is_reported() {
        let args = AccelArgs {
            motivity: 1.0,
            synchronous_speed: 0.0,
            gamma: 0.0,
            hard_cap: 0.0,
        };
        assert_eq!(
            accel_errors(GainMode::Tanh, &args),
            vec![
                AccelViolation::ZeroGamma,
                AccelViolation::MotivityTooLow,
                AccelViolation::NonPositiveSynchronousSpeed,
            ]
        );
    }

    #[test]
    fn messages_are_prefixed_by_axis() {
        let errors = SettingsErrors {
            x: vec![AccelViolation::MotivityTooLow],
            y: vec![AccelViolation::NonPositiveSynchronousSpeed],
        };
        assert_eq!(
            errors.messages(),
            vec![
                "x: motivity must be greater than 1".to_string(),
                "y: synchronous speed must be positive".to_string(),
            ]
        );
    }
}
