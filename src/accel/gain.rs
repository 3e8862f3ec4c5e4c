//! Curve shapes selectable through [`GainMode`].

use crate::settings::GainMode;
use std::f64::consts::{FRAC_2_PI, FRAC_PI_2};

/// Returned by shapes without a defined closed form. A transferred value of zero
/// yields a scale of exactly one.
pub const NEUTRAL_TRANSFER: f64 = 0.0;

/// Evaluates the curve selected by `mode` at `x`.
///
/// Total over finite input: large magnitudes saturate instead of producing NaN.
#[inline]
pub fn transfer(mode: GainMode, x: f64) -> f64 {
    match mode {
        GainMode::Tanh => x.tanh(),
        GainMode::Gudermannian => gudermannian(x),
        // Not yet defined. These selectors are reserved so the wire tags stay
        // stable; they evaluate to the neutral value until a formula is settled.
        GainMode::Erf | GainMode::Clamp | GainMode::Softplus => NEUTRAL_TRANSFER,
    }
}

/// `(2/π)·atan(sinh(x·π/2))`, a sigmoid normalised to (-1, 1) like tanh.
#[inline]
fn gudermannian(x: f64) -> f64 {
    FRAC_2_PI * (x * FRAC_PI_2).sinh().atan()
}

/// Source of curve values for an [`Accelerator`](super::Accelerator).
#[derive(Debug, Clone, PartialEq)]
pub enum Gain {
    /// Closed-form curve.
    Function(GainMode),
    /// Precomputed curve samples.
    ///
    /// Lookup evaluation is not defined yet; the table is carried so the variant
    /// keeps a stable shape, and evaluation returns [`NEUTRAL_TRANSFER`].
    LookupTable(Box<[f64]>),
}

impl Default for Gain {
    fn default() -> Self {
        Gain::Function(GainMode::default())
    }
}

impl Gain {
    #[inline]
    pub fn evaluate(&self, x: f64) -> f64 {
        match self {
            Gain::Function(mode) => transfer(*mode, x),
            Gain::LookupTable(_) => NEUTRAL_TRANSFER,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tanh_matches_std() {
        for x in [-3.0, -0.5, 0.0, 0.25, 2.0] {
            assert_eq!(transfer(GainMode::Tanh, x), f64::tanh(x));
        }
    }

    #[test]
    fn gudermannian_is_odd_sigmoid() {
        assert_eq!(transfer(GainMode::Gudermannian, 0.0), 0.0);
        let a = transfer(GainMode::Gudermannian, 0.7);
        let b = transfer(GainMode::Gudermannian, -0.7);
        assert!((a + b).abs() < 1e-15);
        assert!(a > 0.0 && a < 1.0);
        // gd(1) = (2/π)·atan(sinh(π/2))
        let expected = FRAC_2_PI * (FRAC_PI_2).sinh().atan();
        assert!((transfer(GainMode::Gudermannian, 1.0) - expected).abs() < 1e-15);
    }

    #[test]
    fn curves_saturate_for_huge_input() {
        for mode in GainMode::ALL {
            for x in [-1e6, 1e6, f64::MAX, f64::MIN] {
                let y = transfer(mode, x);
                assert!(y.is_finite(), "{mode} produced {y} at {x}");
                assert!(y.abs() <= 1.0 + 1e-12);
            }
        }
    }

    #[test]
    fn reserved_shapes_are_neutral() {
        for mode in [GainMode::Erf, GainMode::Clamp, GainMode::Softplus] {
            assert!(!mode.is_implemented());
            assert_eq!(transfer(mode, 1.5), NEUTRAL_TRANSFER);
        }
    }

    #[test]
    fn lookup_table_is_neutral() {
        let gain = Gain::LookupTable(vec![0.1, 0.2, 0.3].into_boxed_slice());
        assert_eq!(gain.evaluate(0.4), NEUTRAL_TRANSFER);
    }
}
