//! Speed-dependent scale for one axis.

use super::{Gain, ScaleClamp};
use crate::settings::{AccelArgs, GainMode};

/// Closed-form constants derived once from [`AccelArgs`].
///
/// `m > 0` marks a degenerate curve whose scale is the constant `m`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct TransferConstants {
    m: f64,
    a: f64,
    c: f64,
    g: f64,
}

impl TransferConstants {
    fn new(args: &AccelArgs) -> Self {
        if args.gamma == 0.0 || args.motivity <= 1.0 {
            // No contrast between slow and fast input is possible.
            return Self {
                m: 1.0,
                ..Self::default()
            };
        }

        if args.synchronous_speed > 0.0 {
            let c = args.motivity.ln();
            Self {
                m: 0.0,
                a: args.synchronous_speed.ln(),
                c,
                g: args.gamma / c,
            }
        } else {
            // Every speed sits at the top of the curve.
            Self {
                m: args.motivity,
                ..Self::default()
            }
        }
    }
}

/// Maps an input speed to a scale for one axis.
///
/// Construction never fails: parameters that violate the curve's constraints
/// collapse to a constant scale instead (see
/// [`accel_errors`](crate::settings::accel_errors)).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Accelerator {
    gain: Gain,
    constants: TransferConstants,
    clamp: ScaleClamp,
}

impl Accelerator {
    pub fn new(args: &AccelArgs, mode: GainMode) -> Self {
        Self::with_gain(args, Gain::Function(mode))
    }

    pub fn with_lookup_table(args: &AccelArgs, table: Box<[f64]>) -> Self {
        Self::with_gain(args, Gain::LookupTable(table))
    }

    fn with_gain(args: &AccelArgs, gain: Gain) -> Self {
        Self {
            gain,
            constants: TransferConstants::new(args),
            clamp: ScaleClamp::from_hard_cap(args.hard_cap),
        }
    }

    /// Scale for `speed` (counts per millisecond). `speed` must be positive.
    #[inline]
    pub fn apply(&self, speed: f64) -> f64 {
        let k = &self.constants;
        if k.m > 0.0 {
            return k.m;
        }

        let transferred = k.g * (speed.ln() - k.a);
        self.clamp.apply((self.gain.evaluate(transferred) * k.c).exp())
    }

    pub fn clamp(&self) -> ScaleClamp {
        self.clamp
    }

    pub fn gain(&self) -> &Gain {
        &self.gain
    }

    /// Whether the scale varies with speed.
    pub fn is_curve_active(&self) -> bool {
        self.constants.m <= 0.0
    }
}
