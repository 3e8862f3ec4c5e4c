//! Output bounds for an accelerator's scale.

/// Ceiling used when no cap is configured.
pub const DEFAULT_SCALE_CEILING: f64 = 9.0;

/// Saturating `[lo, hi]` bound on a scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleClamp {
    pub lo: f64,
    pub hi: f64,
}

impl Default for ScaleClamp {
    fn default() -> Self {
        Self {
            lo: 0.0,
            hi: DEFAULT_SCALE_CEILING,
        }
    }
}

impl ScaleClamp {
    /// Derives both bounds from one value:
    /// - `cap <= 0`: effectively uncapped, `[0, 9]`
    /// - `0 < cap < 1`: negative acceleration, `[cap, 1]`
    /// - `cap >= 1`: upper cap, `[0, cap]`
    pub fn from_hard_cap(cap: f64) -> Self {
        if cap <= 0.0 {
            return Self::default();
        }

        if cap < 1.0 {
            Self { lo: cap, hi: 1.0 }
        } else {
            Self {
                hi: cap,
                ..Self::default()
            }
        }
    }

    #[inline]
    pub fn apply(&self, scale: f64) -> f64 {
        scale.max(self.lo).min(self.hi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_follow_cap_rule() {
        assert_eq!(ScaleClamp::from_hard_cap(0.0), ScaleClamp { lo: 0.0, hi: 9.0 });
        assert_eq!(ScaleClamp::from_hard_cap(-2.0), ScaleClamp { lo: 0.0, hi: 9.0 });
        assert_eq!(ScaleClamp::from_hard_cap(0.5), ScaleClamp { lo: 0.5, hi: 1.0 });
        assert_eq!(ScaleClamp::from_hard_cap(1.0), ScaleClamp { lo: 0.0, hi: 1.0 });
        assert_eq!(ScaleClamp::from_hard_cap(3.0), ScaleClamp { lo: 0.0, hi: 3.0 });
    }

    #[test]
    fn apply_saturates_without_rounding() {
        let clamp = ScaleClamp::from_hard_cap(0.5);
        assert_eq!(clamp.apply(0.2), 0.5);
        assert_eq!(clamp.apply(0.7314), 0.7314);
        assert_eq!(clamp.apply(3.0), 1.0);
    }
}
