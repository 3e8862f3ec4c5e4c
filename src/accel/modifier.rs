//! Pipeline applied to every pointer sample.

use super::{Accelerator, Rotator};
use crate::channel::{self, ChannelError, ControlEndpoint};
use crate::settings::{Milliseconds, Settings, Vec2};
use tracing::debug;

/// Rotation, acceleration and sensitivity built from one [`Settings`] record.
///
/// Immutable once built. A configuration change builds a new `Modifier`; see
/// [`SharedModifier`](super::SharedModifier) for publishing it to a running
/// sample loop.
#[derive(Debug, Clone, PartialEq)]
pub struct Modifier {
    rotator: Option<Rotator>,
    accels: Option<Vec2<Accelerator>>,
    combine_axes: bool,
    sensitivity: Vec2<f64>,
    min_time_ms: Milliseconds,
}

impl Default for Modifier {
    fn default() -> Self {
        Self::new(&Settings::default())
    }
}

impl From<&Settings> for Modifier {
    fn from(settings: &Settings) -> Self {
        Self::new(settings)
    }
}

impl Modifier {
    pub fn new(settings: &Settings) -> Self {
        let accels = settings.apply_acceleration.then(|| {
            Vec2::new(
                Accelerator::new(&settings.accel_params.x, settings.modes.x),
                Accelerator::new(&settings.accel_params.y, settings.modes.y),
            )
        });

        let rotator = (settings.rotation_degrees != 0.0)
            .then(|| Rotator::new(settings.rotation_degrees));

        let sensitivity = settings
            .sensitivity
            .map(|s| if s == 0.0 { 1.0 } else { s });

        debug!(
            "Built modifier: rotation={} accel={} combined={} sensitivity=({}, {})",
            rotator.is_some(),
            accels.is_some(),
            settings.combine_axes,
            sensitivity.x,
            sensitivity.y
        );

        Self {
            rotator,
            accels,
            combine_axes: settings.combine_axes,
            sensitivity,
            min_time_ms: settings.min_time_ms,
        }
    }

    /// Reads the active record from `endpoint` and builds a pipeline from it.
    pub fn from_active(endpoint: &dyn ControlEndpoint) -> Result<Self, ChannelError> {
        channel::read(endpoint).map(|settings| Self::new(&settings))
    }

    /// Transforms one sample. `time_ms` is the elapsed time since the previous
    /// sample and must be positive.
    #[inline]
    pub fn modify(&self, movement: Vec2<f64>, time_ms: Milliseconds) -> Vec2<f64> {
        let movement = self.apply_rotation(movement);
        let movement = self.apply_acceleration(movement, time_ms);
        self.apply_sensitivity(movement)
    }

    /// [`modify`](Self::modify) for raw integer counts.
    pub fn accelerate(&self, x: i32, y: i32, time_ms: Milliseconds) -> (f64, f64) {
        let out = self.modify(Vec2::new(f64::from(x), f64::from(y)), time_ms);
        (out.x, out.y)
    }

    /// Raises a measured elapsed time to the configured floor.
    #[inline]
    pub fn floor_time(&self, elapsed_ms: Milliseconds) -> Milliseconds {
        elapsed_ms.max(self.min_time_ms)
    }

    #[inline]
    fn apply_rotation(&self, movement: Vec2<f64>) -> Vec2<f64> {
        match &self.rotator {
            Some(rotator) => rotator.apply(movement),
            None => movement,
        }
    }

    #[inline]
    fn apply_acceleration(&self, mut movement: Vec2<f64>, time_ms: Milliseconds) -> Vec2<f64> {
        let Some(accels) = &self.accels else {
            return movement;
        };

        if self.combine_axes {
            let mag = movement.magnitude();
            if mag == 0.0 {
                return movement;
            }
            // Combined mode is driven by the x-axis parameters alone; the y
            // accelerator is built but not consulted. Changing this alters the
            // acceleration feel for every existing combined-mode profile.
            let scale = accels.x.apply(mag / time_ms);
            movement.x *= scale;
            movement.y *= scale;
        } else {
            if movement.x != 0.0 {
                movement.x *= accels.x.apply(movement.x.abs() / time_ms);
            }
            if movement.y != 0.0 {
                movement.y *= accels.y.apply(movement.y.abs() / time_ms);
            }
        }

        movement
    }

    #[inline]
    fn apply_sensitivity(&self, movement: Vec2<f64>) -> Vec2<f64> {
        Vec2::new(
            movement.x * self.sensitivity.x,
            movement.y * self.sensitivity.y,
        )
    }

    pub fn sensitivity(&self) -> Vec2<f64> {
        self.sensitivity
    }

    pub fn accelerators(&self) -> Option<&Vec2<Accelerator>> {
        self.accels.as_ref()
    }

    pub fn rotator(&self) -> Option<&Rotator> {
        self.rotator.as_ref()
    }

    pub fn combines_axes(&self) -> bool {
        self.combine_axes
    }

    pub fn min_time_ms(&self) -> Milliseconds {
        self.min_time_ms
    }
}
