//! Configuration record shared with the privileged driver component.
//!
//! [`Settings`] is the only payload the control channel carries. Its field order is
//! the wire order (see [`wire`]), so fields must never be reordered or resized
//! without changing both sides of the channel.
//!
//! The record is a plain value: it is default-constructed, read from the driver, or
//! assembled from user input, and then handed to a
//! [`Modifier`](crate::accel::Modifier) which is rebuilt wholesale whenever the
//! record changes.

pub mod validation;
pub mod wire;

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

pub use validation::{accel_errors, AccelViolation, SettingsErrors};
pub use wire::{WireError, RECORD_SIZE};

/// Milliseconds, as used for elapsed sample time and protocol delays.
pub type Milliseconds = f64;

/// Minimum interval callers must leave between two writes to the driver.
pub const WRITE_DELAY_MS: Milliseconds = 1000.0;

/// Default floor for the elapsed time of a single sample.
pub const DEFAULT_TIME_MIN_MS: Milliseconds = 0.4;

/// Pair of per-axis values.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2<T> {
    pub x: T,
    pub y: T,
}

impl<T> Vec2<T> {
    pub const fn new(x: T, y: T) -> Self {
        Self { x, y }
    }

    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> Vec2<U> {
        Vec2 {
            x: f(self.x),
            y: f(self.y),
        }
    }
}

impl Vec2<f64> {
    #[inline]
    pub fn magnitude(&self) -> f64 {
        self.x.hypot(self.y)
    }
}

/// Curve shape used by an axis accelerator.
///
/// The discriminants are the values carried on the wire.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
#[repr(u32)]
pub enum GainMode {
    #[default]
    Tanh = 0,
    #[serde(alias = "gd")]
    Gudermannian = 1,
    Erf = 2,
    Clamp = 3,
    Softplus = 4,
}

impl GainMode {
    pub const ALL: [GainMode; 5] = [
        GainMode::Tanh,
        GainMode::Gudermannian,
        GainMode::Erf,
        GainMode::Clamp,
        GainMode::Softplus,
    ];

    pub fn from_u32(tag: u32) -> Option<Self> {
        match tag {
            0 => Some(GainMode::Tanh),
            1 => Some(GainMode::Gudermannian),
            2 => Some(GainMode::Erf),
            3 => Some(GainMode::Clamp),
            4 => Some(GainMode::Softplus),
            _ => None,
        }
    }

    /// Whether the shape has a defined closed form.
    pub fn is_implemented(self) -> bool {
        matches!(self, GainMode::Tanh | GainMode::Gudermannian)
    }
}

impl From<GainMode> for u32 {
    fn from(mode: GainMode) -> Self {
        mode as u32
    }
}

impl Display for GainMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GainMode::Tanh => write!(f, "tanh"),
            GainMode::Gudermannian => write!(f, "gudermannian"),
            GainMode::Erf => write!(f, "erf"),
            GainMode::Clamp => write!(f, "clamp"),
            GainMode::Softplus => write!(f, "softplus"),
        }
    }
}

/// Acceleration parameters for one axis.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq)]
#[serde(default)]
pub struct AccelArgs {
    /// Maximum gain multiplier the curve approaches.
    pub motivity: f64,
    /// Input speed at the curve's midpoint.
    pub synchronous_speed: f64,
    pub gamma: f64,
    /// Derives both output bounds, see [`ScaleClamp`](crate::accel::ScaleClamp).
    pub hard_cap: f64,
}

impl Default for AccelArgs {
    fn default() -> Self {
        Self {
            motivity: std::f64::consts::SQRT_2,
            synchronous_speed: 16.0,
            gamma: 1.0,
            hard_cap: 0.0,
        }
    }
}

/// The whole configuration record.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub rotation_degrees: f64,
    pub apply_acceleration: bool,
    /// Drive acceleration from the vector magnitude instead of per axis.
    pub combine_axes: bool,
    pub modes: Vec2<GainMode>,
    pub accel_params: Vec2<AccelArgs>,
    /// Per-axis multipliers; zero is treated as one when a pipeline is built.
    pub sensitivity: Vec2<f64>,
    pub min_time_ms: Milliseconds,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rotation_degrees: 0.0,
            apply_acceleration: false,
            combine_axes: true,
            modes: Vec2::default(),
            accel_params: Vec2::default(),
            sensitivity: Vec2::new(1.0, 1.0),
            min_time_ms: DEFAULT_TIME_MIN_MS,
        }
    }
}

impl Settings {
    /// Validates both axes. The y axis is skipped when axes are combined, since
    /// only the x parameters drive the curve in that mode.
    pub fn errors(&self) -> SettingsErrors {
        SettingsErrors {
            x: accel_errors(self.modes.x, &self.accel_params.x),
            y: if self.combine_axes {
                Vec::new()
            } else {
                accel_errors(self.modes.y, &self.accel_params.y)
            },
        }
    }

    pub fn to_bytes(&self) -> [u8; RECORD_SIZE] {
        wire::encode(self)
    }

    pub fn from_bytes(block: &[u8]) -> Result<Self, WireError> {
        wire::decode(block)
    }
}
