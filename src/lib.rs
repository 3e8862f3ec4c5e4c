//! Pointer motion transform with driver settings exchange.
//!
//! - [`settings`]: the configuration record, its wire layout and validation
//! - [`accel`]: rotation, acceleration curve and sensitivity applied per sample
//! - [`channel`]: whole-record read/write against the driver's control target
//! - [`service`]: background worker that keeps channel I/O off the sample path
//! - [`config`]: configuration of the command-line front end

pub mod accel;
pub mod channel;
pub mod config;
pub mod service;
pub mod settings;

pub use accel::{Modifier, SharedModifier};
pub use channel::{ChannelError, ControlEndpoint};
pub use settings::{AccelArgs, GainMode, Settings, Vec2};
