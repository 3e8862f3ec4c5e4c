//! Per-sample motion transform.
//!
//! Implements the rotate → accelerate → scale pipeline applied to every pointer
//! sample:
//!
//! ```text
//! Settings ──► Modifier::new ──► Modifier
//!                                   │
//!   (dx, dy, elapsed) ──► [Rotator] ──► [Accelerator x/y] ──► [Sensitivity] ──► (dx', dy')
//! ```
//!
//! Everything in here is pure and allocation-free on the sample path. A
//! [`Modifier`] is never mutated after construction; configuration changes build a
//! new one and publish it through [`SharedModifier`].

pub mod accelerator;
pub mod clamp;
pub mod gain;
pub mod modifier;
pub mod rotator;
pub mod shared;

pub use accelerator::Accelerator;
pub use clamp::ScaleClamp;
pub use gain::{transfer, Gain};
pub use modifier::Modifier;
pub use rotator::Rotator;
pub use shared::SharedModifier;
