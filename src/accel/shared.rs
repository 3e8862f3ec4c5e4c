//! Atomically replaceable pipeline for a running sample loop.

use super::Modifier;
use crate::settings::{Milliseconds, Settings, Vec2};
use arc_swap::{ArcSwap, Guard};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::info;

/// Holds the current [`Modifier`] for one input stream.
///
/// Readers on the sample path never block; a writer builds a complete pipeline
/// first and then swaps the reference, so an in-flight `modify` always sees one
/// whole pipeline.
#[derive(Debug)]
pub struct SharedModifier {
    current: ArcSwap<Modifier>,
    version: AtomicU64,
}

pub type SharedModifierRef = Arc<SharedModifier>;

impl Default for SharedModifier {
    fn default() -> Self {
        Self::new(Modifier::default())
    }
}

impl SharedModifier {
    pub fn new(initial: Modifier) -> Self {
        Self {
            current: ArcSwap::from_pointee(initial),
            version: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn load(&self) -> Guard<Arc<Modifier>> {
        self.current.load()
    }

    #[inline]
    pub fn modify(&self, movement: Vec2<f64>, time_ms: Milliseconds) -> Vec2<f64> {
        self.current.load().modify(movement, time_ms)
    }

    /// Builds a pipeline from `settings` and publishes it. Returns the new version.
    pub fn replace(&self, settings: &Settings) -> u64 {
        self.publish(Modifier::new(settings))
    }

    pub fn publish(&self, modifier: Modifier) -> u64 {
        self.current.store(Arc::new(modifier));
        let version = self
            .version
            .fetch_add(1, Ordering::AcqRel)
            .saturating_add(1);
        info!("Published modifier version {}", version);
        version
    }

    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }
}
