//! Background worker that exchanges settings with the driver off the sample path.
//!
//! Channel calls block on I/O, so they never run on the thread that processes
//! samples. The worker owns the endpoint, executes each request on tokio's
//! blocking pool and republishes the [`SharedModifier`] after every successful
//! read or write.
//!
//! # State Machine
//!
//! ```text
//! Idle ──► Running ──► Stopped
//!  (start)     (shutdown / all handles dropped)
//! ```
//!
//! # Architecture
//!
//! ```text
//! SettingsHandle ──► SettingsAction ──► [SettingsService<Running>] ──► spawn_blocking(channel::read/write)
//!       ▲                                        │
//!       └────────── oneshot response ◄───────────┤
//!                                                ▼
//!                                         SharedModifier::replace
//! ```
//!
//! Requests are handled one at a time, so writes issued through one service are
//! serialised. Writes from other processes are not coordinated.

pub mod handle;
pub mod worker;

pub use handle::SettingsHandle;
pub use worker::{ServiceState, SettingsService};

use crate::channel::ChannelError;
use crate::settings::{Settings, WRITE_DELAY_MS};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::oneshot;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("settings service is not running")]
    ChannelClosed,

    #[error("blocking channel task failed: {0}")]
    TaskFailed(String),

    #[error(transparent)]
    Channel(#[from] ChannelError),
}

/// Requests accepted by a running [`SettingsService`].
#[derive(Debug)]
pub enum SettingsAction {
    ReadActive {
        response_tx: oneshot::Sender<Result<Settings, ServiceError>>,
    },
    WriteActive {
        settings: Settings,
        response_tx: oneshot::Sender<Result<(), ServiceError>>,
    },
    /// Rebuild the local pipeline without touching the driver.
    Rebuild {
        settings: Settings,
        response_tx: oneshot::Sender<u64>,
    },
}

/// Worker options.
#[derive(Clone, Debug)]
pub struct ServiceSettings {
    /// Delay writes so consecutive writes are at least `write_delay` apart.
    pub enforce_write_delay: bool,

    pub write_delay: Duration,

    /// Read the active record once at startup and publish it.
    pub load_on_start: bool,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            enforce_write_delay: true,
            write_delay: Duration::from_millis(WRITE_DELAY_MS as u64),
            load_on_start: true,
        }
    }
}
