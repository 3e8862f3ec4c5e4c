//! Whole-record exchange with the privileged driver component.
//!
//! The driver exposes a single named control target with two control codes:
//! [`READ_SETTINGS`] returns one encoded [`Settings`] block and
//! [`WRITE_SETTINGS`] accepts one. Every call opens a fresh handle, issues one
//! request and releases the handle on every exit path; there is no session state.
//!
//! # Architecture
//!
//! ```text
//! read()/write() ──► ControlEndpoint::open ──► ControlHandle::control ──► drop (close)
//!                         │
//!          ┌──────────────┼──────────────┐
//!   DriverEndpoint   FileEndpoint   MemoryEndpoint
//!   (Windows device) (path-backed)  (in-process fake)
//! ```
//!
//! # Error handling
//!
//! Failures are classified, never formatted for end users and never retried:
//! an endpoint that cannot be opened is [`ChannelError::NotInstalled`], a failed
//! control request is [`ChannelError::Io`]. A failed read never falls back to
//! defaults and a failed write leaves the driver's previous record in place.
//!
//! The channel does not pace writes. Callers must leave
//! [`WRITE_DELAY_MS`](crate::settings::WRITE_DELAY_MS) between writes, for
//! example with a [`WritePacer`].

pub mod file;
pub mod memory;
pub mod pacing;
#[cfg(target_os = "windows")]
pub mod windows;

use crate::settings::{wire, Settings, WireError, RECORD_SIZE};
use std::io;
use thiserror::Error;
use tracing::{debug, error, info};

pub use file::FileEndpoint;
pub use memory::MemoryEndpoint;
pub use pacing::WritePacer;
#[cfg(target_os = "windows")]
pub use self::windows::DriverEndpoint;

/// Opaque control code understood by the driver.
pub type ControlCode = u32;

const DEVICE_TYPE: u32 = 0x8888;
const METHOD_BUFFERED: u32 = 0;
const METHOD_OUT_DIRECT: u32 = 2;
const FILE_ANY_ACCESS: u32 = 0;

/// Same packing as the Windows `CTL_CODE` macro.
const fn ctl_code(device_type: u32, function: u32, method: u32, access: u32) -> ControlCode {
    (device_type << 16) | (access << 14) | (function << 2) | method
}

/// Reads the whole active record. Zero-length input, one record of output.
pub const READ_SETTINGS: ControlCode =
    ctl_code(DEVICE_TYPE, 0x888, METHOD_OUT_DIRECT, FILE_ANY_ACCESS);

/// Replaces the whole active record. One record of input, zero-length output.
pub const WRITE_SETTINGS: ControlCode =
    ctl_code(DEVICE_TYPE, 0x889, METHOD_BUFFERED, FILE_ANY_ACCESS);

/// Errors surfaced by channel operations.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The control target could not be opened; the driver is not loaded or not
    /// installed.
    #[error("driver endpoint {endpoint} is not installed")]
    NotInstalled { endpoint: String },

    /// The control target opened but the request failed.
    #[error("control request failed: {message}")]
    Io { code: Option<i32>, message: String },

    /// The driver answered with a block that is not a valid record.
    #[error("driver returned a malformed settings block: {0}")]
    MalformedRecord(#[from] WireError),
}

impl ChannelError {
    pub fn not_installed(endpoint: impl Into<String>) -> Self {
        ChannelError::NotInstalled {
            endpoint: endpoint.into(),
        }
    }

    pub fn from_io(err: &io::Error) -> Self {
        ChannelError::Io {
            code: err.raw_os_error(),
            message: err.to_string(),
        }
    }

    pub fn is_not_installed(&self) -> bool {
        matches!(self, ChannelError::NotInstalled { .. })
    }

    /// Any failure after the endpoint was opened.
    pub fn is_transport_failure(&self) -> bool {
        !self.is_not_installed()
    }
}

/// A named control target that can be opened on demand.
pub trait ControlEndpoint: Send + Sync {
    /// Name used in logs and errors.
    fn name(&self) -> &str;

    /// Opens a fresh handle. Failure to open means the target is absent and must
    /// be reported as [`ChannelError::NotInstalled`].
    fn open(&self) -> Result<Box<dyn ControlHandle + '_>, ChannelError>;
}

/// An open control target. Dropping the handle closes it.
pub trait ControlHandle {
    /// Issues one control request and returns the number of bytes written into
    /// `output`.
    fn control(&mut self, code: ControlCode, input: &[u8], output: &mut [u8])
        -> io::Result<usize>;
}

/// Opens `endpoint`, issues one request and closes it again, whatever the outcome.
fn request(
    endpoint: &dyn ControlEndpoint,
    code: ControlCode,
    input: &[u8],
    output: &mut [u8],
) -> Result<usize, ChannelError> {
    let mut handle = endpoint.open()?;
    let result = handle.control(code, input, output);
    drop(handle);

    result.map_err(|e| {
        error!("Control request {:#x} to {} failed: {}", code, endpoint.name(), e);
        ChannelError::from_io(&e)
    })
}

/// Reads the active record.
pub fn read(endpoint: &dyn ControlEndpoint) -> Result<Settings, ChannelError> {
    debug!("Reading settings from {}", endpoint.name());

    let mut block = [0u8; RECORD_SIZE];
    let returned = request(endpoint, READ_SETTINGS, &[], &mut block)?;

    if returned != RECORD_SIZE {
        error!(
            "Read from {} returned {} bytes, expected {}",
            endpoint.name(),
            returned,
            RECORD_SIZE
        );
        return Err(WireError::Length {
            expected: RECORD_SIZE,
            actual: returned,
        }
        .into());
    }

    let settings = wire::decode(&block)?;
    info!("Read active settings from {}", endpoint.name());
    Ok(settings)
}

/// Replaces the active record.
pub fn write(endpoint: &dyn ControlEndpoint, settings: &Settings) -> Result<(), ChannelError> {
    debug!("Writing settings to {}", endpoint.name());

    let block = wire::encode(settings);
    request(endpoint, WRITE_SETTINGS, &block, &mut [])?;

    info!("Wrote active settings to {}", endpoint.name());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{GainMode, Vec2};

    #[test]
    fn control_codes_use_ctl_code_packing() {
        assert_eq!(READ_SETTINGS, 0x8888_2222);
        assert_eq!(WRITE_SETTINGS, 0x8888_2224);
    }

    #[test]
    fn write_then_read_returns_same_record() {
        let endpoint = MemoryEndpoint::new(Settings::default());
        let settings = Settings {
            rotation_degrees: 4.0,
            apply_acceleration: true,
            modes: Vec2::new(GainMode::Gudermannian, GainMode::Tanh),
            ..Settings::default()
        };

        write(&endpoint, &settings).unwrap();
        assert_eq!(read(&endpoint).unwrap(), settings);
        assert_eq!(endpoint.open_count(), 2);
        assert_eq!(endpoint.close_count(), 2);
    }

    #[test]
    fn missing_endpoint_is_not_installed() {
        let endpoint = MemoryEndpoint::missing();

        let err = read(&endpoint).unwrap_err();
        assert!(err.is_not_installed());
        assert!(!err.is_transport_failure());

        let err = write(&endpoint, &Settings::default()).unwrap_err();
        assert!(matches!(err, ChannelError::NotInstalled { .. }));
    }

    #[test]
    fn failed_request_carries_os_code_and_closes_handle() {
        let endpoint = MemoryEndpoint::new(Settings::default());
        endpoint.fail_requests(Some(31));

        match read(&endpoint).unwrap_err() {
            ChannelError::Io { code, .. } => assert_eq!(code, Some(31)),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(write(&endpoint, &Settings::default())
            .unwrap_err()
            .is_transport_failure());
        assert_eq!(endpoint.open_count(), endpoint.close_count());
    }

    #[test]
    fn failed_write_keeps_previous_record() {
        let previous = Settings {
            sensitivity: Vec2::new(3.0, 3.0),
            ..Settings::default()
        };
        let endpoint = MemoryEndpoint::new(previous);
        endpoint.fail_requests(Some(5));

        assert!(write(&endpoint, &Settings::default()).is_err());
        assert_eq!(endpoint.stored(), Some(previous));
    }

    #[test]
    fn short_response_is_malformed() {
        let endpoint = MemoryEndpoint::with_block(vec![0u8; 40]);
        match read(&endpoint).unwrap_err() {
            ChannelError::MalformedRecord(WireError::Length { expected, actual }) => {
                assert_eq!(expected, RECORD_SIZE);
                assert_eq!(actual, 40);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
