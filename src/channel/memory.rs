//! In-process control target for tests and dry runs.

use super::{ChannelError, ControlCode, ControlEndpoint, ControlHandle, READ_SETTINGS, WRITE_SETTINGS};
use crate::settings::{wire, Settings};
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

#[derive(Debug, Default)]
struct MemoryState {
    installed: bool,
    block: Vec<u8>,
    fail_with: Option<i32>,
    opens: usize,
    closes: usize,
    writes: usize,
}

/// Endpoint that keeps the stored block in memory.
///
/// Clones share state, so a test can keep one copy as a probe while another is
/// handed to the code under test.
#[derive(Debug, Clone)]
pub struct MemoryEndpoint {
    name: String,
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryEndpoint {
    pub fn new(initial: Settings) -> Self {
        Self::with_block(wire::encode(&initial).to_vec())
    }

    /// An installed endpoint holding an arbitrary, possibly malformed, block.
    pub fn with_block(block: Vec<u8>) -> Self {
        Self::from_state(MemoryState {
            installed: true,
            block,
            ..MemoryState::default()
        })
    }

    /// An endpoint whose target does not exist.
    pub fn missing() -> Self {
        Self::from_state(MemoryState::default())
    }

    fn from_state(state: MemoryState) -> Self {
        Self {
            name: "memory".to_string(),
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Makes every following request fail with the given OS error code, or
    /// succeed again with `None`.
    pub fn fail_requests(&self, code: Option<i32>) {
        self.lock().fail_with = code;
    }

    /// The stored record, if the stored block decodes.
    pub fn stored(&self) -> Option<Settings> {
        wire::decode(&self.lock().block).ok()
    }

    pub fn open_count(&self) -> usize {
        self.lock().opens
    }

    pub fn close_count(&self) -> usize {
        self.lock().closes
    }

    pub fn write_count(&self) -> usize {
        self.lock().writes
    }
}

impl ControlEndpoint for MemoryEndpoint {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&self) -> Result<Box<dyn ControlHandle + '_>, ChannelError> {
        let mut state = self.lock();
        if !state.installed {
            debug!("Memory endpoint is not installed");
            return Err(ChannelError::not_installed(&self.name));
        }
        state.opens += 1;
        Ok(Box::new(MemoryHandle { endpoint: self }))
    }
}

struct MemoryHandle<'a> {
    endpoint: &'a MemoryEndpoint,
}

impl ControlHandle for MemoryHandle<'_> {
    fn control(
        &mut self,
        code: ControlCode,
        input: &[u8],
        output: &mut [u8],
    ) -> io::Result<usize> {
        let mut state = self.endpoint.lock();
        if let Some(os_code) = state.fail_with {
            return Err(io::Error::from_raw_os_error(os_code));
        }

        match code {
            READ_SETTINGS => {
                let n = state.block.len().min(output.len());
                output[..n].copy_from_slice(&state.block[..n]);
                Ok(n)
            }
            WRITE_SETTINGS => {
                state.block = input.to_vec();
                state.writes += 1;
                Ok(0)
            }
            other => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("unsupported control code {other:#x}"),
            )),
        }
    }
}

impl Drop for MemoryHandle<'_> {
    fn drop(&mut self) {
        self.endpoint.lock().closes += 1;
    }
}
