//! Control target for the installed driver device on Windows.

use super::{ChannelError, ControlCode, ControlEndpoint, ControlHandle};
use std::ffi::c_void;
use std::io;
use tracing::debug;
use windows::core::HSTRING;
use windows::Win32::Foundation::{CloseHandle, HANDLE};
use windows::Win32::Storage::FileSystem::{
    CreateFileW, FILE_FLAGS_AND_ATTRIBUTES, FILE_SHARE_MODE, OPEN_EXISTING,
};
use windows::Win32::System::IO::DeviceIoControl;

/// Device name the driver registers.
pub const DEFAULT_DEVICE: &str = r"\\.\rawaccel";

#[derive(Debug, Clone)]
pub struct DriverEndpoint {
    device: String,
}

impl Default for DriverEndpoint {
    fn default() -> Self {
        Self::new(DEFAULT_DEVICE)
    }
}

impl DriverEndpoint {
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
        }
    }
}

impl ControlEndpoint for DriverEndpoint {
    fn name(&self) -> &str {
        &self.device
    }

    fn open(&self) -> Result<Box<dyn ControlHandle + '_>, ChannelError> {
        let device = HSTRING::from(self.device.as_str());
        // SAFETY: `device` outlives the call; no security attributes or template.
        let handle = unsafe {
            CreateFileW(
                &device,
                0,
                FILE_SHARE_MODE(0),
                None,
                OPEN_EXISTING,
                FILE_FLAGS_AND_ATTRIBUTES(0),
                HANDLE::default(),
            )
        }
        .map_err(|e| {
            debug!("Unable to open {}: {}", self.device, e);
            ChannelError::not_installed(&self.device)
        })?;

        debug!("Opened {}", self.device);
        Ok(Box::new(DriverHandle { handle }))
    }
}

struct DriverHandle {
    handle: HANDLE,
}

impl ControlHandle for DriverHandle {
    fn control(
        &mut self,
        code: ControlCode,
        input: &[u8],
        output: &mut [u8],
    ) -> io::Result<usize> {
        let mut returned = 0u32;
        let input_ptr = (!input.is_empty()).then(|| input.as_ptr() as *const c_void);
        let output_ptr = (!output.is_empty()).then(|| output.as_mut_ptr() as *mut c_void);

        // SAFETY: buffer pointers and lengths come from live slices and the
        // request is synchronous (no OVERLAPPED).
        unsafe {
            DeviceIoControl(
                self.handle,
                code,
                input_ptr,
                input.len() as u32,
                output_ptr,
                output.len() as u32,
                Some(&mut returned as *mut u32),
                None,
            )
        }
        .map_err(|_| io::Error::last_os_error())?;

        Ok(returned as usize)
    }
}

impl Drop for DriverHandle {
    fn drop(&mut self) {
        // SAFETY: the handle came from CreateFileW and is closed exactly once.
        if let Err(e) = unsafe { CloseHandle(self.handle) } {
            debug!("CloseHandle failed: {}", e);
        }
    }
}
