//! Control target backed by a file holding one encoded record.
//!
//! Used where no driver device exists: the file stands in for the driver's
//! active record. A missing file is reported like a missing driver.

use super::{ChannelError, ControlCode, ControlEndpoint, ControlHandle, READ_SETTINGS, WRITE_SETTINGS};
use crate::settings::{wire, Settings};
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct FileEndpoint {
    path: PathBuf,
    name: String,
}

impl FileEndpoint {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path.display().to_string();
        Self { path, name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates the backing file holding `initial`, replacing any existing file.
    pub fn create(path: impl Into<PathBuf>, initial: &Settings) -> io::Result<Self> {
        let endpoint = Self::new(path);
        if let Some(parent) = endpoint.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&endpoint.path, wire::encode(initial))?;
        debug!("Created file endpoint at {}", endpoint.name);
        Ok(endpoint)
    }
}

impl ControlEndpoint for FileEndpoint {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&self) -> Result<Box<dyn ControlHandle + '_>, ChannelError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&self.path)
            .map_err(|e| {
                debug!("Unable to open {}: {}", self.name, e);
                ChannelError::not_installed(&self.name)
            })?;

        debug!("Opened {}", self.name);
        Ok(Box::new(FileHandle {
            file,
            name: &self.name,
        }))
    }
}

struct FileHandle<'a> {
    file: File,
    name: &'a str,
}

impl ControlHandle for FileHandle<'_> {
    /// A read reports the size of the stored block, which may differ from
    /// `output.len()` when the file does not hold exactly one record.
    fn control(
        &mut self,
        code: ControlCode,
        input: &[u8],
        output: &mut [u8],
    ) -> io::Result<usize> {
        match code {
            READ_SETTINGS => {
                let mut stored = Vec::with_capacity(output.len());
                self.file.seek(SeekFrom::Start(0))?;
                self.file.read_to_end(&mut stored)?;

                let n = stored.len().min(output.len());
                output[..n].copy_from_slice(&stored[..n]);
                Ok(stored.len())
            }
            WRITE_SETTINGS => {
                self.file.set_len(0)?;
                self.file.seek(SeekFrom::Start(0))?;
                self.file.write_all(input)?;
                self.file.sync_data()?;
                Ok(0)
            }
            other => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("unsupported control code {other:#x}"),
            )),
        }
    }
}

impl Drop for FileHandle<'_> {
    fn drop(&mut self) {
        debug!("Closed {}", self.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{read, write};
    use crate::settings::Vec2;

    #[test]
    fn missing_file_is_not_installed() {
        let dir = tempfile::tempdir().unwrap();
        let endpoint = FileEndpoint::new(dir.path().join("absent.bin"));
        assert!(read(&endpoint).unwrap_err().is_not_installed());
        assert!(write(&endpoint, &Settings::default())
            .unwrap_err()
            .is_not_installed());
    }

    #[test]
    fn write_replaces_whole_block() {
        let dir = tempfile::tempdir().unwrap();
        let endpoint = FileEndpoint::create(dir.path().join("active.bin"), &Settings::default()).unwrap();

        let settings = Settings {
            sensitivity: Vec2::new(1.5, 0.5),
            ..Settings::default()
        };
        write(&endpoint, &settings).unwrap();

        let bytes = std::fs::read(endpoint.path()).unwrap();
        assert_eq!(bytes.len(), wire::RECORD_SIZE);
        assert_eq!(read(&endpoint).unwrap(), settings);
    }

    #[test]
    fn oversized_file_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("active.bin");
        std::fs::write(&path, vec![0u8; wire::RECORD_SIZE + 8]).unwrap();

        let err = read(&FileEndpoint::new(path)).unwrap_err();
        assert!(matches!(err, ChannelError::MalformedRecord(_)));
        assert!(err.is_transport_failure());
    }
}
