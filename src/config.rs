//! Application configuration for the command-line front end.
//!
//! Stored as TOML under the user's config directory and created with defaults
//! on first use. Missing fields fall back to defaults so older files keep
//! loading.

use crate::channel::{ControlEndpoint, FileEndpoint};
use crate::service::ServiceSettings;
use color_eyre::eyre::{eyre, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

const CONFIG_DIR: &str = "pointer-accel";
const CONFIG_FILE: &str = "config.toml";
const ACTIVE_RECORD_FILE: &str = "active-settings.bin";

/// Which control target to talk to.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum EndpointConfig {
    /// Installed driver device (Windows only).
    Driver { device: String },
    /// File holding one encoded record.
    File { path: PathBuf },
}

impl Default for EndpointConfig {
    fn default() -> Self {
        if cfg!(target_os = "windows") {
            EndpointConfig::Driver {
                device: r"\\.\rawaccel".to_string(),
            }
        } else {
            let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
            path.push(CONFIG_DIR);
            path.push(ACTIVE_RECORD_FILE);
            EndpointConfig::File { path }
        }
    }
}

impl EndpointConfig {
    pub fn open_endpoint(&self) -> Result<Arc<dyn ControlEndpoint>> {
        match self {
            EndpointConfig::File { path } => Ok(Arc::new(FileEndpoint::new(path.clone()))),
            #[cfg(target_os = "windows")]
            EndpointConfig::Driver { device } => {
                Ok(Arc::new(crate::channel::DriverEndpoint::new(device.clone())))
            }
            #[cfg(not(target_os = "windows"))]
            EndpointConfig::Driver { device } => Err(eyre!(
                "Driver endpoint {} is only available on Windows",
                device
            )),
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub endpoint: EndpointConfig,

    /// tracing level: error, warn, info, debug or trace
    pub log_level: String,

    /// Delay writes issued through the settings service by `write_delay_ms`.
    pub enforce_write_delay: bool,

    pub write_delay_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        let service = ServiceSettings::default();
        Self {
            endpoint: EndpointConfig::default(),
            log_level: "info".to_string(),
            enforce_write_delay: service.enforce_write_delay,
            write_delay_ms: service.write_delay.as_millis() as u64,
        }
    }
}

impl AppConfig {
    /// `<config dir>/pointer-accel/config.toml`
    pub fn default_path() -> Result<PathBuf> {
        let mut path = dirs::config_dir().ok_or_else(|| eyre!("No config directory available"))?;
        path.push(CONFIG_DIR);
        path.push(CONFIG_FILE);
        Ok(path)
    }

    /// Loads the file at `path`, writing a default one first if it does not exist.
    pub async fn load_or_create(path: &Path) -> Result<Self> {
        if !tokio::fs::try_exists(path)
            .await
            .map_err(|e| eyre!("Failed to check config file {}: {}", path.display(), e))?
        {
            let config = Self::default();
            config.save(path).await?;
            info!("Created default config at {}", path.display());
            return Ok(config);
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;
        let config = toml::from_str(&content)
            .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| eyre!("Failed to create config directory: {}", e))?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| eyre!("Failed to serialize config: {}", e))?;
        tokio::fs::write(path, content)
            .await
            .map_err(|e| eyre!("Failed to write config file {}: {}", path.display(), e))?;
        Ok(())
    }

    pub fn service_settings(&self) -> ServiceSettings {
        ServiceSettings {
            enforce_write_delay: self.enforce_write_delay,
            write_delay: Duration::from_millis(self.write_delay_ms),
            ..ServiceSettings::default()
        }
    }

    pub fn tracing_level(&self) -> Result<tracing::Level> {
        self.log_level
            .parse()
            .map_err(|_| eyre!("Invalid log level: {}", self.log_level))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);

        let config = AppConfig::load_or_create(&path).await.unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(path.exists());
        assert_eq!(AppConfig::load_or_create(&path).await.unwrap(), config);
    }

    #[tokio::test]
    async fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        tokio::fs::write(
            &path,
            "log_level = \"debug\"\n\n[endpoint]\nkind = \"file\"\npath = \"/tmp/accel.bin\"\n",
        )
        .await
        .unwrap();

        let config = AppConfig::load_or_create(&path).await.unwrap();
        assert_eq!(config.tracing_level().unwrap(), tracing::Level::DEBUG);
        assert_eq!(
            config.endpoint,
            EndpointConfig::File {
                path: PathBuf::from("/tmp/accel.bin")
            }
        );
        assert!(config.enforce_write_delay);
        assert_eq!(config.service_settings().write_delay, Duration::from_millis(1000));
    }

    #[test]
    fn unknown_level_is_rejected() {
        let config = AppConfig {
            log_level: "loud".to_string(),
            ..AppConfig::default()
        };
        assert!(config.tracing_level().is_err());
    }
}
