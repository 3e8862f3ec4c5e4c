use super::{ServiceError, ServiceSettings, SettingsAction};
use crate::accel::SharedModifier;
use crate::channel::{self, ControlEndpoint, WritePacer};
use crate::settings::Settings;
use statum::{machine, state};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

macro_rules! respond {
    ($response_tx:expr, $result:expr) => {
        if $response_tx.send($result).is_err() {
            warn!("Requester went away before the response was sent");
        }
    };
}

/// Lifecycle states of the settings worker
#[state]
#[derive(Debug, Clone)]
pub enum ServiceState {
    Idle,    // Created, nothing read yet
    Running, // Serving actions
    Stopped, // Loop exited, ready for cleanup
}

#[machine]
pub struct SettingsService<S: ServiceState> {
    endpoint: Arc<dyn ControlEndpoint>,
    modifier: Arc<SharedModifier>,
    action_receiver: mpsc::Receiver<SettingsAction>,
    pacer: Option<WritePacer>,
    load_on_start: bool,
}

impl<S: ServiceState> SettingsService<S> {
    pub fn endpoint_name(&self) -> &str {
        self.endpoint.name()
    }
}

impl SettingsService<Idle> {
    pub fn create(
        endpoint: Arc<dyn ControlEndpoint>,
        modifier: Arc<SharedModifier>,
        action_receiver: mpsc::Receiver<SettingsAction>,
        settings: &ServiceSettings,
    ) -> Self {
        info!("Creating settings service for {}", endpoint.name());

        let pacer = settings
            .enforce_write_delay
            .then(|| WritePacer::new(settings.write_delay));

        Self::new(
            endpoint,
            modifier,
            action_receiver,
            pacer,
            settings.load_on_start,
        )
    }

    /// Optionally loads the active record, then starts serving.
    ///
    /// A failed initial read keeps whatever pipeline is already published.
    pub async fn start(self) -> SettingsService<Running> {
        if self.load_on_start {
            match read_blocking(self.endpoint.clone()).await {
                Ok(settings) => {
                    self.modifier.replace(&settings);
                    info!("Loaded active settings from {}", self.endpoint.name());
                }
                Err(e) => warn!(
                    "Could not load active settings from {}: {}",
                    self.endpoint.name(),
                    e
                ),
            }
        }

        info!("Settings service running for {}", self.endpoint.name());
        self.transition()
    }
}

impl SettingsService<Running> {
    pub async fn handle_action(&mut self, action: SettingsAction) {
        match action {
            SettingsAction::ReadActive { response_tx } => {
                let result = read_blocking(self.endpoint.clone()).await;
                if let Ok(settings) = &result {
                    self.modifier.replace(settings);
                }
                respond!(response_tx, result);
            }
            SettingsAction::WriteActive {
                settings,
                response_tx,
            } => {
                let result = self.write_paced(settings).await;
                respond!(response_tx, result);
            }
            SettingsAction::Rebuild {
                settings,
                response_tx,
            } => {
                let version = self.modifier.replace(&settings);
                respond!(response_tx, version);
            }
        }
    }

    async fn write_paced(&mut self, settings: Settings) -> Result<(), ServiceError> {
        if let Some(pacer) = &self.pacer {
            let wait = pacer.remaining();
            if !wait.is_zero() {
                debug!("Delaying write by {:?}", wait);
                tokio::time::sleep(wait).await;
            }
        }

        let result = write_blocking(self.endpoint.clone(), settings).await;

        // The driver was contacted unless it is absent, so the delay applies.
        let reached_driver = !matches!(
            &result,
            Err(ServiceError::Channel(e)) if e.is_not_installed()
        );
        if reached_driver {
            if let Some(pacer) = &mut self.pacer {
                pacer.mark();
            }
        }

        if result.is_ok() {
            self.modifier.replace(&settings);
        }
        result
    }

    /// Serves actions until a shutdown signal arrives or every handle is dropped.
    pub async fn run_until_shutdown(
        mut self,
        mut shutdown_rx: oneshot::Receiver<()>,
    ) -> SettingsService<Stopped> {
        info!("Starting settings loop for {}", self.endpoint.name());

        loop {
            tokio::select! {
                _ = &mut shutdown_rx => {
                    info!("Shutdown signal received for {}", self.endpoint.name());
                    break;
                }

                action = self.action_receiver.recv() => {
                    match action {
                        Some(action) => self.handle_action(action).await,
                        None => {
                            info!("All settings handles dropped");
                            break;
                        }
                    }
                }
            }
        }

        self.transition()
    }
}

impl SettingsService<Stopped> {
    pub fn finish(mut self) {
        self.action_receiver.close();
        info!("Settings service stopped for {}", self.endpoint.name());
    }
}

async fn read_blocking(endpoint: Arc<dyn ControlEndpoint>) -> Result<Settings, ServiceError> {
    tokio::task::spawn_blocking(move || channel::read(endpoint.as_ref()))
        .await
        .map_err(|e| {
            error!("Read task failed: {}", e);
            ServiceError::TaskFailed(e.to_string())
        })?
        .map_err(ServiceError::from)
}

async fn write_blocking(
    endpoint: Arc<dyn ControlEndpoint>,
    settings: Settings,
) -> Result<(), ServiceError> {
    tokio::task::spawn_blocking(move || channel::write(endpoint.as_ref(), &settings))
        .await
        .map_err(|e| {
            error!("Write task failed: {}", e);
            ServiceError::TaskFailed(e.to_string())
        })?
        .map_err(ServiceError::from)
}
