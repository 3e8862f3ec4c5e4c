use super::{ServiceError, ServiceSettings, SettingsAction, SettingsService};
use crate::accel::SharedModifier;
use crate::channel::ControlEndpoint;
use crate::settings::Settings;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Handle for a [`SettingsService`] running in a tokio task.
///
/// Must be created inside a tokio runtime.
#[derive(Debug)]
pub struct SettingsHandle {
    action_tx: mpsc::Sender<SettingsAction>,

    modifier: Arc<SharedModifier>,

    task_handle: Option<JoinHandle<()>>,

    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl SettingsHandle {
    /// Spawns the worker. `modifier` is the slot the worker republishes into.
    pub fn spawn(
        endpoint: Arc<dyn ControlEndpoint>,
        modifier: Arc<SharedModifier>,
        settings: ServiceSettings,
    ) -> Self {
        let (action_tx, action_rx) = mpsc::channel(32);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let service =
            SettingsService::create(endpoint, modifier.clone(), action_rx, &settings);
        let name = service.endpoint_name().to_string();

        let task_handle = tokio::spawn(async move {
            debug!("Spawning settings service: {}", name);
            let running = service.start().await;
            running.run_until_shutdown(shutdown_rx).await.finish();
        });

        Self {
            action_tx,
            modifier,
            task_handle: Some(task_handle),
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// The slot holding the currently published pipeline.
    pub fn modifier(&self) -> Arc<SharedModifier> {
        self.modifier.clone()
    }

    /// Reads the driver's active record and publishes a pipeline built from it.
    pub async fn read_active(&self) -> Result<Settings, ServiceError> {
        let (response_tx, response_rx) = oneshot::channel();
        self.send(SettingsAction::ReadActive { response_tx }).await?;
        response_rx.await.map_err(|_| ServiceError::ChannelClosed)?
    }

    /// Writes `settings` to the driver and, on success, publishes a pipeline
    /// built from them.
    pub async fn write_active(&self, settings: Settings) -> Result<(), ServiceError> {
        let (response_tx, response_rx) = oneshot::channel();
        self.send(SettingsAction::WriteActive {
            settings,
            response_tx,
        })
        .await?;
        response_rx.await.map_err(|_| ServiceError::ChannelClosed)?
    }

    /// Publishes a pipeline built from `settings` without contacting the driver.
    pub async fn rebuild(&self, settings: Settings) -> Result<u64, ServiceError> {
        let (response_tx, response_rx) = oneshot::channel();
        self.send(SettingsAction::Rebuild {
            settings,
            response_tx,
        })
        .await?;
        response_rx.await.map_err(|_| ServiceError::ChannelClosed)
    }

    async fn send(&self, action: SettingsAction) -> Result<(), ServiceError> {
        self.action_tx.send(action).await.map_err(|_| {
            error!("Settings service is no longer accepting actions");
            ServiceError::ChannelClosed
        })
    }

    /// Stops the worker and waits for it to finish.
    pub async fn shutdown(&mut self) -> Result<(), ServiceError> {
        if let Some(tx) = self.shutdown_tx.take() {
            if tx.send(()).is_err() {
                warn!("Settings service already terminated");
            }
        }

        match self.task_handle.take() {
            Some(handle) => handle.await.map_err(|e| {
                error!("Settings service task failed: {}", e);
                ServiceError::TaskFailed(e.to_string())
            }),
            None => {
                debug!("Settings service already shut down");
                Ok(())
            }
        }
        .map(|()| info!("Settings service shut down"))
    }
}
