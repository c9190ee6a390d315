//! Model handle lifecycle management

use std::ops::Deref;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::model::engine::{CompletionEngine, EngineSession, ModelHandle};

/// Owns the single engine instance shared by all requests.
///
/// The handle sits behind a readers-writer lock. Requests hold a read lease
/// for the duration of a completion; creation and teardown take the write
/// lock, so teardown waits until every outstanding lease is dropped.
pub struct ModelHandleManager {
    engine: Arc<dyn CompletionEngine>,
    weights_path: PathBuf,
    slot: Arc<RwLock<Option<ModelHandle>>>,
}

/// Shared access to the live engine instance.
pub struct ModelLease {
    guard: OwnedRwLockReadGuard<Option<ModelHandle>, ModelHandle>,
}

impl Deref for ModelLease {
    type Target = dyn EngineSession;

    fn deref(&self) -> &Self::Target {
        &**self.guard
    }
}

impl ModelHandleManager {
    pub fn new(engine: Arc<dyn CompletionEngine>, weights_path: impl Into<PathBuf>) -> Self {
        Self {
            engine,
            weights_path: weights_path.into(),
            slot: Arc::new(RwLock::new(None)),
        }
    }

    /// Lease the engine instance, initializing it on first use.
    pub async fn acquire(&self) -> Result<ModelLease> {
        loop {
            let guard = self.slot.clone().read_owned().await;
            if let Ok(guard) = OwnedRwLockReadGuard::try_map(guard, |slot| slot.as_ref()) {
                return Ok(ModelLease { guard });
            }
            self.initialize().await?;
        }
    }

    async fn initialize(&self) -> Result<()> {
        let slot = self.slot.clone().write_owned().await;

        // Detached so a cancelled request cannot strand a half-built instance.
        let task = tokio::spawn(load_into(
            slot,
            self.engine.clone(),
            self.weights_path.clone(),
        ));

        task.await
            .map_err(|e| Error::EngineUnavailable(e.to_string()))?
    }

    /// Destroy the engine instance if one exists. Safe to call repeatedly.
    pub async fn release(&self) -> Result<()> {
        let mut slot = self.slot.write().await;
        let Some(handle) = slot.take() else {
            debug!("No Cactus model to release");
            return Ok(());
        };

        info!("Destroying Cactus model");
        tokio::task::spawn_blocking(move || handle.destroy())
            .await
            .map_err(|e| Error::Engine(format!("Model teardown panicked: {}", e)))?;
        info!("Cactus model destroyed");
        Ok(())
    }

    pub async fn is_loaded(&self) -> bool {
        self.slot.read().await.is_some()
    }
}

async fn load_into(
    mut slot: OwnedRwLockWriteGuard<Option<ModelHandle>>,
    engine: Arc<dyn CompletionEngine>,
    weights_path: PathBuf,
) -> Result<()> {
    if slot.is_some() {
        return Ok(());
    }

    info!("Initializing Cactus model from {:?}", weights_path);
    let handle = tokio::task::spawn_blocking(move || engine.initialize(&weights_path))
        .await
        .map_err(|e| Error::EngineUnavailable(e.to_string()))??;

    *slot = Some(handle);
    info!("Cactus model ready");
    Ok(())
}
