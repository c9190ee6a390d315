//! Application state management

use cactus_gateway_core::{InferenceService, ModelHandleManager, TranscriptionService};
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Same manager the inference service leases from; released on shutdown
    pub models: Arc<ModelHandleManager>,
    pub inference: Arc<InferenceService>,
    pub transcription: Arc<TranscriptionService>,
}

impl AppState {
    pub fn new(models: Arc<ModelHandleManager>, transcription: TranscriptionService) -> Self {
        Self {
            inference: Arc::new(InferenceService::new(models.clone())),
            models,
            transcription: Arc::new(transcription),
        }
    }
}
