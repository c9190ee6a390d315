//! Cactus Gateway Core
//!
//! Serves local tool-calling inference on a single shared Cactus model and
//! remote audio transcription through Gemini behind one error taxonomy.
//!
//! # Architecture
//!
//! - [`ModelHandleManager`] owns the one engine instance: lazy, exactly-once
//!   initialization and a teardown that waits for in-flight requests
//! - [`InferenceService`] builds the engine prompt and hands raw output to the
//!   tolerant [`extractor`](inference::extractor)
//! - [`TranscriptionService`] sends inline audio to Gemini with a bounded timeout
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use cactus_gateway_core::{CactusBridge, GatewayConfig, InferenceService, ModelHandleManager};
//!
//! let config = GatewayConfig::load()?;
//! let engine = Arc::new(CactusBridge::new(config.bridge_config()));
//! let models = Arc::new(ModelHandleManager::new(engine, &config.cactus_weights_path));
//! let response = InferenceService::new(models.clone()).infer(request).await?;
//! models.release().await?;
//! ```

pub mod config;
pub mod error;
pub mod inference;
pub mod model;
pub mod transcription;
pub mod types;

#[cfg(test)]
mod test_support;

pub use config::{GatewayConfig, TranscriptionConfig};
pub use error::{Error, ErrorKind, Result};
pub use inference::{CactusBridge, InferenceService};
pub use model::{
    CompletionEngine, CompletionRequest, EngineSession, ModelHandle, ModelHandleManager,
};
pub use transcription::TranscriptionService;
pub use types::{
    ConversationMessage, FunctionCall, InferRequest, InferResponse, Role, TranscribeRequest,
    TranscribeResponse,
};
