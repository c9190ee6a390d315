//! Capability seam around the native inference engine

use serde::Serialize;
use serde_json::Value;
use std::path::Path;

use crate::error::Result;
use crate::types::Role;

/// Literal end-of-turn markers that bound generation.
pub const DEFAULT_STOP_SEQUENCES: [&str; 2] = ["<|im_end|>", "<end_of_turn>"];

/// Opaque handle to an initialized engine instance.
pub type ModelHandle = Box<dyn EngineSession>;

/// Something that can bring an engine instance up from a weights path.
pub trait CompletionEngine: Send + Sync + 'static {
    fn initialize(&self, weights_path: &Path) -> Result<ModelHandle>;
}

/// A live engine instance.
///
/// `complete` may be called from several blocking threads at once while a
/// handle is leased out; implementations serialize internally if the native
/// side requires it.
pub trait EngineSession: Send + Sync + 'static {
    fn complete(&self, request: &CompletionRequest) -> Result<String>;

    /// Tear the instance down. Errors are logged by the implementation.
    fn destroy(self: Box<Self>);
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineMessage {
    pub role: Role,
    pub content: String,
}

/// Everything the engine needs for one completion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub messages: Vec<EngineMessage>,
    pub tools: Vec<Value>,
    pub temperature: f32,
    pub force_tools: bool,
    pub max_tokens: u32,
    pub stop_sequences: Vec<String>,
}
