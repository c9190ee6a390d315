//! Tool-calling inference on the shared Cactus model

use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::inference::extractor;
use crate::model::{
    CompletionRequest, EngineMessage, ModelHandleManager, DEFAULT_STOP_SEQUENCES,
};
use crate::types::{InferRequest, InferResponse, Role, ToolDefinition};

pub struct InferenceService {
    models: Arc<ModelHandleManager>,
}

impl InferenceService {
    pub fn new(models: Arc<ModelHandleManager>) -> Self {
        Self { models }
    }

    pub async fn infer(&self, request: InferRequest) -> Result<InferResponse> {
        if request.tools.is_empty() {
            return Err(Error::Validation(
                "At least one tool definition is required".to_string(),
            ));
        }

        let request_id = Uuid::new_v4();
        info!(
            "Inference request {}: {} messages, {} tools",
            request_id,
            request.messages.len(),
            request.tools.len()
        );

        let lease = self.models.acquire().await?;
        let completion = build_completion_request(&request);

        let raw_text = tokio::task::spawn_blocking(move || lease.complete(&completion))
            .await
            .map_err(|e| Error::Engine(e.to_string()))?
            .map_err(|e| match e {
                Error::Engine(_) => e,
                other => Error::Engine(other.to_string()),
            })?;

        debug!("Inference request {} raw output: {}", request_id, raw_text);
        let response = extractor::extract(&raw_text);
        info!(
            "Inference request {} produced {} function calls",
            request_id,
            response.function_calls.len()
        );
        Ok(response)
    }
}

/// Engine-facing form of a request: leading system message, enveloped tools,
/// fixed stop sequences.
pub fn build_completion_request(request: &InferRequest) -> CompletionRequest {
    let system = EngineMessage {
        role: Role::System,
        content: request.effective_system_instruction().to_string(),
    };
    let messages = std::iter::once(system)
        .chain(request.messages.iter().map(|message| EngineMessage {
            role: message.role,
            content: message.content.clone(),
        }))
        .collect();

    CompletionRequest {
        messages,
        tools: request.tools.iter().map(function_envelope).collect(),
        temperature: request.temperature,
        force_tools: request.force_tools,
        max_tokens: request.max_tokens,
        stop_sequences: DEFAULT_STOP_SEQUENCES.iter().map(|s| s.to_string()).collect(),
    }
}

fn function_envelope(tool: &ToolDefinition) -> Value {
    json!({
        "type": "function",
        "function": tool,
    })
}
