//! Request and response contracts shared by the orchestrators and the HTTP layer

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Instruction used when a request does not carry its own.
pub const DEFAULT_SYSTEM_INSTRUCTION: &str = "You are a helpful assistant that can use tools.";

/// Instruction used when a transcription request does not carry a prompt.
pub const DEFAULT_TRANSCRIPTION_PROMPT: &str = "Please transcribe this audio recording exactly as spoken. Only output the transcribed text, nothing else. If the audio describes a math problem, transcribe it accurately including any numbers, equations, or mathematical terms.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: Role,
    pub content: String,
}

/// Opaque tool schema, forwarded to the engine untouched apart from the envelope.
pub type ToolDefinition = Map<String, Value>;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InferRequest {
    pub messages: Vec<ConversationMessage>,
    pub tools: Vec<ToolDefinition>,
    #[serde(default)]
    pub system_instruction: Option<String>,
    #[serde(default)]
    pub temperature: f32,
    #[serde(default = "default_force_tools")]
    pub force_tools: bool,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_force_tools() -> bool {
    true
}

fn default_max_tokens() -> u32 {
    256
}

impl InferRequest {
    /// The caller's instruction, or the built-in one when absent or empty.
    pub fn effective_system_instruction(&self) -> &str {
        match self.system_instruction.as_deref() {
            Some(instruction) if !instruction.is_empty() => instruction,
            _ => DEFAULT_SYSTEM_INSTRUCTION,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InferResponse {
    pub function_calls: Vec<FunctionCall>,
    pub confidence: f64,
    pub total_time_in_ms: f64,
    pub raw_text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscribeRequest {
    pub audio_base64: String,
    #[serde(default = "default_audio_mime_type")]
    pub audio_mime_type: String,
    #[serde(default)]
    pub prompt: Option<String>,
}

fn default_audio_mime_type() -> String {
    "audio/mp4".to_string()
}

impl TranscribeRequest {
    pub fn effective_prompt(&self) -> &str {
        match self.prompt.as_deref() {
            Some(prompt) if !prompt.is_empty() => prompt,
            _ => DEFAULT_TRANSCRIPTION_PROMPT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscribeResponse {
    pub text: String,
    pub confidence: f64,
    pub total_time_in_ms: f64,
}
