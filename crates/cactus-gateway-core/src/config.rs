//! Configuration types for the Cactus gateway

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};

/// Optional config file looked up in the working directory (any format the
/// `config` crate understands, e.g. `cactus-gateway.toml`).
const CONFIG_FILE_NAME: &str = "cactus-gateway";

/// Prefix for gateway environment variables (`LUMINA_PORT`, ...).
const ENV_PREFIX: &str = "LUMINA";

/// The transcription credential is read unprefixed.
pub const GEMINI_API_KEY_VAR: &str = "GEMINI_API_KEY";

/// Main gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Model weights handed to the engine on first use
    #[serde(default = "default_cactus_weights_path")]
    pub cactus_weights_path: PathBuf,

    /// Location of the Cactus Python bindings, forwarded to the daemon
    #[serde(default = "default_cactus_python_src")]
    pub cactus_python_src: PathBuf,

    #[serde(default = "default_cactus_daemon_script")]
    pub cactus_daemon_script: PathBuf,

    #[serde(default = "default_cactus_socket_path")]
    pub cactus_socket_path: PathBuf,

    #[serde(default = "default_python_cmd")]
    pub python_cmd: String,

    /// Transcription is refused while this is unset
    #[serde(default)]
    pub gemini_api_key: Option<String>,

    #[serde(default = "default_gemini_base_url")]
    pub gemini_base_url: String,

    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,

    #[serde(default = "default_transcription_timeout_secs")]
    pub transcription_timeout_secs: u64,

    #[serde(default = "default_transcription_max_output_tokens")]
    pub transcription_max_output_tokens: u32,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cactus_weights_path: default_cactus_weights_path(),
            cactus_python_src: default_cactus_python_src(),
            cactus_daemon_script: default_cactus_daemon_script(),
            cactus_socket_path: default_cactus_socket_path(),
            python_cmd: default_python_cmd(),
            gemini_api_key: None,
            gemini_base_url: default_gemini_base_url(),
            gemini_model: default_gemini_model(),
            transcription_timeout_secs: default_transcription_timeout_secs(),
            transcription_max_output_tokens: default_transcription_max_output_tokens(),
        }
    }
}

impl GatewayConfig {
    /// Load configuration from the optional config file and the process environment.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration, reading environment variables from `env` instead of
    /// the process environment when given.
    pub fn load_from(env: Option<HashMap<String, String>>) -> Result<Self> {
        let api_key = match &env {
            Some(vars) => vars.get(GEMINI_API_KEY_VAR).cloned(),
            None => std::env::var(GEMINI_API_KEY_VAR).ok(),
        }
        .filter(|key| !key.trim().is_empty());

        let settings = config::Config::builder()
            .add_source(config::File::with_name(CONFIG_FILE_NAME).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .source(env),
            )
            .set_override_option("gemini_api_key", api_key)
            .and_then(|builder| builder.build())
            .map_err(|e| Error::Config(format!("Failed to load configuration: {}", e)))?;

        settings
            .try_deserialize()
            .map_err(|e| Error::Config(format!("Invalid configuration: {}", e)))
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn bridge_config(&self) -> BridgeConfig {
        BridgeConfig {
            python_cmd: self.python_cmd.clone(),
            daemon_script: self.cactus_daemon_script.clone(),
            python_src: self.cactus_python_src.clone(),
            socket_path: self.cactus_socket_path.clone(),
        }
    }

    pub fn transcription_config(&self) -> TranscriptionConfig {
        TranscriptionConfig {
            api_key: self.gemini_api_key.clone(),
            base_url: self.gemini_base_url.clone(),
            model: self.gemini_model.clone(),
            timeout: Duration::from_secs(self.transcription_timeout_secs),
            max_output_tokens: self.transcription_max_output_tokens,
        }
    }
}

/// Settings for the Cactus daemon bridge
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub python_cmd: String,
    pub daemon_script: PathBuf,
    pub python_src: PathBuf,
    pub socket_path: PathBuf,
}

/// Settings for the Gemini transcription client
#[derive(Debug, Clone)]
pub struct TranscriptionConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
    pub max_output_tokens: u32,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cactus_weights_path() -> PathBuf {
    PathBuf::from("cactus/weights/functiongemma-270m-it")
}

fn default_cactus_python_src() -> PathBuf {
    PathBuf::from("cactus/python/src")
}

fn default_cactus_daemon_script() -> PathBuf {
    PathBuf::from("scripts/cactus_daemon.py")
}

fn default_cactus_socket_path() -> PathBuf {
    PathBuf::from("/tmp/cactus_gateway_daemon.sock")
}

fn default_python_cmd() -> String {
    "python3".to_string()
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1".to_string()
}

fn default_gemini_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_transcription_timeout_secs() -> u64 {
    30
}

fn default_transcription_max_output_tokens() -> u32 {
    1024
}
