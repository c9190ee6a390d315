//! Cactus engine bridge
//! Hosts the native Cactus bindings in a persistent Python daemon and talks to
//! it over a Unix socket with length-prefixed JSON frames.

use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::BridgeConfig;
use crate::error::{Error, Result};
use crate::model::{CompletionEngine, CompletionRequest, EngineSession, ModelHandle};

/// How long the daemon gets to load weights and start answering.
const STARTUP_TIMEOUT: Duration = Duration::from_secs(60);
const POLL_INTERVAL: Duration = Duration::from_millis(100);
const READ_TIMEOUT: Duration = Duration::from_secs(120);
const WRITE_TIMEOUT: Duration = Duration::from_secs(30);

/// Frames larger than this are treated as a corrupt stream.
const MAX_FRAME_LEN: usize = 64 * 1024 * 1024;

/// Request to the Cactus daemon
#[derive(Debug, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
enum DaemonRequest<'a> {
    Check,
    Complete(&'a CompletionRequest),
    Shutdown,
}

/// Response from the Cactus daemon
#[derive(Debug, Deserialize)]
struct DaemonResponse {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Starts Cactus daemons on demand.
pub struct CactusBridge {
    config: BridgeConfig,
}

impl CactusBridge {
    pub fn new(config: BridgeConfig) -> Self {
        Self { config }
    }

    fn spawn_daemon(&self, weights_path: &Path) -> Result<Child> {
        Command::new(&self.config.python_cmd)
            .arg(&self.config.daemon_script)
            .arg("--socket")
            .arg(&self.config.socket_path)
            .arg("--weights")
            .arg(weights_path)
            .arg("--python-src")
            .arg(&self.config.python_src)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| {
                Error::EngineUnavailable(format!("Failed to start Cactus daemon: {}", e))
            })
    }

    fn wait_until_ready(&self, child: &mut Child) -> Result<()> {
        let attempts = STARTUP_TIMEOUT.as_millis() / POLL_INTERVAL.as_millis();
        for i in 0..attempts {
            std::thread::sleep(POLL_INTERVAL);

            if let Ok(Some(status)) = child.try_wait() {
                return Err(Error::EngineUnavailable(format!(
                    "Cactus daemon exited during startup ({})",
                    status
                )));
            }

            if self.config.socket_path.exists()
                && call_daemon(&self.config.socket_path, &DaemonRequest::Check).is_ok()
            {
                return Ok(());
            }

            if i % 50 == 0 {
                debug!("Waiting for Cactus daemon to start... ({}s)", i / 10);
            }
        }

        Err(Error::EngineUnavailable(format!(
            "Cactus daemon failed to start within {} seconds",
            STARTUP_TIMEOUT.as_secs()
        )))
    }
}

impl CompletionEngine for CactusBridge {
    fn initialize(&self, weights_path: &Path) -> Result<ModelHandle> {
        if self.config.socket_path.exists() {
            warn!("Removing stale Cactus socket {:?}", self.config.socket_path);
            let _ = std::fs::remove_file(&self.config.socket_path);
        }

        info!("Starting Cactus daemon...");
        let mut child = self.spawn_daemon(weights_path)?;

        if let Err(e) = self.wait_until_ready(&mut child) {
            let _ = child.kill();
            let _ = child.wait();
            return Err(e);
        }

        info!("Cactus daemon started successfully");
        Ok(Box::new(CactusSession {
            socket_path: self.config.socket_path.clone(),
            daemon_process: Mutex::new(Some(child)),
        }))
    }
}

/// A running Cactus daemon with loaded weights.
struct CactusSession {
    socket_path: PathBuf,
    daemon_process: Mutex<Option<Child>>,
}

impl EngineSession for CactusSession {
    fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let response = call_daemon(&self.socket_path, &DaemonRequest::Complete(request))?;
        response
            .text
            .ok_or_else(|| Error::Engine("Cactus daemon returned no text".to_string()))
    }

    fn destroy(self: Box<Self>) {
        info!("Stopping Cactus daemon...");

        if let Err(e) = call_daemon(&self.socket_path, &DaemonRequest::Shutdown) {
            debug!("Shutdown command not acknowledged: {}", e);
        }

        for _ in 0..50 {
            std::thread::sleep(POLL_INTERVAL);
            if !self.socket_path.exists() {
                break;
            }
        }

        let child = match self.daemon_process.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(mut child) = child {
            match child.try_wait() {
                Ok(Some(_)) => {}
                _ => {
                    warn!("Cactus daemon still running, killing it");
                    let _ = child.kill();
                    let _ = child.wait();
                }
            }
        }

        info!("Cactus daemon stopped");
    }
}

/// Send one request on a fresh connection and read the reply.
fn call_daemon(socket_path: &Path, request: &DaemonRequest<'_>) -> Result<DaemonResponse> {
    let mut stream = UnixStream::connect(socket_path)
        .map_err(|e| Error::Engine(format!("Failed to connect to Cactus daemon: {}", e)))?;
    stream.set_read_timeout(Some(READ_TIMEOUT)).ok();
    stream.set_write_timeout(Some(WRITE_TIMEOUT)).ok();

    let payload = serde_json::to_vec(request)
        .map_err(|e| Error::Engine(format!("Failed to serialize request: {}", e)))?;
    write_frame(&mut stream, &payload)?;

    let reply = read_frame(&mut stream)?;
    let response: DaemonResponse = serde_json::from_slice(&reply)
        .map_err(|e| Error::Engine(format!("Failed to parse daemon response: {}", e)))?;

    if let Some(error) = response.error {
        return Err(Error::Engine(error));
    }

    Ok(response)
}

fn write_frame(stream: &mut impl Write, payload: &[u8]) -> Result<()> {
    let length = u32::try_from(payload.len())
        .map_err(|_| Error::Engine("Request too large for daemon frame".to_string()))?;
    stream
        .write_all(&length.to_be_bytes())
        .and_then(|_| stream.write_all(payload))
        .map_err(|e| Error::Engine(format!("Failed to write request: {}", e)))
}

fn read_frame(stream: &mut impl Read) -> Result<Vec<u8>> {
    let mut length_buf = [0u8; 4];
    stream
        .read_exact(&mut length_buf)
        .map_err(|e| Error::Engine(format!("Failed to read response length: {}", e)))?;

    let length = u32::from_be_bytes(length_buf) as usize;
    if length > MAX_FRAME_LEN {
        return Err(Error::Engine(format!(
            "Daemon response of {} bytes exceeds frame limit",
            length
        )));
    }

    let mut buf = vec![0u8; length];
    stream
        .read_exact(&mut buf)
        .map_err(|e| Error::Engine(format!("Failed to read response: {}", e)))?;
    Ok(buf)
}
