use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::model::{CompletionEngine, CompletionRequest, EngineSession, ModelHandle};

/// Scripted engine that records how it was driven.
pub struct FakeEngine {
    output: std::result::Result<String, String>,
    init_delay: Duration,
    fail_init: bool,
    pub init_count: Arc<AtomicUsize>,
    pub destroy_count: Arc<AtomicUsize>,
    pub complete_count: Arc<AtomicUsize>,
    pub last_request: Arc<Mutex<Option<CompletionRequest>>>,
}

impl FakeEngine {
    pub fn new(output: &str) -> Self {
        Self {
            output: Ok(output.to_string()),
            init_delay: Duration::ZERO,
            fail_init: false,
            init_count: Arc::new(AtomicUsize::new(0)),
            destroy_count: Arc::new(AtomicUsize::new(0)),
            complete_count: Arc::new(AtomicUsize::new(0)),
            last_request: Arc::new(Mutex::new(None)),
        }
    }

    pub fn failing_completion(message: &str) -> Self {
        Self {
            output: Err(message.to_string()),
            ..Self::new("")
        }
    }

    pub fn failing_init(mut self) -> Self {
        self.fail_init = true;
        self
    }

    pub fn with_init_delay(mut self, delay: Duration) -> Self {
        self.init_delay = delay;
        self
    }
}

impl CompletionEngine for FakeEngine {
    fn initialize(&self, _weights_path: &Path) -> Result<ModelHandle> {
        self.init_count.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(self.init_delay);
        if self.fail_init {
            return Err(Error::EngineUnavailable("weights missing".to_string()));
        }
        Ok(Box::new(FakeSession {
            output: self.output.clone(),
            destroy_count: self.destroy_count.clone(),
            complete_count: self.complete_count.clone(),
            last_request: self.last_request.clone(),
        }))
    }
}

struct FakeSession {
    output: std::result::Result<String, String>,
    destroy_count: Arc<AtomicUsize>,
    complete_count: Arc<AtomicUsize>,
    last_request: Arc<Mutex<Option<CompletionRequest>>>,
}

impl EngineSession for FakeSession {
    fn complete(&self, request: &CompletionRequest) -> Result<String> {
        self.complete_count.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());
        self.output.clone().map_err(Error::Engine)
    }

    fn destroy(self: Box<Self>) {
        self.destroy_count.fetch_add(1, Ordering::SeqCst);
    }
}
