//! Native engine seam and lifecycle of the shared model handle

mod engine;
mod manager;

pub use engine::{
    CompletionEngine, CompletionRequest, EngineMessage, EngineSession, ModelHandle,
    DEFAULT_STOP_SEQUENCES,
};
pub use manager::{ModelHandleManager, ModelLease};
