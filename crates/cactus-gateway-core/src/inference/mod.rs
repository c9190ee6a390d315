//! Tool-calling inference over the Cactus engine

mod cactus_bridge;
pub mod extractor;
mod service;

pub use cactus_bridge::CactusBridge;
pub use service::{build_completion_request, InferenceService};
