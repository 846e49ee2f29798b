//! Inference
//!
//! Background-loading summarization with graceful degradation, plus the
//! bounded worker pools that keep CPU-bound work off request-handling tasks.

pub mod extractive;
pub mod model;
pub mod service;
pub mod state;
pub mod workers;

use std::time::Duration;

pub use extractive::ExtractiveLoader;
pub use model::{ModelLoader, ModelOutput, Summarizer};
pub use service::{InferenceService, ModelStatus, SummarizationResult};
pub use state::ModelState;
pub use workers::{WorkHandle, WorkerError, WorkerPool};

#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("model load failed: {0}")]
    Load(String),

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("inference timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Worker(#[from] WorkerError),
}
