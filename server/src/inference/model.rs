//! Model seam
//!
//! The service only knows these two traits. Both run on the inference
//! worker pool, never on a request-handling task.

use std::sync::Arc;

/// Raw output of one summarization call
#[derive(Debug, Clone, PartialEq)]
pub struct ModelOutput {
    pub summary_text: String,
    /// Model-reported confidence, if the model has one
    pub score: Option<f32>,
}

pub trait Summarizer: Send + Sync {
    /// Summarize `text` in at most `max_length` characters, aiming for at
    /// least `min_length`.
    fn summarize(
        &self,
        text: &str,
        max_length: usize,
        min_length: usize,
    ) -> Result<ModelOutput, super::InferenceError>;
}

pub trait ModelLoader: Send + Sync {
    fn model_name(&self) -> &str;

    /// Build a ready summarizer. May be slow; called at most once per load attempt.
    fn load(&self) -> Result<Arc<dyn Summarizer>, super::InferenceError>;
}
