//! Language-model backends.
//!
//! Provides a trait for hosted language models, allowing Dragoman to swap
//! providers (Gemini, test doubles, etc.) through a unified interface.

mod gemini;

pub use gemini::{GeminiBackend, GeminiBackendBuilder};

use crate::Result;
use std::future::Future;

/// A hosted language model: one opaque text blob in, one text reply out.
///
/// Implementations are stateless per call: all conversational context is
/// carried explicitly in the submitted text, none is retained by the model
/// between calls.
pub trait LanguageModel: Send + Sync {
    /// Submit the rendered transcript and obtain the model's reply text.
    fn generate(&self, transcript: &str) -> impl Future<Output = Result<String>> + Send;
}

impl<T: LanguageModel> LanguageModel for &T {
    fn generate(&self, transcript: &str) -> impl Future<Output = Result<String>> + Send {
        (**self).generate(transcript)
    }
}
