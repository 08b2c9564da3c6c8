//! Completion backend boundary.

mod openai;

use async_trait::async_trait;

use crate::error::Result;

pub use openai::OpenAiClient;

/// Turns a prompt into generated text.
///
/// Any synchronous request/response backend can sit behind this trait.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}
