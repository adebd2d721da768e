//! Language-model collaborator.
//!
//! The chat flow only sees [`CompletionProvider`]: one user message in, one
//! generated reply out. [`create_provider`] builds the OpenAI-compatible
//! client when a credential is configured.

pub mod error;
pub mod openai;

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::LlmConfig;
pub use error::LlmError;

/// Single-turn text completion.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Generate a reply to `message`. No conversation history is sent.
    async fn complete(&self, message: &str) -> Result<String, LlmError>;

    /// Short name used in logs.
    fn name(&self) -> &str;
}

/// Create a provider from config, or `None` for demo mode.
pub fn create_provider(config: &LlmConfig) -> Option<Arc<dyn CompletionProvider>> {
    let api_key = config.api_key()?;
    let client = openai::OpenAiClient::new(api_key, config);
    Some(Arc::new(client))
}
