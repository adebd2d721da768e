//! Reply selection for incoming chat messages.
//!
//! [`ChatOrchestrator::respond`] tries the learned store, then the language
//! model, then the demo table, and records every exchange back into the
//! store regardless of where the reply came from.

pub mod demo;

use anyhow::Result;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::knowledge::types::RecordOutcome;
use crate::knowledge::KnowledgeStore;
use crate::llm::CompletionProvider;

/// Store handle shared by every request.
pub type SharedStore = Arc<Mutex<KnowledgeStore>>;

/// Where a reply came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplySource {
    Learned,
    #[serde(rename = "openai")]
    OpenAi,
    Demo,
}

impl ReplySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Learned => "learned",
            Self::OpenAi => "openai",
            Self::Demo => "demo",
        }
    }
}

impl std::fmt::Display for ReplySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatReply {
    pub message: String,
    pub source: ReplySource,
    /// Number of stored records after this exchange was recorded.
    pub learned_count: usize,
}

#[derive(Clone)]
pub struct ChatOrchestrator {
    store: SharedStore,
    llm: Option<Arc<dyn CompletionProvider>>,
}

impl ChatOrchestrator {
    pub fn new(store: SharedStore, llm: Option<Arc<dyn CompletionProvider>>) -> Self {
        Self { store, llm }
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn is_demo_mode(&self) -> bool {
        self.llm.is_none()
    }

    /// Pick a reply for `message` and learn from the exchange.
    ///
    /// The store lock is not held across the language-model call.
    pub async fn respond(&self, message: &str) -> Result<ChatReply> {
        let learned = {
            let store = lock_store(&self.store)?;
            store
                .find_learned_response(message)
                .filter(|hit| hit.record.count > 0)
        };

        let (reply, source) = match learned {
            Some(hit) => {
                tracing::debug!(id = %hit.id, score = hit.score, "serving learned response");
                (hit.record.response, ReplySource::Learned)
            }
            None => self.generate(message).await,
        };

        let store = Arc::clone(&self.store);
        let user_message = message.to_string();
        let bot_response = reply.clone();
        let (outcome, learned_count) = tokio::task::spawn_blocking(
            move || -> Result<(RecordOutcome, usize)> {
                let mut store = lock_store(&store)?;
                let outcome = store.record_conversation(&user_message, &bot_response)?;
                Ok((outcome, store.len()))
            },
        )
        .await
        .map_err(|e| anyhow::anyhow!("store task failed: {e}"))??;

        tracing::info!(
            source = %source,
            id = %outcome.id,
            merged = outcome.merged,
            learned = learned_count,
            "chat turn complete"
        );

        Ok(ChatReply {
            message: reply,
            source,
            learned_count,
        })
    }

    /// Language model if configured and working, demo table otherwise.
    async fn generate(&self, message: &str) -> (String, ReplySource) {
        if let Some(llm) = &self.llm {
            match llm.complete(message).await {
                Ok(text) => return (text, ReplySource::OpenAi),
                Err(e) => {
                    tracing::warn!(provider = llm.name(), error = %e, "language model failed, using demo reply");
                }
            }
        }
        (demo::demo_response(message).to_string(), ReplySource::Demo)
    }
}

pub(crate) fn lock_store(store: &SharedStore) -> Result<MutexGuard<'_, KnowledgeStore>> {
    store
        .lock()
        .map_err(|e| anyhow::anyhow!("knowledge store lock poisoned: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_source_serializes_to_wire_names() {
        for (source, name) in [
            (ReplySource::Learned, "learned"),
            (ReplySource::OpenAi, "openai"),
            (ReplySource::Demo, "demo"),
        ] {
            assert_eq!(serde_json::to_value(source).unwrap(), name);
            assert_eq!(source.to_string(), name);
        }
    }
}
