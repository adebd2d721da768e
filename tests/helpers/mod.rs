#![allow(dead_code)]

use async_trait::async_trait;
use qabot::chat::{ChatOrchestrator, SharedStore};
use qabot::knowledge::KnowledgeStore;
use qabot::llm::{CompletionProvider, LlmError};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Path to a not-yet-existing store file inside `tmp`.
pub fn store_path(tmp: &TempDir) -> PathBuf {
    tmp.path().join("data").join("knowledge_base.json")
}

/// Open a fresh store in a temp directory. Keep the `TempDir` alive for the test.
pub fn temp_store() -> (TempDir, SharedStore) {
    let tmp = TempDir::new().unwrap();
    let store = KnowledgeStore::open(store_path(&tmp)).unwrap();
    (tmp, Arc::new(Mutex::new(store)))
}

/// Orchestrator with no language model (demo mode).
pub fn demo_orchestrator() -> (TempDir, ChatOrchestrator) {
    let (tmp, store) = temp_store();
    (tmp, ChatOrchestrator::new(store, None))
}

/// Orchestrator backed by `provider`.
pub fn orchestrator_with(provider: Arc<ScriptedProvider>) -> (TempDir, ChatOrchestrator) {
    let (tmp, store) = temp_store();
    let provider: Arc<dyn CompletionProvider> = provider;
    (tmp, ChatOrchestrator::new(store, Some(provider)))
}

/// A provider that always answers the same way and counts its calls.
pub struct ScriptedProvider {
    reply: Option<String>,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn answering(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Some(reply.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            reply: None,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    async fn complete(&self, _message: &str) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            Some(reply) => Ok(reply.clone()),
            None => Err(LlmError::Status {
                status: 429,
                body: "rate limited".into(),
            }),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
