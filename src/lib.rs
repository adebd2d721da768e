//! A small chat service that learns from its own conversations.
//!
//! Every incoming message is answered from the first source that can answer it:
//!
//! | Source | When |
//! |--------|------|
//! | **learned** | A stored question scores above 0.6 Jaccard similarity |
//! | **openai** | An API key is configured and the chat-completions call succeeds |
//! | **demo** | Otherwise: a fixed keyword table with a default reply |
//!
//! Whatever the source, the exchange is written back to the knowledge store.
//! A message scoring above 0.7 against an existing question bumps that
//! record's usage count instead of creating a new one.
//!
//! # Modules
//!
//! - [`config`] — Configuration loading from TOML files and environment variables
//! - [`knowledge`] — JSON-file question/answer store with similarity lookup
//! - [`llm`] — Language-model collaborator trait and OpenAI-compatible client
//! - [`chat`] — Reply selection and learning for each chat turn
//! - [`server`] — axum HTTP API

pub mod chat;
pub mod config;
pub mod knowledge;
pub mod llm;
pub mod server;
