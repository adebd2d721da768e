use thiserror::Error;

/// Failure from the language-model collaborator. The chat flow never
/// surfaces these to clients.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("response contained no message")]
    EmptyResponse,
}
