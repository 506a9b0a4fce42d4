//! Text-reasoning collaborator: prompt construction and an
//! OpenAI-compatible chat completions client.

mod api;
pub mod prompt;

pub use api::ChatCompletionsClient;

/// A service that answers one system + user message pair with text.
pub trait ReasoningService: Send + Sync {
    fn complete(&self, system: &str, user: &str) -> Result<String, UpstreamServiceError>;
}

/// Failures talking to the reasoning service.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamServiceError {
    /// HTTP 401 or 403.
    #[error("Reasoning service rejected the credentials: {0}")]
    Unauthorized(String),
    /// HTTP 429.
    #[error("Reasoning service rate limit reached: {0}")]
    RateLimited(String),
    /// Any 5xx status.
    #[error("Reasoning service error (HTTP {status}): {message}")]
    ServerError { status: u16, message: String },
    /// Connection failure, timeout or an unmapped status.
    #[error("Reasoning service unreachable: {0}")]
    Transport(String),
    /// The body could not be read or parsed.
    #[error("Invalid reasoning service response: {0}")]
    InvalidResponse(String),
    /// No choices, or only blank content.
    #[error("Reasoning service returned an empty completion")]
    EmptyCompletion,
}
