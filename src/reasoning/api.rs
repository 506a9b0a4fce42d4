//! Chat completions client for OpenAI-compatible endpoints.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{ReasoningService, UpstreamServiceError};
use crate::config::ReasoningConfig;
use crate::http_client;

const MAX_COMPLETION_RESPONSE_BYTES: usize = 4 * 1024 * 1024;
const MAX_ERROR_RESPONSE_BYTES: usize = 64 * 1024;

/// Blocking client for `POST {base_url}/chat/completions`.
pub struct ChatCompletionsClient {
    agent: ureq::Agent,
    endpoint: String,
    api_key: String,
    model: String,
}

impl ChatCompletionsClient {
    pub fn new(config: &ReasoningConfig, timeout: Duration) -> Self {
        let base = config.base_url.trim_end_matches('/');
        Self {
            agent: http_client::build_agent(timeout),
            endpoint: format!("{base}/chat/completions"),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl std::fmt::Debug for ChatCompletionsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionsClient")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl ReasoningService for ChatCompletionsClient {
    fn complete(&self, system: &str, user: &str) -> Result<String, UpstreamServiceError> {
        let request = ChatRequestWire {
            model: &self.model,
            messages: [
                MessageWire {
                    role: "system",
                    content: system,
                },
                MessageWire {
                    role: "user",
                    content: user,
                },
            ],
        };
        debug!(endpoint = %self.endpoint, model = %self.model, "Sending chat completion request");
        let req = self
            .agent
            .post(&self.endpoint)
            .set("Accept", "application/json")
            .set("Content-Type", "application/json")
            .set("Authorization", &format!("Bearer {}", self.api_key.trim()));

        let response = match req.send_json(&request) {
            Ok(response) => response,
            Err(ureq::Error::Status(code, response)) => {
                let body = http_client::read_response_text(response, MAX_ERROR_RESPONSE_BYTES)
                    .unwrap_or_else(|err| err.to_string());
                warn!(status = code, "Chat completion request rejected");
                return Err(map_status_error(code, &body));
            }
            Err(ureq::Error::Transport(err)) => {
                return Err(UpstreamServiceError::Transport(err.to_string()));
            }
        };

        let body = http_client::read_response_text(response, MAX_COMPLETION_RESPONSE_BYTES)
            .map_err(|err| UpstreamServiceError::InvalidResponse(err.to_string()))?;
        parse_completion(&body)
    }
}

#[derive(Serialize)]
struct ChatRequestWire<'a> {
    model: &'a str,
    messages: [MessageWire<'a>; 2],
}

#[derive(Serialize)]
struct MessageWire<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponseWire {
    #[serde(default)]
    choices: Vec<ChoiceWire>,
}

#[derive(Deserialize)]
struct ChoiceWire {
    message: Option<ResponseMessageWire>,
}

#[derive(Deserialize)]
struct ResponseMessageWire {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelopeWire {
    error: ErrorBodyWire,
}

#[derive(Deserialize)]
struct ErrorBodyWire {
    message: String,
}

fn parse_completion(body: &str) -> Result<String, UpstreamServiceError> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Err(UpstreamServiceError::InvalidResponse(
            "Empty response body".to_string(),
        ));
    }
    let parsed: ChatResponseWire = serde_json::from_str(trimmed)
        .map_err(|err| UpstreamServiceError::InvalidResponse(err.to_string()))?;
    let content = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .ok_or(UpstreamServiceError::EmptyCompletion)?;
    if content.trim().is_empty() {
        return Err(UpstreamServiceError::EmptyCompletion);
    }
    Ok(content)
}

fn map_status_error(code: u16, body: &str) -> UpstreamServiceError {
    let message = error_message(body);
    match code {
        401 | 403 => UpstreamServiceError::Unauthorized(message),
        429 => UpstreamServiceError::RateLimited(message),
        500..=599 => UpstreamServiceError::ServerError {
            status: code,
            message,
        },
        _ => UpstreamServiceError::Transport(format!("HTTP {code}: {message}")),
    }
}

/// The `error.message` field of an OpenAI-style error body, or the raw body.
fn error_message(body: &str) -> String {
    let trimmed = body.trim();
    serde_json::from_str::<ErrorEnvelopeWire>(trimmed)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| trimmed.to_string())
}
