//! JSON bodies of the chat-completions API.

use doc_chat_core::{ChatMessage, Error, Result};
use serde::{Deserialize, Serialize};

/// Longest provider body echoed back in an error message.
const MAX_ERROR_BODY_CHARS: usize = 300;

/// Body of `POST /chat/completions`.
#[derive(Debug, Serialize)]
pub struct CompletionRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

/// `{"error": {"message": ...}}`
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Extract the assistant reply from a successful response body.
pub fn parse_completion(status: u16, body: &str) -> Result<String> {
    let response: CompletionResponse =
        serde_json::from_str(body).map_err(|e| Error::Provider {
            status,
            message: format!("unreadable completion response: {}", e),
        })?;

    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content.unwrap_or_default())
        .ok_or_else(|| Error::Provider {
            status,
            message: "completion response contained no choices".to_string(),
        })
}

/// Human-readable message from an error response body.
///
/// Falls back to the (shortened) raw body when it is not the usual envelope.
pub fn error_message(body: &str) -> String {
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) {
        return envelope.error.message;
    }

    let body = body.trim();
    if body.is_empty() {
        return "no response body".to_string();
    }
    match body.char_indices().nth(MAX_ERROR_BODY_CHARS) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}

/// Map a non-2xx status to the error the session reports.
pub fn status_error(status: u16, body: &str) -> Error {
    let message = error_message(body);
    match status {
        401 | 403 => Error::Auth(message),
        429 => Error::RateLimit(message),
        _ => Error::Provider { status, message },
    }
}
