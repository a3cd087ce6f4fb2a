//! Boundary to the remote language-model API.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An API credential.
///
/// `Debug` is redacted so the key never ends up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap a key, returning `None` for blank input.
    pub fn new(key: impl Into<String>) -> Option<Self> {
        let key = key.into().trim().to_string();
        if key.is_empty() {
            None
        } else {
            Some(Self(key))
        }
    }

    /// Pick the first usable key from the given sources, in priority order.
    pub fn from_sources<I>(sources: I) -> Option<Self>
    where
        I: IntoIterator<Item = Option<String>>,
    {
        sources.into_iter().flatten().find_map(Self::new)
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Role of a message in an outgoing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// One message of an outgoing request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Conversation history with the document context injected up front.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
}

/// A language-model provider.
pub trait ChatGateway {
    /// Send the request and return the assistant's reply.
    ///
    /// Fails with `Auth`, `Network`, `RateLimit` or `Provider`.
    fn send(&self, request: &ChatRequest, credential: &ApiKey) -> Result<String>;

    /// Check that the credential is accepted by the provider.
    fn verify(&self, _credential: &ApiKey) -> Result<()> {
        Ok(())
    }
}
