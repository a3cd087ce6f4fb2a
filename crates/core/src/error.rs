//! Error types for document loading and chat.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading a document or chatting about it.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to read the uploaded file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// The upload is not a `.txt`, `.md` or `.pptx` file.
    #[error("Unsupported file type: {0} (expected .txt, .md or .pptx)")]
    UnsupportedFileType(String),

    /// A text upload is not valid UTF-8.
    #[error("Could not decode {filename} as UTF-8 text (invalid byte at offset {offset})")]
    Decode { filename: String, offset: usize },

    /// The presentation container or one of its parts is corrupt or unreadable.
    #[error("Presentation format error: {0}")]
    Format(String),

    /// The API credential is missing or was rejected.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The request never reached the provider or the connection failed.
    #[error("Network error: {0}")]
    Network(String),

    /// The provider is throttling requests.
    #[error("Rate limited by provider: {0}")]
    RateLimit(String),

    /// Any other provider-side failure.
    #[error("Provider error (status {status}): {message}")]
    Provider { status: u16, message: String },
}

impl Error {
    /// Whether resending the same message later may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Network(_) | Error::RateLimit(_) => true,
            Error::Provider { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(Error::Network("timed out".into()).is_retryable());
        assert!(Error::RateLimit("slow down".into()).is_retryable());
        assert!(Error::Provider {
            status: 503,
            message: "overloaded".into()
        }
        .is_retryable());
        assert!(!Error::Auth("bad key".into()).is_retryable());
        assert!(!Error::Provider {
            status: 400,
            message: "bad request".into()
        }
        .is_retryable());
    }

    #[test]
    fn test_decode_message_names_offset() {
        let err = Error::Decode {
            filename: "notes.md".into(),
            offset: 12,
        };
        assert_eq!(
            err.to_string(),
            "Could not decode notes.md as UTF-8 text (invalid byte at offset 12)"
        );
    }
}
