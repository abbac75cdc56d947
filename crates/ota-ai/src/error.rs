use thiserror::Error;

/// Errors returned by the search-augmented AI provider client.
#[derive(Debug, Error)]
pub enum AiError {
    /// Network, TLS, or timeout failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a non-200 status.
    #[error("provider returned HTTP {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// The request body could not be encoded.
    #[error("failed to encode request: {0}")]
    Serialize(#[source] serde_json::Error),

    /// The response body was not the expected JSON envelope.
    #[error("failed to decode provider response: {source}")]
    Deserialize {
        #[source]
        source: serde_json::Error,
        body: String,
    },

    /// The provider answered but no `output_text` block carried any text.
    #[error("no output text in provider response: {body}")]
    NoOutputText { body: String },

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

impl AiError {
    /// Raw provider body, when one was received before the failure.
    #[must_use]
    pub fn body(&self) -> Option<&str> {
        match self {
            AiError::UnexpectedStatus { body, .. }
            | AiError::Deserialize { body, .. }
            | AiError::NoOutputText { body } => Some(body),
            _ => None,
        }
    }
}
