use thiserror::Error;

use ota_ai::AiError;

use crate::repository::RepositoryError;

/// Why the provider's answer text could not be turned into items.
#[derive(Debug, Error)]
pub enum MalformedResponse {
    #[error("answer is not the expected JSON envelope: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("answer contains no items")]
    EmptyItems,
}

/// Errors returned by [`crate::Collector::collect`].
#[derive(Debug, Error)]
pub enum CollectError {
    /// The provider could not be reached or gave no usable answer.
    #[error("provider call failed: {0}")]
    Provider(#[from] AiError),

    /// The attempt was cancelled while waiting for the provider.
    #[error("collection cancelled")]
    Cancelled,

    #[error("malformed provider answer: {0}")]
    MalformedResponse(#[from] MalformedResponse),

    /// Every decoded item failed validation.
    #[error("no valid context items after filtering {decoded} decoded items")]
    NoValidItems { decoded: usize },

    #[error("persistence failed while {stage}: {source}")]
    Persistence {
        stage: &'static str,
        #[source]
        source: RepositoryError,
    },
}
