//! Client for a search-augmented AI endpoint (OpenAI Responses API with the
//! `web_search` tool).
//!
//! The provider returns a list of heterogeneous output items. This crate
//! extracts the assistant's answer text and its URL citations into a
//! [`Response`], keeping the raw JSON body alongside for diagnostics.

pub mod client;
pub mod error;
pub mod types;

pub use client::OpenAiClient;
pub use error::AiError;
pub use types::{Annotation, Response};

use async_trait::async_trait;

/// A provider capable of answering a prompt with web-search grounding.
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Sends `prompt` to the provider and returns its decoded answer.
    ///
    /// # Errors
    ///
    /// Returns [`AiError`] on transport failure, timeout, non-200 status,
    /// undecodable body, or an answer with no output text.
    async fn search_and_analyze(&self, prompt: &str) -> Result<Response, AiError>;
}
