//! HTTP client for the OpenAI Responses API.
//!
//! Sends a single prompt with the `web_search` tool enabled and decodes the
//! heterogeneous `output` list into a [`Response`]. Every non-200 status is
//! surfaced as [`AiError::UnexpectedStatus`] with the raw body attached.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode, Url};

use crate::error::AiError;
use crate::types::{Annotation, Response, ResponsesEnvelope, ResponsesRequest, Tool};
use crate::SearchClient;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Client for the Responses endpoint.
///
/// Use [`OpenAiClient::new`] for production or [`OpenAiClient::with_base_url`]
/// to point at a mock server in tests.
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    model: String,
    endpoint: Url,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("api_key", &"[redacted]")
            .field("model", &self.model)
            .field("endpoint", &self.endpoint.as_str())
            .finish_non_exhaustive()
    }
}

impl OpenAiClient {
    /// Creates a client pointed at the production API.
    ///
    /// `timeout_secs` bounds the whole call, including reading the body.
    ///
    /// # Errors
    ///
    /// Returns [`AiError::Http`] if the underlying `reqwest::Client` cannot be
    /// constructed.
    pub fn new(api_key: &str, model: &str, timeout_secs: u64) -> Result<Self, AiError> {
        Self::with_base_url(api_key, model, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// Requests go to `<base_url>/responses`.
    ///
    /// # Errors
    ///
    /// Returns [`AiError::Http`] if the `reqwest::Client` cannot be built, or
    /// [`AiError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        api_key: &str,
        model: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, AiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("ota/0.1 (trend-collector)")
            .build()?;

        // Exactly one trailing slash so `join` appends instead of replacing
        // the last path segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let endpoint = Url::parse(&normalised)
            .and_then(|base| base.join("responses"))
            .map_err(|e| AiError::InvalidBaseUrl {
                url: base_url.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            model: model.to_owned(),
            endpoint,
        })
    }

    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Sends `prompt` with web search enabled and decodes the answer.
    ///
    /// # Errors
    ///
    /// - [`AiError::Http`] on network failure or timeout.
    /// - [`AiError::UnexpectedStatus`] on any status other than 200.
    /// - [`AiError::Deserialize`] if the body is not a Responses envelope.
    /// - [`AiError::NoOutputText`] if no `output_text` block carries text.
    pub async fn search_and_analyze(&self, prompt: &str) -> Result<Response, AiError> {
        let request = ResponsesRequest {
            model: &self.model,
            tools: vec![Tool::web_search()],
            input: prompt,
        };
        let body = serde_json::to_vec(&request).map_err(AiError::Serialize)?;

        tracing::debug!(
            endpoint = %self.endpoint,
            model = %self.model,
            prompt_len = prompt.len(),
            "sending search request"
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let raw = response.text().await?;

        if status != StatusCode::OK {
            return Err(AiError::UnexpectedStatus {
                status: status.as_u16(),
                body: raw,
            });
        }

        tracing::debug!(bytes = raw.len(), "provider responded");
        parse_response(raw)
    }
}

#[async_trait]
impl SearchClient for OpenAiClient {
    async fn search_and_analyze(&self, prompt: &str) -> Result<Response, AiError> {
        OpenAiClient::search_and_analyze(self, prompt).await
    }
}

/// Decodes a Responses body into a [`Response`].
///
/// Only `message` items are inspected, and within them only `output_text`
/// blocks. The first non-empty text wins; URL citations are collected from
/// every `output_text` block in order.
pub(crate) fn parse_response(raw: String) -> Result<Response, AiError> {
    let envelope: ResponsesEnvelope = match serde_json::from_str(&raw) {
        Ok(envelope) => envelope,
        Err(source) => return Err(AiError::Deserialize { source, body: raw }),
    };

    let mut output_text: Option<String> = None;
    let mut annotations = Vec::new();

    let blocks = envelope
        .output
        .into_iter()
        .flatten()
        .flatten()
        .filter(|item| item.kind.as_deref() == Some("message"))
        .flat_map(|item| item.content.into_iter().flatten().flatten())
        .filter(|block| block.kind.as_deref() == Some("output_text"));

    for block in blocks {
        if let Some(text) = block.text.filter(|t| !t.is_empty()) {
            output_text.get_or_insert(text);
        }
        annotations.extend(
            block
                .annotations
                .into_iter()
                .flatten()
                .flatten()
                .filter_map(|ann| ann.url_citation)
                .map(|c| Annotation {
                    url: c.url.unwrap_or_default(),
                    title: c.title.unwrap_or_default(),
                }),
        );
    }

    match output_text {
        Some(output_text) => Ok(Response {
            output_text,
            annotations,
            raw_json: raw,
        }),
        None => Err(AiError::NoOutputText { body: raw }),
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
