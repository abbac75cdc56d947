//! Wire types for the Responses API and the normalized [`Response`].

use serde::{Deserialize, Serialize};

/// The provider's answer, reduced to what the collector needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub output_text: String,
    pub annotations: Vec<Annotation>,
    /// The unmodified response body.
    pub raw_json: String,
}

/// A URL citation attached to the answer text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub url: String,
    pub title: String,
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(crate) struct ResponsesRequest<'a> {
    pub model: &'a str,
    pub tools: Vec<Tool>,
    pub input: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct Tool {
    #[serde(rename = "type")]
    pub kind: &'static str,
}

impl Tool {
    pub(crate) const fn web_search() -> Self {
        Self { kind: "web_search" }
    }
}

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

// Every field is optional: the provider sends `null` as readily as it omits a
// field, and both mean "nothing here". Unknown or missing `type`s are skipped.

#[derive(Debug, Deserialize)]
pub(crate) struct ResponsesEnvelope {
    #[serde(default)]
    pub output: Option<Vec<Option<OutputItem>>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OutputItem {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub content: Option<Vec<Option<ContentBlock>>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ContentBlock {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub annotations: Option<Vec<Option<WireAnnotation>>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireAnnotation {
    #[serde(default)]
    pub url_citation: Option<UrlCitation>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UrlCitation {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}
