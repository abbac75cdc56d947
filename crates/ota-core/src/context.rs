//! Collection runs and the trending-topic items they produce.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::CoreError;

/// Lifecycle state of a [`CollectionRun`].
///
/// A run starts in `Running` and moves exactly once to `Success` or `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    Success,
    Failed,
}

impl RunStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Running => "running",
            RunStatus::Success => "success",
            RunStatus::Failed => "failed",
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, RunStatus::Running)
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for RunStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(RunStatus::Running),
            "success" => Ok(RunStatus::Success),
            "failed" => Ok(RunStatus::Failed),
            other => Err(CoreError::InvalidRunStatus(other.to_string())),
        }
    }
}

/// Provenance record for one collection attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionRun {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub status: RunStatus,
    /// Only set when `status` is [`RunStatus::Failed`].
    pub error_message: Option<String>,
    /// Raw provider JSON; present whenever the provider answered.
    pub raw_response: Option<String>,
}

impl CollectionRun {
    /// A freshly created run in `running` state.
    #[must_use]
    pub fn start(id: Uuid, started_at: DateTime<Utc>) -> Self {
        Self {
            id,
            started_at,
            completed_at: None,
            status: RunStatus::Running,
            error_message: None,
            raw_response: None,
        }
    }
}

/// One trending-topic record owned by a successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextItem {
    pub id: Uuid,
    pub collection_run_id: Uuid,
    pub category: String,
    pub rank: i64,
    pub topic: String,
    pub summary: String,
    pub sources: Vec<String>,
}

/// What a successful attempt hands back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionResult {
    pub run: CollectionRun,
    pub items: Vec<ContextItem>,
}
