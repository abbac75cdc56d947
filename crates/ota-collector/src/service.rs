//! Collection run orchestration.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use ota_ai::{Response, SearchClient};
use ota_core::{CollectionResult, CollectionRun, ContextItem, RunStatus};

use crate::error::CollectError;
use crate::ids::{IdGenerator, RandomIds};
use crate::parse::{decode_items, into_context_items, retain_valid};
use crate::prompt::build_collection_prompt;
use crate::repository::CollectionRepository;

const DEFAULT_FINALIZE_TIMEOUT: Duration = Duration::from_secs(10);

/// Drives single collection attempts against a provider and a store.
///
/// Holds no per-attempt state, so one `Collector` can serve concurrent
/// attempts; each gets its own run id.
pub struct Collector {
    ai: Arc<dyn SearchClient>,
    repo: Arc<dyn CollectionRepository>,
    ids: Arc<dyn IdGenerator>,
    finalize_timeout: Duration,
}

impl Collector {
    #[must_use]
    pub fn new(ai: Arc<dyn SearchClient>, repo: Arc<dyn CollectionRepository>) -> Self {
        Self {
            ai,
            repo,
            ids: Arc::new(RandomIds),
            finalize_timeout: DEFAULT_FINALIZE_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_ids(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    /// Upper bound on recording a failed run after something already went
    /// wrong.
    #[must_use]
    pub fn with_finalize_timeout(mut self, timeout: Duration) -> Self {
        self.finalize_timeout = timeout;
        self
    }

    /// Runs one collection attempt.
    ///
    /// # Errors
    ///
    /// See [`Collector::collect_with_cancel`].
    pub async fn collect(&self) -> Result<CollectionResult, CollectError> {
        self.collect_with_cancel(&CancellationToken::new()).await
    }

    /// Runs one collection attempt, abandoning the provider call if `cancel`
    /// fires.
    ///
    /// 1. Create the run (`running`).
    /// 2. Ask the provider.
    /// 3. Decode the answer into items.
    /// 4. Drop items missing `category`, `topic` or `summary`.
    /// 5. Save the surviving items.
    /// 6. Mark the run `success` with the raw answer attached.
    ///
    /// Failures in steps 2–5 mark the run `failed` on a best-effort basis;
    /// the raw answer is attached whenever the provider produced one.
    ///
    /// # Errors
    ///
    /// - [`CollectError::Persistence`] if the run cannot be created, items
    ///   cannot be saved, or the run cannot be marked successful.
    /// - [`CollectError::Provider`] if the provider call fails.
    /// - [`CollectError::Cancelled`] if `cancel` fires during the provider call.
    /// - [`CollectError::MalformedResponse`] if the answer is not the expected
    ///   JSON envelope or has no items.
    /// - [`CollectError::NoValidItems`] if every item fails validation.
    pub async fn collect_with_cancel(
        &self,
        cancel: &CancellationToken,
    ) -> Result<CollectionResult, CollectError> {
        let mut run = CollectionRun::start(self.ids.next_id(), Utc::now());

        self.repo
            .create_run(&run)
            .await
            .map_err(|source| CollectError::Persistence {
                stage: "creating run",
                source,
            })?;
        tracing::info!(run_id = %run.id, "collection run created");

        let response = match self.call_provider(cancel).await {
            Ok(response) => response,
            Err(err) => {
                self.fail_run_best_effort(run.id, &err, None).await;
                return Err(err);
            }
        };
        tracing::info!(
            run_id = %run.id,
            annotations = response.annotations.len(),
            "provider answered"
        );

        let items = match self.extract_items(&response.output_text, run.id) {
            Ok(items) => items,
            Err(err) => {
                self.fail_run_best_effort(run.id, &err, Some(&response.raw_json))
                    .await;
                return Err(err);
            }
        };

        if let Err(source) = self.repo.save_context_items(&items).await {
            let err = CollectError::Persistence {
                stage: "saving context items",
                source,
            };
            self.fail_run_best_effort(run.id, &err, Some(&response.raw_json))
                .await;
            return Err(err);
        }

        // Not best-effort: the items are saved, so a run left `running` here
        // is an inconsistency the caller has to know about.
        let completed_at = self
            .repo
            .complete_run(run.id, RunStatus::Success, None, Some(&response.raw_json))
            .await
            .map_err(|source| CollectError::Persistence {
                stage: "completing run",
                source,
            })?;

        run.completed_at = Some(completed_at);
        run.status = RunStatus::Success;
        run.raw_response = Some(response.raw_json);

        tracing::info!(run_id = %run.id, items = items.len(), "collection run succeeded");
        Ok(CollectionResult { run, items })
    }

    async fn call_provider(&self, cancel: &CancellationToken) -> Result<Response, CollectError> {
        let prompt = build_collection_prompt();
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(CollectError::Cancelled),
            result = self.ai.search_and_analyze(&prompt) => result.map_err(CollectError::from),
        }
    }

    fn extract_items(
        &self,
        output_text: &str,
        run_id: Uuid,
    ) -> Result<Vec<ContextItem>, CollectError> {
        let decoded = decode_items(output_text)?;
        let decoded_count = decoded.len();

        let valid = retain_valid(decoded);
        let dropped = decoded_count - valid.len();
        if dropped > 0 {
            tracing::warn!(
                run_id = %run_id,
                decoded = decoded_count,
                dropped,
                "dropped context items missing category, topic or summary"
            );
        }

        if valid.is_empty() {
            return Err(CollectError::NoValidItems {
                decoded: decoded_count,
            });
        }

        Ok(into_context_items(valid, run_id, self.ids.as_ref()))
    }

    /// Marks the run `failed`. Errors and timeouts are logged, never returned,
    /// so the caller always sees the original failure.
    async fn fail_run_best_effort(&self, run_id: Uuid, err: &CollectError, raw: Option<&str>) {
        let message = err.to_string();
        tracing::warn!(run_id = %run_id, error = %message, "collection run failed");

        let complete = self
            .repo
            .complete_run(run_id, RunStatus::Failed, Some(&message), raw);

        match tokio::time::timeout(self.finalize_timeout, complete).await {
            Ok(Ok(_)) => {}
            Ok(Err(mark_err)) => {
                tracing::error!(
                    run_id = %run_id,
                    error = %mark_err,
                    "failed to mark collection run as failed"
                );
            }
            Err(_) => {
                tracing::error!(
                    run_id = %run_id,
                    timeout_ms = u64::try_from(self.finalize_timeout.as_millis()).unwrap_or(u64::MAX),
                    "timed out marking collection run as failed"
                );
            }
        }
    }
}

#[cfg(test)]
#[path = "service_test.rs"]
mod tests;
