//! `collect`: one manually triggered collection attempt.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use ota_ai::OpenAiClient;
use ota_collector::Collector;
use ota_core::AppConfig;
use ota_db::PgCollectionRepository;

/// Runs one attempt. Ctrl-C cancels the provider call; the run is still
/// recorded as failed.
pub(crate) async fn run_collect(pool: sqlx::PgPool, config: &AppConfig) -> anyhow::Result<()> {
    let ai = OpenAiClient::with_base_url(
        &config.openai_api_key,
        &config.openai_model,
        config.ai_request_timeout_secs,
        &config.openai_base_url,
    )?;
    let repo = PgCollectionRepository::new(pool);

    let collector = Collector::new(Arc::new(ai), Arc::new(repo))
        .with_finalize_timeout(Duration::from_secs(config.finalize_timeout_secs));

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    let signal_task = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling collection");
            on_signal.cancel();
        }
    });

    let outcome = collector.collect_with_cancel(&cancel).await;
    signal_task.abort();

    let result = outcome?;
    println!(
        "run {} succeeded with {} items",
        result.run.id,
        result.items.len()
    );
    for item in &result.items {
        println!("  [{}#{}] {}", item.category, item.rank, item.topic);
    }
    Ok(())
}
