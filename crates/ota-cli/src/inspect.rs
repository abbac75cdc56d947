//! `runs` and `items`: read-only views over stored collection data.

use ota_core::{CollectionRun, ContextItem};

pub(crate) async fn list_runs(pool: &sqlx::PgPool, limit: i64) -> anyhow::Result<()> {
    if limit <= 0 {
        anyhow::bail!("--limit must be positive, got {limit}");
    }

    let rows = ota_db::list_collection_runs(pool, limit).await?;
    if rows.is_empty() {
        println!("no collection runs recorded");
        return Ok(());
    }

    for row in rows {
        let run = CollectionRun::try_from(row)?;
        println!("{}", format_run(&run));
    }
    Ok(())
}

pub(crate) async fn show_items(pool: &sqlx::PgPool, run: Option<uuid::Uuid>) -> anyhow::Result<()> {
    let run_id = match run {
        Some(id) => id,
        None => match ota_db::latest_successful_run(pool).await? {
            Some(row) => row.id,
            None => {
                println!("no successful collection runs recorded");
                return Ok(());
            }
        },
    };

    let items = ota_db::list_context_items(pool, run_id).await?;
    println!("run {run_id}: {} items", items.len());
    for row in items {
        println!("{}", format_item(&ContextItem::from(row)));
    }
    Ok(())
}

fn format_run(run: &CollectionRun) -> String {
    let completed = run
        .completed_at
        .map_or_else(|| "-".to_string(), |t| t.to_rfc3339());
    let mut line = format!(
        "{}  {:<7}  started {}  completed {}",
        run.id,
        run.status,
        run.started_at.to_rfc3339(),
        completed
    );
    if let Some(message) = &run.error_message {
        line.push_str("  error: ");
        line.push_str(message);
    }
    line
}

fn format_item(item: &ContextItem) -> String {
    let mut line = format!(
        "[{}#{}] {}\n    {}",
        item.category, item.rank, item.topic, item.summary
    );
    for source in &item.sources {
        line.push_str("\n    - ");
        line.push_str(source);
    }
    line
}
