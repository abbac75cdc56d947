//! Live integration tests for ota-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. They need `DATABASE_URL` pointing at a server the test
//! user may create databases on, so they are ignored by default:
//!
//! ```text
//! DATABASE_URL=postgres://... cargo test -p ota-db -- --ignored
//! ```

use chrono::Utc;
use ota_collector::CollectionRepository;
use ota_core::{CollectionRun, ContextItem, RunStatus};
use ota_db::{
    complete_collection_run, get_collection_run, insert_collection_run, insert_context_items,
    latest_successful_run, list_collection_runs, list_context_items, DbError,
    PgCollectionRepository,
};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_run() -> CollectionRun {
    CollectionRun::start(Uuid::new_v4(), Utc::now())
}

fn item(run_id: Uuid, category: &str, rank: i64, topic: &str) -> ContextItem {
    ContextItem {
        id: Uuid::new_v4(),
        collection_run_id: run_id,
        category: category.to_string(),
        rank,
        topic: topic.to_string(),
        summary: format!("{topic} summary"),
        sources: vec![format!("https://example.com/{topic}")],
    }
}

// ---------------------------------------------------------------------------
// collection_runs
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn inserted_run_starts_running(pool: sqlx::PgPool) {
    let run = new_run();
    insert_collection_run(&pool, &run).await.expect("insert run");

    let row = get_collection_run(&pool, run.id).await.expect("get run");
    assert_eq!(row.status, "running");
    assert!(row.completed_at.is_none());
    assert!(row.raw_response.is_none());
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn complete_run_sets_terminal_fields_once(pool: sqlx::PgPool) {
    let run = new_run();
    insert_collection_run(&pool, &run).await.expect("insert run");

    let completed_at =
        complete_collection_run(&pool, run.id, RunStatus::Success, None, Some("{\"raw\":1}"))
            .await
            .expect("complete run");

    let row = get_collection_run(&pool, run.id).await.expect("get run");
    assert_eq!(row.status, "success");
    assert_eq!(row.completed_at, Some(completed_at));
    assert!(row.error_message.is_none());
    assert_eq!(row.raw_response.as_deref(), Some("{\"raw\":1}"));

    let second = complete_collection_run(&pool, run.id, RunStatus::Failed, Some("late"), None).await;
    assert!(
        matches!(second, Err(DbError::InvalidCollectionRunTransition { id }) if id == run.id),
        "expected InvalidCollectionRunTransition, got: {second:?}"
    );
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn complete_run_rejects_running_status(pool: sqlx::PgPool) {
    let run = new_run();
    insert_collection_run(&pool, &run).await.expect("insert run");

    let result = complete_collection_run(&pool, run.id, RunStatus::Running, None, None).await;
    assert!(matches!(result, Err(DbError::InvalidStatus(_))), "got: {result:?}");
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn complete_unknown_run_is_invalid_transition(pool: sqlx::PgPool) {
    let result =
        complete_collection_run(&pool, Uuid::new_v4(), RunStatus::Failed, Some("x"), None).await;
    assert!(
        matches!(result, Err(DbError::InvalidCollectionRunTransition { .. })),
        "got: {result:?}"
    );
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn get_missing_run_is_not_found(pool: sqlx::PgPool) {
    let result = get_collection_run(&pool, Uuid::new_v4()).await;
    assert!(matches!(result, Err(DbError::NotFound)), "got: {result:?}");
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn list_runs_is_newest_first_and_latest_success_skips_failures(pool: sqlx::PgPool) {
    let mut older = new_run();
    older.started_at = Utc::now() - chrono::Duration::hours(2);
    let mut newer = new_run();
    newer.started_at = Utc::now() - chrono::Duration::hours(1);
    let newest = new_run();

    for run in [&older, &newer, &newest] {
        insert_collection_run(&pool, run).await.expect("insert run");
    }
    complete_collection_run(&pool, older.id, RunStatus::Success, None, Some("{}"))
        .await
        .expect("complete older");
    complete_collection_run(&pool, newer.id, RunStatus::Failed, Some("boom"), None)
        .await
        .expect("complete newer");

    let rows = list_collection_runs(&pool, 10).await.expect("list runs");
    let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![newest.id, newer.id, older.id]);

    let latest = latest_successful_run(&pool)
        .await
        .expect("query latest")
        .expect("one successful run exists");
    assert_eq!(latest.id, older.id);
}

// ---------------------------------------------------------------------------
// context_items
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn context_items_round_trip_in_saved_order(pool: sqlx::PgPool) {
    let run = new_run();
    insert_collection_run(&pool, &run).await.expect("insert run");

    let items = vec![
        item(run.id, "top", 2, "second-ranked-first"),
        item(run.id, "top", 1, "first-ranked-second"),
        ContextItem {
            sources: Vec::new(),
            ..item(run.id, "sports", 1, "no-sources")
        },
    ];
    let written = insert_context_items(&pool, &items).await.expect("insert items");
    assert_eq!(written, 3);

    let stored: Vec<ContextItem> = list_context_items(&pool, run.id)
        .await
        .expect("list items")
        .into_iter()
        .map(ContextItem::from)
        .collect();
    assert_eq!(stored, items);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn failed_batch_writes_nothing(pool: sqlx::PgPool) {
    let run = new_run();
    insert_collection_run(&pool, &run).await.expect("insert run");

    let good = item(run.id, "top", 1, "ok");
    let duplicate = ContextItem {
        topic: "dup".to_string(),
        ..good.clone()
    };
    let result = insert_context_items(&pool, &[good, duplicate]).await;
    assert!(result.is_err(), "duplicate id must fail the batch");

    let stored = list_context_items(&pool, run.id).await.expect("list items");
    assert!(stored.is_empty(), "batch must be atomic, found {stored:?}");
}

// ---------------------------------------------------------------------------
// PgCollectionRepository
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn repository_drives_run_lifecycle(pool: sqlx::PgPool) {
    let repo = PgCollectionRepository::new(pool.clone());
    let run = new_run();

    repo.create_run(&run).await.expect("create run");
    repo.save_context_items(&[item(run.id, "top", 1, "A")])
        .await
        .expect("save items");
    let completed_at = repo
        .complete_run(run.id, RunStatus::Success, None, Some("{\"output\":[]}"))
        .await
        .expect("complete run");

    let stored = CollectionRun::try_from(get_collection_run(&pool, run.id).await.expect("get"))
        .expect("convert");
    assert_eq!(stored.status, RunStatus::Success);
    assert_eq!(stored.completed_at, Some(completed_at));
    assert_eq!(stored.raw_response.as_deref(), Some("{\"output\":[]}"));
    assert_eq!(list_context_items(&pool, run.id).await.expect("list").len(), 1);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn repository_records_failure_message(pool: sqlx::PgPool) {
    let repo = PgCollectionRepository::new(pool.clone());
    let run = new_run();

    repo.create_run(&run).await.expect("create run");
    repo.complete_run(run.id, RunStatus::Failed, Some("provider call failed"), None)
        .await
        .expect("complete run");

    let row = get_collection_run(&pool, run.id).await.expect("get run");
    assert_eq!(row.status, "failed");
    assert_eq!(row.error_message.as_deref(), Some("provider call failed"));
    assert!(row.raw_response.is_none());

    let again = repo.complete_run(run.id, RunStatus::Success, None, None).await;
    assert!(again.is_err(), "a finalized run must not transition again");
}
