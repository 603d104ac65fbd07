use std::time::Duration;

use chrono::NaiveDate;
use futures::StreamExt;
use rust_decimal::Decimal;
use sqlx::PgPool;
use tokio::time::timeout;

use crate::db;
use crate::finance::ProjectDraft;
use crate::models::{Project, ProjectId, ProjectInput};
use crate::store::{DocumentStore, PgStore, StoreError};

/// Test helper to create a migrated pool; needs DATABASE_URL.
async fn create_test_pool() -> Result<PgPool, anyhow::Error> {
    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL not set for tests"))?;

    let pool = db::create_pool(&database_url).await?;
    db::migrate(&pool).await?;
    Ok(pool)
}

fn project(seq: u32) -> Project {
    let mut draft = ProjectDraft::new(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
    draft.apply(ProjectInput {
        project_year: "116".into(),
        name: format!("Store test {seq}"),
        engineer: "Sian".into(),
        amount: Decimal::new(1_234_550, 2),
        has_warranty: true,
        warranty_end: NaiveDate::from_ymd_opt(2026, 6, 1),
        ..ProjectInput::default()
    });
    draft.finalize(|| ProjectId::from_sequence(seq)).unwrap()
}

/// A written project comes back unchanged through the next snapshot, and
/// deleting it removes it from the following one.
#[tokio::test]
#[ignore] // Requires database setup
async fn test_project_round_trip_through_subscription() {
    let pool = create_test_pool().await.expect("Failed to create test pool");
    let store = PgStore::new(pool);
    let mut stream = store.subscribe_projects().await.unwrap();
    stream.next().await.unwrap().unwrap();

    let written = project(9001);
    store.create_project(&written).await.unwrap();

    let snapshot = timeout(Duration::from_secs(5), stream.next())
        .await
        .expect("no notification")
        .unwrap()
        .unwrap();
    let read = snapshot
        .iter()
        .find(|p| p.doc_id == written.doc_id)
        .expect("written project missing");
    assert_eq!(read, &written);

    store.delete_project(written.doc_id).await.unwrap();
    let snapshot = timeout(Duration::from_secs(5), stream.next())
        .await
        .expect("no notification")
        .unwrap()
        .unwrap();
    assert!(snapshot.iter().all(|p| p.doc_id != written.doc_id));
}

#[tokio::test]
#[ignore] // Requires database setup
async fn test_update_missing_row_is_not_found() {
    let pool = create_test_pool().await.expect("Failed to create test pool");
    let store = PgStore::new(pool);

    let ghost = project(9002);
    assert!(matches!(
        store.update_project(&ghost).await,
        Err(StoreError::NotFound(id)) if id == ghost.doc_id
    ));
}

#[tokio::test]
#[ignore] // Requires database setup
async fn test_ping() {
    let pool = create_test_pool().await.expect("Failed to create test pool");
    assert!(PgStore::new(pool).ping().await.is_ok());
}
