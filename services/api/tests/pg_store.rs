//! Integration tests for the PostgreSQL adapter.
//!
//! These run only when `DATABASE_URL` points at a reachable Postgres database;
//! otherwise each test returns early. Every test uses fresh ids, so a shared
//! database is fine.

use api_lib::adapters::PgStore;
use assert_matches::assert_matches;
use chrono::{TimeZone, Utc};
use progress_core::domain::{EarnedBadge, LearnerProgress};
use progress_core::ports::{LearnerStore, PortError};
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

async fn connect() -> Option<PgStore> {
    dotenvy::dotenv().ok();
    let url = std::env::var("DATABASE_URL").ok()?;
    if !url.starts_with("postgres") {
        return None;
    }
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .expect("DATABASE_URL is set but the database is unreachable");
    let store = PgStore::new(pool);
    store.run_migrations().await.expect("migrations failed");
    Some(store)
}

fn earned(badge_id: Uuid, day: u32) -> EarnedBadge {
    EarnedBadge {
        badge_id,
        unlocked_at: Utc.with_ymd_and_hms(2024, 9, day, 8, 0, 0).unwrap(),
    }
}

#[tokio::test]
async fn stale_version_is_a_conflict_and_leaves_the_row_alone() {
    let Some(store) = connect().await else { return };
    let id = Uuid::new_v4();
    let original = store.create_learner(id, "Ada").await.unwrap();

    let mut first = original.clone();
    first.total_xp = 10;
    let saved = store.save_progress(&first).await.unwrap();
    assert_eq!(saved.version, original.version + 1);

    let mut stale = original;
    stale.total_xp = 99;
    stale.earned_badges.push(earned(Uuid::new_v4(), 2));
    assert_matches!(store.save_progress(&stale).await, Err(PortError::Conflict(_)));

    let stored = store.get_progress(id).await.unwrap();
    assert_eq!(stored.total_xp, 10);
    assert_eq!(stored.version, saved.version);
    assert!(stored.earned_badges.is_empty());
}

#[tokio::test]
async fn saving_an_unknown_learner_is_not_found() {
    let Some(store) = connect().await else { return };
    let mut record = LearnerProgress::new(Uuid::new_v4());
    record.total_xp = 5;
    assert_matches!(store.save_progress(&record).await, Err(PortError::NotFound(_)));
}

#[tokio::test]
async fn registering_twice_is_a_conflict() {
    let Some(store) = connect().await else { return };
    let id = Uuid::new_v4();
    store.create_learner(id, "Ada").await.unwrap();
    assert_matches!(
        store.create_learner(id, "Ada again").await,
        Err(PortError::Conflict(_))
    );
}

#[tokio::test]
async fn earned_badges_come_back_in_unlock_order() {
    let Some(store) = connect().await else { return };
    let id = Uuid::new_v4();
    let mut record = store.create_learner(id, "Ada").await.unwrap();

    // Earn the larger id first so id order and unlock order disagree.
    let mut ids = [Uuid::new_v4(), Uuid::new_v4()];
    ids.sort();
    let [smaller, larger] = ids;

    record.total_xp = 100;
    record.earned_badges.push(earned(larger, 2));
    let mut record = store.save_progress(&record).await.unwrap();

    record.total_xp = 200;
    record.earned_badges.push(earned(smaller, 3));
    store.save_progress(&record).await.unwrap();

    let stored = store.get_progress(id).await.unwrap();
    let order: Vec<Uuid> = stored.earned_badges.iter().map(|eb| eb.badge_id).collect();
    assert_eq!(order, vec![larger, smaller]);
    assert_eq!(stored.earned_badges[0].unlocked_at, earned(larger, 2).unlocked_at);
}
