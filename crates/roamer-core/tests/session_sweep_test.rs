//! Expired-session sweeping over the in-memory store.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, TimeZone, Utc};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use roamer_core::session::{
    InMemorySessionStore, PlanCandidateSession, SessionMeta, SessionStore, StoreError, run_sweeper, sweep_expired,
};

fn session(expires_at: DateTime<Utc>) -> PlanCandidateSession {
    PlanCandidateSession {
        id: Uuid::new_v4(),
        meta: SessionMeta::default(),
        plans: Vec::new(),
        search_results: Vec::new(),
        created_at: expires_at - Duration::days(7),
        expires_at,
    }
}

#[tokio::test]
async fn cutoff_is_inclusive() {
    let store = InMemorySessionStore::new();
    let before = session(Utc.with_ymd_and_hms(2019, 12, 31, 23, 59, 59).unwrap());
    let at = session(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap());
    let after = session(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 1).unwrap());
    let (before_id, at_id, after_id) = (before.id, at.id, after.id);
    for s in [after, at, before] {
        store.insert(s).await;
    }

    let cutoff = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
    let expired = store.find_expired_before(cutoff).await.unwrap();
    assert_eq!(expired, vec![before_id, at_id]);

    let report = sweep_expired(&store, cutoff).await.unwrap();
    assert_eq!(report.deleted, vec![before_id, at_id]);
    assert_eq!(report.failed, 0);
    assert_eq!(store.len().await, 1);

    // Still live as of the cutoff.
    let kept = store.find(after_id, cutoff).await.unwrap();
    assert_eq!(kept.id, after_id);
    assert!(matches!(
        store.find(before_id, cutoff).await,
        Err(StoreError::NotFound(_))
    ));
}

#[tokio::test]
async fn sweep_with_nothing_expired() {
    let store = InMemorySessionStore::new();
    store.insert(session(Utc::now() + Duration::days(1))).await;
    let report = sweep_expired(&store, Utc::now()).await.unwrap();
    assert!(report.deleted.is_empty());
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn sweeper_runs_until_cancelled() {
    let store = Arc::new(InMemorySessionStore::new());
    store.insert(session(Utc::now() - Duration::minutes(5))).await;
    store.insert(session(Utc::now() + Duration::days(1))).await;

    let cancel = CancellationToken::new();
    let task = {
        let store = store.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { run_sweeper(store.as_ref(), StdDuration::from_millis(10), cancel).await })
    };

    // The first tick fires immediately.
    for _ in 0..100 {
        if store.len().await == 1 {
            break;
        }
        tokio::time::sleep(StdDuration::from_millis(10)).await;
    }
    assert_eq!(store.len().await, 1);

    cancel.cancel();
    tokio::time::timeout(StdDuration::from_secs(5), task)
        .await
        .expect("sweeper stops after cancellation")
        .unwrap();
}
