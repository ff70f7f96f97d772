//! `PgSessionStore` against a real PostgreSQL database.
//!
//! Uses the shared instance from `roamer-test-utils`: a testcontainers
//! PostgreSQL unless `ROAMER_TEST_PG_URL` is set.

use chrono::{Duration, TimeZone, Utc};
use uuid::Uuid;

use roamer_core::geo::GeoLocation;
use roamer_core::itinerary::Itinerary;
use roamer_core::place::{OpeningHours, Place};
use roamer_core::plan::Plan;
use roamer_core::session::{PgSessionStore, SessionMeta, SessionStore, StoreError, sweep_expired};
use roamer_test_utils::TestDb;

fn tokyo_tower() -> GeoLocation {
    GeoLocation::new(35.658581, 139.745433).unwrap()
}

fn place(id: &str, tag: &str) -> Place {
    Place::new(id, id, tokyo_tower(), vec![tag.to_string()])
        .with_rating(4.2, 320)
        .with_opening_hours(OpeningHours::always_open())
}

fn meta() -> SessionMeta {
    SessionMeta {
        start_location: Some(tokyo_tower()),
        preferred_categories: vec!["museum".into()],
        disliked_categories: vec!["zoo".into()],
        free_time_minutes: Some(120),
        created_based_on_current_location: true,
    }
}

#[tokio::test]
async fn session_round_trip() {
    let db = TestDb::create().await;
    let pool = db.pool.clone();
    let store = PgSessionStore::new(pool.clone());
    let id = Uuid::new_v4();

    store.create(id, meta(), Duration::days(7)).await.unwrap();
    store
        .add_search_results(id, &[place("a", "museum"), place("b", "cafe")])
        .await
        .unwrap();

    let mut enriched = place("b", "cafe");
    enriched.price_level = Some(2);
    let updated = store.update_search_results(id, &[enriched]).await.unwrap();
    assert_eq!(updated, 1);

    let itinerary = Itinerary {
        anchor_provider_id: "a".into(),
        places: vec![place("a", "museum"), place("b", "cafe")],
        total_minutes: 90,
    };
    let plan = Plan::from_itinerary(itinerary, "Museum morning".into(), &tokyo_tower(), 80.0);
    store.add_plans(id, std::slice::from_ref(&plan)).await.unwrap();

    let session = store.find(id, Utc::now()).await.unwrap();
    assert_eq!(session.meta, meta());
    assert_eq!(session.plans, vec![plan]);
    assert_eq!(session.search_results.len(), 2);
    assert_eq!(session.search_results[0].provider_id, "a");
    assert_eq!(session.search_results[1].price_level, Some(2));
    assert_eq!(session.expires_at - session.created_at, Duration::days(7));

    db.teardown().await;
}

#[tokio::test]
async fn missing_and_expired_sessions() {
    let db = TestDb::create().await;
    let pool = db.pool.clone();
    let store = PgSessionStore::new(pool.clone());

    let missing = Uuid::new_v4();
    assert!(matches!(
        store.find(missing, Utc::now()).await,
        Err(StoreError::NotFound(id)) if id == missing
    ));
    assert!(matches!(
        store.add_plans(missing, &[]).await,
        Err(StoreError::NotFound(_))
    ));

    let id = Uuid::new_v4();
    let created = store.create(id, SessionMeta::default(), Duration::hours(1)).await.unwrap();
    assert!(matches!(
        store.find(id, created.expires_at).await,
        Err(StoreError::Expired { .. })
    ));

    db.teardown().await;
}

#[tokio::test]
async fn sweep_deletes_with_dependents() {
    let db = TestDb::create().await;
    let pool = db.pool.clone();
    let store = PgSessionStore::new(pool.clone());

    let id = Uuid::new_v4();
    let created = store.create(id, SessionMeta::default(), Duration::minutes(1)).await.unwrap();
    store.add_search_results(id, &[place("a", "museum")]).await.unwrap();
    let keep = Uuid::new_v4();
    store.create(keep, SessionMeta::default(), Duration::days(7)).await.unwrap();

    let report = sweep_expired(&store, created.expires_at).await.unwrap();
    assert_eq!(report.deleted, vec![id]);

    let long_ago = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
    assert!(matches!(
        store.find(id, long_ago).await,
        Err(StoreError::NotFound(_))
    ));
    assert!(store.find(keep, Utc::now()).await.is_ok());

    let (orphans,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM plan_candidate_search_results WHERE session_id = $1")
            .bind(id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(orphans, 0);

    db.teardown().await;
}
