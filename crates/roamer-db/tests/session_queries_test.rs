//! Integration tests for the plan candidate session tables.
//!
//! Each test creates its own database on the shared PostgreSQL instance from
//! `roamer-test-utils` (a testcontainers container unless
//! `ROAMER_TEST_PG_URL` is set), so they need Docker or that variable.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;
use uuid::Uuid;

use roamer_db::models::{CachedPlace, NewPlan, NewSession};
use roamer_db::queries::{plans, search_results, sessions};
use roamer_test_utils::TestDb;

fn new_session(expires_at: DateTime<Utc>) -> NewSession {
    NewSession {
        id: Uuid::new_v4(),
        start_latitude: Some(35.658581),
        start_longitude: Some(139.745433),
        preferred_categories: vec!["cafe".to_string()],
        disliked_categories: vec![],
        free_time_minutes: Some(120),
        created_based_on_current_location: true,
        created_at: Utc.with_ymd_and_hms(2019, 12, 1, 0, 0, 0).unwrap(),
        expires_at,
    }
}

fn cached(provider_id: &str, name: &str) -> CachedPlace {
    CachedPlace {
        provider_id: provider_id.to_string(),
        place: json!({ "provider_id": provider_id, "name": name }),
    }
}

#[tokio::test]
async fn insert_and_get_session() {
    let db = TestDb::create().await;
    let pool = db.pool.clone();

    let expires = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
    let new = new_session(expires);
    let inserted = sessions::insert_session(&pool, &new).await.unwrap();
    assert_eq!(inserted.id, new.id);
    assert_eq!(inserted.preferred_categories, vec!["cafe".to_string()]);
    assert_eq!(inserted.expires_at, expires);

    let fetched = sessions::get_session(&pool, new.id).await.unwrap();
    assert_eq!(fetched, Some(inserted));

    let missing = sessions::get_session(&pool, Uuid::new_v4()).await.unwrap();
    assert!(missing.is_none());

    db.teardown().await;
}

#[tokio::test]
async fn expired_listing_includes_cutoff_instant() {
    let db = TestDb::create().await;
    let pool = db.pool.clone();

    let before = new_session(Utc.with_ymd_and_hms(2019, 12, 31, 23, 59, 59).unwrap());
    let exact = new_session(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap());
    let after = new_session(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 1).unwrap());
    for s in [&before, &exact, &after] {
        sessions::insert_session(&pool, s).await.unwrap();
    }

    let cutoff = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
    let expired = sessions::list_expired_sessions(&pool, cutoff).await.unwrap();
    let ids: Vec<Uuid> = expired.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![before.id, exact.id]);

    db.teardown().await;
}

#[tokio::test]
async fn cascade_delete_removes_dependents() {
    let db = TestDb::create().await;
    let pool = db.pool.clone();

    let session = new_session(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap());
    sessions::insert_session(&pool, &session).await.unwrap();
    search_results::insert_search_results(&pool, session.id, &[cached("p1", "Museum")])
        .await
        .unwrap();
    plans::append_plans(
        &pool,
        session.id,
        &[NewPlan {
            id: Uuid::new_v4(),
            title: "Museum walk".to_string(),
            time_in_minutes: 60,
            places: json!([]),
            transitions: json!([]),
        }],
    )
    .await
    .unwrap();

    assert!(sessions::delete_session_cascade(&pool, session.id).await.unwrap());
    assert!(sessions::get_session(&pool, session.id).await.unwrap().is_none());
    assert!(search_results::list_search_results(&pool, session.id).await.unwrap().is_empty());
    assert!(plans::list_plans_for_session(&pool, session.id).await.unwrap().is_empty());

    // Second delete is a no-op.
    assert!(!sessions::delete_session_cascade(&pool, session.id).await.unwrap());

    db.teardown().await;
}

#[tokio::test]
async fn search_results_append_then_update() {
    let db = TestDb::create().await;
    let pool = db.pool.clone();

    let session = new_session(Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap());
    sessions::insert_session(&pool, &session).await.unwrap();

    search_results::insert_search_results(&pool, session.id, &[cached("p1", "A"), cached("p2", "B")])
        .await
        .unwrap();
    // Duplicate provider id is ignored on append.
    search_results::insert_search_results(&pool, session.id, &[cached("p1", "A again")])
        .await
        .unwrap();

    let updated = search_results::update_search_results(
        &pool,
        session.id,
        &[cached("p2", "B enriched"), cached("unknown", "X")],
    )
    .await
    .unwrap();
    assert_eq!(updated, 1);

    let rows = search_results::list_search_results(&pool, session.id).await.unwrap();
    let names: Vec<&str> = rows
        .iter()
        .map(|r| r.place.0["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["A", "B enriched"]);

    db.teardown().await;
}

#[tokio::test]
async fn plans_keep_append_order() {
    let db = TestDb::create().await;
    let pool = db.pool.clone();

    let session = new_session(Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap());
    sessions::insert_session(&pool, &session).await.unwrap();

    let plan = |title: &str| NewPlan {
        id: Uuid::new_v4(),
        title: title.to_string(),
        time_in_minutes: 30,
        places: json!([]),
        transitions: json!([]),
    };
    plans::append_plans(&pool, session.id, &[plan("first"), plan("second")])
        .await
        .unwrap();
    plans::append_plans(&pool, session.id, &[plan("third")]).await.unwrap();

    let rows = plans::list_plans_for_session(&pool, session.id).await.unwrap();
    let titles: Vec<&str> = rows.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["first", "second", "third"]);
    assert_eq!(rows.iter().map(|r| r.position).collect::<Vec<_>>(), vec![0, 1, 2]);

    db.teardown().await;
}

#[tokio::test]
async fn concurrent_appends_get_distinct_positions() {
    let db = TestDb::create().await;
    let pool = db.pool.clone();

    let session = new_session(Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap());
    sessions::insert_session(&pool, &session).await.unwrap();

    let mut tasks = tokio::task::JoinSet::new();
    for i in 0..8 {
        let pool = pool.clone();
        let id = session.id;
        tasks.spawn(async move {
            let batch = [
                NewPlan {
                    id: Uuid::new_v4(),
                    title: format!("batch {i} a"),
                    time_in_minutes: 30,
                    places: json!([]),
                    transitions: json!([]),
                },
                NewPlan {
                    id: Uuid::new_v4(),
                    title: format!("batch {i} b"),
                    time_in_minutes: 30,
                    places: json!([]),
                    transitions: json!([]),
                },
            ];
            plans::append_plans(&pool, id, &batch).await
        });
    }
    while let Some(joined) = tasks.join_next().await {
        joined.unwrap().unwrap();
    }

    let rows = plans::list_plans_for_session(&pool, session.id).await.unwrap();
    assert_eq!(rows.iter().map(|r| r.position).collect::<Vec<_>>(), (0..16).collect::<Vec<i32>>());
    // Each batch stays contiguous.
    for pair in rows.chunks(2) {
        assert_eq!(pair[0].title.trim_end_matches(" a"), pair[1].title.trim_end_matches(" b"));
    }

    db.teardown().await;
}

#[tokio::test]
async fn append_to_unknown_session_fails() {
    let db = TestDb::create().await;

    let err = plans::append_plans(
        &db.pool,
        Uuid::new_v4(),
        &[NewPlan {
            id: Uuid::new_v4(),
            title: "orphan".to_string(),
            time_in_minutes: 10,
            places: json!([]),
            transitions: json!([]),
        }],
    )
    .await
    .unwrap_err();
    assert!(err.to_string().contains("not found"), "{err}");

    db.teardown().await;
}
