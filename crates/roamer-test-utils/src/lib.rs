//! Throwaway PostgreSQL databases for roamer integration tests.
//!
//! One server is shared per test binary: the one at `ROAMER_TEST_PG_URL`
//! when set, otherwise a testcontainers PostgreSQL 16 container started on
//! first use. Every [`TestDb`] is a fresh, fully migrated database on it.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;
use uuid::Uuid;

use roamer_db::pool::run_migrations;

/// Server URL without a database name, e.g. `postgresql://u:p@host:5432`.
struct Server {
    base_url: String,
    _container: Option<ContainerAsync<Postgres>>,
}

static SERVER: OnceCell<Server> = OnceCell::const_new();

async fn start_server() -> Server {
    if let Ok(base_url) = std::env::var("ROAMER_TEST_PG_URL") {
        return Server {
            base_url: base_url.trim_end_matches('/').to_string(),
            _container: None,
        };
    }

    let container = Postgres::default()
        .with_tag("16")
        .start()
        .await
        .expect("failed to start PostgreSQL container (is Docker running?)");
    let host = container.get_host().await.expect("container host");
    let port = container
        .get_host_port_ipv4(5432)
        .await
        .expect("container port");

    Server {
        base_url: format!("postgresql://postgres:postgres@{host}:{port}"),
        _container: Some(container),
    }
}

async fn base_url() -> &'static str {
    &SERVER.get_or_init(start_server).await.base_url
}

async fn connect(url: &str, max_connections: u32) -> PgPool {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(url)
        .await
        .unwrap_or_else(|e| panic!("failed to connect to {url}: {e}"))
}

/// A migrated database that lives until [`TestDb::teardown`].
pub struct TestDb {
    pub pool: PgPool,
    pub name: String,
}

impl TestDb {
    pub async fn create() -> Self {
        let base = base_url().await;
        let name = format!("roamer_test_{}", Uuid::new_v4().simple());

        let admin = connect(&format!("{base}/postgres"), 1).await;
        admin
            .execute(format!("CREATE DATABASE {name}").as_str())
            .await
            .unwrap_or_else(|e| panic!("failed to create {name}: {e}"));
        admin.close().await;

        let pool = connect(&format!("{base}/{name}"), 5).await;
        run_migrations(&pool).await.expect("migrations apply cleanly");
        Self { pool, name }
    }

    /// Close the pool and drop the database, ending stray sessions first.
    pub async fn teardown(self) {
        self.pool.close().await;

        let admin = connect(&format!("{}/postgres", base_url().await), 1).await;
        let _ = admin
            .execute(
                format!(
                    "SELECT pg_terminate_backend(pid) FROM pg_stat_activity \
                     WHERE datname = '{}' AND pid <> pg_backend_pid()",
                    self.name
                )
                .as_str(),
            )
            .await;
        let _ = admin
            .execute(format!("DROP DATABASE IF EXISTS {}", self.name).as_str())
            .await;
        admin.close().await;
    }
}
