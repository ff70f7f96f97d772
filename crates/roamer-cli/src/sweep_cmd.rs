//! `roamer sweep`: delete expired plan candidate sessions.

use std::time::Duration;

use anyhow::{Result, bail};
use chrono::Utc;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use roamer_core::session::{PgSessionStore, run_sweeper, sweep_expired};

/// Run one sweep, or keep sweeping every `interval_secs` until Ctrl-C.
pub async fn run_sweep(pool: &PgPool, once: bool, interval_secs: u64) -> Result<()> {
    let store = PgSessionStore::new(pool.clone());

    if once {
        let report = sweep_expired(&store, Utc::now()).await?;
        println!(
            "Sweep complete: {} session(s) deleted, {} already gone, {} failed.",
            report.deleted.len(),
            report.missing,
            report.failed
        );
        return Ok(());
    }

    if interval_secs == 0 {
        bail!("--interval-secs must be greater than zero");
    }

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("received Ctrl-C, stopping sweeper");
            on_signal.cancel();
        }
    });

    println!("Sweeping expired sessions every {interval_secs}s (Ctrl-C to stop)...");
    run_sweeper(&store, Duration::from_secs(interval_secs), cancel).await;
    Ok(())
}
