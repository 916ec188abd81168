//! Pari-Mutuel Race Engine — Entry Point
//!
//! Initializes configuration, logging, the ledger store, and the race
//! scheduler. Runs until SIGINT.
//!
//! Wiring sequence:
//! 1. Load config.toml + validate
//! 2. Init tracing (JSON structured logging)
//! 3. Seed the ledger (participant pool + opening balances)
//! 4. Create SettlementEngine + RaceScheduler over the ledger port
//! 5. Spawn health server on :9090 (/live + /ready)
//! 6. Spawn the RaceScheduler lifecycle loop
//! 7. Wait for SIGINT → graceful shutdown (current race settles first)

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::{broadcast, watch};
use tracing::{error, info};

mod adapters;
mod config;
mod domain;
mod ports;
mod usecases;

use adapters::persistence::MemoryLedger;
use domain::race::User;
use ports::ledger::LedgerStore;
use usecases::scheduler::RaceScheduler;
use usecases::settlement::SettlementEngine;

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Load configuration from config.toml ──────────────
    let config = config::loader::load_config("config.toml")
        .context("Failed to load configuration")?;

    // ── 2. Initialize structured JSON logging ───────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new(&config.engine.log_level)
                }),
        )
        .json()
        .init();

    info!(
        name = %config.engine.name,
        version = env!("CARGO_PKG_VERSION"),
        cadence_secs = config.scheduler.cadence_secs,
        field_size = config.scheduler.field_size,
        "Starting pari-mutuel race engine"
    );

    // ── 3. Shutdown signal channels ─────────────────────────
    let (shutdown_tx, _shutdown_rx) = broadcast::channel::<()>(1);
    let (health_tx, health_rx) = watch::channel(true);

    // ── 4. Seed the ledger store ────────────────────────────
    let store = Arc::new(MemoryLedger::new(
        config.pool.participants.clone(),
    ));
    for seed in &config.seed_users {
        let user = User::with_balance(seed.name.clone(), seed.balance);
        let user_id = user.id;
        store
            .insert_user(user)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to seed user {}: {e}", seed.name))?;
        info!(%user_id, name = %seed.name, balance = %seed.balance, "Seeded user");
    }

    // ── 5. Wire use cases over the ledger port ──────────────
    let settlement = Arc::new(SettlementEngine::with_config(
        Arc::clone(&store),
        config.betting.max_retries,
        Duration::from_millis(config.betting.retry_base_delay_ms),
    ));
    let scheduler = Arc::new(RaceScheduler::new(
        Arc::clone(&store),
        Arc::clone(&settlement),
        &config.scheduler,
    ));

    // ── 6. Spawn health server on :9090 ─────────────────────
    let health_handle = tokio::spawn(serve_health(health_rx));

    // ── 7. Spawn the race lifecycle loop ────────────────────
    let scheduler_shutdown = shutdown_tx.subscribe();
    let scheduler_ref = Arc::clone(&scheduler);
    let scheduler_handle = tokio::spawn(async move {
        if let Err(e) = scheduler_ref.run(scheduler_shutdown).await {
            error!(error = %e, "Race scheduler failed");
        }
    });

    info!("All tasks spawned — engine is running");

    // ── 8. Wait for SIGINT ──────────────────────────────────
    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("SIGINT received, initiating graceful shutdown");
        }
    }

    // 1. Signal the scheduler to stop after the current lifecycle step
    let _ = shutdown_tx.send(());
    info!("Shutdown signal broadcast");

    // 2. Mark health as unhealthy (readiness probe → 503)
    let _ = health_tx.send(false);

    // 3. Wait for the scheduler to finish (up to 30s)
    info!("Waiting for scheduler shutdown...");
    let _ = tokio::time::timeout(
        Duration::from_secs(30),
        scheduler_handle,
    )
    .await;

    // 4. Stop health server
    health_handle.abort();

    info!("Shutdown complete");
    Ok(())
}

/// Serve health endpoints on :9090.
///
/// - `/live`  — Liveness probe: 200 if process is running
/// - `/ready` — Readiness probe: 503 during graceful shutdown
async fn serve_health(health_rx: watch::Receiver<bool>) -> Result<()> {
    use axum::{extract::State, http::StatusCode, routing::get, Router};

    let app = Router::new()
        .route("/live", get(|| async { StatusCode::OK }))
        .route(
            "/ready",
            get(
                move |State(rx): State<watch::Receiver<bool>>| async move {
                    if *rx.borrow() {
                        StatusCode::OK
                    } else {
                        StatusCode::SERVICE_UNAVAILABLE
                    }
                },
            ),
        )
        .with_state(health_rx);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:9090").await?;
    info!("Health server listening on :9090");
    axum::serve(listener, app).await?;
    Ok(())
}
