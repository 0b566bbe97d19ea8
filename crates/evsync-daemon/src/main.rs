//! evsync-daemon entry point.
//!
//! This file is intentionally thin: it sets up tracing, loads config and
//! the location directory, wires the reconciliation engine over the HTTP
//! clients, and starts the server plus the sweep scheduler. All route
//! handlers live in `routes.rs`; shared state lives in `state.rs`.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use evsync_config::{ConnectorConfig, LocationDirectory};
use evsync_daemon::{routes, scheduler, state::AppState};
use evsync_reconcile::{
    BatchReconciler, EligibilityGate, LogNotifier, ReconciliationEngine,
};
use evsync_source::{EventFetcher, HttpSourceClient};
use evsync_target::{DedupIndex, HttpTargetClient, OrderInjector};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{info, Level};

/// How long a positive dedup fact stays in the fast path before the next
/// check goes back to Target.
const DEDUP_FAST_PATH_TTL: Duration = Duration::from_secs(30 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env.local if present (dev convenience). Silent if the file does
    // not exist — production injects env vars directly.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let config = Arc::new(ConnectorConfig::from_env().context("load connector config")?);
    info!(
        config_hash = %config.config_hash()?,
        dry_run = config.dry_run,
        kill_switch = config.kill_switch,
        "configuration loaded"
    );

    let locations_path =
        std::env::var("EVSYNC_LOCATIONS_PATH").unwrap_or_else(|_| "locations.json".to_string());
    let locations = Arc::new(
        LocationDirectory::load(&locations_path)
            .with_context(|| format!("load location directory from {locations_path}"))?,
    );
    info!(
        locations = locations.len(),
        directory_hash = %locations.hash(),
        "location directory loaded"
    );

    let source_base = require_env("EVSYNC_SOURCE_BASE_URL")?;
    let source_token = require_env("EVSYNC_SOURCE_READ_TOKEN")?;
    let target_base = require_env("EVSYNC_TARGET_BASE_URL")?;
    let target_key = require_env("EVSYNC_TARGET_API_KEY")?;
    let target_secret = require_env("EVSYNC_TARGET_API_SECRET")?;
    let signing_secret = std::env::var("EVSYNC_WEBHOOK_SECRET").ok();
    if signing_secret.is_none() {
        tracing::warn!("EVSYNC_WEBHOOK_SECRET unset: webhook signature checks disabled");
    }

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(20))
        .build()
        .context("build http client")?;

    let source = Arc::new(HttpSourceClient::new(
        http.clone(),
        source_base,
        source_token,
        locations.clone(),
    ));
    let target = Arc::new(HttpTargetClient::new(
        http,
        target_base,
        &target_key,
        &target_secret,
    ));

    let dedup = Arc::new(DedupIndex::new(target.clone(), DEDUP_FAST_PATH_TTL));
    let engine = Arc::new(ReconciliationEngine::new(
        EventFetcher::new(source.clone()),
        EligibilityGate::from_config(&config, locations.clone()),
        dedup.clone(),
        OrderInjector::new(target, dedup),
        locations.clone(),
        Arc::new(LogNotifier),
        config.source_name.clone(),
        config.dry_run,
    ));
    let batch = Arc::new(BatchReconciler::new(
        engine.clone(),
        source,
        config.batch_concurrency,
        config.event_timeout(),
    ));

    let shared = Arc::new(AppState::new(
        config,
        locations,
        engine,
        batch,
        signing_secret,
    ));

    scheduler::spawn_sweep(shared.clone());

    let app = routes::build_router(Arc::clone(&shared)).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    let addr = bind_addr_from_env().unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 8787)));
    info!("evsync-daemon listening on http://{}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server crashed")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

fn require_env(key: &str) -> anyhow::Result<String> {
    std::env::var(key).with_context(|| format!("{key} must be set"))
}

fn bind_addr_from_env() -> Option<SocketAddr> {
    std::env::var("EVSYNC_DAEMON_ADDR").ok()?.parse().ok()
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        tracing::error!("failed to install ctrl-c handler; running until killed");
        std::future::pending::<()>().await;
    }
}
