use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use axum::http::header::{ACCEPT, ACCEPT_LANGUAGE, CONTENT_LANGUAGE, CONTENT_TYPE};
use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use clap::Parser;
use price_engine::{EngineConfig, PriceEngine};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::commitment_config::CommitmentConfig;
use sqlx::postgres::PgPoolOptions;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vault_client::{ProgramConfig, VaultReader};

use crate::app_state::AppState;
use crate::cfg::Cfg;
use crate::db_init::init_db;
use crate::events::Feeds;
use crate::telegram::Alerts;

mod app_state;
mod cfg;
mod db_init;
mod events;
mod holders;
mod http_handler;
mod price_watcher;
mod telegram;
mod webhook;

#[tokio::main]
async fn main() -> Result<()> {
    // Logging: controlled via RUST_LOG, e.g. RUST_LOG=info,relay=debug
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = Cfg::parse();

    let program = ProgramConfig::new(&cfg.program_id, &cfg.mint, &cfg.treasury, &cfg.founder)
        .context("program configuration")?;

    let db = match &cfg.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(url)
                .await
                .context("connect postgres")?;
            init_db(&pool).await?;
            Some(pool)
        }
        None => {
            info!("no DATABASE_URL; event log is memory-only");
            None
        }
    };

    let rpc = Arc::new(RpcClient::new_with_commitment(
        cfg.rpc_url.clone(),
        CommitmentConfig::confirmed(),
    ));
    let reader = VaultReader::new(rpc.clone(), program.clone());

    let engine = PriceEngine::new(EngineConfig {
        // The relay is the backend; it never asks itself for a price.
        relay_base: None,
        pyth_feed_id: cfg.pyth_feed_id.clone(),
        allow_coingecko: cfg.allow_coingecko,
        dev_spot_usd: None,
    });

    let http = reqwest::Client::new();
    let alerts = Alerts::new(
        http,
        cfg.telegram_bot_token.clone(),
        cfg.telegram_admin_chat_id.clone(),
    );

    let port = cfg.port;
    let state = Arc::new(AppState {
        cfg,
        program,
        rpc,
        reader,
        engine,
        feeds: Mutex::new(Feeds::default()),
        db,
        alerts,
    });

    tokio::spawn(price_watcher::watch_loop(state.clone()));

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_origin(Any)
        .allow_headers([ACCEPT, ACCEPT_LANGUAGE, CONTENT_LANGUAGE, CONTENT_TYPE]);

    let app = Router::new()
        .route("/", get(|| async { "DMD Relay" }))
        .route("/health", get(http_handler::handle_health))
        .route("/ingest", post(webhook::handle_ingest))
        .route("/api/events", get(http_handler::handle_events))
        .route("/api/treasury-events", get(http_handler::handle_treasury_events))
        .route("/api/founder-events", get(http_handler::handle_founder_events))
        .route("/api/stats", get(http_handler::handle_stats))
        .route("/api/price", get(http_handler::handle_price))
        .route("/api/holders", get(http_handler::handle_holders))
        .layer(cors)
        .with_state(state.clone());

    let addr: SocketAddr = format!("0.0.0.0:{port}")
        .parse()
        .expect("valid listen addr");
    info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("shutdown complete");
    Ok(())
}

// Graceful shutdown on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
}
