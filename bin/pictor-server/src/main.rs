//! pictor-server – entry point.
//!
//! Startup order:
//! 1. Load `.env` (if any) and parse configuration from environment variables.
//! 2. Initialise structured tracing (JSON or pretty; stdout or rolling file).
//! 3. Open the SQLite database, run pending migrations, purge stale sessions.
//! 4. Build the prompt and image synthesizers and the template environment.
//! 5. Build the Axum router and start the HTTP server with graceful shutdown.

mod auth;
mod config;
mod entities;
mod error;
mod flash;
mod middleware;
mod routes;
mod schemas;
mod state;
mod views;

use std::net::SocketAddr;
use std::sync::Arc;

use chrono::Utc;
use pictor_synth::{GeminiPromptSynthesizer, ImageSynthesizer};
use tracing::{info, warn};

use crate::config::Config;
use crate::entities::{SessionStore, SqliteStore};
use crate::state::AppState;
use crate::views::Views;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Configuration ───────────────────────────────────────────────────────
    let dotenv = dotenvy::dotenv();
    let cfg = Config::from_env();

    // ── 2. Tracing ─────────────────────────────────────────────────────────────
    let env_filter = match tracing_subscriber::EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => match cfg.log_level.parse::<tracing_subscriber::EnvFilter>() {
            Ok(f) => f,
            Err(e) => {
                eprintln!(
                    "WARN: PICTOR_LOG='{}' is not a valid tracing filter ({}); \
                     falling back to 'info'",
                    cfg.log_level, e
                );
                tracing_subscriber::EnvFilter::new("info")
            }
        },
    };

    // The guard flushes buffered log lines on drop; keep it until exit.
    let (writer, _log_guard) = match cfg.log_dir.as_deref() {
        Some(dir) => tracing_appender::non_blocking(tracing_appender::rolling::daily(
            dir,
            "pictor-server.log",
        )),
        None => tracing_appender::non_blocking(std::io::stdout()),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(writer)
        .with_target(true)
        .with_thread_ids(true);

    if cfg.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    info!(version = env!("CARGO_PKG_VERSION"), "pictor-server starting");
    if let Ok(path) = dotenv {
        info!(path = %path.display(), "loaded environment file");
    }
    info!(synth = ?cfg.synth, "provider configuration");

    // ── 3. Database ────────────────────────────────────────────────────────────
    let store = SqliteStore::connect(&cfg.database_url).await?;
    info!(database_url = %cfg.database_url, "database ready");

    match store.purge_expired_sessions(Utc::now()).await {
        Ok(0) => {}
        Ok(n) => info!(purged = n, "expired sessions removed"),
        Err(e) => warn!(error = %e, "failed to purge expired sessions"),
    }

    // ── 4. Synthesizers and views ──────────────────────────────────────────────
    if cfg.synth.gemini_api_key.is_none() {
        warn!("GEMINI_API_KEY is not configured; the automatic flow will report an error");
    }
    let prompts = GeminiPromptSynthesizer::new(&cfg.synth);
    let images = ImageSynthesizer::from_config(&cfg.synth);
    let views = Views::new()?;

    let state = Arc::new(AppState {
        config: Arc::new(cfg.clone()),
        store: Arc::new(store),
        prompts: Arc::new(prompts),
        images: Arc::new(images),
        views: Arc::new(views),
    });

    // ── 5. HTTP server with graceful shutdown ──────────────────────────────────
    let app = routes::build(Arc::clone(&state));
    let addr: SocketAddr = cfg.bind_address.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("pictor-server stopped");
    Ok(())
}

/// Returns a future that resolves when SIGINT (Ctrl-C) or SIGTERM is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install CTRL+C signal handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => warn!(error = %e, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("shutdown signal received; starting graceful shutdown");
}
