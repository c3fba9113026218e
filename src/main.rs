//! Application entry point for the `ecofloor-sensorflow` service.
//!
//! This binary orchestrates the startup sequence:
//! - Loading configuration from environment variables or `.env`
//! - Initializing structured logging/tracing
//! - Starting the periodic pipeline scheduler (unless disabled)
//! - Mounting all API routes via the `routes` gateway (EMBP pattern)
//! - Binding the Axum HTTP server and serving requests
//!
//! # Environment Variables
//! - `SENSOR_DATA_PATH` (optional) – CSV produced by the `simulate` binary
//! - `BIND_ADDR` (optional) – listen address (default: `0.0.0.0:8080`)
//! - `SENSORFLOW_LOG_LEVEL` (optional) – log verbosity (default: `debug`)
//! - `SENSORFLOW_SPAN_EVENTS` (optional) – span event mode for tracing
//!
//! See `config.rs` for the model and scheduler settings.
use std::{env, net::SocketAddr};

use anyhow::{anyhow, Result};
use axum::Router;
use dotenvy::dotenv;
use is_terminal::IsTerminal;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use ecofloor_sensorflow::{config, routes, scheduler};

// ---

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    init_tracing();
    dotenv().ok();

    let cfg = config::load_from_env()?;
    cfg.log_config();

    if !cfg.data_path.exists() {
        tracing::warn!(
            "Data file {} does not exist yet; run the `simulate` binary to create it",
            cfg.data_path.display()
        );
    }

    let _refresh = scheduler::spawn(cfg.clone());

    let addr: SocketAddr = cfg
        .bind_addr
        .parse()
        .map_err(|e| anyhow!("Invalid BIND_ADDR '{}': {}", cfg.bind_addr, e))?;

    // Build app from routes gateway (EMBP)
    let app: Router = routes::router(cfg);

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ---

/// Install the global subscriber for the service and its refresh loop.
///
/// `RUST_LOG` wins when set. Otherwise `SENSORFLOW_LOG_LEVEL` (default
/// `debug`, which shows per-floor feature counts and dropped short floors)
/// sets the level, with `hyper=warn` appended so per-request connection
/// events stay out of the pipeline log.
///
/// `SENSORFLOW_SPAN_EVENTS` picks span events: `full`, `enter_exit`, or
/// close-only by default. `FORCE_COLOR` overrides TTY colour detection.
fn init_tracing() {
    // ---
    let span_events = match env::var("SENSORFLOW_SPAN_EVENTS").as_deref() {
        Ok("full") => FmtSpan::FULL,
        Ok("enter_exit") => FmtSpan::ENTER | FmtSpan::EXIT,
        _ => FmtSpan::CLOSE,
    };

    // Determine if we should use colors
    let use_color = match env::var("FORCE_COLOR").as_deref() {
        Ok("1") | Ok("true") | Ok("yes") => true,
        Ok("0") | Ok("false") | Ok("no") => false,
        _ => std::io::stdout().is_terminal(),
    };

    // Use RUST_LOG if available, otherwise fall back to SENSORFLOW_LOG_LEVEL
    let env_filter = if env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match env::var("SENSORFLOW_LOG_LEVEL").ok().as_deref() {
            Some("trace") => "trace",
            Some("debug") => "debug",
            Some("info") => "info",
            Some("warn") => "warn",
            Some("error") => "error",
            _ => "debug",
        };
        EnvFilter::new(format!("{level},hyper=warn"))
    };

    tracing_subscriber::fmt()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(span_events)
        .with_env_filter(env_filter)
        .with_ansi(use_color)
        .compact()
        .init();
}
