//! Wikiracer HTTP server process.
//!
//! Serves `GET /wikiracer?origin=<title>&destination=<title>` against either
//! a live MediaWiki site or the built-in in-memory fixture wiki, returning
//! the first discovered chain of links within a caller-bounded deadline.

mod arg;
mod source;

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;

use arg::Arg;
use racer::{Racer, RacerError};
use source::Source;

struct AppState {
    racer: Racer<Source>,
    timeout: Duration,
}

#[derive(Debug, serde::Deserialize)]
struct FindPathQuery {
    #[serde(default)]
    origin: String,
    #[serde(default)]
    destination: String,
}

async fn find_path_handler(State(state): State<Arc<AppState>>, Query(params): Query<FindPathQuery>) -> (StatusCode, String) {
    let result = state
        .racer
        .find_path(state.timeout, &params.origin, &params.destination)
        .await;

    match result {
        Ok(r) => (StatusCode::OK, format!("Path: \"{}\", Duration: {:?}", r.path, r.duration)),
        Err(err @ RacerError::InvalidEmptyInput { .. }) => (StatusCode::BAD_REQUEST, err.to_string()),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

/// Maps `WIKIRACER_LOG_LEVEL` onto `tracing::Level`. The reference levels
/// (`CRITICAL|ERROR|WARNING|NOTICE|INFO|DEBUG`) don't line up one-to-one with
/// `tracing`'s five levels, so `CRITICAL` collapses into `ERROR` and `NOTICE`
/// into `INFO` — a deliberate, documented lossy translation (see DESIGN.md).
fn log_level_from_env() -> tracing::Level {
    match std::env::var("WIKIRACER_LOG_LEVEL").as_deref() {
        Ok("CRITICAL") | Ok("ERROR") => tracing::Level::ERROR,
        Ok("WARNING") => tracing::Level::WARN,
        Ok("NOTICE") | Ok("INFO") => tracing::Level::INFO,
        Ok("DEBUG") => tracing::Level::DEBUG,
        _ => tracing::Level::INFO,
    }
}

/// Sets up dual-sink logging: everything at `level` goes to a daily-rolling
/// log file, warnings and above also go to stderr. The returned guards must
/// stay alive for the life of the process or the non-blocking writers stop
/// flushing.
///
/// The console layer needs the binary built with `RUSTFLAGS="--cfg
/// tokio_unstable"` to see task instrumentation; without it the layer still
/// attaches but the profiling endpoint has nothing to show.
fn init_logging(level: tracing::Level, profiling_port: u16) -> (WorkerGuard, WorkerGuard) {
    let log_dir = std::env::var("WIKIRACER_LOG_DIR").unwrap_or_else(|_| "logs".to_string());
    let (non_blocking_logfile, logfile_guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(log_dir, "wikiracer-server.log"));
    let (non_blocking_stderr, stderr_guard) = tracing_appender::non_blocking(std::io::stderr());

    let console_layer = (profiling_port != 0).then(|| {
        console_subscriber::ConsoleLayer::builder()
            .server_addr(([127, 0, 0, 1], profiling_port))
            .spawn()
    });

    tracing_subscriber::registry()
        .with(console_layer)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking_logfile)
                .with_ansi(false)
                .with_filter(tracing_subscriber::filter::LevelFilter::from_level(level)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking_stderr)
                .with_ansi(true)
                .with_filter(tracing_subscriber::filter::LevelFilter::WARN),
        )
        .init();

    (logfile_guard, stderr_guard)
}

#[tokio::main]
async fn main() {
    let arg = Arg::parse();
    let _guards = init_logging(log_level_from_env(), arg.profiling_port);

    let source = if arg.fixture {
        tracing::info!("serving the in-memory fixture wiki");
        Source::fixture()
    } else {
        tracing::info!(site = %arg.site, "serving a live MediaWiki site");
        Source::live(&arg.site, arg.concurrency_limit)
    };

    let state = Arc::new(AppState {
        racer: Racer::new(Arc::new(source)),
        timeout: Duration::from_secs(arg.timeout),
    });

    let app = Router::new().route("/wikiracer", get(find_path_handler)).with_state(state);

    let addr = format!("{}:{}", arg.bind_addr(), arg.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(error = %e, addr, "failed to bind HTTP listener");
            return;
        }
    };
    tracing::info!(addr, "wikiracer server listening");

    tokio::select! {
        res = axum::serve(listener, app) => {
            if let Err(e) = res {
                tracing::error!(error = %e, "HTTP server unexpectedly stopped");
            }
        },
        res = tokio::signal::ctrl_c() => {
            match res {
                Ok(_) => tracing::info!("ctrl-c received, shutting down wikiracer server"),
                Err(e) => tracing::error!(error = %e, "cannot listen for signal"),
            }
        }
    }
}
