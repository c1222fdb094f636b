// RatioLab - Adaptive Compression Selection
// Copyright (C) 2025 RatioLab Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published
// by the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.

//! HTTP adapter for the RatioLab compression engine
//!
//! Exposes analysis, recommendation, compression and benchmarking over a
//! small JSON API built on axum.
//!
//! | Route | Method | Purpose |
//! |-------|--------|---------|
//! | `/compress` | POST | Compress with a named algorithm or `"auto"` |
//! | `/compare` | POST | Benchmark algorithms side by side |
//! | `/recommendations` | GET, POST | Ranked candidates for content |
//! | `/analyze` | POST | Content profile |
//! | `/algorithms` | GET | Registry listing |
//! | `/accuracy` | GET | Tracked prediction accuracy |
//! | `/health` | GET | Liveness |
//! | `/metrics` | GET | Prometheus text format |

pub mod error;
pub mod handlers;
pub mod metrics;
pub mod state;

pub use error::ApiError;
pub use metrics::ServerMetrics;
pub use state::AppState;

use anyhow::Context;
use axum::extract::{DefaultBodyLimit, MatchedPath, Request, State};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use ratiolab_config::Config;
use ratiolab_engine::{
    AccuracyTracker, CompressionEngine, ComparatorSettings, RecommenderSettings,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the axum router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    let mut router = Router::new()
        .route("/compress", post(handlers::compress))
        .route("/compare", post(handlers::compare))
        .route(
            "/recommendations",
            get(handlers::recommendations_query).post(handlers::recommendations),
        )
        .route("/analyze", post(handlers::analyze))
        .route("/algorithms", get(handlers::algorithms))
        .route("/accuracy", get(handlers::accuracy))
        .route("/health", get(handlers::health));

    if state.metrics_enabled {
        router = router.route("/metrics", get(handlers::metrics));
    }

    router = router
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            track_requests,
        ))
        .layer(DefaultBodyLimit::max(state.max_body_bytes))
        .layer(TraceLayer::new_for_http());

    if state.cors_enabled {
        router = router.layer(CorsLayer::permissive());
    }

    router.with_state(state)
}

/// Count every routed request by its route template and status
async fn track_requests(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| request.uri().path().to_owned());

    let response = next.run(request).await;
    state
        .metrics
        .record_request(&route, response.status().as_u16());
    response
}

/// Build an engine from configuration
///
/// Loads accuracy history from `tracker.history_path` when the file exists.
pub fn engine_from_config(config: &Config) -> anyhow::Result<CompressionEngine> {
    let engine = &config.engine;
    let recommender = RecommenderSettings {
        affinity_baseline: engine.affinity_baseline,
        min_confidence: engine.min_confidence,
        min_history: engine.min_history,
        calibration_weight: engine.calibration_weight,
        fallback_algorithm: engine.fallback_algorithm.clone(),
        fallback_level: engine.fallback_level,
        max_candidates: engine.max_candidates,
    };
    let comparator = ComparatorSettings {
        max_workers: config.benchmark.max_workers,
        timeout: config.benchmark.timeout_ms.map(Duration::from_millis),
    };

    let tracker = match config.tracker.history_path.as_deref() {
        Some(path) => load_history(Path::new(path))?,
        None => AccuracyTracker::new(),
    };

    CompressionEngine::builder()
        .recommender_settings(recommender)
        .comparator_settings(comparator)
        .tracker(Arc::new(tracker))
        .build()
        .context("Failed to build compression engine")
}

/// Load accuracy history, starting empty when the file does not exist yet
pub fn load_history(path: &Path) -> anyhow::Result<AccuracyTracker> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "No accuracy history yet");
        return Ok(AccuracyTracker::new());
    }

    let tracker = AccuracyTracker::load_from(path)
        .with_context(|| format!("Failed to load accuracy history from {}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        records = tracker.len(),
        "Loaded accuracy history"
    );
    Ok(tracker)
}

/// Serve until Ctrl+C, then persist accuracy history
pub async fn serve(config: &Config, engine: CompressionEngine) -> anyhow::Result<()> {
    let state = Arc::new(AppState::new(engine, config).context("Failed to register metrics")?);
    let app = create_router(Arc::clone(&state));

    let bind_addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;

    tracing::info!(
        algorithms = state.engine.registry().len(),
        "RatioLab server listening on {}",
        bind_addr
    );
    tracing::info!("Press Ctrl+C to stop");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    if let Some(path) = state.history_path.clone() {
        let tracker = Arc::clone(state.engine.tracker());
        let count = tracker.len();
        tokio::task::spawn_blocking(move || tracker.save_to(&path))
            .await
            .context("History writer task failed")?
            .context("Failed to save accuracy history")?;
        tracing::info!(records = count, "Saved accuracy history");
    }

    Ok(())
}

async fn shutdown_signal() {
    wait_for_shutdown(tokio::signal::ctrl_c()).await
}

/// Resolve once `signal` fires; a signal that cannot be installed never fires
async fn wait_for_shutdown<F>(signal: F)
where
    F: std::future::Future<Output = std::io::Result<()>>,
{
    if let Err(e) = signal.await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
