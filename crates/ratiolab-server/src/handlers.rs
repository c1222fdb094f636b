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

//! Request handlers
//!
//! Engine calls are CPU bound and run on the blocking pool.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use ratiolab_engine::{
    AccuracyRecord, AccuracyStats, AlgorithmSpec, CompressionCandidate, CompressionResult,
    ContentProfile, ContentType,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::ApiError;
use crate::state::AppState;

/// Algorithm name that defers to the top recommendation
pub const AUTO_ALGORITHM: &str = "auto";

/// How `content` is encoded in a request body
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentEncoding {
    /// Raw UTF-8 text
    #[default]
    Utf8,
    /// Standard base64
    Base64,
}

impl ContentEncoding {
    /// Decode `content` into bytes
    pub fn decode(self, content: &str) -> Result<Vec<u8>, ApiError> {
        match self {
            ContentEncoding::Utf8 => Ok(content.as_bytes().to_vec()),
            ContentEncoding::Base64 => STANDARD
                .decode(content)
                .map_err(|e| ApiError::BadRequest(format!("invalid base64 content: {}", e))),
        }
    }
}

/// Body for `/analyze` and `POST /recommendations`
#[derive(Debug, Deserialize)]
pub struct ContentRequest {
    /// Payload
    pub content: String,
    /// Payload encoding
    #[serde(default)]
    pub encoding: ContentEncoding,
}

/// Query for `GET /recommendations`
pub type ContentQuery = ContentRequest;

/// Algorithm selection for `/compress`
#[derive(Debug, Deserialize)]
pub struct CompressParameters {
    /// Algorithm id or `"auto"`
    #[serde(default = "default_algorithm")]
    pub algorithm: String,
    /// Level; ignored for `"auto"`
    #[serde(default)]
    pub level: Option<i32>,
}

impl Default for CompressParameters {
    fn default() -> Self {
        Self {
            algorithm: default_algorithm(),
            level: None,
        }
    }
}

fn default_algorithm() -> String {
    AUTO_ALGORITHM.to_string()
}

/// Body for `/compress`
#[derive(Debug, Deserialize)]
pub struct CompressRequest {
    /// Payload
    pub content: String,
    /// Payload encoding
    #[serde(default)]
    pub encoding: ContentEncoding,
    /// Algorithm selection
    #[serde(default)]
    pub parameters: CompressParameters,
}

/// Body for `/compare`
#[derive(Debug, Deserialize)]
pub struct CompareRequest {
    /// Payload
    pub content: String,
    /// Payload encoding
    #[serde(default)]
    pub encoding: ContentEncoding,
    /// Algorithms to compare; all when absent or empty
    #[serde(default)]
    pub algorithms: Option<Vec<String>>,
}

/// Query for `/accuracy`
#[derive(Debug, Default, Deserialize)]
pub struct AccuracyQuery {
    /// Filter by algorithm id
    pub algorithm: Option<String>,
    /// Filter by detected content type
    pub content_type: Option<String>,
}

/// Outcome of a single compression
#[derive(Debug, Serialize)]
pub struct CompressResultBody {
    /// Algorithm that ran
    pub algorithm_used: String,
    /// Level it ran at
    pub level: i32,
    /// Input size in bytes
    pub original_size: u64,
    /// Output size in bytes
    pub compressed_size: u64,
    /// original / compressed
    pub compression_ratio: Option<f64>,
    /// Compression wall time in milliseconds
    pub compression_time: f64,
    /// Round trip reproduced the input
    pub integrity_verified: bool,
    /// Failure description
    pub error: Option<String>,
}

/// Response for `/compress`
#[derive(Debug, Serialize)]
pub struct CompressResponse {
    /// Run succeeded and verified
    pub success: bool,
    /// Compressed bytes, base64
    pub compressed_content: String,
    /// Run outcome
    pub result: CompressResultBody,
    /// Profile of the input
    pub content_profile: ContentProfile,
    /// Candidate that was executed
    pub candidate: CompressionCandidate,
}

/// Response for `/compare`
#[derive(Debug, Serialize)]
pub struct CompareResponse {
    /// Profile of the input
    pub content_profile: ContentProfile,
    /// One result per requested algorithm, in request order
    pub results: Vec<CompressionResult>,
    /// Id of the verified run with the highest ratio
    pub best_algorithm: Option<String>,
    /// The winning result
    pub best_result: Option<CompressionResult>,
    /// When the comparison finished
    pub generated_at: DateTime<Utc>,
}

/// Response for `/recommendations`
#[derive(Debug, Serialize)]
pub struct RecommendationsResponse {
    /// Profile of the input
    pub profile: ContentProfile,
    /// Ranked candidates, best first
    pub candidates: Vec<CompressionCandidate>,
}

/// Response for `/algorithms`
#[derive(Debug, Serialize)]
pub struct AlgorithmsResponse {
    /// Number of registered algorithms
    pub count: usize,
    /// Catalog sorted by id
    pub algorithms: Vec<AlgorithmSpec>,
}

/// Response for `/accuracy`
#[derive(Debug, Serialize)]
pub struct AccuracyResponse {
    /// Aggregates over the matching records
    pub stats: AccuracyStats,
    /// Matching records, oldest first
    pub records: Vec<AccuracyRecord>,
}

/// Response for `/health`
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"`
    pub status: &'static str,
    /// Crate version
    pub version: &'static str,
    /// Registered algorithm count
    pub algorithms: usize,
    /// Accuracy records held
    pub tracker_records: usize,
}

async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(format!("worker task failed: {}", e)))
}

/// POST /compress - Compress content with a named or recommended algorithm
pub async fn compress(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CompressRequest>, JsonRejection>,
) -> Result<Json<CompressResponse>, ApiError> {
    let Json(request) = body?;
    let content = request.encoding.decode(&request.content)?;
    let algorithm = match request.parameters.algorithm.as_str() {
        AUTO_ALGORITHM => None,
        id => Some(id.to_string()),
    };
    let level = request.parameters.level;

    tracing::info!(
        algorithm = algorithm.as_deref().unwrap_or(AUTO_ALGORITHM),
        size = content.len(),
        "POST /compress"
    );

    let worker = Arc::clone(&state);
    let outcome =
        blocking(move || worker.engine.compress(&content, algorithm.as_deref(), level)).await??;

    state.metrics.record_result(&outcome.execution.result);
    state.sync_gauges();

    let result = outcome.execution.result;
    Ok(Json(CompressResponse {
        success: result.is_success(),
        compressed_content: STANDARD.encode(&outcome.execution.compressed),
        result: CompressResultBody {
            algorithm_used: result.algorithm_id,
            level: result.parameters.level,
            original_size: result.original_size,
            compressed_size: result.compressed_size,
            compression_ratio: result.ratio,
            compression_time: result.duration_ms,
            integrity_verified: result.integrity_verified,
            error: result.error,
        },
        content_profile: outcome.profile,
        candidate: outcome.candidate,
    }))
}

/// POST /compare - Benchmark algorithms side by side
pub async fn compare(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CompareRequest>, JsonRejection>,
) -> Result<Json<CompareResponse>, ApiError> {
    let Json(request) = body?;
    let content = request.encoding.decode(&request.content)?;
    let algorithms = request.algorithms;

    tracing::info!(
        algorithms = algorithms.as_ref().map_or(0, Vec::len),
        size = content.len(),
        "POST /compare"
    );

    let worker = Arc::clone(&state);
    let report =
        blocking(move || worker.engine.compare(&content, algorithms.as_deref())).await??;

    for result in &report.results {
        state.metrics.record_result(result);
    }
    state.sync_gauges();

    let best_result = report.best().cloned();
    Ok(Json(CompareResponse {
        best_algorithm: best_result.as_ref().map(|r| r.algorithm_id.clone()),
        best_result,
        content_profile: report.content_profile,
        results: report.results,
        generated_at: report.generated_at,
    }))
}

/// GET /recommendations - Rank algorithms for query-string content
pub async fn recommendations_query(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ContentQuery>,
) -> Result<Json<RecommendationsResponse>, ApiError> {
    recommend_content(state, query).await
}

/// POST /recommendations - Rank algorithms for body content
pub async fn recommendations(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ContentRequest>, JsonRejection>,
) -> Result<Json<RecommendationsResponse>, ApiError> {
    let Json(request) = body?;
    recommend_content(state, request).await
}

async fn recommend_content(
    state: Arc<AppState>,
    request: ContentRequest,
) -> Result<Json<RecommendationsResponse>, ApiError> {
    let content = request.encoding.decode(&request.content)?;
    tracing::info!(size = content.len(), "recommendations");

    let response = blocking(move || {
        let profile = state.engine.analyze(&content);
        state
            .engine
            .recommend(&profile)
            .map(|candidates| RecommendationsResponse {
                profile,
                candidates,
            })
    })
    .await??;

    Ok(Json(response))
}

/// POST /analyze - Profile content
pub async fn analyze(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ContentRequest>, JsonRejection>,
) -> Result<Json<ContentProfile>, ApiError> {
    let Json(request) = body?;
    let content = request.encoding.decode(&request.content)?;
    tracing::info!(size = content.len(), "POST /analyze");

    let profile = blocking(move || state.engine.analyze(&content)).await?;
    Ok(Json(profile))
}

/// GET /algorithms - List the registry
pub async fn algorithms(State(state): State<Arc<AppState>>) -> Json<AlgorithmsResponse> {
    let algorithms: Vec<AlgorithmSpec> =
        state.engine.registry().list().into_iter().cloned().collect();
    Json(AlgorithmsResponse {
        count: algorithms.len(),
        algorithms,
    })
}

/// GET /accuracy - Tracked prediction accuracy
pub async fn accuracy(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AccuracyQuery>,
) -> Result<Json<AccuracyResponse>, ApiError> {
    let content_type = query
        .content_type
        .as_deref()
        .map(str::parse::<ContentType>)
        .transpose()
        .map_err(ApiError::BadRequest)?;
    let algorithm = query.algorithm.as_deref();

    let tracker = state.engine.tracker();
    let records = tracker
        .snapshot()
        .into_iter()
        .filter(|r| algorithm.is_none_or(|id| r.algorithm_id == id))
        .filter(|r| content_type.is_none_or(|t| r.detected_type == t))
        .collect();

    Ok(Json(AccuracyResponse {
        stats: tracker.stats(algorithm, content_type),
        records,
    }))
}

/// GET /health - Liveness check
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        algorithms: state.engine.registry().len(),
        tracker_records: state.engine.tracker().len(),
    })
}

/// GET /metrics - Prometheus text exposition
pub async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    state.sync_gauges();
    match state.metrics.encode() {
        Ok((content_type, body)) => {
            (StatusCode::OK, [(header::CONTENT_TYPE, content_type)], body).into_response()
        }
        Err(e) => ApiError::Internal(format!("failed to encode metrics: {}", e)).into_response(),
    }
}
