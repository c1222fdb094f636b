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
#![allow(clippy::unwrap_used)]

//! HTTP API tests driven through `tower::ServiceExt::oneshot`

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use ratiolab_config::Config;
use ratiolab_engine::CompressionEngine;
use ratiolab_server::{create_router, engine_from_config, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

fn app_with(config: &Config) -> Router {
    let engine = CompressionEngine::new();
    let state = Arc::new(AppState::new(engine, config).unwrap());
    create_router(state)
}

fn app() -> Router {
    app_with(&Config::default())
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

fn sample_text() -> String {
    "The quick brown fox jumps over the lazy dog. ".repeat(40)
}

#[tokio::test]
async fn test_health() {
    let (status, body) = send(&app(), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["algorithms"], 6);
}

#[tokio::test]
async fn test_algorithms_listing() {
    let (status, body) = send(&app(), get("/algorithms")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 6);

    let ids: Vec<&str> = body["algorithms"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["brotli", "bzip2", "gzip", "lz4", "lzma", "zstd"]);
}

#[tokio::test]
async fn test_compress_auto() {
    let app = app();
    let text = sample_text();
    let (status, body) = send(
        &app,
        post_json("/compress", json!({ "content": text, "parameters": { "algorithm": "auto" } })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["result"]["integrity_verified"], true);
    assert_eq!(body["result"]["original_size"], text.len());
    assert!(body["result"]["compression_ratio"].as_f64().unwrap() > 1.0);
    assert_eq!(body["content_profile"]["detected_type"], "text");

    // The payload decodes back to the input with the reported algorithm
    let algorithm = body["result"]["algorithm_used"].as_str().unwrap();
    let compressed = STANDARD
        .decode(body["compressed_content"].as_str().unwrap())
        .unwrap();
    let restored = CompressionEngine::new()
        .decompress(algorithm, &compressed)
        .unwrap();
    assert_eq!(restored, text.as_bytes());
}

#[tokio::test]
async fn test_compress_explicit_base64() {
    let data: Vec<u8> = (0..4096u32).map(|i| (i % 7) as u8).collect();
    let (status, body) = send(
        &app(),
        post_json(
            "/compress",
            json!({
                "content": STANDARD.encode(&data),
                "encoding": "base64",
                "parameters": { "algorithm": "zstd", "level": 3 }
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["algorithm_used"], "zstd");
    assert_eq!(body["result"]["level"], 3);
    assert_eq!(body["result"]["original_size"], 4096);
}

#[tokio::test]
async fn test_compress_unknown_algorithm() {
    let (status, body) = send(
        &app(),
        post_json(
            "/compress",
            json!({ "content": "abc", "parameters": { "algorithm": "snappy" } }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("snappy"));
}

#[tokio::test]
async fn test_compress_invalid_level() {
    let (status, _) = send(
        &app(),
        post_json(
            "/compress",
            json!({ "content": "abc", "parameters": { "algorithm": "gzip", "level": 42 } }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_compress_bad_body() {
    let request = Request::builder()
        .method("POST")
        .uri("/compress")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&app(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_compress_bad_base64() {
    let (status, _) = send(
        &app(),
        post_json("/compress", json!({ "content": "%%%", "encoding": "base64" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_body_limit() {
    let mut config = Config::default();
    config.server.max_body_bytes = 1024;
    let app = app_with(&config);

    let (status, _) = send(
        &app,
        post_json("/analyze", json!({ "content": "x".repeat(4096) })),
    )
    .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_compare_subset() {
    let (status, body) = send(
        &app(),
        post_json(
            "/compare",
            json!({ "content": sample_text(), "algorithms": ["gzip", "lz4"] }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["algorithm_id"], "gzip");
    assert_eq!(results[1]["algorithm_id"], "lz4");

    let best = body["best_algorithm"].as_str().unwrap();
    assert!(best == "gzip" || best == "lz4");
    assert_eq!(body["best_result"]["algorithm_id"], best);
    assert!(body["generated_at"].is_string());
}

#[tokio::test]
async fn test_compare_unknown_algorithm() {
    let (status, _) = send(
        &app(),
        post_json("/compare", json!({ "content": "abc", "algorithms": ["gzip", "nope"] })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_recommendations_get_and_post() {
    let app = app();

    let (status, body) = send(&app, get("/recommendations?content=hello%20world")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body["candidates"].as_array().unwrap().is_empty());
    assert_eq!(body["profile"]["size_bytes"], 11);

    let (status, body) = send(
        &app,
        post_json("/recommendations", json!({ "content": r#"{"key": "value", "n": [1, 2, 3]}"# })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["profile"]["detected_type"], "json");

    let confidences: Vec<f64> = body["candidates"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["confidence"].as_f64().unwrap())
        .collect();
    assert!(confidences.windows(2).all(|w| w[0] >= w[1]));
}

#[tokio::test]
async fn test_recommendations_missing_content() {
    let response = app().oneshot(get("/recommendations")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_analyze() {
    let (status, body) = send(
        &app(),
        post_json("/analyze", json!({ "content": "<root><item>1</item></root>" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["detected_type"], "xml");
    let entropy = body["entropy"].as_f64().unwrap();
    assert!((0.0..=8.0).contains(&entropy));
}

#[tokio::test]
async fn test_accuracy_after_compress() {
    let app = app();
    send(
        &app,
        post_json(
            "/compress",
            json!({ "content": sample_text(), "parameters": { "algorithm": "gzip" } }),
        ),
    )
    .await;

    let (status, body) = send(&app, get("/accuracy?algorithm=gzip&content_type=text")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stats"]["count"], 1);
    assert_eq!(body["records"].as_array().unwrap().len(), 1);
    assert_eq!(body["records"][0]["algorithm_id"], "gzip");

    let (_, body) = send(&app, get("/accuracy?algorithm=zstd")).await;
    assert_eq!(body["stats"]["count"], 0);
}

#[tokio::test]
async fn test_accuracy_invalid_content_type() {
    let (status, _) = send(&app(), get("/accuracy?content_type=video")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = app();
    send(&app, get("/health")).await;
    send(
        &app,
        post_json(
            "/compress",
            json!({ "content": sample_text(), "parameters": { "algorithm": "gzip" } }),
        ),
    )
    .await;

    let response = app.clone().oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();

    assert!(text.contains("ratiolab_requests_total{route=\"/health\",status=\"200\"} 1"));
    assert!(text.contains("ratiolab_runs_total{algorithm=\"gzip\",status=\"success\"} 1"));
    assert!(text.contains("ratiolab_tracker_records 1"));
}

#[tokio::test]
async fn test_metrics_disabled() {
    let mut config = Config::default();
    config.observability.metrics_enabled = false;
    let response = app_with(&config).oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[test]
fn test_engine_from_config_applies_settings() {
    let mut config = Config::default();
    config.engine.max_candidates = Some(2);
    config.benchmark.max_workers = 3;
    config.benchmark.timeout_ms = Some(5_000);

    let engine = engine_from_config(&config).unwrap();
    assert_eq!(engine.registry().len(), 6);
    assert_eq!(engine.recommender().settings().max_candidates, Some(2));
    assert_eq!(engine.comparator().settings().max_workers, 3);
    assert_eq!(
        engine.comparator().settings().timeout,
        Some(std::time::Duration::from_millis(5_000))
    );

    let profile = engine.analyze(sample_text().as_bytes());
    assert!(engine.recommend(&profile).unwrap().len() <= 2);
}

#[test]
fn test_engine_from_config_loads_history() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("history.jsonl");

    let engine = CompressionEngine::new();
    engine.compress(sample_text().as_bytes(), Some("gzip"), None).unwrap();
    engine.compress(sample_text().as_bytes(), Some("zstd"), None).unwrap();
    engine.tracker().save_to(&path).unwrap();

    let mut config = Config::default();
    config.tracker.history_path = Some(path.to_string_lossy().into_owned());
    let restored = engine_from_config(&config).unwrap();
    assert_eq!(restored.tracker().len(), 2);
}

#[test]
fn test_engine_from_config_missing_history_starts_empty() {
    let dir = TempDir::new().unwrap();
    let mut config = Config::default();
    config.tracker.history_path = Some(
        dir.path()
            .join("not-yet.jsonl")
            .to_string_lossy()
            .into_owned(),
    );
    let engine = engine_from_config(&config).unwrap();
    assert!(engine.tracker().is_empty());
}
