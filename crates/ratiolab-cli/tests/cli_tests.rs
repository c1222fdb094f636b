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

//! CLI integration tests
//!
//! Each test runs the binary inside its own temporary directory so a stray
//! `ratiolab.toml` in the working tree cannot leak in.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use tempfile::TempDir;

fn ratiolab(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("ratiolab").unwrap();
    cmd.current_dir(dir.path()).arg("--color").arg("never");
    cmd
}

fn write_sample(dir: &TempDir, name: &str) -> String {
    let text = "The quick brown fox jumps over the lazy dog. ".repeat(200);
    fs::write(dir.path().join(name), text).unwrap();
    name.to_string()
}

fn json_output(cmd: &mut Command) -> Value {
    let output = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).unwrap()
}

#[test]
fn test_cli_help() {
    let dir = TempDir::new().unwrap();
    ratiolab(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("compress"))
        .stdout(predicate::str::contains("compare"));
}

#[test]
fn test_version() {
    let dir = TempDir::new().unwrap();
    ratiolab(&dir)
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("ratiolab "));
}

#[test]
fn test_completions() {
    let dir = TempDir::new().unwrap();
    ratiolab(&dir)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ratiolab"));
}

#[test]
fn test_algorithms_json() {
    let dir = TempDir::new().unwrap();
    let value = json_output(ratiolab(&dir).args(["algorithms", "--json"]));
    let ids: Vec<&str> = value
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["brotli", "bzip2", "gzip", "lz4", "lzma", "zstd"]);
}

#[test]
fn test_analyze_text() {
    let dir = TempDir::new().unwrap();
    let file = write_sample(&dir, "sample.txt");
    let value = json_output(ratiolab(&dir).args(["analyze", &file, "--json"]));
    assert_eq!(value["detected_type"], "text");
    assert_eq!(value["size_bytes"], 45 * 200);

    ratiolab(&dir)
        .args(["analyze", &file])
        .assert()
        .success()
        .stdout(predicate::str::contains("Entropy"));
}

#[test]
fn test_analyze_missing_file() {
    let dir = TempDir::new().unwrap();
    ratiolab(&dir)
        .args(["analyze", "does-not-exist.bin"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read"));
}

#[test]
fn test_recommend_limit() {
    let dir = TempDir::new().unwrap();
    let file = write_sample(&dir, "sample.txt");
    let value = json_output(ratiolab(&dir).args(["recommend", &file, "-n", "2", "--json"]));
    let candidates = value["candidates"].as_array().unwrap();
    assert_eq!(candidates.len(), 2);
    assert!(candidates[0]["confidence"].as_f64() >= candidates[1]["confidence"].as_f64());
}

#[test]
fn test_compress_decompress_roundtrip() {
    let dir = TempDir::new().unwrap();
    let file = write_sample(&dir, "sample.txt");
    let original = fs::read(dir.path().join(&file)).unwrap();

    let value =
        json_output(ratiolab(&dir).args(["compress", &file, "-a", "zstd", "-l", "9", "--json"]));
    assert_eq!(value["result"]["algorithm_id"], "zstd");
    assert_eq!(value["result"]["parameters"]["level"], 9);
    assert_eq!(value["result"]["integrity_verified"], true);
    assert!(dir.path().join("sample.txt.zst").exists());

    // Algorithm detected from the zstd frame magic
    ratiolab(&dir)
        .args(["decompress", "sample.txt.zst", "-o", "restored.txt"])
        .assert()
        .success();
    assert_eq!(fs::read(dir.path().join("restored.txt")).unwrap(), original);
}

#[test]
fn test_decompress_without_magic_needs_algorithm() {
    let dir = TempDir::new().unwrap();
    let file = write_sample(&dir, "sample.txt");

    ratiolab(&dir)
        .args(["compress", &file, "-a", "brotli", "-o", "packed"])
        .assert()
        .success();

    // Brotli has no magic bytes and "packed" has no extension
    ratiolab(&dir)
        .args(["decompress", "packed"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--algorithm"));

    ratiolab(&dir)
        .args(["decompress", "packed", "-a", "brotli", "-o", "restored.txt"])
        .assert()
        .success();
    assert_eq!(
        fs::read(dir.path().join("restored.txt")).unwrap(),
        fs::read(dir.path().join(&file)).unwrap()
    );
}

#[test]
fn test_compress_unknown_algorithm() {
    let dir = TempDir::new().unwrap();
    let file = write_sample(&dir, "sample.txt");
    ratiolab(&dir)
        .args(["compress", &file, "-a", "snappy"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown algorithm: snappy"));
}

#[test]
fn test_compress_invalid_level() {
    let dir = TempDir::new().unwrap();
    let file = write_sample(&dir, "sample.txt");
    ratiolab(&dir)
        .args(["compress", &file, "-a", "gzip", "-l", "42"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid parameter"));
    assert!(!dir.path().join("sample.txt.gz").exists());
}

#[test]
fn test_compare_subset_json() {
    let dir = TempDir::new().unwrap();
    let file = write_sample(&dir, "sample.txt");
    let value = json_output(ratiolab(&dir).args([
        "compare", &file, "-a", "gzip", "-a", "lz4", "-a", "bzip2", "--json",
    ]));

    let results = value["results"].as_array().unwrap();
    let ids: Vec<&str> = results
        .iter()
        .map(|r| r["algorithm_id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["gzip", "lz4", "bzip2"]);
    assert!(value["best_result"].is_u64());
}

#[test]
fn test_compare_table() {
    let dir = TempDir::new().unwrap();
    let file = write_sample(&dir, "sample.txt");
    ratiolab(&dir)
        .args(["compare", &file])
        .assert()
        .success()
        .stdout(predicate::str::contains("Best verified ratio"))
        .stdout(predicate::str::contains("lzma"));
}

#[test]
fn test_history_persists_between_runs() {
    let dir = TempDir::new().unwrap();
    let file = write_sample(&dir, "sample.txt");
    let history = dir.path().join("state").join("history.jsonl");
    fs::write(
        dir.path().join("ratiolab.toml"),
        format!(
            "[tracker]\nhistory_path = {:?}\n",
            history.to_string_lossy()
        ),
    )
    .unwrap();

    ratiolab(&dir).args(["compress", &file, "-a", "gzip"]).assert().success();
    ratiolab(&dir).args(["compress", &file, "-a", "zstd", "-o", "b.zst"]).assert().success();

    let lines = fs::read_to_string(&history).unwrap();
    assert_eq!(lines.lines().count(), 2);
}

#[test]
fn test_explicit_config_file() {
    let dir = TempDir::new().unwrap();
    let file = write_sample(&dir, "sample.txt");
    let config = dir.path().join("custom.yaml");
    fs::write(&config, "engine:\n  max_candidates: 1\n").unwrap();

    let value = json_output(ratiolab(&dir).args([
        "--config",
        config.to_str().unwrap(),
        "recommend",
        &file,
        "--json",
    ]));
    assert_eq!(value["candidates"].as_array().unwrap().len(), 1);
}

#[test]
fn test_invalid_config_file() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("broken.toml");
    fs::write(&config, "[engine]\nmin_confidence = 7.5\n").unwrap();

    ratiolab(&dir)
        .args(["--config", config.to_str().unwrap(), "algorithms"])
        .assert()
        .code(2);
}
