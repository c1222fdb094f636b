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

//! Property-based tests for the engine
//!
//! - Entropy and score bounds for arbitrary bytes
//! - Analysis is a pure function of its input
//! - Round trips verify for every built-in algorithm
//! - Reported ratio always matches reported sizes
//! - Recommendations are never empty and always resolve

use proptest::prelude::*;
use ratiolab_engine::{
    analyze, AlgorithmRegistry, CompressionEngine, CompressionParameters, Executor,
};
use std::sync::Arc;

fn arb_binary_data() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..4096)
}

fn arb_text_data() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(prop::char::range('a', 'z').prop_map(|c| c as u8), 0..4096)
}

fn arb_algorithm() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["gzip", "bzip2", "lz4", "zstd", "lzma", "brotli"])
}

#[test]
fn proptest_profile_bounds() {
    proptest!(|(data in arb_binary_data())| {
        let profile = analyze(&data);
        prop_assert!((0.0..=8.0).contains(&profile.entropy));
        prop_assert!((0.0..=1.0).contains(&profile.redundancy));
        prop_assert!((0.0..=1.0).contains(&profile.compressibility_score));
        prop_assert_eq!(profile.size_bytes, data.len() as u64);
    });
}

#[test]
fn proptest_analysis_is_deterministic() {
    proptest!(|(data in arb_binary_data())| {
        prop_assert_eq!(analyze(&data), analyze(&data));
    });
}

#[test]
fn proptest_roundtrip_verifies() {
    let registry = Arc::new(AlgorithmRegistry::with_builtins());
    let executor = Executor::new(Arc::clone(&registry));

    proptest!(ProptestConfig::with_cases(64), |(data in arb_binary_data(), id in arb_algorithm())| {
        let level = registry.get(id).unwrap().default_level;
        let execution = executor.run(&data, id, CompressionParameters::new(level)).unwrap();

        prop_assert!(execution.result.integrity_verified);
        prop_assert!(execution.result.error.is_none());
        prop_assert_eq!(executor.decompress(id, &execution.compressed).unwrap(), data);
    });
}

#[test]
fn proptest_roundtrip_random_levels() {
    let registry = Arc::new(AlgorithmRegistry::with_builtins());
    let executor = Executor::new(Arc::clone(&registry));

    proptest!(ProptestConfig::with_cases(64), |(data in arb_text_data(), id in arb_algorithm(), pick in 0.0f64..1.0)| {
        let range = registry.get(id).unwrap().level_range;
        // lzma presets above 6 allocate hundreds of MB
        let max = if id == "lzma" { 6 } else { range.max };
        let level = range.min + ((f64::from(max - range.min)) * pick).round() as i32;

        let result = executor.execute(&data, id, CompressionParameters::new(level)).unwrap();
        prop_assert!(result.is_success(), "{} level {}: {:?}", id, level, result.error);
    });
}

#[test]
fn proptest_ratio_matches_sizes() {
    let executor = Executor::new(Arc::new(AlgorithmRegistry::with_builtins()));

    proptest!(ProptestConfig::with_cases(64), |(data in arb_binary_data(), id in arb_algorithm())| {
        let level = executor.registry().get(id).unwrap().default_level;
        let result = executor.execute(&data, id, CompressionParameters::new(level)).unwrap();

        prop_assert!(result.compressed_size > 0);
        let expected = result.original_size as f64 / result.compressed_size as f64;
        prop_assert!((result.ratio.unwrap() - expected).abs() < 1e-12);
    });
}

#[test]
fn proptest_recommendations_non_empty() {
    let engine = CompressionEngine::new();

    proptest!(|(data in arb_binary_data())| {
        let candidates = engine.recommend(&engine.analyze(&data)).unwrap();
        prop_assert!(!candidates.is_empty());
        for candidate in &candidates {
            prop_assert!(engine.registry().contains(&candidate.algorithm_id));
            prop_assert!((0.0..=1.0).contains(&candidate.confidence));
        }
    });
}
