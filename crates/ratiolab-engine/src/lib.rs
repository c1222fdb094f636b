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

//! Content-adaptive compression for RatioLab
//!
//! This crate analyzes content, recommends a compression algorithm for it,
//! runs and verifies the compression, and benchmarks algorithms side by side:
//! - **Content analysis**: entropy, redundancy, content type, compressibility
//! - **Algorithm registry**: gzip, bzip2, lz4, zstd, lzma and brotli, open to more
//! - **Recommendations**: affinity and trade-off scoring, calibrated by history
//! - **Execution**: timed round trips with byte-for-byte integrity checks
//! - **Benchmarks**: parallel comparisons tolerant of individual failures
//!
//! # Quick Start
//!
//! ```rust
//! use ratiolab_engine::CompressionEngine;
//!
//! fn main() -> Result<(), ratiolab_engine::EngineError> {
//!     let engine = CompressionEngine::new();
//!     let content = b"Hello, World! Hello, World! Hello, World!";
//!
//!     let profile = engine.analyze(content);
//!     let candidates = engine.recommend(&profile)?;
//!     println!("best guess: {}", candidates[0].algorithm_id);
//!
//!     let outcome = engine.compress(content, None, None)?;
//!     assert!(outcome.execution.result.integrity_verified);
//!
//!     let report = engine.compare(content, None)?;
//!     println!("winner: {:?}", report.best().map(|r| &r.algorithm_id));
//!     Ok(())
//! }
//! ```
//!
//! # Algorithms
//!
//! | id | speed | levels | good for |
//! |----|-------|--------|----------|
//! | gzip | balanced | 0-9 | text, json, xml, code |
//! | bzip2 | slow | 1-9 | text, code |
//! | lz4 | fast | 0-12 | binary, mixed |
//! | zstd | balanced | 1-22 | json, binary, mixed, code |
//! | lzma | slow | 0-9 | xml, json, binary |
//! | brotli | slow | 0-11 | text, json, xml, code |

pub mod analyzer;
pub mod benchmark;
pub mod brotli_codec;
pub mod bzip2_codec;
pub mod codec;
pub mod engine;
pub mod error;
pub mod executor;
pub mod gzip_codec;
pub mod lz4_codec;
pub mod lzma_codec;
pub mod metrics;
pub mod recommend;
pub mod registry;
pub mod tracker;
pub mod zstd_codec;

use serde::{Deserialize, Serialize};

pub use analyzer::{analyze, ContentProfile, ContentType, EntropyClass, SizeClass};
pub use benchmark::{BenchmarkReport, Comparator, ComparatorSettings};
pub use brotli_codec::BrotliCodec;
pub use bzip2_codec::Bzip2Codec;
pub use codec::Codec;
pub use engine::{CompressOutcome, CompressionEngine, EngineBuilder};
pub use error::{EngineError, EngineResult};
pub use executor::{CompressionResult, Execution, Executor};
pub use gzip_codec::GzipCodec;
pub use lz4_codec::Lz4Codec;
pub use lzma_codec::LzmaCodec;
pub use recommend::{CompressionCandidate, Prediction, Recommender, RecommenderSettings};
pub use registry::{AlgorithmRegistry, AlgorithmSpec, LevelRange, RatioRange, SpeedClass};
pub use tracker::{AccuracyRecord, AccuracyStats, AccuracyTracker, HistoryLookup};
pub use zstd_codec::ZstdCodec;

/// Parameters for one compression run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompressionParameters {
    /// Compression level, within the algorithm's declared range
    pub level: i32,
}

impl CompressionParameters {
    /// Parameters with the given level
    pub const fn new(level: i32) -> Self {
        CompressionParameters { level }
    }
}
