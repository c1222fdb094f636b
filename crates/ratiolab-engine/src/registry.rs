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

//! Algorithm registry
//!
//! The registry is a catalog of [`AlgorithmSpec`] entries, each paired with
//! the [`Codec`] that implements it. [`AlgorithmRegistry::with_builtins`]
//! populates gzip, bzip2, lz4, zstd, lzma and brotli; further real algorithms
//! can be added with [`AlgorithmRegistry::register`] without touching the rest
//! of the engine.

use crate::analyzer::ContentType;
use crate::codec::Codec;
use crate::error::{EngineError, EngineResult};
use crate::{BrotliCodec, Bzip2Codec, GzipCodec, Lz4Codec, LzmaCodec, ZstdCodec};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

/// Inclusive range of accepted compression levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelRange {
    /// Lowest accepted level
    pub min: i32,
    /// Highest accepted level
    pub max: i32,
}

impl LevelRange {
    /// Create a level range
    pub const fn new(min: i32, max: i32) -> Self {
        LevelRange { min, max }
    }

    /// Check whether a level lies inside the range
    pub fn contains(&self, level: i32) -> bool {
        (self.min..=self.max).contains(&level)
    }

    /// Relative position of a level inside the range (0.0 at min, 1.0 at max)
    pub fn position(&self, level: i32) -> f64 {
        if self.max <= self.min {
            return 0.0;
        }
        let clamped = level.clamp(self.min, self.max);
        f64::from(clamped - self.min) / f64::from(self.max - self.min)
    }
}

/// Typical compression ratio band (original / compressed)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatioRange {
    /// Ratio on poorly compressible input
    pub min: f64,
    /// Ratio on highly compressible input
    pub max: f64,
}

impl RatioRange {
    /// Create a ratio range
    pub const fn new(min: f64, max: f64) -> Self {
        RatioRange { min, max }
    }
}

/// Coarse speed classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeedClass {
    /// Hundreds of MB/s
    Fast,
    /// Around a hundred MB/s
    Balanced,
    /// Tens of MB/s or less
    Slow,
}

impl SpeedClass {
    /// Nominal compression throughput used for time predictions
    pub fn nominal_throughput_mbps(self) -> f64 {
        match self {
            SpeedClass::Fast => 400.0,
            SpeedClass::Balanced => 120.0,
            SpeedClass::Slow => 25.0,
        }
    }

    /// Merit of this speed class when a request favours speed
    pub fn speed_merit(self) -> f64 {
        match self {
            SpeedClass::Fast => 1.0,
            SpeedClass::Balanced => 0.6,
            SpeedClass::Slow => 0.25,
        }
    }
}

impl fmt::Display for SpeedClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SpeedClass::Fast => "fast",
            SpeedClass::Balanced => "balanced",
            SpeedClass::Slow => "slow",
        };
        f.write_str(name)
    }
}

/// Declarative description of one compression algorithm
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmSpec {
    /// Unique identifier, e.g. `"gzip"`
    pub id: String,
    /// Human-readable name
    pub display_name: String,
    /// Accepted compression levels
    pub level_range: LevelRange,
    /// Level used when the caller does not choose one
    pub default_level: i32,
    /// Speed classification
    pub speed_class: SpeedClass,
    /// Typical ratio band
    pub typical_ratio_range: RatioRange,
    /// Content types this algorithm is known to handle well
    pub content_affinities: BTreeSet<ContentType>,
}

impl AlgorithmSpec {
    /// Check whether the algorithm has an affinity for a content type
    pub fn has_affinity(&self, content_type: ContentType) -> bool {
        self.content_affinities.contains(&content_type)
    }
}

#[derive(Debug, Clone)]
struct RegistryEntry {
    spec: AlgorithmSpec,
    codec: Arc<dyn Codec>,
}

/// Catalog of available algorithms
///
/// Populated once at startup and read-only afterwards; share it behind an
/// `Arc` between the recommender, executor and comparator.
#[derive(Debug, Clone, Default)]
pub struct AlgorithmRegistry {
    entries: BTreeMap<String, RegistryEntry>,
}

impl AlgorithmRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with every built-in algorithm
    pub fn with_builtins() -> Self {
        let builtins: [(AlgorithmSpec, Arc<dyn Codec>); 6] = [
            (GzipCodec::spec(), Arc::new(GzipCodec)),
            (Bzip2Codec::spec(), Arc::new(Bzip2Codec)),
            (Lz4Codec::spec(), Arc::new(Lz4Codec)),
            (ZstdCodec::spec(), Arc::new(ZstdCodec)),
            (LzmaCodec::spec(), Arc::new(LzmaCodec)),
            (BrotliCodec::spec(), Arc::new(BrotliCodec)),
        ];

        let mut registry = Self::new();
        for (spec, codec) in builtins {
            registry.entries.insert(spec.id.clone(), RegistryEntry { spec, codec });
        }
        registry
    }

    /// Register an additional algorithm
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::DuplicateAlgorithm`] if the id is taken and
    /// [`EngineError::InvalidParameter`] if the default level lies outside
    /// the declared range.
    pub fn register(&mut self, spec: AlgorithmSpec, codec: Arc<dyn Codec>) -> EngineResult<()> {
        if self.entries.contains_key(&spec.id) {
            return Err(EngineError::DuplicateAlgorithm(spec.id));
        }
        if !spec.level_range.contains(spec.default_level) {
            return Err(EngineError::InvalidParameter {
                algorithm: spec.id,
                level: spec.default_level,
                min: spec.level_range.min,
                max: spec.level_range.max,
            });
        }

        tracing::debug!(algorithm = %spec.id, "registered algorithm");
        self.entries.insert(spec.id.clone(), RegistryEntry { spec, codec });
        Ok(())
    }

    /// List every registered algorithm, ordered by id
    pub fn list(&self) -> Vec<&AlgorithmSpec> {
        self.entries.values().map(|entry| &entry.spec).collect()
    }

    /// Registered ids, ordered
    pub fn ids(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Look up an algorithm by id
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownAlgorithm`]; no default is substituted.
    pub fn get(&self, id: &str) -> EngineResult<&AlgorithmSpec> {
        self.entries
            .get(id)
            .map(|entry| &entry.spec)
            .ok_or_else(|| EngineError::unknown_algorithm(id))
    }

    /// Look up the codec implementing an algorithm
    pub fn codec(&self, id: &str) -> EngineResult<Arc<dyn Codec>> {
        self.entries
            .get(id)
            .map(|entry| Arc::clone(&entry.codec))
            .ok_or_else(|| EngineError::unknown_algorithm(id))
    }

    /// Check whether an id is registered
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Number of registered algorithms
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether the registry has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Identify which registered algorithm produced `data` from its magic bytes
    pub fn detect(&self, data: &[u8]) -> Option<&AlgorithmSpec> {
        self.entries
            .values()
            .find(|entry| {
                entry
                    .codec
                    .magic()
                    .is_some_and(|magic| data.starts_with(magic))
            })
            .map(|entry| &entry.spec)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_present() {
        let registry = AlgorithmRegistry::with_builtins();
        for id in ["gzip", "bzip2", "lz4", "zstd", "lzma", "brotli"] {
            assert!(registry.contains(id), "missing {}", id);
        }
        assert_eq!(registry.len(), 6);
    }

    #[test]
    fn test_list_sorted_by_id() {
        let registry = AlgorithmRegistry::with_builtins();
        let ids: Vec<&str> = registry.list().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["brotli", "bzip2", "gzip", "lz4", "lzma", "zstd"]);
    }

    #[test]
    fn test_default_levels_within_range() {
        let registry = AlgorithmRegistry::with_builtins();
        for spec in registry.list() {
            assert!(spec.level_range.contains(spec.default_level), "{}", spec.id);
            assert!(spec.typical_ratio_range.min <= spec.typical_ratio_range.max);
        }
    }

    #[test]
    fn test_unknown_algorithm() {
        let registry = AlgorithmRegistry::with_builtins();
        let err = registry.get("made_up_algo").unwrap_err();
        assert!(err.is_unknown_algorithm());
        assert!(registry.codec("made_up_algo").is_err());
    }

    #[test]
    fn test_register_duplicate_rejected() {
        let mut registry = AlgorithmRegistry::with_builtins();
        let err = registry
            .register(GzipCodec::spec(), Arc::new(GzipCodec))
            .unwrap_err();
        assert!(matches!(err, EngineError::DuplicateAlgorithm(id) if id == "gzip"));
    }

    #[test]
    fn test_register_bad_default_level_rejected() {
        let mut registry = AlgorithmRegistry::new();
        let mut spec = GzipCodec::spec();
        spec.id = "gzip-max".to_string();
        spec.default_level = 11;
        assert!(registry
            .register(spec, Arc::new(GzipCodec))
            .unwrap_err()
            .is_invalid_parameter());
    }

    #[test]
    fn test_register_extra_algorithm() {
        let mut registry = AlgorithmRegistry::new();
        assert!(registry.is_empty());
        let mut spec = ZstdCodec::spec();
        spec.id = "zstd-fast".to_string();
        spec.default_level = 1;
        registry.register(spec, Arc::new(ZstdCodec)).unwrap();
        assert_eq!(registry.get("zstd-fast").unwrap().default_level, 1);
    }

    #[test]
    fn test_level_range_position() {
        let range = LevelRange::new(1, 9);
        assert_eq!(range.position(1), 0.0);
        assert_eq!(range.position(9), 1.0);
        assert_eq!(range.position(5), 0.5);
        assert_eq!(LevelRange::new(3, 3).position(3), 0.0);
        assert!(!range.contains(0));
        assert!(range.contains(9));
    }

    #[test]
    fn test_detect_by_magic() {
        let registry = AlgorithmRegistry::with_builtins();
        let gz = GzipCodec.compress(b"detect me", 6).unwrap();
        assert_eq!(registry.detect(&gz).map(|s| s.id.as_str()), Some("gzip"));

        let zst = ZstdCodec.compress(b"detect me", 3).unwrap();
        assert_eq!(registry.detect(&zst).map(|s| s.id.as_str()), Some("zstd"));

        assert!(registry.detect(b"plain text").is_none());
    }

    #[test]
    fn test_speed_class_ordering() {
        assert!(
            SpeedClass::Fast.nominal_throughput_mbps()
                > SpeedClass::Balanced.nominal_throughput_mbps()
        );
        assert!(SpeedClass::Balanced.speed_merit() > SpeedClass::Slow.speed_merit());
        assert_eq!(SpeedClass::Slow.to_string(), "slow");
    }
}
