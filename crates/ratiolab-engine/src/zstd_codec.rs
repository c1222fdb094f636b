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

//! Zstd compression codec
//!
//! Fast compression and decompression with good compression ratios over a
//! wide level range.

use crate::analyzer::ContentType;
use crate::codec::Codec;
use crate::error::{EngineError, EngineResult};
use crate::registry::{AlgorithmSpec, LevelRange, RatioRange, SpeedClass};

/// Zstd codec backed by `zstd`
#[derive(Debug, Clone, Copy, Default)]
pub struct ZstdCodec;

impl ZstdCodec {
    /// Registry id
    pub const ID: &'static str = "zstd";

    /// Catalog entry for zstd
    pub fn spec() -> AlgorithmSpec {
        AlgorithmSpec {
            id: Self::ID.to_string(),
            display_name: "Zstandard".to_string(),
            level_range: LevelRange::new(1, 22),
            default_level: 3,
            speed_class: SpeedClass::Balanced,
            typical_ratio_range: RatioRange::new(1.8, 12.0),
            content_affinities: [
                ContentType::Json,
                ContentType::Binary,
                ContentType::Mixed,
                ContentType::Code,
            ]
            .into_iter()
            .collect(),
        }
    }
}

impl Codec for ZstdCodec {
    fn compress(&self, data: &[u8], level: i32) -> EngineResult<Vec<u8>> {
        zstd::encode_all(data, level).map_err(|e| EngineError::runtime(Self::ID, e))
    }

    fn decompress(&self, data: &[u8]) -> EngineResult<Vec<u8>> {
        zstd::decode_all(data).map_err(|e| EngineError::runtime(Self::ID, e))
    }

    fn magic(&self) -> Option<&'static [u8]> {
        Some(&[0x28, 0xb5, 0x2f, 0xfd])
    }
}
