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

//! LZMA codec (xz container)
//!
//! Highest ratios in the catalog at the cost of speed and memory.

use crate::analyzer::ContentType;
use crate::codec::{self, Codec};
use crate::error::{EngineError, EngineResult};
use crate::registry::{AlgorithmSpec, LevelRange, RatioRange, SpeedClass};
use std::io::Read;
use xz2::read::{XzDecoder, XzEncoder};

/// LZMA codec backed by `xz2`
#[derive(Debug, Clone, Copy, Default)]
pub struct LzmaCodec;

impl LzmaCodec {
    /// Registry id
    pub const ID: &'static str = "lzma";

    /// Catalog entry for lzma
    pub fn spec() -> AlgorithmSpec {
        AlgorithmSpec {
            id: Self::ID.to_string(),
            display_name: "LZMA (xz)".to_string(),
            level_range: LevelRange::new(0, 9),
            default_level: 6,
            speed_class: SpeedClass::Slow,
            typical_ratio_range: RatioRange::new(2.0, 20.0),
            content_affinities: [ContentType::Xml, ContentType::Json, ContentType::Binary]
                .into_iter()
                .collect(),
        }
    }
}

impl Codec for LzmaCodec {
    fn compress(&self, data: &[u8], level: i32) -> EngineResult<Vec<u8>> {
        let level = codec::unsigned_level(Self::ID, level)?;
        let mut encoder = XzEncoder::new(data, level);
        let mut compressed = Vec::with_capacity(data.len() / 3 + 64);

        encoder
            .read_to_end(&mut compressed)
            .map_err(|e| EngineError::runtime(Self::ID, e))?;

        Ok(compressed)
    }

    fn decompress(&self, data: &[u8]) -> EngineResult<Vec<u8>> {
        let mut decoder = XzDecoder::new(data);
        let mut decompressed = Vec::with_capacity(data.len() * 3);

        decoder
            .read_to_end(&mut decompressed)
            .map_err(|e| EngineError::runtime(Self::ID, e))?;

        Ok(decompressed)
    }

    fn magic(&self) -> Option<&'static [u8]> {
        Some(&[0xfd, 0x37, 0x7a, 0x58, 0x5a, 0x00])
    }
}
