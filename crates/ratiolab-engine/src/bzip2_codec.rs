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

//! Bzip2 codec
//!
//! Burrows-Wheeler block sorting. Slow, but strong on text and source code.

use crate::analyzer::ContentType;
use crate::codec::{self, Codec};
use crate::error::{EngineError, EngineResult};
use crate::registry::{AlgorithmSpec, LevelRange, RatioRange, SpeedClass};
use bzip2::read::{BzDecoder, BzEncoder};
use bzip2::Compression;
use std::io::Read;

/// Bzip2 codec backed by `bzip2`
#[derive(Debug, Clone, Copy, Default)]
pub struct Bzip2Codec;

impl Bzip2Codec {
    /// Registry id
    pub const ID: &'static str = "bzip2";

    /// Catalog entry for bzip2
    ///
    /// Levels map to the block size (level × 100 KB).
    pub fn spec() -> AlgorithmSpec {
        AlgorithmSpec {
            id: Self::ID.to_string(),
            display_name: "Bzip2".to_string(),
            level_range: LevelRange::new(1, 9),
            default_level: 9,
            speed_class: SpeedClass::Slow,
            typical_ratio_range: RatioRange::new(2.0, 15.0),
            content_affinities: [ContentType::Text, ContentType::Code]
                .into_iter()
                .collect(),
        }
    }
}

impl Codec for Bzip2Codec {
    fn compress(&self, data: &[u8], level: i32) -> EngineResult<Vec<u8>> {
        let level = codec::unsigned_level(Self::ID, level)?;
        let mut encoder = BzEncoder::new(data, Compression::new(level));
        let mut compressed = Vec::with_capacity(data.len() / 2 + 64);

        encoder
            .read_to_end(&mut compressed)
            .map_err(|e| EngineError::runtime(Self::ID, e))?;

        Ok(compressed)
    }

    fn decompress(&self, data: &[u8]) -> EngineResult<Vec<u8>> {
        let mut decoder = BzDecoder::new(data);
        let mut decompressed = Vec::with_capacity(data.len() * 2);

        decoder
            .read_to_end(&mut decompressed)
            .map_err(|e| EngineError::runtime(Self::ID, e))?;

        Ok(decompressed)
    }

    fn magic(&self) -> Option<&'static [u8]> {
        Some(b"BZh")
    }
}
