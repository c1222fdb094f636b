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

//! Gzip (deflate) codec
//!
//! Balanced speed and ratio, strong on text-like content.

use crate::analyzer::ContentType;
use crate::codec::{self, Codec};
use crate::error::{EngineError, EngineResult};
use crate::registry::{AlgorithmSpec, LevelRange, RatioRange, SpeedClass};
use flate2::read::{GzDecoder, GzEncoder};
use flate2::Compression;
use std::io::Read;

/// Gzip codec backed by `flate2`
#[derive(Debug, Clone, Copy, Default)]
pub struct GzipCodec;

impl GzipCodec {
    /// Registry id
    pub const ID: &'static str = "gzip";

    /// Catalog entry for gzip
    pub fn spec() -> AlgorithmSpec {
        AlgorithmSpec {
            id: Self::ID.to_string(),
            display_name: "Gzip".to_string(),
            level_range: LevelRange::new(0, 9),
            default_level: 6,
            speed_class: SpeedClass::Balanced,
            typical_ratio_range: RatioRange::new(1.5, 10.0),
            content_affinities: [
                ContentType::Text,
                ContentType::Json,
                ContentType::Xml,
                ContentType::Code,
            ]
            .into_iter()
            .collect(),
        }
    }
}

impl Codec for GzipCodec {
    fn compress(&self, data: &[u8], level: i32) -> EngineResult<Vec<u8>> {
        let level = codec::unsigned_level(Self::ID, level)?;
        let mut encoder = GzEncoder::new(data, Compression::new(level));
        let mut compressed = Vec::with_capacity(data.len() / 2 + 32);

        encoder
            .read_to_end(&mut compressed)
            .map_err(|e| EngineError::runtime(Self::ID, e))?;

        Ok(compressed)
    }

    fn decompress(&self, data: &[u8]) -> EngineResult<Vec<u8>> {
        let mut decoder = GzDecoder::new(data);
        let mut decompressed = Vec::with_capacity(data.len() * 2);

        decoder
            .read_to_end(&mut decompressed)
            .map_err(|e| EngineError::runtime(Self::ID, e))?;

        Ok(decompressed)
    }

    fn magic(&self) -> Option<&'static [u8]> {
        Some(&[0x1f, 0x8b])
    }
}
