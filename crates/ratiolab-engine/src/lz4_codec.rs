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

//! LZ4 frame codec
//!
//! Very fast with modest ratios. Level 0 selects the default fast mode,
//! higher levels switch the encoder to high-compression mode.

use crate::analyzer::ContentType;
use crate::codec::{self, Codec};
use crate::error::{EngineError, EngineResult};
use crate::registry::{AlgorithmSpec, LevelRange, RatioRange, SpeedClass};
use std::io::{Read, Write};

/// LZ4 codec backed by `lz4` (frame format)
#[derive(Debug, Clone, Copy, Default)]
pub struct Lz4Codec;

impl Lz4Codec {
    /// Registry id
    pub const ID: &'static str = "lz4";

    /// Catalog entry for lz4
    pub fn spec() -> AlgorithmSpec {
        AlgorithmSpec {
            id: Self::ID.to_string(),
            display_name: "LZ4".to_string(),
            level_range: LevelRange::new(0, 12),
            default_level: 1,
            speed_class: SpeedClass::Fast,
            typical_ratio_range: RatioRange::new(1.2, 5.0),
            content_affinities: [ContentType::Binary, ContentType::Mixed]
                .into_iter()
                .collect(),
        }
    }
}

impl Codec for Lz4Codec {
    fn compress(&self, data: &[u8], level: i32) -> EngineResult<Vec<u8>> {
        let level = codec::unsigned_level(Self::ID, level)?;
        let mut encoder = lz4::EncoderBuilder::new()
            .level(level)
            .build(Vec::with_capacity(data.len() / 2 + 32))
            .map_err(|e| EngineError::runtime(Self::ID, e))?;

        encoder
            .write_all(data)
            .map_err(|e| EngineError::runtime(Self::ID, e))?;

        let (compressed, result) = encoder.finish();
        result.map_err(|e| EngineError::runtime(Self::ID, e))?;
        Ok(compressed)
    }

    fn decompress(&self, data: &[u8]) -> EngineResult<Vec<u8>> {
        let mut decoder =
            lz4::Decoder::new(data).map_err(|e| EngineError::runtime(Self::ID, e))?;
        let mut decompressed = Vec::with_capacity(data.len() * 2);

        decoder
            .read_to_end(&mut decompressed)
            .map_err(|e| EngineError::runtime(Self::ID, e))?;

        Ok(decompressed)
    }

    fn magic(&self) -> Option<&'static [u8]> {
        Some(&[0x04, 0x22, 0x4d, 0x18])
    }
}
