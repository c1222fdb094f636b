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

//! Brotli compression codec
//!
//! High compression ratios with slower compression speed. The raw brotli
//! stream has no magic number, so this codec never claims detected input.

use crate::analyzer::ContentType;
use crate::codec::{self, Codec};
use crate::error::{EngineError, EngineResult};
use crate::registry::{AlgorithmSpec, LevelRange, RatioRange, SpeedClass};
use std::io::Write;

/// Encoder buffer size
const BUFFER_SIZE: usize = 4096;

/// Window size (larger = better compression but more memory)
const LG_WINDOW: u32 = 22;

/// Brotli codec backed by `brotli`
#[derive(Debug, Clone, Copy, Default)]
pub struct BrotliCodec;

impl BrotliCodec {
    /// Registry id
    pub const ID: &'static str = "brotli";

    /// Catalog entry for brotli
    pub fn spec() -> AlgorithmSpec {
        AlgorithmSpec {
            id: Self::ID.to_string(),
            display_name: "Brotli".to_string(),
            level_range: LevelRange::new(0, 11),
            default_level: 9,
            speed_class: SpeedClass::Slow,
            typical_ratio_range: RatioRange::new(2.0, 14.0),
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

impl Codec for BrotliCodec {
    fn compress(&self, data: &[u8], level: i32) -> EngineResult<Vec<u8>> {
        let quality = codec::unsigned_level(Self::ID, level)?;
        let mut output = Vec::with_capacity(data.len() / 2 + 16);

        {
            let mut compressor =
                brotli::CompressorWriter::new(&mut output, BUFFER_SIZE, quality, LG_WINDOW);
            compressor
                .write_all(data)
                .map_err(|e| EngineError::runtime(Self::ID, e))?;
            compressor
                .flush()
                .map_err(|e| EngineError::runtime(Self::ID, e))?;
        } // dropping the writer emits the final block

        Ok(output)
    }

    fn decompress(&self, data: &[u8]) -> EngineResult<Vec<u8>> {
        let mut output = Vec::with_capacity(data.len() * 2);
        brotli::BrotliDecompress(&mut std::io::Cursor::new(data), &mut output)
            .map_err(|e| EngineError::runtime(Self::ID, e))?;
        Ok(output)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_brotli_roundtrip_all_levels() {
        let original = b"Hello, World! This is a test of brotli compression. ".repeat(10);
        for level in 0..=11 {
            let compressed = BrotliCodec.compress(&original, level).unwrap();
            assert_eq!(BrotliCodec.decompress(&compressed).unwrap(), original);
        }
    }

    #[test]
    fn test_brotli_empty() {
        let compressed = BrotliCodec.compress(b"", 9).unwrap();
        assert!(!compressed.is_empty());
        assert!(BrotliCodec.decompress(&compressed).unwrap().is_empty());
    }

    #[test]
    fn test_brotli_no_magic() {
        assert!(BrotliCodec.magic().is_none());
    }
}
