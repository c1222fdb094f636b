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

//! Codec abstraction
//!
//! A [`Codec`] performs the raw byte transformation for one registered
//! algorithm. Parameter validation happens in the executor against the
//! algorithm's declared [`crate::LevelRange`]; codecs only translate the level
//! into whatever their library expects.

use crate::error::{EngineError, EngineResult};
use std::fmt::Debug;

/// Codec trait for pluggable compression implementations
///
/// Implementations must be lossless: `decompress(compress(x, level)) == x` for
/// every level inside the algorithm's declared range.
pub trait Codec: Send + Sync + Debug {
    /// Compress data at the given level
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::AlgorithmRuntimeFailure`] if the library fails
    fn compress(&self, data: &[u8], level: i32) -> EngineResult<Vec<u8>>;

    /// Decompress data produced by [`Codec::compress`]
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::AlgorithmRuntimeFailure`] on corrupt input
    fn decompress(&self, data: &[u8]) -> EngineResult<Vec<u8>>;

    /// Leading bytes that identify this codec's output, if the format has any
    fn magic(&self) -> Option<&'static [u8]> {
        None
    }
}

/// Convert a validated level into the unsigned form most libraries take
pub(crate) fn unsigned_level(algorithm: &str, level: i32) -> EngineResult<u32> {
    u32::try_from(level).map_err(|_| EngineError::InvalidParameter {
        algorithm: algorithm.to_string(),
        level,
        min: 0,
        max: i32::MAX,
    })
}
