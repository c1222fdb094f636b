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

//! Engine error types

use thiserror::Error;

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur in the analysis / selection / execution pipeline
///
/// Only [`EngineError::UnknownAlgorithm`] and [`EngineError::InvalidParameter`]
/// escape from [`crate::Executor::execute`]; runtime failures are folded into
/// the returned [`crate::CompressionResult`] as its `error` string.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Requested algorithm id is not registered
    #[error("unknown algorithm: {0}")]
    UnknownAlgorithm(String),

    /// Parameter outside the algorithm's declared range
    #[error("invalid parameter for {algorithm}: level {level} outside {min}..={max}")]
    InvalidParameter {
        /// Algorithm the parameter was meant for
        algorithm: String,
        /// Requested level
        level: i32,
        /// Lowest accepted level
        min: i32,
        /// Highest accepted level
        max: i32,
    },

    /// Decompressed output differs from the original input
    #[error("integrity check failed")]
    IntegrityFailure,

    /// Underlying compression library reported an error
    #[error("{algorithm} failed: {message}")]
    AlgorithmRuntimeFailure {
        /// Algorithm that failed
        algorithm: String,
        /// Library error message
        message: String,
    },

    /// Recommendation requested against a registry with no entries
    #[error("algorithm registry is empty")]
    EmptyRegistry,

    /// An algorithm with the same id is already registered
    #[error("algorithm already registered: {0}")]
    DuplicateAlgorithm(String),

    /// Benchmark deadline elapsed before the algorithm finished
    #[error("timed out")]
    Timeout,

    /// I/O error (history persistence)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// History (de)serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EngineError {
    /// Create an unknown algorithm error
    pub fn unknown_algorithm<S: Into<String>>(id: S) -> Self {
        EngineError::UnknownAlgorithm(id.into())
    }

    /// Create a runtime failure for the given algorithm
    pub fn runtime<A: Into<String>, M: ToString>(algorithm: A, message: M) -> Self {
        EngineError::AlgorithmRuntimeFailure {
            algorithm: algorithm.into(),
            message: message.to_string(),
        }
    }

    /// Check if this is an unknown algorithm error
    pub fn is_unknown_algorithm(&self) -> bool {
        matches!(self, EngineError::UnknownAlgorithm(_))
    }

    /// Check if this is an invalid parameter error
    pub fn is_invalid_parameter(&self) -> bool {
        matches!(self, EngineError::InvalidParameter { .. })
    }

    /// Check if this is a runtime failure
    pub fn is_runtime_failure(&self) -> bool {
        matches!(self, EngineError::AlgorithmRuntimeFailure { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_algorithm_error() {
        let err = EngineError::unknown_algorithm("made_up_algo");
        assert!(err.is_unknown_algorithm());
        assert_eq!(err.to_string(), "unknown algorithm: made_up_algo");
    }

    #[test]
    fn test_invalid_parameter_error() {
        let err = EngineError::InvalidParameter {
            algorithm: "gzip".to_string(),
            level: 42,
            min: 0,
            max: 9,
        };
        assert!(err.is_invalid_parameter());
        assert_eq!(
            err.to_string(),
            "invalid parameter for gzip: level 42 outside 0..=9"
        );
    }

    #[test]
    fn test_integrity_failure_message() {
        assert_eq!(
            EngineError::IntegrityFailure.to_string(),
            "integrity check failed"
        );
    }

    #[test]
    fn test_runtime_failure_error() {
        let err = EngineError::runtime("lzma", "out of memory");
        assert!(err.is_runtime_failure());
        assert_eq!(err.to_string(), "lzma failed: out of memory");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::other("disk full");
        let err = EngineError::from(io_err);
        assert!(matches!(err, EngineError::Io(_)));
    }
}
