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

//! Compression executor
//!
//! Runs one algorithm over one input: compress, time, decompress, compare.
//! Contract violations (unknown algorithm, out-of-range level) are returned
//! as errors before any work happens. Everything that goes wrong afterwards,
//! including a panicking codec, ends up in [`CompressionResult::error`].

use crate::codec::Codec;
use crate::error::{EngineError, EngineResult};
use crate::metrics::{self, CompressionTimer};
use crate::registry::AlgorithmRegistry;
use crate::CompressionParameters;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Outcome of one compression run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompressionResult {
    /// Algorithm that ran
    pub algorithm_id: String,
    /// Parameters it ran with
    pub parameters: CompressionParameters,
    /// Input size in bytes
    pub original_size: u64,
    /// Output size in bytes
    pub compressed_size: u64,
    /// `original_size / compressed_size`; `None` when nothing was produced
    pub ratio: Option<f64>,
    /// Compression wall time
    pub duration_ms: f64,
    /// Decompression wall time, when the round trip got that far
    pub decompression_ms: Option<f64>,
    /// Compression throughput in MB/s
    pub throughput_mbps: f64,
    /// Decompressed output matched the input byte for byte
    pub integrity_verified: bool,
    /// Failure description
    pub error: Option<String>,
}

impl CompressionResult {
    /// A failed run that produced no output
    pub fn failed(
        algorithm_id: impl Into<String>,
        parameters: CompressionParameters,
        original_size: u64,
        error: impl Into<String>,
    ) -> Self {
        CompressionResult {
            algorithm_id: algorithm_id.into(),
            parameters,
            original_size,
            compressed_size: 0,
            ratio: None,
            duration_ms: 0.0,
            decompression_ms: None,
            throughput_mbps: 0.0,
            integrity_verified: false,
            error: Some(error.into()),
        }
    }

    /// No error and the round trip verified
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.integrity_verified
    }

    /// Space saved as a percentage of the input
    pub fn space_saved_percent(&self) -> f64 {
        metrics::space_saved_percent(self.original_size, self.compressed_size)
    }
}

/// A run together with the bytes it produced
#[derive(Debug, Clone)]
pub struct Execution {
    /// Run outcome
    pub result: CompressionResult,
    /// Compressed output; empty when compression failed
    pub compressed: Vec<u8>,
}

/// Compression executor
#[derive(Debug, Clone)]
pub struct Executor {
    registry: Arc<AlgorithmRegistry>,
}

impl Executor {
    /// Create an executor over a registry
    pub fn new(registry: Arc<AlgorithmRegistry>) -> Self {
        Executor { registry }
    }

    /// Registry this executor resolves algorithms against
    pub fn registry(&self) -> &Arc<AlgorithmRegistry> {
        &self.registry
    }

    /// Resolve an algorithm and check the parameters against its range
    ///
    /// # Errors
    ///
    /// [`EngineError::UnknownAlgorithm`] or [`EngineError::InvalidParameter`];
    /// levels are never clamped.
    pub fn validate(
        &self,
        algorithm_id: &str,
        parameters: CompressionParameters,
    ) -> EngineResult<Arc<dyn Codec>> {
        let spec = self.registry.get(algorithm_id)?;
        if !spec.level_range.contains(parameters.level) {
            return Err(EngineError::InvalidParameter {
                algorithm: algorithm_id.to_string(),
                level: parameters.level,
                min: spec.level_range.min,
                max: spec.level_range.max,
            });
        }
        self.registry.codec(algorithm_id)
    }

    /// Compress, verify and measure
    ///
    /// # Errors
    ///
    /// Only [`EngineError::UnknownAlgorithm`] and
    /// [`EngineError::InvalidParameter`].
    pub fn execute(
        &self,
        content: &[u8],
        algorithm_id: &str,
        parameters: CompressionParameters,
    ) -> EngineResult<CompressionResult> {
        self.run(content, algorithm_id, parameters)
            .map(|execution| execution.result)
    }

    /// Like [`Executor::execute`], also returning the compressed bytes
    pub fn run(
        &self,
        content: &[u8],
        algorithm_id: &str,
        parameters: CompressionParameters,
    ) -> EngineResult<Execution> {
        let codec = self.validate(algorithm_id, parameters)?;
        let original_size = content.len() as u64;

        let timer = CompressionTimer::start();
        let outcome = guarded(|| codec.compress(content, parameters.level));
        let elapsed = timer.stop();

        let compressed = match outcome {
            Ok(compressed) => compressed,
            Err(message) => {
                tracing::warn!(
                    algorithm = algorithm_id,
                    error = %message,
                    "compression failed"
                );
                let mut result =
                    CompressionResult::failed(algorithm_id, parameters, original_size, message);
                result.duration_ms = metrics::duration_ms(elapsed);
                return Ok(Execution {
                    result,
                    compressed: Vec::new(),
                });
            }
        };

        let compressed_size = compressed.len() as u64;
        let mut result = CompressionResult {
            algorithm_id: algorithm_id.to_string(),
            parameters,
            original_size,
            compressed_size,
            ratio: metrics::compression_ratio(original_size, compressed_size),
            duration_ms: metrics::duration_ms(elapsed),
            decompression_ms: None,
            throughput_mbps: metrics::throughput_mbps(original_size, elapsed),
            integrity_verified: false,
            error: None,
        };

        let timer = CompressionTimer::start();
        let roundtrip = guarded(|| codec.decompress(&compressed));
        result.decompression_ms = Some(metrics::duration_ms(timer.stop()));

        match roundtrip {
            Ok(decompressed) if decompressed == content => result.integrity_verified = true,
            Ok(_) => result.error = Some(EngineError::IntegrityFailure.to_string()),
            Err(message) => result.error = Some(format!("decompression failed: {}", message)),
        }

        if result.ratio.is_none() && result.error.is_none() {
            result.error = Some("compressed output is empty".to_string());
        }

        if let Some(error) = &result.error {
            tracing::warn!(algorithm = algorithm_id, error = %error, "round trip failed");
        } else {
            tracing::debug!(
                "{}",
                metrics::summary(algorithm_id, original_size, compressed_size, elapsed)
            );
        }

        Ok(Execution { result, compressed })
    }

    /// Decompress data previously produced by an algorithm
    ///
    /// # Errors
    ///
    /// [`EngineError::UnknownAlgorithm`], or
    /// [`EngineError::AlgorithmRuntimeFailure`] for corrupt input.
    pub fn decompress(&self, algorithm_id: &str, data: &[u8]) -> EngineResult<Vec<u8>> {
        let codec = self.registry.codec(algorithm_id)?;
        guarded(|| codec.decompress(data))
            .map_err(|message| EngineError::runtime(algorithm_id, message))
    }
}

/// Run a codec call, turning library errors and panics into messages
fn guarded<F>(f: F) -> Result<Vec<u8>, String>
where
    F: FnOnce() -> EngineResult<Vec<u8>>,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(bytes)) => Ok(bytes),
        Ok(Err(e)) => Err(e.to_string()),
        Err(payload) => Err(format!("panicked: {}", panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
