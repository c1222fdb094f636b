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

//! Statistical content analysis
//!
//! Produces a [`ContentProfile`] from raw bytes by measuring:
//! - Shannon entropy of the byte histogram (0.0 to 8.0 bits/byte)
//! - Redundancy as the share of repeated 4-byte windows
//! - Content type by sniffing (JSON parse, XML tag density, printable ratio,
//!   keyword and punctuation density for source code)
//! - A compressibility score derived from entropy and redundancy
//!
//! Analysis is a pure function of the input: identical bytes always produce an
//! identical profile.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Bytes inspected for printable-ratio, XML and code sniffing
pub const TYPE_SAMPLE_SIZE: usize = 8 * 1024;

/// Bytes inspected for the repeated-window redundancy estimate
pub const REDUNDANCY_SAMPLE_SIZE: usize = 256 * 1024;

const WINDOW: usize = 4;

const CODE_KEYWORDS: &[&str] = &[
    "fn ", "let ", "const ", "var ", "def ", "class ", "import ", "return", "function",
    "#include", "public ", "private ", "struct ", "impl ", "=>", "if (", "for (", "while (",
];

/// Detected content type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    /// Human-readable text
    Text,
    /// A JSON object or array
    Json,
    /// XML / HTML markup
    Xml,
    /// Program source code
    Code,
    /// Non-textual bytes
    Binary,
    /// Conflicting or partially textual signals
    Mixed,
}

impl ContentType {
    /// Every content type, in declaration order
    pub const ALL: [ContentType; 6] = [
        ContentType::Text,
        ContentType::Json,
        ContentType::Xml,
        ContentType::Code,
        ContentType::Binary,
        ContentType::Mixed,
    ];

    /// Lowercase wire name
    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::Text => "text",
            ContentType::Json => "json",
            ContentType::Xml => "xml",
            ContentType::Code => "code",
            ContentType::Binary => "binary",
            ContentType::Mixed => "mixed",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ContentType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                format!(
                    "unknown content type: {}. \
                     Expected one of: text, json, xml, code, binary, mixed",
                    s
                )
            })
    }
}

/// Input size classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SizeClass {
    /// Tiny inputs (<1KB)
    Tiny,
    /// Small inputs (<100KB)
    Small,
    /// Medium inputs (<10MB)
    Medium,
    /// Large inputs (<100MB)
    Large,
    /// Huge inputs (>100MB)
    Huge,
}

impl SizeClass {
    /// Classify size in bytes
    pub fn classify(size: u64) -> Self {
        match size {
            0..=1_024 => SizeClass::Tiny,
            1_025..=102_400 => SizeClass::Small,
            102_401..=10_485_760 => SizeClass::Medium,
            10_485_761..=104_857_600 => SizeClass::Large,
            _ => SizeClass::Huge,
        }
    }
}

/// Entropy classification based on Shannon entropy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntropyClass {
    /// Very low entropy (<4.0 bits/byte) - highly repetitive
    VeryLow,
    /// Low entropy (<6.0 bits/byte) - typical text
    Low,
    /// Medium entropy (<7.5 bits/byte) - mixed content
    Medium,
    /// High entropy (≥7.5 bits/byte) - random/compressed
    High,
}

impl EntropyClass {
    /// Classify entropy value (0.0 to 8.0 bits per byte)
    pub fn classify(entropy: f64) -> Self {
        match entropy {
            e if e < 4.0 => EntropyClass::VeryLow,
            e if e < 6.0 => EntropyClass::Low,
            e if e < 7.5 => EntropyClass::Medium,
            _ => EntropyClass::High,
        }
    }
}

/// Statistical profile of one piece of content
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContentProfile {
    /// Input length in bytes
    pub size_bytes: u64,
    /// Shannon entropy in bits per byte, within [0, 8]
    pub entropy: f64,
    /// Share of repeated structure, within [0, 1]
    pub redundancy: f64,
    /// Sniffed content type
    pub detected_type: ContentType,
    /// Estimated achievable size reduction, within [0, 1]
    pub compressibility_score: f64,
}

impl ContentProfile {
    /// Analyze content and build its profile
    pub fn analyze(content: &[u8]) -> Self {
        let entropy = calculate_entropy(content);
        let redundancy = estimate_redundancy(content);

        ContentProfile {
            size_bytes: content.len() as u64,
            entropy,
            redundancy,
            detected_type: detect_content_type(content),
            compressibility_score: compressibility_score(content.len(), entropy, redundancy),
        }
    }

    /// Size classification of the profiled input
    pub fn size_class(&self) -> SizeClass {
        SizeClass::classify(self.size_bytes)
    }

    /// Entropy classification of the profiled input
    pub fn entropy_class(&self) -> EntropyClass {
        EntropyClass::classify(self.entropy)
    }
}

/// Analyze content; see [`ContentProfile::analyze`]
pub fn analyze(content: &[u8]) -> ContentProfile {
    ContentProfile::analyze(content)
}

/// Calculate Shannon entropy of data (bits per byte)
///
/// Shannon entropy H = -Σ(p(x) * log2(p(x)))
/// where p(x) is probability of byte value x
///
/// Returns value between 0.0 (all same byte) and 8.0 (uniform bytes)
pub fn calculate_entropy(data: &[u8]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }

    let mut frequencies = [0u64; 256];
    for &byte in data {
        frequencies[byte as usize] += 1;
    }

    let len = data.len() as f64;
    let mut entropy = 0.0;

    for &count in &frequencies {
        if count > 0 {
            let probability = count as f64 / len;
            entropy -= probability * probability.log2();
        }
    }

    entropy.clamp(0.0, 8.0)
}

/// Estimate redundancy as the share of 4-byte windows seen earlier in the input
///
/// Only the first [`REDUNDANCY_SAMPLE_SIZE`] bytes are inspected, so the cost is
/// linear and bounded.
pub fn estimate_redundancy(data: &[u8]) -> f64 {
    let sample = &data[..data.len().min(REDUNDANCY_SAMPLE_SIZE)];

    if sample.len() < WINDOW {
        let constant = !sample.is_empty() && sample.iter().all(|&b| b == sample[0]);
        return if constant { 1.0 } else { 0.0 };
    }

    let windows = sample.len() - WINDOW + 1;
    let mut seen = HashSet::with_capacity(windows.min(1 << 16));
    let mut repeats = 0usize;

    for window in sample.windows(WINDOW) {
        let key = u32::from_le_bytes([window[0], window[1], window[2], window[3]]);
        if !seen.insert(key) {
            repeats += 1;
        }
    }

    repeats as f64 / windows as f64
}

/// Combine entropy and redundancy into a [0, 1] compressibility score
///
/// Decreasing in entropy, increasing in redundancy. Empty input scores 1.0.
pub fn compressibility_score(size: usize, entropy: f64, redundancy: f64) -> f64 {
    if size == 0 {
        return 1.0;
    }
    (0.5 * (1.0 - entropy / 8.0) + 0.5 * redundancy).clamp(0.0, 1.0)
}

/// Sniff the content type
pub fn detect_content_type(data: &[u8]) -> ContentType {
    if data.is_empty() {
        return ContentType::Binary;
    }

    if is_json(data) {
        return ContentType::Json;
    }

    let sample = &data[..data.len().min(TYPE_SAMPLE_SIZE)];
    let printable = printable_ratio(sample);

    if printable < 0.70 {
        return ContentType::Binary;
    }
    if printable < 0.95 {
        return ContentType::Mixed;
    }

    match (has_xml_signal(sample), has_code_signal(sample)) {
        (true, true) => ContentType::Mixed,
        (true, false) => ContentType::Xml,
        (false, true) => ContentType::Code,
        (false, false) => ContentType::Text,
    }
}

fn first_non_whitespace(data: &[u8]) -> Option<u8> {
    data.iter().copied().find(|b| !b.is_ascii_whitespace())
}

fn is_json(data: &[u8]) -> bool {
    matches!(first_non_whitespace(data), Some(b'{') | Some(b'['))
        && serde_json::from_slice::<serde::de::IgnoredAny>(data).is_ok()
}

fn printable_ratio(sample: &[u8]) -> f64 {
    if sample.is_empty() {
        return 0.0;
    }

    // A multi-byte sequence cut by the sample boundary still counts as UTF-8
    let utf8 = match std::str::from_utf8(sample) {
        Ok(_) => true,
        Err(e) => e.error_len().is_none(),
    };

    let printable = sample
        .iter()
        .filter(|&&b| {
            matches!(b, b'\t' | b'\n' | b'\r' | 0x20..=0x7e) || (utf8 && b >= 0x80)
        })
        .count();

    printable as f64 / sample.len() as f64
}

fn has_xml_signal(sample: &[u8]) -> bool {
    if first_non_whitespace(sample) != Some(b'<') {
        return false;
    }

    let opens = sample
        .windows(2)
        .filter(|w| {
            w[0] == b'<' && (w[1].is_ascii_alphabetic() || matches!(w[1], b'/' | b'?' | b'!'))
        })
        .count();
    let closes = sample.iter().filter(|&&b| b == b'>').count();

    // At least one tag per 100 bytes, mostly closed
    opens >= 2 && closes * 2 >= opens && opens * 100 >= sample.len()
}

fn has_code_signal(sample: &[u8]) -> bool {
    let text = String::from_utf8_lossy(sample);
    let lines = text.lines().count().max(1);

    let keyword_hits: usize = CODE_KEYWORDS.iter().map(|kw| text.matches(kw).count()).sum();
    let punctuation = sample
        .iter()
        .filter(|&&b| matches!(b, b'{' | b'}' | b'(' | b')' | b';' | b'='))
        .count();

    let punctuation_density = punctuation as f64 / sample.len() as f64;
    let keyword_density = keyword_hits as f64 / lines as f64;

    keyword_hits >= 2 && keyword_density >= 0.15 && punctuation_density >= 0.03
}
