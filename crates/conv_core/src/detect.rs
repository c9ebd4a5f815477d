//! Source encoding detection
//!
//! The pipeline only depends on the `CharsetDetector` trait; the production
//! implementation combines BOM sniffing, a UTF-8 validity check, and a
//! chardetng guess scored by a trial decode. Tests substitute fixed-outcome
//! stubs.

use crate::encoding::{self, EncodingSpec};
use crate::Result;
use chardetng::EncodingDetector;
use std::path::Path;

/// An encoding a detector identified for a source file.
///
/// Sources are not limited to the closed target set: chardetng may report
/// anything encoding_rs can decode.
#[derive(Debug, Clone)]
pub enum DetectedEncoding {
    /// One of the converter's own encodings (BOM-signed Unicode, EUC-KR).
    Known(EncodingSpec),
    /// Any other encoding_rs codec.
    External(&'static encoding_rs::Encoding),
}

impl DetectedEncoding {
    pub fn name(&self) -> &'static str {
        match self {
            DetectedEncoding::Known(spec) => spec.name(),
            DetectedEncoding::External(enc) => enc.name(),
        }
    }

    /// Decode file bytes with this encoding, replacing invalid sequences.
    pub fn decode(&self, bytes: &[u8]) -> String {
        match self {
            DetectedEncoding::Known(spec) => spec.decode(bytes),
            DetectedEncoding::External(enc) => enc.decode(bytes).0.into_owned(),
        }
    }
}

/// Best-guess source encoding for one file.
#[derive(Debug, Clone)]
pub struct DetectionOutcome {
    pub encoding: DetectedEncoding,
    pub name: String,
    /// Confidence in [0, 1]; the pipeline gates on this.
    pub confidence: f32,
}

impl DetectionOutcome {
    fn new(encoding: DetectedEncoding, confidence: f32) -> Self {
        let name = encoding.name().to_string();
        Self {
            encoding,
            name,
            confidence,
        }
    }
}

/// Capability the pipeline consumes: file-local detection with no side
/// effects on the file.
pub trait CharsetDetector: Send + Sync {
    fn detect(&self, path: &Path) -> Result<Option<DetectionOutcome>>;
}

/// Production detector backed by chardetng.
pub struct ChardetngDetector;

impl ChardetngDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ChardetngDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl CharsetDetector for ChardetngDetector {
    fn detect(&self, path: &Path) -> Result<Option<DetectionOutcome>> {
        let bytes = std::fs::read(path)?;
        Ok(detect_bytes(&bytes))
    }
}

/// Detect the encoding of a byte buffer.
///
/// BOM signatures and fully valid UTF-8 score 1.0. Everything else goes
/// through chardetng, whose guess is scored by trial-decoding: replacement
/// characters and control bytes pull the confidence down, so its
/// windows-1252 fallback on binary junk does not pass the pipeline's gate.
pub fn detect_bytes(bytes: &[u8]) -> Option<DetectionOutcome> {
    if let Some(spec) = encoding::sniff_bom(bytes) {
        return Some(DetectionOutcome::new(DetectedEncoding::Known(spec), 1.0));
    }

    if std::str::from_utf8(bytes).is_ok() {
        return Some(DetectionOutcome::new(
            DetectedEncoding::Known(EncodingSpec::Utf8),
            1.0,
        ));
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let guess = detector.guess(None, true);

    let encoding = if guess == encoding_rs::EUC_KR {
        DetectedEncoding::Known(EncodingSpec::EucKr)
    } else {
        DetectedEncoding::External(guess)
    };

    let (decoded, _, _) = guess.decode(bytes);
    Some(DetectionOutcome::new(
        encoding,
        score_decode(&decoded),
    ))
}

/// Score a trial decode: fraction of characters that are neither
/// replacements nor non-whitespace control characters.
fn score_decode(decoded: &str) -> f32 {
    let mut total = 0usize;
    let mut replaced = 0usize;
    let mut control = 0usize;

    for ch in decoded.chars() {
        total += 1;
        if ch == char::REPLACEMENT_CHARACTER {
            replaced += 1;
        } else if ch.is_control() && !matches!(ch, '\t' | '\n' | '\r') {
            control += 1;
        }
    }

    if total == 0 {
        return 1.0;
    }

    let clean = 1.0 - replaced as f32 / total as f32;
    let printable = 1.0 - control as f32 / total as f32;
    (clean * printable).clamp(0.0, 1.0)
}
