//! Batch Text Encoding Conversion Core
//!
//! Provides the host-independent pieces of the converter:
//! - EncodingSpec: the closed set of target encodings with their codecs
//! - CharsetDetector: pluggable source-encoding detection with a confidence score
//! - ExtensionFilter: persisted extension allow-list
//! - Duplicate output-name validation
//! - BatchConverter: the sequential conversion pipeline

pub mod detect;
pub mod display;
pub mod encoding;
pub mod filter;
pub mod pipeline;
pub mod validate;

pub use detect::{CharsetDetector, ChardetngDetector, DetectedEncoding, DetectionOutcome};
pub use display::abbreviate;
pub use encoding::EncodingSpec;
pub use filter::ExtensionFilter;
pub use pipeline::{
    BatchConverter, ConversionJob, ConversionReport, FileEntry, CONFIDENCE_THRESHOLD,
};
pub use validate::find_duplicate_basenames;

use thiserror::Error;

/// Conversion errors
#[derive(Error, Debug)]
pub enum ConvError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("a conversion job is already running")]
    Busy,

    #[error("duplicate output names: {}", .0.join(", "))]
    DuplicateNames(Vec<String>),

    #[error("invalid filter line: {0}")]
    FilterParse(String),

    #[error("cannot encode to {encoding}: unmappable character")]
    Unmappable { encoding: &'static str },

    #[error("invalid path: {0}")]
    InvalidPath(String),
}

pub type Result<T> = std::result::Result<T, ConvError>;
