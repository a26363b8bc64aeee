//! Code Scout - A Rust CLI tool for hunting voucher codes in YouTube videos
//!
//! This library transcribes a video's audio track with AWS Transcribe, optionally
//! recognizes on-screen text in sampled frames with AWS Rekognition, and scans the
//! combined text for voucher-code candidates.

pub mod cli;
pub mod config;
pub mod extract;
pub mod extractors;
pub mod frames;
pub mod output;
pub mod pipeline;
pub mod transcribe;
pub mod utils;

pub use cli::{Cli, Commands, OutputFormat};
pub use config::Config;
pub use extract::{
    extract_codes, CodeCandidate, ExtractionConfig, ExtractionResult, SegmentSource, TextSegment,
};
pub use extractors::{MediaExtractor, MediaInfo};

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Error types specific to code scout
#[derive(thiserror::Error, Debug)]
pub enum ScoutError {
    #[error("Unsupported URL format: {0}")]
    UnsupportedUrl(String),

    #[error("Media unavailable: {0}")]
    MediaUnavailable(String),

    #[error("Transcription failed: {0}")]
    TranscriptionFailure(String),

    #[error("Frame recognition failed: {0}")]
    RecognitionFailure(String),

    #[error("AWS configuration error: {0}")]
    AwsConfigError(String),

    #[error("File operation failed: {0}")]
    FileError(String),
}
