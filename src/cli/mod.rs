use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "codescout",
    about = "Code Scout - Hunt voucher codes in YouTube videos using AWS Transcribe and Rekognition",
    version,
    long_about = "A CLI tool that transcribes a video's audio track, optionally reads on-screen text from sampled frames, and scans everything for voucher-code candidates ranked by confidence."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan a video URL or local file for voucher codes
    Scan {
        /// URL or file path to scan (YouTube or local video/audio files)
        #[arg(value_name = "URL_OR_FILE")]
        url: String,

        /// Output file path (prints to console if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Language code for transcription (auto-detect if not specified)
        #[arg(short, long, value_name = "LANG")]
        language: Option<String>,

        /// Skip frame recognition and use the transcript only
        #[arg(long)]
        no_frames: bool,

        /// Seconds between sampled frames for on-screen text recognition
        #[arg(long, value_name = "SECS")]
        frame_interval: Option<f64>,

        /// Drop candidates below this confidence
        #[arg(long, value_name = "SCORE")]
        min_confidence: Option<f64>,

        /// Keep the downloaded media files
        #[arg(long)]
        keep_media: bool,
    },

    /// Extract voucher codes from a transcript text file (offline, no AWS calls)
    Extract {
        /// Text file to scan, or "-" for stdin
        #[arg(value_name = "FILE")]
        input: String,

        /// Source tag to attach to the text
        #[arg(long, value_enum, default_value = "transcript")]
        source: SourceTag,

        /// Output file path (prints to console if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Drop candidates below this confidence
        #[arg(long, value_name = "SCORE")]
        min_confidence: Option<f64>,
    },

    /// Configure AWS credentials and extraction settings
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,
    },

    /// List supported media sources
    Sources,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum SourceTag {
    /// Text came from speech-to-text
    Transcript,
    /// Text came from on-screen recognition
    Frame,
}

#[derive(ValueEnum, Clone, Debug)]
pub enum OutputFormat {
    /// Human-readable candidate list
    Text,
    /// JSON with full candidate metadata
    Json,
    /// CSV, one candidate per row
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}
