use async_trait::async_trait;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub mod local;
pub mod youtube;

use crate::Result;

/// Information about a piece of media before download
#[derive(Debug, Clone)]
pub struct MediaInfo {
    /// Title or description of the media
    pub title: Option<String>,

    /// Duration if available
    pub duration: Option<Duration>,

    /// Original URL or path that was given
    pub original_url: String,

    /// Source that handled it
    pub source: String,
}

/// Supported audio formats for the transcription leg
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum AudioFormat {
    Mp3,
    M4a,
    Wav,
    Flac,
    Ogg,
}

impl AudioFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::M4a => "m4a",
            AudioFormat::Wav => "wav",
            AudioFormat::Flac => "flac",
            AudioFormat::Ogg => "ogg",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "mp3" => Some(AudioFormat::Mp3),
            "m4a" | "aac" => Some(AudioFormat::M4a),
            "wav" => Some(AudioFormat::Wav),
            "flac" => Some(AudioFormat::Flac),
            "ogg" => Some(AudioFormat::Ogg),
            _ => None,
        }
    }

    /// Get MIME type for the format
    pub fn mime_type(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "audio/mpeg",
            AudioFormat::M4a => "audio/mp4",
            AudioFormat::Wav => "audio/wav",
            AudioFormat::Flac => "audio/flac",
            AudioFormat::Ogg => "audio/ogg",
        }
    }
}

/// Trait for fetching media from different sources.
///
/// A scan needs two legs: the audio track for transcription and the video
/// track for frame recognition, so sources provide both.
#[async_trait]
pub trait MediaExtractor: Send + Sync {
    /// Probe the media without downloading it
    async fn probe(&self, url: &str) -> Result<MediaInfo>;

    /// Download just the audio track to the given path
    async fn download_audio(&self, url: &str, output_path: &Path) -> Result<AudioFormat>;

    /// Download the video to the given path (mp4)
    async fn download_video(&self, url: &str, output_path: &Path) -> Result<()>;

    /// Check if this extractor supports the given URL or path
    fn supports_url(&self, url: &str) -> bool;

    /// Get the name of this source
    fn source_name(&self) -> &'static str;
}

/// Registry for managing multiple extractors
pub struct ExtractorRegistry {
    extractors: Vec<Box<dyn MediaExtractor>>,
}

impl ExtractorRegistry {
    /// Create a new registry with default extractors
    pub fn new() -> Self {
        let mut registry = Self {
            extractors: Vec::new(),
        };

        registry.register(Box::new(youtube::YoutubeExtractor::new()));
        registry.register(Box::new(local::LocalFileExtractor::new()));

        registry
    }

    /// Register a new extractor
    pub fn register(&mut self, extractor: Box<dyn MediaExtractor>) {
        self.extractors.push(extractor);
    }

    /// Find an extractor that supports the given URL or path
    pub fn find_extractor(&self, url: &str) -> Option<&dyn MediaExtractor> {
        self.extractors
            .iter()
            .find(|extractor| extractor.supports_url(url))
            .map(|boxed| boxed.as_ref())
    }

    /// List all supported sources
    pub fn list_sources(&self) -> Vec<&'static str> {
        self.extractors
            .iter()
            .map(|extractor| extractor.source_name())
            .collect()
    }

    /// Resolve the extractor for an input, failing on unsupported URLs
    pub fn resolve(&self, input: &str) -> Result<&dyn MediaExtractor> {
        self.find_extractor(input)
            .ok_or_else(|| crate::ScoutError::UnsupportedUrl(input.to_string()).into())
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Check if input is a local file path rather than a URL
pub fn is_local_file(input: &str) -> bool {
    if input.starts_with("http://") || input.starts_with("https://") {
        return false;
    }

    let path = std::path::Path::new(input);
    if path.exists() {
        return true;
    }

    let has_extension = path.extension().is_some();
    let has_path_separators = input.contains('/') || input.contains('\\');
    let starts_with_dot = input.starts_with("./") || input.starts_with(".\\");

    has_extension || has_path_separators || starts_with_dot
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_resolves_youtube_urls() {
        let registry = ExtractorRegistry::new();
        let extractor = registry
            .find_extractor("https://www.youtube.com/watch?v=dQw4w9WgXcQ")
            .unwrap();
        assert_eq!(extractor.source_name(), "YouTube");
    }

    #[test]
    fn registry_rejects_unknown_urls() {
        let registry = ExtractorRegistry::new();
        assert!(registry.resolve("https://example.com/page").is_err());
    }

    #[test]
    fn local_file_detection() {
        assert!(is_local_file("./video.mp4"));
        assert!(is_local_file("clips/promo.mkv"));
        assert!(!is_local_file("https://youtu.be/abc12345678"));
    }

    #[test]
    fn audio_format_extensions() {
        assert!(matches!(
            AudioFormat::from_extension("MP3"),
            Some(AudioFormat::Mp3)
        ));
        assert!(AudioFormat::from_extension("exe").is_none());
    }
}
