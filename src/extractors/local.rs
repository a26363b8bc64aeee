use async_trait::async_trait;
use chrono::Duration;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use super::{AudioFormat, MediaExtractor, MediaInfo};
use crate::{Result, ScoutError};

const MEDIA_EXTENSIONS: &[&str] = &[
    "mp4", "mkv", "avi", "mov", "webm", "m4v", "mp3", "m4a", "wav", "flac", "ogg",
];

/// Extractor for video/audio files already on disk
pub struct LocalFileExtractor;

impl LocalFileExtractor {
    pub fn new() -> Self {
        Self
    }

    fn validate_file(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            return Err(ScoutError::MediaUnavailable(format!(
                "file does not exist: {}",
                path.display()
            ))
            .into());
        }

        if !path.is_file() {
            return Err(ScoutError::MediaUnavailable(format!(
                "path is not a file: {}",
                path.display()
            ))
            .into());
        }

        Ok(())
    }

    /// Get duration and title using ffprobe
    async fn get_file_info(&self, path: &Path) -> Result<(Option<f64>, Option<String>)> {
        let output = Command::new("ffprobe")
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                &path.to_string_lossy(),
            ])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("Failed to analyze file with ffprobe: {}", error);
        }

        let info: serde_json::Value = serde_json::from_slice(&output.stdout)?;

        let duration = info["format"]["duration"]
            .as_str()
            .and_then(|d| d.parse::<f64>().ok());
        let title = info["format"]["tags"]["title"]
            .as_str()
            .map(|s| s.to_string());

        Ok((duration, title))
    }

    fn is_audio_only(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| AudioFormat::from_extension(&ext.to_string_lossy()).is_some())
            .unwrap_or(false)
    }
}

#[async_trait]
impl MediaExtractor for LocalFileExtractor {
    async fn probe(&self, url: &str) -> Result<MediaInfo> {
        let path = Path::new(url);
        self.validate_file(path)?;

        let (duration_secs, title) = self.get_file_info(path).await?;

        let title = title.or_else(|| {
            path.file_stem()
                .map(|stem| stem.to_string_lossy().to_string())
        });

        Ok(MediaInfo {
            title,
            duration: duration_secs.map(|d| Duration::seconds(d as i64)),
            original_url: url.to_string(),
            source: self.source_name().to_string(),
        })
    }

    /// Transcode the audio track to MP3 for transcription
    async fn download_audio(&self, url: &str, output_path: &Path) -> Result<AudioFormat> {
        let path = Path::new(url);
        self.validate_file(path)?;

        tracing::debug!("Extracting audio track from: {}", path.display());

        let output = Command::new("ffmpeg")
            .args([
                "-y",
                "-i",
                &path.to_string_lossy(),
                "-vn",
                "-acodec",
                "libmp3lame",
                "-q:a",
                "9",
                &output_path.to_string_lossy(),
            ])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            return Err(ScoutError::MediaUnavailable(format!(
                "ffmpeg audio extraction failed: {}",
                error
            ))
            .into());
        }

        Ok(AudioFormat::Mp3)
    }

    /// Frame sampling reads the file directly, so this is just a copy
    async fn download_video(&self, url: &str, output_path: &Path) -> Result<()> {
        let path = Path::new(url);
        self.validate_file(path)?;

        if self.is_audio_only(path) {
            return Err(ScoutError::RecognitionFailure(format!(
                "no video track in audio file: {}",
                path.display()
            ))
            .into());
        }

        fs_err::copy(path, output_path)?;
        Ok(())
    }

    fn supports_url(&self, url: &str) -> bool {
        if !super::is_local_file(url) {
            return false;
        }

        Path::new(url)
            .extension()
            .map(|ext| {
                let ext = ext.to_string_lossy().to_lowercase();
                MEDIA_EXTENSIONS.contains(&ext.as_str())
            })
            .unwrap_or(false)
    }

    fn source_name(&self) -> &'static str {
        "Local files"
    }
}

impl Default for LocalFileExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supports_media_extensions_only() {
        let extractor = LocalFileExtractor::new();
        assert!(extractor.supports_url("./promo.mp4"));
        assert!(extractor.supports_url("clips/unboxing.mkv"));
        assert!(!extractor.supports_url("./notes.txt"));
        assert!(!extractor.supports_url("https://youtu.be/abc12345678"));
    }

    #[test]
    fn audio_only_detection() {
        let extractor = LocalFileExtractor::new();
        assert!(extractor.is_audio_only(Path::new("podcast.mp3")));
        assert!(!extractor.is_audio_only(Path::new("video.mp4")));
    }
}
