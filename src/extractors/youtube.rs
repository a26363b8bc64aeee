use async_trait::async_trait;
use chrono::Duration;
use serde_json::Value;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use super::{AudioFormat, MediaExtractor, MediaInfo};
use crate::{Result, ScoutError};

/// YouTube media extractor using yt-dlp
pub struct YoutubeExtractor {
    yt_dlp_path: String,
}

impl YoutubeExtractor {
    pub fn new() -> Self {
        Self {
            yt_dlp_path: "yt-dlp".to_string(),
        }
    }

    /// Check if yt-dlp is available
    pub async fn check_availability(&self) -> Result<bool> {
        let output = Command::new(&self.yt_dlp_path)
            .arg("--version")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await;

        Ok(output.map(|o| o.status.success()).unwrap_or(false))
    }

    /// Get video information using yt-dlp
    async fn get_video_info(&self, url: &str) -> Result<Value> {
        tracing::debug!("Extracting video info for: {}", url);

        let output = Command::new(&self.yt_dlp_path)
            .args(["--dump-json", "--no-playlist", url])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            return Err(ScoutError::MediaUnavailable(error.to_string()).into());
        }

        let json_str = String::from_utf8(output.stdout)?;
        let info: Value = serde_json::from_str(&json_str)?;

        Ok(info)
    }

    async fn ensure_available(&self) -> Result<()> {
        if !self.check_availability().await? {
            anyhow::bail!(
                "yt-dlp is not available. Please install it: https://github.com/yt-dlp/yt-dlp"
            );
        }
        Ok(())
    }
}

#[async_trait]
impl MediaExtractor for YoutubeExtractor {
    async fn probe(&self, url: &str) -> Result<MediaInfo> {
        self.ensure_available().await?;

        let info = self.get_video_info(url).await?;

        let title = info["title"].as_str().map(|s| s.to_string());
        let duration = info["duration"].as_f64().map(|d| Duration::seconds(d as i64));

        Ok(MediaInfo {
            title,
            duration,
            original_url: url.to_string(),
            source: self.source_name().to_string(),
        })
    }

    /// Download just the audio track, converted to MP3 for transcription
    async fn download_audio(&self, url: &str, output_path: &Path) -> Result<AudioFormat> {
        self.ensure_available().await?;
        tracing::debug!("Downloading audio track for: {}", url);

        let output = Command::new(&self.yt_dlp_path)
            .args([
                "--output",
                &output_path.to_string_lossy(),
                "--extract-audio",
                "--audio-format",
                "mp3",
                // Lowest quality is still plenty for speech-to-text
                "--audio-quality",
                "9",
                "--format",
                "worstaudio[acodec^=mp4a]/worstaudio[ext=m4a]/worstaudio[ext=mp3]/worstaudio",
                "--no-playlist",
                "--concurrent-fragments",
                "4",
                "--newline",
                url,
            ])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            return Err(ScoutError::MediaUnavailable(format!(
                "audio download failed: {}",
                error
            ))
            .into());
        }

        Ok(AudioFormat::Mp3)
    }

    /// Download the video track for frame sampling
    async fn download_video(&self, url: &str, output_path: &Path) -> Result<()> {
        self.ensure_available().await?;
        tracing::debug!("Downloading video track for: {}", url);

        let output = Command::new(&self.yt_dlp_path)
            .args([
                "--output",
                &output_path.to_string_lossy(),
                // Small resolutions are enough for on-screen code OCR
                "--format",
                "worstvideo[ext=mp4][height>=360]/bestvideo[ext=mp4]/best[ext=mp4]/best",
                "--no-playlist",
                "--concurrent-fragments",
                "4",
                "--newline",
                url,
            ])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            return Err(ScoutError::MediaUnavailable(format!(
                "video download failed: {}",
                error
            ))
            .into());
        }

        Ok(())
    }

    fn supports_url(&self, url: &str) -> bool {
        let url_lower = url.to_lowercase();
        url_lower.contains("youtube.com/watch")
            || url_lower.contains("youtu.be/")
            || url_lower.contains("youtube.com/embed/")
            || url_lower.contains("youtube.com/v/")
            || url_lower.contains("m.youtube.com/")
    }

    fn source_name(&self) -> &'static str {
        "YouTube"
    }
}

impl Default for YoutubeExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supports_common_youtube_url_shapes() {
        let extractor = YoutubeExtractor::new();
        assert!(extractor.supports_url("https://www.youtube.com/watch?v=abc"));
        assert!(extractor.supports_url("https://youtu.be/abc12345678"));
        assert!(extractor.supports_url("https://m.youtube.com/watch?v=abc"));
        assert!(!extractor.supports_url("https://vimeo.com/12345"));
    }
}
