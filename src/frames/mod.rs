use anyhow::{Context, Result};
use aws_sdk_rekognition::primitives::Blob;
use aws_sdk_rekognition::types::{Image, TextTypes};
use aws_sdk_rekognition::Client as RekognitionClient;
use futures_util::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tempfile::TempDir;
use tokio::process::Command;

use crate::config::RecognitionConfig;
use crate::extract::TextSegment;
use crate::ScoutError;

/// Frame recognition collaborator: samples frames from a video with ffmpeg
/// and reads on-screen text with AWS Rekognition. Optional; a scan without it
/// just has fewer corroborating segments.
pub struct FrameTextFetcher {
    client: RekognitionClient,
    config: RecognitionConfig,
}

impl FrameTextFetcher {
    pub fn new(config: RecognitionConfig, aws_config: &aws_config::SdkConfig) -> Self {
        Self {
            client: RekognitionClient::new(aws_config),
            config,
        }
    }

    /// Sample frames from the video and return frame-tagged text segments,
    /// one per frame that contained any recognizable text.
    pub async fn fetch_frame_text(&self, video_path: &Path) -> Result<Vec<TextSegment>> {
        let frame_dir = TempDir::new().context("Failed to create frame directory")?;
        let frames = self.sample_frames(video_path, frame_dir.path()).await?;

        if frames.is_empty() {
            tracing::warn!("No frames sampled from {}", video_path.display());
            return Ok(Vec::new());
        }

        tracing::info!(
            "Recognizing text in {} frames ({}s interval)",
            frames.len(),
            self.config.frame_interval
        );

        let progress = ProgressBar::new(frames.len() as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} frames {msg}")
        {
            progress.set_style(style);
        }
        progress.set_message("Reading on-screen text...");

        let interval = self.config.frame_interval;
        let mut results: Vec<(usize, Option<String>)> =
            stream::iter(frames.into_iter().enumerate())
                .map(|(index, frame_path)| {
                    let progress = progress.clone();
                    async move {
                        let text = self.detect_text(&frame_path).await;
                        progress.inc(1);
                        (index, text)
                    }
                })
                .buffer_unordered(self.config.max_concurrent_requests.max(1))
                .collect()
                .await;

        progress.finish_with_message("Frame recognition complete");

        results.sort_by_key(|(index, _)| *index);

        let segments = results
            .into_iter()
            .filter_map(|(index, text)| {
                text.map(|t| TextSegment::frame(t, Some(index as f64 * interval)))
            })
            .collect();

        Ok(segments)
    }

    /// Extract one frame per configured interval as JPEGs
    async fn sample_frames(&self, video_path: &Path, frame_dir: &Path) -> Result<Vec<PathBuf>> {
        let fps_filter = format!("fps=1/{}", self.config.frame_interval);
        let output_pattern = frame_dir.join("frame_%05d.jpg");

        tracing::debug!(
            "Sampling frames from {} with filter {}",
            video_path.display(),
            fps_filter
        );

        let output = Command::new("ffmpeg")
            .args([
                "-y",
                "-i",
                &video_path.to_string_lossy(),
                "-vf",
                &fps_filter,
                "-q:v",
                "3",
                &output_pattern.to_string_lossy(),
            ])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            return Err(ScoutError::RecognitionFailure(format!(
                "ffmpeg frame sampling failed: {}",
                error
            ))
            .into());
        }

        let mut frames: Vec<PathBuf> = fs_err::read_dir(frame_dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().map(|e| e == "jpg").unwrap_or(false))
            .collect();
        frames.sort();

        Ok(frames)
    }

    /// Run Rekognition DetectText over a single frame. Per-frame failures are
    /// logged and swallowed so one bad frame cannot sink the scan.
    async fn detect_text(&self, frame_path: &Path) -> Option<String> {
        let bytes = match fs_err::read(frame_path) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("Failed to read frame {}: {}", frame_path.display(), e);
                return None;
            }
        };

        let image = Image::builder().bytes(Blob::new(bytes)).build();

        let response = match self.client.detect_text().image(image).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(
                    "Rekognition failed on frame {}: {}",
                    frame_path.display(),
                    e
                );
                return None;
            }
        };

        let lines: Vec<String> = response
            .text_detections()
            .iter()
            .filter(|detection| detection.r#type() == Some(&TextTypes::Line))
            .filter(|detection| {
                detection
                    .confidence()
                    .map(|c| c >= self.config.min_detection_confidence)
                    .unwrap_or(false)
            })
            .filter_map(|detection| detection.detected_text().map(|t| t.to_string()))
            .collect();

        if lines.is_empty() {
            None
        } else {
            Some(lines.join(" "))
        }
    }
}
