use anyhow::{Context, Result};
use std::path::PathBuf;
use tempfile::TempDir;
use uuid::Uuid;

use crate::config::Config;
use crate::extract::{extract_codes, ExtractionResult, TextSegment};
use crate::extractors::{ExtractorRegistry, MediaInfo};
use crate::frames::FrameTextFetcher;
use crate::transcribe::TranscriptFetcher;
use crate::utils;

/// Per-scan options layered over the config file
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Language code for transcription (auto-detect if absent)
    pub language: Option<String>,

    /// Run frame recognition (None falls back to config)
    pub frames: Option<bool>,

    /// Seconds between sampled frames (None falls back to config)
    pub frame_interval: Option<f64>,

    /// Keep downloaded media next to the working directory
    pub keep_media: bool,
}

/// Everything a scan produced
#[derive(Debug, Clone)]
pub struct ScanReport {
    pub media: MediaInfo,
    pub result: ExtractionResult,
    pub transcript_segments: usize,
    pub frame_segments: usize,
    pub kept_media: Vec<PathBuf>,
}

/// Full scan pipeline: media retrieval, the two text collaborators run as
/// joined futures, then the pure extractor over the combined segments.
pub struct ScanPipeline {
    config: Config,
    registry: ExtractorRegistry,
    aws_config: aws_config::SdkConfig,
    temp_dir: TempDir,
}

impl ScanPipeline {
    pub async fn new(config: Config) -> Result<Self> {
        config.require_s3_bucket()?;

        let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(config.aws_region())
            .load()
            .await;

        let temp_dir = TempDir::new().context("Failed to create temporary directory")?;

        Ok(Self {
            config,
            registry: ExtractorRegistry::new(),
            aws_config,
            temp_dir,
        })
    }

    pub async fn scan(&self, url: &str, options: &ScanOptions) -> Result<ScanReport> {
        if !crate::extractors::is_local_file(url) {
            utils::validate_and_normalize_url(url)?;
        }

        let extractor = self.registry.resolve(url)?;
        let media = extractor.probe(url).await?;

        if let Some(title) = &media.title {
            tracing::info!("Scanning: {}", title);
        }

        let run_frames = options
            .frames
            .unwrap_or(self.config.aws.recognition.enabled);

        let scan_id = Uuid::new_v4().to_string()[..8].to_string();

        // Media retrieval: audio always, video only when frames are on
        let audio_path = self.temp_dir.path().join(format!("audio_{}.mp3", scan_id));
        let audio_format = extractor.download_audio(url, &audio_path).await?;

        let video_path = if run_frames {
            let path = self.temp_dir.path().join(format!("video_{}.mp4", scan_id));
            extractor.download_video(url, &path).await?;
            Some(path)
        } else {
            None
        };

        // The two collaborators are independent; run them joined and merge
        // their segments before extraction
        let transcript_fetcher = TranscriptFetcher::new(self.config.clone(), &self.aws_config);
        let transcript_fut = transcript_fetcher.fetch_transcript(
            &audio_path,
            audio_format,
            options.language.as_deref(),
        );

        let mut recognition_config = self.config.aws.recognition.clone();
        if let Some(interval) = options.frame_interval {
            recognition_config.frame_interval = interval;
        }

        let (transcript_segments, frame_segments) = match &video_path {
            Some(path) => {
                let frame_fetcher = FrameTextFetcher::new(recognition_config, &self.aws_config);
                tokio::try_join!(transcript_fut, frame_fetcher.fetch_frame_text(path))?
            }
            None => (transcript_fut.await?, Vec::new()),
        };

        let transcript_count = transcript_segments.len();
        let frame_count = frame_segments.len();

        let mut segments: Vec<TextSegment> = transcript_segments;
        segments.extend(frame_segments);

        let result = extract_codes(&self.config.extraction, &segments);
        tracing::info!(
            "Extraction complete: {} candidates from {} segments",
            result.len(),
            segments.len()
        );

        let kept_media = if options.keep_media || self.config.app.keep_media {
            self.preserve_media(&media, &audio_path, video_path.as_deref())?
        } else {
            Vec::new()
        };

        Ok(ScanReport {
            media,
            result,
            transcript_segments: transcript_count,
            frame_segments: frame_count,
            kept_media,
        })
    }

    /// Copy downloaded media into the working directory under the video title
    fn preserve_media(
        &self,
        media: &MediaInfo,
        audio_path: &std::path::Path,
        video_path: Option<&std::path::Path>,
    ) -> Result<Vec<PathBuf>> {
        let base = media
            .title
            .as_deref()
            .map(utils::sanitize_filename)
            .unwrap_or_else(|| format!("scan_{}", chrono::Utc::now().format("%Y%m%d_%H%M%S")));

        let mut kept = Vec::new();
        let cwd = std::env::current_dir()?;

        if audio_path.exists() {
            let target = cwd.join(format!("{}.mp3", base));
            fs_err::copy(audio_path, &target)?;
            kept.push(target);
        }

        if let Some(video) = video_path {
            if video.exists() {
                let target = cwd.join(format!("{}.mp4", base));
                fs_err::copy(video, &target)?;
                kept.push(target);
            }
        }

        Ok(kept)
    }
}
