use anyhow::{Context, Result};
use aws_sdk_s3::Client as S3Client;
use aws_sdk_transcribe::Client as TranscribeClient;
use std::path::Path;
use uuid::Uuid;

use crate::config::Config;
use crate::extract::TextSegment;
use crate::extractors::AudioFormat;

pub mod processor;

/// Transcription collaborator: turns an audio file into transcript-tagged
/// text segments via S3 + AWS Transcribe.
pub struct TranscriptFetcher {
    config: Config,
    s3_client: S3Client,
    transcribe_client: TranscribeClient,
}

impl TranscriptFetcher {
    pub fn new(config: Config, aws_config: &aws_config::SdkConfig) -> Self {
        Self {
            config,
            s3_client: S3Client::new(aws_config),
            transcribe_client: TranscribeClient::new(aws_config),
        }
    }

    /// Transcribe an audio file and return timestamped transcript segments
    pub async fn fetch_transcript(
        &self,
        audio_path: &Path,
        format: AudioFormat,
        language: Option<&str>,
    ) -> Result<Vec<TextSegment>> {
        let s3_key = self.upload_to_s3(audio_path, format).await?;

        let result = async {
            let job_id = self.start_transcription_job(&s3_key, format, language).await?;
            processor::TranscriptionPoller::new(self.transcribe_client.clone(), job_id)
                .wait_for_completion()
                .await
        }
        .await;

        // Best effort; the bucket should not accumulate scan audio either way
        if let Err(e) = self.cleanup_s3(&s3_key).await {
            tracing::warn!("Failed to clean up S3 object {}: {}", s3_key, e);
        }

        let output = result?;
        tracing::info!(
            "Transcription complete: {} segments, language {}",
            output.segments.len(),
            output.language
        );

        Ok(output.segments)
    }

    /// Upload audio file to S3
    async fn upload_to_s3(&self, audio_path: &Path, format: AudioFormat) -> Result<String> {
        let key = format!(
            "{}audio_{}_{}.{}",
            self.config.aws.s3_key_prefix.as_deref().unwrap_or(""),
            Uuid::new_v4(),
            chrono::Utc::now().format("%Y%m%d_%H%M%S"),
            format.as_str()
        );

        tracing::info!(
            "Uploading audio to S3: s3://{}/{}",
            self.config.aws.s3_bucket,
            key
        );

        let content = fs_err::read(audio_path)?;

        self.s3_client
            .put_object()
            .bucket(&self.config.aws.s3_bucket)
            .key(&key)
            .body(content.into())
            .content_type(format.mime_type())
            .send()
            .await
            .context("Failed to upload audio to S3")?;

        Ok(key)
    }

    /// Start AWS Transcribe job with auto language detection
    async fn start_transcription_job(
        &self,
        s3_key: &str,
        format: AudioFormat,
        language: Option<&str>,
    ) -> Result<String> {
        let job_name = format!("codescout_{}", Uuid::new_v4());
        let media_uri = format!("s3://{}/{}", self.config.aws.s3_bucket, s3_key);

        tracing::info!("Starting transcription job: {}", job_name);

        use aws_sdk_transcribe::types::{Media, MediaFormat};

        let media_format = match format {
            AudioFormat::Mp3 => MediaFormat::Mp3,
            AudioFormat::M4a => MediaFormat::Mp4,
            AudioFormat::Wav => MediaFormat::Wav,
            AudioFormat::Flac => MediaFormat::Flac,
            AudioFormat::Ogg => MediaFormat::Ogg,
        };

        let media = Media::builder().media_file_uri(media_uri).build();

        let mut job_builder = self
            .transcribe_client
            .start_transcription_job()
            .transcription_job_name(&job_name)
            .media_format(media_format)
            .media(media);

        if let Some(lang) = language.or(self
            .config
            .aws
            .transcription
            .default_language
            .as_deref())
        {
            tracing::info!("Using specified language: {}", lang);
            job_builder = job_builder.language_code(lang.parse()?);
        } else {
            tracing::info!("Using automatic language detection");
            job_builder = job_builder.identify_language(true);
        }

        if let Some(sample_rate) = self.config.aws.transcription.sample_rate {
            job_builder = job_builder.media_sample_rate_hertz(sample_rate as i32);
        }

        job_builder
            .send()
            .await
            .context("Failed to start transcription job")?;

        Ok(job_name)
    }

    /// Clean up S3 object
    async fn cleanup_s3(&self, s3_key: &str) -> Result<()> {
        tracing::debug!("Cleaning up S3 object: {}", s3_key);

        self.s3_client
            .delete_object()
            .bucket(&self.config.aws.s3_bucket)
            .key(s3_key)
            .send()
            .await
            .context("Failed to clean up S3 object")?;

        Ok(())
    }
}
