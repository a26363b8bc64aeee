use anyhow::{Context, Result};
use aws_sdk_transcribe::types::{TranscriptionJob, TranscriptionJobStatus};
use aws_sdk_transcribe::Client as TranscribeClient;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use std::time::Duration;
use tokio::time::sleep;

use crate::extract::TextSegment;
use crate::ScoutError;

/// Break a segment once it spans this many seconds
const MAX_SEGMENT_SECS: f64 = 10.0;

/// A silence gap longer than this starts a new segment
const GAP_SECS: f64 = 1.0;

/// Parsed transcription output
#[derive(Debug, Clone)]
pub struct TranscriptOutput {
    pub segments: Vec<TextSegment>,
    pub language: String,
}

/// AWS Transcribe transcript format
#[derive(Debug, Deserialize)]
struct AwsTranscript {
    results: TranscriptResults,
}

#[derive(Debug, Deserialize)]
struct TranscriptResults {
    items: Vec<TranscriptItem>,
}

#[derive(Debug, Deserialize)]
struct TranscriptItem {
    start_time: Option<String>,
    end_time: Option<String>,
    #[serde(rename = "type")]
    item_type: String,
    alternatives: Vec<Alternative>,
}

#[derive(Debug, Deserialize)]
struct Alternative {
    content: String,
}

/// Polls a Transcribe job to completion and parses the result
pub struct TranscriptionPoller {
    client: TranscribeClient,
    job_id: String,
}

impl TranscriptionPoller {
    pub fn new(client: TranscribeClient, job_id: String) -> Self {
        Self { client, job_id }
    }

    /// Wait for transcription job completion with progress tracking
    pub async fn wait_for_completion(&self) -> Result<TranscriptOutput> {
        let progress = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            progress.set_style(style);
        }
        progress.set_message("Waiting for transcription job...");

        let start_time = std::time::Instant::now();
        let mut check_count = 0u64;

        loop {
            check_count += 1;

            let job = self.get_transcription_job().await?;

            match job.transcription_job_status() {
                Some(TranscriptionJobStatus::InProgress) | Some(TranscriptionJobStatus::Queued) => {
                    progress.set_message(format!(
                        "Transcribing... ({}s elapsed)",
                        start_time.elapsed().as_secs()
                    ));

                    // Exponential backoff up to 30 seconds
                    let wait_time = std::cmp::min(5 + (check_count - 1) * 2, 30);
                    sleep(Duration::from_secs(wait_time)).await;
                }
                Some(TranscriptionJobStatus::Completed) => {
                    progress.finish_with_message("Transcription completed");
                    break;
                }
                Some(TranscriptionJobStatus::Failed) => {
                    progress.finish_with_message("Transcription failed");

                    let failure_reason = job.failure_reason().unwrap_or("Unknown error");
                    return Err(
                        ScoutError::TranscriptionFailure(failure_reason.to_string()).into()
                    );
                }
                _ => {
                    progress.finish_with_message("Transcription status unknown");
                    return Err(ScoutError::TranscriptionFailure(
                        "unexpected transcription job status".to_string(),
                    )
                    .into());
                }
            }
        }

        let job = self.get_transcription_job().await?;
        self.parse_result(job).await
    }

    /// Get transcription job details
    async fn get_transcription_job(&self) -> Result<TranscriptionJob> {
        let response = self
            .client
            .get_transcription_job()
            .transcription_job_name(&self.job_id)
            .send()
            .await
            .context("Failed to get transcription job status")?;

        response
            .transcription_job()
            .ok_or_else(|| anyhow::anyhow!("Transcription job not found"))
            .map(|job| job.clone())
    }

    /// Download and parse the completed transcript into text segments
    async fn parse_result(&self, job: TranscriptionJob) -> Result<TranscriptOutput> {
        let transcript_uri = job
            .transcript()
            .and_then(|t| t.transcript_file_uri())
            .ok_or_else(|| anyhow::anyhow!("No transcript URI found"))?;

        let transcript_json = self.download_transcript(transcript_uri).await?;

        let aws_transcript: AwsTranscript =
            serde_json::from_str(&transcript_json).context("Failed to parse transcript JSON")?;

        let segments = build_segments(&aws_transcript.results.items);

        let language = job
            .language_code()
            .map(|lc| lc.as_str().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        Ok(TranscriptOutput { segments, language })
    }

    /// Download transcript from the signed URI Transcribe hands back
    async fn download_transcript(&self, uri: &str) -> Result<String> {
        let response = reqwest::get(uri)
            .await
            .context("Failed to download transcript")?;

        if !response.status().is_success() {
            anyhow::bail!("Failed to download transcript: HTTP {}", response.status());
        }

        let content = response
            .text()
            .await
            .context("Failed to read transcript content")?;

        Ok(content)
    }
}

/// Group word-level transcript items into timestamped segments.
///
/// A new segment starts on a silence gap, on sentence-ending punctuation, or
/// once the current one spans the length cap.
fn build_segments(items: &[TranscriptItem]) -> Vec<TextSegment> {
    let mut segments = Vec::new();
    let mut current_text = String::new();
    let mut current_start: Option<f64> = None;
    let mut current_end: Option<f64> = None;
    let mut ended_sentence = false;

    for item in items {
        if item.item_type == "punctuation" {
            if let Some(alt) = item.alternatives.first() {
                current_text.push_str(&alt.content);
                ended_sentence = matches!(alt.content.as_str(), "." | "!" | "?");
            }
            continue;
        }

        if item.item_type != "pronunciation" {
            continue;
        }

        let start = item.start_time.as_ref().and_then(|s| s.parse::<f64>().ok());
        let end = item.end_time.as_ref().and_then(|s| s.parse::<f64>().ok());
        let content = item
            .alternatives
            .first()
            .map(|alt| alt.content.as_str())
            .unwrap_or_default();

        let gap = start
            .zip(current_end)
            .map(|(s, e)| s - e > GAP_SECS)
            .unwrap_or(false);
        let too_long = current_start
            .zip(start)
            .map(|(seg_start, s)| s - seg_start > MAX_SEGMENT_SECS)
            .unwrap_or(false);

        if !current_text.is_empty() && (gap || too_long || ended_sentence) {
            flush_segment(&mut segments, &mut current_text, current_start);
            current_start = None;
            current_end = None;
        }
        ended_sentence = false;

        if !current_text.is_empty() {
            current_text.push(' ');
        }
        current_text.push_str(content);
        if current_start.is_none() {
            current_start = start;
        }
        current_end = end.or(current_end);
    }

    flush_segment(&mut segments, &mut current_text, current_start);
    segments
}

fn flush_segment(segments: &mut Vec<TextSegment>, text: &mut String, start: Option<f64>) {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        segments.push(TextSegment::transcript(trimmed, start));
    }
    text.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(content: &str, start: f64, end: f64) -> TranscriptItem {
        TranscriptItem {
            start_time: Some(start.to_string()),
            end_time: Some(end.to_string()),
            item_type: "pronunciation".to_string(),
            alternatives: vec![Alternative {
                content: content.to_string(),
            }],
        }
    }

    fn punct(content: &str) -> TranscriptItem {
        TranscriptItem {
            start_time: None,
            end_time: None,
            item_type: "punctuation".to_string(),
            alternatives: vec![Alternative {
                content: content.to_string(),
            }],
        }
    }

    #[test]
    fn words_group_into_one_segment() {
        let items = vec![
            word("use", 1.0, 1.2),
            word("code", 1.3, 1.5),
            word("SAVE20", 1.6, 2.0),
        ];
        let segments = build_segments(&items);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text, "use code SAVE20");
        assert_eq!(segments[0].timestamp, Some(1.0));
    }

    #[test]
    fn silence_gap_splits_segments() {
        let items = vec![word("hello", 1.0, 1.4), word("there", 5.0, 5.3)];
        let segments = build_segments(&items);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].timestamp, Some(1.0));
        assert_eq!(segments[1].timestamp, Some(5.0));
    }

    #[test]
    fn sentence_end_splits_segments() {
        let items = vec![
            word("thanks", 1.0, 1.3),
            punct("."),
            word("promo", 1.5, 1.8),
            word("below", 1.9, 2.2),
        ];
        let segments = build_segments(&items);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].text, "thanks.");
        assert_eq!(segments[1].text, "promo below");
    }

    #[test]
    fn empty_items_yield_no_segments() {
        let segments = build_segments(&[]);
        assert!(segments.is_empty());
    }
}
