use anyhow::{Context, Result};
use aws_config::Region;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::extract::ExtractionConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// AWS configuration
    pub aws: AwsConfig,

    /// Extraction knobs (patterns, deny list, trigger words, weights)
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Application settings
    pub app: AppConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwsConfig {
    /// AWS region
    pub region: String,

    /// S3 bucket for temporary audio storage
    pub s3_bucket: String,

    /// Optional S3 key prefix
    pub s3_key_prefix: Option<String>,

    /// Transcription job settings
    pub transcription: TranscriptionConfig,

    /// Frame recognition settings
    pub recognition: RecognitionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionConfig {
    /// Default language code (if not specified)
    pub default_language: Option<String>,

    /// Media format preference
    pub media_format: String,

    /// Sample rate for audio processing
    pub sample_rate: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionConfig {
    /// Run frame recognition by default
    pub enabled: bool,

    /// Seconds between sampled frames
    pub frame_interval: f64,

    /// Rekognition requests in flight at once
    pub max_concurrent_requests: usize,

    /// Drop Rekognition detections below this confidence (0-100)
    pub min_detection_confidence: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Temporary directory for downloads
    pub temp_dir: Option<PathBuf>,

    /// Keep media files after scanning
    pub keep_media: bool,

    /// Default output format
    pub default_output_format: String,

    /// Drop candidates below this confidence in output
    pub min_confidence: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            aws: AwsConfig {
                region: "us-east-1".to_string(),
                s3_bucket: "".to_string(),
                s3_key_prefix: Some("codescout/".to_string()),
                transcription: TranscriptionConfig {
                    default_language: None,
                    media_format: "mp3".to_string(),
                    sample_rate: Some(16000),
                },
                recognition: RecognitionConfig {
                    enabled: true,
                    frame_interval: 2.0,
                    max_concurrent_requests: 4,
                    min_detection_confidence: 80.0,
                },
            },
            extraction: ExtractionConfig::default(),
            app: AppConfig {
                temp_dir: None,
                keep_media: false,
                default_output_format: "text".to_string(),
                min_confidence: 0.0,
            },
        }
    }
}

impl Config {
    /// Load configuration from file or create default
    pub async fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content =
                fs_err::read_to_string(&config_path).context("Failed to read config file")?;

            let config: Config =
                serde_yaml::from_str(&content).context("Failed to parse config file")?;

            config.validate()?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save().await?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub async fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs_err::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self).context("Failed to serialize config")?;

        fs_err::write(&config_path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Get configuration file path
    fn config_path() -> Result<PathBuf> {
        // First try current directory for easy testing
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir().context("Could not determine config directory")?;

        Ok(config_dir.join("code-scout").join("config.yaml"))
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.extraction.patterns.is_empty() {
            anyhow::bail!("At least one candidate pattern must be configured");
        }

        for pattern in &self.extraction.patterns {
            regex::Regex::new(pattern)
                .with_context(|| format!("Invalid candidate pattern: {}", pattern))?;
        }

        if self.extraction.min_code_length > self.extraction.max_code_length {
            anyhow::bail!("min_code_length must not exceed max_code_length");
        }

        if self.aws.recognition.frame_interval <= 0.0 {
            anyhow::bail!("frame_interval must be positive");
        }

        Region::new(self.aws.region.clone());

        Ok(())
    }

    /// The scan pipeline needs AWS; the offline extract path does not
    pub fn require_s3_bucket(&self) -> Result<()> {
        if self.aws.s3_bucket.is_empty() {
            anyhow::bail!(
                "AWS S3 bucket must be configured for scanning (run `codescout config`)"
            );
        }
        Ok(())
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  AWS Region: {}", self.aws.region);
        println!("  S3 Bucket: {}", self.aws.s3_bucket);
        if let Some(prefix) = &self.aws.s3_key_prefix {
            println!("  S3 Prefix: {}", prefix);
        }
        println!("  Frame Recognition: {}", self.aws.recognition.enabled);
        println!("  Frame Interval: {}s", self.aws.recognition.frame_interval);
        println!("  Candidate Patterns: {}", self.extraction.patterns.len());
        println!("  Deny List Entries: {}", self.extraction.deny_list.len());
        println!(
            "  Trigger Words: {}",
            self.extraction.trigger_words.join(", ")
        );
        println!("  Keep Media: {}", self.app.keep_media);
        println!("  Default Format: {}", self.app.default_output_format);
    }

    /// Interactive configuration setup
    pub async fn interactive_setup(&self) -> Result<()> {
        println!("Interactive configuration setup coming soon!");
        println!("For now, please edit the config file manually:");
        println!("  {}", Self::config_path()?.display());
        Ok(())
    }

    /// Get AWS region
    pub fn aws_region(&self) -> Region {
        Region::new(self.aws.region.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn default_config_needs_bucket_for_scanning() {
        let config = Config::default();
        assert!(config.require_s3_bucket().is_err());
    }

    #[test]
    fn bad_pattern_fails_validation() {
        let mut config = Config::default();
        config.extraction.patterns = vec!["[unclosed".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_round_trips_through_yaml() {
        let config = Config::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.aws.region, config.aws.region);
        assert_eq!(parsed.extraction.patterns, config.extraction.patterns);
        assert_eq!(
            parsed.extraction.trigger_words,
            config.extraction.trigger_words
        );
    }
}
