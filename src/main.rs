use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use code_scout::cli::{Cli, Commands, SourceTag};
use code_scout::config::Config;
use code_scout::extract::{extract_codes, TextSegment};
use code_scout::pipeline::{ScanOptions, ScanPipeline};
use code_scout::{extractors, output, utils};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "codescout=debug"
    } else {
        "codescout=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().await?;

    match cli.command {
        Commands::Scan {
            url,
            output,
            format,
            language,
            no_frames,
            frame_interval,
            min_confidence,
            keep_media,
        } => {
            // External tools are needed for the scan path only
            let missing_deps = utils::check_dependencies().await;
            if !missing_deps.is_empty() {
                eprintln!("⚠️  Dependency check warnings:");
                for dep in missing_deps {
                    eprintln!("   • {}", dep);
                }
            }

            let min_confidence = min_confidence.unwrap_or(config.app.min_confidence);
            let options = ScanOptions {
                language: language.map(|l| utils::normalize_language_code(&l)),
                frames: if no_frames { Some(false) } else { None },
                frame_interval,
                keep_media,
            };

            let pipeline = ScanPipeline::new(config).await?;

            tracing::info!("Starting scan for: {}", url);
            let report = pipeline.scan(&url, &options).await?;

            tracing::info!(
                "Scanned {} transcript and {} frame segments",
                report.transcript_segments,
                report.frame_segments
            );

            let result = report.result.with_min_confidence(min_confidence);
            match output {
                Some(path) => {
                    output::save_to_file(&result, &path, &format)?;
                    println!("Results saved to: {}", path.display());
                }
                None => {
                    output::print_to_console(&result, &format)?;
                }
            }

            for path in report.kept_media {
                println!("Media saved to: {}", path.display());
            }
        }
        Commands::Extract {
            input,
            source,
            output,
            format,
            min_confidence,
        } => {
            let text = read_input(&input)?;

            // Each non-empty line becomes one segment
            let segments: Vec<TextSegment> = text
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(|line| match source {
                    SourceTag::Transcript => TextSegment::transcript(line, None),
                    SourceTag::Frame => TextSegment::frame(line, None),
                })
                .collect();

            let min_confidence = min_confidence.unwrap_or(config.app.min_confidence);
            let result =
                extract_codes(&config.extraction, &segments).with_min_confidence(min_confidence);

            match output {
                Some(path) => {
                    output::save_to_file(&result, &path, &format)?;
                    println!("Results saved to: {}", path.display());
                }
                None => {
                    output::print_to_console(&result, &format)?;
                }
            }
        }
        Commands::Config { show } => {
            if show {
                config.display();
            } else {
                config.interactive_setup().await?;
            }
        }
        Commands::Sources => {
            let registry = extractors::ExtractorRegistry::new();
            println!("Supported media sources:");
            for source in registry.list_sources() {
                println!("  • {}", source);
            }
        }
    }

    Ok(())
}

fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        use std::io::Read;
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs_err::read_to_string(input)?)
    }
}
