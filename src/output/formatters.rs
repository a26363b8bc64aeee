use anyhow::{Context, Result};

use crate::extract::ExtractionResult;
use crate::utils::format_timestamp;

/// Human-readable candidate list
pub fn format_as_text(result: &ExtractionResult) -> String {
    let mut out = String::new();

    if result.is_empty() {
        out.push_str("No voucher code candidates found.\n");
    } else {
        out.push_str(&format!(
            "Found {} voucher code candidate{}:\n\n",
            result.len(),
            if result.len() == 1 { "" } else { "s" }
        ));

        for (i, candidate) in result.candidates.iter().enumerate() {
            let seen_at = candidate
                .timestamp
                .map(|t| format!(" @ {}", format_timestamp(t)))
                .unwrap_or_default();
            let trigger = if candidate.near_trigger {
                ", near trigger word"
            } else {
                ""
            };

            out.push_str(&format!(
                "{:>3}. {:<20} confidence {:.2}  first seen in {}{}  ({} segment{}{})\n",
                i + 1,
                candidate.code,
                candidate.confidence,
                candidate.source.as_str(),
                seen_at,
                candidate.corroborations,
                if candidate.corroborations == 1 { "" } else { "s" },
                trigger,
            ));
        }
    }

    if result.skipped_segments > 0 {
        out.push_str(&format!(
            "\n({} empty segment{} skipped)\n",
            result.skipped_segments,
            if result.skipped_segments == 1 { "" } else { "s" }
        ));
    }

    out
}

/// JSON with full candidate metadata
pub fn format_as_json(result: &ExtractionResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("Failed to serialize result as JSON")
}

/// CSV, one candidate per row
pub fn format_as_csv(result: &ExtractionResult) -> String {
    let mut out =
        String::from("code,normalized,confidence,source,timestamp,corroborations,near_trigger\n");

    for candidate in &result.candidates {
        out.push_str(&format!(
            "{},{},{:.2},{},{},{},{}\n",
            candidate.code,
            candidate.normalized,
            candidate.confidence,
            candidate.source.as_str(),
            candidate
                .timestamp
                .map(|t| format!("{:.1}", t))
                .unwrap_or_default(),
            candidate.corroborations,
            candidate.near_trigger,
        ));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{extract_codes, ExtractionConfig, TextSegment};

    fn sample_result() -> ExtractionResult {
        let segments = vec![
            TextSegment::transcript("Use code SAVE20 at the store", Some(5.0)),
            TextSegment::frame("SAVE20", Some(5.0)),
        ];
        extract_codes(&ExtractionConfig::default(), &segments)
    }

    #[test]
    fn text_format_lists_candidates() {
        let text = format_as_text(&sample_result());
        assert!(text.contains("SAVE20"));
        assert!(text.contains("confidence"));
    }

    #[test]
    fn text_format_handles_empty_result() {
        let text = format_as_text(&ExtractionResult::default());
        assert!(text.contains("No voucher code candidates"));
    }

    #[test]
    fn json_format_round_trips() {
        let json = format_as_json(&sample_result()).unwrap();
        let parsed: ExtractionResult = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed.candidates[0].code, "SAVE20");
    }

    #[test]
    fn csv_format_has_header_and_rows() {
        let csv = format_as_csv(&sample_result());
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("code,normalized"));
        assert!(lines[1].starts_with("SAVE20,SAVE20"));
    }
}
