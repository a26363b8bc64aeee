use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Where a piece of text came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentSource {
    /// Speech-to-text output from the audio track
    Transcript,
    /// On-screen text recognized in a sampled video frame
    Frame,
}

impl SegmentSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            SegmentSource::Transcript => "transcript",
            SegmentSource::Frame => "frame",
        }
    }
}

/// A unit of input text with provenance, produced by a collaborator
/// (transcription or frame recognition) and immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextSegment {
    /// The raw text
    pub text: String,

    /// Which collaborator produced it
    pub source: SegmentSource,

    /// Seconds from video start, if known
    pub timestamp: Option<f64>,
}

impl TextSegment {
    pub fn transcript(text: impl Into<String>, timestamp: Option<f64>) -> Self {
        Self {
            text: text.into(),
            source: SegmentSource::Transcript,
            timestamp,
        }
    }

    pub fn frame(text: impl Into<String>, timestamp: Option<f64>) -> Self {
        Self {
            text: text.into(),
            source: SegmentSource::Frame,
            timestamp,
        }
    }
}

/// A token suspected of being a voucher code
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeCandidate {
    /// Surface form as first seen (hyphens preserved)
    pub code: String,

    /// Canonical key: uppercased, hyphens stripped
    pub normalized: String,

    /// Confidence score in [0, 1]
    pub confidence: f64,

    /// Source of the first sighting
    pub source: SegmentSource,

    /// Timestamp of the first sighting, if the segment carried one
    pub timestamp: Option<f64>,

    /// Number of distinct segments the key appeared in
    pub corroborations: usize,

    /// Distinct sources the key was seen in
    pub sources: Vec<SegmentSource>,

    /// Whether a trigger word was found near any occurrence
    pub near_trigger: bool,
}

/// Ranked, deduplicated extraction output
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Candidates sorted by confidence descending, ties by first occurrence
    pub candidates: Vec<CodeCandidate>,

    /// Segments skipped because they carried no text
    pub skipped_segments: usize,
}

impl ExtractionResult {
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Drop candidates below a confidence floor, keeping order
    pub fn with_min_confidence(mut self, min: f64) -> Self {
        self.candidates.retain(|c| c.confidence >= min);
        self
    }
}

/// Tunable knobs for the extractor. Passed in explicitly so the extractor
/// stays a pure function of its input.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Candidate token patterns, tried in order; overlapping later matches
    /// are discarded
    pub patterns: Vec<String>,

    /// Dictionary words and known non-code terms to reject (case-insensitive,
    /// compared against the normalized key)
    pub deny_list: Vec<String>,

    /// Words that raise confidence when found near a candidate
    pub trigger_words: Vec<String>,

    /// Maximum word distance between a candidate and a trigger word
    pub trigger_window: usize,

    /// Bounds on the normalized key length
    pub min_code_length: usize,
    pub max_code_length: usize,

    /// Accept tokens made up entirely of digits
    pub allow_numeric: bool,

    /// Confidence for a single uncorroborated occurrence
    pub base_confidence: f64,

    /// Added per additional distinct corroborating segment
    pub corroboration_bonus: f64,

    /// Added when a trigger word is within the window
    pub trigger_bonus: f64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            patterns: vec![
                // Hyphen-grouped codes, e.g. Amazon's XXXX-XXXX-XXXX shape
                r"\b[A-Z0-9]{2,6}(?:-[A-Z0-9]{2,6}){1,4}\b".to_string(),
                // Plain runs of uppercase letters and digits
                r"\b[A-Z0-9]{6,16}\b".to_string(),
            ],
            deny_list: vec![
                "subscribe".into(),
                "youtube".into(),
                "checkout".into(),
                "discount".into(),
                "voucher".into(),
                "coupon".into(),
                "official".into(),
                "limited".into(),
                "exclusive".into(),
                "giveaway".into(),
                "shipping".into(),
                "special".into(),
                "channel".into(),
                "comment".into(),
                "description".into(),
            ],
            trigger_words: vec![
                "code".into(),
                "voucher".into(),
                "coupon".into(),
                "promo".into(),
            ],
            trigger_window: 3,
            min_code_length: 6,
            max_code_length: 16,
            allow_numeric: false,
            base_confidence: 0.5,
            corroboration_bonus: 0.2,
            trigger_bonus: 0.1,
        }
    }
}

/// Normalize a token to its canonical key: uppercase, hyphens stripped.
pub fn normalize_token(token: &str) -> String {
    token
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Running state for one normalized key while scanning segments
struct CandidateGroup {
    surface: String,
    segments: BTreeSet<usize>,
    sources: BTreeSet<SegmentSource>,
    first_source: SegmentSource,
    first_timestamp: Option<f64>,
    near_trigger: bool,
}

/// Scan segments for voucher-code candidates.
///
/// Single pass, no side effects, idempotent. Empty input yields an empty
/// result; segments with no text are skipped and counted, never fatal.
pub fn extract_codes(config: &ExtractionConfig, segments: &[TextSegment]) -> ExtractionResult {
    let patterns: Vec<Regex> = config
        .patterns
        .iter()
        .filter_map(|p| match Regex::new(p) {
            Ok(re) => Some(re),
            Err(e) => {
                tracing::warn!("Skipping invalid candidate pattern {:?}: {}", p, e);
                None
            }
        })
        .collect();

    let deny: BTreeSet<String> = config.deny_list.iter().map(|w| w.to_lowercase()).collect();
    let triggers: BTreeSet<String> = config
        .trigger_words
        .iter()
        .map(|w| w.to_lowercase())
        .collect();

    let mut groups: HashMap<String, CandidateGroup> = HashMap::new();
    let mut order: Vec<String> = Vec::new();
    let mut skipped_segments = 0usize;

    for (seg_idx, segment) in segments.iter().enumerate() {
        if segment.text.trim().is_empty() {
            skipped_segments += 1;
            continue;
        }

        let trigger_positions = trigger_word_positions(&segment.text, &triggers);
        // Byte ranges already claimed by an earlier pattern in this segment
        let mut claimed: Vec<(usize, usize)> = Vec::new();

        for pattern in &patterns {
            for m in pattern.find_iter(&segment.text) {
                if claimed.iter().any(|&(s, e)| m.start() < e && m.end() > s) {
                    continue;
                }

                let surface = m.as_str();
                let key = normalize_token(surface);

                if key.len() < config.min_code_length || key.len() > config.max_code_length {
                    continue;
                }
                if !config.allow_numeric && key.chars().all(|c| c.is_ascii_digit()) {
                    continue;
                }
                if deny.contains(&key.to_lowercase()) {
                    continue;
                }

                claimed.push((m.start(), m.end()));

                let word_idx = segment.text[..m.start()].split_whitespace().count();
                let near_trigger = trigger_positions
                    .iter()
                    .any(|&t| word_idx.abs_diff(t) <= config.trigger_window);

                let group = groups.entry(key.clone()).or_insert_with(|| {
                    order.push(key.clone());
                    CandidateGroup {
                        surface: surface.to_string(),
                        segments: BTreeSet::new(),
                        sources: BTreeSet::new(),
                        first_source: segment.source,
                        first_timestamp: segment.timestamp,
                        near_trigger: false,
                    }
                });

                group.segments.insert(seg_idx);
                group.sources.insert(segment.source);
                group.near_trigger |= near_trigger;
            }
        }
    }

    let mut candidates: Vec<CodeCandidate> = order
        .iter()
        .map(|key| {
            let g = &groups[key];
            CodeCandidate {
                code: g.surface.clone(),
                normalized: key.clone(),
                confidence: score(config, g),
                source: g.first_source,
                timestamp: g.first_timestamp,
                corroborations: g.segments.len(),
                sources: g.sources.iter().copied().collect(),
                near_trigger: g.near_trigger,
            }
        })
        .collect();

    // Stable sort keeps first-occurrence order within equal confidence,
    // since `order` is already first-seen order
    candidates.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    ExtractionResult {
        candidates,
        skipped_segments,
    }
}

fn score(config: &ExtractionConfig, group: &CandidateGroup) -> f64 {
    let extra_segments = group.segments.len().saturating_sub(1);
    let mut confidence =
        config.base_confidence + config.corroboration_bonus * extra_segments as f64;
    confidence = confidence.min(1.0);
    if group.near_trigger {
        confidence += config.trigger_bonus;
    }
    confidence.clamp(0.0, 1.0)
}

/// Word indices (whitespace-delimited) of trigger words in a segment
fn trigger_word_positions(text: &str, triggers: &BTreeSet<String>) -> Vec<usize> {
    text.split_whitespace()
        .enumerate()
        .filter(|(_, word)| {
            let cleaned = word
                .trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase();
            triggers.contains(&cleaned)
        })
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> ExtractionConfig {
        ExtractionConfig::default()
    }

    #[test]
    fn empty_input_yields_empty_result() {
        let result = extract_codes(&cfg(), &[]);
        assert!(result.is_empty());
        assert_eq!(result.skipped_segments, 0);
    }

    #[test]
    fn dictionary_words_yield_nothing() {
        let segments = vec![TextSegment::transcript("hello world", Some(1.0))];
        let result = extract_codes(&cfg(), &segments);
        assert!(result.is_empty());
    }

    #[test]
    fn denied_uppercase_words_yield_nothing() {
        let segments = vec![TextSegment::frame("SUBSCRIBE CHECKOUT DISCOUNT", Some(4.0))];
        let result = extract_codes(&cfg(), &segments);
        assert!(result.is_empty());
    }

    #[test]
    fn trigger_word_boosts_confidence() {
        let segments = vec![TextSegment::transcript("Use code SAVE20 at checkout", None)];
        let result = extract_codes(&cfg(), &segments);
        assert_eq!(result.len(), 1);
        let candidate = &result.candidates[0];
        assert_eq!(candidate.code, "SAVE20");
        assert!(candidate.near_trigger);
        assert!(candidate.confidence >= 0.5);
        assert!((candidate.confidence - 0.6).abs() < 1e-9);
    }

    #[test]
    fn corroboration_across_sources_boosts_confidence() {
        let segments = vec![
            TextSegment::transcript("promo XJ7KQ2M", Some(12.0)),
            TextSegment::frame("XJ7KQ2M", Some(12.0)),
        ];
        let result = extract_codes(&cfg(), &segments);
        assert_eq!(result.len(), 1);
        let candidate = &result.candidates[0];
        assert_eq!(candidate.normalized, "XJ7KQ2M");
        assert_eq!(candidate.corroborations, 2);
        assert_eq!(
            candidate.sources,
            vec![SegmentSource::Transcript, SegmentSource::Frame]
        );
        assert!(candidate.confidence >= 0.7);
    }

    #[test]
    fn hyphenated_codes_normalize_and_dedupe() {
        let segments = vec![
            TextSegment::frame("A1B2-C3D4-E5F6", Some(3.0)),
            TextSegment::transcript("your voucher A1B2C3D4E5F6", Some(8.0)),
        ];
        let result = extract_codes(&cfg(), &segments);
        assert_eq!(result.len(), 1);
        let candidate = &result.candidates[0];
        assert_eq!(candidate.normalized, "A1B2C3D4E5F6");
        assert_eq!(candidate.code, "A1B2-C3D4-E5F6");
        assert_eq!(candidate.corroborations, 2);
    }

    #[test]
    fn no_duplicate_normalized_keys() {
        let segments = vec![
            TextSegment::transcript("code SAVE20 SAVE20 again SAVE-20", None),
            TextSegment::frame("SAVE20 GET50OFF", None),
            TextSegment::frame("GET50OFF", None),
        ];
        let result = extract_codes(&cfg(), &segments);
        let mut keys: Vec<&str> = result
            .candidates
            .iter()
            .map(|c| c.normalized.as_str())
            .collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), result.len());
    }

    #[test]
    fn sorted_by_confidence_then_first_seen() {
        let segments = vec![
            TextSegment::transcript("first AAAA11 then BBBB22", None),
            TextSegment::frame("BBBB22", None),
        ];
        let result = extract_codes(&cfg(), &segments);
        assert_eq!(result.len(), 2);
        // BBBB22 corroborated twice, ranks above the earlier-seen AAAA11
        assert_eq!(result.candidates[0].normalized, "BBBB22");
        assert_eq!(result.candidates[1].normalized, "AAAA11");
        assert!(result
            .candidates
            .windows(2)
            .all(|w| w[0].confidence >= w[1].confidence));
    }

    #[test]
    fn equal_confidence_keeps_first_seen_order() {
        let segments = vec![TextSegment::transcript("ZZTOP99 and AAAA11", None)];
        let result = extract_codes(&cfg(), &segments);
        assert_eq!(result.len(), 2);
        assert_eq!(result.candidates[0].normalized, "ZZTOP99");
        assert_eq!(result.candidates[1].normalized, "AAAA11");
    }

    #[test]
    fn extraction_is_idempotent() {
        let segments = vec![
            TextSegment::transcript("Use code SAVE20 now", Some(5.0)),
            TextSegment::frame("SAVE20 XJ7KQ2M", Some(5.0)),
        ];
        let first = extract_codes(&cfg(), &segments);
        let second = extract_codes(&cfg(), &segments);
        assert_eq!(first.len(), second.len());
        for (a, b) in first.candidates.iter().zip(second.candidates.iter()) {
            assert_eq!(a.normalized, b.normalized);
            assert_eq!(a.confidence, b.confidence);
        }
    }

    #[test]
    fn empty_segments_are_skipped_and_counted() {
        let segments = vec![
            TextSegment::transcript("", None),
            TextSegment::frame("   ", Some(2.0)),
            TextSegment::transcript("promo WINBIG7 today", Some(9.0)),
        ];
        let result = extract_codes(&cfg(), &segments);
        assert_eq!(result.skipped_segments, 2);
        assert_eq!(result.len(), 1);
        assert_eq!(result.candidates[0].normalized, "WINBIG7");
    }

    #[test]
    fn all_digit_tokens_rejected_by_default() {
        let segments = vec![TextSegment::transcript("call 18005551234 now", None)];
        let result = extract_codes(&cfg(), &segments);
        assert!(result.is_empty());

        let mut numeric_cfg = cfg();
        numeric_cfg.allow_numeric = true;
        let result = extract_codes(&numeric_cfg, &segments);
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn length_bounds_apply_to_normalized_key() {
        let segments = vec![TextSegment::transcript("AB1 TOOLONGTOBEACODE12345", None)];
        let result = extract_codes(&cfg(), &segments);
        assert!(result.is_empty());
    }

    #[test]
    fn trigger_outside_window_does_not_boost() {
        let segments = vec![TextSegment::transcript(
            "code is mentioned way before the token QX9ZR4T appears",
            None,
        )];
        let result = extract_codes(&cfg(), &segments);
        assert_eq!(result.len(), 1);
        assert!(!result.candidates[0].near_trigger);
        assert!((result.candidates[0].confidence - 0.5).abs() < 1e-9);
    }

    #[test]
    fn confidence_never_exceeds_one() {
        let segments: Vec<TextSegment> = (0..8)
            .map(|i| TextSegment::transcript("promo code MEGA50X", Some(i as f64)))
            .collect();
        let result = extract_codes(&cfg(), &segments);
        assert_eq!(result.len(), 1);
        assert!(result.candidates[0].confidence <= 1.0);
        assert_eq!(result.candidates[0].corroborations, 8);
    }

    #[test]
    fn first_sighting_metadata_is_kept() {
        let segments = vec![
            TextSegment::frame("XJ7KQ2M", Some(14.0)),
            TextSegment::transcript("promo XJ7KQ2M", Some(30.0)),
        ];
        let result = extract_codes(&cfg(), &segments);
        let candidate = &result.candidates[0];
        assert_eq!(candidate.source, SegmentSource::Frame);
        assert_eq!(candidate.timestamp, Some(14.0));
    }
}
