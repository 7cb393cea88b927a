//! Tolerant parsing of LLM classification responses
//!
//! Parsing never fails: unrecognizable text degrades to `Unknown` at a
//! reduced confidence, and a batch line missing from the response fills its
//! slot the same way instead of sinking the whole batch.

use namesift_core::Ethnicity;
use regex::Regex;
use std::sync::OnceLock;

/// Confidence assigned to every successfully parsed LLM classification.
/// Deliberately capped below top rule-based confidence.
pub const LLM_CONFIDENCE: f64 = 0.85;

/// Confidence when single-name response text is unrecognizable
pub const UNPARSED_CONFIDENCE: f64 = 0.60;

/// Confidence for batch slots the response simply skipped
pub const BATCH_MISS_CONFIDENCE: f64 = 0.50;

fn batch_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // `3. thandi gxowa: African` with tolerant spacing and punctuation
        Regex::new(r"(?m)^\s*(\d+)\s*[.)]\s*(?:[^:]*:)?\s*(.+?)\s*$").expect("static regex")
    })
}

/// Map a single-name response onto the taxonomy.
///
/// Tries the whole trimmed text, then its last line, then its last word, so
/// both bare answers and "The category is: White" phrasing parse.
pub fn parse_single(text: &str) -> (Ethnicity, f64) {
    let trimmed = text.trim();

    if let Some(ethnicity) = Ethnicity::parse_loose(trimmed) {
        return (ethnicity, LLM_CONFIDENCE);
    }

    if let Some(last_line) = trimmed.lines().last() {
        let candidate = last_line.rsplit(':').next().unwrap_or(last_line);
        if let Some(ethnicity) = Ethnicity::parse_loose(candidate) {
            return (ethnicity, LLM_CONFIDENCE);
        }
        // "Cape Malay" is two words; try the last one and two words
        let words: Vec<&str> = candidate.split_whitespace().collect();
        for take in [2usize, 1] {
            if words.len() >= take {
                let tail = words[words.len() - take..].join(" ");
                if let Some(ethnicity) = Ethnicity::parse_loose(&tail) {
                    return (ethnicity, LLM_CONFIDENCE);
                }
            }
        }
    }

    (Ethnicity::Unknown, UNPARSED_CONFIDENCE)
}

/// Parse a numbered `index. name: ethnicity` batch response.
///
/// Returns exactly `expected` slots. Indices present in the response fill
/// their slot; anything missing or unparseable becomes
/// `(Unknown, BATCH_MISS_CONFIDENCE)`.
pub fn parse_batch(text: &str, expected: usize) -> Vec<(Ethnicity, f64)> {
    let mut slots = vec![(Ethnicity::Unknown, BATCH_MISS_CONFIDENCE); expected];

    for captures in batch_line_re().captures_iter(text) {
        let Ok(index) = captures[1].parse::<usize>() else {
            continue;
        };
        if index == 0 || index > expected {
            continue;
        }
        let (ethnicity, confidence) = parse_single(&captures[2]);
        slots[index - 1] = (ethnicity, confidence);
    }

    slots
}
