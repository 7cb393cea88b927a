//! Phonetic classifier: multi-algorithm code matching with a
//! string-distance fallback

pub mod index;

pub use index::{Candidate, PhoneticIndex};

use crate::classifier::NameClassifier;
use async_trait::async_trait;
use namesift_core::phonetic::{generate_codes, PhoneticAlgorithm};
use namesift_core::{
    Classification, ClassificationMethod, MethodDetail, NormalizedName, Result,
};
use namesift_dictionary::DictionaryStore;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Reliability weight applied to a phonetic match's dictionary confidence
pub const PHONETIC_WEIGHT: f64 = 0.70;

/// Confidence bonus per additional agreeing algorithm
const AGREEMENT_BONUS: f64 = 0.05;

/// Phonetic confidence never reaches dictionary-exact territory
const PHONETIC_CONFIDENCE_CAP: f64 = 0.95;

/// Minimum Jaro-Winkler similarity for the distance fallback
pub const SIMILARITY_THRESHOLD: f64 = 0.85;

struct Vote<'a> {
    candidate: &'a Candidate,
    agreements: usize,
    algorithm: PhoneticAlgorithm,
    code: String,
}

/// Fuzzy matcher over the dictionary: four independent phonetic encodings
/// voting through a prebuilt code index, with a Jaro-Winkler scan as the
/// final, non-code-based strategy.
pub struct PhoneticClassifier {
    index: PhoneticIndex,
}

impl PhoneticClassifier {
    pub fn new(dictionaries: Arc<DictionaryStore>) -> Self {
        Self {
            index: PhoneticIndex::build(&dictionaries),
        }
    }

    /// Phonetic codes for a name, one per algorithm that could encode it
    pub fn generate_codes(&self, name: &str) -> HashMap<PhoneticAlgorithm, String> {
        generate_codes(name)
    }

    /// Confidence for a code match: entry confidence scaled by the method
    /// weight, raised monotonically with each additional agreeing algorithm
    fn code_confidence(entry_confidence: f64, agreements: usize) -> f64 {
        let base = entry_confidence * PHONETIC_WEIGHT;
        (base + AGREEMENT_BONUS * agreements.saturating_sub(1) as f64)
            .min(PHONETIC_CONFIDENCE_CAP)
    }

    fn best_code_match(&self, name: &NormalizedName) -> Option<Vote<'_>> {
        let codes = generate_codes(&name.phonetic_key);
        if codes.is_empty() {
            return None;
        }

        // candidate name -> accumulated vote
        let mut votes: HashMap<&str, Vote<'_>> = HashMap::new();
        for (algorithm, code) in &codes {
            for candidate in self.index.candidates(*algorithm, code) {
                votes
                    .entry(candidate.name.as_str())
                    .and_modify(|v| v.agreements += 1)
                    .or_insert(Vote {
                        candidate,
                        agreements: 1,
                        algorithm: *algorithm,
                        code: code.clone(),
                    });
            }
        }

        votes.into_values().max_by(|a, b| {
            let ca = Self::code_confidence(a.candidate.confidence, a.agreements);
            let cb = Self::code_confidence(b.candidate.confidence, b.agreements);
            ca.partial_cmp(&cb)
                .unwrap_or(std::cmp::Ordering::Equal)
                // Deterministic winner when scores tie
                .then_with(|| a.candidate.name.cmp(&b.candidate.name))
        })
    }

    fn best_similarity_match(&self, name: &NormalizedName) -> Option<(&Candidate, f64)> {
        self.index
            .all_candidates()
            .iter()
            .map(|c| (c, strsim::jaro_winkler(&name.phonetic_key, &c.key)))
            .filter(|(_, s)| *s >= SIMILARITY_THRESHOLD)
            .max_by(|(a, sa), (b, sb)| {
                sa.partial_cmp(sb)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.name.cmp(&b.name))
            })
    }
}

#[async_trait]
impl NameClassifier for PhoneticClassifier {
    async fn classify(&self, name: &NormalizedName) -> Result<Option<Classification>> {
        if let Some(vote) = self.best_code_match(name) {
            let confidence = Self::code_confidence(vote.candidate.confidence, vote.agreements);
            debug!(
                name = %name.literal,
                matched = %vote.candidate.name,
                agreements = vote.agreements,
                "phonetic code match"
            );
            return Ok(Some(
                Classification::new(
                    name.literal.clone(),
                    vote.candidate.ethnicity,
                    confidence,
                    ClassificationMethod::Phonetic,
                )
                .with_detail(MethodDetail::Phonetic {
                    algorithm: vote.algorithm.as_str().to_string(),
                    code: vote.code,
                    agreements: vote.agreements,
                    similarity: None,
                }),
            ));
        }

        if let Some((candidate, similarity)) = self.best_similarity_match(name) {
            let confidence =
                (candidate.confidence * PHONETIC_WEIGHT * similarity).min(PHONETIC_CONFIDENCE_CAP);
            debug!(
                name = %name.literal,
                matched = %candidate.name,
                similarity,
                "phonetic similarity match"
            );
            return Ok(Some(
                Classification::new(
                    name.literal.clone(),
                    candidate.ethnicity,
                    confidence,
                    ClassificationMethod::Phonetic,
                )
                .with_detail(MethodDetail::Phonetic {
                    algorithm: "jaro_winkler".to_string(),
                    code: String::new(),
                    agreements: 0,
                    similarity: Some(similarity),
                }),
            ));
        }

        Ok(None)
    }

    fn name(&self) -> &str {
        "phonetic"
    }

    fn method(&self) -> ClassificationMethod {
        ClassificationMethod::Phonetic
    }
}
