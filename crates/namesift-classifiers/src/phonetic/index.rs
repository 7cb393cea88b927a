//! Code→candidates index over the dictionary store
//!
//! Built once at startup and read-only afterwards, so it is shared across
//! concurrent cascades without locking.

use namesift_core::phonetic::{generate_codes, PhoneticAlgorithm};
use namesift_core::{normalize, Ethnicity};
use namesift_dictionary::DictionaryStore;
use std::collections::HashMap;
use tracing::debug;

/// A dictionary name reachable through the phonetic index
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Dictionary entry name
    pub name: String,
    /// The entry's phonetic key, used for string-distance comparison
    pub key: String,
    pub ethnicity: Ethnicity,
    /// The entry's stored confidence
    pub confidence: f64,
}

/// `algorithm → code → candidates` lookup structure
pub struct PhoneticIndex {
    by_algorithm: HashMap<PhoneticAlgorithm, HashMap<String, Vec<Candidate>>>,
    all: Vec<Candidate>,
}

impl PhoneticIndex {
    /// Build the index from every dictionary entry.
    ///
    /// Entry names pass through the same normalizer as classified input, so
    /// "van der merwe" is indexed under the codes of "merwe" exactly as a
    /// query for it would be.
    pub fn build(store: &DictionaryStore) -> Self {
        let mut by_algorithm: HashMap<PhoneticAlgorithm, HashMap<String, Vec<Candidate>>> =
            PhoneticAlgorithm::ALL
                .iter()
                .map(|a| (*a, HashMap::new()))
                .collect();
        let mut all = Vec::new();

        for entry in store.iter_entries() {
            let Ok(normalized) = normalize(&entry.name) else {
                continue;
            };
            let candidate = Candidate {
                name: entry.name.clone(),
                key: normalized.phonetic_key.clone(),
                ethnicity: entry.ethnicity,
                confidence: entry.confidence,
            };

            for (algorithm, code) in generate_codes(&normalized.phonetic_key) {
                by_algorithm
                    .get_mut(&algorithm)
                    .expect("all algorithms pre-seeded")
                    .entry(code)
                    .or_default()
                    .push(candidate.clone());
            }
            all.push(candidate);
        }

        debug!(entries = all.len(), "phonetic index built");
        Self { by_algorithm, all }
    }

    /// Candidates sharing a code under one algorithm
    pub fn candidates(&self, algorithm: PhoneticAlgorithm, code: &str) -> &[Candidate] {
        self.by_algorithm
            .get(&algorithm)
            .and_then(|codes| codes.get(code))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every indexed candidate, for the distance-based fallback scan
    pub fn all_candidates(&self) -> &[Candidate] {
        &self.all
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use namesift_core::phonetic::encode;

    #[test]
    fn index_covers_every_entry_under_every_algorithm() {
        let store = DictionaryStore::builtin();
        let index = PhoneticIndex::build(&store);

        assert_eq!(index.all_candidates().len(), store.len());

        let code = encode(PhoneticAlgorithm::Refined, "naidoo");
        let hits = index.candidates(PhoneticAlgorithm::Refined, &code);
        assert!(hits.iter().any(|c| c.name == "naidoo"));
    }

    #[test]
    fn unknown_code_yields_no_candidates() {
        let store = DictionaryStore::builtin();
        let index = PhoneticIndex::build(&store);
        assert!(index.candidates(PhoneticAlgorithm::Consonant, "zzzz").is_empty());
    }
}
