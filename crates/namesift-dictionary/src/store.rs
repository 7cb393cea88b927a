//! Immutable dictionary store
//!
//! Loaded once at startup and shared read-only (`Arc<DictionaryStore>`)
//! across every classifier; there is no interior mutability, so no locking.

use crate::entry::NameEntry;
use namesift_core::{Error, Ethnicity, Result};
use rand::seq::SliceRandom;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::info;

/// Confidence assigned by the month-surname heuristic, independent of the
/// general dictionaries
pub const MONTH_SURNAME_CONFIDENCE: f64 = 0.90;

/// Calendar-month surnames common in Cape Coloured naming history
const MONTH_SURNAMES: &[&str] = &[
    "january", "february", "march", "april", "may", "june", "july", "august",
    "september", "october", "november", "december",
];

/// On-disk dictionary asset format
#[derive(Debug, Deserialize)]
struct DictionaryFile {
    #[allow(dead_code)]
    #[serde(default)]
    version: u32,
    names: Vec<NameEntry>,
}

/// Immutable, process-wide name dictionary.
///
/// One map per concrete ethnicity, held in the fixed priority order
/// (African, Indian, Cape Malay, Coloured, White). The order breaks exact
/// confidence ties during lookup so results are deterministic.
pub struct DictionaryStore {
    maps: Vec<(Ethnicity, HashMap<String, NameEntry>)>,
    month_surnames: HashSet<&'static str>,
    total_entries: usize,
}

impl DictionaryStore {
    /// Build a store from a flat list of entries
    pub fn from_entries(entries: Vec<NameEntry>) -> Self {
        let mut maps: Vec<(Ethnicity, HashMap<String, NameEntry>)> = Ethnicity::PRIORITY_ORDER
            .iter()
            .map(|e| (*e, HashMap::new()))
            .collect();

        let mut total = 0usize;
        for entry in entries {
            if entry.ethnicity == Ethnicity::Unknown {
                continue;
            }
            let key = entry.name.to_lowercase();
            if let Some((_, map)) = maps.iter_mut().find(|(e, _)| *e == entry.ethnicity) {
                map.insert(key, entry);
                total += 1;
            }
        }

        let store = Self {
            maps,
            month_surnames: MONTH_SURNAMES.iter().copied().collect(),
            total_entries: total,
        };

        info!(
            entries = store.total_entries,
            african = store.count_for(Ethnicity::African),
            indian = store.count_for(Ethnicity::Indian),
            cape_malay = store.count_for(Ethnicity::CapeMalay),
            coloured = store.count_for(Ethnicity::Coloured),
            white = store.count_for(Ethnicity::White),
            "dictionary store loaded"
        );

        store
    }

    /// Parse a YAML dictionary asset
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let file: DictionaryFile = serde_yaml::from_str(yaml)
            .map_err(|e| Error::config(format!("failed to parse dictionary asset: {}", e)))?;
        Ok(Self::from_entries(file.names))
    }

    /// Load a YAML dictionary asset from disk
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let yaml = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&yaml)
    }

    /// The embedded seed asset: a small versioned snapshot of the external
    /// dictionary data, enough for tests and few-shot sampling
    pub fn builtin() -> Self {
        Self::from_yaml_str(include_str!("../data/seed_names.yaml"))
            .expect("embedded seed dictionary is well-formed")
    }

    /// Look up a lower-cased name across all dictionaries.
    ///
    /// The entry with the highest stored confidence wins; exact confidence
    /// ties are broken by the fixed priority order (African, Indian,
    /// Cape Malay, Coloured, White).
    pub fn lookup(&self, name: &str) -> Option<&NameEntry> {
        let mut best: Option<&NameEntry> = None;
        for (_, map) in &self.maps {
            if let Some(entry) = map.get(name) {
                match best {
                    // Strictly-greater keeps the earlier dictionary on ties
                    Some(b) if entry.confidence > b.confidence => best = Some(entry),
                    None => best = Some(entry),
                    _ => {}
                }
            }
        }
        best
    }

    /// Whether a surname belongs to the fixed month set
    pub fn is_month_surname(&self, name: &str) -> bool {
        self.month_surnames.contains(name)
    }

    /// Sample up to `n` labelled (name, ethnicity) pairs for few-shot prompts
    pub fn few_shot_examples(&self, n: usize) -> Vec<(String, Ethnicity)> {
        let mut pool: Vec<(String, Ethnicity)> = self
            .iter_entries()
            .map(|e| (e.name.clone(), e.ethnicity))
            .collect();
        pool.shuffle(&mut rand::thread_rng());
        pool.truncate(n);
        pool
    }

    /// Iterate every entry across all dictionaries, in priority order
    pub fn iter_entries(&self) -> impl Iterator<Item = &NameEntry> {
        self.maps.iter().flat_map(|(_, map)| map.values())
    }

    /// Number of entries for one ethnicity
    pub fn count_for(&self, ethnicity: Ethnicity) -> usize {
        self.maps
            .iter()
            .find(|(e, _)| *e == ethnicity)
            .map(|(_, m)| m.len())
            .unwrap_or(0)
    }

    /// Total number of entries
    pub fn len(&self) -> usize {
        self.total_entries
    }

    pub fn is_empty(&self) -> bool {
        self.total_entries == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(entries: Vec<NameEntry>) -> DictionaryStore {
        DictionaryStore::from_entries(entries)
    }

    #[test]
    fn lookup_finds_entries_across_dictionaries() {
        let store = store_with(vec![
            NameEntry::new("dlamini", Ethnicity::African, 0.95),
            NameEntry::new("naidoo", Ethnicity::Indian, 0.97),
        ]);

        assert_eq!(store.lookup("dlamini").unwrap().ethnicity, Ethnicity::African);
        assert_eq!(store.lookup("naidoo").unwrap().ethnicity, Ethnicity::Indian);
        assert!(store.lookup("missing").is_none());
    }

    #[test]
    fn highest_confidence_wins_across_dictionaries() {
        let store = store_with(vec![
            NameEntry::new("adams", Ethnicity::CapeMalay, 0.70),
            NameEntry::new("adams", Ethnicity::Coloured, 0.85),
        ]);

        assert_eq!(store.lookup("adams").unwrap().ethnicity, Ethnicity::Coloured);
    }

    #[test]
    fn exact_ties_break_by_priority_order() {
        // Identical confidence: African precedes White in the priority order
        let store = store_with(vec![
            NameEntry::new("paulse", Ethnicity::White, 0.80),
            NameEntry::new("paulse", Ethnicity::African, 0.80),
        ]);

        assert_eq!(store.lookup("paulse").unwrap().ethnicity, Ethnicity::African);
    }

    #[test]
    fn month_surnames_are_a_fixed_set() {
        let store = store_with(vec![]);
        assert!(store.is_month_surname("september"));
        assert!(store.is_month_surname("april"));
        assert!(store.is_month_surname("october"));
        assert!(!store.is_month_surname("merwe"));
    }

    #[test]
    fn builtin_seed_loads_and_covers_every_category() {
        let store = DictionaryStore::builtin();
        assert!(!store.is_empty());
        for ethnicity in Ethnicity::PRIORITY_ORDER {
            assert!(store.count_for(ethnicity) > 0, "no entries for {}", ethnicity);
        }
    }

    #[test]
    fn few_shot_sampling_is_bounded() {
        let store = DictionaryStore::builtin();
        let examples = store.few_shot_examples(5);
        assert_eq!(examples.len(), 5);
        let all = store.few_shot_examples(usize::MAX);
        assert_eq!(all.len(), store.len());
    }

    #[test]
    fn unknown_entries_are_dropped_on_load() {
        let store = store_with(vec![NameEntry::new("whoever", Ethnicity::Unknown, 0.9)]);
        assert!(store.is_empty());
    }
}
