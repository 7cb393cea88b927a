//! Rule-based classifier: exact and heuristic dictionary lookup

use crate::classifier::NameClassifier;
use async_trait::async_trait;
use namesift_core::{
    strip_punctuation, Classification, ClassificationMethod, Ethnicity, MethodDetail,
    NormalizedName, Result,
};
use namesift_dictionary::{DictionaryStore, NameEntry, MONTH_SURNAME_CONFIDENCE};
use std::sync::Arc;
use tracing::debug;

/// Exact dictionary lookup over single- and multi-word names.
///
/// Lookup order: the full literal name, then the month-surname heuristic on
/// the final part, then each individual part (and its punctuation-deleted
/// form). The first stage to produce a match wins; within the per-part stage
/// the entry with the highest stored confidence wins.
pub struct RuleBasedClassifier {
    dictionaries: Arc<DictionaryStore>,
}

impl RuleBasedClassifier {
    pub fn new(dictionaries: Arc<DictionaryStore>) -> Self {
        Self { dictionaries }
    }

    fn classification_from(&self, name: &NormalizedName, entry: &NameEntry) -> Classification {
        Classification::new(
            name.literal.clone(),
            entry.ethnicity,
            entry.confidence,
            ClassificationMethod::RuleBased,
        )
        .with_detail(MethodDetail::Dictionary {
            entry_name: entry.name.clone(),
            name_type: entry.name_type.as_str().to_string(),
            frequency: entry.frequency,
            linguistic_origin: entry.linguistic_origin.clone(),
        })
    }

    fn best_part_match(&self, name: &NormalizedName) -> Option<&NameEntry> {
        let mut best: Option<&NameEntry> = None;
        for part in &name.parts {
            let candidates = [
                self.dictionaries.lookup(part),
                self.dictionaries.lookup(&strip_punctuation(part)),
            ];
            for entry in candidates.into_iter().flatten() {
                match best {
                    Some(b) if entry.confidence > b.confidence => best = Some(entry),
                    None => best = Some(entry),
                    _ => {}
                }
            }
        }
        best
    }
}

#[async_trait]
impl NameClassifier for RuleBasedClassifier {
    async fn classify(&self, name: &NormalizedName) -> Result<Option<Classification>> {
        // Full literal name first ("van der merwe" matches as one entry)
        if let Some(entry) = self.dictionaries.lookup(&name.literal) {
            debug!(name = %name.literal, entry = %entry.name, "rule layer full-name match");
            return Ok(Some(self.classification_from(name, entry)));
        }

        // Month surnames resolve to Coloured independently of the dictionaries
        let surname = strip_punctuation(name.last_part());
        if self.dictionaries.is_month_surname(&surname) {
            debug!(name = %name.literal, surname = %surname, "rule layer month-surname match");
            let c = Classification::new(
                name.literal.clone(),
                Ethnicity::Coloured,
                MONTH_SURNAME_CONFIDENCE,
                ClassificationMethod::RuleBased,
            )
            .with_detail(MethodDetail::Dictionary {
                entry_name: surname,
                name_type: "surname".to_string(),
                frequency: 0,
                linguistic_origin: None,
            });
            return Ok(Some(c));
        }

        if name.is_multi_word {
            if let Some(entry) = self.best_part_match(name) {
                debug!(name = %name.literal, entry = %entry.name, "rule layer part match");
                return Ok(Some(self.classification_from(name, entry)));
            }
        }

        Ok(None)
    }

    fn name(&self) -> &str {
        "rule_based"
    }

    fn method(&self) -> ClassificationMethod {
        ClassificationMethod::RuleBased
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use namesift_core::{normalize, Ethnicity};

    fn classifier() -> RuleBasedClassifier {
        RuleBasedClassifier::new(Arc::new(DictionaryStore::builtin()))
    }

    #[tokio::test]
    async fn full_literal_match_wins() {
        let c = classifier();
        let name = normalize("Van Der Merwe").unwrap();
        let result = c.classify(&name).await.unwrap().unwrap();

        assert_eq!(result.ethnicity, Ethnicity::White);
        assert_eq!(result.method, ClassificationMethod::RuleBased);
        assert!(result.confidence >= 0.8);
    }

    #[tokio::test]
    async fn part_match_resolves_multi_word_names() {
        let c = classifier();
        let name = normalize("Thabo Unknownsurname").unwrap();
        let result = c.classify(&name).await.unwrap().unwrap();

        assert_eq!(result.ethnicity, Ethnicity::African);
        match result.detail {
            Some(MethodDetail::Dictionary { ref entry_name, .. }) => {
                assert_eq!(entry_name, "thabo")
            }
            _ => panic!("expected dictionary detail"),
        }
    }

    #[tokio::test]
    async fn month_surname_resolves_to_coloured() {
        let c = classifier();
        let name = normalize("John November").unwrap();
        let result = c.classify(&name).await.unwrap().unwrap();

        assert_eq!(result.ethnicity, Ethnicity::Coloured);
        assert_eq!(result.confidence, MONTH_SURNAME_CONFIDENCE);
    }

    #[tokio::test]
    async fn hyphenated_part_matches_after_punctuation_deletion() {
        let store = DictionaryStore::from_entries(vec![NameEntry::new(
            "chadlee",
            Ethnicity::Coloured,
            0.88,
        )]);
        let c = RuleBasedClassifier::new(Arc::new(store));
        let name = normalize("Chad-Lee Smithson").unwrap();
        let result = c.classify(&name).await.unwrap().unwrap();

        assert_eq!(result.ethnicity, Ethnicity::Coloured);
    }

    #[tokio::test]
    async fn no_match_is_none_not_error() {
        let c = classifier();
        let name = normalize("Zzyzx Qwfp").unwrap();
        assert!(c.classify(&name).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn highest_confidence_part_wins() {
        let store = DictionaryStore::from_entries(vec![
            NameEntry::new("aron", Ethnicity::White, 0.70),
            NameEntry::new("naidoo", Ethnicity::Indian, 0.97),
        ]);
        let c = RuleBasedClassifier::new(Arc::new(store));
        let name = normalize("Aron Naidoo").unwrap();
        let result = c.classify(&name).await.unwrap().unwrap();

        assert_eq!(result.ethnicity, Ethnicity::Indian);
    }
}
