//! Few-shot prompt construction for name classification

use namesift_core::{ClassificationContext, Ethnicity};
use namesift_dictionary::DictionaryStore;

/// Hard cap on few-shot examples per prompt
const MAX_FEW_SHOT: usize = 15;

const CATEGORIES: &str = "African, Indian, Cape Malay, Coloured, White, Unknown";

const PREAMBLE: &str = "You classify South African personal names into exactly one of these \
categories: African, Indian, Cape Malay, Coloured, White, Unknown. Base your answer on naming \
conventions, linguistic origin, and regional history. Answer Unknown only when the name gives \
no usable signal.";

/// Builds single-name and numbered-batch prompts with a fixed sample of
/// labelled examples drawn from the dictionary store
pub struct PromptBuilder {
    examples: Vec<(String, Ethnicity)>,
}

impl PromptBuilder {
    /// Sample up to `few_shot` examples from the store (capped at 15)
    pub fn new(store: &DictionaryStore, few_shot: usize) -> Self {
        Self {
            examples: store.few_shot_examples(few_shot.min(MAX_FEW_SHOT)),
        }
    }

    fn examples_block(&self) -> String {
        if self.examples.is_empty() {
            return String::new();
        }
        let mut block = String::from("Examples:\n");
        for (name, ethnicity) in &self.examples {
            block.push_str(&format!("- {} -> {}\n", name, ethnicity.label()));
        }
        block
    }

    /// Prompt for one name, with optional caller context
    pub fn single(&self, name: &str, context: Option<&ClassificationContext>) -> String {
        let mut prompt = format!("{}\n\n{}", PREAMBLE, self.examples_block());

        if let Some(ctx) = context.filter(|c| !c.is_empty()) {
            prompt.push_str("Context:\n");
            if let Some(company) = &ctx.company_name {
                prompt.push_str(&format!("- company: {}\n", company));
            }
            if let Some(province) = &ctx.province {
                prompt.push_str(&format!("- province: {}\n", province));
            }
        }

        prompt.push_str(&format!(
            "\nName: {}\nAnswer with only the category ({}).",
            name, CATEGORIES
        ));
        prompt
    }

    /// Numbered-list prompt for a batch of names.
    ///
    /// The preamble and examples are shared across the whole batch, which is
    /// what makes batch calls materially cheaper per name than N single
    /// prompts.
    pub fn batch(&self, names: &[String]) -> String {
        let mut prompt = format!("{}\n\n{}", PREAMBLE, self.examples_block());

        prompt.push_str("\nClassify each numbered name. Respond with one line per name in the \
exact format `number. name: category`, using only the listed categories.\n\n");

        for (i, name) in names.iter().enumerate() {
            prompt.push_str(&format!("{}. {}\n", i + 1, name));
        }
        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> PromptBuilder {
        PromptBuilder::new(&DictionaryStore::builtin(), 10)
    }

    #[test]
    fn single_prompt_names_the_taxonomy_and_the_name() {
        let prompt = builder().single("gxowa", None);
        assert!(prompt.contains("Cape Malay"));
        assert!(prompt.contains("Name: gxowa"));
        assert!(prompt.contains("Examples:"));
    }

    #[test]
    fn context_is_injected_when_present() {
        let ctx = ClassificationContext {
            company_name: Some("Mzansi Holdings".into()),
            province: Some("Western Cape".into()),
        };
        let prompt = builder().single("gxowa", Some(&ctx));
        assert!(prompt.contains("Mzansi Holdings"));
        assert!(prompt.contains("Western Cape"));

        let empty = ClassificationContext::default();
        let prompt = builder().single("gxowa", Some(&empty));
        assert!(!prompt.contains("Context:"));
    }

    #[test]
    fn few_shot_count_is_capped() {
        let b = PromptBuilder::new(&DictionaryStore::builtin(), 100);
        assert!(b.examples.len() <= 15);
    }

    #[test]
    fn batch_prompt_numbers_every_name() {
        let names: Vec<String> = vec!["gxowa".into(), "rhulani".into(), "keanu".into()];
        let prompt = builder().batch(&names);
        assert!(prompt.contains("1. gxowa"));
        assert!(prompt.contains("2. rhulani"));
        assert!(prompt.contains("3. keanu"));
    }

    #[test]
    fn batch_amortizes_the_preamble() {
        let b = builder();
        let names: Vec<String> = (0..10).map(|i| format!("name{}", i)).collect();

        let batch_len = b.batch(&names).len();
        let singles_len: usize = names.iter().map(|n| b.single(n, None).len()).sum();

        // Target: at least 20% token savings per name versus N single prompts
        assert!((batch_len as f64) < 0.8 * singles_len as f64);
    }
}
