//! Name normalization
//!
//! Every component that needs a cleaned name goes through [`normalize`] so
//! that dictionary lookup, phonetic hashing, and the learning cache all agree
//! on what a given raw name is called.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Minimum length of a name after trimming
const MIN_NAME_LEN: usize = 2;

/// Regional name-particles removed when deriving the phonetic key.
///
/// Removal applies only to the phonetic key: literal dictionary lookup must
/// still match entries such as "van der merwe" verbatim.
const NAME_PARTICLES: &[&str] = &[
    "van", "von", "der", "de", "du", "le", "la", "da", "den", "ter", "ten",
];

/// A validated, normalized name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedName {
    /// Original input, untouched (for audit)
    pub raw: String,

    /// Lower-cased, whitespace-collapsed form with punctuation intact.
    /// This is the key used for literal dictionary lookup.
    pub literal: String,

    /// Whitespace-delimited parts of `literal`
    pub parts: Vec<String>,

    /// Particle-free, punctuation-free, space-free form used for phonetic
    /// hashing and learned-pattern keys ("VAN DER MERWE" -> "merwe",
    /// "CHAD-LEE CARELSE" -> "chadleecarelse")
    pub phonetic_key: String,

    /// Whether the literal form has more than one word
    pub is_multi_word: bool,
}

impl NormalizedName {
    /// The last whitespace part, typically the surname
    pub fn last_part(&self) -> &str {
        self.parts.last().map(String::as_str).unwrap_or(&self.literal)
    }
}

/// Delete hyphens, apostrophes, and any other non-alphanumeric characters
pub fn strip_punctuation(word: &str) -> String {
    word.chars().filter(|c| c.is_alphanumeric()).collect()
}

/// Normalize and validate a raw name.
///
/// Fails with [`Error::NameValidation`] when the input is empty, whitespace,
/// or shorter than two characters after trimming.
pub fn normalize(raw: &str) -> Result<NormalizedName> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::validation("name is empty"));
    }
    if trimmed.chars().count() < MIN_NAME_LEN {
        return Err(Error::validation(format!(
            "name '{}' is shorter than {} characters",
            trimmed, MIN_NAME_LEN
        )));
    }

    let literal = trimmed
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    let parts: Vec<String> = literal.split_whitespace().map(str::to_string).collect();

    let phonetic_key = derive_phonetic_key(&parts);

    Ok(NormalizedName {
        raw: raw.to_string(),
        is_multi_word: parts.len() > 1,
        literal,
        parts,
        phonetic_key,
    })
}

/// Drop name-particles, delete punctuation, and join the remaining parts.
///
/// Falls back to using every part when the whole name consists of particles,
/// so the key is never empty for a valid name.
fn derive_phonetic_key(parts: &[String]) -> String {
    let significant: Vec<&String> = parts
        .iter()
        .filter(|p| !NAME_PARTICLES.contains(&p.as_str()))
        .collect();

    let chosen: Vec<&String> = if significant.is_empty() {
        parts.iter().collect()
    } else {
        significant
    };

    chosen
        .iter()
        .map(|p| strip_punctuation(p))
        .collect::<Vec<_>>()
        .concat()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_and_whitespace() {
        assert!(matches!(normalize(""), Err(Error::NameValidation(_))));
        assert!(matches!(normalize("   "), Err(Error::NameValidation(_))));
        assert!(matches!(normalize("\t\n"), Err(Error::NameValidation(_))));
    }

    #[test]
    fn rejects_single_character() {
        assert!(matches!(normalize("x"), Err(Error::NameValidation(_))));
        assert!(matches!(normalize(" x "), Err(Error::NameValidation(_))));
    }

    #[test]
    fn particles_removed_only_for_phonetic_key() {
        let n = normalize("VAN DER MERWE").unwrap();
        assert_eq!(n.literal, "van der merwe");
        assert_eq!(n.parts, vec!["van", "der", "merwe"]);
        assert_eq!(n.phonetic_key, "merwe");
        assert!(n.is_multi_word);
    }

    #[test]
    fn hyphens_deleted_not_replaced() {
        let n = normalize("CHAD-LEE CARELSE").unwrap();
        assert_eq!(n.literal, "chad-lee carelse");
        assert_eq!(n.parts, vec!["chad-lee", "carelse"]);
        assert_eq!(n.phonetic_key, "chadleecarelse");
    }

    #[test]
    fn apostrophes_deleted() {
        let n = normalize("O'Brien").unwrap();
        assert_eq!(n.literal, "o'brien");
        assert_eq!(n.phonetic_key, "obrien");
        assert!(!n.is_multi_word);
    }

    #[test]
    fn whitespace_collapsed() {
        let n = normalize("  Thabo   Mbeki ").unwrap();
        assert_eq!(n.literal, "thabo mbeki");
        assert_eq!(n.parts, vec!["thabo", "mbeki"]);
        assert_eq!(n.phonetic_key, "thabombeki");
    }

    #[test]
    fn all_particle_name_falls_back_to_every_part() {
        let n = normalize("van der").unwrap();
        assert_eq!(n.phonetic_key, "vander");
    }

    #[test]
    fn last_part_is_surname() {
        let n = normalize("sipho le roux").unwrap();
        assert_eq!(n.last_part(), "roux");
        assert_eq!(n.phonetic_key, "siphoroux");
    }
}
