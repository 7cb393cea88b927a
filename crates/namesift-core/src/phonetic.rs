//! Phonetic code generation
//!
//! Four independent fingerprint encoders over a name's pronunciation. All of
//! them are total functions: input outside the Latin alphabet (click
//! consonants, diacritics, CJK) degrades to an empty code, never a panic.
//! Callers treat an empty code as "this algorithm abstains".

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The code-based matching algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhoneticAlgorithm {
    /// Simple consonant-class code, fixed length 4
    Consonant,
    /// Finer consonant classes, uncapped length
    Refined,
    /// Refined code of the alternate-realization spelling, second pass
    /// collapsing runs
    DoubleRefined,
    /// Spelling-normalization code (prefix/suffix rewrites, vowel folding)
    SpellingNormalized,
}

impl PhoneticAlgorithm {
    pub const ALL: [PhoneticAlgorithm; 4] = [
        PhoneticAlgorithm::Consonant,
        PhoneticAlgorithm::Refined,
        PhoneticAlgorithm::DoubleRefined,
        PhoneticAlgorithm::SpellingNormalized,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Consonant => "consonant",
            Self::Refined => "refined",
            Self::DoubleRefined => "double_refined",
            Self::SpellingNormalized => "spelling_normalized",
        }
    }
}

impl std::fmt::Display for PhoneticAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keep only ascii letters, lower-cased. The encoders work over this
/// sanitized form; anything else (clicks, diacritics) is dropped.
fn sanitize(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Coarse consonant classes (Soundex-family)
fn consonant_class(c: char) -> Option<char> {
    match c {
        'b' | 'f' | 'p' | 'v' => Some('1'),
        'c' | 'g' | 'j' | 'k' | 'q' | 's' | 'x' | 'z' => Some('2'),
        'd' | 't' => Some('3'),
        'l' => Some('4'),
        'm' | 'n' => Some('5'),
        'r' => Some('6'),
        _ => None,
    }
}

/// Finer consonant classes for the refined code
fn refined_class(c: char) -> char {
    match c {
        'b' | 'p' => '1',
        'f' | 'v' => '2',
        'c' | 'k' | 's' => '3',
        'g' | 'j' => '4',
        'q' | 'x' | 'z' => '5',
        'd' | 't' => '6',
        'l' => '7',
        'm' | 'n' => '8',
        'r' => '9',
        _ => '0',
    }
}

/// Simple consonant-based code: first letter plus three consonant-class
/// digits, adjacent duplicates collapsed, zero-padded to length 4
pub fn consonant_code(name: &str) -> String {
    let s = sanitize(name);
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };

    let mut code = String::with_capacity(4);
    code.push(first);

    let mut last_digit = consonant_class(first);
    for c in chars {
        if code.len() == 4 {
            break;
        }
        let digit = consonant_class(c);
        if let Some(d) = digit {
            if Some(d) != last_digit {
                code.push(d);
            }
        }
        last_digit = digit;
    }

    while code.len() < 4 {
        code.push('0');
    }
    code
}

/// Refined consonant code: first letter plus a class digit per letter
/// (vowels keep an explicit '0' slot), adjacent duplicates collapsed,
/// uncapped length
pub fn refined_code(name: &str) -> String {
    let s = sanitize(name);
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };

    let mut code = String::with_capacity(s.len() + 1);
    code.push(first);
    let mut last = refined_class(first);
    code.push(last);

    for c in chars {
        let d = refined_class(c);
        if d != last {
            code.push(d);
            last = d;
        }
    }
    code
}

/// Rewrite ambiguous digraphs to their alternate realization before the
/// second encoding pass
fn alternate_spelling(s: &str) -> String {
    let mut out = s.to_string();
    for (from, to) in [
        ("ph", "f"),
        ("gh", "g"),
        ("ck", "k"),
        ("sch", "sk"),
        ("tch", "ch"),
        ("dh", "d"),
        ("bh", "b"),
        ("wr", "r"),
        ("kn", "n"),
        ("x", "ks"),
    ] {
        out = out.replace(from, to);
    }
    out
}

/// Double-pass refined code: the refined encoding of the
/// alternate-realization spelling, with a second pass collapsing any run of
/// repeated digits the rewrite introduced
pub fn double_refined_code(name: &str) -> String {
    let s = sanitize(name);
    if s.is_empty() {
        return String::new();
    }

    let first_pass = refined_code(&alternate_spelling(&s));
    let mut code = String::with_capacity(first_pass.len());
    let mut last = None;
    for c in first_pass.chars() {
        if Some(c) != last {
            code.push(c);
            last = Some(c);
        }
    }
    code
}

/// Spelling-normalization code: rewrites common prefix/suffix variants and
/// folds vowels so spelling variants of the same name converge
pub fn spelling_normalized_code(name: &str) -> String {
    let mut s = sanitize(name);
    if s.is_empty() {
        return String::new();
    }

    for (from, to) in [("mac", "mc"), ("kn", "n"), ("pf", "f"), ("ph", "f"), ("sch", "s")] {
        if s.starts_with(from) {
            s = format!("{}{}", to, &s[from.len()..]);
            break;
        }
    }

    for (from, to) in [("ee", "y"), ("ie", "y"), ("dt", "d"), ("rt", "d"), ("nd", "d"), ("nt", "d")] {
        if s.ends_with(from) {
            s.truncate(s.len() - from.len());
            s.push_str(to);
            break;
        }
    }

    let mut out = String::with_capacity(s.len());
    let mut prev = '\0';
    for (i, c) in s.chars().enumerate() {
        let mapped = if i == 0 {
            c
        } else {
            match c {
                'a' | 'e' | 'i' | 'o' | 'u' | 'y' => 'a',
                'q' => 'g',
                'z' => 's',
                'm' => 'n',
                'k' => 'c',
                'h' | 'w' => prev,
                other => other,
            }
        };
        if mapped != prev && mapped != '\0' {
            out.push(mapped);
        }
        prev = mapped;
    }

    // A trailing folded vowel carries no signal
    if out.len() > 1 && out.ends_with('a') {
        out.pop();
    }
    out
}

/// Generate every non-empty code for a name.
///
/// Algorithms that cannot encode the input (nothing left after sanitizing)
/// are simply absent from the map; they abstain rather than fail.
pub fn generate_codes(name: &str) -> HashMap<PhoneticAlgorithm, String> {
    let mut codes = HashMap::with_capacity(4);
    for algorithm in PhoneticAlgorithm::ALL {
        let code = encode(algorithm, name);
        if !code.is_empty() {
            codes.insert(algorithm, code);
        }
    }
    codes
}

/// Encode a name with one algorithm
pub fn encode(algorithm: PhoneticAlgorithm, name: &str) -> String {
    match algorithm {
        PhoneticAlgorithm::Consonant => consonant_code(name),
        PhoneticAlgorithm::Refined => refined_code(name),
        PhoneticAlgorithm::DoubleRefined => double_refined_code(name),
        PhoneticAlgorithm::SpellingNormalized => spelling_normalized_code(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consonant_code_is_fixed_length() {
        assert_eq!(consonant_code("merwe").len(), 4);
        assert_eq!(consonant_code("tshabalala").len(), 4);
        assert_eq!(consonant_code("le").len(), 4);
    }

    #[test]
    fn spelling_variants_converge() {
        assert_eq!(consonant_code("merwe"), consonant_code("mirwe"));
        assert_eq!(consonant_code("naidoo"), consonant_code("naidu"));
        assert_eq!(refined_code("pillay"), refined_code("pillai"));
        assert_eq!(
            spelling_normalized_code("mohamed"),
            spelling_normalized_code("mohammed")
        );
    }

    #[test]
    fn distinct_names_keep_distinct_refined_codes() {
        assert_ne!(refined_code("dlamini"), refined_code("naidoo"));
        assert_ne!(refined_code("botha"), refined_code("pillay"));
    }

    #[test]
    fn double_refined_handles_digraph_variants() {
        assert_eq!(double_refined_code("stephens"), double_refined_code("stevens"));
    }

    #[test]
    fn click_consonant_clusters_never_panic() {
        // Khoisan-style orthography with click characters
        for name in ["ǃxũ", "ǂkhomani", "n|uu", "ǀʼauni", "!ke"] {
            let _ = consonant_code(name);
            let _ = refined_code(name);
            let _ = double_refined_code(name);
            let _ = spelling_normalized_code(name);
        }
    }

    #[test]
    fn out_of_alphabet_input_degrades_to_empty() {
        assert_eq!(double_refined_code("ǃǂǀ"), "");
        assert_eq!(consonant_code("漢字"), "");
        assert!(generate_codes("ǃǂǀ").is_empty());
    }

    #[test]
    fn generate_codes_covers_all_algorithms_for_latin_names() {
        let codes = generate_codes("carelse");
        assert_eq!(codes.len(), 4);
        for algorithm in PhoneticAlgorithm::ALL {
            assert!(codes.contains_key(&algorithm));
        }
    }
}
