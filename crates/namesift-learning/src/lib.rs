//! Namesift Learning
//!
//! The self-learning pattern cache. Every paid LLM classification is
//! persisted verbatim and generalized into a phonetic-family pattern; both
//! are consulted before any new LLM call, so one paid call typically covers
//! many future names. Patterns are append/update only and never evicted.

pub mod cache;
pub mod pattern;
pub mod store;

pub use cache::{
    LearningCache, LearningStatistics, FAMILY_CONFIDENCE_CAP, FAMILY_CONFIDENCE_FACTOR,
    PATTERN_KEY_LEN,
};
pub use pattern::{LearnedPattern, StoredClassification};
pub use store::LearningStore;
