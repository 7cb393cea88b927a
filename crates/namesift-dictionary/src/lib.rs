//! Namesift Dictionary
//!
//! Immutable, process-wide name dictionaries: one map per ethnicity held in
//! a fixed priority order, a month-surname heuristic set, deterministic
//! best-confidence lookup, and few-shot sampling for LLM prompts.
//!
//! The store is loaded once at startup (from the embedded seed asset or a
//! YAML file) and injected by reference into every classifier constructor.

pub mod entry;
pub mod store;

pub use entry::{NameEntry, NameType};
pub use store::{DictionaryStore, MONTH_SURNAME_CONFIDENCE};
