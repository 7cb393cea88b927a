//! Namesift Core
//!
//! Core types, error taxonomy, and name normalization shared across the
//! namesift classification engine.
//!
//! This crate provides:
//! - The fixed ethnicity taxonomy and classification method/confidence enums
//! - The `Classification` output type with method-specific detail payloads
//! - Error types and result handling
//! - The name normalizer every component routes input through
//! - The phonetic code encoders shared by the phonetic classifier and the
//!   learning cache's pattern keys

pub mod error;
pub mod normalize;
pub mod phonetic;
pub mod types;

pub use error::{Error, Result};
pub use normalize::{normalize, strip_punctuation, NormalizedName};
pub use phonetic::{generate_codes, PhoneticAlgorithm};
pub use types::{
    Classification, ClassificationContext, ClassificationMethod, ConfidenceLevel, Ethnicity,
    MethodDetail,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::normalize::{normalize, NormalizedName};
    pub use crate::types::{
        Classification, ClassificationContext, ClassificationMethod, ConfidenceLevel, Ethnicity,
        MethodDetail,
    };
}
