//! Dictionary record types

use namesift_core::Ethnicity;
use serde::{Deserialize, Serialize};

/// Whether a dictionary name is a forename, a surname, or either
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameType {
    Forename,
    Surname,
    #[default]
    Both,
}

impl NameType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Forename => "forename",
            Self::Surname => "surname",
            Self::Both => "both",
        }
    }
}

/// A single dictionary record. Immutable after load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NameEntry {
    /// Lower-cased name key
    pub name: String,

    /// The ethnicity this name maps to
    pub ethnicity: Ethnicity,

    /// Confidence stored with the entry, in [0, 1]
    pub confidence: f64,

    /// Relative occurrence count in the source data
    #[serde(default = "default_frequency")]
    pub frequency: u32,

    #[serde(default)]
    pub name_type: NameType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linguistic_origin: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regional_pattern: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub historical_context: Option<String>,
}

fn default_frequency() -> u32 {
    1
}

impl NameEntry {
    /// Create a minimal entry; the remaining fields default
    pub fn new(name: impl Into<String>, ethnicity: Ethnicity, confidence: f64) -> Self {
        Self {
            name: name.into().to_lowercase(),
            ethnicity,
            confidence: confidence.clamp(0.0, 1.0),
            frequency: default_frequency(),
            name_type: NameType::default(),
            linguistic_origin: None,
            regional_pattern: None,
            historical_context: None,
        }
    }

    /// Set the name type
    pub fn with_name_type(mut self, name_type: NameType) -> Self {
        self.name_type = name_type;
        self
    }

    /// Set the frequency
    pub fn with_frequency(mut self, frequency: u32) -> Self {
        self.frequency = frequency;
        self
    }

    /// Set the linguistic origin
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.linguistic_origin = Some(origin.into());
        self
    }
}
