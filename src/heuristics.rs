//! Content-policy data for the text heuristics.
//!
//! Stop words, stemmer suffixes, keyword groups and link tables are data,
//! not logic. Defaults ship with the binary (`data/heuristics.json`) and can
//! be replaced wholesale by a JSON file of the same shape.

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

const DEFAULT_HEURISTICS: &str = include_str!("../data/heuristics.json");

static BUILTIN: Lazy<Heuristics> = Lazy::new(|| {
    serde_json::from_str(DEFAULT_HEURISTICS).expect("bundled heuristics are valid JSON")
});

/// A group of keywords that implies a set of taxonomy tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordGroup {
    /// Lowercase substrings to look for
    pub keywords: Vec<String>,
    /// Tags implied by any keyword of the group
    pub tags: Vec<String>,
}

/// An internal link offered for a given tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkEntry {
    /// Tag that triggers this link
    pub tag: String,
    /// Link text
    pub title: String,
    /// Site-relative URL
    pub url: String,
}

/// Settings for the appended related-links blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkSettings {
    /// Heading above the service links
    pub services_heading: String,
    /// Heading above the case-study links
    pub cases_heading: String,
    /// Maximum number of service links
    pub max_services: usize,
    /// Maximum number of case-study links
    pub max_cases: usize,
    /// Service pages, in priority order
    pub services: Vec<LinkEntry>,
    /// Case-study pages, in priority order
    pub cases: Vec<LinkEntry>,
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            services_heading: "Связанные услуги".to_string(),
            cases_heading: "Примеры внедрения".to_string(),
            max_services: 3,
            max_cases: 2,
            services: Vec::new(),
            cases: Vec::new(),
        }
    }
}

/// All heuristic tables in one place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Heuristics {
    /// Words ignored by the duplicate detector
    pub stop_words: Vec<String>,
    /// Endings stripped by the stemmer
    pub suffixes: Vec<String>,
    /// Minimum stem length left after stripping
    pub min_stem_len: usize,
    /// Keyword groups for tag inference, in priority order
    pub keyword_groups: Vec<KeywordGroup>,
    /// Tags appended whenever any group matched
    pub base_tags: Vec<String>,
    /// Tags used when tag generation fails
    pub default_tags: Vec<String>,
    /// Internal link tables
    pub links: LinkSettings,
}

impl Default for Heuristics {
    fn default() -> Self {
        Self {
            stop_words: Vec::new(),
            suffixes: Vec::new(),
            min_stem_len: 3,
            keyword_groups: Vec::new(),
            base_tags: Vec::new(),
            default_tags: Vec::new(),
            links: LinkSettings::default(),
        }
    }
}

impl Heuristics {
    /// Returns the tables compiled into the binary.
    #[must_use]
    pub fn builtin() -> Self {
        BUILTIN.clone()
    }

    /// Loads tables from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid JSON.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let heuristics: Self = serde_json::from_str(&raw)
            .map_err(|e| Error::parse(format!("heuristics file {}", path.display()), e.to_string()))?;
        debug!(
            "Loaded heuristics from {}: {} stop words, {} suffixes, {} keyword groups",
            path.display(),
            heuristics.stop_words.len(),
            heuristics.suffixes.len(),
            heuristics.keyword_groups.len()
        );
        Ok(heuristics)
    }

    /// Loads tables from `path` when given, or falls back to the builtin set.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit file cannot be loaded.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        path.map_or_else(|| Ok(Self::builtin()), Self::from_file)
    }
}
