//! Allow-lists and forbidden words for generated content.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Editorial rules loaded from a JSON file.
///
/// Empty allow-lists mean "anything goes".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentRules {
    /// Tags that may appear in front-matter
    pub allowed_tags: Vec<String>,
    /// Categories a post may belong to
    pub allowed_categories: Vec<String>,
    /// Words that must not appear in published text
    pub forbidden_words: Vec<String>,
}

impl ContentRules {
    /// Reads rules from `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let rules: Self = serde_json::from_str(&raw)
            .map_err(|e| Error::parse(format!("rules file {}", path.display()), e.to_string()))?;
        debug!(
            "Loaded rules: {} tags, {} categories, {} forbidden words",
            rules.allowed_tags.len(),
            rules.allowed_categories.len(),
            rules.forbidden_words.len()
        );
        Ok(rules)
    }

    /// Reads rules if the file exists; otherwise returns unrestricted rules.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but is invalid.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            warn!("Rules file {} not found, content is not validated", path.display());
            Ok(Self::default())
        }
    }

    /// Fails unless `category` is allowed.
    ///
    /// # Errors
    ///
    /// Returns a validation error naming the allowed categories.
    pub fn validate_category(&self, category: &str) -> Result<()> {
        if self.allowed_categories.is_empty()
            || self.allowed_categories.iter().any(|c| c.eq_ignore_ascii_case(category))
        {
            return Ok(());
        }
        Err(Error::validation(format!(
            "category '{}' is not allowed (allowed: {})",
            category,
            self.allowed_categories.join(", ")
        )))
    }

    /// Splits `tags` into allowed and rejected ones.
    #[must_use]
    pub fn filter_tags(&self, tags: &[String]) -> (Vec<String>, Vec<String>) {
        if self.allowed_tags.is_empty() {
            return (tags.to_vec(), Vec::new());
        }
        tags.iter()
            .cloned()
            .partition(|t| self.allowed_tags.iter().any(|a| a.eq_ignore_ascii_case(t)))
    }

    /// Returns the forbidden words found in `text`, case-insensitively.
    #[must_use]
    pub fn forbidden_in(&self, text: &str) -> Vec<String> {
        let haystack = text.to_lowercase();
        self.forbidden_words
            .iter()
            .filter(|w| !w.trim().is_empty() && haystack.contains(&w.to_lowercase()))
            .cloned()
            .collect()
    }
}
