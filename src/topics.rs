//! Topic suggestions and their JSON cache file.

use crate::error::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One topic idea with its SEO context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicSuggestion {
    /// Working title of the topic
    pub topic: String,
    /// Main search keyword
    #[serde(default)]
    pub primary_keyword: String,
    /// Supporting keywords
    #[serde(default)]
    pub secondary_keywords: Vec<String>,
    /// Target reader
    #[serde(default)]
    pub audience: String,
    /// Search intent (informational, commercial, ...)
    #[serde(default)]
    pub intent: String,
    /// Classification tags
    #[serde(default)]
    pub tags: Vec<String>,
    /// Day the suggestion entered the cache
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<NaiveDate>,
}

impl TopicSuggestion {
    /// All keywords, primary first.
    #[must_use]
    pub fn keywords(&self) -> Vec<&str> {
        std::iter::once(self.primary_keyword.as_str())
            .chain(self.secondary_keywords.iter().map(String::as_str))
            .filter(|k| !k.trim().is_empty())
            .collect()
    }
}

/// Normalized form used to compare topics.
#[must_use]
pub fn topic_key(topic: &str) -> String {
    topic
        .to_lowercase()
        .replace('ё', "е")
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Flat JSON array of topic suggestions on disk.
#[derive(Debug, Clone)]
pub struct TopicCache {
    path: PathBuf,
    topics: Vec<TopicSuggestion>,
}

impl TopicCache {
    /// Loads the cache, or starts an empty one if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let topics = if path.exists() {
            let raw = fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
            if raw.trim().is_empty() {
                Vec::new()
            } else {
                serde_json::from_str(&raw).map_err(|e| {
                    Error::parse(format!("topic cache {}", path.display()), e.to_string())
                })?
            }
        } else {
            debug!("Topic cache {} does not exist yet", path.display());
            Vec::new()
        };

        Ok(Self { path, topics })
    }

    /// Cached suggestions.
    #[must_use]
    pub fn topics(&self) -> &[TopicSuggestion] {
        &self.topics
    }

    /// Location of the cache file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true if an equivalent topic is cached.
    #[must_use]
    pub fn contains(&self, topic: &str) -> bool {
        self.find(topic).is_some()
    }

    /// Finds a cached suggestion with the same normalized topic.
    #[must_use]
    pub fn find(&self, topic: &str) -> Option<&TopicSuggestion> {
        let key = topic_key(topic);
        if key.is_empty() {
            return None;
        }
        self.topics.iter().find(|t| topic_key(&t.topic) == key)
    }

    /// Adds suggestions not already cached; returns how many were added.
    pub fn extend(&mut self, suggestions: impl IntoIterator<Item = TopicSuggestion>) -> usize {
        let mut added = 0;
        for suggestion in suggestions {
            if topic_key(&suggestion.topic).is_empty() || self.contains(&suggestion.topic) {
                continue;
            }
            self.topics.push(suggestion);
            added += 1;
        }
        added
    }

    /// Writes the cache as pretty-printed JSON via a temporary file.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }

        let json = serde_json::to_string_pretty(&self.topics)?;
        let temp_path = self.path.with_extension("json.tmp");
        let mut temp_file = fs::File::create(&temp_path).map_err(|e| Error::io(&temp_path, e))?;
        temp_file
            .write_all(json.as_bytes())
            .map_err(|e| Error::io(&temp_path, e))?;
        temp_file.sync_all().map_err(|e| Error::io(&temp_path, e))?;
        drop(temp_file);

        fs::rename(&temp_path, &self.path).map_err(|e| Error::io(&self.path, e))?;

        info!("Saved {} topics to {}", self.topics.len(), self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    fn suggestion(topic: &str) -> TopicSuggestion {
        TopicSuggestion {
            topic: topic.to_string(),
            primary_keyword: "автоматизация кп".to_string(),
            secondary_keywords: vec!["расчёт себестоимости".to_string(), " ".to_string()],
            audience: "собственники производств".to_string(),
            intent: "informational".to_string(),
            tags: vec!["quotations".to_string()],
            created_at: None,
        }
    }

    #[test]
    fn test_topic_key() {
        assert_eq!(topic_key("  Расчёт КП: что важно?  "), "расчет кп что важно");
    }

    #[test]
    fn test_keywords() {
        assert_eq!(
            suggestion("x").keywords(),
            vec!["автоматизация кп", "расчёт себестоимости"]
        );
    }

    #[test]
    fn test_load_missing_file() {
        let temp = assert_fs::TempDir::new().unwrap();
        let cache = TopicCache::load(temp.path().join("topics.json")).unwrap();
        assert!(cache.topics().is_empty());
    }

    #[test]
    fn test_extend_skips_known_topics() {
        let temp = assert_fs::TempDir::new().unwrap();
        let mut cache = TopicCache::load(temp.path().join("topics.json")).unwrap();

        let added = cache.extend(vec![
            suggestion("Как ускорить КП"),
            suggestion("как ускорить кп!"),
            suggestion("Склад без Excel"),
            suggestion("  "),
        ]);

        assert_eq!(added, 2);
        assert!(cache.contains("КАК УСКОРИТЬ КП"));
        assert!(cache.find("Другая тема").is_none());
    }

    #[test]
    fn test_save_and_reload() {
        let temp = assert_fs::TempDir::new().unwrap();
        let path = temp.child("content").child("topics.json");

        let mut cache = TopicCache::load(path.path()).unwrap();
        let mut item = suggestion("Склад без Excel");
        item.created_at = NaiveDate::from_ymd_opt(2026, 10, 18);
        cache.extend(vec![item.clone()]);
        cache.save().unwrap();

        let raw = fs::read_to_string(path.path()).unwrap();
        assert!(raw.contains("\"created_at\": \"2026-10-18\""));
        let reloaded = TopicCache::load(path.path()).unwrap();
        assert_eq!(reloaded.topics(), &[item]);
    }

    #[test]
    fn test_lenient_fields() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("topics.json");
        file.write_str(r#"[{"topic": "Только тема"}]"#).unwrap();

        let cache = TopicCache::load(file.path()).unwrap();
        assert_eq!(cache.topics()[0].topic, "Только тема");
        assert!(cache.topics()[0].keywords().is_empty());
    }

    #[test]
    fn test_invalid_file() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("topics.json");
        file.write_str("{").unwrap();
        assert!(TopicCache::load(file.path()).is_err());
    }
}
