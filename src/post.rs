//! Blog post model and front-matter parsing.

use crate::error::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;

const DELIMITER: &str = "---";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Metadata header of a post.
///
/// Only `title` is required. Hand-written headers may leave fields blank,
/// use numbers where text is expected, or give `tags` as a single string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontMatter {
    /// Post title
    #[serde(deserialize_with = "scalar_text")]
    pub title: String,
    /// URL-safe identifier, also the file stem
    #[serde(default, deserialize_with = "scalar_text")]
    pub slug: String,
    /// Publication date, `YYYY-MM-DD`
    #[serde(default, deserialize_with = "scalar_text")]
    pub date: String,
    /// Author shown on the page
    #[serde(default, deserialize_with = "scalar_text")]
    pub author: String,
    /// Blog category
    #[serde(default, deserialize_with = "scalar_text")]
    pub category: String,
    /// Taxonomy tags
    #[serde(default, deserialize_with = "one_or_many")]
    pub tags: Vec<String>,
    /// Short teaser
    #[serde(default, deserialize_with = "scalar_text")]
    pub excerpt: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Integer(i64),
    Float(f64),
    Flag(bool),
}

impl Scalar {
    fn into_text(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Integer(n) => n.to_string(),
            Self::Float(n) => n.to_string(),
            Self::Flag(b) => b.to_string(),
        }
    }
}

/// Reads a string, a number or a boolean as text; a blank value is empty.
fn scalar_text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Scalar>::deserialize(deserializer)?
        .map(Scalar::into_text)
        .unwrap_or_default())
}

/// Reads `tags` as a list, a single value, or a comma-separated string.
fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        Many(Vec<Scalar>),
        One(Scalar),
    }

    let items = match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::Many(items)) => items.into_iter().map(Scalar::into_text).collect(),
        Some(OneOrMany::One(item)) => item
            .into_text()
            .split(',')
            .map(str::to_string)
            .collect(),
    };

    Ok(items
        .into_iter()
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect())
}

impl FrontMatter {
    /// Parses the publication date.
    ///
    /// Accepts `YYYY-MM-DD` and anything that starts with it, such as an
    /// RFC 3339 timestamp.
    #[must_use]
    pub fn published_on(&self) -> Option<NaiveDate> {
        let date = self.date.trim();
        let head = date.get(..10).unwrap_or(date);
        NaiveDate::parse_from_str(head, DATE_FORMAT).ok()
    }
}

/// A post as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlogPost {
    /// Parsed metadata
    pub front_matter: FrontMatter,
    /// Markdown body
    pub body: String,
    /// Source file, if the post was read from disk
    pub path: Option<PathBuf>,
}

impl BlogPost {
    /// Parses a Markdown document with a leading `---` front-matter block.
    ///
    /// # Errors
    ///
    /// Returns an error if the header is missing, unterminated, or not
    /// valid YAML for [`FrontMatter`].
    pub fn parse(content: &str) -> Result<Self> {
        let (header, body) = split_front_matter(content)
            .ok_or_else(|| Error::parse("front-matter", "missing or unterminated '---' block"))?;

        let front_matter: FrontMatter = serde_yaml_ng::from_str(header)
            .map_err(|e| Error::parse("front-matter", e.to_string()))?;

        Ok(Self {
            front_matter,
            body: body.trim_start_matches(['\r', '\n']).to_string(),
            path: None,
        })
    }

    /// Title shortcut.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.front_matter.title
    }

    /// Publication date shortcut.
    #[must_use]
    pub fn published_on(&self) -> Option<NaiveDate> {
        self.front_matter.published_on()
    }
}

/// Splits `content` into the YAML header and the remaining body.
fn split_front_matter(content: &str) -> Option<(&str, &str)> {
    let content = content.trim_start_matches('\u{feff}');
    let first_line_end = content.find('\n')?;
    if content[..first_line_end].trim_end() != DELIMITER {
        return None;
    }

    let rest = &content[first_line_end + 1..];
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == DELIMITER {
            let header = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Some((header, body));
        }
        offset += line.len();
    }
    None
}
