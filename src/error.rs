use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using the library's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the blogsmith library.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum Error {
    /// IO error with context about the file path.
    #[error("IO error accessing '{path}': {message}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// Error message
        message: String,
    },

    /// Configuration validation error.
    #[error("Invalid configuration: {message}")]
    Config {
        /// Detailed error message
        message: String,
    },

    /// Input rejected by content rules or argument checks.
    #[error("Validation failed: {message}")]
    Validation {
        /// Detailed error message
        message: String,
    },

    /// Candidate topic is too close to a recently published post.
    #[error(
        "Topic '{candidate}' duplicates recent post '{existing}' (similarity {similarity:.2}, {age_days} days old)"
    )]
    Duplicate {
        /// Candidate topic or title
        candidate: String,
        /// Title of the matched post
        existing: String,
        /// Jaccard similarity between the two
        similarity: f64,
        /// Age of the matched post in days
        age_days: i64,
    },

    /// A post with the same slug already exists on disk.
    #[error("Post '{slug}' already exists at '{path}'")]
    SlugExists {
        /// Conflicting slug
        slug: String,
        /// Path of the existing file
        path: PathBuf,
    },

    /// The AI provider answered with an error or an unusable payload.
    #[error("AI provider error: {message}")]
    Api {
        /// HTTP status, if the provider responded at all
        status: Option<u16>,
        /// Error message
        message: String,
    },

    /// Transport-level HTTP failure.
    #[error("HTTP request failed: {message}")]
    Http {
        /// Error message
        message: String,
    },

    /// Malformed document (front-matter, topic payload, data file).
    #[error("Failed to parse {what}: {message}")]
    Parse {
        /// What was being parsed
        what: String,
        /// Error message
        message: String,
    },

    /// Template rendering error.
    #[error("Failed to render template '{template}': {message}")]
    Template {
        /// Template name
        template: String,
        /// Error message
        message: String,
    },

    /// JSON serialization error.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message
        message: String,
    },
}

impl Error {
    /// Creates an IO error with path context.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: source.to_string(),
        }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates a provider error.
    #[must_use]
    pub fn api(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Creates a parse error.
    #[must_use]
    pub fn parse(what: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            what: what.into(),
            message: message.into(),
        }
    }

    /// Creates a template error.
    #[must_use]
    pub fn template(template: impl Into<String>, source: &tera::Error) -> Self {
        // tera хранит полезный текст в цепочке source()
        let mut message = source.to_string();
        let mut cause = std::error::Error::source(source);
        while let Some(inner) = cause {
            message.push_str(": ");
            message.push_str(&inner.to_string());
            cause = inner.source();
        }
        Self::Template {
            template: template.into(),
            message,
        }
    }

    /// Returns true if this is an IO error.
    #[must_use]
    pub const fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    /// Returns true if this is a configuration error.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. })
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Returns true if the topic was rejected as a duplicate.
    #[must_use]
    pub const fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate { .. })
    }

    /// Returns true if the slug collided with an existing post.
    #[must_use]
    pub const fn is_slug_exists(&self) -> bool {
        matches!(self, Self::SlugExists { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization {
            message: e.to_string(),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            return Self::api(Some(status.as_u16()), e.to_string());
        }
        Self::Http {
            message: e.to_string(),
        }
    }
}
