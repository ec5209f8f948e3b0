use crate::duplicate::DuplicateThresholds;
use crate::error::{Error, Result};
use crate::llm::{OpenAiClient, DEFAULT_API_BASE, DEFAULT_MODEL};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_POSTS_DIR: &str = "content/blog";
const DEFAULT_TOPICS_FILE: &str = "content/topics.json";
const DEFAULT_RULES_FILE: &str = "content/blog-rules.json";
const DEFAULT_AUTHOR: &str = "Редакция";
const DEFAULT_CATEGORY: &str = "automation";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Environment variable holding the provider API key.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Configuration shared by all blogsmith commands.
///
/// Use [`Config::builder()`] to construct a new configuration.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Config {
    /// Directory holding one Markdown file per post
    pub posts_dir: PathBuf,

    /// File name globs that count as posts
    pub post_patterns: Vec<String>,

    /// JSON array of cached topic suggestions
    pub topics_file: PathBuf,

    /// JSON file with allowed tags, categories and forbidden words
    pub rules_file: PathBuf,

    /// Replacement for the built-in heuristic tables
    pub heuristics_file: Option<PathBuf>,

    /// Root of the OpenAI-compatible API
    pub api_base: String,

    /// Model name
    pub model: String,

    /// Provider API key
    pub api_key: Option<String>,

    /// Per-request timeout
    pub timeout: Duration,

    /// Author written to front-matter
    pub author: String,

    /// Category used when none is given
    pub default_category: String,

    /// Duplicate detection limits
    pub thresholds: DuplicateThresholds,

    /// Dry run mode (no file writes)
    pub dry_run: bool,
}

impl Config {
    /// Creates a new configuration builder.
    ///
    /// # Examples
    ///
    /// ```
    /// use blogsmith::Config;
    ///
    /// let config = Config::builder()
    ///     .posts_dir("./content/blog")
    ///     .model("gpt-4o-mini")
    ///     .build()
    ///     .expect("valid configuration");
    /// ```
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The posts path exists but is not a directory
    /// - No post patterns are given
    /// - The API base is not an HTTP(S) URL
    /// - Duplicate thresholds are out of range
    pub fn validate(&self) -> Result<()> {
        if self.posts_dir.exists() && !self.posts_dir.is_dir() {
            return Err(Error::config(format!(
                "Posts path is not a directory: {}",
                self.posts_dir.display()
            )));
        }

        if self.post_patterns.is_empty() {
            return Err(Error::config("At least one post pattern is required"));
        }

        if !(self.api_base.starts_with("http://") || self.api_base.starts_with("https://")) {
            return Err(Error::config(format!(
                "api_base must be an http(s) URL, got '{}'",
                self.api_base
            )));
        }

        if self.model.trim().is_empty() {
            return Err(Error::config("model must not be empty"));
        }

        if self.timeout.is_zero() {
            return Err(Error::config("timeout must be greater than 0"));
        }

        let t = &self.thresholds;
        if !(t.similarity > 0.0 && t.similarity <= 1.0) {
            return Err(Error::config(format!(
                "similarity threshold ({}) must be in (0, 1]",
                t.similarity
            )));
        }

        if t.min_overlap == 0 {
            return Err(Error::config("min_overlap must be greater than 0"));
        }

        if t.recency_days <= 0 {
            return Err(Error::config(format!(
                "recency_days ({}) must be greater than 0",
                t.recency_days
            )));
        }

        if self.default_category.trim().is_empty() {
            return Err(Error::config("default_category must not be empty"));
        }

        Ok(())
    }

    /// Returns the API key or a configuration error naming the variable.
    ///
    /// # Errors
    ///
    /// Returns an error if no non-empty key was configured.
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                Error::config(format!("API key is missing: set {API_KEY_ENV} or pass --api-key"))
            })
    }

    /// Builds the HTTP client for the configured provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is missing or the client cannot be built.
    pub fn completion_client(&self) -> Result<OpenAiClient> {
        OpenAiClient::new(
            &self.api_base,
            self.require_api_key()?,
            self.model.clone(),
            self.timeout,
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            posts_dir: PathBuf::from(DEFAULT_POSTS_DIR),
            post_patterns: default_patterns(),
            topics_file: PathBuf::from(DEFAULT_TOPICS_FILE),
            rules_file: PathBuf::from(DEFAULT_RULES_FILE),
            heuristics_file: None,
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            author: DEFAULT_AUTHOR.to_string(),
            default_category: DEFAULT_CATEGORY.to_string(),
            thresholds: DuplicateThresholds::default(),
            dry_run: false,
        }
    }
}

fn default_patterns() -> Vec<String> {
    vec!["*.md".to_string(), "*.mdx".to_string()]
}

/// Builder for creating a [`Config`].
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    posts_dir: Option<PathBuf>,
    post_patterns: Option<Vec<String>>,
    topics_file: Option<PathBuf>,
    rules_file: Option<PathBuf>,
    heuristics_file: Option<PathBuf>,
    api_base: Option<String>,
    model: Option<String>,
    api_key: Option<String>,
    timeout: Option<Duration>,
    author: Option<String>,
    default_category: Option<String>,
    thresholds: Option<DuplicateThresholds>,
    dry_run: bool,
}

impl ConfigBuilder {
    /// Sets the posts directory.
    #[must_use]
    pub fn posts_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.posts_dir = Some(path.into());
        self
    }

    /// Sets the file name globs that count as posts.
    #[must_use]
    pub fn post_patterns(mut self, patterns: Vec<String>) -> Self {
        self.post_patterns = Some(patterns);
        self
    }

    /// Sets the topic cache file.
    #[must_use]
    pub fn topics_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.topics_file = Some(path.into());
        self
    }

    /// Sets the content rules file.
    #[must_use]
    pub fn rules_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.rules_file = Some(path.into());
        self
    }

    /// Replaces the built-in heuristic tables with a JSON file.
    #[must_use]
    pub fn heuristics_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.heuristics_file = Some(path.into());
        self
    }

    /// Sets the API root, e.g. `https://api.openai.com/v1`.
    #[must_use]
    pub fn api_base(mut self, url: impl Into<String>) -> Self {
        self.api_base = Some(url.into());
        self
    }

    /// Sets the model name.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the API key.
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the author written to new posts.
    #[must_use]
    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Sets the category used when none is given.
    #[must_use]
    pub fn default_category(mut self, category: impl Into<String>) -> Self {
        self.default_category = Some(category.into());
        self
    }

    /// Sets the duplicate detection limits.
    #[must_use]
    pub fn thresholds(mut self, thresholds: DuplicateThresholds) -> Self {
        self.thresholds = Some(thresholds);
        self
    }

    /// Enables dry run mode (no file writes).
    #[must_use]
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails.
    pub fn build(self) -> Result<Config> {
        let config = Config {
            posts_dir: self
                .posts_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_POSTS_DIR)),
            post_patterns: self.post_patterns.unwrap_or_else(default_patterns),
            topics_file: self
                .topics_file
                .unwrap_or_else(|| PathBuf::from(DEFAULT_TOPICS_FILE)),
            rules_file: self
                .rules_file
                .unwrap_or_else(|| PathBuf::from(DEFAULT_RULES_FILE)),
            heuristics_file: self.heuristics_file,
            api_base: self
                .api_base
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_key: self.api_key,
            timeout: self
                .timeout
                .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            author: self.author.unwrap_or_else(|| DEFAULT_AUTHOR.to_string()),
            default_category: self
                .default_category
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            thresholds: self.thresholds.unwrap_or_default(),
            dry_run: self.dry_run,
        };

        config.validate()?;
        Ok(config)
    }
}
