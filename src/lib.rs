//! # blogsmith
//!
//! Generates blog posts and topic ideas for a company blog with an
//! OpenAI-compatible model, and keeps the blog free of near-duplicates.
//!
//! ## Features
//!
//! - Step-by-step generation: title, excerpt, tags, article body
//! - Per-step fallbacks so one bad reply does not lose the whole post
//! - Near-duplicate detection against published posts (stemmed Jaccard)
//! - Keyword-driven tag inference and internal links to services and cases
//! - Topic search with a JSON cache of SEO-annotated ideas
//! - Exclusive writes: an existing post is never overwritten
//!
//! ## Quick Start
//!
//! ```no_run
//! use blogsmith::{Config, GenerateRequest, Generator};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = Config::builder()
//!     .posts_dir("./content/blog")
//!     .api_key(std::env::var("OPENAI_API_KEY")?)
//!     .build()?;
//!
//! let client = config.completion_client()?;
//! let report = Generator::new(config, client)?
//!     .generate(&GenerateRequest::new("Расчёт себестоимости на производстве"))?;
//! report.print_summary();
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! 1. **Store**: Reads existing posts and their front-matter
//! 2. **Duplicate detector**: Rejects topics too close to recent posts
//! 3. **Generator**: Asks the model for each part and assembles the post
//! 4. **Links**: Appends related services and case studies by tag
//! 5. **Store**: Writes the new file without replacing anything

#![warn(
    missing_docs,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery
)]
#![allow(clippy::module_name_repetitions)]

mod config;
mod duplicate;
mod error;
mod generator;
mod heuristics;
mod links;
mod llm;
mod post;
mod prompt;
mod rules;
mod store;
mod tags;
mod template;
mod text;
mod topic_search;
mod topics;

pub mod slug;

pub use config::{Config, ConfigBuilder, API_KEY_ENV};
pub use duplicate::{DuplicateCheck, DuplicateDetector, DuplicateMatch, DuplicateThresholds};
pub use error::{Error, Result};
pub use generator::{Fallback, GenerateRequest, GenerationReport, Generator};
pub use heuristics::{Heuristics, KeywordGroup, LinkEntry, LinkSettings};
pub use links::{LinkInjector, RelatedLinks};
pub use llm::{
    model_output_limit, strip_code_fence, CompletionClient, CompletionRequest, OpenAiClient,
    DEFAULT_API_BASE, DEFAULT_MODEL, DEFAULT_TEMPERATURE,
};
pub use post::{BlogPost, FrontMatter};
pub use prompt::{PromptContext, PromptKind};
pub use rules::ContentRules;
pub use store::{LoadStats, PostStore};
pub use tags::{merge_tags, parse_tag_list, TagInferrer};
pub use text::{jaccard, overlap, Normalizer};
pub use topic_search::{
    parse_suggestions, RejectedTopic, TopicSearch, TopicSearchReport, MAX_TOPIC_COUNT,
};
pub use topics::{topic_key, TopicCache, TopicSuggestion};

/// Checks a title against the posts directory as of today.
///
/// # Errors
///
/// Returns an error if:
/// - Configuration is invalid
/// - The heuristics file cannot be loaded
/// - The posts path is not a directory
///
/// # Examples
///
/// ```no_run
/// use blogsmith::{check_title, Config};
///
/// # fn main() -> anyhow::Result<()> {
/// let config = Config::builder().posts_dir("./content/blog").build()?;
/// let check = check_title(&config, "Автоматизация КП")?;
/// println!("duplicate: {}", check.is_duplicate);
/// # Ok(())
/// # }
/// ```
pub fn check_title(config: &Config, title: &str) -> Result<DuplicateCheck> {
    config.validate()?;

    let heuristics = Heuristics::load(config.heuristics_file.as_deref())?;
    let store = PostStore::new(&config.posts_dir, &config.post_patterns)?;
    let (posts, _) = store.load_all()?;

    let detector = DuplicateDetector::new(&heuristics, config.thresholds);
    Ok(detector.check(title, &posts, chrono::Local::now().date_naive()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    #[test]
    fn test_check_title_against_directory() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("blog/kp.md")
            .write_str("---\ntitle: \"Автоматизация КП\"\n---\n\nТекст\n")
            .unwrap();
        let config = Config::builder()
            .posts_dir(temp.path().join("blog"))
            .build()
            .unwrap();

        let check = check_title(&config, "Автоматизация КП").unwrap();
        assert!(check.is_duplicate);
        assert_eq!(check.matched.unwrap().title, "Автоматизация КП");

        let check = check_title(&config, "Складской учёт без Excel").unwrap();
        assert!(!check.is_duplicate);
    }

    #[test]
    fn test_check_title_missing_directory() {
        let temp = assert_fs::TempDir::new().unwrap();
        let config = Config::builder()
            .posts_dir(temp.path().join("nope"))
            .build()
            .unwrap();
        let check = check_title(&config, "Что угодно").unwrap();
        assert!(!check.is_duplicate);
        assert!(check.matched.is_none());
    }
}
