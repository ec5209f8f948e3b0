//! Topic ideas from the AI provider, filtered against the blog and the cache.

use crate::{
    config::Config,
    duplicate::DuplicateDetector,
    error::{Error, Result},
    heuristics::Heuristics,
    llm::{CompletionClient, CompletionRequest},
    prompt::{PromptContext, PromptKind},
    rules::ContentRules,
    store::PostStore,
    tags::TagInferrer,
    template::TemplateEngine,
    topics::{topic_key, TopicCache, TopicSuggestion},
};
use chrono::NaiveDate;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

/// Largest number of ideas one request may ask for.
pub const MAX_TOPIC_COUNT: usize = 50;

const MAX_EXISTING_TITLES: usize = 100;

/// Suggestion dropped by filtering.
#[derive(Debug, Clone, Serialize)]
pub struct RejectedTopic {
    /// Suggested topic
    pub topic: String,
    /// Why it was dropped
    pub reason: String,
}

/// Outcome of one topic search.
#[derive(Debug, Clone, Serialize)]
pub struct TopicSearchReport {
    /// Suggestions kept and cached
    pub accepted: Vec<TopicSuggestion>,
    /// Suggestions dropped
    pub rejected: Vec<RejectedTopic>,
    /// Cache file
    pub cache_path: std::path::PathBuf,
    /// Whether the cache was left untouched
    pub dry_run: bool,
    /// Total execution time
    pub duration: Duration,
}

impl TopicSearchReport {
    /// Prints a human-readable summary to stdout.
    pub fn print_summary(&self) {
        println!("\n╔═══════════════════════════════════════════════════════╗");
        println!("║                 Topic Search Summary                  ║");
        println!("╚═══════════════════════════════════════════════════════╝");
        for (index, suggestion) in self.accepted.iter().enumerate() {
            println!("  {:>2}. {}", index + 1, suggestion.topic);
            if !suggestion.primary_keyword.is_empty() {
                println!("      keyword: {}", suggestion.primary_keyword);
            }
            if !suggestion.tags.is_empty() {
                println!("      tags:    {}", suggestion.tags.join(", "));
            }
        }
        for rejected in &self.rejected {
            println!("  ✗ {} ({})", rejected.topic, rejected.reason);
        }
        if self.dry_run {
            println!("  Dry run:    cache not updated");
        } else {
            println!("  Cache:      {}", self.cache_path.display());
        }
        println!("  Time:       {:.2}s\n", self.duration.as_secs_f64());
    }
}

/// Asks the provider for topic ideas and keeps the new ones.
pub struct TopicSearch<C> {
    config: Config,
    client: C,
    store: PostStore,
    rules: ContentRules,
    detector: DuplicateDetector,
    inferrer: TagInferrer,
    templates: TemplateEngine,
}

impl<C: CompletionClient> TopicSearch<C> {
    /// Creates a topic search with the given configuration and client.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration, heuristics or rules are invalid.
    pub fn new(config: Config, client: C) -> Result<Self> {
        config.validate()?;

        let heuristics = Heuristics::load(config.heuristics_file.as_deref())?;
        let rules = ContentRules::load_or_default(&config.rules_file)?;
        let store = PostStore::new(&config.posts_dir, &config.post_patterns)?;

        Ok(Self {
            detector: DuplicateDetector::new(&heuristics, config.thresholds),
            inferrer: TagInferrer::new(&heuristics),
            templates: TemplateEngine::new()?,
            config,
            client,
            store,
            rules,
        })
    }

    /// Runs a search dated today.
    ///
    /// # Errors
    ///
    /// See [`TopicSearch::run_on`].
    pub fn run(&self, query: &str, count: usize) -> Result<TopicSearchReport> {
        self.run_on(query, count, chrono::Local::now().date_naive())
    }

    /// Requests `count` ideas for `query` and caches the ones that are new.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The query is empty or `count` is outside `1..=50`
    /// - The provider call fails or returns no JSON array
    /// - The cache cannot be read or written
    #[instrument(skip(self))]
    pub fn run_on(&self, query: &str, count: usize, today: NaiveDate) -> Result<TopicSearchReport> {
        let start_time = Instant::now();

        let query = query.trim();
        if query.is_empty() {
            return Err(Error::validation("query must not be empty"));
        }
        if !(1..=MAX_TOPIC_COUNT).contains(&count) {
            return Err(Error::validation(format!(
                "count must be between 1 and {MAX_TOPIC_COUNT}, got {count}"
            )));
        }

        let (posts, _) = self.store.load_all()?;
        let mut cache = TopicCache::load(&self.config.topics_file)?;

        let existing_titles = posts
            .iter()
            .map(|p| p.title().to_string())
            .chain(cache.topics().iter().map(|t| t.topic.clone()))
            .take(MAX_EXISTING_TITLES)
            .collect();
        let ctx = PromptContext {
            topic: query.to_string(),
            count: Some(count),
            allowed_tags: self.rules.allowed_tags.clone(),
            existing_titles,
            ..PromptContext::default()
        };

        let kind = PromptKind::Topics;
        let user = self.templates.render_prompt(kind, &ctx)?;
        let reply = self
            .client
            .complete(&CompletionRequest::new(kind.system_prompt(), user, kind.max_tokens()))?;
        let suggestions = parse_suggestions(&reply)?;
        debug!("Provider returned {} suggestions", suggestions.len());

        let mut accepted: Vec<TopicSuggestion> = Vec::new();
        let mut rejected = Vec::new();
        for mut suggestion in suggestions {
            let topic = suggestion.topic.trim().to_string();
            let key = topic_key(&topic);
            let reason = if key.is_empty() {
                Some("empty topic".to_string())
            } else if cache.contains(&topic) {
                Some("already cached".to_string())
            } else if accepted.iter().any(|t| topic_key(&t.topic) == key) {
                Some("repeated in reply".to_string())
            } else {
                let check = self.detector.check(&topic, &posts, today);
                match check.matched {
                    Some(m) if check.is_duplicate => Some(format!(
                        "duplicates '{}' (similarity {:.2})",
                        m.title, m.similarity
                    )),
                    _ => None,
                }
            };

            if let Some(reason) = reason {
                debug!("Dropping '{}': {}", topic, reason);
                rejected.push(RejectedTopic { topic, reason });
                continue;
            }

            suggestion.topic = topic;
            suggestion.tags = self.suggestion_tags(&suggestion);
            suggestion.created_at = Some(today);
            accepted.push(suggestion);
        }
        accepted.truncate(count);

        if accepted.is_empty() {
            warn!("No new topics for '{}'", query);
        } else if self.config.dry_run {
            info!("Dry run: {} topics not cached", accepted.len());
        } else {
            let added = cache.extend(accepted.iter().cloned());
            cache.save()?;
            info!("Cached {} new topics in {}", added, cache.path().display());
        }

        Ok(TopicSearchReport {
            accepted,
            rejected,
            cache_path: cache.path().to_path_buf(),
            dry_run: self.config.dry_run,
            duration: start_time.elapsed(),
        })
    }

    /// Normalized tags: suggested plus inferred, limited to the allow-list.
    fn suggestion_tags(&self, suggestion: &TopicSuggestion) -> Vec<String> {
        let suggested: Vec<String> = suggestion
            .tags
            .iter()
            .map(|t| t.trim().to_lowercase())
            .collect();
        let inferred = self.inferrer.infer(&format!(
            "{} {}",
            suggestion.topic,
            suggestion.keywords().join(" ")
        ));
        let merged = crate::tags::merge_tags([suggested.as_slice(), inferred.as_slice()]);
        self.rules.filter_tags(&merged).0
    }
}

/// Extracts the suggestion array from a reply that may carry prose around it.
///
/// # Errors
///
/// Returns a parse error if no JSON array of suggestions can be found.
pub fn parse_suggestions(reply: &str) -> Result<Vec<TopicSuggestion>> {
    let trimmed = reply.trim();
    if let Ok(suggestions) = serde_json::from_str::<Vec<TopicSuggestion>>(trimmed) {
        return Ok(suggestions);
    }

    let slice = match (trimmed.find('['), trimmed.rfind(']')) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => return Err(Error::parse("topic suggestions", "no JSON array in reply")),
    };
    serde_json::from_str(slice).map_err(|e| Error::parse("topic suggestions", e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::FakeClient;
    use assert_fs::prelude::*;
    use assert_fs::TempDir;

    const REPLY: &str = r#"Вот идеи:
[
  {"topic": "Калькулятор себестоимости для цеха", "primary_keyword": "калькулятор себестоимости", "secondary_keywords": ["расчёт цены"], "audience": "производство", "intent": "commercial", "tags": ["Costing"]},
  {"topic": "Складской учёт без Excel", "primary_keyword": "складской учёт", "tags": []},
  {"topic": "Интеграция CRM и 1С", "primary_keyword": "интеграция crm", "tags": ["crm"]},
  {"topic": "калькулятор себестоимости для цеха!", "tags": []}
]
Надеюсь, пригодится."#;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    fn config(temp: &TempDir) -> Config {
        Config::builder()
            .posts_dir(temp.path().join("blog"))
            .topics_file(temp.path().join("topics.json"))
            .rules_file(temp.path().join("rules.json"))
            .build()
            .unwrap()
    }

    fn client() -> FakeClient {
        FakeClient::default().reply(PromptKind::Topics, REPLY)
    }

    #[test]
    fn test_parse_plain_array() {
        let suggestions = parse_suggestions(r#"[{"topic": "A"}]"#).unwrap();
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].topic, "A");
        assert!(suggestions[0].tags.is_empty());
    }

    #[test]
    fn test_parse_with_prose() {
        assert_eq!(parse_suggestions(REPLY).unwrap().len(), 4);
    }

    #[test]
    fn test_parse_rejects_non_array() {
        assert!(parse_suggestions("Извините, не могу помочь").is_err());
        assert!(parse_suggestions(r#"{"topic": "A"}"#).is_err());
    }

    #[test]
    fn test_new_topics_are_cached() {
        let temp = TempDir::new().unwrap();
        let search = TopicSearch::new(config(&temp), client()).unwrap();

        let report = search.run_on("автоматизация производства", 10, today()).unwrap();

        assert_eq!(report.accepted.len(), 3);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].reason, "repeated in reply");

        let first = &report.accepted[0];
        assert_eq!(first.created_at, Some(today()));
        assert_eq!(first.tags, vec!["costing", "manufacturing", "automation"]);

        let cache = TopicCache::load(temp.path().join("topics.json")).unwrap();
        assert_eq!(cache.topics().len(), 3);
        assert!(cache.contains("Складской учёт без Excel"));

        let prompt = search.client.prompt_for(PromptKind::Topics).unwrap();
        assert!(prompt.starts_with("Предложи 10 тем"));
    }

    #[test]
    fn test_cached_and_published_topics_are_dropped() {
        let temp = TempDir::new().unwrap();
        temp.child("topics.json")
            .write_str(r#"[{"topic": "Интеграция CRM и 1С"}]"#)
            .unwrap();
        temp.child("blog/sklad.md")
            .write_str("---\ntitle: \"Складской учёт без Excel\"\ndate: \"2026-10-01\"\n---\n\nТекст\n")
            .unwrap();

        let search = TopicSearch::new(config(&temp), client()).unwrap();
        let report = search.run_on("склад", 10, today()).unwrap();

        assert_eq!(report.accepted.len(), 1);
        assert_eq!(report.accepted[0].topic, "Калькулятор себестоимости для цеха");
        let reasons: Vec<_> = report.rejected.iter().map(|r| r.reason.as_str()).collect();
        assert!(reasons.contains(&"already cached"));
        assert!(reasons.iter().any(|r| r.starts_with("duplicates 'Складской учёт без Excel'")));

        let prompt = search.client.prompt_for(PromptKind::Topics).unwrap();
        assert!(prompt.contains("- Складской учёт без Excel"));
        assert!(prompt.contains("- Интеграция CRM и 1С"));

        let cache = TopicCache::load(temp.path().join("topics.json")).unwrap();
        assert_eq!(cache.topics().len(), 2);
    }

    #[test]
    fn test_count_limits_accepted() {
        let temp = TempDir::new().unwrap();
        let search = TopicSearch::new(config(&temp), client()).unwrap();
        let report = search.run_on("бизнес", 2, today()).unwrap();
        assert_eq!(report.accepted.len(), 2);
    }

    #[test]
    fn test_count_out_of_range() {
        let temp = TempDir::new().unwrap();
        let search = TopicSearch::new(config(&temp), client()).unwrap();
        assert!(search.run_on("бизнес", 0, today()).unwrap_err().is_validation());
        assert!(search.run_on("бизнес", 51, today()).unwrap_err().is_validation());
        assert!(search.run_on("  ", 5, today()).unwrap_err().is_validation());
        assert!(search.client.calls.borrow().is_empty());
    }

    #[test]
    fn test_dry_run_leaves_cache_alone() {
        let temp = TempDir::new().unwrap();
        let config = Config::builder()
            .posts_dir(temp.path().join("blog"))
            .topics_file(temp.path().join("topics.json"))
            .rules_file(temp.path().join("rules.json"))
            .dry_run(true)
            .build()
            .unwrap();
        let search = TopicSearch::new(config, client()).unwrap();

        let report = search.run_on("склад", 5, today()).unwrap();

        assert_eq!(report.accepted.len(), 3);
        assert!(!temp.child("topics.json").path().exists());
    }

    #[test]
    fn test_provider_failure_propagates() {
        let temp = TempDir::new().unwrap();
        let search =
            TopicSearch::new(config(&temp), FakeClient::default().fail(PromptKind::Topics)).unwrap();
        let err = search.run_on("склад", 5, today()).unwrap_err();
        assert!(matches!(err, Error::Api { .. }));
    }
}
