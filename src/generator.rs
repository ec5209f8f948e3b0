use crate::{
    config::Config,
    duplicate::{DuplicateCheck, DuplicateDetector},
    error::{Error, Result},
    heuristics::Heuristics,
    links::{LinkInjector, RelatedLinks},
    llm::{CompletionClient, CompletionRequest},
    post::FrontMatter,
    prompt::{PromptContext, PromptKind},
    rules::ContentRules,
    slug::slugify,
    store::PostStore,
    tags::{merge_tags, parse_tag_list, TagInferrer},
    template::TemplateEngine,
    topics::TopicCache,
};
use chrono::NaiveDate;
use serde::Serialize;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

const MAX_TITLE_CHARS: usize = 120;

/// What to write about.
#[derive(Debug, Clone, Default)]
pub struct GenerateRequest {
    /// Topic of the post; required
    pub topic: String,
    /// Fixed title; generated when absent
    pub title: Option<String>,
    /// Category; the configured default when absent
    pub category: Option<String>,
    /// Fixed tags; generated when empty
    pub tags: Vec<String>,
}

impl GenerateRequest {
    /// Creates a request for `topic` with everything else left to generation.
    #[must_use]
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            ..Self::default()
        }
    }
}

/// Generation step that fell back to a substitute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Fallback {
    /// Topic used as the title
    Title,
    /// Topic used as the excerpt
    Excerpt,
    /// Default tag list used
    Tags,
}

/// Outcome of one article generation.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    /// Final title
    pub title: String,
    /// Slug and file stem
    pub slug: String,
    /// Written file; `None` in dry-run mode
    pub path: Option<PathBuf>,
    /// Category written to front-matter
    pub category: String,
    /// Tags written to front-matter
    pub tags: Vec<String>,
    /// Tags removed by the allow-list
    pub rejected_tags: Vec<String>,
    /// Excerpt written to front-matter
    pub excerpt: String,
    /// Internal links appended to the body
    pub links: RelatedLinks,
    /// Steps that used a substitute value
    pub fallbacks: Vec<Fallback>,
    /// Non-fatal findings
    pub warnings: Vec<String>,
    /// Rendered file content
    pub content: String,
    /// Whether nothing was written
    pub dry_run: bool,
    /// Total execution time
    pub duration: Duration,
}

impl GenerationReport {
    /// Prints a human-readable summary to stdout.
    pub fn print_summary(&self) {
        println!("\n╔═══════════════════════════════════════════════════════╗");
        println!("║               Post Generation Summary                 ║");
        println!("╚═══════════════════════════════════════════════════════╝");
        println!("  Title:      {}", self.title);
        println!("  Slug:       {}", self.slug);
        println!("  Category:   {}", self.category);
        println!("  Tags:       {}", self.tags.join(", "));
        if !self.rejected_tags.is_empty() {
            println!("  Rejected:   {}", self.rejected_tags.join(", "));
        }
        println!(
            "  Links:      {} services, {} cases",
            self.links.services.len(),
            self.links.cases.len()
        );
        match &self.path {
            Some(path) => println!("  Written to: {}", path.display()),
            None => println!("  Dry run:    nothing written"),
        }
        if !self.fallbacks.is_empty() {
            println!("  Fallbacks:  {:?}", self.fallbacks);
        }
        for warning in &self.warnings {
            println!("  ⚠ {warning}");
        }
        println!("  Time:       {:.2}s\n", self.duration.as_secs_f64());
    }
}

/// Generates one post: title, excerpt, tags, body, links, file.
pub struct Generator<C> {
    config: Config,
    client: C,
    store: PostStore,
    rules: ContentRules,
    detector: DuplicateDetector,
    inferrer: TagInferrer,
    injector: LinkInjector,
    templates: TemplateEngine,
    default_tags: Vec<String>,
}

impl<C: CompletionClient> Generator<C> {
    /// Creates a generator with the given configuration and client.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration validation fails
    /// - The heuristics or rules file is invalid
    /// - Template compilation fails
    pub fn new(config: Config, client: C) -> Result<Self> {
        config.validate()?;

        let heuristics = Heuristics::load(config.heuristics_file.as_deref())?;
        let rules = ContentRules::load_or_default(&config.rules_file)?;
        let store = PostStore::new(&config.posts_dir, &config.post_patterns)?;

        Ok(Self {
            detector: DuplicateDetector::new(&heuristics, config.thresholds),
            inferrer: TagInferrer::new(&heuristics),
            injector: LinkInjector::new(heuristics.links.clone()),
            default_tags: heuristics.default_tags,
            templates: TemplateEngine::new()?,
            config,
            client,
            store,
            rules,
        })
    }

    /// Generates a post dated today.
    ///
    /// # Errors
    ///
    /// See [`Generator::generate_on`].
    pub fn generate(&self, request: &GenerateRequest) -> Result<GenerationReport> {
        self.generate_on(request, chrono::Local::now().date_naive())
    }

    /// Generates a post dated `today`.
    ///
    /// Title, excerpt and tag failures fall back to the topic or the
    /// default tags. A body failure, a recent duplicate or an existing slug
    /// aborts without writing anything.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The topic is empty or the category is not allowed
    /// - The topic or title duplicates a recent post
    /// - The article body cannot be generated
    /// - A post with the same slug exists
    /// - The file cannot be written
    #[instrument(skip(self, request), fields(topic = %request.topic))]
    pub fn generate_on(
        &self,
        request: &GenerateRequest,
        today: NaiveDate,
    ) -> Result<GenerationReport> {
        let start_time = Instant::now();
        let mut fallbacks = Vec::new();
        let mut warnings = Vec::new();

        // Шаг 1: проверки
        let topic = request.topic.trim();
        if topic.is_empty() {
            return Err(Error::validation("topic must not be empty"));
        }
        let category = request
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(&self.config.default_category)
            .to_string();
        self.rules.validate_category(&category)?;

        let (posts, _) = self.store.load_all()?;
        let explicit_title = request
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty());
        for candidate in std::iter::once(topic).chain(explicit_title) {
            let check = self.detector.check(candidate, &posts, today);
            Self::reject_duplicate(candidate, &check)?;
            warnings.extend(check.warning);
        }

        // Шаг 2: контекст из кэша тем
        let mut ctx = PromptContext {
            topic: topic.to_string(),
            category: Some(category.clone()),
            allowed_tags: self.rules.allowed_tags.clone(),
            ..PromptContext::default()
        };
        match TopicCache::load(&self.config.topics_file) {
            Ok(cache) => {
                if let Some(suggestion) = cache.find(topic) {
                    debug!("Seeding keywords from cached topic '{}'", suggestion.topic);
                    ctx.keywords = suggestion.keywords().into_iter().map(String::from).collect();
                    ctx.audience = Some(suggestion.audience.clone()).filter(|a| !a.is_empty());
                }
            }
            Err(e) => warn!("Topic cache unavailable: {}", e),
        }

        // Шаг 3: заголовок
        let title = match explicit_title {
            Some(title) => title.to_string(),
            None => match self.ask(PromptKind::Title, &ctx).map(|t| clean_line(&t)) {
                Ok(title) if !title.is_empty() => title,
                Ok(_) => {
                    warn!("Title generation returned nothing, using the topic");
                    fallbacks.push(Fallback::Title);
                    topic.to_string()
                }
                Err(e) => {
                    warn!("Title generation failed, using the topic: {}", e);
                    fallbacks.push(Fallback::Title);
                    topic.to_string()
                }
            },
        };
        ctx.title = Some(title.clone());

        let slug = slugify(&title);
        if let Some(path) = self.store.existing(&slug) {
            return Err(Error::SlugExists { slug, path });
        }

        // Шаг 4: анонс
        let excerpt = match self.ask(PromptKind::Excerpt, &ctx).map(|e| clean_paragraph(&e)) {
            Ok(excerpt) if !excerpt.is_empty() => excerpt,
            result => {
                if let Err(e) = result {
                    warn!("Excerpt generation failed, using the topic: {}", e);
                }
                fallbacks.push(Fallback::Excerpt);
                topic.to_string()
            }
        };
        ctx.excerpt = Some(excerpt.clone());

        // Шаг 5: теги
        let base_tags = if request.tags.is_empty() {
            match self.ask(PromptKind::Tags, &ctx).map(|t| parse_tag_list(&t)) {
                Ok(tags) if !tags.is_empty() => tags,
                result => {
                    if let Err(e) = result {
                        warn!("Tag generation failed, using defaults: {}", e);
                    }
                    fallbacks.push(Fallback::Tags);
                    self.default_tags.clone()
                }
            }
        } else {
            merge_tags([request.tags.as_slice()])
        };
        let inferred = self.inferrer.infer(&format!(
            "{} {} {}",
            topic,
            title,
            base_tags.join(" ")
        ));
        let merged = merge_tags([base_tags.as_slice(), inferred.as_slice()]);
        let (mut tags, rejected_tags) = self.rules.filter_tags(&merged);
        if !rejected_tags.is_empty() {
            warn!("Tags not in the allow-list dropped: {}", rejected_tags.join(", "));
        }
        if tags.is_empty() {
            tags = self.rules.filter_tags(&self.default_tags).0;
        }
        ctx.tags = tags.clone();

        // Шаг 6: статья; ошибка здесь фатальна
        let article = self.ask(PromptKind::Article, &ctx)?;
        let article = strip_leading_heading(&article);
        if article.trim().is_empty() {
            return Err(Error::api(None, "article body is empty"));
        }
        let (body, links) = self.injector.inject(&article, &tags);

        for word in self.rules.forbidden_in(&format!("{title}\n{excerpt}\n{body}")) {
            let message = format!("Forbidden word '{word}' found in generated text");
            warn!("{}", message);
            warnings.push(message);
        }

        // Шаг 7: запись
        let front_matter = FrontMatter {
            title: title.clone(),
            slug: slug.clone(),
            date: today.format("%Y-%m-%d").to_string(),
            author: self.config.author.clone(),
            category: category.clone(),
            tags: tags.clone(),
            excerpt: excerpt.clone(),
        };
        let content = self.templates.render_post(&front_matter, &body)?;

        let path = if self.config.dry_run {
            info!("Dry run: not writing {}", self.store.path_for(&slug).display());
            None
        } else {
            Some(self.store.create(&slug, &content)?)
        };

        Ok(GenerationReport {
            title,
            slug,
            path,
            category,
            tags,
            rejected_tags,
            excerpt,
            links,
            fallbacks,
            warnings,
            content,
            dry_run: self.config.dry_run,
            duration: start_time.elapsed(),
        })
    }

    fn reject_duplicate(candidate: &str, check: &DuplicateCheck) -> Result<()> {
        if !check.is_duplicate {
            return Ok(());
        }
        let (existing, similarity, age_days) = check.matched.as_ref().map_or_else(
            || (String::new(), check.similarity, 0),
            |m| (m.title.clone(), m.similarity, m.age_days.unwrap_or_default()),
        );
        Err(Error::Duplicate {
            candidate: candidate.to_string(),
            existing,
            similarity,
            age_days,
        })
    }

    fn ask(&self, kind: PromptKind, ctx: &PromptContext) -> Result<String> {
        let user = self.templates.render_prompt(kind, ctx)?;
        let request = CompletionRequest::new(kind.system_prompt(), user, kind.max_tokens());
        debug!("Requesting {}", kind.id());
        self.client.complete(&request)
    }
}

/// First non-empty line without quotes or Markdown heading marks.
fn clean_line(text: &str) -> String {
    let line = text
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or_default();
    let line = line
        .trim_start_matches('#')
        .trim()
        .trim_matches(['"', '\'', '«', '»', '“', '”', '*'])
        .trim();
    line.chars().take(MAX_TITLE_CHARS).collect()
}

/// Collapses whitespace and strips wrapping quotes.
fn clean_paragraph(text: &str) -> String {
    let joined = text.split_whitespace().collect::<Vec<_>>().join(" ");
    joined
        .trim_matches(['"', '\'', '«', '»', '“', '”'])
        .trim()
        .to_string()
}

/// Drops a leading `# ...` line; the page renders the title itself.
fn strip_leading_heading(article: &str) -> String {
    let trimmed = article.trim_start();
    match trimmed.split_once('\n') {
        Some((first, rest)) if first.starts_with("# ") => rest.trim_start().to_string(),
        None if trimmed.starts_with("# ") => String::new(),
        _ => trimmed.to_string(),
    }
}
