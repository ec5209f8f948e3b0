//! Prompts for each generation step.
//!
//! Every step has a fixed system prompt, a Tera template for the user
//! prompt, and its own completion budget.

use serde::Serialize;

/// Generation step a prompt belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PromptKind {
    /// Post title
    Title,
    /// Short teaser for listings and meta description
    Excerpt,
    /// Comma-separated taxonomy tags
    Tags,
    /// Full Markdown article body
    Article,
    /// JSON array of topic ideas
    Topics,
}

impl PromptKind {
    /// Returns the ID string for this step.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Excerpt => "excerpt",
            Self::Tags => "tags",
            Self::Article => "article",
            Self::Topics => "topics",
        }
    }

    /// Returns all steps.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Title,
            Self::Excerpt,
            Self::Tags,
            Self::Article,
            Self::Topics,
        ]
    }

    /// Name of the user-prompt template.
    #[must_use]
    pub const fn template_name(self) -> &'static str {
        match self {
            Self::Title => "prompts/title",
            Self::Excerpt => "prompts/excerpt",
            Self::Tags => "prompts/tags",
            Self::Article => "prompts/article",
            Self::Topics => "prompts/topics",
        }
    }

    /// Requested completion budget in tokens.
    #[must_use]
    pub const fn max_tokens(self) -> u32 {
        match self {
            Self::Title => 100,
            Self::Excerpt => 300,
            Self::Tags => 100,
            Self::Article => 4_000,
            Self::Topics => 2_000,
        }
    }

    /// System prompt for this step.
    #[must_use]
    pub const fn system_prompt(self) -> &'static str {
        match self {
            Self::Title => {
                "Ты редактор блога компании, которая автоматизирует процессы малого и среднего бизнеса. \
                 Отвечай одним заголовком без кавычек и пояснений."
            }
            Self::Excerpt => {
                "Ты редактор блога о бизнес-автоматизации. \
                 Пиши короткие анонсы статей: 1-2 предложения, без кавычек и эмодзи."
            }
            Self::Tags => {
                "Ты классифицируешь статьи блога. \
                 Отвечай только списком тегов через запятую, латиницей, в нижнем регистре."
            }
            Self::Article => {
                "Ты автор экспертного блога о бизнес-автоматизации для собственников и руководителей. \
                 Пиши на русском языке в формате Markdown, с подзаголовками ## и ###, \
                 практическими примерами и без воды. Не добавляй блоки со ссылками на услуги."
            }
            Self::Topics => {
                "Ты SEO-стратег блога о бизнес-автоматизации. \
                 Отвечай только JSON-массивом объектов без пояснений."
            }
        }
    }
}

/// Values available to user-prompt templates.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PromptContext {
    /// Topic the post is about
    pub topic: String,
    /// Chosen or generated title
    pub title: Option<String>,
    /// Generated excerpt
    pub excerpt: Option<String>,
    /// Blog category
    pub category: Option<String>,
    /// Tags chosen so far
    pub tags: Vec<String>,
    /// SEO keywords from the topic cache
    pub keywords: Vec<String>,
    /// Target reader from the topic cache
    pub audience: Option<String>,
    /// Tags the model may choose from
    pub allowed_tags: Vec<String>,
    /// Titles already published
    pub existing_titles: Vec<String>,
    /// Number of ideas requested
    pub count: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let mut ids: Vec<_> = PromptKind::all().iter().map(|k| k.id()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), PromptKind::all().len());
    }

    #[test]
    fn test_article_has_largest_budget() {
        let max = PromptKind::all().iter().map(|k| k.max_tokens()).max().unwrap();
        assert_eq!(max, PromptKind::Article.max_tokens());
    }

    #[test]
    fn test_template_names_follow_ids() {
        for kind in PromptKind::all() {
            assert!(kind.template_name().ends_with(kind.id()));
            assert!(!kind.system_prompt().is_empty());
        }
    }
}
