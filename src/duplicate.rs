//! Near-duplicate detection against already published posts.

use crate::heuristics::Heuristics;
use crate::post::BlogPost;
use crate::text::{jaccard, overlap, Normalizer};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, warn};

const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.5;
const DEFAULT_MIN_OVERLAP: usize = 3;
const DEFAULT_MIN_CANDIDATE_TOKENS: usize = 4;
const DEFAULT_RECENCY_DAYS: i64 = 30;

/// Tunable limits of the duplicate heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DuplicateThresholds {
    /// Similarity strictly above this marks a post as similar
    pub similarity: f64,
    /// Shared tokens needed for the overlap rule
    pub min_overlap: usize,
    /// Candidate tokens needed for the overlap rule
    pub min_candidate_tokens: usize,
    /// Similar posts younger than this block the candidate
    pub recency_days: i64,
}

impl Default for DuplicateThresholds {
    fn default() -> Self {
        Self {
            similarity: DEFAULT_SIMILARITY_THRESHOLD,
            min_overlap: DEFAULT_MIN_OVERLAP,
            min_candidate_tokens: DEFAULT_MIN_CANDIDATE_TOKENS,
            recency_days: DEFAULT_RECENCY_DAYS,
        }
    }
}

/// Existing post that resembles the candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateMatch {
    /// Title of the existing post
    pub title: String,
    /// Slug of the existing post
    pub slug: String,
    /// Publication date, if known
    pub date: Option<NaiveDate>,
    /// Jaccard similarity with the candidate
    pub similarity: f64,
    /// Number of shared stemmed tokens
    pub overlap: usize,
    /// Days since publication, if the date is known
    pub age_days: Option<i64>,
}

/// Verdict for one candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateCheck {
    /// Candidate collides with a recent similar post
    pub is_duplicate: bool,
    /// Best similarity across all posts
    pub similarity: f64,
    /// The most relevant similar post, if any
    pub matched: Option<DuplicateMatch>,
    /// Set when only older similar posts exist
    pub warning: Option<String>,
}

impl DuplicateCheck {
    fn clean(similarity: f64) -> Self {
        Self {
            is_duplicate: false,
            similarity,
            matched: None,
            warning: None,
        }
    }
}

/// Compares candidate titles with existing posts.
#[derive(Debug, Clone)]
pub struct DuplicateDetector {
    normalizer: Normalizer,
    thresholds: DuplicateThresholds,
}

impl DuplicateDetector {
    /// Creates a detector.
    #[must_use]
    pub fn new(heuristics: &Heuristics, thresholds: DuplicateThresholds) -> Self {
        Self {
            normalizer: Normalizer::new(heuristics),
            thresholds,
        }
    }

    /// Checks `candidate` against `posts` as of `today`.
    ///
    /// A post is similar when the Jaccard score exceeds the threshold, or
    /// when enough stemmed tokens overlap and the candidate is long enough.
    /// Only a similar post younger than `recency_days` makes the candidate a
    /// duplicate; a post without a readable date counts as recent.
    #[must_use]
    pub fn check(&self, candidate: &str, posts: &[BlogPost], today: NaiveDate) -> DuplicateCheck {
        let candidate_tokens = self.normalizer.tokenize(candidate);
        if candidate_tokens.is_empty() {
            debug!("Candidate '{}' has no key tokens", candidate);
            return DuplicateCheck::clean(0.0);
        }

        let mut best_similarity = 0.0_f64;
        let mut recent: Option<DuplicateMatch> = None;
        let mut older: Option<DuplicateMatch> = None;

        for post in posts {
            let tokens = self.normalizer.tokenize(post.title());
            let similarity = jaccard(&candidate_tokens, &tokens);
            let shared = overlap(&candidate_tokens, &tokens);
            best_similarity = best_similarity.max(similarity);

            let similar = similarity > self.thresholds.similarity
                || (shared >= self.thresholds.min_overlap
                    && candidate_tokens.len() >= self.thresholds.min_candidate_tokens);
            if !similar {
                continue;
            }

            let date = post.published_on();
            let age_days = date.map(|d| (today - d).num_days());
            let found = DuplicateMatch {
                title: post.title().to_string(),
                slug: post.front_matter.slug.clone(),
                date,
                similarity,
                overlap: shared,
                age_days,
            };
            debug!(
                "Similar post '{}' (similarity {:.2}, overlap {}, age {:?})",
                found.title, similarity, shared, age_days
            );

            let is_recent = age_days.is_none_or(|age| age < self.thresholds.recency_days);
            let slot = if is_recent { &mut recent } else { &mut older };
            if slot.as_ref().is_none_or(|m| similarity > m.similarity) {
                *slot = Some(found);
            }
        }

        if let Some(found) = recent {
            return DuplicateCheck {
                is_duplicate: true,
                similarity: best_similarity,
                matched: Some(found),
                warning: None,
            };
        }

        if let Some(found) = older {
            let message = format!(
                "Similar post '{}' exists ({} days old, similarity {:.2}); allowed because it is older than {} days",
                found.title,
                found.age_days.unwrap_or_default(),
                found.similarity,
                self.thresholds.recency_days
            );
            warn!("{}", message);
            return DuplicateCheck {
                is_duplicate: false,
                similarity: best_similarity,
                matched: Some(found),
                warning: Some(message),
            };
        }

        DuplicateCheck::clean(best_similarity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::post::FrontMatter;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    fn post(title: &str, date: &str) -> BlogPost {
        BlogPost {
            front_matter: FrontMatter {
                title: title.to_string(),
                slug: crate::slug::slugify(title),
                date: date.to_string(),
                author: String::new(),
                category: String::new(),
                tags: Vec::new(),
                excerpt: String::new(),
            },
            body: String::new(),
            path: None,
        }
    }

    fn detector() -> DuplicateDetector {
        DuplicateDetector::new(&Heuristics::builtin(), DuplicateThresholds::default())
    }

    #[test]
    fn test_identical_recent_title_is_duplicate() {
        let posts = vec![post("Автоматизация расчёта себестоимости", "2026-10-10")];
        let check = detector().check("Автоматизация расчёта себестоимости", &posts, today());

        assert!(check.is_duplicate);
        assert!((check.similarity - 1.0).abs() < f64::EPSILON);
        let matched = check.matched.unwrap();
        assert_eq!(matched.age_days, Some(8));
    }

    #[test]
    fn test_disjoint_titles() {
        let posts = vec![post("Складской учёт для интернет-магазина", "2026-10-10")];
        let check = detector().check("Конфигуратор оконных конструкций", &posts, today());

        assert!(!check.is_duplicate);
        assert!(check.similarity.abs() < f64::EPSILON);
        assert!(check.matched.is_none());
        assert!(check.warning.is_none());
    }

    #[test]
    fn test_old_similar_post_only_warns() {
        let posts = vec![post("Автоматизация расчёта себестоимости", "2026-08-01")];
        let check = detector().check("Автоматизация расчёта себестоимости", &posts, today());

        assert!(!check.is_duplicate);
        assert!((check.similarity - 1.0).abs() < f64::EPSILON);
        assert!(check.warning.unwrap().contains("78 days"));
    }

    #[test]
    fn test_exactly_recency_boundary_is_old() {
        let posts = vec![post("Автоматизация КП", "2026-09-18")];
        let check = detector().check("Автоматизация КП", &posts, today());
        assert!(!check.is_duplicate);
    }

    #[test]
    fn test_undated_post_counts_as_recent() {
        let posts = vec![post("Автоматизация КП", "")];
        let check = detector().check("Автоматизация КП", &posts, today());
        assert!(check.is_duplicate);
        assert_eq!(check.matched.unwrap().age_days, None);
    }

    #[test]
    fn test_overlap_rule_for_long_candidates() {
        // 3 общих токена из 7 → jaccard < 0.5, но срабатывает правило перекрытия
        let posts = vec![post("Расчёт себестоимости мебели на производстве", "2026-10-15")];
        let check = detector().check(
            "Как ускорить расчёт себестоимости мебели: чек-лист руководителя",
            &posts,
            today(),
        );
        assert!(check.similarity <= 0.5);
        assert!(check.is_duplicate);
        assert_eq!(check.matched.unwrap().overlap, 3);
    }

    #[test]
    fn test_overlap_rule_needs_long_candidate() {
        let posts = vec![post(
            "Расчёт себестоимости мебели на производстве и складе малого бизнеса",
            "2026-10-15",
        )];
        // 3 токена у кандидата: правило перекрытия не применяется
        let check = detector().check("Расчёт себестоимости мебели", &posts, today());
        assert!(check.similarity <= 0.5);
        assert!(!check.is_duplicate);
    }

    #[test]
    fn test_prefers_recent_match_over_older_better_one() {
        let posts = vec![
            post("Автоматизация КП", "2026-01-01"),
            post("Автоматизация КП для завода", "2026-10-17"),
        ];
        let check = detector().check("Автоматизация КП", &posts, today());
        assert!(check.is_duplicate);
        assert!((check.similarity - 1.0).abs() < f64::EPSILON);
        assert_eq!(check.matched.unwrap().title, "Автоматизация КП для завода");
    }

    #[test]
    fn test_custom_thresholds() {
        let thresholds = DuplicateThresholds {
            recency_days: 365,
            ..DuplicateThresholds::default()
        };
        let detector = DuplicateDetector::new(&Heuristics::builtin(), thresholds);
        let posts = vec![post("Автоматизация КП", "2026-01-01")];
        assert!(detector.check("Автоматизация КП", &posts, today()).is_duplicate);
    }

    #[test]
    fn test_stop_word_only_candidate() {
        let posts = vec![post("Как и что", "2026-10-10")];
        let check = detector().check("как и что", &posts, today());
        assert!(!check.is_duplicate);
        assert!(check.similarity.abs() < f64::EPSILON);
    }
}
