//! Keyword-driven tag inference.

use crate::heuristics::{Heuristics, KeywordGroup};
use tracing::trace;

/// Maps free text to taxonomy tags by substring matching.
#[derive(Debug, Clone)]
pub struct TagInferrer {
    groups: Vec<KeywordGroup>,
    base_tags: Vec<String>,
}

impl TagInferrer {
    /// Creates an inferrer from the heuristic tables.
    #[must_use]
    pub fn new(heuristics: &Heuristics) -> Self {
        let groups = heuristics
            .keyword_groups
            .iter()
            .map(|g| KeywordGroup {
                keywords: g.keywords.iter().map(|k| k.to_lowercase()).collect(),
                tags: g.tags.clone(),
            })
            .collect();

        Self {
            groups,
            base_tags: heuristics.base_tags.clone(),
        }
    }

    /// Returns tags implied by `text`, in group order, without repeats.
    ///
    /// Base tags are appended whenever at least one group matched.
    #[must_use]
    pub fn infer(&self, text: &str) -> Vec<String> {
        let haystack = text.to_lowercase();
        let mut tags: Vec<String> = Vec::new();

        for group in &self.groups {
            let Some(keyword) = group.keywords.iter().find(|k| haystack.contains(k.as_str())) else {
                continue;
            };
            trace!("Keyword '{}' implies {:?}", keyword, group.tags);
            for tag in &group.tags {
                push_unique(&mut tags, tag);
            }
        }

        if !tags.is_empty() {
            for tag in &self.base_tags {
                push_unique(&mut tags, tag);
            }
        }

        tags
    }
}

/// Appends `tag` unless an equal tag is already present.
pub(crate) fn push_unique(tags: &mut Vec<String>, tag: &str) {
    let tag = tag.trim();
    if !tag.is_empty() && !tags.iter().any(|t| t == tag) {
        tags.push(tag.to_string());
    }
}

/// Merges tag lists, keeping first-seen order.
#[must_use]
pub fn merge_tags<'a>(lists: impl IntoIterator<Item = &'a [String]>) -> Vec<String> {
    let mut merged = Vec::new();
    for list in lists {
        for tag in list {
            push_unique(&mut merged, tag);
        }
    }
    merged
}

/// Parses a comma-separated tag list into lowercase tags.
#[must_use]
pub fn parse_tag_list(raw: &str) -> Vec<String> {
    let mut tags = Vec::new();
    for part in raw.split([',', '\n', ';']) {
        let tag = part
            .trim()
            .trim_start_matches(['-', '*', '#'])
            .trim()
            .trim_matches(['"', '\'', '`'])
            .to_lowercase();
        push_unique(&mut tags, &tag);
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inferrer() -> TagInferrer {
        TagInferrer::new(&Heuristics::builtin())
    }

    #[test]
    fn test_costing_and_quotations() {
        let tags = inferrer().infer("Как себестоимость влияет на скорость подготовки КП");
        for expected in ["costing", "quotations", "configurators", "automation"] {
            assert!(tags.iter().any(|t| t == expected), "missing {expected} in {tags:?}");
        }
    }

    #[test]
    fn test_group_order_and_no_repeats() {
        let tags = inferrer().infer("КП и конфигуратор: себестоимость");
        assert_eq!(tags, vec!["costing", "quotations", "configurators", "automation"]);
    }

    #[test]
    fn test_no_match_gives_no_tags() {
        assert!(inferrer().infer("Новости компании").is_empty());
    }

    #[test]
    fn test_case_insensitive() {
        let tags = inferrer().infer("Интеграция CRM с 1С");
        assert_eq!(tags, vec!["crm", "erp", "integrations", "automation"]);
    }

    #[test]
    fn test_merge_tags() {
        let a = vec!["crm".to_string(), "sales".to_string()];
        let b = vec!["sales".to_string(), "automation".to_string()];
        assert_eq!(merge_tags([a.as_slice(), b.as_slice()]), vec!["crm", "sales", "automation"]);
    }

    #[test]
    fn test_parse_tag_list() {
        assert_eq!(
            parse_tag_list("CRM, \"sales\" ,, - automation\n`ai`"),
            vec!["crm", "sales", "automation", "ai"]
        );
    }
}
