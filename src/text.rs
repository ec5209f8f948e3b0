//! Title normalization for near-duplicate matching.

use crate::heuristics::Heuristics;
use std::collections::HashSet;

const MIN_TOKEN_CHARS: usize = 2;

/// Lowercases, drops stop words and stems words of a title.
#[derive(Debug, Clone)]
pub struct Normalizer {
    stop_words: HashSet<String>,
    /// Longest first, so the stemmer strips the longest matching ending.
    suffixes: Vec<String>,
    min_stem_len: usize,
}

impl Normalizer {
    /// Builds a normalizer from the heuristic tables.
    #[must_use]
    pub fn new(heuristics: &Heuristics) -> Self {
        let stop_words = heuristics
            .stop_words
            .iter()
            .map(|w| fold(&w.to_lowercase()))
            .collect();

        let mut suffixes: Vec<String> = heuristics
            .suffixes
            .iter()
            .map(|s| fold(&s.to_lowercase()))
            .filter(|s| !s.is_empty())
            .collect();
        suffixes.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));
        suffixes.dedup();

        Self {
            stop_words,
            suffixes,
            min_stem_len: heuristics.min_stem_len,
        }
    }

    /// Splits text into a set of stemmed key tokens.
    #[must_use]
    pub fn tokenize(&self, text: &str) -> HashSet<String> {
        let lowered = fold(&text.to_lowercase());
        lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.chars().count() >= MIN_TOKEN_CHARS)
            .filter(|w| !self.stop_words.contains(*w))
            .map(|w| self.stem(w))
            .collect()
    }

    /// Strips one known ending, keeping at least `min_stem_len` characters.
    #[must_use]
    pub fn stem(&self, word: &str) -> String {
        let word_len = word.chars().count();
        for suffix in &self.suffixes {
            let suffix_len = suffix.chars().count();
            if word_len >= suffix_len + self.min_stem_len && word.ends_with(suffix.as_str()) {
                return word[..word.len() - suffix.len()].to_string();
            }
        }
        word.to_string()
    }
}

/// Size of the intersection over size of the union. Two empty sets score 0.
#[must_use]
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    intersection as f64 / union as f64
}

/// Number of tokens the two sets share.
#[must_use]
pub fn overlap(a: &HashSet<String>, b: &HashSet<String>) -> usize {
    a.intersection(b).count()
}

fn fold(s: &str) -> String {
    s.replace('ё', "е")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> Normalizer {
        Normalizer::new(&Heuristics::builtin())
    }

    fn set(words: &[&str]) -> HashSet<String> {
        words.iter().map(|w| (*w).to_string()).collect()
    }

    #[test]
    fn test_stem_strips_longest_suffix() {
        let n = normalizer();
        assert_eq!(n.stem("продажами"), "продаж");
        assert_eq!(n.stem("автоматизация"), "автоматиза");
        assert_eq!(n.stem("автоматизации"), "автоматиза");
    }

    #[test]
    fn test_stem_keeps_short_words() {
        let n = normalizer();
        assert_eq!(n.stem("кп"), "кп");
        assert_eq!(n.stem("цех"), "цех");
        assert_eq!(n.stem("crm"), "crm");
    }

    #[test]
    fn test_tokenize_drops_stop_words() {
        let n = normalizer();
        let tokens = n.tokenize("Как автоматизировать КП для производства");
        assert!(!tokens.iter().any(|t| t == "как" || t == "для"));
        assert!(tokens.contains("кп"));
        assert_eq!(tokens.len(), 3);
    }

    #[test]
    fn test_tokenize_folds_yo_and_case() {
        let n = normalizer();
        assert_eq!(n.tokenize("Расчёт СЕБЕСТОИМОСТИ"), n.tokenize("расчет себестоимость"));
    }

    #[test]
    fn test_inflections_share_stems() {
        let n = normalizer();
        let a = n.tokenize("Автоматизация коммерческих предложений");
        let b = n.tokenize("автоматизации коммерческого предложения");
        assert_eq!(a, b);
    }

    #[test]
    fn test_jaccard() {
        assert!((jaccard(&set(&["a", "b"]), &set(&["a", "b"])) - 1.0).abs() < f64::EPSILON);
        assert!((jaccard(&set(&["a", "b"]), &set(&["b", "c"])) - 1.0 / 3.0).abs() < 1e-9);
        assert!(jaccard(&set(&["a"]), &set(&["b"])).abs() < f64::EPSILON);
        assert!(jaccard(&HashSet::new(), &HashSet::new()).abs() < f64::EPSILON);
    }

    #[test]
    fn test_overlap() {
        assert_eq!(overlap(&set(&["a", "b", "c"]), &set(&["b", "c", "d"])), 2);
    }
}
