//! URL slugs from Russian titles.

use once_cell::sync::Lazy;
use regex::Regex;

const MAX_SLUG_LEN: usize = 80;

static SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s_]+").expect("valid regex"));
static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9-]").expect("valid regex"));
static DASHES: Lazy<Regex> = Lazy::new(|| Regex::new(r"-{2,}").expect("valid regex"));

/// Latin spelling of a lowercase Cyrillic letter, if it is one.
fn transliterate_char(c: char) -> Option<&'static str> {
    let latin = match c {
        'а' => "a",
        'б' => "b",
        'в' => "v",
        'г' => "g",
        'д' => "d",
        'е' => "e",
        'ё' => "yo",
        'ж' => "zh",
        'з' => "z",
        'и' => "i",
        'й' => "y",
        'к' => "k",
        'л' => "l",
        'м' => "m",
        'н' => "n",
        'о' => "o",
        'п' => "p",
        'р' => "r",
        'с' => "s",
        'т' => "t",
        'у' => "u",
        'ф' => "f",
        'х' => "kh",
        'ц' => "ts",
        'ч' => "ch",
        'ш' => "sh",
        'щ' => "sch",
        'ъ' | 'ь' => "",
        'ы' => "y",
        'э' => "e",
        'ю' => "yu",
        'я' => "ya",
        _ => return None,
    };
    Some(latin)
}

/// Transliterates Cyrillic to Latin, leaving other characters alone.
#[must_use]
pub fn transliterate(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.to_lowercase().chars() {
        match transliterate_char(c) {
            Some(latin) => out.push_str(latin),
            None => out.push(c),
        }
    }
    out
}

/// Builds a slug, or `None` when nothing URL-safe is left.
#[must_use]
pub fn try_slugify(title: &str) -> Option<String> {
    let latin = transliterate(title.trim());
    let dashed = SEPARATORS.replace_all(&latin, "-");
    let cleaned = NON_WORD.replace_all(&dashed, "");
    let collapsed = DASHES.replace_all(&cleaned, "-");
    let slug = truncate(collapsed.trim_matches('-'));

    if slug.is_empty() {
        None
    } else {
        Some(slug.to_string())
    }
}

/// Builds a slug, falling back to `post-<unix millis>` for titles with no
/// usable characters.
#[must_use]
pub fn slugify(title: &str) -> String {
    try_slugify(title)
        .unwrap_or_else(|| format!("post-{}", chrono::Utc::now().timestamp_millis()))
}

/// Cuts at a dash boundary when the slug is too long. Input is ASCII.
fn truncate(slug: &str) -> &str {
    if slug.len() <= MAX_SLUG_LEN {
        return slug;
    }
    let head = &slug[..MAX_SLUG_LEN];
    match head.rfind('-') {
        Some(pos) if pos > 0 => &head[..pos],
        _ => head.trim_end_matches('-'),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cyrillic_title() {
        assert_eq!(slugify("Автоматизация КП"), "avtomatizatsiya-kp");
    }

    #[test]
    fn test_multi_letter_sounds() {
        assert_eq!(slugify("Щука и жёлтый ёж"), "schuka-i-zhyoltyy-yozh");
        assert_eq!(slugify("Объём подъезда"), "obyom-podezda");
    }

    #[test]
    fn test_punctuation_and_digits() {
        assert_eq!(
            slugify("Как сократить расчёт КП в 5 раз: опыт 2026 года!"),
            "kak-sokratit-raschyot-kp-v-5-raz-opyt-2026-goda"
        );
        assert_eq!(slugify("  CRM + 1С = ? "), "crm-1s");
    }

    #[test]
    fn test_mixed_latin() {
        assert_eq!(slugify("Telegram-бот для продаж"), "telegram-bot-dlya-prodazh");
    }

    #[test]
    fn test_empty_falls_back_to_timestamp() {
        let slug = slugify("!!! ???");
        assert!(slug.starts_with("post-"));
        assert!(slug["post-".len()..].chars().all(|c| c.is_ascii_digit()));
        assert_eq!(try_slugify("!!! ???"), None);
    }

    #[test]
    fn test_long_title_truncated_at_dash() {
        let title = "Автоматизация ".repeat(10);
        let slug = slugify(&title);
        assert!(slug.len() <= MAX_SLUG_LEN);
        assert!(!slug.ends_with('-'));
        assert!(slug.starts_with("avtomatizatsiya-"));
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(slugify("Склад и остатки"), slugify("Склад и остатки"));
    }
}
