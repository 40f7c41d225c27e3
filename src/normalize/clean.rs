//! Name cleaning and search normalization.

use regex::Regex;
use std::sync::LazyLock;

use crate::models::RawPoiRecord;

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex is valid"));

/// Tags consulted for a display name, in order
pub const NAME_PRIORITY: &[&str] = &["name", "amenity", "shop", "tourism"];

pub const UNNAMED: &str = "Unnamed POI";

/// Characters trimmed from either end of a name. Brackets, `&` and `'` are kept.
const STRAY_PUNCTUATION: &[char] = &[
    '.', ',', ';', ':', '!', '?', '-', '_', '/', '\\', '|', '*', '"', '`', '~', '#', '@', '+', '=',
    '^', '<', '>',
];

/// Trim, collapse internal whitespace and strip stray punctuation
pub fn clean_text(raw: &str) -> String {
    let collapsed = WHITESPACE.replace_all(raw.trim(), " ");

    let kept: Vec<&str> = collapsed
        .split(' ')
        .filter(|token| token.chars().any(|c| c.is_alphanumeric()) || *token == "&")
        .collect();

    kept.join(" ")
        .trim_matches(|c: char| STRAY_PUNCTUATION.contains(&c) || c.is_whitespace())
        .to_string()
}

/// Lowercase, whitespace-collapsed form used for dedup and search.
/// Queries go through the same function.
pub fn normalize_name(text: &str) -> String {
    clean_text(text).to_lowercase()
}

/// Display name for a raw record, falling back through [`NAME_PRIORITY`]
pub fn clean_name(raw: &RawPoiRecord) -> String {
    for key in NAME_PRIORITY {
        let Some(value) = raw.tag(key) else {
            continue;
        };
        let candidate = if *key == "name" {
            clean_text(value)
        } else {
            if matches!(value.trim(), "yes" | "no") {
                continue;
            }
            clean_text(&humanize(value))
        };
        if !candidate.is_empty() {
            return candidate;
        }
    }
    UNNAMED.to_string()
}

/// `place_of_worship` -> `Place of worship`
fn humanize(value: &str) -> String {
    let spaced = value.replace('_', " ");
    let mut chars = spaced.trim().chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
