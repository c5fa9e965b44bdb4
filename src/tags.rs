//! Tag normalization
//!
//! Tags are plain lowercase strings with spaces collapsed to hyphens,
//! capped at 30 characters. Tag identity derives from the normalized name,
//! so equal text always yields the same tag ID.

use uuid::Uuid;

use crate::entries::Tag;

/// Maximum length of a normalized tag name
const MAX_TAG_LENGTH: usize = 30;

/// Tags offered for quick selection
pub const TAG_PRESETS: [&str; 15] = [
    "personal",
    "work",
    "family",
    "health",
    "goals",
    "gratitude",
    "reflection",
    "ideas",
    "dreams",
    "travel",
    "fitness",
    "learning",
    "creative",
    "social",
    "finance",
];

/// Normalize a raw tag string
///
/// Lowercases, trims, strips everything outside `[a-z0-9 -]`, replaces
/// runs of whitespace with a single hyphen and caps the length.
pub fn normalize_tag_string(raw: &str) -> String {
    let lowered = raw.to_lowercase();

    let stripped = lowered
        .trim()
        .chars()
        .filter(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || *ch == ' ' || *ch == '-')
        .collect::<String>();

    let mut normalized = String::with_capacity(stripped.len());
    let mut in_whitespace = false;

    for ch in stripped.chars() {
        if ch == ' ' {
            if !in_whitespace {
                normalized.push('-');
            }
            in_whitespace = true;
        } else {
            normalized.push(ch);
            in_whitespace = false;
        }
    }

    normalized.chars().take(MAX_TAG_LENGTH).collect()
}

/// Build a [`Tag`](Tag) from a raw string
///
/// The ID is a UUIDv5 of the normalized name, so the same text produces
/// the same tag in every context.
pub fn normalize_tag(raw: &str) -> Tag {
    let name = normalize_tag_string(raw);

    Tag {
        id: Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()),
        name,
    }
}

/// Split free text on commas/whitespace into normalized tag names
///
/// Duplicates are dropped, first occurrence wins.
pub fn parse_tags(input: &str) -> Vec<String> {
    let mut seen = Vec::new();

    for raw in input.split(|ch: char| ch == ',' || ch.is_whitespace()) {
        if raw.trim().is_empty() {
            continue;
        }

        let normalized = normalize_tag_string(raw);

        if !normalized.is_empty() && !seen.contains(&normalized) {
            seen.push(normalized);
        }
    }

    seen
}

/// Suggest existing tags matching the given input
pub fn tag_suggestions<'t>(input: &str, existing: &'t [String], limit: usize) -> Vec<&'t String> {
    if input.trim().is_empty() {
        return Vec::new();
    }

    let normalized = normalize_tag_string(input);

    existing
        .iter()
        .filter(|tag| tag.contains(&normalized) && **tag != normalized)
        .take(limit)
        .collect()
}

/// Does the raw string normalize to a usable tag?
pub fn is_valid_tag(raw: &str) -> bool {
    !normalize_tag_string(raw).is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_tag_string() {
        assert_eq!("work", normalize_tag_string("Work"));
        assert_eq!("deep-work", normalize_tag_string("  Deep   Work "));
        assert_eq!("caf-visit", normalize_tag_string("Café! Visit?"));
        assert_eq!("2025-goals", normalize_tag_string("2025 Goals"));
        assert_eq!("", normalize_tag_string("!!!"));
    }

    #[test]
    fn test_normalize_tag_string_caps_length() {
        let long = "a".repeat(50);
        assert_eq!(30, normalize_tag_string(&long).len());
    }

    #[test]
    fn test_normalize_tag_is_deterministic() {
        let first = normalize_tag("Morning Walk");
        let second = normalize_tag("morning   walk");

        assert_eq!("morning-walk", first.name);
        assert_eq!(first.name, second.name);
        assert_eq!(first.id, second.id);
    }

    #[test]
    fn test_different_names_get_different_ids() {
        assert_ne!(normalize_tag("work").id, normalize_tag("family").id);
    }

    #[test]
    fn test_parse_tags_dedupes_preserving_order() {
        assert_eq!(
            vec!["work".to_string(), "family".to_string(), "health".to_string()],
            parse_tags("Work, family work,health")
        );
        assert!(parse_tags("   ").is_empty());
        assert!(parse_tags(", , ,").is_empty());
    }

    #[test]
    fn test_tag_suggestions() {
        let existing = vec![
            "work".to_string(),
            "workout".to_string(),
            "family".to_string(),
        ];

        let suggestions = tag_suggestions("work", &existing, 5);
        assert_eq!(vec![&"workout".to_string()], suggestions);

        assert!(tag_suggestions("", &existing, 5).is_empty());
    }

    #[test]
    fn test_is_valid_tag() {
        assert!(is_valid_tag("Work"));
        assert!(!is_valid_tag("  "));
        assert!(!is_valid_tag("!!!"));
    }
}
