//! File-mention extraction: scans free text for path-shaped tokens the
//! user likely meant as file references.

use regex::Regex;
use std::sync::OnceLock;

const EXPLICIT_CONFIDENCE: u8 = 10;
const ENTITY_CONFIDENCE: u8 = 5;
const DIRECTORY_CONFIDENCE: u8 = 3;

fn explicit_path_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)[\w/.-]+\.(?:py|js|ts|tsx|jsx|java|cpp|h|hpp|c|rs|go|rb|php|md|txt|json|yaml|yml|toml|sh|bash)",
        )
        .unwrap()
    })
}

fn entity_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b([A-Z][a-zA-Z0-9_]+(?:Manager|Service|Handler|Client|Editor|Parser|Builder))\b").unwrap())
}

fn directory_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b((?:[\w-]+/)+[\w-]+)\b").unwrap())
}

fn pascal_to_snake(name: &str) -> String {
    let mut out = String::new();
    for (i, ch) in name.chars().enumerate() {
        if ch.is_uppercase() && i != 0 {
            out.push('_');
        }
        out.extend(ch.to_lowercase());
    }
    out
}

/// Extracts `(path_candidate, confidence)` pairs from a block of text.
/// Confidence follows the closed three-tier scheme: explicit paths with a
/// known extension (10), inferred entity names (5), directory-looking
/// tokens (3). URLs are never treated as directory mentions.
pub fn extract_file_mentions(text: &str) -> Vec<(String, u8)> {
    let mut mentions = Vec::new();

    for m in explicit_path_re().find_iter(text) {
        let cleaned = m.as_str().trim_matches(|c: char| ".,;:!?()[]{}\"'".contains(c));
        if !cleaned.is_empty() {
            mentions.push((cleaned.to_string(), EXPLICIT_CONFIDENCE));
        }
    }

    for captures in entity_re().captures_iter(text) {
        let entity = &captures[1];
        let snake = pascal_to_snake(entity);
        mentions.push((format!("{snake}.py"), ENTITY_CONFIDENCE));
    }

    for captures in directory_re().captures_iter(text) {
        let candidate = &captures[1];
        if candidate.contains('/') && !candidate.starts_with("http") {
            mentions.push((candidate.to_string(), DIRECTORY_CONFIDENCE));
        }
    }

    mentions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_extension_gets_highest_confidence() {
        let mentions = extract_file_mentions("please look at src/main.rs for the bug");
        assert!(mentions.contains(&("src/main.rs".to_string(), EXPLICIT_CONFIDENCE)));
    }

    #[test]
    fn pascal_case_entity_is_converted_to_snake_case_module() {
        let mentions = extract_file_mentions("the FileEditor class is broken");
        assert!(mentions.contains(&("file_editor.py".to_string(), ENTITY_CONFIDENCE)));
    }

    #[test]
    fn directory_looking_token_gets_low_confidence() {
        let mentions = extract_file_mentions("check src/utils for helpers");
        assert!(mentions.iter().any(|(p, c)| p == "src/utils" && *c == DIRECTORY_CONFIDENCE));
    }

    #[test]
    fn urls_are_never_treated_as_directory_mentions() {
        let mentions = extract_file_mentions("see http://example.com/docs/api for reference");
        assert!(!mentions.iter().any(|(p, _)| p.starts_with("http")));
    }
}
