//! Deterministic plan extraction from a collected ARCHITECT-mode response,
//! grounded in the `Plan`/`propose_plan` shape in `src/llm` but
//! recomputed here as a pure function over response text rather than a
//! second LLM round-trip.

use std::sync::OnceLock;

const FILE_EXTENSIONS: &[&str] = &[".py", ".js", ".ts", ".json", ".md", ".txt", ".yml", ".yaml", ".toml"];
const ACTION_WORDS: &[&str] =
    &["create", "modify", "delete", "update", "add", "remove", "implement", "refactor"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Complexity {
    Simple,
    Moderate,
    Complex,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PendingPlan {
    pub files_affected: Vec<String>,
    pub actions: Vec<String>,
    pub summary: Vec<String>,
    pub complexity: Complexity,
    /// The full response text, shown on `show full`.
    pub full_text: String,
}

fn word_re() -> &'static regex::Regex {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| regex::Regex::new(r"\S+").unwrap())
}

fn strip_punctuation(token: &str) -> &str {
    token.trim_matches(|c: char| c.is_ascii_punctuation() && c != '.' && c != '_' && c != '-')
}

fn extract_files_affected(text: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut files = Vec::new();
    for raw in word_re().find_iter(text).map(|m| m.as_str()) {
        let token = strip_punctuation(raw);
        if token.len() <= 3 {
            continue;
        }
        let matches_extension = FILE_EXTENSIONS.iter().any(|ext| token.ends_with(ext));
        if !matches_extension {
            continue;
        }
        if seen.insert(token.to_string()) {
            files.push(token.to_string());
            if files.len() == 10 {
                break;
            }
        }
    }
    files
}

fn extract_actions(text: &str) -> Vec<String> {
    let mut actions = Vec::new();
    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.len() <= 10 || trimmed.starts_with('#') {
            continue;
        }
        let lower = trimmed.to_lowercase();
        if ACTION_WORDS.iter().any(|w| lower.contains(w)) {
            actions.push(trimmed.to_string());
            if actions.len() == 10 {
                break;
            }
        }
    }
    actions
}

fn extract_summary(text: &str) -> Vec<String> {
    let mut summary = Vec::new();
    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.len() <= 20 {
            continue;
        }
        if trimmed.contains("```") || trimmed.contains("---") || trimmed.contains("===") || trimmed.contains("***") {
            continue;
        }
        summary.push(trimmed.to_string());
        if summary.len() == 3 {
            break;
        }
    }
    summary
}

fn classify_complexity(files_affected: usize, actions: usize) -> Complexity {
    if files_affected > 3 || actions > 5 {
        Complexity::Complex
    } else if files_affected > 1 || actions > 2 {
        Complexity::Moderate
    } else {
        Complexity::Simple
    }
}

/// Runs the §4.4.1 heuristic over a fully-collected ARCHITECT response.
pub fn extract_plan(response_text: &str) -> PendingPlan {
    let files_affected = extract_files_affected(response_text);
    let actions = extract_actions(response_text);
    let summary = extract_summary(response_text);
    let complexity = classify_complexity(files_affected.len(), actions.len());
    PendingPlan { files_affected, actions, summary, complexity, full_text: response_text.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_unique_file_mentions_in_order() {
        let plan = extract_plan("Edit src/main.py then src/main.py again, also config.toml.");
        assert_eq!(plan.files_affected, vec!["src/main.py", "config.toml"]);
    }

    #[test]
    fn extracts_actions_by_keyword() {
        let text = "short\ncreate a new handler module for requests\n# skip this comment line entirely\njust a normal sentence with no verb";
        let plan = extract_plan(text);
        assert_eq!(plan.actions, vec!["create a new handler module for requests"]);
    }

    #[test]
    fn classifies_complex_when_many_files_or_actions() {
        let text = "a.py b.py c.py d.py\ncreate one\nmodify two\ndelete three\nupdate four\nadd five\nremove six";
        let plan = extract_plan(text);
        assert_eq!(plan.complexity, Complexity::Complex);
    }

    #[test]
    fn classifies_simple_for_minimal_plan() {
        let plan = extract_plan("Just a short explanation with nothing actionable in it at all.");
        assert_eq!(plan.complexity, Complexity::Simple);
    }

    #[test]
    fn summary_skips_code_fences_and_short_lines() {
        let text = "```\nshort\n```\nThis is a genuinely long line describing the plan in detail.";
        let plan = extract_plan(text);
        assert_eq!(plan.summary, vec!["This is a genuinely long line describing the plan in detail."]);
    }
}
