//! Proactive context builder: assembles a token-budgeted slice of the
//! project into the prompt without the user issuing explicit read
//! commands, directly adapted from the pack's Python
//! `ProactiveContextBuilder`.

pub mod mentions;

use mentions::extract_file_mentions;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

pub mod priority {
    pub const CRITICAL: u8 = 10;
    pub const HIGH: u8 = 8;
    pub const MEDIUM: u8 = 5;
    pub const LOW: u8 = 3;
    pub const BACKGROUND: u8 = 1;
}

const CHARS_PER_TOKEN: usize = 4;
const SINGLE_FILE_BUDGET_FRACTION: f64 = 0.3;

#[derive(Debug, Clone, PartialEq)]
pub struct FileReadResult {
    pub file_path: PathBuf,
    pub content: String,
    pub priority: u8,
    pub token_estimate: usize,
    pub read_reason: String,
    pub truncated: bool,
}

fn estimate_tokens(content: &str) -> usize {
    content.len() / CHARS_PER_TOKEN
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Language {
    Python,
    JavaScript,
    TypeScript,
    Other,
}

fn detect_language(path: &Path) -> Language {
    match path.extension().and_then(|e| e.to_str()).map(|e| e.to_lowercase()) {
        Some(ext) if ext == "py" => Language::Python,
        Some(ext) if ext == "js" || ext == "jsx" => Language::JavaScript,
        Some(ext) if ext == "ts" || ext == "tsx" => Language::TypeScript,
        _ => Language::Other,
    }
}

fn python_import_res() -> &'static [Regex; 2] {
    static RE: OnceLock<[Regex; 2]> = OnceLock::new();
    RE.get_or_init(|| {
        [
            Regex::new(r"(?m)^from\s+([\w.]+)\s+import").unwrap(),
            Regex::new(r"(?m)^import\s+([\w.]+)").unwrap(),
        ]
    })
}

fn js_import_res() -> &'static [Regex; 2] {
    static RE: OnceLock<[Regex; 2]> = OnceLock::new();
    RE.get_or_init(|| {
        [
            Regex::new(r#"import\s+.*\s+from\s+['"]([^'"]+)['"]"#).unwrap(),
            Regex::new(r#"require\(['"]([^'"]+)['"]\)"#).unwrap(),
        ]
    })
}

fn ts_import_res() -> &'static [Regex; 2] {
    static RE: OnceLock<[Regex; 2]> = OnceLock::new();
    RE.get_or_init(|| {
        [
            Regex::new(r#"import\s+.*\s+from\s+['"]([^'"]+)['"]"#).unwrap(),
            Regex::new(r#"import\s+['"]([^'"]+)['"]"#).unwrap(),
        ]
    })
}

/// Builds proactive context for a project rooted at `project_root`.
/// Caches read file contents for its own lifetime; construct a fresh
/// builder per session (or call [`ProactiveContextBuilder::clear_cache`])
/// if the underlying files may have changed.
pub struct ProactiveContextBuilder {
    project_root: PathBuf,
    context_budget: usize,
    file_cache: HashMap<PathBuf, String>,
    read_files: HashSet<PathBuf>,
}

impl ProactiveContextBuilder {
    pub fn new(project_root: impl Into<PathBuf>, model_context_window: usize, usage_ratio: f64) -> Self {
        let context_budget = (model_context_window as f64 * usage_ratio).floor() as usize;
        info!(target: "codewright::context", context_budget, "proactive context builder initialized");
        Self {
            project_root: project_root.into(),
            context_budget,
            file_cache: HashMap::new(),
            read_files: HashSet::new(),
        }
    }

    pub fn context_budget(&self) -> usize {
        self.context_budget
    }

    pub fn clear_cache(&mut self) {
        self.file_cache.clear();
        self.read_files.clear();
    }

    /// Builds context for one turn: explicitly requested files first
    /// (CRITICAL), then mentions in the current query (HIGH), then
    /// dependencies discovered from already-read files (MEDIUM), then
    /// mentions drawn from conversation history (LOW).
    pub fn build_smart_context(
        &mut self,
        user_query: &str,
        conversation_history: &[String],
        explicitly_mentioned: &[String],
    ) -> HashMap<String, FileReadResult> {
        let mut context_files: HashMap<String, FileReadResult> = HashMap::new();
        let mut current_tokens = 0usize;

        for file_str in explicitly_mentioned {
            if let Some(path) = self.resolve_file_path(file_str) {
                if let Some(result) =
                    self.read_file_with_priority(&path, priority::CRITICAL, "Explicitly requested by user")
                {
                    current_tokens += result.token_estimate;
                    context_files.insert(path_key(&path), result);
                }
            }
        }

        let mut query_mentions = extract_file_mentions(user_query);
        query_mentions.sort_by(|a, b| b.1.cmp(&a.1));
        for (file_str, confidence) in query_mentions {
            if current_tokens >= self.context_budget {
                info!(target: "codewright::context", "context budget exhausted, stopping file reads");
                break;
            }
            let Some(path) = self.resolve_file_path(&file_str) else { continue };
            let key = path_key(&path);
            if context_files.contains_key(&key) {
                continue;
            }
            if let Some(result) = self.read_file_with_priority(
                &path,
                priority::HIGH,
                &format!("Mentioned in query (confidence: {confidence})"),
            ) {
                current_tokens += result.token_estimate;
                context_files.insert(key, result);
            }
        }

        let already_read: Vec<PathBuf> = context_files.values().map(|r| r.file_path.clone()).collect();
        for file_path in already_read {
            if current_tokens >= self.context_budget {
                break;
            }
            let related = self.find_related_files(&file_path);
            for related_path in related {
                if current_tokens >= self.context_budget {
                    break;
                }
                let key = path_key(&related_path);
                if context_files.contains_key(&key) {
                    continue;
                }
                let reason = format!(
                    "Related to {}",
                    file_path.file_name().and_then(|n| n.to_str()).unwrap_or("")
                );
                if let Some(result) = self.read_file_with_priority(&related_path, priority::MEDIUM, &reason) {
                    current_tokens += result.token_estimate;
                    context_files.insert(key, result);
                }
            }
        }

        if !conversation_history.is_empty() {
            let tail: Vec<&String> = conversation_history.iter().rev().take(5).collect();
            let history_text = tail.into_iter().rev().cloned().collect::<Vec<_>>().join(" ");
            for (file_str, _confidence) in extract_file_mentions(&history_text) {
                if current_tokens >= self.context_budget {
                    break;
                }
                let Some(path) = self.resolve_file_path(&file_str) else { continue };
                let key = path_key(&path);
                if context_files.contains_key(&key) {
                    continue;
                }
                if let Some(result) =
                    self.read_file_with_priority(&path, priority::LOW, "Mentioned in recent conversation")
                {
                    current_tokens += result.token_estimate;
                    context_files.insert(key, result);
                }
            }
        }

        info!(
            target: "codewright::context",
            files = context_files.len(),
            tokens = current_tokens,
            "built proactive context"
        );
        context_files
    }

    fn read_file_with_priority(&mut self, file_path: &Path, priority: u8, reason: &str) -> Option<FileReadResult> {
        if !file_path.exists() {
            warn!(target: "codewright::context", path = %file_path.display(), "file not found");
            return None;
        }

        let content = if let Some(cached) = self.file_cache.get(file_path) {
            cached.clone()
        } else {
            let content = fs::read_to_string(file_path).ok()?;
            self.file_cache.insert(file_path.to_path_buf(), content.clone());
            content
        };

        let mut token_estimate = estimate_tokens(&content);
        let mut truncated = false;
        let mut final_content = content;

        let single_file_limit = (self.context_budget as f64 * SINGLE_FILE_BUDGET_FRACTION) as usize;
        if token_estimate > single_file_limit {
            let truncate_to_chars = (self.context_budget as f64 * SINGLE_FILE_BUDGET_FRACTION * CHARS_PER_TOKEN as f64) as usize;
            let half = truncate_to_chars / 2;
            let removed = final_content.len().saturating_sub(truncate_to_chars);
            let head = take_chars(&final_content, half, true);
            let tail = take_chars(&final_content, half, false);
            final_content = format!("{head}\n\n... [Truncated {removed} characters] ...\n\n{tail}");
            token_estimate = estimate_tokens(&final_content);
            truncated = true;
        }

        self.read_files.insert(file_path.to_path_buf());

        Some(FileReadResult {
            file_path: file_path.to_path_buf(),
            content: final_content,
            priority,
            token_estimate,
            read_reason: reason.to_string(),
            truncated,
        })
    }

    fn find_related_files(&mut self, file_path: &Path) -> Vec<PathBuf> {
        let mut related = Vec::new();

        let content = match self.file_cache.get(file_path) {
            Some(c) => c.clone(),
            None => match fs::read_to_string(file_path) {
                Ok(c) => c,
                Err(_) => return related,
            },
        };

        let lang = detect_language(file_path);
        let patterns: &[Regex] = match lang {
            Language::Python => python_import_res(),
            Language::JavaScript => js_import_res(),
            Language::TypeScript => ts_import_res(),
            Language::Other => &[],
        };

        for pattern in patterns {
            for captures in pattern.captures_iter(&content) {
                let Some(import) = captures.get(1) else { continue };
                if let Some(import_path) = self.import_to_path(import.as_str(), file_path, lang) {
                    if import_path.exists() {
                        related.push(import_path);
                    }
                }
            }
        }

        if let Some(test_file) = self.find_test_file(file_path) {
            if test_file.exists() {
                related.push(test_file);
            }
        }

        related
    }

    fn import_to_path(&self, import_str: &str, source_file: &Path, lang: Language) -> Option<PathBuf> {
        match lang {
            Language::Python => {
                let rel_path = format!("{}.py", import_str.replace('.', "/"));
                Some(self.project_root.join(rel_path))
            }
            Language::JavaScript | Language::TypeScript => {
                if import_str.starts_with('.') {
                    source_file.parent().map(|dir| dir.join(import_str))
                } else {
                    Some(self.project_root.join(import_str))
                }
            }
            Language::Other => None,
        }
    }

    fn find_test_file(&self, file_path: &Path) -> Option<PathBuf> {
        let name = file_path.file_stem()?.to_str()?;
        let ext = file_path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let parent = file_path.parent().unwrap_or(&self.project_root);

        let candidates = [
            parent.join(format!("test_{name}.{ext}")),
            parent.join(format!("{name}_test.{ext}")),
            self.project_root.join("tests").join(format!("test_{name}.{ext}")),
            self.project_root.join("test").join(format!("test_{name}.{ext}")),
        ];

        candidates.into_iter().find(|p| p.exists())
    }

    /// Resolution order: as-given if absolute and existing; joined to the
    /// project root; leading slash stripped then joined to the project
    /// root. Returns `None` if none exist.
    fn resolve_file_path(&self, file_str: &str) -> Option<PathBuf> {
        let as_given = Path::new(file_str);
        if as_given.is_absolute() && as_given.exists() {
            return Some(as_given.to_path_buf());
        }

        let joined = self.project_root.join(file_str);
        if joined.exists() {
            return Some(joined);
        }

        if let Some(stripped) = file_str.strip_prefix('/') {
            let joined = self.project_root.join(stripped);
            if joined.exists() {
                return Some(joined);
            }
        }

        debug!(target: "codewright::context", file_str, "could not resolve file path");
        None
    }
}

fn path_key(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn take_chars(s: &str, n: usize, from_start: bool) -> String {
    if from_start {
        s.chars().take(n).collect()
    } else {
        let total = s.chars().count();
        let skip = total.saturating_sub(n);
        s.chars().skip(skip).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn explicit_file_read_at_critical_priority() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("main.rs"), "fn main() {}").unwrap();
        let mut builder = ProactiveContextBuilder::new(dir.path(), 100_000, 0.7);

        let ctx = builder.build_smart_context("hello", &[], &["main.rs".to_string()]);
        assert_eq!(ctx.len(), 1);
        let result = ctx.values().next().unwrap();
        assert_eq!(result.priority, priority::CRITICAL);
    }

    #[test]
    fn query_mention_is_read_at_high_priority() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("app.py"), "print('hi')").unwrap();
        let mut builder = ProactiveContextBuilder::new(dir.path(), 100_000, 0.7);

        let ctx = builder.build_smart_context("what does app.py do?", &[], &[]);
        assert_eq!(ctx.len(), 1);
        assert_eq!(ctx.values().next().unwrap().priority, priority::HIGH);
    }

    #[test]
    fn python_import_is_discovered_as_medium_priority() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("main.py"), "import helper\n").unwrap();
        fs::write(dir.path().join("helper.py"), "def f(): pass").unwrap();
        let mut builder = ProactiveContextBuilder::new(dir.path(), 100_000, 0.7);

        let ctx = builder.build_smart_context("look at main.py", &[], &[]);
        let priorities: Vec<u8> = ctx.values().map(|r| r.priority).collect();
        assert!(priorities.contains(&priority::HIGH));
        assert!(priorities.contains(&priority::MEDIUM));
    }

    #[test]
    fn adjacent_test_file_is_discovered() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("util.py"), "x = 1").unwrap();
        fs::write(dir.path().join("test_util.py"), "assert True").unwrap();
        let mut builder = ProactiveContextBuilder::new(dir.path(), 100_000, 0.7);

        let ctx = builder.build_smart_context("check util.py", &[], &[]);
        assert!(ctx.keys().any(|k| k.contains("test_util.py")));
    }

    #[test]
    fn large_file_is_truncated_with_marker() {
        let dir = tempdir().unwrap();
        let huge = "x".repeat(10_000);
        fs::write(dir.path().join("huge.rs"), &huge).unwrap();
        // Small budget forces the single-file cap well under the file size.
        let mut builder = ProactiveContextBuilder::new(dir.path(), 1_000, 0.7);

        let ctx = builder.build_smart_context("read huge.rs", &[], &[]);
        let result = ctx.values().next().unwrap();
        assert!(result.truncated);
        assert!(result.content.contains("Truncated"));
    }

    #[test]
    fn conversation_history_mentions_are_low_priority() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("old.rs"), "fn old() {}").unwrap();
        let mut builder = ProactiveContextBuilder::new(dir.path(), 100_000, 0.7);

        let history = vec!["can you check old.rs again".to_string()];
        let ctx = builder.build_smart_context("unrelated question", &history, &[]);
        assert_eq!(ctx.values().next().unwrap().priority, priority::LOW);
    }

    #[test]
    fn missing_file_is_skipped_not_errored() {
        let dir = tempdir().unwrap();
        let mut builder = ProactiveContextBuilder::new(dir.path(), 100_000, 0.7);
        let ctx = builder.build_smart_context("read ghost.rs", &[], &[]);
        assert!(ctx.is_empty());
    }

    #[test]
    fn budget_floor_is_computed_from_window_and_ratio() {
        let dir = tempdir().unwrap();
        let builder = ProactiveContextBuilder::new(dir.path(), 1000, 0.7);
        assert_eq!(builder.context_budget(), 700);
    }
}
