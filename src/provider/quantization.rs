//! Quantization-tag extraction from free-form model names.
//!
//! Different backends surface the quantization scheme in different
//! places (a suffix on Ollama tags, a path segment for LM Studio), so
//! each provider family gets its own small pattern rather than one
//! universal regex.

use regex::Regex;
use std::sync::OnceLock;

fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(Q4_0|Q4_K_M|Q4_K_S|Q5_K_M|Q5_K_S|Q8_0|F16|F32)\b").unwrap()
    })
}

/// Extracts a quantization tag from an Ollama model tag, e.g.
/// `llama3:8b-instruct-q4_K_M` -> `Some("Q4_K_M")`.
pub fn parse_ollama_quantization(name: &str) -> Option<String> {
    tag_regex().find(name).map(|m| m.as_str().to_uppercase())
}

/// Extracts a quantization tag from an LM Studio model path, e.g.
/// `TheBloke/Mistral-7B-GGUF/mistral-7b.Q5_K_M.gguf` -> `Some("Q5_K_M")`.
pub fn parse_lm_studio_quantization(path: &str) -> Option<String> {
    tag_regex().find(path).map(|m| m.as_str().to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_from_ollama_tag() {
        assert_eq!(
            parse_ollama_quantization("llama3:8b-instruct-q4_K_M"),
            Some("Q4_K_M".to_string())
        );
    }

    #[test]
    fn extracts_from_lm_studio_path() {
        assert_eq!(
            parse_lm_studio_quantization("TheBloke/Mistral-7B-GGUF/mistral-7b.Q5_K_M.gguf"),
            Some("Q5_K_M".to_string())
        );
    }

    #[test]
    fn returns_none_when_absent() {
        assert_eq!(parse_ollama_quantization("llama3:8b"), None);
    }

    #[test]
    fn recognizes_f16_and_f32() {
        assert_eq!(parse_ollama_quantization("model-f16"), Some("F16".to_string()));
        assert_eq!(parse_ollama_quantization("model-F32"), Some("F32".to_string()));
    }
}
