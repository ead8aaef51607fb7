//! Smart router: decides how a raw turn should be processed before
//! anything is sent to the provider, the way `ToolRouter`
//! decides which internal prompt mode a turn falls into before any tool
//! call — here the decision is which *route* a turn takes, not which
//! tools are unlocked.

pub mod intent;

use crate::mode::Mode;
use intent::{ClarificationOption, Intent};
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;
use tracing::warn;

/// Candidates are ranked most-likely-first and capped at this many options
/// when a turn is ambiguous enough to need clarification.
const MAX_CANDIDATES: usize = 4;

/// Action verbs that disqualify a turn from the plain-chat fast path
/// even while in CHAT mode.
const ACTION_VERBS: &[&str] = &[
    "create", "delete", "modify", "update", "change", "fix", "add", "remove", "refactor", "write",
    "edit", "implement",
];

fn slash_command_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^/([A-Za-z][A-Za-z0-9_-]*)(?:\s+(.*))?$").unwrap())
}

/// The decision the router reaches for a single turn.
#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    SlashCommand { name: String, args: String },
    PassthroughChat,
    NaturalLanguage(Intent),
    Clarification { options: Vec<ClarificationOption>, missing_files: Vec<String> },
}

/// Result of asking the provider to extract structured intent from a turn.
/// A parse failure is not an error the caller has to handle: the router
/// falls back to `PassthroughChat` itself and logs a warning. Returns every
/// candidate interpretation the extractor found, ranked most-likely-first,
/// so an ambiguous turn can offer more than one option at clarification time.
pub trait IntentExtractor {
    fn extract(&self, input: &str, history: &[String]) -> Option<Vec<Intent>>;
}

pub struct SmartRouter {
    pub confidence_threshold: f64,
    pub history_window: usize,
    history: Vec<String>,
    pending_clarification: Option<Vec<ClarificationOption>>,
}

impl SmartRouter {
    pub fn new(confidence_threshold: f64, history_window: usize) -> Self {
        Self {
            confidence_threshold,
            history_window,
            history: Vec::new(),
            pending_clarification: None,
        }
    }

    fn push_history(&mut self, turn: String) {
        self.history.push(turn);
        let window = self.history_window;
        if self.history.len() > window {
            let overflow = self.history.len() - window;
            self.history.drain(0..overflow);
        }
    }

    fn history_snapshot(&self) -> Vec<String> {
        self.history.clone()
    }

    /// Resolves a reply to a pending clarification: a 1-based numeric
    /// index selects an option, "cancel" aborts back to passthrough chat.
    fn resolve_clarification(&mut self, input: &str) -> Option<Route> {
        let options = self.pending_clarification.take()?;
        let trimmed = input.trim();
        if trimmed.eq_ignore_ascii_case("cancel") {
            return Some(Route::PassthroughChat);
        }
        let index: usize = trimmed.parse().ok()?;
        if index == 0 || index > options.len() {
            // Invalid index: restore the pending clarification so the
            // user can try again.
            self.pending_clarification = Some(options);
            return None;
        }
        let mut chosen = options[index - 1].intent.clone();
        chosen.promote_confidence(self.confidence_threshold);
        Some(Route::NaturalLanguage(chosen))
    }

    /// Routes one turn of input. `mode` is the assistant's current
    /// operating mode; `file_exists` lets the caller supply filesystem
    /// truth without the router doing I/O itself.
    pub fn route(
        &mut self,
        input: &str,
        mode: Mode,
        extractor: &dyn IntentExtractor,
        file_exists: impl Fn(&str) -> bool,
    ) -> Route {
        let trimmed = input.trim();

        if let Some(captures) = slash_command_re().captures(trimmed) {
            let name = captures.get(1).unwrap().as_str().to_string();
            let args = captures.get(2).map(|m| m.as_str().to_string()).unwrap_or_default();
            return Route::SlashCommand { name, args };
        }

        if self.pending_clarification.is_some() {
            if let Some(route) = self.resolve_clarification(trimmed) {
                self.push_history(input.to_string());
                return route;
            }
        }

        if mode == Mode::Chat && !contains_action_verb(trimmed) {
            self.push_history(input.to_string());
            return Route::PassthroughChat;
        }

        let history = self.history_snapshot();
        let Some(mut candidates) = extractor.extract(trimmed, &history) else {
            warn!(target: "codewright::router", "intent extraction failed to parse; falling back to passthrough chat");
            self.push_history(input.to_string());
            return Route::PassthroughChat;
        };
        if candidates.is_empty() {
            warn!(target: "codewright::router", "intent extraction returned no candidates; falling back to passthrough chat");
            self.push_history(input.to_string());
            return Route::PassthroughChat;
        }

        self.push_history(input.to_string());

        candidates.sort_by(|a, b| b.confidence.partial_cmp(&a.confidence).unwrap_or(std::cmp::Ordering::Equal));
        candidates.truncate(MAX_CANDIDATES);

        let primary = candidates[0].clone();
        let missing_files: Vec<String> = primary
            .referenced_files
            .iter()
            .filter(|f| !file_exists(f))
            .cloned()
            .collect();

        if primary.confidence < self.confidence_threshold || !missing_files.is_empty() {
            let options: Vec<ClarificationOption> = candidates
                .into_iter()
                .map(|intent| ClarificationOption { reasoning: intent.reasoning.clone(), intent })
                .collect();
            self.pending_clarification = Some(options.clone());
            return Route::Clarification { options, missing_files };
        }

        Route::NaturalLanguage(primary)
    }
}

fn contains_action_verb(input: &str) -> bool {
    let lower = input.to_lowercase();
    ACTION_VERBS.iter().any(|verb| lower.contains(verb))
}

/// Asks the provider to classify a turn into a structured [`Intent`] via
/// a one-shot, non-streaming completion. A schema is embedded directly
/// in the prompt rather than relying on provider-side function-calling,
/// since not every provider this crate talks to (HF TGI in particular)
/// supports it.
pub struct ProviderIntentExtractor<'a> {
    pub provider: &'a crate::provider::Provider,
    pub model: String,
}

impl<'a> ProviderIntentExtractor<'a> {
    pub fn new(provider: &'a crate::provider::Provider, model: impl Into<String>) -> Self {
        Self { provider, model: model.into() }
    }
}

const INTENT_SCHEMA_PROMPT: &str = r#"Classify the user's request into 1 to 4 candidate interpretations, ranked most likely first. Respond with exactly one JSON object and nothing else, matching this shape:
{"candidates": [{"action": "create"|"edit"|"delete"|"refactor"|"explain"|"query", "referenced_files": [string], "confidence": number between 0 and 1, "reasoning": short string}]}
Include more than one candidate only when the request is genuinely ambiguous."#;

/// Wire shape for a multi-candidate classification reply.
#[derive(Debug, Clone, Deserialize)]
struct IntentCandidates {
    candidates: Vec<Intent>,
}

impl<'a> IntentExtractor for ProviderIntentExtractor<'a> {
    fn extract(&self, input: &str, history: &[String]) -> Option<Vec<Intent>> {
        use crate::provider::{ChatMessage, ChatParams};

        let mut messages = vec![ChatMessage::system(INTENT_SCHEMA_PROMPT)];
        for turn in history {
            messages.push(ChatMessage::user(turn.clone()));
        }
        messages.push(ChatMessage::user(input.to_string()));

        let params = ChatParams::new(self.model.clone());
        let response = match self.provider.chat(&messages, &params) {
            Ok(text) => text,
            Err(err) => {
                warn!(target: "codewright::router", error = %err, "intent extraction request failed");
                return None;
            }
        };

        let json_slice = extract_json_object(&response)?;
        match serde_json::from_str::<IntentCandidates>(json_slice) {
            Ok(parsed) if !parsed.candidates.is_empty() => Some(parsed.candidates),
            Ok(_) => {
                warn!(target: "codewright::router", "intent extraction response had no candidates");
                None
            }
            Err(err) => {
                warn!(target: "codewright::router", error = %err, "intent extraction response did not parse");
                None
            }
        }
    }
}

/// The provider may wrap its JSON answer in prose or a markdown fence;
/// this takes the text between the first `{` and its matching last `}`.
fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use intent::ActionType;

    struct FixedExtractor(Option<Vec<Intent>>);
    impl IntentExtractor for FixedExtractor {
        fn extract(&self, _input: &str, _history: &[String]) -> Option<Vec<Intent>> {
            self.0.clone()
        }
    }

    fn high_confidence_intent() -> Intent {
        Intent {
            action: ActionType::Edit,
            referenced_files: vec!["src/lib.rs".to_string()],
            confidence: 0.95,
            reasoning: "edit lib.rs".to_string(),
        }
    }

    #[test]
    fn slash_prefixed_input_never_reaches_the_provider() {
        let mut router = SmartRouter::new(0.7, 10);
        let extractor = FixedExtractor(None);
        let route = router.route("/help verbose", Mode::Chat, &extractor, |_| true);
        assert_eq!(
            route,
            Route::SlashCommand { name: "help".to_string(), args: "verbose".to_string() }
        );
    }

    #[test]
    fn chat_mode_without_action_verbs_is_passthrough() {
        let mut router = SmartRouter::new(0.7, 10);
        let extractor = FixedExtractor(None);
        let route = router.route("what does this function do?", Mode::Chat, &extractor, |_| true);
        assert_eq!(route, Route::PassthroughChat);
    }

    #[test]
    fn chat_mode_with_action_verb_still_extracts_intent() {
        let mut router = SmartRouter::new(0.7, 10);
        let extractor = FixedExtractor(Some(vec![high_confidence_intent()]));
        let route = router.route("please fix the bug", Mode::Chat, &extractor, |_| true);
        assert_eq!(route, Route::NaturalLanguage(high_confidence_intent()));
    }

    #[test]
    fn parse_failure_falls_back_to_passthrough_chat() {
        let mut router = SmartRouter::new(0.7, 10);
        let extractor = FixedExtractor(None);
        let route = router.route("refactor the thing", Mode::Architect, &extractor, |_| true);
        assert_eq!(route, Route::PassthroughChat);
    }

    #[test]
    fn low_confidence_triggers_clarification() {
        let mut router = SmartRouter::new(0.7, 10);
        let mut intent = high_confidence_intent();
        intent.confidence = 0.3;
        let extractor = FixedExtractor(Some(vec![intent]));
        let route = router.route("refactor the thing", Mode::Architect, &extractor, |_| true);
        assert!(matches!(route, Route::Clarification { .. }));
    }

    #[test]
    fn low_confidence_with_multiple_candidates_offers_them_all() {
        let mut router = SmartRouter::new(0.7, 10);
        let candidates = vec![
            Intent {
                action: ActionType::Edit,
                referenced_files: vec![],
                confidence: 0.4,
                reasoning: "edit the file".to_string(),
            },
            Intent {
                action: ActionType::Refactor,
                referenced_files: vec![],
                confidence: 0.3,
                reasoning: "refactor it instead".to_string(),
            },
        ];
        let extractor = FixedExtractor(Some(candidates));
        let route = router.route("clean this up", Mode::Architect, &extractor, |_| true);
        match route {
            Route::Clarification { options, .. } => {
                assert_eq!(options.len(), 2);
                assert_eq!(options[0].reasoning, "edit the file");
            }
            other => panic!("expected Clarification, got {other:?}"),
        }
    }

    #[test]
    fn missing_referenced_file_triggers_clarification() {
        let mut router = SmartRouter::new(0.7, 10);
        let extractor = FixedExtractor(Some(vec![high_confidence_intent()]));
        let route = router.route("edit src/lib.rs", Mode::Architect, &extractor, |_| false);
        match route {
            Route::Clarification { missing_files, .. } => {
                assert_eq!(missing_files, vec!["src/lib.rs".to_string()]);
            }
            other => panic!("expected Clarification, got {other:?}"),
        }
    }

    #[test]
    fn numeric_reply_resolves_pending_clarification() {
        let mut router = SmartRouter::new(0.7, 10);
        let mut intent = high_confidence_intent();
        intent.confidence = 0.2;
        let extractor = FixedExtractor(Some(vec![intent]));
        let first = router.route("refactor the thing", Mode::Architect, &extractor, |_| true);
        assert!(matches!(first, Route::Clarification { .. }));

        let second = router.route("1", Mode::Architect, &extractor, |_| true);
        match second {
            Route::NaturalLanguage(resolved) => assert!(resolved.confidence >= 0.7),
            other => panic!("expected NaturalLanguage, got {other:?}"),
        }
    }

    #[test]
    fn cancel_reply_aborts_pending_clarification() {
        let mut router = SmartRouter::new(0.7, 10);
        let mut intent = high_confidence_intent();
        intent.confidence = 0.2;
        let extractor = FixedExtractor(Some(vec![intent]));
        router.route("refactor the thing", Mode::Architect, &extractor, |_| true);

        let second = router.route("cancel", Mode::Architect, &extractor, |_| true);
        assert_eq!(second, Route::PassthroughChat);
    }

    #[test]
    fn history_window_is_bounded() {
        let mut router = SmartRouter::new(0.7, 2);
        let extractor = FixedExtractor(None);
        for i in 0..5 {
            router.route(&format!("message {i}"), Mode::Chat, &extractor, |_| true);
        }
        assert_eq!(router.history.len(), 2);
        assert_eq!(router.history, vec!["message 3".to_string(), "message 4".to_string()]);
    }

    #[test]
    fn provider_intent_extractor_parses_a_fenced_json_reply() {
        use crate::provider::transport::FakeTransport;
        use crate::provider::types::ProviderDescriptor;
        use crate::provider::{Capabilities, Provider, ProviderType};
        use std::time::Duration;

        let body = r#"{"message":{"role":"assistant","content":"Sure, here you go:\n```json\n{\"candidates\":[{\"action\":\"edit\",\"referenced_files\":[\"src/lib.rs\"],\"confidence\":0.9,\"reasoning\":\"user asked to edit lib.rs\"}]}\n```"},"done":true}"#;
        let transport = FakeTransport::new().with_post("http://x/api/chat", body);
        let descriptor = ProviderDescriptor {
            provider_type: ProviderType::Ollama,
            base_url: "http://x".to_string(),
            timeout: Duration::from_secs(2),
            capabilities: Capabilities::default(),
        };
        let provider = Provider::from_descriptor(&descriptor, Box::new(transport));
        let extractor = ProviderIntentExtractor::new(&provider, "llama3");

        let candidates = extractor.extract("edit src/lib.rs to add a function", &[]).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].action, ActionType::Edit);
        assert_eq!(candidates[0].referenced_files, vec!["src/lib.rs".to_string()]);
    }
}
