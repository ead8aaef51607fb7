//! End-to-end coverage through the public library surface: a full user
//! turn from raw input to a finished conversation entry, and a full
//! slash-command round trip through the registry.

use codewright::commands::{dispatch, register_builtin_commands, CommandRegistry};
use codewright::config::Settings;
use codewright::mode::Mode;
use codewright::provider::transport::FakeTransport;
use codewright::provider::types::ProviderDescriptor;
use codewright::provider::{Capabilities, Provider, ProviderType};
use codewright::router::intent::{ActionType, Intent};
use codewright::router::IntentExtractor;
use codewright::tui::{App, TickOutcome};
use std::time::Duration;

struct NeverExtractor;
impl IntentExtractor for NeverExtractor {
    fn extract(&self, _input: &str, _history: &[String]) -> Option<Vec<Intent>> {
        None
    }
}

struct FixedExtractor(Intent);
impl IntentExtractor for FixedExtractor {
    fn extract(&self, _input: &str, _history: &[String]) -> Option<Vec<Intent>> {
        Some(vec![self.0.clone()])
    }
}

fn app_with_stream(lines: Vec<String>) -> App {
    let mut settings = Settings::default();
    settings.enable_proactive_context = false;
    settings.current_model = Some("llama3".to_string());
    let mut app = App::new(settings, std::env::temp_dir());
    let transport = FakeTransport::new().with_stream("http://x/api/chat", lines);
    let descriptor = ProviderDescriptor {
        provider_type: ProviderType::Ollama,
        base_url: "http://x".to_string(),
        timeout: Duration::from_secs(2),
        capabilities: Capabilities::default(),
    };
    app.set_provider(Provider::from_descriptor(&descriptor, Box::new(transport)));
    app
}

#[test]
fn a_chat_turn_streams_to_a_finished_conversation_entry() {
    let mut app = app_with_stream(vec![
        r#"{"message":{"role":"assistant","content":"The answer "},"done":false}"#.to_string(),
        r#"{"message":{"role":"assistant","content":"is 42."},"done":true}"#.to_string(),
    ]);
    let registry = CommandRegistry::new();
    let extractor = NeverExtractor;

    app.submit_input("what is the answer?", &registry, &extractor);
    assert!(app.conversation.is_streaming());

    loop {
        if app.tick() == TickOutcome::TurnFinished {
            break;
        }
    }

    assert_eq!(app.conversation.entries().len(), 2);
    assert_eq!(app.conversation.entries()[0].content, "what is the answer?");
    assert_eq!(app.conversation.entries()[1].content, "The answer is 42.");
}

#[test]
fn architect_mode_plan_can_be_approved_into_an_execute_mode_resend() {
    let mut app = app_with_stream(vec![
        r#"{"message":{"role":"assistant","content":"create src/lib.rs and "},"done":false}"#.to_string(),
        r#"{"message":{"role":"assistant","content":"add a function."},"done":true}"#.to_string(),
    ]);
    let registry = CommandRegistry::new();
    dispatch("/mode architect", &registry_with_builtins(), &mut app);

    let extractor = FixedExtractor(Intent {
        action: ActionType::Create,
        referenced_files: vec![],
        confidence: 0.95,
        reasoning: "create a file".to_string(),
    });
    app.submit_input("please create the module", &registry, &extractor);
    loop {
        if app.tick() == TickOutcome::TurnFinished {
            break;
        }
    }
    assert!(app.is_awaiting_approval());
    assert!(app.pending_plan().is_some());

    app.submit_input("approve", &registry, &extractor);
    assert_eq!(app.mode(), Mode::Execute);
    assert!(!app.is_awaiting_approval());
}

fn registry_with_builtins() -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    register_builtin_commands(&mut registry).unwrap();
    registry
}

#[test]
fn help_command_round_trips_through_dispatch() {
    let registry = registry_with_builtins();
    let mut app = app_with_stream(vec![]);
    let result = dispatch("/help", &registry, &mut app).unwrap();
    assert!(result.success);
}

#[test]
fn unknown_command_suggests_the_closest_match() {
    let registry = registry_with_builtins();
    let mut app = app_with_stream(vec![]);
    let result = dispatch("/hepl", &registry, &mut app).unwrap();
    assert!(!result.success);
    assert!(result.message.contains("help"));
}
