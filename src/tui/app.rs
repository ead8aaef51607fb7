//! Application state: the seam between the event loop, the provider, the
//! smart router, the proactive context builder, and the command surface.
//! Grounded in `src/ui/state.rs`'s `App` — console/chat
//! buffers, an active-panel-style mode switch, `should_quit` — adapted
//! from a tool-execution transcript to a streaming chat transcript with
//! a plan-approval gate instead of per-tool approval.

use super::conversation::{Conversation, EntryRole};
use super::input_validation::normalize_input;
use super::plan::{extract_plan, PendingPlan};
use super::stream::{spawn_stream, StreamEvent, StreamHealth};
use crate::commands::{CommandHost, CommandResult};
use crate::config::Settings;
use crate::context::ProactiveContextBuilder;
use crate::error::{InputValidationError, StreamHealthError};
use crate::mode::Mode;
use crate::provider::{ChatMessage, ChatParams, ModelInfo, Provider, ProviderError, ProviderType, Role};
use crate::router::intent::Intent;
use crate::router::{IntentExtractor, Route, SmartRouter};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TurnKind {
    /// Chunks are appended to the conversation's streaming slot as they arrive.
    Display,
    /// Chunks are accumulated silently; only the finished text is shown,
    /// summarized into a `PendingPlan` (ARCHITECT mode).
    CollectForPlan,
}

struct ActiveTurn {
    kind: TurnKind,
    receiver: Receiver<StreamEvent>,
    health: StreamHealth,
    buffer: String,
    cancel: Arc<AtomicBool>,
}

/// Outcome of a call to [`App::tick`], telling the event loop whether a
/// redraw is warranted and whether a turn just finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Idle,
    Redraw,
    TurnFinished,
}

pub struct App {
    settings: Settings,
    mode: Mode,
    provider: Option<Arc<Provider>>,
    current_model: Option<String>,
    pub conversation: Conversation,
    router: SmartRouter,
    context_builder: ProactiveContextBuilder,
    pending_plan: Option<PendingPlan>,
    awaiting_approval: bool,
    active_turn: Option<ActiveTurn>,
    idle_timeout: Duration,
    debug: bool,
    tui_enabled: bool,
    should_quit: bool,
}

impl App {
    pub fn new(settings: Settings, project_root: impl Into<std::path::PathBuf>) -> Self {
        let confidence_threshold = settings.clarification_confidence_threshold;
        let context_budget_window = settings.model_context_window;
        let usage_ratio = settings.context_window_usage;
        let idle_timeout = settings.request_timeout;
        Self {
            mode: Mode::Chat,
            provider: None,
            current_model: settings.current_model.clone(),
            conversation: Conversation::new(200, 200_000),
            router: SmartRouter::new(confidence_threshold, 20),
            context_builder: ProactiveContextBuilder::new(project_root, context_budget_window, usage_ratio),
            pending_plan: None,
            awaiting_approval: false,
            active_turn: None,
            idle_timeout,
            debug: false,
            tui_enabled: settings.user_preferences.tui_mode,
            should_quit: false,
            settings,
        }
    }

    pub fn set_provider(&mut self, provider: Provider) {
        self.provider = Some(Arc::new(provider));
    }

    pub fn provider(&self) -> Option<&Provider> {
        self.provider.as_deref()
    }

    /// A cheap clone of the shared provider handle, for callers (like the
    /// event loop) that need to build something that outlives a `&mut
    /// self` borrow on `App` itself.
    pub fn provider_handle(&self) -> Option<Arc<Provider>> {
        self.provider.clone()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_awaiting_approval(&self) -> bool {
        self.awaiting_approval
    }

    pub fn pending_plan(&self) -> Option<&PendingPlan> {
        self.pending_plan.as_ref()
    }

    /// Submits one line of raw terminal input. Returns the command
    /// result when `raw` dispatched to a builtin command, so the caller
    /// (owning the registry) can decide whether to exit.
    pub fn submit_input(
        &mut self,
        raw: &str,
        registry: &crate::commands::CommandRegistry,
        extractor: &dyn IntentExtractor,
    ) -> Option<CommandResult> {
        let normalized = match normalize_input(raw) {
            Ok(n) => n,
            Err(err) => {
                self.report_validation_error(err);
                return None;
            }
        };

        let trimmed = normalized.trim();
        if trimmed.is_empty() {
            return None;
        }

        if self.awaiting_approval {
            self.handle_approval_reply(trimmed);
            return None;
        }

        let route = self.router.route(&normalized, self.mode, extractor, |path| Path::new(path).exists());
        match route {
            Route::SlashCommand { name, args } => {
                let full = format!("/{name} {args}");
                crate::commands::dispatch(&full, registry, self)
            }
            Route::PassthroughChat => {
                self.begin_user_turn(normalized, &[]);
                None
            }
            Route::NaturalLanguage(intent) => {
                self.handle_natural_language(normalized, intent);
                None
            }
            Route::Clarification { options, missing_files } => {
                self.present_clarification(&options, &missing_files);
                None
            }
        }
    }

    fn report_validation_error(&mut self, err: InputValidationError) {
        warn!(target: "codewright::tui", %err, "input rejected before entering conversation history");
        self.conversation.push(EntryRole::System, format!("Input rejected: {err}"));
    }

    fn handle_natural_language(&mut self, raw_text: String, intent: Intent) {
        if self.mode == Mode::Chat {
            self.conversation.push(
                EntryRole::System,
                format!(
                    "This reads as a {:?} request. Switch to ARCHITECT or EXECUTE mode (/mode) to act on it.",
                    intent.action
                ),
            );
            return;
        }
        let explicitly_mentioned = intent.referenced_files.clone();
        self.begin_user_turn(raw_text, &explicitly_mentioned);
    }

    fn present_clarification(&mut self, options: &[crate::router::intent::ClarificationOption], missing_files: &[String]) {
        let mut message = String::from("I'm not confident about this request. Did you mean:\n");
        for (i, option) in options.iter().enumerate() {
            message.push_str(&format!("  {}. {}\n", i + 1, option.reasoning));
        }
        if !missing_files.is_empty() {
            message.push_str(&format!("Referenced file(s) not found: {}\n", missing_files.join(", ")));
        }
        message.push_str("Reply with a number, or \"cancel\".");
        self.conversation.push(EntryRole::System, message);
    }

    fn begin_user_turn(&mut self, text: String, explicitly_mentioned: &[String]) {
        self.conversation.push(EntryRole::User, text.clone());
        self.conversation.reset_to_bottom();

        let Some(provider) = self.provider.clone() else {
            self.conversation.push(EntryRole::System, "No provider configured; run /setup.".to_string());
            return;
        };
        let Some(model) = self.current_model.clone() else {
            self.conversation.push(EntryRole::System, "No model selected; run /models then /model <name>.".to_string());
            return;
        };

        let messages = self.compose_messages(explicitly_mentioned);
        let params = ChatParams::new(model);
        let kind = if self.mode == Mode::Architect { TurnKind::CollectForPlan } else { TurnKind::Display };

        if kind == TurnKind::Display {
            self.conversation.start_streaming(EntryRole::Assistant);
        }

        let cancel = Arc::new(AtomicBool::new(false));
        let receiver = spawn_stream(provider, messages, params, cancel.clone());
        self.active_turn = Some(ActiveTurn { kind, receiver, health: StreamHealth::new(self.idle_timeout), buffer: String::new(), cancel });
    }

    fn compose_messages(&mut self, explicitly_mentioned: &[String]) -> Vec<ChatMessage> {
        let mut messages = Vec::new();

        if self.settings.enable_proactive_context {
            let history: Vec<String> = self.conversation.entries().iter().map(|e| e.content.clone()).collect();
            let latest_query = history.last().cloned().unwrap_or_default();
            let files = self.context_builder.build_smart_context(&latest_query, &history, explicitly_mentioned);
            if !files.is_empty() {
                let mut listing = String::from("Relevant project files:\n");
                for (path, result) in &files {
                    listing.push_str(&format!("--- {path} ---\n{}\n", result.content));
                }
                messages.push(ChatMessage::system(listing));
            }
        }

        for entry in self.conversation.entries() {
            let role = match entry.role {
                EntryRole::User => Role::User,
                EntryRole::Assistant => Role::Assistant,
                EntryRole::System => continue,
            };
            messages.push(ChatMessage { role, content: entry.content.clone(), images: Vec::new() });
        }

        messages
    }

    /// Polls the active turn's channel once, advancing conversation state.
    /// Called on every loop tick; a bounded `recv_timeout` keeps this from
    /// blocking the event loop.
    pub fn tick(&mut self) -> TickOutcome {
        let Some(turn) = &mut self.active_turn else {
            return TickOutcome::Idle;
        };

        if turn.health.is_timed_out() {
            let idle_ms = turn.health.idle_for().as_millis() as u64;
            let limit_ms = self.idle_timeout.as_millis() as u64;
            self.finish_turn_on_timeout(StreamHealthError::Timeout { idle_ms, limit_ms });
            return TickOutcome::TurnFinished;
        }

        match turn.receiver.recv_timeout(Duration::from_millis(50)) {
            Ok(StreamEvent::Chunk(chunk)) => {
                turn.health.record_chunk();
                match turn.kind {
                    TurnKind::Display => self.conversation.append_streaming_chunk(&chunk),
                    TurnKind::CollectForPlan => turn.buffer.push_str(&chunk),
                }
                TickOutcome::Redraw
            }
            Ok(StreamEvent::Done) => {
                self.finish_turn();
                TickOutcome::TurnFinished
            }
            Ok(StreamEvent::Error(err)) => {
                self.finish_turn_on_error(err);
                TickOutcome::TurnFinished
            }
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => TickOutcome::Idle,
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => {
                self.finish_turn_on_timeout(StreamHealthError::PrematureClose);
                TickOutcome::TurnFinished
            }
        }
    }

    fn finish_turn(&mut self) {
        let Some(turn) = self.active_turn.take() else { return };
        match turn.kind {
            TurnKind::Display => {
                let finished = self.conversation.finish_streaming();
                if finished.map(|content| content.is_empty()).unwrap_or(false) {
                    self.conversation.push(EntryRole::System, "No response received".to_string());
                }
            }
            TurnKind::CollectForPlan => {
                let plan = extract_plan(&turn.buffer);
                self.conversation.push(
                    EntryRole::Assistant,
                    format!(
                        "Plan ready ({:?} complexity, {} file(s), {} action(s)). Reply yes/approve, no/cancel, or \"show full\".",
                        plan.complexity,
                        plan.files_affected.len(),
                        plan.actions.len()
                    ),
                );
                self.pending_plan = Some(plan);
                self.awaiting_approval = true;
            }
        }
    }

    fn finish_turn_on_timeout(&mut self, err: StreamHealthError) {
        if let Some(turn) = self.active_turn.take() {
            match turn.kind {
                TurnKind::Display => {
                    self.conversation.abort_streaming();
                }
                TurnKind::CollectForPlan => {
                    // Nothing coherent to summarize into a plan; surface the
                    // partial text instead of extracting a plan from it.
                    if !turn.buffer.is_empty() {
                        self.conversation.push(EntryRole::Assistant, turn.buffer);
                    }
                }
            }
        }
        self.conversation.push(EntryRole::System, format!("Stream interrupted: {err}. Ready for the next turn."));
    }

    fn finish_turn_on_error(&mut self, err: ProviderError) {
        if let Some(turn) = self.active_turn.take() {
            if turn.kind == TurnKind::Display {
                self.conversation.abort_streaming();
            }
        }
        let remediation = crate::error::remediation_for_provider_error(&err);
        self.conversation.push(EntryRole::System, format!("{} {}", remediation.summary, remediation.next_step));
    }

    fn handle_approval_reply(&mut self, reply: &str) {
        let lower = reply.to_lowercase();
        match lower.as_str() {
            "yes" | "approve" => {
                self.awaiting_approval = false;
                let Some(plan) = self.pending_plan.take() else { return };
                self.mode = Mode::Execute;
                self.begin_user_turn(plan.full_text.clone(), &[]);
            }
            "no" | "cancel" => {
                self.awaiting_approval = false;
                self.pending_plan = None;
                self.conversation.push(EntryRole::System, "Plan discarded.".to_string());
            }
            "show full" => {
                if let Some(plan) = &self.pending_plan {
                    self.conversation.push(EntryRole::System, plan.full_text.clone());
                }
            }
            _ => {
                self.conversation.push(
                    EntryRole::System,
                    "Reply with \"yes\"/\"approve\", \"no\"/\"cancel\", or \"show full\".".to_string(),
                );
            }
        }
    }

    pub fn cycle_mode(&mut self) {
        self.mode = match self.mode {
            Mode::Chat => Mode::Architect,
            Mode::Architect => Mode::Execute,
            Mode::Execute => Mode::Llvl,
            Mode::Llvl => Mode::Chat,
        };
        info!(target: "codewright::tui", mode = ?self.mode, "mode cycled");
    }

    /// Ctrl+C / Ctrl+S: closes any in-flight stream, finalizing the
    /// streaming message rather than dropping it. Flips the turn's
    /// cancellation flag so the background thread stops reading from the
    /// provider at its next checkpoint instead of running to completion.
    pub fn cancel_active_turn(&mut self) {
        if let Some(turn) = self.active_turn.take() {
            turn.cancel.store(true, Ordering::Relaxed);
            match turn.kind {
                TurnKind::Display => {
                    self.conversation.abort_streaming();
                }
                TurnKind::CollectForPlan => {
                    if !turn.buffer.is_empty() {
                        self.conversation.push(EntryRole::Assistant, turn.buffer);
                    }
                }
            }
            self.conversation.push(EntryRole::System, "Stream cancelled.".to_string());
        }
    }
}

impl CommandHost for App {
    fn settings(&self) -> &Settings {
        &self.settings
    }

    fn current_mode(&self) -> Mode {
        self.mode
    }

    fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    fn current_provider_type(&self) -> Option<ProviderType> {
        self.provider.as_ref().map(|p| p.provider_type())
    }

    fn list_models(&self) -> Result<Vec<ModelInfo>, ProviderError> {
        match &self.provider {
            Some(provider) => provider.list_models(),
            None => Ok(Vec::new()),
        }
    }

    fn current_model(&self) -> Option<String> {
        self.current_model.clone()
    }

    fn set_current_model(&mut self, model: String) {
        self.current_model = Some(model);
    }

    fn clear_conversation(&mut self) {
        self.conversation = Conversation::new(200, 200_000);
        self.pending_plan = None;
        self.awaiting_approval = false;
    }

    fn toggle_debug(&mut self) -> bool {
        self.debug = !self.debug;
        self.debug
    }

    fn toggle_tui(&mut self) -> bool {
        self.tui_enabled = !self.tui_enabled;
        self.tui_enabled
    }
}
