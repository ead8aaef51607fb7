//! Execution context: an opaque struct carrying references to
//! provider, router, context builder, TUI, and settings.
//! Concretely a trait object so commands stay decoupled from the TUI's
//! concrete `App` type (defined in `crate::tui`), the way
//! command dispatch takes a `&CliContext` rather than the whole `App`.

use super::types::CommandSpec;
use crate::config::Settings;
use crate::mode::Mode;
use crate::provider::{ModelInfo, ProviderError, ProviderType};

/// Everything a builtin command is allowed to read or change about the
/// running session. Implemented by the TUI's application state; commands
/// never see more of the app than this.
pub trait CommandHost {
    fn settings(&self) -> &Settings;
    fn current_mode(&self) -> Mode;
    fn set_mode(&mut self, mode: Mode);
    fn current_provider_type(&self) -> Option<ProviderType>;
    fn list_models(&self) -> Result<Vec<ModelInfo>, ProviderError>;
    fn current_model(&self) -> Option<String>;
    fn set_current_model(&mut self, model: String);
    fn clear_conversation(&mut self);
    fn toggle_debug(&mut self) -> bool;
    fn toggle_tui(&mut self) -> bool;
}

pub struct ExecutionContext<'a> {
    pub host: &'a mut dyn CommandHost,
    /// The registry dispatch is running against, so introspective
    /// commands (`/help`, `/tools`) can list what's actually registered
    /// instead of hardcoding a second copy of the command surface.
    pub registered_commands: &'a [CommandSpec],
}

impl<'a> ExecutionContext<'a> {
    pub fn new(host: &'a mut dyn CommandHost, registered_commands: &'a [CommandSpec]) -> Self {
        Self { host, registered_commands }
    }
}
