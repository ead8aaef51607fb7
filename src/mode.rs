//! The assistant's operating mode. Shared between the router (which needs
//! to know whether the plain-chat fast path applies) and the TUI (which
//! owns the mode as part of its state and gates execution on it).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Conversational only; no file mutation, ever.
    Chat,
    /// Produces a plan that must be approved before any tool runs.
    Architect,
    /// Runs tools directly, still gated by a one-time plan approval.
    Execute,
    /// "Low-level" — direct tool invocation, no planning step.
    Llvl,
}

impl Mode {
    pub fn display_name(&self) -> &'static str {
        match self {
            Mode::Chat => "Chat",
            Mode::Architect => "Architect",
            Mode::Execute => "Execute",
            Mode::Llvl => "LLVL",
        }
    }

    pub fn requires_plan_approval(&self) -> bool {
        matches!(self, Mode::Architect | Mode::Execute)
    }
}
