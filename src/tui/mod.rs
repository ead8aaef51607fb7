//! The terminal UI: conversation state, streaming, plan extraction, input
//! validation, key dispatch, and rendering, grounded in
//! `src/ui/`'s module layout (`state.rs`, `handlers.rs`, `input.rs`,
//! `view.rs`) rather than the async `tui/` workspace member.

pub mod app;
pub mod conversation;
pub mod input_validation;
pub mod keys;
pub mod plan;
pub mod stream;
pub mod view;

pub use app::{App, TickOutcome};
pub use conversation::{Conversation, ConversationEntry, EntryRole};
pub use keys::{handle_key_event, KeyOutcome};
pub use plan::{Complexity, PendingPlan};
pub use stream::{spawn_stream, StreamEvent, StreamHealth};
