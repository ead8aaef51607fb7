//! Conversation buffer, streaming slot, sticky-bottom scroll, and the
//! archival policy, grounded in
//! `ChatMessage`/`ChatRole`/scroll-offset fields in `src/ui/state.rs`.

use crate::provider::Role;

const NEAR_BOTTOM_THRESHOLD: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryRole {
    User,
    Assistant,
    System,
}

impl From<Role> for EntryRole {
    fn from(role: Role) -> Self {
        match role {
            Role::User => EntryRole::User,
            Role::Assistant => EntryRole::Assistant,
            Role::System => EntryRole::System,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConversationEntry {
    pub role: EntryRole,
    pub content: String,
}

/// Conversation history plus the one in-flight streaming message, the
/// scroll/sticky-bottom state that tracks it, and the archival policy
/// that keeps both bounded.
pub struct Conversation {
    entries: Vec<ConversationEntry>,
    streaming: Option<ConversationEntry>,
    scroll_offset: usize,
    autoscroll: bool,
    max_messages: usize,
    max_chars: usize,
}

impl Conversation {
    pub fn new(max_messages: usize, max_chars: usize) -> Self {
        Self { entries: Vec::new(), streaming: None, scroll_offset: 0, autoscroll: true, max_messages, max_chars }
    }

    pub fn entries(&self) -> &[ConversationEntry] {
        &self.entries
    }

    pub fn streaming(&self) -> Option<&ConversationEntry> {
        self.streaming.as_ref()
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming.is_some()
    }

    pub fn push(&mut self, role: EntryRole, content: impl Into<String>) {
        self.entries.push(ConversationEntry { role, content: content.into() });
        self.archive_if_needed();
    }

    /// Installs an empty streaming message and re-enables auto-scroll.
    /// Starting a second stream before the first finishes is an internal
    /// invariant violation, not a user-facing error.
    pub fn start_streaming(&mut self, role: EntryRole) {
        debug_assert!(self.streaming.is_none(), "a stream is already active");
        self.streaming = Some(ConversationEntry { role, content: String::new() });
        self.reset_to_bottom();
    }

    pub fn append_streaming_chunk(&mut self, chunk: &str) {
        if let Some(entry) = &mut self.streaming {
            entry.content.push_str(chunk);
        }
    }

    /// Converts the streaming message into a permanent entry and returns
    /// its final content so callers (e.g. plan extraction) can act on it.
    pub fn finish_streaming(&mut self) -> Option<String> {
        let entry = self.streaming.take()?;
        let content = entry.content.clone();
        self.entries.push(entry);
        self.archive_if_needed();
        Some(content)
    }

    /// Abandons a stream in progress (idle timeout or cancellation),
    /// finalizing whatever content was accumulated so far.
    pub fn abort_streaming(&mut self) -> Option<String> {
        self.finish_streaming()
    }

    fn archive_if_needed(&mut self) {
        let total_chars: usize = self.entries.iter().map(|e| e.content.len()).sum();
        if self.entries.len() <= self.max_messages && total_chars <= self.max_chars {
            return;
        }
        let keep_from = self.entries.len().saturating_sub(self.max_messages / 2);
        if keep_from == 0 {
            return;
        }
        let archived: Vec<ConversationEntry> = self.entries.drain(0..keep_from).collect();
        let summary = format!("[{} earlier messages archived]", archived.len());
        self.entries.insert(0, ConversationEntry { role: EntryRole::System, content: summary });
    }

    pub fn page_up(&mut self, lines: usize) {
        self.scroll_offset = self.scroll_offset.saturating_add(lines);
        self.autoscroll = self.scroll_offset <= NEAR_BOTTOM_THRESHOLD;
    }

    pub fn page_down(&mut self, lines: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(lines);
        self.autoscroll = self.scroll_offset <= NEAR_BOTTOM_THRESHOLD;
    }

    /// Re-enables auto-scroll, called when a new message is submitted.
    pub fn reset_to_bottom(&mut self) {
        self.scroll_offset = 0;
        self.autoscroll = true;
    }

    pub fn autoscroll_enabled(&self) -> bool {
        self.autoscroll
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn streaming_chunks_concatenate_in_order() {
        let mut conv = Conversation::new(200, 100_000);
        conv.start_streaming(EntryRole::Assistant);
        conv.append_streaming_chunk("Hello");
        conv.append_streaming_chunk(", world");
        let finished = conv.finish_streaming().unwrap();
        assert_eq!(finished, "Hello, world");
        assert!(conv.streaming().is_none());
        assert_eq!(conv.entries().last().unwrap().content, "Hello, world");
    }

    #[test]
    fn scrolling_up_past_threshold_disables_autoscroll() {
        let mut conv = Conversation::new(200, 100_000);
        conv.page_up(10);
        assert!(!conv.autoscroll_enabled());
        conv.page_down(10);
        assert!(conv.autoscroll_enabled());
    }

    #[test]
    fn submitting_a_message_reenables_autoscroll() {
        let mut conv = Conversation::new(200, 100_000);
        conv.page_up(10);
        assert!(!conv.autoscroll_enabled());
        conv.reset_to_bottom();
        assert!(conv.autoscroll_enabled());
        assert_eq!(conv.scroll_offset(), 0);
    }

    #[test]
    fn archives_oldest_block_once_message_count_exceeds_threshold() {
        let mut conv = Conversation::new(4, 100_000);
        for i in 0..6 {
            conv.push(EntryRole::User, format!("message {i}"));
        }
        assert!(conv.entries().len() <= 6);
        assert!(conv.entries().first().unwrap().content.contains("archived"));
    }

    #[test]
    fn archival_never_happens_while_streaming() {
        let mut conv = Conversation::new(2, 100_000);
        conv.push(EntryRole::User, "a");
        conv.push(EntryRole::User, "b");
        conv.start_streaming(EntryRole::Assistant);
        conv.append_streaming_chunk("still going");
        assert!(conv.is_streaming());
        assert_eq!(conv.entries().len(), 2);
    }
}
