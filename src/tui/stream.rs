//! Background-thread streaming, grounded in
//! `chat_thread.rs`/`chat_loop.rs`'s detached-thread-plus-`mpsc`
//! pattern, adapted from a tool-execution loop to a single streaming chat
//! turn over the [`Provider`] abstraction.

use crate::provider::{ChatMessage, ChatParams, Provider, ProviderError};
use std::sync::atomic::AtomicBool;
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Emitted by the background thread, consumed by the main loop's tick.
#[derive(Debug)]
pub enum StreamEvent {
    Chunk(String),
    Done,
    Error(ProviderError),
}

/// Spawns a detached thread that drives one streaming chat turn and
/// returns the receiving end of the channel it reports through. The
/// provider is immutable after construction, so sharing it
/// across turns via `Arc` is safe; nothing it touches is mutated from
/// the background thread, satisfying the "no shared-memory mutation
/// from background threads" rule. `cancel` is checked by the transport
/// on every line of the underlying HTTP response; the caller flips it to
/// stop the thread from reading further instead of letting it run the
/// call to completion.
pub fn spawn_stream(
    provider: Arc<Provider>,
    messages: Vec<ChatMessage>,
    params: ChatParams,
    cancel: Arc<AtomicBool>,
) -> Receiver<StreamEvent> {
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let chunk_tx = tx.clone();
        let result = provider.chat_streaming(
            &messages,
            &params,
            |chunk| {
                let _ = chunk_tx.send(StreamEvent::Chunk(chunk.to_string()));
            },
            &cancel,
        );
        match result {
            Ok(_) => {
                let _ = tx.send(StreamEvent::Done);
            }
            Err(err) => {
                let _ = tx.send(StreamEvent::Error(err));
            }
        }
    });

    rx
}

/// Tracks the last-chunk timestamp of one in-flight stream so the main
/// loop can detect an idle stream without blocking on `recv`.
pub struct StreamHealth {
    last_chunk_at: Instant,
    idle_timeout: Duration,
}

impl StreamHealth {
    pub fn new(idle_timeout: Duration) -> Self {
        Self { last_chunk_at: Instant::now(), idle_timeout }
    }

    pub fn record_chunk(&mut self) {
        self.last_chunk_at = Instant::now();
    }

    /// `true` once more than `idle_timeout` has elapsed since the last
    /// recorded chunk.
    pub fn is_timed_out(&self) -> bool {
        self.last_chunk_at.elapsed() > self.idle_timeout
    }

    pub fn idle_for(&self) -> Duration {
        self.last_chunk_at.elapsed()
    }
}
