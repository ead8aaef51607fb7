//! Synchronous HTTP transport shared by every adapter.
//!
//! Adapters are blocking: the TUI event loop drives them from a detached
//! thread rather than an async task (see `crate::tui::stream`). Keeping
//! the transport blocking avoids pulling in an async runtime for what is,
//! at its core, "POST JSON, read a body line-by-line".

use std::io::{BufRead, BufReader};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum ProviderError {
    #[error("could not reach provider: {0}")]
    Unreachable(String),
    #[error("provider timed out: {0}")]
    Timeout(String),
    #[error("provider returned HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },
    #[error("could not decode provider response: {0}")]
    Decode(String),
    #[error("stream cancelled")]
    Cancelled,
}

impl From<std::io::Error> for ProviderError {
    fn from(e: std::io::Error) -> Self {
        ProviderError::Unreachable(e.to_string())
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(e: serde_json::Error) -> Self {
        ProviderError::Decode(e.to_string())
    }
}

/// Blocking HTTP transport. Abstracted so tests can swap in a fake
/// transport without touching the network.
pub trait Transport: Send + Sync {
    fn get(&self, url: &str) -> Result<String, ProviderError>;

    fn post_json(&self, url: &str, headers: &[(&str, &str)], body: &str) -> Result<String, ProviderError>;

    /// POSTs `body` and invokes `on_line` for each line of the response as
    /// it arrives, returning the full concatenated body once the
    /// connection closes. `on_line` is called synchronously, in order.
    /// `cancel` is checked before each line; once it's set, the read loop
    /// stops and `ProviderError::Cancelled` is returned instead of the
    /// usual body.
    fn post_stream(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &str,
        on_line: &mut dyn FnMut(&str),
        cancel: &AtomicBool,
    ) -> Result<String, ProviderError>;
}

/// Real transport backed by `ureq`.
pub struct UreqTransport {
    timeout: Duration,
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn map_err(err: ureq::Error) -> ProviderError {
        match err {
            ureq::Error::Status(code, response) => {
                let message = response
                    .into_string()
                    .unwrap_or_else(|_| format!("HTTP {code}"));
                ProviderError::HttpStatus { status: code, message }
            }
            ureq::Error::Transport(t) => {
                if t.kind() == ureq::ErrorKind::Io {
                    ProviderError::Unreachable(t.to_string())
                } else {
                    ProviderError::Timeout(t.to_string())
                }
            }
        }
    }
}

impl Transport for UreqTransport {
    fn get(&self, url: &str) -> Result<String, ProviderError> {
        let response = ureq::get(url)
            .timeout(self.timeout)
            .call()
            .map_err(Self::map_err)?;
        response.into_string().map_err(|e| ProviderError::Decode(e.to_string()))
    }

    fn post_json(&self, url: &str, headers: &[(&str, &str)], body: &str) -> Result<String, ProviderError> {
        let mut request = ureq::post(url).timeout(self.timeout);
        for (k, v) in headers {
            request = request.set(k, v);
        }
        let response = request.send_string(body).map_err(Self::map_err)?;
        response.into_string().map_err(|e| ProviderError::Decode(e.to_string()))
    }

    fn post_stream(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &str,
        on_line: &mut dyn FnMut(&str),
        cancel: &AtomicBool,
    ) -> Result<String, ProviderError> {
        let mut request = ureq::post(url).timeout(self.timeout);
        for (k, v) in headers {
            request = request.set(k, v);
        }
        let response = request.send_string(body).map_err(Self::map_err)?;
        let mut reader = BufReader::new(response.into_reader());
        let mut full = String::new();
        let mut line = String::new();
        loop {
            if cancel.load(Ordering::Relaxed) {
                return Err(ProviderError::Cancelled);
            }
            line.clear();
            let n = reader.read_line(&mut line)?;
            if n == 0 {
                break;
            }
            let trimmed = line.trim_end_matches(['\n', '\r']);
            on_line(trimmed);
            full.push_str(trimmed);
            full.push('\n');
        }
        Ok(full)
    }
}

/// In-memory transport for tests: pre-seeded bodies and stream lines,
/// keyed by URL path suffix.
#[derive(Default)]
pub struct FakeTransport {
    pub get_responses: std::collections::HashMap<String, Result<String, ProviderError>>,
    pub post_responses: std::collections::HashMap<String, Result<String, ProviderError>>,
    pub stream_lines: std::collections::HashMap<String, Vec<String>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_get(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.get_responses.insert(url.into(), Ok(body.into()));
        self
    }

    pub fn with_post(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.post_responses.insert(url.into(), Ok(body.into()));
        self
    }

    pub fn with_stream(mut self, url: impl Into<String>, lines: Vec<String>) -> Self {
        self.stream_lines.insert(url.into(), lines);
        self
    }
}

impl Transport for FakeTransport {
    fn get(&self, url: &str) -> Result<String, ProviderError> {
        self.get_responses
            .get(url)
            .cloned()
            .unwrap_or_else(|| Err(ProviderError::Unreachable(url.to_string())))
    }

    fn post_json(&self, url: &str, _headers: &[(&str, &str)], _body: &str) -> Result<String, ProviderError> {
        self.post_responses
            .get(url)
            .cloned()
            .unwrap_or_else(|| Err(ProviderError::Unreachable(url.to_string())))
    }

    fn post_stream(
        &self,
        url: &str,
        _headers: &[(&str, &str)],
        _body: &str,
        on_line: &mut dyn FnMut(&str),
        cancel: &AtomicBool,
    ) -> Result<String, ProviderError> {
        let lines = self
            .stream_lines
            .get(url)
            .ok_or_else(|| ProviderError::Unreachable(url.to_string()))?;
        let mut full = String::new();
        for line in lines {
            if cancel.load(Ordering::Relaxed) {
                return Err(ProviderError::Cancelled);
            }
            on_line(line);
            full.push_str(line);
            full.push('\n');
        }
        Ok(full)
    }
}
