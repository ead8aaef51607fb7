//! Error taxonomy for the core.
//!
//! Each component owns a typed error enum; this module defines the
//! umbrella type components convert into when an error needs to cross a
//! layer boundary (e.g. from the router into the TUI event loop).

use crate::provider::ProviderError;
use thiserror::Error;

/// Fatal at startup — causes the process to exit with a non-zero code.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("missing setting: {0}")]
    Missing(String),
    #[error("invalid setting {name}: {reason}")]
    Invalid { name: String, reason: String },
}

/// Raised by the command parser; always recoverable.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ArgumentError {
    #[error("unknown argument: {arg_name}")]
    Unknown { arg_name: String },
    #[error("argument {arg_name} expected {expected_type}, got {got_value:?}")]
    TypeMismatch {
        arg_name: String,
        expected_type: String,
        got_value: String,
    },
    #[error("missing required argument: {arg_name}")]
    Missing { arg_name: String },
}

/// Raised while normalizing/validating raw TUI input; always recoverable.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InputValidationError {
    #[error("input too long ({len} > {max})")]
    TooLong { len: usize, max: usize },
    #[error("input contains a disallowed control character")]
    ControlCharacter,
    #[error("malformed slash command: {0}")]
    MalformedCommand(String),
}

/// Raised while a stream is in flight; the loop finalizes and recovers.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StreamHealthError {
    #[error("stream timeout: no chunk received for {idle_ms}ms (limit {limit_ms}ms)")]
    Timeout { idle_ms: u64, limit_ms: u64 },
    #[error("stream closed before a terminal event was observed")]
    PrematureClose,
}

/// Umbrella error. Library code generally returns the narrower, typed
/// errors above; this exists for call sites (e.g. the TUI dispatch loop)
/// that need to hold errors from more than one component in one place.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Argument(#[from] ArgumentError),
    #[error(transparent)]
    InputValidation(#[from] InputValidationError),
    #[error(transparent)]
    StreamHealth(#[from] StreamHealthError),
}

/// A next step a user can act on, attached to every user-visible error.
#[derive(Debug, Clone, PartialEq)]
pub struct Remediation {
    pub summary: String,
    pub next_step: String,
}

impl Remediation {
    pub fn new(summary: impl Into<String>, next_step: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            next_step: next_step.into(),
        }
    }
}

/// Maps a provider error to user-facing remediation text.
pub fn remediation_for_provider_error(err: &ProviderError) -> Remediation {
    match err {
        ProviderError::Unreachable(_) => Remediation::new(
            "Could not reach the model server.",
            "Check that the provider process is running, or run /setup to point at a different host:port.",
        ),
        ProviderError::Timeout(_) => Remediation::new(
            "The model server did not respond in time.",
            "Increase the request timeout in settings, or try a smaller prompt.",
        ),
        ProviderError::HttpStatus { status, .. } => Remediation::new(
            format!("The model server returned HTTP {status}."),
            "Check that the requested model is loaded; run /models to see what's available.",
        ),
        ProviderError::Decode(_) => Remediation::new(
            "The model server's response could not be parsed.",
            "This usually means the provider type was detected incorrectly; run /setup to re-detect.",
        ),
        ProviderError::Cancelled => Remediation::new(
            "The request was cancelled.",
            "Start a new turn when you're ready.",
        ),
    }
}
