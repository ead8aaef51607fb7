//! Auto-detection: probes a closed set of well-known host:port
//! combinations concurrently and identifies the backend by endpoint
//! shape, never by status code alone.

use super::transport::{ProviderError, Transport, UreqTransport};
use super::types::{Capabilities, ProviderDescriptor, ProviderType};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

/// Ports probed on `127.0.0.1` during auto-detection. Order here is
/// scan order, not precedence — precedence is enforced after every
/// probe has returned.
pub const COMMON_PORTS: &[u16] = &[11434, 1234, 8000, 8080, 5000, 5001, 8001];

const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Outcome of probing a single address. A probe never propagates an
/// error to the caller — any failure (connection refused, timeout,
/// malformed body) collapses to `NotFound`.
#[derive(Debug, Clone)]
pub enum DetectionOutcome {
    Found(ProviderDescriptor),
    NotFound,
}

/// Inspects a single `host:port` and returns the provider type it
/// identifies as, if any, using the identifying signal for each
/// candidate wire format rather than the HTTP status code alone.
fn identify(transport: &dyn Transport, base_url: &str, timeout: Duration) -> DetectionOutcome {
    if let Ok(body) = transport.get(&format!("{base_url}/api/tags")) {
        if serde_json::from_str::<JsonValue>(&body).is_ok() {
            return DetectionOutcome::Found(descriptor(ProviderType::Ollama, base_url, timeout));
        }
    }

    if let Ok(body) = transport.get(&format!("{base_url}/v1/models")) {
        if let Ok(json) = serde_json::from_str::<JsonValue>(&body) {
            let has_data = json.get("data").and_then(|d| d.as_array()).is_some();
            let has_object = json.get("object").is_some();
            if has_data && has_object {
                return DetectionOutcome::Found(descriptor(ProviderType::LmStudio, base_url, timeout));
            }
        }
    }

    if let Ok(body) = transport.get(&format!("{base_url}/info")) {
        if let Ok(json) = serde_json::from_str::<JsonValue>(&body) {
            if json.get("model_id").is_some() || json.get("model_dtype").is_some() {
                return DetectionOutcome::Found(descriptor(ProviderType::HfTgi, base_url, timeout));
            }
        }
    }

    if let Ok(body) = transport.get(&format!("{base_url}/v1/models")) {
        if let Ok(json) = serde_json::from_str::<JsonValue>(&body) {
            if json.get("data").and_then(|d| d.as_array()).is_some() {
                return DetectionOutcome::Found(descriptor(ProviderType::Vllm, base_url, timeout));
            }
        }
    }

    DetectionOutcome::NotFound
}

fn descriptor(provider_type: ProviderType, base_url: &str, timeout: Duration) -> ProviderDescriptor {
    ProviderDescriptor {
        provider_type,
        base_url: base_url.to_string(),
        timeout,
        capabilities: Capabilities::default(),
    }
}

fn precedence_rank(provider_type: ProviderType) -> u8 {
    match provider_type {
        ProviderType::Ollama => 0,
        ProviderType::LmStudio => 1,
        ProviderType::HfTgi => 2,
        ProviderType::Vllm => 3,
        ProviderType::OpenAiCompatible => 4,
    }
}

/// Probes every address in `COMMON_PORTS` on its own thread and joins
/// all of them before returning, mirroring "gather every probe,
/// exceptions included" — a panicking or erroring probe becomes
/// `NotFound` rather than aborting the scan.
///
/// If `preferred` names a provider type found among the results, it
/// wins regardless of scan order; otherwise the match with the lowest
/// precedence rank (Ollama, then LM Studio, then HF TGI, then vLLM)
/// wins.
pub fn scan(
    transport_factory: impl Fn() -> Arc<dyn Transport> + Send + Sync + 'static,
    preferred: Option<ProviderType>,
) -> Option<ProviderDescriptor> {
    scan_with_timeout(transport_factory, preferred, DEFAULT_PROBE_TIMEOUT)
}

pub fn scan_with_timeout(
    transport_factory: impl Fn() -> Arc<dyn Transport> + Send + Sync + 'static,
    preferred: Option<ProviderType>,
    timeout: Duration,
) -> Option<ProviderDescriptor> {
    let transport_factory = Arc::new(transport_factory);
    let handles: Vec<_> = COMMON_PORTS
        .iter()
        .map(|&port| {
            let factory = Arc::clone(&transport_factory);
            thread::spawn(move || {
                let base_url = format!("http://127.0.0.1:{port}");
                let transport = factory();
                let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                    identify(transport.as_ref(), &base_url, timeout)
                }))
                .unwrap_or_else(|_| {
                    warn!(target: "codewright::provider", port, "probe panicked");
                    DetectionOutcome::NotFound
                });
                (port, outcome)
            })
        })
        .collect();

    let mut found: Vec<(u16, ProviderDescriptor)> = Vec::new();
    for handle in handles {
        match handle.join() {
            Ok((port, DetectionOutcome::Found(desc))) => {
                debug!(target: "codewright::provider", port, provider = desc.provider_type.as_str(), "probe matched");
                found.push((port, desc));
            }
            Ok((port, DetectionOutcome::NotFound)) => {
                debug!(target: "codewright::provider", port, "probe did not match");
            }
            Err(_) => {
                warn!(target: "codewright::provider", "probe thread panicked before returning");
            }
        }
    }

    if let Some(pref) = preferred {
        if let Some((_, desc)) = found.iter().find(|(_, d)| d.provider_type == pref) {
            return Some(desc.clone());
        }
    }

    found.sort_by_key(|(port, desc)| (precedence_rank(desc.provider_type), *port));
    found.into_iter().next().map(|(_, desc)| desc)
}

/// Convenience wrapper for production use: real `ureq` transport, one
/// instance per probe thread (they are not shared across threads).
pub fn scan_live(preferred: Option<ProviderType>) -> Option<ProviderDescriptor> {
    scan(
        || Arc::new(UreqTransport::new(DEFAULT_PROBE_TIMEOUT)) as Arc<dyn Transport>,
        preferred,
    )
}

/// Error returned when no provider could be detected and none was
/// configured explicitly.
#[derive(Debug, Clone, thiserror::Error)]
#[error("no provider could be detected on any of the known ports")]
pub struct NoProviderDetected;

pub fn require_scan(
    transport_factory: impl Fn() -> Arc<dyn Transport> + Send + Sync + 'static,
    preferred: Option<ProviderType>,
) -> Result<ProviderDescriptor, ProviderError> {
    scan(transport_factory, preferred)
        .ok_or_else(|| ProviderError::Unreachable("no provider detected on any known port".to_string()))
}
