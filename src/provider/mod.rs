//! Provider abstraction: a single streaming chat interface over whichever
//! locally-hosted LLM server auto-detection finds.
//!
//! The interface below has a generic streaming method
//! (`chat_streaming<F: FnMut(&str)>`), which makes the natural trait
//! object-unsafe. Rather than erase that generic with a boxed closure at
//! every call site, concrete adapters are wrapped in the `Provider` enum
//! and dispatch is a `match`, not a vtable — the same shape as the
//! this crate's own `Adapter` enum.

pub mod detect;
pub mod hf_tgi;
pub mod ollama;
pub mod openai_compatible;
pub mod quantization;
pub mod transport;
pub mod types;

pub use transport::ProviderError;
pub use types::{Capabilities, ChatMessage, ChatParams, ModelInfo, ProviderDescriptor, ProviderType, Role};

use hf_tgi::HfTgiProvider;
use ollama::OllamaProvider;
use openai_compatible::OpenAiCompatibleProvider;
use std::sync::atomic::AtomicBool;
use transport::Transport;

/// A concrete, callable provider. Construct via [`Provider::from_descriptor`]
/// once auto-detection (or an explicit user choice) has produced a
/// [`ProviderDescriptor`].
pub enum Provider {
    Ollama(OllamaProvider),
    OpenAiCompatible(OpenAiCompatibleProvider),
    HfTgi(HfTgiProvider),
}

impl Provider {
    pub fn from_descriptor(descriptor: &ProviderDescriptor, transport: Box<dyn Transport>) -> Self {
        match descriptor.provider_type {
            ProviderType::Ollama => Provider::Ollama(OllamaProvider::new(descriptor.base_url.clone(), transport)),
            ProviderType::Vllm | ProviderType::LmStudio | ProviderType::OpenAiCompatible => {
                Provider::OpenAiCompatible(OpenAiCompatibleProvider::new(
                    descriptor.provider_type,
                    descriptor.base_url.clone(),
                    None,
                    transport,
                ))
            }
            ProviderType::HfTgi => Provider::HfTgi(HfTgiProvider::new(descriptor.base_url.clone(), transport)),
        }
    }

    pub fn provider_type(&self) -> ProviderType {
        match self {
            Provider::Ollama(p) => p.provider_type(),
            Provider::OpenAiCompatible(p) => p.provider_type(),
            Provider::HfTgi(p) => p.provider_type(),
        }
    }

    pub fn capabilities(&self) -> &Capabilities {
        match self {
            Provider::Ollama(p) => p.capabilities(),
            Provider::OpenAiCompatible(p) => p.capabilities(),
            Provider::HfTgi(p) => p.capabilities(),
        }
    }

    pub fn list_models(&self) -> Result<Vec<ModelInfo>, ProviderError> {
        match self {
            Provider::Ollama(p) => p.list_models(),
            Provider::OpenAiCompatible(p) => p.list_models(),
            Provider::HfTgi(p) => p.list_models(),
        }
    }

    pub fn chat(&self, messages: &[ChatMessage], params: &ChatParams) -> Result<String, ProviderError> {
        match self {
            Provider::Ollama(p) => p.chat(messages, params),
            Provider::OpenAiCompatible(p) => p.chat(messages, params),
            Provider::HfTgi(p) => p.chat(messages, params),
        }
    }

    /// Streams a completion, invoking `on_chunk` for each piece of text as
    /// it arrives. Finite and not restartable: once this returns, the
    /// stream is over, successfully or not. `cancel` is forwarded to the
    /// transport and checked between lines, so setting it from another
    /// thread stops the read loop before the response finishes arriving.
    pub fn chat_streaming<F>(
        &self,
        messages: &[ChatMessage],
        params: &ChatParams,
        on_chunk: F,
        cancel: &AtomicBool,
    ) -> Result<String, ProviderError>
    where
        F: FnMut(&str),
    {
        match self {
            Provider::Ollama(p) => p.chat_streaming(messages, params, on_chunk, cancel),
            Provider::OpenAiCompatible(p) => p.chat_streaming(messages, params, on_chunk, cancel),
            Provider::HfTgi(p) => p.chat_streaming(messages, params, on_chunk, cancel),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::transport::FakeTransport;
    use std::time::Duration;

    #[test]
    fn from_descriptor_selects_ollama_adapter() {
        let descriptor = ProviderDescriptor {
            provider_type: ProviderType::Ollama,
            base_url: "http://x".to_string(),
            timeout: Duration::from_secs(2),
            capabilities: Capabilities::default(),
        };
        let provider = Provider::from_descriptor(&descriptor, Box::new(FakeTransport::new()));
        assert_eq!(provider.provider_type(), ProviderType::Ollama);
    }

    #[test]
    fn from_descriptor_routes_vllm_and_lm_studio_to_openai_compatible() {
        for provider_type in [ProviderType::Vllm, ProviderType::LmStudio] {
            let descriptor = ProviderDescriptor {
                provider_type,
                base_url: "http://x".to_string(),
                timeout: Duration::from_secs(2),
                capabilities: Capabilities::default(),
            };
            let provider = Provider::from_descriptor(&descriptor, Box::new(FakeTransport::new()));
            assert!(matches!(provider, Provider::OpenAiCompatible(_)));
            assert_eq!(provider.provider_type(), provider_type);
        }
    }
}
