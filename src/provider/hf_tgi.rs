//! Hugging Face Text Generation Inference adapter.
//!
//! TGI has no chat-message endpoint: the conversation is flattened into a
//! single prompt string before being sent to `/generate` (or
//! `/generate_stream` for SSE token events).

use super::transport::{ProviderError, Transport};
use super::types::{Capabilities, ChatMessage, ChatParams, ModelInfo, ProviderType, Role};
use serde_json::Value as JsonValue;
use std::sync::atomic::AtomicBool;

pub struct HfTgiProvider {
    base_url: String,
    transport: Box<dyn Transport>,
    capabilities: Capabilities,
}

impl HfTgiProvider {
    pub fn new(base_url: impl Into<String>, transport: Box<dyn Transport>) -> Self {
        Self {
            base_url: base_url.into(),
            transport,
            capabilities: Capabilities {
                streaming: true,
                tools: false,
                vision: false,
                thinking: false,
                system_prompts: false,
                json_mode: false,
                grammar: false,
                max_batch_size: None,
                extensions: Default::default(),
            },
        }
    }

    pub fn provider_type(&self) -> ProviderType {
        ProviderType::HfTgi
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    pub fn list_models(&self) -> Result<Vec<ModelInfo>, ProviderError> {
        let body = self.transport.get(&format!("{}/info", self.base_url))?;
        let json: JsonValue = serde_json::from_str(&body)?;
        let name = json
            .get("model_id")
            .and_then(|n| n.as_str())
            .unwrap_or("unknown")
            .to_string();
        Ok(vec![ModelInfo {
            name,
            provider: ProviderType::HfTgi,
            size: None,
            quantization: json.get("quantize").and_then(|q| q.as_str()).map(|s| s.to_uppercase()),
            context_length: json.get("max_input_length").and_then(|c| c.as_u64()).map(|c| c as usize),
            parameters: None,
            is_loaded: true,
        }])
    }

    /// Flattens messages into TGI's single-prompt format: a role tag per
    /// turn, joined by newlines, ending with an open `Assistant:` turn.
    fn flatten_prompt(messages: &[ChatMessage]) -> String {
        let mut prompt = String::new();
        for m in messages {
            let tag = match m.role {
                Role::System => "System",
                Role::User => "User",
                Role::Assistant => "Assistant",
            };
            prompt.push_str(tag);
            prompt.push_str(": ");
            prompt.push_str(&m.content);
            prompt.push('\n');
        }
        prompt.push_str("Assistant:");
        prompt
    }

    fn build_request(&self, messages: &[ChatMessage], params: &ChatParams, stream: bool) -> String {
        let mut parameters = serde_json::json!({
            "temperature": params.temperature,
            "do_sample": params.temperature > 0.0,
        });
        if let Some(max_tokens) = params.max_tokens {
            parameters["max_new_tokens"] = serde_json::json!(max_tokens);
        }
        if !params.stop.is_empty() {
            parameters["stop"] = serde_json::json!(params.stop);
        }
        serde_json::json!({
            "inputs": Self::flatten_prompt(messages),
            "parameters": parameters,
            "stream": stream,
        })
        .to_string()
    }

    pub fn chat(&self, messages: &[ChatMessage], params: &ChatParams) -> Result<String, ProviderError> {
        let body = self.build_request(messages, params, false);
        let response = self
            .transport
            .post_json(&format!("{}/generate", self.base_url), &[], &body)?;
        let json: JsonValue = serde_json::from_str(&response)?;
        json.get("generated_text")
            .and_then(|t| t.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| ProviderError::Decode("missing generated_text".to_string()))
    }

    pub fn chat_streaming<F>(
        &self,
        messages: &[ChatMessage],
        params: &ChatParams,
        mut on_chunk: F,
        cancel: &AtomicBool,
    ) -> Result<String, ProviderError>
    where
        F: FnMut(&str),
    {
        let body = self.build_request(messages, params, true);
        let mut full = String::new();
        self.transport.post_stream(
            &format!("{}/generate_stream", self.base_url),
            &[],
            &body,
            &mut |line| {
                let Some(data) = line.trim().strip_prefix("data:") else {
                    return;
                };
                if let Ok(json) = serde_json::from_str::<JsonValue>(data.trim()) {
                    if let Some(text) = json.get("token").and_then(|t| t.get("text")).and_then(|t| t.as_str()) {
                        on_chunk(text);
                        full.push_str(text);
                    }
                }
            },
            cancel,
        )?;
        Ok(full)
    }
}
