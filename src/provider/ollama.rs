//! Ollama adapter: NDJSON streaming over `/api/chat`, `/api/tags` for model listing.

use super::quantization::parse_ollama_quantization;
use super::transport::{ProviderError, Transport};
use super::types::{Capabilities, ChatMessage, ChatParams, ModelInfo, ProviderType, Role};
use serde_json::Value as JsonValue;
use std::sync::atomic::AtomicBool;

pub struct OllamaProvider {
    base_url: String,
    transport: Box<dyn Transport>,
    capabilities: Capabilities,
}

impl OllamaProvider {
    pub fn new(base_url: impl Into<String>, transport: Box<dyn Transport>) -> Self {
        Self {
            base_url: base_url.into(),
            transport,
            capabilities: Capabilities {
                streaming: true,
                tools: false,
                vision: false,
                thinking: false,
                system_prompts: true,
                json_mode: true,
                grammar: false,
                max_batch_size: None,
                extensions: Default::default(),
            },
        }
    }

    pub fn provider_type(&self) -> ProviderType {
        ProviderType::Ollama
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    pub fn list_models(&self) -> Result<Vec<ModelInfo>, ProviderError> {
        let body = self.transport.get(&format!("{}/api/tags", self.base_url))?;
        let json: JsonValue = serde_json::from_str(&body)?;
        let models = json
            .get("models")
            .and_then(|m| m.as_array())
            .ok_or_else(|| ProviderError::Decode("missing models array".to_string()))?;

        Ok(models
            .iter()
            .map(|m| {
                let name = m.get("name").and_then(|n| n.as_str()).unwrap_or_default().to_string();
                let size = m.get("size").and_then(|s| s.as_u64());
                let quantization = m
                    .get("details")
                    .and_then(|d| d.get("quantization_level"))
                    .and_then(|q| q.as_str())
                    .map(|s| s.to_string())
                    .or_else(|| parse_ollama_quantization(&name));
                let parameters = m
                    .get("details")
                    .and_then(|d| d.get("parameter_size"))
                    .and_then(|p| p.as_str())
                    .map(|s| s.to_string());
                ModelInfo {
                    name,
                    provider: ProviderType::Ollama,
                    size,
                    quantization,
                    context_length: None,
                    parameters,
                    is_loaded: true,
                }
            })
            .collect())
    }

    fn build_request(&self, messages: &[ChatMessage], params: &ChatParams, stream: bool) -> String {
        let ollama_messages: Vec<JsonValue> = messages
            .iter()
            .map(|m| {
                let role = match m.role {
                    Role::System => "system",
                    Role::User => "user",
                    Role::Assistant => "assistant",
                };
                serde_json::json!({ "role": role, "content": m.content })
            })
            .collect();

        serde_json::json!({
            "model": params.model,
            "messages": ollama_messages,
            "stream": stream,
            "options": { "temperature": params.temperature },
        })
        .to_string()
    }

    pub fn chat(&self, messages: &[ChatMessage], params: &ChatParams) -> Result<String, ProviderError> {
        let body = self.build_request(messages, params, false);
        let response = self
            .transport
            .post_json(&format!("{}/api/chat", self.base_url), &[], &body)?;
        parse_chat_completion(&response)
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
        let mut done = false;
        self.transport.post_stream(
            &format!("{}/api/chat", self.base_url),
            &[],
            &body,
            &mut |line| {
                if done || line.trim().is_empty() {
                    return;
                }
                if let Ok(json) = serde_json::from_str::<JsonValue>(line) {
                    if let Some(content) = json.get("message").and_then(|m| m.get("content")).and_then(|c| c.as_str()) {
                        on_chunk(content);
                        full.push_str(content);
                    }
                    if json.get("done").and_then(|d| d.as_bool()) == Some(true) {
                        done = true;
                    }
                }
            },
            cancel,
        )?;
        Ok(full)
    }
}

fn parse_chat_completion(response: &str) -> Result<String, ProviderError> {
    let json: JsonValue = serde_json::from_str(response)?;
    json.get("message")
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| ProviderError::Decode("missing message.content".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::transport::FakeTransport;
    use std::sync::atomic::Ordering;

    fn provider(t: FakeTransport) -> OllamaProvider {
        OllamaProvider::new("http://x", Box::new(t))
    }

    #[test]
    fn lists_models_with_quantization_fallback() {
        let t = FakeTransport::new().with_get(
            "http://x/api/tags",
            r#"{"models":[{"name":"llama3:8b-instruct-q4_K_M","size":123}]}"#,
        );
        let models = provider(t).list_models().unwrap();
        assert_eq!(models.len(), 1);
        assert_eq!(models[0].quantization.as_deref(), Some("Q4_K_M"));
    }

    #[test]
    fn chat_parses_message_content() {
        let t = FakeTransport::new().with_post("http://x/api/chat", r#"{"message":{"content":"hi"}}"#);
        let out = provider(t)
            .chat(&[ChatMessage::user("hello")], &ChatParams::new("llama3"))
            .unwrap();
        assert_eq!(out, "hi");
    }

    #[test]
    fn chat_streaming_stops_at_done() {
        let t = FakeTransport::new().with_stream(
            "http://x/api/chat",
            vec![
                r#"{"message":{"content":"Hello"},"done":false}"#.to_string(),
                r#"{"message":{"content":" world"},"done":false}"#.to_string(),
                r#"{"message":{"content":"!"},"done":true}"#.to_string(),
                r#"{"message":{"content":"after"},"done":true}"#.to_string(),
            ],
        );
        let mut chunks = Vec::new();
        let full = provider(t)
            .chat_streaming(
                &[ChatMessage::user("hi")],
                &ChatParams::new("llama3"),
                |c| chunks.push(c.to_string()),
                &AtomicBool::new(false),
            )
            .unwrap();
        assert_eq!(full, "Hello world!");
        assert!(!chunks.join("").contains("after"));
    }

    #[test]
    fn chat_streaming_stops_when_cancelled() {
        let t = FakeTransport::new().with_stream(
            "http://x/api/chat",
            vec![
                r#"{"message":{"content":"Hello"},"done":false}"#.to_string(),
                r#"{"message":{"content":" world"},"done":false}"#.to_string(),
            ],
        );
        let cancel = AtomicBool::new(false);
        let mut chunks = Vec::new();
        let result = provider(t).chat_streaming(
            &[ChatMessage::user("hi")],
            &ChatParams::new("llama3"),
            |c| {
                chunks.push(c.to_string());
                cancel.store(true, Ordering::Relaxed);
            },
            &cancel,
        );
        assert!(matches!(result, Err(ProviderError::Cancelled)));
        assert_eq!(chunks, vec!["Hello".to_string()]);
    }
}
