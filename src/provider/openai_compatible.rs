//! Adapter for the OpenAI-compatible chat-completions wire format, shared
//! by vLLM, LM Studio, and any other `/v1/chat/completions` backend.
//! Streaming is server-sent events, terminated by a literal `data: [DONE]`.

use super::quantization::parse_lm_studio_quantization;
use super::transport::{ProviderError, Transport};
use super::types::{Capabilities, ChatMessage, ChatParams, ModelInfo, ProviderType, Role};
use serde_json::Value as JsonValue;
use std::sync::atomic::AtomicBool;

pub struct OpenAiCompatibleProvider {
    provider_type: ProviderType,
    base_url: String,
    api_key: Option<String>,
    transport: Box<dyn Transport>,
    capabilities: Capabilities,
}

impl OpenAiCompatibleProvider {
    pub fn new(
        provider_type: ProviderType,
        base_url: impl Into<String>,
        api_key: Option<String>,
        transport: Box<dyn Transport>,
    ) -> Self {
        Self {
            provider_type,
            base_url: base_url.into(),
            api_key,
            transport,
            capabilities: Capabilities {
                streaming: true,
                tools: matches!(provider_type, ProviderType::Vllm | ProviderType::OpenAiCompatible),
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
        self.provider_type
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        let mut h = vec![("Content-Type", "application/json")];
        if let Some(key) = &self.api_key {
            h.push(("Authorization", key.as_str()));
        }
        h
    }

    pub fn list_models(&self) -> Result<Vec<ModelInfo>, ProviderError> {
        let headers = self.headers();
        let body = self
            .transport
            .post_json(&format!("{}/v1/models", self.base_url), &[], "")
            .or_else(|_| self.transport.get(&format!("{}/v1/models", self.base_url)))?;
        let _ = headers;
        let json: JsonValue = serde_json::from_str(&body)?;
        let data = json
            .get("data")
            .and_then(|d| d.as_array())
            .ok_or_else(|| ProviderError::Decode("missing data array".to_string()))?;

        Ok(data
            .iter()
            .map(|m| {
                let name = m.get("id").and_then(|n| n.as_str()).unwrap_or_default().to_string();
                ModelInfo {
                    quantization: parse_lm_studio_quantization(&name),
                    name,
                    provider: self.provider_type,
                    size: None,
                    context_length: m.get("context_length").and_then(|c| c.as_u64()).map(|c| c as usize),
                    parameters: None,
                    is_loaded: true,
                }
            })
            .collect())
    }

    fn build_request(&self, messages: &[ChatMessage], params: &ChatParams, stream: bool) -> String {
        let oa_messages: Vec<JsonValue> = messages
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

        let mut request = serde_json::json!({
            "model": params.model,
            "messages": oa_messages,
            "temperature": params.temperature,
            "stream": stream,
        });
        if let Some(max_tokens) = params.max_tokens {
            request["max_tokens"] = serde_json::json!(max_tokens);
        }
        if !params.stop.is_empty() {
            request["stop"] = serde_json::json!(params.stop);
        }
        request.to_string()
    }

    pub fn chat(&self, messages: &[ChatMessage], params: &ChatParams) -> Result<String, ProviderError> {
        let body = self.build_request(messages, params, false);
        let response = self.transport.post_json(
            &format!("{}/v1/chat/completions", self.base_url),
            &self.headers(),
            &body,
        )?;
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
            &format!("{}/v1/chat/completions", self.base_url),
            &self.headers(),
            &body,
            &mut |line| {
                if done {
                    return;
                }
                let Some(data) = line.trim().strip_prefix("data: ") else {
                    return;
                };
                if data == "[DONE]" {
                    done = true;
                    return;
                }
                if let Ok(json) = serde_json::from_str::<JsonValue>(data) {
                    if let Some(text) = json["choices"]
                        .get(0)
                        .and_then(|c| c.get("delta"))
                        .and_then(|d| d.get("content"))
                        .and_then(|c| c.as_str())
                    {
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

fn parse_chat_completion(response: &str) -> Result<String, ProviderError> {
    let json: JsonValue = serde_json::from_str(response)?;
    json["choices"]
        .get(0)
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| ProviderError::Decode("missing choices[0].message.content".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::transport::FakeTransport;

    fn provider(t: FakeTransport) -> OpenAiCompatibleProvider {
        OpenAiCompatibleProvider::new(ProviderType::Vllm, "http://x", None, Box::new(t))
    }

    #[test]
    fn chat_parses_choices() {
        let t = FakeTransport::new()
            .with_post("http://x/v1/chat/completions", r#"{"choices":[{"message":{"content":"hi"}}]}"#);
        let out = provider(t)
            .chat(&[ChatMessage::user("hello")], &ChatParams::new("m"))
            .unwrap();
        assert_eq!(out, "hi");
    }

    #[test]
    fn streaming_stops_at_done_marker() {
        let t = FakeTransport::new().with_stream(
            "http://x/v1/chat/completions",
            vec![
                "data: {\"choices\":[{\"delta\":{\"content\":\"Hello\"}}]}".to_string(),
                "data: {\"choices\":[{\"delta\":{\"content\":\" world\"}}]}".to_string(),
                "data: [DONE]".to_string(),
                "data: {\"choices\":[{\"delta\":{\"content\":\"after\"}}]}".to_string(),
            ],
        );
        let mut chunks = Vec::new();
        let full = provider(t)
            .chat_streaming(
                &[ChatMessage::user("hi")],
                &ChatParams::new("m"),
                |c| chunks.push(c.to_string()),
                &AtomicBool::new(false),
            )
            .unwrap();
        assert_eq!(full, "Hello world");
        assert!(!chunks.join("").contains("after"));
    }
}
