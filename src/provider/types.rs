//! Provider-agnostic data types: ProviderDescriptor, Capabilities,
//! ModelInfo, ChatMessage.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Which concrete backend a descriptor/adapter speaks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderType {
    Ollama,
    Vllm,
    LmStudio,
    HfTgi,
    OpenAiCompatible,
}

impl ProviderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderType::Ollama => "ollama",
            ProviderType::Vllm => "vllm",
            ProviderType::LmStudio => "lm_studio",
            ProviderType::HfTgi => "hf_tgi",
            ProviderType::OpenAiCompatible => "openai_compatible",
        }
    }
}

/// Declared features of the active provider, consulted before use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capabilities {
    pub streaming: bool,
    pub tools: bool,
    pub vision: bool,
    pub thinking: bool,
    pub system_prompts: bool,
    pub json_mode: bool,
    pub grammar: bool,
    pub max_batch_size: Option<usize>,
    /// Provider-specific extension flags that don't warrant their own field.
    #[serde(default)]
    pub extensions: HashMap<String, bool>,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            streaming: true,
            tools: false,
            vision: false,
            thinking: false,
            system_prompts: true,
            json_mode: false,
            grammar: false,
            max_batch_size: None,
            extensions: HashMap::new(),
        }
    }
}

/// Immutable record of a detected/configured provider (one per process).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
    pub provider_type: ProviderType,
    pub base_url: String,
    #[serde(with = "duration_millis")]
    pub timeout: Duration,
    pub capabilities: Capabilities,
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

/// A model as reported by `listModels`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    pub provider: ProviderType,
    pub size: Option<u64>,
    pub quantization: Option<String>,
    pub context_length: Option<usize>,
    pub parameters: Option<String>,
    pub is_loaded: bool,
}

/// A message role, restricted to the universal subset every provider
/// supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One turn in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    /// Base64-encoded images, only meaningful when `Capabilities::vision`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into(), images: Vec::new() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into(), images: Vec::new() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into(), images: Vec::new() }
    }
}

/// Parameters shared by `chat`/`stream` calls across every backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatParams {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<usize>,
    pub stop: Vec<String>,
}

impl ChatParams {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
            stop: Vec::new(),
        }
    }
}
