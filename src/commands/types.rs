//! Typed argument metadata for registered commands, adapted from the
//! tool-argument metadata to the command-registry surface.

use serde_json::Value as JsonValue;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentType {
    String,
    Int,
    Float,
    Bool,
}

impl ArgumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArgumentType::String => "string",
            ArgumentType::Int => "int",
            ArgumentType::Float => "float",
            ArgumentType::Bool => "bool",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl ArgValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ArgValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ArgValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

/// One argument a command accepts, in declaration order. Positional
/// tokens fill `required` slots first, in this order.
#[derive(Debug, Clone)]
pub struct ArgumentDef {
    pub name: String,
    pub required: bool,
    pub ty: ArgumentType,
    pub choices: Option<Vec<String>>,
    pub default: Option<ArgValue>,
}

impl ArgumentDef {
    pub fn new(name: impl Into<String>, ty: ArgumentType, required: bool) -> Self {
        Self { name: name.into(), required, ty, choices: None, default: None }
    }

    pub fn with_default(mut self, default: ArgValue) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_choices(mut self, choices: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.choices = Some(choices.into_iter().map(|s| s.into()).collect());
        self
    }
}

/// Declared shape of a registered command.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub name: String,
    pub aliases: Vec<String>,
    pub category: String,
    pub description: String,
    pub args: Vec<ArgumentDef>,
}

/// Outcome of running a command. Command errors never propagate past
/// dispatch; they are wrapped into a failed `CommandResult` instead.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandResult {
    pub success: bool,
    pub message: String,
    pub data: Option<JsonValue>,
    pub should_exit: bool,
}

impl CommandResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self { success: true, message: message.into(), data: None, should_exit: false }
    }

    pub fn ok_with_data(message: impl Into<String>, data: JsonValue) -> Self {
        Self { success: true, message: message.into(), data: Some(data), should_exit: false }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self { success: false, message: message.into(), data: None, should_exit: false }
    }

    pub fn exit() -> Self {
        Self { success: true, message: "Goodbye.".to_string(), data: None, should_exit: true }
    }
}

pub type ParsedArgs = HashMap<String, ArgValue>;
