//! Slash-command tokenizer, argument binder, and the "did you mean"
//! similarity heuristic, adapted from `CommandParser`/`_string_similarity`.

use super::types::{ArgValue, ArgumentDef, ArgumentType, ParsedArgs};
use crate::error::ArgumentError;
use regex::Regex;
use std::sync::OnceLock;

fn command_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^/([A-Za-z][A-Za-z0-9_-]*)\s*(.*)$").unwrap())
}

/// Splits `/<name> <rest>` into `(name, rest)`. Returns `None` if the
/// input is not a slash command.
pub fn split_command(input: &str) -> Option<(String, String)> {
    let captures = command_re().captures(input.trim())?;
    let name = captures.get(1)?.as_str().to_string();
    let rest = captures.get(2).map(|m| m.as_str().to_string()).unwrap_or_default();
    Some((name, rest))
}

/// Tokenizes `rest` respecting single/double quoted strings. No escape
/// sequences are supported inside quotes.
pub fn tokenize(rest: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut in_token = false;

    for ch in rest.chars() {
        match quote {
            Some(q) if ch == q => {
                quote = None;
            }
            Some(_) => current.push(ch),
            None => {
                if ch == '"' || ch == '\'' {
                    quote = Some(ch);
                    in_token = true;
                } else if ch.is_whitespace() {
                    if in_token {
                        tokens.push(std::mem::take(&mut current));
                        in_token = false;
                    }
                } else {
                    current.push(ch);
                    in_token = true;
                }
            }
        }
    }
    if in_token {
        tokens.push(current);
    }
    tokens
}

fn convert(raw: &str, ty: ArgumentType, arg_name: &str) -> Result<ArgValue, ArgumentError> {
    match ty {
        ArgumentType::String => Ok(ArgValue::String(raw.to_string())),
        ArgumentType::Int => raw.parse::<i64>().map(ArgValue::Int).map_err(|_| ArgumentError::TypeMismatch {
            arg_name: arg_name.to_string(),
            expected_type: "int".to_string(),
            got_value: raw.to_string(),
        }),
        ArgumentType::Float => raw.parse::<f64>().map(ArgValue::Float).map_err(|_| ArgumentError::TypeMismatch {
            arg_name: arg_name.to_string(),
            expected_type: "float".to_string(),
            got_value: raw.to_string(),
        }),
        ArgumentType::Bool => match raw.to_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(ArgValue::Bool(true)),
            "false" | "0" | "no" => Ok(ArgValue::Bool(false)),
            _ => Err(ArgumentError::TypeMismatch {
                arg_name: arg_name.to_string(),
                expected_type: "bool".to_string(),
                got_value: raw.to_string(),
            }),
        },
    }
}

/// Binds raw tokens to a command's declared arguments: positional tokens
/// fill `required` slots in order, remaining tokens are `key=value` pairs
/// or boolean flags (`--flag` / `flag`) matching a declared bool argument.
pub fn bind_arguments(tokens: &[String], defs: &[ArgumentDef]) -> Result<ParsedArgs, ArgumentError> {
    let mut bound: ParsedArgs = ParsedArgs::new();
    let required_order: Vec<&ArgumentDef> = defs.iter().filter(|d| d.required).collect();
    let mut positional_index = 0usize;

    for token in tokens {
        if let Some(flag) = token.strip_prefix("--").or_else(|| token.strip_prefix('-')) {
            if let Some((key, value)) = flag.split_once('=') {
                bind_keyed(&mut bound, defs, key, value)?;
                continue;
            }
            if let Some(def) = defs.iter().find(|d| d.name == flag && d.ty == ArgumentType::Bool) {
                bound.insert(def.name.clone(), ArgValue::Bool(true));
                continue;
            }
            return Err(ArgumentError::Unknown { arg_name: flag.to_string() });
        }

        if let Some((key, value)) = token.split_once('=') {
            bind_keyed(&mut bound, defs, key, value)?;
            continue;
        }

        if positional_index < required_order.len() {
            let def = required_order[positional_index];
            bound.insert(def.name.clone(), convert(token, def.ty, &def.name)?);
            positional_index += 1;
            continue;
        }

        return Err(ArgumentError::Unknown { arg_name: token.clone() });
    }

    for def in defs {
        if bound.contains_key(&def.name) {
            continue;
        }
        if let Some(default) = &def.default {
            bound.insert(def.name.clone(), default.clone());
        } else if def.required {
            return Err(ArgumentError::Missing { arg_name: def.name.clone() });
        }
    }

    Ok(bound)
}

fn bind_keyed(bound: &mut ParsedArgs, defs: &[ArgumentDef], key: &str, value: &str) -> Result<(), ArgumentError> {
    let def = defs
        .iter()
        .find(|d| d.name == key)
        .ok_or_else(|| ArgumentError::Unknown { arg_name: key.to_string() })?;
    bound.insert(def.name.clone(), convert(value, def.ty, &def.name)?);
    Ok(())
}

/// Character-match ratio at matching positions: `matches / max(len(s1),
/// len(s2))`. Deliberately not Levenshtein — matches
/// own "simple similarity", not a general edit-distance metric.
pub fn string_similarity(s1: &str, s2: &str) -> f64 {
    if s1.is_empty() || s2.is_empty() {
        return 0.0;
    }
    let max_len = s1.chars().count().max(s2.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    let matches = s1.chars().zip(s2.chars()).filter(|(a, b)| a == b).count();
    matches as f64 / max_len as f64
}

/// Up to 3 candidate names scoring above 0.6 similarity, highest first.
pub fn suggest(unknown: &str, candidates: impl IntoIterator<Item = impl Into<String>>) -> Vec<String> {
    let unknown_lower = unknown.to_lowercase();
    let mut scored: Vec<(String, f64)> = candidates
        .into_iter()
        .map(|c| c.into())
        .filter_map(|name| {
            let score = string_similarity(&unknown_lower, &name.to_lowercase());
            (score > 0.6).then_some((name, score))
        })
        .collect();
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.into_iter().take(3).map(|(name, _)| name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_command_and_rest() {
        let (name, rest) = split_command("/model-info llama3").unwrap();
        assert_eq!(name, "model-info");
        assert_eq!(rest, "llama3");
    }

    #[test]
    fn non_slash_input_is_not_a_command() {
        assert!(split_command("hello there").is_none());
    }

    #[test]
    fn tokenize_respects_quoted_strings() {
        let tokens = tokenize(r#"save "my session" --format=json"#);
        assert_eq!(tokens, vec!["save", "my session", "--format=json"]);
    }

    #[test]
    fn positional_tokens_fill_required_slots_in_order() {
        let defs = vec![ArgumentDef::new("name", ArgumentType::String, true)];
        let tokens = vec!["llama3".to_string()];
        let bound = bind_arguments(&tokens, &defs).unwrap();
        assert_eq!(bound.get("name"), Some(&ArgValue::String("llama3".to_string())));
    }

    #[test]
    fn unknown_key_is_an_argument_error() {
        let defs = vec![ArgumentDef::new("name", ArgumentType::String, true)];
        let tokens = vec!["llama3".to_string(), "bogus=1".to_string()];
        let err = bind_arguments(&tokens, &defs).unwrap_err();
        assert_eq!(err, ArgumentError::Unknown { arg_name: "bogus".to_string() });
    }

    #[test]
    fn type_mismatch_is_reported_with_expected_type() {
        let defs = vec![ArgumentDef::new("count", ArgumentType::Int, true)];
        let tokens = vec!["not-a-number".to_string()];
        let err = bind_arguments(&tokens, &defs).unwrap_err();
        assert_eq!(
            err,
            ArgumentError::TypeMismatch {
                arg_name: "count".to_string(),
                expected_type: "int".to_string(),
                got_value: "not-a-number".to_string(),
            }
        );
    }

    #[test]
    fn missing_required_argument_is_reported() {
        let defs = vec![ArgumentDef::new("name", ArgumentType::String, true)];
        let err = bind_arguments(&[], &defs).unwrap_err();
        assert_eq!(err, ArgumentError::Missing { arg_name: "name".to_string() });
    }

    #[test]
    fn defaults_fill_absent_optional_arguments() {
        let defs = vec![ArgumentDef::new("format", ArgumentType::String, false)
            .with_default(ArgValue::String("text".to_string()))];
        let bound = bind_arguments(&[], &defs).unwrap();
        assert_eq!(bound.get("format"), Some(&ArgValue::String("text".to_string())));
    }

    #[test]
    fn bool_flag_without_value_is_true() {
        let defs = vec![ArgumentDef::new("detailed", ArgumentType::Bool, false)];
        let tokens = vec!["--detailed".to_string()];
        let bound = bind_arguments(&tokens, &defs).unwrap();
        assert_eq!(bound.get("detailed"), Some(&ArgValue::Bool(true)));
    }

    #[test]
    fn suggestions_require_similarity_above_threshold() {
        let suggestions = suggest("stauts", ["status", "setup", "session"]);
        assert!(suggestions.contains(&"status".to_string()));
    }

    #[test]
    fn suggestions_are_capped_at_three() {
        let suggestions = suggest("mod", ["mode", "model", "models", "mod"]);
        assert!(suggestions.len() <= 3);
    }
}
