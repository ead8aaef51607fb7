//! Slash-command surface: parsing, registration, and dispatch.

pub mod builtins;
pub mod context;
pub mod parser;
pub mod registry;
pub mod types;

pub use builtins::register_builtin_commands;
pub use context::{CommandHost, ExecutionContext};
pub use registry::{Command, CommandRegistry, RegistrationError};
pub use types::{ArgValue, ArgumentDef, ArgumentType, CommandResult, CommandSpec, ParsedArgs};

use crate::error::ArgumentError;

/// Parses and runs one line of user input as a slash command.
///
/// Returns `None` if `input` isn't a slash command at all, so callers can
/// fall through to the smart router. Command and argument errors never
/// propagate; they're wrapped into a failed [`CommandResult`] instead, per
/// the dispatch contract: a malformed command is user error, not a crash.
pub fn dispatch(input: &str, registry: &CommandRegistry, host: &mut dyn CommandHost) -> Option<CommandResult> {
    let (name, rest) = parser::split_command(input)?;

    let Some(command) = registry.get(&name) else {
        let suggestions = parser::suggest(&name, registry.all_names());
        let message = if suggestions.is_empty() {
            format!("unknown command: /{name}")
        } else {
            format!("unknown command: /{name}. Did you mean: {}?", suggestions.join(", "))
        };
        return Some(CommandResult::err(message));
    };

    let tokens = parser::tokenize(&rest);
    let args = match parser::bind_arguments(&tokens, &command.spec().args) {
        Ok(args) => args,
        Err(err) => return Some(CommandResult::err(describe_argument_error(&err))),
    };

    let all_specs: Vec<CommandSpec> = registry.all_registered_specs();
    let mut ctx = ExecutionContext::new(host, &all_specs);
    Some(command.execute(args, &mut ctx))
}

fn describe_argument_error(err: &ArgumentError) -> String {
    match err {
        ArgumentError::Unknown { arg_name } => format!("unknown argument: {arg_name}"),
        ArgumentError::TypeMismatch { arg_name, expected_type, got_value } => {
            format!("argument '{arg_name}' expected {expected_type}, got '{got_value}'")
        }
        ArgumentError::Missing { arg_name } => format!("missing required argument: {arg_name}"),
    }
}
