//! Command registry: name/alias uniqueness enforcement, grounded in the
//! `CommandRegistry.register` (raises on a name or alias
//! collision rather than silently overwriting).

use super::context::ExecutionContext;
use super::types::{CommandResult, CommandSpec, ParsedArgs};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RegistrationError {
    #[error("command '{0}' is already registered")]
    DuplicateCommand(String),
    #[error("alias '{0}' conflicts with an existing command or alias")]
    AliasConflict(String),
}

pub trait Command: Send + Sync {
    fn spec(&self) -> &CommandSpec;
    fn execute(&self, args: ParsedArgs, ctx: &mut ExecutionContext) -> CommandResult;
}

#[derive(Default)]
pub struct CommandRegistry {
    commands: HashMap<String, Box<dyn Command>>,
    aliases: HashMap<String, String>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, command: Box<dyn Command>) -> Result<(), RegistrationError> {
        let spec = command.spec();
        let name = spec.name.clone();
        if self.commands.contains_key(&name) {
            return Err(RegistrationError::DuplicateCommand(name));
        }
        for alias in &spec.aliases {
            if self.commands.contains_key(alias) || self.aliases.contains_key(alias) {
                return Err(RegistrationError::AliasConflict(alias.clone()));
            }
        }
        for alias in &spec.aliases {
            self.aliases.insert(alias.clone(), name.clone());
        }
        self.commands.insert(name, command);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&dyn Command> {
        if let Some(command) = self.commands.get(name) {
            return Some(command.as_ref());
        }
        let target = self.aliases.get(name)?;
        self.commands.get(target).map(|c| c.as_ref())
    }

    pub fn all_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.commands.keys().cloned().collect();
        names.extend(self.aliases.keys().cloned());
        names
    }

    /// Specs of every registered command (not aliases), for introspective
    /// commands like `/help`/`/tools` that need to list what's registered.
    pub fn all_registered_specs(&self) -> Vec<CommandSpec> {
        self.commands.values().map(|c| c.spec().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
