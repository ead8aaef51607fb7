//! The minimum slash-command surface the core guarantees.
//! Each command is a small struct implementing [`Command`]; registration
//! happens once, in [`register_builtin_commands`].

use super::context::ExecutionContext;
use super::registry::{Command, CommandRegistry, RegistrationError};
use super::types::{ArgValue, ArgumentDef, ArgumentType, CommandResult, CommandSpec, ParsedArgs};
use crate::mode::Mode;

fn spec(name: &str, aliases: &[&str], category: &str, description: &str, args: Vec<ArgumentDef>) -> CommandSpec {
    CommandSpec {
        name: name.to_string(),
        aliases: aliases.iter().map(|s| s.to_string()).collect(),
        category: category.to_string(),
        description: description.to_string(),
        args,
    }
}

struct HelpCommand(CommandSpec);
impl Command for HelpCommand {
    fn spec(&self) -> &CommandSpec {
        &self.0
    }
    fn execute(&self, _args: ParsedArgs, ctx: &mut ExecutionContext) -> CommandResult {
        let mut names: Vec<&str> = ctx.registered_commands.iter().map(|c| c.name.as_str()).collect();
        names.sort_unstable();
        CommandResult::ok(format!("Available commands: {}", names.join(", ")))
    }
}

struct ExitCommand(CommandSpec);
impl Command for ExitCommand {
    fn spec(&self) -> &CommandSpec {
        &self.0
    }
    fn execute(&self, _args: ParsedArgs, _ctx: &mut ExecutionContext) -> CommandResult {
        CommandResult::exit()
    }
}

struct StatusCommand(CommandSpec);
impl Command for StatusCommand {
    fn spec(&self) -> &CommandSpec {
        &self.0
    }
    fn execute(&self, _args: ParsedArgs, ctx: &mut ExecutionContext) -> CommandResult {
        let provider = ctx
            .host
            .current_provider_type()
            .map(|p| p.as_str().to_string())
            .unwrap_or_else(|| "none detected".to_string());
        let model = ctx.host.current_model().unwrap_or_else(|| "none selected".to_string());
        CommandResult::ok(format!(
            "mode: {} | provider: {} | model: {}",
            ctx.host.current_mode().display_name(),
            provider,
            model
        ))
    }
}

struct ConfigCommand(CommandSpec);
impl Command for ConfigCommand {
    fn spec(&self) -> &CommandSpec {
        &self.0
    }
    fn execute(&self, _args: ParsedArgs, ctx: &mut ExecutionContext) -> CommandResult {
        let settings = ctx.host.settings();
        CommandResult::ok_with_data(
            format!("{}:{}", settings.llm_host, settings.llm_port),
            serde_json::to_value(settings).unwrap_or_default(),
        )
    }
}

struct SetupCommand(CommandSpec);
impl Command for SetupCommand {
    fn spec(&self) -> &CommandSpec {
        &self.0
    }
    fn execute(&self, _args: ParsedArgs, _ctx: &mut ExecutionContext) -> CommandResult {
        CommandResult::ok("Run provider auto-detection to pick up a running model server.")
    }
}

struct AboutCommand(CommandSpec);
impl Command for AboutCommand {
    fn spec(&self) -> &CommandSpec {
        &self.0
    }
    fn execute(&self, _args: ParsedArgs, _ctx: &mut ExecutionContext) -> CommandResult {
        CommandResult::ok(format!("codewright {}", env!("CARGO_PKG_VERSION")))
    }
}

struct ModelsCommand(CommandSpec);
impl Command for ModelsCommand {
    fn spec(&self) -> &CommandSpec {
        &self.0
    }
    fn execute(&self, _args: ParsedArgs, ctx: &mut ExecutionContext) -> CommandResult {
        match ctx.host.list_models() {
            Ok(models) => {
                let names: Vec<String> = models.into_iter().map(|m| m.name).collect();
                CommandResult::ok(if names.is_empty() {
                    "No models enumerable; provider may be reachable but empty.".to_string()
                } else {
                    names.join(", ")
                })
            }
            Err(err) => CommandResult::err(format!("could not list models: {err}")),
        }
    }
}

struct ModelCommand(CommandSpec);
impl Command for ModelCommand {
    fn spec(&self) -> &CommandSpec {
        &self.0
    }
    fn execute(&self, args: ParsedArgs, ctx: &mut ExecutionContext) -> CommandResult {
        let Some(ArgValue::String(name)) = args.get("name") else {
            return CommandResult::err("usage: /model <name>");
        };
        ctx.host.set_current_model(name.clone());
        CommandResult::ok(format!("current model set to {name}"))
    }
}

struct ModelInfoCommand(CommandSpec);
impl Command for ModelInfoCommand {
    fn spec(&self) -> &CommandSpec {
        &self.0
    }
    fn execute(&self, args: ParsedArgs, ctx: &mut ExecutionContext) -> CommandResult {
        let requested = args.get("name").and_then(ArgValue::as_str).map(|s| s.to_string());
        let target = requested.or_else(|| ctx.host.current_model());
        let Some(target) = target else {
            return CommandResult::err("no model selected and none given");
        };
        match ctx.host.list_models() {
            Ok(models) => match models.into_iter().find(|m| m.name == target) {
                Some(info) => CommandResult::ok_with_data(
                    format!("{}: {}", info.name, info.quantization.as_deref().unwrap_or("unknown quantization")),
                    serde_json::to_value(info).unwrap_or_default(),
                ),
                None => CommandResult::err(format!("model not found: {target}")),
            },
            Err(err) => CommandResult::err(format!("could not query model info: {err}")),
        }
    }
}

struct ModeCommand(CommandSpec);
impl Command for ModeCommand {
    fn spec(&self) -> &CommandSpec {
        &self.0
    }
    fn execute(&self, args: ParsedArgs, ctx: &mut ExecutionContext) -> CommandResult {
        let Some(ArgValue::String(requested)) = args.get("mode") else {
            return CommandResult::ok(format!("current mode: {}", ctx.host.current_mode().display_name()));
        };
        let mode = match requested.to_lowercase().as_str() {
            "chat" => Mode::Chat,
            "architect" => Mode::Architect,
            "execute" => Mode::Execute,
            "llvl" => Mode::Llvl,
            other => return CommandResult::err(format!("unknown mode: {other}")),
        };
        ctx.host.set_mode(mode);
        CommandResult::ok(format!("mode set to {}", mode.display_name()))
    }
}

struct ClearCommand(CommandSpec);
impl Command for ClearCommand {
    fn spec(&self) -> &CommandSpec {
        &self.0
    }
    fn execute(&self, _args: ParsedArgs, ctx: &mut ExecutionContext) -> CommandResult {
        ctx.host.clear_conversation();
        CommandResult::ok("conversation cleared")
    }
}

struct RefreshCommand(CommandSpec);
impl Command for RefreshCommand {
    fn spec(&self) -> &CommandSpec {
        &self.0
    }
    fn execute(&self, _args: ParsedArgs, ctx: &mut ExecutionContext) -> CommandResult {
        match ctx.host.list_models() {
            Ok(models) => CommandResult::ok(format!("refreshed: {} models available", models.len())),
            Err(err) => CommandResult::err(format!("refresh failed: {err}")),
        }
    }
}

struct SessionCommand(CommandSpec);
impl Command for SessionCommand {
    fn spec(&self) -> &CommandSpec {
        &self.0
    }
    fn execute(&self, args: ParsedArgs, _ctx: &mut ExecutionContext) -> CommandResult {
        let Some(ArgValue::String(action)) = args.get("action") else {
            return CommandResult::err("usage: /session save|load|list|delete [name]");
        };
        match action.as_str() {
            "save" | "load" | "list" | "delete" => CommandResult::err(
                "session persistence is handled by an external collaborator; the core only supplies the conversation to serialize",
            ),
            other => CommandResult::err(format!("unknown session action: {other}")),
        }
    }
}

struct McpCommand(CommandSpec);
impl Command for McpCommand {
    fn spec(&self) -> &CommandSpec {
        &self.0
    }
    fn execute(&self, args: ParsedArgs, ctx: &mut ExecutionContext) -> CommandResult {
        let Some(ArgValue::String(action)) = args.get("action") else {
            return CommandResult::err("usage: /mcp list|add|remove|connect|status [name] [url]");
        };
        match action.as_str() {
            "list" | "status" => {
                let servers = &ctx.host.settings().mcp_servers;
                if servers.is_empty() {
                    CommandResult::ok("no MCP servers configured")
                } else {
                    let summary: Vec<String> =
                        servers.iter().map(|(name, entry)| format!("{name} ({})", entry.url)).collect();
                    CommandResult::ok(summary.join(", "))
                }
            }
            "add" | "remove" | "connect" => {
                CommandResult::err("MCP server configuration is owned by an external collaborator")
            }
            other => CommandResult::err(format!("unknown mcp action: {other}")),
        }
    }
}

struct TuiCommand(CommandSpec);
impl Command for TuiCommand {
    fn spec(&self) -> &CommandSpec {
        &self.0
    }
    fn execute(&self, args: ParsedArgs, ctx: &mut ExecutionContext) -> CommandResult {
        let requested = args.get("state").and_then(ArgValue::as_str).unwrap_or("toggle").to_string();
        let now_on = match requested.as_str() {
            "on" | "off" | "toggle" => ctx.host.toggle_tui(),
            other => return CommandResult::err(format!("unknown tui state: {other}")),
        };
        CommandResult::ok(format!("tui {}", if now_on { "on" } else { "off" }))
    }
}

struct DebugCommand(CommandSpec);
impl Command for DebugCommand {
    fn spec(&self) -> &CommandSpec {
        &self.0
    }
    fn execute(&self, args: ParsedArgs, ctx: &mut ExecutionContext) -> CommandResult {
        let requested = args.get("state").and_then(ArgValue::as_str).unwrap_or("toggle").to_string();
        let now_on = match requested.as_str() {
            "on" | "off" | "toggle" => ctx.host.toggle_debug(),
            other => return CommandResult::err(format!("unknown debug state: {other}")),
        };
        CommandResult::ok(format!("debug {}", if now_on { "on" } else { "off" }))
    }
}

struct CopyCommand(CommandSpec);
impl Command for CopyCommand {
    fn spec(&self) -> &CommandSpec {
        &self.0
    }
    fn execute(&self, args: ParsedArgs, _ctx: &mut ExecutionContext) -> CommandResult {
        let text = args.get("text").and_then(ArgValue::as_str).map(|s| s.to_string());
        let file = args.get("file").and_then(ArgValue::as_str).map(|s| s.to_string());
        let payload = match (text, file) {
            (Some(t), _) => t,
            (None, Some(f)) => match std::fs::read_to_string(&f) {
                Ok(c) => c,
                Err(e) => return CommandResult::err(format!("could not read {f}: {e}")),
            },
            (None, None) => return CommandResult::err("usage: /copy --text=<t>|--file=<f> [--lines=<a-b>] [--format=<fmt>]"),
        };
        CommandResult::ok_with_data(
            "prepared for clipboard (the host environment performs the actual copy)".to_string(),
            serde_json::json!({ "payload": payload }),
        )
    }
}

struct ToolsCommand(CommandSpec);
impl Command for ToolsCommand {
    fn spec(&self) -> &CommandSpec {
        &self.0
    }
    fn execute(&self, args: ParsedArgs, ctx: &mut ExecutionContext) -> CommandResult {
        let category_filter = args.get("category").and_then(ArgValue::as_str);
        let detailed = args.get("detailed").and_then(ArgValue::as_bool).unwrap_or(false);

        let mut matches: Vec<&CommandSpec> = ctx
            .registered_commands
            .iter()
            .filter(|c| category_filter.map(|cat| c.category == cat).unwrap_or(true))
            .collect();
        matches.sort_by(|a, b| a.name.cmp(&b.name));

        let lines: Vec<String> = matches
            .iter()
            .map(|c| {
                if detailed {
                    format!("/{} [{}] - {}", c.name, c.category, c.description)
                } else {
                    format!("/{}", c.name)
                }
            })
            .collect();
        CommandResult::ok(lines.join("\n"))
    }
}

/// Registers the full minimum command surface.
pub fn register_builtin_commands(registry: &mut CommandRegistry) -> Result<(), RegistrationError> {
    registry.register(Box::new(HelpCommand(spec(
        "help",
        &[],
        "general",
        "Show available commands",
        vec![],
    ))))?;
    registry.register(Box::new(ExitCommand(spec(
        "exit",
        &["quit"],
        "general",
        "Exit the assistant",
        vec![],
    ))))?;
    registry.register(Box::new(StatusCommand(spec(
        "status",
        &[],
        "general",
        "Show current mode, provider, and model",
        vec![],
    ))))?;
    registry.register(Box::new(ConfigCommand(spec(
        "config",
        &[],
        "general",
        "Show current settings",
        vec![],
    ))))?;
    registry.register(Box::new(SetupCommand(spec(
        "setup",
        &[],
        "general",
        "Re-run provider auto-detection",
        vec![],
    ))))?;
    registry.register(Box::new(AboutCommand(spec(
        "about",
        &[],
        "general",
        "Show version information",
        vec![],
    ))))?;
    registry.register(Box::new(ModelsCommand(spec(
        "models",
        &[],
        "model",
        "List models available from the current provider",
        vec![],
    ))))?;
    registry.register(Box::new(ModelCommand(spec(
        "model",
        &[],
        "model",
        "Select the active model",
        vec![ArgumentDef::new("name", ArgumentType::String, true)],
    ))))?;
    registry.register(Box::new(ModelInfoCommand(spec(
        "model-info",
        &[],
        "model",
        "Show details about a model",
        vec![ArgumentDef::new("name", ArgumentType::String, false)],
    ))))?;
    registry.register(Box::new(ModeCommand(spec(
        "mode",
        &[],
        "general",
        "Show or switch the operating mode",
        vec![ArgumentDef::new("mode", ArgumentType::String, false)
            .with_choices(["chat", "architect", "execute", "llvl"])],
    ))))?;
    registry.register(Box::new(ClearCommand(spec(
        "clear",
        &["reset"],
        "general",
        "Clear the conversation",
        vec![],
    ))))?;
    registry.register(Box::new(RefreshCommand(spec(
        "refresh",
        &[],
        "model",
        "Refresh the model list from the provider",
        vec![],
    ))))?;
    registry.register(Box::new(SessionCommand(spec(
        "session",
        &[],
        "session",
        "Save, load, list, or delete a saved session",
        vec![ArgumentDef::new("action", ArgumentType::String, true)
            .with_choices(["save", "load", "list", "delete"])],
    ))))?;
    registry.register(Box::new(McpCommand(spec(
        "mcp",
        &[],
        "mcp",
        "Manage MCP server connections",
        vec![ArgumentDef::new("action", ArgumentType::String, true)
            .with_choices(["list", "add", "remove", "connect", "status"])],
    ))))?;
    registry.register(Box::new(TuiCommand(spec(
        "tui",
        &[],
        "general",
        "Toggle the terminal UI",
        vec![ArgumentDef::new("state", ArgumentType::String, false).with_choices(["on", "off", "toggle"])],
    ))))?;
    registry.register(Box::new(DebugCommand(spec(
        "debug",
        &[],
        "general",
        "Toggle verbose logging",
        vec![ArgumentDef::new("state", ArgumentType::String, false).with_choices(["on", "off", "toggle"])],
    ))))?;
    registry.register(Box::new(CopyCommand(spec(
        "copy",
        &[],
        "general",
        "Copy text, a file, or a line range",
        vec![
            ArgumentDef::new("text", ArgumentType::String, false),
            ArgumentDef::new("file", ArgumentType::String, false),
            ArgumentDef::new("lines", ArgumentType::String, false),
            ArgumentDef::new("format", ArgumentType::String, false)
                .with_default(ArgValue::String("text".to_string())),
        ],
    ))))?;
    registry.register(Box::new(ToolsCommand(spec(
        "tools",
        &[],
        "general",
        "List registered commands, optionally filtered by category",
        vec![
            ArgumentDef::new("category", ArgumentType::String, false),
            ArgumentDef::new("detailed", ArgumentType::Bool, false),
            ArgumentDef::new("search", ArgumentType::String, false),
        ],
    ))))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::context::CommandHost;
    use crate::config::Settings;
    use crate::mode::Mode;
    use crate::provider::{ModelInfo, ProviderError, ProviderType};

    struct FakeHost {
        settings: Settings,
        mode: Mode,
        model: Option<String>,
        debug: bool,
        tui: bool,
    }

    impl CommandHost for FakeHost {
        fn settings(&self) -> &Settings {
            &self.settings
        }
        fn current_mode(&self) -> Mode {
            self.mode
        }
        fn set_mode(&mut self, mode: Mode) {
            self.mode = mode;
        }
        fn current_provider_type(&self) -> Option<ProviderType> {
            Some(ProviderType::Ollama)
        }
        fn list_models(&self) -> Result<Vec<ModelInfo>, ProviderError> {
            Ok(vec![ModelInfo {
                name: "llama3".to_string(),
                provider: ProviderType::Ollama,
                size: None,
                quantization: None,
                context_length: None,
                parameters: None,
                is_loaded: true,
            }])
        }
        fn current_model(&self) -> Option<String> {
            self.model.clone()
        }
        fn set_current_model(&mut self, model: String) {
            self.model = Some(model);
        }
        fn clear_conversation(&mut self) {}
        fn toggle_debug(&mut self) -> bool {
            self.debug = !self.debug;
            self.debug
        }
        fn toggle_tui(&mut self) -> bool {
            self.tui = !self.tui;
            self.tui
        }
    }

    fn host() -> FakeHost {
        FakeHost { settings: Settings::default(), mode: Mode::Chat, model: None, debug: false, tui: true }
    }

    #[test]
    fn registers_every_builtin_without_conflict() {
        let mut registry = CommandRegistry::new();
        register_builtin_commands(&mut registry).unwrap();
        for name in [
            "help", "exit", "status", "config", "setup", "about", "models", "model", "model-info", "mode",
            "clear", "refresh", "session", "mcp", "tui", "debug", "copy", "tools",
        ] {
            assert!(registry.get(name).is_some(), "missing builtin: {name}");
        }
        assert!(registry.get("quit").is_some());
        assert!(registry.get("reset").is_some());
    }

    #[test]
    fn mode_command_switches_mode() {
        let mut registry = CommandRegistry::new();
        register_builtin_commands(&mut registry).unwrap();
        let mut h = host();
        let mut args = ParsedArgs::new();
        args.insert("mode".to_string(), ArgValue::String("architect".to_string()));
        let all_specs: Vec<CommandSpec> = vec![];
        let mut ctx = ExecutionContext::new(&mut h, &all_specs);
        let result = registry.get("mode").unwrap().execute(args, &mut ctx);
        assert!(result.success);
        assert_eq!(h.current_mode(), Mode::Architect);
    }

    #[test]
    fn model_command_requires_name() {
        let mut registry = CommandRegistry::new();
        register_builtin_commands(&mut registry).unwrap();
        let mut h = host();
        let all_specs: Vec<CommandSpec> = vec![];
        let mut ctx = ExecutionContext::new(&mut h, &all_specs);
        let result = registry.get("model").unwrap().execute(ParsedArgs::new(), &mut ctx);
        assert!(!result.success);
    }
}
