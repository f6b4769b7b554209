//! Command registry for REPL commands
//!
//! Lines that start with a registered prefix are handled here; everything
//! else is Dex source for the interpreter.

pub mod general;

use dex_core::{Interpreter, InterpreterConfig};

/// Result of executing a command
#[derive(Debug, PartialEq)]
pub enum CommandResult {
    /// Command executed successfully, continue REPL
    Success,
    /// Command executed, show this message
    Message(String),
    /// Exit the REPL
    Exit,
    /// Not a command, evaluate the line as source
    NotACommand,
    Error(String),
    /// Watch a file for changes
    Watch(String),
}

/// Context passed to command handlers
pub struct CommandContext {
    pub interpreter: Interpreter,
}

impl CommandContext {
    pub fn new(interpreter: Interpreter) -> Self {
        Self { interpreter }
    }

    pub fn with_config(config: InterpreterConfig) -> dex_core::Result<Self> {
        Ok(Self::new(Interpreter::with_config(config)?))
    }
}

/// A command handler function
pub type CommandHandler = fn(&str, &mut CommandContext) -> CommandResult;

/// Registry of available commands
pub struct CommandRegistry {
    /// Sorted by prefix length descending for longest-match-first lookup
    commands: Vec<(String, CommandHandler)>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    pub fn register(&mut self, prefix: &str, handler: CommandHandler) {
        self.commands.push((prefix.to_string(), handler));
        self.commands.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
    }

    /// Execute a command, returning NotACommand if no prefix matches.
    /// A prefix followed by an operator is source using the name as a
    /// variable (`reset = 0`, `help == 1`), not a command.
    pub fn execute(&self, input: &str, ctx: &mut CommandContext) -> CommandResult {
        for (prefix, handler) in &self.commands {
            if input == prefix || input.starts_with(&format!("{} ", prefix)) {
                let args = input[prefix.len()..].trim();
                if continues_expression(args) {
                    return CommandResult::NotACommand;
                }
                return handler(args, ctx);
            }
        }
        CommandResult::NotACommand
    }

    pub fn list_commands(&self) -> Vec<&str> {
        self.commands.iter().map(|(p, _)| p.as_str()).collect()
    }
}

/// Whether command arguments actually continue an expression
fn continues_expression(args: &str) -> bool {
    const OPERATORS: &str = "=+-*%<>!([{";
    args.starts_with(|c: char| OPERATORS.contains(c))
        || matches!(args.split_whitespace().next(), Some("and" | "or"))
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a registry with every built-in command
pub fn create_registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new();

    registry.register("help", general::cmd_help);
    registry.register("quit", general::cmd_quit);
    registry.register("exit", general::cmd_quit);
    registry.register("watch", general::cmd_watch);
    registry.register("env", general::cmd_env);
    registry.register("reset", general::cmd_reset);

    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn context() -> CommandContext {
        CommandContext::with_config(InterpreterConfig::default()).unwrap()
    }

    #[test]
    fn test_registry_lists_every_command() {
        let registry = create_registry();
        let mut commands = registry.list_commands();
        commands.sort_unstable();
        assert_eq!(commands, vec!["env", "exit", "help", "quit", "reset", "watch"]);
    }

    #[test]
    fn test_prefix_must_be_a_whole_word() {
        let registry = create_registry();
        let mut ctx = context();
        assert_eq!(registry.execute("quit", &mut ctx), CommandResult::Exit);
        assert_eq!(registry.execute("exit", &mut ctx), CommandResult::Exit);
        assert_eq!(registry.execute("quitter = 1", &mut ctx), CommandResult::NotACommand);
        assert_eq!(registry.execute("envelope", &mut ctx), CommandResult::NotACommand);
    }

    #[test]
    fn test_command_names_can_be_used_as_variables() {
        let registry = create_registry();
        let mut ctx = context();
        ctx.interpreter.run_source("kept = 1").unwrap();

        for line in ["reset = 0", "quit = true", "env = 1", "help = 2", "watch == 3", "exit and true"] {
            assert_eq!(registry.execute(line, &mut ctx), CommandResult::NotACommand, "{}", line);
        }
        assert_eq!(ctx.interpreter.run_source("kept").unwrap(), dex_core::Value::Number(1.0));

        // Paths still reach watch
        assert_eq!(
            registry.execute("watch ./demo.dex", &mut ctx),
            CommandResult::Watch("./demo.dex".to_string())
        );
        assert_eq!(
            registry.execute("watch /tmp/demo.dex", &mut ctx),
            CommandResult::Watch("/tmp/demo.dex".to_string())
        );
    }

    #[test]
    fn test_arguments_are_trimmed() {
        let registry = create_registry();
        let mut ctx = context();
        assert_eq!(
            registry.execute("watch   demo.dex  ", &mut ctx),
            CommandResult::Watch("demo.dex".to_string())
        );
    }

    #[test]
    fn test_longest_prefix_wins() {
        fn short(_: &str, _: &mut CommandContext) -> CommandResult {
            CommandResult::Message("short".to_string())
        }
        fn long(args: &str, _: &mut CommandContext) -> CommandResult {
            CommandResult::Message(format!("long {}", args))
        }

        let mut registry = CommandRegistry::new();
        registry.register("show", short);
        registry.register("show all", long);
        let mut ctx = context();
        assert_eq!(
            registry.execute("show all now", &mut ctx),
            CommandResult::Message("long now".to_string())
        );
        assert_eq!(
            registry.execute("show x", &mut ctx),
            CommandResult::Message("short".to_string())
        );
    }
}
