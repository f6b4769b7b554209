//! General REPL commands (help, quit, watch, env, reset)

use crate::commands::{CommandContext, CommandResult};
use colored::*;
use dex_core::parser::builtins::GLOBAL_FUNCTIONS;
use dex_core::Value;

/// Handle `help` command
pub fn cmd_help(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    print_help(ctx);
    CommandResult::Success
}

/// Handle `quit` or `exit` command
pub fn cmd_quit(_args: &str, _ctx: &mut CommandContext) -> CommandResult {
    CommandResult::Exit
}

/// Handle `watch <file>` command
pub fn cmd_watch(args: &str, _ctx: &mut CommandContext) -> CommandResult {
    if args.is_empty() {
        return CommandResult::Error("Usage: watch <file>".to_string());
    }
    CommandResult::Watch(args.to_string())
}

/// Handle `env [all]`: user bindings of the session, or every visible
/// binding including builtins
pub fn cmd_env(args: &str, ctx: &mut CommandContext) -> CommandResult {
    let env = ctx.interpreter.environment().borrow();
    let bindings = match args {
        "" => env.local_bindings(),
        "all" => env.all_bindings(),
        _ => return CommandResult::Error("Usage: env [all]".to_string()),
    };

    if bindings.is_empty() {
        return CommandResult::Message("No bindings".dimmed().to_string());
    }

    let lines: Vec<String> = bindings
        .iter()
        .map(|(name, value)| format!("{} = {}", name.bright_green(), value))
        .collect();
    CommandResult::Message(lines.join("\n"))
}

/// Handle `reset` command
pub fn cmd_reset(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    match ctx.interpreter.reset() {
        Ok(()) => CommandResult::Message("Environment reset".bright_green().to_string()),
        Err(e) => CommandResult::Error(e.to_string()),
    }
}

/// Print help information
fn print_help(ctx: &CommandContext) {
    println!("{}", "Dex Language Help".bold());
    println!("{}", "=================".bold());
    println!();
    println!("{}", "Basics:".green());
    println!("  {}          - Bind or reassign", "x = 1".cyan());
    println!("  {}      - Declare in the current scope", "let x = 1".cyan());
    println!("  {}  - Destructure a tuple", "{a, b} = {1, 2}".cyan());
    println!("  {}     - Interpolate into a string", "\"x is #{x}\"".cyan());
    println!();
    println!("{}", "Control flow:".green());
    println!("  {}", "if x > 1 do ... elif x == 1 do ... else ... end".cyan());
    println!("  {}", "while i < 10 do ... end".cyan());
    println!("  {}", "def add(a, b) do return a + b end".cyan());
    println!("  {}", "double = fn (x) -> x * 2 end".cyan());
    println!();
    println!("{}", "Global functions:".green());
    for (_, description) in GLOBAL_FUNCTIONS {
        println!("  {}", description);
    }
    println!();
    println!("{}", "Modules:".green());
    let env = ctx.interpreter.environment().borrow();
    for (name, value) in env.all_bindings() {
        if let Value::Module(module) = value {
            println!(
                "  {} {}",
                format!("{}:", name).cyan(),
                module.function_names().join(", ")
            );
        }
    }
    println!();
    println!("{}", "Commands:".green());
    println!("  {}       - Show user bindings", "env [all]".bright_green());
    println!("  {}           - Clear every binding", "reset".bright_green());
    println!("  {}    - Re-run a file when it changes", "watch <file>".bright_green());
    println!("  {}            - Show this help", "help".bright_green());
    println!("  {}     - Exit the REPL", "quit / exit".bright_red());
}

#[cfg(test)]
mod tests {
    use super::*;
    use dex_core::InterpreterConfig;
    use pretty_assertions::assert_eq;

    fn context() -> CommandContext {
        colored::control::set_override(false);
        CommandContext::with_config(InterpreterConfig::default()).unwrap()
    }

    #[test]
    fn test_watch_requires_a_path() {
        let mut ctx = context();
        assert_eq!(
            cmd_watch("", &mut ctx),
            CommandResult::Error("Usage: watch <file>".to_string())
        );
        assert_eq!(
            cmd_watch("loop.dex", &mut ctx),
            CommandResult::Watch("loop.dex".to_string())
        );
    }

    #[test]
    fn test_env_lists_user_bindings_only() {
        let mut ctx = context();
        assert_eq!(
            cmd_env("", &mut ctx),
            CommandResult::Message("No bindings".to_string())
        );

        ctx.interpreter.run_source("b = :two\na = 1").unwrap();
        assert_eq!(
            cmd_env("", &mut ctx),
            CommandResult::Message("a = 1\nb = :two".to_string())
        );
    }

    #[test]
    fn test_env_all_includes_builtins() {
        let mut ctx = context();
        match cmd_env("all", &mut ctx) {
            CommandResult::Message(text) => {
                assert!(text.contains("print = #NativeFunction<print>"), "{}", text);
                assert!(text.contains("true = true"), "{}", text);
            }
            other => panic!("Expected message, got {:?}", other),
        }
        assert!(matches!(cmd_env("bogus", &mut ctx), CommandResult::Error(_)));
    }

    #[test]
    fn test_reset_clears_bindings() {
        let mut ctx = context();
        ctx.interpreter.run_source("x = 1").unwrap();
        assert!(matches!(cmd_reset("", &mut ctx), CommandResult::Message(_)));
        assert!(ctx.interpreter.run_source("x").is_err());
        assert!(ctx.interpreter.run_source("print").is_ok());
    }
}
