//! REPL (Read-Eval-Print Loop) for the Dex language

use crate::commands::{create_registry, CommandContext, CommandResult};
use crate::repl::watcher::{is_reload_event, FileWatcher};
use crate::runner::run_file;
use anyhow::Result;
use colored::*;
use crossbeam_channel::{unbounded, Receiver, Sender};
use dex_core::{Interpreter, InterpreterConfig, Value};
use notify::Event;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::PathBuf;
use std::thread;
use tracing::debug;

pub mod watcher;

/// Types of events the REPL loop handles
enum ReplEvent {
    Input(Result<String, ReadlineError>),
}

/// Interactive REPL for the Dex language
pub struct Repl {
    editor: Option<DefaultEditor>,
    ctx: CommandContext,

    // Event channels
    tx_input: Sender<ReplEvent>,
    rx_input: Receiver<ReplEvent>,
    tx_watcher: Sender<notify::Result<Event>>,
    rx_watcher: Receiver<notify::Result<Event>>,

    // File watcher
    watcher: Option<FileWatcher>,
    watched: Option<PathBuf>,
}

impl Repl {
    pub fn new(config: InterpreterConfig) -> Result<Self> {
        let editor = DefaultEditor::new()?;
        let ctx = CommandContext::with_config(config)?;
        let (tx_input, rx_input) = unbounded();
        let (tx_watcher, rx_watcher) = unbounded();

        Ok(Repl {
            editor: Some(editor),
            ctx,
            tx_input,
            rx_input,
            tx_watcher,
            rx_watcher,
            watcher: None,
            watched: None,
        })
    }

    /// Start the REPL loop
    pub fn run(&mut self) -> Result<()> {
        println!("{}", "Dex interactive shell".bright_cyan().bold());
        println!(
            "Try: {}, {}, {}",
            "{a, b} = {1, 2}".cyan(),
            "Enum.map([1, 2], fn (x) -> x * 2 end)".cyan(),
            "\"sum #{a + b}\"".cyan()
        );
        println!(
            "Type '{}' for more information, '{}' or {} to exit.\n",
            "help".bright_green(),
            "quit".bright_red(),
            "Ctrl+C".bright_red()
        );

        let mut editor = self
            .editor
            .take()
            .ok_or_else(|| anyhow::anyhow!("REPL is already running"))?;
        let tx_input = self.tx_input.clone();

        thread::spawn(move || {
            let mut line_number = 1;
            loop {
                let prompt = format!("{} ", format!("dex({})>", line_number).bright_magenta().bold());
                match editor.readline(&prompt) {
                    Ok(line) => {
                        let line = line.trim().to_string();
                        if !line.is_empty() {
                            let _ = editor.add_history_entry(&line);
                            line_number += 1;
                        }
                        if tx_input.send(ReplEvent::Input(Ok(line))).is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        let _ = tx_input.send(ReplEvent::Input(Err(err)));
                        break;
                    }
                }
            }
        });

        let registry = create_registry();

        loop {
            crossbeam_channel::select! {
                recv(self.rx_input) -> msg => match msg {
                    Ok(ReplEvent::Input(Ok(line))) => {
                        if line.is_empty() {
                            continue;
                        }

                        match registry.execute(&line, &mut self.ctx) {
                            CommandResult::Success => {}
                            CommandResult::Message(msg) => println!("{}", msg),
                            CommandResult::Exit => {
                                println!("{}", "Goodbye!".bright_cyan());
                                break;
                            }
                            CommandResult::Error(e) => {
                                println!("{} {}", "Error:".bright_red().bold(), e.red());
                            }
                            CommandResult::Watch(path) => self.watch(PathBuf::from(path)),
                            CommandResult::NotACommand => {
                                match evaluate_line(&mut self.ctx.interpreter, &line) {
                                    Ok(values) => {
                                        for value in values {
                                            println!("{}", value.to_colored_string());
                                        }
                                    }
                                    Err(e) => println!(
                                        "{} {}",
                                        "Error:".bright_red().bold(),
                                        e.to_string().red()
                                    ),
                                }
                            }
                        }
                    }
                    Ok(ReplEvent::Input(Err(ReadlineError::Interrupted)))
                    | Ok(ReplEvent::Input(Err(ReadlineError::Eof))) => {
                        println!("{}", "Goodbye!".bright_cyan());
                        break;
                    }
                    Ok(ReplEvent::Input(Err(err))) => {
                        println!(
                            "{} {}",
                            "Error reading input:".bright_red().bold(),
                            err.to_string().red()
                        );
                        break;
                    }
                    Err(_) => break,
                },

                recv(self.rx_watcher) -> msg => match msg {
                    Ok(Ok(event)) if is_reload_event(&event) => {
                        for path in event.paths {
                            println!("{} File changed: {}", "reload".bright_yellow(), path.display());
                            match run_file(&mut self.ctx.interpreter, &path) {
                                Ok(_) => println!("{} Reloaded successfully", "ok".bright_green()),
                                Err(e) => println!("{} {}", "Error:".bright_red().bold(), e.to_string().red()),
                            }
                        }
                    }
                    Ok(Ok(_)) => {}
                    Ok(Err(e)) => println!("{} Watch error: {}", "Error:".red(), e),
                    Err(_) => break,
                }
            }
        }

        Ok(())
    }

    /// Watch `path`, replacing any previously watched file
    fn watch(&mut self, path: PathBuf) {
        if self.watcher.is_none() {
            match FileWatcher::new(self.tx_watcher.clone()) {
                Ok(w) => self.watcher = Some(w),
                Err(e) => {
                    println!("{} Failed to create watcher: {}", "Error:".red(), e);
                    return;
                }
            }
        }

        let Some(watcher) = self.watcher.as_mut() else {
            return;
        };
        if let Some(previous) = self.watched.take() {
            debug!(path = %previous.display(), "no longer watching");
            let _ = watcher.unwatch(&previous);
        }
        match watcher.watch(&path) {
            Ok(()) => {
                println!(
                    "{} Watching {} for changes...",
                    "watch".bright_cyan(),
                    path.display().to_string().bright_green()
                );
                self.watched = Some(path);
            }
            Err(e) => println!("{} Failed to watch {}: {}", "Error:".red(), path.display(), e),
        }
    }
}

/// Run one input line statement by statement, returning the values worth
/// echoing (everything but null). Bindings made before a failing
/// statement are kept.
pub fn evaluate_line(interpreter: &mut Interpreter, line: &str) -> dex_core::Result<Vec<Value>> {
    let values = interpreter.run_statements(line)?;
    Ok(values
        .into_iter()
        .filter(|value| !matches!(value, Value::Null))
        .collect())
}

/// Convenience function to start the REPL
pub fn start(config: InterpreterConfig) -> Result<()> {
    let mut repl = Repl::new(config).map_err(|e| anyhow::anyhow!("Failed to initialize REPL: {}", e))?;
    repl.run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dex_core::DexError;
    use pretty_assertions::assert_eq;

    fn interpreter() -> Interpreter {
        Interpreter::with_config(InterpreterConfig::default()).unwrap()
    }

    fn echoed(interpreter: &mut Interpreter, line: &str) -> Vec<String> {
        evaluate_line(interpreter, line)
            .unwrap()
            .iter()
            .map(Value::to_string)
            .collect()
    }

    #[test]
    fn test_each_statement_value_is_echoed() {
        let mut dex = interpreter();
        assert_eq!(echoed(&mut dex, "x = 1; x + 1; :ok"), vec!["1", "2", ":ok"]);
    }

    #[test]
    fn test_null_values_are_not_echoed() {
        let mut dex = interpreter();
        assert_eq!(echoed(&mut dex, "def f() do 1 end"), vec!["#Function<f/0>"]);
        assert_eq!(echoed(&mut dex, "f(); null; \"s\""), vec!["\"s\""]);
    }

    #[test]
    fn test_session_survives_errors() {
        let mut dex = interpreter();
        echoed(&mut dex, "count = 1");
        assert_eq!(
            evaluate_line(&mut dex, "count = count + 1; oops"),
            Err(DexError::Name("oops".to_string()))
        );
        assert!(evaluate_line(&mut dex, "{").is_err());
        assert_eq!(echoed(&mut dex, "count"), vec!["2"]);
    }
}
