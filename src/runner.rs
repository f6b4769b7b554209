//! Batch execution: run a script file or a source string once, or keep
//! re-running a file whenever it changes on disk.

use crate::repl::watcher::{is_reload_event, FileWatcher};
use anyhow::{Context, Result};
use colored::*;
use crossbeam_channel::unbounded;
use dex_core::{Interpreter, Value};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Read `path` and run it in `interpreter`, returning the last value
pub fn run_file(interpreter: &mut Interpreter, path: &Path) -> Result<Value> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    debug!(path = %path.display(), bytes = source.len(), "running script");
    Ok(interpreter.run_source(&source)?)
}

/// Evaluate a source string and return its last value
pub fn run_source(interpreter: &mut Interpreter, source: &str) -> Result<Value> {
    Ok(interpreter.run_source(source)?)
}

/// Print a batch failure the way every entry point reports it
pub fn report_error(error: &anyhow::Error) {
    eprintln!("{} {}", "Error:".bright_red().bold(), error.to_string().red());
}

/// Run `path` now and again on every modification, in the same session.
/// Failures are reported and the watch continues; returns when the event
/// channel closes.
pub fn watch_file(interpreter: &mut Interpreter, path: &Path) -> Result<()> {
    let (tx, rx) = unbounded();
    let mut watcher = FileWatcher::new(tx).context("Failed to create file watcher")?;
    watcher
        .watch(path)
        .with_context(|| format!("Failed to watch {}", path.display()))?;

    if let Err(e) = run_file(interpreter, path) {
        report_error(&e);
    }
    println!(
        "{} Watching {} for changes, Ctrl+C to stop",
        "watch".bright_cyan(),
        path.display().to_string().bright_green()
    );

    for event in rx {
        match event {
            Ok(event) if is_reload_event(&event) => {
                info!(path = %path.display(), "script changed, re-running");
                println!("{} File changed: {}", "reload".bright_yellow(), path.display());
                match run_file(interpreter, path) {
                    Ok(_) => println!("{} Reloaded successfully", "ok".bright_green()),
                    Err(e) => report_error(&e),
                }
            }
            Ok(_) => {}
            Err(e) => eprintln!("{} Watch error: {}", "Error:".red(), e),
        }
    }

    watcher.unwatch(path).ok();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dex_core::{DexError, InterpreterConfig};
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn interpreter() -> Interpreter {
        Interpreter::with_config(InterpreterConfig::default()).unwrap()
    }

    fn script(name: &str, source: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("dex-runner-{}-{}", std::process::id(), name));
        fs::write(&path, source).unwrap();
        path
    }

    #[test]
    fn test_run_file_returns_last_value() {
        let path = script("last.dex", "x = 20\nx + 22\n");
        let value = run_file(&mut interpreter(), &path).unwrap();
        fs::remove_file(&path).ok();
        assert_eq!(value, Value::Number(42.0));
    }

    #[test]
    fn test_missing_file_is_reported_with_path() {
        let err = run_file(&mut interpreter(), Path::new("/no/such/script.dex")).unwrap_err();
        assert!(err.to_string().contains("/no/such/script.dex"), "{}", err);
    }

    #[test]
    fn test_language_errors_keep_their_type() {
        let err = run_source(&mut interpreter(), "missing_name").unwrap_err();
        assert_eq!(
            err.downcast_ref::<DexError>(),
            Some(&DexError::Name("missing_name".to_string()))
        );
        assert!(err.to_string().starts_with("NameError"), "{}", err);
    }

    #[test]
    fn test_runs_share_one_session() {
        let mut dex = interpreter();
        run_source(&mut dex, "total = 1").unwrap();
        let path = script("session.dex", "total = total + 1\n");
        run_file(&mut dex, &path).unwrap();
        run_file(&mut dex, &path).unwrap();
        fs::remove_file(&path).ok();
        assert_eq!(run_source(&mut dex, "total").unwrap(), Value::Number(3.0));
    }
}
