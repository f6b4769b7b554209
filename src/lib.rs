//! # Dex
//!
//! Command-line front end for the Dex scripting language. The language
//! itself lives in `dex-core`; this crate adds the batch runner, the
//! interactive REPL with its command registry, file watching, and tracing
//! setup.
//!
//! ## Modules
//!
//! - `runner`: run a script or source string once, or re-run a file on change.
//! - `repl`: the Read-Eval-Print Loop and its file watcher.
//! - `commands`: REPL commands (`help`, `env`, `reset`, `watch`, `quit`).
//! - `logging`: `tracing-subscriber` installation driven by `DEX_LOG`.

pub mod commands;
pub mod logging;
pub mod repl;
pub mod runner;

pub use dex_core::{DexError, Interpreter, InterpreterConfig, Value};
