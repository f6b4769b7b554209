//! # Dex Core
//!
//! Language pipeline for Dex, a small dynamically typed scripting language
//! with atoms, tuples, lists, maps, pattern-matching assignment and
//! closures: lexer, parser, environments, tree-walking evaluator and the
//! native standard library.
//!
//! ## Features
//!
//! - **colored**: Enable colored terminal rendering of values
//!
//! ## Example
//!
//! ```
//! use dex_core::{Interpreter, InterpreterConfig, Value};
//!
//! let mut interpreter = Interpreter::with_config(InterpreterConfig::default())?;
//! let value = interpreter.run_source("{x, y} = {1, 2}\nx + y")?;
//! assert_eq!(value, Value::Number(3.0));
//! # Ok::<(), dex_core::DexError>(())
//! ```

pub mod parser;
pub mod stdlib;
pub mod types;

// Re-export commonly used types
pub use parser::{DexError, Interpreter, Result};
pub use types::{InterpreterConfig, Value};
