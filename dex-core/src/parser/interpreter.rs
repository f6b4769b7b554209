//! Interpreter session
//!
//! Owns one global environment and one evaluator. Batch hosts call
//! `run_source`; the REPL calls `run_statements` to get one value per
//! top-level statement while keeping bindings between inputs.

use crate::parser::ast::Program;
use crate::parser::builtins::create_global_environment;
use crate::parser::environment::SharedEnvironment;
use crate::parser::error::Result;
use crate::parser::evaluator::Evaluator;
use crate::parser::statement_parser::Parser;
use crate::types::{InterpreterConfig, Value};
use tracing::debug;

/// Interpreter for executing Dex programs
pub struct Interpreter {
    evaluator: Evaluator,
    environment: SharedEnvironment,
}

impl Interpreter {
    /// Create an interpreter with configuration read from the environment
    pub fn new() -> Result<Self> {
        Self::with_config(InterpreterConfig::from_env())
    }

    pub fn with_config(config: InterpreterConfig) -> Result<Self> {
        Ok(Interpreter {
            evaluator: Evaluator::with_config(config),
            environment: create_global_environment()?,
        })
    }

    /// The global scope of this session
    pub fn environment(&self) -> &SharedEnvironment {
        &self.environment
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    pub fn config(&self) -> &InterpreterConfig {
        self.evaluator.config()
    }

    /// Drop every user binding and start from a fresh global scope
    pub fn reset(&mut self) -> Result<()> {
        self.environment = create_global_environment()?;
        debug!("interpreter environment reset");
        Ok(())
    }

    /// Parse and run a whole program, returning its last value
    pub fn run_source(&mut self, source: &str) -> Result<Value> {
        let program = Parser::new().produce_ast(source)?;
        self.run_program(&program)
    }

    pub fn run_program(&mut self, program: &Program) -> Result<Value> {
        self.evaluator.evaluate_program(program, &self.environment)
    }

    /// Parse `source` and run it statement by statement, collecting each
    /// statement's value. Stops at the first error; bindings made by the
    /// statements before it are kept.
    pub fn run_statements(&mut self, source: &str) -> Result<Vec<Value>> {
        let program = Parser::new().produce_ast(source)?;
        let mut values = Vec::with_capacity(program.body.len());
        for statement in &program.body {
            values.push(self.evaluator.evaluate_top_level(statement, &self.environment)?);
        }
        Ok(values)
    }
}

/// Evaluate `source` in a fresh interpreter and return the last value
pub fn eval(source: &str) -> Result<Value> {
    Interpreter::with_config(InterpreterConfig::default())?.run_source(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_run_source_returns_last_value() {
        let mut interpreter = Interpreter::with_config(InterpreterConfig::default()).unwrap();
        let value = interpreter.run_source("x = 2\nx * 21").unwrap();
        assert_eq!(value, Value::Number(42.0));
    }

    #[test]
    fn test_run_statements_yields_one_value_each() {
        let mut interpreter = Interpreter::with_config(InterpreterConfig::default()).unwrap();
        let values = interpreter.run_statements("a = 1; b = a + 1; :done").unwrap();
        assert_eq!(
            values,
            vec![Value::Number(1.0), Value::Number(2.0), Value::atom("done")]
        );
    }

    #[test]
    fn test_bindings_persist_between_inputs_and_reset_clears_them() {
        let mut interpreter = Interpreter::with_config(InterpreterConfig::default()).unwrap();
        interpreter.run_source("x = 5").unwrap();
        assert_eq!(interpreter.run_source("x").unwrap(), Value::Number(5.0));

        interpreter.reset().unwrap();
        assert!(interpreter.run_source("x").is_err());
        assert!(interpreter.environment().borrow().contains("print"));
    }

    #[test]
    fn test_empty_source_is_null() {
        assert_eq!(eval("").unwrap(), Value::Null);
        assert_eq!(eval("# just a comment").unwrap(), Value::Null);
    }
}
