//! Tree-walking evaluator
//!
//! Expressions evaluate to `Value`s. Statements evaluate to a `ControlFlow`
//! signal so `return`, `break` and `continue` travel up through statement
//! sequences without any interpreter-wide flags.

use crate::parser::ast::{BinaryOp, Expression, IfClause, Program, Statement};
use crate::parser::environment::{Environment, SharedEnvironment};
use crate::parser::error::{DexError, Result};
use crate::parser::stack::ensure_sufficient_stack;
use crate::types::{AnonymousFunctionValue, FunctionValue, InterpreterConfig, Value};
use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;
use tracing::{debug, trace};

/// Outcome of executing a statement or a statement sequence
#[derive(Debug, Clone, PartialEq)]
pub enum ControlFlow {
    /// Finished normally with the value of the last statement
    Normal(Value),
    Return(Value),
    Break,
    Continue,
}

/// Evaluates parsed programs against an environment
#[derive(Debug, Default)]
pub struct Evaluator {
    config: InterpreterConfig,
    /// Number of active function activations
    depth: Cell<usize>,
}

/// Active call; leaving scope pops the frame
struct CallFrame<'a> {
    evaluator: &'a Evaluator,
    name: &'a str,
}

impl Drop for CallFrame<'_> {
    fn drop(&mut self) {
        let depth = self.evaluator.depth.get();
        trace!(function = self.name, depth, "leave call");
        self.evaluator.depth.set(depth.saturating_sub(1));
    }
}

impl Evaluator {
    /// Create a new evaluator
    pub fn new() -> Self {
        Evaluator::default()
    }

    pub fn with_config(config: InterpreterConfig) -> Self {
        Evaluator {
            config,
            depth: Cell::new(0),
        }
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    /// Current number of active calls
    pub fn call_depth(&self) -> usize {
        self.depth.get()
    }

    fn enter<'a>(&'a self, name: &'a str) -> Result<CallFrame<'a>> {
        let depth = self.depth.get() + 1;
        if depth > self.config.max_call_depth {
            return Err(DexError::StackOverflow {
                depth: self.config.max_call_depth,
            });
        }
        self.depth.set(depth);
        trace!(function = name, depth, "enter call");
        Ok(CallFrame {
            evaluator: self,
            name,
        })
    }

    // ------------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------------

    /// Run a whole program, returning the value of its last statement
    pub fn evaluate_program(&self, program: &Program, env: &SharedEnvironment) -> Result<Value> {
        let mut last = Value::Null;
        for statement in &program.body {
            last = self.evaluate_top_level(statement, env)?;
        }
        Ok(last)
    }

    /// Run one top-level statement. Control signals that reach this level
    /// have nowhere to go and are reported as usage errors.
    pub fn evaluate_top_level(&self, statement: &Statement, env: &SharedEnvironment) -> Result<Value> {
        match self.evaluate_statement(statement, env)? {
            ControlFlow::Normal(value) => Ok(value),
            ControlFlow::Return(_) => Err(DexError::Usage(
                "'return' used outside of a function".to_string(),
            )),
            ControlFlow::Break => Err(DexError::Usage("'break' used outside of a loop".to_string())),
            ControlFlow::Continue => Err(DexError::Usage(
                "'continue' used outside of a loop".to_string(),
            )),
        }
    }

    /// Run statements in order, stopping at the first control signal
    pub fn evaluate_body(&self, body: &[Statement], env: &SharedEnvironment) -> Result<ControlFlow> {
        let mut last = Value::Null;
        for statement in body {
            match self.evaluate_statement(statement, env)? {
                ControlFlow::Normal(value) => last = value,
                signal => return Ok(signal),
            }
        }
        Ok(ControlFlow::Normal(last))
    }

    pub fn evaluate_statement(
        &self,
        statement: &Statement,
        env: &SharedEnvironment,
    ) -> Result<ControlFlow> {
        ensure_sufficient_stack(|| match statement {
            Statement::Expression(expr) => Ok(ControlFlow::Normal(self.evaluate(expr, env)?)),
            Statement::If(clauses) => self.evaluate_if(clauses, env),
            Statement::While { condition, body } => self.evaluate_while(condition, body, env),
            Statement::FunctionDeclaration { name, params, body } => {
                let function = Value::Function(Rc::new(FunctionValue {
                    name: name.clone(),
                    params: params.clone(),
                    body: Rc::clone(body),
                    env: Rc::clone(env),
                }));
                env.borrow_mut().declare(name, function.clone(), false)?;
                debug!(function = name.as_str(), arity = params.len(), "declared function");
                Ok(ControlFlow::Normal(function))
            }
            Statement::Return(expr) => {
                let value = match expr {
                    Some(expr) => self.evaluate(expr, env)?,
                    None => Value::Null,
                };
                Ok(ControlFlow::Return(value))
            }
            Statement::Break => Ok(ControlFlow::Break),
            Statement::Continue => Ok(ControlFlow::Continue),
        })
    }

    /// First matching clause wins and runs in a fresh child scope
    fn evaluate_if(&self, clauses: &[IfClause], env: &SharedEnvironment) -> Result<ControlFlow> {
        for clause in clauses {
            let matched = match &clause.condition {
                Some(condition) => self.evaluate_condition(condition, env, "if")?,
                None => true,
            };
            if matched {
                let scope = Environment::child(env);
                return self.evaluate_body(&clause.body, &scope);
            }
        }
        Ok(ControlFlow::Normal(Value::Null))
    }

    /// Loop bodies run directly in the enclosing scope
    fn evaluate_while(
        &self,
        condition: &Expression,
        body: &[Statement],
        env: &SharedEnvironment,
    ) -> Result<ControlFlow> {
        while self.evaluate_condition(condition, env, "while")? {
            match self.evaluate_body(body, env)? {
                ControlFlow::Normal(_) | ControlFlow::Continue => continue,
                ControlFlow::Break => break,
                ControlFlow::Return(value) => return Ok(ControlFlow::Return(value)),
            }
        }
        Ok(ControlFlow::Normal(Value::Null))
    }

    fn evaluate_condition(
        &self,
        condition: &Expression,
        env: &SharedEnvironment,
        construct: &str,
    ) -> Result<bool> {
        match self.evaluate(condition, env)? {
            Value::Boolean(b) => Ok(b),
            other => Err(DexError::type_error(format!(
                "{} condition must be a boolean, got {} ({})",
                construct,
                other.type_name(),
                other
            ))),
        }
    }

    // ------------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------------

    /// Evaluate an expression and return the result
    pub fn evaluate(&self, expr: &Expression, env: &SharedEnvironment) -> Result<Value> {
        ensure_sufficient_stack(|| self.evaluate_expression(expr, env))
    }

    fn evaluate_expression(&self, expr: &Expression, env: &SharedEnvironment) -> Result<Value> {
        match expr {
            Expression::NumericLiteral(n) => Ok(Value::Number(*n)),
            Expression::StringLiteral {
                raw,
                fragments,
                expressions,
            } => {
                let mut text = raw.clone();
                for (fragment, expression) in fragments.iter().zip(expressions) {
                    let value = self.evaluate(expression, env)?;
                    text = text.replace(fragment.as_str(), &value.to_raw_string());
                }
                Ok(Value::String(text))
            }
            Expression::Identifier(name) => env.borrow().lookup(name),
            Expression::Atom(name) => Ok(Value::Atom(name.clone())),
            Expression::Binary {
                left,
                right,
                operator,
            } => self.evaluate_binary(left, *operator, right, env),
            Expression::Not(operand) => Ok(Value::Boolean(!self.evaluate(operand, env)?.is_truthy())),
            Expression::Match { pattern, value } => self.evaluate_match(pattern, value, env),
            Expression::Let { name, value } => {
                let value = self.evaluate(value, env)?;
                env.borrow_mut().declare(name, value.clone(), false)?;
                Ok(value)
            }
            Expression::Call { callee, args } => {
                let callee = self.evaluate(callee, env)?;
                let args = args
                    .iter()
                    .map(|arg| self.evaluate(arg, env))
                    .collect::<Result<Vec<_>>>()?;
                self.call_value(&callee, args, env)
            }
            Expression::Member {
                object,
                property,
                computed,
            } => self.evaluate_member(object, property, *computed, env),
            Expression::Tuple(items) => Ok(Value::tuple(self.evaluate_items(items, env)?)),
            Expression::List(items) => Ok(Value::list(self.evaluate_items(items, env)?)),
            Expression::Map(entries) => {
                let mut map = HashMap::with_capacity(entries.len());
                for (key, value) in entries {
                    let key = self.evaluate(key, env)?.to_key()?;
                    let value = self.evaluate(value, env)?;
                    map.insert(key, value);
                }
                Ok(Value::map(map))
            }
            Expression::AnonymousFn { params, body } => {
                Ok(Value::AnonymousFunction(Rc::new(AnonymousFunctionValue {
                    params: params.clone(),
                    body: Rc::clone(body),
                    env: Rc::clone(env),
                })))
            }
        }
    }

    fn evaluate_items(&self, items: &[Expression], env: &SharedEnvironment) -> Result<Vec<Value>> {
        items.iter().map(|item| self.evaluate(item, env)).collect()
    }

    fn evaluate_binary(
        &self,
        left: &Expression,
        operator: BinaryOp,
        right: &Expression,
        env: &SharedEnvironment,
    ) -> Result<Value> {
        let left = self.evaluate(left, env)?;

        // Logical operators short-circuit before any kind dispatch
        match operator {
            BinaryOp::And => {
                if !left.is_truthy() {
                    return Ok(Value::Boolean(false));
                }
                return Ok(Value::Boolean(self.evaluate(right, env)?.is_truthy()));
            }
            BinaryOp::Or => {
                if left.is_truthy() {
                    return Ok(Value::Boolean(true));
                }
                return Ok(Value::Boolean(self.evaluate(right, env)?.is_truthy()));
            }
            _ => {}
        }

        let right = self.evaluate(right, env)?;
        Ok(apply_binary(operator, &left, &right))
    }

    /// `pattern = value`: bind, destructure or structurally match
    fn evaluate_match(
        &self,
        pattern: &Expression,
        value: &Expression,
        env: &SharedEnvironment,
    ) -> Result<Value> {
        match pattern {
            Expression::Identifier(name) => {
                let value = self.evaluate(value, env)?;
                let exists = env.borrow().contains(name);
                if exists {
                    env.borrow_mut().assign(name, value.clone())?;
                } else {
                    env.borrow_mut().declare(name, value.clone(), false)?;
                }
                Ok(value)
            }
            Expression::Tuple(items) | Expression::List(items) => {
                let value = self.evaluate(value, env)?;
                let elements = match (pattern, &value) {
                    (Expression::Tuple(_), Value::Tuple(elements))
                    | (Expression::List(_), Value::List(elements)) => elements.borrow().clone(),
                    _ => {
                        let expected = if matches!(pattern, Expression::Tuple(_)) {
                            "tuple"
                        } else {
                            "list"
                        };
                        return Err(DexError::match_error(format!(
                            "cannot match {} {} against a {} pattern",
                            value.type_name(),
                            value,
                            expected
                        )));
                    }
                };

                if elements.len() != items.len() {
                    return Err(DexError::match_error(format!(
                        "pattern {} has {} element(s) but the value {} has {}",
                        pattern,
                        items.len(),
                        value,
                        elements.len()
                    )));
                }

                let destructuring =
                    !items.is_empty() && items.iter().all(|item| item.as_identifier().is_some());

                for (item, element) in items.iter().zip(elements) {
                    if destructuring {
                        if let Some(name) = item.as_identifier() {
                            env.borrow_mut().declare(name, element, false)?;
                        }
                    } else {
                        let expected = self.evaluate(item, env)?;
                        if !expected.same_kind(&element) {
                            return Err(DexError::match_error(format!(
                                "expected {} ({}) but found {} ({})",
                                expected,
                                expected.type_name(),
                                element,
                                element.type_name()
                            )));
                        }
                    }
                }

                Ok(value)
            }
            other => Err(DexError::match_error(format!(
                "invalid pattern {}, expected an identifier, tuple or list",
                other
            ))),
        }
    }

    /// `Module.function` resolution; there is no general property access
    fn evaluate_member(
        &self,
        object: &Expression,
        property: &Expression,
        computed: bool,
        env: &SharedEnvironment,
    ) -> Result<Value> {
        let object = self.evaluate(object, env)?;
        let module = match &object {
            Value::Module(module) => module,
            other => {
                return Err(DexError::type_error(format!(
                    "cannot access member {} of {} {}",
                    property,
                    other.type_name(),
                    other
                )))
            }
        };

        match property.as_identifier() {
            Some(name) if !computed => Ok(Value::NativeFunction(module.get(name)?.clone())),
            _ => Err(DexError::type_error(format!(
                "module {} members must be accessed by name, got {}",
                module.name, property
            ))),
        }
    }

    // ------------------------------------------------------------------------
    // Calls
    // ------------------------------------------------------------------------

    /// Apply any callable value to already evaluated arguments
    pub fn call_value(
        &self,
        callee: &Value,
        args: Vec<Value>,
        env: &SharedEnvironment,
    ) -> Result<Value> {
        match callee {
            Value::NativeFunction(native) => {
                let _frame = self.enter(&native.name)?;
                native.call(self, args, env)
            }
            Value::Function(function) => self.call_function(function, args),
            Value::AnonymousFunction(function) => self.call_anonymous(function, args),
            other => Err(DexError::NotCallable(format!(
                "{} ({})",
                other,
                other.type_name()
            ))),
        }
    }

    fn call_function(&self, function: &FunctionValue, args: Vec<Value>) -> Result<Value> {
        check_arity(&function.name, function.params.len(), args.len())?;
        let _frame = self.enter(&function.name)?;

        let scope = Environment::child(&function.env);
        bind_params(&scope, &function.params, args)?;

        match self.evaluate_body(&function.body, &scope)? {
            ControlFlow::Normal(_) => Ok(Value::Null),
            ControlFlow::Return(value) => Ok(value),
            ControlFlow::Break | ControlFlow::Continue => Err(DexError::Usage(format!(
                "'break' or 'continue' used outside of a loop in function '{}'",
                function.name
            ))),
        }
    }

    fn call_anonymous(&self, function: &AnonymousFunctionValue, args: Vec<Value>) -> Result<Value> {
        check_arity("anonymous function", function.params.len(), args.len())?;
        let _frame = self.enter("anonymous")?;

        let scope = Environment::child(&function.env);
        bind_params(&scope, &function.params, args)?;
        self.evaluate(&function.body, &scope)
    }
}

fn check_arity(callee: &str, expected: usize, got: usize) -> Result<()> {
    if expected != got {
        return Err(DexError::Arity {
            callee: callee.to_string(),
            expected,
            got,
        });
    }
    Ok(())
}

fn bind_params(scope: &SharedEnvironment, params: &[String], args: Vec<Value>) -> Result<()> {
    let mut scope = scope.borrow_mut();
    for (param, arg) in params.iter().zip(args) {
        scope.declare(param, arg, false)?;
    }
    Ok(())
}

/// Kind-pair dispatch for non-logical operators. Combinations the language
/// does not define produce `null` rather than an error.
pub fn apply_binary(operator: BinaryOp, left: &Value, right: &Value) -> Value {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => {
            let (a, b) = (*a, *b);
            match operator {
                BinaryOp::Add => Value::Number(a + b),
                BinaryOp::Subtract => Value::Number(a - b),
                BinaryOp::Multiply => Value::Number(a * b),
                BinaryOp::Divide => Value::Number(a / b),
                BinaryOp::Modulo => Value::Number(a % b),
                BinaryOp::Equal => Value::Boolean(a == b),
                BinaryOp::NotEqual => Value::Boolean(a != b),
                BinaryOp::Less => Value::Boolean(a < b),
                BinaryOp::Greater => Value::Boolean(a > b),
                BinaryOp::LessEqual => Value::Boolean(a <= b),
                BinaryOp::GreaterEqual => Value::Boolean(a >= b),
                BinaryOp::And | BinaryOp::Or => Value::Null,
            }
        }
        (Value::String(a), Value::String(b)) if operator == BinaryOp::Add => {
            Value::String(format!("{}{}", a, b))
        }
        (Value::Number(_), Value::String(_)) | (Value::String(_), Value::Number(_))
            if operator == BinaryOp::Add =>
        {
            Value::String(format!("{}{}", left.to_raw_string(), right.to_raw_string()))
        }
        (Value::Atom(a), Value::Atom(b)) => match operator {
            BinaryOp::Equal => Value::Boolean(a == b),
            BinaryOp::NotEqual => Value::Boolean(a != b),
            BinaryOp::Less => Value::Boolean(a < b),
            BinaryOp::Greater => Value::Boolean(a > b),
            BinaryOp::LessEqual => Value::Boolean(a <= b),
            BinaryOp::GreaterEqual => Value::Boolean(a >= b),
            _ => Value::Null,
        },
        _ => Value::Null,
    }
}
