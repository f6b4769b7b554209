//! Environment for variable scopes
//!
//! Each scope owns its bindings and links to its enclosing scope. Scopes
//! are shared cells so closures can keep their defining scope alive after
//! the call that created it has returned.

use crate::parser::error::{DexError, Result};
use crate::types::Value;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

/// Scope handle shared between the evaluator, call frames and closures
pub type SharedEnvironment = Rc<RefCell<Environment>>;

/// One lexical scope
#[derive(Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    constants: HashSet<String>,
    parent: Option<SharedEnvironment>,
}

impl Environment {
    /// Create a root scope with no bindings
    pub fn new() -> Self {
        Environment::default()
    }

    /// Create a scope nested inside `parent`
    pub fn with_parent(parent: SharedEnvironment) -> Self {
        Environment {
            parent: Some(parent),
            ..Environment::default()
        }
    }

    pub fn shared(self) -> SharedEnvironment {
        Rc::new(RefCell::new(self))
    }

    /// Fresh child scope of `parent`, ready to share
    pub fn child(parent: &SharedEnvironment) -> SharedEnvironment {
        Environment::with_parent(Rc::clone(parent)).shared()
    }

    pub fn parent(&self) -> Option<SharedEnvironment> {
        self.parent.clone()
    }

    /// Bind `name` in this scope. An existing binding here is overwritten.
    /// Constants cannot be redeclared or shadowed from any inner scope.
    pub fn declare(&mut self, name: &str, value: Value, is_const: bool) -> Result<()> {
        if self.is_constant(name) {
            return Err(DexError::ConstAssignment(name.to_string()));
        }
        self.values.insert(name.to_string(), value);
        if is_const {
            self.constants.insert(name.to_string());
        }
        Ok(())
    }

    /// Overwrite `name` in the nearest scope that owns it
    pub fn assign(&mut self, name: &str, value: Value) -> Result<()> {
        if self.values.contains_key(name) {
            if self.constants.contains(name) {
                return Err(DexError::ConstAssignment(name.to_string()));
            }
            self.values.insert(name.to_string(), value);
            return Ok(());
        }

        match &self.parent {
            Some(parent) => parent.borrow_mut().assign(name, value),
            None => Err(DexError::Name(name.to_string())),
        }
    }

    /// Resolve `name` through the scope chain
    pub fn lookup(&self, name: &str) -> Result<Value> {
        if let Some(value) = self.values.get(name) {
            return Ok(value.clone());
        }

        match &self.parent {
            Some(parent) => parent.borrow().lookup(name),
            None => Err(DexError::Name(name.to_string())),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
            || self
                .parent
                .as_ref()
                .is_some_and(|parent| parent.borrow().contains(name))
    }

    /// True when `name` is bound in this scope itself
    pub fn has_local(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// True when the binding that `name` resolves to is constant
    pub fn is_constant(&self, name: &str) -> bool {
        if self.values.contains_key(name) {
            return self.constants.contains(name);
        }
        self.parent
            .as_ref()
            .is_some_and(|parent| parent.borrow().is_constant(name))
    }

    /// Names visible from this scope, sorted and deduplicated
    pub fn names(&self) -> Vec<String> {
        self.all_bindings().into_iter().map(|(name, _)| name).collect()
    }

    /// Visible bindings, inner scopes shadowing outer ones, sorted by name
    pub fn all_bindings(&self) -> Vec<(String, Value)> {
        let mut seen = HashSet::new();
        let mut result = Vec::new();
        self.collect_bindings(&mut seen, &mut result);
        result.sort_by(|a, b| a.0.cmp(&b.0));
        result
    }

    fn collect_bindings(&self, seen: &mut HashSet<String>, result: &mut Vec<(String, Value)>) {
        for (name, value) in &self.values {
            if seen.insert(name.clone()) {
                result.push((name.clone(), value.clone()));
            }
        }
        if let Some(parent) = &self.parent {
            parent.borrow().collect_bindings(seen, result);
        }
    }

    /// Bindings owned by this scope alone, minus constants
    pub fn local_bindings(&self) -> Vec<(String, Value)> {
        let mut result: Vec<(String, Value)> = self
            .values
            .iter()
            .filter(|(name, _)| !self.constants.contains(*name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        result.sort_by(|a, b| a.0.cmp(&b.0));
        result
    }

    /// Number of scopes in the chain (1 = global only)
    pub fn depth(&self) -> usize {
        1 + self.parent.as_ref().map_or(0, |parent| parent.borrow().depth())
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.values.keys().collect();
        names.sort();
        f.debug_struct("Environment")
            .field("names", &names)
            .field("depth", &self.depth())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn number(n: f64) -> Value {
        Value::Number(n)
    }

    #[test]
    fn test_basic_declare_and_lookup() {
        let mut env = Environment::new();
        env.declare("x", number(1.0), false).unwrap();

        assert!(env.contains("x"));
        assert!(!env.contains("y"));
        assert_eq!(env.lookup("x").unwrap(), number(1.0));
        assert_eq!(env.lookup("y"), Err(DexError::Name("y".to_string())));
    }

    #[test]
    fn test_scope_shadowing() {
        let global = Environment::new().shared();
        global.borrow_mut().declare("x", number(1.0), false).unwrap();

        let inner = Environment::child(&global);
        inner.borrow_mut().declare("x", number(2.0), false).unwrap();

        assert_eq!(inner.borrow().lookup("x").unwrap(), number(2.0));
        assert_eq!(global.borrow().lookup("x").unwrap(), number(1.0));
    }

    #[test]
    fn test_scope_access_outer() {
        let global = Environment::new().shared();
        global.borrow_mut().declare("outer", number(1.0), false).unwrap();

        let inner = Environment::child(&global);
        inner.borrow_mut().declare("inner", number(2.0), false).unwrap();

        assert!(inner.borrow().contains("outer"));
        assert!(inner.borrow().contains("inner"));
        assert!(!global.borrow().contains("inner"));
    }

    #[test]
    fn test_assign_updates_owning_scope() {
        let global = Environment::new().shared();
        global.borrow_mut().declare("x", number(1.0), false).unwrap();

        let inner = Environment::child(&global);
        inner.borrow_mut().assign("x", number(5.0)).unwrap();

        assert!(!inner.borrow().has_local("x"));
        assert_eq!(global.borrow().lookup("x").unwrap(), number(5.0));
    }

    #[test]
    fn test_assign_undefined_fails() {
        let mut env = Environment::new();
        let result = env.assign("undefined", number(1.0));
        assert_eq!(result, Err(DexError::Name("undefined".to_string())));
    }

    #[test]
    fn test_constants_reject_assignment_and_redeclaration() {
        let global = Environment::new().shared();
        global.borrow_mut().declare("true", Value::Boolean(true), true).unwrap();

        let inner = Environment::child(&global);
        assert_eq!(
            inner.borrow_mut().assign("true", Value::Boolean(false)),
            Err(DexError::ConstAssignment("true".to_string()))
        );
        assert_eq!(
            global.borrow_mut().declare("true", Value::Boolean(false), false),
            Err(DexError::ConstAssignment("true".to_string()))
        );
        assert_eq!(global.borrow().lookup("true").unwrap(), Value::Boolean(true));
        assert!(inner.borrow().is_constant("true"));
    }

    #[test]
    fn test_constants_cannot_be_shadowed_in_inner_scopes() {
        let global = Environment::new().shared();
        global.borrow_mut().declare("null", Value::Null, true).unwrap();

        let middle = Environment::child(&global);
        let inner = Environment::child(&middle);
        assert_eq!(
            inner.borrow_mut().declare("null", number(5.0), false),
            Err(DexError::ConstAssignment("null".to_string()))
        );
        assert!(!inner.borrow().has_local("null"));
        assert_eq!(inner.borrow().lookup("null").unwrap(), Value::Null);
    }

    #[test]
    fn test_redeclare_in_same_scope_reassigns() {
        let mut env = Environment::new();
        env.declare("x", number(1.0), false).unwrap();
        env.declare("x", number(2.0), false).unwrap();
        assert_eq!(env.lookup("x").unwrap(), number(2.0));
    }

    #[test]
    fn test_all_bindings_respects_shadowing() {
        let global = Environment::new().shared();
        global.borrow_mut().declare("a", number(1.0), false).unwrap();
        global.borrow_mut().declare("b", number(2.0), false).unwrap();

        let inner = Environment::child(&global);
        inner.borrow_mut().declare("a", number(10.0), false).unwrap();

        let bindings = inner.borrow().all_bindings();
        assert_eq!(
            bindings,
            vec![("a".to_string(), number(10.0)), ("b".to_string(), number(2.0))]
        );
        assert_eq!(inner.borrow().names(), vec!["a", "b"]);
    }

    #[test]
    fn test_depth() {
        let global = Environment::new().shared();
        assert_eq!(global.borrow().depth(), 1);

        let inner = Environment::child(&global);
        assert_eq!(inner.borrow().depth(), 2);

        let innermost = Environment::child(&inner);
        assert_eq!(innermost.borrow().depth(), 3);
    }
}
