//! Runtime values produced and consumed by the evaluator
//!
//! Tuples, lists and maps are shared cells: every binding that holds
//! "the same" aggregate observes in-place edits made through any other.

use crate::parser::ast::{Expression, Statement};
use crate::parser::environment::SharedEnvironment;
use crate::parser::error::{DexError, Result};
use crate::parser::evaluator::Evaluator;
use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

#[cfg(feature = "colored")]
use colored::*;

pub type Elements = Rc<RefCell<Vec<Value>>>;
pub type Entries = Rc<RefCell<HashMap<Value, Value>>>;

/// Host callable: evaluated arguments plus the caller's environment.
/// Handlers may mutate aggregate arguments and call back into the evaluator.
pub type NativeHandler = Rc<dyn Fn(&Evaluator, Vec<Value>, &SharedEnvironment) -> Result<Value>>;

/// Runtime values of the Dex language
#[derive(Clone)]
pub enum Value {
    Null,
    Number(f64),
    String(String),
    Boolean(bool),
    /// Atom name, without the leading colon
    Atom(String),
    Tuple(Elements),
    List(Elements),
    Map(Entries),
    Function(Rc<FunctionValue>),
    AnonymousFunction(Rc<AnonymousFunctionValue>),
    NativeFunction(NativeFunction),
    Module(Rc<Module>),
}

/// A `def` function closed over its defining environment
pub struct FunctionValue {
    pub name: String,
    pub params: Vec<String>,
    pub body: Rc<[Statement]>,
    pub env: SharedEnvironment,
}

/// An `fn ... -> expr end` closure
pub struct AnonymousFunctionValue {
    pub params: Vec<String>,
    pub body: Rc<Expression>,
    pub env: SharedEnvironment,
}

#[derive(Clone)]
pub struct NativeFunction {
    pub name: String,
    pub handler: NativeHandler,
}

impl NativeFunction {
    pub fn new<F>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&Evaluator, Vec<Value>, &SharedEnvironment) -> Result<Value> + 'static,
    {
        NativeFunction {
            name: name.into(),
            handler: Rc::new(handler),
        }
    }

    pub fn call(
        &self,
        evaluator: &Evaluator,
        args: Vec<Value>,
        env: &SharedEnvironment,
    ) -> Result<Value> {
        (self.handler)(evaluator, args, env)
    }
}

/// A named, constant collection of native functions
pub struct Module {
    pub name: String,
    pub functions: HashMap<String, NativeFunction>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Module {
            name: name.into(),
            functions: HashMap::new(),
        }
    }

    /// Register `Module.name`; the native's own name is the qualified one
    pub fn register<F>(&mut self, name: &str, handler: F)
    where
        F: Fn(&Evaluator, Vec<Value>, &SharedEnvironment) -> Result<Value> + 'static,
    {
        let qualified = format!("{}.{}", self.name, name);
        self.functions
            .insert(name.to_string(), NativeFunction::new(qualified, handler));
    }

    pub fn get(&self, member: &str) -> Result<&NativeFunction> {
        self.functions
            .get(member)
            .ok_or_else(|| DexError::UnknownMember {
                module: self.name.clone(),
                member: member.to_string(),
            })
    }

    /// Sorted function names, for help listings
    pub fn function_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Value {
    pub fn string(text: impl Into<String>) -> Self {
        Value::String(text.into())
    }

    pub fn atom(name: impl Into<String>) -> Self {
        Value::Atom(name.into())
    }

    pub fn tuple(items: Vec<Value>) -> Self {
        Value::Tuple(Rc::new(RefCell::new(items)))
    }

    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Rc::new(RefCell::new(items)))
    }

    pub fn map(entries: HashMap<Value, Value>) -> Self {
        Value::Map(Rc::new(RefCell::new(entries)))
    }

    /// `false` and `null` are falsy, everything else (including 0) is truthy
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Null | Value::Boolean(false))
    }

    pub fn is_callable(&self) -> bool {
        matches!(
            self,
            Value::Function(_) | Value::AnonymousFunction(_) | Value::NativeFunction(_)
        )
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Boolean(_) => "boolean",
            Value::Atom(_) => "atom",
            Value::Tuple(_) => "tuple",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Function(_) | Value::AnonymousFunction(_) => "function",
            Value::NativeFunction(_) => "native_function",
            Value::Module(_) => "module",
        }
    }

    /// Text used by interpolation and `print`: strings unquoted, all
    /// other values in their inspect form.
    pub fn to_raw_string(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// Total order used for sorting: Number < Atom < Tuple < List < Map
    /// < String < everything else. Aggregates order by size.
    pub fn compare(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a.total_cmp(b),
            (Value::Atom(a), Value::Atom(b)) => a.cmp(b),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Tuple(a), Value::Tuple(b)) | (Value::List(a), Value::List(b)) => {
                a.borrow().len().cmp(&b.borrow().len())
            }
            (Value::Map(a), Value::Map(b)) => a.borrow().len().cmp(&b.borrow().len()),
            _ => self.rank().cmp(&other.rank()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Number(_) => 0,
            Value::Atom(_) => 1,
            Value::Tuple(_) => 2,
            Value::List(_) => 3,
            Value::Map(_) => 4,
            Value::String(_) => 5,
            _ => 6,
        }
    }

    /// Same runtime kind, ignoring contents
    pub fn same_kind(&self, other: &Value) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    /// Detached copy stored as a map key. Aggregates are copied deeply
    /// into fresh cells, so mutating the original later cannot move the
    /// entry. A value that contains itself cannot be a key.
    pub fn to_key(&self) -> Result<Value> {
        self.detach(&mut Vec::new())
    }

    fn detach(&self, path: &mut Vec<*const ()>) -> Result<Value> {
        let id = match self {
            Value::Tuple(items) | Value::List(items) => cell_id(items),
            Value::Map(entries) => cell_id(entries),
            other => return Ok(other.clone()),
        };
        if path.contains(&id) {
            return Err(DexError::type_error(format!(
                "a {} that contains itself cannot be used as a map key",
                self.type_name()
            )));
        }

        path.push(id);
        let copy = match self {
            Value::Tuple(items) | Value::List(items) => {
                let items = items
                    .borrow()
                    .iter()
                    .map(|item| item.detach(path))
                    .collect::<Result<Vec<_>>>()?;
                if matches!(self, Value::Tuple(_)) {
                    Value::tuple(items)
                } else {
                    Value::list(items)
                }
            }
            Value::Map(entries) => {
                let mut copy = HashMap::with_capacity(entries.borrow().len());
                for (key, value) in entries.borrow().iter() {
                    copy.insert(key.detach(path)?, value.detach(path)?);
                }
                Value::map(copy)
            }
            other => other.clone(),
        };
        path.pop();
        Ok(copy)
    }

    /// Inspect form with type-based coloring for terminal output
    #[cfg(feature = "colored")]
    pub fn to_colored_string(&self) -> String {
        let text = self.to_string();
        match self {
            Value::Number(_) => text.bright_cyan().to_string(),
            Value::String(_) => text.green().to_string(),
            Value::Atom(_) => text.magenta().to_string(),
            Value::Boolean(_) | Value::Null => text.yellow().to_string(),
            Value::Function(_)
            | Value::AnonymousFunction(_)
            | Value::NativeFunction(_)
            | Value::Module(_) => text.bright_blue().to_string(),
            Value::Tuple(_) | Value::List(_) | Value::Map(_) => text,
        }
    }
}

/// Integral numbers print without a fraction
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n == f64::INFINITY {
        "Infinity".to_string()
    } else if n == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Identity of an aggregate cell, for cycle detection
fn cell_id<T>(cell: &Rc<RefCell<T>>) -> *const () {
    Rc::as_ptr(cell) as *const ()
}

/// Inspect rendering that tracks the aggregates already open on the
/// current path, so a value containing itself prints `[...]` there.
fn write_value(f: &mut fmt::Formatter<'_>, value: &Value, path: &mut Vec<*const ()>) -> fmt::Result {
    let (id, open, close) = match value {
        Value::Tuple(items) => (cell_id(items), "{", "}"),
        Value::List(items) => (cell_id(items), "[", "]"),
        Value::Map(entries) => (cell_id(entries), "%{", "}"),
        other => return write_scalar(f, other),
    };
    if path.contains(&id) {
        return write!(f, "{}...{}", open, close);
    }

    path.push(id);
    write!(f, "{}", open)?;
    match value {
        Value::Tuple(items) | Value::List(items) => {
            for (i, item) in items.borrow().iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write_value(f, item, path)?;
            }
        }
        Value::Map(entries) => {
            let entries = entries.borrow();
            let mut sorted: Vec<(&Value, &Value)> = entries.iter().collect();
            sorted.sort_by(|a, b| a.0.compare(b.0));
            for (i, (key, item)) in sorted.into_iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write_value(f, key, path)?;
                write!(f, " => ")?;
                write_value(f, item, path)?;
            }
        }
        _ => {}
    }
    path.pop();
    write!(f, "{}", close)
}

fn write_scalar(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
    match value {
        Value::Null => write!(f, "null"),
        Value::Number(n) => write!(f, "{}", format_number(*n)),
        Value::String(s) => write!(f, "\"{}\"", s),
        Value::Boolean(b) => write!(f, "{}", b),
        Value::Atom(name) => write!(f, ":{}", name),
        Value::Function(func) => write!(f, "#Function<{}/{}>", func.name, func.params.len()),
        Value::AnonymousFunction(func) => {
            write!(f, "#Function<anonymous/{}>", func.params.len())
        }
        Value::NativeFunction(native) => write!(f, "#NativeFunction<{}>", native.name),
        Value::Module(module) => write!(f, "#Module<{}>", module.name),
        Value::Tuple(_) | Value::List(_) | Value::Map(_) => write_value(f, value, &mut Vec::new()),
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_value(f, self, &mut Vec::new())
    }
}

// Functions close over environments that can point back at them, so
// Debug uses the inspect form instead of walking fields.
impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

/// Numbers compare by bit pattern with `-0` folded into `0`, so NaN keys
/// stay reachable in maps.
fn number_key(n: f64) -> u64 {
    if n == 0.0 {
        0
    } else {
        n.to_bits()
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Number(a), Value::Number(b)) => number_key(*a) == number_key(*b),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Atom(a), Value::Atom(b)) => a == b,
            (Value::Tuple(a), Value::Tuple(b)) | (Value::List(a), Value::List(b)) => {
                Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow()
            }
            (Value::Map(a), Value::Map(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::AnonymousFunction(a), Value::AnonymousFunction(b)) => Rc::ptr_eq(a, b),
            (Value::NativeFunction(a), Value::NativeFunction(b)) => a.name == b.name,
            (Value::Module(a), Value::Module(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Number(n) => number_key(*n).hash(state),
            Value::String(s) => s.hash(state),
            Value::Boolean(b) => b.hash(state),
            Value::Atom(name) => name.hash(state),
            // Aggregates hash by size only: consistent with Eq, and never
            // walks into a value that contains itself
            Value::Tuple(items) | Value::List(items) => items.borrow().len().hash(state),
            Value::Map(entries) => entries.borrow().len().hash(state),
            Value::Function(func) => Rc::as_ptr(func).hash(state),
            Value::AnonymousFunction(func) => Rc::as_ptr(func).hash(state),
            Value::NativeFunction(native) => native.name.hash(state),
            Value::Module(module) => Rc::as_ptr(module).hash(state),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}
