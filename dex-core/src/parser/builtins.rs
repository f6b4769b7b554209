//! Global native functions and global environment setup

use crate::parser::environment::{Environment, SharedEnvironment};
use crate::parser::error::Result;
use crate::stdlib::{self, Signature};
use crate::types::{NativeFunction, Value};
use std::rc::Rc;
use tracing::debug;

const LEN: Signature = Signature::new("len", 1, "(tuple | list | map | string)");

/// Name and one-line description of each global native, for help output
pub const GLOBAL_FUNCTIONS: &[(&str, &str)] = &[
    ("print", "print(values...) prints its arguments separated by spaces"),
    ("date", "date() prints the current local date and time"),
    ("len", "len(value) size of a tuple, list, map or string"),
    ("is_boolean", "is_boolean(value) true for booleans"),
    ("is_atom", "is_atom(value) true for atoms"),
    ("is_number", "is_number(value) true for numbers"),
    ("is_tuple", "is_tuple(value) true for tuples"),
    ("is_list", "is_list(value) true for lists"),
    ("is_map", "is_map(value) true for maps"),
    ("is_string", "is_string(value) true for strings"),
    ("is_function", "is_function(value) true for any callable"),
];

/// Register a one-argument kind predicate
fn predicate(name: &'static str, test: fn(&Value) -> bool) -> NativeFunction {
    NativeFunction::new(name, move |_, args, _| {
        Signature::new(name, 1, "(value)").check_arity(&args)?;
        Ok(Value::Boolean(test(&args[0])))
    })
}

/// Every global native function
pub fn global_functions() -> Vec<NativeFunction> {
    vec![
        // Arguments print in inspect form, so strings keep their quotes
        NativeFunction::new("print", |_, args, _| {
            let line: Vec<String> = args.iter().map(|arg| arg.to_string()).collect();
            println!("{}", line.join(" "));
            Ok(Value::Null)
        }),
        NativeFunction::new("date", |_, _, _| {
            println!("{}", chrono::Local::now().format("%a %b %d %H:%M:%S %Z %Y"));
            Ok(Value::Null)
        }),
        NativeFunction::new("len", |_, args, _| {
            LEN.check_arity(&args)?;
            let len = match &args[0] {
                Value::Tuple(items) | Value::List(items) => items.borrow().len(),
                Value::Map(entries) => entries.borrow().len(),
                Value::String(s) => s.chars().count(),
                _ => return Err(LEN.invalid(&args)),
            };
            Ok(Value::Number(len as f64))
        }),
        predicate("is_boolean", |v| matches!(v, Value::Boolean(_))),
        predicate("is_atom", |v| matches!(v, Value::Atom(_))),
        predicate("is_number", |v| matches!(v, Value::Number(_))),
        predicate("is_tuple", |v| matches!(v, Value::Tuple(_))),
        predicate("is_list", |v| matches!(v, Value::List(_))),
        predicate("is_map", |v| matches!(v, Value::Map(_))),
        predicate("is_string", |v| matches!(v, Value::String(_))),
        predicate("is_function", Value::is_callable),
    ]
}

/// Declare `null`, `true`, `false`, the global natives and the library
/// modules as constants
pub fn install_globals(env: &mut Environment) -> Result<()> {
    env.declare("null", Value::Null, true)?;
    env.declare("true", Value::Boolean(true), true)?;
    env.declare("false", Value::Boolean(false), true)?;

    for native in global_functions() {
        let name = native.name.clone();
        env.declare(&name, Value::NativeFunction(native), true)?;
    }

    for module in stdlib::modules() {
        let name = module.name.clone();
        debug!(module = name.as_str(), functions = module.functions.len(), "installed module");
        env.declare(&name, Value::Module(Rc::new(module)), true)?;
    }

    Ok(())
}

/// Fresh global scope with every builtin installed
pub fn create_global_environment() -> Result<SharedEnvironment> {
    let mut env = Environment::new();
    install_globals(&mut env)?;
    Ok(env.shared())
}
