//! `String` module

use super::Signature;
use crate::types::{Module, Value};

const LENGTH: Signature = Signature::new("String.length", 1, "(string)");
const UPCASE: Signature = Signature::new("String.upcase", 1, "(string)");
const DOWNCASE: Signature = Signature::new("String.downcase", 1, "(string)");
const REVERSE: Signature = Signature::new("String.reverse", 1, "(string)");
const TRIM: Signature = Signature::new("String.trim", 1, "(string)");
const SPLIT: Signature = Signature::new("String.split", 2, "(string, separator)");
const CONTAINS: Signature = Signature::new("String.contains", 2, "(string, pattern)");
const CONCAT: Signature = Signature::new("String.concat", 2, "(string, string)");

/// Register a one-string-argument function
fn unary(module: &mut Module, name: &str, signature: Signature, f: fn(&str) -> Value) {
    module.register(name, move |_, args, _| {
        signature.check_arity(&args)?;
        match args.as_slice() {
            [Value::String(s)] => Ok(f(s)),
            _ => Err(signature.invalid(&args)),
        }
    });
}

pub fn module() -> Module {
    let mut module = Module::new("String");

    unary(&mut module, "length", LENGTH, |s| Value::Number(s.chars().count() as f64));
    unary(&mut module, "upcase", UPCASE, |s| Value::string(s.to_uppercase()));
    unary(&mut module, "downcase", DOWNCASE, |s| Value::string(s.to_lowercase()));
    unary(&mut module, "reverse", REVERSE, |s| Value::string(s.chars().rev().collect::<String>()));
    unary(&mut module, "trim", TRIM, |s| Value::string(s.trim()));

    // An empty separator splits into characters
    module.register("split", |_, args, _| {
        SPLIT.check_arity(&args)?;
        match args.as_slice() {
            [Value::String(s), Value::String(separator)] => {
                let parts: Vec<Value> = if separator.is_empty() {
                    s.chars().map(|c| Value::string(c.to_string())).collect()
                } else {
                    s.split(separator.as_str()).map(Value::string).collect()
                };
                Ok(Value::list(parts))
            }
            _ => Err(SPLIT.invalid(&args)),
        }
    });

    module.register("contains", |_, args, _| {
        CONTAINS.check_arity(&args)?;
        match args.as_slice() {
            [Value::String(s), Value::String(pattern)] => Ok(Value::Boolean(s.contains(pattern.as_str()))),
            _ => Err(CONTAINS.invalid(&args)),
        }
    });

    module.register("concat", |_, args, _| {
        CONCAT.check_arity(&args)?;
        match args.as_slice() {
            [Value::String(a), Value::String(b)] => Ok(Value::String(format!("{}{}", a, b))),
            _ => Err(CONCAT.invalid(&args)),
        }
    });

    module
}
