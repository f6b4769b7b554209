//! `Enum` module: traversal helpers over lists and maps
//!
//! Callbacks run through `Evaluator::call_value`, so user functions,
//! closures and natives are all accepted. Elements are snapshotted before
//! iterating so a callback may mutate the collection it is walking.

use super::map::sorted_entries;
use super::Signature;
use crate::parser::environment::SharedEnvironment;
use crate::parser::error::{DexError, Result};
use crate::parser::evaluator::Evaluator;
use crate::types::{Module, Value};
use std::collections::HashMap;

const MAP: Signature = Signature::new("Enum.map", 2, "(enumerable, fn)");
const FILTER: Signature = Signature::new("Enum.filter", 2, "(enumerable, fn)");
const REDUCE: Signature = Signature::new("Enum.reduce", 3, "(enumerable, acc, fn)");
const SUM: Signature = Signature::new("Enum.sum", 1, "(list)");
const SORT: Signature = Signature::new("Enum.sort", 1, "(list)");

pub fn module() -> Module {
    let mut module = Module::new("Enum");
    module.register("map", map);
    module.register("filter", filter);
    module.register("reduce", reduce);
    module.register("sum", sum);
    module.register("sort", sort);
    module
}

/// `{key, value}` pair returned by a map callback
fn into_pair(value: Value) -> Result<(Value, Value)> {
    if let Value::Tuple(items) = &value {
        if let [key, value] = items.borrow().as_slice() {
            return Ok((key.clone(), value.clone()));
        }
    }
    Err(DexError::type_error(format!(
        "{} callback must return a {{key, value}} tuple for maps, got {}",
        MAP, value
    )))
}

fn map(evaluator: &Evaluator, args: Vec<Value>, env: &SharedEnvironment) -> Result<Value> {
    MAP.check_arity(&args)?;
    match args.as_slice() {
        [Value::List(items), callback] if callback.is_callable() => {
            let items = items.borrow().clone();
            let mapped = items
                .into_iter()
                .map(|item| evaluator.call_value(callback, vec![item], env))
                .collect::<Result<Vec<_>>>()?;
            Ok(Value::list(mapped))
        }
        [Value::Map(entries), callback] if callback.is_callable() => {
            let mut mapped = HashMap::new();
            for (key, value) in sorted_entries(entries) {
                let pair = evaluator.call_value(callback, vec![key, value], env)?;
                let (key, value) = into_pair(pair)?;
                mapped.insert(key.to_key()?, value);
            }
            Ok(Value::map(mapped))
        }
        _ => Err(MAP.invalid(&args)),
    }
}

fn filter(evaluator: &Evaluator, args: Vec<Value>, env: &SharedEnvironment) -> Result<Value> {
    FILTER.check_arity(&args)?;
    match args.as_slice() {
        [Value::List(items), callback] if callback.is_callable() => {
            let items = items.borrow().clone();
            let mut kept = Vec::new();
            for item in items {
                if evaluator.call_value(callback, vec![item.clone()], env)?.is_truthy() {
                    kept.push(item);
                }
            }
            Ok(Value::list(kept))
        }
        [Value::Map(entries), callback] if callback.is_callable() => {
            let mut kept = HashMap::new();
            for (key, value) in sorted_entries(entries) {
                let keep = evaluator
                    .call_value(callback, vec![key.clone(), value.clone()], env)?
                    .is_truthy();
                if keep {
                    kept.insert(key, value);
                }
            }
            Ok(Value::map(kept))
        }
        _ => Err(FILTER.invalid(&args)),
    }
}

/// Folds with `fn(element, acc)`; map elements arrive as `{key, value}`
fn reduce(evaluator: &Evaluator, args: Vec<Value>, env: &SharedEnvironment) -> Result<Value> {
    REDUCE.check_arity(&args)?;
    let elements = match args.as_slice() {
        [Value::List(items), _, callback] if callback.is_callable() => items.borrow().clone(),
        [Value::Map(entries), _, callback] if callback.is_callable() => sorted_entries(entries)
            .into_iter()
            .map(|(key, value)| Value::tuple(vec![key, value]))
            .collect(),
        _ => return Err(REDUCE.invalid(&args)),
    };

    let callback = &args[2];
    let mut acc = args[1].clone();
    for element in elements {
        acc = evaluator.call_value(callback, vec![element, acc], env)?;
    }
    Ok(acc)
}

fn sum(_: &Evaluator, args: Vec<Value>, _: &SharedEnvironment) -> Result<Value> {
    SUM.check_arity(&args)?;
    match args.as_slice() {
        [Value::List(items)] => {
            let mut total = 0.0;
            for item in items.borrow().iter() {
                match item {
                    Value::Number(n) => total += n,
                    other => {
                        return Err(DexError::type_error(format!(
                            "{} expects a list of numbers, found {}",
                            SUM, other
                        )))
                    }
                }
            }
            Ok(Value::Number(total))
        }
        _ => Err(SUM.invalid(&args)),
    }
}

/// New list ordered by `Value::compare`; the argument is left untouched
fn sort(_: &Evaluator, args: Vec<Value>, _: &SharedEnvironment) -> Result<Value> {
    SORT.check_arity(&args)?;
    match args.as_slice() {
        [Value::List(items)] => {
            let mut sorted = items.borrow().clone();
            sorted.sort_by(|a, b| a.compare(b));
            Ok(Value::list(sorted))
        }
        _ => Err(SORT.invalid(&args)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::environment::Environment;
    use crate::types::NativeFunction;
    use pretty_assertions::assert_eq;

    fn call(function: &str, args: Vec<Value>) -> Result<Value> {
        let module = module();
        let env = Environment::new().shared();
        module.get(function)?.call(&Evaluator::new(), args, &env)
    }

    fn numbers(values: &[f64]) -> Value {
        Value::list(values.iter().map(|n| Value::Number(*n)).collect())
    }

    fn double() -> Value {
        Value::NativeFunction(NativeFunction::new("double", |_, args, _| match args.as_slice() {
            [Value::Number(n)] => Ok(Value::Number(n * 2.0)),
            _ => Ok(Value::Null),
        }))
    }

    #[test]
    fn test_map_list_with_native_callback() {
        let result = call("map", vec![numbers(&[1.0, 2.0]), double()]).unwrap();
        assert_eq!(result.to_string(), "[2, 4]");
    }

    #[test]
    fn test_map_over_map_requires_pairs() {
        let mut entries = HashMap::new();
        entries.insert(Value::atom("a"), Value::Number(1.0));
        let result = call("map", vec![Value::map(entries), double()]);
        assert!(matches!(result, Err(DexError::Type(_))));
    }

    #[test]
    fn test_sum() {
        assert_eq!(call("sum", vec![numbers(&[1.0, 2.5, 3.0])]).unwrap(), Value::Number(6.5));
        assert!(matches!(
            call("sum", vec![Value::list(vec![Value::atom("x")])]),
            Err(DexError::Type(_))
        ));
    }

    #[test]
    fn test_sort_does_not_mutate() {
        let list = numbers(&[3.0, 1.0, 2.0]);
        let sorted = call("sort", vec![list.clone()]).unwrap();
        assert_eq!(sorted.to_string(), "[1, 2, 3]");
        assert_eq!(list.to_string(), "[3, 1, 2]");
    }

    #[test]
    fn test_non_callable_is_rejected() {
        let result = call("map", vec![numbers(&[1.0]), Value::Number(1.0)]);
        assert!(matches!(result, Err(DexError::Type(_))));
    }
}
