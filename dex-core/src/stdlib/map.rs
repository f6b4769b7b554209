//! `Map` module

use super::Signature;
use crate::parser::error::DexError;
use crate::types::value::Entries;
use crate::types::{Module, Value};

const DELETE: Signature = Signature::new("Map.delete", 2, "(map, key)");
const FETCH: Signature = Signature::new("Map.fetch", 2, "(map, key)");
const REPLACE: Signature = Signature::new("Map.replace", 3, "(map, key, value)");
const PUT: Signature = Signature::new("Map.put", 3, "(map, key, value)");
const KEYS: Signature = Signature::new("Map.keys", 1, "(map)");
const VALUES: Signature = Signature::new("Map.values", 1, "(map)");
const TO_LIST: Signature = Signature::new("Map.to_list", 1, "(map)");

/// Entries ordered by key, so listings are stable across runs
pub(crate) fn sorted_entries(entries: &Entries) -> Vec<(Value, Value)> {
    let mut sorted: Vec<(Value, Value)> = entries
        .borrow()
        .iter()
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    sorted.sort_by(|a, b| a.0.compare(&b.0));
    sorted
}

pub fn module() -> Module {
    let mut module = Module::new("Map");

    module.register("delete", |_, args, _| {
        DELETE.check_arity(&args)?;
        match args.as_slice() {
            [map @ Value::Map(entries), key] => {
                let key = key.to_key()?;
                entries.borrow_mut().remove(&key).ok_or_else(|| {
                    DexError::index_error(format!("{} map does not contain the key {}", DELETE, key))
                })?;
                Ok(map.clone())
            }
            _ => Err(DELETE.invalid(&args)),
        }
    });

    module.register("fetch", |_, args, _| {
        FETCH.check_arity(&args)?;
        match args.as_slice() {
            [Value::Map(entries), key] => Ok(entries.borrow().get(key).cloned().unwrap_or(Value::Null)),
            _ => Err(FETCH.invalid(&args)),
        }
    });

    module.register("replace", |_, args, _| {
        REPLACE.check_arity(&args)?;
        match args.as_slice() {
            [map @ Value::Map(entries), key, value] => {
                let key = key.to_key()?;
                let mut entries = entries.borrow_mut();
                let slot = entries.get_mut(&key).ok_or_else(|| {
                    DexError::index_error(format!("{} map does not contain the key {}", REPLACE, key))
                })?;
                *slot = value.clone();
                Ok(map.clone())
            }
            _ => Err(REPLACE.invalid(&args)),
        }
    });

    module.register("put", |_, args, _| {
        PUT.check_arity(&args)?;
        match args.as_slice() {
            [map @ Value::Map(entries), key, value] => {
                // Detach the key before borrowing: it may be this very map
                let key = key.to_key()?;
                entries.borrow_mut().insert(key, value.clone());
                Ok(map.clone())
            }
            _ => Err(PUT.invalid(&args)),
        }
    });

    module.register("keys", |_, args, _| {
        KEYS.check_arity(&args)?;
        match args.as_slice() {
            [Value::Map(entries)] => Ok(Value::list(
                sorted_entries(entries).into_iter().map(|(key, _)| key).collect(),
            )),
            _ => Err(KEYS.invalid(&args)),
        }
    });

    module.register("values", |_, args, _| {
        VALUES.check_arity(&args)?;
        match args.as_slice() {
            [Value::Map(entries)] => Ok(Value::list(
                sorted_entries(entries).into_iter().map(|(_, value)| value).collect(),
            )),
            _ => Err(VALUES.invalid(&args)),
        }
    });

    module.register("to_list", |_, args, _| {
        TO_LIST.check_arity(&args)?;
        match args.as_slice() {
            [Value::Map(entries)] => Ok(Value::list(
                sorted_entries(entries)
                    .into_iter()
                    .map(|(key, value)| Value::tuple(vec![key, value]))
                    .collect(),
            )),
            _ => Err(TO_LIST.invalid(&args)),
        }
    });

    module
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::environment::Environment;
    use crate::parser::evaluator::Evaluator;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn call(function: &str, args: Vec<Value>) -> crate::parser::error::Result<Value> {
        let module = module();
        let env = Environment::new().shared();
        module.get(function)?.call(&Evaluator::new(), args, &env)
    }

    fn sample() -> Value {
        let mut entries = HashMap::new();
        entries.insert(Value::atom("a"), Value::Number(1.0));
        entries.insert(Value::atom("b"), Value::Number(2.0));
        Value::map(entries)
    }

    #[test]
    fn test_fetch_present_and_absent() {
        let map = sample();
        assert_eq!(call("fetch", vec![map.clone(), Value::atom("a")]).unwrap(), Value::Number(1.0));
        assert_eq!(call("fetch", vec![map, Value::atom("z")]).unwrap(), Value::Null);
    }

    #[test]
    fn test_delete_requires_existing_key() {
        let map = sample();
        call("delete", vec![map.clone(), Value::atom("a")]).unwrap();
        assert_eq!(map.to_string(), "%{:b => 2}");
        assert!(matches!(
            call("delete", vec![map, Value::atom("a")]),
            Err(DexError::Index(_))
        ));
    }

    #[test]
    fn test_replace_and_put() {
        let map = sample();
        call("replace", vec![map.clone(), Value::atom("a"), Value::Number(10.0)]).unwrap();
        assert!(matches!(
            call("replace", vec![map.clone(), Value::atom("c"), Value::Null]),
            Err(DexError::Index(_))
        ));
        call("put", vec![map.clone(), Value::atom("c"), Value::Number(3.0)]).unwrap();
        assert_eq!(map.to_string(), "%{:a => 10, :b => 2, :c => 3}");
    }

    #[test]
    fn test_map_can_be_its_own_key() {
        let map = Value::map(HashMap::new());
        call("put", vec![map.clone(), map.clone(), Value::Number(1.0)]).unwrap();
        assert_eq!(map.to_string(), "%{%{} => 1}");

        call("replace", vec![map.clone(), Value::map(HashMap::new()), Value::Number(2.0)]).unwrap();
        assert_eq!(call("fetch", vec![map.clone(), Value::map(HashMap::new())]).unwrap(), Value::Number(2.0));

        // The map now holds one entry, so it no longer equals its own key
        assert!(matches!(
            call("delete", vec![map.clone(), map.clone()]),
            Err(DexError::Index(_))
        ));
        call("delete", vec![map.clone(), Value::map(HashMap::new())]).unwrap();
        assert_eq!(map.to_string(), "%{}");
    }

    #[test]
    fn test_keys_do_not_follow_later_mutation() {
        let map = Value::map(HashMap::new());
        let key = Value::list(vec![Value::Number(1.0)]);
        call("put", vec![map.clone(), key.clone(), Value::atom("v")]).unwrap();
        if let Value::List(items) = &key {
            items.borrow_mut().push(Value::Number(2.0));
        }

        let original = Value::list(vec![Value::Number(1.0)]);
        assert_eq!(call("fetch", vec![map.clone(), original]).unwrap(), Value::atom("v"));
        assert_eq!(call("fetch", vec![map, key]).unwrap(), Value::Null);
    }

    #[test]
    fn test_listings_are_sorted() {
        let map = sample();
        assert_eq!(call("keys", vec![map.clone()]).unwrap().to_string(), "[:a, :b]");
        assert_eq!(call("values", vec![map.clone()]).unwrap().to_string(), "[1, 2]");
        assert_eq!(
            call("to_list", vec![map]).unwrap().to_string(),
            "[{:a, 1}, {:b, 2}]"
        );
    }
}
