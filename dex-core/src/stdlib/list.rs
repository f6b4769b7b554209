//! `List` module

use super::{element_at, insert_at, remove_at, Signature};
use crate::parser::error::DexError;
use crate::types::{Module, Value};

const AT: Signature = Signature::new("List.at", 2, "(list, index)");
const APPEND: Signature = Signature::new("List.append", 2, "(list, element)");
const DELETE_AT: Signature = Signature::new("List.delete_at", 2, "(list, index)");
const INSERT_AT: Signature = Signature::new("List.insert_at", 3, "(list, index, value)");
const POP: Signature = Signature::new("List.pop", 1, "(list)");
const TO_TUPLE: Signature = Signature::new("List.to_tuple", 1, "(list)");

pub fn module() -> Module {
    let mut module = Module::new("List");

    module.register("at", |_, args, _| {
        AT.check_arity(&args)?;
        match args.as_slice() {
            [Value::List(items), Value::Number(index)] => element_at(&AT, items, *index),
            _ => Err(AT.invalid(&args)),
        }
    });

    module.register("append", |_, args, _| {
        APPEND.check_arity(&args)?;
        match args.as_slice() {
            [list @ Value::List(items), element] => {
                items.borrow_mut().push(element.clone());
                Ok(list.clone())
            }
            _ => Err(APPEND.invalid(&args)),
        }
    });

    module.register("delete_at", |_, args, _| {
        DELETE_AT.check_arity(&args)?;
        match args.as_slice() {
            [list @ Value::List(items), Value::Number(index)] => {
                remove_at(&DELETE_AT, items, *index)?;
                Ok(list.clone())
            }
            _ => Err(DELETE_AT.invalid(&args)),
        }
    });

    module.register("insert_at", |_, args, _| {
        INSERT_AT.check_arity(&args)?;
        match args.as_slice() {
            [list @ Value::List(items), Value::Number(index), value] => {
                insert_at(&INSERT_AT, items, *index, value.clone())?;
                Ok(list.clone())
            }
            _ => Err(INSERT_AT.invalid(&args)),
        }
    });

    // Removes the last element in place and returns {last, list}
    module.register("pop", |_, args, _| {
        POP.check_arity(&args)?;
        match args.as_slice() {
            [list @ Value::List(items)] => {
                let last = items
                    .borrow_mut()
                    .pop()
                    .ok_or_else(|| DexError::index_error("List.pop/1 cannot pop from an empty list"))?;
                Ok(Value::tuple(vec![last, list.clone()]))
            }
            _ => Err(POP.invalid(&args)),
        }
    });

    module.register("to_tuple", |_, args, _| {
        TO_TUPLE.check_arity(&args)?;
        match args.as_slice() {
            [Value::List(items)] => Ok(Value::tuple(items.borrow().clone())),
            _ => Err(TO_TUPLE.invalid(&args)),
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

    fn call(function: &str, args: Vec<Value>) -> crate::parser::error::Result<Value> {
        let module = module();
        let env = Environment::new().shared();
        module.get(function)?.call(&Evaluator::new(), args, &env)
    }

    #[test]
    fn test_append_is_visible_through_aliases() {
        let list = Value::list(vec![Value::Number(1.0)]);
        let alias = list.clone();
        call("append", vec![list, Value::Number(2.0)]).unwrap();
        assert_eq!(alias.to_string(), "[1, 2]");
    }

    #[test]
    fn test_pop_returns_last_and_list() {
        let list = Value::list(vec![Value::Number(1.0), Value::Number(2.0)]);
        let result = call("pop", vec![list.clone()]).unwrap();
        assert_eq!(result.to_string(), "{2, [1]}");
        assert_eq!(list.to_string(), "[1]");
    }

    #[test]
    fn test_pop_empty_list() {
        assert!(matches!(
            call("pop", vec![Value::list(vec![])]),
            Err(DexError::Index(_))
        ));
    }

    #[test]
    fn test_insert_and_delete() {
        let list = Value::list(vec![Value::atom("a"), Value::atom("c")]);
        call("insert_at", vec![list.clone(), Value::Number(1.0), Value::atom("b")]).unwrap();
        assert_eq!(list.to_string(), "[:a, :b, :c]");
        call("delete_at", vec![list.clone(), Value::Number(2.0)]).unwrap();
        assert_eq!(list.to_string(), "[:a, :b]");
        assert!(matches!(
            call("insert_at", vec![list, Value::Number(5.0), Value::Null]),
            Err(DexError::Index(_))
        ));
    }

    #[test]
    fn test_at_and_to_tuple() {
        let list = Value::list(vec![Value::string("x"), Value::string("y")]);
        assert_eq!(call("at", vec![list.clone(), Value::Number(1.0)]).unwrap(), Value::string("y"));
        assert_eq!(call("to_tuple", vec![list]).unwrap().to_string(), "{\"x\", \"y\"}");
    }
}
