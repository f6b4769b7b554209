//! `Tuple` module

use super::{element_at, insert_at, remove_at, Signature};
use crate::types::{Module, Value};

const AT: Signature = Signature::new("Tuple.at", 2, "(tuple, index)");
const APPEND: Signature = Signature::new("Tuple.append", 2, "(tuple, element)");
const DELETE_AT: Signature = Signature::new("Tuple.delete_at", 2, "(tuple, index)");
const INSERT_AT: Signature = Signature::new("Tuple.insert_at", 3, "(tuple, index, value)");
const TO_LIST: Signature = Signature::new("Tuple.to_list", 1, "(tuple)");
const SIZE: Signature = Signature::new("Tuple.size", 1, "(tuple)");

pub fn module() -> Module {
    let mut module = Module::new("Tuple");

    module.register("at", |_, args, _| {
        AT.check_arity(&args)?;
        match args.as_slice() {
            [Value::Tuple(items), Value::Number(index)] => element_at(&AT, items, *index),
            _ => Err(AT.invalid(&args)),
        }
    });

    module.register("append", |_, args, _| {
        APPEND.check_arity(&args)?;
        match args.as_slice() {
            [tuple @ Value::Tuple(items), element] => {
                items.borrow_mut().push(element.clone());
                Ok(tuple.clone())
            }
            _ => Err(APPEND.invalid(&args)),
        }
    });

    module.register("delete_at", |_, args, _| {
        DELETE_AT.check_arity(&args)?;
        match args.as_slice() {
            [tuple @ Value::Tuple(items), Value::Number(index)] => {
                remove_at(&DELETE_AT, items, *index)?;
                Ok(tuple.clone())
            }
            _ => Err(DELETE_AT.invalid(&args)),
        }
    });

    module.register("insert_at", |_, args, _| {
        INSERT_AT.check_arity(&args)?;
        match args.as_slice() {
            [tuple @ Value::Tuple(items), Value::Number(index), value] => {
                insert_at(&INSERT_AT, items, *index, value.clone())?;
                Ok(tuple.clone())
            }
            _ => Err(INSERT_AT.invalid(&args)),
        }
    });

    module.register("to_list", |_, args, _| {
        TO_LIST.check_arity(&args)?;
        match args.as_slice() {
            [Value::Tuple(items)] => Ok(Value::list(items.borrow().clone())),
            _ => Err(TO_LIST.invalid(&args)),
        }
    });

    module.register("size", |_, args, _| {
        SIZE.check_arity(&args)?;
        match args.as_slice() {
            [Value::Tuple(items)] => Ok(Value::Number(items.borrow().len() as f64)),
            _ => Err(SIZE.invalid(&args)),
        }
    });

    module
}
