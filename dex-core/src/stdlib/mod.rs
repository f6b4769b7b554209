//! Standard library modules
//!
//! Each module is a constant `Module` value in the global scope whose
//! functions follow the native calling convention. Natives validate their
//! own argument count and kinds.

pub mod enumerable;
pub mod list;
pub mod map;
pub mod number;
pub mod string;
pub mod tuple;

use crate::parser::error::{DexError, Result};
use crate::types::value::Elements;
use crate::types::{Module, Value};
use std::fmt;
use tracing::warn;

/// All library modules, in registration order
pub fn modules() -> Vec<Module> {
    vec![
        tuple::module(),
        list::module(),
        map::module(),
        enumerable::module(),
        string::module(),
        number::module(),
    ]
}

/// Name, arity and argument format of one native, used in diagnostics
#[derive(Debug, Clone, Copy)]
pub struct Signature {
    pub name: &'static str,
    pub arity: usize,
    pub format: &'static str,
}

impl Signature {
    pub const fn new(name: &'static str, arity: usize, format: &'static str) -> Self {
        Signature {
            name,
            arity,
            format,
        }
    }

    pub fn check_arity(&self, args: &[Value]) -> Result<()> {
        if args.len() != self.arity {
            return Err(DexError::Arity {
                callee: self.name.to_string(),
                expected: self.arity,
                got: args.len(),
            });
        }
        Ok(())
    }

    /// TypeError naming the expected format and the kinds actually given
    pub fn invalid(&self, args: &[Value]) -> DexError {
        let given: Vec<&str> = args.iter().map(Value::type_name).collect();
        DexError::type_error(format!(
            "Argument format of {} {}, got ({})",
            self,
            self.format,
            given.join(", ")
        ))
    }

    /// Position for reading or removing an existing element
    pub fn index(&self, index: f64, len: usize) -> Result<usize> {
        match as_position(index) {
            Some(position) if position < len => Ok(position),
            _ => Err(self.out_of_range(index, len)),
        }
    }

    /// Position for inserting; `len` itself appends
    pub fn insert_position(&self, index: f64, len: usize) -> Result<usize> {
        match as_position(index) {
            Some(position) if position < len => Ok(position),
            Some(position) if position == len => {
                warn!(function = self.name, index = position, len, "insert position is at the end");
                Ok(position)
            }
            _ => Err(self.out_of_range(index, len)),
        }
    }

    fn out_of_range(&self, index: f64, len: usize) -> DexError {
        DexError::index_error(format!(
            "{} index {} is out of range for size {}",
            self,
            crate::types::format_number(index),
            len
        ))
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.arity)
    }
}

fn as_position(index: f64) -> Option<usize> {
    if index.fract() == 0.0 && index >= 0.0 && index.is_finite() {
        Some(index as usize)
    } else {
        None
    }
}

// Shared tuple/list operations. Both kinds mutate in place and hand the
// same aggregate back to the caller.

pub(crate) fn element_at(signature: &Signature, items: &Elements, index: f64) -> Result<Value> {
    let items = items.borrow();
    let position = signature.index(index, items.len())?;
    Ok(items[position].clone())
}

pub(crate) fn remove_at(signature: &Signature, items: &Elements, index: f64) -> Result<()> {
    let mut items = items.borrow_mut();
    let position = signature.index(index, items.len())?;
    items.remove(position);
    Ok(())
}

pub(crate) fn insert_at(
    signature: &Signature,
    items: &Elements,
    index: f64,
    value: Value,
) -> Result<()> {
    let mut items = items.borrow_mut();
    let position = signature.insert_position(index, items.len())?;
    items.insert(position, value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const AT: Signature = Signature::new("Tuple.at", 2, "(tuple, index)");

    #[test]
    fn test_signature_messages() {
        let err = AT.invalid(&[Value::list(vec![]), Value::Number(1.0)]);
        assert_eq!(
            err.to_string(),
            "TypeError: Argument format of Tuple.at/2 (tuple, index), got (list, number)"
        );

        let err = AT.check_arity(&[Value::Null]).unwrap_err();
        assert_eq!(err.category(), "ArityError");
    }

    #[test]
    fn test_index_bounds() {
        assert_eq!(AT.index(1.0, 3).unwrap(), 1);
        assert!(matches!(AT.index(3.0, 3), Err(DexError::Index(_))));
        assert!(matches!(AT.index(-1.0, 3), Err(DexError::Index(_))));
        assert!(matches!(AT.index(0.5, 3), Err(DexError::Index(_))));
        assert_eq!(AT.insert_position(3.0, 3).unwrap(), 3);
        assert!(AT.insert_position(4.0, 3).is_err());
    }

    #[test]
    fn test_every_module_is_registered() {
        let names: Vec<String> = modules().into_iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["Tuple", "List", "Map", "Enum", "String", "Number"]);
    }
}
