//! `Number` module

use super::Signature;
use crate::types::{format_number, Module, Value};

const TO_STRING: Signature = Signature::new("Number.to_string", 1, "(number)");
const PARSE: Signature = Signature::new("Number.parse", 1, "(string)");
const FLOOR: Signature = Signature::new("Number.floor", 1, "(number)");
const CEIL: Signature = Signature::new("Number.ceil", 1, "(number)");
const ROUND: Signature = Signature::new("Number.round", 1, "(number)");
const ABS: Signature = Signature::new("Number.abs", 1, "(number)");

fn numeric(module: &mut Module, name: &str, signature: Signature, f: fn(f64) -> f64) {
    module.register(name, move |_, args, _| {
        signature.check_arity(&args)?;
        match args.as_slice() {
            [Value::Number(n)] => Ok(Value::Number(f(*n))),
            _ => Err(signature.invalid(&args)),
        }
    });
}

pub fn module() -> Module {
    let mut module = Module::new("Number");

    numeric(&mut module, "floor", FLOOR, f64::floor);
    numeric(&mut module, "ceil", CEIL, f64::ceil);
    numeric(&mut module, "round", ROUND, f64::round);
    numeric(&mut module, "abs", ABS, f64::abs);

    module.register("to_string", |_, args, _| {
        TO_STRING.check_arity(&args)?;
        match args.as_slice() {
            [Value::Number(n)] => Ok(Value::String(format_number(*n))),
            _ => Err(TO_STRING.invalid(&args)),
        }
    });

    // Null when the text is not a number
    module.register("parse", |_, args, _| {
        PARSE.check_arity(&args)?;
        match args.as_slice() {
            [Value::String(s)] => {
                let text = s.trim();
                if !is_number_literal(text) {
                    return Ok(Value::Null);
                }
                Ok(text.parse::<f64>().map(Value::Number).unwrap_or(Value::Null))
            }
            _ => Err(PARSE.invalid(&args)),
        }
    });

    module
}

/// Optional `-`, a digit run, then an optional `.digits` fraction
fn is_number_literal(text: &str) -> bool {
    let unsigned = text.strip_prefix('-').unwrap_or(text);
    let (whole, fraction) = match unsigned.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (unsigned, None),
    };
    let digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    digits(whole) && fraction.map_or(true, digits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::environment::Environment;
    use crate::parser::error::Result;
    use crate::parser::evaluator::Evaluator;

    fn call(function: &str, args: Vec<Value>) -> Result<Value> {
        let module = module();
        let env = Environment::new().shared();
        module.get(function)?.call(&Evaluator::new(), args, &env)
    }

    #[test]
    fn test_rounding() {
        assert_eq!(call("floor", vec![Value::Number(1.7)]).unwrap(), Value::Number(1.0));
        assert_eq!(call("ceil", vec![Value::Number(1.2)]).unwrap(), Value::Number(2.0));
        assert_eq!(call("round", vec![Value::Number(2.5)]).unwrap(), Value::Number(3.0));
        assert_eq!(call("abs", vec![Value::Number(-4.0)]).unwrap(), Value::Number(4.0));
    }

    #[test]
    fn test_parse_rejects_float_spellings_outside_the_language() {
        for text in ["nan", "NaN", "inf", "-infinity", "1e3", "+1", ".5", "1.", ""] {
            assert_eq!(call("parse", vec![Value::string(text)]).unwrap(), Value::Null, "{}", text);
        }
    }

    #[test]
    fn test_parse_and_format() {
        assert_eq!(call("parse", vec![Value::string(" 42 ")]).unwrap(), Value::Number(42.0));
        assert_eq!(call("parse", vec![Value::string("forty")]).unwrap(), Value::Null);
        assert_eq!(call("parse", vec![Value::string("-2.5")]).unwrap(), Value::Number(-2.5));
        assert_eq!(call("to_string", vec![Value::Number(3.0)]).unwrap(), Value::string("3"));
        assert_eq!(call("to_string", vec![Value::Number(0.25)]).unwrap(), Value::string("0.25"));
    }
}
