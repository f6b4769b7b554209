pub mod config;
pub mod value;

pub use config::InterpreterConfig;
pub use value::{
    format_number, AnonymousFunctionValue, FunctionValue, Module, NativeFunction, NativeHandler,
    Value,
};
