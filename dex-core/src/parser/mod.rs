// dex-core/src/parser/mod.rs

pub mod ast;
pub mod builtins;
pub mod environment;
pub mod error;
pub mod evaluator;
pub mod interpreter;
pub mod lexer;
pub mod stack;
pub mod statement_parser;


pub use ast::{BinaryOp, Expression, IfClause, Program, Statement};
pub use environment::{Environment, SharedEnvironment};
pub use error::{DexError, Result};
pub use evaluator::{ControlFlow, Evaluator};
pub use interpreter::{eval, Interpreter};
pub use lexer::{tokenize, Lexer, Span, Token, TokenKind};
pub use statement_parser::{parse_expression, produce_ast, Parser};
