use std::fmt;
use std::rc::Rc;

// ============================================================================
// Program and Statement AST
// ============================================================================

/// A program is a sequence of statements
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub body: Vec<Statement>,
}

impl Program {
    pub fn new() -> Self {
        Program { body: Vec::new() }
    }

    pub fn push(&mut self, stmt: Statement) {
        self.body.push(stmt);
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

/// Statement types
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// Expression statement: `x = 1`, `print(x)`
    Expression(Expression),

    /// Conditional chain: `if c do ... elif c do ... else ... end`
    If(Vec<IfClause>),

    /// Loop: `while c do ... end`
    While {
        condition: Expression,
        body: Vec<Statement>,
    },

    /// Named function: `def name(a, b) do ... end`
    FunctionDeclaration {
        name: String,
        params: Vec<String>,
        body: Rc<[Statement]>,
    },

    /// `return expr`, or a bare `return` yielding null
    Return(Option<Expression>),

    Break,

    Continue,
}

/// One branch of an if chain. The `else` clause has no condition.
#[derive(Debug, Clone, PartialEq)]
pub struct IfClause {
    pub condition: Option<Expression>,
    pub body: Vec<Statement>,
    pub is_else: bool,
}

// ============================================================================
// Expression AST
// ============================================================================

/// Binary operators, arithmetic through logical
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    And,
    Or,
}

impl BinaryOp {
    /// Map an operator's source text to its variant
    pub fn from_symbol(symbol: &str) -> Option<BinaryOp> {
        let op = match symbol {
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Subtract,
            "*" => BinaryOp::Multiply,
            "/" => BinaryOp::Divide,
            "%" => BinaryOp::Modulo,
            "==" => BinaryOp::Equal,
            "!=" => BinaryOp::NotEqual,
            "<" => BinaryOp::Less,
            ">" => BinaryOp::Greater,
            "<=" => BinaryOp::LessEqual,
            ">=" => BinaryOp::GreaterEqual,
            "and" => BinaryOp::And,
            "or" => BinaryOp::Or,
            _ => return None,
        };
        Some(op)
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "%",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Less => "<",
            BinaryOp::Greater => ">",
            BinaryOp::LessEqual => "<=",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
        }
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Represents the expressions of the Dex language
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Numeric literal: 42, 1.5
    NumericLiteral(f64),

    /// String literal with its interpolation markers.
    ///
    /// `fragments[i]` is the literal marker text (`#{a + 1}`) that the
    /// rendered value of `expressions[i]` replaces at evaluation time.
    StringLiteral {
        raw: String,
        fragments: Vec<String>,
        expressions: Vec<Expression>,
    },

    /// Variable reference
    Identifier(String),

    /// Atom literal, stored without the leading colon
    Atom(String),

    /// `left op right`
    Binary {
        left: Box<Expression>,
        right: Box<Expression>,
        operator: BinaryOp,
    },

    /// `not expr`
    Not(Box<Expression>),

    /// Pattern-matching assignment: `pattern = value`
    Match {
        pattern: Box<Expression>,
        value: Box<Expression>,
    },

    /// `let name = value`, always binds in the current scope
    Let {
        name: String,
        value: Box<Expression>,
    },

    /// `callee(args...)`
    Call {
        callee: Box<Expression>,
        args: Vec<Expression>,
    },

    /// `object.property` or `object[property]`
    Member {
        object: Box<Expression>,
        property: Box<Expression>,
        computed: bool,
    },

    /// `{a, b}`
    Tuple(Vec<Expression>),

    /// `[a, b]`
    List(Vec<Expression>),

    /// `%{key => value, name: value}`
    Map(Vec<(Expression, Expression)>),

    /// `fn (a, b) -> expr end`
    AnonymousFn {
        params: Vec<String>,
        body: Rc<Expression>,
    },
}

impl Expression {
    pub fn identifier(name: impl Into<String>) -> Self {
        Expression::Identifier(name.into())
    }

    pub fn binary(left: Expression, operator: BinaryOp, right: Expression) -> Self {
        Expression::Binary {
            left: Box::new(left),
            right: Box::new(right),
            operator,
        }
    }

    pub fn call(callee: Expression, args: Vec<Expression>) -> Self {
        Expression::Call {
            callee: Box::new(callee),
            args,
        }
    }

    /// Name of the identifier when this is a bare identifier
    pub fn as_identifier(&self) -> Option<&str> {
        match self {
            Expression::Identifier(name) => Some(name),
            _ => None,
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Expression]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::NumericLiteral(n) => write!(f, "{}", n),
            Expression::StringLiteral { raw, .. } => write!(f, "\"{}\"", raw),
            Expression::Identifier(name) => write!(f, "{}", name),
            Expression::Atom(name) => write!(f, ":{}", name),
            Expression::Binary {
                left,
                right,
                operator,
            } => write!(f, "({} {} {})", left, operator, right),
            Expression::Not(expr) => write!(f, "not {}", expr),
            Expression::Match { pattern, value } => write!(f, "{} = {}", pattern, value),
            Expression::Let { name, value } => write!(f, "let {} = {}", name, value),
            Expression::Call { callee, args } => {
                write!(f, "{}(", callee)?;
                write_list(f, args)?;
                write!(f, ")")
            }
            Expression::Member {
                object,
                property,
                computed: false,
            } => write!(f, "{}.{}", object, property),
            Expression::Member {
                object, property, ..
            } => write!(f, "{}[{}]", object, property),
            Expression::Tuple(items) => {
                write!(f, "{{")?;
                write_list(f, items)?;
                write!(f, "}}")
            }
            Expression::List(items) => {
                write!(f, "[")?;
                write_list(f, items)?;
                write!(f, "]")
            }
            Expression::Map(entries) => {
                write!(f, "%{{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} => {}", key, value)?;
                }
                write!(f, "}}")
            }
            Expression::AnonymousFn { params, body } => {
                write!(f, "fn ({}) -> {} end", params.join(", "), body)
            }
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Expression(expr) => write!(f, "{}", expr),
            Statement::If(clauses) => write!(f, "if ... end ({} clauses)", clauses.len()),
            Statement::While { condition, .. } => write!(f, "while {} do ... end", condition),
            Statement::FunctionDeclaration { name, params, .. } => {
                write!(f, "def {}({}) do ... end", name, params.join(", "))
            }
            Statement::Return(Some(expr)) => write!(f, "return {}", expr),
            Statement::Return(None) => write!(f, "return"),
            Statement::Break => write!(f, "break"),
            Statement::Continue => write!(f, "continue"),
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for stmt in &self.body {
            writeln!(f, "{}", stmt)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expression_display() {
        let expr = Expression::binary(
            Expression::NumericLiteral(1.0),
            BinaryOp::Add,
            Expression::identifier("x"),
        );
        assert_eq!(expr.to_string(), "(1 + x)");

        let call = Expression::call(
            Expression::Member {
                object: Box::new(Expression::identifier("List")),
                property: Box::new(Expression::identifier("at")),
                computed: false,
            },
            vec![Expression::identifier("l"), Expression::NumericLiteral(0.0)],
        );
        assert_eq!(call.to_string(), "List.at(l, 0)");

        let tuple = Expression::Tuple(vec![
            Expression::Atom("ok".to_string()),
            Expression::NumericLiteral(2.0),
        ]);
        assert_eq!(tuple.to_string(), "{:ok, 2}");
    }

    #[test]
    fn test_logical_operators() {
        assert!(BinaryOp::from_symbol("and").unwrap().is_logical());
        assert!(!BinaryOp::from_symbol("<=").unwrap().is_logical());
        assert_eq!(BinaryOp::from_symbol("=>"), None);
    }

    #[test]
    fn test_program_push() {
        let mut program = Program::new();
        assert!(program.is_empty());
        program.push(Statement::Break);
        assert!(!program.is_empty());
        assert_eq!(program.to_string(), "break\n");
    }
}
