use std::fmt;
use std::rc::Rc;

/// The root of a parsed program.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Tree {
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub statements: Vec<Statement>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub kind: StatementKind,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatementKind {
    Declare {
        name: String,
        value: Expression,
    },
    Return(Option<Expression>),
    Expression(Expression),
    Block(Block),
    If {
        condition: Expression,
        consequence: Block,
        alternative: Option<Block>,
    },
    Print(Vec<Expression>),
    Reassign {
        name: String,
        value: Expression,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub kind: ExpressionKind,
    pub line: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixOperator {
    Bang,
    Minus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfixOperator {
    Plus,
    Minus,
    Multiply,
    Divide,
    LessThan,
    GreaterThan,
    Equal,
    NotEqual,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionKind {
    Identifier(String),
    Integer(i64),
    String(String),
    Boolean(bool),
    Prefix {
        operator: PrefixOperator,
        operand: Box<Expression>,
    },
    Infix {
        operator: InfixOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    // The body sits behind an Rc so function values can share it with the tree.
    Function {
        params: Vec<String>,
        body: Rc<Block>,
    },
    Call {
        callee: Box<Expression>,
        arguments: Vec<Expression>,
    },
    Array(Vec<Expression>),
    Index {
        collection: Box<Expression>,
        index: Box<Expression>,
    },
    Length(Box<Expression>),
}

impl Statement {
    pub fn new(kind: StatementKind, line: usize) -> Self {
        Statement { kind, line }
    }
}

impl Expression {
    pub fn new(kind: ExpressionKind, line: usize) -> Self {
        Expression { kind, line }
    }
}

impl fmt::Display for PrefixOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PrefixOperator::Bang => "!",
            PrefixOperator::Minus => "-",
        })
    }
}

impl fmt::Display for InfixOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            InfixOperator::Plus => "+",
            InfixOperator::Minus => "-",
            InfixOperator::Multiply => "*",
            InfixOperator::Divide => "/",
            InfixOperator::LessThan => "<",
            InfixOperator::GreaterThan => ">",
            InfixOperator::Equal => "==",
            InfixOperator::NotEqual => "!=",
        })
    }
}

fn write_joined<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for Expression {
    /// Canonical, fully parenthesised form: `1 + 2 * 3` renders as `(1 + (2 * 3))`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExpressionKind::Identifier(name) => f.write_str(name),
            ExpressionKind::Integer(n) => write!(f, "{}", n),
            ExpressionKind::String(s) => write!(f, "\"{}\"", s),
            ExpressionKind::Boolean(true) => f.write_str("benar"),
            ExpressionKind::Boolean(false) => f.write_str("salah"),
            ExpressionKind::Prefix { operator, operand } => write!(f, "({}{})", operator, operand),
            ExpressionKind::Infix {
                operator,
                left,
                right,
            } => write!(f, "({} {} {})", left, operator, right),
            ExpressionKind::Function { params, body } => {
                write!(f, "fungsi({}) {}", params.join(", "), body)
            }
            ExpressionKind::Call { callee, arguments } => {
                write!(f, "{}(", callee)?;
                write_joined(f, arguments)?;
                f.write_str(")")
            }
            ExpressionKind::Array(elements) => {
                f.write_str("[")?;
                write_joined(f, elements)?;
                f.write_str("]")
            }
            ExpressionKind::Index { collection, index } => write!(f, "({}[{}])", collection, index),
            ExpressionKind::Length(argument) => write!(f, "panjang({})", argument),
        }
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for statement in &self.statements {
            write!(f, " {}", statement)?;
        }
        f.write_str(" }")
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            StatementKind::Declare { name, value } => write!(f, "buat {} = {};", name, value),
            StatementKind::Return(Some(value)) => write!(f, "kembalikan {};", value),
            StatementKind::Return(None) => f.write_str("kembalikan;"),
            StatementKind::Expression(expression) => write!(f, "{}", expression),
            StatementKind::Block(block) => write!(f, "{}", block),
            StatementKind::If {
                condition,
                consequence,
                alternative,
            } => {
                write!(f, "jika ({}) {}", condition, consequence)?;
                if let Some(alternative) = alternative {
                    write!(f, " lainnya {}", alternative)?;
                }
                Ok(())
            }
            StatementKind::Print(arguments) => {
                f.write_str("cetak(")?;
                write_joined(f, arguments)?;
                f.write_str(");")
            }
            StatementKind::Reassign { name, value } => write!(f, "{} = {};", name, value),
        }
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, statement) in self.statements.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{}", statement)?;
        }
        Ok(())
    }
}

// Indented outline printing, one node per line.

struct Outline {
    out: String,
}

impl Outline {
    fn line(&mut self, depth: usize, label: impl fmt::Display) {
        for _ in 0..depth {
            self.out.push_str("  ");
        }
        self.out.push_str(&label.to_string());
        self.out.push('\n');
    }

    fn block(&mut self, depth: usize, block: &Block) {
        for statement in &block.statements {
            self.statement(depth, statement);
        }
    }

    fn statement(&mut self, depth: usize, statement: &Statement) {
        match &statement.kind {
            StatementKind::Declare { name, value } => {
                self.line(depth, format_args!("DECLARE {}", name));
                self.expression(depth + 1, value);
            }
            StatementKind::Return(value) => {
                self.line(depth, "RETURN");
                if let Some(value) = value {
                    self.expression(depth + 1, value);
                }
            }
            StatementKind::Expression(expression) => self.expression(depth, expression),
            StatementKind::Block(block) => {
                self.line(depth, "BLOCK");
                self.block(depth + 1, block);
            }
            StatementKind::If {
                condition,
                consequence,
                alternative,
            } => {
                self.line(depth, "IF");
                self.line(depth + 1, "CONDITION");
                self.expression(depth + 2, condition);
                self.line(depth + 1, "THEN");
                self.block(depth + 2, consequence);
                if let Some(alternative) = alternative {
                    self.line(depth + 1, "ELSE");
                    self.block(depth + 2, alternative);
                }
            }
            StatementKind::Print(arguments) => {
                self.line(depth, "PRINT");
                for argument in arguments {
                    self.expression(depth + 1, argument);
                }
            }
            StatementKind::Reassign { name, value } => {
                self.line(depth, format_args!("REASSIGN {}", name));
                self.expression(depth + 1, value);
            }
        }
    }

    fn expression(&mut self, depth: usize, expression: &Expression) {
        match &expression.kind {
            ExpressionKind::Identifier(name) => self.line(depth, format_args!("IDENT {}", name)),
            ExpressionKind::Integer(n) => self.line(depth, format_args!("INTEGER {}", n)),
            ExpressionKind::String(s) => self.line(depth, format_args!("STRING \"{}\"", s)),
            ExpressionKind::Boolean(b) => self.line(
                depth,
                format_args!("BOOLEAN {}", if *b { "benar" } else { "salah" }),
            ),
            ExpressionKind::Prefix { operator, operand } => {
                self.line(depth, format_args!("PREFIX {}", operator));
                self.expression(depth + 1, operand);
            }
            ExpressionKind::Infix {
                operator,
                left,
                right,
            } => {
                self.line(depth, format_args!("INFIX {}", operator));
                self.expression(depth + 1, left);
                self.expression(depth + 1, right);
            }
            ExpressionKind::Function { params, body } => {
                self.line(depth, format_args!("FUNCTION ({})", params.join(", ")));
                self.block(depth + 1, body);
            }
            ExpressionKind::Call { callee, arguments } => {
                self.line(depth, "CALL");
                self.expression(depth + 1, callee);
                for argument in arguments {
                    self.expression(depth + 1, argument);
                }
            }
            ExpressionKind::Array(elements) => {
                self.line(depth, "ARRAY");
                for element in elements {
                    self.expression(depth + 1, element);
                }
            }
            ExpressionKind::Index { collection, index } => {
                self.line(depth, "INDEX");
                self.expression(depth + 1, collection);
                self.expression(depth + 1, index);
            }
            ExpressionKind::Length(argument) => {
                self.line(depth, "LENGTH");
                self.expression(depth + 1, argument);
            }
        }
    }
}

impl Tree {
    /// Indented outline of the tree, as printed by `run --tree`.
    pub fn dump(&self) -> String {
        let mut outline = Outline { out: String::new() };
        for statement in &self.statements {
            outline.statement(0, statement);
        }
        outline.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::init_test_logging;

    fn int(n: i64) -> Expression {
        Expression::new(ExpressionKind::Integer(n), 1)
    }

    fn infix(operator: InfixOperator, left: Expression, right: Expression) -> Expression {
        Expression::new(
            ExpressionKind::Infix {
                operator,
                left: Box::new(left),
                right: Box::new(right),
            },
            1,
        )
    }

    #[test]
    fn infix_renders_fully_parenthesised() {
        init_test_logging();
        let expr = infix(
            InfixOperator::Plus,
            int(1),
            infix(InfixOperator::Multiply, int(2), int(3)),
        );
        assert_eq!(expr.to_string(), "(1 + (2 * 3))");
    }

    #[test]
    fn declaration_renders_as_source() {
        init_test_logging();
        let statement = Statement::new(
            StatementKind::Declare {
                name: "x".to_string(),
                value: Expression::new(ExpressionKind::Boolean(true), 1),
            },
            1,
        );
        assert_eq!(statement.to_string(), "buat x = benar;");
    }

    #[test]
    fn dump_indents_children() {
        init_test_logging();
        let tree = Tree {
            statements: vec![Statement::new(
                StatementKind::Declare {
                    name: "x".to_string(),
                    value: infix(InfixOperator::Minus, int(4), int(2)),
                },
                1,
            )],
        };
        assert_eq!(
            tree.dump(),
            "DECLARE x\n  INFIX -\n    INTEGER 4\n    INTEGER 2\n"
        );
    }
}
