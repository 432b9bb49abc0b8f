use std::collections::HashMap;
use std::rc::Rc;
use thiserror::Error;
use tracing::{debug, instrument, trace};

use crate::engine::ast::{
    Block, Expression, ExpressionKind, InfixOperator, PrefixOperator, Statement, StatementKind,
    Tree,
};
use crate::engine::token::{Token, TokenKind, TokenSource};

/// A recoverable syntax error. Displays as `<line>: <message> dekat '<found>'`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("{line}: mengharapkan {expected} dekat '{found}'")]
    Expected {
        expected: TokenKind,
        found: String,
        line: usize,
    },
    #[error("{line}: token tidak diharapkan dekat '{found}'")]
    UnexpectedToken { found: String, line: usize },
    #[error("{line}: kondisi tidak boleh kosong dekat '{found}'")]
    EmptyCondition { found: String, line: usize },
    #[error("{line}: bilangan bulat tidak valid dekat '{found}'")]
    InvalidInteger { found: String, line: usize },
}

/// Every diagnostic from one parse, rendered under a header line with one
/// tab-indented diagnostic per line.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("kesalahan sintaks:{}", render_diagnostics(.0))]
pub struct ParseErrors(pub Vec<ParseError>);

fn render_diagnostics(errors: &[ParseError]) -> String {
    errors.iter().map(|e| format!("\n\t{}", e)).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    Lowest,
    Equals,      // == !=
    LessGreater, // < >
    Sum,         // + -
    Product,     // * /
    Prefix,      // -x !x
    Call,        // f(x)
    Index,       // a[i]
}

fn precedence_of(kind: TokenKind) -> Precedence {
    match kind {
        TokenKind::Eq | TokenKind::NotEq => Precedence::Equals,
        TokenKind::Lt | TokenKind::Gt => Precedence::LessGreater,
        TokenKind::Plus | TokenKind::Minus => Precedence::Sum,
        TokenKind::Asterisk | TokenKind::Slash => Precedence::Product,
        TokenKind::LParen => Precedence::Call,
        TokenKind::LBracket => Precedence::Index,
        _ => Precedence::Lowest,
    }
}

type PrefixRule<S> = fn(&mut Parser<S>) -> Option<Expression>;
type InfixRule<S> = fn(&mut Parser<S>, Expression) -> Option<Expression>;

pub struct Parser<S: TokenSource> {
    source: S,
    current: Token,
    peek: Token,
    errors: Vec<ParseError>,
    prefix_rules: HashMap<TokenKind, PrefixRule<S>>,
    infix_rules: HashMap<TokenKind, InfixRule<S>>,
}

/// Parses a whole program. Never fails: diagnostics are collected alongside
/// whatever statements could be built.
pub fn parse<S: TokenSource>(source: S) -> (Tree, Vec<ParseError>) {
    let mut parser = Parser::new(source);
    let tree = parser.parse_program();
    (tree, parser.errors)
}

impl<S: TokenSource> Parser<S> {
    pub fn new(mut source: S) -> Self {
        let current = source.next_token();
        let peek = source.next_token();

        let prefix: [(TokenKind, PrefixRule<S>); 11] = [
            (TokenKind::Ident, Self::parse_identifier),
            (TokenKind::Int, Self::parse_integer),
            (TokenKind::String, Self::parse_string),
            (TokenKind::True, Self::parse_boolean),
            (TokenKind::False, Self::parse_boolean),
            (TokenKind::Bang, Self::parse_prefix),
            (TokenKind::Minus, Self::parse_prefix),
            (TokenKind::Function, Self::parse_function),
            (TokenKind::LBracket, Self::parse_array),
            (TokenKind::Length, Self::parse_length),
            (TokenKind::Illegal, Self::parse_illegal),
        ];
        let infix: [(TokenKind, InfixRule<S>); 10] = [
            (TokenKind::Plus, Self::parse_infix),
            (TokenKind::Minus, Self::parse_infix),
            (TokenKind::Asterisk, Self::parse_infix),
            (TokenKind::Slash, Self::parse_infix),
            (TokenKind::Lt, Self::parse_infix),
            (TokenKind::Gt, Self::parse_infix),
            (TokenKind::Eq, Self::parse_infix),
            (TokenKind::NotEq, Self::parse_infix),
            (TokenKind::LParen, Self::parse_call),
            (TokenKind::LBracket, Self::parse_index),
        ];

        Parser {
            source,
            current,
            peek,
            errors: Vec::new(),
            prefix_rules: prefix.into_iter().collect(),
            infix_rules: infix.into_iter().collect(),
        }
    }

    fn next_token(&mut self) {
        let next = self.source.next_token();
        self.current = std::mem::replace(&mut self.peek, next);
    }

    fn peek_is(&self, kind: TokenKind) -> bool {
        self.peek.kind == kind
    }

    fn skip_optional_semicolon(&mut self) {
        if self.peek_is(TokenKind::Semicolon) {
            self.next_token();
        }
    }

    /// Advances onto the peek token if it has the wanted kind, otherwise
    /// records a diagnostic and stays put.
    fn expect_peek(&mut self, kind: TokenKind) -> Option<()> {
        if self.peek_is(kind) {
            self.next_token();
            Some(())
        } else {
            let error = ParseError::Expected {
                expected: kind,
                found: self.peek.literal.clone(),
                line: self.peek.line,
            };
            debug!(%error, "Unexpected peek token");
            self.errors.push(error);
            None
        }
    }

    fn unexpected_current(&mut self) {
        let error = ParseError::UnexpectedToken {
            found: self.current.literal.clone(),
            line: self.current.line,
        };
        debug!(%error, "No prefix rule for token");
        self.errors.push(error);
    }

    #[instrument(level = "debug", skip(self))]
    pub fn parse_program(&mut self) -> Tree {
        let mut statements = Vec::new();
        while self.current.kind != TokenKind::Eof {
            match self.parse_statement() {
                Some(statement) => {
                    statements.push(statement);
                    self.next_token();
                }
                None => {
                    self.synchronize();
                    // A stray `}` has no block to close at top level.
                    if self.current.kind == TokenKind::RBrace {
                        self.next_token();
                    }
                }
            }
        }
        debug!(
            statements = statements.len(),
            errors = self.errors.len(),
            "Finished parsing program"
        );
        Tree { statements }
    }

    /// Skips the rest of a statement that failed to parse. Leaves the current
    /// token on the start of the next statement: just past a `;`, on a
    /// statement keyword, or on an unconsumed `}` or the end of input.
    /// Braces opened by the broken statement are skipped as a whole.
    fn synchronize(&mut self) {
        trace!(token = ?self.current, "Skipping the rest of a malformed statement");
        let mut depth = 0usize;
        loop {
            match self.current.kind {
                TokenKind::Eof => return,
                TokenKind::RBrace if depth == 0 => return,
                TokenKind::RBrace => depth -= 1,
                TokenKind::LBrace => depth += 1,
                TokenKind::Semicolon if depth == 0 => {
                    self.next_token();
                    return;
                }
                _ => {}
            }
            let at_boundary = depth == 0
                && matches!(
                    self.peek.kind,
                    TokenKind::Declare
                        | TokenKind::Return
                        | TokenKind::If
                        | TokenKind::Print
                        | TokenKind::RBrace
                        | TokenKind::Eof
                );
            self.next_token();
            if at_boundary {
                return;
            }
        }
    }

    // Statements start on their first token and finish on their last one.

    #[instrument(level = "trace", skip(self), fields(token = ?self.current))]
    fn parse_statement(&mut self) -> Option<Statement> {
        match self.current.kind {
            TokenKind::Declare => self.parse_declaration(),
            TokenKind::Return => self.parse_return(),
            TokenKind::If => self.parse_if(),
            TokenKind::Print => self.parse_print(),
            TokenKind::LBrace => {
                let block = self.parse_block()?;
                let line = block.line;
                self.skip_optional_semicolon();
                Some(Statement::new(StatementKind::Block(block), line))
            }
            TokenKind::Ident if self.peek_is(TokenKind::Assign) => self.parse_reassignment(),
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_declaration(&mut self) -> Option<Statement> {
        let line = self.current.line;
        self.expect_peek(TokenKind::Ident)?;
        let name = self.current.literal.clone();
        self.expect_peek(TokenKind::Assign)?;
        self.next_token();
        let value = self.parse_expression(Precedence::Lowest)?;
        self.skip_optional_semicolon();
        Some(Statement::new(StatementKind::Declare { name, value }, line))
    }

    fn parse_return(&mut self) -> Option<Statement> {
        let line = self.current.line;
        if self.peek_is(TokenKind::Semicolon) {
            self.next_token();
            return Some(Statement::new(StatementKind::Return(None), line));
        }
        if self.peek_is(TokenKind::RBrace) || self.peek_is(TokenKind::Eof) {
            return Some(Statement::new(StatementKind::Return(None), line));
        }
        self.next_token();
        let value = self.parse_expression(Precedence::Lowest)?;
        self.skip_optional_semicolon();
        Some(Statement::new(StatementKind::Return(Some(value)), line))
    }

    fn parse_if(&mut self) -> Option<Statement> {
        let line = self.current.line;
        self.expect_peek(TokenKind::LParen)?;
        if self.peek_is(TokenKind::RParen) {
            self.errors.push(ParseError::EmptyCondition {
                found: self.peek.literal.clone(),
                line: self.peek.line,
            });
            return None;
        }
        self.next_token();
        let condition = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenKind::RParen)?;
        self.expect_peek(TokenKind::LBrace)?;
        let consequence = self.parse_block()?;

        let alternative = if self.peek_is(TokenKind::Else) {
            self.next_token();
            self.expect_peek(TokenKind::LBrace)?;
            Some(self.parse_block()?)
        } else {
            None
        };
        self.skip_optional_semicolon();

        Some(Statement::new(
            StatementKind::If {
                condition,
                consequence,
                alternative,
            },
            line,
        ))
    }

    fn parse_print(&mut self) -> Option<Statement> {
        let line = self.current.line;
        self.expect_peek(TokenKind::LParen)?;
        let arguments = self.parse_expression_list(TokenKind::RParen)?;
        self.skip_optional_semicolon();
        Some(Statement::new(StatementKind::Print(arguments), line))
    }

    fn parse_reassignment(&mut self) -> Option<Statement> {
        let line = self.current.line;
        let name = self.current.literal.clone();
        self.next_token();
        self.next_token();
        let value = self.parse_expression(Precedence::Lowest)?;
        self.skip_optional_semicolon();
        Some(Statement::new(StatementKind::Reassign { name, value }, line))
    }

    fn parse_expression_statement(&mut self) -> Option<Statement> {
        let line = self.current.line;
        let expression = self.parse_expression(Precedence::Lowest)?;
        self.skip_optional_semicolon();
        Some(Statement::new(StatementKind::Expression(expression), line))
    }

    /// Expects the current token to be `{`; finishes on the matching `}`.
    fn parse_block(&mut self) -> Option<Block> {
        let line = self.current.line;
        let mut statements = Vec::new();
        self.next_token();
        while self.current.kind != TokenKind::RBrace {
            if self.current.kind == TokenKind::Eof {
                self.errors.push(ParseError::Expected {
                    expected: TokenKind::RBrace,
                    found: self.current.literal.clone(),
                    line: self.current.line,
                });
                return None;
            }
            match self.parse_statement() {
                Some(statement) => {
                    statements.push(statement);
                    self.next_token();
                }
                None => self.synchronize(),
            }
        }
        Some(Block { statements, line })
    }

    // Expressions start on their first token and finish on their last one.

    #[instrument(level = "trace", skip(self), fields(token = ?self.current))]
    fn parse_expression(&mut self, precedence: Precedence) -> Option<Expression> {
        let Some(prefix) = self.prefix_rules.get(&self.current.kind).copied() else {
            self.unexpected_current();
            return None;
        };
        let mut left = prefix(self)?;

        while !self.peek_is(TokenKind::Semicolon) && precedence < precedence_of(self.peek.kind) {
            let Some(infix) = self.infix_rules.get(&self.peek.kind).copied() else {
                return Some(left);
            };
            self.next_token();
            left = infix(self, left)?;
        }
        trace!(expression = %left, "Parsed expression");
        Some(left)
    }

    fn parse_identifier(&mut self) -> Option<Expression> {
        Some(Expression::new(
            ExpressionKind::Identifier(self.current.literal.clone()),
            self.current.line,
        ))
    }

    fn parse_integer(&mut self) -> Option<Expression> {
        match self.current.literal.parse::<i64>() {
            Ok(value) => Some(Expression::new(
                ExpressionKind::Integer(value),
                self.current.line,
            )),
            Err(_) => {
                self.errors.push(ParseError::InvalidInteger {
                    found: self.current.literal.clone(),
                    line: self.current.line,
                });
                None
            }
        }
    }

    fn parse_string(&mut self) -> Option<Expression> {
        Some(Expression::new(
            ExpressionKind::String(self.current.literal.clone()),
            self.current.line,
        ))
    }

    fn parse_boolean(&mut self) -> Option<Expression> {
        Some(Expression::new(
            ExpressionKind::Boolean(self.current.kind == TokenKind::True),
            self.current.line,
        ))
    }

    fn parse_illegal(&mut self) -> Option<Expression> {
        self.unexpected_current();
        None
    }

    fn parse_prefix(&mut self) -> Option<Expression> {
        let line = self.current.line;
        let operator = match self.current.kind {
            TokenKind::Bang => PrefixOperator::Bang,
            _ => PrefixOperator::Minus,
        };
        self.next_token();
        let operand = self.parse_expression(Precedence::Prefix)?;
        Some(Expression::new(
            ExpressionKind::Prefix {
                operator,
                operand: Box::new(operand),
            },
            line,
        ))
    }

    fn parse_infix(&mut self, left: Expression) -> Option<Expression> {
        let line = self.current.line;
        let operator = match self.current.kind {
            TokenKind::Plus => InfixOperator::Plus,
            TokenKind::Minus => InfixOperator::Minus,
            TokenKind::Asterisk => InfixOperator::Multiply,
            TokenKind::Slash => InfixOperator::Divide,
            TokenKind::Lt => InfixOperator::LessThan,
            TokenKind::Gt => InfixOperator::GreaterThan,
            TokenKind::Eq => InfixOperator::Equal,
            _ => InfixOperator::NotEqual,
        };
        let precedence = precedence_of(self.current.kind);
        self.next_token();
        let right = self.parse_expression(precedence)?;
        Some(Expression::new(
            ExpressionKind::Infix {
                operator,
                left: Box::new(left),
                right: Box::new(right),
            },
            line,
        ))
    }

    fn parse_function(&mut self) -> Option<Expression> {
        let line = self.current.line;
        self.expect_peek(TokenKind::LParen)?;
        let params = self.parse_params()?;
        self.expect_peek(TokenKind::LBrace)?;
        let body = self.parse_block()?;
        Some(Expression::new(
            ExpressionKind::Function {
                params,
                body: Rc::new(body),
            },
            line,
        ))
    }

    /// Expects the current token to be `(`; finishes on `)`.
    fn parse_params(&mut self) -> Option<Vec<String>> {
        let mut params = Vec::new();
        if self.peek_is(TokenKind::RParen) {
            self.next_token();
            return Some(params);
        }
        self.expect_peek(TokenKind::Ident)?;
        params.push(self.current.literal.clone());
        while self.peek_is(TokenKind::Comma) {
            self.next_token();
            self.expect_peek(TokenKind::Ident)?;
            params.push(self.current.literal.clone());
        }
        self.expect_peek(TokenKind::RParen)?;
        Some(params)
    }

    fn parse_array(&mut self) -> Option<Expression> {
        let line = self.current.line;
        let elements = self.parse_expression_list(TokenKind::RBracket)?;
        Some(Expression::new(ExpressionKind::Array(elements), line))
    }

    fn parse_length(&mut self) -> Option<Expression> {
        let line = self.current.line;
        self.expect_peek(TokenKind::LParen)?;
        self.next_token();
        let argument = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenKind::RParen)?;
        Some(Expression::new(
            ExpressionKind::Length(Box::new(argument)),
            line,
        ))
    }

    fn parse_call(&mut self, callee: Expression) -> Option<Expression> {
        let line = self.current.line;
        let arguments = self.parse_expression_list(TokenKind::RParen)?;
        Some(Expression::new(
            ExpressionKind::Call {
                callee: Box::new(callee),
                arguments,
            },
            line,
        ))
    }

    fn parse_index(&mut self, collection: Expression) -> Option<Expression> {
        let line = self.current.line;
        self.next_token();
        if self.current.kind == TokenKind::RBracket {
            self.unexpected_current();
            return None;
        }
        let index = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenKind::RBracket)?;
        Some(Expression::new(
            ExpressionKind::Index {
                collection: Box::new(collection),
                index: Box::new(index),
            },
            line,
        ))
    }

    /// Comma-separated expressions. Expects the current token to be the
    /// opening delimiter; finishes on `end`.
    fn parse_expression_list(&mut self, end: TokenKind) -> Option<Vec<Expression>> {
        let mut list = Vec::new();
        if self.peek_is(end) {
            self.next_token();
            return Some(list);
        }
        self.next_token();
        list.push(self.parse_expression(Precedence::Lowest)?);
        while self.peek_is(TokenKind::Comma) {
            self.next_token();
            self.next_token();
            list.push(self.parse_expression(Precedence::Lowest)?);
        }
        self.expect_peek(end)?;
        Some(list)
    }
}
