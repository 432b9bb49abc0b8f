use crate::engine::ast::{
    Block, Expression, ExpressionKind, InfixOperator, PrefixOperator, Statement, StatementKind,
    Tree,
};
use crate::engine::builtins;
use crate::engine::env::Environment;
use crate::engine::value::{Function, Value};
use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;
use thiserror::Error;
use tracing::{debug, error, instrument, trace};

/// A runtime failure. Displays as `<line>: <message> dekat '<rendering>'`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeError {
    #[error("{line}: identifier tidak dikenal dekat '{name}'")]
    UnknownIdentifier { name: String, line: usize },
    #[error("{line}: bukan fungsi dekat '{found}'")]
    NotAFunction { found: String, line: usize },
    #[error(
        "{line}: jumlah argumen salah: mengharapkan {expected}, mendapatkan {got} dekat '{callee}'"
    )]
    ArityMismatch {
        callee: String,
        expected: usize,
        got: usize,
        line: usize,
    },
    #[error("{line}: tipe tidak cocok dekat '{left} {operator} {right}'")]
    TypeMismatch {
        left: String,
        operator: InfixOperator,
        right: String,
        line: usize,
    },
    #[error("{line}: operator tidak didukung dekat '{left} {operator} {right}'")]
    UnsupportedOperator {
        left: String,
        operator: InfixOperator,
        right: String,
        line: usize,
    },
    #[error("{line}: operator prefix tidak didukung dekat '{operator}{operand}'")]
    UnsupportedPrefix {
        operator: PrefixOperator,
        operand: String,
        line: usize,
    },
    #[error("{line}: bukan array dekat '{found}'")]
    NotAnArray { found: String, line: usize },
    #[error("{line}: indeks bukan bilangan bulat dekat '{found}'")]
    IndexNotInteger { found: String, line: usize },
    #[error("{line}: indeks negatif dekat '{index}'")]
    NegativeIndex { index: i64, line: usize },
    #[error("{line}: indeks di luar batas dekat '{index}'")]
    IndexOutOfBounds { index: i64, line: usize },
    #[error("{line}: argumen panjang tidak didukung dekat '{found}'")]
    UnsupportedLength { found: String, line: usize },
    #[error("{line}: pembagian dengan nol dekat '{left} / 0'")]
    DivisionByZero { left: i64, line: usize },
    #[error("{line}: luapan bilangan bulat dekat '{left} {operator} {right}'")]
    Overflow {
        left: i64,
        operator: String,
        right: i64,
        line: usize,
    },
    #[error("{line}: gagal menulis keluaran dekat '{message}'")]
    Output { message: String, line: usize },
}

/// Non-local exits out of statement evaluation.
///
/// `Return` only ever travels up to the nearest function call, which turns
/// it back into a plain value.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Unwind {
    #[error("return outside of function")]
    Return(Value),
    #[error(transparent)]
    Error(#[from] RuntimeError),
}

/// What happens to the remaining top-level statements after one fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Stop at the first failing statement.
    #[default]
    FailFast,
    /// Keep going so every top-level failure is reported.
    Collect,
}

/// Tree-walking evaluator. `cetak` output goes to `out`.
pub struct Evaluator<W: Write> {
    out: W,
    mode: ErrorMode,
}

impl<W: Write> Evaluator<W> {
    pub fn new(out: W) -> Self {
        Evaluator {
            out,
            mode: ErrorMode::FailFast,
        }
    }

    pub fn with_mode(mut self, mode: ErrorMode) -> Self {
        self.mode = mode;
        self
    }

    /// Evaluates every top-level statement, yielding one result per statement
    /// that ran.
    #[instrument(skip(self, tree, env), fields(statements = tree.statements.len(), mode = ?self.mode))]
    pub fn evaluate(
        &mut self,
        tree: &Tree,
        env: Rc<RefCell<Environment>>,
    ) -> Vec<Result<Value, RuntimeError>> {
        let mut results = Vec::with_capacity(tree.statements.len());
        for statement in &tree.statements {
            let result = match self.eval_statement(statement, Rc::clone(&env)) {
                // A top-level return has no call to unwind to.
                Ok(value) | Err(Unwind::Return(value)) => Ok(value),
                Err(Unwind::Error(err)) => Err(err),
            };
            let failed = result.is_err();
            results.push(result);
            if failed && self.mode == ErrorMode::FailFast {
                debug!("Stopping after top-level error");
                break;
            }
        }
        results
    }

    #[instrument(level = "trace", skip(self, statement, env), fields(line = statement.line))]
    fn eval_statement(
        &mut self,
        statement: &Statement,
        env: Rc<RefCell<Environment>>,
    ) -> Result<Value, Unwind> {
        trace!(%statement, "Evaluating statement");
        match &statement.kind {
            StatementKind::Declare { name, value } => {
                let value = self.eval_expression(value, Rc::clone(&env))?;
                env.borrow_mut().define(name.clone(), value.clone());
                Ok(value)
            }
            StatementKind::Return(value) => {
                let value = match value {
                    Some(expression) => self.eval_expression(expression, env)?,
                    None => Value::Nil,
                };
                trace!(?value, "Unwinding return");
                Err(Unwind::Return(value))
            }
            StatementKind::Expression(expression) => Ok(self.eval_expression(expression, env)?),
            StatementKind::Block(block) => self.eval_block(block, env),
            StatementKind::If {
                condition,
                consequence,
                alternative,
            } => {
                let condition = self.eval_expression(condition, Rc::clone(&env))?;
                debug!(?condition, "Evaluated 'jika' condition");
                if condition.is_truthy() {
                    self.eval_block(consequence, env)
                } else if let Some(alternative) = alternative {
                    self.eval_block(alternative, env)
                } else {
                    Ok(Value::Nil)
                }
            }
            StatementKind::Print(arguments) => {
                let mut values = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    values.push(self.eval_expression(argument, Rc::clone(&env))?);
                }
                let rendered = builtins::render_print_line(&values);
                writeln!(self.out, "{}", rendered)
                    .and_then(|_| self.out.flush())
                    .map_err(|e| RuntimeError::Output {
                        message: e.to_string(),
                        line: statement.line,
                    })?;
                Ok(values.pop().unwrap_or(Value::Nil))
            }
            StatementKind::Reassign { name, value } => {
                let value = self.eval_expression(value, Rc::clone(&env))?;
                if env.borrow_mut().assign(name, value.clone()) {
                    Ok(value)
                } else {
                    let err = RuntimeError::UnknownIdentifier {
                        name: name.clone(),
                        line: statement.line,
                    };
                    error!(error = %err, "Reassignment of unbound name");
                    Err(err.into())
                }
            }
        }
    }

    /// Runs the statements of a block in `env` itself; blocks never open a scope.
    fn eval_block(&mut self, block: &Block, env: Rc<RefCell<Environment>>) -> Result<Value, Unwind> {
        let mut result = Value::Nil;
        for statement in &block.statements {
            result = self.eval_statement(statement, Rc::clone(&env))?;
        }
        Ok(result)
    }

    #[instrument(level = "trace", skip(self, expression, env), fields(expression = %expression))]
    fn eval_expression(
        &mut self,
        expression: &Expression,
        env: Rc<RefCell<Environment>>,
    ) -> Result<Value, RuntimeError> {
        let line = expression.line;
        match &expression.kind {
            ExpressionKind::Integer(n) => Ok(Value::Integer(*n)),
            ExpressionKind::Boolean(b) => Ok(Value::Boolean(*b)),
            ExpressionKind::String(s) => Ok(Value::String(s.clone())),
            ExpressionKind::Identifier(name) => {
                let found = env.borrow().get(name);
                found.ok_or_else(|| {
                    error!(name = %name, "Unknown identifier encountered");
                    RuntimeError::UnknownIdentifier {
                        name: name.clone(),
                        line,
                    }
                })
            }
            ExpressionKind::Prefix { operator, operand } => {
                let operand = self.eval_expression(operand, env)?;
                eval_prefix(*operator, operand, line)
            }
            ExpressionKind::Infix {
                operator,
                left,
                right,
            } => {
                let left = self.eval_expression(left, Rc::clone(&env))?;
                let right = self.eval_expression(right, env)?;
                eval_infix(*operator, left, right, line)
            }
            ExpressionKind::Function { params, body } => {
                Ok(Value::Function(Rc::new(Function {
                    params: params.clone(),
                    body: Rc::clone(body),
                    closure: env,
                })))
            }
            ExpressionKind::Call { callee, arguments } => {
                let function = match self.eval_expression(callee, Rc::clone(&env))? {
                    Value::Function(function) => function,
                    other => {
                        error!(callee = %callee, value = ?other, "Attempted to call a non-function");
                        return Err(RuntimeError::NotAFunction {
                            found: callee.to_string(),
                            line,
                        });
                    }
                };
                let mut evaluated_args = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    evaluated_args.push(self.eval_expression(argument, Rc::clone(&env))?);
                }
                self.apply(callee, &function, evaluated_args, line)
            }
            ExpressionKind::Array(elements) => {
                let mut values = Vec::with_capacity(elements.len());
                for element in elements {
                    values.push(self.eval_expression(element, Rc::clone(&env))?);
                }
                Ok(Value::Array(Rc::new(values)))
            }
            ExpressionKind::Index { collection, index } => {
                let collection = self.eval_expression(collection, Rc::clone(&env))?;
                let index = self.eval_expression(index, env)?;
                eval_index(collection, index, line)
            }
            ExpressionKind::Length(argument) => {
                let argument = self.eval_expression(argument, env)?;
                builtins::length_of(&argument, line)
            }
        }
    }

    /// Calls a closure. This is the only place a `Return` unwind is consumed.
    #[instrument(level = "debug", skip(self, callee, function, evaluated_args), fields(callee = %callee, args = ?evaluated_args), ret, err)]
    fn apply(
        &mut self,
        callee: &Expression,
        function: &Function,
        evaluated_args: Vec<Value>,
        line: usize,
    ) -> Result<Value, RuntimeError> {
        if evaluated_args.len() != function.params.len() {
            error!(
                expected = function.params.len(),
                got = evaluated_args.len(),
                "Arity mismatch for function call"
            );
            return Err(RuntimeError::ArityMismatch {
                callee: callee.to_string(),
                expected: function.params.len(),
                got: evaluated_args.len(),
                line,
            });
        }

        // The call scope hangs off the closure's environment, not the caller's.
        let call_env = Environment::new_enclosed(Rc::clone(&function.closure));
        for (param_name, arg_value) in function.params.iter().zip(evaluated_args) {
            call_env.borrow_mut().define(param_name.clone(), arg_value);
        }

        match self.eval_block(&function.body, call_env) {
            Ok(value) | Err(Unwind::Return(value)) => Ok(value),
            Err(Unwind::Error(err)) => Err(err),
        }
    }
}

fn eval_prefix(operator: PrefixOperator, operand: Value, line: usize) -> Result<Value, RuntimeError> {
    match (operator, operand) {
        (PrefixOperator::Bang, Value::Boolean(b)) => Ok(Value::Boolean(!b)),
        // Negating anything that is not a boolean yields false.
        (PrefixOperator::Bang, _) => Ok(Value::Boolean(false)),
        (PrefixOperator::Minus, Value::Integer(n)) => {
            n.checked_neg()
                .map(Value::Integer)
                .ok_or_else(|| RuntimeError::Overflow {
                    left: 0,
                    operator: "-".to_string(),
                    right: n,
                    line,
                })
        }
        (PrefixOperator::Minus, other) => {
            let err = RuntimeError::UnsupportedPrefix {
                operator,
                operand: other.to_string(),
                line,
            };
            error!(error = %err, "Unsupported prefix operand");
            Err(err)
        }
    }
}

fn eval_infix(
    operator: InfixOperator,
    left: Value,
    right: Value,
    line: usize,
) -> Result<Value, RuntimeError> {
    let unsupported = |left: &Value, right: &Value| RuntimeError::UnsupportedOperator {
        left: left.to_string(),
        operator,
        right: right.to_string(),
        line,
    };
    let result = match (&left, &right) {
        (Value::Integer(l), Value::Integer(r)) => eval_integer_infix(operator, *l, *r, line),
        (Value::Boolean(l), Value::Boolean(r)) => match operator {
            InfixOperator::Equal => Ok(Value::Boolean(l == r)),
            InfixOperator::NotEqual => Ok(Value::Boolean(l != r)),
            _ => Err(unsupported(&left, &right)),
        },
        (Value::String(l), Value::String(r)) => match operator {
            InfixOperator::Plus => Ok(Value::String(format!("{}{}", l, r))),
            _ => Err(unsupported(&left, &right)),
        },
        _ => Err(RuntimeError::TypeMismatch {
            left: left.to_string(),
            operator,
            right: right.to_string(),
            line,
        }),
    };
    if let Err(err) = &result {
        error!(error = %err, "Infix evaluation failed");
    }
    result
}

fn eval_integer_infix(
    operator: InfixOperator,
    l: i64,
    r: i64,
    line: usize,
) -> Result<Value, RuntimeError> {
    let overflow = || RuntimeError::Overflow {
        left: l,
        operator: operator.to_string(),
        right: r,
        line,
    };
    match operator {
        InfixOperator::Plus => l.checked_add(r).map(Value::Integer).ok_or_else(overflow),
        InfixOperator::Minus => l.checked_sub(r).map(Value::Integer).ok_or_else(overflow),
        InfixOperator::Multiply => l.checked_mul(r).map(Value::Integer).ok_or_else(overflow),
        InfixOperator::Divide => {
            if r == 0 {
                return Err(RuntimeError::DivisionByZero { left: l, line });
            }
            // Integer division truncates toward zero.
            l.checked_div(r).map(Value::Integer).ok_or_else(overflow)
        }
        InfixOperator::LessThan => Ok(Value::Boolean(l < r)),
        InfixOperator::GreaterThan => Ok(Value::Boolean(l > r)),
        InfixOperator::Equal => Ok(Value::Boolean(l == r)),
        InfixOperator::NotEqual => Ok(Value::Boolean(l != r)),
    }
}

fn eval_index(collection: Value, index: Value, line: usize) -> Result<Value, RuntimeError> {
    let elements = match collection {
        Value::Array(elements) => elements,
        other => {
            return Err(RuntimeError::NotAnArray {
                found: other.to_string(),
                line,
            });
        }
    };
    let index = match index {
        Value::Integer(i) => i,
        other => {
            return Err(RuntimeError::IndexNotInteger {
                found: other.to_string(),
                line,
            });
        }
    };
    if index < 0 {
        return Err(RuntimeError::NegativeIndex { index, line });
    }
    usize::try_from(index)
        .ok()
        .and_then(|i| elements.get(i).cloned())
        .ok_or(RuntimeError::IndexOutOfBounds { index, line })
}
