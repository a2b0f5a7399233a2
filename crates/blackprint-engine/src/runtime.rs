// SPDX-License-Identifier: Apache-2.0 OR MIT
use smallvec::SmallVec;

use crate::ast::{BinaryOp, Expression};
use crate::error::Error;
use crate::parser;
use crate::value::{format_number, Mapping, Value};

/// Name lookup scope threaded through template evaluation.
///
/// Loop variables are pushed on top of the root data and shadow it; the root
/// mapping itself is never mutated.
#[derive(Debug, Clone)]
pub struct EvalContext {
    root: Value,
    bindings: SmallVec<[(String, Value); 4]>,
}

impl EvalContext {
    /// Creates a context over the caller's data.
    pub fn new(data: Value) -> Self {
        Self {
            root: data,
            bindings: SmallVec::new(),
        }
    }

    /// Binds `name` to `value` until the matching [`EvalContext::pop_binding`].
    pub fn push_binding(&mut self, name: impl Into<String>, value: Value) {
        self.bindings.push((name.into(), value));
    }

    pub fn pop_binding(&mut self) {
        self.bindings.pop();
    }

    /// Parses and evaluates `source` in this context.
    pub fn evaluate(&self, source: &str) -> Result<Value, Error> {
        let expr = parser::parse_expression(source)?;
        self.eval(&expr)
    }

    /// Evaluates an already parsed expression.
    ///
    /// Both operands of `&&`, `||` and both branches of `? :` are evaluated
    /// before the result is selected, so an error in the branch not taken
    /// still fails the evaluation.
    pub fn eval(&self, expr: &Expression) -> Result<Value, Error> {
        match expr {
            Expression::Number(n) => Ok(Value::Number(*n)),
            Expression::String(s) => Ok(Value::String(s.clone())),
            Expression::Bool(b) => Ok(Value::Bool(*b)),
            Expression::Null => Ok(Value::Null),
            Expression::Name(name) => self.resolve_name(name),
            Expression::Property { target, name } => {
                let target = self.eval(target)?;
                resolve_key(&target, name)
            }
            Expression::Index { target, index } => {
                let target = self.eval(target)?;
                let index = self.eval(index)?;
                match index {
                    // `x[null]` is null-forgiving
                    Value::Null => Ok(Value::Null),
                    Value::Number(n) => resolve_index(&target, n),
                    Value::String(key) => resolve_key(&target, &key),
                    other => Err(Error::type_mismatch(format!(
                        "index must be a number or string, got {}",
                        other.type_name()
                    ))),
                }
            }
            Expression::Not(operand) => Ok(Value::Bool(!self.eval(operand)?.is_truthy())),
            Expression::Binary { op, left, right } => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                apply_binary(*op, left, right)
            }
            Expression::Ternary {
                cond,
                then,
                otherwise,
            } => {
                let cond = self.eval(cond)?;
                let then = self.eval(then)?;
                let otherwise = self.eval(otherwise)?;
                Ok(if cond.is_truthy() { then } else { otherwise })
            }
        }
    }

    fn resolve_name(&self, name: &str) -> Result<Value, Error> {
        if let Some((_, value)) = self.bindings.iter().rev().find(|(bound, _)| bound == name) {
            return Ok(value.clone());
        }
        resolve_key(&self.root, name)
    }
}

/// Evaluates `source` against `data` in a fresh context.
pub fn evaluate(source: &str, data: &Value) -> Result<Value, Error> {
    EvalContext::new(data.clone()).evaluate(source)
}

fn resolve_key(target: &Value, key: &str) -> Result<Value, Error> {
    match target {
        Value::String(s) if key == "length" => Ok(Value::Number(s.chars().count() as f64)),
        Value::Sequence(items) if key == "length" => Ok(Value::Number(items.len() as f64)),
        Value::String(_) | Value::Sequence(_) => Err(Error::type_mismatch(format!(
            "{} only has a length property and index access, not {key}",
            target.type_name()
        ))),
        Value::Mapping(map) => lookup(map, key),
        other => Err(Error::type_mismatch(format!(
            "cannot access property {key} of {}",
            other.type_name()
        ))),
    }
}

fn lookup(map: &Mapping, key: &str) -> Result<Value, Error> {
    map.get(key)
        .cloned()
        .ok_or_else(|| Error::lookup(format!("the mapping does not have key {key}")))
}

/// Integer indexing; negative indices count from the end.
fn resolve_index(target: &Value, index: f64) -> Result<Value, Error> {
    match target {
        Value::Sequence(items) => {
            let position = normalize_index(index, items.len())?;
            Ok(items[position].clone())
        }
        Value::String(s) => {
            let chars: Vec<char> = s.chars().collect();
            let position = normalize_index(index, chars.len())?;
            Ok(Value::String(chars[position].to_string()))
        }
        Value::Mapping(map) => lookup(map, &format_number(index)),
        other => Err(Error::type_mismatch(format!(
            "cannot index into {}",
            other.type_name()
        ))),
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
fn normalize_index(index: f64, len: usize) -> Result<usize, Error> {
    let out_of_range = || Error::lookup(format!("index {} out of range for length {len}", format_number(index)));
    if !index.is_finite() {
        return Err(out_of_range());
    }
    let truncated = index.trunc() as i64;
    let resolved = if truncated < 0 {
        len as i64 + truncated
    } else {
        truncated
    };
    usize::try_from(resolved)
        .ok()
        .filter(|position| *position < len)
        .ok_or_else(out_of_range)
}

fn apply_binary(op: BinaryOp, left: Value, right: Value) -> Result<Value, Error> {
    match op {
        BinaryOp::Or => Ok(if left.is_truthy() { left } else { right }),
        BinaryOp::And => Ok(if left.is_truthy() { right } else { left }),
        BinaryOp::Equal => Ok(Value::Bool(left == right)),
        BinaryOp::NotEqual => Ok(Value::Bool(left != right)),
        BinaryOp::Less | BinaryOp::LessOrEqual | BinaryOp::Greater | BinaryOp::GreaterOrEqual => {
            let (l, r) = numbers(op, &left, &right)?;
            Ok(Value::Bool(match op {
                BinaryOp::Less => l < r,
                BinaryOp::LessOrEqual => l <= r,
                BinaryOp::Greater => l > r,
                _ => l >= r,
            }))
        }
        BinaryOp::Add => match (&left, &right) {
            (Value::Number(l), Value::Number(r)) => Ok(Value::Number(l + r)),
            (Value::String(_) | Value::Number(_), Value::String(_) | Value::Number(_)) => {
                Ok(Value::String(format!("{left}{right}")))
            }
            _ => Err(operand_error(op, "numbers or strings", &left, &right)),
        },
        BinaryOp::Mul => match (&left, &right) {
            (Value::Number(l), Value::Number(r)) => Ok(Value::Number(l * r)),
            (Value::String(s), Value::Number(n)) | (Value::Number(n), Value::String(s)) => {
                repeat(s, *n).map(Value::String)
            }
            _ => Err(operand_error(op, "numbers, or a string and a number", &left, &right)),
        },
        BinaryOp::Sub | BinaryOp::Div | BinaryOp::FloorDiv | BinaryOp::Mod => {
            let (l, r) = numbers(op, &left, &right)?;
            Ok(Value::Number(match op {
                BinaryOp::Sub => l - r,
                BinaryOp::Div => l / r,
                BinaryOp::FloorDiv => (l / r).floor(),
                _ => l % r,
            }))
        }
    }
}

fn numbers(op: BinaryOp, left: &Value, right: &Value) -> Result<(f64, f64), Error> {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => Ok((*l, *r)),
        _ => Err(operand_error(op, "numbers", left, right)),
    }
}

fn operand_error(op: BinaryOp, expected: &str, left: &Value, right: &Value) -> Error {
    Error::type_mismatch(format!(
        "`{}` expects {expected}, got {} and {}",
        op.as_str(),
        left.type_name(),
        right.type_name()
    ))
}

/// Longest string `*` may produce, in bytes.
const MAX_REPEAT_LEN: usize = 1 << 26;

/// String repetition; the count is floored and must not be negative. A
/// result longer than [`MAX_REPEAT_LEN`] is a type error.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn repeat(s: &str, count: f64) -> Result<String, Error> {
    let count = count.floor();
    if !count.is_finite() || count < 0.0 {
        return Err(Error::type_mismatch(format!(
            "invalid string repeat count {}",
            format_number(count)
        )));
    }
    if s.is_empty() {
        return Ok(String::new());
    }
    let fits = count < usize::MAX as f64
        && s.len()
            .checked_mul(count as usize)
            .is_some_and(|len| len <= MAX_REPEAT_LEN);
    if !fits {
        return Err(Error::type_mismatch(format!(
            "string repeat count {} is too large",
            format_number(count)
        )));
    }
    Ok(s.repeat(count as usize))
}
