//! Built-in functions.
//!
//! Operator syntax is sugar: the compiler pushes one of these native
//! function values and emits the same apply step used for explicit calls.

use rill_ir::{BinaryOp, UnaryOp};
use rill_value::exception::{missing_input, type_mismatch};
use rill_value::{EvalResult, Value};

/// The native function value an operator desugars to.
pub fn binary_native(op: BinaryOp) -> Value {
    let f = match op {
        BinaryOp::Add => add,
        BinaryOp::Sub => sub,
        BinaryOp::Mul => mul,
        BinaryOp::Div => div,
        BinaryOp::Rem => rem,
        BinaryOp::Lt => lt,
        BinaryOp::Le => le,
        BinaryOp::Gt => gt,
        BinaryOp::Ge => ge,
        BinaryOp::Eq => eq,
        BinaryOp::Ne => ne,
        BinaryOp::And => and,
        BinaryOp::Or => or,
    };
    Value::native(f, op.label())
}

/// The native function value a unary operator desugars to.
pub fn unary_native(op: UnaryOp) -> Value {
    match op {
        UnaryOp::Neg => Value::native(neg, op.label()),
        UnaryOp::Not => Value::native(not, op.label()),
    }
}

fn two<'a>(args: &'a [Value], name: &str) -> Result<(&'a Value, &'a Value), rill_value::Exception> {
    match args {
        [a, b] => Ok((a, b)),
        _ => Err(missing_input(name)),
    }
}

fn one<'a>(args: &'a [Value], name: &str) -> Result<&'a Value, rill_value::Exception> {
    match args {
        [a] => Ok(a),
        _ => Err(missing_input(name)),
    }
}

fn add(args: &[Value]) -> EvalResult {
    let (a, b) = two(args, "+")?;
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => Ok(Value::Number(x.try_add(y)?)),
        (Value::Text(x), Value::Text(y)) => {
            let mut s = (**x).clone();
            s.push_str(y);
            Ok(Value::text(s))
        }
        (Value::List(x), Value::List(y)) => {
            let mut items = (**x).clone();
            items.extend(y.iter().cloned());
            Ok(Value::list(items))
        }
        _ => Err(type_mismatch(a.kind_label(), b.kind_label())),
    }
}

fn sub(args: &[Value]) -> EvalResult {
    let (a, b) = two(args, "-")?;
    numeric(a, b, NumberValueOp::Sub)
}

fn mul(args: &[Value]) -> EvalResult {
    let (a, b) = two(args, "*")?;
    numeric(a, b, NumberValueOp::Mul)
}

fn div(args: &[Value]) -> EvalResult {
    let (a, b) = two(args, "/")?;
    numeric(a, b, NumberValueOp::Div)
}

fn rem(args: &[Value]) -> EvalResult {
    let (a, b) = two(args, "%")?;
    numeric(a, b, NumberValueOp::Rem)
}

enum NumberValueOp {
    Sub,
    Mul,
    Div,
    Rem,
}

fn numeric(a: &Value, b: &Value, op: NumberValueOp) -> EvalResult {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let n = match op {
                NumberValueOp::Sub => x.try_sub(y)?,
                NumberValueOp::Mul => x.try_mul(y)?,
                NumberValueOp::Div => x.try_div(y)?,
                NumberValueOp::Rem => x.try_rem(y)?,
            };
            Ok(Value::Number(n))
        }
        (Value::Number(_), other) | (other, _) => {
            Err(type_mismatch("number", other.kind_label()))
        }
    }
}

fn compare(args: &[Value], name: &str) -> Result<std::cmp::Ordering, rill_value::Exception> {
    let (a, b) = two(args, name)?;
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.try_compare(y),
        (Value::Text(x), Value::Text(y)) => Ok(x.as_str().cmp(y.as_str())),
        (_, other) => Err(type_mismatch(a.kind_label(), other.kind_label())),
    }
}

fn lt(args: &[Value]) -> EvalResult {
    Ok(Value::bool(compare(args, "<")?.is_lt()))
}

fn le(args: &[Value]) -> EvalResult {
    Ok(Value::bool(compare(args, "<=")?.is_le()))
}

fn gt(args: &[Value]) -> EvalResult {
    Ok(Value::bool(compare(args, ">")?.is_gt()))
}

fn ge(args: &[Value]) -> EvalResult {
    Ok(Value::bool(compare(args, ">=")?.is_ge()))
}

fn eq(args: &[Value]) -> EvalResult {
    let (a, b) = two(args, "=")?;
    Ok(Value::bool(a == b))
}

fn ne(args: &[Value]) -> EvalResult {
    let (a, b) = two(args, "!=")?;
    Ok(Value::bool(a != b))
}

fn and(args: &[Value]) -> EvalResult {
    let (a, b) = two(args, "&")?;
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => Ok(Value::bool(*x && *y)),
        (Value::Bool(_), other) | (other, _) => Err(type_mismatch("boolean", other.kind_label())),
    }
}

fn or(args: &[Value]) -> EvalResult {
    let (a, b) = two(args, "|")?;
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => Ok(Value::bool(*x || *y)),
        (Value::Bool(_), other) | (other, _) => Err(type_mismatch("boolean", other.kind_label())),
    }
}

fn neg(args: &[Value]) -> EvalResult {
    match one(args, "-")? {
        Value::Number(n) => Ok(Value::Number(n.neg())),
        other => Err(type_mismatch("number", other.kind_label())),
    }
}

fn not(args: &[Value]) -> EvalResult {
    match one(args, "~")? {
        Value::Bool(b) => Ok(Value::bool(!b)),
        other => Err(type_mismatch("boolean", other.kind_label())),
    }
}
