//! Bitwise, logical and relational operators.

use crate::error::{ErrorKind, Interrupted, OpResult, ps_error};
use crate::interpreter::Interpreter;
use crate::object::Object;

fn bitwise_or_boolean(
    interp: &mut Interpreter,
    op: &str,
    ints: impl Fn(i64, i64) -> i64,
    bools: impl Fn(bool, bool) -> bool,
) -> OpResult {
    let b = interp.pop_any(op)?;
    let a = interp.pop_any(op)?;
    match (&a, &b) {
        (Object::Integer(x), Object::Integer(y)) => interp.push(Object::Integer(ints(*x, *y))),
        (Object::Boolean(x), Object::Boolean(y)) => interp.push(Object::Boolean(bools(*x, *y))),
        _ => Err(interp.type_error(op, "two integers or two booleans", &a)),
    }
}

pub(crate) fn and(interp: &mut Interpreter) -> OpResult {
    bitwise_or_boolean(interp, "and", |a, b| a & b, |a, b| a && b)
}

pub(crate) fn or(interp: &mut Interpreter) -> OpResult {
    bitwise_or_boolean(interp, "or", |a, b| a | b, |a, b| a || b)
}

pub(crate) fn xor(interp: &mut Interpreter) -> OpResult {
    bitwise_or_boolean(interp, "xor", |a, b| a ^ b, |a, b| a != b)
}

pub(crate) fn not(interp: &mut Interpreter) -> OpResult {
    match interp.pop_any("not")? {
        Object::Boolean(b) => interp.push(Object::Boolean(!b)),
        Object::Integer(i) => interp.push(Object::Integer(!i)),
        other => Err(interp.type_error("not", "boolean or integer", &other)),
    }
}

/// `value shift bitshift`: positive shifts left, negative shifts right
/// (arithmetic).
pub(crate) fn bitshift(interp: &mut Interpreter) -> OpResult {
    let shift = interp.pop_integer("bitshift")?;
    let value = interp.pop_integer("bitshift")?;
    let result = if shift >= 64 {
        0
    } else if shift >= 0 {
        ((value as u64) << shift) as i64
    } else if shift <= -64 {
        if value < 0 {
            -1
        } else {
            0
        }
    } else {
        value >> (-shift)
    };
    interp.push(Object::Integer(result))
}

pub(crate) fn eq(interp: &mut Interpreter) -> OpResult {
    let b = interp.pop_any("eq")?;
    let a = interp.pop_any("eq")?;
    interp.push(Object::Boolean(a.ps_eq(&b)))
}

pub(crate) fn ne(interp: &mut Interpreter) -> OpResult {
    let b = interp.pop_any("ne")?;
    let a = interp.pop_any("ne")?;
    interp.push(Object::Boolean(!a.ps_eq(&b)))
}

/// Numeric comparison with Integer/Real promotion, or byte-lexicographic
/// comparison of two strings.
fn compare(interp: &mut Interpreter, op: &str) -> Result<std::cmp::Ordering, Interrupted> {
    let b = interp.pop_any(op)?;
    let a = interp.pop_any(op)?;
    match (&a, &b) {
        (Object::String(x), Object::String(y)) => Ok(x.bytes().cmp(&y.bytes())),
        _ => {
            let x = a.as_number().ok_or_else(|| interp.type_error(op, "number or string", &a))?;
            let y = b.as_number().ok_or_else(|| interp.type_error(op, "number or string", &b))?;
            x.partial_cmp(&y).ok_or_else(|| {
                ps_error(ErrorKind::UndefinedResult, format!("{}: unordered operands", op))
            })
        }
    }
}

pub(crate) fn lt(interp: &mut Interpreter) -> OpResult {
    let ord = compare(interp, "lt")?;
    interp.push(Object::Boolean(ord.is_lt()))
}

pub(crate) fn le(interp: &mut Interpreter) -> OpResult {
    let ord = compare(interp, "le")?;
    interp.push(Object::Boolean(ord.is_le()))
}

pub(crate) fn gt(interp: &mut Interpreter) -> OpResult {
    let ord = compare(interp, "gt")?;
    interp.push(Object::Boolean(ord.is_gt()))
}

pub(crate) fn ge(interp: &mut Interpreter) -> OpResult {
    let ord = compare(interp, "ge")?;
    interp.push(Object::Boolean(ord.is_ge()))
}
