//! Arithmetic operators.
//!
//! Integer arithmetic promotes to Real on 64-bit overflow. Results that are
//! not finite (division by zero, domain errors) raise `undefinedresult`, so
//! NaN and infinity never land on the operand stack.

use crate::error::{ErrorKind, Interrupted, OpResult, ps_error};
use crate::interpreter::Interpreter;
use crate::object::Object;

/// The two operands of a binary numeric operator.
enum Operands {
    Integers(i64, i64),
    Reals(f64, f64),
}

fn pop_pair(interp: &mut Interpreter, op: &str) -> Result<Operands, Interrupted> {
    let b = interp.pop_any(op)?;
    let a = interp.pop_any(op)?;
    match (&a, &b) {
        (Object::Integer(x), Object::Integer(y)) => Ok(Operands::Integers(*x, *y)),
        _ => {
            let x = a.as_number().ok_or_else(|| interp.type_error(op, "number", &a))?;
            let y = b.as_number().ok_or_else(|| interp.type_error(op, "number", &b))?;
            Ok(Operands::Reals(x, y))
        }
    }
}

/// Push a real, rejecting non-finite results.
fn push_real(interp: &mut Interpreter, op: &str, value: f64) -> OpResult {
    if !value.is_finite() {
        return Err(ps_error(
            ErrorKind::UndefinedResult,
            format!("{}: result is not a finite number", op),
        ));
    }
    interp.push(Object::Real(value))
}

pub(crate) fn add(interp: &mut Interpreter) -> OpResult {
    match pop_pair(interp, "add")? {
        Operands::Integers(a, b) => match a.checked_add(b) {
            Some(sum) => interp.push(Object::Integer(sum)),
            None => push_real(interp, "add", a as f64 + b as f64),
        },
        Operands::Reals(a, b) => push_real(interp, "add", a + b),
    }
}

pub(crate) fn sub(interp: &mut Interpreter) -> OpResult {
    match pop_pair(interp, "sub")? {
        Operands::Integers(a, b) => match a.checked_sub(b) {
            Some(diff) => interp.push(Object::Integer(diff)),
            None => push_real(interp, "sub", a as f64 - b as f64),
        },
        Operands::Reals(a, b) => push_real(interp, "sub", a - b),
    }
}

pub(crate) fn mul(interp: &mut Interpreter) -> OpResult {
    match pop_pair(interp, "mul")? {
        Operands::Integers(a, b) => match a.checked_mul(b) {
            Some(prod) => interp.push(Object::Integer(prod)),
            None => push_real(interp, "mul", a as f64 * b as f64),
        },
        Operands::Reals(a, b) => push_real(interp, "mul", a * b),
    }
}

/// `div` is always real.
pub(crate) fn div(interp: &mut Interpreter) -> OpResult {
    let (a, b) = match pop_pair(interp, "div")? {
        Operands::Integers(a, b) => (a as f64, b as f64),
        Operands::Reals(a, b) => (a, b),
    };
    push_real(interp, "div", a / b)
}

pub(crate) fn idiv(interp: &mut Interpreter) -> OpResult {
    let b = interp.pop_integer("idiv")?;
    let a = interp.pop_integer("idiv")?;
    match a.checked_div(b) {
        Some(q) => interp.push(Object::Integer(q)),
        None => Err(ps_error(ErrorKind::UndefinedResult, "idiv: division by zero")),
    }
}

pub(crate) fn mod_(interp: &mut Interpreter) -> OpResult {
    let b = interp.pop_integer("mod")?;
    let a = interp.pop_integer("mod")?;
    match a.checked_rem(b) {
        Some(r) => interp.push(Object::Integer(r)),
        None => Err(ps_error(ErrorKind::UndefinedResult, "mod: division by zero")),
    }
}

pub(crate) fn neg(interp: &mut Interpreter) -> OpResult {
    match interp.pop_any("neg")? {
        Object::Integer(i) => match i.checked_neg() {
            Some(n) => interp.push(Object::Integer(n)),
            None => interp.push(Object::Real(-(i as f64))),
        },
        Object::Real(r) => interp.push(Object::Real(-r)),
        other => Err(interp.type_error("neg", "number", &other)),
    }
}

pub(crate) fn abs(interp: &mut Interpreter) -> OpResult {
    match interp.pop_any("abs")? {
        Object::Integer(i) => match i.checked_abs() {
            Some(n) => interp.push(Object::Integer(n)),
            None => interp.push(Object::Real(-(i as f64))),
        },
        Object::Real(r) => interp.push(Object::Real(r.abs())),
        other => Err(interp.type_error("abs", "number", &other)),
    }
}

fn rounding(
    interp: &mut Interpreter,
    op: &'static str,
    f: impl Fn(f64) -> f64,
) -> OpResult {
    match interp.pop_any(op)? {
        obj @ Object::Integer(_) => interp.push(obj),
        Object::Real(r) => interp.push(Object::Real(f(r))),
        other => Err(interp.type_error(op, "number", &other)),
    }
}

pub(crate) fn ceiling(interp: &mut Interpreter) -> OpResult {
    rounding(interp, "ceiling", f64::ceil)
}

pub(crate) fn floor(interp: &mut Interpreter) -> OpResult {
    rounding(interp, "floor", f64::floor)
}

/// Half-integers round to the greater integer.
pub(crate) fn round(interp: &mut Interpreter) -> OpResult {
    rounding(interp, "round", |r| (r + 0.5).floor())
}

pub(crate) fn truncate(interp: &mut Interpreter) -> OpResult {
    rounding(interp, "truncate", f64::trunc)
}

pub(crate) fn sqrt(interp: &mut Interpreter) -> OpResult {
    let x = interp.pop_number("sqrt")?;
    if x < 0.0 {
        return Err(ps_error(ErrorKind::RangeCheck, "sqrt: negative operand"));
    }
    push_real(interp, "sqrt", x.sqrt())
}

/// `base exponent exp base^exponent`
pub(crate) fn exp(interp: &mut Interpreter) -> OpResult {
    let exponent = interp.pop_number("exp")?;
    let base = interp.pop_number("exp")?;
    push_real(interp, "exp", base.powf(exponent))
}

pub(crate) fn ln(interp: &mut Interpreter) -> OpResult {
    let x = interp.pop_number("ln")?;
    if x <= 0.0 {
        return Err(ps_error(ErrorKind::RangeCheck, "ln: operand not positive"));
    }
    push_real(interp, "ln", x.ln())
}

pub(crate) fn log(interp: &mut Interpreter) -> OpResult {
    let x = interp.pop_number("log")?;
    if x <= 0.0 {
        return Err(ps_error(ErrorKind::RangeCheck, "log: operand not positive"));
    }
    push_real(interp, "log", x.log10())
}

pub(crate) fn sin(interp: &mut Interpreter) -> OpResult {
    let x = interp.pop_number("sin")?;
    push_real(interp, "sin", x.to_radians().sin())
}

pub(crate) fn cos(interp: &mut Interpreter) -> OpResult {
    let x = interp.pop_number("cos")?;
    push_real(interp, "cos", x.to_radians().cos())
}

/// `num den atan angle` in degrees, normalized to [0, 360).
pub(crate) fn atan(interp: &mut Interpreter) -> OpResult {
    let den = interp.pop_number("atan")?;
    let num = interp.pop_number("atan")?;
    if num == 0.0 && den == 0.0 {
        return Err(ps_error(ErrorKind::UndefinedResult, "atan: both operands zero"));
    }
    let mut degrees = num.atan2(den).to_degrees();
    if degrees < 0.0 {
        degrees += 360.0;
    }
    push_real(interp, "atan", degrees)
}
