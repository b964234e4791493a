//! Type inspection and conversion operators.

use crate::error::{ErrorKind, OpResult, ps_error};
use crate::interpreter::Interpreter;
use crate::object::{Name, Object};

/// `any type name`
pub(crate) fn type_(interp: &mut Interpreter) -> OpResult {
    let obj = interp.pop_any("type")?;
    interp.push(Object::Operator(Name::new(obj.type_name())))
}

/// Parse a string operand as a number.
fn parse_numeric(op: &str, text: &str) -> Result<f64, crate::error::Interrupted> {
    let text = text.trim();
    text.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| {
            ps_error(
                ErrorKind::SyntaxError,
                format!("{}: cannot parse {:?} as a number", op, text),
            )
        })
}

/// Truncate a real to an integer, rejecting out-of-range values.
fn real_to_int(op: &str, r: f64) -> Result<i64, crate::error::Interrupted> {
    let t = r.trunc();
    if t < i64::MIN as f64 || t > i64::MAX as f64 {
        return Err(ps_error(
            ErrorKind::RangeCheck,
            format!("{}: value out of integer range", op),
        ));
    }
    Ok(t as i64)
}

/// `num cvi int` (strings are parsed first)
pub(crate) fn cvi(interp: &mut Interpreter) -> OpResult {
    match interp.pop_any("cvi")? {
        obj @ Object::Integer(_) => interp.push(obj),
        Object::Real(r) => {
            let i = real_to_int("cvi", r)?;
            interp.push(Object::Integer(i))
        }
        Object::String(s) => {
            let v = parse_numeric("cvi", &s.to_utf8_lossy())?;
            let i = real_to_int("cvi", v)?;
            interp.push(Object::Integer(i))
        }
        other => Err(interp.type_error("cvi", "number or string", &other)),
    }
}

/// `num cvr real`
pub(crate) fn cvr(interp: &mut Interpreter) -> OpResult {
    match interp.pop_any("cvr")? {
        Object::Integer(i) => interp.push(Object::Real(i as f64)),
        obj @ Object::Real(_) => interp.push(obj),
        Object::String(s) => {
            let v = parse_numeric("cvr", &s.to_utf8_lossy())?;
            interp.push(Object::Real(v))
        }
        other => Err(interp.type_error("cvr", "number or string", &other)),
    }
}

/// `any cvx any` marks the object executable. Arrays become procedures over
/// the same storage; literal names become executable names.
pub(crate) fn cvx(interp: &mut Interpreter) -> OpResult {
    let obj = match interp.pop_any("cvx")? {
        Object::Array(a) => Object::Procedure(a),
        Object::Name(n) => Object::Operator(n),
        other => other,
    };
    interp.push(obj)
}

/// `string cvn name`
pub(crate) fn cvn(interp: &mut Interpreter) -> OpResult {
    let s = interp.pop_string("cvn")?;
    interp.push(Object::Name(Name::new(s.to_utf8_lossy())))
}

/// `any string cvs substring` writes a text representation of the value
/// into the string and returns the written prefix.
pub(crate) fn cvs(interp: &mut Interpreter) -> OpResult {
    let target = interp.pop_string("cvs")?;
    let value = interp.pop_any("cvs")?;
    let text = match &value {
        Object::Integer(i) => i.to_string(),
        Object::Real(r) => r.to_string(),
        Object::Boolean(b) => b.to_string(),
        Object::Name(n) | Object::Operator(n) => n.as_str().to_string(),
        Object::String(s) => s.to_utf8_lossy(),
        _ => "--nostringval--".to_string(),
    };
    if !target.write_at(0, text.as_bytes()) {
        return Err(ps_error(
            ErrorKind::RangeCheck,
            "cvs: string too small for representation",
        ));
    }
    let view = target.interval(0, text.len()).expect("prefix in range");
    interp.push(Object::String(view))
}
