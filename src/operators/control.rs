//! Control-flow operators.
//!
//! `exit` and `stop` unwind as interrupts. Each loop construct consumes the
//! `exit` of its own body; `repeat` additionally consumes `stop`. Loop
//! iterations are charged against the execution budget so that an empty body
//! cannot spin forever.

use crate::error::{ErrorKind, Interrupted, OpResult, ps_error};
use crate::interpreter::Interpreter;
use crate::object::Object;

/// `any exec -` executes the object.
pub(crate) fn exec(interp: &mut Interpreter) -> OpResult {
    match interp.pop_any("exec")? {
        Object::Procedure(p) => interp.run_procedure(&p),
        other => interp.execute_object(other),
    }
}

/// `bool proc if -`
pub(crate) fn if_(interp: &mut Interpreter) -> OpResult {
    let proc = interp.pop_procedure("if")?;
    let cond = interp.pop_bool("if")?;
    if cond {
        interp.run_procedure(&proc)
    } else {
        Ok(())
    }
}

/// `bool proc1 proc2 ifelse -`
pub(crate) fn ifelse(interp: &mut Interpreter) -> OpResult {
    let proc2 = interp.pop_procedure("ifelse")?;
    let proc1 = interp.pop_procedure("ifelse")?;
    let cond = interp.pop_bool("ifelse")?;
    if cond {
        interp.run_procedure(&proc1)
    } else {
        interp.run_procedure(&proc2)
    }
}

/// `initial increment limit proc for -`
///
/// The control value stays an integer when all three bounds are integers.
pub(crate) fn for_(interp: &mut Interpreter) -> OpResult {
    let proc = interp.pop_procedure("for")?;
    let limit = interp.pop_any("for")?;
    let increment = interp.pop_any("for")?;
    let initial = interp.pop_any("for")?;

    let integral = matches!(
        (&initial, &increment, &limit),
        (Object::Integer(_), Object::Integer(_), Object::Integer(_))
    );
    let limit = limit
        .as_number()
        .ok_or_else(|| interp.type_error("for", "number", &limit))?;
    let increment = increment
        .as_number()
        .ok_or_else(|| interp.type_error("for", "number", &increment))?;
    let mut control = initial
        .as_number()
        .ok_or_else(|| interp.type_error("for", "number", &initial))?;

    loop {
        if increment >= 0.0 {
            if control > limit {
                break;
            }
        } else if control < limit {
            break;
        }
        interp.count_op()?;
        let value = if integral {
            Object::Integer(control as i64)
        } else {
            Object::Real(control)
        };
        interp.push(value)?;
        match interp.run_procedure(&proc) {
            Ok(()) => {}
            Err(Interrupted::Exit) => return Ok(()),
            Err(other) => return Err(other),
        }
        control += increment;
    }
    Ok(())
}

/// `n proc repeat -`
pub(crate) fn repeat(interp: &mut Interpreter) -> OpResult {
    let proc = interp.pop_procedure("repeat")?;
    let n = interp.pop_integer("repeat")?;
    if n < 0 {
        return Err(ps_error(ErrorKind::RangeCheck, "repeat: negative count"));
    }
    for _ in 0..n {
        interp.count_op()?;
        match interp.run_procedure(&proc) {
            Ok(()) => {}
            Err(Interrupted::Exit) | Err(Interrupted::Stop) => return Ok(()),
            Err(other) => return Err(other),
        }
    }
    Ok(())
}

/// `proc loop -` repeats until `exit`.
pub(crate) fn loop_(interp: &mut Interpreter) -> OpResult {
    let proc = interp.pop_procedure("loop")?;
    loop {
        interp.count_op()?;
        match interp.run_procedure(&proc) {
            Ok(()) => {}
            Err(Interrupted::Exit) => return Ok(()),
            Err(other) => return Err(other),
        }
    }
}

/// `exit` unwinds to the nearest enclosing loop.
pub(crate) fn exit(_interp: &mut Interpreter) -> OpResult {
    Err(Interrupted::Exit)
}

/// `stop` unwinds to the nearest consumer (an error handler, `repeat`, or
/// the top level).
pub(crate) fn stop(_interp: &mut Interpreter) -> OpResult {
    Err(Interrupted::Stop)
}
