//! Operand stack operators.

use crate::error::{ErrorKind, OpResult, ps_error};
use crate::interpreter::Interpreter;
use crate::object::Object;

/// `any dup any any`
pub(crate) fn dup(interp: &mut Interpreter) -> OpResult {
    let obj = interp
        .operand_stack
        .last()
        .cloned()
        .ok_or_else(|| ps_error(ErrorKind::StackUnderflow, "dup: operand stack empty"))?;
    interp.push(obj)
}

/// `any pop -`
pub(crate) fn pop(interp: &mut Interpreter) -> OpResult {
    interp.pop_any("pop")?;
    Ok(())
}

/// `a b exch b a`
pub(crate) fn exch(interp: &mut Interpreter) -> OpResult {
    let b = interp.pop_any("exch")?;
    let a = interp.pop_any("exch")?;
    interp.push(b)?;
    interp.push(a)
}

/// `a1 .. an n copy a1 .. an a1 .. an`, or element-wise copy between two
/// composites of the same kind, returning the written prefix.
pub(crate) fn copy(interp: &mut Interpreter) -> OpResult {
    let top = interp.pop_any("copy")?;
    match top {
        Object::Integer(n) => {
            if n < 0 {
                return Err(ps_error(ErrorKind::RangeCheck, "copy: negative count"));
            }
            let n = n as usize;
            let len = interp.operand_stack.len();
            if n > len {
                return Err(ps_error(ErrorKind::StackUnderflow, "copy: not enough operands"));
            }
            for i in len - n..len {
                let obj = interp.operand_stack[i].clone();
                interp.push(obj)?;
            }
            Ok(())
        }
        Object::Array(dest) => {
            let src = interp.pop_array("copy")?;
            if src.len() > dest.len() {
                return Err(ps_error(ErrorKind::RangeCheck, "copy: destination too small"));
            }
            if !dest.write_at(0, &src.elements()) {
                return Err(ps_error(ErrorKind::RangeCheck, "copy: destination too small"));
            }
            let view = dest.interval(0, src.len()).expect("prefix in range");
            interp.push(Object::Array(view))
        }
        Object::String(dest) => {
            let src = interp.pop_string("copy")?;
            if !dest.write_at(0, &src.bytes()) {
                return Err(ps_error(ErrorKind::RangeCheck, "copy: destination too small"));
            }
            let view = dest.interval(0, src.len()).expect("prefix in range");
            interp.push(Object::String(view))
        }
        Object::Dict(dest) => {
            let src = interp.pop_dict("copy")?;
            for (key, value) in src.entries() {
                dest.insert(key, value);
            }
            interp.push(Object::Dict(dest))
        }
        other => Err(interp.type_error("copy", "integer or composite", &other)),
    }
}

/// `an .. a0 n index an .. a0 an`
pub(crate) fn index(interp: &mut Interpreter) -> OpResult {
    let n = interp.pop_integer("index")?;
    if n < 0 {
        return Err(ps_error(ErrorKind::RangeCheck, "index: negative index"));
    }
    let len = interp.operand_stack.len();
    if (n as usize) >= len {
        return Err(ps_error(ErrorKind::RangeCheck, "index: beyond stack bottom"));
    }
    let obj = interp.operand_stack[len - 1 - n as usize].clone();
    interp.push(obj)
}

/// `a(n-1) .. a0 n j roll` rotates the top `n` elements by `j` positions.
pub(crate) fn roll(interp: &mut Interpreter) -> OpResult {
    let j = interp.pop_integer("roll")?;
    let n = interp.pop_integer("roll")?;
    if n < 0 {
        return Err(ps_error(ErrorKind::RangeCheck, "roll: negative count"));
    }
    let n = n as usize;
    let len = interp.operand_stack.len();
    if n > len {
        return Err(ps_error(ErrorKind::StackUnderflow, "roll: not enough operands"));
    }
    if n == 0 {
        return Ok(());
    }
    let shift = j.rem_euclid(n as i64) as usize;
    interp.operand_stack[len - n..].rotate_right(shift);
    Ok(())
}

/// `mark mark` (also `[` and `<<`)
pub(crate) fn mark(interp: &mut Interpreter) -> OpResult {
    interp.push(Object::Mark)
}

/// `mark a1 .. an cleartomark -`
pub(crate) fn cleartomark(interp: &mut Interpreter) -> OpResult {
    match interp.operand_stack.iter().rposition(Object::is_mark) {
        Some(pos) => {
            interp.operand_stack.truncate(pos);
            Ok(())
        }
        None => Err(ps_error(ErrorKind::UnmatchedMark, "cleartomark: no mark on stack")),
    }
}

/// `count n`
pub(crate) fn count(interp: &mut Interpreter) -> OpResult {
    let n = interp.operand_stack.len() as i64;
    interp.push(Object::Integer(n))
}

/// `mark a1 .. an counttomark n`
pub(crate) fn counttomark(interp: &mut Interpreter) -> OpResult {
    match interp.operand_stack.iter().rposition(Object::is_mark) {
        Some(pos) => {
            let n = (interp.operand_stack.len() - pos - 1) as i64;
            interp.push(Object::Integer(n))
        }
        None => Err(ps_error(ErrorKind::UnmatchedMark, "counttomark: no mark on stack")),
    }
}

/// `a1 .. an clear -`
pub(crate) fn clear(interp: &mut Interpreter) -> OpResult {
    interp.operand_stack.clear();
    Ok(())
}

/// Pop every object above the topmost mark, and the mark itself.
/// Returns the objects in bottom-to-top (source) order.
pub(crate) fn collect_to_mark(
    interp: &mut Interpreter,
    op: &str,
) -> Result<Vec<Object>, crate::error::Interrupted> {
    match interp.operand_stack.iter().rposition(Object::is_mark) {
        Some(pos) => {
            let items = interp.operand_stack.split_off(pos + 1);
            interp.operand_stack.pop();
            Ok(items)
        }
        None => Err(ps_error(
            ErrorKind::UnmatchedMark,
            format!("{}: no mark on stack", op),
        )),
    }
}
