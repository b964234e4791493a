//! Binding, access attributes, and odds and ends.

use crate::error::{ErrorKind, OpResult, ps_error};
use crate::interpreter::Interpreter;
use crate::object::{Object, PsArray};

/// The passcode accepted by `internaldict`.
const INTERNALDICT_PASSCODE: i64 = 1183615869;

/// `proc bind proc` replaces operator names that resolve to native
/// operators with the operators themselves, recursing into nested
/// procedures.
///
/// Each slot is nulled while its subtree is bound, so a procedure that
/// reaches itself (directly or through mutual references) terminates: the
/// nulled slot is invisible to the recursive walk.
pub(crate) fn bind(interp: &mut Interpreter) -> OpResult {
    let proc = interp.pop_procedure("bind")?;
    bind_array(interp, &proc);
    interp.push(Object::Procedure(proc))
}

fn bind_array(interp: &mut Interpreter, arr: &PsArray) {
    for i in 0..arr.len() {
        match arr.get(i).expect("slot in range") {
            Object::Operator(name) => {
                if let Some(Object::Builtin(b)) = interp.lookup(name.as_str()) {
                    arr.put(i, Object::Builtin(b));
                }
            }
            Object::Procedure(nested) => {
                arr.put(i, Object::Null);
                bind_array(interp, &nested);
                arr.put(i, Object::Procedure(nested));
            }
            _ => {}
        }
    }
}

fn access_attribute(interp: &mut Interpreter, op: &str) -> OpResult {
    // Access attributes are accepted but not enforced; the operand is
    // handed back unchanged.
    if interp.operand_stack.is_empty() {
        return Err(ps_error(
            ErrorKind::StackUnderflow,
            format!("{}: operand stack empty", op),
        ));
    }
    Ok(())
}

/// `obj executeonly obj`
pub(crate) fn executeonly(interp: &mut Interpreter) -> OpResult {
    access_attribute(interp, "executeonly")
}

/// `obj noaccess obj`
pub(crate) fn noaccess(interp: &mut Interpreter) -> OpResult {
    access_attribute(interp, "noaccess")
}

/// `obj readonly obj`
pub(crate) fn readonly(interp: &mut Interpreter) -> OpResult {
    access_attribute(interp, "readonly")
}

/// `matrix [1.0 0.0 0.0 1.0 0.0 0.0]`
pub(crate) fn matrix(interp: &mut Interpreter) -> OpResult {
    let identity = vec![
        Object::Real(1.0),
        Object::Real(0.0),
        Object::Real(0.0),
        Object::Real(1.0),
        Object::Real(0.0),
        Object::Real(0.0),
    ];
    interp.push(Object::Array(PsArray::new(identity)))
}

/// `passcode internaldict dict`
pub(crate) fn internaldict(interp: &mut Interpreter) -> OpResult {
    let passcode = interp.pop_integer("internaldict")?;
    if passcode != INTERNALDICT_PASSCODE {
        return Err(ps_error(ErrorKind::InvalidAccess, "internaldict: wrong passcode"));
    }
    let d = interp.internal_dict();
    interp.push(Object::Dict(d))
}

/// `save save-token`
///
/// VM snapshots are not implemented; font prologues only mention `restore`
/// on re-definition paths that never run on first load. The token is an
/// inert placeholder.
pub(crate) fn save(interp: &mut Interpreter) -> OpResult {
    interp.push(Object::Null)
}

/// `save-token restore -`
pub(crate) fn restore(interp: &mut Interpreter) -> OpResult {
    interp.pop_any("restore")?;
    Ok(())
}
