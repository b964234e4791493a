//! File operators.
//!
//! The only file object this interpreter knows is the current input file:
//! font programs read their own binary sections through `currentfile`.

use crate::error::{Interrupted, OpResult};
use crate::interpreter::Interpreter;
use crate::object::Object;

/// `currentfile file`
pub(crate) fn currentfile(interp: &mut Interpreter) -> OpResult {
    interp.push(Object::File)
}

/// `file closefile -`
///
/// Closing the current file inside an `eexec` section ends decryption; the
/// scanner resumes on the plain bytes that follow the encrypted region.
pub(crate) fn closefile(interp: &mut Interpreter) -> OpResult {
    match interp.pop_any("closefile")? {
        Object::File => {
            interp.current_scanner()?.end_eexec();
            Ok(())
        }
        other => Err(interp.type_error("closefile", "file", &other)),
    }
}

/// `file eexec -` switches the scanner into decryption mode.
pub(crate) fn eexec(interp: &mut Interpreter) -> OpResult {
    match interp.pop_any("eexec")? {
        Object::File => {
            interp
                .current_scanner()?
                .begin_eexec()
                .map_err(Interrupted::Error)
        }
        other => Err(interp.type_error("eexec", "file", &other)),
    }
}

/// `file string readstring substring bool`
///
/// Consumes the single delimiter byte after the operator, then fills the
/// string from the (possibly decrypted) input. The boolean reports whether
/// the string was filled completely.
pub(crate) fn readstring(interp: &mut Interpreter) -> OpResult {
    let target = interp.pop_string("readstring")?;
    match interp.pop_any("readstring")? {
        Object::File => {}
        other => return Err(interp.type_error("readstring", "file", &other)),
    }
    let wanted = target.len();
    let bytes = {
        let scanner = interp.current_scanner()?;
        scanner.skip_byte().map_err(Interrupted::Error)?;
        scanner.read_bytes(wanted).map_err(Interrupted::Error)?
    };
    target.write_at(0, &bytes);
    if bytes.len() == wanted {
        interp.push(Object::String(target))?;
        interp.push(Object::Boolean(true))
    } else {
        let partial = target.interval(0, bytes.len()).expect("prefix in range");
        interp.push(Object::String(partial))?;
        interp.push(Object::Boolean(false))
    }
}
