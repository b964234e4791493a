//! Composite-object operators: arrays, strings, and the polymorphic access
//! operators shared with dictionaries.

use crate::error::{ErrorKind, Interrupted, OpResult, ps_error};
use crate::interpreter::Interpreter;
use crate::object::{
    MAX_COMPOSITE_LEN, MAX_DICT_LEN, Name, Object, PsArray, PsDict, PsString,
};
use crate::operators::stack::collect_to_mark;

fn composite_size(op: &str, n: i64) -> Result<usize, Interrupted> {
    if n < 0 {
        return Err(ps_error(ErrorKind::RangeCheck, format!("{}: negative length", op)));
    }
    if n as usize > MAX_COMPOSITE_LEN {
        return Err(ps_error(ErrorKind::LimitCheck, format!("{}: length above 65536", op)));
    }
    Ok(n as usize)
}

/// `n array array`
pub(crate) fn array(interp: &mut Interpreter) -> OpResult {
    let n = interp.pop_integer("array")?;
    let n = composite_size("array", n)?;
    interp.push(Object::Array(PsArray::with_len(n)))
}

/// `n string string`
pub(crate) fn string(interp: &mut Interpreter) -> OpResult {
    let n = interp.pop_integer("string")?;
    let n = composite_size("string", n)?;
    interp.push(Object::String(PsString::with_len(n)))
}

/// `composite length n`
pub(crate) fn length(interp: &mut Interpreter) -> OpResult {
    let n = match interp.pop_any("length")? {
        Object::Array(a) | Object::Procedure(a) => a.len(),
        Object::String(s) => s.len(),
        Object::Dict(d) => d.len(),
        Object::Name(n) | Object::Operator(n) => n.as_str().len(),
        other => return Err(interp.type_error("length", "composite", &other)),
    };
    interp.push(Object::Integer(n as i64))
}

fn array_index(op: &str, key: &Object, len: usize) -> Result<usize, Interrupted> {
    let i = key
        .as_integer()
        .ok_or_else(|| ps_error(ErrorKind::TypeCheck, format!("{}: index must be an integer", op)))?;
    if i < 0 || i as usize >= len {
        return Err(ps_error(ErrorKind::RangeCheck, format!("{}: index {} out of range", op, i)));
    }
    Ok(i as usize)
}

fn dict_key(op: &str, key: Object) -> Result<Name, Interrupted> {
    match key {
        Object::Name(n) | Object::Operator(n) => Ok(n),
        Object::String(s) => Ok(Name::new(s.to_utf8_lossy())),
        other => Err(ps_error(
            ErrorKind::TypeCheck,
            format!("{}: dictionary key must be a name, got {}", op, other.type_name()),
        )),
    }
}

/// `array|dict|string key get any`
pub(crate) fn get(interp: &mut Interpreter) -> OpResult {
    let key = interp.pop_any("get")?;
    match interp.pop_any("get")? {
        Object::Array(a) | Object::Procedure(a) => {
            let i = array_index("get", &key, a.len())?;
            let obj = a.get(i).expect("index checked");
            interp.push(obj)
        }
        Object::String(s) => {
            let i = array_index("get", &key, s.len())?;
            let b = s.get(i).expect("index checked");
            interp.push(Object::Integer(b as i64))
        }
        Object::Dict(d) => {
            let name = dict_key("get", key)?;
            match d.get(name.as_str()) {
                Some(obj) => interp.push(obj),
                None => Err(ps_error(
                    ErrorKind::Undefined,
                    format!("get: key /{} not found", name),
                )),
            }
        }
        other => Err(interp.type_error("get", "array, dict or string", &other)),
    }
}

/// `array|dict|string key value put -`
pub(crate) fn put(interp: &mut Interpreter) -> OpResult {
    let value = interp.pop_any("put")?;
    let key = interp.pop_any("put")?;
    match interp.pop_any("put")? {
        Object::Array(a) | Object::Procedure(a) => {
            let i = array_index("put", &key, a.len())?;
            a.put(i, value);
            Ok(())
        }
        Object::String(s) => {
            let i = array_index("put", &key, s.len())?;
            let byte = value
                .as_integer()
                .ok_or_else(|| interp.type_error("put", "integer", &value))?;
            if !(0..=255).contains(&byte) {
                return Err(ps_error(ErrorKind::RangeCheck, "put: byte value out of range"));
            }
            s.put(i, byte as u8);
            Ok(())
        }
        Object::Dict(d) => {
            let name = dict_key("put", key)?;
            if !d.contains_key(name.as_str()) && d.len() >= MAX_DICT_LEN {
                return Err(ps_error(ErrorKind::DictFull, "put: dictionary is full"));
            }
            d.insert(name, value);
            Ok(())
        }
        other => Err(interp.type_error("put", "array, dict or string", &other)),
    }
}

/// `array|string index count getinterval subview`
pub(crate) fn getinterval(interp: &mut Interpreter) -> OpResult {
    let count = interp.pop_integer("getinterval")?;
    let index = interp.pop_integer("getinterval")?;
    if count < 0 || index < 0 {
        return Err(ps_error(ErrorKind::RangeCheck, "getinterval: negative operand"));
    }
    match interp.pop_any("getinterval")? {
        Object::Array(a) => match a.interval(index as usize, count as usize) {
            Some(sub) => interp.push(Object::Array(sub)),
            None => Err(ps_error(ErrorKind::RangeCheck, "getinterval: interval out of range")),
        },
        Object::Procedure(a) => match a.interval(index as usize, count as usize) {
            Some(sub) => interp.push(Object::Procedure(sub)),
            None => Err(ps_error(ErrorKind::RangeCheck, "getinterval: interval out of range")),
        },
        Object::String(s) => match s.interval(index as usize, count as usize) {
            Some(sub) => interp.push(Object::String(sub)),
            None => Err(ps_error(ErrorKind::RangeCheck, "getinterval: interval out of range")),
        },
        other => Err(interp.type_error("getinterval", "array or string", &other)),
    }
}

/// `array|string index source putinterval -`
pub(crate) fn putinterval(interp: &mut Interpreter) -> OpResult {
    let source = interp.pop_any("putinterval")?;
    let index = interp.pop_integer("putinterval")?;
    if index < 0 {
        return Err(ps_error(ErrorKind::RangeCheck, "putinterval: negative index"));
    }
    match (interp.pop_any("putinterval")?, source) {
        (Object::Array(dest) | Object::Procedure(dest), Object::Array(src) | Object::Procedure(src)) => {
            if dest.write_at(index as usize, &src.elements()) {
                Ok(())
            } else {
                Err(ps_error(ErrorKind::RangeCheck, "putinterval: source does not fit"))
            }
        }
        (Object::String(dest), Object::String(src)) => {
            if dest.write_at(index as usize, &src.bytes()) {
                Ok(())
            } else {
                Err(ps_error(ErrorKind::RangeCheck, "putinterval: source does not fit"))
            }
        }
        (other, _) => Err(interp.type_error("putinterval", "matching array or string pair", &other)),
    }
}

/// `composite proc forall -`
pub(crate) fn forall(interp: &mut Interpreter) -> OpResult {
    let proc = interp.pop_procedure("forall")?;
    let container = interp.pop_any("forall")?;
    let run = |interp: &mut Interpreter, pushes: Vec<Object>| -> OpResult {
        interp.count_op()?;
        for obj in pushes {
            interp.push(obj)?;
        }
        interp.run_procedure(&proc)
    };
    let outcome = match container {
        Object::Array(a) | Object::Procedure(a) => {
            let mut result = Ok(());
            for obj in a.elements() {
                result = run(interp, vec![obj]);
                if result.is_err() {
                    break;
                }
            }
            result
        }
        Object::String(s) => {
            let mut result = Ok(());
            for b in s.bytes() {
                result = run(interp, vec![Object::Integer(b as i64)]);
                if result.is_err() {
                    break;
                }
            }
            result
        }
        Object::Dict(d) => {
            let mut result = Ok(());
            for (key, value) in d.entries() {
                result = run(interp, vec![Object::Name(key), value]);
                if result.is_err() {
                    break;
                }
            }
            result
        }
        other => return Err(interp.type_error("forall", "array, dict or string", &other)),
    };
    match outcome {
        Err(Interrupted::Exit) => Ok(()),
        other => other,
    }
}

/// `array aload a0 .. an-1 array`
pub(crate) fn aload(interp: &mut Interpreter) -> OpResult {
    match interp.pop_any("aload")? {
        obj @ (Object::Array(_) | Object::Procedure(_)) => {
            let view = obj.as_array().expect("array view").clone();
            for elem in view.elements() {
                interp.push(elem)?;
            }
            interp.push(obj)
        }
        other => Err(interp.type_error("aload", "array", &other)),
    }
}

/// `a0 .. an-1 array astore array`
pub(crate) fn astore(interp: &mut Interpreter) -> OpResult {
    let obj = interp.pop_any("astore")?;
    let array = match obj.as_array() {
        Some(a) => a.clone(),
        None => return Err(interp.type_error("astore", "array", &obj)),
    };
    let n = array.len();
    if interp.operand_stack.len() < n {
        return Err(ps_error(ErrorKind::StackUnderflow, "astore: not enough operands"));
    }
    let start = interp.operand_stack.len() - n;
    let elems = interp.operand_stack.split_off(start);
    array.write_at(0, &elems);
    interp.push(obj)
}

/// `mark a1 .. an ] array`
pub(crate) fn endarray(interp: &mut Interpreter) -> OpResult {
    let elems = collect_to_mark(interp, "]")?;
    if elems.len() > MAX_COMPOSITE_LEN {
        return Err(ps_error(ErrorKind::LimitCheck, "]: array above 65536 elements"));
    }
    interp.push(Object::Array(PsArray::new(elems)))
}

/// `mark k1 v1 .. kn vn >> dict`
pub(crate) fn enddict(interp: &mut Interpreter) -> OpResult {
    let items = collect_to_mark(interp, ">>")?;
    if items.len() % 2 != 0 {
        return Err(ps_error(ErrorKind::RangeCheck, ">>: odd number of operands"));
    }
    if items.len() / 2 > MAX_DICT_LEN {
        return Err(ps_error(ErrorKind::LimitCheck, ">>: dictionary above 65535 entries"));
    }
    let dict = PsDict::with_capacity(items.len() / 2);
    let mut iter = items.into_iter();
    while let (Some(key), Some(value)) = (iter.next(), iter.next()) {
        let name = dict_key(">>", key)?;
        dict.insert(name, value);
    }
    interp.push(Object::Dict(dict))
}
