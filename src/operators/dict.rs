//! Dictionary and dictionary-stack operators.

use crate::error::{ErrorKind, OpResult, ps_error};
use crate::interpreter::{Interpreter, MAX_DICT_STACK, MIN_DICT_STACK};
use crate::object::{MAX_DICT_LEN, Object, PsDict};

/// `n dict dict`
pub(crate) fn dict(interp: &mut Interpreter) -> OpResult {
    let n = interp.pop_integer("dict")?;
    if n < 0 {
        return Err(ps_error(ErrorKind::RangeCheck, "dict: negative capacity"));
    }
    if n as usize > MAX_DICT_LEN {
        return Err(ps_error(ErrorKind::LimitCheck, "dict: capacity above 65535"));
    }
    interp.push(Object::Dict(PsDict::with_capacity(n as usize)))
}

/// `dict begin -` pushes onto the dictionary stack.
pub(crate) fn begin(interp: &mut Interpreter) -> OpResult {
    let d = interp.pop_dict("begin")?;
    if interp.dict_stack.len() >= MAX_DICT_STACK {
        return Err(ps_error(ErrorKind::DictStackOverflow, "begin: dictionary stack full"));
    }
    interp.dict_stack.push(d);
    Ok(())
}

/// `end -` pops the dictionary stack, never below the permanent frames.
pub(crate) fn end(interp: &mut Interpreter) -> OpResult {
    if interp.dict_stack.len() <= MIN_DICT_STACK {
        return Err(ps_error(
            ErrorKind::DictStackUnderflow,
            "end: cannot pop a permanent dictionary",
        ));
    }
    interp.dict_stack.pop();
    Ok(())
}

/// `key value def -` defines into the current dictionary.
pub(crate) fn def(interp: &mut Interpreter) -> OpResult {
    let value = interp.pop_any("def")?;
    let key = interp.pop_key("def")?;
    let current = interp.current_dict();
    if !current.contains_key(key.as_str()) && current.len() >= MAX_DICT_LEN {
        return Err(ps_error(ErrorKind::DictFull, "def: dictionary is full"));
    }
    current.insert(key, value);
    Ok(())
}

/// `dict key known bool`
pub(crate) fn known(interp: &mut Interpreter) -> OpResult {
    let key = interp.pop_key("known")?;
    let d = interp.pop_dict("known")?;
    interp.push(Object::Boolean(d.contains_key(key.as_str())))
}

/// `key load value` via the dictionary stack.
pub(crate) fn load(interp: &mut Interpreter) -> OpResult {
    let key = interp.pop_key("load")?;
    match interp.lookup(key.as_str()) {
        Some(obj) => interp.push(obj),
        None => Err(ps_error(ErrorKind::Undefined, format!("load: /{} not defined", key))),
    }
}

/// `key where dict true | false`
pub(crate) fn where_(interp: &mut Interpreter) -> OpResult {
    let key = interp.pop_key("where")?;
    let found = interp
        .dict_stack
        .iter()
        .rev()
        .find(|d| d.contains_key(key.as_str()))
        .cloned();
    match found {
        Some(d) => {
            interp.push(Object::Dict(d))?;
            interp.push(Object::Boolean(true))
        }
        None => interp.push(Object::Boolean(false)),
    }
}

/// `currentdict dict`
pub(crate) fn currentdict(interp: &mut Interpreter) -> OpResult {
    let d = interp.current_dict();
    interp.push(Object::Dict(d))
}

/// `dict maxlength n`
pub(crate) fn maxlength(interp: &mut Interpreter) -> OpResult {
    let d = interp.pop_dict("maxlength")?;
    interp.push(Object::Integer(d.max_length() as i64))
}
