//! Font and resource registry operators.

use crate::error::{ErrorKind, OpResult, ps_error};
use crate::interpreter::Interpreter;
use crate::object::{Name, Object, PsDict};

/// `key font definefont font` registers into `FontDirectory`.
pub(crate) fn definefont(interp: &mut Interpreter) -> OpResult {
    let font = interp.pop_dict("definefont")?;
    let key = interp.pop_key("definefont")?;
    if !font.contains_key("FontName") {
        font.insert(Name::new("FontName"), Object::Name(key.clone()));
    }
    let directory = interp.font_directory();
    log::debug!("definefont /{}", key);
    directory.insert(key, Object::Dict(font.clone()));
    interp.push(Object::Dict(font))
}

/// `key findfont font`
pub(crate) fn findfont(interp: &mut Interpreter) -> OpResult {
    let key = interp.pop_key("findfont")?;
    match interp.font_directory().get(key.as_str()) {
        Some(obj) => interp.push(obj),
        None => Err(ps_error(
            ErrorKind::InvalidFont,
            format!("findfont: /{} is not a known font", key),
        )),
    }
}

/// `key instance category defineresource instance`
///
/// A CMap instance is registered only when `endcmap` installed a finished
/// code map under `/CodeMap`; anything else is handed back unregistered.
pub(crate) fn defineresource(interp: &mut Interpreter) -> OpResult {
    let category = interp.pop_key("defineresource")?;
    let instance = interp.pop_any("defineresource")?;
    let key = interp.pop_key("defineresource")?;

    let registrable = if category.as_str() == "CMap" {
        match &instance {
            Object::Dict(d) => matches!(d.get("CodeMap"), Some(Object::CMap(_))),
            _ => false,
        }
    } else {
        true
    };

    if registrable {
        let directory = match interp.resource_category(category.as_str()) {
            Some(d) => d,
            None => {
                let d = PsDict::new();
                interp
                    .resources()
                    .insert(category.clone(), Object::Dict(d.clone()));
                d
            }
        };
        log::debug!("defineresource /{} in category /{}", key, category);
        directory.insert(key, instance.clone());
    } else {
        log::warn!(
            "defineresource: /{} has no finished code map, not registered as a CMap",
            key
        );
    }
    interp.push(instance)
}

/// `key category findresource instance`
pub(crate) fn findresource(interp: &mut Interpreter) -> OpResult {
    let category = interp.pop_key("findresource")?;
    let key = interp.pop_key("findresource")?;
    let instance = interp
        .resource_category(category.as_str())
        .and_then(|d| d.get(key.as_str()));
    match instance {
        Some(obj) => interp.push(obj),
        None => Err(ps_error(
            ErrorKind::UndefinedResource,
            format!("findresource: /{} not found in category /{}", key, category),
        )),
    }
}
