//! Harvesting an executed font program into a [`Font`].
//!
//! The font program has already mutated the interpreter: `definefont` put a
//! dictionary into `FontDirectory`, CharStrings and Subrs hold encrypted
//! byte strings, and the encoding is a 256-slot array of names. This module
//! walks that dictionary leniently: malformed optional entries fall back to
//! defaults with a warning, while a font without CharStrings is rejected.

use indexmap::IndexMap;

use crate::charstring;
use crate::crypt;
use crate::encoding;
use crate::error::{Error, Result};
use crate::interpreter::Interpreter;
use crate::object::{Object, PsDict};
use crate::type1::{DEFAULT_FONT_MATRIX, Font, FontInfo, PrivateDict};

/// Execute a font program and harvest the first font it defines.
pub(crate) fn build(data: &[u8]) -> Result<Font> {
    let logical = if pfb_framed(data) {
        super::pfb::unwrap(data)?
    } else {
        data.to_vec()
    };
    let mut interp = Interpreter::new();
    interp.execute_bytes(logical)?;

    let directory = interp.font_directory();
    let (key, value) = directory
        .entries()
        .into_iter()
        .next()
        .ok_or_else(|| Error::invalid_font("program did not define a font"))?;
    let dict = match value {
        Object::Dict(d) => d,
        other => {
            return Err(Error::invalid_font(format!(
                "font directory entry /{} is a {}",
                key,
                other.type_name()
            )))
        }
    };
    harvest(key.as_str(), &dict)
}

fn pfb_framed(data: &[u8]) -> bool {
    super::pfb::is_pfb(data)
}

fn harvest(key: &str, dict: &PsDict) -> Result<Font> {
    let font_name = match dict.get("FontName") {
        Some(Object::Name(n)) => n.as_str().to_string(),
        _ => key.to_string(),
    };

    let font_matrix = match dict.get("FontMatrix").as_ref().and_then(number_array) {
        Some(m) if m.len() == 6 => [m[0], m[1], m[2], m[3], m[4], m[5]],
        Some(_) | None => {
            log::warn!("font /{}: missing or malformed FontMatrix", font_name);
            DEFAULT_FONT_MATRIX
        }
    };

    let font_bbox = match dict.get("FontBBox").as_ref().and_then(number_array) {
        Some(b) if b.len() == 4 => [b[0], b[1], b[2], b[3]],
        _ => [0.0; 4],
    };

    let font_info = dict
        .get("FontInfo")
        .and_then(|obj| obj.as_dict().cloned())
        .map(|d| harvest_font_info(&d))
        .unwrap_or_default();

    let encoding = harvest_encoding(dict.get("Encoding"));

    let private_dict = dict.get("Private").and_then(|obj| obj.as_dict().cloned());
    let private = private_dict
        .as_ref()
        .map(harvest_private)
        .unwrap_or_default();
    let subrs = private_dict
        .as_ref()
        .map(|d| harvest_subrs(d, private.len_iv))
        .unwrap_or_default();

    let charstrings = match dict.get("CharStrings") {
        Some(Object::Dict(d)) => d,
        _ => return Err(Error::invalid_font(format!("font /{} has no CharStrings", font_name))),
    };
    let mut glyphs = IndexMap::with_capacity(charstrings.len());
    for (glyph_name, value) in charstrings.entries() {
        let body = match value {
            Object::String(s) => s.bytes(),
            other => {
                log::warn!(
                    "font /{}: CharStrings entry /{} is a {}, skipped",
                    font_name,
                    glyph_name,
                    other.type_name()
                );
                continue;
            }
        };
        let plain = crypt::decrypt(crypt::CHARSTRING_KEY, &body, private.len_iv);
        let glyph = charstring::decode(&plain, &subrs).map_err(|e| {
            Error::invalid_font(format!("font /{}: glyph /{}: {}", font_name, glyph_name, e))
        })?;
        glyphs.insert(glyph_name.as_str().to_string(), glyph);
    }
    log::debug!("harvested font /{} with {} glyphs", font_name, glyphs.len());

    Ok(Font {
        font_name,
        font_info,
        font_matrix,
        font_bbox,
        encoding,
        private,
        subrs,
        glyphs,
    })
}

fn harvest_font_info(d: &PsDict) -> FontInfo {
    FontInfo {
        version: get_string(d, "version"),
        notice: get_string(d, "Notice"),
        full_name: get_string(d, "FullName"),
        family_name: get_string(d, "FamilyName"),
        weight: get_string(d, "Weight"),
        italic_angle: get_number(d, "ItalicAngle").unwrap_or(0.0),
        is_fixed_pitch: get_bool(d, "isFixedPitch").unwrap_or(false),
        underline_position: get_number(d, "UnderlinePosition").unwrap_or(0.0),
        underline_thickness: get_number(d, "UnderlineThickness").unwrap_or(0.0),
    }
}

fn harvest_private(d: &PsDict) -> PrivateDict {
    let defaults = PrivateDict::default();
    PrivateDict {
        blue_values: d
            .get("BlueValues")
            .as_ref()
            .and_then(number_array)
            .unwrap_or_default(),
        other_blues: d
            .get("OtherBlues")
            .as_ref()
            .and_then(number_array)
            .unwrap_or_default(),
        blue_scale: get_number(d, "BlueScale").unwrap_or(defaults.blue_scale),
        blue_shift: get_number(d, "BlueShift").unwrap_or(defaults.blue_shift),
        blue_fuzz: get_number(d, "BlueFuzz").unwrap_or(defaults.blue_fuzz),
        std_hw: scalar_or_singleton(d, "StdHW"),
        std_vw: scalar_or_singleton(d, "StdVW"),
        force_bold: get_bool(d, "ForceBold").unwrap_or(false),
        len_iv: get_number(d, "lenIV")
            .map(|v| v as usize)
            .unwrap_or(defaults.len_iv),
    }
}

fn harvest_subrs(private: &PsDict, len_iv: usize) -> Vec<Vec<u8>> {
    let subrs = match private.get("Subrs") {
        Some(obj) => match obj.as_array() {
            Some(a) => a.clone(),
            None => return Vec::new(),
        },
        None => return Vec::new(),
    };
    let mut out = Vec::with_capacity(subrs.len());
    for i in 0..subrs.len() {
        match subrs.get(i) {
            Some(Object::String(s)) => {
                out.push(crypt::decrypt(crypt::CHARSTRING_KEY, &s.bytes(), len_iv));
            }
            _ => out.push(Vec::new()),
        }
    }
    out
}

/// Build the 256-slot encoding vector; absent or malformed slots become
/// `.notdef`, an absent entry means StandardEncoding.
fn harvest_encoding(obj: Option<Object>) -> Vec<String> {
    let mut out = vec![encoding::NOTDEF.to_string(); 256];
    match obj.as_ref().and_then(Object::as_array) {
        Some(array) => {
            for (code, slot) in out.iter_mut().enumerate().take(array.len().min(256)) {
                if let Some(Object::Name(n)) = array.get(code) {
                    *slot = n.as_str().to_string();
                }
            }
        }
        None => {
            for (code, slot) in out.iter_mut().enumerate() {
                *slot = encoding::STANDARD_ENCODING[code].to_string();
            }
        }
    }
    out
}

fn get_string(d: &PsDict, key: &str) -> Option<String> {
    match d.get(key) {
        Some(Object::String(s)) => Some(s.to_utf8_lossy()),
        Some(Object::Name(n)) => Some(n.as_str().to_string()),
        _ => None,
    }
}

fn get_number(d: &PsDict, key: &str) -> Option<f64> {
    d.get(key).and_then(|obj| obj.as_number())
}

fn get_bool(d: &PsDict, key: &str) -> Option<bool> {
    d.get(key).and_then(|obj| obj.as_bool())
}

/// Accept both a bare number and the conventional one-element array form
/// (`/StdHW [30] def`).
fn scalar_or_singleton(d: &PsDict, key: &str) -> Option<f64> {
    let obj = d.get(key)?;
    if let Some(v) = obj.as_number() {
        return Some(v);
    }
    match number_array(&obj) {
        Some(values) if values.len() == 1 => Some(values[0]),
        _ => None,
    }
}

fn number_array(obj: &Object) -> Option<Vec<f64>> {
    let array = obj.as_array()?;
    let mut out = Vec::with_capacity(array.len());
    for i in 0..array.len() {
        out.push(array.get(i)?.as_number()?);
    }
    Some(out)
}
