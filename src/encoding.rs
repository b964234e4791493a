//! Adobe StandardEncoding.
//!
//! Type 1 font programs may declare `/Encoding StandardEncoding def`, and the
//! interpreter preloads the full 256-slot vector under that name. The reverse
//! map (glyph name to code) drives the writer's decision to emit the compact
//! `StandardEncoding def` form.

use lazy_static::lazy_static;
use phf::phf_map;

use crate::object::{Name, Object, PsArray};

/// Glyph name for unmapped codes.
pub const NOTDEF: &str = ".notdef";

/// StandardEncoding as a map from glyph name to character code.
pub static STANDARD_CODES: phf::Map<&'static str, u8> = phf_map! {
    "space" => 32u8, "exclam" => 33u8, "quotedbl" => 34u8, "numbersign" => 35u8,
    "dollar" => 36u8, "percent" => 37u8, "ampersand" => 38u8, "quoteright" => 39u8,
    "parenleft" => 40u8, "parenright" => 41u8, "asterisk" => 42u8, "plus" => 43u8,
    "comma" => 44u8, "hyphen" => 45u8, "period" => 46u8, "slash" => 47u8,
    "zero" => 48u8, "one" => 49u8, "two" => 50u8, "three" => 51u8,
    "four" => 52u8, "five" => 53u8, "six" => 54u8, "seven" => 55u8,
    "eight" => 56u8, "nine" => 57u8, "colon" => 58u8, "semicolon" => 59u8,
    "less" => 60u8, "equal" => 61u8, "greater" => 62u8, "question" => 63u8,
    "at" => 64u8, "A" => 65u8, "B" => 66u8, "C" => 67u8, "D" => 68u8,
    "E" => 69u8, "F" => 70u8, "G" => 71u8, "H" => 72u8, "I" => 73u8,
    "J" => 74u8, "K" => 75u8, "L" => 76u8, "M" => 77u8, "N" => 78u8,
    "O" => 79u8, "P" => 80u8, "Q" => 81u8, "R" => 82u8, "S" => 83u8,
    "T" => 84u8, "U" => 85u8, "V" => 86u8, "W" => 87u8, "X" => 88u8,
    "Y" => 89u8, "Z" => 90u8, "bracketleft" => 91u8, "backslash" => 92u8,
    "bracketright" => 93u8, "asciicircum" => 94u8, "underscore" => 95u8,
    "quoteleft" => 96u8, "a" => 97u8, "b" => 98u8, "c" => 99u8, "d" => 100u8,
    "e" => 101u8, "f" => 102u8, "g" => 103u8, "h" => 104u8, "i" => 105u8,
    "j" => 106u8, "k" => 107u8, "l" => 108u8, "m" => 109u8, "n" => 110u8,
    "o" => 111u8, "p" => 112u8, "q" => 113u8, "r" => 114u8, "s" => 115u8,
    "t" => 116u8, "u" => 117u8, "v" => 118u8, "w" => 119u8, "x" => 120u8,
    "y" => 121u8, "z" => 122u8, "braceleft" => 123u8, "bar" => 124u8,
    "braceright" => 125u8, "asciitilde" => 126u8,
    "exclamdown" => 161u8, "cent" => 162u8, "sterling" => 163u8,
    "fraction" => 164u8, "yen" => 165u8, "florin" => 166u8, "section" => 167u8,
    "currency" => 168u8, "quotesingle" => 169u8, "quotedblleft" => 170u8,
    "guillemotleft" => 171u8, "guilsinglleft" => 172u8, "guilsinglright" => 173u8,
    "fi" => 174u8, "fl" => 175u8, "endash" => 177u8, "dagger" => 178u8,
    "daggerdbl" => 179u8, "periodcentered" => 180u8, "paragraph" => 182u8,
    "bullet" => 183u8, "quotesinglbase" => 184u8, "quotedblbase" => 185u8,
    "quotedblright" => 186u8, "guillemotright" => 187u8, "ellipsis" => 188u8,
    "perthousand" => 189u8, "questiondown" => 191u8, "grave" => 193u8,
    "acute" => 194u8, "circumflex" => 195u8, "tilde" => 196u8, "macron" => 197u8,
    "breve" => 198u8, "dotaccent" => 199u8, "dieresis" => 200u8, "ring" => 202u8,
    "cedilla" => 203u8, "hungarumlaut" => 205u8, "ogonek" => 206u8,
    "caron" => 207u8, "emdash" => 208u8, "AE" => 225u8, "ordfeminine" => 227u8,
    "Lslash" => 232u8, "Oslash" => 233u8, "OE" => 234u8, "ordmasculine" => 235u8,
    "ae" => 241u8, "dotlessi" => 245u8, "lslash" => 248u8, "oslash" => 249u8,
    "oe" => 250u8, "germandbls" => 251u8,
};

lazy_static! {
    /// StandardEncoding as a 256-slot table of glyph names.
    pub static ref STANDARD_ENCODING: [&'static str; 256] = {
        let mut table = [NOTDEF; 256];
        for (name, &code) in STANDARD_CODES.entries() {
            table[code as usize] = name;
        }
        table
    };
}

/// The character code of a glyph name in StandardEncoding.
pub fn standard_code(name: &str) -> Option<u8> {
    STANDARD_CODES.get(name).copied()
}

/// Build the 256-slot StandardEncoding vector as a PostScript array object.
pub fn standard_encoding_object() -> Object {
    let elems = STANDARD_ENCODING
        .iter()
        .map(|n| Object::Name(Name::new(*n)))
        .collect();
    Object::Array(PsArray::new(elems))
}

/// True when `encoding` is StandardEncoding except possibly for slots
/// degraded to `.notdef` (the compact-writer condition).
pub fn is_standard_subset(encoding: &[String]) -> bool {
    encoding.len() == 256
        && encoding
            .iter()
            .enumerate()
            .all(|(code, name)| name == NOTDEF || name == STANDARD_ENCODING[code])
}
