//! The CMap builder.
//!
//! PostScript CMap resources are programs: they fetch the `CIDInit` ProcSet,
//! `begin` it, and call its section operators to declare codespace ranges
//! and code-to-CID (or code-to-Unicode) mappings. This module implements
//! that ProcSet. The accumulating state lives on the interpreter between
//! `begincmap` and `endcmap`; `endcmap` freezes it into a [`CMapInfo`] and
//! installs it under `/CodeMap` in the current dictionary, which a following
//! `defineresource ... /CMap` registers.
//!
//! Section vectors are sorted on `endcmap` so two runs over the same file
//! produce identical results regardless of declaration order.

use std::io::Read;
use std::rc::Rc;

use crate::error::{Error, ErrorKind, Interrupted, OpResult, PostScriptError, Result, ps_error};
use crate::interpreter::Interpreter;
use crate::object::{Builtin, Name, Object, PsDict};
use crate::operators::stack::collect_to_mark;

/// Maximum number of entries in one `beginXxx ... endXxx` section.
const MAX_SECTION_ENTRIES: i64 = 100;

/// An interval of valid source codes: two byte strings of equal length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeSpaceRange {
    /// Inclusive lower bound.
    pub low: Vec<u8>,
    /// Inclusive upper bound.
    pub high: Vec<u8>,
}

/// A single-code mapping. The destination is an Integer for CID maps and a
/// String or Name for `bfchar` maps.
#[derive(Debug, Clone)]
pub struct CharMap {
    /// The source code bytes.
    pub src: Vec<u8>,
    /// The mapped-to value.
    pub dst: Object,
}

/// A code-range mapping. The destination is an Integer (first CID) for CID
/// maps and a String or Array for `bfrange` maps.
#[derive(Debug, Clone)]
pub struct RangeMap {
    /// Inclusive lower bound of the source range.
    pub low: Vec<u8>,
    /// Inclusive upper bound, same length as `low`.
    pub high: Vec<u8>,
    /// The destination of `low`; subsequent codes increment it.
    pub dst: Object,
}

/// The structured contents of one CMap.
#[derive(Debug, Clone, Default)]
pub struct CMapInfo {
    /// Valid source-code intervals.
    pub codespace_ranges: Vec<CodeSpaceRange>,
    /// Single-code mappings from `cidchar` and `bfchar` sections.
    pub chars: Vec<CharMap>,
    /// Range mappings from `cidrange` and `bfrange` sections.
    pub ranges: Vec<RangeMap>,
    /// Single-code fallbacks from `notdefchar` sections.
    pub notdef_chars: Vec<CharMap>,
    /// Range fallbacks from `notdefrange` sections.
    pub notdef_ranges: Vec<RangeMap>,
    /// The CMap this one builds on, if any (`usecmap`).
    pub use_cmap: Option<Name>,
}

impl CMapInfo {
    /// Sort every section vector into the canonical output order:
    /// codespace ranges by (length, low bytes), mappings by low bytes.
    pub fn sort(&mut self) {
        self.codespace_ranges
            .sort_by(|a, b| a.low.len().cmp(&b.low.len()).then_with(|| a.low.cmp(&b.low)));
        self.chars.sort_by(|a, b| a.src.cmp(&b.src));
        self.ranges.sort_by(|a, b| a.low.cmp(&b.low));
        self.notdef_chars.sort_by(|a, b| a.src.cmp(&b.src));
        self.notdef_ranges.sort_by(|a, b| a.low.cmp(&b.low));
    }

    /// True if `code` falls inside one of the declared codespace ranges.
    pub fn in_codespace(&self, code: &[u8]) -> bool {
        self.codespace_ranges.iter().any(|r| {
            r.low.len() == code.len() && r.low.as_slice() <= code && code <= r.high.as_slice()
        })
    }

    /// Map a source code to its CID.
    ///
    /// Lookup order follows the PDF conventions: single-code mappings first,
    /// then ranges (destination CID incremented by the offset into the
    /// range), then the notdef fallbacks. Assumes the vectors are in the
    /// sorted order `endcmap` leaves them in.
    pub fn lookup_cid(&self, code: &[u8]) -> Option<u32> {
        if let Ok(i) = self.chars.binary_search_by(|c| c.src.as_slice().cmp(code)) {
            if let Some(cid) = self.chars[i].dst.as_integer() {
                return Some(cid as u32);
            }
        }
        for r in &self.ranges {
            if r.low.len() == code.len() && r.low.as_slice() <= code && code <= r.high.as_slice() {
                let cid = r.dst.as_integer()?;
                let offset = be_value(code) - be_value(&r.low);
                return Some((cid as u64 + offset) as u32);
            }
        }
        for c in &self.notdef_chars {
            if c.src == code {
                return c.dst.as_integer().map(|cid| cid as u32);
            }
        }
        for r in &self.notdef_ranges {
            if r.low.len() == code.len() && r.low.as_slice() <= code && code <= r.high.as_slice() {
                // A notdef range maps every code to the single fallback CID.
                return r.dst.as_integer().map(|cid| cid as u32);
            }
        }
        None
    }
}

/// Big-endian integer value of a short code byte string.
fn be_value(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64)
}

/// A CMap read from a file: its resource name, the raw PostScript
/// dictionary, and the structured code map.
#[derive(Debug, Clone)]
pub struct CMap {
    /// The resource key it was registered under.
    pub name: Name,
    /// The CMap dictionary as the program built it (`CIDSystemInfo`,
    /// `WMode`, ...).
    pub dict: PsDict,
    /// The structured contents installed by `endcmap`.
    pub info: Rc<CMapInfo>,
}

/// Read a CMap program and return the first CMap it registers.
///
/// The returned dictionary is given a `/CMapName` entry from the resource
/// key if the program did not set one.
pub fn read<R: Read>(reader: R) -> Result<CMap> {
    let mut interp = Interpreter::new();
    interp.execute(reader)?;
    first_registered(&interp)
}

/// Extract the first registered CMap from a finished interpreter.
pub fn first_registered(interp: &Interpreter) -> Result<CMap> {
    let directory = interp.cmap_directory();
    for (name, obj) in directory.entries() {
        if let Object::Dict(dict) = obj {
            if let Some(Object::CMap(info)) = dict.get("CodeMap") {
                if !dict.contains_key("CMapName") {
                    dict.insert(Name::new("CMapName"), Object::Name(name.clone()));
                }
                return Ok(CMap { name, dict, info });
            }
        }
    }
    Err(Error::Interpreter(PostScriptError::new(
        ErrorKind::UndefinedResource,
        "no CMap was defined",
    )))
}

/// Build the `CIDInit` ProcSet dictionary.
pub(crate) fn cidinit_procset() -> PsDict {
    type Entry = (&'static str, fn(&mut Interpreter) -> OpResult);
    const OPERATORS: &[Entry] = &[
        ("begincmap", begincmap),
        ("endcmap", endcmap),
        ("begincodespacerange", begin_section),
        ("endcodespacerange", endcodespacerange),
        ("begincidchar", begin_section),
        ("endcidchar", endcidchar),
        ("begincidrange", begin_section),
        ("endcidrange", endcidrange),
        ("beginbfchar", begin_section),
        ("endbfchar", endbfchar),
        ("beginbfrange", begin_section),
        ("endbfrange", endbfrange),
        ("beginnotdefchar", begin_section),
        ("endnotdefchar", endnotdefchar),
        ("beginnotdefrange", begin_section),
        ("endnotdefrange", endnotdefrange),
        ("usecmap", usecmap),
    ];
    let dict = PsDict::with_capacity(OPERATORS.len());
    for (name, func) in OPERATORS {
        dict.insert(Name::new(*name), Object::Builtin(Builtin::new(name, *func)));
    }
    dict
}

fn scratch<'a>(
    interp: &'a mut Interpreter,
    op: &str,
) -> std::result::Result<&'a mut CMapInfo, Interrupted> {
    interp.cmap_scratch.as_mut().ok_or_else(|| {
        ps_error(
            ErrorKind::SyntaxError,
            format!("{}: not inside begincmap ... endcmap", op),
        )
    })
}

/// `begincmap -` starts accumulating a new CMap.
fn begincmap(interp: &mut Interpreter) -> OpResult {
    interp.cmap_scratch = Some(CMapInfo::default());
    Ok(())
}

/// `endcmap -` sorts the accumulated sections and installs the finished
/// code map under `/CodeMap` in the current dictionary.
fn endcmap(interp: &mut Interpreter) -> OpResult {
    let mut info = interp
        .cmap_scratch
        .take()
        .ok_or_else(|| ps_error(ErrorKind::SyntaxError, "endcmap: no matching begincmap"))?;
    info.sort();
    log::debug!(
        "endcmap: {} codespace ranges, {} chars, {} ranges",
        info.codespace_ranges.len(),
        info.chars.len(),
        info.ranges.len()
    );
    interp
        .current_dict()
        .insert(Name::new("CodeMap"), Object::CMap(Rc::new(info)));
    Ok(())
}

/// All `beginXxx` section operators: validate the entry count and leave a
/// mark for the matching `endXxx`.
fn begin_section(interp: &mut Interpreter) -> OpResult {
    let n = interp.pop_integer("begin section")?;
    if !(0..=MAX_SECTION_ENTRIES).contains(&n) {
        return Err(ps_error(
            ErrorKind::RangeCheck,
            format!("section entry count {} outside [0, 100]", n),
        ));
    }
    scratch(interp, "begin section")?;
    interp.push(Object::Mark)
}

fn operand_bytes(op: &str, obj: &Object) -> std::result::Result<Vec<u8>, Interrupted> {
    match obj {
        Object::String(s) => Ok(s.bytes()),
        other => Err(ps_error(
            ErrorKind::TypeCheck,
            format!("{}: expected string, got {}", op, other.type_name()),
        )),
    }
}

/// `low high ... endcodespacerange`
fn endcodespacerange(interp: &mut Interpreter) -> OpResult {
    let items = collect_to_mark(interp, "endcodespacerange")?;
    if items.len() % 2 != 0 {
        return Err(ps_error(
            ErrorKind::RangeCheck,
            "endcodespacerange: operands are not pairs",
        ));
    }
    let mut pairs = Vec::with_capacity(items.len() / 2);
    for pair in items.chunks(2) {
        let low = operand_bytes("endcodespacerange", &pair[0])?;
        let high = operand_bytes("endcodespacerange", &pair[1])?;
        if low.len() != high.len() {
            return Err(ps_error(
                ErrorKind::RangeCheck,
                "endcodespacerange: low and high have different lengths",
            ));
        }
        pairs.push(CodeSpaceRange { low, high });
    }
    scratch(interp, "endcodespacerange")?
        .codespace_ranges
        .append(&mut pairs);
    Ok(())
}

/// Collect `src dst` pairs for a char section.
fn char_section(
    interp: &mut Interpreter,
    op: &str,
    dst_ok: fn(&Object) -> bool,
) -> std::result::Result<Vec<CharMap>, Interrupted> {
    let items = collect_to_mark(interp, op)?;
    if items.len() % 2 != 0 {
        return Err(ps_error(
            ErrorKind::RangeCheck,
            format!("{}: operands are not pairs", op),
        ));
    }
    let mut maps = Vec::with_capacity(items.len() / 2);
    for pair in items.chunks(2) {
        let src = operand_bytes(op, &pair[0])?;
        let dst = pair[1].clone();
        if !dst_ok(&dst) {
            return Err(ps_error(
                ErrorKind::TypeCheck,
                format!("{}: bad destination type {}", op, dst.type_name()),
            ));
        }
        maps.push(CharMap { src, dst });
    }
    Ok(maps)
}

/// Collect `low high dst` triples for a range section.
fn range_section(
    interp: &mut Interpreter,
    op: &str,
    dst_ok: fn(&Object) -> bool,
) -> std::result::Result<Vec<RangeMap>, Interrupted> {
    let items = collect_to_mark(interp, op)?;
    if items.len() % 3 != 0 {
        return Err(ps_error(
            ErrorKind::RangeCheck,
            format!("{}: operands are not triples", op),
        ));
    }
    let mut maps = Vec::with_capacity(items.len() / 3);
    for triple in items.chunks(3) {
        let low = operand_bytes(op, &triple[0])?;
        let high = operand_bytes(op, &triple[1])?;
        if low.len() != high.len() || low > high {
            return Err(ps_error(
                ErrorKind::RangeCheck,
                format!("{}: invalid code range", op),
            ));
        }
        let dst = triple[2].clone();
        if !dst_ok(&dst) {
            return Err(ps_error(
                ErrorKind::TypeCheck,
                format!("{}: bad destination type {}", op, dst.type_name()),
            ));
        }
        maps.push(RangeMap { low, high, dst });
    }
    Ok(maps)
}

fn is_integer(obj: &Object) -> bool {
    matches!(obj, Object::Integer(_))
}

fn is_string_or_name(obj: &Object) -> bool {
    matches!(obj, Object::String(_) | Object::Name(_))
}

fn is_string_or_array(obj: &Object) -> bool {
    matches!(obj, Object::String(_) | Object::Array(_))
}

/// `code cid ... endcidchar`
fn endcidchar(interp: &mut Interpreter) -> OpResult {
    let mut maps = char_section(interp, "endcidchar", is_integer)?;
    scratch(interp, "endcidchar")?.chars.append(&mut maps);
    Ok(())
}

/// `low high cid ... endcidrange`
fn endcidrange(interp: &mut Interpreter) -> OpResult {
    let mut maps = range_section(interp, "endcidrange", is_integer)?;
    scratch(interp, "endcidrange")?.ranges.append(&mut maps);
    Ok(())
}

/// `code dst ... endbfchar` with string or name destinations.
fn endbfchar(interp: &mut Interpreter) -> OpResult {
    let mut maps = char_section(interp, "endbfchar", is_string_or_name)?;
    scratch(interp, "endbfchar")?.chars.append(&mut maps);
    Ok(())
}

/// `low high dst ... endbfrange` with string or array destinations.
fn endbfrange(interp: &mut Interpreter) -> OpResult {
    let mut maps = range_section(interp, "endbfrange", is_string_or_array)?;
    scratch(interp, "endbfrange")?.ranges.append(&mut maps);
    Ok(())
}

/// `code cid ... endnotdefchar` (preserved into the fallback vectors).
fn endnotdefchar(interp: &mut Interpreter) -> OpResult {
    let mut maps = char_section(interp, "endnotdefchar", is_integer)?;
    scratch(interp, "endnotdefchar")?.notdef_chars.append(&mut maps);
    Ok(())
}

/// `low high cid ... endnotdefrange`
fn endnotdefrange(interp: &mut Interpreter) -> OpResult {
    let mut maps = range_section(interp, "endnotdefrange", is_integer)?;
    scratch(interp, "endnotdefrange")?.notdef_ranges.append(&mut maps);
    Ok(())
}

/// `name usecmap -` records the base CMap for the caller to resolve.
fn usecmap(interp: &mut Interpreter) -> OpResult {
    let name = match interp.pop_any("usecmap")? {
        Object::Name(n) | Object::Operator(n) => n,
        // Programs written against the findresource form hand us the dict.
        Object::Dict(d) => match d.get("CMapName") {
            Some(Object::Name(n)) => n,
            _ => {
                return Err(ps_error(
                    ErrorKind::TypeCheck,
                    "usecmap: dictionary has no /CMapName",
                ))
            }
        },
        other => return Err(interp.type_error("usecmap", "name", &other)),
    };
    scratch(interp, "usecmap")?.use_cmap = Some(name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(program: &str) -> Interpreter {
        let mut interp = Interpreter::new();
        interp.execute_string(program).expect("program failed");
        interp
    }

    const PREAMBLE: &str = "/CIDInit /ProcSet findresource begin 12 dict begin begincmap ";

    #[test]
    fn test_cidchar_deterministic_order() {
        // Declaration order must not matter after endcmap.
        let interp = run(&format!(
            "{} 1 begincodespacerange <00> <FF> endcodespacerange \
             2 begincidchar <30> 48 <20> 32 endcidchar endcmap \
             /Demo currentdict /CMap defineresource pop end end",
            PREAMBLE
        ));
        let cmap = first_registered(&interp).unwrap();
        assert_eq!(cmap.info.chars.len(), 2);
        assert_eq!(cmap.info.chars[0].src, vec![0x20]);
        assert_eq!(cmap.info.chars[0].dst.as_integer(), Some(32));
        assert_eq!(cmap.info.chars[1].src, vec![0x30]);
        assert_eq!(cmap.info.chars[1].dst.as_integer(), Some(48));
    }

    #[test]
    fn test_codespace_sorted_by_length_then_bytes() {
        let interp = run(&format!(
            "{} 3 begincodespacerange <8140> <9FFC> <00> <80> <A0> <DF> \
             endcodespacerange endcmap \
             /Demo currentdict /CMap defineresource pop end end",
            PREAMBLE
        ));
        let cmap = first_registered(&interp).unwrap();
        let ranges = &cmap.info.codespace_ranges;
        assert_eq!(ranges.len(), 3);
        assert_eq!(ranges[0].low, vec![0x00]);
        assert_eq!(ranges[1].low, vec![0xA0]);
        assert_eq!(ranges[2].low, vec![0x81, 0x40]);
    }

    #[test]
    fn test_cidrange_and_usecmap() {
        let interp = run(&format!(
            "{} /Adobe-Japan1-UCS2 usecmap \
             1 begincidrange <20> <7E> 231 endcidrange endcmap \
             /Demo currentdict /CMap defineresource pop end end",
            PREAMBLE
        ));
        let cmap = first_registered(&interp).unwrap();
        assert_eq!(cmap.info.use_cmap.as_ref().unwrap().as_str(), "Adobe-Japan1-UCS2");
        assert_eq!(cmap.info.ranges.len(), 1);
        assert_eq!(cmap.info.ranges[0].low, vec![0x20]);
        assert_eq!(cmap.info.ranges[0].high, vec![0x7E]);
        assert_eq!(cmap.info.ranges[0].dst.as_integer(), Some(231));
    }

    #[test]
    fn test_bfchar_and_bfrange_destinations() {
        let interp = run(&format!(
            "{} 2 beginbfchar <01> <0041> <02> /space endbfchar \
             1 beginbfrange <10> <1F> <0030> endbfrange endcmap \
             /U currentdict /CMap defineresource pop end end",
            PREAMBLE
        ));
        let cmap = first_registered(&interp).unwrap();
        assert_eq!(cmap.info.chars.len(), 2);
        assert!(matches!(cmap.info.chars[0].dst, Object::String(_)));
        assert!(matches!(cmap.info.chars[1].dst, Object::Name(_)));
        assert!(matches!(cmap.info.ranges[0].dst, Object::String(_)));
    }

    #[test]
    fn test_notdef_sections_preserved() {
        let interp = run(&format!(
            "{} 1 beginnotdefchar <00> 0 endnotdefchar \
             1 beginnotdefrange <80> <9F> 1 endnotdefrange endcmap \
             /Demo currentdict /CMap defineresource pop end end",
            PREAMBLE
        ));
        let cmap = first_registered(&interp).unwrap();
        assert_eq!(cmap.info.notdef_chars.len(), 1);
        assert_eq!(cmap.info.notdef_ranges.len(), 1);
    }

    #[test]
    fn test_section_count_above_100_is_rangecheck() {
        let mut interp = Interpreter::new();
        let err = interp
            .execute_string(&format!("{} 101 begincidchar", PREAMBLE))
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::RangeCheck));
    }

    #[test]
    fn test_mismatched_range_lengths_are_rangecheck() {
        let mut interp = Interpreter::new();
        let err = interp
            .execute_string(&format!(
                "{} 1 begincidrange <0000> <FF> 0 endcidrange",
                PREAMBLE
            ))
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::RangeCheck));
    }

    #[test]
    fn test_descending_range_is_rangecheck() {
        let mut interp = Interpreter::new();
        let err = interp
            .execute_string(&format!(
                "{} 1 begincidrange <7E> <20> 0 endcidrange",
                PREAMBLE
            ))
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::RangeCheck));
    }

    #[test]
    fn test_section_outside_begincmap_is_syntaxerror() {
        let mut interp = Interpreter::new();
        let err = interp
            .execute_string(
                "/CIDInit /ProcSet findresource begin \
                 1 begincodespacerange <00> <FF> endcodespacerange",
            )
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::SyntaxError));
    }

    #[test]
    fn test_unfinished_cmap_not_registered() {
        // Without endcmap there is no CodeMap entry, so defineresource
        // must not register the dict in the CMap category.
        let interp = run(
            "/CIDInit /ProcSet findresource begin 12 dict begin begincmap \
             /Demo currentdict /CMap defineresource pop end end",
        );
        assert!(first_registered(&interp).is_err());
    }

    #[test]
    fn test_lookup_cid() {
        let interp = run(&format!(
            "{} 2 begincodespacerange <00> <7F> <8140> <9FFC> endcodespacerange \
             1 begincidchar <41> 1000 endcidchar \
             1 begincidrange <8140> <817E> 633 endcidrange \
             1 beginnotdefrange <00> <1F> 1 endnotdefrange \
             endcmap /Demo currentdict /CMap defineresource pop end end",
            PREAMBLE
        ));
        let cmap = first_registered(&interp).unwrap();
        assert!(cmap.info.in_codespace(&[0x41]));
        assert!(cmap.info.in_codespace(&[0x81, 0x50]));
        assert!(!cmap.info.in_codespace(&[0xFF]));
        assert_eq!(cmap.info.lookup_cid(&[0x41]), Some(1000));
        assert_eq!(cmap.info.lookup_cid(&[0x81, 0x40]), Some(633));
        assert_eq!(cmap.info.lookup_cid(&[0x81, 0x4A]), Some(643));
        assert_eq!(cmap.info.lookup_cid(&[0x05]), Some(1));
        assert_eq!(cmap.info.lookup_cid(&[0x42]), None);
    }

    #[test]
    fn test_read_facade_sets_cmap_name() {
        let program = format!(
            "{} 1 begincodespacerange <00> <FF> endcodespacerange endcmap \
             /My-CMap currentdict /CMap defineresource pop end end",
            PREAMBLE
        );
        let cmap = read(program.as_bytes()).unwrap();
        assert_eq!(cmap.name.as_str(), "My-CMap");
        let name = cmap.dict.get("CMapName").unwrap();
        assert_eq!(name.as_name().unwrap().as_str(), "My-CMap");
    }
}
