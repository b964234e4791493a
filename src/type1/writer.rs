//! Rendering a [`Font`] back into a Type 1 font program.
//!
//! The output follows the canonical layout: a clear-text header defining the
//! public entries, `currentfile eexec`, the encrypted private section with
//! `RD`-style binary CharStrings, and the 512-zero trailer ending in
//! `cleartomark`. PFA emits the encrypted section as 64-digit hex lines;
//! PFB frames the same three segments as binary records.

use crate::charstring;
use crate::crypt;
use crate::encoding;
use crate::error::Result;
use crate::type1::{Font, pfb};

/// Hex digits per line in the PFA eexec section.
const HEX_LINE_LEN: usize = 64;
/// Zero digits in the trailer.
const TRAILER_ZEROS: usize = 512;

pub(crate) fn to_pfa(font: &Font) -> Result<Vec<u8>> {
    let mut out = clear_text(font);
    let binary = crypt::obfuscate(crypt::EEXEC_KEY, &private_section(font)?);
    let mut digits = 0;
    for byte in binary {
        out.extend_from_slice(format!("{:02x}", byte).as_bytes());
        digits += 2;
        if digits == HEX_LINE_LEN {
            out.push(b'\n');
            digits = 0;
        }
    }
    if digits != 0 {
        out.push(b'\n');
    }
    out.extend_from_slice(&trailer());
    Ok(out)
}

pub(crate) fn to_pfb(font: &Font) -> Result<Vec<u8>> {
    let head = clear_text(font);
    let binary = crypt::obfuscate(crypt::EEXEC_KEY, &private_section(font)?);
    Ok(pfb::wrap(&head, &binary, &trailer()))
}

/// The 512-zero line block and `cleartomark`.
fn trailer() -> Vec<u8> {
    let mut out = Vec::with_capacity(TRAILER_ZEROS + 24);
    for _ in 0..TRAILER_ZEROS / HEX_LINE_LEN {
        for _ in 0..HEX_LINE_LEN {
            out.push(b'0');
        }
        out.push(b'\n');
    }
    out.extend_from_slice(b"cleartomark\n");
    out
}

/// Format a coordinate or parameter; integral values print without a
/// fraction.
fn num(v: f64) -> String {
    format!("{}", v)
}

fn number_list(values: &[f64]) -> String {
    values.iter().map(|v| num(*v)).collect::<Vec<_>>().join(" ")
}

/// Escape a text value for a parenthesized string literal.
fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('(');
    for b in text.bytes() {
        match b {
            b'(' => out.push_str("\\("),
            b')' => out.push_str("\\)"),
            b'\\' => out.push_str("\\\\"),
            0x20..=0x7E => out.push(b as char),
            _ => out.push_str(&format!("\\{:03o}", b)),
        }
    }
    out.push(')');
    out
}

/// The public, unencrypted part of the program, ending with
/// `currentfile eexec`.
fn clear_text(font: &Font) -> Vec<u8> {
    let version = font.font_info.version.as_deref().unwrap_or("001.001");
    let mut out = String::new();
    out.push_str(&format!("%!FontType1-1.0: {} {}\n", font.font_name, version));
    out.push_str("11 dict begin\n");

    out.push_str("/FontInfo 10 dict dup begin\n");
    out.push_str(&format!("/version {} readonly def\n", quote(version)));
    if let Some(notice) = &font.font_info.notice {
        out.push_str(&format!("/Notice {} readonly def\n", quote(notice)));
    }
    if let Some(full_name) = &font.font_info.full_name {
        out.push_str(&format!("/FullName {} readonly def\n", quote(full_name)));
    }
    if let Some(family_name) = &font.font_info.family_name {
        out.push_str(&format!("/FamilyName {} readonly def\n", quote(family_name)));
    }
    if let Some(weight) = &font.font_info.weight {
        out.push_str(&format!("/Weight {} readonly def\n", quote(weight)));
    }
    out.push_str(&format!("/ItalicAngle {} def\n", num(font.font_info.italic_angle)));
    out.push_str(&format!(
        "/isFixedPitch {} def\n",
        if font.font_info.is_fixed_pitch { "true" } else { "false" }
    ));
    out.push_str(&format!(
        "/UnderlinePosition {} def\n",
        num(font.font_info.underline_position)
    ));
    out.push_str(&format!(
        "/UnderlineThickness {} def\n",
        num(font.font_info.underline_thickness)
    ));
    out.push_str("end readonly def\n");

    out.push_str(&format!("/FontName /{} def\n", font.font_name));
    out.push_str("/PaintType 0 def\n");
    out.push_str("/FontType 1 def\n");
    out.push_str(&format!("/FontMatrix [{}] readonly def\n", number_list(&font.font_matrix)));
    out.push_str(&format!("/FontBBox {{{}}} readonly def\n", number_list(&font.font_bbox)));
    out.push_str(&encoding_block(font));
    out.push_str("currentdict end\n");
    out.push_str("currentfile eexec\n");
    out.into_bytes()
}

/// `/Encoding` as the compact StandardEncoding reference when possible,
/// otherwise an explicit 256-slot construction.
fn encoding_block(font: &Font) -> String {
    if encoding::is_standard_subset(&font.encoding) {
        return "/Encoding StandardEncoding def\n".to_string();
    }
    let mut out = String::new();
    out.push_str("/Encoding 256 array\n");
    out.push_str("0 1 255 {1 index exch /.notdef put} for\n");
    for (code, name) in font.encoding.iter().enumerate() {
        if name != encoding::NOTDEF {
            out.push_str(&format!("dup {} /{} put\n", code, name));
        }
    }
    out.push_str("readonly def\n");
    out
}

/// The plaintext of the eexec section: Private dict, Subrs, CharStrings,
/// `definefont`, and the `closefile` that ends decryption.
fn private_section(font: &Font) -> Result<Vec<u8>> {
    let mut out: Vec<u8> = Vec::new();
    let p = &font.private;

    push_str(&mut out, "dup /Private 12 dict dup begin\n");
    push_str(
        &mut out,
        "/RD {string currentfile exch readstring pop} executeonly def\n",
    );
    push_str(&mut out, "/ND {noaccess def} executeonly def\n");
    push_str(&mut out, "/NP {noaccess put} executeonly def\n");
    push_str(&mut out, "/password 5839 def\n");
    push_str(&mut out, "/MinFeature {16 16} def\n");
    push_str(&mut out, "/lenIV 4 def\n");
    push_str(&mut out, &format!("/BlueValues [{}] ND\n", number_list(&p.blue_values)));
    if !p.other_blues.is_empty() {
        push_str(&mut out, &format!("/OtherBlues [{}] ND\n", number_list(&p.other_blues)));
    }
    push_str(&mut out, &format!("/BlueScale {} def\n", num(p.blue_scale)));
    push_str(&mut out, &format!("/BlueShift {} def\n", num(p.blue_shift)));
    push_str(&mut out, &format!("/BlueFuzz {} def\n", num(p.blue_fuzz)));
    if let Some(w) = p.std_hw {
        push_str(&mut out, &format!("/StdHW [{}] ND\n", num(w)));
    }
    if let Some(w) = p.std_vw {
        push_str(&mut out, &format!("/StdVW [{}] ND\n", num(w)));
    }
    push_str(
        &mut out,
        &format!("/ForceBold {} def\n", if p.force_bold { "true" } else { "false" }),
    );

    push_str(&mut out, &format!("/Subrs {} array\n", font.subrs.len()));
    for (i, body) in font.subrs.iter().enumerate() {
        let cipher = crypt::obfuscate(crypt::CHARSTRING_KEY, body);
        push_str(&mut out, &format!("dup {} {} RD ", i, cipher.len()));
        out.extend_from_slice(&cipher);
        push_str(&mut out, " NP\n");
    }
    push_str(&mut out, "ND\n");

    // The Private dictionary stays begun through the CharStrings section so
    // that RD/ND keep resolving; the two `put`s below install both dicts.
    push_str(
        &mut out,
        &format!("2 index /CharStrings {} dict dup begin\n", font.glyphs.len()),
    );
    for (name, glyph) in &font.glyphs {
        let plain = charstring::encode(glyph)?;
        let cipher = crypt::obfuscate(crypt::CHARSTRING_KEY, &plain);
        push_str(&mut out, &format!("/{} {} RD ", name, cipher.len()));
        out.extend_from_slice(&cipher);
        push_str(&mut out, " ND\n");
    }
    push_str(&mut out, "end\nend\n");
    push_str(&mut out, "readonly put\n");
    push_str(&mut out, "noaccess put\n");

    push_str(&mut out, "dup /FontName get exch definefont pop\n");
    push_str(&mut out, "mark currentfile closefile\n");
    Ok(out)
}

fn push_str(out: &mut Vec<u8>, text: &str) {
    out.extend_from_slice(text.as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charstring::{Glyph, PathOp, Point};
    use crate::type1::{DEFAULT_FONT_MATRIX, FontInfo, PrivateDict};
    use indexmap::IndexMap;

    fn sample_font() -> Font {
        let mut encoding = vec![encoding::NOTDEF.to_string(); 256];
        encoding[65] = "A".to_string();
        let mut glyphs = IndexMap::new();
        glyphs.insert(".notdef".to_string(), Glyph {
            width: Point::new(250.0, 0.0),
            ..Glyph::default()
        });
        glyphs.insert("A".to_string(), Glyph {
            path: vec![
                PathOp::MoveTo(Point::new(50.0, 0.0)),
                PathOp::LineTo(Point::new(300.0, 700.0)),
                PathOp::LineTo(Point::new(550.0, 0.0)),
                PathOp::ClosePath,
            ],
            width: Point::new(600.0, 0.0),
            side_bearing: Point::new(50.0, 0.0),
            hstem: vec![(0.0, 40.0)],
            ..Glyph::default()
        });
        Font {
            font_name: "DemoSans".to_string(),
            font_info: FontInfo {
                version: Some("001.001".to_string()),
                full_name: Some("Demo Sans".to_string()),
                family_name: Some("Demo".to_string()),
                weight: Some("Regular".to_string()),
                underline_position: -100.0,
                underline_thickness: 50.0,
                ..FontInfo::default()
            },
            font_matrix: DEFAULT_FONT_MATRIX,
            font_bbox: [0.0, -200.0, 1000.0, 800.0],
            encoding,
            private: PrivateDict {
                blue_values: vec![-15.0, 0.0, 700.0, 715.0],
                std_vw: Some(85.0),
                ..PrivateDict::default()
            },
            subrs: Vec::new(),
            glyphs,
        }
    }

    #[test]
    fn test_pfa_shape() {
        let pfa = sample_font().to_pfa().unwrap();
        let text = String::from_utf8_lossy(&pfa);
        assert!(text.starts_with("%!FontType1-1.0: DemoSans 001.001\n"));
        assert!(text.contains("currentfile eexec\n"));
        assert!(text.contains(&"0".repeat(64)));
        assert!(text.trim_end().ends_with("cleartomark"));
    }

    #[test]
    fn test_pfa_hex_lines_are_64_digits() {
        let pfa = sample_font().to_pfa().unwrap();
        let text = String::from_utf8_lossy(&pfa);
        let eexec_at = text.find("currentfile eexec\n").unwrap() + "currentfile eexec\n".len();
        let hex_region: Vec<&str> = text[eexec_at..]
            .lines()
            .take_while(|l| l.bytes().all(|b| b.is_ascii_hexdigit()) && !l.bytes().all(|b| b == b'0'))
            .collect();
        assert!(!hex_region.is_empty());
        for line in &hex_region[..hex_region.len() - 1] {
            assert_eq!(line.len(), 64);
        }
    }

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote("a(b)c"), "(a\\(b\\)c)");
        assert_eq!(quote("a\\b"), "(a\\\\b)");
        assert_eq!(quote("\u{1}"), "(\\001)");
    }

    #[test]
    fn test_custom_encoding_block_emitted() {
        let mut font = sample_font();
        font.encoding[66] = "Alpha".to_string(); // not StandardEncoding
        let pfa = font.to_pfa().unwrap();
        let text = String::from_utf8_lossy(&pfa);
        assert!(text.contains("/Encoding 256 array"));
        assert!(text.contains("dup 66 /Alpha put"));
    }

    #[test]
    fn test_standard_subset_uses_compact_form() {
        let pfa = sample_font().to_pfa().unwrap();
        let text = String::from_utf8_lossy(&pfa);
        assert!(text.contains("/Encoding StandardEncoding def"));
    }
}
