//! Integration tests for reading and writing Type 1 font programs.

use indexmap::IndexMap;
use postscript_oxide::charstring::{self, Glyph, PathOp, Point};
use postscript_oxide::crypt;
use postscript_oxide::encoding;
use postscript_oxide::error::ErrorKind;
use postscript_oxide::type1::{DEFAULT_FONT_MATRIX, Font, FontInfo, PrivateDict, pfb};

/// Hex-encode an obfuscated CharString for embedding in a plain program.
fn hex_charstring(glyph: &Glyph) -> String {
    let plain = charstring::encode(glyph).unwrap();
    let cipher = crypt::obfuscate(crypt::CHARSTRING_KEY, &plain);
    let mut out = String::with_capacity(cipher.len() * 2 + 2);
    out.push('<');
    for b in cipher {
        out.push_str(&format!("{:02x}", b));
    }
    out.push('>');
    out
}

fn notdef_glyph() -> Glyph {
    Glyph {
        width: Point::new(250.0, 0.0),
        ..Glyph::default()
    }
}

fn triangle_glyph() -> Glyph {
    Glyph {
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
    }
}

fn sample_font() -> Font {
    let mut encoding = vec![encoding::NOTDEF.to_string(); 256];
    encoding[65] = "A".to_string();
    let mut glyphs = IndexMap::new();
    glyphs.insert(".notdef".to_string(), notdef_glyph());
    glyphs.insert("A".to_string(), triangle_glyph());
    Font {
        font_name: "DemoSans".to_string(),
        font_info: FontInfo {
            version: Some("001.001".to_string()),
            full_name: Some("Demo Sans".to_string()),
            family_name: Some("Demo".to_string()),
            weight: Some("Regular".to_string()),
            italic_angle: 0.0,
            is_fixed_pitch: false,
            underline_position: -100.0,
            underline_thickness: 50.0,
            notice: None,
        },
        font_matrix: DEFAULT_FONT_MATRIX,
        font_bbox: [0.0, -200.0, 1000.0, 800.0],
        encoding,
        private: PrivateDict {
            blue_values: vec![-15.0, 0.0, 700.0, 715.0],
            std_vw: Some(85.0),
            ..PrivateDict::default()
        },
        subrs: vec![vec![11]], // a lone `return`
        glyphs,
    }
}

/// A plain-text font program with hex-string CharStrings: no eexec at all,
/// which the reader must also accept.
fn plain_program() -> String {
    format!(
        "%!FontType1-1.0: Tiny 001.000\n\
         8 dict begin\n\
         /FontName /Tiny def\n\
         /FontType 1 def\n\
         /FontMatrix [0.001 0 0 0.001 0 0] readonly def\n\
         /FontBBox {{0 0 600 700}} readonly def\n\
         /Encoding StandardEncoding def\n\
         /Private 3 dict dup begin /lenIV 4 def /BlueValues [0 0] def end def\n\
         /CharStrings 2 dict dup begin\n\
         /.notdef {} def\n\
         /A {} def\n\
         end def\n\
         currentdict end\n\
         /Tiny exch definefont pop\n",
        hex_charstring(&notdef_glyph()),
        hex_charstring(&triangle_glyph()),
    )
}

#[test]
fn test_parse_plain_program() {
    let font = Font::parse(plain_program().as_bytes()).unwrap();
    assert_eq!(font.font_name, "Tiny");
    assert_eq!(font.font_matrix, DEFAULT_FONT_MATRIX);
    assert_eq!(font.font_bbox, [0.0, 0.0, 600.0, 700.0]);
    assert_eq!(font.glyphs.len(), 2);
    assert_eq!(font.encoding[65], "A");
    assert_eq!(font.encoding[66], "B");
    let a = font.glyph("A").unwrap();
    assert_eq!(a.width, Point::new(600.0, 0.0));
    assert_eq!(a.path.len(), 4);
}

#[test]
fn test_pfa_write_read_round_trip() {
    let original = sample_font();
    let pfa = original.to_pfa().unwrap();
    let font = Font::parse(&pfa).unwrap();

    assert_eq!(font.font_name, original.font_name);
    assert_eq!(font.font_info, original.font_info);
    assert_eq!(font.font_matrix, original.font_matrix);
    assert_eq!(font.font_bbox, original.font_bbox);
    assert_eq!(font.private, original.private);
    assert_eq!(font.subrs, original.subrs);
    assert_eq!(font.glyphs.len(), original.glyphs.len());
    for (name, glyph) in &original.glyphs {
        assert_eq!(font.glyph(name), Some(glyph), "glyph /{}", name);
    }
    // The encoding was a StandardEncoding subset, so the writer emitted the
    // compact form and the reader rebuilt the full standard vector.
    assert_eq!(font.encoding[65], "A");
    assert_eq!(font.encoding[32], "space");
}

#[test]
fn test_pfb_write_read_round_trip() {
    let original = sample_font();
    let data = original.to_pfb().unwrap();
    assert!(pfb::is_pfb(&data));
    let font = Font::parse(&data).unwrap();
    assert_eq!(font.font_name, original.font_name);
    assert_eq!(font.glyphs.len(), original.glyphs.len());
    for (name, glyph) in &original.glyphs {
        assert_eq!(font.glyph(name), Some(glyph), "glyph /{}", name);
    }
}

#[test]
fn test_custom_encoding_round_trip() {
    let mut original = sample_font();
    original.encoding[66] = "Alpha".to_string();
    let pfa = original.to_pfa().unwrap();
    let font = Font::parse(&pfa).unwrap();
    // Not a StandardEncoding subset: the explicit vector round-trips as is.
    assert_eq!(font.encoding, original.encoding);
}

#[test]
fn test_pfa_is_mostly_ascii() {
    let pfa = sample_font().to_pfa().unwrap();
    assert!(pfa.iter().all(|&b| b == b'\n' || (0x20..0x7F).contains(&b)));
}

#[test]
fn test_pfb_reader_accepts_resplit_records() {
    // Split the writer's logical stream into 100-byte records.
    let original = sample_font();
    let pfa = original.to_pfa().unwrap();
    let mut framed = Vec::new();
    for chunk in pfa.chunks(100) {
        framed.push(0x80);
        framed.push(1);
        framed.extend_from_slice(&(chunk.len() as u32).to_le_bytes());
        framed.extend_from_slice(chunk);
    }
    framed.extend_from_slice(&[0x80, 3]);
    let font = Font::parse(&framed).unwrap();
    assert_eq!(font.font_name, "DemoSans");
}

#[test]
fn test_font_without_charstrings_is_invalid() {
    let program = "\
        4 dict begin\n\
        /FontName /Empty def\n\
        /FontMatrix [0.001 0 0 0.001 0 0] def\n\
        currentdict end\n\
        /Empty exch definefont pop\n";
    let err = Font::parse(program.as_bytes()).unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::InvalidFont));
}

#[test]
fn test_no_font_defined() {
    let err = Font::parse(b"1 2 add").unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::InvalidFont));
}

#[test]
fn test_standard_prologue_with_known_guard() {
    // The canonical re-definition guard must execute without save/restore
    // support getting in the way.
    let mut program = String::from(
        "FontDirectory /Tiny known {/Tiny findfont dup /FontType get 1 eq \
         {save true} {pop false} ifelse} {false} ifelse\n",
    );
    program.push_str(&plain_program());
    program.push_str("{restore} if\n");
    let font = Font::parse(program.as_bytes()).unwrap();
    assert_eq!(font.font_name, "Tiny");
}

#[test]
fn test_read_from_file() {
    let data = sample_font().to_pfb().unwrap();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    std::io::Write::write_all(&mut file, &data).unwrap();
    let reopened = std::fs::File::open(file.path()).unwrap();
    let font = Font::read(reopened).unwrap();
    assert_eq!(font.font_name, "DemoSans");
}

#[test]
fn test_dsc_header_captured() {
    let pfa = sample_font().to_pfa().unwrap();
    let mut program = b"%!PS-AdobeFont-1.0: DemoSans 001.001\n%%CreationDate: 2026-08-01\n".to_vec();
    program.extend_from_slice(&pfa);
    let mut interp = postscript_oxide::Interpreter::new();
    interp.execute_bytes(program).unwrap();
    assert!(interp.dsc_comments.iter().any(|c| c.key == "CreationDate"));
}
