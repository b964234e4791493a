//! Adobe Font Metrics (AFM) files.
//!
//! AFM is a line-oriented text format: global keys at column 0, a
//! `StartCharMetrics ... EndCharMetrics` section with one
//! `C n ; WX w ; N name ; B llx lly urx ury ;` record per glyph, and kern
//! pairs inside `StartKernPairs ... EndKernPairs`. Unknown keys are skipped
//! and a row with malformed numeric fields is dropped with a warning; the
//! file as a whole still parses.
//!
//! The writer emits the same subset, and writing then reading a
//! [`FontMetrics`] reconstructs it structurally.

use std::io::{Read, Write};

use nom::{
    IResult,
    bytes::complete::take_while1,
    character::complete::multispace0,
    number::complete::double,
};

use crate::error::{Error, ErrorKind, PostScriptError, Result};

/// Per-glyph metrics from a `C` row.
#[derive(Debug, Clone, PartialEq)]
pub struct CharMetric {
    /// Character code, -1 for unencoded glyphs.
    pub code: i32,
    /// Horizontal advance width.
    pub width_x: f64,
    /// Glyph name.
    pub name: String,
    /// Bounding box: llx, lly, urx, ury.
    pub bbox: [f64; 4],
    /// Ligature formations starting at this glyph.
    pub ligatures: Vec<Ligature>,
}

/// One `L successor ligature` segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ligature {
    /// The next glyph of the pair.
    pub successor: String,
    /// The glyph the pair forms.
    pub ligature: String,
}

/// One `KPX left right adjust` row.
#[derive(Debug, Clone, PartialEq)]
pub struct KernPair {
    /// Left glyph name.
    pub left: String,
    /// Right glyph name.
    pub right: String,
    /// Horizontal adjustment.
    pub adjust: f64,
}

/// The metrics of one font.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FontMetrics {
    /// `FontName`, the only required key.
    pub font_name: String,
    /// `FullName`.
    pub full_name: Option<String>,
    /// `Version`.
    pub version: Option<String>,
    /// `Notice`.
    pub notice: Option<String>,
    /// `CapHeight`.
    pub cap_height: Option<f64>,
    /// `XHeight`.
    pub x_height: Option<f64>,
    /// `Ascender`.
    pub ascender: Option<f64>,
    /// `Descender`.
    pub descender: Option<f64>,
    /// `UnderlinePosition`.
    pub underline_position: Option<f64>,
    /// `UnderlineThickness`.
    pub underline_thickness: Option<f64>,
    /// `ItalicAngle`.
    pub italic_angle: Option<f64>,
    /// `IsFixedPitch`.
    pub is_fixed_pitch: bool,
    /// The `CharMetrics` section.
    pub char_metrics: Vec<CharMetric>,
    /// The `KernPairs` section.
    pub kern_pairs: Vec<KernPair>,
}

impl FontMetrics {
    /// Read an AFM file.
    pub fn read<R: Read>(mut reader: R) -> Result<FontMetrics> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        parse(&text)
    }

    /// Write the metrics as an AFM file.
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(self.render().as_bytes())?;
        Ok(())
    }

    /// Render the metrics as AFM text.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("StartFontMetrics 4.1\n");
        out.push_str(&format!("FontName {}\n", self.font_name));
        if let Some(v) = &self.full_name {
            out.push_str(&format!("FullName {}\n", v));
        }
        if let Some(v) = &self.version {
            out.push_str(&format!("Version {}\n", v));
        }
        if let Some(v) = &self.notice {
            out.push_str(&format!("Notice {}\n", v));
        }
        if let Some(v) = self.italic_angle {
            out.push_str(&format!("ItalicAngle {}\n", v));
        }
        out.push_str(&format!(
            "IsFixedPitch {}\n",
            if self.is_fixed_pitch { "true" } else { "false" }
        ));
        if let Some(v) = self.underline_position {
            out.push_str(&format!("UnderlinePosition {}\n", v));
        }
        if let Some(v) = self.underline_thickness {
            out.push_str(&format!("UnderlineThickness {}\n", v));
        }
        if let Some(v) = self.cap_height {
            out.push_str(&format!("CapHeight {}\n", v));
        }
        if let Some(v) = self.x_height {
            out.push_str(&format!("XHeight {}\n", v));
        }
        if let Some(v) = self.ascender {
            out.push_str(&format!("Ascender {}\n", v));
        }
        if let Some(v) = self.descender {
            out.push_str(&format!("Descender {}\n", v));
        }

        out.push_str(&format!("StartCharMetrics {}\n", self.char_metrics.len()));
        for m in &self.char_metrics {
            out.push_str(&format!(
                "C {} ; WX {} ; N {} ; B {} {} {} {} ;",
                m.code, m.width_x, m.name, m.bbox[0], m.bbox[1], m.bbox[2], m.bbox[3]
            ));
            for lig in &m.ligatures {
                out.push_str(&format!(" L {} {} ;", lig.successor, lig.ligature));
            }
            out.push('\n');
        }
        out.push_str("EndCharMetrics\n");

        if !self.kern_pairs.is_empty() {
            out.push_str("StartKernData\n");
            out.push_str(&format!("StartKernPairs {}\n", self.kern_pairs.len()));
            for k in &self.kern_pairs {
                out.push_str(&format!("KPX {} {} {}\n", k.left, k.right, k.adjust));
            }
            out.push_str("EndKernPairs\n");
            out.push_str("EndKernData\n");
        }
        out.push_str("EndFontMetrics\n");
        out
    }
}

#[derive(PartialEq)]
enum Section {
    Header,
    CharMetrics,
    KernPairs,
}

fn parse(text: &str) -> Result<FontMetrics> {
    let mut metrics = FontMetrics::default();
    let mut section = Section::Header;

    for line in text.lines() {
        let line = line.trim_end();
        if line.is_empty() || line.starts_with("Comment") {
            continue;
        }
        let (key, rest) = match line.split_once(char::is_whitespace) {
            Some((k, r)) => (k, r.trim()),
            None => (line, ""),
        };
        match key {
            "StartCharMetrics" => {
                section = Section::CharMetrics;
                continue;
            }
            "EndCharMetrics" | "EndKernPairs" | "EndKernData" => {
                section = Section::Header;
                continue;
            }
            "StartKernPairs" => {
                section = Section::KernPairs;
                continue;
            }
            _ => {}
        }
        match section {
            Section::Header => header_key(&mut metrics, key, rest),
            Section::CharMetrics => match char_metric_row(line) {
                Some(m) => metrics.char_metrics.push(m),
                None => log::warn!("AFM: dropping malformed metrics row: {}", line),
            },
            Section::KernPairs => {
                if key == "KPX" {
                    match kern_row(rest) {
                        Some(k) => metrics.kern_pairs.push(k),
                        None => log::warn!("AFM: dropping malformed kern row: {}", line),
                    }
                }
            }
        }
    }

    if metrics.font_name.is_empty() {
        return Err(Error::Interpreter(PostScriptError::new(
            ErrorKind::SyntaxError,
            "AFM: missing FontName",
        )));
    }
    Ok(metrics)
}

/// A recognized header key, or silently skipped.
fn header_key(metrics: &mut FontMetrics, key: &str, value: &str) {
    let mut number = |slot: &mut Option<f64>| match value.parse::<f64>() {
        Ok(v) if v.is_finite() => *slot = Some(v),
        _ => log::warn!("AFM: dropping malformed {} value: {}", key, value),
    };
    match key {
        "FontName" => metrics.font_name = value.to_string(),
        "FullName" => metrics.full_name = Some(value.to_string()),
        "Version" => metrics.version = Some(value.to_string()),
        "Notice" => metrics.notice = Some(value.to_string()),
        "CapHeight" => number(&mut metrics.cap_height),
        "XHeight" => number(&mut metrics.x_height),
        "Ascender" => number(&mut metrics.ascender),
        "Descender" => number(&mut metrics.descender),
        "UnderlinePosition" => number(&mut metrics.underline_position),
        "UnderlineThickness" => number(&mut metrics.underline_thickness),
        "ItalicAngle" => number(&mut metrics.italic_angle),
        "IsFixedPitch" => metrics.is_fixed_pitch = value == "true",
        _ => {}
    }
}

fn glyph_name(input: &str) -> IResult<&str, &str> {
    let (input, _) = multispace0(input)?;
    take_while1(|c: char| !c.is_whitespace() && c != ';')(input)
}

fn padded_double(input: &str) -> IResult<&str, f64> {
    let (input, _) = multispace0(input)?;
    double(input)
}

/// Parse one `C ... ;` row. Returns None (drop the row) on any malformed
/// field.
fn char_metric_row(line: &str) -> Option<CharMetric> {
    let mut code = None;
    let mut width_x = None;
    let mut name = None;
    let mut bbox = [0.0; 4];
    let mut ligatures = Vec::new();

    for segment in line.split(';') {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        let (rest, key) = glyph_name(segment).ok()?;
        match key {
            "C" => {
                let (_, v) = padded_double(rest).ok()?;
                code = Some(v as i32);
            }
            "WX" | "W0X" => {
                let (_, v) = padded_double(rest).ok()?;
                width_x = Some(v);
            }
            "N" => {
                let (_, v) = glyph_name(rest).ok()?;
                name = Some(v.to_string());
            }
            "B" => {
                let mut rest = rest;
                for slot in bbox.iter_mut() {
                    let (r, v) = padded_double(rest).ok()?;
                    *slot = v;
                    rest = r;
                }
            }
            "L" => {
                let (rest, successor) = glyph_name(rest).ok()?;
                let (_, ligature) = glyph_name(rest).ok()?;
                ligatures.push(Ligature {
                    successor: successor.to_string(),
                    ligature: ligature.to_string(),
                });
            }
            // Unknown segment keys are skipped.
            _ => {}
        }
    }

    Some(CharMetric {
        code: code?,
        width_x: width_x?,
        name: name?,
        bbox,
        ligatures,
    })
}

/// Parse the fields after `KPX`.
fn kern_row(rest: &str) -> Option<KernPair> {
    let (rest, left) = glyph_name(rest).ok()?;
    let (rest, right) = glyph_name(rest).ok()?;
    let (_, adjust) = padded_double(rest).ok()?;
    Some(KernPair {
        left: left.to_string(),
        right: right.to_string(),
        adjust,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
StartFontMetrics 4.1
Comment Creation Date: Thu Aug  1 2026
FontName DemoSans
FullName Demo Sans
Version 001.001
ItalicAngle 0
IsFixedPitch false
UnderlinePosition -100
UnderlineThickness 50
CapHeight 700
XHeight 480
UnknownKey something
StartCharMetrics 3
C 32 ; WX 250 ; N space ; B 0 0 0 0 ;
C 65 ; WX 600 ; N A ; B 10 0 590 700 ;
C 102 ; WX 300 ; N f ; B 20 0 340 720 ; L i fi ; L l fl ;
EndCharMetrics
StartKernData
StartKernPairs 2
KPX A V -80
KPX V A -75
EndKernPairs
EndKernData
EndFontMetrics
";

    #[test]
    fn test_read_header_keys() {
        let m = FontMetrics::read(SAMPLE.as_bytes()).unwrap();
        assert_eq!(m.font_name, "DemoSans");
        assert_eq!(m.full_name.as_deref(), Some("Demo Sans"));
        assert_eq!(m.cap_height, Some(700.0));
        assert_eq!(m.x_height, Some(480.0));
        assert_eq!(m.underline_position, Some(-100.0));
        assert!(!m.is_fixed_pitch);
    }

    #[test]
    fn test_read_char_metrics() {
        let m = FontMetrics::read(SAMPLE.as_bytes()).unwrap();
        assert_eq!(m.char_metrics.len(), 3);
        let a = &m.char_metrics[1];
        assert_eq!(a.code, 65);
        assert_eq!(a.width_x, 600.0);
        assert_eq!(a.name, "A");
        assert_eq!(a.bbox, [10.0, 0.0, 590.0, 700.0]);
        let f = &m.char_metrics[2];
        assert_eq!(f.ligatures.len(), 2);
        assert_eq!(f.ligatures[0].successor, "i");
        assert_eq!(f.ligatures[0].ligature, "fi");
    }

    #[test]
    fn test_read_kern_pairs() {
        let m = FontMetrics::read(SAMPLE.as_bytes()).unwrap();
        assert_eq!(m.kern_pairs.len(), 2);
        assert_eq!(m.kern_pairs[0].left, "A");
        assert_eq!(m.kern_pairs[0].right, "V");
        assert_eq!(m.kern_pairs[0].adjust, -80.0);
    }

    #[test]
    fn test_malformed_row_dropped_not_fatal() {
        let text = "\
FontName X
StartCharMetrics 2
C forty ; WX 100 ; N bad ;
C 65 ; WX 600 ; N A ; B 0 0 1 1 ;
EndCharMetrics
";
        let m = FontMetrics::read(text.as_bytes()).unwrap();
        assert_eq!(m.char_metrics.len(), 1);
        assert_eq!(m.char_metrics[0].name, "A");
    }

    #[test]
    fn test_malformed_header_number_skipped() {
        let text = "FontName X\nCapHeight tall\n";
        let m = FontMetrics::read(text.as_bytes()).unwrap();
        assert_eq!(m.cap_height, None);
    }

    #[test]
    fn test_missing_font_name_is_error() {
        let err = FontMetrics::read("StartFontMetrics 4.1\n".as_bytes()).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::SyntaxError));
    }

    #[test]
    fn test_write_read_round_trip() {
        let m = FontMetrics::read(SAMPLE.as_bytes()).unwrap();
        let rendered = m.render();
        let back = FontMetrics::read(rendered.as_bytes()).unwrap();
        assert_eq!(back, m);
    }

    #[test]
    fn test_row_without_bbox_defaults() {
        let text = "\
FontName X
StartCharMetrics 1
C -1 ; WX 500 ; N odd ;
EndCharMetrics
";
        let m = FontMetrics::read(text.as_bytes()).unwrap();
        assert_eq!(m.char_metrics[0].code, -1);
        assert_eq!(m.char_metrics[0].bbox, [0.0; 4]);
    }
}
