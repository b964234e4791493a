//! Type 1 font programs.
//!
//! The reader executes a PFA/PFB font program in a fresh interpreter and
//! harvests the dictionary it registers into a structured [`Font`]. The
//! writer is the inverse: it renders a canonical font program (clear text,
//! eexec-encrypted private section, zero trailer) that this crate's own
//! reader accepts.

mod builder;
pub mod pfb;
mod writer;

use std::io::Read;

use indexmap::IndexMap;

use crate::charstring::Glyph;
use crate::error::Result;

/// Default FontMatrix: glyph space is 1000 units per em.
pub const DEFAULT_FONT_MATRIX: [f64; 6] = [0.001, 0.0, 0.0, 0.001, 0.0, 0.0];

/// The `FontInfo` sub-dictionary of a Type 1 font.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FontInfo {
    /// `version` entry.
    pub version: Option<String>,
    /// `Notice` entry.
    pub notice: Option<String>,
    /// `FullName` entry.
    pub full_name: Option<String>,
    /// `FamilyName` entry.
    pub family_name: Option<String>,
    /// `Weight` entry.
    pub weight: Option<String>,
    /// Slant of dominant strokes, degrees counter-clockwise from vertical.
    pub italic_angle: f64,
    /// True for monospaced fonts.
    pub is_fixed_pitch: bool,
    /// Underline center offset from the baseline.
    pub underline_position: f64,
    /// Underline stroke width.
    pub underline_thickness: f64,
}

/// The hinting-related entries of the `Private` sub-dictionary.
#[derive(Debug, Clone, PartialEq)]
pub struct PrivateDict {
    /// Alignment zones for baseline and x-height/cap-height overshoots.
    pub blue_values: Vec<f64>,
    /// Additional bottom alignment zones.
    pub other_blues: Vec<f64>,
    /// Point size below which overshoot suppression is active.
    pub blue_scale: f64,
    /// Overshoot enforcement threshold in character-space units.
    pub blue_shift: f64,
    /// Slack when matching alignment zones.
    pub blue_fuzz: f64,
    /// Dominant horizontal stem width.
    pub std_hw: Option<f64>,
    /// Dominant vertical stem width.
    pub std_vw: Option<f64>,
    /// Force bold rendering at small sizes.
    pub force_bold: bool,
    /// CharString IV length.
    pub len_iv: usize,
}

impl Default for PrivateDict {
    fn default() -> Self {
        PrivateDict {
            blue_values: Vec::new(),
            other_blues: Vec::new(),
            blue_scale: 0.039625,
            blue_shift: 7.0,
            blue_fuzz: 1.0,
            std_hw: None,
            std_vw: None,
            force_bold: false,
            len_iv: crate::crypt::DEFAULT_LENIV,
        }
    }
}

/// A fully harvested Type 1 font.
#[derive(Debug, Clone)]
pub struct Font {
    /// The PostScript font name.
    pub font_name: String,
    /// The `FontInfo` sub-dictionary.
    pub font_info: FontInfo,
    /// Character-space to glyph-space transform, six coefficients.
    pub font_matrix: [f64; 6],
    /// Bounding box of all glyphs: llx, lly, urx, ury.
    pub font_bbox: [f64; 4],
    /// 256 glyph names; unmapped codes hold `.notdef`.
    pub encoding: Vec<String>,
    /// Hinting parameters from the `Private` dictionary.
    pub private: PrivateDict,
    /// Decrypted local subroutines.
    pub subrs: Vec<Vec<u8>>,
    /// Decoded glyph outlines by glyph name, in definition order.
    pub glyphs: IndexMap<String, Glyph>,
}

impl Font {
    /// Read a Type 1 font program (PFA or PFB) from a reader.
    pub fn read<R: Read>(mut reader: R) -> Result<Font> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Font::parse(&data)
    }

    /// Read a Type 1 font program from a buffer.
    pub fn parse(data: &[u8]) -> Result<Font> {
        builder::build(data)
    }

    /// Look up a decoded glyph by name.
    pub fn glyph(&self, name: &str) -> Option<&Glyph> {
        self.glyphs.get(name)
    }

    /// The glyph name a character code maps to.
    pub fn glyph_name(&self, code: u8) -> &str {
        self.encoding
            .get(code as usize)
            .map(String::as_str)
            .unwrap_or(crate::encoding::NOTDEF)
    }

    /// Render the font as a PFA (ASCII) program.
    pub fn to_pfa(&self) -> Result<Vec<u8>> {
        writer::to_pfa(self)
    }

    /// Render the font as a PFB (binary-framed) stream.
    pub fn to_pfb(&self) -> Result<Vec<u8>> {
        writer::to_pfb(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_private_defaults() {
        let p = PrivateDict::default();
        assert_eq!(p.blue_scale, 0.039625);
        assert_eq!(p.blue_shift, 7.0);
        assert_eq!(p.blue_fuzz, 1.0);
        assert_eq!(p.len_iv, 4);
        assert!(!p.force_bold);
    }

    #[test]
    fn test_glyph_name_lookup() {
        let mut encoding = vec![crate::encoding::NOTDEF.to_string(); 256];
        encoding[65] = "A".to_string();
        let font = Font {
            font_name: "Demo".to_string(),
            font_info: FontInfo::default(),
            font_matrix: DEFAULT_FONT_MATRIX,
            font_bbox: [0.0; 4],
            encoding,
            private: PrivateDict::default(),
            subrs: Vec::new(),
            glyphs: IndexMap::new(),
        };
        assert_eq!(font.glyph_name(65), "A");
        assert_eq!(font.glyph_name(66), ".notdef");
    }
}
