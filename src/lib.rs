//! # PostScript Oxide
//!
//! A PostScript Level-1 interpreter specialized for reading font programs:
//! Type 1 fonts (PFA/PFB), Adobe Font Metrics files, and PostScript
//! character-map (CMap) resources.
//!
//! ## What it does
//!
//! Font programs are *programs*: a Type 1 font defines its dictionaries by
//! executing PostScript, hides its outlines behind the `eexec` cipher, and
//! reads its own binary CharStrings through `currentfile`. A CMap resource
//! builds its code tables by calling the `CIDInit` ProcSet. This crate runs
//! those programs in a small stack VM and hands back the results as
//! structured values:
//!
//! - [`type1::Font`]: font matrix, FontInfo, Private hints, the 256-slot
//!   encoding, and every CharString decoded into an outline path
//! - [`cmap::CMap`]: codespace ranges and char/range mappings, sorted
//!   deterministically
//! - [`afm::FontMetrics`]: per-glyph widths, bounding boxes, ligatures and
//!   kern pairs
//!
//! Writers exist for the same surfaces: [`type1::Font::to_pfa`] /
//! [`type1::Font::to_pfb`] re-encrypt and re-encode a font so that this
//! crate's own reader round-trips it, and [`afm::FontMetrics::render`] does
//! the same for metrics.
//!
//! ## Quick start
//!
//! ```no_run
//! use postscript_oxide::type1::Font;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let data = std::fs::read("DemoSans.pfb")?;
//! let font = Font::parse(&data)?;
//! println!("{} glyphs in {}", font.glyphs.len(), font.font_name);
//! for (name, glyph) in &font.glyphs {
//!     println!("/{} advance {}", name, glyph.width.x);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Driving the interpreter directly:
//!
//! ```
//! use postscript_oxide::Interpreter;
//!
//! let mut interp = Interpreter::new();
//! interp.execute_string("/inc {1 add} def 2 inc").unwrap();
//! assert_eq!(interp.operand_stack[0].as_integer(), Some(3));
//! ```
//!
//! ## Scope
//!
//! The interpreter implements the Red Book subset font programs actually
//! use: ~80 operators, the `{ ... }` scanning rule, `errordict` routing,
//! and the `eexec`/CharString ciphers. It does not render, and it does not
//! implement Level-2 features (packed arrays, save/restore snapshots).

#![warn(missing_docs)]

// Error handling
pub mod error;

// The interpreter core
pub mod interpreter;
pub mod object;
pub mod scanner;
pub(crate) mod operators;

// Ciphers and static tables
pub mod crypt;
pub mod encoding;

// Resource builders
pub mod afm;
pub mod charstring;
pub mod cmap;
pub mod type1;

pub use error::{Error, ErrorKind, PostScriptError, Result};
pub use interpreter::Interpreter;
pub use object::Object;
