//! CharString decoding.

use byteorder::{BigEndian, ByteOrder};

use crate::charstring::{Glyph, PathOp, Point};
use crate::error::{Error, ErrorKind, PostScriptError, Result};

/// Transient argument stack limit.
const MAX_ARG_STACK: usize = 32;
/// Subroutine nesting limit.
const MAX_SUBR_DEPTH: usize = 10;
/// Flex accumulates one reference point and six curve points.
const FLEX_POINTS: usize = 7;

fn font_error(message: impl Into<String>) -> Error {
    Error::Interpreter(PostScriptError::new(ErrorKind::InvalidFont, message))
}

/// Decode a (decrypted) CharString body into a glyph outline.
///
/// `subrs` are the font's decrypted local subroutines, indexed by
/// `callsubr`.
pub fn decode(code: &[u8], subrs: &[Vec<u8>]) -> Result<Glyph> {
    let mut d = Decoder {
        subrs,
        stack: Vec::with_capacity(MAX_ARG_STACK),
        ps_stack: Vec::new(),
        glyph: Glyph::default(),
        current: Point::default(),
        flex_points: Vec::new(),
        in_flex: false,
        finished: false,
    };
    d.run(code, 0)?;
    Ok(d.glyph)
}

struct Decoder<'a> {
    subrs: &'a [Vec<u8>],
    stack: Vec<f64>,
    /// Values left behind by `callothersubr` for the `pop` opcode.
    ps_stack: Vec<f64>,
    glyph: Glyph,
    current: Point,
    flex_points: Vec<Point>,
    in_flex: bool,
    finished: bool,
}

impl Decoder<'_> {
    fn run(&mut self, code: &[u8], depth: usize) -> Result<()> {
        if depth > MAX_SUBR_DEPTH {
            return Err(font_error("subroutine calls nested too deeply"));
        }
        let mut i = 0;
        while i < code.len() && !self.finished {
            let b = code[i];
            i += 1;
            match b {
                // Number encodings.
                32..=246 => self.push(b as f64 - 139.0)?,
                247..=250 => {
                    let w = *code.get(i).ok_or_else(|| font_error("truncated number"))?;
                    i += 1;
                    self.push((b as f64 - 247.0) * 256.0 + w as f64 + 108.0)?;
                }
                251..=254 => {
                    let w = *code.get(i).ok_or_else(|| font_error("truncated number"))?;
                    i += 1;
                    self.push(-((b as f64 - 251.0) * 256.0 + w as f64 + 108.0))?;
                }
                255 => {
                    if i + 4 > code.len() {
                        return Err(font_error("truncated 32-bit number"));
                    }
                    let v = BigEndian::read_i32(&code[i..i + 4]);
                    i += 4;
                    self.push(v as f64)?;
                }

                1 => self.stems(false)?,
                3 => self.stems(true)?,
                4 => {
                    let dy = self.take_args(1)?[0];
                    self.move_to(Point::new(0.0, dy));
                }
                5 => {
                    let a = self.take_args(2)?;
                    self.line_to(Point::new(a[0], a[1]));
                }
                6 => {
                    let dx = self.take_args(1)?[0];
                    self.line_to(Point::new(dx, 0.0));
                }
                7 => {
                    let dy = self.take_args(1)?[0];
                    self.line_to(Point::new(0.0, dy));
                }
                8 => {
                    let a = self.take_args(6)?;
                    self.curve_to(
                        Point::new(a[0], a[1]),
                        Point::new(a[2], a[3]),
                        Point::new(a[4], a[5]),
                    );
                }
                9 => {
                    self.stack.clear();
                    self.glyph.path.push(PathOp::ClosePath);
                }
                10 => {
                    let n = self
                        .stack
                        .pop()
                        .ok_or_else(|| font_error("callsubr: empty argument stack"))?;
                    let idx = n as usize;
                    if n < 0.0 || idx >= self.subrs.len() {
                        return Err(font_error(format!("callsubr: no subroutine {}", n)));
                    }
                    let body = self.subrs[idx].clone();
                    self.run(&body, depth + 1)?;
                }
                11 => return Ok(()),
                13 => {
                    let a = self.take_args(2)?;
                    self.glyph.side_bearing = Point::new(a[0], 0.0);
                    self.glyph.width = Point::new(a[1], 0.0);
                    self.current = self.glyph.side_bearing;
                }
                14 => self.finished = true,
                21 => {
                    let a = self.take_args(2)?;
                    self.move_to(Point::new(a[0], a[1]));
                }
                22 => {
                    let dx = self.take_args(1)?[0];
                    self.move_to(Point::new(dx, 0.0));
                }
                30 => {
                    let a = self.take_args(4)?;
                    // First tangent vertical, last horizontal.
                    self.curve_to(
                        Point::new(0.0, a[0]),
                        Point::new(a[1], a[2]),
                        Point::new(a[3], 0.0),
                    );
                }
                31 => {
                    let a = self.take_args(4)?;
                    // First tangent horizontal, last vertical.
                    self.curve_to(
                        Point::new(a[0], 0.0),
                        Point::new(a[1], a[2]),
                        Point::new(0.0, a[3]),
                    );
                }
                12 => {
                    let ext = *code.get(i).ok_or_else(|| font_error("truncated escape opcode"))?;
                    i += 1;
                    self.extended(ext)?;
                }
                _ => return Err(font_error(format!("invalid CharString opcode {}", b))),
            }
        }
        Ok(())
    }

    fn extended(&mut self, op: u8) -> Result<()> {
        match op {
            // dotsection
            0 => self.stack.clear(),
            // vstem3 / hstem3
            1 => self.stems(true)?,
            2 => self.stems(false)?,
            // sbw
            7 => {
                let a = self.take_args(4)?;
                self.glyph.side_bearing = Point::new(a[0], a[1]);
                self.glyph.width = Point::new(a[2], a[3]);
                self.current = self.glyph.side_bearing;
            }
            // div
            12 => {
                let b = self
                    .stack
                    .pop()
                    .ok_or_else(|| font_error("div: empty argument stack"))?;
                let a = self
                    .stack
                    .pop()
                    .ok_or_else(|| font_error("div: empty argument stack"))?;
                if b == 0.0 {
                    return Err(font_error("div: division by zero"));
                }
                self.push(a / b)?;
            }
            // callothersubr
            16 => self.call_other_subr()?,
            // pop
            17 => {
                let v = self
                    .ps_stack
                    .pop()
                    .ok_or_else(|| font_error("pop: nothing returned by an OtherSubr"))?;
                self.push(v)?;
            }
            // setcurrentpoint
            33 => {
                let a = self.take_args(2)?;
                self.current = Point::new(a[0], a[1]);
            }
            _ => return Err(font_error(format!("invalid CharString opcode 12 {}", op))),
        }
        Ok(())
    }

    /// The standard OtherSubrs: 0-2 implement Flex, 3 hint replacement.
    /// Anything else is outside the conventions this decoder understands.
    fn call_other_subr(&mut self) -> Result<()> {
        let id = self
            .stack
            .pop()
            .ok_or_else(|| font_error("callothersubr: empty argument stack"))?;
        let n = self
            .stack
            .pop()
            .ok_or_else(|| font_error("callothersubr: empty argument stack"))?;
        let n = n as usize;
        if n > self.stack.len() {
            return Err(font_error("callothersubr: not enough arguments"));
        }
        let args = self.stack.split_off(self.stack.len() - n);
        match id as i64 {
            0 => {
                // End flex: args are (flex height, end x, end y).
                if args.len() < 3 {
                    return Err(font_error("flex: expected 3 arguments"));
                }
                if self.flex_points.len() != FLEX_POINTS {
                    return Err(font_error(format!(
                        "flex: expected {} reference points, got {}",
                        FLEX_POINTS,
                        self.flex_points.len()
                    )));
                }
                let p = &self.flex_points;
                self.glyph.path.push(PathOp::CurveTo(p[1], p[2], p[3]));
                self.glyph.path.push(PathOp::CurveTo(p[4], p[5], p[6]));
                self.current = p[6];
                self.in_flex = false;
                self.flex_points.clear();
                // The following `pop pop setcurrentpoint` retrieves x, y.
                self.ps_stack.push(args[2]);
                self.ps_stack.push(args[1]);
            }
            1 => {
                self.in_flex = true;
                self.flex_points.clear();
            }
            2 => {} // one flex point recorded; the rmoveto already did it
            3 => {
                // Hint replacement: hand the subroutine number back for the
                // `pop ... callsubr` that follows.
                self.ps_stack.push(args.first().copied().unwrap_or(3.0));
            }
            4 => {
                // Reserved in the conventions; pass the arguments through.
                for v in args.into_iter().rev() {
                    self.ps_stack.push(v);
                }
            }
            other => {
                return Err(font_error(format!("unknown OtherSubr {}", other)));
            }
        }
        Ok(())
    }

    fn push(&mut self, v: f64) -> Result<()> {
        if self.stack.len() >= MAX_ARG_STACK {
            return Err(Error::Interpreter(PostScriptError::new(
                ErrorKind::LimitCheck,
                "CharString argument stack overflow",
            )));
        }
        self.stack.push(v);
        Ok(())
    }

    fn take_args(&mut self, n: usize) -> Result<Vec<f64>> {
        if self.stack.len() < n {
            return Err(font_error("not enough CharString arguments"));
        }
        let args = self.stack.split_off(self.stack.len() - n);
        self.stack.clear();
        Ok(args)
    }

    /// Record stem hint pairs from the argument stack.
    fn stems(&mut self, vertical: bool) -> Result<()> {
        if self.stack.len() % 2 != 0 {
            return Err(font_error("stem hint arguments are not pairs"));
        }
        let pairs: Vec<(f64, f64)> = self.stack.chunks(2).map(|c| (c[0], c[1])).collect();
        if vertical {
            self.glyph.vstem.extend(pairs);
        } else {
            self.glyph.hstem.extend(pairs);
        }
        self.stack.clear();
        Ok(())
    }

    fn move_to(&mut self, delta: Point) {
        self.current = self.current + delta;
        if self.in_flex {
            self.flex_points.push(self.current);
        } else {
            self.glyph.path.push(PathOp::MoveTo(self.current));
        }
    }

    fn line_to(&mut self, delta: Point) {
        self.current = self.current + delta;
        self.glyph.path.push(PathOp::LineTo(self.current));
    }

    fn curve_to(&mut self, d1: Point, d2: Point, d3: Point) {
        let c1 = self.current + d1;
        let c2 = c1 + d2;
        let end = c2 + d3;
        self.glyph.path.push(PathOp::CurveTo(c1, c2, end));
        self.current = end;
    }
}
