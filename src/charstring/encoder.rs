//! CharString encoding.
//!
//! The inverse of the decoder: absolute path commands become relative
//! deltas, each number gets its shortest encoding, and axis-aligned moves,
//! lines and curves use the compact opcode forms.

use byteorder::{BigEndian, WriteBytesExt};

use crate::charstring::{Glyph, PathOp, Point};
use crate::error::{Error, ErrorKind, PostScriptError, Result};

/// Denominator used to express non-integral coordinates via `div`.
const FRACTION_DENOMINATOR: f64 = 65536.0;

/// Encode a glyph into a plain (unencrypted) CharString body.
pub fn encode(glyph: &Glyph) -> Result<Vec<u8>> {
    let mut out = Vec::new();

    // Metrics come first: hsbw for purely horizontal metrics, sbw otherwise.
    if glyph.width.y == 0.0 && glyph.side_bearing.y == 0.0 {
        push_number(&mut out, glyph.side_bearing.x)?;
        push_number(&mut out, glyph.width.x)?;
        out.push(13);
    } else {
        push_number(&mut out, glyph.side_bearing.x)?;
        push_number(&mut out, glyph.side_bearing.y)?;
        push_number(&mut out, glyph.width.x)?;
        push_number(&mut out, glyph.width.y)?;
        out.extend_from_slice(&[12, 7]);
    }

    for &(a, b) in &glyph.hstem {
        push_number(&mut out, a)?;
        push_number(&mut out, b)?;
        out.push(1);
    }
    for &(a, b) in &glyph.vstem {
        push_number(&mut out, a)?;
        push_number(&mut out, b)?;
        out.push(3);
    }

    let mut current = glyph.side_bearing;
    for op in &glyph.path {
        match op {
            PathOp::MoveTo(p) => {
                let d = *p - current;
                axis_op(&mut out, d, 22, 4, 21)?;
                current = *p;
            }
            PathOp::LineTo(p) => {
                let d = *p - current;
                axis_op(&mut out, d, 6, 7, 5)?;
                current = *p;
            }
            PathOp::CurveTo(c1, c2, p) => {
                let d1 = *c1 - current;
                let d2 = *c2 - *c1;
                let d3 = *p - *c2;
                if d1.y == 0.0 && d3.x == 0.0 {
                    // First tangent horizontal, last vertical.
                    push_number(&mut out, d1.x)?;
                    push_number(&mut out, d2.x)?;
                    push_number(&mut out, d2.y)?;
                    push_number(&mut out, d3.y)?;
                    out.push(31);
                } else if d1.x == 0.0 && d3.y == 0.0 {
                    // First tangent vertical, last horizontal.
                    push_number(&mut out, d1.y)?;
                    push_number(&mut out, d2.x)?;
                    push_number(&mut out, d2.y)?;
                    push_number(&mut out, d3.x)?;
                    out.push(30);
                } else {
                    push_number(&mut out, d1.x)?;
                    push_number(&mut out, d1.y)?;
                    push_number(&mut out, d2.x)?;
                    push_number(&mut out, d2.y)?;
                    push_number(&mut out, d3.x)?;
                    push_number(&mut out, d3.y)?;
                    out.push(8);
                }
                current = *p;
            }
            PathOp::ClosePath => out.push(9),
        }
    }

    out.push(14);
    Ok(out)
}

/// Emit a delta with the horizontal/vertical short form when one axis is
/// zero.
fn axis_op(out: &mut Vec<u8>, d: Point, h_op: u8, v_op: u8, full_op: u8) -> Result<()> {
    if d.y == 0.0 {
        push_number(out, d.x)?;
        out.push(h_op);
    } else if d.x == 0.0 {
        push_number(out, d.y)?;
        out.push(v_op);
    } else {
        push_number(out, d.x)?;
        push_number(out, d.y)?;
        out.push(full_op);
    }
    Ok(())
}

/// Emit a number with the shortest encoding. Non-integral values are
/// expressed as `a 65536 div`.
fn push_number(out: &mut Vec<u8>, v: f64) -> Result<()> {
    if v.fract() == 0.0 {
        push_integer(out, v)
    } else {
        let scaled = (v * FRACTION_DENOMINATOR).round();
        push_integer(out, scaled)?;
        push_integer(out, FRACTION_DENOMINATOR)?;
        out.extend_from_slice(&[12, 12]);
        Ok(())
    }
}

fn push_integer(out: &mut Vec<u8>, v: f64) -> Result<()> {
    if v < i32::MIN as f64 || v > i32::MAX as f64 {
        return Err(Error::Interpreter(PostScriptError::new(
            ErrorKind::RangeCheck,
            format!("CharString number {} out of range", v),
        )));
    }
    let v = v as i32;
    match v {
        -107..=107 => out.push((v + 139) as u8),
        108..=1131 => {
            let v = v - 108;
            out.push(247 + (v >> 8) as u8);
            out.push((v & 0xFF) as u8);
        }
        -1131..=-108 => {
            let v = -v - 108;
            out.push(251 + (v >> 8) as u8);
            out.push((v & 0xFF) as u8);
        }
        _ => {
            out.push(255);
            out.write_i32::<BigEndian>(v).expect("write to vec");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charstring::decode;

    #[test]
    fn test_integer_encodings() {
        let mut out = Vec::new();
        push_integer(&mut out, 0.0).unwrap();
        assert_eq!(out, vec![139]);

        let mut out = Vec::new();
        push_integer(&mut out, 107.0).unwrap();
        assert_eq!(out, vec![246]);

        let mut out = Vec::new();
        push_integer(&mut out, 108.0).unwrap();
        assert_eq!(out, vec![247, 0]);

        let mut out = Vec::new();
        push_integer(&mut out, 600.0).unwrap();
        assert_eq!(out, vec![248, 236]);

        let mut out = Vec::new();
        push_integer(&mut out, -300.0).unwrap();
        assert_eq!(out, vec![251, 192]);

        let mut out = Vec::new();
        push_integer(&mut out, 70000.0).unwrap();
        assert_eq!(out, vec![255, 0, 1, 17, 112]);
    }

    #[test]
    fn test_number_out_of_range() {
        let mut out = Vec::new();
        let err = push_integer(&mut out, 3e9).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::RangeCheck));
    }

    #[test]
    fn test_axis_aligned_forms_chosen() {
        let glyph = Glyph {
            path: vec![
                PathOp::MoveTo(Point::new(10.0, 0.0)),
                PathOp::LineTo(Point::new(110.0, 0.0)),
                PathOp::LineTo(Point::new(110.0, 50.0)),
                PathOp::ClosePath,
            ],
            width: Point::new(500.0, 0.0),
            side_bearing: Point::new(0.0, 0.0),
            ..Glyph::default()
        };
        let code = encode(&glyph).unwrap();
        // hmoveto (22), hlineto (6), vlineto (7) must all appear; the
        // general forms must not.
        assert!(code.contains(&22));
        assert!(code.contains(&6));
        assert!(code.contains(&7));
        assert!(!code.contains(&21));
        assert!(!code.contains(&5));
        assert_eq!(*code.last().unwrap(), 14);
    }

    #[test]
    fn test_decode_encode_identity() {
        let glyph = Glyph {
            path: vec![
                PathOp::MoveTo(Point::new(25.0, 0.0)),
                PathOp::LineTo(Point::new(25.0, 700.0)),
                PathOp::CurveTo(
                    Point::new(100.0, 750.0),
                    Point::new(200.0, 750.0),
                    Point::new(275.0, 700.0),
                ),
                PathOp::LineTo(Point::new(275.0, 0.0)),
                PathOp::ClosePath,
            ],
            width: Point::new(300.0, 0.0),
            side_bearing: Point::new(25.0, 0.0),
            hstem: vec![(0.0, 20.0)],
            vstem: vec![(25.0, 30.0)],
        };
        let code = encode(&glyph).unwrap();
        let back = decode(&code, &[]).unwrap();
        assert_eq!(back, glyph);
    }

    #[test]
    fn test_sbw_round_trip() {
        let glyph = Glyph {
            path: vec![PathOp::MoveTo(Point::new(10.0, 5.0))],
            width: Point::new(0.0, -1000.0),
            side_bearing: Point::new(5.0, 5.0),
            ..Glyph::default()
        };
        let code = encode(&glyph).unwrap();
        assert_eq!(&code[..2], &[144, 144]); // 5 5
        let back = decode(&code, &[]).unwrap();
        assert_eq!(back, glyph);
    }

    #[test]
    fn test_fractional_coordinate_round_trip() {
        let glyph = Glyph {
            path: vec![PathOp::MoveTo(Point::new(12.5, 0.0))],
            width: Point::new(100.0, 0.0),
            ..Glyph::default()
        };
        let code = encode(&glyph).unwrap();
        let back = decode(&code, &[]).unwrap();
        assert_eq!(back.path, vec![PathOp::MoveTo(Point::new(12.5, 0.0))]);
    }
}
