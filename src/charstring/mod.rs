//! The Type 1 CharString codec.
//!
//! CharStrings are Adobe's stack-based glyph bytecode. The decoder executes
//! the subset needed for outlines (including subroutine calls, Flex and hint
//! replacement via the standard OtherSubrs) and produces a [`Glyph`]: an
//! absolute-coordinate path plus advance width, side bearing and stem hints.
//! The encoder is the inverse, choosing the shortest numeric encodings and
//! the axis-aligned opcode forms where a delta is zero.

mod decoder;
mod encoder;

pub use decoder::decode;
pub use encoder::encode;

/// A point or vector in glyph space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Point {
    /// Construct a point.
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }
}

impl std::ops::Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// One command of a decoded glyph outline, in absolute coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathOp {
    /// Start a new subpath.
    MoveTo(Point),
    /// Straight segment to the point.
    LineTo(Point),
    /// Cubic Bézier via two control points.
    CurveTo(Point, Point, Point),
    /// Close the current subpath.
    ClosePath,
}

/// A decoded glyph: outline, metrics and hints.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Glyph {
    /// The outline in absolute glyph-space coordinates.
    pub path: Vec<PathOp>,
    /// Advance width vector (`wx`, `wy`); `wy` is zero for `hsbw` glyphs.
    pub width: Point,
    /// Left side bearing; the start of the first subpath is relative to it.
    pub side_bearing: Point,
    /// Horizontal stem hints as (y, dy) pairs.
    pub hstem: Vec<(f64, f64)>,
    /// Vertical stem hints as (x, dx) pairs.
    pub vstem: Vec<(f64, f64)>,
}

impl Glyph {
    /// True if the glyph has no outline (a space-like glyph).
    pub fn is_blank(&self) -> bool {
        self.path.is_empty()
    }

    /// Bounding box of the outline's control hull as llx, lly, urx, ury.
    /// Curve control points are included, so the box may slightly exceed
    /// the exact curve extents. None for blank glyphs.
    pub fn bounding_box(&self) -> Option<[f64; 4]> {
        let mut bbox: Option<[f64; 4]> = None;
        let mut extend = |p: &Point| match &mut bbox {
            Some(b) => {
                b[0] = b[0].min(p.x);
                b[1] = b[1].min(p.y);
                b[2] = b[2].max(p.x);
                b[3] = b[3].max(p.y);
            }
            None => bbox = Some([p.x, p.y, p.x, p.y]),
        };
        for op in &self.path {
            match op {
                PathOp::MoveTo(p) | PathOp::LineTo(p) => extend(p),
                PathOp::CurveTo(c1, c2, p) => {
                    extend(c1);
                    extend(c2);
                    extend(p);
                }
                PathOp::ClosePath => {}
            }
        }
        bbox
    }
}
