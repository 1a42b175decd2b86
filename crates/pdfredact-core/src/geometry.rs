//! Geometry primitives in PDF user space.
//!
//! All coordinates use the PDF convention: origin at the bottom-left of the
//! page, y growing upwards. Matrices follow the row-vector convention of the
//! PDF reference, `p' = p × M`.

/// Tolerance used by containment tests, in points.
const EPSILON: f64 = 1e-6;

/// A point in PDF user space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Midpoint between `self` and `other`.
    pub fn midpoint(&self, other: &Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    pub fn distance(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Axis-aligned rectangle in PDF user space.
///
/// - `x0`: left edge
/// - `y0`: bottom edge
/// - `x1`: right edge
/// - `y1`: top edge
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Rect {
    /// Build a rectangle, normalizing the corner order.
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    /// Width of the rectangle.
    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    /// Height of the rectangle.
    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    /// Compute the union of two rectangles.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    pub fn contains(&self, p: &Point) -> bool {
        p.x >= self.x0 - EPSILON
            && p.x <= self.x1 + EPSILON
            && p.y >= self.y0 - EPSILON
            && p.y <= self.y1 + EPSILON
    }
}

/// A PDF transformation matrix `[a b c d e f]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for Matrix {
    fn default() -> Self {
        Self::identity()
    }
}

impl Matrix {
    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }

    pub fn translate(tx: f64, ty: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    /// Matrix product `self × other`.
    ///
    /// With the row-vector convention this applies `self` first, then `other`.
    pub fn concat(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    pub fn transform(&self, p: Point) -> Point {
        Point::new(
            self.a * p.x + self.c * p.y + self.e,
            self.b * p.x + self.d * p.y + self.f,
        )
    }

    pub fn is_identity(&self) -> bool {
        *self == Matrix::identity()
    }
}

/// A quadrilateral, typically the transformed box of a run of glyphs.
///
/// Corner names follow the text direction: `ll`/`lr` lie on the descent
/// line, `ul`/`ur` on the ascent line, `l*` at the start of the run and
/// `r*` at its end. For unrotated text this is an ordinary rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Quad {
    pub ul: Point,
    pub ur: Point,
    pub ll: Point,
    pub lr: Point,
}

impl Quad {
    pub fn new(ul: Point, ur: Point, ll: Point, lr: Point) -> Self {
        Self { ul, ur, ll, lr }
    }

    pub fn from_rect(rect: &Rect) -> Self {
        Self {
            ul: Point::new(rect.x0, rect.y1),
            ur: Point::new(rect.x1, rect.y1),
            ll: Point::new(rect.x0, rect.y0),
            lr: Point::new(rect.x1, rect.y0),
        }
    }

    /// Join two quads on the same line: start edge of `self`, end edge of `other`.
    pub fn span_to(&self, other: &Quad) -> Quad {
        Quad {
            ul: self.ul,
            ll: self.ll,
            ur: other.ur,
            lr: other.lr,
        }
    }

    /// Corners in drawing order (`ll → lr → ur → ul`).
    pub fn corners(&self) -> [Point; 4] {
        [self.ll, self.lr, self.ur, self.ul]
    }

    pub fn center(&self) -> Point {
        self.ll.midpoint(&self.ur)
    }

    /// Smallest axis-aligned rectangle enclosing the quad.
    pub fn rect(&self) -> Rect {
        let corners = self.corners();
        let mut rect = Rect::new(corners[0].x, corners[0].y, corners[0].x, corners[0].y);
        for p in &corners[1..] {
            rect = rect.union(&Rect::new(p.x, p.y, p.x, p.y));
        }
        rect
    }

    /// Length of the start edge (the glyph height for text quads).
    pub fn height(&self) -> f64 {
        self.ll.distance(&self.ul)
    }

    /// Length of the baseline edge.
    pub fn width(&self) -> f64 {
        self.ll.distance(&self.lr)
    }

    /// True when the quad has no area.
    pub fn is_degenerate(&self) -> bool {
        self.height() < EPSILON || self.width() < EPSILON
    }

    /// Point-in-convex-polygon test; works for either winding order.
    pub fn contains(&self, p: &Point) -> bool {
        if self.is_degenerate() {
            return false;
        }
        let corners = self.corners();
        let mut sign = 0.0_f64;
        for i in 0..4 {
            let a = corners[i];
            let b = corners[(i + 1) % 4];
            let cross = (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x);
            if cross.abs() <= EPSILON {
                continue;
            }
            if sign == 0.0 {
                sign = cross.signum();
            } else if cross.signum() != sign {
                return false;
            }
        }
        true
    }
}
