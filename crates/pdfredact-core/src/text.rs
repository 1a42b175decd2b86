use crate::geometry::{Point, Quad};

/// A single glyph shown on a PDF page, positioned in user space.
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    /// Decoded text of the glyph. Usually one char, more for ligatures,
    /// U+FFFD when the font gives no way to decode the code.
    pub text: String,
    /// Glyph box from descent to ascent, start to advance.
    pub quad: Quad,
    /// Baseline origin of the glyph.
    pub origin: Point,
    /// Unit vector of the advance direction.
    pub direction: Point,
    /// Effective font size in user space (text size scaled by the matrices).
    pub size: f64,
    /// Character spacing added after the glyph, in user space along the
    /// advance direction.
    pub tracking: f64,
}

impl Glyph {
    /// Whether the glyph renders as whitespace.
    pub fn is_whitespace(&self) -> bool {
        !self.text.is_empty() && self.text.chars().all(char::is_whitespace)
    }

    /// Whether `next` continues the same line as `self`.
    ///
    /// Same advance direction and a perpendicular baseline offset of less
    /// than half the font size.
    pub fn same_line(&self, next: &Glyph) -> bool {
        let dot = self.direction.x * next.direction.x + self.direction.y * next.direction.y;
        if dot < 0.99 {
            return false;
        }
        let dx = next.origin.x - self.origin.x;
        let dy = next.origin.y - self.origin.y;
        let perpendicular = (dx * -self.direction.y + dy * self.direction.x).abs();
        perpendicular < self.size.max(next.size) * 0.5
    }

    /// Distance from the end of `self` to the start of `next`, along the line.
    ///
    /// Negative when `next` starts before `self` ends (overlap or backtrack).
    pub fn gap_to(&self, next: &Glyph) -> f64 {
        let end_x = self.origin.x + (self.quad.lr.x - self.quad.ll.x);
        let end_y = self.origin.y + (self.quad.lr.y - self.quad.ll.y);
        (next.origin.x - end_x) * self.direction.x + (next.origin.y - end_y) * self.direction.y
    }
}
