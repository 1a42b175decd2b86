//! Text state for the content walker.
//!
//! Tracks the text object (BT/ET), the font and spacing parameters set by
//! Tf, Tc, Tw, Tz, TL and Ts, and the text and line matrices moved by Tm,
//! Td, TD, T* and glyph advances.

use pdfredact_core::Matrix;

/// Text parameters saved and restored by `q`/`Q`.
///
/// The text and line matrices are not part of the graphics state.
#[derive(Debug, Clone, PartialEq)]
pub struct TextParams {
    pub char_spacing: f64,
    pub word_spacing: f64,
    /// Horizontal scaling in percent (100 = normal).
    pub h_scaling: f64,
    pub leading: f64,
    /// Resource name of the current font.
    pub font_name: Vec<u8>,
    pub font_size: f64,
    pub rise: f64,
}

impl Default for TextParams {
    fn default() -> Self {
        Self {
            char_spacing: 0.0,
            word_spacing: 0.0,
            h_scaling: 100.0,
            leading: 0.0,
            font_name: Vec::new(),
            font_size: 0.0,
            rise: 0.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextState {
    pub params: TextParams,
    in_text_object: bool,
    text_matrix: Matrix,
    line_matrix: Matrix,
}

impl TextState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_text_object(&self) -> bool {
        self.in_text_object
    }

    pub fn text_matrix(&self) -> &Matrix {
        &self.text_matrix
    }

    pub fn line_matrix(&self) -> &Matrix {
        &self.line_matrix
    }

    /// `BT`: reset both matrices to identity.
    pub fn begin_text(&mut self) {
        self.text_matrix = Matrix::identity();
        self.line_matrix = Matrix::identity();
        self.in_text_object = true;
    }

    /// `ET`
    pub fn end_text(&mut self) {
        self.in_text_object = false;
    }

    /// `Tm`: replace (not concatenate) the text and line matrices.
    pub fn set_text_matrix(&mut self, m: Matrix) {
        self.text_matrix = m;
        self.line_matrix = m;
    }

    /// `Td`: offset from the start of the current line.
    pub fn move_text_position(&mut self, tx: f64, ty: f64) {
        self.line_matrix = Matrix::translate(tx, ty).concat(&self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    /// `TD`: `-ty TL` followed by `tx ty Td`.
    pub fn move_text_position_and_set_leading(&mut self, tx: f64, ty: f64) {
        self.params.leading = -ty;
        self.move_text_position(tx, ty);
    }

    /// `T*`
    pub fn move_to_next_line(&mut self) {
        let leading = self.params.leading;
        self.move_text_position(0.0, -leading);
    }

    /// Move the text matrix along the baseline by `tx` text-space units.
    pub fn advance(&mut self, tx: f64) {
        self.text_matrix = Matrix::translate(tx, 0.0).concat(&self.text_matrix);
    }

    /// Horizontal scaling as a factor.
    pub fn h_scale(&self) -> f64 {
        self.params.h_scaling / 100.0
    }

    /// Text rendering matrix for the next glyph under `ctm`.
    ///
    /// Maps glyph space, in 1/1000 em units scaled to one em, into device
    /// (default user) space.
    pub fn rendering_matrix(&self, ctm: &Matrix) -> Matrix {
        let p = &self.params;
        Matrix::new(p.font_size * self.h_scale(), 0.0, 0.0, p.font_size, 0.0, p.rise)
            .concat(&self.text_matrix)
            .concat(ctm)
    }

    /// Advance of one glyph of width `width` (1/1000 em).
    pub fn glyph_advance(&self, width: f64, is_space: bool) -> f64 {
        let p = &self.params;
        let spacing = p.char_spacing + if is_space { p.word_spacing } else { 0.0 };
        (width / 1000.0 * p.font_size + spacing) * self.h_scale()
    }

    /// Advance produced by a TJ number adjustment.
    pub fn adjustment_advance(&self, adjustment: f64) -> f64 {
        -adjustment / 1000.0 * self.params.font_size * self.h_scale()
    }

    /// TJ number that advances exactly as one glyph of `width` would.
    pub fn replacement_adjustment(&self, width: f64, is_space: bool) -> f64 {
        let p = &self.params;
        if p.font_size == 0.0 {
            return -width;
        }
        let spacing = p.char_spacing + if is_space { p.word_spacing } else { 0.0 };
        -(width + spacing * 1000.0 / p.font_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdfredact_core::Point;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn defaults() {
        let ts = TextState::new();
        assert_eq!(ts.params.h_scaling, 100.0);
        assert_eq!(ts.params.font_size, 0.0);
        assert!(!ts.in_text_object());
        assert!(ts.text_matrix().is_identity());
    }

    #[test]
    fn begin_text_resets_matrices() {
        let mut ts = TextState::new();
        ts.begin_text();
        ts.move_text_position(100.0, 200.0);
        assert!(!ts.text_matrix().is_identity());
        ts.end_text();
        assert!(!ts.in_text_object());
        ts.begin_text();
        assert!(ts.text_matrix().is_identity());
        assert!(ts.line_matrix().is_identity());
    }

    #[test]
    fn td_accumulates_from_line_start() {
        let mut ts = TextState::new();
        ts.begin_text();
        ts.move_text_position(72.0, 720.0);
        ts.advance(30.0);
        ts.move_text_position(0.0, -14.0);
        assert_approx(ts.text_matrix().e, 72.0);
        assert_approx(ts.text_matrix().f, 706.0);
    }

    #[test]
    fn td_respects_scaled_text_matrix() {
        let mut ts = TextState::new();
        ts.begin_text();
        ts.set_text_matrix(Matrix::new(2.0, 0.0, 0.0, 2.0, 10.0, 10.0));
        ts.move_text_position(5.0, 5.0);
        assert_approx(ts.text_matrix().e, 20.0);
        assert_approx(ts.text_matrix().f, 20.0);
    }

    #[test]
    fn t_star_uses_leading_from_td_upper() {
        let mut ts = TextState::new();
        ts.begin_text();
        ts.move_text_position_and_set_leading(50.0, -12.0);
        assert_eq!(ts.params.leading, 12.0);
        ts.move_to_next_line();
        assert_approx(ts.text_matrix().e, 50.0);
        assert_approx(ts.text_matrix().f, -24.0);
    }

    #[test]
    fn glyph_advance_includes_spacing_and_scaling() {
        let mut ts = TextState::new();
        ts.params.font_size = 10.0;
        ts.params.char_spacing = 1.0;
        ts.params.word_spacing = 2.0;
        assert_approx(ts.glyph_advance(500.0, false), 6.0);
        assert_approx(ts.glyph_advance(500.0, true), 8.0);
        ts.params.h_scaling = 50.0;
        assert_approx(ts.glyph_advance(500.0, true), 4.0);
    }

    #[test]
    fn replacement_adjustment_matches_glyph_advance() {
        let mut ts = TextState::new();
        ts.params.font_size = 12.0;
        ts.params.char_spacing = 0.5;
        ts.params.word_spacing = 3.0;
        ts.params.h_scaling = 80.0;
        for is_space in [false, true] {
            let n = ts.replacement_adjustment(556.0, is_space);
            assert_approx(ts.adjustment_advance(n), ts.glyph_advance(556.0, is_space));
        }
    }

    #[test]
    fn rendering_matrix_places_glyph_origin() {
        let mut ts = TextState::new();
        ts.begin_text();
        ts.params.font_size = 12.0;
        ts.params.rise = 3.0;
        ts.move_text_position(72.0, 720.0);
        let ctm = Matrix::new(1.0, 0.0, 0.0, 1.0, 0.0, -20.0);
        let trm = ts.rendering_matrix(&ctm);
        let origin = trm.transform(Point::new(0.0, 0.0));
        assert_approx(origin.x, 72.0);
        assert_approx(origin.y, 703.0);
        let top = trm.transform(Point::new(0.0, 1.0));
        assert_approx(top.y - origin.y, 12.0);
    }
}
