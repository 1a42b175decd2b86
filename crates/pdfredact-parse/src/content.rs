//! Content stream walker.
//!
//! Runs the graphics and text state operators of a page content stream and
//! records every shown glyph with its position in user space and the place
//! in the operation list it came from, so a later pass can delete it.
//!
//! Form XObjects drawn with `Do` are walked in place, under the form's
//! `/Matrix` and with its own `/Resources`. Every placement of a form (the
//! stream that draws it and the resource name it is drawn under) gets its
//! own entry in [`PageContent::streams`], so a rewrite can replace the form
//! for that placement alone.

use std::collections::HashMap;
use std::ops::Range;

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use pdfredact_core::{Glyph, Matrix, Point, Quad};

use crate::error::BackendError;
use crate::fonts::{FontCache, number, resolve};
use crate::text_state::{TextParams, TextState};

/// Forms nested deeper than this are not entered.
const MAX_FORM_DEPTH: usize = 12;

/// Where a glyph was shown, and how to remove it without moving the rest.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphSource {
    /// Index into [`PageContent::streams`].
    pub stream: usize,
    /// Index of the text-showing operation within that stream.
    pub op_index: usize,
    /// Operand index for `Tj`, `'` and `"`; array element index for `TJ`.
    pub element: usize,
    /// Byte range of the character code within that string.
    pub bytes: Range<usize>,
    /// TJ number that advances exactly as far as the glyph did.
    pub adjustment: f64,
}

/// Which object a walked stream belongs to.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamOrigin {
    /// The page's `/Contents`.
    Page,
    /// A Form XObject drawn by stream `parent` under resource `name`.
    Form {
        id: ObjectId,
        parent: usize,
        name: Vec<u8>,
    },
}

/// One walked content stream.
#[derive(Debug, Clone)]
pub struct ContentStream {
    pub origin: StreamOrigin,
    pub operations: Vec<Operation>,
    /// Resources the stream's names resolve against.
    pub resources: Dictionary,
    /// `q` operators still open at the end of the stream.
    pub unclosed_saves: usize,
    /// Indices of `Q` operators with no matching `q`.
    pub unmatched_restores: Vec<usize>,
}

/// Positioned glyphs of a page and the streams that show them.
///
/// The page stream is always `streams[0]`; a form is always listed after
/// the stream that draws it.
#[derive(Debug, Clone, Default)]
pub struct PageContent {
    pub streams: Vec<ContentStream>,
    pub glyphs: Vec<Glyph>,
    /// Parallel to `glyphs`.
    pub sources: Vec<GlyphSource>,
}

/// Parse a decoded content stream into operations.
pub fn decode_operations(data: &[u8]) -> Result<Vec<Operation>, BackendError> {
    Content::decode(data)
        .map(|content| content.operations)
        .map_err(|e| BackendError::Interpreter(format!("failed to parse content stream: {e}")))
}

/// Serialize operations back into content stream bytes.
pub fn encode_operations(operations: Vec<Operation>) -> Result<Vec<u8>, BackendError> {
    Content { operations }
        .encode()
        .map_err(|e| BackendError::Interpreter(format!("failed to encode content stream: {e}")))
}

/// Decode a stream's data, decompressing if needed.
pub fn decode_stream(stream: &Stream) -> Result<Vec<u8>, BackendError> {
    if stream.dict.get(b"Filter").is_ok() {
        stream
            .decompressed_content()
            .map_err(|e| BackendError::Parse(format!("failed to decompress content stream: {e}")))
    } else {
        Ok(stream.content.clone())
    }
}

struct Walker<'a> {
    doc: &'a Document,
    ctm: Matrix,
    text: TextState,
    out: PageContent,
    /// Stream index of each form placement already seen.
    placements: HashMap<(usize, Vec<u8>), usize>,
    /// Forms being walked, innermost last.
    ancestors: Vec<ObjectId>,
}

/// Walk a page's `operations`, positioning every glyph they show.
///
/// `resources` is the page's effective resource dictionary. Fails when a
/// form drawn by the page cannot be decoded.
pub fn walk(
    doc: &Document,
    resources: &Dictionary,
    operations: Vec<Operation>,
) -> Result<PageContent, BackendError> {
    let mut walker = Walker {
        doc,
        ctm: Matrix::identity(),
        text: TextState::new(),
        out: PageContent::default(),
        placements: HashMap::new(),
        ancestors: Vec::new(),
    };
    walker.out.streams.push(ContentStream {
        origin: StreamOrigin::Page,
        operations: Vec::new(),
        resources: resources.clone(),
        unclosed_saves: 0,
        unmatched_restores: Vec::new(),
    });
    let mut fonts = FontCache::from_resources(doc, resources);
    let (unclosed_saves, unmatched_restores) =
        walker.run(0, &operations, resources, &mut fonts)?;

    let page = &mut walker.out.streams[0];
    page.operations = operations;
    page.unclosed_saves = unclosed_saves;
    page.unmatched_restores = unmatched_restores;
    Ok(walker.out)
}

fn numbers<const N: usize>(operands: &[Object]) -> Option<[f64; N]> {
    if operands.len() < N {
        return None;
    }
    let mut values = [0.0; N];
    for (slot, obj) in values.iter_mut().zip(&operands[operands.len() - N..]) {
        *slot = number(obj)?;
    }
    Some(values)
}

fn string_operand(op: &Operation, index: usize) -> Option<&[u8]> {
    match op.operands.get(index) {
        Some(Object::String(bytes, _)) => Some(bytes.as_slice()),
        _ => None,
    }
}

impl<'a> Walker<'a> {
    /// Walk one stream; returns its open `q` count and unmatched `Q` indices.
    fn run(
        &mut self,
        stream: usize,
        operations: &[Operation],
        resources: &'a Dictionary,
        fonts: &mut FontCache,
    ) -> Result<(usize, Vec<usize>), BackendError> {
        let mut stack: Vec<(Matrix, TextParams)> = Vec::new();
        let mut unmatched = Vec::new();
        for (index, op) in operations.iter().enumerate() {
            match op.operator.as_str() {
                "q" => stack.push((self.ctm, self.text.params.clone())),
                "Q" => match stack.pop() {
                    Some((ctm, params)) => {
                        self.ctm = ctm;
                        self.text.params = params;
                    }
                    None => unmatched.push(index),
                },
                "Do" => self.draw_form(stream, op, resources, fonts)?,
                _ => self.apply(stream, index, op, fonts),
            }
        }
        Ok((stack.len(), unmatched))
    }

    /// Walk the Form XObject named by a `Do` operation.
    ///
    /// Images, unknown names and forms already being walked are skipped.
    fn draw_form(
        &mut self,
        parent: usize,
        op: &Operation,
        resources: &'a Dictionary,
        fonts: &mut FontCache,
    ) -> Result<(), BackendError> {
        let doc = self.doc;
        let Some(Object::Name(name)) = op.operands.first() else {
            return Ok(());
        };
        let Some(id) = resources
            .get(b"XObject")
            .ok()
            .and_then(|o| resolve(doc, o).as_dict().ok())
            .and_then(|xobjects| xobjects.get(name).ok())
            .and_then(|o| o.as_reference().ok())
        else {
            return Ok(());
        };
        let Ok(form) = doc.get_object(id).and_then(Object::as_stream) else {
            return Ok(());
        };
        if form.dict.get(b"Subtype").and_then(Object::as_name).ok() != Some(b"Form".as_slice()) {
            return Ok(());
        }
        if self.ancestors.contains(&id) || self.ancestors.len() >= MAX_FORM_DEPTH {
            #[cfg(feature = "tracing")]
            tracing::warn!(form = ?id, depth = self.ancestors.len(), "form not entered");
            return Ok(());
        }

        let operations = decode_stream(form).and_then(|data| decode_operations(&data))?;
        let own_resources = form
            .dict
            .get(b"Resources")
            .ok()
            .and_then(|o| resolve(doc, o).as_dict().ok());
        let matrix = form
            .dict
            .get(b"Matrix")
            .ok()
            .and_then(|o| resolve(doc, o).as_array().ok())
            .and_then(|m| numbers::<6>(m))
            .map_or_else(Matrix::identity, |[a, b, c, d, e, f]| Matrix::new(a, b, c, d, e, f));

        let index = match self.placements.get(&(parent, name.clone())) {
            Some(&index) => index,
            None => {
                let index = self.out.streams.len();
                self.out.streams.push(ContentStream {
                    origin: StreamOrigin::Form {
                        id,
                        parent,
                        name: name.clone(),
                    },
                    operations: Vec::new(),
                    resources: own_resources.unwrap_or(resources).clone(),
                    unclosed_saves: 0,
                    unmatched_restores: Vec::new(),
                });
                self.placements.insert((parent, name.clone()), index);
                index
            }
        };

        let saved = (self.ctm, self.text.clone());
        self.ctm = matrix.concat(&self.ctm);
        self.ancestors.push(id);
        let walked = match own_resources {
            Some(own) => {
                let mut own_fonts = FontCache::from_resources(doc, own);
                self.run(index, &operations, own, &mut own_fonts)
            }
            None => self.run(index, &operations, resources, fonts),
        };
        self.ancestors.pop();
        (self.ctm, self.text) = saved;
        let (unclosed_saves, unmatched_restores) = walked?;

        let entry = &mut self.out.streams[index];
        if entry.operations.is_empty() {
            entry.operations = operations;
            entry.unclosed_saves = unclosed_saves;
            entry.unmatched_restores = unmatched_restores;
        }
        Ok(())
    }

    fn apply(&mut self, stream: usize, index: usize, op: &Operation, fonts: &mut FontCache) {
        let operands = op.operands.as_slice();
        match op.operator.as_str() {
            "cm" => {
                if let Some([a, b, c, d, e, f]) = numbers(operands) {
                    self.ctm = Matrix::new(a, b, c, d, e, f).concat(&self.ctm);
                }
            }
            "BT" => self.text.begin_text(),
            "ET" => self.text.end_text(),
            "Tf" => {
                if let (Some(Object::Name(name)), Some(size)) =
                    (operands.first(), operands.get(1).and_then(number))
                {
                    self.text.params.font_name = name.clone();
                    self.text.params.font_size = size;
                }
            }
            "Tc" => {
                if let Some([v]) = numbers(operands) {
                    self.text.params.char_spacing = v;
                }
            }
            "Tw" => {
                if let Some([v]) = numbers(operands) {
                    self.text.params.word_spacing = v;
                }
            }
            "Tz" => {
                if let Some([v]) = numbers(operands) {
                    self.text.params.h_scaling = v;
                }
            }
            "TL" => {
                if let Some([v]) = numbers(operands) {
                    self.text.params.leading = v;
                }
            }
            "Ts" => {
                if let Some([v]) = numbers(operands) {
                    self.text.params.rise = v;
                }
            }
            "Tm" => {
                if let Some([a, b, c, d, e, f]) = numbers(operands) {
                    self.text.set_text_matrix(Matrix::new(a, b, c, d, e, f));
                }
            }
            "Td" => {
                if let Some([tx, ty]) = numbers(operands) {
                    self.text.move_text_position(tx, ty);
                }
            }
            "TD" => {
                if let Some([tx, ty]) = numbers(operands) {
                    self.text.move_text_position_and_set_leading(tx, ty);
                }
            }
            "T*" => self.text.move_to_next_line(),
            "Tj" => {
                if let Some(bytes) = string_operand(op, 0) {
                    self.show(fonts, stream, index, 0, bytes);
                }
            }
            "'" => {
                self.text.move_to_next_line();
                if let Some(bytes) = string_operand(op, 0) {
                    self.show(fonts, stream, index, 0, bytes);
                }
            }
            "\"" => {
                if let (Some(aw), Some(ac)) = (
                    operands.first().and_then(number),
                    operands.get(1).and_then(number),
                ) {
                    self.text.params.word_spacing = aw;
                    self.text.params.char_spacing = ac;
                }
                self.text.move_to_next_line();
                if let Some(bytes) = string_operand(op, 2) {
                    self.show(fonts, stream, index, 2, bytes);
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = operands.first() {
                    for (element, item) in items.iter().enumerate() {
                        match item {
                            Object::String(bytes, _) => {
                                self.show(fonts, stream, index, element, bytes)
                            }
                            other => {
                                if let Some(adjustment) = number(other) {
                                    let tx = self.text.adjustment_advance(adjustment);
                                    self.text.advance(tx);
                                }
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    }

    fn show(
        &mut self,
        fonts: &mut FontCache,
        stream: usize,
        op_index: usize,
        element: usize,
        bytes: &[u8],
    ) {
        let font = fonts.get(&self.text.params.font_name);
        let (chars, ascent, descent) = (font.decode(bytes), font.ascent(), font.descent());

        for ch in chars {
            let trm = self.text.rendering_matrix(&self.ctm);
            let w = ch.width / 1000.0;
            let (lo, hi) = (descent / 1000.0, ascent / 1000.0);
            let quad = Quad::new(
                trm.transform(Point::new(0.0, hi)),
                trm.transform(Point::new(w, hi)),
                trm.transform(Point::new(0.0, lo)),
                trm.transform(Point::new(w, lo)),
            );
            let origin = trm.transform(Point::new(0.0, 0.0));
            let unit_x = trm.transform(Point::new(1.0, 0.0));
            let length = origin.distance(&unit_x);
            let direction = if length > 0.0 {
                Point::new((unit_x.x - origin.x) / length, (unit_x.y - origin.y) / length)
            } else {
                Point::new(1.0, 0.0)
            };
            let size = origin.distance(&trm.transform(Point::new(0.0, 1.0)));
            let font_size = self.text.params.font_size;
            let tracking = if font_size == 0.0 {
                0.0
            } else {
                self.text.params.char_spacing / font_size * length
            };

            self.out.glyphs.push(Glyph {
                text: ch.text,
                quad,
                origin,
                direction,
                size,
                tracking,
            });
            self.out.sources.push(GlyphSource {
                stream,
                op_index,
                element,
                bytes: ch.bytes,
                adjustment: self.text.replacement_adjustment(ch.width, ch.is_space),
            });
            let tx = self.text.glyph_advance(ch.width, ch.is_space);
            self.text.advance(tx);
        }
    }
}
