//! Content stream rewriting for applied redactions.
//!
//! Glyphs are deleted from the text-showing operations that drew them. Each
//! run of deleted glyphs becomes a TJ number of the same advance, so the
//! text that remains on the line keeps its position. The rewritten stream is
//! wrapped in `q`/`Q` and followed by filled boxes over the redacted areas.

use std::collections::BTreeMap;

use lopdf::content::Operation;
use lopdf::{Object, StringFormat};
use pdfredact_core::{Quad, RedactionStyle};

use crate::content::GlyphSource;
use crate::standard_fonts;

/// Resource name under which the label font is registered on a page.
pub const LABEL_FONT: &[u8] = b"PdfRedactLabel";

/// Smallest label size that is still drawn, in points.
const MIN_LABEL_SIZE: f64 = 2.0;

/// Rewrite the operations of stream `stream` without the glyphs flagged in
/// `remove`.
///
/// `sources` and `remove` are parallel to the glyph list produced by the
/// walker; glyphs of other streams are ignored. A glyph shown more than once
/// (a form drawn twice) is removed once. Operators listed in `drop`
/// (unmatched `Q`) are left out.
pub fn remove_glyphs(
    operations: &[Operation],
    stream: usize,
    sources: &[GlyphSource],
    remove: &[bool],
    drop: &[usize],
) -> Vec<Operation> {
    let mut by_op: BTreeMap<usize, Vec<&GlyphSource>> = BTreeMap::new();
    for (source, _) in sources
        .iter()
        .zip(remove)
        .filter(|(source, r)| **r && source.stream == stream)
    {
        let removed = by_op.entry(source.op_index).or_default();
        if !removed
            .iter()
            .any(|r| r.element == source.element && r.bytes == source.bytes)
        {
            removed.push(source);
        }
    }

    let mut out = Vec::with_capacity(operations.len() + by_op.len() * 2);
    for (index, op) in operations.iter().enumerate() {
        if drop.contains(&index) {
            continue;
        }
        let Some(removed) = by_op.get(&index) else {
            out.push(op.clone());
            continue;
        };
        match op.operator.as_str() {
            "Tj" => out.push(show_array(split_operand(op, 0, removed))),
            "'" => {
                out.push(Operation::new("T*", vec![]));
                out.push(show_array(split_operand(op, 0, removed)));
            }
            "\"" => {
                out.push(Operation::new("Tw", vec![op.operands[0].clone()]));
                out.push(Operation::new("Tc", vec![op.operands[1].clone()]));
                out.push(Operation::new("T*", vec![]));
                out.push(show_array(split_operand(op, 2, removed)));
            }
            "TJ" => {
                let mut items = Vec::new();
                if let Some(Object::Array(array)) = op.operands.first() {
                    for (element, item) in array.iter().enumerate() {
                        match item {
                            Object::String(bytes, format) => {
                                let here: Vec<&GlyphSource> = removed
                                    .iter()
                                    .copied()
                                    .filter(|s| s.element == element)
                                    .collect();
                                split_string(bytes, *format, &here, &mut items);
                            }
                            other => push_item(&mut items, other.clone()),
                        }
                    }
                }
                out.push(show_array(items));
            }
            _ => out.push(op.clone()),
        }
    }
    out
}

fn show_array(items: Vec<Object>) -> Operation {
    Operation::new("TJ", vec![Object::Array(items)])
}

fn split_operand(op: &Operation, operand: usize, removed: &[&GlyphSource]) -> Vec<Object> {
    let mut items = Vec::new();
    if let Some(Object::String(bytes, format)) = op.operands.get(operand) {
        split_string(bytes, *format, removed, &mut items);
    }
    items
}

/// Replace removed byte ranges of one string with advance-preserving numbers.
fn split_string(bytes: &[u8], format: StringFormat, removed: &[&GlyphSource], items: &mut Vec<Object>) {
    let mut removed: Vec<&GlyphSource> = removed.to_vec();
    removed.sort_by_key(|s| s.bytes.start);
    let mut cursor = 0;
    for source in removed {
        let start = source.bytes.start.min(bytes.len());
        if start > cursor {
            push_item(items, Object::String(bytes[cursor..start].to_vec(), format));
        }
        push_item(items, Object::Real(source.adjustment as f32));
        cursor = cursor.max(source.bytes.end.min(bytes.len()));
    }
    if cursor < bytes.len() {
        push_item(items, Object::String(bytes[cursor..].to_vec(), format));
    }
}

/// Append to a TJ array, folding consecutive numbers into one.
fn push_item(items: &mut Vec<Object>, item: Object) {
    let as_f32 = |o: &Object| match o {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    };
    if let (Some(next), Some(last)) = (as_f32(&item), items.last_mut()) {
        if let Some(prev) = as_f32(last) {
            *last = Object::Real(prev + next);
            return;
        }
    }
    items.push(item);
}

/// Wrap rewritten page content so it cannot leak state into the overlay.
pub fn isolate(operations: Vec<Operation>, unclosed_saves: usize) -> Vec<Operation> {
    let mut out = Vec::with_capacity(operations.len() + unclosed_saves + 2);
    out.push(Operation::new("q", vec![]));
    out.extend(operations);
    out.extend((0..=unclosed_saves).map(|_| Operation::new("Q", vec![])));
    out
}

fn real(v: f64) -> Object {
    Object::Real(v as f32)
}

/// Fill every quad, and draw the label inside each quad it fits in.
///
/// Returns the operations and whether any label was drawn (the page then
/// needs the [`LABEL_FONT`] resource).
pub fn overlay(quads: &[Quad], style: &RedactionStyle) -> (Vec<Operation>, bool) {
    let [r, g, b] = style.fill;
    let mut ops = vec![
        Operation::new("q", vec![]),
        Operation::new("rg", vec![Object::Real(r), Object::Real(g), Object::Real(b)]),
    ];
    for quad in quads {
        let [ll, lr, ur, ul] = quad.corners();
        ops.push(Operation::new("m", vec![real(ll.x), real(ll.y)]));
        for p in [lr, ur, ul] {
            ops.push(Operation::new("l", vec![real(p.x), real(p.y)]));
        }
        ops.push(Operation::new("h", vec![]));
        ops.push(Operation::new("f", vec![]));
    }

    let mut labelled = false;
    if let Some(label) = style.label.as_deref().filter(|l| !l.trim().is_empty()) {
        let encoded = encode_label(label);
        let ink = if style.is_dark() { 1.0 } else { 0.0 };
        for quad in quads {
            if let Some(text_ops) = label_operations(quad, &encoded, ink) {
                ops.extend(text_ops);
                labelled = true;
            }
        }
    }
    ops.push(Operation::new("Q", vec![]));
    (ops, labelled)
}

/// Latin-1 bytes for the label; other characters become `?`.
fn encode_label(label: &str) -> Vec<u8> {
    label
        .chars()
        .map(|c| u8::try_from(c as u32).unwrap_or(b'?'))
        .collect()
}

fn label_operations(quad: &Quad, encoded: &[u8], ink: f32) -> Option<Vec<Operation>> {
    let metrics = standard_fonts::lookup("Helvetica")?;
    let em_width: f64 = encoded
        .iter()
        .map(|&b| metrics.widths[b as usize] as f64 / 1000.0)
        .sum();
    let (width, height) = (quad.width(), quad.height());
    if em_width <= 0.0 || width <= 0.0 {
        return None;
    }
    let size = (height * 0.7).min(width / em_width);
    if size < MIN_LABEL_SIZE {
        return None;
    }

    let [ll, lr, _, _] = quad.corners();
    let (ux, uy) = ((lr.x - ll.x) / width, (lr.y - ll.y) / width);
    let along = (width - em_width * size) / 2.0;
    let up = (height - size * 0.7) / 2.0;
    let x = ll.x + ux * along - uy * up;
    let y = ll.y + uy * along + ux * up;

    Some(vec![
        Operation::new("rg", vec![Object::Real(ink), Object::Real(ink), Object::Real(ink)]),
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![Object::Name(LABEL_FONT.to_vec()), real(size)]),
        Operation::new(
            "Tm",
            vec![real(ux), real(uy), real(-uy), real(ux), real(x), real(y)],
        ),
        Operation::new(
            "Tj",
            vec![Object::String(encoded.to_vec(), StringFormat::Literal)],
        ),
        Operation::new("ET", vec![]),
    ])
}
