//! Literal phrase search over positioned glyphs.
//!
//! The page text is rebuilt from glyphs in content-stream order. Word gaps
//! produced by positioning (instead of a space glyph) and line breaks become
//! virtual spaces, runs of whitespace collapse to one space, and the phrase
//! is normalized the same way, so `"FULANO DA SILVA"` matches regardless of
//! how the producer spaced the words. Character spacing applied to every
//! glyph (tracked text) is not a word gap.

use crate::geometry::Quad;
use crate::text::Glyph;

/// A gap wider than this fraction of the font size separates two words.
const WORD_GAP_RATIO: f64 = 0.15;

/// Options controlling phrase search.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchOptions {
    /// Whether the search is case-sensitive (default: `true`).
    pub case_sensitive: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            case_sensitive: true,
        }
    }
}

/// One occurrence of the phrase on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchMatch {
    /// The matched text as shown on the page.
    pub text: String,
    /// One quad per line the occurrence spans.
    pub quads: Vec<Quad>,
    /// Indices into the page's glyph array, in order.
    pub glyph_indices: Vec<usize>,
}

#[derive(Debug, Clone, Copy)]
struct Unit {
    ch: char,
    glyph: Option<usize>,
}

/// Normalize a phrase the way page text is normalized.
///
/// Leading and trailing whitespace is dropped and inner runs collapse to one
/// space. Returns an empty vector for a blank phrase.
pub fn normalize_phrase(phrase: &str, options: &SearchOptions) -> Vec<char> {
    let mut out: Vec<char> = Vec::new();
    for word in phrase.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        for ch in word.chars() {
            push_folded(&mut out, ch, options);
        }
    }
    out
}

fn push_folded(out: &mut Vec<char>, ch: char, options: &SearchOptions) {
    if options.case_sensitive {
        out.push(ch);
    } else {
        out.extend(ch.to_lowercase());
    }
}

fn push_space(units: &mut Vec<Unit>, glyph: Option<usize>) {
    match units.last_mut() {
        None => {}
        Some(last) if last.ch == ' ' => {
            if last.glyph.is_none() {
                last.glyph = glyph;
            }
        }
        Some(_) => units.push(Unit { ch: ' ', glyph }),
    }
}

fn build_units(glyphs: &[Glyph], options: &SearchOptions) -> Vec<Unit> {
    let mut units = Vec::with_capacity(glyphs.len() + glyphs.len() / 4);
    for (i, glyph) in glyphs.iter().enumerate() {
        if i > 0 {
            let prev = &glyphs[i - 1];
            if !prev.same_line(glyph) {
                push_space(&mut units, None);
            } else if !prev.is_whitespace()
                && !glyph.is_whitespace()
                && prev.gap_to(glyph) - prev.tracking > WORD_GAP_RATIO * prev.size.max(glyph.size)
            {
                push_space(&mut units, None);
            }
        }

        let mut folded = Vec::new();
        for ch in glyph.text.chars() {
            if ch.is_whitespace() {
                push_space(&mut units, Some(i));
            } else {
                folded.clear();
                push_folded(&mut folded, ch, options);
                units.extend(folded.iter().map(|&ch| Unit { ch, glyph: Some(i) }));
            }
        }
    }
    units
}

/// Rebuild the searchable text of a page (virtual spaces included).
pub fn page_text(glyphs: &[Glyph]) -> String {
    build_units(
        glyphs,
        &SearchOptions {
            case_sensitive: true,
        },
    )
    .iter()
    .map(|u| u.ch)
    .collect()
}

/// Find every non-overlapping occurrence of `phrase` in `glyphs`.
///
/// Occurrences are reported left to right in text order. A blank phrase or
/// an empty page yields no matches.
pub fn search_glyphs(glyphs: &[Glyph], phrase: &str, options: &SearchOptions) -> Vec<SearchMatch> {
    let needle = normalize_phrase(phrase, options);
    if needle.is_empty() || glyphs.is_empty() {
        return Vec::new();
    }

    let units = build_units(glyphs, options);
    let mut results = Vec::new();
    let mut start = 0;
    while start + needle.len() <= units.len() {
        let window = &units[start..start + needle.len()];
        if window.iter().zip(&needle).all(|(u, &c)| u.ch == c) {
            let mut indices: Vec<usize> = Vec::new();
            for idx in window.iter().filter_map(|u| u.glyph) {
                if indices.last() != Some(&idx) {
                    indices.push(idx);
                }
            }
            if !indices.is_empty() {
                results.push(SearchMatch {
                    text: indices.iter().map(|&i| glyphs[i].text.as_str()).collect(),
                    quads: line_quads(glyphs, &indices),
                    glyph_indices: indices,
                });
            }
            start += needle.len();
        } else {
            start += 1;
        }
    }
    results
}

/// Split an occurrence into per-line runs, one quad each.
fn line_quads(glyphs: &[Glyph], indices: &[usize]) -> Vec<Quad> {
    let mut quads = Vec::new();
    let mut run_start = indices[0];
    let mut run_end = indices[0];
    for &idx in &indices[1..] {
        if glyphs[run_end].same_line(&glyphs[idx]) {
            run_end = idx;
        } else {
            quads.push(glyphs[run_start].quad.span_to(&glyphs[run_end].quad));
            run_start = idx;
            run_end = idx;
        }
    }
    quads.push(glyphs[run_start].quad.span_to(&glyphs[run_end].quad));
    quads
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Point, Rect};

    /// Lay out `text` as one glyph per char, 6pt wide, starting at `x`.
    fn line(text: &str, x: f64, y: f64) -> Vec<Glyph> {
        text.chars()
            .enumerate()
            .map(|(i, ch)| {
                let x0 = x + i as f64 * 6.0;
                Glyph {
                    text: ch.to_string(),
                    quad: Quad::from_rect(&Rect::new(x0, y - 3.0, x0 + 6.0, y + 9.0)),
                    origin: Point::new(x0, y),
                    direction: Point::new(1.0, 0.0),
                    size: 12.0,
                    tracking: 0.0,
                }
            })
            .collect()
    }

    fn exact() -> SearchOptions {
        SearchOptions::default()
    }

    #[test]
    fn search_options_defaults() {
        assert!(SearchOptions::default().case_sensitive);
    }

    #[test]
    fn simple_phrase() {
        let glyphs = line("Hello World", 10.0, 100.0);
        let matches = search_glyphs(&glyphs, "World", &exact());
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].text, "World");
        assert_eq!(matches[0].glyph_indices, vec![6, 7, 8, 9, 10]);
        assert_eq!(matches[0].quads.len(), 1);
        assert_eq!(
            matches[0].quads[0].rect(),
            Rect::new(46.0, 97.0, 76.0, 109.0)
        );
    }

    #[test]
    fn every_occurrence_is_reported() {
        let glyphs = line("ab ab ab", 0.0, 50.0);
        let matches = search_glyphs(&glyphs, "ab", &exact());
        assert_eq!(matches.len(), 3);
        assert_eq!(matches[2].glyph_indices, vec![6, 7]);
    }

    #[test]
    fn occurrences_do_not_overlap() {
        let glyphs = line("aaaa", 0.0, 50.0);
        let matches = search_glyphs(&glyphs, "aa", &exact());
        assert_eq!(matches.len(), 2);
    }

    #[test]
    fn case_sensitivity() {
        let glyphs = line("FULANO da Silva", 0.0, 50.0);
        assert!(search_glyphs(&glyphs, "fulano DA silva", &exact()).is_empty());
        let folded = SearchOptions {
            case_sensitive: false,
        };
        let matches = search_glyphs(&glyphs, "fulano DA silva", &folded);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].text, "FULANO da Silva");
    }

    #[test]
    fn positioned_gap_acts_as_space() {
        // "FULANO" then "DA" placed 4pt after, no space glyph in between
        let mut glyphs = line("FULANO", 0.0, 50.0);
        glyphs.extend(line("DA", 40.0, 50.0));
        let matches = search_glyphs(&glyphs, "FULANO DA", &exact());
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].text, "FULANODA");
        assert!(search_glyphs(&glyphs, "FULANODA", &exact()).is_empty());
    }

    #[test]
    fn uniform_tracking_is_not_a_word_gap() {
        // 4pt of character spacing after every glyph, a real space between words
        let glyphs: Vec<Glyph> = line("FULANO DA", 0.0, 50.0)
            .into_iter()
            .enumerate()
            .map(|(i, mut g)| {
                let shift = i as f64 * 4.0;
                g.origin.x += shift;
                g.quad = Quad::from_rect(&Rect::new(g.origin.x, 47.0, g.origin.x + 6.0, 59.0));
                g.tracking = 4.0;
                g
            })
            .collect();
        assert_eq!(page_text(&glyphs), "FULANO DA");
        let matches = search_glyphs(&glyphs, "FULANO DA", &exact());
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].glyph_indices.len(), 9);
    }

    #[test]
    fn whitespace_runs_collapse() {
        let glyphs = line("FULANO   DA", 0.0, 50.0);
        let matches = search_glyphs(&glyphs, " FULANO\tDA ", &exact());
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].glyph_indices.len(), 9);
    }

    #[test]
    fn phrase_wrapping_to_next_line_yields_two_quads() {
        let mut glyphs = line("see FULANO", 0.0, 100.0);
        glyphs.extend(line("DA SILVA", 0.0, 86.0));
        let matches = search_glyphs(&glyphs, "FULANO DA SILVA", &exact());
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].quads.len(), 2);
        assert_eq!(matches[0].quads[0].rect().y0, 97.0);
        assert_eq!(matches[0].quads[1].rect().y0, 83.0);
    }

    #[test]
    fn no_match_and_blank_inputs() {
        let glyphs = line("abc", 0.0, 0.0);
        assert!(search_glyphs(&glyphs, "XXX", &exact()).is_empty());
        assert!(search_glyphs(&glyphs, "", &exact()).is_empty());
        assert!(search_glyphs(&glyphs, "   ", &exact()).is_empty());
        assert!(search_glyphs(&[], "abc", &exact()).is_empty());
    }

    #[test]
    fn page_text_inserts_virtual_spaces() {
        let mut glyphs = line("one", 0.0, 100.0);
        glyphs.extend(line("two", 0.0, 80.0));
        assert_eq!(page_text(&glyphs), "one two");
    }

    #[test]
    fn normalize_phrase_trims_and_folds() {
        let folded = SearchOptions {
            case_sensitive: false,
        };
        let chars: String = normalize_phrase("  Ab \n C ", &folded).into_iter().collect();
        assert_eq!(chars, "ab c");
        assert!(normalize_phrase(" \t ", &exact()).is_empty());
    }
}
