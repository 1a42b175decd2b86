//! lopdf-based PDF backend.
//!
//! Implements [`PdfBackend`] using the [lopdf](https://crates.io/crates/lopdf)
//! crate for the document object model. Pages are walked with the content
//! walker in [`crate::content`]; redactions are applied by writing a new
//! content stream for the page and pointing `/Contents` at it. Forms whose
//! text is removed are copied, and the page's resources point at the copies.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use std::sync::LazyLock;

use lopdf::content::Operation;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};
use pdfredact_core::{
    Glyph, Point, Quad, RedactionStyle, SaveOptions, SearchMatch, SearchOptions, search_glyphs,
};

use crate::backend::PdfBackend;
use crate::content::{self, ContentStream, PageContent, StreamOrigin};
use crate::error::BackendError;
use crate::fonts::resolve;
use crate::redact;

/// A parsed PDF document backed by lopdf.
pub struct LopdfDocument {
    /// The underlying lopdf document.
    inner: Document,
    /// Cached ordered list of page ObjectIds (indexed by 0-based page number).
    page_ids: Vec<ObjectId>,
    /// Font object shared by every redaction label, once created.
    label_font: Option<ObjectId>,
}

impl LopdfDocument {
    /// Parse a document from memory.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Parse`] for invalid bytes and
    /// [`BackendError::Encrypted`] for encrypted documents.
    pub fn load_mem(bytes: &[u8]) -> Result<Self, BackendError> {
        let inner = Document::load_mem(bytes)
            .map_err(|e| BackendError::Parse(format!("failed to parse PDF: {e}")))?;

        if inner.is_encrypted() {
            return Err(BackendError::Encrypted);
        }

        // get_pages returns BTreeMap<u32, ObjectId> with 1-based keys
        let page_ids = inner.get_pages().values().copied().collect();

        Ok(LopdfDocument {
            inner,
            page_ids,
            label_font: None,
        })
    }

    /// Access the underlying lopdf document.
    pub fn inner(&self) -> &Document {
        &self.inner
    }
}

impl std::fmt::Debug for LopdfDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LopdfDocument")
            .field("page_count", &self.page_ids.len())
            .finish_non_exhaustive()
    }
}

/// A loaded page of a [`LopdfDocument`].
#[derive(Debug, Clone)]
pub struct LopdfPage {
    /// The lopdf object ID for this page.
    pub object_id: ObjectId,
    /// The 0-based page index.
    pub index: usize,
    content: PageContent,
    marks: Vec<Quad>,
}

impl LopdfPage {
    /// Positioned glyphs of the page, in content stream order.
    pub fn glyphs(&self) -> &[Glyph] {
        &self.content.glyphs
    }

    /// Regions marked for redaction and not applied yet.
    pub fn marks(&self) -> &[Quad] {
        &self.marks
    }
}

/// The lopdf-based PDF backend.
///
/// # Example
///
/// ```ignore
/// use pdfredact_parse::{LopdfBackend, PdfBackend};
///
/// let doc = LopdfBackend::open(Path::new("in.pdf"))?;
/// let page = LopdfBackend::load_page(&doc, 0)?;
/// let hits = LopdfBackend::search_page(&doc, &page, "secret", &Default::default())?;
/// ```
pub struct LopdfBackend;

/// Look up a key in the page dictionary, walking up the page tree
/// (via /Parent) if the key is not found on the page itself.
///
/// Returns `None` if the key is not found anywhere in the tree.
fn resolve_inherited<'a>(
    doc: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> Result<Option<&'a Object>, BackendError> {
    let mut current_id = page_id;
    // Bounded so a /Parent cycle cannot loop forever.
    for _ in 0..64 {
        let dict = doc
            .get_object(current_id)
            .and_then(|o| o.as_dict())
            .map_err(|e| BackendError::Parse(format!("failed to get page dictionary: {e}")))?;

        if let Ok(value) = dict.get(key) {
            return Ok(Some(value));
        }

        match dict.get(b"Parent") {
            Ok(parent_obj) => {
                current_id = parent_obj
                    .as_reference()
                    .map_err(|e| BackendError::Parse(format!("invalid /Parent reference: {e}")))?;
            }
            Err(_) => return Ok(None),
        }
    }
    Err(BackendError::Parse("page tree /Parent chain too deep".into()))
}

/// Get the resources dictionary for a page, handling inheritance.
fn page_resources(doc: &Document, page_id: ObjectId) -> Result<&Dictionary, BackendError> {
    static EMPTY_DICT: LazyLock<Dictionary> = LazyLock::new(Dictionary::new);

    match resolve_inherited(doc, page_id, b"Resources")? {
        Some(obj) => resolve(doc, obj)
            .as_dict()
            .map_err(|_| BackendError::Parse("/Resources is not a dictionary".to_string())),
        None => Ok(&EMPTY_DICT),
    }
}

/// Decoded bytes of every content stream of a page, concatenated.
///
/// Handles a single stream reference and arrays of stream references.
fn page_content_bytes(doc: &Document, page_id: ObjectId) -> Result<Vec<u8>, BackendError> {
    let page_dict = doc
        .get_object(page_id)
        .and_then(|o| o.as_dict())
        .map_err(|e| BackendError::Parse(format!("failed to get page dictionary: {e}")))?;
    let Ok(contents) = page_dict.get(b"Contents") else {
        return Ok(Vec::new());
    };

    match resolve(doc, contents) {
        Object::Stream(stream) => content::decode_stream(stream),
        Object::Array(items) => {
            let mut content = Vec::new();
            for item in items {
                let stream = resolve(doc, item).as_stream().map_err(|e| {
                    BackendError::Parse(format!("/Contents array item is not a stream: {e}"))
                })?;
                if !content.is_empty() {
                    content.push(b'\n');
                }
                content.extend_from_slice(&content::decode_stream(stream)?);
            }
            Ok(content)
        }
        Object::Null => Ok(Vec::new()),
        _ => Err(BackendError::Parse(
            "/Contents is not a stream or array".to_string(),
        )),
    }
}

/// Whether a marked region covers a point.
///
/// Regions with no area (zero-size text) fall back to their bounding box.
fn covers(quad: &Quad, p: &Point) -> bool {
    if quad.is_degenerate() {
        quad.rect().contains(p)
    } else {
        quad.contains(p)
    }
}

/// Font object shared by every redaction label, created on first use.
fn label_font(doc: &mut LopdfDocument) -> ObjectId {
    match doc.label_font {
        Some(id) => id,
        None => {
            let id = doc.inner.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => "Helvetica",
                "Encoding" => "WinAnsiEncoding",
            });
            doc.label_font = Some(id);
            id
        }
    }
}

/// Point the `/XObject` entries of `resources` that stream `parent` draws
/// at the rewritten copies in `copies`, and drop entries naming `itself`.
/// Returns whether anything changed.
fn repoint_forms(
    doc: &Document,
    resources: &mut Dictionary,
    streams: &[ContentStream],
    parent: usize,
    copies: &BTreeMap<usize, ObjectId>,
    itself: Option<ObjectId>,
) -> bool {
    let Some(mut xobjects) = resources
        .get(b"XObject")
        .ok()
        .and_then(|obj| resolve(doc, obj).as_dict().ok())
        .cloned()
    else {
        return false;
    };
    let mut changed = false;
    if let Some(itself) = itself {
        let names: Vec<Vec<u8>> = xobjects
            .iter()
            .filter(|(_, obj)| obj.as_reference().ok() == Some(itself))
            .map(|(name, _)| name.clone())
            .collect();
        for name in names {
            xobjects.remove(&name);
            changed = true;
        }
    }
    for (index, copy) in copies {
        if let StreamOrigin::Form { parent: p, name, .. } = &streams[*index].origin {
            if *p == parent {
                xobjects.set(name.clone(), Object::Reference(*copy));
                changed = true;
            }
        }
    }
    if changed {
        resources.set("XObject", Object::Dictionary(xobjects));
    }
    changed
}

/// Operations of one walked stream with the flagged glyphs removed.
fn strip_stream(content: &PageContent, index: usize, remove: &[bool], drop: &[usize]) -> Vec<Operation> {
    redact::remove_glyphs(
        &content.streams[index].operations,
        index,
        &content.sources,
        remove,
        drop,
    )
}

/// Write a rewritten copy of every form whose text changed, innermost
/// first, so a parent's copy can point at its children's copies.
///
/// Returns the copy of each rewritten stream by stream index. The original
/// form objects are left untouched for other pages that draw them.
fn copy_forms(
    doc: &mut Document,
    content: &PageContent,
    remove: &[bool],
) -> Result<BTreeMap<usize, ObjectId>, BackendError> {
    let streams = &content.streams;
    let mut dirty = vec![false; streams.len()];
    for (source, _) in content.sources.iter().zip(remove).filter(|(_, r)| **r) {
        dirty[source.stream] = true;
    }
    for index in (1..streams.len()).rev() {
        if let StreamOrigin::Form { parent, .. } = streams[index].origin {
            if dirty[index] {
                dirty[parent] = true;
            }
        }
    }

    let mut copies = BTreeMap::new();
    for index in (1..streams.len()).rev().filter(|&i| dirty[i]) {
        let stream = &streams[index];
        let StreamOrigin::Form { id, .. } = &stream.origin else {
            continue;
        };
        let mut dict = doc.get_object(*id).and_then(Object::as_stream)?.dict.clone();
        for key in [b"Filter".as_slice(), b"DecodeParms", b"Length"] {
            dict.remove(key);
        }
        let mut resources = stream.resources.clone();
        repoint_forms(doc, &mut resources, streams, index, &copies, Some(*id));
        dict.set("Resources", Object::Dictionary(resources));

        let operations = strip_stream(content, index, remove, &stream.unmatched_restores);
        let bytes = content::encode_operations(operations)?;
        copies.insert(index, doc.add_object(Stream::new(dict, bytes)));
    }
    Ok(copies)
}

/// Give the page its own resources pointing at the rewritten forms and,
/// when labels are drawn, at the label font.
fn update_page_resources(
    doc: &mut LopdfDocument,
    page_id: ObjectId,
    streams: &[ContentStream],
    copies: &BTreeMap<usize, ObjectId>,
    labelled: bool,
) -> Result<(), BackendError> {
    let font_id = labelled.then(|| label_font(doc));
    let mut resources = page_resources(&doc.inner, page_id)?.clone();
    let repointed = repoint_forms(&doc.inner, &mut resources, streams, 0, copies, None);
    if !repointed && font_id.is_none() {
        return Ok(());
    }
    if let Some(font_id) = font_id {
        let mut fonts = resources
            .get(b"Font")
            .ok()
            .and_then(|obj| resolve(&doc.inner, obj).as_dict().ok())
            .cloned()
            .unwrap_or_else(Dictionary::new);
        fonts.set(redact::LABEL_FONT, Object::Reference(font_id));
        resources.set("Font", Object::Dictionary(fonts));
    }

    doc.inner
        .get_object_mut(page_id)
        .and_then(Object::as_dict_mut)?
        .set("Resources", Object::Dictionary(resources));
    Ok(())
}

impl PdfBackend for LopdfBackend {
    type Document = LopdfDocument;
    type Page = LopdfPage;
    type Error = BackendError;

    fn open(path: &Path) -> Result<Self::Document, Self::Error> {
        let bytes = std::fs::read(path)?;
        LopdfDocument::load_mem(&bytes)
    }

    fn page_count(doc: &Self::Document) -> usize {
        doc.page_ids.len()
    }

    fn load_page(doc: &Self::Document, index: usize) -> Result<Self::Page, Self::Error> {
        let object_id = *doc
            .page_ids
            .get(index)
            .ok_or(BackendError::PageOutOfRange {
                index,
                count: doc.page_ids.len(),
            })?;

        let bytes = page_content_bytes(&doc.inner, object_id)?;
        let operations = content::decode_operations(&bytes)?;
        let resources = page_resources(&doc.inner, object_id)?;
        let content = content::walk(&doc.inner, resources, operations)?;

        #[cfg(feature = "tracing")]
        tracing::trace!(page = index, glyphs = content.glyphs.len(), "page walked");

        Ok(LopdfPage {
            object_id,
            index,
            content,
            marks: Vec::new(),
        })
    }

    fn search_page(
        _doc: &Self::Document,
        page: &Self::Page,
        phrase: &str,
        options: &SearchOptions,
    ) -> Result<Vec<SearchMatch>, Self::Error> {
        Ok(search_glyphs(&page.content.glyphs, phrase, options))
    }

    fn redact_region(
        _doc: &Self::Document,
        page: &mut Self::Page,
        quad: &Quad,
    ) -> Result<(), Self::Error> {
        let finite = quad
            .corners()
            .iter()
            .all(|p| p.x.is_finite() && p.y.is_finite());
        if !finite {
            return Err(BackendError::Interpreter(format!(
                "redaction region on page {} has non-finite coordinates",
                page.index
            )));
        }
        page.marks.push(*quad);
        Ok(())
    }

    fn apply_redactions(
        doc: &mut Self::Document,
        page: &mut Self::Page,
        style: &RedactionStyle,
    ) -> Result<usize, Self::Error> {
        if page.marks.is_empty() {
            return Ok(0);
        }

        let remove: Vec<bool> = page
            .content
            .glyphs
            .iter()
            .map(|g| {
                let center = g.quad.center();
                page.marks.iter().any(|q| covers(q, &center))
            })
            .collect();
        let removed = remove.iter().filter(|r| **r).count();

        let copies = copy_forms(&mut doc.inner, &page.content, &remove)?;
        let streams = &page.content.streams;
        let body = strip_stream(&page.content, 0, &remove, &streams[0].unmatched_restores);
        let mut operations = redact::isolate(body, streams[0].unclosed_saves);
        let (overlay, labelled) = redact::overlay(&page.marks, style);
        operations.extend(overlay);

        let bytes = content::encode_operations(operations)?;
        let stream_id = doc.inner.add_object(Stream::new(Dictionary::new(), bytes));
        update_page_resources(doc, page.object_id, streams, &copies, labelled)?;
        doc.inner
            .get_object_mut(page.object_id)
            .and_then(Object::as_dict_mut)?
            .set("Contents", Object::Reference(stream_id));

        #[cfg(feature = "tracing")]
        tracing::debug!(
            page = page.index,
            regions = page.marks.len(),
            glyphs = removed,
            forms = copies.len(),
            "redactions applied"
        );

        // Later searches on this page see the rewritten content.
        *page = Self::load_page(doc, page.index)?;
        Ok(removed)
    }

    fn save<W: Write>(
        doc: &mut Self::Document,
        writer: &mut W,
        options: &SaveOptions,
    ) -> Result<(), Self::Error> {
        if options.prune {
            doc.inner.prune_objects();
        }
        if options.compress {
            doc.inner.compress();
        }
        doc.inner.save_to(writer)?;
        Ok(())
    }
}
