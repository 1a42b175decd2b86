//! Fixture PDFs for integration tests, built with lopdf.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use lopdf::{Document, Object, Stream, dictionary};
use pdfredact::pdfredact_core::page_text;
use pdfredact::pdfredact_parse::{LopdfBackend, PdfBackend};

/// Create a PDF with one page per content stream. `/F1` is Helvetica.
pub fn pdf_with_contents(contents: &[&str], compress: bool) -> Vec<u8> {
    build_pdf(contents, None, compress)
}

/// Create a one-page PDF whose page only draws the form `/Fm1` with
/// `q /Fm1 Do Q`. The form's content is `form` and it inherits the page's
/// resources.
pub fn pdf_with_form(form: &str) -> Vec<u8> {
    build_pdf(&["q /Fm1 Do Q"], Some(form), false)
}

fn build_pdf(contents: &[&str], form: Option<&str>, compress: bool) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });

    let media_box = vec![
        Object::Integer(0),
        Object::Integer(0),
        Object::Integer(612),
        Object::Integer(792),
    ];

    let form_id = form.map(|content| {
        doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Form",
                "BBox" => media_box.clone(),
            },
            content.as_bytes().to_vec(),
        ))
    });

    let mut page_ids = Vec::new();
    for content in contents {
        let stream = Stream::new(dictionary! {}, content.as_bytes().to_vec());
        let content_id = doc.add_object(stream);

        let mut resources = dictionary! {
            "Font" => dictionary! { "F1" => Object::Reference(font_id) },
        };
        if let Some(form_id) = form_id {
            resources.set("XObject", dictionary! { "Fm1" => Object::Reference(form_id) });
        }

        let page_dict = dictionary! {
            "Type" => "Page",
            "MediaBox" => media_box.clone(),
            "Contents" => Object::Reference(content_id),
            "Resources" => resources,
        };
        page_ids.push(doc.add_object(page_dict));
    }

    let kids: Vec<Object> = page_ids.iter().map(|id| Object::Reference(*id)).collect();
    let pages_id = doc.add_object(dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => Object::Integer(contents.len() as i64),
    });

    for &pid in &page_ids {
        if let Ok(dict) = doc.get_object_mut(pid).and_then(Object::as_dict_mut) {
            dict.set("Parent", Object::Reference(pages_id));
        }
    }

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    if compress {
        doc.compress();
    }
    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

/// Create a PDF where each page shows one line of text.
pub fn pdf_with_pages(texts: &[&str]) -> Vec<u8> {
    let contents: Vec<String> = texts
        .iter()
        .map(|text| format!("BT /F1 12 Tf 72 720 Td ({text}) Tj ET"))
        .collect();
    let refs: Vec<&str> = contents.iter().map(String::as_str).collect();
    pdf_with_contents(&refs, false)
}

/// Write `bytes` to `dir/name`, creating parent directories.
pub fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, bytes).unwrap();
    path
}

/// Searchable text of every page of the PDF at `path`, trimmed.
pub fn page_texts(path: &Path) -> Vec<String> {
    let doc = LopdfBackend::open(path).unwrap();
    (0..LopdfBackend::page_count(&doc))
        .map(|i| {
            let page = LopdfBackend::load_page(&doc, i).unwrap();
            page_text(page.glyphs()).trim().to_string()
        })
        .collect()
}

/// Names of the entries directly inside `dir`, sorted.
pub fn dir_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
