//! Integration tests for the `sweep` subcommand.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

fn cmd() -> Command {
    let mut cmd = Command::cargo_bin("pdfredact").unwrap();
    cmd.env_remove("PDFREDACT_PHRASE")
        .env_remove("PDFREDACT_SUFFIX")
        .env_remove("PDFREDACT_BASE_PATH")
        .env_remove("RUST_LOG");
    cmd
}

/// Create a one-page PDF showing `text` in Helvetica at 12pt.
fn pdf_with_text(text: &str) -> Vec<u8> {
    use lopdf::{Object, Stream, dictionary};

    let mut doc = lopdf::Document::with_version("1.5");

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let content = format!("BT /F1 12 Tf 72 720 Td ({text}) Tj ET");
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));

    let resources = dictionary! {
        "Font" => dictionary! { "F1" => Object::Reference(font_id) },
    };

    let page_dict = dictionary! {
        "Type" => "Page",
        "MediaBox" => vec![Object::Integer(0), Object::Integer(0), Object::Integer(612), Object::Integer(792)],
        "Contents" => Object::Reference(content_id),
        "Resources" => resources,
    };
    let page_id = doc.add_object(page_dict);

    let pages_id = doc.add_object(dictionary! {
        "Type" => "Pages",
        "Kids" => vec![Object::Reference(page_id)],
        "Count" => Object::Integer(1),
    });

    if let Ok(page_obj) = doc.get_object_mut(page_id) {
        if let Ok(dict) = page_obj.as_dict_mut() {
            dict.set("Parent", Object::Reference(pages_id));
        }
    }

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

fn write_pdf(root: &Path, rel: &str, text: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, pdf_with_text(text)).unwrap();
}

/// Two files containing the phrase and one without it.
fn archive(root: &Path) {
    write_pdf(root, "a.pdf", "Name: FULANO DA SILVA");
    write_pdf(root, "sub/b.pdf", "Signed by FULANO DA SILVA");
    write_pdf(root, "sub/c.pdf", "Nothing to see");
}

#[test]
fn sweep_prints_summary() {
    let dir = tempfile::tempdir().unwrap();
    archive(dir.path());

    cmd()
        .args(["sweep", dir.path().to_str().unwrap(), "--phrase", "FULANO DA SILVA"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "processed: 3 (redacted: 2, not found: 1), errors: 0",
        ));

    assert!(dir.path().join("a_redacted.pdf").exists());
    assert!(dir.path().join("sub/b_redacted.pdf").exists());
    assert!(!dir.path().join("sub/c_redacted.pdf").exists());
}

#[test]
fn sweep_json_summary() {
    let dir = tempfile::tempdir().unwrap();
    archive(dir.path());

    let output = cmd()
        .args([
            "-q",
            "sweep",
            dir.path().to_str().unwrap(),
            "--phrase",
            "FULANO DA SILVA",
            "--json",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["processed"], 3);
    assert_eq!(summary["redacted"], 2);
    assert_eq!(summary["not_found"], 1);
    assert_eq!(summary["errors"], 0);
    assert!(summary["listing_error"].is_null());
}

#[test]
fn sweep_with_failed_file_exits_nonzero() {
    let dir = tempfile::tempdir().unwrap();
    archive(dir.path());
    fs::write(dir.path().join("broken.pdf"), b"not a pdf").unwrap();

    cmd()
        .args(["sweep", dir.path().to_str().unwrap(), "--phrase", "FULANO DA SILVA"])
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("errors: 1"));

    assert!(dir.path().join("a_redacted.pdf").exists());
    assert!(!dir.path().join("broken_redacted.pdf").exists());
}

#[test]
fn sweep_reads_root_and_suffix_from_env() {
    let dir = tempfile::tempdir().unwrap();
    archive(dir.path());

    cmd()
        .env("PDFREDACT_BASE_PATH", dir.path())
        .env("PDFREDACT_SUFFIX", "clean")
        .env("PDFREDACT_PHRASE", "FULANO DA SILVA")
        .arg("sweep")
        .assert()
        .success();

    assert!(dir.path().join("a_clean.pdf").exists());
    assert!(dir.path().join("sub/b_clean.pdf").exists());
}

#[test]
fn sweep_excludes_and_skips() {
    let dir = tempfile::tempdir().unwrap();
    archive(dir.path());
    write_pdf(dir.path(), "a_redacted.pdf", "FULANO DA SILVA again");

    cmd()
        .args([
            "sweep",
            dir.path().to_str().unwrap(),
            "--phrase",
            "FULANO DA SILVA",
            "--exclude-dir",
            "sub",
            "--skip-suffixed",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("processed: 1 (redacted: 1"));

    assert!(!dir.path().join("a_redacted_redacted.pdf").exists());
    assert!(!dir.path().join("sub/b_redacted.pdf").exists());
}

#[test]
fn sweep_missing_root_is_empty() {
    let dir = tempfile::tempdir().unwrap();

    cmd()
        .args([
            "sweep",
            dir.path().join("absent").to_str().unwrap(),
            "--phrase",
            "x",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("processed: 0"));
}

#[test]
fn sweep_blank_phrase_fails() {
    let dir = tempfile::tempdir().unwrap();

    cmd()
        .args(["sweep", dir.path().to_str().unwrap(), "--phrase", "  "])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("phrase is empty"));
}
