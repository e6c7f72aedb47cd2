//! Cross-format conversion through the IR.

use std::fs;
use std::path::PathBuf;

use bibleir::{Adapter, ConvertConfig, Corpus, Error, Format, LossClass};
use tempfile::TempDir;

const FIXTURES_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");

fn fixture(name: &str) -> Vec<u8> {
    fs::read(PathBuf::from(FIXTURES_DIR).join(name)).unwrap()
}

fn extract(format: Format, raw: &[u8]) -> Corpus {
    Adapter::new(format).extract_corpus(raw, "sample").unwrap()
}

fn no_raw() -> ConvertConfig {
    ConvertConfig {
        preserve_raw: false,
        ..ConvertConfig::default()
    }
}

/// `(osis_id, text)` for every verse block.
fn verses(corpus: &Corpus) -> Vec<(String, String)> {
    corpus
        .documents
        .iter()
        .flat_map(|d| &d.content_blocks)
        .filter_map(|b| {
            b.verse_ref()
                .map(|r| (r.osis_id.clone(), b.text().to_string()))
        })
        .collect()
}

#[test]
fn test_osis_to_zefania_preserves_structure() {
    let osis = extract(Format::Osis, &fixture("kjv_sample.osis.xml"));
    let (bytes, report) = Adapter::new(Format::Zefania).render(&osis).unwrap();
    assert_eq!(report.loss_class, LossClass::L1);
    assert_eq!(report.source_format, "osis");
    assert_eq!(report.target_format, "zefania");
    assert!(!report.warnings.is_empty());

    let zefania = extract(Format::Zefania, &bytes);
    assert_eq!(zefania.id, osis.id);
    assert_eq!(zefania.documents, osis.documents);
}

#[test]
fn test_json_to_html_and_back() {
    let json = extract(Format::Json, &fixture("asv_sample.json"));
    let (html, _) = Adapter::new(Format::Html).render(&json).unwrap();
    let from_html = extract(Format::Html, &html);
    assert_eq!(from_html.documents, json.documents);
    assert_eq!(from_html.documents[1].title, "Matthew");

    let (json_again, report) = Adapter::new(Format::Json)
        .with_config(no_raw())
        .render(&from_html)
        .unwrap();
    assert_eq!(report.loss_class, LossClass::L1);
    assert_eq!(extract(Format::Json, &json_again).documents, json.documents);
}

#[test]
fn test_regeneration_to_text_is_l3() {
    let osis = extract(Format::Osis, &fixture("kjv_sample.osis.xml"));
    let (text, report) = Adapter::new(Format::Text).render(&osis).unwrap();
    assert_eq!(report.loss_class, LossClass::L3);
    assert!(!report.warnings.is_empty());

    let text = String::from_utf8(text).unwrap();
    assert!(text.starts_with("Gen 1:1 In the beginning God created"));
    assert!(!text.contains('<'));
    assert_eq!(verses(&extract(Format::Text, text.as_bytes())), verses(&osis));
}

#[test]
fn test_two_chapters_emit_two_groupings() {
    let raw = br#"<osis><osisText osisIDWork="t"><div type="book" osisID="Gen">
<chapter osisID="Gen.1"><verse osisID="Gen.1.1">a</verse><verse osisID="Gen.1.2">b</verse></chapter>
<chapter osisID="Gen.2"><verse osisID="Gen.2.1">c</verse></chapter>
</div></osisText></osis>"#;
    let corpus = Adapter::new(Format::Osis)
        .with_config(no_raw())
        .extract_corpus(raw, "t")
        .unwrap();
    let blocks = &corpus.documents[0].content_blocks;
    assert_eq!(blocks.len(), 3);
    assert_eq!(
        blocks.iter().map(|b| b.sequence).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );

    let (out, _) = Adapter::new(Format::Osis).render(&corpus).unwrap();
    let out = String::from_utf8(out).unwrap();
    assert_eq!(out.matches("<chapter ").count(), 2);
    let first = out.find("osisID=\"Gen.1\"").unwrap();
    let second = out.find("osisID=\"Gen.2\"").unwrap();
    assert!(first < second);
}

#[test]
fn test_cross_format_files_on_disk() {
    let dir = TempDir::new().unwrap();
    let source = PathBuf::from(FIXTURES_DIR).join("web_sample.xml");
    let extracted = Adapter::new(Format::Zefania)
        .extract_ir(&source, dir.path())
        .unwrap();

    let emitted = Adapter::new(Format::Osis)
        .emit_native(&extracted.ir_path, dir.path())
        .unwrap();
    assert_eq!(emitted.output_path, dir.path().join("WEB.osis.xml"));
    assert_eq!(emitted.loss_class, LossClass::L1);
    let osis = fs::read_to_string(&emitted.output_path).unwrap();
    assert!(osis.contains("<verse osisID=\"John.3.16\">"));
}

#[test]
fn test_ir_without_raw_regenerates_same_format() {
    let dir = TempDir::new().unwrap();
    let source = PathBuf::from(FIXTURES_DIR).join("psalms_sample.html");
    let adapter = Adapter::new(Format::Html).with_config(no_raw());

    let extracted = adapter.extract_ir(&source, dir.path()).unwrap();
    let corpus = Corpus::from_json_slice(&fs::read(&extracted.ir_path).unwrap()).unwrap();
    assert!(corpus.attributes.is_empty());

    let emitted = adapter.emit_native(&extracted.ir_path, dir.path()).unwrap();
    assert_eq!(emitted.loss_class, LossClass::L1);
    let html = fs::read_to_string(&emitted.output_path).unwrap();
    assert!(html.contains("<p data-osis=\"Ps.2.1\">Why do the heathen rage?</p>"));
}

#[test]
fn test_structurally_incomplete_ir_is_rejected() {
    let dir = TempDir::new().unwrap();
    let ir = dir.path().join("broken.ir.json");
    fs::write(&ir, r#"{"id": "x", "documents": []}"#).unwrap();
    let out = dir.path().join("out");
    let err = Adapter::new(Format::Osis).emit_native(&ir, &out).unwrap_err();
    assert!(matches!(err, Error::MalformedIr(_)), "{}", err);
    assert!(!out.exists());
}
