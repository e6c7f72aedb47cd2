//! Benchmarks for the conversion pipeline.
//!
//! Run with: cargo bench

use std::fmt::Write;

use criterion::{Criterion, criterion_group, criterion_main};

use bibleir::{Adapter, ConvertConfig, Format};

/// A synthetic OSIS book of `chapters` x 30 verses.
fn sample_osis(chapters: u32) -> String {
    let mut out = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<osis><osisText osisIDWork=\"bench\">\n<div type=\"book\" osisID=\"Gen\">\n",
    );
    for c in 1..=chapters {
        let _ = writeln!(out, "<chapter osisID=\"Gen.{c}\">");
        for v in 1..=30 {
            let _ = writeln!(
                out,
                "<verse osisID=\"Gen.{c}.{v}\">And God said, Let there be light: and there was <w lemma=\"H216\">light</w>.</verse>"
            );
        }
        out.push_str("</chapter>\n");
    }
    out.push_str("</div>\n</osisText></osis>\n");
    out
}

// ============================================================================
// IR pipeline
// ============================================================================

fn bench_extract_osis(c: &mut Criterion) {
    let raw = sample_osis(50);
    let adapter = Adapter::new(Format::Osis);
    c.bench_function("extract_osis", |b| {
        b.iter(|| adapter.extract_corpus(raw.as_bytes(), "bench").unwrap());
    });
}

fn bench_serialize_ir(c: &mut Criterion) {
    let raw = sample_osis(50);
    let corpus = Adapter::new(Format::Osis)
        .extract_corpus(raw.as_bytes(), "bench")
        .unwrap();
    c.bench_function("serialize_ir", |b| {
        b.iter(|| corpus.to_json_vec(false).unwrap());
    });
}

// ============================================================================
// Regeneration
// ============================================================================

fn bench_regenerate(c: &mut Criterion) {
    let raw = sample_osis(50);
    let config = ConvertConfig {
        preserve_raw: false,
        ..ConvertConfig::default()
    };
    let corpus = Adapter::new(Format::Osis)
        .with_config(config)
        .extract_corpus(raw.as_bytes(), "bench")
        .unwrap();

    for format in [Format::Osis, Format::Zefania, Format::Html, Format::Json, Format::Text] {
        let adapter = Adapter::new(format);
        c.bench_function(&format!("render_{}", format.name()), |b| {
            b.iter(|| adapter.render(&corpus).unwrap());
        });
    }
}

criterion_group!(
    benches,
    bench_extract_osis,
    bench_serialize_ir,
    bench_regenerate,
);
criterion_main!(benches);
