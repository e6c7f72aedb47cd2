//! Structural parser: container tree to IR corpus.
//!
//! Walks a [`Node`] tree depth-first in document order and flattens it into
//! documents of sequenced, hashed content blocks.
//!
//! - A `Book` node, or a `Group` whose id is a canonical book code, opens a
//!   new document with its own block-sequence counter. Books may nest; each
//!   nested book is an independent document.
//! - Paragraphs, poetry lines, verse containers and bare character data are
//!   text-bearing leaves. Each non-empty leaf becomes one block.
//! - An empty verse node is a milestone: its locator is attached to the
//!   next leaf.
//!
//! # Example
//!
//! ```
//! use bibleir::compiler::{CorpusHeader, compile_corpus};
//! use bibleir::tree::{Node, NodeKind};
//!
//! let book = Node::new(NodeKind::Book)
//!     .with_id("Gen")
//!     .with_child(
//!         Node::new(NodeKind::Verse)
//!             .with_locator("Gen.1.1")
//!             .with_text("In the beginning"),
//!     );
//! let corpus = compile_corpus(&[book], b"raw", CorpusHeader::new("kjv", "osis"));
//! assert_eq!(corpus.documents[0].content_blocks[0].text(), "In the beginning");
//! ```

use tracing::debug;

use crate::model::{ContentBlock, Corpus, Document, LossClass, is_book_code};
use crate::tree::{Child, Node, NodeKind};
use crate::util::collapse_whitespace;

/// Corpus-level metadata supplied by the format reader.
#[derive(Debug, Clone, Default)]
pub struct CorpusHeader {
    pub id: String,
    pub title: String,
    pub language: String,
    pub versification: String,
    pub source_format: String,
    pub module_type: String,
    pub version: String,
    pub loss_class: LossClass,
    /// Document id used when a book container declares none.
    pub fallback_document_id: String,
}

impl CorpusHeader {
    pub fn new(id: impl Into<String>, source_format: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            fallback_document_id: id.clone(),
            id,
            source_format: source_format.into(),
            loss_class: LossClass::L1,
            ..Default::default()
        }
    }
}

/// Traversal state, owned by one compilation and threaded through every
/// recursive call by exclusive reference.
struct CompileContext {
    documents: Vec<Document>,
    /// Index into `documents` of the nearest enclosing book.
    current: Option<usize>,
    /// Block sequence counters, parallel to `documents`.
    sequences: Vec<u32>,
    order: u32,
    /// Milestone locator waiting for the next leaf.
    pending: Option<String>,
    fallback_id: String,
    orphans: usize,
}

/// Text accumulated inside a paragraph-like container.
struct Run {
    text: String,
    locator: Option<String>,
}

/// Flatten `roots` into a corpus whose `source_hash` is the digest of `raw`.
pub fn compile_corpus(roots: &[Node], raw: &[u8], header: CorpusHeader) -> Corpus {
    let mut ctx = CompileContext {
        documents: Vec::new(),
        current: None,
        sequences: Vec::new(),
        order: 0,
        pending: None,
        fallback_id: header.fallback_document_id.clone(),
        orphans: 0,
    };

    for root in roots {
        visit(root, &mut ctx);
    }

    if ctx.orphans > 0 {
        debug!(count = ctx.orphans, "dropped text outside any book");
    }

    let mut corpus = Corpus::new(header.id, header.source_format, raw);
    corpus.title = header.title;
    corpus.language = header.language;
    corpus.versification = header.versification;
    corpus.module_type = header.module_type;
    corpus.version = header.version;
    corpus.loss_class = header.loss_class;
    corpus.documents = ctx.documents;
    corpus
}

fn is_document_boundary(node: &Node) -> bool {
    match node.kind {
        NodeKind::Book => true,
        NodeKind::Group => node.id.as_deref().is_some_and(is_book_code),
        _ => false,
    }
}

fn visit(node: &Node, ctx: &mut CompileContext) {
    if is_document_boundary(node) {
        visit_document(node, ctx);
        return;
    }

    match node.kind {
        NodeKind::Title => {}
        NodeKind::Verse => {
            let text = node.text_content();
            if text.trim().is_empty() {
                if let Some(locator) = clean_locator(node.locator.as_deref()) {
                    ctx.pending = Some(locator);
                }
            } else {
                // A verse with its own locator supersedes any queued milestone.
                let queued = ctx.pending.take();
                let locator = clean_locator(node.locator.as_deref()).or(queued);
                emit_leaf(&text, locator, ctx);
            }
        }
        NodeKind::Paragraph | NodeKind::Line => visit_text_container(node, ctx),
        NodeKind::Book | NodeKind::Chapter | NodeKind::Group => {
            for child in &node.children {
                match child {
                    Child::Node(n) => visit(n, ctx),
                    Child::Text(t) => {
                        if !t.trim().is_empty() {
                            let locator = ctx.pending.take();
                            emit_leaf(t, locator, ctx);
                        }
                    }
                }
            }
        }
    }
}

fn visit_document(node: &Node, ctx: &mut CompileContext) {
    ctx.order += 1;
    let order = ctx.order;

    let mut id = node
        .id
        .clone()
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| ctx.fallback_id.clone());
    if ctx.documents.iter().any(|d| d.id == id) {
        id = format!("{}-{}", id, order);
    }
    let title = node
        .title
        .as_deref()
        .map(collapse_whitespace)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| id.clone());

    ctx.documents.push(Document::new(id, title, order));
    ctx.sequences.push(0);
    let parent = ctx.current.replace(ctx.documents.len() - 1);
    ctx.pending = None;

    for child in &node.children {
        match child {
            Child::Node(n) => visit(n, ctx),
            Child::Text(t) => {
                if !t.trim().is_empty() {
                    let locator = ctx.pending.take();
                    emit_leaf(t, locator, ctx);
                }
            }
        }
    }

    ctx.current = parent;
    ctx.pending = None;
}

/// A paragraph or line is one leaf, split wherever a verse milestone or a
/// nested verse container starts new text.
fn visit_text_container(node: &Node, ctx: &mut CompileContext) {
    let queued = ctx.pending.take();
    let mut run = Run {
        text: String::new(),
        locator: clean_locator(node.locator.as_deref()).or(queued),
    };
    walk_run(node, &mut run, ctx);
    flush_run(&mut run, ctx);
    if run.locator.is_some() {
        ctx.pending = run.locator;
    }
}

fn walk_run(node: &Node, run: &mut Run, ctx: &mut CompileContext) {
    for child in &node.children {
        match child {
            Child::Text(t) => run.text.push_str(t),
            Child::Node(n) if is_document_boundary(n) => {
                flush_run(run, ctx);
                visit_document(n, ctx);
            }
            Child::Node(n) => match n.kind {
                NodeKind::Title => {}
                NodeKind::Verse => {
                    let text = n.text_content();
                    if text.trim().is_empty() {
                        if let Some(locator) = clean_locator(n.locator.as_deref()) {
                            flush_run(run, ctx);
                            run.locator = Some(locator);
                        }
                    } else {
                        flush_run(run, ctx);
                        let queued = run.locator.take();
                        let locator = clean_locator(n.locator.as_deref()).or(queued);
                        emit_leaf(&text, locator, ctx);
                    }
                }
                _ => walk_run(n, run, ctx),
            },
        }
    }
}

/// Emit accumulated text; an empty run keeps its locator for what follows.
fn flush_run(run: &mut Run, ctx: &mut CompileContext) {
    if run.text.trim().is_empty() {
        run.text.clear();
        return;
    }
    let text = std::mem::take(&mut run.text);
    let locator = run.locator.take();
    emit_leaf(&text, locator, ctx);
}

fn emit_leaf(raw_text: &str, locator: Option<String>, ctx: &mut CompileContext) {
    let text = collapse_whitespace(raw_text);
    if text.is_empty() {
        if locator.is_some() {
            ctx.pending = locator;
        }
        return;
    }

    let Some(index) = ctx.current else {
        ctx.orphans += 1;
        return;
    };

    ctx.sequences[index] += 1;
    let mut block = ContentBlock::new(ctx.sequences[index], text);
    if let Some(locator) = locator {
        block = block.with_verse(&locator);
    }
    ctx.documents[index].content_blocks.push(block);
}

/// First whitespace-separated id of a locator attribute, if any.
fn clean_locator(locator: Option<&str>) -> Option<String> {
    locator
        .and_then(|l| l.split_whitespace().next())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::sha256_hex;

    fn verse(locator: &str, text: &str) -> Node {
        Node::new(NodeKind::Verse)
            .with_locator(locator)
            .with_text(text)
    }

    fn milestone(locator: &str) -> Node {
        Node::new(NodeKind::Verse).with_locator(locator)
    }

    fn compile(roots: &[Node]) -> Corpus {
        compile_corpus(roots, b"raw bytes", CorpusHeader::new("test", "osis"))
    }

    #[test]
    fn test_two_chapters_three_verses() {
        let book = Node::new(NodeKind::Book)
            .with_id("Gen")
            .with_title("Genesis")
            .with_child(
                Node::new(NodeKind::Chapter)
                    .with_child(verse("Gen.1.1", "In the beginning"))
                    .with_child(verse("Gen.1.2", "And the earth")),
            )
            .with_child(Node::new(NodeKind::Chapter).with_child(verse("Gen.2.1", "Thus the heavens")));

        let corpus = compile(&[book]);
        assert_eq!(corpus.documents.len(), 1);
        let doc = &corpus.documents[0];
        assert_eq!(doc.id, "Gen");
        assert_eq!(doc.title, "Genesis");
        assert_eq!(doc.order, 1);
        let seqs: Vec<_> = doc.content_blocks.iter().map(|b| b.sequence).collect();
        assert_eq!(seqs, vec![1, 2, 3]);
        assert_eq!(doc.content_blocks[2].verse_ref().unwrap().chapter, 2);
    }

    #[test]
    fn test_empty_leaves_consume_no_sequence() {
        let book = Node::new(NodeKind::Book)
            .with_id("Ruth")
            .with_child(Node::new(NodeKind::Paragraph).with_text("   "))
            .with_child(Node::new(NodeKind::Paragraph).with_text(" first\n  block "))
            .with_child(Node::new(NodeKind::Line).with_text("\t"))
            .with_child(Node::new(NodeKind::Line).with_text("second"));

        let corpus = compile(&[book]);
        let blocks = &corpus.documents[0].content_blocks;
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].text(), "first block");
        assert_eq!(blocks[0].sequence, 1);
        assert_eq!(blocks[1].sequence, 2);
        assert_eq!(blocks[1].hash(), sha256_hex(b"second"));
        assert!(blocks[0].anchors.is_empty());
    }

    #[test]
    fn test_milestone_attaches_to_next_leaf() {
        let book = Node::new(NodeKind::Book).with_id("Ps").with_child(
            Node::new(NodeKind::Paragraph)
                .with_child(milestone("Ps.23.1"))
                .with_text("The LORD is my shepherd")
                .with_child(milestone("Ps.23.2"))
                .with_text("He maketh me to lie down"),
        );

        let corpus = compile(&[book]);
        let blocks = &corpus.documents[0].content_blocks;
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].verse_ref().unwrap().osis_id, "Ps.23.1");
        assert_eq!(blocks[1].verse_ref().unwrap().osis_id, "Ps.23.2");
    }

    #[test]
    fn test_milestone_before_paragraph() {
        let book = Node::new(NodeKind::Book)
            .with_id("John")
            .with_child(milestone("John.3.16"))
            .with_child(Node::new(NodeKind::Paragraph).with_text("For God so loved"));

        let corpus = compile(&[book]);
        let block = &corpus.documents[0].content_blocks[0];
        assert_eq!(block.verse_ref().unwrap().verse, 16);
        assert_eq!(block.anchors[0].content_block_id, block.id);
    }

    #[test]
    fn test_paragraph_locator_attribute() {
        let book = Node::new(NodeKind::Book).with_id("Jude").with_child(
            Node::new(NodeKind::Paragraph)
                .with_locator("Jude.1.1 Jude.1.2")
                .with_text("Jude, the servant"),
        );
        let corpus = compile(&[book]);
        assert_eq!(
            corpus.documents[0].content_blocks[0].verse_ref().unwrap().osis_id,
            "Jude.1.1"
        );
    }

    #[test]
    fn test_group_with_book_code_is_document() {
        let root = Node::new(NodeKind::Group)
            .with_child(Node::new(NodeKind::Group).with_id("Matt").with_text("text"))
            .with_child(Node::new(NodeKind::Group).with_id("notabook").with_text("x"));

        let corpus = compile(&[root]);
        assert_eq!(corpus.documents.len(), 1);
        assert_eq!(corpus.documents[0].id, "Matt");
        assert_eq!(corpus.documents[0].title, "Matt");
        assert_eq!(corpus.documents[0].content_blocks.len(), 1);
    }

    #[test]
    fn test_nested_books_are_independent() {
        let inner = Node::new(NodeKind::Book)
            .with_id("Obad")
            .with_child(verse("Obad.1.1", "The vision"));
        let outer = Node::new(NodeKind::Book)
            .with_id("Prophets")
            .with_child(Node::new(NodeKind::Paragraph).with_text("Intro"))
            .with_child(inner)
            .with_child(Node::new(NodeKind::Paragraph).with_text("Outro"));

        let corpus = compile(&[outer]);
        assert_eq!(corpus.documents.len(), 2);
        let outer = &corpus.documents[0];
        let inner = &corpus.documents[1];
        assert_eq!((outer.order, inner.order), (1, 2));
        let outer_seqs: Vec<_> = outer.content_blocks.iter().map(|b| b.sequence).collect();
        assert_eq!(outer_seqs, vec![1, 2]);
        assert_eq!(outer.content_blocks[1].text(), "Outro");
        assert_eq!(inner.content_blocks[0].sequence, 1);
    }

    #[test]
    fn test_missing_book_id_uses_fallback() {
        let a = Node::new(NodeKind::Book).with_text("one");
        let b = Node::new(NodeKind::Book).with_text("two");
        let mut header = CorpusHeader::new("kjv", "osis");
        header.fallback_document_id = "mybook".into();
        let corpus = compile_corpus(&[a, b], b"", header);
        assert_eq!(corpus.documents[0].id, "mybook");
        assert_eq!(corpus.documents[1].id, "mybook-2");
    }

    #[test]
    fn test_text_outside_books_is_dropped() {
        let root = Node::new(NodeKind::Group).with_text("preface");
        let corpus = compile(&[root]);
        assert!(corpus.documents.is_empty());
    }

    #[test]
    fn test_source_hash_is_digest_of_raw_bytes() {
        let book = Node::new(NodeKind::Book).with_id("Gen").with_text("x");
        let a = compile_corpus(std::slice::from_ref(&book), b"<a/>", CorpusHeader::new("t", "osis"));
        let b = compile_corpus(&[book], b"<a />", CorpusHeader::new("t", "osis"));
        assert_eq!(a.source_hash, sha256_hex(b"<a/>"));
        assert_ne!(a.source_hash, b.source_hash);
        assert_eq!(a.documents, b.documents);
    }

    #[test]
    fn test_titles_are_not_blocks() {
        let book = Node::new(NodeKind::Book)
            .with_id("Gen")
            .with_child(Node::new(NodeKind::Title).with_text("Genesis"))
            .with_child(verse("Gen.1.1", "In the beginning"));
        let corpus = compile(&[book]);
        assert_eq!(corpus.documents[0].content_blocks.len(), 1);
    }

    #[test]
    fn test_anchored_verse_discards_queued_milestone() {
        let book = Node::new(NodeKind::Book)
            .with_id("Matt")
            .with_child(verse("Matt.17.20", "Because of your unbelief"))
            .with_child(milestone("Matt.17.21"))
            .with_child(verse("Matt.17.22", "And while they abode in Galilee"))
            .with_child(Node::new(NodeKind::Paragraph).with_text("The Temple Tax"));
        let corpus = compile(&[book]);
        let blocks = &corpus.documents[0].content_blocks;
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[1].verse_ref().unwrap().osis_id, "Matt.17.22");
        assert_eq!(blocks[2].text(), "The Temple Tax");
        assert!(blocks[2].verse_ref().is_none());
    }

    #[test]
    fn test_anchored_verse_in_paragraph_discards_queued_milestone() {
        let book = Node::new(NodeKind::Book).with_id("Matt").with_child(
            Node::new(NodeKind::Paragraph)
                .with_child(milestone("Matt.17.21"))
                .with_child(verse("Matt.17.22", "And while they abode"))
                .with_text(" in Galilee"),
        );
        let corpus = compile(&[book]);
        let blocks = &corpus.documents[0].content_blocks;
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].verse_ref().unwrap().osis_id, "Matt.17.22");
        assert!(blocks[1].verse_ref().is_none());
    }

    #[test]
    fn test_anchored_paragraph_discards_queued_milestone() {
        let book = Node::new(NodeKind::Book)
            .with_id("Gen")
            .with_child(milestone("Gen.1.1"))
            .with_child(
                Node::new(NodeKind::Paragraph)
                    .with_locator("Gen.1.2")
                    .with_text("b"),
            )
            .with_child(Node::new(NodeKind::Paragraph).with_text("note"));
        let corpus = compile(&[book]);
        let blocks = &corpus.documents[0].content_blocks;
        assert_eq!(blocks[0].verse_ref().unwrap().osis_id, "Gen.1.2");
        assert!(blocks[1].verse_ref().is_none());
    }
}
