//! Structural emitter: IR corpus back to markup.
//!
//! [`synthesize`] walks documents and blocks in order and drives a
//! [`MarkupSchema`], which knows the element names of one dialect. The walk
//! owns the chapter-grouping policy so every dialect groups the same way:
//!
//! - each document opens one book container;
//! - a block whose verse locator names a chapter other than the open one
//!   closes the open grouping and, unless the chapter is `0`, opens a new one;
//! - blocks without a verse locator stay in whatever grouping is open.
//!
//! [`linearize`] produces the structure-free `Book C:V text` rendering.
//!
//! # Example
//!
//! ```
//! use bibleir::export::escape_xml;
//!
//! assert_eq!(escape_xml("a < b & \"c\""), "a &lt; b &amp; &quot;c&quot;");
//! ```

use crate::model::{ContentBlock, Corpus, Document, Ref};

/// Element vocabulary of one structured dialect.
///
/// Implementations append to `out`; all text and attribute values they write
/// must go through [`escape_xml`].
pub trait MarkupSchema {
    fn begin(&self, out: &mut String, corpus: &Corpus);
    fn end(&self, out: &mut String, corpus: &Corpus);
    fn open_book(&self, out: &mut String, doc: &Document);
    fn close_book(&self, out: &mut String, doc: &Document);
    fn open_chapter(&self, out: &mut String, doc: &Document, chapter: u32);
    fn close_chapter(&self, out: &mut String, doc: &Document, chapter: u32);
    /// One paragraph-like container for `block`; `verse` is its locator.
    fn block(&self, out: &mut String, doc: &Document, block: &ContentBlock, verse: Option<&Ref>);
}

/// Regenerate a structured document from the IR tree.
pub fn synthesize<S: MarkupSchema + ?Sized>(corpus: &Corpus, schema: &S) -> String {
    let mut out = String::new();
    schema.begin(&mut out, corpus);

    for doc in &corpus.documents {
        schema.open_book(&mut out, doc);
        let mut open_chapter = 0;

        for block in &doc.content_blocks {
            let verse = block.verse_ref();
            if let Some(r) = verse
                && r.chapter != open_chapter
            {
                if open_chapter != 0 {
                    schema.close_chapter(&mut out, doc, open_chapter);
                }
                if r.chapter != 0 {
                    schema.open_chapter(&mut out, doc, r.chapter);
                }
                open_chapter = r.chapter;
            }
            schema.block(&mut out, doc, block, verse);
        }

        if open_chapter != 0 {
            schema.close_chapter(&mut out, doc, open_chapter);
        }
        schema.close_book(&mut out, doc);
    }

    schema.end(&mut out, corpus);
    out
}

/// Render every block as one line: `Book C:V[-E] text` for verses, the bare
/// text otherwise.
pub fn linearize(corpus: &Corpus) -> String {
    let mut out = String::new();
    for doc in &corpus.documents {
        for block in &doc.content_blocks {
            if let Some(r) = block.verse_ref() {
                let book = if r.book.is_empty() { &doc.id } else { &r.book };
                out.push_str(&format!("{} {}:{}", book, r.chapter, r.verse));
                if r.verse_end != 0 {
                    out.push_str(&format!("-{}", r.verse_end));
                }
                out.push(' ');
            }
            out.push_str(block.text());
            out.push('\n');
        }
    }
    out
}

/// Escape the five XML special characters.
pub fn escape_xml(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&apos;"),
            _ => result.push(c),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Bracket notation: `[book [ch text text] text]`.
    struct Brackets;

    impl MarkupSchema for Brackets {
        fn begin(&self, out: &mut String, _corpus: &Corpus) {
            out.push('{');
        }
        fn end(&self, out: &mut String, _corpus: &Corpus) {
            out.push('}');
        }
        fn open_book(&self, out: &mut String, doc: &Document) {
            out.push_str(&format!("[{} ", doc.id));
        }
        fn close_book(&self, out: &mut String, _doc: &Document) {
            out.push(']');
        }
        fn open_chapter(&self, out: &mut String, _doc: &Document, chapter: u32) {
            out.push_str(&format!("(c{} ", chapter));
        }
        fn close_chapter(&self, out: &mut String, _doc: &Document, _chapter: u32) {
            out.push(')');
        }
        fn block(&self, out: &mut String, _doc: &Document, block: &ContentBlock, _verse: Option<&Ref>) {
            out.push_str(&format!("<{}>", escape_xml(block.text())));
        }
    }

    fn corpus(blocks: Vec<ContentBlock>) -> Corpus {
        let mut corpus = Corpus::new("t", "osis", b"");
        let mut doc = Document::new("Gen", "Genesis", 1);
        doc.content_blocks = blocks;
        corpus.documents.push(doc);
        corpus
    }

    #[test]
    fn test_chapter_groupings_follow_locators() {
        let corpus = corpus(vec![
            ContentBlock::new(1, "a").with_verse("Gen.1.1"),
            ContentBlock::new(2, "b").with_verse("Gen.1.2"),
            ContentBlock::new(3, "c").with_verse("Gen.2.1"),
        ]);
        assert_eq!(
            synthesize(&corpus, &Brackets),
            "{[Gen (c1 <a><b>)(c2 <c>)]}"
        );
    }

    #[test]
    fn test_unanchored_blocks_stay_in_open_grouping() {
        let corpus = corpus(vec![
            ContentBlock::new(1, "intro"),
            ContentBlock::new(2, "a").with_verse("Gen.1.1"),
            ContentBlock::new(3, "note"),
            ContentBlock::new(4, "b").with_verse("Gen.1.2"),
        ]);
        assert_eq!(
            synthesize(&corpus, &Brackets),
            "{[Gen <intro>(c1 <a><note><b>)]}"
        );
    }

    #[test]
    fn test_chapter_zero_emits_no_grouping() {
        let corpus = corpus(vec![
            ContentBlock::new(1, "a").with_verse("Gen.1.1"),
            ContentBlock::new(2, "b").with_verse("Gen"),
        ]);
        assert_eq!(synthesize(&corpus, &Brackets), "{[Gen (c1 <a>)<b>]}");
    }

    #[test]
    fn test_linearize() {
        let corpus = corpus(vec![
            ContentBlock::new(1, "Heading"),
            ContentBlock::new(2, "In the beginning").with_verse("Gen.1.1"),
            ContentBlock::new(3, "Range").with_verse("Gen.1.2-4"),
        ]);
        assert_eq!(
            linearize(&corpus),
            "Heading\nGen 1:1 In the beginning\nGen 1:2-4 Range\n"
        );
    }

    #[test]
    fn test_escape_all_five() {
        assert_eq!(
            escape_xml(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &apos;Jerry&apos;&lt;/a&gt;"
        );
    }
}
