//! Plain text, one verse per line.
//!
//! A line of the form `Book C:V[-E] text` is a verse; any other non-blank
//! line is unanchored text of the current book. Regeneration keeps only
//! book, locator and text.

use super::{Source, SourceInfo};
use crate::error::Result;
use crate::export::linearize;
use crate::model::{Corpus, Ref};
use crate::tree::{Node, NodeKind};
use crate::util::decode_text;

pub(super) fn sniff(extension: Option<&str>, _head: &[u8]) -> std::result::Result<String, String> {
    match extension {
        Some("txt" | "text") => Ok("file extension is .txt".into()),
        _ => Err("file extension is not .txt".into()),
    }
}

/// Split `Gen 1:2-4 text` into a locator and the remaining text.
fn parse_line(line: &str) -> Option<(Ref, &str)> {
    let (book, rest) = line.split_once(' ')?;
    let (cv, text) = rest.split_once(' ').unwrap_or((rest, ""));
    let (chapter, verses) = cv.split_once(':')?;
    let (verse, verse_end) = verses.split_once('-').unwrap_or((verses, "0"));

    if book.is_empty() || book.contains(':') {
        return None;
    }
    let chapter = chapter.parse().ok()?;
    let verse = verse.parse().ok()?;
    let verse_end = verse_end.parse().ok()?;
    Some((Ref::new(book, chapter, verse).with_verse_end(verse_end), text))
}

pub(super) fn read(raw: &[u8]) -> Result<Source> {
    let content = decode_text(raw, None);
    let mut roots: Vec<Node> = Vec::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match parse_line(line) {
            Some((r, text)) => {
                if roots.last().and_then(|b| b.id.as_deref()) != Some(r.book.as_str()) {
                    roots.push(Node::new(NodeKind::Book).with_id(r.book.as_str()));
                }
                if let Some(book) = roots.last_mut() {
                    book.push(Node::new(NodeKind::Verse).with_locator(r.osis_id).with_text(text));
                }
            }
            None => {
                if roots.is_empty() {
                    roots.push(Node::new(NodeKind::Book));
                }
                if let Some(book) = roots.last_mut() {
                    book.push(Node::new(NodeKind::Paragraph).with_text(line));
                }
            }
        }
    }

    Ok(Source {
        info: SourceInfo::default(),
        roots,
    })
}

pub(super) fn write(corpus: &Corpus) -> String {
    linearize(corpus)
}
