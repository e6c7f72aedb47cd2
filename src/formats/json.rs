//! Flat JSON verse lists.
//!
//! Accepts either a bare array of verse records or an object with
//! `metadata` and `verses`. Records for the same book are gathered into one
//! book in order of first appearance. A record with chapter and verse both
//! `0` is text without a locator.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{Source, SourceInfo};
use crate::error::{Error, Result};
use crate::model::{Corpus, Ref};
use crate::tree::{Node, NodeKind};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct VerseRecord {
    book: String,
    #[serde(default)]
    chapter: u32,
    #[serde(default)]
    verse: u32,
    #[serde(default, skip_serializing_if = "is_zero")]
    verse_end: u32,
    text: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    versification: Option<String>,
    /// Book code to display title.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    books: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct VerseFile {
    #[serde(default)]
    metadata: Metadata,
    verses: Vec<VerseRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Payload {
    List(Vec<VerseRecord>),
    File(VerseFile),
}

fn is_zero(n: &u32) -> bool {
    *n == 0
}

pub(super) fn sniff(extension: Option<&str>, head: &[u8]) -> std::result::Result<String, String> {
    let first = head.iter().find(|b| !b.is_ascii_whitespace());
    match (extension, first) {
        (Some("json"), Some(b'[' | b'{')) => Ok("JSON file with an array or object".into()),
        (Some("json"), None) => Err("JSON file is empty".into()),
        (Some("json"), Some(_)) => Err("JSON file does not start with an array or object".into()),
        _ => Err("file extension is not .json".into()),
    }
}

pub(super) fn read(raw: &[u8]) -> Result<Source> {
    let payload: Payload = serde_json::from_slice(crate::util::strip_bom(raw))
        .map_err(|e| Error::MalformedInput(format!("invalid verse JSON: {}", e)))?;
    let (metadata, verses) = match payload {
        Payload::List(verses) => (Metadata::default(), verses),
        Payload::File(file) => (file.metadata, file.verses),
    };

    let mut roots: Vec<Node> = Vec::new();
    for record in verses {
        let index = match roots.iter().position(|n| n.id.as_deref() == Some(record.book.as_str())) {
            Some(index) => index,
            None => {
                let mut book = Node::new(NodeKind::Book).with_id(record.book.as_str());
                book.title = metadata.books.get(&record.book).cloned();
                roots.push(book);
                roots.len() - 1
            }
        };

        let mut verse = Node::new(NodeKind::Verse).with_text(record.text);
        if record.chapter != 0 || record.verse != 0 {
            let r = Ref::new(record.book, record.chapter, record.verse).with_verse_end(record.verse_end);
            verse.locator = Some(r.osis_id);
        }
        roots[index].push(verse);
    }

    let info = SourceInfo {
        id: metadata.id,
        title: metadata.title,
        language: metadata.language,
        versification: metadata.versification,
    };
    Ok(Source { info, roots })
}

pub(super) fn write(corpus: &Corpus) -> Result<Vec<u8>> {
    let non_empty = |s: &str| Some(s.to_string()).filter(|s| !s.is_empty());
    let mut file = VerseFile {
        metadata: Metadata {
            id: non_empty(&corpus.id),
            title: non_empty(&corpus.title),
            language: non_empty(&corpus.language),
            versification: non_empty(&corpus.versification),
            books: BTreeMap::new(),
        },
        verses: Vec::with_capacity(corpus.block_count()),
    };

    for doc in &corpus.documents {
        if doc.title != doc.id {
            file.metadata.books.insert(doc.id.clone(), doc.title.clone());
        }
        for block in &doc.content_blocks {
            let record = match block.verse_ref() {
                Some(r) => VerseRecord {
                    book: doc.id.clone(),
                    chapter: r.chapter,
                    verse: r.verse,
                    verse_end: r.verse_end,
                    text: block.text().to_string(),
                },
                None => VerseRecord {
                    book: doc.id.clone(),
                    chapter: 0,
                    verse: 0,
                    verse_end: 0,
                    text: block.text().to_string(),
                },
            };
            file.verses.push(record);
        }
    }

    let mut out = serde_json::to_vec_pretty(&file)
        .map_err(|e| Error::MalformedIr(format!("failed to serialize verses: {}", e)))?;
    out.push(b'\n');
    Ok(out)
}
