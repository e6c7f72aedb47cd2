//! The IR graph: Corpus → Document → ContentBlock → Anchor → Span.
//!
//! Ownership is strictly hierarchical. The only denormalized field is
//! [`Anchor::content_block_id`], which always equals the owning block's id.
//! The graph is built once per conversion and read-only afterwards.

use std::collections::BTreeMap;
use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use super::loss::LossClass;
use super::reference::{Ref, parse_ref};
use crate::error::{Error, Result};
use crate::util::{is_sha256_hex, sha256_hex};

/// Root of one conversion unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Corpus {
    pub id: String,
    pub version: String,
    pub module_type: String,
    pub title: String,
    pub language: String,
    pub versification: String,
    pub source_format: String,
    /// Digest of the exact input bytes; never changes after creation.
    pub source_hash: String,
    pub loss_class: LossClass,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub documents: Vec<Document>,
}

/// One addressable sub-unit (a book).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub title: String,
    /// 1-based rank within the corpus; not necessarily contiguous.
    pub order: u32,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub content_blocks: Vec<ContentBlock>,
}

/// The atomic unit of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    pub id: String,
    pub sequence: u32,
    text: String,
    hash: String,
    #[serde(default)]
    pub anchors: Vec<Anchor>,
}

/// A reference point inside a block's text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    pub id: String,
    pub position: usize,
    pub content_block_id: String,
    #[serde(default)]
    pub spans: Vec<Span>,
}

/// A typed semantic range starting at an anchor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub id: String,
    #[serde(rename = "type")]
    pub span_type: SpanType,
    pub start_anchor_id: String,
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<Ref>,
}

/// Span type. Only `verse` is interpreted; anything else passes through.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SpanType {
    Verse,
    Other(String),
}

impl From<String> for SpanType {
    fn from(s: String) -> Self {
        if s == "verse" {
            SpanType::Verse
        } else {
            SpanType::Other(s)
        }
    }
}

impl From<SpanType> for String {
    fn from(t: SpanType) -> Self {
        match t {
            SpanType::Verse => "verse".to_string(),
            SpanType::Other(s) => s,
        }
    }
}

impl fmt::Display for SpanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpanType::Verse => f.write_str("verse"),
            SpanType::Other(s) => f.write_str(s),
        }
    }
}

impl Corpus {
    /// Create an empty corpus for the given source bytes.
    pub fn new(id: impl Into<String>, source_format: impl Into<String>, source: &[u8]) -> Self {
        Self {
            id: id.into(),
            version: String::new(),
            module_type: String::new(),
            title: String::new(),
            language: String::new(),
            versification: String::new(),
            source_format: source_format.into(),
            source_hash: sha256_hex(source),
            loss_class: LossClass::L1,
            attributes: BTreeMap::new(),
            documents: Vec::new(),
        }
    }

    /// Look up a document by id.
    pub fn document(&self, id: &str) -> Option<&Document> {
        self.documents.iter().find(|d| d.id == id)
    }

    /// Total number of content blocks across all documents.
    pub fn block_count(&self) -> usize {
        self.documents.iter().map(|d| d.content_blocks.len()).sum()
    }

    /// Number of blocks carrying a verse locator.
    pub fn verse_count(&self) -> usize {
        self.documents
            .iter()
            .flat_map(|d| &d.content_blocks)
            .filter(|b| b.verse_ref().is_some())
            .count()
    }

    /// Store a raw payload under `key`, base64-encoded.
    pub fn set_raw_payload(&mut self, key: impl Into<String>, raw: &[u8]) {
        self.attributes.insert(key.into(), STANDARD.encode(raw));
    }

    /// Decode the raw payload stored under `key`.
    ///
    /// Returns `None` when the key is absent or empty.
    pub fn raw_payload(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match self.attributes.get(key) {
            Some(value) if !value.is_empty() => STANDARD
                .decode(value)
                .map(Some)
                .map_err(|e| Error::MalformedIr(format!("attribute {key} is not base64: {e}"))),
            _ => Ok(None),
        }
    }

    /// Serialize to persisted IR JSON.
    pub fn to_json_vec(&self, pretty: bool) -> Result<Vec<u8>> {
        let json = if pretty {
            serde_json::to_vec_pretty(self)
        } else {
            serde_json::to_vec(self)
        };
        json.map_err(|e| Error::MalformedIr(e.to_string()))
    }

    /// Parse persisted IR JSON and check its structural invariants.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        let corpus: Corpus =
            serde_json::from_slice(bytes).map_err(|e| Error::MalformedIr(e.to_string()))?;
        corpus.validate()?;
        Ok(corpus)
    }

    /// Check the invariants a loaded corpus must satisfy before emission.
    pub fn validate(&self) -> Result<()> {
        if self.id.is_empty() {
            return Err(Error::MalformedIr("corpus id is empty".into()));
        }
        if !is_sha256_hex(&self.source_hash) {
            return Err(Error::MalformedIr(format!(
                "source_hash {:?} is not a SHA-256 hex digest",
                self.source_hash
            )));
        }

        for doc in &self.documents {
            if doc.id.is_empty() {
                return Err(Error::MalformedIr("document id is empty".into()));
            }
            let mut last = 0;
            for block in &doc.content_blocks {
                if block.sequence <= last {
                    return Err(Error::MalformedIr(format!(
                        "document {}: block sequence {} does not increase",
                        doc.id, block.sequence
                    )));
                }
                last = block.sequence;

                if block.id != block_id(block.sequence) {
                    return Err(Error::MalformedIr(format!(
                        "document {}: block id {} does not match sequence {}",
                        doc.id, block.id, block.sequence
                    )));
                }
                if block.hash != sha256_hex(block.text.as_bytes()) {
                    return Err(Error::MalformedIr(format!(
                        "document {}: block {} hash does not match its text",
                        doc.id, block.id
                    )));
                }
                if let Some(anchor) = block
                    .anchors
                    .iter()
                    .find(|a| a.content_block_id != block.id)
                {
                    return Err(Error::MalformedIr(format!(
                        "anchor {} names block {} but belongs to {}",
                        anchor.id, anchor.content_block_id, block.id
                    )));
                }
            }
        }
        Ok(())
    }
}

impl Document {
    pub fn new(id: impl Into<String>, title: impl Into<String>, order: u32) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            order,
            attributes: BTreeMap::new(),
            content_blocks: Vec::new(),
        }
    }

    /// Blocks whose verse locator falls in `chapter`.
    pub fn blocks_for_chapter(&self, chapter: u32) -> impl Iterator<Item = &ContentBlock> {
        self.content_blocks
            .iter()
            .filter(move |b| b.verse_ref().is_some_and(|r| r.chapter == chapter))
    }
}

fn block_id(sequence: u32) -> String {
    format!("cb-{}", sequence)
}

impl ContentBlock {
    /// Create a block; the text is stored as given and hashed.
    pub fn new(sequence: u32, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            id: block_id(sequence),
            sequence,
            hash: sha256_hex(text.as_bytes()),
            text,
            anchors: Vec::new(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Digest of [`text`](Self::text).
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Replace the text, recomputing the hash.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.hash = sha256_hex(self.text.as_bytes());
    }

    /// Attach a verse anchor (position 0) for `locator`.
    pub fn with_verse(mut self, locator: &str) -> Self {
        let index = self.anchors.len();
        let anchor_id = format!("a-{}-{}", self.sequence, index);
        let reference = parse_ref(locator);
        self.anchors.push(Anchor {
            id: anchor_id.clone(),
            position: 0,
            content_block_id: self.id.clone(),
            spans: vec![Span {
                id: format!("s-{}", reference.osis_id),
                span_type: SpanType::Verse,
                start_anchor_id: anchor_id,
                reference: Some(reference),
            }],
        });
        self
    }

    /// First verse span's locator, if any.
    pub fn verse_ref(&self) -> Option<&Ref> {
        self.anchors
            .iter()
            .flat_map(|a| &a.spans)
            .filter(|s| s.span_type == SpanType::Verse)
            .find_map(|s| s.reference.as_ref())
    }
}
