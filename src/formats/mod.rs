//! The closed set of supported formats.
//!
//! Each format knows how to recognize itself ([`Format::sniff`]), how to map
//! its markup onto the structural [`tree`](crate::tree) ([`Format::read`]),
//! and how to regenerate itself from a corpus ([`Format::write`]). Everything
//! else (hashing, compilation, persistence, loss policy) is shared and lives
//! in [`Adapter`](crate::Adapter).

mod css;
mod html;
mod json;
mod osis;
mod text;
mod zefania;

use std::fmt;

use crate::error::{Error, Result};
use crate::model::{Corpus, LossClass};
use crate::tree::Node;

/// A supported markup dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// OSIS XML (`<osis>`, `<div type="book">`, `<verse osisID>`).
    Osis,
    /// Zefania XML (`<XMLBIBLE>`, `<BIBLEBOOK>`, `<VERS>`).
    Zefania,
    /// Flat JSON verse list.
    Json,
    /// Plain text, one `Book C:V text` line per verse.
    Text,
    /// HTML with book sections and `data-osis` paragraphs.
    Html,
    /// CSS stylesheets; styling only, no IR.
    Css,
}

/// Corpus-level metadata a reader found in the source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceInfo {
    pub id: Option<String>,
    pub title: Option<String>,
    pub language: Option<String>,
    pub versification: Option<String>,
}

/// A source mapped onto the structural tree.
#[derive(Debug, Clone)]
pub struct Source {
    pub info: SourceInfo,
    pub roots: Vec<Node>,
}

impl Format {
    /// All formats, in default detection order.
    pub const ALL: [Format; 6] = [
        Format::Osis,
        Format::Zefania,
        Format::Html,
        Format::Json,
        Format::Text,
        Format::Css,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Format::Osis => "osis",
            Format::Zefania => "zefania",
            Format::Json => "json",
            Format::Text => "text",
            Format::Html => "html",
            Format::Css => "css",
        }
    }

    pub fn from_name(name: &str) -> Option<Format> {
        Format::ALL
            .into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(name))
    }

    /// Extension used for emitted files.
    pub fn extension(self) -> &'static str {
        match self {
            Format::Osis => "osis.xml",
            Format::Zefania => "xml",
            Format::Json => "json",
            Format::Text => "txt",
            Format::Html => "html",
            Format::Css => "css",
        }
    }

    /// Attribute key under which the raw source payload is preserved.
    pub fn raw_key(self) -> String {
        format!("{}_raw", self.name())
    }

    /// Whether ExtractIR and EmitNative are available.
    pub fn supports_ir(self) -> bool {
        self != Format::Css
    }

    /// Loss class of regenerating this format from IR.
    pub fn regeneration_class(self) -> LossClass {
        match self {
            Format::Text => LossClass::L3,
            _ => LossClass::L1,
        }
    }

    /// Decide from the extension and leading bytes whether a file is in this
    /// format. `Ok` and `Err` both carry the human-readable reason.
    pub fn sniff(self, extension: Option<&str>, head: &[u8]) -> std::result::Result<String, String> {
        match self {
            Format::Osis => osis::sniff(extension, head),
            Format::Zefania => zefania::sniff(extension, head),
            Format::Json => json::sniff(extension, head),
            Format::Text => text::sniff(extension, head),
            Format::Html => html::sniff(extension, head),
            Format::Css => css::sniff(extension, head),
        }
    }

    /// Map a raw payload onto the structural tree.
    pub fn read(self, raw: &[u8]) -> Result<Source> {
        match self {
            Format::Osis => osis::read(raw),
            Format::Zefania => zefania::read(raw),
            Format::Json => json::read(raw),
            Format::Text => text::read(raw),
            Format::Html => html::read(raw),
            Format::Css => Err(self.unsupported("ExtractIR")),
        }
    }

    /// Regenerate a native file from a corpus.
    pub fn write(self, corpus: &Corpus) -> Result<Vec<u8>> {
        match self {
            Format::Osis => Ok(osis::write(corpus).into_bytes()),
            Format::Zefania => Ok(zefania::write(corpus).into_bytes()),
            Format::Json => json::write(corpus),
            Format::Text => Ok(text::write(corpus).into_bytes()),
            Format::Html => Ok(html::write(corpus).into_bytes()),
            Format::Css => Err(self.unsupported("EmitNative")),
        }
    }

    pub(crate) fn unsupported(self, operation: &'static str) -> Error {
        Error::Unsupported {
            format: self.name(),
            operation,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Case-insensitive search for `needle` in `haystack`.
pub(crate) fn contains_ignore_case(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.len() >= needle.len()
        && haystack
            .windows(needle.len())
            .any(|w| w.eq_ignore_ascii_case(needle))
}
