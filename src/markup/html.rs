//! Lenient HTML reader (html5ever).
//!
//! HTML never fails to tokenize; the only malformed envelope is a document
//! without an `<html>` root after parsing, which html5ever always supplies.

use html5ever::driver::ParseOpts;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;

use super::Element;
use super::tree_sink::ArenaSink;
use crate::error::{Error, Result};
use crate::util::decode_text;

/// Parse an HTML payload and return its `<html>` element.
pub fn parse(bytes: &[u8]) -> Result<Element> {
    let content = decode_text(bytes, None);
    let sink = ArenaSink::new();
    let dom = parse_document(sink, ParseOpts::default())
        .from_utf8()
        .one(content.as_bytes())
        .into_dom();

    dom.children(dom.document())
        .find_map(|id| dom.to_element(id))
        .ok_or_else(|| Error::MalformedInput("HTML document has no root element".into()))
}
