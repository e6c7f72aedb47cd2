//! Zefania XML.
//!
//! Verses carry only a number (`<VERS vnumber="1">`); their locators are
//! built from the enclosing `BIBLEBOOK` and `CHAPTER`.

use super::{Source, SourceInfo};
use crate::error::{Error, Result};
use crate::export::{MarkupSchema, escape_xml, synthesize};
use crate::markup::{Element, Markup, xml};
use crate::model::reference::{book_code_for_number, book_number};
use crate::model::{ContentBlock, Corpus, Document, Ref, is_book_code};
use crate::tree::{Node, NodeKind};

pub(super) fn sniff(extension: Option<&str>, head: &[u8]) -> std::result::Result<String, String> {
    let has_root = memchr::memmem::find(head, b"<XMLBIBLE").is_some();
    match extension {
        Some("xml") | None if has_root => Ok("XML file with an <XMLBIBLE> root element".into()),
        Some("xml") => Err("XML file without an <XMLBIBLE> root element".into()),
        _ => Err("not a Zefania document".into()),
    }
}

pub(super) fn read(raw: &[u8]) -> Result<Source> {
    let root = xml::parse(raw)?;
    if !root.name.eq_ignore_ascii_case("XMLBIBLE") {
        return Err(Error::MalformedInput(format!(
            "expected <XMLBIBLE> root element, found <{}>",
            root.name
        )));
    }

    let mut info = SourceInfo {
        title: root.attr("biblename").map(str::to_string),
        ..Default::default()
    };
    if let Some(information) = root.child("INFORMATION") {
        let field = |name: &str| {
            information
                .child(name)
                .map(|e| e.text().trim().to_string())
                .filter(|t| !t.is_empty())
        };
        info.id = field("identifier");
        info.language = field("language");
        if let Some(title) = field("title") {
            info.title = Some(title);
        }
    }

    let roots = root
        .elements()
        .filter(|e| e.name == "BIBLEBOOK")
        .map(map_book)
        .collect();
    Ok(Source { info, roots })
}

/// Canonical code for a book: `bsname` if it is one, else the code for
/// `bnumber`, else whatever name the book has.
fn book_code(book: &Element) -> Option<String> {
    if let Some(short) = book.attr("bsname")
        && is_book_code(short)
    {
        return Some(short.to_string());
    }
    book.attr("bnumber")
        .and_then(|n| n.trim().parse::<usize>().ok())
        .and_then(book_code_for_number)
        .map(str::to_string)
        .or_else(|| book.attr("bsname").map(str::to_string))
        .or_else(|| book.attr("bname").map(str::to_string))
}

fn map_book(book: &Element) -> Node {
    let code = book_code(book);
    let mut node = Node::new(NodeKind::Book);
    node.title = book.attr("bname").map(str::to_string);
    let prefix = code.clone().unwrap_or_default();
    node.id = code;
    map_children(book, &mut node, &prefix, None);
    node
}

fn map_children(element: &Element, node: &mut Node, book: &str, chapter: Option<&str>) {
    for child in &element.children {
        match child {
            Markup::Text(t) => node.push_text(t.as_str()),
            Markup::Element(e) => {
                if let Some(n) = map_element(e, book, chapter) {
                    node.push(n);
                }
            }
        }
    }
}

fn map_element(element: &Element, book: &str, chapter: Option<&str>) -> Option<Node> {
    match element.name.as_str() {
        "REMARK" | "NOTE" | "XREF" | "PROLOG" => None,
        "BR" => Some(Node::new(NodeKind::Group).with_text(" ")),
        "CHAPTER" => {
            let number = element.attr("cnumber").map(str::trim);
            let mut node = Node::new(NodeKind::Chapter);
            if let Some(n) = number {
                node.id = Some(format!("{}.{}", book, n));
            }
            map_children(element, &mut node, book, number);
            Some(node)
        }
        "VERS" => {
            // A verse number outside a chapter cannot form a locator.
            let mut node = Node::new(NodeKind::Verse);
            if let Some(c) = chapter
                && let Some(v) = element.attr("vnumber").map(str::trim)
            {
                node.locator = Some(format!("{}.{}.{}", book, c, v));
            }
            map_children(element, &mut node, book, chapter);
            Some(node)
        }
        "CAPTION" => {
            let mut node = Node::new(NodeKind::Paragraph);
            map_children(element, &mut node, book, chapter);
            Some(node)
        }
        _ => {
            let mut node = Node::new(NodeKind::Group);
            map_children(element, &mut node, book, chapter);
            Some(node)
        }
    }
}

struct ZefaniaSchema;

impl MarkupSchema for ZefaniaSchema {
    fn begin(&self, out: &mut String, corpus: &Corpus) {
        out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        out.push_str(&format!(
            "<XMLBIBLE biblename=\"{}\" type=\"x-bible\">\n",
            escape_xml(&corpus.title)
        ));
        out.push_str("  <INFORMATION>\n");
        out.push_str(&format!("    <title>{}</title>\n", escape_xml(&corpus.title)));
        out.push_str(&format!(
            "    <identifier>{}</identifier>\n",
            escape_xml(&corpus.id)
        ));
        out.push_str(&format!(
            "    <language>{}</language>\n",
            escape_xml(&corpus.language)
        ));
        out.push_str("  </INFORMATION>\n");
    }

    fn end(&self, out: &mut String, _corpus: &Corpus) {
        out.push_str("</XMLBIBLE>\n");
    }

    fn open_book(&self, out: &mut String, doc: &Document) {
        let number = book_number(&doc.id).unwrap_or(doc.order as usize);
        out.push_str(&format!(
            "  <BIBLEBOOK bnumber=\"{}\" bname=\"{}\" bsname=\"{}\">\n",
            number,
            escape_xml(&doc.title),
            escape_xml(&doc.id)
        ));
    }

    fn close_book(&self, out: &mut String, _doc: &Document) {
        out.push_str("  </BIBLEBOOK>\n");
    }

    fn open_chapter(&self, out: &mut String, _doc: &Document, chapter: u32) {
        out.push_str(&format!("    <CHAPTER cnumber=\"{}\">\n", chapter));
    }

    fn close_chapter(&self, out: &mut String, _doc: &Document, _chapter: u32) {
        out.push_str("    </CHAPTER>\n");
    }

    fn block(&self, out: &mut String, _doc: &Document, block: &ContentBlock, verse: Option<&Ref>) {
        let text = escape_xml(block.text());
        match verse {
            Some(r) if r.verse_end != 0 => out.push_str(&format!(
                "      <VERS vnumber=\"{}-{}\">{}</VERS>\n",
                r.verse, r.verse_end, text
            )),
            Some(r) => out.push_str(&format!(
                "      <VERS vnumber=\"{}\">{}</VERS>\n",
                r.verse, text
            )),
            None => out.push_str(&format!("      <CAPTION>{}</CAPTION>\n", text)),
        }
    }
}

pub(super) fn write(corpus: &Corpus) -> String {
    synthesize(corpus, &ZefaniaSchema)
}
