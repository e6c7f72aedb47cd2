//! HTML.
//!
//! Books are `section`/`div`/`article` elements with class `book` or a
//! `data-book` attribute (or whose `id` is a book code). Verse locators come
//! from `data-osis` on paragraphs, or from `span.verse[data-osis]` markers
//! inside running text.

use super::{Source, SourceInfo, contains_ignore_case};
use crate::error::Result;
use crate::export::{MarkupSchema, escape_xml, synthesize};
use crate::markup::{Element, Markup, html};
use crate::model::{ContentBlock, Corpus, Document, Ref};
use crate::tree::{Node, NodeKind};

pub(super) fn sniff(extension: Option<&str>, head: &[u8]) -> std::result::Result<String, String> {
    match extension {
        Some("html" | "htm" | "xhtml") => Ok("file extension is .html".into()),
        _ if contains_ignore_case(head, b"<html") => Ok("content has an <html> element".into()),
        _ => Err("not an HTML document".into()),
    }
}

pub(super) fn read(raw: &[u8]) -> Result<Source> {
    let root = html::parse(raw)?;

    let mut info = SourceInfo {
        language: root.attr("lang").map(str::to_string),
        ..Default::default()
    };
    if let Some(head) = root.child("head") {
        info.title = head
            .child("title")
            .map(|t| t.text().trim().to_string())
            .filter(|t| !t.is_empty());
        for meta in head.elements().filter(|e| e.name == "meta") {
            let content = meta.attr("content").map(str::to_string);
            match meta.attr("name") {
                Some("identifier") => info.id = content,
                Some("versification") => info.versification = content,
                _ => {}
            }
        }
    }

    let mut roots = Vec::new();
    if let Some(body) = root.child("body") {
        for child in &body.children {
            if let Markup::Element(e) = child
                && let Some(node) = map_element(e)
            {
                roots.push(node);
            }
        }
    }
    Ok(Source { info, roots })
}

fn heading_text(element: &Element) -> Option<String> {
    element
        .elements()
        .find(|e| matches!(e.name.as_str(), "h1" | "h2" | "h3"))
        .map(Element::text)
}

fn map_element(element: &Element) -> Option<Node> {
    let mut node = match element.name.as_str() {
        "head" | "script" | "style" | "template" | "nav" => return None,
        "br" => return Some(Node::new(NodeKind::Group).with_text(" ")),
        "section" | "div" | "article" => {
            if element.has_class("book") || element.attr("data-book").is_some() {
                let mut node = Node::new(NodeKind::Book);
                node.id = element
                    .attr("data-book")
                    .or_else(|| element.attr("id"))
                    .map(str::to_string);
                node.title = heading_text(element);
                node
            } else if element.has_class("chapter") {
                Node::new(NodeKind::Chapter)
            } else {
                let mut node = Node::new(NodeKind::Group);
                node.id = element.attr("id").map(str::to_string);
                if node.id.is_some() {
                    node.title = heading_text(element);
                }
                node
            }
        }
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => Node::new(NodeKind::Title),
        "p" | "li" | "blockquote" => {
            let mut node = Node::new(NodeKind::Paragraph);
            node.locator = element
                .attr("data-osis")
                .or_else(|| element.attr("data-ref"))
                .map(str::to_string);
            node
        }
        "span" | "sup" | "a" if element.has_class("verse") => {
            // Verse markers display a number; only the locator matters.
            let mut node = Node::new(NodeKind::Verse);
            node.locator = element.attr("data-osis").map(str::to_string);
            return Some(node);
        }
        _ => Node::new(NodeKind::Group),
    };

    for child in &element.children {
        match child {
            Markup::Text(t) => node.push_text(t.as_str()),
            Markup::Element(e) => {
                if let Some(n) = map_element(e) {
                    node.push(n);
                }
            }
        }
    }
    Some(node)
}

struct HtmlSchema;

impl MarkupSchema for HtmlSchema {
    fn begin(&self, out: &mut String, corpus: &Corpus) {
        out.push_str("<!DOCTYPE html>\n");
        out.push_str(&format!("<html lang=\"{}\">\n", escape_xml(&corpus.language)));
        out.push_str("<head>\n<meta charset=\"utf-8\">\n");
        out.push_str(&format!("<title>{}</title>\n", escape_xml(&corpus.title)));
        out.push_str(&format!(
            "<meta name=\"identifier\" content=\"{}\">\n",
            escape_xml(&corpus.id)
        ));
        if !corpus.versification.is_empty() {
            out.push_str(&format!(
                "<meta name=\"versification\" content=\"{}\">\n",
                escape_xml(&corpus.versification)
            ));
        }
        out.push_str("</head>\n<body>\n");
    }

    fn end(&self, out: &mut String, _corpus: &Corpus) {
        out.push_str("</body>\n</html>\n");
    }

    fn open_book(&self, out: &mut String, doc: &Document) {
        out.push_str(&format!(
            "<section class=\"book\" data-book=\"{}\">\n<h1>{}</h1>\n",
            escape_xml(&doc.id),
            escape_xml(&doc.title)
        ));
    }

    fn close_book(&self, out: &mut String, _doc: &Document) {
        out.push_str("</section>\n");
    }

    fn open_chapter(&self, out: &mut String, _doc: &Document, chapter: u32) {
        out.push_str(&format!(
            "<section class=\"chapter\" data-chapter=\"{0}\">\n<h2>{0}</h2>\n",
            chapter
        ));
    }

    fn close_chapter(&self, out: &mut String, _doc: &Document, _chapter: u32) {
        out.push_str("</section>\n");
    }

    fn block(&self, out: &mut String, _doc: &Document, block: &ContentBlock, verse: Option<&Ref>) {
        match verse {
            Some(r) => out.push_str(&format!(
                "<p data-osis=\"{}\">{}</p>\n",
                escape_xml(&r.osis_id),
                escape_xml(block.text())
            )),
            None => out.push_str(&format!("<p>{}</p>\n", escape_xml(block.text()))),
        }
    }
}

pub(super) fn write(corpus: &Corpus) -> String {
    synthesize(corpus, &HtmlSchema)
}
