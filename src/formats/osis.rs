//! OSIS XML.
//!
//! `<div type="book" osisID>` opens a book, `<chapter>` groups chapters and
//! `<verse>` appears either as a container (`<verse osisID>text</verse>`) or
//! as a start/end milestone pair (`<verse sID osisID/> ... <verse eID/>`).
//! Notes and the header never contribute text.

use super::{Source, SourceInfo};
use crate::error::{Error, Result};
use crate::export::{MarkupSchema, escape_xml, synthesize};
use crate::markup::{Element, Markup, xml};
use crate::model::{ContentBlock, Corpus, Document, Ref};
use crate::tree::{Node, NodeKind};

const NAMESPACE: &str = "http://www.bibletechnologies.net/2003/OSIS/namespace";

pub(super) fn sniff(extension: Option<&str>, head: &[u8]) -> std::result::Result<String, String> {
    let has_root = memchr::memmem::find(head, b"<osis").is_some();
    match extension {
        Some("osis") => Ok("file extension is .osis".into()),
        Some("xml") if has_root => Ok("XML file with an <osis> root element".into()),
        Some("xml") => Err("XML file without an <osis> root element".into()),
        _ if has_root => Ok("content has an <osis> root element".into()),
        _ => Err("not an OSIS document".into()),
    }
}

pub(super) fn read(raw: &[u8]) -> Result<Source> {
    let root = xml::parse(raw)?;
    if root.name != "osis" {
        return Err(Error::MalformedInput(format!(
            "expected <osis> root element, found <{}>",
            root.name
        )));
    }
    let text = root.child("osisText").unwrap_or(&root);

    let mut info = SourceInfo {
        id: text.attr("osisIDWork").map(str::to_string),
        language: text.attr("lang").map(str::to_string),
        ..Default::default()
    };
    if let Some(work) = text.child("header").and_then(|h| h.child("work")) {
        info.title = work.child("title").map(Element::text);
        info.versification = work
            .child("refSystem")
            .map(|r| r.text().trim().trim_start_matches("Bible.").to_string())
            .filter(|v| !v.is_empty());
    }

    let mut roots = Vec::new();
    for child in text.elements() {
        if let Some(node) = map_element(child) {
            roots.push(node);
        }
    }
    Ok(Source { info, roots })
}

fn map_element(element: &Element) -> Option<Node> {
    let mut node = match element.name.as_str() {
        "header" | "note" => return None,
        "div" if element.attr("type") == Some("book") => {
            let mut node = Node::new(NodeKind::Book);
            node.id = element.attr("osisID").map(str::to_string);
            node.title = element.child("title").map(Element::text);
            node
        }
        "div" => {
            let mut node = Node::new(NodeKind::Group);
            node.id = element.attr("osisID").map(str::to_string);
            node
        }
        "chapter" => {
            // Chapter milestones carry no content; verse locators already
            // name the chapter.
            if element.children.is_empty() {
                return None;
            }
            let mut node = Node::new(NodeKind::Chapter);
            node.id = element.attr("osisID").map(str::to_string);
            node
        }
        "verse" => {
            if element.attr("eID").is_some() && element.attr("osisID").is_none() {
                return None;
            }
            let mut node = Node::new(NodeKind::Verse);
            node.locator = element.attr("osisID").map(str::to_string);
            node
        }
        "p" => Node::new(NodeKind::Paragraph),
        "lg" => Node::new(NodeKind::Group),
        "l" => Node::new(NodeKind::Line),
        "title" => Node::new(NodeKind::Title),
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

struct OsisSchema;

impl MarkupSchema for OsisSchema {
    fn begin(&self, out: &mut String, corpus: &Corpus) {
        out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        out.push_str(&format!("<osis xmlns=\"{}\">\n", NAMESPACE));
        out.push_str(&format!(
            "  <osisText osisIDWork=\"{}\" xml:lang=\"{}\">\n",
            escape_xml(&corpus.id),
            escape_xml(&corpus.language)
        ));
        out.push_str("    <header>\n");
        out.push_str(&format!(
            "      <work osisWork=\"{}\">\n",
            escape_xml(&corpus.id)
        ));
        out.push_str(&format!(
            "        <title>{}</title>\n",
            escape_xml(&corpus.title)
        ));
        if !corpus.versification.is_empty() {
            out.push_str(&format!(
                "        <refSystem>Bible.{}</refSystem>\n",
                escape_xml(&corpus.versification)
            ));
        }
        out.push_str("      </work>\n");
        out.push_str("    </header>\n");
    }

    fn end(&self, out: &mut String, _corpus: &Corpus) {
        out.push_str("  </osisText>\n</osis>\n");
    }

    fn open_book(&self, out: &mut String, doc: &Document) {
        out.push_str(&format!(
            "    <div type=\"book\" osisID=\"{}\">\n",
            escape_xml(&doc.id)
        ));
        out.push_str(&format!("      <title>{}</title>\n", escape_xml(&doc.title)));
    }

    fn close_book(&self, out: &mut String, _doc: &Document) {
        out.push_str("    </div>\n");
    }

    fn open_chapter(&self, out: &mut String, doc: &Document, chapter: u32) {
        out.push_str(&format!(
            "      <chapter osisID=\"{}.{}\">\n",
            escape_xml(&doc.id),
            chapter
        ));
    }

    fn close_chapter(&self, out: &mut String, _doc: &Document, _chapter: u32) {
        out.push_str("      </chapter>\n");
    }

    fn block(&self, out: &mut String, _doc: &Document, block: &ContentBlock, verse: Option<&Ref>) {
        match verse {
            Some(r) => out.push_str(&format!(
                "        <verse osisID=\"{}\">{}</verse>\n",
                escape_xml(&r.osis_id),
                escape_xml(block.text())
            )),
            None => out.push_str(&format!("        <p>{}</p>\n", escape_xml(block.text()))),
        }
    }
}

pub(super) fn write(corpus: &Corpus) -> String {
    synthesize(corpus, &OsisSchema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{CorpusHeader, compile_corpus};

    const SAMPLE: &[u8] = br#"<?xml version="1.0" encoding="UTF-8"?>
<osis xmlns="http://www.bibletechnologies.net/2003/OSIS/namespace">
  <osisText osisIDWork="KJV" xml:lang="en">
    <header>
      <work osisWork="KJV">
        <title>King James Version</title>
        <refSystem>Bible.KJV</refSystem>
      </work>
    </header>
    <div type="book" osisID="Gen">
      <title>Genesis</title>
      <chapter osisID="Gen.1">
        <verse osisID="Gen.1.1">In the beginning God created the heaven and the earth.</verse>
        <verse osisID="Gen.1.2">And the earth was without form<note>Or, empty</note>, and void.</verse>
      </chapter>
      <chapter osisID="Gen.2">
        <verse osisID="Gen.2.1">Thus the heavens and the earth were finished.</verse>
      </chapter>
    </div>
  </osisText>
</osis>"#;

    fn compile(raw: &[u8]) -> Corpus {
        let source = read(raw).unwrap();
        let id = source.info.id.clone().unwrap_or_default();
        compile_corpus(&source.roots, raw, CorpusHeader::new(id, "osis"))
    }

    #[test]
    fn test_sniff() {
        assert!(sniff(Some("xml"), b"<?xml?><osis xmlns=\"x\">").is_ok());
        assert!(sniff(Some("osis"), b"").is_ok());
        assert!(sniff(Some("xml"), b"<XMLBIBLE>").is_err());
        assert!(sniff(Some("txt"), b"Gen 1:1").is_err());
    }

    #[test]
    fn test_header_metadata() {
        let source = read(SAMPLE).unwrap();
        assert_eq!(source.info.id.as_deref(), Some("KJV"));
        assert_eq!(source.info.language.as_deref(), Some("en"));
        assert_eq!(source.info.title.as_deref(), Some("King James Version"));
        assert_eq!(source.info.versification.as_deref(), Some("KJV"));
    }

    #[test]
    fn test_verse_containers() {
        let corpus = compile(SAMPLE);
        assert_eq!(corpus.documents.len(), 1);
        let doc = &corpus.documents[0];
        assert_eq!(doc.id, "Gen");
        assert_eq!(doc.title, "Genesis");
        assert_eq!(doc.content_blocks.len(), 3);
        assert_eq!(
            doc.content_blocks[1].text(),
            "And the earth was without form, and void."
        );
        let r = doc.content_blocks[2].verse_ref().unwrap();
        assert_eq!((r.book.as_str(), r.chapter, r.verse), ("Gen", 2, 1));
    }

    #[test]
    fn test_milestone_verses() {
        let raw = br#"<osis><osisText osisIDWork="t">
<div type="book" osisID="Ps">
<chapter sID="Ps.23" osisID="Ps.23"/>
<p><verse sID="Ps.23.1" osisID="Ps.23.1"/>The LORD is my shepherd; I shall not want.<verse eID="Ps.23.1"/>
<verse sID="Ps.23.2" osisID="Ps.23.2"/>He maketh me to lie down in green pastures.<verse eID="Ps.23.2"/></p>
<chapter eID="Ps.23"/>
</div></osisText></osis>"#;
        let corpus = compile(raw);
        let blocks = &corpus.documents[0].content_blocks;
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].verse_ref().unwrap().osis_id, "Ps.23.1");
        assert_eq!(blocks[1].text(), "He maketh me to lie down in green pastures.");
    }

    #[test]
    fn test_wrong_root_is_malformed() {
        let err = read(b"<XMLBIBLE/>").unwrap_err();
        assert!(matches!(err, Error::MalformedInput(_)));
    }

    #[test]
    fn test_regenerated_markup_reads_back() {
        let corpus = compile(SAMPLE);
        let out = write(&corpus);
        assert!(out.contains("<chapter osisID=\"Gen.1\">"));
        assert!(out.contains("<verse osisID=\"Gen.2.1\">"));

        let again = compile(out.as_bytes());
        assert_eq!(again.documents, corpus.documents);
    }

    #[test]
    fn test_write_escapes_text() {
        let mut corpus = Corpus::new("t", "osis", b"");
        let mut doc = Document::new("Gen", "Genesis", 1);
        doc.content_blocks
            .push(ContentBlock::new(1, "a < b & \"c\"").with_verse("Gen.1.1"));
        corpus.documents.push(doc);
        let out = write(&corpus);
        assert!(out.contains("a &lt; b &amp; &quot;c&quot;"));
        assert!(xml::parse(out.as_bytes()).is_ok());
    }

    #[test]
    fn test_reference_text_is_kept_outside_notes() {
        let raw = br#"<osis><osisText osisIDWork="t"><div type="book" osisID="Mark">
<chapter osisID="Mark.1">
<verse osisID="Mark.1.2">As it is written in <reference osisRef="Isa.40.3">the prophets</reference>, Behold.<note>See <reference osisRef="Mal.3.1">Mal 3:1</reference></note></verse>
</chapter></div></osisText></osis>"#;
        let corpus = compile(raw);
        let block = &corpus.documents[0].content_blocks[0];
        assert_eq!(block.text(), "As it is written in the prophets, Behold.");
        assert_eq!(block.verse_ref().unwrap().osis_id, "Mark.1.2");
    }
}
