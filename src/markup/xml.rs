//! Strict XML reader (quick-xml).
//!
//! The envelope must be well formed: exactly one root element, balanced and
//! matching tags, no character data outside the root. Anything else is a
//! [`Error::MalformedInput`]. Entity references are resolved for the five
//! predefined entities and numeric character references; unknown entities
//! are dropped.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use super::{Element, Markup, local_name};
use crate::error::{Error, Result};
use crate::util::decode_xml;

/// Parse an XML payload into its root element.
pub fn parse(bytes: &[u8]) -> Result<Element> {
    let content = decode_xml(bytes);
    let mut reader = Reader::from_str(&content);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => stack.push(start_element(&e)),
            Ok(Event::Empty(e)) => close(start_element(&e), &mut stack, &mut root)?,
            Ok(Event::End(e)) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| malformed("end tag without matching start tag"))?;
                let name = local_name(e.name().as_ref()).to_vec();
                if name != element.name.as_bytes() {
                    return Err(malformed(format!(
                        "expected </{}>, found </{}>",
                        element.name,
                        String::from_utf8_lossy(&name)
                    )));
                }
                close(element, &mut stack, &mut root)?;
            }
            Ok(Event::Text(e)) => push_text(&mut stack, &String::from_utf8_lossy(e.as_ref()))?,
            Ok(Event::CData(e)) => push_text(&mut stack, &String::from_utf8_lossy(e.as_ref()))?,
            Ok(Event::GeneralRef(e)) => {
                let entity = String::from_utf8_lossy(e.as_ref());
                if let Some(resolved) = resolve_entity(&entity) {
                    push_text(&mut stack, &resolved)?;
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(malformed(format!(
                    "XML error at byte {}: {e}",
                    reader.buffer_position()
                )));
            }
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(malformed(format!("unclosed element <{}>", open.name)));
    }
    root.ok_or_else(|| malformed("no root element"))
}

fn malformed(message: impl Into<String>) -> Error {
    Error::MalformedInput(message.into())
}

fn start_element(e: &BytesStart<'_>) -> Element {
    let name = String::from_utf8_lossy(local_name(e.name().as_ref())).into_owned();
    let attrs = e
        .attributes()
        .flatten()
        .map(|attr| {
            let key = String::from_utf8_lossy(local_name(attr.key.as_ref())).into_owned();
            let raw = String::from_utf8_lossy(&attr.value).into_owned();
            let value = match quick_xml::escape::unescape(&raw) {
                Ok(v) => v.into_owned(),
                Err(_) => raw,
            };
            (key, value)
        })
        .collect();
    Element {
        name,
        attrs,
        children: Vec::new(),
    }
}

fn close(element: Element, stack: &mut [Element], root: &mut Option<Element>) -> Result<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(Markup::Element(element));
        return Ok(());
    }
    if root.is_some() {
        return Err(malformed(format!(
            "second root element <{}>",
            element.name
        )));
    }
    *root = Some(element);
    Ok(())
}

fn push_text(stack: &mut [Element], text: &str) -> Result<()> {
    let Some(parent) = stack.last_mut() else {
        if text.trim().is_empty() {
            return Ok(());
        }
        return Err(malformed("character data outside the root element"));
    };
    if let Some(Markup::Text(existing)) = parent.children.last_mut() {
        existing.push_str(text);
    } else {
        parent.children.push(Markup::Text(text.to_string()));
    }
    Ok(())
}

/// Resolve XML entity references.
fn resolve_entity(entity: &str) -> Option<String> {
    match entity {
        "apos" => return Some("'".to_string()),
        "quot" => return Some("\"".to_string()),
        "lt" => return Some("<".to_string()),
        "gt" => return Some(">".to_string()),
        "amp" => return Some("&".to_string()),
        _ => {}
    }

    let code = if let Some(hex) = entity.strip_prefix("#x") {
        u32::from_str_radix(hex, 16).ok()
    } else if let Some(dec) = entity.strip_prefix('#') {
        dec.parse::<u32>().ok()
    } else {
        None
    };
    code.and_then(char::from_u32).map(|c| c.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_elements() {
        let root = parse(
            br#"<?xml version="1.0"?>
<osis xmlns="http://www.bibletechnologies.net/2003/OSIS/namespace">
  <osisText xml:lang="en" osisIDWork="KJV">
    <div type="book" osisID="Gen"><verse osisID="Gen.1.1">In the beginning</verse></div>
  </osisText>
</osis>"#,
        )
        .unwrap();
        assert_eq!(root.name, "osis");
        let text = root.child("osisText").unwrap();
        assert_eq!(text.attr("lang"), Some("en"));
        let verse = root.find("verse").unwrap();
        assert_eq!(verse.attr("osisID"), Some("Gen.1.1"));
        assert_eq!(verse.text(), "In the beginning");
    }

    #[test]
    fn test_entities_are_resolved() {
        let root = parse(br#"<p a="x &amp; y">Tom &amp; Jerry &#233;&#x41;</p>"#).unwrap();
        assert_eq!(root.attr("a"), Some("x & y"));
        assert_eq!(root.text(), "Tom & Jerry éA");
    }

    #[test]
    fn test_cdata_is_text() {
        let root = parse(b"<p><![CDATA[a < b]]></p>").unwrap();
        assert_eq!(root.text(), "a < b");
    }

    #[test]
    fn test_malformed_envelopes() {
        for input in [
            &b""[..],
            b"just text",
            b"<a><b></a>",
            b"<a>",
            b"<a/><b/>",
            b"</a>",
        ] {
            assert!(
                matches!(parse(input), Err(Error::MalformedInput(_))),
                "{:?} should be malformed",
                String::from_utf8_lossy(input)
            );
        }
    }

    #[test]
    fn test_self_closing_root() {
        let root = parse(b"<XMLBIBLE biblename=\"Test\"/>").unwrap();
        assert_eq!(root.attr("biblename"), Some("Test"));
        assert!(root.children.is_empty());
    }
}
