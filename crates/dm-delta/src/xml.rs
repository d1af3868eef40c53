//! Minimal element tree built from quick-xml events.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// One XML element with its attributes, child elements and text content
#[derive(Debug, Default)]
pub(crate) struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Element>,
    /// Concatenated text and CDATA directly inside this element
    pub text: String,
}

impl Element {
    fn open(start: &BytesStart<'_>) -> Result<Self, String> {
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| e.to_string())?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value().map_err(|e| e.to_string())?.into_owned();
            attributes.push((key, value));
        }
        Ok(Self {
            name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
            attributes,
            ..Self::default()
        })
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// The single child with the given name; an error when it repeats
    pub fn unique_child(&self, name: &str) -> Result<Option<&Element>, String> {
        let mut found = self.children.iter().filter(|c| c.name == name);
        let first = found.next();
        if found.next().is_some() {
            return Err(format!("<{}> appears more than once in <{}>", name, self.name));
        }
        Ok(first)
    }

    /// Trimmed text, `None` when blank
    pub fn trimmed_text(&self) -> Option<&str> {
        let text = self.text.trim();
        (!text.is_empty()).then_some(text)
    }
}

/// Parse a complete document into its root element
pub(crate) fn parse_document(source: &str) -> Result<Element, String> {
    // Text events are kept verbatim; callers trim the joined text once
    let mut reader = Reader::from_str(source);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| format!("at byte {}: {}", reader.buffer_position(), e))?;
        match event {
            Event::Start(start) => {
                if root.is_some() {
                    return Err("content after the root element".to_string());
                }
                stack.push(Element::open(&start)?);
            }
            Event::Empty(start) => {
                let element = Element::open(&start)?;
                close(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| "unexpected closing tag".to_string())?;
                close(&mut stack, &mut root, element)?;
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(|e| e.to_string())?;
                append_text(&mut stack, &text)?;
            }
            Event::CData(cdata) => {
                let raw = cdata.into_inner();
                let text = std::str::from_utf8(&raw).map_err(|e| e.to_string())?;
                append_text(&mut stack, text)?;
            }
            Event::Eof => break,
            // declarations, comments, processing instructions
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(format!("<{}> is never closed", open.name));
    }
    root.ok_or_else(|| "document has no root element".to_string())
}

fn close(
    stack: &mut Vec<Element>,
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), String> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err("document has more than one root element".to_string()),
    }
    Ok(())
}

fn append_text(stack: &mut [Element], text: &str) -> Result<(), String> {
    match stack.last_mut() {
        Some(element) => {
            element.text.push_str(text);
            Ok(())
        }
        None if text.trim().is_empty() => Ok(()),
        None => Err("text outside the root element".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tree() {
        let root = parse_document(
            r#"<?xml version="1.0"?>
<delta id="3">
  <!-- comment -->
  <summary>Tom &amp; Jerry</summary>
  <up><![CDATA[SELECT 1 < 2]]></up>
  <down/>
</delta>"#,
        )
        .unwrap();

        assert_eq!(root.name, "delta");
        assert_eq!(root.attribute("id"), Some("3"));
        assert_eq!(root.children.len(), 3);
        assert_eq!(
            root.unique_child("summary").unwrap().unwrap().trimmed_text(),
            Some("Tom & Jerry")
        );
        assert_eq!(
            root.unique_child("up").unwrap().unwrap().trimmed_text(),
            Some("SELECT 1 < 2")
        );
        assert_eq!(root.unique_child("down").unwrap().unwrap().trimmed_text(), None);
    }

    #[test]
    fn test_mixed_content_keeps_inner_whitespace() {
        let root = parse_document(
            "<up>SELECT a <!-- why --> FROM t WHERE x <![CDATA[<]]> 5 AND y &gt; 1 </up>",
        )
        .unwrap();
        assert_eq!(
            root.trimmed_text(),
            Some("SELECT a  FROM t WHERE x < 5 AND y > 1")
        );

        let root = parse_document("<s>SELECT <![CDATA[a<b]]> FROM t</s>").unwrap();
        assert_eq!(root.trimmed_text(), Some("SELECT a<b FROM t"));
    }

    #[test]
    fn test_whitespace_between_children_is_blank() {
        let root = parse_document(
            "<up>\n  <statement> A </statement>\n  <statement>B</statement>\n</up>",
        )
        .unwrap();
        assert_eq!(root.trimmed_text(), None);
        assert_eq!(root.children[0].trimmed_text(), Some("A"));
    }

    #[test]
    fn test_duplicate_child_rejected() {
        let root = parse_document("<delta><up/><up/></delta>").unwrap();
        assert!(root.unique_child("up").is_err());
    }

    #[test]
    fn test_malformed_documents() {
        assert!(parse_document("").is_err());
        assert!(parse_document("<delta><up></delta>").is_err());
        assert!(parse_document("<delta/><delta/>").is_err());
        assert!(parse_document("just text").is_err());
        assert!(parse_document("<delta>").is_err());
    }
}
