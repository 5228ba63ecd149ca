//! Markup loader: turns well-formed deck markup into a [`Document`].

use std::borrow::Cow;

use quick_xml::Reader;
use quick_xml::escape::unescape_with;
use quick_xml::events::{BytesStart, Event};

use super::{Attribute, Document, NodeId};
use crate::diagnostics::{Diagnostic, DiagnosticLog};
use crate::error::{Error, Result};

/// Parse deck markup into a document arena.
///
/// Tag names are lowercased, entity and character references are resolved,
/// comments are kept and CDATA sections become text. Whitespace is preserved
/// exactly as written so that export can reproduce it. Processing
/// instructions, declarations and doctypes are dropped.
///
/// ```
/// use slidedeck::dom::parse_document;
///
/// let doc = parse_document("<body><page key='intro'>Hi &amp; bye</page></body>").unwrap();
/// let page = doc.find_by_tag("page").unwrap();
/// assert_eq!(doc.attr(page, "key"), Some("intro"));
/// assert_eq!(doc.text_content(page), "Hi & bye");
/// ```
pub fn parse_document(content: &str) -> Result<Document> {
    parse_document_logged(content, &mut DiagnosticLog::new())
}

/// Like [`parse_document`], recording recoverable problems in `diagnostics`.
///
/// A malformed attribute is skipped with a structural warning; the rest of
/// its element is kept.
pub fn parse_document_logged(content: &str, diagnostics: &mut DiagnosticLog) -> Result<Document> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut reader = Reader::from_str(content);
    reader.config_mut().check_end_names = true;

    let mut doc = Document::new();
    let mut stack: Vec<NodeId> = vec![doc.root()];

    loop {
        let parent = stack.last().copied().unwrap_or(doc.root());
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let element = open_element(&mut doc, &e, diagnostics);
                doc.append(parent, element);
                stack.push(element);
            }
            Ok(Event::Empty(e)) => {
                let element = open_element(&mut doc, &e, diagnostics);
                doc.append(parent, element);
            }
            Ok(Event::End(_)) => {
                if stack.len() > 1 {
                    stack.pop();
                }
            }
            Ok(Event::Text(e)) => {
                let raw = String::from_utf8_lossy(e.as_ref());
                doc.append_text(parent, &raw);
            }
            Ok(Event::CData(e)) => {
                let raw = String::from_utf8_lossy(&e);
                doc.append_text(parent, &raw);
            }
            Ok(Event::GeneralRef(e)) => {
                let entity = String::from_utf8_lossy(e.as_ref());
                match resolve_entity(&entity) {
                    Some(resolved) => doc.append_text(parent, &resolved),
                    None => doc.append_text(parent, &format!("&{entity};")),
                }
            }
            Ok(Event::Comment(e)) => {
                let raw = String::from_utf8_lossy(e.as_ref()).into_owned();
                let comment = doc.create_comment(raw);
                doc.append(parent, comment);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Xml(e)),
            _ => {}
        }
    }

    if stack.len() > 1 {
        let open = stack
            .last()
            .and_then(|&id| doc.tag(id))
            .unwrap_or_default()
            .to_string();
        return Err(Error::InvalidDeck(format!("unclosed element <{open}>")));
    }

    Ok(doc)
}

fn open_element(doc: &mut Document, e: &BytesStart<'_>, diagnostics: &mut DiagnosticLog) -> NodeId {
    let name = String::from_utf8_lossy(e.name().as_ref()).to_ascii_lowercase();
    let mut attrs = Vec::new();
    for attr in e.attributes() {
        let attr = match attr {
            Ok(attr) => attr,
            Err(err) => {
                diagnostics.push(Diagnostic::StructuralWarning(format!(
                    "dropping malformed attribute on <{name}>: {err}"
                )));
                continue;
            }
        };
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_ascii_lowercase();
        let raw = String::from_utf8_lossy(&attr.value);
        let value = unescape_with(&raw, named_entity)
            .map(Cow::into_owned)
            .unwrap_or_else(|_| raw.to_string());
        attrs.push(Attribute::new(key, value));
    }
    doc.create_element(&name, attrs)
}

fn named_entity(entity: &str) -> Option<&'static str> {
    match entity {
        "apos" => Some("'"),
        "quot" => Some("\""),
        "lt" => Some("<"),
        "gt" => Some(">"),
        "amp" => Some("&"),
        "nbsp" => Some("\u{a0}"),
        _ => None,
    }
}

fn resolve_entity(entity: &str) -> Option<String> {
    if let Some(named) = named_entity(entity) {
        return Some(named.to_string());
    }

    let code = if let Some(hex) = entity.strip_prefix("#x").or(entity.strip_prefix("#X")) {
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
    use crate::dom::NodeData;

    #[test]
    fn test_parse_preserves_whitespace_and_comments() {
        let doc = parse_document("<body>\n  <!-- note --><p>a  b</p>\n</body>").unwrap();
        let body = doc.body();
        let kinds: Vec<_> = doc
            .children(body)
            .map(|id| match &doc.get(id).unwrap().data {
                NodeData::Text(_) => "text",
                NodeData::Comment(_) => "comment",
                NodeData::Element { .. } => "element",
                NodeData::Document => "document",
            })
            .collect();
        assert_eq!(kinds, vec!["text", "comment", "element", "text"]);
        let p = doc.find_by_tag("p").unwrap();
        assert_eq!(doc.text_content(p), "a  b");
    }

    #[test]
    fn test_entities_merge_into_one_text_run() {
        let doc = parse_document("<p>x &lt; y&#x21;&nbsp;z</p>").unwrap();
        let p = doc.find_by_tag("p").unwrap();
        assert_eq!(doc.children(p).count(), 1);
        assert_eq!(doc.text_content(p), "x < y!\u{a0}z");
    }

    #[test]
    fn test_attribute_values_unescaped() {
        let doc = parse_document(r#"<A HREF="a?b=1&amp;c=2" title='say "hi"'/>"#).unwrap();
        let a = doc.find_by_tag("a").unwrap();
        assert_eq!(doc.attr(a, "href"), Some("a?b=1&c=2"));
        assert_eq!(doc.attr(a, "title"), Some("say \"hi\""));
    }

    #[test]
    fn test_malformed_attribute_is_reported() {
        let mut log = DiagnosticLog::new();
        let doc = parse_document_logged("<body><page a='1' a='2' key='k'>x</page></body>", &mut log)
            .unwrap();
        let page = doc.find_by_tag("page").unwrap();
        assert_eq!(doc.attr(page, "a"), Some("1"));
        assert_eq!(doc.text_content(page), "x");
        assert_eq!(log.warnings().count(), 1);
    }

    #[test]
    fn test_cdata_becomes_text() {
        let doc = parse_document("<script><![CDATA[if (a < b) {}]]></script>").unwrap();
        let script = doc.find_by_tag("script").unwrap();
        assert_eq!(doc.text_content(script), "if (a < b) {}");
    }

    #[test]
    fn test_mismatched_end_tag_is_error() {
        assert!(matches!(
            parse_document("<body><p></div></body>"),
            Err(Error::Xml(_))
        ));
    }

    #[test]
    fn test_unclosed_element_is_rejected() {
        assert!(parse_document("<body><p>").is_err());
    }
}
