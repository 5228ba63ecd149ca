//! Tree serializer.
//!
//! Re-renders any subtree of the live document as canonical markup,
//! syntax-highlighted markup or a LaTeX approximation. All three share one
//! traversal and one elision policy: [`classify`] decides from the
//! provenance marks whether a node is kept, and each rendering only decides
//! how a kept node looks.
//!
//! # Example
//!
//! ```
//! use slidedeck::Deck;
//! use slidedeck::export::{Target, serialize};
//!
//! let deck = Deck::open_str("<body><page key='intro'><b>Hi</b></page></body>").unwrap();
//! let page = deck.registry.page(0).unwrap();
//!
//! // The bookkeeping id and the wrapper container are not part of the output.
//! let markup = serialize(&deck.doc, &deck.provenance, page, Target::Markup);
//! assert_eq!(markup, "<page key=\"intro\"><b>Hi</b></page>");
//!
//! let latex = serialize(&deck.doc, &deck.provenance, page, Target::Typeset);
//! assert_eq!(latex, "\\begin{slide}\\label{sl:intro}\n\\textbf{Hi}\\end{slide}\n");
//! ```

mod escape;
mod highlight;
mod markup;
mod typeset;

use std::fmt;

#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

use crate::dom::{Attribute, Document, NodeData, NodeId};
use crate::math::{self, FormulaKind};
use crate::provenance::ProvenanceMap;

pub use escape::{escape_text, preserve_spaces, quote_attr};

/// Output rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "cli", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "cli", serde(rename_all = "lowercase"))]
pub enum Target {
    /// Markup as the author wrote it.
    #[default]
    Markup,
    /// Markup source wrapped in presentational spans, for display.
    Highlighted,
    /// LaTeX approximation.
    Typeset,
}

impl Target {
    pub fn as_str(self) -> &'static str {
        match self {
            Target::Markup => "markup",
            Target::Highlighted => "highlight",
            Target::Typeset => "latex",
        }
    }

    pub fn parse(s: &str) -> Option<Target> {
        match s.to_ascii_lowercase().as_str() {
            "markup" | "html" => Some(Target::Markup),
            "highlight" | "highlighted" => Some(Target::Highlighted),
            "latex" | "typeset" | "tex" => Some(Target::Typeset),
            _ => None,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Render the subtree at `node`.
///
/// Pure function of the subtree, its provenance marks and the target.
pub fn serialize(doc: &Document, prov: &ProvenanceMap, node: NodeId, target: Target) -> String {
    let mut out = String::new();
    match target {
        Target::Markup => walk(&mut markup::Markup, doc, prov, node, Flow::default(), &mut out),
        Target::Highlighted => walk(
            &mut highlight::Highlight,
            doc,
            prov,
            node,
            Flow::default(),
            &mut out,
        ),
        Target::Typeset => walk(&mut typeset::Typeset, doc, prov, node, Flow::default(), &mut out),
    }
    out
}

/// Convenience wrapper for the whole document.
pub fn serialize_document(doc: &Document, prov: &ProvenanceMap, target: Target) -> String {
    serialize(doc, prov, doc.root(), target)
}

/// A kept element as exporters see it.
#[derive(Debug, Clone)]
pub(crate) struct ElementView<'a> {
    pub node: NodeId,
    pub tag: &'a str,
    /// Authored attributes, in order.
    pub attrs: Vec<&'a Attribute>,
    /// Whether the element's own start/end markup is emitted.
    pub emit_tag: bool,
    /// Whether children are visited.
    pub expand: bool,
}

impl ElementView<'_> {
    /// Authored attribute value.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }
}

/// Outcome of the shared elision policy for one node.
#[derive(Debug, Clone)]
pub(crate) enum Visit<'a> {
    Text(&'a str),
    Comment(&'a str),
    /// Math placeholder, rewritten to author notation.
    Formula { kind: FormulaKind, source: String },
    /// Omitted entirely.
    Skip,
    Element(ElementView<'a>),
}

/// Decide whether and how `node` appears in an author view.
pub(crate) fn classify<'a>(doc: &'a Document, prov: &ProvenanceMap, node: NodeId) -> Visit<'a> {
    let Some(data) = doc.get(node).map(|n| &n.data) else {
        return Visit::Skip;
    };
    let elision = prov.elision(node);
    if elision.is_total() {
        return Visit::Skip;
    }

    match data {
        NodeData::Text(text) => Visit::Text(text),
        NodeData::Comment(text) => Visit::Comment(text),
        NodeData::Document => Visit::Element(ElementView {
            node,
            tag: "",
            attrs: Vec::new(),
            emit_tag: false,
            expand: true,
        }),
        NodeData::Element { tag, attrs } => {
            let attrs: Vec<&Attribute> = attrs
                .iter()
                .filter(|a| !prov.is_synthesized(node, &a.name))
                .collect();
            let view = ElementView {
                node,
                tag,
                attrs,
                emit_tag: !elision.skip_tag,
                expand: !elision.skip_children,
            };

            if let Some(class) = view.attr("class")
                && math::is_renderer_class(tag, class)
            {
                return Visit::Skip;
            }
            if tag == "script" {
                let kind = match view.attr("type") {
                    Some(math::DISPLAY_TYPE) => Some(FormulaKind::Display),
                    Some(math::INLINE_TYPE) => Some(FormulaKind::Inline),
                    _ => None,
                };
                if let Some(kind) = kind {
                    return Visit::Formula {
                        kind,
                        source: math::formula_source(doc, node),
                    };
                }
            }
            Visit::Element(view)
        }
    }
}

/// Text handling in effect for a subtree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Flow {
    /// Text is emitted without markup escaping (style/script content).
    pub raw: bool,
    /// Runs of spaces are kept visible.
    pub preserve: bool,
    /// A leading newline of a text run is dropped.
    pub suppress_newline: bool,
}

/// How an element's children are emitted.
#[derive(Debug, Clone, Default)]
pub(crate) struct Frame {
    pub flow: Flow,
    /// Children are visited.
    pub expand: bool,
    /// Drop a first child that is a whitespace-only text run.
    pub skip_blank_first: bool,
    /// Closing text emitted after the children.
    pub suffix: String,
}

/// Per-target rendering rules.
pub(crate) trait Rules {
    fn text(&mut self, out: &mut String, text: &str, flow: Flow);
    fn comment(&mut self, out: &mut String, text: &str);
    fn formula(&mut self, out: &mut String, kind: FormulaKind, source: &str, flow: Flow);
    /// Emit the opening of a kept element and describe its children.
    fn open(&mut self, out: &mut String, doc: &Document, el: &ElementView<'_>, flow: Flow) -> Frame;
}

fn walk<R: Rules>(
    rules: &mut R,
    doc: &Document,
    prov: &ProvenanceMap,
    node: NodeId,
    flow: Flow,
    out: &mut String,
) {
    match classify(doc, prov, node) {
        Visit::Text(text) => rules.text(out, text, flow),
        Visit::Comment(text) => rules.comment(out, text),
        Visit::Formula { kind, source } => rules.formula(out, kind, &source, flow),
        Visit::Skip => {}
        Visit::Element(el) => {
            let frame = rules.open(out, doc, &el, flow);
            if frame.expand {
                let mut children = doc.children(node).peekable();
                if frame.skip_blank_first
                    && let Some(&first) = children.peek()
                    && doc.text(first).is_some_and(|t| t.trim().is_empty())
                {
                    children.next();
                }
                for child in children {
                    walk(rules, doc, prov, child, frame.flow, out);
                }
            }
            out.push_str(&frame.suffix);
        }
    }
}

/// Elements that never take a closing tag.
pub(crate) fn is_void(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "source"
            | "track"
            | "wbr"
    )
}

/// Elements whose text content is not markup-escaped.
pub(crate) fn is_raw_text(tag: &str) -> bool {
    matches!(tag, "style" | "script")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_document;
    use crate::provenance::Sentinel;

    #[test]
    fn test_classify_follows_marks() {
        let doc = parse_document("<body><p id='a' class='x'>t</p><div>d</div></body>").unwrap();
        let p = doc.find_by_tag("p").unwrap();
        let div = doc.find_by_tag("div").unwrap();
        let mut prov = ProvenanceMap::new();
        prov.mark_attr(p, "id");
        prov.mark(div, Sentinel::Outer);

        match classify(&doc, &prov, p) {
            Visit::Element(el) => {
                assert_eq!(el.attrs.len(), 1);
                assert_eq!(el.attr("class"), Some("x"));
                assert!(el.emit_tag && el.expand);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(classify(&doc, &prov, div), Visit::Skip));
    }

    #[test]
    fn test_classify_formula_and_renderer_output() {
        let doc = parse_document(
            "<p><span class='MathJax'>r</span><script type='math/tex'>a+b</script></p>",
        )
        .unwrap();
        let prov = ProvenanceMap::new();
        let span = doc.find_by_tag("span").unwrap();
        let script = doc.find_by_tag("script").unwrap();
        assert!(matches!(classify(&doc, &prov, span), Visit::Skip));
        match classify(&doc, &prov, script) {
            Visit::Formula { kind, source } => {
                assert_eq!(kind, FormulaKind::Inline);
                assert_eq!(source, "a+b");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_target_names() {
        for target in [Target::Markup, Target::Highlighted, Target::Typeset] {
            assert_eq!(Target::parse(target.as_str()), Some(target));
        }
        assert_eq!(Target::parse("HTML"), Some(Target::Markup));
        assert_eq!(Target::parse("pdf"), None);
    }
}
