//! Math placeholders and renderer output.
//!
//! Authors write formulas as `\(..\)` / `\[..\]`; a math renderer turns them
//! into `script` placeholders (`type="math/tex"`, optionally with
//! `; mode=display`) followed by generated markup carrying one of a small
//! set of renderer classes. Exporters recognize both without asking the
//! renderer, and [`revert`] undoes the rendering in place.

use crate::dom::{Document, NodeData, NodeId};

/// Placeholder `type` for inline formulas.
pub const INLINE_TYPE: &str = "math/tex";
/// Placeholder `type` for display formulas.
pub const DISPLAY_TYPE: &str = "math/tex; mode=display";

/// Classes on renderer-generated `span` (and other) elements.
pub const RENDERER_CLASSES: &[&str] = &[
    "MathJax",
    "MathJax_Preview",
    "MathJax_Display",
    "MathJax_Error",
    "MathJax_SVG",
    "MathJax_MathML",
];

/// Classes on renderer-generated display `div` elements.
pub const DISPLAY_BLOCK_CLASSES: &[&str] =
    &["MathJax_Display", "MathJax_SVG_Display", "MathJax_MathML"];

/// Formula placeholder kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormulaKind {
    Inline,
    Display,
}

impl FormulaKind {
    /// Author delimiters `(open, close)`.
    pub fn delimiters(self) -> (&'static str, &'static str) {
        match self {
            FormulaKind::Inline => ("\\(", "\\)"),
            FormulaKind::Display => ("\\[", "\\]"),
        }
    }
}

/// Kind of formula placeholder `node` is, judged by tag and `type` value.
pub fn formula_kind(doc: &Document, node: NodeId) -> Option<FormulaKind> {
    if !doc.is_element(node, "script") {
        return None;
    }
    match doc.attr(node, "type")? {
        INLINE_TYPE => Some(FormulaKind::Inline),
        DISPLAY_TYPE => Some(FormulaKind::Display),
        _ => None,
    }
}

/// Whether `class` (a full class attribute value) marks renderer output on `tag`.
pub fn is_renderer_class(tag: &str, class: &str) -> bool {
    match tag {
        "div" => DISPLAY_BLOCK_CLASSES.contains(&class),
        "span" => RENDERER_CLASSES.contains(&class),
        _ => false,
    }
}

/// Whether `node` is markup generated by the math renderer.
pub fn is_renderer_output(doc: &Document, node: NodeId) -> bool {
    match (doc.tag(node), doc.attr(node, "class")) {
        (Some(tag), Some(class)) => is_renderer_class(tag, class),
        _ => false,
    }
}

/// Raw source of a placeholder: the concatenated text of its children.
pub fn formula_source(doc: &Document, node: NodeId) -> String {
    doc.children(node)
        .filter_map(|child| match &doc.get(child)?.data {
            NodeData::Text(text) => Some(text.as_str()),
            _ => None,
        })
        .collect()
}

/// Remove renderer output below `root` and turn placeholders back into
/// delimited text. Returns the number of nodes rewritten.
pub fn revert(doc: &mut Document, root: NodeId) -> usize {
    let mut changed = 0;

    let generated: Vec<NodeId> = doc
        .descendants(root)
        .filter(|&n| {
            doc.attr(n, "class").is_some_and(|class| {
                class
                    .split_whitespace()
                    .any(|c| RENDERER_CLASSES.contains(&c) || DISPLAY_BLOCK_CLASSES.contains(&c))
            })
        })
        .collect();
    for node in generated {
        if doc.contains(root, node) && node != root {
            doc.detach(node);
            changed += 1;
        }
    }

    let placeholders: Vec<(NodeId, FormulaKind)> = doc
        .elements_by_tag(root, "script")
        .into_iter()
        .filter_map(|n| formula_kind(doc, n).map(|kind| (n, kind)))
        .collect();
    for (node, kind) in placeholders {
        let (open, close) = kind.delimiters();
        let text = format!("{open}{}{close}", formula_source(doc, node));
        let replacement = doc.create_text(text);
        doc.replace(node, replacement);
        changed += 1;
    }

    changed
}

/// The external math typesetting engine.
pub trait MathRenderer {
    /// Typeset formulas below `node`.
    fn typeset(&mut self, doc: &mut Document, node: NodeId);
    /// Re-render already typeset formulas below `node`.
    fn reprocess(&mut self, doc: &mut Document, node: NodeId);
}

/// Renderer that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMath;

impl MathRenderer for NoMath {
    fn typeset(&mut self, _doc: &mut Document, _node: NodeId) {}
    fn reprocess(&mut self, _doc: &mut Document, _node: NodeId) {}
}
