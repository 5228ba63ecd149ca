//! Out-of-band record of what the deck synthesized.
//!
//! The deck grafts ids, state flags, wrapper containers and whole system
//! nodes onto the author's tree. Every such addition is recorded here, keyed
//! by node identity, so exporters can reconstruct the tree as it was written.
//! Marks never live in the tree itself and, while a node lives, they only
//! ever accumulate. Nodes that left the tree for good are forgotten.

use std::collections::HashMap;

use crate::dom::{Document, NodeId};

/// Structural provenance marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sentinel {
    /// The node, its attributes and all of its children are synthetic.
    Outer,
    /// The node's tag is authored but every child is synthetic.
    Inner,
    /// The node's tag and attributes are synthetic, its children are authored.
    Wrapper,
}

/// Marks recorded for one node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Marks {
    /// Synthesized attribute names, in first-marked order.
    pub attributes: Vec<String>,
    pub outer: bool,
    pub inner: bool,
    pub wrapper: bool,
}

impl Marks {
    fn has_attr(&self, name: &str) -> bool {
        self.attributes.iter().any(|a| a == name)
    }
}

/// What an author view must leave out for a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Elision {
    /// Drop the node's own start/end markup and attributes.
    pub skip_tag: bool,
    /// Drop every child.
    pub skip_children: bool,
}

impl Elision {
    /// Whether nothing at all of the node reaches the output.
    pub fn is_total(&self) -> bool {
        self.skip_tag && self.skip_children
    }
}

/// Side table from node identity to provenance marks.
#[derive(Debug, Clone, Default)]
pub struct ProvenanceMap {
    marks: HashMap<NodeId, Marks>,
}

impl ProvenanceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `attr` on `node` was synthesized. Idempotent.
    pub fn mark_attr(&mut self, node: NodeId, attr: &str) {
        let marks = self.marks.entry(node).or_default();
        if !marks.has_attr(attr) {
            marks.attributes.push(attr.to_string());
        }
    }

    /// Record a structural mark. Idempotent.
    pub fn mark(&mut self, node: NodeId, sentinel: Sentinel) {
        let marks = self.marks.entry(node).or_default();
        match sentinel {
            Sentinel::Outer => marks.outer = true,
            Sentinel::Inner => marks.inner = true,
            Sentinel::Wrapper => marks.wrapper = true,
        }
    }

    /// Drop every mark of a destroyed node.
    pub fn forget(&mut self, node: NodeId) {
        self.marks.remove(&node);
    }

    pub fn marks(&self, node: NodeId) -> Option<&Marks> {
        self.marks.get(&node)
    }

    pub fn has(&self, node: NodeId, sentinel: Sentinel) -> bool {
        self.marks.get(&node).is_some_and(|m| match sentinel {
            Sentinel::Outer => m.outer,
            Sentinel::Inner => m.inner,
            Sentinel::Wrapper => m.wrapper,
        })
    }

    /// Whether `attr` must be left out of any author view of `node`.
    ///
    /// True for individually marked attributes and for every attribute of a
    /// node whose own markup is synthetic (`Outer` or `Wrapper`).
    pub fn is_synthesized(&self, node: NodeId, attr: &str) -> bool {
        self.marks
            .get(&node)
            .is_some_and(|m| m.outer || m.wrapper || m.has_attr(attr))
    }

    /// Structural elision for `node`. `Outer` implies `Inner`.
    pub fn elision(&self, node: NodeId) -> Elision {
        match self.marks.get(&node) {
            Some(m) => Elision {
                skip_tag: m.outer || m.wrapper,
                skip_children: m.outer || m.inner,
            },
            None => Elision::default(),
        }
    }

    /// Copy the marks of `from` onto `to`, leaving out the attributes in `except`.
    pub fn copy_marks(&mut self, from: NodeId, to: NodeId, except: &[&str]) {
        let Some(source) = self.marks.get(&from).cloned() else {
            return;
        };
        let target = self.marks.entry(to).or_default();
        target.outer |= source.outer;
        target.inner |= source.inner;
        target.wrapper |= source.wrapper;
        for attr in source.attributes {
            if !except.contains(&attr.as_str()) && !target.has_attr(&attr) {
                target.attributes.push(attr);
            }
        }
    }

    /// Number of nodes carrying any mark.
    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }
}

/// Add a bookkeeping attribute unless the author already supplied one.
///
/// Returns `true` if the attribute was grafted (and marked).
pub fn graft_attr(
    doc: &mut Document,
    prov: &mut ProvenanceMap,
    node: NodeId,
    name: &str,
    value: &str,
) -> bool {
    match doc.attr(node, name) {
        Some(_) if !prov.is_synthesized(node, name) => false,
        _ => {
            doc.set_attr(node, name, value);
            prov.mark_attr(node, name);
            true
        }
    }
}

/// Write a state attribute, marking it only if the author never set it.
pub fn set_state_attr(
    doc: &mut Document,
    prov: &mut ProvenanceMap,
    node: NodeId,
    name: &str,
    value: &str,
) {
    if !doc.set_attr(node, name, value) {
        prov.mark_attr(node, name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Attribute;

    fn element(doc: &mut Document, attrs: Vec<Attribute>) -> NodeId {
        let id = doc.create_element("page", attrs);
        doc.append(doc.root(), id);
        id
    }

    #[test]
    fn test_marks_accumulate() {
        let mut prov = ProvenanceMap::new();
        let node = NodeId(1);
        prov.mark_attr(node, "id");
        prov.mark_attr(node, "active");
        prov.mark_attr(node, "id");
        prov.mark(node, Sentinel::Inner);
        prov.mark(node, Sentinel::Inner);

        let marks = prov.marks(node).unwrap();
        assert_eq!(marks.attributes, vec!["id", "active"]);
        assert!(marks.inner);
        assert!(!marks.outer);
    }

    #[test]
    fn test_elision_by_sentinel() {
        let mut prov = ProvenanceMap::new();
        prov.mark(NodeId(1), Sentinel::Outer);
        prov.mark(NodeId(2), Sentinel::Inner);
        prov.mark(NodeId(3), Sentinel::Wrapper);

        assert!(prov.elision(NodeId(1)).is_total());
        assert_eq!(
            prov.elision(NodeId(2)),
            Elision { skip_tag: false, skip_children: true }
        );
        assert_eq!(
            prov.elision(NodeId(3)),
            Elision { skip_tag: true, skip_children: false }
        );
        assert_eq!(prov.elision(NodeId(4)), Elision::default());
        assert!(prov.is_synthesized(NodeId(3), "class"));
        assert!(!prov.is_synthesized(NodeId(2), "class"));
    }

    #[test]
    fn test_graft_never_overwrites_authored() {
        let mut doc = Document::new();
        let mut prov = ProvenanceMap::new();
        let page = element(&mut doc, vec![Attribute::new("id", "intro")]);

        assert!(!graft_attr(&mut doc, &mut prov, page, "id", "0"));
        assert_eq!(doc.attr(page, "id"), Some("intro"));
        assert!(!prov.is_synthesized(page, "id"));

        assert!(graft_attr(&mut doc, &mut prov, page, "onmouseover", "track"));
        assert!(graft_attr(&mut doc, &mut prov, page, "onmouseover", "track 2"));
        assert_eq!(doc.attr(page, "onmouseover"), Some("track 2"));
        assert!(prov.is_synthesized(page, "onmouseover"));
    }

    #[test]
    fn test_state_attr_marks_only_when_absent() {
        let mut doc = Document::new();
        let mut prov = ProvenanceMap::new();
        let authored = element(&mut doc, vec![Attribute::new("active", "yes")]);
        let bare = element(&mut doc, vec![]);

        set_state_attr(&mut doc, &mut prov, authored, "active", "");
        set_state_attr(&mut doc, &mut prov, bare, "active", "yes");

        assert_eq!(doc.attr(authored, "active"), Some(""));
        assert!(!prov.is_synthesized(authored, "active"));
        assert!(prov.is_synthesized(bare, "active"));
    }

    #[test]
    fn test_copy_marks_with_exceptions() {
        let mut prov = ProvenanceMap::new();
        prov.mark_attr(NodeId(1), "id");
        prov.mark_attr(NodeId(1), "active");
        prov.mark(NodeId(1), Sentinel::Outer);
        prov.copy_marks(NodeId(1), NodeId(2), &["id"]);

        let marks = prov.marks(NodeId(2)).unwrap();
        assert_eq!(marks.attributes, vec!["active"]);
        assert!(marks.outer);
    }
}
