//! Arena-based document tree.
//!
//! The deck keeps the author's document in a single arena. Nodes are linked
//! by index (parent, first/last child, prev/next sibling) so the tree can be
//! rewired in place while node identities stay stable. A node detached from
//! its parent is considered destroyed unless it was produced by
//! [`Document::clone_subtree`] and kept by the caller (the clipboard does this).

mod loader;

pub use loader::{parse_document, parse_document_logged};

/// Unique identifier for a node in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Sentinel value for no node.
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// Check if this is a valid node ID.
    pub fn is_some(&self) -> bool {
        self.0 != u32::MAX
    }

    /// Check if this is the sentinel value.
    pub fn is_none(&self) -> bool {
        self.0 == u32::MAX
    }

    fn option(self) -> Option<NodeId> {
        if self.is_some() { Some(self) } else { None }
    }
}

/// Element attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Node payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    /// Document root.
    Document,
    /// Element with a lowercase tag name and ordered attributes.
    Element { tag: String, attrs: Vec<Attribute> },
    /// Text run.
    Text(String),
    /// Comment run.
    Comment(String),
}

/// A node in the arena.
#[derive(Debug, Clone)]
pub struct Node {
    pub data: NodeData,
    pub parent: NodeId,
    pub first_child: NodeId,
    pub last_child: NodeId,
    pub prev_sibling: NodeId,
    pub next_sibling: NodeId,
}

impl Node {
    fn new(data: NodeData) -> Self {
        Self {
            data,
            parent: NodeId::NONE,
            first_child: NodeId::NONE,
            last_child: NodeId::NONE,
            prev_sibling: NodeId::NONE,
            next_sibling: NodeId::NONE,
        }
    }
}

/// The document tree.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a new empty document with a root node.
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            root: NodeId::NONE,
        };
        doc.root = doc.alloc(Node::new(NodeData::Document));
        doc
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Get the document root ID.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Get a node by ID.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        if id.is_none() {
            return None;
        }
        self.nodes.get(id.0 as usize)
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        if id.is_none() {
            return None;
        }
        self.nodes.get_mut(id.0 as usize)
    }

    /// Number of allocated nodes, attached or not.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the document holds nothing but its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Create a detached element. The tag is stored lowercase.
    pub fn create_element(&mut self, tag: &str, attrs: Vec<Attribute>) -> NodeId {
        self.alloc(Node::new(NodeData::Element {
            tag: tag.to_ascii_lowercase(),
            attrs,
        }))
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.alloc(Node::new(NodeData::Text(text.into())))
    }

    /// Create a detached comment node.
    pub fn create_comment(&mut self, text: impl Into<String>) -> NodeId {
        self.alloc(Node::new(NodeData::Comment(text.into())))
    }

    // ------------------------------------------------------------------
    // Structure
    // ------------------------------------------------------------------

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent.option())
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.first_child.option())
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.next_sibling.option())
    }

    /// Iterate over children of a node.
    pub fn children(&self, parent: NodeId) -> ChildrenIter<'_> {
        let first = self
            .get(parent)
            .map(|n| n.first_child)
            .unwrap_or(NodeId::NONE);
        ChildrenIter {
            doc: self,
            current: first,
        }
    }

    /// Iterate over all descendants of `id` in document order (excluding `id`).
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        let mut stack: Vec<NodeId> = self.children(id).collect();
        stack.reverse();
        Descendants { doc: self, stack }
    }

    /// Whether `id` is connected to the document root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        while let Some(node) = self.get(current) {
            if current == self.root {
                return true;
            }
            current = node.parent;
        }
        false
    }

    /// Whether `ancestor` is `id` or one of its ancestors.
    pub fn contains(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = id;
        while current.is_some() {
            if current == ancestor {
                return true;
            }
            current = self.get(current).map(|n| n.parent).unwrap_or(NodeId::NONE);
        }
        false
    }

    /// Unlink a node from its parent and siblings. Its subtree stays intact.
    pub fn detach(&mut self, id: NodeId) {
        let Some(node) = self.get(id) else {
            return;
        };
        let (parent, prev, next) = (node.parent, node.prev_sibling, node.next_sibling);

        if let Some(p) = self.get_mut(prev) {
            p.next_sibling = next;
        } else if let Some(par) = self.get_mut(parent) {
            par.first_child = next;
        }

        if let Some(n) = self.get_mut(next) {
            n.prev_sibling = prev;
        } else if let Some(par) = self.get_mut(parent) {
            par.last_child = prev;
        }

        if let Some(node) = self.get_mut(id) {
            node.parent = NodeId::NONE;
            node.prev_sibling = NodeId::NONE;
            node.next_sibling = NodeId::NONE;
        }
    }

    /// Append a child to a parent node, detaching it from any previous parent.
    ///
    /// Does nothing if `child` is `parent` or one of its ancestors.
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        if self.get(parent).is_none() || self.get(child).is_none() || self.contains(child, parent) {
            return;
        }
        self.detach(child);

        let last_child = self
            .get(parent)
            .map(|n| n.last_child)
            .unwrap_or(NodeId::NONE);

        if let Some(child_node) = self.get_mut(child) {
            child_node.parent = parent;
            child_node.prev_sibling = last_child;
        }

        if let Some(last_node) = self.get_mut(last_child) {
            last_node.next_sibling = child;
        }

        if let Some(parent_node) = self.get_mut(parent) {
            if parent_node.first_child.is_none() {
                parent_node.first_child = child;
            }
            parent_node.last_child = child;
        }
    }

    /// Insert `new_node` immediately before `sibling`.
    ///
    /// Does nothing if `new_node` is `sibling` or one of its ancestors.
    pub fn insert_before(&mut self, sibling: NodeId, new_node: NodeId) {
        let Some(parent) = self.parent(sibling) else {
            return;
        };
        if self.contains(new_node, sibling) {
            return;
        }
        self.detach(new_node);
        let prev = self
            .get(sibling)
            .map(|n| n.prev_sibling)
            .unwrap_or(NodeId::NONE);

        if let Some(new) = self.get_mut(new_node) {
            new.parent = parent;
            new.prev_sibling = prev;
            new.next_sibling = sibling;
        }

        if let Some(sib) = self.get_mut(sibling) {
            sib.prev_sibling = new_node;
        }

        if let Some(p) = self.get_mut(prev) {
            p.next_sibling = new_node;
        } else if let Some(par) = self.get_mut(parent) {
            par.first_child = new_node;
        }
    }

    /// Insert `new_node` immediately after `sibling`.
    pub fn insert_after(&mut self, sibling: NodeId, new_node: NodeId) {
        let Some(parent) = self.parent(sibling) else {
            return;
        };
        match self.next_sibling(sibling) {
            Some(next) => self.insert_before(next, new_node),
            None => self.append(parent, new_node),
        }
    }

    /// Put `new_node` where `old` is and detach `old`.
    pub fn replace(&mut self, old: NodeId, new_node: NodeId) {
        if self.parent(old).is_none() {
            return;
        }
        self.insert_before(old, new_node);
        self.detach(old);
    }

    /// Detach every child of `id`.
    pub fn clear_children(&mut self, id: NodeId) {
        while let Some(child) = self.first_child(id) {
            self.detach(child);
        }
    }

    /// Deep-copy the subtree rooted at `id` into a detached subtree.
    ///
    /// Returns the new root and every `(original, copy)` pair so side tables
    /// keyed by node identity can follow the copy.
    pub fn clone_subtree(&mut self, id: NodeId) -> Option<(NodeId, Vec<(NodeId, NodeId)>)> {
        let data = self.get(id)?.data.clone();
        let copy = self.alloc(Node::new(data));
        let mut pairs = vec![(id, copy)];
        let children: Vec<NodeId> = self.children(id).collect();
        for child in children {
            if let Some((child_copy, child_pairs)) = self.clone_subtree(child) {
                self.append(copy, child_copy);
                pairs.extend(child_pairs);
            }
        }
        Some((copy, pairs))
    }

    // ------------------------------------------------------------------
    // Content
    // ------------------------------------------------------------------

    /// Element tag name (lowercase).
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(|n| match &n.data {
            NodeData::Element { tag, .. } => Some(tag.as_str()),
            _ => None,
        })
    }

    /// Whether `id` is an element with the given tag (case-insensitive).
    pub fn is_element(&self, id: NodeId, tag: &str) -> bool {
        self.tag(id).is_some_and(|t| t.eq_ignore_ascii_case(tag))
    }

    /// Text of a text node.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(|n| match &n.data {
            NodeData::Text(text) => Some(text.as_str()),
            _ => None,
        })
    }

    /// Concatenated text of all descendant text runs.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let Some(text) = self.text(id) {
            out.push_str(text);
        }
        for desc in self.descendants(id) {
            if let Some(text) = self.text(desc) {
                out.push_str(text);
            }
        }
        out
    }

    /// All attributes of an element (empty for other nodes).
    pub fn attrs(&self, id: NodeId) -> &[Attribute] {
        match self.get(id).map(|n| &n.data) {
            Some(NodeData::Element { attrs, .. }) => attrs,
            _ => &[],
        }
    }

    /// Get an attribute value.
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attrs(id)
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.attr(id, name).is_some()
    }

    /// Set an attribute, keeping its position if it already exists.
    ///
    /// Returns `true` if the attribute existed before.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: impl Into<String>) -> bool {
        let Some(Node {
            data: NodeData::Element { attrs, .. },
            ..
        }) = self.get_mut(id)
        else {
            return false;
        };
        let value = value.into();
        if let Some(existing) = attrs.iter_mut().find(|a| a.name == name) {
            existing.value = value;
            true
        } else {
            attrs.push(Attribute::new(name, value));
            false
        }
    }

    /// Remove an attribute, returning its old value.
    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> Option<String> {
        let Some(Node {
            data: NodeData::Element { attrs, .. },
            ..
        }) = self.get_mut(id)
        else {
            return None;
        };
        let pos = attrs.iter().position(|a| a.name == name)?;
        Some(attrs.remove(pos).value)
    }

    /// Whitespace-separated classes of an element.
    pub fn classes(&self, id: NodeId) -> Vec<&str> {
        self.attr(id, "class")
            .map(|c| c.split_whitespace().collect())
            .unwrap_or_default()
    }

    /// Append text to the last child if it is a text run, or add a new run.
    pub fn append_text(&mut self, parent: NodeId, text: &str) {
        let last_child = self
            .get(parent)
            .map(|n| n.last_child)
            .unwrap_or(NodeId::NONE);

        if let Some(Node {
            data: NodeData::Text(existing),
            ..
        }) = self.get_mut(last_child)
        {
            existing.push_str(text);
            return;
        }

        let text_node = self.create_text(text);
        self.append(parent, text_node);
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Descendant elements of `root` with the given tag, in document order.
    pub fn elements_by_tag(&self, root: NodeId, tag: &str) -> Vec<NodeId> {
        self.descendants(root)
            .filter(|&id| self.is_element(id, tag))
            .collect()
    }

    /// First descendant element of the whole document with the given tag.
    pub fn find_by_tag(&self, tag: &str) -> Option<NodeId> {
        self.descendants(self.root).find(|&id| self.is_element(id, tag))
    }

    /// First attached element whose `id` attribute equals `value`.
    pub fn element_by_id(&self, value: &str) -> Option<NodeId> {
        self.descendants(self.root)
            .find(|&id| self.attr(id, "id") == Some(value))
    }

    /// The `body` element, falling back to the document root.
    pub fn body(&self) -> NodeId {
        self.find_by_tag("body").unwrap_or(self.root)
    }
}

/// Iterator over children of a node.
pub struct ChildrenIter<'a> {
    doc: &'a Document,
    current: NodeId,
}

impl Iterator for ChildrenIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current.is_none() {
            return None;
        }
        let id = self.current;
        self.current = self
            .doc
            .get(id)
            .map(|n| n.next_sibling)
            .unwrap_or(NodeId::NONE);
        Some(id)
    }
}

/// Pre-order iterator over descendants.
pub struct Descendants<'a> {
    doc: &'a Document,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;
        // Push children in reverse order so they're visited left-to-right
        let mut children: Vec<NodeId> = self.doc.children(current).collect();
        children.reverse();
        self.stack.extend(children);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Document, NodeId, NodeId, NodeId) {
        let mut doc = Document::new();
        let body = doc.create_element("BODY", vec![]);
        let a = doc.create_element("p", vec![Attribute::new("class", "x y")]);
        let b = doc.create_element("p", vec![]);
        doc.append(doc.root(), body);
        doc.append(body, a);
        doc.append(body, b);
        (doc, body, a, b)
    }

    #[test]
    fn test_tags_are_lowercased() {
        let (doc, body, _, _) = sample();
        assert_eq!(doc.tag(body), Some("body"));
        assert!(doc.is_element(body, "BODY"));
        assert_eq!(doc.body(), body);
    }

    #[test]
    fn test_ancestor_cannot_move_below_itself() {
        let (mut doc, body, a, b) = sample();
        doc.append(a, body);
        doc.insert_before(a, body);
        doc.append(a, a);
        assert_eq!(doc.parent(body), Some(doc.root()));
        assert_eq!(doc.children(body).collect::<Vec<_>>(), vec![a, b]);
        assert_eq!(doc.first_child(a), None);
    }

    #[test]
    fn test_insert_and_detach() {
        let (mut doc, body, a, b) = sample();
        let c = doc.create_element("hr", vec![]);
        doc.insert_after(a, c);
        assert_eq!(doc.children(body).collect::<Vec<_>>(), vec![a, c, b]);

        doc.detach(a);
        assert_eq!(doc.children(body).collect::<Vec<_>>(), vec![c, b]);
        assert!(!doc.is_attached(a));
        assert!(doc.is_attached(c));

        doc.insert_before(c, a);
        assert_eq!(doc.children(body).collect::<Vec<_>>(), vec![a, c, b]);

        doc.detach(b);
        assert_eq!(doc.children(body).collect::<Vec<_>>(), vec![a, c]);
        assert_eq!(doc.get(body).unwrap().last_child, c);
    }

    #[test]
    fn test_replace_keeps_position() {
        let (mut doc, body, a, b) = sample();
        let c = doc.create_element("div", vec![]);
        doc.replace(a, c);
        assert_eq!(doc.children(body).collect::<Vec<_>>(), vec![c, b]);
        assert!(doc.parent(a).is_none());
    }

    #[test]
    fn test_attributes() {
        let (mut doc, _, a, _) = sample();
        assert_eq!(doc.classes(a), vec!["x", "y"]);
        assert!(!doc.set_attr(a, "id", "1"));
        assert!(doc.set_attr(a, "id", "2"));
        assert_eq!(doc.attr(a, "id"), Some("2"));
        assert_eq!(doc.attrs(a)[0].name, "class");
        assert_eq!(doc.remove_attr(a, "id"), Some("2".to_string()));
        assert!(!doc.has_attr(a, "id"));
    }

    #[test]
    fn test_clone_subtree_is_detached_and_deep() {
        let (mut doc, body, a, _) = sample();
        doc.append_text(a, "Hello");
        doc.append_text(a, ", World");
        let (copy, pairs) = doc.clone_subtree(a).unwrap();
        assert_eq!(pairs.len(), 2);
        assert!(doc.parent(copy).is_none());
        assert_eq!(doc.text_content(copy), "Hello, World");
        doc.append(body, copy);
        assert_eq!(doc.elements_by_tag(body, "p").len(), 3);
    }

    #[test]
    fn test_descendants_document_order() {
        let (mut doc, body, a, b) = sample();
        let t = doc.create_text("t");
        doc.append(a, t);
        let order: Vec<_> = doc.descendants(doc.root()).collect();
        assert_eq!(order, vec![body, a, t, b]);
    }
}
