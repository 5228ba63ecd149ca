//! Page registry.
//!
//! Pages are `page` elements, numbered by document order. Re-indexing is the
//! only operation that renumbers them; it also wraps bare pages in a
//! synthetic `pagecontainer` and rebuilds the keyword registry from each
//! page's space-separated `key` attribute.

use std::collections::HashMap;

use crate::diagnostics::Diagnostic;
use crate::dom::{Attribute, Document, NodeId};
use crate::provenance::{ProvenanceMap, Sentinel, graft_attr};

/// Tag of page nodes.
pub const PAGE_TAG: &str = "page";
/// Tag of the wrapper every page sits in.
pub const WRAPPER_TAG: &str = "pagecontainer";

/// Outcome of a re-indexing pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reindex {
    pub count: usize,
    /// Wrappers created by this pass.
    pub wrapped: usize,
    pub conflicts: Vec<Diagnostic>,
}

/// Ordinal and keyword index over the pages of a document.
#[derive(Debug, Clone, Default)]
pub struct PageRegistry {
    pages: Vec<NodeId>,
    keywords: HashMap<String, usize>,
}

impl PageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rescan the document, renumber pages and rebuild the keyword registry.
    ///
    /// Each page gets a bookkeeping `id` equal to its ordinal, an
    /// `onmouseover` tracking hook and an `ondblclick` hook (authored values
    /// are left alone) and, if it has no class, `default_class`. Running this
    /// twice without a tree change in between changes nothing.
    pub fn reindex(
        &mut self,
        doc: &mut Document,
        prov: &mut ProvenanceMap,
        default_class: Option<&str>,
    ) -> Reindex {
        let root = doc.root();
        self.pages = doc.elements_by_tag(root, PAGE_TAG);
        self.keywords.clear();

        let mut report = Reindex {
            count: self.pages.len(),
            ..Reindex::default()
        };

        for (ordinal, &page) in self.pages.iter().enumerate() {
            graft_attr(doc, prov, page, "id", &ordinal.to_string());
            graft_attr(doc, prov, page, "onmouseover", &format!("trackPage({ordinal});"));
            graft_attr(doc, prov, page, "ondblclick", &format!("pageDoubleClick({ordinal});"));

            if let Some(class) = default_class
                && !doc.has_attr(page, "class")
            {
                doc.set_attr(page, "class", class);
            }

            if !doc
                .parent(page)
                .is_some_and(|parent| doc.is_element(parent, WRAPPER_TAG))
            {
                wrap_page(doc, prov, page);
                report.wrapped += 1;
            }

            for keyword in page_keywords(doc, page) {
                match self.keywords.insert(keyword.clone(), ordinal) {
                    Some(previous) if previous != ordinal => {
                        report.conflicts.push(Diagnostic::DuplicateKeyword {
                            keyword,
                            previous,
                            page: ordinal,
                        });
                    }
                    _ => {}
                }
            }
        }

        report
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Highest valid ordinal (0 for an empty deck).
    pub fn last(&self) -> usize {
        self.pages.len().saturating_sub(1)
    }

    pub fn page(&self, ordinal: usize) -> Option<NodeId> {
        self.pages.get(ordinal).copied()
    }

    pub fn pages(&self) -> &[NodeId] {
        &self.pages
    }

    pub fn ordinal_of(&self, node: NodeId) -> Option<usize> {
        self.pages.iter().position(|&p| p == node)
    }

    /// Ordinal of the page containing `node` (or `node` itself).
    pub fn page_containing(&self, doc: &Document, node: NodeId) -> Option<usize> {
        let mut current = Some(node);
        while let Some(id) = current {
            if doc.is_element(id, PAGE_TAG) {
                return self.ordinal_of(id);
            }
            current = doc.parent(id);
        }
        None
    }

    /// Case-insensitive keyword lookup.
    pub fn keyword(&self, keyword: &str) -> Option<usize> {
        self.keywords.get(&keyword.to_lowercase()).copied()
    }

    pub fn keywords(&self) -> &HashMap<String, usize> {
        &self.keywords
    }

    /// Keyword first, then an integer clamped into `[0, N-1]`.
    pub fn find_by_keyword_or_ordinal(&self, token: &str) -> Option<usize> {
        if let Some(ordinal) = self.keyword(token) {
            return Some(ordinal);
        }
        if self.pages.is_empty() {
            return None;
        }
        let n = token.trim().parse::<i64>().ok()?;
        Some(self.clamp(n))
    }

    /// Clamp any integer into the valid ordinal range.
    pub fn clamp(&self, n: i64) -> usize {
        n.clamp(0, self.last() as i64) as usize
    }
}

/// Lowercased keywords of a page, in attribute order.
pub fn page_keywords(doc: &Document, page: NodeId) -> Vec<String> {
    doc.attr(page, "key")
        .map(|key| key.split_whitespace().map(str::to_lowercase).collect())
        .unwrap_or_default()
}

/// Put a synthetic wrapper where `page` is and move the page into it.
pub(crate) fn wrap_page(doc: &mut Document, prov: &mut ProvenanceMap, page: NodeId) -> NodeId {
    let wrapper = doc.create_element(WRAPPER_TAG, vec![Attribute::new("class", WRAPPER_TAG)]);
    prov.mark(wrapper, Sentinel::Wrapper);
    if doc.parent(page).is_some() {
        doc.insert_before(page, wrapper);
    }
    doc.append(wrapper, page);
    wrapper
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_document;

    fn index(markup: &str) -> (Document, ProvenanceMap, PageRegistry, Reindex) {
        let mut doc = parse_document(markup).unwrap();
        let mut prov = ProvenanceMap::new();
        let mut registry = PageRegistry::new();
        let report = registry.reindex(&mut doc, &mut prov, None);
        (doc, prov, registry, report)
    }

    #[test]
    fn test_ordinals_and_wrappers() {
        let (doc, prov, registry, report) =
            index("<body><page>a</page><page>b</page><page>c</page></body>");
        assert_eq!(report.count, 3);
        assert_eq!(report.wrapped, 3);
        for (i, &page) in registry.pages().iter().enumerate() {
            assert_eq!(doc.attr(page, "id"), Some(i.to_string().as_str()));
            assert!(prov.is_synthesized(page, "id"));
            let wrapper = doc.parent(page).unwrap();
            assert!(doc.is_element(wrapper, WRAPPER_TAG));
            assert!(prov.has(wrapper, Sentinel::Wrapper));
        }
    }

    #[test]
    fn test_reindex_is_idempotent() {
        let (mut doc, mut prov, mut registry, first) =
            index("<body><page key='a b'>a</page><page>b</page></body>");
        let pages = registry.pages().to_vec();
        let nodes = doc.len();

        let second = registry.reindex(&mut doc, &mut prov, None);
        assert_eq!(second.count, first.count);
        assert_eq!(second.wrapped, 0);
        assert_eq!(registry.pages(), pages.as_slice());
        assert_eq!(doc.len(), nodes);
        assert_eq!(registry.keyword("b"), Some(0));
    }

    #[test]
    fn test_existing_wrapper_is_kept() {
        let (doc, prov, registry, report) =
            index("<body><pagecontainer><page>a</page></pagecontainer></body>");
        assert_eq!(report.wrapped, 0);
        let wrapper = doc.parent(registry.page(0).unwrap()).unwrap();
        assert!(!prov.has(wrapper, Sentinel::Wrapper));
    }

    #[test]
    fn test_authored_id_is_not_overwritten() {
        let (doc, prov, registry, _) = index("<body><page id='title'>a</page></body>");
        let page = registry.page(0).unwrap();
        assert_eq!(doc.attr(page, "id"), Some("title"));
        assert!(!prov.is_synthesized(page, "id"));
    }

    #[test]
    fn test_hooks_follow_ordinals_but_spare_authored_handlers() {
        let (mut doc, mut prov, mut registry, _) = index(
            "<body><page>a</page><page ondblclick='zoom()'>b</page></body>",
        );
        let second = registry.page(1).unwrap();
        assert_eq!(doc.attr(second, "onmouseover"), Some("trackPage(1);"));
        assert_eq!(doc.attr(second, "ondblclick"), Some("zoom()"));
        assert!(prov.is_synthesized(second, "onmouseover"));
        assert!(!prov.is_synthesized(second, "ondblclick"));

        let first = registry.page(0).unwrap();
        doc.detach(doc.parent(first).unwrap());
        registry.reindex(&mut doc, &mut prov, None);
        assert_eq!(doc.attr(second, "onmouseover"), Some("trackPage(0);"));
        assert_eq!(doc.attr(second, "ondblclick"), Some("zoom()"));
    }

    #[test]
    fn test_keyword_conflict_last_wins() {
        let (_, _, registry, report) = index(
            "<body><page/><page/><page key='x'/><page/><page/><page key='X'/></body>",
        );
        assert_eq!(registry.keyword("x"), Some(5));
        assert_eq!(
            report.conflicts,
            vec![Diagnostic::DuplicateKeyword {
                keyword: "x".into(),
                previous: 2,
                page: 5
            }]
        );
    }

    #[test]
    fn test_repeated_own_keyword_is_not_a_conflict() {
        let (_, _, registry, report) = index("<body><page key='a a'/></body>");
        assert_eq!(registry.keyword("A"), Some(0));
        assert!(report.conflicts.is_empty());
    }

    #[test]
    fn test_find_by_keyword_or_ordinal() {
        let (_, _, registry, _) =
            index("<body><page/><page key='intro Start'/><page key='12'/></body>");
        assert_eq!(registry.find_by_keyword_or_ordinal("START"), Some(1));
        assert_eq!(registry.find_by_keyword_or_ordinal("12"), Some(2));
        assert_eq!(registry.find_by_keyword_or_ordinal("1"), Some(1));
        assert_eq!(registry.find_by_keyword_or_ordinal("99"), Some(2));
        assert_eq!(registry.find_by_keyword_or_ordinal("-4"), Some(0));
        assert_eq!(registry.find_by_keyword_or_ordinal("nope"), None);
    }

    #[test]
    fn test_empty_deck_finds_nothing() {
        let (_, _, registry, report) = index("<body><p>no pages</p></body>");
        assert_eq!(report.count, 0);
        assert_eq!(registry.find_by_keyword_or_ordinal("0"), None);
    }

    #[test]
    fn test_default_class_applied_once() {
        let mut doc = parse_document("<body><page/><page class='black'/></body>").unwrap();
        let mut prov = ProvenanceMap::new();
        let mut registry = PageRegistry::new();
        registry.reindex(&mut doc, &mut prov, Some("aqua"));
        let classes: Vec<_> = registry
            .pages()
            .iter()
            .map(|&p| doc.attr(p, "class").unwrap_or_default().to_string())
            .collect();
        assert_eq!(classes, vec!["aqua", "black"]);
    }

    #[test]
    fn test_page_containing() {
        let (doc, _, registry, _) = index("<body><page/><page><p><b>x</b></p></page></body>");
        let b = doc.find_by_tag("b").unwrap();
        assert_eq!(registry.page_containing(&doc, b), Some(1));
        assert_eq!(registry.page_containing(&doc, doc.body()), None);
    }
}
