//! Structural editing: clipboard, insertion, removal, the in-place editor,
//! the source view and deferred resources.

use super::Deck;
use crate::config::AccessMode;
use crate::diagnostics::Diagnostic;
use crate::dom::NodeId;
use crate::error::{Error, Result};
use crate::export::{Target, serialize};
use crate::math;
use crate::nav::location::Locator;
use crate::overlay::SOURCE_OVERLAY;
use crate::pages::{PAGE_TAG, WRAPPER_TAG, wrap_page};
use crate::provenance::{Sentinel, set_state_attr};
use crate::resources::{BarrierState, BatchId, ResourceDescriptor, ResourceKind, ResourceLoader};

const EDIT_CLASS: &str = "editmode";

impl Deck {
    fn require_page(&mut self, n: usize) -> Result<NodeId> {
        match self.registry.page(n) {
            Some(page) => Ok(page),
            None => Err(self.not_found(&n.to_string(), format!("No such location: {n}"))),
        }
    }

    /// Deep copy of `node` with its provenance marks. The copy's root leaves
    /// out the marks named in `root_except`.
    fn clone_marked(&mut self, node: NodeId, root_except: &[&str]) -> Option<NodeId> {
        let (copy, pairs) = self.doc.clone_subtree(node)?;
        for (old, new) in pairs {
            let except = if old == node { root_except } else { &[] };
            self.provenance.copy_marks(old, new, except);
        }
        Some(copy)
    }

    /// Put an inactive, unnumbered copy of `page` on the clipboard.
    ///
    /// A synthesized `id` is dropped together with its mark, so an id given
    /// to the copy later counts as authored.
    fn stash(&mut self, page: NodeId) {
        let numbered = self.provenance.is_synthesized(page, "id");
        let except: &[&str] = if numbered { &["id"] } else { &[] };
        let Some(copy) = self.clone_marked(page, except) else {
            return;
        };
        if numbered {
            self.doc.remove_attr(copy, "id");
        }
        set_state_attr(&mut self.doc, &mut self.provenance, copy, "active", "");
        if let Some(previous) = self.state.clipboard.replace(copy) {
            self.release(previous);
        }
    }

    /// Forget the marks of a subtree that left the tree for good.
    fn release(&mut self, root: NodeId) {
        if self.doc.is_attached(root) || self.state.clipboard == Some(root) {
            return;
        }
        self.provenance.forget(root);
        let nodes: Vec<NodeId> = self.doc.descendants(root).collect();
        for node in nodes {
            self.provenance.forget(node);
        }
    }

    /// Detach a page together with its wrapper.
    fn detach_page(&mut self, page: NodeId) {
        let removed = match self.doc.parent(page) {
            Some(parent) if self.doc.is_element(parent, WRAPPER_TAG) => parent,
            _ => {
                self.diagnostics.push(Diagnostic::StructuralWarning(
                    "page has no container, removing the page alone".into(),
                ));
                page
            }
        };
        self.doc.detach(removed);
        self.release(removed);
    }

    /// Pick the current page after page `removed` went away.
    fn settle_after_removal(&mut self, removed: usize, current: usize) {
        let next = if removed < current {
            current - 1
        } else if removed == current {
            current.min(self.registry.last())
        } else {
            current
        };
        self.state.current = next;
        if !self.registry.is_empty() && !self.is_active(next) {
            self.activate(next);
        }
        self.render_location(Locator::Ordinal(next));
    }

    /// Copy page `n` to the clipboard.
    pub fn copy_page(&mut self, n: usize) -> Result<()> {
        let page = self.require_page(n)?;
        self.stash(page);
        let descr = self.description_suffix(page);
        self.set_message(format!("Copied slide {n}{descr}"));
        Ok(())
    }

    /// Move page `n` to the clipboard.
    pub fn cut_page(&mut self, n: usize) -> Result<()> {
        let page = self.require_page(n)?;
        let current = self.state.current;
        if n == current {
            self.deactivate(n);
        }
        self.stash(page);
        let descr = self.description_suffix(page);
        self.detach_page(page);
        self.reindex();
        self.settle_after_removal(n, current);
        self.set_message(format!("Cut slide {n}{descr}"));
        Ok(())
    }

    /// Insert a fresh copy of the clipboard after page `n` and go to `n`.
    ///
    /// The clipboard keeps its content.
    pub fn paste_after(&mut self, n: usize) -> Result<()> {
        if self.registry.page(n).is_none() {
            self.diagnostics.push(Diagnostic::NotFound(n.to_string()));
            self.set_message("Pasting failed: invalid destination.");
            return Err(Error::NotFound(n.to_string()));
        }
        let clipboard = self.state.clipboard;
        let Some(copy) = clipboard.and_then(|clip| self.clone_marked(clip, &[])) else {
            self.diagnostics.push(Diagnostic::ClipboardEmpty);
            self.set_message("Pasting failed: empty clipboard.");
            return Err(Error::ClipboardEmpty);
        };
        let descr = self.description_suffix(copy);
        self.insert_after(copy, n)?;
        self.force_goto(n);
        self.set_message(format!("Pasted slide after slide {n}{descr}"));
        Ok(())
    }

    /// Insert a detached page (or wrapped page) after page `anchor`.
    ///
    /// A bare page is wrapped first. The current page stays current, under
    /// its possibly shifted ordinal.
    pub fn insert_after(&mut self, subtree: NodeId, anchor: usize) -> Result<()> {
        let anchor_page = self.require_page(anchor)?;
        let current_page = self.current_page();

        let position = match self.doc.parent(anchor_page) {
            Some(parent) if self.doc.is_element(parent, WRAPPER_TAG) => parent,
            _ => anchor_page,
        };
        let node = if self.doc.is_element(subtree, PAGE_TAG) {
            wrap_page(&mut self.doc, &mut self.provenance, subtree)
        } else {
            if !self.doc.is_element(subtree, WRAPPER_TAG) {
                self.diagnostics.push(Diagnostic::StructuralWarning(format!(
                    "inserting a <{}> that is not a page",
                    self.doc.tag(subtree).unwrap_or("#text")
                )));
            }
            subtree
        };
        self.doc.insert_after(position, node);
        self.reindex();

        if let Some(page) = current_page
            && let Some(n) = self.registry.ordinal_of(page)
        {
            self.state.current = n;
        }
        Ok(())
    }

    /// Delete page `n`.
    pub fn remove_page(&mut self, n: usize) -> Result<()> {
        let page = self.require_page(n)?;
        let current = self.state.current;
        if n == current {
            self.deactivate(n);
        }
        let descr = self.description_suffix(page);
        self.detach_page(page);
        self.reindex();
        self.settle_after_removal(n, current);
        self.set_message(format!("Removed slide {n}{descr}"));
        Ok(())
    }

    /// Replace the children of page `n` with `content`. A page element
    /// contributes its children, anything else is inserted whole.
    pub fn replace_content(&mut self, n: usize, content: NodeId) -> Result<()> {
        let page = self.require_page(n)?;
        if self.doc.contains(content, page) {
            self.diagnostics.push(Diagnostic::StructuralWarning(format!(
                "replacement content for slide {n} contains the slide itself"
            )));
            return Err(Error::InvalidEdit(format!("content contains slide {n}")));
        }
        let nodes: Vec<NodeId> = if self.doc.is_element(content, PAGE_TAG) {
            self.doc.children(content).collect()
        } else {
            vec![content]
        };
        let previous: Vec<NodeId> = self.doc.children(page).collect();
        self.doc.clear_children(page);
        for node in nodes {
            self.doc.append(page, node);
        }
        for node in previous {
            self.release(node);
        }
        self.reindex();
        self.notify_change(page);
        Ok(())
    }

    /// Whether the current page is open in the editor.
    pub fn in_edit_mode(&self) -> bool {
        self.current_page()
            .is_some_and(|p| self.doc.attr(p, "contenteditable") == Some("true"))
    }

    /// Open page `n` in the editor, or close it.
    ///
    /// Entering reverts typeset math to author notation. Leaving typesets it
    /// again and notifies observers.
    pub fn toggle_editor(&mut self, n: usize) -> Result<()> {
        let page = self.require_page(n)?;
        let editing = self.doc.attr(page, "contenteditable") == Some("true");
        let classes: Vec<String> = self
            .doc
            .classes(page)
            .into_iter()
            .filter(|c| *c != EDIT_CLASS)
            .map(String::from)
            .collect();

        // `class` stays unmarked: display classes belong to the author.
        if editing {
            set_state_attr(&mut self.doc, &mut self.provenance, page, "contenteditable", "false");
            if classes.is_empty() {
                self.doc.remove_attr(page, "class");
            } else {
                self.doc.set_attr(page, "class", classes.join(" "));
            }
            self.math.typeset(&mut self.doc, page);
            self.notify_change(page);
            self.diagnostics.note(format!("Leaving edit mode on slide {n}"));
        } else {
            let mut classes = classes;
            classes.push(EDIT_CLASS.to_string());
            set_state_attr(&mut self.doc, &mut self.provenance, page, "contenteditable", "true");
            self.doc.set_attr(page, "class", classes.join(" "));
            let reverted = math::revert(&mut self.doc, page);
            self.diagnostics.note(format!(
                "Entering edit mode on slide {n} ({reverted} formulas reverted)"
            ));
        }
        Ok(())
    }

    /// Show the active overlay or the current page in the source view.
    ///
    /// With the source view already showing, hides it. The rendered text is
    /// kept until its subject changes.
    pub fn show_source(&mut self, target: Target) -> Result<()> {
        let subject = match self.state.active_overlay.clone() {
            Some(id) if id == SOURCE_OVERLAY => {
                self.hide_overlay(SOURCE_OVERLAY);
                return Ok(());
            }
            Some(id) => self.overlays.get(&id),
            None => self.current_page(),
        };
        let Some(subject) = subject else {
            return Err(self.not_found("source", "Nothing to show.".into()));
        };

        if self.state.source.subject != Some((subject, target)) {
            let text = serialize(&self.doc, &self.provenance, subject, target);
            if let Some(overlay) = self.overlays.get(SOURCE_OVERLAY) {
                let stale: Vec<NodeId> = self.doc.children(overlay).collect();
                self.doc.clear_children(overlay);
                for node in stale {
                    self.release(node);
                }
                let node = self.doc.create_text(text.clone());
                self.provenance.mark(node, Sentinel::Outer);
                self.doc.append(overlay, node);
            }
            self.state.source.subject = Some((subject, target));
            self.state.source.text = text;
        }
        self.show_overlay(SOURCE_OVERLAY)
    }

    /// Materialize the deferred style and script sources for the configured
    /// access mode and hand them to `loader`.
    pub fn load_resources(&mut self, loader: &mut dyn ResourceLoader) -> BatchId {
        let access = self.config.access;
        self.load_resources_as(access, loader)
    }

    /// Like [`Deck::load_resources`], for an explicit access mode.
    pub fn load_resources_as(
        &mut self,
        access: AccessMode,
        loader: &mut dyn ResourceLoader,
    ) -> BatchId {
        let (style_tag, script_tag) = access.source_tags();
        let mut descriptors = Vec::new();
        for (source_tag, kind) in [(style_tag, ResourceKind::Style), (script_tag, ResourceKind::Script)] {
            for source in self.doc.elements_by_tag(self.doc.root(), source_tag) {
                let attrs = self.doc.attrs(source).to_vec();
                let body = self.doc.text_content(source);
                let element = self.doc.create_element(kind.tag(), attrs.clone());
                if !body.is_empty() {
                    self.doc.append_text(element, &body);
                }
                self.provenance.mark(element, Sentinel::Outer);
                self.doc.insert_before(source, element);
                descriptors.push(ResourceDescriptor { kind, attrs, body });
            }
        }

        self.diagnostics.note(format!(
            "Loading {} deferred resources ({access:?})",
            descriptors.len()
        ));
        let (batch, state) = self.barrier.open(descriptors.len());
        if !descriptors.is_empty() {
            loader.request(batch, &descriptors);
        }
        if state == BarrierState::Ready {
            self.setup_pages();
        }
        batch
    }
}
