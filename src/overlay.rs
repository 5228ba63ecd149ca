//! Overlays and the optional mirror surface.
//!
//! Overlays are `bubble` elements addressed by their `id` attribute. The
//! overlay host is a second rendering surface (an index window) that mirrors
//! page and overlay activity. It may be absent or closed at any time, and
//! every notification is then skipped.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::dom::{Document, NodeId};

/// Tag of overlay nodes.
pub const OVERLAY_TAG: &str = "bubble";
/// Id of the system overlay that shows exported source.
pub const SOURCE_OVERLAY: &str = "sourcecode";

/// Id → node lookup for overlays.
#[derive(Debug, Clone, Default)]
pub struct OverlayIndex {
    by_id: HashMap<String, NodeId>,
    order: Vec<String>,
}

impl OverlayIndex {
    /// Index every attached `bubble` that carries an id. First id wins.
    pub fn build(doc: &Document) -> Self {
        let mut index = Self::default();
        for node in doc.elements_by_tag(doc.root(), OVERLAY_TAG) {
            if let Some(id) = doc.attr(node, "id")
                && !index.by_id.contains_key(id)
            {
                index.by_id.insert(id.to_string(), node);
                index.order.push(id.to_string());
            }
        }
        index
    }

    pub fn get(&self, id: &str) -> Option<NodeId> {
        self.by_id.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Overlay ids in document order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Receiver of page and overlay activity notifications.
pub trait OverlayHost {
    /// Whether the surface is still open. A closed host is dropped.
    fn is_open(&self) -> bool {
        true
    }
    fn activate(&mut self, page: usize);
    fn deactivate(&mut self, page: usize);
    fn mark(&mut self, overlay: &str);
    fn unmark(&mut self, overlay: &str);
    fn update_page(&mut self, page: usize);
}

/// Handle to an optional overlay host.
#[derive(Default)]
pub struct HostLink {
    host: Option<Box<dyn OverlayHost>>,
}

impl fmt::Debug for HostLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostLink")
            .field("attached", &self.host.is_some())
            .finish()
    }
}

impl HostLink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&mut self, host: Box<dyn OverlayHost>) {
        self.host = Some(host);
    }

    pub fn detach(&mut self) -> Option<Box<dyn OverlayHost>> {
        self.host.take()
    }

    /// Whether an open host is attached. Drops a host that has closed.
    pub fn is_attached(&mut self) -> bool {
        self.live().is_some()
    }

    fn live(&mut self) -> Option<&mut Box<dyn OverlayHost>> {
        if self.host.as_ref().is_some_and(|h| !h.is_open()) {
            self.host = None;
        }
        self.host.as_mut()
    }

    pub fn activate(&mut self, page: usize) {
        if let Some(host) = self.live() {
            host.activate(page);
        }
    }

    pub fn deactivate(&mut self, page: usize) {
        if let Some(host) = self.live() {
            host.deactivate(page);
        }
    }

    pub fn mark(&mut self, overlay: &str) {
        if let Some(host) = self.live() {
            host.mark(overlay);
        }
    }

    pub fn unmark(&mut self, overlay: &str) {
        if let Some(host) = self.live() {
            host.unmark(overlay);
        }
    }

    pub fn update_page(&mut self, page: usize) {
        if let Some(host) = self.live() {
            host.update_page(page);
        }
    }
}

/// A host event, as recorded by [`RecordingHost`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    Activate(usize),
    Deactivate(usize),
    Mark(String),
    Unmark(String),
    UpdatePage(usize),
}

/// Host that records notifications into a shared list.
///
/// Useful as an index window stand-in and in tests; clone the handle before
/// attaching to keep read access to the events.
#[derive(Debug, Clone)]
pub struct RecordingHost {
    events: Rc<RefCell<Vec<HostEvent>>>,
    open: Rc<Cell<bool>>,
}

impl Default for RecordingHost {
    fn default() -> Self {
        Self {
            events: Rc::default(),
            open: Rc::new(Cell::new(true)),
        }
    }
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<HostEvent> {
        self.events.borrow().clone()
    }

    pub fn take_events(&self) -> Vec<HostEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    /// Simulate the user closing the surface.
    pub fn close(&self) {
        self.open.set(false);
    }

    fn push(&self, event: HostEvent) {
        self.events.borrow_mut().push(event);
    }
}

impl OverlayHost for RecordingHost {
    fn is_open(&self) -> bool {
        self.open.get()
    }

    fn activate(&mut self, page: usize) {
        self.push(HostEvent::Activate(page));
    }

    fn deactivate(&mut self, page: usize) {
        self.push(HostEvent::Deactivate(page));
    }

    fn mark(&mut self, overlay: &str) {
        self.push(HostEvent::Mark(overlay.to_string()));
    }

    fn unmark(&mut self, overlay: &str) {
        self.push(HostEvent::Unmark(overlay.to_string()));
    }

    fn update_page(&mut self, page: usize) {
        self.push(HostEvent::UpdatePage(page));
    }
}
