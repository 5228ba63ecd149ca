//! Deferred resources and the load barrier.
//!
//! Auxiliary scripts and styles are requested in batches. A batch becomes
//! ready exactly once, after every one of its resources has reported
//! completion, in whatever order. An empty batch is ready immediately.

use std::collections::{HashMap, HashSet};

use crate::dom::Attribute;

/// Identifier of a requested batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BatchId(pub u32);

/// Whether the barrier fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarrierState {
    /// Still waiting on resources.
    Pending,
    /// The last resource just completed; run setup now.
    Ready,
}

#[derive(Debug, Clone)]
struct Batch {
    expected: usize,
    completed: HashSet<usize>,
}

/// Join point for batches of deferred resources.
///
/// Only batches still waiting are stored; a batch is dropped the moment it
/// fires.
#[derive(Debug, Clone, Default)]
pub struct LoadBarrier {
    pending: HashMap<BatchId, Batch>,
    next: u32,
}

impl LoadBarrier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a batch of `expected` resources.
    ///
    /// With zero resources the batch is already complete and `Ready` is
    /// returned here; no completion will ever be reported for it.
    pub fn open(&mut self, expected: usize) -> (BatchId, BarrierState) {
        let id = BatchId(self.next);
        self.next += 1;
        if expected == 0 {
            return (id, BarrierState::Ready);
        }
        self.pending.insert(
            id,
            Batch {
                expected,
                completed: HashSet::new(),
            },
        );
        (id, BarrierState::Pending)
    }

    /// Record completion of resource `index` of `batch`.
    ///
    /// Returns `Ready` only for the completion that finishes the batch.
    /// Repeated, out-of-range or unknown completions are ignored.
    pub fn complete(&mut self, batch: BatchId, index: usize) -> BarrierState {
        let Some(entry) = self.pending.get_mut(&batch) else {
            return BarrierState::Pending;
        };
        if index >= entry.expected {
            return BarrierState::Pending;
        }
        entry.completed.insert(index);
        if entry.completed.len() == entry.expected {
            self.pending.remove(&batch);
            BarrierState::Ready
        } else {
            BarrierState::Pending
        }
    }

    /// Number of resources still outstanding in `batch`.
    pub fn outstanding(&self, batch: BatchId) -> usize {
        self.pending
            .get(&batch)
            .map(|b| b.expected - b.completed.len())
            .unwrap_or(0)
    }

    /// Whether `batch` was opened and has fired.
    pub fn is_ready(&self, batch: BatchId) -> bool {
        batch.0 < self.next && !self.pending.contains_key(&batch)
    }

    /// Number of batches still waiting.
    pub fn pending_batches(&self) -> usize {
        self.pending.len()
    }
}

/// Kind of deferred resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Script,
    Style,
}

impl ResourceKind {
    pub fn tag(self) -> &'static str {
        match self {
            ResourceKind::Script => "script",
            ResourceKind::Style => "style",
        }
    }
}

/// One resource to load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDescriptor {
    pub kind: ResourceKind,
    pub attrs: Vec<Attribute>,
    /// Inline content copied from the source tag.
    pub body: String,
}

impl ResourceDescriptor {
    pub fn src(&self) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name == "src" || a.name == "href")
            .map(|a| a.value.as_str())
    }
}

/// The environment's resource fetcher.
///
/// Completions are reported back through
/// [`Deck::resource_loaded`](crate::Deck::resource_loaded) with the index of
/// each descriptor in the batch.
pub trait ResourceLoader {
    fn request(&mut self, batch: BatchId, resources: &[ResourceDescriptor]);
}

/// Loader that only remembers what was requested.
#[derive(Debug, Clone, Default)]
pub struct QueuedLoader {
    pub requests: Vec<(BatchId, Vec<ResourceDescriptor>)>,
}

impl ResourceLoader for QueuedLoader {
    fn request(&mut self, batch: BatchId, resources: &[ResourceDescriptor]) {
        self.requests.push((batch, resources.to_vec()));
    }
}
