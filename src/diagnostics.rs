//! Diagnostic console.
//!
//! Every recoverable problem the deck runs into is recorded here and echoed
//! through the `log` facade. Nothing in this log is fatal.

use thiserror::Error;

/// One console entry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A keyword, ordinal or overlay id resolved to nothing.
    #[error("undefined location: {0}")]
    NotFound(String),

    /// Two pages claim the same keyword; the later page wins.
    #[error("page {page} duplicates key '{keyword}' (also used by page {previous})")]
    DuplicateKeyword {
        keyword: String,
        previous: usize,
        page: usize,
    },

    /// An operation expected a wrapper shape that was missing.
    #[error("structural warning: {0}")]
    StructuralWarning(String),

    #[error("pasting failed: empty clipboard")]
    ClipboardEmpty,

    /// Ordinary console line.
    #[error("{0}")]
    Note(String),
}

impl Diagnostic {
    /// Whether this entry is a warning rather than information.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            Diagnostic::DuplicateKeyword { .. } | Diagnostic::StructuralWarning(_)
        )
    }
}

/// Append-only log of diagnostics in arrival order.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticLog {
    entries: Vec<Diagnostic>,
}

impl DiagnosticLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic and forward it to the logger.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        match &diagnostic {
            Diagnostic::Note(_) => log::debug!("{diagnostic}"),
            Diagnostic::DuplicateKeyword { .. } | Diagnostic::StructuralWarning(_) => {
                log::warn!("{diagnostic}")
            }
            Diagnostic::NotFound(_) | Diagnostic::ClipboardEmpty => log::info!("{diagnostic}"),
        }
        self.entries.push(diagnostic);
    }

    pub fn note(&mut self, message: impl Into<String>) {
        self.push(Diagnostic::Note(message.into()));
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    /// Entries that are not plain notes.
    pub fn problems(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries
            .iter()
            .filter(|d| !matches!(d, Diagnostic::Note(_)))
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(|d| d.is_warning())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
