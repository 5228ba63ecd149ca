//! Deck configuration.
//!
//! Defaults can be overridden by attributes on the document `body` (`dpc`,
//! `view`, `lang`, `tb`) and then adjusted with the `with_*` builders.

#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

use crate::dom::Document;
use crate::nav::ViewMode;

/// Default page display-class cycle.
pub const DEFAULT_CLASS_CYCLE: &str = "white black aqua hgrey";

/// How the deck was reached. Selects which deferred resources are loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "cli", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "cli", serde(rename_all = "lowercase"))]
pub enum AccessMode {
    /// Opened from the local file system.
    #[default]
    Local,
    /// Served over the network.
    Remote,
}

impl AccessMode {
    /// Source tag names `(style, script)` for this access mode.
    pub fn source_tags(self) -> (&'static str, &'static str) {
        match self {
            AccessMode::Local => ("localstyle", "localscript"),
            AccessMode::Remote => ("remotestyle", "remotescript"),
        }
    }
}

/// Configuration for a [`Deck`](crate::Deck).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "cli", derive(Serialize, Deserialize))]
pub struct DeckConfig {
    /// Class given to pages that have none.
    pub default_page_class: Option<String>,
    /// Display classes cycled by the class toggle.
    pub class_cycle: Vec<String>,
    /// Initial view mode.
    pub view: ViewMode,
    /// Presentation language.
    pub lang: Option<String>,
    /// Whether the toolbar starts visible.
    pub toolbar: bool,
    pub access: AccessMode,
    /// Lifetime of a status message, in milliseconds.
    pub message_timeout: u64,
    /// Location polling interval, in milliseconds.
    pub poll_interval: u64,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            default_page_class: None,
            class_cycle: DEFAULT_CLASS_CYCLE
                .split_whitespace()
                .map(String::from)
                .collect(),
            view: ViewMode::Full,
            lang: None,
            toolbar: true,
            access: AccessMode::Local,
            message_timeout: 1000,
            poll_interval: 200,
        }
    }
}

impl DeckConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read overrides from the attributes of the document's `body`.
    ///
    /// Unknown view modes are ignored. `tb="0"` hides the toolbar, any other
    /// value shows it.
    pub fn from_document(doc: &Document) -> Self {
        let mut config = Self::default();
        let body = doc.body();

        if let Some(dpc) = doc.attr(body, "dpc") {
            config.default_page_class = Some(dpc.to_string());
        }
        if let Some(view) = doc.attr(body, "view").and_then(ViewMode::parse) {
            config.view = view;
        }
        if let Some(lang) = doc.attr(body, "lang") {
            config.lang = Some(lang.to_string());
        }
        if let Some(tb) = doc.attr(body, "tb") {
            config.toolbar = tb != "0";
        }
        config
    }

    pub fn with_default_page_class(mut self, class: impl Into<String>) -> Self {
        self.default_page_class = Some(class.into());
        self
    }

    pub fn with_class_cycle(mut self, cycle: &str) -> Self {
        self.class_cycle = cycle.split_whitespace().map(String::from).collect();
        self
    }

    pub fn with_view(mut self, view: ViewMode) -> Self {
        self.view = view;
        self
    }

    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }

    pub fn with_toolbar(mut self, toolbar: bool) -> Self {
        self.toolbar = toolbar;
        self
    }

    pub fn with_access(mut self, access: AccessMode) -> Self {
        self.access = access;
        self
    }

    pub fn with_message_timeout(mut self, millis: u64) -> Self {
        self.message_timeout = millis;
        self
    }

    pub fn with_poll_interval(mut self, millis: u64) -> Self {
        self.poll_interval = millis;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_document;

    #[test]
    fn test_defaults() {
        let config = DeckConfig::default();
        assert_eq!(config.class_cycle, vec!["white", "black", "aqua", "hgrey"]);
        assert_eq!(config.view, ViewMode::Full);
        assert!(config.toolbar);
        assert_eq!(config.message_timeout, 1000);
        assert_eq!(config.poll_interval, 200);
    }

    #[test]
    fn test_from_body_attributes() {
        let doc =
            parse_document(r#"<body dpc="black" view="grid" lang="de" tb="0"></body>"#).unwrap();
        let config = DeckConfig::from_document(&doc);
        assert_eq!(config.default_page_class.as_deref(), Some("black"));
        assert_eq!(config.view, ViewMode::Grid);
        assert_eq!(config.lang.as_deref(), Some("de"));
        assert!(!config.toolbar);
    }

    #[test]
    fn test_unknown_view_is_ignored() {
        let doc = parse_document(r#"<body view="sideways"></body>"#).unwrap();
        assert_eq!(DeckConfig::from_document(&doc).view, ViewMode::Full);
    }

    #[test]
    fn test_builders() {
        let config = DeckConfig::new()
            .with_class_cycle("a b")
            .with_access(AccessMode::Remote)
            .with_message_timeout(50);
        assert_eq!(config.class_cycle, vec!["a", "b"]);
        assert_eq!(config.access.source_tags(), ("remotestyle", "remotescript"));
        assert_eq!(config.message_timeout, 50);
    }
}
