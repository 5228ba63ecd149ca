//! The deck: one document, its provenance table, page registry and
//! navigation state, kept mutually consistent by every operation.
//!
//! All handlers run synchronously and leave the tree, the registry and the
//! location string in agreement before returning. Timers and location
//! polling are driven by [`Deck::advance`].

mod classes;
mod edit;
mod navigate;

use std::path::Path;

use crate::config::DeckConfig;
use crate::diagnostics::{Diagnostic, DiagnosticLog};
use crate::dom::{Attribute, Document, NodeId, parse_document_logged};
use crate::error::{Error, Result};
use crate::math::{MathRenderer, NoMath};
use crate::nav::NavigationState;
use crate::nav::commands::CommandTable;
use crate::nav::location::{Location, Locator, Setting};
use crate::overlay::{HostLink, OVERLAY_TAG, OverlayHost, OverlayIndex, SOURCE_OVERLAY};
use crate::pages::{PAGE_TAG, PageRegistry, page_keywords};
use crate::provenance::{ProvenanceMap, Sentinel, set_state_attr};
use crate::resources::{BarrierState, BatchId, LoadBarrier};
use crate::schedule::{Scheduler, Task};

pub use navigate::KeyOutcome;

/// Page indicator contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Indicator {
    /// `"<page> / <last>"`.
    pub position: String,
    /// Keywords of the current page, as written.
    pub keywords: Vec<String>,
}

/// A live slide deck.
pub struct Deck {
    pub doc: Document,
    pub provenance: ProvenanceMap,
    pub registry: PageRegistry,
    pub overlays: OverlayIndex,
    pub state: NavigationState,
    pub diagnostics: DiagnosticLog,
    pub config: DeckConfig,
    pub commands: CommandTable,
    host: HostLink,
    math: Box<dyn MathRenderer>,
    scheduler: Scheduler,
    barrier: LoadBarrier,
    /// Location as the environment currently reports it.
    environment_location: String,
    native_location_events: bool,
    setup_runs: usize,
}

impl std::fmt::Debug for Deck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deck")
            .field("pages", &self.registry.len())
            .field("state", &self.state)
            .field("host", &self.host)
            .finish_non_exhaustive()
    }
}

impl Deck {
    /// Build a deck over an already parsed document.
    ///
    /// Pages are indexed and wrapped, and the source view overlay is
    /// created if the document has none. No page is activated until
    /// [`Deck::start`] or the first navigation.
    pub fn open(doc: Document, config: DeckConfig) -> Result<Self> {
        Self::open_logged(doc, config, DiagnosticLog::new())
    }

    fn open_logged(doc: Document, config: DeckConfig, diagnostics: DiagnosticLog) -> Result<Self> {
        if doc.find_by_tag("body").is_none() && doc.first_child(doc.root()).is_none() {
            return Err(Error::InvalidDeck("document is empty".into()));
        }

        let state = NavigationState::new(config.view, config.lang.clone(), config.toolbar);
        let mut deck = Self {
            doc,
            provenance: ProvenanceMap::new(),
            registry: PageRegistry::new(),
            overlays: OverlayIndex::default(),
            state,
            diagnostics,
            config,
            commands: CommandTable::default(),
            host: HostLink::new(),
            math: Box::new(NoMath),
            scheduler: Scheduler::new(),
            barrier: LoadBarrier::new(),
            environment_location: String::new(),
            native_location_events: false,
            setup_runs: 0,
        };

        deck.ensure_source_overlay();
        deck.reindex();
        Ok(deck)
    }

    /// Parse markup and open it with configuration read from its `body`.
    pub fn open_str(markup: &str) -> Result<Self> {
        let mut diagnostics = DiagnosticLog::new();
        let doc = parse_document_logged(markup, &mut diagnostics)?;
        let config = DeckConfig::from_document(&doc);
        Self::open_logged(doc, config, diagnostics)
    }

    /// Read and open a deck file.
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        let markup = String::from_utf8(bytes)?;
        Self::open_str(&markup)
    }

    pub fn with_math(mut self, renderer: Box<dyn MathRenderer>) -> Self {
        self.math = renderer;
        self
    }

    pub fn with_host(mut self, host: Box<dyn OverlayHost>) -> Self {
        self.host.attach(host);
        self.state.widgets.index_window = true;
        self
    }

    pub fn attach_host(&mut self, host: Box<dyn OverlayHost>) {
        self.host.attach(host);
        self.state.widgets.index_window = true;
    }

    /// Whether the environment delivers location changes itself. Without
    /// native events, [`Deck::start`] installs a polling timer.
    pub fn set_native_location_events(&mut self, native: bool) {
        self.native_location_events = native;
    }

    fn ensure_source_overlay(&mut self) {
        if self.doc.element_by_id(SOURCE_OVERLAY).is_some() {
            return;
        }
        let overlay = self.doc.create_element(
            OVERLAY_TAG,
            vec![
                Attribute::new("id", SOURCE_OVERLAY),
                Attribute::new("class", "black sourcewindow screenonly"),
                Attribute::new("descr", "Source Code"),
            ],
        );
        self.provenance.mark(overlay, Sentinel::Outer);
        let body = self.doc.body();
        self.doc.append(body, overlay);
    }

    /// Renumber pages and rebuild the keyword and overlay indexes.
    pub fn reindex(&mut self) -> usize {
        self.diagnostics.note("Numbering + indexing slides...");
        let default_class = self.config.default_page_class.clone();
        let report = self.registry.reindex(
            &mut self.doc,
            &mut self.provenance,
            default_class.as_deref(),
        );
        for conflict in report.conflicts {
            self.diagnostics.push(conflict);
        }
        self.overlays = OverlayIndex::build(&self.doc);
        if self.state.current > self.registry.last() {
            self.state.current = self.registry.last();
        }
        self.diagnostics.note("Numbering + indexing complete.");
        report.count
    }

    pub fn page_count(&self) -> usize {
        self.registry.len()
    }

    pub fn current(&self) -> usize {
        self.state.current
    }

    pub fn current_page(&self) -> Option<NodeId> {
        self.registry.page(self.state.current)
    }

    /// Whether page `n` carries the active flag.
    pub fn is_active(&self, n: usize) -> bool {
        self.registry
            .page(n)
            .is_some_and(|p| self.doc.attr(p, "active") == Some("yes"))
    }

    /// Ordinals of all pages carrying the active flag.
    pub fn active_pages(&self) -> Vec<usize> {
        (0..self.registry.len()).filter(|&n| self.is_active(n)).collect()
    }

    pub(crate) fn activate(&mut self, n: usize) {
        if let Some(page) = self.registry.page(n) {
            set_state_attr(&mut self.doc, &mut self.provenance, page, "active", "yes");
            self.host.activate(n);
        }
    }

    pub(crate) fn deactivate(&mut self, n: usize) {
        if let Some(page) = self.registry.page(n) {
            set_state_attr(&mut self.doc, &mut self.provenance, page, "active", "");
            self.host.deactivate(n);
        }
    }

    /// Tell observers that `node` changed.
    pub fn notify_change(&mut self, node: NodeId) {
        if self
            .state
            .source
            .subject
            .is_some_and(|(subject, _)| subject == node)
        {
            self.state.source.subject = None;
        }
        if self.doc.is_element(node, PAGE_TAG)
            && let Some(n) = self.registry.ordinal_of(node)
        {
            self.host.update_page(n);
        }
    }

    /// Show an ephemeral status message and schedule its auto-clear.
    ///
    /// Every message schedules its own clear. An older clear that fires
    /// after a newer message hides the newer message early.
    pub fn set_message(&mut self, text: impl Into<String>) {
        self.state.status.set(text);
        self.scheduler
            .schedule(self.config.message_timeout, Task::ClearMessage);
    }

    pub fn message(&self) -> Option<&str> {
        self.state.status.current()
    }

    /// Record an unresolved location and build the error to return.
    pub(crate) fn not_found(&mut self, token: &str, message: String) -> Error {
        self.diagnostics.push(Diagnostic::NotFound(token.to_string()));
        self.set_message(message);
        Error::NotFound(token.to_string())
    }

    /// Page description: the `descr` attribute, or the first heading's text.
    pub fn describe(&self, node: NodeId) -> Option<String> {
        if let Some(descr) = self.doc.attr(node, "descr") {
            return Some(descr.to_string());
        }
        ["h1", "h2", "h3", "h4"].iter().find_map(|tag| {
            self.doc
                .elements_by_tag(node, tag)
                .first()
                .map(|&h| self.doc.text_content(h))
        })
    }

    /// `" (description)"` or nothing, for status messages.
    pub(crate) fn description_suffix(&self, node: NodeId) -> String {
        match self.describe(node) {
            Some(d) if !d.is_empty() => format!(" ({d})"),
            _ => String::new(),
        }
    }

    pub fn indicator(&self) -> Indicator {
        let keywords = self
            .current_page()
            .and_then(|p| self.doc.attr(p, "key"))
            .map(|k| k.split_whitespace().map(String::from).collect())
            .unwrap_or_default();
        Indicator {
            position: format!("{} / {}", self.state.current, self.registry.last()),
            keywords,
        }
    }

    /// Lowercased keywords of page `n`.
    pub fn keywords_of(&self, n: usize) -> Vec<String> {
        self.registry
            .page(n)
            .map(|p| page_keywords(&self.doc, p))
            .unwrap_or_default()
    }

    // ------------------------------------------------------------------
    // Location synchronization
    // ------------------------------------------------------------------

    /// The location string as last written by the deck.
    pub fn location(&self) -> &str {
        &self.state.location
    }

    fn setting_value(&self, setting: Setting) -> String {
        let flag = |on: bool| String::from(if on { "1" } else { "0" });
        match setting {
            Setting::View => self.state.view.as_str().to_string(),
            Setting::Lang => self.state.lang.clone().unwrap_or_default(),
            Setting::IndexWindow => flag(self.state.widgets.index_window),
            Setting::Toolbar => flag(self.state.widgets.toolbar),
            Setting::DebugConsole => flag(self.state.widgets.console),
        }
    }

    /// The current state as a location, with `locator` in front.
    pub fn location_for(&self, locator: Locator) -> Location {
        let settings = self
            .state
            .settings
            .iter()
            .map(|s| (s.name().to_string(), self.setting_value(s)))
            .collect();
        Location {
            locator: Some(locator),
            settings,
        }
    }

    /// Write the location string for `locator` and remember it as applied.
    pub(crate) fn render_location(&mut self, locator: Locator) {
        let location = self.location_for(locator);
        self.state.location = location.encode();
        self.state.seen_location = self.state.location.clone();
        self.environment_location = self.state.location.clone();
        self.state.last_applied = Some(location);
    }

    /// React to a location string reported by the environment.
    ///
    /// Nothing happens unless the decoded location differs from the last
    /// applied one. Settings are applied first; then the locator is tried as
    /// a keyword, a page number and an overlay id, in that order.
    pub fn on_location_change(&mut self, raw: &str) -> Result<()> {
        let decoded = Location::decode(raw);
        if self.state.last_applied.as_ref() == Some(&decoded) {
            return Ok(());
        }
        let previous = self.state.last_applied.replace(decoded.clone());

        let old_settings = previous.map(|l| l.settings).unwrap_or_default();
        let settings_changed = decoded.settings != old_settings;
        if settings_changed {
            self.diagnostics
                .note(format!("Location config change: {}", decoded.encode_settings()));
            self.apply_settings(&decoded.settings);
        }

        let Some(locator) = decoded.locator else {
            if settings_changed {
                self.render_location(self.state.locator());
            }
            return Ok(());
        };
        if locator == Locator::Ordinal(self.state.current) && self.is_active(self.state.current) {
            self.render_location(locator);
            return Ok(());
        }

        let token = locator.token();
        self.diagnostics.note(format!("Location change: {token}"));
        if self.registry.keyword(&token).is_some() {
            self.goto_keyword(&token).map(|_| ())
        } else if let Some(n) = numeric(&token) {
            self.goto(n);
            Ok(())
        } else if self.overlays.contains(&token) {
            self.show_overlay(&token)
        } else {
            Err(self.not_found(&token, format!("No such location: {token}")))
        }
    }

    fn apply_settings(&mut self, settings: &[(String, String)]) {
        for (name, value) in settings {
            if name == crate::nav::location::DROP {
                match Setting::parse(value) {
                    Some(setting) => {
                        self.remove_setting(setting);
                    }
                    None => self
                        .diagnostics
                        .note(format!("Unknown session parameter: {value}")),
                }
                continue;
            }
            let Some(setting) = Setting::parse(name) else {
                self.diagnostics
                    .note(format!("Unknown session parameter: {name}"));
                continue;
            };
            self.state.settings.insert(setting);
            self.apply_setting(setting, value);
        }
    }

    fn apply_setting(&mut self, setting: Setting, value: &str) {
        let on = value == "1";
        match setting {
            Setting::View => match crate::nav::ViewMode::parse(value) {
                Some(mode) if mode != self.state.view => self.set_view_mode(mode),
                Some(_) => {}
                None => self.diagnostics.note(format!("Unknown view mode: {value}")),
            },
            Setting::Lang => {
                if self.state.lang.as_deref() != Some(value) {
                    self.set_lang(value);
                }
            }
            Setting::IndexWindow => {
                if self.state.widgets.index_window != on {
                    self.toggle_index_window();
                }
            }
            Setting::Toolbar => {
                if self.state.widgets.toolbar != on {
                    self.toggle_toolbar();
                }
            }
            Setting::DebugConsole => {
                if self.state.widgets.console != on {
                    self.toggle_console();
                }
            }
        }
    }

    /// Stop persisting `setting` in the location string.
    pub fn remove_setting(&mut self, setting: Setting) -> bool {
        let removed = self.state.settings.remove(setting);
        if removed {
            self.diagnostics
                .note(format!("Dropping {} from session config.", setting.name()));
        }
        removed
    }

    /// Persist `setting` in the location string from now on.
    pub fn add_setting(&mut self, setting: Setting) -> bool {
        self.state.settings.insert(setting)
    }

    /// Apply a session setting by wire name and persist it.
    pub fn set_setting(&mut self, name: &str, value: &str) -> Result<()> {
        let setting = Setting::parse(name).ok_or_else(|| Error::UnknownSetting(name.to_string()))?;
        self.state.settings.insert(setting);
        self.apply_setting(setting, value);
        self.render_location(self.state.locator());
        Ok(())
    }

    pub fn set_lang(&mut self, lang: &str) {
        let body = self.doc.body();
        set_state_attr(&mut self.doc, &mut self.provenance, body, "lang", lang);
        self.diagnostics.note(format!(
            "Language changed from '{}' to '{lang}'.",
            self.state.lang.as_deref().unwrap_or_default()
        ));
        self.state.lang = Some(lang.to_string());
    }

    /// Bring the deck up at `location`.
    ///
    /// Applies the configured view mode, acts on the location, makes sure
    /// some page is active and starts location polling when the environment
    /// has no change events.
    pub fn start(&mut self, location: &str) -> Result<()> {
        let body = self.doc.body();
        let view = self.state.view;
        set_state_attr(&mut self.doc, &mut self.provenance, body, "view", view.as_str());

        if !self.native_location_events && self.scheduler.pending(Task::PollLocation) == 0 {
            self.scheduler
                .schedule_every(self.config.poll_interval, Task::PollLocation);
        }

        self.environment_location = location.to_string();
        self.state.seen_location = location.to_string();
        let result = self.on_location_change(location);

        if !self.registry.is_empty() && !self.is_active(self.state.current) {
            let current = self.state.current;
            self.activate(current);
            self.render_location(Locator::Ordinal(current));
        }
        result
    }

    /// The environment's location changed (typed URL, history navigation).
    ///
    /// With native events this is acted on immediately; otherwise the next
    /// poll picks it up.
    pub fn set_environment_location(&mut self, raw: &str) -> Result<()> {
        self.environment_location = raw.to_string();
        if self.native_location_events {
            self.state.seen_location = raw.to_string();
            return self.on_location_change(raw);
        }
        Ok(())
    }

    /// Advance the virtual clock and run whatever came due.
    pub fn advance(&mut self, millis: u64) -> Vec<Task> {
        let tasks = self.scheduler.advance(millis);
        for task in &tasks {
            match task {
                Task::ClearMessage => self.state.status.clear(),
                Task::PollLocation => {
                    if self.environment_location != self.state.seen_location {
                        let raw = self.environment_location.clone();
                        self.state.seen_location = raw.clone();
                        // Failures are already reported through diagnostics.
                        let _ = self.on_location_change(&raw);
                    }
                }
            }
        }
        tasks
    }

    // ------------------------------------------------------------------
    // Deferred resources
    // ------------------------------------------------------------------

    /// Report completion of resource `index` of `batch`. Runs page setup
    /// when this was the last outstanding resource.
    pub fn resource_loaded(&mut self, batch: BatchId, index: usize) -> bool {
        match self.barrier.complete(batch, index) {
            BarrierState::Ready => {
                self.diagnostics
                    .note("All deferred resources finished loading.");
                self.setup_pages();
                true
            }
            BarrierState::Pending => false,
        }
    }

    /// How many times page setup has run.
    pub fn setup_runs(&self) -> usize {
        self.setup_runs
    }

    /// Interpret every page's `setup` attribute as command words.
    pub fn setup_pages(&mut self) {
        self.setup_runs += 1;
        self.diagnostics.note("Slide-specific setup running...");
        let setups: Vec<(usize, String)> = self
            .registry
            .pages()
            .iter()
            .enumerate()
            .filter_map(|(i, &p)| self.doc.attr(p, "setup").map(|s| (i, s.to_string())))
            .collect();

        for (i, setup) in setups {
            self.diagnostics
                .note(format!("Slide {i}: executing setup: \"{setup}\""));
            for word in setup.split_whitespace() {
                match self.commands.word(word).cloned() {
                    Some(command) => {
                        // Failures are already reported through diagnostics.
                        let _ = self.run(command);
                    }
                    None => self
                        .diagnostics
                        .note(format!("Slide {i}: unknown setup command '{word}'")),
                }
            }
        }
        self.diagnostics.note("Slide-specific setup complete.");
    }

    /// Ask the math renderer to reprocess every page, current page first.
    pub fn reprocess_math(&mut self) {
        self.diagnostics.note("Updating page rendering.");
        let current = self.state.current;
        let count = self.registry.len();
        let order = std::iter::once(current)
            .chain(current + 1..count)
            .chain((0..current).rev());
        for n in order {
            if let Some(page) = self.registry.page(n) {
                self.math.reprocess(&mut self.doc, page);
            }
        }
    }
}

/// Integer value of a numeric token, saturating on overflow.
fn numeric(token: &str) -> Option<i64> {
    let digits = token.strip_prefix('-').unwrap_or(token);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let saturated = if token.starts_with('-') { i64::MIN } else { i64::MAX };
    Some(token.parse().unwrap_or(saturated))
}
