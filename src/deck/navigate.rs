//! Page movement, overlays, view modes and keyboard dispatch.

use super::Deck;
use crate::dom::NodeId;
use crate::error::Result;
use crate::nav::ViewMode;
use crate::nav::commands::{Command, Key, Modifiers, Pending, Resolution};
use crate::nav::location::Locator;
use crate::provenance::{graft_attr, set_state_attr};

/// Whether the deck consumed a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Handled,
    /// The environment should apply its default action.
    PassThrough,
}

impl Deck {
    /// Make page `n` (clamped) current.
    ///
    /// Going to the page that is already current and active fires nothing.
    pub fn goto(&mut self, n: i64) -> usize {
        self.state.input.clear();
        if self.registry.is_empty() {
            self.render_location(Locator::Ordinal(0));
            return 0;
        }
        let target = self.registry.clamp(n);
        self.switch_to(target);
        self.render_location(Locator::Ordinal(target));
        target
    }

    pub fn goto_relative(&mut self, delta: i64) -> usize {
        let from = self.state.current as i64;
        self.goto(from.saturating_add(delta))
    }

    /// Deactivate the current page and activate `target`, whether or not it
    /// changes.
    pub(crate) fn force_goto(&mut self, target: usize) {
        self.state.input.clear();
        if self.registry.is_empty() {
            return;
        }
        let target = target.min(self.registry.last());
        let current = self.state.current;
        self.deactivate(current);
        self.state.current = target;
        self.activate(target);
        self.render_location(Locator::Ordinal(target));
    }

    fn switch_to(&mut self, target: usize) {
        if target == self.state.current && self.is_active(target) {
            return;
        }
        let current = self.state.current;
        self.deactivate(current);
        self.state.current = target;
        self.activate(target);
    }

    /// Go to the page carrying `keyword`. The location shows the keyword.
    pub fn goto_keyword(&mut self, keyword: &str) -> Result<usize> {
        let keyword = keyword.to_lowercase();
        let Some(target) = self.registry.keyword(&keyword) else {
            return Err(self.not_found(&keyword, format!("No such location: {keyword}")));
        };
        self.state.input.clear();
        self.switch_to(target);
        self.render_location(Locator::Keyword(keyword));
        Ok(target)
    }

    /// Typed-word target: a page keyword or an overlay id.
    pub fn jump_to(&mut self, target: &str) -> Result<()> {
        let target = target.to_lowercase();
        if self.registry.keyword(&target).is_some() {
            self.goto_keyword(&target).map(|_| ())
        } else if self.overlays.contains(&target) {
            self.toggle_overlay(&target)
        } else {
            Err(self.not_found(&target, format!("Unknown target: {target}")))
        }
    }

    /// Follow a node the user interacted with to its page.
    pub fn track_node(&mut self, node: NodeId) -> Option<usize> {
        let n = self.registry.page_containing(&self.doc, node)?;
        self.track_page(n);
        Some(n)
    }

    /// Make page `n` current without scrolling, as when the user clicks it.
    pub fn track_page(&mut self, n: usize) {
        if n >= self.registry.len() || (n == self.state.current && self.is_active(n)) {
            return;
        }
        self.state.input.clear();
        self.switch_to(n);
        self.render_location(Locator::Ordinal(n));
    }

    // ------------------------------------------------------------------
    // Overlays
    // ------------------------------------------------------------------

    /// Show overlay `id`, or hide it if it is the active one.
    pub fn toggle_overlay(&mut self, id: &str) -> Result<()> {
        if !self.overlays.contains(id) {
            return Err(self.not_found(id, format!("Unknown target: {id}")));
        }
        if self.state.active_overlay.as_deref() == Some(id) {
            self.hide_overlay(id);
            Ok(())
        } else {
            self.show_overlay(id)
        }
    }

    /// Show overlay `id`, hiding whichever overlay was active.
    pub fn show_overlay(&mut self, id: &str) -> Result<()> {
        let Some(node) = self.overlays.get(id) else {
            return Err(self.not_found(id, format!("Unknown target: {id}")));
        };
        if self.state.active_overlay.as_deref() == Some(id) {
            return Ok(());
        }
        if let Some(previous) = self.state.active_overlay.take() {
            self.hide_overlay(&previous);
        }
        set_state_attr(&mut self.doc, &mut self.provenance, node, "visible", "yes");
        if !self.doc.has_attr(node, "onclick") {
            let hook = format!("hideBubble(\"{id}\");");
            graft_attr(&mut self.doc, &mut self.provenance, node, "onclick", &hook);
        }
        self.host.mark(id);
        self.state.active_overlay = Some(id.to_string());
        Ok(())
    }

    pub fn hide_overlay(&mut self, id: &str) {
        let Some(node) = self.overlays.get(id) else {
            return;
        };
        set_state_attr(&mut self.doc, &mut self.provenance, node, "visible", "");
        self.host.unmark(id);
        if self.state.active_overlay.as_deref() == Some(id) {
            self.state.active_overlay = None;
        }
    }

    /// Hide the active overlay. Returns `false` if none was shown.
    pub fn dismiss_overlay(&mut self) -> bool {
        match self.state.active_overlay.clone() {
            Some(id) => {
                self.hide_overlay(&id);
                true
            }
            None => false,
        }
    }

    // ------------------------------------------------------------------
    // View modes and widgets
    // ------------------------------------------------------------------

    /// Switch the rendering mode, keeping the current page current.
    pub fn set_view_mode(&mut self, mode: ViewMode) {
        let parked = self.state.current;
        self.deactivate(parked);
        if mode != self.state.view {
            self.state.previous_view = self.state.view;
        }
        self.state.view = mode;
        let body = self.doc.body();
        set_state_attr(&mut self.doc, &mut self.provenance, body, "view", mode.as_str());
        self.diagnostics.note(format!("View mode: {mode}"));

        if !self.registry.is_empty() {
            self.state.current = parked.min(self.registry.last());
            let current = self.state.current;
            self.activate(current);
        }
        self.render_location(Locator::Ordinal(self.state.current));
    }

    pub fn cycle_view_mode(&mut self) {
        let next = self.state.view.next();
        self.set_view_mode(next);
    }

    /// Alternate between the focus mode last used and the overview.
    pub fn flip_mode(&mut self) {
        let target = if self.state.view.is_focus() {
            ViewMode::Grid
        } else if self.state.previous_view.is_focus() {
            self.state.previous_view
        } else {
            ViewMode::Full
        };
        self.set_view_mode(target);
    }

    pub fn toggle_toolbar(&mut self) {
        self.state.widgets.toolbar = !self.state.widgets.toolbar;
    }

    pub fn toggle_console(&mut self) {
        self.state.widgets.console = !self.state.widgets.console;
    }

    /// Closing the index window drops the attached host.
    pub fn toggle_index_window(&mut self) {
        self.state.widgets.index_window = !self.state.widgets.index_window;
        if !self.state.widgets.index_window {
            self.host.detach();
        }
    }

    // ------------------------------------------------------------------
    // Keyboard
    // ------------------------------------------------------------------

    /// Dispatch one key press.
    ///
    /// In edit mode only Escape is handled (it leaves the editor). Unbound
    /// digits and letters collect into the input buffer, which Enter
    /// resolves as a page number, a command word or a location.
    pub fn handle_key(&mut self, key: Key, mods: Modifiers) -> KeyOutcome {
        if self.in_edit_mode() {
            if key == Key::Escape {
                let current = self.state.current;
                // Failures are already reported through diagnostics.
                let _ = self.toggle_editor(current);
                return KeyOutcome::Handled;
            }
            return KeyOutcome::PassThrough;
        }

        match self.commands.resolve(key, mods, self.state.view) {
            Resolution::Run(command) => {
                let _ = self.run(command);
                KeyOutcome::Handled
            }
            Resolution::PassThrough => KeyOutcome::PassThrough,
            Resolution::Unbound => self.handle_unbound(key),
        }
    }

    fn handle_unbound(&mut self, key: Key) -> KeyOutcome {
        match key {
            Key::Char(c) if c.is_ascii_digit() => self.state.input.push_digit(c),
            Key::Char(c) if c.is_alphabetic() => self.state.input.push_letter(c),
            Key::Enter => match self.state.input.take() {
                Pending::Number(digits) => {
                    self.goto(digits.parse().unwrap_or(i64::MAX));
                }
                Pending::Word(word) => {
                    let _ = match self.commands.word(&word).cloned() {
                        Some(command) => self.run(command),
                        None => self.jump_to(&word),
                    };
                }
                Pending::Empty => {}
            },
            Key::Backspace => {
                if !self.state.input.backspace() && !self.dismiss_overlay() {
                    self.goto_relative(-1);
                }
            }
            other => {
                self.diagnostics.note(format!("Unmapped key: {other:?}"));
                return KeyOutcome::PassThrough;
            }
        }
        KeyOutcome::Handled
    }

    /// Execute a command against the current page.
    pub fn run(&mut self, command: Command) -> Result<()> {
        let current = self.state.current;
        match command {
            Command::GotoRelative(delta) => {
                self.goto_relative(delta);
            }
            Command::GotoAbsolute(n) => {
                self.goto(n);
            }
            Command::GotoFirst => {
                self.goto(0);
            }
            Command::GotoLast => {
                self.goto(self.registry.last() as i64);
            }
            Command::ToggleOverlay(id) => return self.toggle_overlay(&id),
            Command::DismissOrAdvance => {
                if !self.dismiss_overlay() {
                    self.goto_relative(1);
                }
            }
            Command::CycleViewMode => self.cycle_view_mode(),
            Command::SetViewMode(mode) => self.set_view_mode(mode),
            Command::FlipMode => self.flip_mode(),
            Command::TogglePageClass => return self.toggle_page_class(current),
            Command::ToggleAllPageClasses => self.toggle_all_page_classes(),
            Command::SetAllPageClasses(class) => self.set_all_page_classes(&class),
            Command::ToggleAnnotations => self.toggle_annotations(),
            Command::ChangeFontSize(delta) => self.change_font_size(delta),
            Command::ToggleToolbar => self.toggle_toolbar(),
            Command::ToggleConsole => self.toggle_console(),
            Command::ToggleIndexWindow => self.toggle_index_window(),
            Command::ToggleEditor => return self.toggle_editor(current),
            Command::Copy => return self.copy_page(current),
            Command::Cut => return self.cut_page(current),
            Command::Paste => return self.paste_after(current),
            Command::Remove => return self.remove_page(current),
            Command::ShowSource(target) => return self.show_source(target),
            Command::Reprocess => self.reprocess_math(),
        }
        Ok(())
    }
}
