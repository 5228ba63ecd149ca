//! Navigation state.
//!
//! All session state of a running deck lives in one [`NavigationState`]
//! value owned by the [`Deck`](crate::Deck). Transitions are methods on the
//! deck that read and write this value; there is no ambient global state.

pub mod commands;
pub mod location;

use std::fmt;

#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

use crate::dom::NodeId;
use crate::export::Target;
use commands::InputBuffer;
use location::{Location, Locator, SessionSettings};

/// Rendering mode of the deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "cli", derive(Serialize, Deserialize))]
pub enum ViewMode {
    /// One page fills the screen.
    #[default]
    #[cfg_attr(feature = "cli", serde(rename = "full"))]
    Full,
    /// Pages scroll vertically.
    #[cfg_attr(feature = "cli", serde(rename = "flow"))]
    Flow,
    /// Two pages side by side.
    #[cfg_attr(feature = "cli", serde(rename = "2up"))]
    TwoUp,
    /// Overview of all pages.
    #[cfg_attr(feature = "cli", serde(rename = "grid"))]
    Grid,
}

impl ViewMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ViewMode::Full => "full",
            ViewMode::Flow => "flow",
            ViewMode::TwoUp => "2up",
            ViewMode::Grid => "grid",
        }
    }

    pub fn parse(s: &str) -> Option<ViewMode> {
        match s {
            "full" => Some(ViewMode::Full),
            "flow" => Some(ViewMode::Flow),
            "2up" => Some(ViewMode::TwoUp),
            "grid" => Some(ViewMode::Grid),
            _ => None,
        }
    }

    /// Focus modes show pages at reading size; grid is the overview.
    pub fn is_focus(self) -> bool {
        !matches!(self, ViewMode::Grid)
    }

    /// Next mode in the full, flow, 2up, grid cycle.
    pub fn next(self) -> ViewMode {
        match self {
            ViewMode::Full => ViewMode::Flow,
            ViewMode::Flow => ViewMode::TwoUp,
            ViewMode::TwoUp => ViewMode::Grid,
            ViewMode::Grid => ViewMode::Full,
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Visibility of the auxiliary widgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Widgets {
    pub toolbar: bool,
    pub console: bool,
    pub index_window: bool,
    /// Whether `ann` annotations are shown.
    pub annotations: bool,
    /// Base font size of the screen view, in percent.
    pub font_size: u32,
}

impl Default for Widgets {
    fn default() -> Self {
        Self {
            toolbar: true,
            console: false,
            index_window: false,
            annotations: true,
            font_size: 100,
        }
    }
}

/// Ephemeral user-facing message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusLine {
    pub text: String,
    pub visible: bool,
}

impl StatusLine {
    pub fn set(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.visible = true;
    }

    /// Hide whatever message is showing.
    pub fn clear(&mut self) {
        self.visible = false;
    }

    /// The message, if it is showing.
    pub fn current(&self) -> Option<&str> {
        self.visible.then_some(self.text.as_str())
    }
}

/// Contents of the source view overlay.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourcePanel {
    /// Node whose source is shown, with the rendering used.
    pub subject: Option<(NodeId, Target)>,
    pub text: String,
}

/// The whole session state of a deck.
#[derive(Debug, Clone, Default)]
pub struct NavigationState {
    /// Current page ordinal.
    pub current: usize,
    /// Overlay shown through the toggle discipline.
    pub active_overlay: Option<String>,
    pub view: ViewMode,
    /// Focus mode to return to from the overview.
    pub previous_view: ViewMode,
    /// Detached clone of the last copied or cut page.
    pub clipboard: Option<NodeId>,
    pub settings: SessionSettings,
    /// Last location string written by the deck.
    pub location: String,
    /// Last location acted upon, for change de-duplication.
    pub last_applied: Option<Location>,
    /// Last value seen by the location poll.
    pub seen_location: String,
    pub input: InputBuffer,
    pub widgets: Widgets,
    pub lang: Option<String>,
    pub status: StatusLine,
    pub source: SourcePanel,
}

impl NavigationState {
    pub fn new(view: ViewMode, lang: Option<String>, toolbar: bool) -> Self {
        Self {
            view,
            previous_view: view,
            lang,
            widgets: Widgets {
                toolbar,
                ..Widgets::default()
            },
            ..Self::default()
        }
    }

    /// The current position as a locator.
    pub fn locator(&self) -> Locator {
        Locator::Ordinal(self.current)
    }
}
