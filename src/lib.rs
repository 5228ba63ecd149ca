//! # slidedeck
//!
//! Document synchronization and export core for markup slide decks.
//!
//! ## Features
//!
//! - Live document model with a provenance side table, so bookkeeping ids,
//!   wrappers and state attributes never leak into exported markup
//! - Restartable location strings: current page plus sticky session settings
//! - Export of any subtree as canonical markup, highlighted markup or LaTeX
//! - Navigation, overlays, clipboard editing and page class toggling
//!
//! ## Quick Start
//!
//! ```
//! use slidedeck::{Deck, Target};
//!
//! let mut deck = Deck::open_str(concat!(
//!     "<body>",
//!     "<page key='intro'><h1>Hello</h1></page>",
//!     "<page key='end'><h1>Bye</h1></page>",
//!     "</body>"
//! ))
//! .unwrap();
//!
//! deck.start("#end?view=grid").unwrap();
//! assert_eq!(deck.current(), 1);
//! assert_eq!(deck.location(), "#end?view=grid");
//!
//! deck.goto(0);
//! assert_eq!(deck.location(), "#0?view=grid");
//!
//! let page = deck.current_page().unwrap();
//! let markup = slidedeck::serialize(&deck.doc, &deck.provenance, page, Target::Markup);
//! assert_eq!(markup, "<page key=\"intro\"><h1>Hello</h1></page>");
//! ```

pub mod config;
pub mod deck;
pub mod diagnostics;
pub mod dom;
pub mod error;
pub mod export;
pub mod math;
pub mod nav;
pub mod overlay;
pub mod pages;
pub mod provenance;
pub mod resources;
pub mod schedule;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use config::{AccessMode, DeckConfig};
pub use deck::{Deck, Indicator, KeyOutcome};
pub use diagnostics::{Diagnostic, DiagnosticLog};
pub use dom::{Document, NodeId, parse_document};
pub use error::{Error, Result};
pub use export::{Target, serialize, serialize_document};
pub use nav::ViewMode;
pub use nav::location::{Location, Locator, Setting};
