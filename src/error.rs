//! Error types for slidedeck operations.

use thiserror::Error;

/// Errors that can occur while loading or driving a deck.
///
/// Loading errors (`Io`, `Xml`, `Utf8`, `InvalidDeck`) are returned to the
/// caller before a [`Deck`](crate::Deck) exists. The remaining variants are
/// reported by deck operations that leave the deck state unchanged.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("UTF-8 decoding error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("Invalid deck: {0}")]
    InvalidDeck(String),

    #[error("No such location: {0}")]
    NotFound(String),

    #[error("Clipboard is empty")]
    ClipboardEmpty,

    #[error("Unknown session setting: {0}")]
    UnknownSetting(String),

    #[error("Invalid edit: {0}")]
    InvalidEdit(String),
}

pub type Result<T> = std::result::Result<T, Error>;
