//! WASM bindings for in-browser export.
//!
//! Exposes deck export and location resolution to JavaScript via
//! wasm-bindgen.

use wasm_bindgen::prelude::*;

use crate::{Deck, Target, serialize_document};

/// Initialize panic hook for better error messages in the browser console.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

fn to_js(e: crate::Error) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Render a whole deck as `markup`, `highlight` or `latex`.
#[wasm_bindgen]
pub fn export_deck(markup: &str, target: &str) -> Result<String, JsValue> {
    let target = Target::parse(target)
        .ok_or_else(|| JsValue::from_str(&format!("unknown target: {target}")))?;
    let deck = Deck::open_str(markup).map_err(to_js)?;
    Ok(serialize_document(&deck.doc, &deck.provenance, target))
}

/// Start a deck at `hash` and return the canonical location string.
#[wasm_bindgen]
pub fn resolve_location(markup: &str, hash: &str) -> Result<String, JsValue> {
    let mut deck = Deck::open_str(markup).map_err(to_js)?;
    deck.start(hash).map_err(to_js)?;
    Ok(deck.location().to_string())
}
