//! Canonical markup rendering.

use super::escape::{escape_text, quote_attr};
use super::{ElementView, Flow, Frame, Rules, is_raw_text, is_void};
use crate::dom::Document;
use crate::math::FormulaKind;

pub(crate) struct Markup;

impl Rules for Markup {
    fn text(&mut self, out: &mut String, text: &str, flow: Flow) {
        if flow.raw {
            out.push_str(text);
        } else {
            out.push_str(&escape_text(text));
        }
    }

    fn comment(&mut self, out: &mut String, text: &str) {
        out.push_str("<!--");
        out.push_str(text);
        out.push_str("-->");
    }

    fn formula(&mut self, out: &mut String, kind: FormulaKind, source: &str, flow: Flow) {
        let (open, close) = kind.delimiters();
        out.push_str(open);
        self.text(out, source, flow);
        out.push_str(close);
    }

    fn open(&mut self, out: &mut String, _doc: &Document, el: &ElementView<'_>, flow: Flow) -> Frame {
        let mut suffix = String::new();
        if el.emit_tag {
            out.push('<');
            out.push_str(el.tag);
            for attr in &el.attrs {
                out.push(' ');
                out.push_str(&attr.name);
                out.push('=');
                out.push_str(&quote_attr(&attr.value));
            }
            out.push('>');
            if !is_void(el.tag) {
                suffix = format!("</{}>", el.tag);
            }
        }
        Frame {
            flow: Flow {
                raw: flow.raw || is_raw_text(el.tag),
                ..flow
            },
            expand: el.expand,
            skip_blank_first: false,
            suffix,
        }
    }
}
