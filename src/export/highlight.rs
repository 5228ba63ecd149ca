//! Syntax-highlighted markup rendering.
//!
//! Produces markup that, when displayed, shows the canonical source with
//! every token wrapped in a classed `span`. List- and table-like elements
//! get an indent block; a whitespace-only first child inside such a block is
//! dropped, which can hide authored whitespace.

use super::escape::{escape_text, preserve_spaces, quote_attr};
use super::{ElementView, Flow, Frame, Rules, is_raw_text, is_void};
use crate::dom::Document;
use crate::math::FormulaKind;

pub(crate) struct Highlight;

fn indents(tag: &str) -> bool {
    matches!(
        tag,
        "ul" | "table" | "tr" | "ol" | "center" | "svg" | "g" | "dl" | "fieldset" | "div" | "blockquote"
    )
}

fn push_text_line(out: &mut String, line: &str, flow: Flow) {
    let escaped = if flow.raw {
        escape_text(line).into_owned()
    } else {
        escape_text(&escape_text(line)).into_owned()
    };
    out.push_str("<span class=\"text\">");
    if flow.preserve {
        out.push_str(&preserve_spaces(&escaped));
    } else {
        out.push_str(&escaped);
    }
    out.push_str("</span>");
}

impl Rules for Highlight {
    fn text(&mut self, out: &mut String, text: &str, flow: Flow) {
        let mut lines: Vec<&str> = text.split('\n').collect();
        if flow.suppress_newline && lines.len() > 1 && lines[0].is_empty() {
            lines.remove(0);
        }
        for (i, line) in lines.iter().enumerate() {
            if i > 0 {
                out.push_str("<br>");
            }
            push_text_line(out, line, flow);
        }
    }

    fn comment(&mut self, out: &mut String, text: &str) {
        out.push_str("<span class=\"cmt\">&lt;!--</span><span class=\"in_cmt\">");
        out.push_str(&escape_text(text));
        out.push_str("</span><span class=\"cmt\">--&gt;</span>");
    }

    fn formula(&mut self, out: &mut String, kind: FormulaKind, source: &str, _flow: Flow) {
        let (open, close) = kind.delimiters();
        out.push_str("<span class=\"mj_delim\">");
        out.push_str(open);
        out.push_str("</span><span class=\"mj\">");
        match kind {
            FormulaKind::Inline => out.push_str(&escape_text(source)),
            FormulaKind::Display => {
                for (i, line) in source.split('\n').enumerate() {
                    if i > 0 {
                        out.push_str("<br>");
                    }
                    let line = escape_text(line);
                    match line.find(" %") {
                        Some(at) => {
                            out.push_str(&line[..at]);
                            out.push_str("<span class=\"dim\">");
                            out.push_str(&line[at..]);
                            out.push_str("</span>");
                        }
                        None => out.push_str(&line),
                    }
                }
            }
        }
        out.push_str("</span><span class=\"mj_delim\">");
        out.push_str(close);
        out.push_str("</span>");
    }

    fn open(&mut self, out: &mut String, _doc: &Document, el: &ElementView<'_>, flow: Flow) -> Frame {
        let tag = el.tag;
        if el.emit_tag {
            out.push_str("<span class=\"tag\">&lt;<span class=\"name tag_");
            out.push_str(tag);
            out.push_str("\">");
            out.push_str(tag);
            out.push_str("</span>");
            for attr in &el.attrs {
                out.push_str(" <span class=\"attr\">");
                out.push_str(&escape_text(&attr.name));
                out.push_str("</span>=<span class=\"value\">");
                out.push_str(&escape_text(&quote_attr(&attr.value)));
                out.push_str("</span>");
            }
            out.push_str("&gt;</span>");
        }

        let indent = el.emit_tag && indents(tag);
        let child_flow = if is_raw_text(tag) {
            Flow {
                raw: true,
                preserve: true,
                suppress_newline: false,
            }
        } else if tag == "pre" {
            Flow {
                raw: flow.raw,
                preserve: true,
                suppress_newline: false,
            }
        } else {
            Flow {
                raw: flow.raw,
                preserve: false,
                suppress_newline: flow.suppress_newline || matches!(tag, "div" | "blockquote"),
            }
        };

        let mut suffix = String::new();
        let wrap_children = el.expand && el.emit_tag;
        if wrap_children {
            out.push_str("<span class=\"in_");
            out.push_str(tag);
            out.push_str("\">");
            if indent {
                out.push_str("<div class=\"indent\">");
                suffix.push_str("</div>");
            }
            suffix.push_str("</span>");
        }
        if el.emit_tag && !is_void(tag) {
            suffix.push_str("<span class=\"tag\">&lt;/<span class=\"name tag_");
            suffix.push_str(tag);
            suffix.push_str("\">");
            suffix.push_str(tag);
            suffix.push_str("</span>&gt;</span>");
        }

        Frame {
            flow: child_flow,
            expand: el.expand,
            skip_blank_first: wrap_children && indent,
            suffix,
        }
    }
}
