//! LaTeX approximation of deck markup.
//!
//! Each element maps to a prefix and suffix; children are visited unless the
//! mapping says otherwise. Text is copied verbatim. Unknown elements are
//! bracketed by commented markers so no content disappears silently.

use super::{ElementView, Flow, Frame, Rules};
use crate::dom::Document;
use crate::math::FormulaKind;
use crate::pages::PAGE_TAG;

pub(crate) struct Typeset;

fn wrap(pre: impl Into<String>, post: impl Into<String>) -> (String, String, bool) {
    (pre.into(), post.into(), true)
}

fn leaf(pre: impl Into<String>, post: impl Into<String>) -> (String, String, bool) {
    (pre.into(), post.into(), false)
}

fn env(name: &str) -> (String, String, bool) {
    wrap(format!("\\begin{{{name}}}\n"), format!("\\end{{{name}}}\n"))
}

/// `(prefix, suffix, expand)` for a kept element.
fn rule(el: &ElementView<'_>) -> (String, String, bool) {
    match el.tag {
        "style" | "script" => leaf("", ""),
        "table" => wrap("\\begin{tabular}{?}\n", "\\end{tabular}\n"),
        "td" | "th" => wrap(" & ", ""),
        "tr" => wrap("", " \\\\\n"),
        "b" | "strong" => wrap("\\textbf{", "}"),
        "i" => wrap("\\textit{", "}"),
        "tt" | "code" => wrap("\\texttt{", "}"),
        "em" => wrap("\\emph{", "}"),
        "hl" => wrap("\\hl{", "}"),
        "li" => wrap("\\item{", "}"),
        "sub" => wrap("$_{", "}$"),
        "sup" => wrap("$^{", "}$"),
        "h1" | "h2" => wrap("\\heading{", format!("}} % {}", el.tag)),
        "span" | "tbody" | "colgroup" | "col" => wrap("", ""),
        "br" => leaf("", ""),
        "img" => {
            let src = el.attr("src").unwrap_or_default();
            leaf(format!("\\includegraphics{{{src}"), "}")
        }
        "hbr" => leaf("\\\\\n", "\\medskip\n"),
        "a" => match el.attr("href") {
            Some(href) => wrap(format!("\\href{{{href}}}{{"), "}"),
            None => wrap("", ""),
        },
        "cite" => {
            let reference = el.attr("ref").unwrap_or_default();
            leaf(format!("\\citet{{{reference}}}"), "")
        }
        PAGE_TAG => {
            let label = el
                .attr("key")
                .and_then(|key| key.split_whitespace().next())
                .map(|key| format!("\\label{{sl:{key}}}\n"))
                .unwrap_or_else(|| "\n".to_string());
            wrap(format!("\\begin{{slide}}{label}"), "\\end{slide}\n")
        }
        "ul" => env("itemize"),
        "ol" => env("enumerate"),
        "div" | "center" => env(el.tag),
        other => wrap(
            format!("% \\beginHTML{{{other}}}\n"),
            format!("% \\endHTML{{{other}}}\n"),
        ),
    }
}

impl Rules for Typeset {
    fn text(&mut self, out: &mut String, text: &str, _flow: Flow) {
        out.push_str(text);
    }

    fn comment(&mut self, out: &mut String, text: &str) {
        out.push_str("% ");
        out.push_str(text);
        out.push('\n');
    }

    fn formula(&mut self, out: &mut String, kind: FormulaKind, source: &str, _flow: Flow) {
        match kind {
            FormulaKind::Display => {
                out.push_str("\\begin{displaymath}\n");
                out.push_str(source);
                out.push_str("\n\\end{displaymath}\n");
            }
            FormulaKind::Inline => {
                out.push('$');
                out.push_str(source);
                out.push('$');
            }
        }
    }

    fn open(&mut self, out: &mut String, _doc: &Document, el: &ElementView<'_>, flow: Flow) -> Frame {
        if !el.emit_tag {
            return Frame {
                flow,
                expand: el.expand,
                skip_blank_first: false,
                suffix: String::new(),
            };
        }
        let (pre, post, expand) = rule(el);
        out.push_str(&pre);
        Frame {
            flow,
            expand: expand && el.expand,
            skip_blank_first: false,
            suffix: post,
        }
    }
}
