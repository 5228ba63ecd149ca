//! Escaping policies shared by the markup renderings.

use std::borrow::Cow;

/// Escape a text run for markup: `&`, `<`, `>` and no-break spaces.
pub fn escape_text(s: &str) -> Cow<'_, str> {
    if !s.contains(['&', '<', '>', '\u{a0}']) {
        return Cow::Borrowed(s);
    }
    let mut result = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '\u{a0}' => result.push_str("&nbsp;"),
            _ => result.push(c),
        }
    }
    Cow::Owned(result)
}

/// Quote an attribute value.
///
/// Double quotes are used unless the value contains one, in which case
/// single quotes are used. A value holding both kinds is double-quoted with
/// `&quot;` for its double quotes.
pub fn quote_attr(value: &str) -> String {
    let mut result = String::with_capacity(value.len() + 2);
    let has_double = value.contains('"');
    let quote = if has_double && !value.contains('\'') {
        '\''
    } else {
        '"'
    };
    result.push(quote);
    for c in value.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '"' if quote == '"' => result.push_str("&quot;"),
            _ => result.push(c),
        }
    }
    result.push(quote);
    result
}

/// Keep runs of spaces visible: every run of `n >= 2` spaces becomes
/// `n - 1` `&nbsp;` followed by one plain space.
pub fn preserve_spaces(s: &str) -> Cow<'_, str> {
    if !s.contains("  ") {
        return Cow::Borrowed(s);
    }
    let mut result = String::with_capacity(s.len() + 16);
    let mut run = 0usize;
    for c in s.chars() {
        if c == ' ' {
            run += 1;
            continue;
        }
        flush_spaces(&mut result, run);
        run = 0;
        result.push(c);
    }
    flush_spaces(&mut result, run);
    Cow::Owned(result)
}

fn flush_spaces(out: &mut String, run: usize) {
    if run == 0 {
        return;
    }
    for _ in 1..run {
        out.push_str("&nbsp;");
    }
    out.push(' ');
}
