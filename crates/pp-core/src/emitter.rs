//! Emitter: board subtree → HTML.
//!
//! Produces the same structure the wasm bridge mounts element by element, so
//! a page can also be rendered statically. Role classes are emitted exactly
//! as [`crate::model::class`] names them.

use crate::model::*;
use petgraph::graph::NodeIndex;
use std::fmt::Write;

/// Escape text for use in HTML content or a quoted attribute.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Display form of fragment code: escaped, each tab shown as `tab_width`
/// non-breaking spaces. The stored code is never changed.
pub fn display_html(code: &str, tab_width: usize) -> String {
    escape_html(code).replace('\t', &"&nbsp;".repeat(tab_width))
}

/// Emit `idx` and everything below it. The page root emits only its children.
#[must_use]
pub fn emit_html(board: &Board, idx: NodeIndex, tab_width: usize) -> String {
    let mut out = String::with_capacity(1024);
    emit_element(&mut out, board, idx, tab_width);
    out
}

fn emit_element(out: &mut String, board: &Board, idx: NodeIndex, tab_width: usize) {
    let Some(element) = board.get(idx) else {
        return;
    };
    if matches!(element.kind, ElementKind::Page) {
        emit_children(out, board, idx, tab_width);
        return;
    }

    let tag = element.tag();
    let _ = write!(out, "<{tag} data-pp-id=\"{}\"", escape_html(element.id.as_str()));
    let classes = element.classes();
    if !classes.is_empty() {
        let _ = write!(out, " class=\"{}\"", classes.join(" "));
    }
    if let Some(opacity) = element.opacity {
        let _ = write!(out, " style=\"opacity: {opacity}\"");
    }

    match &element.kind {
        ElementKind::EvalButton { label } => {
            // Void element: no content, no closing tag.
            let _ = write!(out, " type=\"button\" value=\"{}\">", escape_html(label));
            return;
        }
        ElementKind::Fragment { .. } => out.push_str(" draggable=\"true\">"),
        _ => out.push('>'),
    }

    emit_content(out, &element.kind, tab_width);
    emit_children(out, board, idx, tab_width);
    let _ = write!(out, "</{tag}>");
}

fn emit_children(out: &mut String, board: &Board, idx: NodeIndex, tab_width: usize) {
    for &child in board.children(idx) {
        emit_element(out, board, child, tab_width);
    }
}

fn emit_content(out: &mut String, kind: &ElementKind, tab_width: usize) {
    match kind {
        ElementKind::Fragment { code } => out.push_str(&display_html(code, tab_width)),
        // Never completely empty, so it keeps its height and stays droppable.
        ElementKind::Slot => out.push_str("&nbsp;"),
        // Instructions are authored HTML.
        ElementKind::Instructions { html } => out.push_str(html),
        ElementKind::Indicator { text, .. } | ElementKind::Note { text } => {
            out.push_str(&escape_html(text))
        }
        ElementKind::TestEntry {
            label,
            expression,
            expected,
            value,
        } => {
            out.push_str("<span class=\"test_status\"></span>");
            let _ = write!(out, "<span class=\"test_label\">{label}</span>");
            out.push_str("<span class=\"field_label\">Expression:</span>");
            let _ = write!(
                out,
                "<code class=\"test_expr test_code\">{}</code>",
                escape_html(expression)
            );
            out.push_str("<span class=\"field_label\">Value:</span>");
            let _ = write!(
                out,
                "<code class=\"test_value test_code\">{}</code>",
                escape_html(value)
            );
            out.push_str("<span class=\"field_label\">Expected:</span>");
            let _ = write!(
                out,
                "<code class=\"test_expected test_code\">{}</code>",
                escape_html(expected)
            );
        }
        ElementKind::ErrorNote(note) => emit_error_note(out, note, tab_width),
        _ => {}
    }
}

fn emit_error_note(out: &mut String, note: &ErrorNote, tab_width: usize) {
    let _ = write!(out, "<summary>{}</summary>", escape_html(&note.summary));
    out.push_str(&escape_html(&note.message));
    if let Some(excerpt) = &note.excerpt {
        let lead = if note.caret.is_some() {
            "The error was detected at this point:"
        } else {
            "The error was detected on this line:"
        };
        let _ = write!(out, "\n{lead}<pre class=\"syntax-error-description\"><code>");
        out.push_str(&display_html(excerpt, tab_width));
        out.push_str("</code>");
        if let Some(col) = note.caret {
            let _ = write!(out, "<span><br/>{}^</span>", "&nbsp;".repeat(col));
        }
        out.push_str("</pre>");
    }
}
