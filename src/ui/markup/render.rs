//! Renderers for the parsed assistant document.

use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};

use super::{Doc, Inline, LineKind, MarkLine};
use crate::ui::theme::Theme;

/// Render the document to the structured markup string.
///
/// Output is intended for trusted rendering of model-originated content
/// only; inline text is emitted as-is without escaping.
pub fn to_markup(doc: &Doc) -> String {
    let mut out = String::new();
    for block in &doc.blocks {
        if block.wrap {
            out.push_str("<p>");
            for (i, line) in block.lines.iter().enumerate() {
                if i > 0 {
                    out.push('\n');
                }
                out.push_str(&inline_markup(&line.spans));
            }
            out.push_str("</p>");
        } else {
            for (i, line) in block.lines.iter().enumerate() {
                // Structural lines carry their own block display; only
                // adjacent plain lines keep their newline.
                if i > 0
                    && line.kind == LineKind::Text
                    && block.lines[i - 1].kind == LineKind::Text
                {
                    out.push('\n');
                }
                out.push_str(&line_markup(line));
            }
        }
    }
    out
}

fn line_markup(line: &MarkLine) -> String {
    match &line.kind {
        LineKind::Blank => String::new(),
        LineKind::Text => inline_markup(&line.spans),
        LineKind::Heading { level } => format!(
            "<h{level} class=\"message-heading\">{}</h{level}>",
            inline_markup(&line.spans)
        ),
        LineKind::ListItem { number, level: 0 } => format!(
            "<div class=\"list-item\"><span class=\"list-number\">{number}</span>\
             <span class=\"list-text\">{}</span></div>",
            inline_markup(&line.spans)
        ),
        LineKind::ListItem { number, level } => format!(
            "<div class=\"list-item nested-list level-{level}\">\
             <span class=\"list-number\">{number}</span>\
             <span class=\"list-text\">{}</span></div>",
            inline_markup(&line.spans)
        ),
    }
}

fn inline_markup(spans: &[Inline]) -> String {
    let mut out = String::new();
    for span in spans {
        match span {
            Inline::Text(text) => out.push_str(text),
            Inline::Strong(text) => {
                out.push_str("<strong>");
                out.push_str(text);
                out.push_str("</strong>");
            }
            Inline::Em(text) => {
                out.push_str("<em>");
                out.push_str(text);
                out.push_str("</em>");
            }
            Inline::Citation(digits) => {
                out.push_str("<span class=\"citation\">[");
                out.push_str(digits);
                out.push_str("]</span>");
            }
        }
    }
    out
}

/// Render the document as themed ratatui lines for the transcript pane.
pub fn doc_to_lines(doc: &Doc, theme: &Theme) -> Vec<Line<'static>> {
    let mut out = Vec::new();
    for (i, block) in doc.blocks.iter().enumerate() {
        if i > 0 {
            out.push(Line::from(""));
        }
        for line in &block.lines {
            out.push(display_line(line, theme));
        }
    }
    out
}

fn display_line(line: &MarkLine, theme: &Theme) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    match &line.kind {
        LineKind::Heading { .. } => {
            spans.extend(inline_spans(&line.spans, theme, theme.heading));
        }
        LineKind::ListItem { number, level } => {
            let indent = "  ".repeat(*level as usize);
            if !indent.is_empty() {
                spans.push(Span::raw(indent));
            }
            spans.push(Span::styled(number.clone(), theme.list_number));
            spans.extend(inline_spans(&line.spans, theme, theme.assistant_text));
        }
        _ => spans.extend(inline_spans(&line.spans, theme, theme.assistant_text)),
    }
    Line::from(spans)
}

fn inline_spans(inlines: &[Inline], theme: &Theme, base: Style) -> Vec<Span<'static>> {
    inlines
        .iter()
        .map(|inline| match inline {
            Inline::Text(text) => Span::styled(text.clone(), base),
            Inline::Strong(text) => Span::styled(text.clone(), base.add_modifier(Modifier::BOLD)),
            Inline::Em(text) => Span::styled(text.clone(), base.add_modifier(Modifier::ITALIC)),
            Inline::Citation(digits) => Span::styled(format!("[{digits}]"), theme.citation),
        })
        .collect()
}
