//! The ordered transformation passes of the markup pipeline.
//!
//! Each pass is a pure function over the tagged line list. Line-level passes
//! (lists, headings) reclassify a line's kind and strip its markers; inline
//! passes (bold, italic, citations) split `Text` runs into tagged spans and
//! never revisit spans an earlier pass produced, which is what prevents
//! double-application.

use super::{Block, Doc, Inline, LineKind, MarkLine};

pub(crate) fn split_lines(text: &str) -> Vec<MarkLine> {
    text.split('\n')
        .map(|raw| {
            if raw.trim().is_empty() {
                MarkLine {
                    kind: LineKind::Blank,
                    spans: Vec::new(),
                    raw: raw.to_string(),
                }
            } else {
                MarkLine {
                    kind: LineKind::Text,
                    spans: vec![Inline::Text(raw.to_string())],
                    raw: raw.to_string(),
                }
            }
        })
        .collect()
}

/// Split a `"3. rest"` prefix into the literal marker and the remainder.
fn split_numbered(text: &str) -> Option<(String, String)> {
    let digits_len = text.bytes().take_while(|b| b.is_ascii_digit()).count();
    if digits_len == 0 {
        return None;
    }
    let rest = &text[digits_len..];
    let mut chars = rest.chars();
    if chars.next() != Some('.') {
        return None;
    }
    let sep = chars.next()?;
    if sep != ' ' && sep != '\t' {
        return None;
    }
    let number = format!("{}.{}", &text[..digits_len], sep);
    Some((number, rest[1 + sep.len_utf8()..].to_string()))
}

/// Pass 1: a line beginning with `<int>. ` becomes a top-level list item.
pub(crate) fn detect_list_items(lines: &mut [MarkLine]) {
    for line in lines.iter_mut() {
        if line.kind != LineKind::Text {
            continue;
        }
        let Some(Inline::Text(first)) = line.spans.first_mut() else {
            continue;
        };
        let Some((number, rest)) = split_numbered(first) else {
            continue;
        };
        if rest.is_empty() {
            continue;
        }
        *first = rest;
        line.kind = LineKind::ListItem { number, level: 0 };
    }
}

/// Pass 2: `**bold**` runs become strong spans.
pub(crate) fn apply_strong_spans(lines: &mut [MarkLine]) {
    map_text_spans(lines, split_strong);
}

/// Pass 3: single-asterisk `*italic*` runs (never part of a double marker)
/// become emphasis spans.
pub(crate) fn apply_em_spans(lines: &mut [MarkLine]) {
    map_text_spans(lines, split_em);
}

/// Pass 4: a line starting with `#` markers and whitespace becomes a
/// heading; the level is the marker count capped at 6.
pub(crate) fn detect_headings(lines: &mut [MarkLine]) {
    for line in lines.iter_mut() {
        if line.kind != LineKind::Text {
            continue;
        }
        let has_tail_spans = line.spans.len() > 1;
        let Some(Inline::Text(first)) = line.spans.first_mut() else {
            continue;
        };
        let hashes = first.bytes().take_while(|b| *b == b'#').count();
        if hashes == 0 {
            continue;
        }
        let after = &first[hashes..];
        let trimmed = after.trim_start();
        if trimmed.len() == after.len() {
            // Markers must be followed by whitespace.
            continue;
        }
        if trimmed.is_empty() && !has_tail_spans {
            // A bare marker line with no content is not a heading.
            continue;
        }
        *first = trimmed.to_string();
        if first.is_empty() {
            line.spans.remove(0);
        }
        line.kind = LineKind::Heading {
            level: hashes.min(6) as u8,
        };
    }
}

/// Pass 5: a bracketed integer like `[3]` becomes a citation span.
pub(crate) fn apply_citations(lines: &mut [MarkLine]) {
    map_text_spans(lines, split_citations);
}

/// Pass 6: an indented (>= 2 leading spaces) numbered line becomes a nested
/// list item with level = floor(indent / 2), capped at 3.
pub(crate) fn detect_nested_list_items(lines: &mut [MarkLine]) {
    for line in lines.iter_mut() {
        if line.kind != LineKind::Text {
            continue;
        }
        let has_tail_spans = line.spans.len() > 1;
        let Some(Inline::Text(first)) = line.spans.first_mut() else {
            continue;
        };
        let indent = first
            .bytes()
            .take_while(|b| *b == b' ' || *b == b'\t')
            .count();
        if indent < 2 {
            continue;
        }
        let Some((number, rest)) = split_numbered(&first[indent..]) else {
            continue;
        };
        if rest.is_empty() && !has_tail_spans {
            continue;
        }
        *first = rest;
        if first.is_empty() {
            line.spans.remove(0);
        }
        line.kind = LineKind::ListItem {
            number,
            level: (indent / 2).min(3) as u8,
        };
    }
}

/// Pass 7: group lines into blocks on blank-line separators. Blocks that
/// contain structural lines, or whose source already carries structural
/// markup, are left unwrapped.
pub(crate) fn group_paragraphs(lines: Vec<MarkLine>) -> Doc {
    let mut blocks = Vec::new();
    let mut current: Vec<MarkLine> = Vec::new();
    for line in lines {
        if line.kind == LineKind::Blank {
            flush_block(&mut blocks, &mut current);
        } else {
            current.push(line);
        }
    }
    flush_block(&mut blocks, &mut current);
    Doc { blocks }
}

fn flush_block(blocks: &mut Vec<Block>, current: &mut Vec<MarkLine>) {
    if current.is_empty() {
        return;
    }
    let lines = std::mem::take(current);
    let structural = lines.iter().any(|l| l.kind != LineKind::Text)
        || lines.iter().any(|l| contains_markup(&l.raw));
    blocks.push(Block {
        wrap: !structural,
        lines,
    });
}

/// Source text that already carries structural tags is never wrapped again.
/// Recognizing a prior `<p>` here is what keeps the full pipeline idempotent
/// on its own output.
fn contains_markup(raw: &str) -> bool {
    raw.contains("<div class=\"list-item")
        || raw.contains("<h")
        || raw.contains("<ul")
        || raw.contains("<ol")
        || raw.contains("<p>")
}

fn map_text_spans(lines: &mut [MarkLine], split: impl Fn(&str) -> Vec<Inline>) {
    for line in lines.iter_mut() {
        if line.spans.is_empty() {
            continue;
        }
        let spans = std::mem::take(&mut line.spans);
        let mut out = Vec::with_capacity(spans.len());
        for span in spans {
            match span {
                Inline::Text(text) => out.extend(split(&text)),
                other => out.push(other),
            }
        }
        line.spans = out;
    }
}

fn split_strong(text: &str) -> Vec<Inline> {
    let mut out = Vec::new();
    let mut plain = String::new();
    let mut rest = text;
    while let Some(open) = rest.find("**") {
        let after = &rest[open + 2..];
        // The inner run must be non-empty and free of asterisks.
        match after.find('*') {
            Some(close) if close > 0 && after[close..].starts_with("**") => {
                plain.push_str(&rest[..open]);
                if !plain.is_empty() {
                    out.push(Inline::Text(std::mem::take(&mut plain)));
                }
                out.push(Inline::Strong(after[..close].to_string()));
                rest = &after[close + 2..];
            }
            _ => {
                // No closing marker; keep the literal text and move on.
                plain.push_str(&rest[..open + 2]);
                rest = after;
            }
        }
    }
    plain.push_str(rest);
    if !plain.is_empty() {
        out.push(Inline::Text(plain));
    }
    out
}

fn split_em(text: &str) -> Vec<Inline> {
    let bytes = text.as_bytes();
    let mut out = Vec::new();
    let mut plain_start = 0;
    let mut i = 0;
    while i < bytes.len() {
        let single_opener = bytes[i] == b'*'
            && (i == 0 || bytes[i - 1] != b'*')
            && bytes.get(i + 1).copied() != Some(b'*');
        if single_opener {
            if let Some(close_rel) = text[i + 1..].find('*') {
                let close = i + 1 + close_rel;
                if close > i + 1 && bytes.get(close + 1).copied() != Some(b'*') {
                    if plain_start < i {
                        out.push(Inline::Text(text[plain_start..i].to_string()));
                    }
                    out.push(Inline::Em(text[i + 1..close].to_string()));
                    i = close + 1;
                    plain_start = i;
                    continue;
                }
            }
        }
        i += 1;
    }
    if plain_start < bytes.len() {
        out.push(Inline::Text(text[plain_start..].to_string()));
    }
    out
}

fn split_citations(text: &str) -> Vec<Inline> {
    let bytes = text.as_bytes();
    let mut out = Vec::new();
    let mut plain_start = 0;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'[' {
            let digits_len = bytes[i + 1..]
                .iter()
                .take_while(|b| b.is_ascii_digit())
                .count();
            if digits_len > 0 && bytes.get(i + 1 + digits_len).copied() == Some(b']') {
                if plain_start < i {
                    out.push(Inline::Text(text[plain_start..i].to_string()));
                }
                out.push(Inline::Citation(text[i + 1..i + 1 + digits_len].to_string()));
                i += digits_len + 2;
                plain_start = i;
                continue;
            }
        }
        i += 1;
    }
    if plain_start < bytes.len() {
        out.push(Inline::Text(text[plain_start..].to_string()));
    }
    out
}
