//! Rendering pipeline for assistant-authored replies.
//!
//! Assistant text arrives in a constrained markdown-like dialect: numbered
//! lists (optionally indented for nesting), `**bold**` and `*italic*` spans,
//! `#` headings, and bracketed-integer citations like `[3]`. The pipeline
//! runs a fixed sequence of passes over a tagged line list, then groups
//! lines into blocks on blank-line separators. Pass order matters: list
//! detection precedes the inline passes, and paragraph grouping runs last so
//! it can leave structural blocks unwrapped.
//!
//! Two renderers consume the parsed document: [`render::to_markup`] emits
//! the markup string used by structured display surfaces, and
//! [`render::doc_to_lines`] produces ratatui lines for the transcript.
//!
//! The pipeline is applied to model-originated content only. User-authored
//! text is displayed verbatim and never passes through here, and no escaping
//! of arbitrary input is performed; an untrusted source would need a
//! sanitization stage in front of this module.

pub mod passes;
pub mod render;

#[cfg(test)]
mod tests;

pub use render::doc_to_lines;

/// An inline run within one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Inline {
    Text(String),
    Strong(String),
    Em(String),
    /// Bracketed-integer citation; carries the digits only.
    Citation(String),
}

/// Structural classification of one source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LineKind {
    Blank,
    Text,
    /// Numbered list entry. `number` keeps the literal marker ("3. ");
    /// `level` 0 is a top-level item, 1..=3 are nesting depths.
    ListItem { number: String, level: u8 },
    /// Heading with level 1..=6.
    Heading { level: u8 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MarkLine {
    pub(crate) kind: LineKind,
    pub(crate) spans: Vec<Inline>,
    /// Original source text, used by the paragraph pass to recognize
    /// already-structural content.
    pub(crate) raw: String,
}

/// A blank-line-delimited block. `wrap` marks blocks that the markup
/// renderer encloses in a paragraph container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub(crate) lines: Vec<MarkLine>,
    pub(crate) wrap: bool,
}

/// Parsed assistant reply: an ordered list of tagged blocks.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Doc {
    pub(crate) blocks: Vec<Block>,
}

/// Run the full pass sequence over one assistant reply.
pub fn parse_assistant_text(text: &str) -> Doc {
    let mut lines = passes::split_lines(text);
    passes::detect_list_items(&mut lines);
    passes::apply_strong_spans(&mut lines);
    passes::apply_em_spans(&mut lines);
    passes::detect_headings(&mut lines);
    passes::apply_citations(&mut lines);
    passes::detect_nested_list_items(&mut lines);
    passes::group_paragraphs(lines)
}

/// Parse and render to the structured markup string in one step.
pub fn render_assistant_markup(text: &str) -> String {
    render::to_markup(&parse_assistant_text(text))
}
