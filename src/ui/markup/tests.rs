use super::passes::{
    apply_citations, apply_em_spans, apply_strong_spans, detect_headings, detect_list_items,
    detect_nested_list_items, split_lines,
};
use super::{render_assistant_markup, Inline, LineKind};

#[test]
fn numbered_items_with_bold_and_citation_render_as_list_blocks() {
    let markup = render_assistant_markup("1. First **bold** idea\n\n2. Second idea [1]");
    assert_eq!(
        markup,
        "<div class=\"list-item\"><span class=\"list-number\">1. </span>\
         <span class=\"list-text\">First <strong>bold</strong> idea</span></div>\
         <div class=\"list-item\"><span class=\"list-number\">2. </span>\
         <span class=\"list-text\">Second idea <span class=\"citation\">[1]</span></span></div>"
    );
}

#[test]
fn plain_paragraph_is_wrapped_exactly_once() {
    let first = render_assistant_markup("Just a plain thought.");
    assert_eq!(first, "<p>Just a plain thought.</p>");
    // Re-running the full pipeline on its own output is a no-op.
    let second = render_assistant_markup(&first);
    assert_eq!(second, first);
}

#[test]
fn paragraphs_split_on_blank_lines() {
    let markup = render_assistant_markup("First thought.\n\nSecond thought.");
    assert_eq!(markup, "<p>First thought.</p><p>Second thought.</p>");
}

#[test]
fn multi_line_paragraph_keeps_inner_newlines() {
    let markup = render_assistant_markup("line one\nline two");
    assert_eq!(markup, "<p>line one\nline two</p>");
}

#[test]
fn empty_input_renders_nothing() {
    assert_eq!(render_assistant_markup(""), "");
    assert_eq!(render_assistant_markup("\n\n  \n"), "");
}

#[test]
fn headings_cap_at_level_six_and_consume_markers() {
    let markup = render_assistant_markup("### Summary");
    assert_eq!(markup, "<h3 class=\"message-heading\">Summary</h3>");

    let markup = render_assistant_markup("######## Deep");
    assert_eq!(markup, "<h6 class=\"message-heading\">Deep</h6>");
}

#[test]
fn marker_without_whitespace_is_not_a_heading() {
    let markup = render_assistant_markup("#hashtag");
    assert_eq!(markup, "<p>#hashtag</p>");
}

#[test]
fn nested_items_scale_with_indentation_and_cap_at_three() {
    let mut lines = split_lines("  1. two spaces\n      2. six spaces\n          3. ten spaces");
    detect_list_items(&mut lines);
    detect_nested_list_items(&mut lines);

    let levels: Vec<u8> = lines
        .iter()
        .map(|l| match &l.kind {
            LineKind::ListItem { level, .. } => *level,
            other => panic!("expected list item, got {other:?}"),
        })
        .collect();
    assert_eq!(levels, vec![1, 3, 3]);
}

#[test]
fn nested_item_markup_carries_its_level_class() {
    let markup = render_assistant_markup("  1. nested point");
    assert_eq!(
        markup,
        "<div class=\"list-item nested-list level-1\">\
         <span class=\"list-number\">1. </span>\
         <span class=\"list-text\">nested point</span></div>"
    );
}

#[test]
fn italic_spans_do_not_match_double_markers() {
    let mut lines = split_lines("keep **that** but *this* is italic");
    apply_strong_spans(&mut lines);
    apply_em_spans(&mut lines);
    assert_eq!(
        lines[0].spans,
        vec![
            Inline::Text("keep ".into()),
            Inline::Strong("that".into()),
            Inline::Text(" but ".into()),
            Inline::Em("this".into()),
            Inline::Text(" is italic".into()),
        ]
    );
}

#[test]
fn unmatched_markers_stay_literal() {
    let mut lines = split_lines("a ** dangling and *also this");
    apply_strong_spans(&mut lines);
    apply_em_spans(&mut lines);
    assert_eq!(
        lines[0].spans,
        vec![Inline::Text("a ** dangling and *also this".into())]
    );
}

#[test]
fn citations_require_digits_inside_brackets() {
    let mut lines = split_lines("see [12] but not [note] or []");
    apply_citations(&mut lines);
    assert_eq!(
        lines[0].spans,
        vec![
            Inline::Text("see ".into()),
            Inline::Citation("12".into()),
            Inline::Text(" but not [note] or []".into()),
        ]
    );
}

#[test]
fn heading_detection_runs_on_lines_with_inline_spans() {
    // The heading pass runs after the inline passes, so markers can sit in
    // front of an already-split span list.
    let mut lines = split_lines("## A **strong** title");
    apply_strong_spans(&mut lines);
    detect_headings(&mut lines);
    assert_eq!(lines[0].kind, LineKind::Heading { level: 2 });
    assert_eq!(
        lines[0].spans,
        vec![
            Inline::Text("A ".into()),
            Inline::Strong("strong".into()),
            Inline::Text(" title".into()),
        ]
    );
}

#[test]
fn list_detection_precedes_and_excludes_indented_lines() {
    let mut lines = split_lines("1. top level\n  2. indented");
    detect_list_items(&mut lines);
    assert_eq!(
        lines[0].kind,
        LineKind::ListItem {
            number: "1. ".into(),
            level: 0
        }
    );
    // Indented lines are left for the nested pass.
    assert_eq!(lines[1].kind, LineKind::Text);
}

#[test]
fn mixed_block_with_structure_is_not_paragraph_wrapped() {
    let markup = render_assistant_markup("# Plan\n1. gather sources\n2. draft reply");
    assert_eq!(
        markup,
        "<h1 class=\"message-heading\">Plan</h1>\
         <div class=\"list-item\"><span class=\"list-number\">1. </span>\
         <span class=\"list-text\">gather sources</span></div>\
         <div class=\"list-item\"><span class=\"list-number\">2. </span>\
         <span class=\"list-text\">draft reply</span></div>"
    );
}

#[test]
fn preexisting_markup_is_left_untouched() {
    let already = "<p>previously rendered</p>";
    assert_eq!(render_assistant_markup(already), already);
}
