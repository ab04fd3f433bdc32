//! The `Cmd` edit algebra and its compilation to xi-rope deltas.
//!
//! Structural interactions (Enter continuation, checkbox toggling, formatting
//! accelerators, paste) are expressed as commands so they apply as direct
//! text mutations instead of platform default behavior. Every command also
//! knows the exact selection it leaves behind; the caret is never re-derived
//! by searching the new text.

use std::ops::Range;

use xi_rope::delta::Builder;
use xi_rope::{Delta, Rope, RopeInfo};

use crate::editing::document::Document;
use crate::render::{LIST_RE, TODO_RE};

/// An edit operation on the plain-text document.
#[derive(Debug, Clone, PartialEq)]
pub enum Cmd {
    /// Insert text at a byte offset.
    InsertText { at: usize, text: String },
    /// Delete a byte range.
    DeleteRange { range: Range<usize> },
    /// Replace a byte range with new text.
    ReplaceRange { range: Range<usize>, text: String },
    /// Replace the whole document (external overwrite, raw input sync).
    ReplaceAll { text: String },
    /// Enter key: split the line at the caret, continuing or breaking any
    /// list/todo structure on that line.
    SplitLine { at: usize },
    /// Checkbox click: flip the bracket contents of the n-th todo line in
    /// document order, touching nothing else.
    ToggleTodo { occurrence: usize },
    /// Formatting accelerator: wrap the selection in a marker pair.
    WrapSelection { range: Range<usize>, marker: InlineMarker },
    /// Clipboard paste, already normalized to plain text by the host.
    /// Replaces the current selection.
    Paste { range: Range<usize>, text: String },
}

/// Marker pair used by the formatting accelerators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InlineMarker {
    Bold,
    Italic,
    Code,
}

impl InlineMarker {
    pub fn token(self) -> &'static str {
        match self {
            InlineMarker::Bold => "**",
            InlineMarker::Italic => "*",
            InlineMarker::Code => "`",
        }
    }
}

/// Compile a command into a delta against the current buffer.
pub(crate) fn compile_command(doc: &Document, cmd: &Cmd) -> Delta<RopeInfo> {
    let text = doc.text();
    let len = text.len();
    let mut builder = Builder::new(len);
    match cmd {
        Cmd::InsertText { at, text: insert } => {
            let at = clamp_boundary(&text, *at);
            builder.replace(at..at, Rope::from(insert.as_str()));
        }
        Cmd::DeleteRange { range } => {
            builder.delete(clamp_range(&text, range));
        }
        Cmd::ReplaceRange { range, text: insert } | Cmd::Paste { range, text: insert } => {
            builder.replace(clamp_range(&text, range), Rope::from(insert.as_str()));
        }
        Cmd::ReplaceAll { text: insert } => {
            builder.replace(0..len, Rope::from(insert.as_str()));
        }
        Cmd::SplitLine { at } => {
            let plan = split_plan(&text, *at);
            builder.replace(plan.range, Rope::from(plan.insert.as_str()));
        }
        Cmd::ToggleTodo { occurrence } => {
            // A stale occurrence compiles to the identity delta.
            if let Some((range, replacement)) = toggle_plan(&text, *occurrence) {
                builder.replace(range, Rope::from(replacement.as_str()));
            }
        }
        Cmd::WrapSelection { range, marker } => {
            let range = clamp_range(&text, range);
            let token = marker.token();
            if range.is_empty() {
                let pair = format!("{token}{token}");
                builder.replace(range.start..range.start, Rope::from(pair.as_str()));
            } else {
                builder.replace(range.start..range.start, Rope::from(token));
                builder.replace(range.end..range.end, Rope::from(token));
            }
        }
    }
    builder.build()
}

/// Selection the command leaves behind, computed against the pre-edit text.
pub(crate) fn selection_after(doc: &Document, cmd: &Cmd) -> Range<usize> {
    let text = doc.text();
    match cmd {
        Cmd::InsertText { at, text: insert } => {
            let caret = clamp_boundary(&text, *at) + insert.len();
            caret..caret
        }
        Cmd::DeleteRange { range } => {
            let caret = clamp_range(&text, range).start;
            caret..caret
        }
        Cmd::ReplaceRange { range, text: insert } | Cmd::Paste { range, text: insert } => {
            let caret = clamp_range(&text, range).start + insert.len();
            caret..caret
        }
        Cmd::ReplaceAll { text: insert } => insert.len()..insert.len(),
        Cmd::SplitLine { at } => {
            let plan = split_plan(&text, *at);
            plan.cursor..plan.cursor
        }
        Cmd::ToggleTodo { occurrence } => match toggle_plan(&text, *occurrence) {
            Some((range, replacement)) => {
                shift_selection(doc.selection(), &range, replacement.len())
            }
            None => doc.selection(),
        },
        Cmd::WrapSelection { range, marker } => {
            let range = clamp_range(&text, range);
            let token_len = marker.token().len();
            (range.start + token_len)..(range.end + token_len)
        }
    }
}

struct SplitPlan {
    range: Range<usize>,
    insert: String,
    cursor: usize,
}

/// Plan the Enter-key mutation for the line containing `at`.
///
/// - todo line with non-empty body: continue with the same bullet and an
///   unchecked box, caret right after the new prefix;
/// - todo or list line with an empty body: delete the bare marker and leave a
///   plain blank line instead (break out of the list);
/// - bullet/numbered line with non-empty body: continue the marker, numbers
///   incremented by one;
/// - anything else: a plain newline.
fn split_plan(text: &str, at: usize) -> SplitPlan {
    let at = clamp_boundary(text, at);
    let line = line_range(text, at);
    let line_str = &text[line.clone()];

    if let Some(caps) = TODO_RE.captures(line_str) {
        if caps[4].is_empty() {
            return break_out_of_list(line);
        }
        let bullet = caps[2].chars().next().unwrap_or('-');
        let insert = format!("\n{}{} [ ] ", &caps[1], bullet);
        let cursor = at + insert.len();
        return SplitPlan {
            range: at..at,
            insert,
            cursor,
        };
    }

    if let Some(caps) = LIST_RE.captures(line_str) {
        if caps[3].is_empty() {
            return break_out_of_list(line);
        }
        let marker = &caps[2];
        let next_marker = match marker.strip_suffix('.') {
            Some(digits) => match digits.parse::<u64>() {
                Ok(n) => format!("{}.", n + 1),
                Err(_) => marker.to_string(),
            },
            None => marker.to_string(),
        };
        let insert = format!("\n{}{} ", &caps[1], next_marker);
        let cursor = at + insert.len();
        return SplitPlan {
            range: at..at,
            insert,
            cursor,
        };
    }

    SplitPlan {
        range: at..at,
        insert: "\n".to_string(),
        cursor: at + 1,
    }
}

/// Enter on a bare marker deletes the marker line and leaves a blank line.
fn break_out_of_list(line: Range<usize>) -> SplitPlan {
    let cursor = line.start + 1;
    SplitPlan {
        range: line,
        insert: "\n".to_string(),
        cursor,
    }
}

/// Locate the bracket contents of the n-th todo line (0-indexed, document
/// order) and produce the flipped replacement for exactly that span.
pub(crate) fn toggle_plan(text: &str, occurrence: usize) -> Option<(Range<usize>, String)> {
    let mut seen = 0;
    let mut line_start = 0;
    for line in text.split('\n') {
        if let Some(caps) = TODO_RE.captures(line) {
            if seen == occurrence {
                let marker = caps.get(2)?;
                let bracket_open = line[marker.range()].find('[')? + marker.start();
                let (inner_start, inner_len, checked) = match caps.get(3) {
                    Some(m) => (m.start(), m.len(), matches!(m.as_str(), "x" | "X")),
                    // Empty brackets `[]` count as unchecked.
                    None => (bracket_open + 1, 0, false),
                };
                let replacement = if checked { " " } else { "x" }.to_string();
                let start = line_start + inner_start;
                return Some((start..start + inner_len, replacement));
            }
            seen += 1;
        }
        line_start += line.len() + 1;
    }
    None
}

/// Number of todo lines in the document.
pub(crate) fn todo_count(text: &str) -> usize {
    text.split('\n').filter(|line| TODO_RE.is_match(line)).count()
}

/// The line containing `at`, excluding its trailing newline.
fn line_range(text: &str, at: usize) -> Range<usize> {
    let start = text[..at].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let end = text[at..].find('\n').map(|i| at + i).unwrap_or(text.len());
    start..end
}

/// Clamp an offset to the text, snapping down to a char boundary.
fn clamp_boundary(text: &str, at: usize) -> usize {
    let mut at = at.min(text.len());
    while at > 0 && !text.is_char_boundary(at) {
        at -= 1;
    }
    at
}

fn clamp_range(text: &str, range: &Range<usize>) -> Range<usize> {
    let start = clamp_boundary(text, range.start);
    let end = clamp_boundary(text, range.end).max(start);
    start..end
}

/// Shift a selection across an in-place replacement of `edited`.
fn shift_selection(sel: Range<usize>, edited: &Range<usize>, new_len: usize) -> Range<usize> {
    let delta = new_len as isize - edited.len() as isize;
    let adjust = |pos: usize| {
        if pos >= edited.end {
            (pos as isize + delta).max(0) as usize
        } else {
            pos
        }
    };
    adjust(sel.start)..adjust(sel.end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn apply(text: &str, cmd: Cmd) -> (String, Range<usize>) {
        let mut doc = Document::new(text);
        let patch = doc.apply(cmd);
        (doc.text(), patch.new_selection)
    }

    #[test]
    fn enter_continues_bullet_list() {
        let (text, sel) = apply("- a", Cmd::SplitLine { at: 3 });
        assert_eq!(text, "- a\n- ");
        assert_eq!(sel, 6..6, "caret immediately after the new marker");
    }

    #[test]
    fn enter_on_empty_marker_breaks_out_of_list() {
        let (text, sel) = apply("- a\n- ", Cmd::SplitLine { at: 6 });
        assert_eq!(text, "- a\n\n");
        assert_eq!(sel, 5..5);
    }

    #[test]
    fn enter_increments_numbered_list() {
        let (text, sel) = apply("1. x", Cmd::SplitLine { at: 4 });
        assert_eq!(text, "1. x\n2. ");
        assert_eq!(sel, 8..8);
    }

    #[test]
    fn enter_continues_todo_with_unchecked_box() {
        let (text, sel) = apply("- [x] done", Cmd::SplitLine { at: 10 });
        assert_eq!(text, "- [x] done\n- [ ] ");
        assert_eq!(sel, 17..17);
    }

    #[test]
    fn enter_on_bare_todo_marker_breaks_out() {
        let (text, _) = apply("- [ ] a\n- [ ] ", Cmd::SplitLine { at: 14 });
        assert_eq!(text, "- [ ] a\n\n");
    }

    #[test]
    fn enter_mid_line_moves_tail_to_new_item() {
        // "- abcd" with caret between b and c.
        let (text, sel) = apply("- abcd", Cmd::SplitLine { at: 4 });
        assert_eq!(text, "- ab\n- cd");
        assert_eq!(sel, 7..7, "caret after the new marker, before the tail");
    }

    #[test]
    fn enter_preserves_todo_indentation_and_bullet() {
        let (text, _) = apply("  * [ ] nested", Cmd::SplitLine { at: 14 });
        assert_eq!(text, "  * [ ] nested\n  * [ ] ");
    }

    #[test]
    fn enter_on_plain_line_inserts_newline() {
        let (text, sel) = apply("plain", Cmd::SplitLine { at: 5 });
        assert_eq!(text, "plain\n");
        assert_eq!(sel, 6..6);
    }

    #[test]
    fn toggle_targets_only_the_named_occurrence() {
        let (text, _) = apply(
            "- [ ] a\n- [ ] b\n- [x] c",
            Cmd::ToggleTodo { occurrence: 1 },
        );
        assert_eq!(text, "- [ ] a\n- [x] b\n- [x] c");
    }

    #[test]
    fn toggle_unchecks_capital_x() {
        let (text, _) = apply("- [X] a", Cmd::ToggleTodo { occurrence: 0 });
        assert_eq!(text, "- [ ] a");
    }

    #[test]
    fn toggle_checks_empty_brackets() {
        let (text, _) = apply("- [] a", Cmd::ToggleTodo { occurrence: 0 });
        assert_eq!(text, "- [x] a");
    }

    #[test]
    fn toggle_skips_non_todo_lines_when_counting() {
        let (text, _) = apply(
            "- plain\n- [ ] real\ntext",
            Cmd::ToggleTodo { occurrence: 0 },
        );
        assert_eq!(text, "- plain\n- [x] real\ntext");
    }

    #[test]
    fn toggle_with_stale_occurrence_is_a_no_op() {
        let (text, _) = apply("- [ ] only", Cmd::ToggleTodo { occurrence: 5 });
        assert_eq!(text, "- [ ] only");
    }

    #[test]
    fn wrap_selection_in_bold_markers() {
        let mut doc = Document::new("make me bold");
        let patch = doc.apply(Cmd::WrapSelection {
            range: 5..7,
            marker: InlineMarker::Bold,
        });
        assert_eq!(doc.text(), "make **me** bold");
        assert_eq!(patch.new_selection, 7..9, "selection spans the wrapped body");
    }

    #[test]
    fn wrap_empty_selection_inserts_marker_pair() {
        let (text, sel) = apply(
            "ab",
            Cmd::WrapSelection {
                range: 1..1,
                marker: InlineMarker::Code,
            },
        );
        assert_eq!(text, "a``b");
        assert_eq!(sel, 2..2, "caret between the markers");
    }

    #[test]
    fn paste_inserts_plain_text_verbatim() {
        let (text, sel) = apply(
            "ab",
            Cmd::Paste {
                range: 1..1,
                text: "**kept literal**".to_string(),
            },
        );
        assert_eq!(text, "a**kept literal**b");
        assert_eq!(sel, 17..17);
    }

    #[test]
    fn paste_replaces_a_non_empty_selection() {
        let (text, sel) = apply(
            "keep OLD keep",
            Cmd::Paste {
                range: 5..8,
                text: "new".to_string(),
            },
        );
        assert_eq!(text, "keep new keep");
        assert_eq!(sel, 8..8);
    }

    #[test]
    fn replace_all_swaps_whole_document() {
        let (text, sel) = apply(
            "old",
            Cmd::ReplaceAll {
                text: "brand new".to_string(),
            },
        );
        assert_eq!(text, "brand new");
        assert_eq!(sel, 9..9);
    }

    #[test]
    fn delete_range_removes_exactly_the_span() {
        let (text, sel) = apply("abcdef", Cmd::DeleteRange { range: 2..4 });
        assert_eq!(text, "abef");
        assert_eq!(sel, 2..2);
    }

    #[test]
    fn out_of_range_offsets_are_clamped() {
        let (text, _) = apply(
            "ab",
            Cmd::InsertText {
                at: 99,
                text: "c".to_string(),
            },
        );
        assert_eq!(text, "abc");
    }

    #[test]
    fn todo_count_counts_only_todo_lines() {
        assert_eq!(todo_count("- [ ] a\n- b\n* [x] c\n# d"), 2);
        assert_eq!(todo_count(""), 0);
    }
}
