//! Per-line block classification.
//!
//! Each line is matched against the block constructs in priority order; the
//! todo prefix is a superset of the generic list prefix, so it has to be
//! checked first. Anything that fails every match renders as a paragraph.

use regex::Regex;
use std::sync::LazyLock;

use super::inline::apply_inline;
use super::{Node, StyleTag, VisualTree};

static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(#{1,6}) (.*)$").unwrap());

/// Todo prefix: `-`/`*`, optional space, `[ ]`/`[x]`/`[X]`/`[]`, space.
/// Groups: 1 = indentation, 2 = full marker, 3 = bracket contents, 4 = body.
pub(crate) static TODO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([ \t]*)([-*] ?\[( |x|X)?\] )(.*)$").unwrap());

/// Generic bullet or numbered list prefix.
/// Groups: 1 = indentation, 2 = marker, 3 = body.
pub(crate) static LIST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([ \t]*)([-*]|\d+\.) (.*)$").unwrap());

static QUOTE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^> (.*)$").unwrap());

static HR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^-{3,}$").unwrap());

/// Render plain Markdown text into a visual tree.
///
/// Referentially pure: identical input always produces a tree that serializes
/// to identical markup. Lines are joined with exactly one line-break marker
/// between each adjacent pair.
pub fn render(text: &str) -> VisualTree {
    let mut children = Vec::new();
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            children.push(Node::LineBreak);
        }
        render_line(line, &mut children);
    }
    VisualTree { children }
}

fn render_line(line: &str, out: &mut Vec<Node>) {
    if line.is_empty() {
        out.push(Node::Blank);
        return;
    }

    if let Some(caps) = HEADING_RE.captures(line) {
        let level = caps[1].len() as u8;
        // Inline formatting is suppressed inside headings.
        out.push(syntax(format!("{} ", &caps[1])));
        out.push(Node::Styled {
            tag: StyleTag::Heading(level),
            children: vec![Node::Text(caps[2].to_string())],
        });
        return;
    }

    if let Some(caps) = TODO_RE.captures(line) {
        let checked = matches!(caps.get(3).map(|m| m.as_str()), Some("x") | Some("X"));
        if !caps[1].is_empty() {
            out.push(Node::Text(caps[1].to_string()));
        }
        out.push(Node::Checkbox {
            checked,
            raw: caps[2].to_string(),
        });
        out.push(Node::Styled {
            tag: StyleTag::TodoBody { checked },
            children: apply_inline(&caps[4]),
        });
        return;
    }

    if let Some(caps) = LIST_RE.captures(line) {
        out.push(syntax(format!("{}{} ", &caps[1], &caps[2])));
        out.push(Node::Styled {
            tag: StyleTag::ListItem,
            children: apply_inline(&caps[3]),
        });
        return;
    }

    if let Some(caps) = QUOTE_RE.captures(line) {
        out.push(syntax("> ".to_string()));
        out.push(Node::Styled {
            tag: StyleTag::Quote,
            children: apply_inline(&caps[1]),
        });
        return;
    }

    if HR_RE.is_match(line) {
        out.push(Node::Styled {
            tag: StyleTag::HorizontalRule,
            children: vec![Node::Text(line.to_string())],
        });
        return;
    }

    out.append(&mut apply_inline(line));
}

fn syntax(text: String) -> Node {
    Node::Styled {
        tag: StyleTag::Syntax,
        children: vec![Node::Text(text)],
    }
}
