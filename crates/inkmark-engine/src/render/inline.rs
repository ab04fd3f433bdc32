//! Inline formatting substitution.
//!
//! Each pass rewrites only plain [`Node::Text`] runs, so a span wrapped by an
//! earlier pass is never matched again. Pass order matters: bold runs before
//! italic so `**x**` is not eaten as two italic stars, and the bodies exclude
//! their own delimiter, so partially-typed syntax simply stays literal text.

use regex::{Captures, Regex};
use std::sync::LazyLock;

use super::{Node, StyleTag};

static BOLD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*([^*]+)\*\*|__([^_]+)__").unwrap());
static ITALIC_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*([^*]+)\*|_([^_]+)_").unwrap());
static STRIKE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"~~([^~]+)~~").unwrap());
static CODE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`([^`]+)`").unwrap());
static LINK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").unwrap());

/// Run all inline substitution passes over one line of text.
pub(crate) fn apply_inline(text: &str) -> Vec<Node> {
    if text.is_empty() {
        return Vec::new();
    }
    let mut nodes = vec![Node::Text(text.to_string())];
    nodes = substitute(nodes, &BOLD_RE, bold_span);
    nodes = substitute(nodes, &ITALIC_RE, italic_span);
    nodes = substitute(nodes, &STRIKE_RE, strike_span);
    nodes = substitute(nodes, &CODE_RE, code_span);
    nodes = substitute(nodes, &LINK_RE, link_span);
    nodes
}

fn substitute(nodes: Vec<Node>, re: &Regex, span: fn(&Captures) -> Vec<Node>) -> Vec<Node> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        let Node::Text(text) = node else {
            out.push(node);
            continue;
        };
        let mut last = 0;
        for caps in re.captures_iter(&text) {
            let Some(whole) = caps.get(0) else { continue };
            if whole.start() > last {
                out.push(Node::Text(text[last..whole.start()].to_string()));
            }
            out.extend(span(&caps));
            last = whole.end();
        }
        if last == 0 {
            out.push(Node::Text(text));
        } else if last < text.len() {
            out.push(Node::Text(text[last..].to_string()));
        }
    }
    out
}

fn wrapped(delim: &str, tag: StyleTag, body: &str) -> Vec<Node> {
    vec![
        syntax(delim.to_string()),
        Node::Styled {
            tag,
            children: vec![Node::Text(body.to_string())],
        },
        syntax(delim.to_string()),
    ]
}

fn bold_span(caps: &Captures) -> Vec<Node> {
    match (caps.get(1), caps.get(2)) {
        (Some(body), _) => wrapped("**", StyleTag::Bold, body.as_str()),
        (None, Some(body)) => wrapped("__", StyleTag::Bold, body.as_str()),
        (None, None) => Vec::new(),
    }
}

fn italic_span(caps: &Captures) -> Vec<Node> {
    match (caps.get(1), caps.get(2)) {
        (Some(body), _) => wrapped("*", StyleTag::Italic, body.as_str()),
        (None, Some(body)) => wrapped("_", StyleTag::Italic, body.as_str()),
        (None, None) => Vec::new(),
    }
}

fn strike_span(caps: &Captures) -> Vec<Node> {
    match caps.get(1) {
        Some(body) => wrapped("~~", StyleTag::Strikethrough, body.as_str()),
        None => Vec::new(),
    }
}

fn code_span(caps: &Captures) -> Vec<Node> {
    match caps.get(1) {
        Some(body) => wrapped("`", StyleTag::Code, body.as_str()),
        None => Vec::new(),
    }
}

fn link_span(caps: &Captures) -> Vec<Node> {
    let (Some(label), Some(url)) = (caps.get(1), caps.get(2)) else {
        return Vec::new();
    };
    vec![
        syntax("[".to_string()),
        Node::Styled {
            tag: StyleTag::Link {
                href: url.as_str().to_string(),
            },
            children: vec![Node::Text(label.as_str().to_string())],
        },
        syntax(format!("]({})", url.as_str())),
    ]
}

fn syntax(text: String) -> Node {
    Node::Styled {
        tag: StyleTag::Syntax,
        children: vec![Node::Text(text)],
    }
}
