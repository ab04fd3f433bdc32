/*!
 * # Markdown Line Renderer
 *
 * Pure projection from plain Markdown text to a styled visual tree. The tree
 * is disposable: it carries no state of its own and is fully regenerated from
 * the plain text on every render pass. Flattening the tree back to text must
 * always reproduce the exact input (`flatten(&render(text)) == text`), which
 * is what lets the position mapper treat tree locations and text offsets as
 * two views of the same thing.
 *
 * Rendering is strictly line-by-line; no construct spans multiple lines.
 * Adjacent source lines are joined with exactly one [`Node::LineBreak`].
 */

mod inline;
mod line;

pub use line::render;
pub(crate) use line::{LIST_RE, TODO_RE};

/// A node in the rendered visual tree.
///
/// Leaves are text runs, hard line breaks, todo checkboxes, and blank-line
/// placeholders. Branches carry a [`StyleTag`] and hold only other nodes,
/// never independent state, so the whole tree can be thrown away and rebuilt
/// from the plain text at any time.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A run of literal text.
    Text(String),
    /// Hard break between two source lines. Flattens to `"\n"`.
    LineBreak,
    /// Opaque non-editable todo checkbox. `raw` is the exact source prefix
    /// (e.g. `"- [x] "`) so flattening stays lossless; canonical prefixes are
    /// 6 bytes wide, which is the width the cursor arithmetic sees.
    Checkbox { checked: bool, raw: String },
    /// An empty source line. Renders as a non-breaking placeholder so
    /// consecutive empty lines stay visually distinct; flattens to `""`.
    Blank,
    /// Styled branch node wrapping child nodes.
    Styled { tag: StyleTag, children: Vec<Node> },
}

/// Style carried by a [`Node::Styled`] branch.
#[derive(Debug, Clone, PartialEq)]
pub enum StyleTag {
    /// ATX heading content, level 1-6.
    Heading(u8),
    Bold,
    Italic,
    Strikethrough,
    /// Inline code span.
    Code,
    /// Link label; `href` is the target.
    Link { href: String },
    /// Block quote content.
    Quote,
    /// Bullet or numbered list item content.
    ListItem,
    /// Todo body text; struck through when `checked`.
    TodoBody { checked: bool },
    /// Markdown punctuation (`#`, `**`, `> `, list markers, ...).
    Syntax,
    /// A line of three or more hyphens.
    HorizontalRule,
}

/// The rendered projection of a plain-text document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VisualTree {
    pub children: Vec<Node>,
}

impl Node {
    /// Width this node contributes to the flattened text, in bytes.
    pub fn width(&self) -> usize {
        match self {
            Node::Text(text) => text.len(),
            Node::LineBreak => 1,
            Node::Checkbox { raw, .. } => raw.len(),
            Node::Blank => 0,
            Node::Styled { children, .. } => children.iter().map(Node::width).sum(),
        }
    }
}

impl VisualTree {
    /// Total flattened width of the tree, in bytes.
    pub fn width(&self) -> usize {
        self.children.iter().map(Node::width).sum()
    }
}

/// Flatten a visual tree back to the plain text it was rendered from.
pub fn flatten(tree: &VisualTree) -> String {
    let mut out = String::with_capacity(tree.width());
    for node in &tree.children {
        flatten_node(node, &mut out);
    }
    out
}

fn flatten_node(node: &Node, out: &mut String) {
    match node {
        Node::Text(text) => out.push_str(text),
        Node::LineBreak => out.push('\n'),
        Node::Checkbox { raw, .. } => out.push_str(raw),
        Node::Blank => {}
        Node::Styled { children, .. } => {
            for child in children {
                flatten_node(child, out);
            }
        }
    }
}

/// Serialize a visual tree to deterministic HTML-ish markup.
///
/// Identical plain text always yields identical markup, so the reconciliation
/// controller compares markup strings to decide whether anything visual
/// actually changed.
pub fn to_markup(tree: &VisualTree) -> String {
    let mut out = String::new();
    for node in &tree.children {
        markup_node(node, &mut out);
    }
    out
}

fn markup_node(node: &Node, out: &mut String) {
    match node {
        Node::Text(text) => out.push_str(&html_escape::encode_text(text)),
        Node::LineBreak => out.push_str("<br>"),
        Node::Blank => out.push_str("&nbsp;"),
        Node::Checkbox { checked, .. } => {
            if *checked {
                out.push_str("<input type=\"checkbox\" checked>");
            } else {
                out.push_str("<input type=\"checkbox\">");
            }
        }
        Node::Styled { tag, children } => {
            let (open, close) = markup_tags(tag);
            out.push_str(&open);
            for child in children {
                markup_node(child, out);
            }
            out.push_str(close);
        }
    }
}

fn markup_tags(tag: &StyleTag) -> (String, &'static str) {
    match tag {
        StyleTag::Heading(level) => (
            format!("<span class=\"md-heading md-h{level}\">"),
            "</span>",
        ),
        StyleTag::Bold => ("<strong>".to_string(), "</strong>"),
        StyleTag::Italic => ("<em>".to_string(), "</em>"),
        StyleTag::Strikethrough => ("<del>".to_string(), "</del>"),
        StyleTag::Code => ("<code>".to_string(), "</code>"),
        StyleTag::Link { href } => (
            format!(
                "<a href=\"{}\">",
                html_escape::encode_double_quoted_attribute(href)
            ),
            "</a>",
        ),
        StyleTag::Quote => ("<span class=\"md-quote\">".to_string(), "</span>"),
        StyleTag::ListItem => ("<span class=\"md-list-item\">".to_string(), "</span>"),
        StyleTag::TodoBody { checked: true } => {
            ("<span class=\"md-todo-body md-done\">".to_string(), "</span>")
        }
        StyleTag::TodoBody { checked: false } => {
            ("<span class=\"md-todo-body\">".to_string(), "</span>")
        }
        StyleTag::Syntax => ("<span class=\"md-syntax\">".to_string(), "</span>"),
        StyleTag::HorizontalRule => ("<span class=\"md-hr\">".to_string(), "</span>"),
    }
}
