/*!
 * # Position Mapper
 *
 * Bidirectional conversion between a byte offset into the flattened plain
 * text and a location in the rendered visual tree. Text runs contribute
 * their byte length, line breaks contribute 1, checkbox leaves contribute
 * their raw prefix width (6 for canonical prefixes), blank placeholders
 * contribute 0.
 *
 * The two directions are exact inverses for any offset produced by
 * [`offset_of`] on the same tree. Lookup never fails past the caller: any
 * inconsistency (stale path, offset beyond the tree) degrades to the end of
 * the tree.
 */

use crate::render::{Node, VisualTree};

/// A location in the visual tree: a path of child indices from the root plus
/// a byte offset inside that node's flattened width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Point {
    pub path: Vec<usize>,
    pub offset: usize,
}

impl Point {
    pub fn new(path: Vec<usize>, offset: usize) -> Self {
        Self { path, offset }
    }
}

/// Accumulated byte offset of `point` in the flattened text of `tree`.
///
/// An invalid path falls back to the end of the tree.
pub fn offset_of(tree: &VisualTree, point: &Point) -> usize {
    let total = tree.width();
    let mut acc = 0;
    match walk_to(&tree.children, &point.path, &mut acc) {
        Some(node_width) => (acc + point.offset.min(node_width)).min(total),
        None => total,
    }
}

/// Walk to the node named by `path`, accumulating the widths of everything
/// before it. Returns the width of the target node, or `None` when the path
/// does not resolve.
fn walk_to(children: &[Node], path: &[usize], acc: &mut usize) -> Option<usize> {
    let Some((&idx, rest)) = path.split_first() else {
        // An empty path addresses the container itself.
        return Some(children.iter().map(Node::width).sum());
    };
    if idx >= children.len() {
        return None;
    }
    for node in &children[..idx] {
        *acc += node.width();
    }
    if rest.is_empty() {
        return Some(children[idx].width());
    }
    match &children[idx] {
        Node::Styled { children: inner, .. } => walk_to(inner, rest, acc),
        _ => None,
    }
}

/// Find the tree location for a flattened byte offset.
///
/// Special cases, in precedence order:
/// - inside a checkbox leaf's span: the leaf cannot hold a caret, so land at
///   the start of the adjacent todo body, or just after the checkbox when no
///   body follows;
/// - exactly on a line-break marker: land at the start of the tree-level
///   child following the marker;
/// - beyond the total width, or any inconsistency: end of the tree.
pub fn point_at(tree: &VisualTree, offset: usize) -> Point {
    let mut acc = 0;
    locate(&tree.children, offset, &mut acc, &mut Vec::new()).unwrap_or_else(|| end_point(tree))
}

fn locate(children: &[Node], target: usize, acc: &mut usize, path: &mut Vec<usize>) -> Option<Point> {
    for (i, node) in children.iter().enumerate() {
        let width = node.width();
        if target > *acc + width {
            *acc += width;
            continue;
        }
        match node {
            Node::Text(_) => {
                path.push(i);
                return Some(Point::new(path.clone(), target - *acc));
            }
            Node::Blank => {
                path.push(i);
                return Some(Point::new(path.clone(), 0));
            }
            Node::LineBreak => {
                // Both the marker itself and the position just after it map
                // to the start of the following tree-level child.
                if i + 1 < children.len() {
                    path.push(i + 1);
                    return Some(Point::new(path.clone(), 0));
                }
                return None;
            }
            Node::Checkbox { .. } => {
                // Skip the non-editable leaf (its trailing space included)
                // and land at the start of the todo body beside it.
                if children.get(i + 1).is_some() {
                    path.push(i + 1);
                    return Some(Point::new(path.clone(), 0));
                }
                path.push(i);
                return Some(Point::new(path.clone(), width));
            }
            Node::Styled { children: inner, .. } => {
                path.push(i);
                if let Some(found) = locate(inner, target, acc, path) {
                    return Some(found);
                }
                path.pop();
                // A zero-width branch cannot host the caret; keep walking.
            }
        }
    }
    None
}

/// The final caret position in the tree.
fn end_point(tree: &VisualTree) -> Point {
    let mut path = Vec::new();
    let mut children = &tree.children;
    loop {
        let Some(last) = children.last() else {
            return Point::new(path, 0);
        };
        path.push(children.len() - 1);
        match last {
            Node::Styled { children: inner, .. } if !inner.is_empty() => children = inner,
            node => return Point::new(path, node.width()),
        }
    }
}

/// Document-order index of the checkbox leaf at `path`, or `None` when the
/// path does not name a checkbox. This is how a checkbox click is mapped back
/// to the todo line it toggles.
pub fn checkbox_index_at(tree: &VisualTree, path: &[usize]) -> Option<usize> {
    let mut count = 0;
    find_checkbox(&tree.children, path, &mut count)
}

fn find_checkbox(children: &[Node], path: &[usize], count: &mut usize) -> Option<usize> {
    let (&idx, rest) = path.split_first()?;
    if idx >= children.len() {
        return None;
    }
    for node in &children[..idx] {
        *count += count_checkboxes(node);
    }
    match (&children[idx], rest.is_empty()) {
        (Node::Checkbox { .. }, true) => Some(*count),
        (Node::Styled { children: inner, .. }, false) => find_checkbox(inner, rest, count),
        _ => None,
    }
}

fn count_checkboxes(node: &Node) -> usize {
    match node {
        Node::Checkbox { .. } => 1,
        Node::Styled { children, .. } => children.iter().map(count_checkboxes).sum(),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::render;

    #[test]
    fn round_trips_every_offset_produced_by_offset_of() {
        let text = "# Head\n- [ ] task\nplain **bold**\n\n> quote\n1. num";
        let tree = render(text);
        for offset in 0..=text.len() {
            let point = point_at(&tree, offset);
            let back = offset_of(&tree, &point);
            assert_eq!(
                offset_of(&tree, &point_at(&tree, back)),
                back,
                "round-trip broke at raw offset {offset}"
            );
        }
    }

    #[test]
    fn text_offsets_map_exactly() {
        let text = "ab\ncd";
        let tree = render(text);
        for offset in 0..=text.len() {
            let point = point_at(&tree, offset);
            assert_eq!(offset_of(&tree, &point), offset, "offset {offset}");
        }
    }

    #[test]
    fn checkbox_interior_lands_at_todo_body_start() {
        let text = "- [ ] task";
        let tree = render(text);
        for inside in 0..6 {
            let point = point_at(&tree, inside);
            // Body starts after the 6-byte prefix.
            assert_eq!(offset_of(&tree, &point), 6, "interior offset {inside}");
        }
        // Offsets inside the body stay in the body.
        assert_eq!(offset_of(&tree, &point_at(&tree, 8)), 8);
    }

    #[test]
    fn checkbox_with_no_body_lands_just_after_it() {
        let tree = render("- [ ] ");
        let point = point_at(&tree, 3);
        assert_eq!(offset_of(&tree, &point), 6);
    }

    #[test]
    fn line_break_landing_moves_to_next_child() {
        let text = "ab\ncd";
        let tree = render(text);
        let point = point_at(&tree, 2);
        // Offset 2 is the end of "ab"; the text leaf claims it.
        assert_eq!(offset_of(&tree, &point), 2);
        // Offset 3 is just past the break: start of "cd".
        let after = point_at(&tree, 3);
        assert_eq!(offset_of(&tree, &after), 3);
        assert_eq!(after.offset, 0);
    }

    #[test]
    fn out_of_range_offset_falls_back_to_end() {
        let text = "short";
        let tree = render(text);
        let point = point_at(&tree, 10_000);
        assert_eq!(offset_of(&tree, &point), text.len());
    }

    #[test]
    fn stale_path_falls_back_to_end() {
        let tree = render("abc");
        let stale = Point::new(vec![7, 3], 2);
        assert_eq!(offset_of(&tree, &stale), 3);
    }

    #[test]
    fn empty_tree_maps_to_zero() {
        let tree = VisualTree::default();
        assert_eq!(offset_of(&tree, &point_at(&tree, 5)), 0);
    }

    #[test]
    fn checkbox_index_counts_in_document_order() {
        let tree = render("- [ ] a\n- [x] b\nplain\n- [ ] c");
        let mut found = Vec::new();
        collect_checkbox_paths(&tree.children, &mut Vec::new(), &mut found);
        assert_eq!(found.len(), 3);
        for (expected, path) in found.iter().enumerate() {
            assert_eq!(checkbox_index_at(&tree, path), Some(expected));
        }
        // A non-checkbox path yields nothing.
        assert_eq!(checkbox_index_at(&tree, &[1]), None);
    }

    fn collect_checkbox_paths(children: &[Node], path: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
        for (i, node) in children.iter().enumerate() {
            path.push(i);
            match node {
                Node::Checkbox { .. } => out.push(path.clone()),
                Node::Styled { children, .. } => collect_checkbox_paths(children, path, out),
                _ => {}
            }
            path.pop();
        }
    }
}
