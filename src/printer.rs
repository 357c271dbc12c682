//! Indented rendering of a remote snapshot

use crate::entry::Entry;

const INDENT: &str = "  ";

/// Render `root` pre-order, one line per node.
/// Children sit exactly one level deeper than their directory and keep
/// the order the device listed them in.
pub fn render(root: &Entry) -> Vec<String> {
    let mut lines = Vec::with_capacity(root.node_count());
    let mut stack = vec![(root, 0usize)];
    while let Some((node, depth)) = stack.pop() {
        let marker = if node.is_dir() { '+' } else { '-' };
        lines.push(format!(
            "{}{} {} ({})",
            INDENT.repeat(depth),
            marker,
            node.name(),
            node.path()
        ));
        stack.extend(node.children().iter().rev().map(|c| (c, depth + 1)));
    }
    lines
}
