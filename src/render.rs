//! ASCII tree rendering for area and iteration hierarchies.

use crate::models::{AreaView, IterationState, IterationView, TreeEntry, WorkItemCounts};

const NEW: char = '◇';
const STARTED: char = '●';
const CLOSED: char = '✓';

/// Something that can be drawn as one line of a tree.
pub trait TreeLine {
    fn title(&self) -> &str;
    fn symbol(&self) -> Option<char>;
    fn counts(&self) -> WorkItemCounts;
}

impl TreeLine for IterationView {
    fn title(&self) -> &str {
        &self.iteration.node.name
    }

    fn symbol(&self) -> Option<char> {
        Some(state_symbol(self.iteration.state))
    }

    fn counts(&self) -> WorkItemCounts {
        self.counts
    }
}

impl TreeLine for AreaView {
    fn title(&self) -> &str {
        &self.area.node.name
    }

    fn symbol(&self) -> Option<char> {
        None
    }

    fn counts(&self) -> WorkItemCounts {
        self.counts
    }
}

fn state_symbol(state: IterationState) -> char {
    match state {
        IterationState::New => NEW,
        IterationState::Start => STARTED,
        IterationState::Close => CLOSED,
    }
}

/// Render a tree with branch characters, state symbols and
/// `[closed/total]` work item counts.
///
/// Example output:
/// ```text
/// My Space [1/5]
/// ├── ● Sprint 1 [1/5]
/// │   └── ◇ Hardening [0/2]
/// └── ◇ Sprint 2 [0/0]
/// ```
pub fn render_tree<V: TreeLine>(nodes: &[TreeEntry<V>]) -> String {
    let mut output = String::new();
    for (i, node) in nodes.iter().enumerate() {
        let is_last = i == nodes.len() - 1;
        render_node(&mut output, node, "", is_last, true);
    }
    output
}

fn render_line<V: TreeLine>(output: &mut String, view: &V, with_symbol: bool) {
    if with_symbol {
        if let Some(symbol) = view.symbol() {
            output.push(symbol);
            output.push(' ');
        }
    }
    let counts = view.counts();
    output.push_str(view.title());
    output.push_str(&format!(" [{}/{}]", counts.closed, counts.total));
    output.push('\n');
}

fn render_node<V: TreeLine>(
    output: &mut String,
    node: &TreeEntry<V>,
    prefix: &str,
    is_last: bool,
    is_root: bool,
) {
    if is_root {
        render_line(output, &node.view, false);
    } else {
        let branch = if is_last { "└── " } else { "├── " };
        output.push_str(prefix);
        output.push_str(branch);
        render_line(output, &node.view, true);
    }

    let child_prefix = if is_root {
        String::new()
    } else {
        let continuation = if is_last { "    " } else { "│   " };
        format!("{}{}", prefix, continuation)
    };

    for (i, child) in node.children.iter().enumerate() {
        let child_is_last = i == node.children.len() - 1;
        render_node(output, child, &child_prefix, child_is_last, false);
    }
}
