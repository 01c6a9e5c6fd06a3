use std::collections::HashSet;

use super::super::RenderGraph;

const CHILD_HIGHLIGHT_LIMIT: usize = 400;

pub(super) fn collect_children(
    cache: &RenderGraph,
    selected_index: usize,
    child_nodes: &mut HashSet<usize>,
    child_edges: &mut HashSet<(usize, usize)>,
) {
    let Some(children) = cache.children.get(selected_index) else {
        return;
    };

    for &child in children.iter().take(CHILD_HIGHLIGHT_LIMIT) {
        child_nodes.insert(child);
        child_edges.insert((selected_index, child));
    }
}
