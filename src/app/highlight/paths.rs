use std::collections::HashSet;

use super::super::RenderGraph;

/// Nodes and links from `target` up to the top of its chain, `target` included.
pub(super) fn ancestor_path(
    cache: &RenderGraph,
    target_index: usize,
) -> (HashSet<usize>, HashSet<(usize, usize)>) {
    let mut path_nodes = HashSet::new();
    let mut path_edges = HashSet::new();
    if target_index >= cache.nodes.len() {
        return (path_nodes, path_edges);
    }

    let mut cursor = target_index;
    path_nodes.insert(cursor);
    while let Some(parent) = cache.parent.get(cursor).copied().flatten() {
        // Parents always precede children; a cycle would mean a corrupt graph.
        if !path_nodes.insert(parent) {
            break;
        }
        path_edges.insert((parent, cursor));
        cursor = parent;
    }

    (path_nodes, path_edges)
}

/// Node indices from the top of the diagram down to `target`, `target` included.
pub(in crate::app) fn path_from_top(cache: &RenderGraph, target_index: usize) -> Vec<usize> {
    let mut chain = Vec::new();
    let mut cursor = Some(target_index).filter(|&index| index < cache.nodes.len());
    while let Some(index) = cursor {
        if chain.contains(&index) {
            break;
        }
        chain.push(index);
        cursor = cache.parent.get(index).copied().flatten();
    }
    chain.reverse();
    chain
}
