use std::collections::HashSet;

mod collect;
mod paths;

use self::collect::collect_children;
use self::paths::ancestor_path;
pub(super) use self::paths::path_from_top;
use super::{HighlightState, RenderGraph};

pub(super) fn build_highlight_state(cache: &RenderGraph, selected_index: usize) -> HighlightState {
    let (path_nodes, path_edges) = ancestor_path(cache, selected_index);

    let mut child_nodes = HashSet::new();
    let mut child_edges = HashSet::new();
    collect_children(cache, selected_index, &mut child_nodes, &mut child_edges);

    HighlightState {
        path_nodes,
        path_edges,
        child_nodes,
        child_edges,
    }
}

impl HighlightState {
    pub(super) fn contains_node(&self, index: usize) -> bool {
        self.path_nodes.contains(&index) || self.child_nodes.contains(&index)
    }

    pub(super) fn contains_edge(&self, edge: (usize, usize)) -> bool {
        self.path_edges.contains(&edge) || self.child_edges.contains(&edge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::graph::render_graph_for_tree;
    use crate::catalog::Record;
    use crate::hierarchy::build;

    fn sample() -> RenderGraph {
        let records = vec![
            Record::from_iter([("producer", "A"), ("album", "X"), ("track", "t1")]),
            Record::from_iter([("producer", "A"), ("album", "Y"), ("track", "t2")]),
            Record::from_iter([("producer", "B"), ("album", "X"), ("track", "t3")]),
        ];
        let keys = vec!["producer".to_owned(), "album".to_owned()];
        let tree = build(&records, &keys, &Default::default()).unwrap();
        // root, A, X, t1, Y, t2, B, X, t3
        render_graph_for_tree(&tree, &records, "track")
    }

    #[test]
    fn selecting_a_leaf_lights_its_ancestors() {
        let graph = sample();
        let state = build_highlight_state(&graph, 5);

        assert_eq!(state.path_nodes, HashSet::from([0, 1, 4, 5]));
        assert_eq!(state.path_edges, HashSet::from([(0, 1), (1, 4), (4, 5)]));
        assert!(state.child_nodes.is_empty());
        assert!(!state.contains_node(6));
    }

    #[test]
    fn selecting_a_cluster_lights_its_children() {
        let graph = sample();
        let state = build_highlight_state(&graph, 1);

        assert_eq!(state.path_nodes, HashSet::from([0, 1]));
        assert_eq!(state.child_nodes, HashSet::from([2, 4]));
        assert!(state.contains_edge((1, 2)));
        assert!(!state.contains_edge((2, 3)));
    }

    #[test]
    fn path_from_top_runs_root_first() {
        let graph = sample();
        assert_eq!(path_from_top(&graph, 8), vec![0, 6, 7, 8]);
        assert_eq!(path_from_top(&graph, 0), vec![0]);
        assert!(path_from_top(&graph, 99).is_empty());
    }
}
