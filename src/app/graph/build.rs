use eframe::egui::{Color32, Vec2};

use crate::catalog::Record;
use crate::hierarchy::{ClusterChildren, ClusterNode, Tree, build, palette_color};
use crate::util::display_value;

use super::super::physics::{ForceSettings, Simulation, initial_position};
use super::super::render_utils::to_color32;
use super::super::{
    DiagramKind, NodeKind, PhysicsScratch, RenderGraph, RenderNode, ViewModel, ViewScratch,
};
use super::interaction::DiagramInteractions;

const FALLBACK_FILL: Color32 = Color32::from_rgb(70, 130, 180);

struct Flattener<'a> {
    diagram: DiagramKind,
    records: &'a [Record],
    label_field: &'a str,
    nodes: Vec<RenderNode>,
    edges: Vec<(usize, usize)>,
    parent: Vec<Option<usize>>,
}

impl Flattener<'_> {
    fn push(
        &mut self,
        kind: NodeKind,
        label: String,
        depth: usize,
        fill: Color32,
        parent: Option<usize>,
    ) -> usize {
        let index = self.nodes.len();
        let base_radius = self.diagram.node_radius(&kind, depth);
        self.nodes.push(RenderNode {
            kind,
            label,
            depth,
            world_pos: initial_position(index),
            velocity: Vec2::ZERO,
            pinned: None,
            base_radius,
            fill,
            fill_override: None,
            radius_override: None,
        });
        self.parent.push(parent);
        if let Some(parent) = parent {
            self.edges.push((parent, index));
        }
        index
    }

    fn fill_for(&self, depth: usize, tree_color: Option<Color32>) -> Color32 {
        match self.diagram {
            DiagramKind::Clusters => tree_color.unwrap_or(FALLBACK_FILL),
            DiagramKind::Tree => to_color32(palette_color(depth)),
        }
    }

    fn add_cluster(&mut self, cluster: &ClusterNode, parent: Option<usize>) {
        let fill = self.fill_for(cluster.depth, Some(to_color32(cluster.color)));
        let index = self.push(
            NodeKind::Cluster {
                field: cluster.field.clone(),
                child_count: cluster.child_count(),
            },
            display_value(&cluster.label).to_owned(),
            cluster.depth,
            fill,
            parent,
        );

        match &cluster.children {
            ClusterChildren::Clusters(clusters) => {
                for child in clusters {
                    self.add_cluster(child, Some(index));
                }
            }
            ClusterChildren::Leaves(leaves) => {
                let depth = cluster.depth + 1;
                for leaf in leaves {
                    let label = self
                        .records
                        .get(leaf.index)
                        .and_then(|record| record.get(self.label_field))
                        .map(|value| display_value(value).to_owned())
                        .unwrap_or_else(|| format!("#{}", leaf.index + 1));
                    let fill = self.fill_for(depth, leaf.color.map(to_color32));
                    self.push(
                        NodeKind::Leaf { record: leaf.index },
                        label,
                        depth,
                        fill,
                        Some(index),
                    );
                }
            }
        }
    }
}

/// Flattens a tree into render nodes and parent-child links with fresh simulation state.
pub(in crate::app) fn render_graph_for_tree(
    tree: &Tree,
    records: &[Record],
    label_field: &str,
) -> RenderGraph {
    let diagram = DiagramKind::for_tree(tree);
    let mut flattener = Flattener {
        diagram,
        records,
        label_field,
        nodes: Vec::new(),
        edges: Vec::new(),
        parent: Vec::new(),
    };

    let root_index = match diagram {
        DiagramKind::Clusters => None,
        DiagramKind::Tree => Some(flattener.push(
            NodeKind::Root {
                record_count: tree.leaf_count(),
            },
            tree.root_label.clone(),
            0,
            to_color32(palette_color(0)),
            None,
        )),
    };
    for cluster in &tree.children {
        flattener.add_cluster(cluster, root_index);
    }

    let Flattener {
        nodes,
        edges,
        parent,
        ..
    } = flattener;
    let mut children = vec![Vec::new(); nodes.len()];
    for &(from, to) in &edges {
        children[from].push(to);
    }

    RenderGraph {
        diagram,
        nodes,
        edges,
        parent,
        children,
        root_index,
        forces: ForceSettings::for_diagram(diagram),
        simulation: Simulation::default(),
        physics_scratch: PhysicsScratch {
            impulses: Vec::new(),
            positions: Vec::new(),
            link_counts: Vec::new(),
        },
        view_scratch: ViewScratch {
            screen_positions: Vec::new(),
            screen_radii: Vec::new(),
            visible_indices: Vec::new(),
            visible_mask: Vec::new(),
            quadtree_positions: Vec::new(),
            quadtree_cells: Vec::new(),
        },
    }
}

impl ViewModel {
    pub(in crate::app) fn group_keys(&self) -> Vec<String> {
        let mut keys = vec![self.primary_key.clone()];
        let Some(secondary) = &self.secondary_key else {
            return keys;
        };
        for key in std::iter::once(secondary).chain(&self.extra_keys) {
            if !keys.contains(key) {
                keys.push(key.clone());
            }
        }
        keys
    }

    /// Regroups the catalog and replaces the diagram. On failure the previous diagram stays.
    pub(in crate::app) fn rebuild_render_graph(&mut self) {
        self.graph_dirty = false;
        let keys = self.group_keys();
        let options = self.build_options();

        let tree = match build(&self.catalog.records, &keys, &options) {
            Ok(tree) => tree,
            Err(error) => {
                tracing::warn!(?keys, "failed to regroup catalog: {error}");
                self.build_error = Some(error.to_string());
                return;
            }
        };

        let cache = render_graph_for_tree(&tree, &self.catalog.records, &self.label_field);
        tracing::debug!(
            nodes = cache.nodes.len(),
            links = cache.edges.len(),
            diagram = ?cache.diagram,
            "rebuilt render graph"
        );

        if self.graph_cache.as_ref().map(|previous| previous.diagram) != Some(cache.diagram) {
            self.pan = Vec2::ZERO;
            self.zoom = cache.diagram.initial_zoom();
        }
        self.interactions = DiagramInteractions::new(cache.diagram);
        self.render_graph_revision = self.render_graph_revision.wrapping_add(1);
        self.search_match_cache = None;
        self.selected = None;
        self.hovered = None;
        self.dragging = None;
        self.tooltip = Default::default();
        self.build_error = None;
        self.visible_node_count = cache.nodes.len();
        self.visible_edge_count = cache.edges.len();
        self.tree = Some(tree);
        self.graph_cache = Some(cache);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<Record> {
        vec![
            Record::from_iter([("producer", "A"), ("album", "X"), ("track", "t1")]),
            Record::from_iter([("producer", "A"), ("album", "Y"), ("track", "t2")]),
            Record::from_iter([("producer", "B"), ("album", "X"), ("track", "t3")]),
        ]
    }

    fn graph_for(keys: &[&str]) -> RenderGraph {
        let records = records();
        let keys = keys.iter().map(|key| key.to_string()).collect::<Vec<_>>();
        let tree = build(&records, &keys, &Default::default()).unwrap();
        render_graph_for_tree(&tree, &records, "track")
    }

    #[test]
    fn cluster_diagram_hides_the_root() {
        let graph = graph_for(&["producer"]);

        assert_eq!(graph.diagram, DiagramKind::Clusters);
        assert_eq!(graph.root_index, None);
        assert_eq!(graph.nodes.len(), 5);
        assert_eq!(graph.edges, vec![(0, 1), (0, 2), (3, 4)]);
        assert_eq!(graph.nodes[0].base_radius, 20.0);
        assert_eq!(graph.nodes[1].base_radius, 10.0);
        assert_eq!(graph.nodes[1].label, "t1");
        assert_eq!(graph.nodes[0].fill, to_color32(palette_color(0)));
        assert_eq!(graph.nodes[4].fill, to_color32(palette_color(1).brighter(1.0)));
    }

    #[test]
    fn tree_diagram_links_everything_to_the_root() {
        let graph = graph_for(&["producer", "album"]);

        assert_eq!(graph.diagram, DiagramKind::Tree);
        assert_eq!(graph.root_index, Some(0));
        // root, A, X, t1, Y, t2, B, X, t3
        assert_eq!(graph.nodes.len(), 9);
        assert_eq!(graph.edges.len(), 8);
        assert_eq!(graph.children[0], vec![1, 6]);
        assert_eq!(graph.parent[3], Some(2));
        assert_eq!(
            graph.nodes.iter().map(|node| node.depth).collect::<Vec<_>>(),
            vec![0, 1, 2, 3, 2, 3, 1, 2, 3]
        );
        assert_eq!(graph.nodes[6].base_radius, 20.0);
        assert_eq!(graph.nodes[7].base_radius, 15.0);
        assert_eq!(graph.nodes[8].base_radius, 8.0);
        assert_eq!(graph.nodes[7].fill, to_color32(palette_color(2)));
        assert_eq!(
            graph.nodes[1].kind,
            NodeKind::Cluster {
                field: "producer".to_owned(),
                child_count: 2
            }
        );
    }

    #[test]
    fn nodes_start_apart() {
        let graph = graph_for(&["producer", "album"]);
        for (index, node) in graph.nodes.iter().enumerate() {
            for other in &graph.nodes[index + 1..] {
                assert!((node.world_pos - other.world_pos).length() > 1.0);
            }
        }
    }
}
