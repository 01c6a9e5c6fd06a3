mod forces;
mod quadtree;

use eframe::egui::{Vec2, vec2};

use super::{DiagramKind, PhysicsTuning, RenderGraph, RenderNode};
use forces::{ChargeParams, CollisionParams, accumulate_charge, accumulate_collisions};
pub(in crate::app) use quadtree::QuadtreeCell;
use quadtree::{QuadNode, collect_cells};

const BARNES_HUT_THETA: f32 = 0.9;
const INITIAL_RADIUS: f32 = 10.0;

/// Forces fixed for the lifetime of one render graph.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::app) struct ForceSettings {
    pub(in crate::app) link_strength: f32,
    pub(in crate::app) charge_strength: f32,
    pub(in crate::app) center_strength: f32,
    pub(in crate::app) collide_radius: Option<f32>,
    uniform_link_distance: Option<f32>,
}

impl ForceSettings {
    pub(in crate::app) fn for_diagram(diagram: DiagramKind) -> Self {
        match diagram {
            DiagramKind::Clusters => Self {
                link_strength: 1.0,
                charge_strength: -300.0,
                center_strength: 1.0,
                collide_radius: None,
                uniform_link_distance: Some(100.0),
            },
            DiagramKind::Tree => Self {
                link_strength: 1.0,
                charge_strength: -500.0,
                center_strength: 0.1,
                collide_radius: Some(30.0),
                uniform_link_distance: None,
            },
        }
    }

    /// Rest length of a link, chosen by the depth of its child end.
    pub(in crate::app) fn link_distance(&self, target_depth: usize) -> f32 {
        if let Some(distance) = self.uniform_link_distance {
            return distance;
        }
        match target_depth {
            2 => 10.0,
            3 => 5.0,
            _ => 50.0,
        }
    }
}

/// Cooling schedule: forces are scaled by `alpha`, which eases toward `alpha_target`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::app) struct Simulation {
    pub(in crate::app) alpha: f32,
    pub(in crate::app) alpha_target: f32,
    alpha_min: f32,
    alpha_decay: f32,
    velocity_decay: f32,
    stopped: bool,
}

impl Default for Simulation {
    fn default() -> Self {
        let alpha_min = 0.001_f32;
        Self {
            alpha: 1.0,
            alpha_target: 0.0,
            alpha_min,
            alpha_decay: 1.0 - alpha_min.powf(1.0 / 300.0),
            velocity_decay: 0.4,
            stopped: false,
        }
    }
}

impl Simulation {
    pub(in crate::app) fn is_running(&self) -> bool {
        !self.stopped
    }

    pub(in crate::app) fn set_alpha_target(&mut self, target: f32) {
        self.alpha_target = target.clamp(0.0, 1.0);
    }

    pub(in crate::app) fn restart(&mut self) {
        self.stopped = false;
    }

    pub(in crate::app) fn reheat(&mut self) {
        self.alpha = 1.0;
        self.stopped = false;
    }

    /// Advances alpha by one tick. Returns the alpha to apply, or `None` once cooled.
    fn advance(&mut self) -> Option<f32> {
        if self.stopped {
            return None;
        }
        self.alpha += (self.alpha_target - self.alpha) * self.alpha_decay;
        if self.alpha < self.alpha_min {
            self.stopped = true;
        }
        Some(self.alpha)
    }
}

/// Sunflower spiral placement so freshly built nodes never start on top of each other.
pub(in crate::app) fn initial_position(index: usize) -> Vec2 {
    let golden_angle = std::f32::consts::PI * (3.0 - 5.0_f32.sqrt());
    let radius = INITIAL_RADIUS * (0.5 + index as f32).sqrt();
    let angle = index as f32 * golden_angle;
    vec2(angle.cos(), angle.sin()) * radius
}

pub(in crate::app) fn quadtree_cells(
    nodes: &[RenderNode],
    positions: &mut Vec<Vec2>,
    cells: &mut Vec<QuadtreeCell>,
) {
    positions.clear();
    positions.extend(nodes.iter().map(|node| node.world_pos));

    cells.clear();
    if let Some(quadtree) = QuadNode::build(positions) {
        collect_cells(&quadtree, 0, cells);
    }
}

/// Runs one simulation tick. Returns whether the layout is still moving.
pub(super) fn step_physics(cache: &mut RenderGraph, tuning: PhysicsTuning) -> bool {
    let node_count = cache.nodes.len();
    if node_count == 0 {
        return false;
    }
    let Some(alpha) = cache.simulation.advance() else {
        return false;
    };

    apply_links(cache, alpha, tuning.link_scale);
    apply_charge(cache, alpha, tuning.charge_scale);
    apply_center(cache, tuning.center_scale);
    if let Some(radius) = cache.forces.collide_radius {
        apply_collisions(cache, radius * tuning.collision_scale.clamp(0.0, 3.0));
    }

    let keep = 1.0 - cache.simulation.velocity_decay;
    for node in &mut cache.nodes {
        if let Some(pinned) = node.pinned {
            node.world_pos = pinned;
            node.velocity = Vec2::ZERO;
            continue;
        }
        node.velocity *= keep;
        node.world_pos += node.velocity;
    }

    cache.simulation.is_running()
}

fn apply_links(cache: &mut RenderGraph, alpha: f32, scale: f32) {
    let node_count = cache.nodes.len();
    let counts = &mut cache.physics_scratch.link_counts;
    counts.clear();
    counts.resize(node_count, 0);
    for &(source, target) in &cache.edges {
        if source < node_count && target < node_count {
            counts[source] += 1;
            counts[target] += 1;
        }
    }

    let strength = cache.forces.link_strength * scale.clamp(0.0, 3.0);
    for &(source, target) in &cache.edges {
        if source >= node_count || target >= node_count || source == target {
            continue;
        }

        let source_node = &cache.nodes[source];
        let target_node = &cache.nodes[target];
        let mut delta = (target_node.world_pos + target_node.velocity)
            - (source_node.world_pos + source_node.velocity);
        if delta.length_sq() == 0.0 {
            let angle = ((target as f32) * 0.618_034 + 0.11) * std::f32::consts::TAU;
            delta = vec2(angle.cos(), angle.sin()) * 1e-3;
        }
        let length = delta.length();
        let rest = cache.forces.link_distance(target_node.depth);
        let correction = delta * ((length - rest) / length * alpha * strength);

        let source_links = counts[source] as f32;
        let bias = source_links / (source_links + counts[target] as f32);
        cache.nodes[target].velocity -= correction * bias;
        cache.nodes[source].velocity += correction * (1.0 - bias);
    }
}

fn apply_charge(cache: &mut RenderGraph, alpha: f32, scale: f32) {
    let scratch = &mut cache.physics_scratch;
    scratch.positions.clear();
    scratch
        .positions
        .extend(cache.nodes.iter().map(|node| node.world_pos));
    scratch.impulses.clear();
    scratch.impulses.resize(cache.nodes.len(), Vec2::ZERO);

    let Some(quadtree) = QuadNode::build(&scratch.positions) else {
        return;
    };
    let params = ChargeParams {
        weight: cache.forces.charge_strength * scale.clamp(0.0, 3.0) * alpha,
        theta: BARNES_HUT_THETA,
    };
    for (index, impulse) in scratch.impulses.iter_mut().enumerate() {
        accumulate_charge(&quadtree, index, &scratch.positions, params, impulse);
    }

    for (node, impulse) in cache.nodes.iter_mut().zip(&scratch.impulses) {
        node.velocity += *impulse;
    }
}

fn apply_center(cache: &mut RenderGraph, scale: f32) {
    let strength = (cache.forces.center_strength * scale).clamp(0.0, 1.0);
    if strength <= 0.0 {
        return;
    }

    let mean = cache
        .nodes
        .iter()
        .fold(Vec2::ZERO, |sum, node| sum + node.world_pos)
        / cache.nodes.len() as f32;
    let shift = mean * strength;
    for node in &mut cache.nodes {
        node.world_pos -= shift;
    }
}

fn apply_collisions(cache: &mut RenderGraph, radius: f32) {
    if radius <= 0.0 {
        return;
    }

    let scratch = &mut cache.physics_scratch;
    scratch.positions.clear();
    scratch
        .positions
        .extend(cache.nodes.iter().map(|node| node.world_pos + node.velocity));
    scratch.impulses.clear();
    scratch.impulses.resize(cache.nodes.len(), Vec2::ZERO);

    let Some(quadtree) = QuadNode::build(&scratch.positions) else {
        return;
    };
    let radii = vec![radius; cache.nodes.len()];
    let reach = radius * 2.0;
    accumulate_collisions(
        &quadtree,
        &quadtree,
        true,
        &scratch.positions,
        &radii,
        CollisionParams {
            strength: 1.0,
            reach_sq: reach * reach,
        },
        &mut scratch.impulses,
    );

    for (node, impulse) in cache.nodes.iter_mut().zip(&scratch.impulses) {
        node.velocity += *impulse;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::NodeKind;
    use crate::app::graph::render_graph_for_tree;
    use crate::catalog::Record;
    use crate::hierarchy::{BuildOptions, build};

    fn tuning() -> PhysicsTuning {
        PhysicsTuning {
            link_scale: 1.0,
            charge_scale: 1.0,
            center_scale: 1.0,
            collision_scale: 1.0,
        }
    }

    fn sample_graph(keys: &[&str]) -> RenderGraph {
        let records = (0..24)
            .map(|index| {
                Record::from_iter([
                    ("producer", format!("p{}", index % 3)),
                    ("album", format!("a{}", index % 5)),
                    ("track", format!("t{index}")),
                ])
            })
            .collect::<Vec<_>>();
        let keys = keys.iter().map(|key| key.to_string()).collect::<Vec<_>>();
        let tree = build(&records, &keys, &BuildOptions::default()).unwrap();
        render_graph_for_tree(&tree, &records, "track")
    }

    #[test]
    fn simulation_cools_down_and_stays_finite() {
        let mut graph = sample_graph(&["producer", "album"]);
        let mut ticks = 0;
        while step_physics(&mut graph, tuning()) {
            ticks += 1;
            assert!(ticks < 1_000, "simulation never cooled");
        }

        assert!(ticks > 200);
        assert!(!graph.simulation.is_running());
        assert!(graph.nodes.iter().all(|node| node.world_pos.is_finite()));
        assert!(!step_physics(&mut graph, tuning()));
    }

    #[test]
    fn cluster_layout_keeps_links_near_rest_length() {
        let mut graph = sample_graph(&["producer"]);
        while step_physics(&mut graph, tuning()) {}

        for &(parent, child) in &graph.edges {
            let length = (graph.nodes[parent].world_pos - graph.nodes[child].world_pos).length();
            assert!(length > 40.0 && length < 250.0, "link length {length}");
        }
    }

    #[test]
    fn pinned_nodes_hold_their_position() {
        let mut graph = sample_graph(&["producer", "album"]);
        let pin = vec2(400.0, -250.0);
        let leaf = graph
            .nodes
            .iter()
            .position(|node| matches!(node.kind, NodeKind::Leaf { .. }))
            .unwrap();
        graph.nodes[leaf].pinned = Some(pin);

        for _ in 0..50 {
            step_physics(&mut graph, tuning());
        }
        assert_eq!(graph.nodes[leaf].world_pos, pin);
        assert_eq!(graph.nodes[leaf].velocity, Vec2::ZERO);
    }

    #[test]
    fn alpha_target_keeps_the_simulation_warm() {
        let mut simulation = Simulation::default();
        simulation.set_alpha_target(0.3);
        for _ in 0..2_000 {
            assert!(simulation.advance().is_some());
        }
        assert!((simulation.alpha - 0.3).abs() < 0.01);

        simulation.set_alpha_target(0.0);
        let mut ticks = 0;
        while simulation.advance().is_some() {
            ticks += 1;
        }
        assert!(ticks > 100);
        assert!(!simulation.is_running());

        simulation.restart();
        assert!(simulation.is_running());
    }

    #[test]
    fn link_distances_follow_the_diagram() {
        let clusters = ForceSettings::for_diagram(DiagramKind::Clusters);
        assert_eq!(clusters.link_distance(1), 100.0);
        assert_eq!(clusters.link_distance(3), 100.0);

        let tree = ForceSettings::for_diagram(DiagramKind::Tree);
        assert_eq!(tree.link_distance(1), 50.0);
        assert_eq!(tree.link_distance(2), 10.0);
        assert_eq!(tree.link_distance(3), 5.0);
        assert_eq!(tree.link_distance(4), 50.0);
        assert_eq!(tree.collide_radius, Some(30.0));
    }

    #[test]
    fn initial_positions_spiral_outward() {
        let first = initial_position(0);
        let later = initial_position(40);
        assert!(first.length() < later.length());
        assert!((first.length() - INITIAL_RADIUS * 0.5_f32.sqrt()).abs() < 1e-4);
    }
}
