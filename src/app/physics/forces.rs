use eframe::egui::{Vec2, vec2};

use super::quadtree::QuadNode;

/// Direction used when two points coincide, spread by golden-angle steps.
fn separation_direction(from: usize, to: usize) -> Vec2 {
    let angle = ((from as f32) * 0.618_034 + (to as f32) * 0.414_214) * std::f32::consts::TAU;
    vec2(angle.cos(), angle.sin()) * 1e-3
}

/// Velocity change on a point at `point` from a charge of `weight` sitting at `other`.
///
/// Negative weights push apart. Distances below one unit are softened.
fn charge_between(point: Vec2, other: Vec2, weight: f32, jitter: Vec2) -> Vec2 {
    let mut delta = other - point;
    let mut distance_sq = delta.length_sq();
    if distance_sq == 0.0 {
        delta = jitter;
        distance_sq = delta.length_sq();
    }
    if distance_sq < 1.0 {
        distance_sq = distance_sq.sqrt();
    }
    delta * (weight / distance_sq)
}

#[derive(Clone, Copy)]
pub(super) struct ChargeParams {
    /// Per-node charge already multiplied by alpha.
    pub(super) weight: f32,
    pub(super) theta: f32,
}

pub(super) fn accumulate_charge(
    node: &QuadNode,
    index: usize,
    positions: &[Vec2],
    params: ChargeParams,
    impulse: &mut Vec2,
) {
    if node.mass <= 0.0 {
        return;
    }

    let point = positions[index];

    if node.is_leaf() {
        for &other in &node.points {
            if other != index {
                *impulse += charge_between(
                    point,
                    positions[other],
                    params.weight,
                    separation_direction(index, other),
                );
            }
        }
        return;
    }

    let distance = (node.center_of_mass - point).length().max(1e-4);
    let far_enough = !node.cell.contains(point) && node.cell.side / distance < params.theta;
    if far_enough {
        *impulse += charge_between(
            point,
            node.center_of_mass,
            params.weight * node.mass,
            Vec2::ZERO,
        );
        return;
    }

    for child in node.child_nodes() {
        accumulate_charge(child, index, positions, params, impulse);
    }
}

#[derive(Clone, Copy)]
pub(super) struct CollisionParams {
    pub(super) strength: f32,
    pub(super) reach_sq: f32,
}

fn resolve_overlap(
    from: usize,
    to: usize,
    positions: &[Vec2],
    radii: &[f32],
    strength: f32,
    impulses: &mut [Vec2],
) {
    let reach = radii[from] + radii[to];
    let mut delta = positions[from] - positions[to];
    let mut distance_sq = delta.length_sq();
    if distance_sq >= reach * reach {
        return;
    }
    if distance_sq == 0.0 {
        delta = separation_direction(from, to);
        distance_sq = delta.length_sq();
    }

    let distance = distance_sq.sqrt();
    let push = delta * ((reach - distance) / distance * strength);
    let from_sq = radii[from] * radii[from];
    let to_sq = radii[to] * radii[to];
    let share = if from_sq + to_sq > 0.0 {
        to_sq / (from_sq + to_sq)
    } else {
        0.5
    };

    impulses[from] += push * share;
    impulses[to] -= push * (1.0 - share);
}

/// Pushes apart every pair of circles that overlap, visiting only cell pairs within reach.
pub(super) fn accumulate_collisions(
    node_a: &QuadNode,
    node_b: &QuadNode,
    same_node: bool,
    positions: &[Vec2],
    radii: &[f32],
    params: CollisionParams,
    impulses: &mut [Vec2],
) {
    if node_a.cell.gap_sq(node_b.cell) > params.reach_sq {
        return;
    }

    if node_a.is_leaf() && node_b.is_leaf() {
        if same_node {
            for (offset, &from) in node_a.points.iter().enumerate() {
                for &to in &node_a.points[offset + 1..] {
                    resolve_overlap(from, to, positions, radii, params.strength, impulses);
                }
            }
        } else {
            for &from in &node_a.points {
                for &to in &node_b.points {
                    resolve_overlap(from, to, positions, radii, params.strength, impulses);
                }
            }
        }
        return;
    }

    if same_node {
        let children = node_a.child_nodes().collect::<Vec<_>>();
        for (offset, child_a) in children.iter().enumerate() {
            accumulate_collisions(child_a, child_a, true, positions, radii, params, impulses);
            for child_b in &children[offset + 1..] {
                accumulate_collisions(child_a, child_b, false, positions, radii, params, impulses);
            }
        }
        return;
    }

    let split_a = !node_a.is_leaf() && (node_b.is_leaf() || node_a.cell.side >= node_b.cell.side);
    if split_a {
        for child in node_a.child_nodes() {
            accumulate_collisions(child, node_b, false, positions, radii, params, impulses);
        }
    } else {
        for child in node_b.child_nodes() {
            accumulate_collisions(node_a, child, false, positions, radii, params, impulses);
        }
    }
}
