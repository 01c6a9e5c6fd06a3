use eframe::egui::{Vec2, vec2};

const LEAF_CAPACITY: usize = 8;
const MAX_DEPTH: usize = 12;

/// Axis-aligned square cell, stored as its lower corner and side length.
#[derive(Clone, Copy, Debug)]
pub(super) struct Cell {
    pub(super) min: Vec2,
    pub(super) side: f32,
}

impl Cell {
    fn enclosing(points: &[Vec2]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let (min, max) = rest
            .iter()
            .fold((*first, *first), |(min, max), point| (min.min(*point), max.max(*point)));

        if !min.is_finite() || !max.is_finite() {
            return None;
        }

        let span = max - min;
        let side = span.x.max(span.y).max(1.0) + 2.0;
        Some(Self {
            min: min - vec2(1.0, 1.0),
            side,
        })
    }

    pub(super) fn center(self) -> Vec2 {
        self.min + Vec2::splat(self.side * 0.5)
    }

    pub(super) fn contains(self, point: Vec2) -> bool {
        let max = self.min + Vec2::splat(self.side);
        point.x >= self.min.x && point.x <= max.x && point.y >= self.min.y && point.y <= max.y
    }

    fn quadrant(self, index: usize) -> Self {
        let half = self.side * 0.5;
        let offset = vec2((index & 1) as f32 * half, (index >> 1) as f32 * half);
        Self {
            min: self.min + offset,
            side: half,
        }
    }

    fn quadrant_of(self, point: Vec2) -> usize {
        let center = self.center();
        usize::from(point.x >= center.x) | (usize::from(point.y >= center.y) << 1)
    }

    /// Squared gap between two cells, zero when they touch or overlap.
    pub(super) fn gap_sq(self, other: Self) -> f32 {
        let delta =
            (self.center() - other.center()).abs() - Vec2::splat((self.side + other.side) * 0.5);
        let gap = delta.max(Vec2::ZERO);
        gap.length_sq()
    }
}

pub(super) struct QuadNode {
    pub(super) cell: Cell,
    pub(super) center_of_mass: Vec2,
    /// Number of points below this node.
    pub(super) mass: f32,
    pub(super) points: Vec<usize>,
    pub(super) children: [Option<Box<QuadNode>>; 4],
}

pub(in crate::app) struct QuadtreeCell {
    pub min: Vec2,
    pub side: f32,
    pub depth: usize,
    pub is_leaf: bool,
}

impl QuadNode {
    pub(super) fn build(positions: &[Vec2]) -> Option<Self> {
        let cell = Cell::enclosing(positions)?;
        Some(Self::subdivide(cell, (0..positions.len()).collect(), positions, 0))
    }

    fn subdivide(cell: Cell, points: Vec<usize>, positions: &[Vec2], depth: usize) -> Self {
        let mass = points.len() as f32;
        let center_of_mass = if points.is_empty() {
            cell.center()
        } else {
            points
                .iter()
                .fold(Vec2::ZERO, |sum, &index| sum + positions[index])
                / mass
        };

        let mut node = Self {
            cell,
            center_of_mass,
            mass,
            points,
            children: Default::default(),
        };

        if depth >= MAX_DEPTH || node.points.len() <= LEAF_CAPACITY {
            return node;
        }

        let mut buckets: [Vec<usize>; 4] = Default::default();
        for &index in &node.points {
            buckets[cell.quadrant_of(positions[index])].push(index);
        }

        // Coincident points cannot be separated any further.
        if buckets.iter().filter(|bucket| !bucket.is_empty()).count() < 2 {
            return node;
        }

        for (quadrant, bucket) in buckets.into_iter().enumerate() {
            if !bucket.is_empty() {
                node.children[quadrant] = Some(Box::new(Self::subdivide(
                    cell.quadrant(quadrant),
                    bucket,
                    positions,
                    depth + 1,
                )));
            }
        }
        node.points.clear();
        node
    }

    pub(super) fn is_leaf(&self) -> bool {
        self.children.iter().all(Option::is_none)
    }

    pub(super) fn child_nodes(&self) -> impl Iterator<Item = &QuadNode> {
        self.children.iter().filter_map(|child| child.as_deref())
    }
}

pub(super) fn collect_cells(node: &QuadNode, depth: usize, out: &mut Vec<QuadtreeCell>) {
    out.push(QuadtreeCell {
        min: node.cell.min,
        side: node.cell.side,
        depth,
        is_leaf: node.is_leaf(),
    });
    for child in node.child_nodes() {
        collect_cells(child, depth + 1, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_points(node: &QuadNode) -> usize {
        node.points.len() + node.child_nodes().map(count_points).sum::<usize>()
    }

    #[test]
    fn every_point_lands_in_exactly_one_leaf() {
        let positions = (0..200)
            .map(|index| {
                let angle = index as f32 * 2.399_963;
                vec2(angle.cos(), angle.sin()) * (index as f32).sqrt() * 10.0
            })
            .collect::<Vec<_>>();

        let tree = QuadNode::build(&positions).unwrap();
        assert_eq!(count_points(&tree), positions.len());
        assert_eq!(tree.mass, positions.len() as f32);
        assert!(positions.iter().all(|point| tree.cell.contains(*point)));
    }

    #[test]
    fn coincident_points_stay_in_one_leaf() {
        let positions = vec![vec2(3.0, 3.0); 20];
        let tree = QuadNode::build(&positions).unwrap();
        assert!(tree.is_leaf());
        assert_eq!(tree.points.len(), 20);
    }

    #[test]
    fn empty_input_has_no_tree() {
        assert!(QuadNode::build(&[]).is_none());
    }

    #[test]
    fn gap_between_separate_cells() {
        let a = Cell { min: vec2(0.0, 0.0), side: 2.0 };
        let b = Cell { min: vec2(5.0, 0.0), side: 2.0 };
        assert!((a.gap_sq(b) - 9.0).abs() < 1e-4);
        assert_eq!(a.gap_sq(a), 0.0);
    }
}
