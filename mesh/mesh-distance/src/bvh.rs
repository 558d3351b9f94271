//! Bounding sphere hierarchy over the triangles of a mesh.
//!
//! The tree lives in a flat arena: children are addressed by index, the root
//! is node 0, and nodes never move once pushed. Each internal node carries
//! the spheres of both children so a query can order and prune them without
//! touching the child nodes.

// Node and triangle ids are stored as u32; meshes beyond 4B triangles are unsupported.
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]

use std::cmp::Ordering;

use nalgebra::{Point3, Vector3};
use tracing::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::store::TriangleStore;

/// A sphere enclosing every vertex of a subtree.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoundingSphere {
    /// Sphere center.
    pub center: Point3<f64>,
    /// Sphere radius, never negative.
    pub radius: f64,
}

impl BoundingSphere {
    /// Signed distance from `point` to the sphere surface.
    ///
    /// Negative inside the sphere. Nothing in the subtree can be closer to
    /// `point` than this value.
    #[inline]
    #[must_use]
    pub fn surface_distance(&self, point: &Point3<f64>) -> f64 {
        (point - self.center).norm() - self.radius
    }

    /// Whether `point` lies within the sphere, allowing `tolerance` of slack.
    #[must_use]
    pub fn contains(&self, point: &Point3<f64>, tolerance: f64) -> bool {
        (point - self.center).norm() <= self.radius + tolerance
    }
}

/// A hierarchy node.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Node {
    /// Exactly one triangle.
    Leaf {
        /// Triangle id in the store.
        triangle: u32,
    },
    /// Two children and their bounding spheres.
    Internal {
        left: u32,
        right: u32,
        left_bounds: BoundingSphere,
        right_bounds: BoundingSphere,
    },
}

/// A triangle being sorted into the tree, with its corners cached.
#[derive(Debug, Clone, Copy)]
struct BuildTriangle {
    corners: [Point3<f64>; 3],
    id: u32,
}

/// Shape statistics of a built hierarchy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BvhStats {
    /// Total nodes in the arena.
    pub node_count: usize,
    /// Leaf nodes, one per triangle.
    pub leaf_count: usize,
    /// Longest root-to-leaf path, in edges.
    pub max_depth: usize,
}

/// Binary bounding sphere hierarchy with one triangle per leaf.
#[derive(Debug, Clone)]
pub struct Bvh {
    nodes: Vec<Node>,
    root_bounds: BoundingSphere,
}

impl Bvh {
    /// Build the hierarchy for every triangle in `store`.
    ///
    /// Each internal node splits its triangles at the median of their first
    /// vertex along the longest axis of the range's bounding box.
    #[must_use]
    pub fn build(store: &TriangleStore) -> Self {
        let mut triangles: Vec<BuildTriangle> = (0..store.triangle_count())
            .map(|id| BuildTriangle {
                corners: store.corners(id),
                id: id as u32,
            })
            .collect();

        // A binary tree with one triangle per leaf has 2n - 1 nodes.
        let mut nodes = Vec::with_capacity(2 * triangles.len() - 1);
        nodes.push(Node::Leaf { triangle: 0 });
        let root_bounds = build_tree(&mut nodes, 0, &mut triangles);

        let bvh = Self { nodes, root_bounds };
        debug!(
            triangles = store.triangle_count(),
            nodes = bvh.nodes.len(),
            "Built bounding sphere hierarchy"
        );
        bvh
    }

    pub(crate) fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Sphere enclosing the whole mesh.
    #[must_use]
    pub fn root_bounds(&self) -> BoundingSphere {
        self.root_bounds
    }

    /// Node, leaf and depth counts.
    #[must_use]
    pub fn stats(&self) -> BvhStats {
        let mut stats = BvhStats {
            node_count: self.nodes.len(),
            ..BvhStats::default()
        };
        self.collect_stats(0, 0, &mut stats);
        stats
    }

    fn collect_stats(&self, node: usize, depth: usize, stats: &mut BvhStats) {
        stats.max_depth = stats.max_depth.max(depth);
        match self.nodes[node] {
            Node::Leaf { .. } => stats.leaf_count += 1,
            Node::Internal { left, right, .. } => {
                self.collect_stats(left as usize, depth + 1, stats);
                self.collect_stats(right as usize, depth + 1, stats);
            }
        }
    }
}

/// Fill `nodes[node_id]` with the subtree over `triangles` and return its sphere.
fn build_tree(nodes: &mut Vec<Node>, node_id: usize, triangles: &mut [BuildTriangle]) -> BoundingSphere {
    if triangles.len() == 1 {
        let tri = triangles[0];
        nodes[node_id] = Node::Leaf { triangle: tri.id };

        let [a, b, c] = tri.corners;
        let center = Point3::from((a.coords + b.coords + c.coords) / 3.0);
        let radius = (a - center)
            .norm()
            .max((b - center).norm())
            .max((c - center).norm());
        return BoundingSphere { center, radius };
    }

    let mut lower = Vector3::repeat(f64::MAX);
    let mut upper = Vector3::repeat(f64::MIN);
    let mut sum = Vector3::zeros();
    for p in triangles.iter().flat_map(|t| t.corners.iter()) {
        sum += p.coords;
        lower = lower.inf(&p.coords);
        upper = upper.sup(&p.coords);
    }
    let center = Point3::from(sum / (3 * triangles.len()) as f64);

    let radius_sq = triangles
        .iter()
        .flat_map(|t| t.corners.iter())
        .map(|p| (p - center).norm_squared())
        .fold(0.0, f64::max);
    let bounds = BoundingSphere {
        center,
        radius: radius_sq.sqrt(),
    };

    let axis = (upper - lower).imax();
    triangles.sort_by(|a, b| {
        a.corners[0][axis]
            .partial_cmp(&b.corners[0][axis])
            .unwrap_or(Ordering::Equal)
    });

    let mid = triangles.len() / 2;
    let (left_half, right_half) = triangles.split_at_mut(mid);

    let left = nodes.len();
    nodes.push(Node::Leaf { triangle: 0 });
    let right = nodes.len();
    nodes.push(Node::Leaf { triangle: 0 });

    let left_bounds = build_tree(nodes, left, left_half);
    let right_bounds = build_tree(nodes, right, right_half);

    nodes[node_id] = Node::Internal {
        left: left as u32,
        right: right as u32,
        left_bounds,
        right_bounds,
    };

    bounds
}
