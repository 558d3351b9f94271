//! Nearest-triangle search.
//!
//! Branch and bound over the sphere hierarchy: the nearer child is visited
//! first, and a child is skipped once its sphere surface is no closer than
//! the best triangle found so far. Spheres enclose their subtrees exactly,
//! so a skipped child can never hold a closer point.

use nalgebra::Point3;

use crate::bvh::{Bvh, Node};
use crate::primitive::{TriangleProjection, closest_point_on_triangle};
use crate::result::Nearest;
use crate::store::TriangleStore;

/// Best candidate so far. The squared distance decides replacement; its
/// square root is kept alongside for sphere pruning.
struct Best {
    distance_squared: f64,
    distance: f64,
    projection: Option<(TriangleProjection, usize)>,
}

impl Best {
    const fn new() -> Self {
        Self {
            distance_squared: f64::INFINITY,
            distance: f64::INFINITY,
            projection: None,
        }
    }

    /// Replace the best if triangle `id` is strictly closer.
    #[inline]
    fn consider(&mut self, store: &TriangleStore, id: usize, point: &Point3<f64>) {
        let [v0, v1, v2] = store.corners(id);
        let hit = closest_point_on_triangle(*point, v0, v1, v2);
        if hit.distance_squared < self.distance_squared {
            self.distance_squared = hit.distance_squared;
            self.distance = hit.distance_squared.sqrt();
            self.projection = Some((hit, id));
        }
    }

    fn finish(self) -> Nearest {
        match self.projection {
            Some((hit, id)) => Nearest {
                distance: self.distance,
                nearest_point: hit.point,
                nearest_entity: hit.entity,
                triangle_id: id,
            },
            None => Nearest::unset(),
        }
    }
}

/// Closest point on the mesh to `point`, using the hierarchy.
#[must_use]
pub(crate) fn nearest(bvh: &Bvh, store: &TriangleStore, point: &Point3<f64>) -> Nearest {
    let mut best = Best::new();
    visit(bvh.nodes(), store, 0, point, &mut best);
    best.finish()
}

fn visit(nodes: &[Node], store: &TriangleStore, node: usize, point: &Point3<f64>, best: &mut Best) {
    match nodes[node] {
        Node::Leaf { triangle } => best.consider(store, triangle as usize, point),
        Node::Internal {
            left,
            right,
            left_bounds,
            right_bounds,
        } => {
            let d_left = left_bounds.surface_distance(point);
            let d_right = right_bounds.surface_distance(point);

            let ((first, d_first), (second, d_second)) = if d_left < d_right {
                ((left, d_left), (right, d_right))
            } else {
                ((right, d_right), (left, d_left))
            };

            if d_first < best.distance {
                visit(nodes, store, first as usize, point, best);
            }
            if d_second < best.distance {
                visit(nodes, store, second as usize, point, best);
            }
        }
    }
}

/// Closest point on the mesh to `point`, testing every triangle.
///
/// Linear in the triangle count. Uses the same tie rule as the hierarchy
/// search (the first strictly closer triangle wins), which makes it a
/// reference for checking [`MeshDistance`](crate::MeshDistance) results.
///
/// # Example
///
/// ```
/// use mesh_distance::{brute_force_nearest, TriangleStore};
/// use nalgebra::Point3;
///
/// let store = TriangleStore::from_arrays(
///     &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
///     &[[0, 1, 2]],
/// )
/// .unwrap();
/// let hit = brute_force_nearest(&store, &Point3::new(0.25, 0.25, 1.0));
/// assert!((hit.distance - 1.0).abs() < 1e-12);
/// ```
#[must_use]
pub fn brute_force_nearest(store: &TriangleStore, point: &Point3<f64>) -> Nearest {
    let mut best = Best::new();
    for id in 0..store.triangle_count() {
        best.consider(store, id, point);
    }
    best.finish()
}
