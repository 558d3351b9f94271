//! Angle-weighted pseudonormals for inside/outside classification.
//!
//! Every feature a closest point can land on gets one outward direction:
//! the face normal for triangle interiors, the average of the (at most two)
//! adjacent face normals for edges, and the angle-weighted sum of incident
//! face normals for vertices (Bærentzen & Aanæs). The sign of
//! `(p - closest) · pseudonormal` is then correct for watertight,
//! consistently wound meshes.

use hashbrown::HashMap;
use nalgebra::Vector3;
use rayon::prelude::*;
use tracing::warn;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::primitive::NearestEntity;
use crate::store::TriangleStore;

/// Edge adjacency summary gathered while building the pseudonormals.
///
/// # Example
///
/// ```
/// use mesh_distance::EdgeReport;
///
/// let report = EdgeReport::default();
/// assert!(report.is_watertight());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EdgeReport {
    /// Number of distinct undirected edges.
    pub edge_count: usize,
    /// Edges used by exactly one triangle.
    pub boundary_edges: usize,
    /// Edges used by more than two triangles.
    pub non_manifold_edges: usize,
}

impl EdgeReport {
    /// True when every edge is shared by exactly two triangles.
    #[must_use]
    pub const fn is_watertight(&self) -> bool {
        self.boundary_edges == 0 && self.non_manifold_edges == 0
    }
}

/// Per-face, per-vertex and per-edge unit normals of a mesh.
#[derive(Debug, Clone)]
pub struct PseudoNormals {
    faces: Vec<Vector3<f64>>,
    vertices: Vec<Vector3<f64>>,
    /// Slots follow [`NearestEntity::edge`]: `E01`, `E12`, `E02`.
    edges: Vec<[Vector3<f64>; 3]>,
}

impl PseudoNormals {
    /// Compute all pseudonormal tables for `store`.
    ///
    /// When `parallel` is set the face normals are computed with rayon.
    /// Open or non-manifold edges are counted, logged, and returned in the
    /// [`EdgeReport`]; they never fail the computation.
    #[must_use]
    pub fn compute(store: &TriangleStore, parallel: bool) -> (Self, EdgeReport) {
        let triangle_count = store.triangle_count();

        let faces: Vec<Vector3<f64>> = if parallel {
            (0..triangle_count)
                .into_par_iter()
                .map(|id| face_normal(store, id))
                .collect()
        } else {
            (0..triangle_count).map(|id| face_normal(store, id)).collect()
        };

        let mut vertices = vec![Vector3::zeros(); store.vertex_count()];
        let mut edge_sums: HashMap<(u32, u32), (Vector3<f64>, u32)> =
            HashMap::with_capacity(triangle_count * 3 / 2);

        for (id, &[i0, i1, i2]) in store.triangles().iter().enumerate() {
            let normal = faces[id];
            let [a, b, c] = store.corners(id);

            let alpha0 = corner_angle(b - a, c - a);
            let alpha1 = corner_angle(a - b, c - b);
            let alpha2 = corner_angle(b - c, a - c);
            vertices[i0 as usize] += normal * alpha0;
            vertices[i1 as usize] += normal * alpha1;
            vertices[i2 as usize] += normal * alpha2;

            for (u, v) in [(i0, i1), (i1, i2), (i0, i2)] {
                let entry = edge_sums
                    .entry(edge_key(u, v))
                    .or_insert((Vector3::zeros(), 0));
                entry.0 += normal;
                entry.1 += 1;
            }
        }

        for normal in &mut vertices {
            *normal = unit_or_zero(*normal);
        }

        let edges = store
            .triangles()
            .iter()
            .map(|&[i0, i1, i2]| {
                [(i0, i1), (i1, i2), (i0, i2)].map(|(u, v)| {
                    edge_sums
                        .get(&edge_key(u, v))
                        .map_or_else(Vector3::zeros, |&(sum, _)| unit_or_zero(sum))
                })
            })
            .collect();

        let report = EdgeReport {
            edge_count: edge_sums.len(),
            boundary_edges: edge_sums.values().filter(|&&(_, n)| n == 1).count(),
            non_manifold_edges: edge_sums.values().filter(|&&(_, n)| n > 2).count(),
        };

        if !report.is_watertight() {
            warn!(
                boundary_edges = report.boundary_edges,
                non_manifold_edges = report.non_manifold_edges,
                "Mesh is not watertight; signed distance sign is unreliable"
            );
        }

        (
            Self {
                faces,
                vertices,
                edges,
            },
            report,
        )
    }

    /// Face normal of triangle `id`.
    #[must_use]
    pub fn face(&self, id: usize) -> Vector3<f64> {
        self.faces[id]
    }

    /// Angle-weighted normal of vertex `index`.
    #[must_use]
    pub fn vertex(&self, index: usize) -> Vector3<f64> {
        self.vertices[index]
    }

    /// Normal of edge `slot` (0 = `E01`, 1 = `E12`, 2 = `E02`) of triangle `id`.
    #[must_use]
    pub fn edge(&self, id: usize, slot: usize) -> Vector3<f64> {
        self.edges[id][slot]
    }

    /// Pseudonormal of the feature `entity` of triangle `id`.
    #[must_use]
    pub fn for_entity(
        &self,
        store: &TriangleStore,
        id: usize,
        entity: NearestEntity,
    ) -> Vector3<f64> {
        if let Some(corner) = entity.vertex() {
            self.vertex(store.triangles()[id][corner] as usize)
        } else if let Some(slot) = entity.edge() {
            self.edge(id, slot)
        } else {
            self.face(id)
        }
    }
}

fn face_normal(store: &TriangleStore, id: usize) -> Vector3<f64> {
    let [a, b, c] = store.corners(id);
    unit_or_zero((b - a).cross(&(c - a)))
}

/// Interior angle between two edge vectors leaving the same corner.
fn corner_angle(e1: Vector3<f64>, e2: Vector3<f64>) -> f64 {
    unit_or_zero(e1)
        .dot(&unit_or_zero(e2))
        .clamp(-1.0, 1.0)
        .acos()
}

fn unit_or_zero(v: Vector3<f64>) -> Vector3<f64> {
    v.try_normalize(0.0).unwrap_or_else(Vector3::zeros)
}

/// Order-independent key for the undirected edge `(u, v)`.
#[inline]
fn edge_key(u: u32, v: u32) -> (u32, u32) {
    if u < v { (u, v) } else { (v, u) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_1_SQRT_2;

    /// Two triangles folded 90 degrees along the shared edge 0-1.
    fn folded_pair() -> TriangleStore {
        TriangleStore::from_arrays(
            &[
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                [0.0, 0.0, 1.0],
            ],
            // Normals -Z and -Y.
            &[[0, 2, 1], [0, 1, 3]],
        )
        .unwrap()
    }

    fn tetrahedron() -> TriangleStore {
        TriangleStore::from_arrays(
            &[
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                [0.0, 0.0, 1.0],
            ],
            &[[0, 2, 1], [0, 1, 3], [0, 3, 2], [1, 2, 3]],
        )
        .unwrap()
    }

    #[test]
    fn face_normals_follow_winding() {
        let (normals, _) = PseudoNormals::compute(&folded_pair(), false);
        assert_relative_eq!(normals.face(0), Vector3::new(0.0, 0.0, -1.0), epsilon = 1e-12);
        assert_relative_eq!(normals.face(1), Vector3::new(0.0, -1.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn shared_edge_averages_faces() {
        let (normals, report) = PseudoNormals::compute(&folded_pair(), false);

        let expected = Vector3::new(0.0, -FRAC_1_SQRT_2, -FRAC_1_SQRT_2);
        // Edge 0-1 is E02 of [0, 2, 1] and E01 of [0, 1, 3].
        assert_relative_eq!(normals.edge(0, 2), expected, epsilon = 1e-12);
        assert_relative_eq!(normals.edge(1, 0), expected, epsilon = 1e-12);

        assert_eq!(report.edge_count, 5);
        assert_eq!(report.boundary_edges, 4);
        assert!(!report.is_watertight());
    }

    #[test]
    fn vertex_normals_are_angle_weighted() {
        let (normals, _) = PseudoNormals::compute(&folded_pair(), false);

        // Both faces meet vertex 0 with a right angle, so the weights match.
        let expected = Vector3::new(0.0, -FRAC_1_SQRT_2, -FRAC_1_SQRT_2);
        assert_relative_eq!(normals.vertex(0), expected, epsilon = 1e-12);
        // Vertex 2 only touches the -Z face.
        assert_relative_eq!(normals.vertex(2), Vector3::new(0.0, 0.0, -1.0), epsilon = 1e-12);
    }

    #[test]
    fn tetrahedron_is_watertight() {
        let (normals, report) = PseudoNormals::compute(&tetrahedron(), false);
        assert!(report.is_watertight());
        assert_eq!(report.edge_count, 6);

        // The corner at the origin points away from the solid.
        let n = normals.vertex(0);
        assert!(n.x < 0.0 && n.y < 0.0 && n.z < 0.0);
        assert_relative_eq!(n.norm(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn parallel_matches_sequential() {
        let store = tetrahedron();
        let (a, ra) = PseudoNormals::compute(&store, false);
        let (b, rb) = PseudoNormals::compute(&store, true);
        assert_eq!(ra, rb);
        for id in 0..store.triangle_count() {
            assert_eq!(a.face(id), b.face(id));
            for slot in 0..3 {
                assert_eq!(a.edge(id, slot), b.edge(id, slot));
            }
        }
    }

    #[test]
    fn non_manifold_edge_is_counted() {
        let store = TriangleStore::from_arrays(
            &[
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                [0.0, 0.0, 1.0],
                [0.0, -1.0, 0.0],
            ],
            &[[0, 1, 2], [0, 1, 3], [0, 1, 4]],
        )
        .unwrap();
        let (_, report) = PseudoNormals::compute(&store, false);
        assert_eq!(report.non_manifold_edges, 1);
        assert!(!report.is_watertight());
    }

    #[test]
    fn degenerate_triangle_has_zero_normal() {
        let store = TriangleStore::from_arrays(
            &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]],
            &[[0, 1, 2]],
        )
        .unwrap();
        let (normals, _) = PseudoNormals::compute(&store, false);
        assert_eq!(normals.face(0), Vector3::zeros());
        assert!(normals.vertex(1).iter().all(|c| c.is_finite()));
    }

    #[test]
    fn entity_lookup() {
        let store = folded_pair();
        let (normals, _) = PseudoNormals::compute(&store, false);
        assert_eq!(
            normals.for_entity(&store, 1, NearestEntity::F),
            normals.face(1)
        );
        assert_eq!(
            normals.for_entity(&store, 1, NearestEntity::V2),
            normals.vertex(3)
        );
        assert_eq!(
            normals.for_entity(&store, 0, NearestEntity::E12),
            normals.edge(0, 1)
        );
    }
}
