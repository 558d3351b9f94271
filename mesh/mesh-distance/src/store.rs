//! Immutable triangle geometry.

use nalgebra::Point3;

use crate::error::{DistanceError, DistanceResult};

/// A mesh owned elsewhere that can hand its geometry to a [`TriangleStore`].
///
/// Implement this for whatever mesh type the caller already has (an indexed
/// mesh, a loader's output, a half-edge structure) to build a distance
/// structure without going through flat buffers.
///
/// # Example
///
/// ```
/// use mesh_distance::{MeshSource, TriangleStore};
/// use nalgebra::Point3;
///
/// struct Quad {
///     corners: [[f64; 3]; 4],
/// }
///
/// impl MeshSource for Quad {
///     fn vertex_count(&self) -> usize {
///         4
///     }
///     fn triangle_count(&self) -> usize {
///         2
///     }
///     fn positions(&self) -> impl Iterator<Item = Point3<f64>> {
///         self.corners.iter().map(|c| Point3::new(c[0], c[1], c[2]))
///     }
///     fn triangles(&self) -> impl Iterator<Item = [u32; 3]> {
///         [[0, 1, 2], [0, 2, 3]].into_iter()
///     }
/// }
///
/// let quad = Quad {
///     corners: [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
/// };
/// let store = TriangleStore::from_source(&quad).unwrap();
/// assert_eq!(store.triangle_count(), 2);
/// ```
pub trait MeshSource {
    /// Number of vertices.
    fn vertex_count(&self) -> usize;

    /// Number of triangles.
    fn triangle_count(&self) -> usize;

    /// Vertex positions in index order.
    fn positions(&self) -> impl Iterator<Item = Point3<f64>>;

    /// Triangles as vertex index triples, in id order.
    fn triangles(&self) -> impl Iterator<Item = [u32; 3]>;
}

/// Vertex positions and triangle index triples.
///
/// Every index is checked against the vertex count when the store is
/// created, so the triangle accessors never go out of bounds.
#[derive(Debug, Clone)]
pub struct TriangleStore {
    vertices: Vec<Point3<f64>>,
    triangles: Vec<[u32; 3]>,
}

impl TriangleStore {
    /// Build a store from owned positions and index triples.
    ///
    /// # Errors
    ///
    /// Returns [`DistanceError::EmptyMesh`] if `triangles` is empty and
    /// [`DistanceError::IndexOutOfRange`] if any index is not a vertex.
    pub fn new(vertices: Vec<Point3<f64>>, triangles: Vec<[u32; 3]>) -> DistanceResult<Self> {
        if triangles.is_empty() {
            return Err(DistanceError::empty_mesh());
        }

        let vertex_count = vertices.len();
        for (triangle, face) in triangles.iter().enumerate() {
            if let Some(&index) = face.iter().find(|&&i| i as usize >= vertex_count) {
                return Err(DistanceError::IndexOutOfRange {
                    triangle,
                    index,
                    vertex_count,
                });
            }
        }

        Ok(Self {
            vertices,
            triangles,
        })
    }

    /// Build a store from interleaved buffers with explicit counts.
    ///
    /// `positions` holds `[x0, y0, z0, x1, ...]` and `indices` holds
    /// `[a0, b0, c0, a1, ...]`.
    ///
    /// # Errors
    ///
    /// Returns [`DistanceError::BufferLength`] if a buffer does not hold
    /// exactly three values per declared element, plus the errors of
    /// [`TriangleStore::new`].
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_distance::TriangleStore;
    ///
    /// let positions = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
    /// let store = TriangleStore::from_flat(&positions, 3, &[0, 1, 2], 1).unwrap();
    /// assert_eq!(store.vertex_count(), 3);
    /// ```
    pub fn from_flat(
        positions: &[f64],
        vertex_count: usize,
        indices: &[u32],
        triangle_count: usize,
    ) -> DistanceResult<Self> {
        let expected_positions = vertex_count.checked_mul(3).unwrap_or(usize::MAX);
        if positions.len() != expected_positions {
            return Err(DistanceError::buffer_length(
                "position",
                expected_positions,
                positions.len(),
            ));
        }
        let expected_indices = triangle_count.checked_mul(3).unwrap_or(usize::MAX);
        if indices.len() != expected_indices {
            return Err(DistanceError::buffer_length(
                "index",
                expected_indices,
                indices.len(),
            ));
        }

        let vertices = positions
            .chunks_exact(3)
            .map(|c| Point3::new(c[0], c[1], c[2]))
            .collect();
        let triangles = indices
            .chunks_exact(3)
            .map(|c| [c[0], c[1], c[2]])
            .collect();

        Self::new(vertices, triangles)
    }

    /// Build a store from coordinate triples and index triples.
    ///
    /// # Errors
    ///
    /// Same as [`TriangleStore::new`].
    pub fn from_arrays(vertices: &[[f64; 3]], triangles: &[[u32; 3]]) -> DistanceResult<Self> {
        let vertices = vertices
            .iter()
            .map(|v| Point3::new(v[0], v[1], v[2]))
            .collect();
        Self::new(vertices, triangles.to_vec())
    }

    /// Copy the geometry out of an external mesh.
    ///
    /// # Errors
    ///
    /// Same as [`TriangleStore::new`].
    pub fn from_source<M: MeshSource + ?Sized>(mesh: &M) -> DistanceResult<Self> {
        let mut vertices = Vec::with_capacity(mesh.vertex_count());
        vertices.extend(mesh.positions());
        let mut triangles = Vec::with_capacity(mesh.triangle_count());
        triangles.extend(mesh.triangles());
        Self::new(vertices, triangles)
    }

    /// Vertex positions.
    #[must_use]
    pub fn vertices(&self) -> &[Point3<f64>] {
        &self.vertices
    }

    /// Triangle index triples.
    #[must_use]
    pub fn triangles(&self) -> &[[u32; 3]] {
        &self.triangles
    }

    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of triangles.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Positions of the three corners of triangle `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not a triangle id of this store.
    #[inline]
    #[must_use]
    pub fn corners(&self, id: usize) -> [Point3<f64>; 3] {
        let [a, b, c] = self.triangles[id];
        [
            self.vertices[a as usize],
            self.vertices[b as usize],
            self.vertices[c as usize],
        ]
    }

    /// Ids of triangles whose doubled area squared is at most `epsilon`.
    #[must_use]
    pub fn degenerate_triangles(&self, epsilon: f64) -> Vec<usize> {
        (0..self.triangles.len())
            .filter(|&id| {
                let [v0, v1, v2] = self.corners(id);
                (v1 - v0).cross(&(v2 - v0)).norm_squared() <= epsilon
            })
            .collect()
    }
}

impl MeshSource for TriangleStore {
    fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    fn positions(&self) -> impl Iterator<Item = Point3<f64>> {
        self.vertices.iter().copied()
    }

    fn triangles(&self) -> impl Iterator<Item = [u32; 3]> {
        self.triangles.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_triangle() -> TriangleStore {
        TriangleStore::from_arrays(
            &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            &[[0, 1, 2]],
        )
        .unwrap()
    }

    #[test]
    fn store_from_arrays() {
        let store = unit_triangle();
        assert_eq!(store.vertex_count(), 3);
        assert_eq!(store.triangle_count(), 1);
        assert_eq!(store.corners(0)[1], Point3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn store_empty_triangles() {
        let result = TriangleStore::from_arrays(&[[0.0, 0.0, 0.0]], &[]);
        assert_eq!(result.unwrap_err(), DistanceError::EmptyMesh);
    }

    #[test]
    fn store_index_out_of_range() {
        let result = TriangleStore::from_arrays(
            &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            &[[0, 1, 2], [1, 2, 3]],
        );
        assert_eq!(
            result.unwrap_err(),
            DistanceError::IndexOutOfRange {
                triangle: 1,
                index: 3,
                vertex_count: 3,
            }
        );
    }

    #[test]
    fn store_from_flat() {
        let positions = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let store = TriangleStore::from_flat(&positions, 3, &[0, 1, 2], 1).unwrap();
        assert_eq!(store.triangles(), &[[0, 1, 2]]);
    }

    #[test]
    fn store_from_flat_bad_lengths() {
        let positions = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0];
        let err = TriangleStore::from_flat(&positions, 3, &[0, 1, 2], 1).unwrap_err();
        assert_eq!(err, DistanceError::buffer_length("position", 9, 8));

        let positions = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let err = TriangleStore::from_flat(&positions, 3, &[0, 1, 2], 2).unwrap_err();
        assert_eq!(err, DistanceError::buffer_length("index", 6, 3));
    }

    #[test]
    fn store_from_flat_huge_counts() {
        let positions = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let err = TriangleStore::from_flat(&positions, usize::MAX, &[0, 1, 2], 1).unwrap_err();
        assert_eq!(err, DistanceError::buffer_length("position", usize::MAX, 9));

        let err = TriangleStore::from_flat(&positions, 3, &[0, 1, 2], usize::MAX / 2).unwrap_err();
        assert_eq!(err, DistanceError::buffer_length("index", usize::MAX, 3));
    }

    #[test]
    fn store_from_source_round_trip() {
        let store = unit_triangle();
        let copy = TriangleStore::from_source(&store).unwrap();
        assert_eq!(copy.vertices(), store.vertices());
        assert_eq!(copy.triangles(), store.triangles());
    }

    #[test]
    fn store_degenerate_triangles() {
        let store = TriangleStore::from_arrays(
            &[
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                [2.0, 0.0, 0.0],
            ],
            &[[0, 1, 2], [0, 1, 3]],
        )
        .unwrap();
        assert_eq!(store.degenerate_triangles(1e-24), vec![1]);
    }
}
