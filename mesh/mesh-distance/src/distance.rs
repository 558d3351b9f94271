//! Signed and unsigned distance from points to a triangle mesh.

use nalgebra::Point3;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::bvh::{BoundingSphere, Bvh, BvhStats};
use crate::error::{DistanceError, DistanceResult};
use crate::params::DistanceParams;
use crate::pseudonormal::{EdgeReport, PseudoNormals};
use crate::query;
use crate::result::Nearest;
use crate::store::{MeshSource, TriangleStore};

/// Distance queries against a fixed triangle mesh.
///
/// Construction copies the geometry, builds a bounding sphere hierarchy and
/// the pseudonormal tables once. Afterwards the structure is read-only:
/// every query takes `&self`, touches no shared mutable state, and
/// `MeshDistance` is `Send + Sync`, so any number of threads may query it
/// at once.
///
/// A `MeshDistance` can also be created empty with [`MeshDistance::new`]
/// and filled later with one of the `construct*` methods; until then every
/// query fails with [`DistanceError::NotConstructed`].
///
/// # Example
///
/// ```
/// use mesh_distance::MeshDistance;
/// use nalgebra::Point3;
///
/// // Tetrahedron with outward (CCW) winding
/// let sdf = MeshDistance::from_arrays(
///     &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
///     &[[0, 2, 1], [0, 1, 3], [0, 3, 2], [1, 2, 3]],
/// )
/// .unwrap();
///
/// let inside = sdf.signed_distance(Point3::new(0.1, 0.1, 0.1)).unwrap();
/// assert!(inside.distance < 0.0);
///
/// let outside = sdf.signed_distance(Point3::new(2.0, 2.0, 2.0)).unwrap();
/// assert!(outside.distance > 0.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MeshDistance {
    params: DistanceParams,
    built: Option<Built>,
}

/// Everything a query reads.
#[derive(Debug, Clone)]
struct Built {
    store: TriangleStore,
    bvh: Bvh,
    normals: PseudoNormals,
    edges: EdgeReport,
}

impl Built {
    fn new(store: TriangleStore, params: &DistanceParams) -> DistanceResult<Self> {
        let degenerate = store.degenerate_triangles(params.degenerate_epsilon);
        if let Some(&first) = degenerate.first() {
            if params.reject_degenerate {
                return Err(DistanceError::DegenerateTriangle(first));
            }
            warn!(
                count = degenerate.len(),
                first, "Mesh contains degenerate triangles"
            );
        }

        info!(
            vertices = store.vertex_count(),
            triangles = store.triangle_count(),
            "Building mesh distance structure"
        );

        let parallel = store.triangle_count() >= params.parallel_threshold;
        let ((normals, edges), bvh) = if parallel {
            debug!("Building pseudonormals and hierarchy in parallel");
            rayon::join(
                || PseudoNormals::compute(&store, true),
                || Bvh::build(&store),
            )
        } else {
            (PseudoNormals::compute(&store, false), Bvh::build(&store))
        };

        let stats = bvh.stats();
        info!(
            nodes = stats.node_count,
            depth = stats.max_depth,
            watertight = edges.is_watertight(),
            "Mesh distance structure ready"
        );

        Ok(Self {
            store,
            bvh,
            normals,
            edges,
        })
    }

    fn unsigned(&self, point: &Point3<f64>) -> Nearest {
        query::nearest(&self.bvh, &self.store, point)
    }

    fn signed(&self, point: &Point3<f64>) -> Nearest {
        let mut nearest = self.unsigned(point);
        let normal =
            self.normals
                .for_entity(&self.store, nearest.triangle_id, nearest.nearest_entity);
        if (point - nearest.nearest_point).dot(&normal) < 0.0 {
            nearest.distance = -nearest.distance;
        }
        nearest
    }
}

impl MeshDistance {
    /// Create an empty, unconstructed structure with default parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty, unconstructed structure with the given parameters.
    #[must_use]
    pub fn with_params(params: DistanceParams) -> Self {
        Self {
            params,
            built: None,
        }
    }

    /// Build a structure over `store` with default parameters.
    ///
    /// # Errors
    ///
    /// See [`MeshDistance::construct`].
    pub fn from_store(store: TriangleStore) -> DistanceResult<Self> {
        let mut distance = Self::new();
        distance.construct(store)?;
        Ok(distance)
    }

    /// Build a structure from coordinate triples and index triples.
    ///
    /// # Errors
    ///
    /// Fails with [`DistanceError::EmptyMesh`] for an empty triangle list
    /// and [`DistanceError::IndexOutOfRange`] for bad indices.
    pub fn from_arrays(vertices: &[[f64; 3]], triangles: &[[u32; 3]]) -> DistanceResult<Self> {
        Self::from_store(TriangleStore::from_arrays(vertices, triangles)?)
    }

    /// Build a structure from interleaved buffers with explicit counts.
    ///
    /// # Errors
    ///
    /// Fails with [`DistanceError::BufferLength`] when a buffer disagrees
    /// with its count, plus the errors of [`MeshDistance::from_arrays`].
    pub fn from_flat(
        positions: &[f64],
        vertex_count: usize,
        indices: &[u32],
        triangle_count: usize,
    ) -> DistanceResult<Self> {
        Self::from_store(TriangleStore::from_flat(
            positions,
            vertex_count,
            indices,
            triangle_count,
        )?)
    }

    /// Build a structure from an external mesh.
    ///
    /// # Errors
    ///
    /// Same as [`MeshDistance::from_arrays`].
    pub fn from_source<M: MeshSource + ?Sized>(mesh: &M) -> DistanceResult<Self> {
        Self::from_store(TriangleStore::from_source(mesh)?)
    }

    /// Build (or rebuild) the structure over `store`.
    ///
    /// Any previous mesh is discarded first, so after a failed call the
    /// structure is unconstructed.
    ///
    /// # Errors
    ///
    /// Fails with [`DistanceError::DegenerateTriangle`] when the store holds a
    /// zero-area triangle and `reject_degenerate` is set in [`DistanceParams`].
    /// Open or non-manifold meshes are accepted; see [`MeshDistance::edge_report`].
    pub fn construct(&mut self, store: TriangleStore) -> DistanceResult<()> {
        self.rebuild(Ok(store))
    }

    /// [`MeshDistance::construct`] from coordinate and index triples.
    ///
    /// # Errors
    ///
    /// Store errors plus those of [`MeshDistance::construct`].
    pub fn construct_from_arrays(
        &mut self,
        vertices: &[[f64; 3]],
        triangles: &[[u32; 3]],
    ) -> DistanceResult<()> {
        self.rebuild(TriangleStore::from_arrays(vertices, triangles))
    }

    /// [`MeshDistance::construct`] from interleaved buffers.
    ///
    /// # Errors
    ///
    /// Store errors plus those of [`MeshDistance::construct`].
    pub fn construct_from_flat(
        &mut self,
        positions: &[f64],
        vertex_count: usize,
        indices: &[u32],
        triangle_count: usize,
    ) -> DistanceResult<()> {
        self.rebuild(TriangleStore::from_flat(
            positions,
            vertex_count,
            indices,
            triangle_count,
        ))
    }

    /// [`MeshDistance::construct`] from an external mesh.
    ///
    /// # Errors
    ///
    /// Store errors plus those of [`MeshDistance::construct`].
    pub fn construct_from_source<M: MeshSource + ?Sized>(&mut self, mesh: &M) -> DistanceResult<()> {
        self.rebuild(TriangleStore::from_source(mesh))
    }

    fn rebuild(&mut self, store: DistanceResult<TriangleStore>) -> DistanceResult<()> {
        self.built = None;
        self.built = Some(Built::new(store?, &self.params)?);
        Ok(())
    }

    fn built(&self) -> DistanceResult<&Built> {
        self.built.as_ref().ok_or(DistanceError::NotConstructed)
    }

    /// Unsigned distance from `point` to the mesh.
    ///
    /// # Errors
    ///
    /// Fails with [`DistanceError::NotConstructed`] before construction.
    pub fn unsigned_distance(&self, point: Point3<f64>) -> DistanceResult<Nearest> {
        Ok(self.built()?.unsigned(&point))
    }

    /// Signed distance from `point` to the mesh: negative inside.
    ///
    /// The sign comes from the pseudonormal of the feature holding the
    /// closest point. It is exact for watertight, consistently wound meshes
    /// and best effort otherwise.
    ///
    /// # Errors
    ///
    /// Fails with [`DistanceError::NotConstructed`] before construction.
    pub fn signed_distance(&self, point: Point3<f64>) -> DistanceResult<Nearest> {
        Ok(self.built()?.signed(&point))
    }

    /// [`MeshDistance::unsigned_distance`] for many points, in parallel.
    ///
    /// # Errors
    ///
    /// Fails with [`DistanceError::NotConstructed`] before construction.
    pub fn unsigned_distances(&self, points: &[Point3<f64>]) -> DistanceResult<Vec<Nearest>> {
        let built = self.built()?;
        Ok(points.par_iter().map(|p| built.unsigned(p)).collect())
    }

    /// [`MeshDistance::signed_distance`] for many points, in parallel.
    ///
    /// # Errors
    ///
    /// Fails with [`DistanceError::NotConstructed`] before construction.
    pub fn signed_distances(&self, points: &[Point3<f64>]) -> DistanceResult<Vec<Nearest>> {
        let built = self.built()?;
        Ok(points.par_iter().map(|p| built.signed(p)).collect())
    }

    /// Closest point on the mesh surface.
    ///
    /// # Errors
    ///
    /// Fails with [`DistanceError::NotConstructed`] before construction.
    pub fn closest_point(&self, point: Point3<f64>) -> DistanceResult<Point3<f64>> {
        Ok(self.built()?.unsigned(&point).nearest_point)
    }

    /// Whether `point` is inside the mesh, by the sign of the signed distance.
    ///
    /// # Errors
    ///
    /// Fails with [`DistanceError::NotConstructed`] before construction.
    pub fn is_inside(&self, point: Point3<f64>) -> DistanceResult<bool> {
        Ok(self.built()?.signed(&point).is_inside())
    }

    /// Whether a mesh has been successfully constructed.
    #[must_use]
    pub fn is_constructed(&self) -> bool {
        self.built.is_some()
    }

    /// Construction parameters.
    #[must_use]
    pub fn params(&self) -> &DistanceParams {
        &self.params
    }

    /// The stored geometry.
    ///
    /// # Errors
    ///
    /// Fails with [`DistanceError::NotConstructed`] before construction.
    pub fn store(&self) -> DistanceResult<&TriangleStore> {
        Ok(&self.built()?.store)
    }

    /// Number of vertices in the constructed mesh.
    ///
    /// # Errors
    ///
    /// Fails with [`DistanceError::NotConstructed`] before construction.
    pub fn vertex_count(&self) -> DistanceResult<usize> {
        Ok(self.built()?.store.vertex_count())
    }

    /// Number of triangles in the constructed mesh.
    ///
    /// # Errors
    ///
    /// Fails with [`DistanceError::NotConstructed`] before construction.
    pub fn triangle_count(&self) -> DistanceResult<usize> {
        Ok(self.built()?.store.triangle_count())
    }

    /// Boundary and non-manifold edge counts found at construction.
    ///
    /// # Errors
    ///
    /// Fails with [`DistanceError::NotConstructed`] before construction.
    pub fn edge_report(&self) -> DistanceResult<EdgeReport> {
        Ok(self.built()?.edges)
    }

    /// Whether every edge is shared by exactly two triangles.
    ///
    /// # Errors
    ///
    /// Fails with [`DistanceError::NotConstructed`] before construction.
    pub fn is_watertight(&self) -> DistanceResult<bool> {
        Ok(self.built()?.edges.is_watertight())
    }

    /// Shape statistics of the hierarchy.
    ///
    /// # Errors
    ///
    /// Fails with [`DistanceError::NotConstructed`] before construction.
    pub fn bvh_stats(&self) -> DistanceResult<BvhStats> {
        Ok(self.built()?.bvh.stats())
    }

    /// Sphere enclosing the whole mesh.
    ///
    /// # Errors
    ///
    /// Fails with [`DistanceError::NotConstructed`] before construction.
    pub fn root_bounds(&self) -> DistanceResult<BoundingSphere> {
        Ok(self.built()?.bvh.root_bounds())
    }
}
