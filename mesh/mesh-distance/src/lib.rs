//! Exact point-to-mesh distance queries for triangle meshes.
//!
//! This crate provides:
//! - Unsigned distance from a point to the nearest triangle
//! - Signed distance using angle-weighted pseudonormals (negative inside)
//! - The closest point and the feature (vertex, edge or face) it lies on
//! - A bounding sphere hierarchy for sublinear queries
//! - Edge adjacency reporting for open and non-manifold input
//!
//! Building is done once; queries are read-only and can run from any number
//! of threads.
//!
//! # Layer 0
//!
//! This is a Layer 0 crate with zero Bevy dependencies.
//!
//! # Example
//!
//! ```
//! use mesh_distance::{MeshDistance, NearestEntity};
//! use nalgebra::Point3;
//!
//! // Unit cube, outward CCW winding
//! let vertices = [
//!     [0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0],
//!     [0.0, 0.0, 1.0], [1.0, 0.0, 1.0], [1.0, 1.0, 1.0], [0.0, 1.0, 1.0],
//! ];
//! let faces = [
//!     [0, 2, 1], [0, 3, 2], [4, 5, 6], [4, 6, 7],
//!     [0, 1, 5], [0, 5, 4], [3, 7, 6], [3, 6, 2],
//!     [0, 4, 7], [0, 7, 3], [1, 2, 6], [1, 6, 5],
//! ];
//! let cube = MeshDistance::from_arrays(&vertices, &faces).unwrap();
//!
//! let center = cube.signed_distance(Point3::new(0.5, 0.5, 0.5)).unwrap();
//! assert!((center.distance + 0.5).abs() < 1e-12);
//!
//! let corner = cube.signed_distance(Point3::new(2.0, 2.0, 2.0)).unwrap();
//! assert!((corner.distance - 3.0_f64.sqrt()).abs() < 1e-12);
//! assert!(corner.nearest_entity.vertex().is_some());
//!
//! let above = cube.unsigned_distance(Point3::new(0.25, 0.75, 3.0)).unwrap();
//! assert_eq!(above.nearest_entity, NearestEntity::F);
//! ```
//!
//! # Use Cases
//!
//! - **Collision queries**: penetration depth against a static mesh
//! - **Field sampling**: fill a voxel grid with signed distances
//! - **Projection**: snap points onto a surface

#![warn(missing_docs)]
// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod bvh;
mod distance;
mod error;
mod params;
mod primitive;
mod pseudonormal;
mod query;
mod result;
mod store;

pub use bvh::{BoundingSphere, Bvh, BvhStats};
pub use distance::MeshDistance;
pub use error::{DistanceError, DistanceResult};
pub use params::DistanceParams;
pub use primitive::{NearestEntity, TriangleProjection, closest_point_on_triangle};
pub use pseudonormal::{EdgeReport, PseudoNormals};
pub use query::brute_force_nearest;
pub use result::Nearest;
pub use store::{MeshSource, TriangleStore};

// Re-export the point and vector types used throughout the API.
pub use nalgebra::{Point3, Vector3};
