//! Result type for distance queries.

use nalgebra::Point3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::primitive::NearestEntity;

/// The closest point on a mesh to a query point.
///
/// Returned by value from every query; it borrows nothing from the
/// structure that produced it.
///
/// # Example
///
/// ```
/// use mesh_distance::MeshDistance;
/// use nalgebra::Point3;
///
/// let tri = MeshDistance::from_arrays(
///     &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
///     &[[0, 1, 2]],
/// )
/// .unwrap();
///
/// let below = tri.signed_distance(Point3::new(0.2, 0.2, -3.0)).unwrap();
/// assert!(below.is_inside());
/// assert!((below.abs_distance() - 3.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Nearest {
    /// Distance to the mesh. Never negative for unsigned queries; negative
    /// inside the mesh for signed queries.
    pub distance: f64,
    /// Closest point on the mesh surface.
    pub nearest_point: Point3<f64>,
    /// Feature of the triangle that holds `nearest_point`.
    pub nearest_entity: NearestEntity,
    /// Id of the triangle that holds `nearest_point`.
    pub triangle_id: usize,
}

impl Nearest {
    /// Result of a search that found no finite candidate.
    pub(crate) fn unset() -> Self {
        Self {
            distance: f64::INFINITY,
            nearest_point: Point3::origin(),
            nearest_entity: NearestEntity::F,
            triangle_id: 0,
        }
    }

    /// Magnitude of the distance, whatever its sign.
    #[must_use]
    pub fn abs_distance(&self) -> f64 {
        self.distance.abs()
    }

    /// Whether a signed result reports the query as inside the mesh.
    #[must_use]
    pub fn is_inside(&self) -> bool {
        self.distance < 0.0
    }
}

impl std::fmt::Display for Nearest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "distance {:.6} to ({:.6}, {:.6}, {:.6}) on triangle {} ({:?})",
            self.distance,
            self.nearest_point.x,
            self.nearest_point.y,
            self.nearest_point.z,
            self.triangle_id,
            self.nearest_entity
        )
    }
}
