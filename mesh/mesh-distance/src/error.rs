//! Error types for mesh distance queries.

use thiserror::Error;

/// Result type for mesh distance operations.
pub type DistanceResult<T> = Result<T, DistanceError>;

/// Errors that can occur while building or querying a [`MeshDistance`](crate::MeshDistance).
///
/// Open or non-manifold input is not an error: it is reported through
/// [`EdgeReport`](crate::EdgeReport) and a logged warning, and construction
/// still succeeds.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DistanceError {
    /// The mesh has no triangles.
    #[error("mesh is empty")]
    EmptyMesh,

    /// A query was issued before the structure was successfully constructed.
    #[error("distance structure has not been constructed")]
    NotConstructed,

    /// A flat buffer length disagrees with its declared element count.
    #[error("{buffer} buffer has {actual} values, expected {expected}")]
    BufferLength {
        /// Which buffer was malformed (`"position"` or `"index"`).
        buffer: &'static str,
        /// Number of values implied by the declared count, saturating at
        /// `usize::MAX`.
        expected: usize,
        /// Number of values actually supplied.
        actual: usize,
    },

    /// A triangle references a vertex that does not exist.
    #[error("triangle {triangle} references vertex {index}, but the mesh has {vertex_count} vertices")]
    IndexOutOfRange {
        /// Triangle id (position in the input triangle list).
        triangle: usize,
        /// The offending vertex index.
        index: u32,
        /// Number of vertices in the mesh.
        vertex_count: usize,
    },

    /// A zero-area triangle was found and degenerate triangles are rejected.
    #[error("triangle {0} is degenerate (zero area)")]
    DegenerateTriangle(usize),
}

impl DistanceError {
    /// Create an empty mesh error.
    #[must_use]
    pub const fn empty_mesh() -> Self {
        Self::EmptyMesh
    }

    /// Create a buffer length error.
    #[must_use]
    pub const fn buffer_length(buffer: &'static str, expected: usize, actual: usize) -> Self {
        Self::BufferLength {
            buffer,
            expected,
            actual,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DistanceError::empty_mesh();
        assert!(format!("{err}").contains("empty"));

        let err = DistanceError::NotConstructed;
        assert!(format!("{err}").contains("not been constructed"));

        let err = DistanceError::buffer_length("position", 9, 8);
        let msg = format!("{err}");
        assert!(msg.contains("position"));
        assert!(msg.contains("expected 9"));

        let err = DistanceError::IndexOutOfRange {
            triangle: 2,
            index: 7,
            vertex_count: 4,
        };
        assert!(format!("{err}").contains("vertex 7"));

        let err = DistanceError::DegenerateTriangle(3);
        assert!(format!("{err}").contains("triangle 3"));
    }
}
