//! Construction parameters for the distance structure.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Parameters controlling how a [`MeshDistance`](crate::MeshDistance) is built.
///
/// Queries are unaffected by these settings; they only change how
/// construction is scheduled and how strictly the input is checked.
///
/// # Example
///
/// ```
/// use mesh_distance::DistanceParams;
///
/// let params = DistanceParams::default();
/// assert!(!params.reject_degenerate);
///
/// let strict = DistanceParams::strict().parallel_threshold(1024);
/// assert!(strict.reject_degenerate);
/// assert_eq!(strict.parallel_threshold, 1024);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DistanceParams {
    /// Triangle count at which the pseudonormal tables and the hierarchy are
    /// built concurrently. Smaller meshes are built on the calling thread.
    pub parallel_threshold: usize,

    /// Fail construction when a zero-area triangle is found.
    pub reject_degenerate: bool,

    /// Squared norm of the edge cross product at or below which a triangle
    /// is treated as degenerate.
    pub degenerate_epsilon: f64,
}

impl Default for DistanceParams {
    fn default() -> Self {
        Self {
            parallel_threshold: 4096,
            reject_degenerate: false,
            degenerate_epsilon: 1e-24,
        }
    }
}

impl DistanceParams {
    /// Params that reject degenerate triangles at construction.
    #[must_use]
    pub const fn strict() -> Self {
        Self {
            parallel_threshold: 4096,
            reject_degenerate: true,
            degenerate_epsilon: 1e-24,
        }
    }

    /// Params that never spawn parallel work.
    #[must_use]
    pub const fn sequential() -> Self {
        Self {
            parallel_threshold: usize::MAX,
            reject_degenerate: false,
            degenerate_epsilon: 1e-24,
        }
    }

    /// Set the parallel construction threshold.
    #[must_use]
    pub const fn parallel_threshold(mut self, triangles: usize) -> Self {
        self.parallel_threshold = triangles;
        self
    }

    /// Set whether degenerate triangles are rejected.
    #[must_use]
    pub const fn reject_degenerate(mut self, reject: bool) -> Self {
        self.reject_degenerate = reject;
        self
    }

    /// Set the degenerate triangle threshold.
    #[must_use]
    pub const fn degenerate_epsilon(mut self, epsilon: f64) -> Self {
        self.degenerate_epsilon = epsilon;
        self
    }
}
