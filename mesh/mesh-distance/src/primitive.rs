//! Closest point on a single triangle.
//!
//! Minimizes the quadratic `Q(s, t) = |v0 + s*e0 + t*e1 - p|^2` over the
//! triangle `s >= 0, t >= 0, s + t <= 1`, splitting the `(s, t)` plane into
//! seven regions (Eberly, "Distance Between Point and Triangle in 3D").
//! The region tests decide which vertex, edge, or face pseudonormal is used
//! for the sign of a query. Points on a region boundary resolve toward the
//! face (`s + t <= det` is region 0).

// Region formulas use the textbook single-letter names.
#![allow(clippy::many_single_char_names)]
#![allow(clippy::similar_names)]

use nalgebra::Point3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The triangle feature that holds the closest point.
///
/// Vertices and edges are named after the triangle's local corner order
/// `v0, v1, v2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum NearestEntity {
    /// First corner.
    V0,
    /// Second corner.
    V1,
    /// Third corner.
    V2,
    /// Edge from `v0` to `v1`.
    E01,
    /// Edge from `v1` to `v2`.
    E12,
    /// Edge from `v0` to `v2`.
    E02,
    /// Triangle interior.
    F,
}

impl NearestEntity {
    /// Local corner index (0..3) if this is a vertex.
    #[must_use]
    pub const fn vertex(self) -> Option<usize> {
        match self {
            Self::V0 => Some(0),
            Self::V1 => Some(1),
            Self::V2 => Some(2),
            _ => None,
        }
    }

    /// Local edge slot (0 = `E01`, 1 = `E12`, 2 = `E02`) if this is an edge.
    #[must_use]
    pub const fn edge(self) -> Option<usize> {
        match self {
            Self::E01 => Some(0),
            Self::E12 => Some(1),
            Self::E02 => Some(2),
            _ => None,
        }
    }
}

/// Closest point on a triangle and its squared distance to the query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleProjection {
    /// Squared distance from the query point. Never negative.
    pub distance_squared: f64,
    /// Closest point on the triangle.
    pub point: Point3<f64>,
    /// Feature that holds `point`.
    pub entity: NearestEntity,
}

/// Closest point on triangle `(v0, v1, v2)` to `point`.
///
/// # Example
///
/// ```
/// use mesh_distance::{closest_point_on_triangle, NearestEntity};
/// use nalgebra::Point3;
///
/// let hit = closest_point_on_triangle(
///     Point3::new(0.25, 0.25, 2.0),
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
/// );
/// assert_eq!(hit.entity, NearestEntity::F);
/// assert!((hit.distance_squared - 4.0).abs() < 1e-12);
/// ```
#[must_use]
#[allow(clippy::too_many_lines)]
pub fn closest_point_on_triangle(
    point: Point3<f64>,
    v0: Point3<f64>,
    v1: Point3<f64>,
    v2: Point3<f64>,
) -> TriangleProjection {
    // A query sitting exactly on a corner lands on a region boundary where
    // the case split below reports the face; tag the corner instead.
    for (corner, entity) in [
        (v0, NearestEntity::V0),
        (v1, NearestEntity::V1),
        (v2, NearestEntity::V2),
    ] {
        if point == corner {
            return TriangleProjection {
                distance_squared: 0.0,
                point: corner,
                entity,
            };
        }
    }

    let diff = v0 - point;
    let edge0 = v1 - v0;
    let edge1 = v2 - v0;
    let a00 = edge0.dot(&edge0);
    let a01 = edge0.dot(&edge1);
    let a11 = edge1.dot(&edge1);
    let b0 = diff.dot(&edge0);
    let b1 = diff.dot(&edge1);
    let c = diff.dot(&diff);
    let det = a00 * a11 - a01 * a01;

    // Zero-area triangle: the region formulas divide by det. The triangle
    // is a segment or a point, so its closest point is on one of its edges.
    if det <= 0.0 || det.is_nan() {
        return closest_point_on_edges(point, v0, v1, v2);
    }

    let mut s = a01 * b1 - a11 * b0;
    let mut t = a01 * b0 - a00 * b1;

    let entity;
    let mut d2;

    if s + t <= det {
        if s < 0.0 {
            if t < 0.0 {
                // region 4
                if b0 < 0.0 {
                    t = 0.0;
                    if -b0 >= a00 {
                        entity = NearestEntity::V1;
                        s = 1.0;
                        d2 = a00 + 2.0 * b0 + c;
                    } else {
                        entity = NearestEntity::E01;
                        s = -b0 / a00;
                        d2 = b0 * s + c;
                    }
                } else {
                    s = 0.0;
                    if b1 >= 0.0 {
                        entity = NearestEntity::V0;
                        t = 0.0;
                        d2 = c;
                    } else if -b1 >= a11 {
                        entity = NearestEntity::V2;
                        t = 1.0;
                        d2 = a11 + 2.0 * b1 + c;
                    } else {
                        entity = NearestEntity::E02;
                        t = -b1 / a11;
                        d2 = b1 * t + c;
                    }
                }
            } else {
                // region 3
                s = 0.0;
                if b1 >= 0.0 {
                    entity = NearestEntity::V0;
                    t = 0.0;
                    d2 = c;
                } else if -b1 >= a11 {
                    entity = NearestEntity::V2;
                    t = 1.0;
                    d2 = a11 + 2.0 * b1 + c;
                } else {
                    entity = NearestEntity::E02;
                    t = -b1 / a11;
                    d2 = b1 * t + c;
                }
            }
        } else if t < 0.0 {
            // region 5
            t = 0.0;
            if b0 >= 0.0 {
                entity = NearestEntity::V0;
                s = 0.0;
                d2 = c;
            } else if -b0 >= a00 {
                entity = NearestEntity::V1;
                s = 1.0;
                d2 = a00 + 2.0 * b0 + c;
            } else {
                entity = NearestEntity::E01;
                s = -b0 / a00;
                d2 = b0 * s + c;
            }
        } else {
            // region 0, interior
            entity = NearestEntity::F;
            let inv_det = 1.0 / det;
            s *= inv_det;
            t *= inv_det;
            d2 = s * (a00 * s + a01 * t + 2.0 * b0) + t * (a01 * s + a11 * t + 2.0 * b1) + c;
        }
    } else if s < 0.0 {
        // region 2
        let tmp0 = a01 + b0;
        let tmp1 = a11 + b1;
        if tmp1 > tmp0 {
            let numer = tmp1 - tmp0;
            let denom = a00 - 2.0 * a01 + a11;
            if numer >= denom {
                entity = NearestEntity::V1;
                s = 1.0;
                t = 0.0;
                d2 = a00 + 2.0 * b0 + c;
            } else {
                entity = NearestEntity::E12;
                s = numer / denom;
                t = 1.0 - s;
                d2 = s * (a00 * s + a01 * t + 2.0 * b0) + t * (a01 * s + a11 * t + 2.0 * b1) + c;
            }
        } else {
            s = 0.0;
            if tmp1 <= 0.0 {
                entity = NearestEntity::V2;
                t = 1.0;
                d2 = a11 + 2.0 * b1 + c;
            } else if b1 >= 0.0 {
                entity = NearestEntity::V0;
                t = 0.0;
                d2 = c;
            } else {
                entity = NearestEntity::E02;
                t = -b1 / a11;
                d2 = b1 * t + c;
            }
        }
    } else if t < 0.0 {
        // region 6
        let tmp0 = a01 + b1;
        let tmp1 = a00 + b0;
        if tmp1 > tmp0 {
            let numer = tmp1 - tmp0;
            let denom = a00 - 2.0 * a01 + a11;
            if numer >= denom {
                entity = NearestEntity::V2;
                t = 1.0;
                s = 0.0;
                d2 = a11 + 2.0 * b1 + c;
            } else {
                entity = NearestEntity::E12;
                t = numer / denom;
                s = 1.0 - t;
                d2 = s * (a00 * s + a01 * t + 2.0 * b0) + t * (a01 * s + a11 * t + 2.0 * b1) + c;
            }
        } else {
            t = 0.0;
            if tmp1 <= 0.0 {
                entity = NearestEntity::V1;
                s = 1.0;
                d2 = a00 + 2.0 * b0 + c;
            } else if b0 >= 0.0 {
                entity = NearestEntity::V0;
                s = 0.0;
                d2 = c;
            } else {
                entity = NearestEntity::E01;
                s = -b0 / a00;
                d2 = b0 * s + c;
            }
        }
    } else {
        // region 1
        let numer = a11 + b1 - a01 - b0;
        if numer <= 0.0 {
            entity = NearestEntity::V2;
            s = 0.0;
            t = 1.0;
            d2 = a11 + 2.0 * b1 + c;
        } else {
            let denom = a00 - 2.0 * a01 + a11;
            if numer >= denom {
                entity = NearestEntity::V1;
                s = 1.0;
                t = 0.0;
                d2 = a00 + 2.0 * b0 + c;
            } else {
                entity = NearestEntity::E12;
                s = numer / denom;
                t = 1.0 - s;
                d2 = s * (a00 * s + a01 * t + 2.0 * b0) + t * (a01 * s + a11 * t + 2.0 * b1) + c;
            }
        }
    }

    // Round-off can push the quadratic slightly below zero.
    if d2 < 0.0 {
        d2 = 0.0;
    }

    TriangleProjection {
        distance_squared: d2,
        point: v0 + edge0 * s + edge1 * t,
        entity,
    }
}

/// Closest point over the three edges of a collapsed triangle.
fn closest_point_on_edges(
    point: Point3<f64>,
    v0: Point3<f64>,
    v1: Point3<f64>,
    v2: Point3<f64>,
) -> TriangleProjection {
    let mut best = closest_point_on_segment(
        point,
        v0,
        v1,
        [NearestEntity::V0, NearestEntity::E01, NearestEntity::V1],
    );
    for (a, b, tags) in [
        (v1, v2, [NearestEntity::V1, NearestEntity::E12, NearestEntity::V2]),
        (v0, v2, [NearestEntity::V0, NearestEntity::E02, NearestEntity::V2]),
    ] {
        let hit = closest_point_on_segment(point, a, b, tags);
        if hit.distance_squared < best.distance_squared {
            best = hit;
        }
    }
    best
}

/// Closest point on segment `a`-`b`, tagged with `[at a, interior, at b]`.
fn closest_point_on_segment(
    point: Point3<f64>,
    a: Point3<f64>,
    b: Point3<f64>,
    tags: [NearestEntity; 3],
) -> TriangleProjection {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    let t = if len_sq > 0.0 {
        ((point - a).dot(&ab) / len_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let (closest, entity) = if t <= 0.0 {
        (a, tags[0])
    } else if t >= 1.0 {
        (b, tags[2])
    } else {
        (a + ab * t, tags[1])
    };

    TriangleProjection {
        distance_squared: (point - closest).norm_squared(),
        point: closest,
        entity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn simple_triangle() -> (Point3<f64>, Point3<f64>, Point3<f64>) {
        (
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(10.0, 0.0, 0.0),
            Point3::new(5.0, 10.0, 0.0),
        )
    }

    fn project(point: Point3<f64>) -> TriangleProjection {
        let (v0, v1, v2) = simple_triangle();
        closest_point_on_triangle(point, v0, v1, v2)
    }

    #[test]
    fn closest_point_inside_triangle() {
        let hit = project(Point3::new(5.0, 3.0, 5.0));

        assert_eq!(hit.entity, NearestEntity::F);
        assert_relative_eq!(hit.point, Point3::new(5.0, 3.0, 0.0), epsilon = 1e-10);
        assert_relative_eq!(hit.distance_squared, 25.0, epsilon = 1e-10);
    }

    #[test]
    fn closest_point_below_triangle() {
        let hit = project(Point3::new(5.0, 3.0, -2.0));

        assert_eq!(hit.entity, NearestEntity::F);
        assert_relative_eq!(hit.distance_squared, 4.0, epsilon = 1e-10);
    }

    #[test]
    fn closest_point_vertex_regions() {
        let hit = project(Point3::new(-5.0, -5.0, 0.0));
        assert_eq!(hit.entity, NearestEntity::V0);
        assert_relative_eq!(hit.point, Point3::new(0.0, 0.0, 0.0), epsilon = 1e-10);
        assert_relative_eq!(hit.distance_squared, 50.0, epsilon = 1e-10);

        let hit = project(Point3::new(15.0, -5.0, 1.0));
        assert_eq!(hit.entity, NearestEntity::V1);
        assert_relative_eq!(hit.point, Point3::new(10.0, 0.0, 0.0), epsilon = 1e-10);

        let hit = project(Point3::new(5.0, 15.0, -1.0));
        assert_eq!(hit.entity, NearestEntity::V2);
        assert_relative_eq!(hit.point, Point3::new(5.0, 10.0, 0.0), epsilon = 1e-10);
    }

    #[test]
    fn closest_point_edge_regions() {
        let hit = project(Point3::new(5.0, -5.0, 0.0));
        assert_eq!(hit.entity, NearestEntity::E01);
        assert_relative_eq!(hit.point, Point3::new(5.0, 0.0, 0.0), epsilon = 1e-10);
        assert_relative_eq!(hit.distance_squared, 25.0, epsilon = 1e-10);

        // Outward normal of v1-v2 is (2, 1, 0) / sqrt(5).
        let hit = project(Point3::new(7.5 + 2.0, 5.0 + 1.0, 0.0));
        assert_eq!(hit.entity, NearestEntity::E12);
        assert_relative_eq!(hit.point, Point3::new(7.5, 5.0, 0.0), epsilon = 1e-10);
        assert_relative_eq!(hit.distance_squared, 5.0, epsilon = 1e-10);

        // Outward normal of v0-v2 is (-2, 1, 0) / sqrt(5).
        let hit = project(Point3::new(2.5 - 2.0, 5.0 + 1.0, 3.0));
        assert_eq!(hit.entity, NearestEntity::E02);
        assert_relative_eq!(hit.point, Point3::new(2.5, 5.0, 0.0), epsilon = 1e-10);
        assert_relative_eq!(hit.distance_squared, 14.0, epsilon = 1e-10);
    }

    #[test]
    fn closest_point_on_vertex_is_exact() {
        let (v0, v1, v2) = simple_triangle();
        for (corner, expected) in [
            (v0, NearestEntity::V0),
            (v1, NearestEntity::V1),
            (v2, NearestEntity::V2),
        ] {
            let hit = closest_point_on_triangle(corner, v0, v1, v2);
            assert_eq!(hit.entity, expected);
            assert!(hit.distance_squared.abs() < f64::EPSILON);
        }
    }

    #[test]
    fn closest_point_unit_triangle_face() {
        let hit = closest_point_on_triangle(
            Point3::new(0.5, 0.5, 5.0),
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        );
        assert_eq!(hit.entity, NearestEntity::F);
        assert_relative_eq!(hit.distance_squared.sqrt(), 5.0, epsilon = 1e-12);
    }

    #[test]
    fn distance_matches_point() {
        let (v0, v1, v2) = simple_triangle();
        let queries = [
            Point3::new(3.0, 7.0, -4.0),
            Point3::new(12.0, 3.0, 2.0),
            Point3::new(-1.0, 4.0, 0.5),
            Point3::new(4.0, -2.0, 8.0),
        ];
        for query in queries {
            let hit = closest_point_on_triangle(query, v0, v1, v2);
            assert!(hit.distance_squared >= 0.0);
            assert_relative_eq!(
                (query - hit.point).norm_squared(),
                hit.distance_squared,
                epsilon = 1e-9
            );
        }
    }

    #[test]
    fn collinear_triangle_uses_segment() {
        let hit = closest_point_on_triangle(
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        );
        assert!(hit.distance_squared.is_finite());
        assert_relative_eq!(hit.distance_squared, 1.0, epsilon = 1e-12);
        assert_relative_eq!(hit.point, Point3::new(0.5, 0.0, 0.0), epsilon = 1e-12);
        assert!(hit.entity.edge().is_some());

        // Past the far end of the collapsed triangle.
        let hit = closest_point_on_triangle(
            Point3::new(3.0, 0.0, 1.0),
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        );
        assert_eq!(hit.entity, NearestEntity::V2);
        assert_relative_eq!(hit.distance_squared, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn coincident_corners_use_segment() {
        let v = Point3::new(1.0, 1.0, 1.0);
        let w = Point3::new(1.0, 3.0, 1.0);
        let hit = closest_point_on_triangle(Point3::new(0.0, 2.0, 1.0), v, v, w);
        assert_relative_eq!(hit.distance_squared, 1.0, epsilon = 1e-12);
        assert_relative_eq!(hit.point, Point3::new(1.0, 2.0, 1.0), epsilon = 1e-12);

        let hit = closest_point_on_triangle(Point3::new(4.0, 0.0, 0.0), v, v, v);
        assert_eq!(hit.entity, NearestEntity::V0);
        assert_relative_eq!(hit.distance_squared, 11.0, epsilon = 1e-12);
    }

    #[test]
    fn entity_slots() {
        assert_eq!(NearestEntity::V2.vertex(), Some(2));
        assert_eq!(NearestEntity::E12.edge(), Some(1));
        assert_eq!(NearestEntity::F.vertex(), None);
        assert_eq!(NearestEntity::F.edge(), None);
    }
}
