//! Plane representation and the tolerances shared by every compiler stage.

use nalgebra::{Point3, Vector3};

/// Points within this distance of a plane are considered "on" the plane.
///
/// Used for plane-side classification and polygon overlap everywhere, so two
/// stages never disagree about a borderline case.
pub const ROUND_EPSILON: f32 = 0.01;

/// Minimum distance between two consecutive polygon vertices.
pub const MIN_VERTEX_DIST: f32 = 0.02;

/// Which side of a plane a point lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneSide {
    /// Point is in front of the plane (positive side of normal)
    Front,
    /// Point is behind the plane (negative side of normal)
    Back,
    /// Point lies on the plane (within epsilon tolerance)
    OnPlane,
}

/// Classification of a polygon relative to a plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// No vertex is behind the plane
    Front,
    /// No vertex is in front of the plane
    Back,
    /// Vertices on both sides (straddles the plane)
    Spanning,
    /// All vertices on the plane, polygon faces the same way as the plane
    CoplanarFront,
    /// All vertices on the plane, polygon faces the opposite way
    CoplanarBack,
}

/// A plane in 3D space, represented as `normal · point = offset`.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane3D {
    normal: Vector3<f32>,
    offset: f32,
}

impl Plane3D {
    /// Creates a new plane from a normal vector and offset.
    /// The normal will be normalized automatically.
    ///
    /// # Panics
    /// Panics if the normal vector has zero length.
    pub fn new(normal: Vector3<f32>, offset: f32) -> Self {
        let norm = normal.norm();
        assert!(norm > f32::EPSILON, "Plane normal cannot be zero");
        Self {
            normal: normal / norm,
            offset: offset / norm,
        }
    }

    /// Creates a plane from a point on the plane and a normal vector.
    ///
    /// Returns `None` if the normal has zero length.
    pub fn from_point_and_normal(point: Point3<f32>, normal: Vector3<f32>) -> Option<Self> {
        let norm = normal.norm();
        if norm <= f32::EPSILON {
            return None;
        }
        let unit_normal = normal / norm;
        let offset = unit_normal.dot(&point.coords);
        Some(Self {
            normal: unit_normal,
            offset,
        })
    }

    /// Creates a plane from three points.
    /// The normal direction follows the right-hand rule: (b - a) × (c - a).
    ///
    /// Returns `None` if the points are collinear.
    pub fn from_three_points(a: Point3<f32>, b: Point3<f32>, c: Point3<f32>) -> Option<Self> {
        let normal = (b - a).cross(&(c - a));
        Self::from_point_and_normal(a, normal)
    }

    /// Returns the unit normal vector of the plane.
    #[inline]
    pub fn normal(&self) -> Vector3<f32> {
        self.normal
    }

    /// Returns the signed distance from the origin to the plane along the normal.
    #[inline]
    pub fn offset(&self) -> f32 {
        self.offset
    }

    /// Computes the signed distance from a point to the plane.
    #[inline]
    pub fn signed_distance(&self, point: Point3<f32>) -> f32 {
        self.normal.dot(&point.coords) - self.offset
    }

    /// Classifies which side of the plane a point lies on, using `ROUND_EPSILON`.
    #[inline]
    pub fn classify_point(&self, point: Point3<f32>) -> PlaneSide {
        self.classify_point_with_epsilon(point, ROUND_EPSILON)
    }

    /// Classifies which side of the plane a point lies on, with a custom epsilon.
    pub fn classify_point_with_epsilon(&self, point: Point3<f32>, epsilon: f32) -> PlaneSide {
        let dist = self.signed_distance(point);
        if dist > epsilon {
            PlaneSide::Front
        } else if dist < -epsilon {
            PlaneSide::Back
        } else {
            PlaneSide::OnPlane
        }
    }

    /// Returns a new plane with the normal flipped (facing the opposite direction).
    #[inline]
    pub fn flipped(&self) -> Self {
        Self {
            normal: -self.normal,
            offset: -self.offset,
        }
    }

    /// Returns `true` if both planes describe the same oriented plane within
    /// `ROUND_EPSILON`.
    pub fn approx_eq(&self, other: &Plane3D) -> bool {
        (self.offset - other.offset).abs() <= ROUND_EPSILON
            && (self.normal - other.normal).amax() <= ROUND_EPSILON * 0.1
    }

    /// Returns `true` if both planes are the same geometric plane, in either
    /// orientation.
    pub fn is_coincident(&self, other: &Plane3D) -> bool {
        self.approx_eq(other) || self.approx_eq(&other.flipped())
    }

    /// Returns `true` if the normal is (nearly) parallel to a world axis.
    pub fn is_axis_aligned(&self) -> bool {
        self.normal.amax() >= 1.0 - ROUND_EPSILON * 0.1
    }

    /// Returns two orthonormal vectors spanning the plane.
    ///
    /// The basis depends only on the normal, so every face on the same plane
    /// projects onto the same 2D grid.
    pub fn span_basis(&self) -> (Vector3<f32>, Vector3<f32>) {
        let n = self.normal;
        let helper = if n.z.abs() >= n.x.abs() && n.z.abs() >= n.y.abs() {
            Vector3::y()
        } else {
            Vector3::z()
        };
        let u = helper.cross(&n).normalize();
        let v = n.cross(&u);
        (u, v)
    }

    /// Projects a point onto the plane (finds the closest point on the plane).
    #[inline]
    pub fn project_point(&self, point: Point3<f32>) -> Point3<f32> {
        point - self.normal * self.signed_distance(point)
    }

    /// Computes the intersection of a line segment with the plane.
    ///
    /// Returns `Some((t, point))` where `t` is the interpolation parameter
    /// (0.0 = start, 1.0 = end). Returns `None` if the segment is parallel to
    /// the plane or does not reach it.
    pub fn intersect_segment(
        &self,
        start: Point3<f32>,
        end: Point3<f32>,
    ) -> Option<(f32, Point3<f32>)> {
        let direction = end - start;
        let denom = self.normal.dot(&direction);

        // Segment is parallel to plane
        if denom.abs() < f32::EPSILON {
            return None;
        }

        let t = (self.offset - self.normal.dot(&start.coords)) / denom;
        if !(0.0..=1.0).contains(&t) {
            return None;
        }

        Some((t, start + direction * t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn new_normalizes() {
        let plane = Plane3D::new(Vector3::new(0.0, 0.0, 2.0), 4.0);
        assert_relative_eq!(plane.normal().z, 1.0);
        assert_relative_eq!(plane.offset(), 2.0);
    }

    #[test]
    fn classify_uses_round_epsilon() {
        let plane = Plane3D::new(Vector3::z(), 0.0);
        assert_eq!(plane.classify_point(Point3::new(0.0, 0.0, 0.5)), PlaneSide::Front);
        assert_eq!(plane.classify_point(Point3::new(0.0, 0.0, -0.5)), PlaneSide::Back);
        assert_eq!(
            plane.classify_point(Point3::new(3.0, 1.0, ROUND_EPSILON * 0.5)),
            PlaneSide::OnPlane
        );
    }

    #[test]
    fn coincident_ignores_orientation() {
        let plane = Plane3D::new(Vector3::x(), 4.0);
        assert!(plane.is_coincident(&plane.flipped()));
        assert!(!plane.approx_eq(&plane.flipped()));
        assert!(!plane.is_coincident(&Plane3D::new(Vector3::x(), 5.0)));
    }

    #[test]
    fn axis_alignment() {
        assert!(Plane3D::new(-Vector3::y(), 1.0).is_axis_aligned());
        assert!(!Plane3D::new(Vector3::new(1.0, 1.0, 0.0), 0.0).is_axis_aligned());
    }

    #[test]
    fn span_basis_is_orthonormal() {
        for normal in [Vector3::x(), Vector3::y(), Vector3::z(), Vector3::new(1.0, 2.0, 3.0)] {
            let plane = Plane3D::new(normal, 1.0);
            let (u, v) = plane.span_basis();
            assert_relative_eq!(u.norm(), 1.0, epsilon = 1e-5);
            assert_relative_eq!(v.norm(), 1.0, epsilon = 1e-5);
            assert_relative_eq!(u.dot(&v), 0.0, epsilon = 1e-5);
            assert_relative_eq!(u.dot(&plane.normal()), 0.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn intersect_segment_midpoint() {
        let plane = Plane3D::new(Vector3::x(), 1.0);
        let (t, point) = plane
            .intersect_segment(Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 2.0, 0.0))
            .unwrap();
        assert_relative_eq!(t, 0.5);
        assert_relative_eq!(point, Point3::new(1.0, 1.0, 0.0));
    }
}
