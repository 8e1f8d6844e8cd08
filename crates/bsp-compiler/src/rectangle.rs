//! Rectangle (quad) construction.

use nalgebra::{Point3, Vector3};

use crate::{Aabb, Plane3D, Polygon};

/// A rectangle (quad) in 3D space, defined by a corner and two edge vectors.
///
/// The four vertices are:
/// - `origin`
/// - `origin + u`
/// - `origin + u + v`
/// - `origin + v`
#[derive(Debug, Clone, PartialEq)]
pub struct Rectangle {
    origin: Point3<f32>,
    u: Vector3<f32>,
    v: Vector3<f32>,
}

impl Rectangle {
    /// Creates a new rectangle from an origin corner and two edge vectors.
    ///
    /// The vertices will be: origin, origin+u, origin+u+v, origin+v (counter-clockwise).
    pub fn new(origin: Point3<f32>, u: Vector3<f32>, v: Vector3<f32>) -> Self {
        Self { origin, u, v }
    }

    /// Creates a square on `plane`, centred on the projection of `center`,
    /// with half edge length `half_extent`. Its winding matches the plane
    /// normal.
    pub fn on_plane(plane: &Plane3D, center: Point3<f32>, half_extent: f32) -> Self {
        let (u, v) = plane.span_basis();
        let center = plane.project_point(center);
        Self {
            origin: center - (u + v) * half_extent,
            u: u * (2.0 * half_extent),
            v: v * (2.0 * half_extent),
        }
    }

    /// The six faces of a box, each facing into the box.
    pub fn box_interior(bounds: &Aabb) -> [Rectangle; 6] {
        let Aabb { min, max } = *bounds;
        let size = max - min;
        let (dx, dy, dz) = (
            Vector3::new(size.x, 0.0, 0.0),
            Vector3::new(0.0, size.y, 0.0),
            Vector3::new(0.0, 0.0, size.z),
        );
        [
            Rectangle::new(min, dy, dz),  // x = min, normal +x
            Rectangle::new(max, -dz, -dy), // x = max, normal -x
            Rectangle::new(min, dz, dx),  // y = min, normal +y
            Rectangle::new(max, -dx, -dz), // y = max, normal -y
            Rectangle::new(min, dx, dy),  // z = min, normal +z
            Rectangle::new(max, -dy, -dx), // z = max, normal -z
        ]
    }

    /// Returns the origin corner of the rectangle.
    #[inline]
    pub fn origin(&self) -> Point3<f32> {
        self.origin
    }

    /// Returns the first edge vector.
    #[inline]
    pub fn u(&self) -> Vector3<f32> {
        self.u
    }

    /// Returns the second edge vector.
    #[inline]
    pub fn v(&self) -> Vector3<f32> {
        self.v
    }

    /// Returns the four vertices of the rectangle.
    ///
    /// Order: origin, origin+u, origin+u+v, origin+v (counter-clockwise).
    pub fn vertices(&self) -> [Point3<f32>; 4] {
        [
            self.origin,
            self.origin + self.u,
            self.origin + self.u + self.v,
            self.origin + self.v,
        ]
    }

    /// Computes the (unnormalized) normal vector of the rectangle: u × v.
    pub fn normal(&self) -> Vector3<f32> {
        self.u.cross(&self.v)
    }

    /// Computes the area of the rectangle.
    pub fn area(&self) -> f32 {
        self.normal().norm()
    }

    /// Computes the centroid (center) of the rectangle.
    pub fn centroid(&self) -> Point3<f32> {
        self.origin + (self.u + self.v) * 0.5
    }

    /// Converts to a polygon. Returns `None` if `u` and `v` are parallel.
    pub fn to_polygon(&self) -> Option<Polygon> {
        Polygon::try_new(self.vertices().to_vec())
    }
}
