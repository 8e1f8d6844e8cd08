//! Axis-aligned bounding boxes.

use nalgebra::{Point3, Vector3};

use crate::Plane3D;

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

/// Corner index pairs of the twelve box edges (bit 0 = x, bit 1 = y, bit 2 = z).
const EDGES: [(usize, usize); 12] = [
    (0, 1), (2, 3), (4, 5), (6, 7),
    (0, 2), (1, 3), (4, 6), (5, 7),
    (0, 4), (1, 5), (2, 6), (3, 7),
];

impl Aabb {
    pub fn new(min: Point3<f32>, max: Point3<f32>) -> Self {
        Self { min, max }
    }

    /// Smallest box containing every point, `None` for an empty iterator.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Point3<f32>>,
    {
        let mut points = points.into_iter();
        let first = points.next()?;
        Some(points.fold(Self::new(first, first), |mut bounds, p| {
            bounds.add_point(p);
            bounds
        }))
    }

    pub fn add_point(&mut self, point: Point3<f32>) {
        self.min = self.min.inf(&point);
        self.max = self.max.sup(&point);
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb::new(self.min.inf(&other.min), self.max.sup(&other.max))
    }

    /// Returns the box grown by `margin` on every side.
    pub fn expanded(&self, margin: f32) -> Aabb {
        let m = Vector3::repeat(margin);
        Aabb::new(self.min - m, self.max + m)
    }

    pub fn center(&self) -> Point3<f32> {
        nalgebra::center(&self.min, &self.max)
    }

    pub fn size(&self) -> Vector3<f32> {
        self.max - self.min
    }

    /// Returns `true` if the boxes intersect once both are grown by `epsilon`.
    pub fn overlaps(&self, other: &Aabb, epsilon: f32) -> bool {
        (0..3).all(|axis| {
            self.min[axis] <= other.max[axis] + epsilon
                && other.min[axis] <= self.max[axis] + epsilon
        })
    }

    pub fn contains_point(&self, point: Point3<f32>, epsilon: f32) -> bool {
        (0..3).all(|axis| {
            point[axis] >= self.min[axis] - epsilon && point[axis] <= self.max[axis] + epsilon
        })
    }

    pub fn corners(&self) -> [Point3<f32>; 8] {
        std::array::from_fn(|i| {
            Point3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            )
        })
    }

    /// The six bounding planes, normals pointing into the box.
    pub fn inward_planes(&self) -> [Plane3D; 6] {
        [
            Plane3D::new(Vector3::x(), self.min.x),
            Plane3D::new(-Vector3::x(), -self.max.x),
            Plane3D::new(Vector3::y(), self.min.y),
            Plane3D::new(-Vector3::y(), -self.max.y),
            Plane3D::new(Vector3::z(), self.min.z),
            Plane3D::new(-Vector3::z(), -self.max.z),
        ]
    }

    /// Splits the box along `plane` with zero tolerance.
    ///
    /// Each returned box is the exact bounds of the part of this box on that
    /// side of the plane. A side the box does not reach strictly is `None`.
    pub fn split(&self, plane: &Plane3D) -> (Option<Aabb>, Option<Aabb>) {
        let corners = self.corners();
        let dist = corners.map(|c| plane.signed_distance(c));

        let mut crossings = Vec::new();
        for (a, b) in EDGES {
            if (dist[a] > 0.0 && dist[b] < 0.0) || (dist[a] < 0.0 && dist[b] > 0.0) {
                let t = dist[a] / (dist[a] - dist[b]);
                crossings.push(corners[a] + (corners[b] - corners[a]) * t);
            }
        }

        let side = |keep: fn(f32) -> bool, strict: fn(f32) -> bool| {
            if !dist.iter().any(|d| strict(*d)) {
                return None;
            }
            let kept = corners
                .iter()
                .zip(dist.iter())
                .filter(|(_, d)| keep(**d))
                .map(|(c, _)| *c);
            Aabb::from_points(kept.chain(crossings.iter().copied()))
        };

        (
            side(|d| d >= 0.0, |d| d > 0.0),
            side(|d| d <= 0.0, |d| d < 0.0),
        )
    }
}
