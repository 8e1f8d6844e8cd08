//! Convex polygon representation for the compiler.

use nalgebra::{Point3, Vector3};

use crate::{Aabb, Classification, Cuttable, Plane3D, PlaneSide, MIN_VERTEX_DIST, ROUND_EPSILON};

/// A convex polygon in 3D space, defined by an ordered list of vertices and
/// the plane it lies on.
///
/// Vertices are in counter-clockwise winding order when viewed from the front
/// (the direction the plane normal points).
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    vertices: Vec<Point3<f32>>,
    plane: Plane3D,
}

impl Polygon {
    /// Creates a new polygon from a list of vertices, deriving its plane.
    ///
    /// # Panics
    /// Panics if fewer than 3 vertices are provided or the vertices are collinear.
    pub fn new(vertices: Vec<Point3<f32>>) -> Self {
        Self::try_new(vertices).expect("Polygon needs at least 3 non-collinear vertices")
    }

    /// Creates a new polygon from a list of vertices, deriving its plane.
    ///
    /// Returns `None` if the vertices do not span a plane.
    pub fn try_new(vertices: Vec<Point3<f32>>) -> Option<Self> {
        if vertices.len() < 3 {
            return None;
        }
        let plane = Plane3D::from_point_and_normal(centroid_of(&vertices), newell_normal(&vertices))?;
        debug_assert!(
            vertices.iter().all(|v| plane.classify_point(*v) == PlaneSide::OnPlane),
            "Polygon vertices must be coplanar"
        );
        Some(Self { vertices, plane })
    }

    /// Creates a polygon on a known plane. Used for pieces of an existing
    /// polygon, which keep their parent's plane exactly.
    pub fn with_plane(vertices: Vec<Point3<f32>>, plane: Plane3D) -> Self {
        Self { vertices, plane }
    }

    /// Returns the vertices of the polygon.
    #[inline]
    pub fn vertices(&self) -> &[Point3<f32>] {
        &self.vertices
    }

    /// Returns the number of vertices.
    #[inline]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Returns the supporting plane.
    #[inline]
    pub fn plane(&self) -> &Plane3D {
        &self.plane
    }

    /// Returns the unit normal of the supporting plane.
    #[inline]
    pub fn normal(&self) -> Vector3<f32> {
        self.plane.normal()
    }

    /// Computes the area of the polygon.
    pub fn area(&self) -> f32 {
        if self.vertices.len() < 3 {
            return 0.0;
        }
        newell_normal(&self.vertices).norm() * 0.5
    }

    /// Computes the vertex average of the polygon.
    pub fn centroid(&self) -> Point3<f32> {
        centroid_of(&self.vertices)
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_points(self.vertices.iter().copied())
            .unwrap_or_else(|| Aabb::new(Point3::origin(), Point3::origin()))
    }

    /// Checks the polygon invariants: at least three vertices, no two
    /// consecutive vertices closer than `MIN_VERTEX_DIST`, non-zero area.
    pub fn is_valid(&self) -> bool {
        let n = self.vertices.len();
        n >= 3
            && (0..n).all(|i| {
                (self.vertices[(i + 1) % n] - self.vertices[i]).norm() >= MIN_VERTEX_DIST
            })
            && self.area() > MIN_VERTEX_DIST * MIN_VERTEX_DIST * 0.5
    }

    /// Classifies this polygon relative to a plane.
    pub fn classify(&self, plane: &Plane3D) -> Classification {
        let mut front = 0;
        let mut back = 0;

        for vertex in &self.vertices {
            match plane.classify_point(*vertex) {
                PlaneSide::Front => front += 1,
                PlaneSide::Back => back += 1,
                PlaneSide::OnPlane => {}
            }
        }

        match (front, back) {
            (0, 0) if self.plane.normal().dot(&plane.normal()) > 0.0 => {
                Classification::CoplanarFront
            }
            (0, 0) => Classification::CoplanarBack,
            (_, 0) => Classification::Front,
            (0, _) => Classification::Back,
            _ => Classification::Spanning,
        }
    }

    /// Returns a copy with vertices closer than `MIN_VERTEX_DIST` to their
    /// predecessor removed.
    pub fn welded(&self) -> Polygon {
        let mut vertices: Vec<Point3<f32>> = Vec::with_capacity(self.vertices.len());
        for v in &self.vertices {
            if vertices.last().is_none_or(|last| (v - last).norm() >= MIN_VERTEX_DIST) {
                vertices.push(*v);
            }
        }
        while vertices.len() > 1 {
            let (first, last) = (vertices[0], vertices[vertices.len() - 1]);
            if (first - last).norm() >= MIN_VERTEX_DIST {
                break;
            }
            vertices.pop();
        }
        Polygon::with_plane(vertices, self.plane.clone())
    }

    /// Planes through each edge, perpendicular to the polygon, normals
    /// pointing away from the interior. Degenerate edges are skipped.
    pub fn edge_planes(&self) -> Vec<Plane3D> {
        let n = self.vertices.len();
        (0..n)
            .filter_map(|i| {
                let p = self.vertices[i];
                let q = self.vertices[(i + 1) % n];
                Plane3D::from_point_and_normal(p, (q - p).cross(&self.normal()))
            })
            .collect()
    }

    /// Returns the part of `self` covered by `other`, if the two are coplanar
    /// (either orientation) and the shared part is a valid polygon.
    pub fn overlap(&self, other: &Polygon) -> Option<Polygon> {
        if !self.plane.is_coincident(&other.plane) {
            return None;
        }
        let mut inside = self.clone();
        for edge in other.edge_planes() {
            inside = inside.clip_front(&edge.flipped())?;
        }
        inside.is_valid().then_some(inside)
    }

    /// Removes the part covered by `other`, returning the remaining convex
    /// pieces. Returns `self` unchanged when the two do not overlap.
    pub fn subtract(&self, other: &Polygon) -> Vec<Polygon> {
        if self.overlap(other).is_none() {
            return vec![self.clone()];
        }

        let mut pieces = Vec::new();
        let mut remaining = self.clone();
        for edge in other.edge_planes() {
            match remaining.classify(&edge) {
                Classification::Back | Classification::CoplanarFront | Classification::CoplanarBack => {}
                Classification::Front => {
                    pieces.push(remaining);
                    return pieces;
                }
                Classification::Spanning => {
                    let (outside, inside) = remaining.cut(&edge);
                    pieces.extend(outside);
                    match inside {
                        Some(inside) => remaining = inside,
                        None => return pieces,
                    }
                }
            }
        }
        pieces
    }

    /// Merges with an adjacent polygon on the same oriented plane.
    ///
    /// The two must share one edge, walked in opposite directions. Returns
    /// `None` if there is no shared edge or the result is not convex.
    pub fn try_merge(&self, other: &Polygon) -> Option<Polygon> {
        if !self.plane.approx_eq(&other.plane) {
            return None;
        }

        let n = self.vertices.len();
        let m = other.vertices.len();
        let (i, j) = (0..n).find_map(|i| {
            let a = self.vertices[i];
            let b = self.vertices[(i + 1) % n];
            (0..m)
                .find(|&j| {
                    points_coincide(other.vertices[j], b)
                        && points_coincide(other.vertices[(j + 1) % m], a)
                })
                .map(|j| (i, j))
        })?;

        // self from b around to a, then other strictly between a and b
        let mut vertices = Vec::with_capacity(n + m - 2);
        vertices.extend((1..=n).map(|k| self.vertices[(i + k) % n]));
        vertices.extend((2..m).map(|k| other.vertices[(j + k) % m]));

        let merged = Polygon::with_plane(remove_collinear(vertices), self.plane.clone());
        (merged.is_valid() && merged.is_convex()).then_some(merged)
    }

    /// Returns `true` if no vertex lies outside any edge plane.
    pub fn is_convex(&self) -> bool {
        self.edge_planes().iter().all(|edge| {
            self.vertices
                .iter()
                .all(|v| edge.classify_point(*v) != PlaneSide::Front)
        })
    }

    /// Inserts `point` between the endpoints of the edge whose interior it
    /// lies on. Returns `false` if it lies on no edge interior.
    pub fn insert_on_edge(&mut self, point: Point3<f32>) -> bool {
        let n = self.vertices.len();
        for i in 0..n {
            let p = self.vertices[i];
            let q = self.vertices[(i + 1) % n];
            let edge = q - p;
            let length = edge.norm();
            if length < 2.0 * MIN_VERTEX_DIST {
                continue;
            }
            let dir = edge / length;
            let t = (point - p).dot(&dir);
            if t < MIN_VERTEX_DIST || t > length - MIN_VERTEX_DIST {
                continue;
            }
            let off_line = (point - (p + dir * t)).norm();
            if off_line < ROUND_EPSILON {
                self.vertices.insert(i + 1, point);
                return true;
            }
        }
        false
    }
}

/// Returns `true` if two points are closer than `MIN_VERTEX_DIST`.
#[inline]
pub fn points_coincide(a: Point3<f32>, b: Point3<f32>) -> bool {
    (a - b).norm() < MIN_VERTEX_DIST
}

fn centroid_of(vertices: &[Point3<f32>]) -> Point3<f32> {
    let sum: Vector3<f32> = vertices.iter().map(|p| p.coords).sum();
    Point3::from(sum / vertices.len().max(1) as f32)
}

/// Newell's method: twice the area-weighted normal of a planar loop.
fn newell_normal(vertices: &[Point3<f32>]) -> Vector3<f32> {
    let origin = vertices[0];
    let n = vertices.len();
    (1..n - 1)
        .map(|i| (vertices[i] - origin).cross(&(vertices[i + 1] - origin)))
        .sum()
}

/// Drops vertices that lie on the line through their neighbours.
fn remove_collinear(mut vertices: Vec<Point3<f32>>) -> Vec<Point3<f32>> {
    let mut i = 0;
    while vertices.len() > 3 && i < vertices.len() {
        let n = vertices.len();
        let prev = vertices[(i + n - 1) % n];
        let next = vertices[(i + 1) % n];
        let line = next - prev;
        let length = line.norm();
        let collinear = length > f32::EPSILON
            && ((vertices[i] - prev).cross(&line).norm() / length) < ROUND_EPSILON;
        if collinear {
            vertices.remove(i);
            i = i.saturating_sub(1);
        } else {
            i += 1;
        }
    }
    vertices
}
