//! Polygon cutting/splitting operations.

use crate::{Classification, Plane3D, PlaneSide, Polygon};

/// Trait for geometry that can be cut by a plane.
pub trait Cuttable: Sized {
    /// Cuts the geometry by a plane.
    ///
    /// Returns `(front, back)`:
    ///
    /// - **Front** / **CoplanarFront**: `(Some(self), None)`
    /// - **Back** / **CoplanarBack**: `(None, Some(self))`
    /// - **Spanning**: both pieces, each `None` if it came out degenerate
    ///   (see [`Polygon::is_valid`])
    fn cut(&self, plane: &Plane3D) -> (Option<Self>, Option<Self>);

    /// Keeps the part on the front side of the plane (points on the plane
    /// included). Near-duplicate vertices created by the clip are welded.
    fn clip_front(&self, plane: &Plane3D) -> Option<Self>;
}

impl Cuttable for Polygon {
    fn cut(&self, plane: &Plane3D) -> (Option<Polygon>, Option<Polygon>) {
        match self.classify(plane) {
            Classification::Front | Classification::CoplanarFront => (Some(self.clone()), None),
            Classification::Back | Classification::CoplanarBack => (None, Some(self.clone())),
            Classification::Spanning => {
                let (front, back) = split_polygon(self, plane);
                (
                    front.filter(Polygon::is_valid),
                    back.filter(Polygon::is_valid),
                )
            }
        }
    }

    fn clip_front(&self, plane: &Plane3D) -> Option<Polygon> {
        match self.classify(plane) {
            Classification::Back => None,
            Classification::Spanning => split_polygon(self, plane)
                .0
                .map(|front| front.welded())
                .filter(Polygon::is_valid),
            _ => Some(self.clone()),
        }
    }
}

/// Splits a spanning polygon into front and back parts.
///
/// Uses a variant of the Sutherland-Hodgman algorithm:
/// walks the polygon edges and builds two vertex lists,
/// adding intersection points when edges cross the plane.
/// Both pieces keep the parent's plane.
fn split_polygon(polygon: &Polygon, plane: &Plane3D) -> (Option<Polygon>, Option<Polygon>) {
    let vertices = polygon.vertices();
    let n = vertices.len();

    let mut front_verts = Vec::with_capacity(n + 1);
    let mut back_verts = Vec::with_capacity(n + 1);

    let sides: Vec<PlaneSide> = vertices
        .iter()
        .map(|v| plane.classify_point(*v))
        .collect();

    for i in 0..n {
        let current = vertices[i];
        let current_side = sides[i];
        let next_idx = (i + 1) % n;
        let next = vertices[next_idx];
        let next_side = sides[next_idx];

        match current_side {
            PlaneSide::Front => front_verts.push(current),
            PlaneSide::Back => back_verts.push(current),
            PlaneSide::OnPlane => {
                // On-plane vertices go to both sides
                front_verts.push(current);
                back_verts.push(current);
            }
        }

        let crosses = matches!(
            (current_side, next_side),
            (PlaneSide::Front, PlaneSide::Back) | (PlaneSide::Back, PlaneSide::Front)
        );

        if crosses {
            if let Some((_, intersection)) = plane.intersect_segment(current, next) {
                front_verts.push(intersection);
                back_verts.push(intersection);
            }
        }
    }

    let piece = |verts: Vec<_>| {
        (verts.len() >= 3).then(|| Polygon::with_plane(verts, polygon.plane().clone()))
    };

    (piece(front_verts), piece(back_verts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Point3, Vector3};

    fn make_square(size: f32) -> Polygon {
        Polygon::new(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(size, 0.0, 0.0),
            Point3::new(size, size, 0.0),
            Point3::new(0.0, size, 0.0),
        ])
    }

    #[test]
    fn cut_spanning_square() {
        let square = make_square(2.0);
        let plane = Plane3D::new(Vector3::x(), 0.5);
        let (front, back) = square.cut(&plane);
        let front = front.unwrap();
        let back = back.unwrap();

        assert_relative_eq!(front.area(), 3.0, epsilon = 1e-5);
        assert_relative_eq!(back.area(), 1.0, epsilon = 1e-5);
        assert_eq!(front.plane(), square.plane());
    }

    #[test]
    fn cut_one_sided() {
        let square = make_square(1.0);
        let (front, back) = square.cut(&Plane3D::new(Vector3::x(), -1.0));
        assert_eq!(front, Some(square.clone()));
        assert!(back.is_none());

        let (front, back) = square.cut(&Plane3D::new(-Vector3::z(), 0.0));
        assert!(front.is_none());
        assert_eq!(back, Some(square));
    }

    #[test]
    fn degenerate_piece_is_dropped() {
        let square = make_square(1.0);
        // leaves a 0.015 wide sliver on the back side
        let plane = Plane3D::new(Vector3::x(), 0.015);
        let (front, back) = square.cut(&plane);
        assert!(front.is_some());
        assert!(back.is_none());
    }

    #[test]
    fn clip_front_keeps_on_plane() {
        let square = make_square(1.0);
        let clipped = square.clip_front(&Plane3D::new(Vector3::x(), 0.0)).unwrap();
        assert_eq!(clipped, square);
        assert!(square.clip_front(&Plane3D::new(Vector3::x(), 2.0)).is_none());

        let half = square.clip_front(&Plane3D::new(-Vector3::y(), -0.5)).unwrap();
        assert_relative_eq!(half.area(), 0.5, epsilon = 1e-5);
    }
}
