//! Shared fixtures for the compile scenarios.

#![allow(dead_code)]

use bsp_compiler::{
    Aabb, AtlasAllocator, AtlasKind, AtlasPlacement, CompileOptions, Face, MaterialId, Polygon, Rectangle,
};
use nalgebra::Point3;

pub const WALL: MaterialId = MaterialId(0);

/// Centre of the 4x4x4 test cube.
pub fn cube_centre() -> Point3<f32> {
    Point3::new(2.0, 2.0, 2.0)
}

pub fn make_face(points: &[[f32; 3]]) -> Face {
    let polygon = Polygon::new(points.iter().map(|p| Point3::new(p[0], p[1], p[2])).collect());
    Face::new(polygon, WALL)
}

/// The six walls of the cube `[0, 4]³`, facing inward.
pub fn closed_cube() -> Vec<Face> {
    let cube = Aabb::new(Point3::origin(), Point3::new(4.0, 4.0, 4.0));
    Rectangle::box_interior(&cube)
        .iter()
        .filter_map(Rectangle::to_polygon)
        .map(|polygon| Face::new(polygon, WALL))
        .collect()
}

/// The cube with its `x = 0` wall replaced by four strips around a 1x1
/// hole at `y, z ∈ [1.5, 2.5]`.
pub fn cube_with_hole() -> Vec<Face> {
    let mut faces = closed_cube();
    // box_interior puts the x = min wall first
    faces.remove(0);
    faces.extend([
        make_face(&[[0.0, 0.0, 0.0], [0.0, 4.0, 0.0], [0.0, 4.0, 1.5], [0.0, 0.0, 1.5]]),
        make_face(&[[0.0, 0.0, 2.5], [0.0, 4.0, 2.5], [0.0, 4.0, 4.0], [0.0, 0.0, 4.0]]),
        make_face(&[[0.0, 0.0, 1.5], [0.0, 1.5, 1.5], [0.0, 1.5, 2.5], [0.0, 0.0, 2.5]]),
        make_face(&[[0.0, 2.5, 1.5], [0.0, 4.0, 1.5], [0.0, 4.0, 2.5], [0.0, 2.5, 2.5]]),
    ]);
    faces
}

/// A point just outside the hole.
pub fn beyond_hole() -> Point3<f32> {
    Point3::new(-0.1, 2.0, 2.0)
}

pub fn options(require_watertight: bool) -> CompileOptions {
    CompileOptions {
        require_watertight,
        ..CompileOptions::default()
    }
}

/// An atlas with unlimited room, one tile per request.
#[derive(Debug, Default)]
pub struct TileCounter {
    pub requests: Vec<(AtlasKind, u32, u32)>,
}

impl AtlasAllocator for TileCounter {
    fn allocate(&mut self, kind: AtlasKind, width: u32, height: u32) -> Option<AtlasPlacement> {
        self.requests.push((kind, width, height));
        Some(AtlasPlacement {
            tile: self.requests.len() as u32 - 1,
            offset: [0, 0],
            size: [width, height],
        })
    }
}
