//! Shared draw-vertex buffer construction.

use nalgebra::Point3;
use rustc_hash::FxHashMap;

use crate::progress::Progress;
use crate::{WorldGeometry, ROUND_EPSILON};

/// Edge length of the weld grid cells; two points within `ROUND_EPSILON`
/// always fall in neighbouring cells.
const CELL_SIZE: f32 = 4.0 * ROUND_EPSILON;

/// Counters of one mesh build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MeshStats {
    /// Vertices added to fix T-junctions.
    pub t_junctions: usize,
    pub vertices: usize,
    pub indices: usize,
}

/// Builds [`WorldGeometry::draw_vertices`] and every face's draw indices.
///
/// First each face gains the vertices of nearby faces that lie on its
/// edges, so neighbouring faces share vertices along a common border. Then
/// all vertices are welded through a spatial hash into one buffer.
#[derive(Debug, Clone, Copy, Default)]
pub struct DrawMeshBuilder;

impl DrawMeshBuilder {
    pub fn build(&self, world: &mut WorldGeometry) -> MeshStats {
        let mut stats = MeshStats {
            t_junctions: self.fix_t_junctions(world),
            ..MeshStats::default()
        };

        world.draw_vertices.clear();
        let mut welder = Welder::default();
        for face in &mut world.faces {
            face.draw_indices = face
                .polygon
                .vertices()
                .iter()
                .map(|p| welder.index_of(&mut world.draw_vertices, *p))
                .collect();
            stats.indices += face.draw_indices.len();
        }
        stats.vertices = world.draw_vertices.len();

        log::info!(
            "mesh: {} vertices, {} indices, {} t-junctions fixed",
            stats.vertices,
            stats.indices,
            stats.t_junctions
        );
        stats
    }

    fn fix_t_junctions(&self, world: &mut WorldGeometry) -> usize {
        let bounds: Vec<_> = world.faces.iter().map(|f| f.bounds()).collect();
        let mut progress = Progress::new("t-junctions", world.faces.len());
        let mut inserted = 0;

        for a in 0..world.faces.len() {
            for b in 0..world.faces.len() {
                if a == b || !bounds[a].overlaps(&bounds[b], ROUND_EPSILON) {
                    continue;
                }
                let others = world.faces[b].polygon.vertices().to_vec();
                for point in others {
                    if world.faces[a].polygon.insert_on_edge(point) {
                        inserted += 1;
                    }
                }
            }
            progress.tick();
        }
        inserted
    }
}

/// Spatial hash from grid cell to buffer indices.
#[derive(Debug, Default)]
struct Welder {
    cells: FxHashMap<[i32; 3], Vec<u32>>,
}

impl Welder {
    fn cell(point: Point3<f32>) -> [i32; 3] {
        [point.x, point.y, point.z].map(|c| (c / CELL_SIZE).floor() as i32)
    }

    /// Index of a buffered vertex within `ROUND_EPSILON` of `point`,
    /// appending `point` if there is none.
    fn index_of(&mut self, buffer: &mut Vec<Point3<f32>>, point: Point3<f32>) -> u32 {
        let [x, y, z] = Self::cell(point);
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let Some(indices) = self.cells.get(&[x + dx, y + dy, z + dz]) else {
                        continue;
                    };
                    if let Some(&i) = indices
                        .iter()
                        .find(|&&i| (buffer[i as usize] - point).norm() < ROUND_EPSILON)
                    {
                        return i;
                    }
                }
            }
        }

        let index = buffer.len() as u32;
        buffer.push(point);
        self.cells.entry([x, y, z]).or_default().push(index);
        index
    }
}
