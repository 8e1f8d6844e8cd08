//! Merging of adjacent coplanar faces.

use crate::{Face, WorldGeometry};

/// Joins neighbouring faces that render as one surface.
///
/// Faces are grouped by [`Face::same_surface`]. Inside a group any two
/// faces sharing an edge are merged when the union is still a valid convex
/// polygon; the merged face takes the first one's place and the second is
/// removed by swapping in the last. A group is scanned again until a whole
/// pass merges nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoplanarMerger;

impl CoplanarMerger {
    /// Returns the number of merges. Face ids and the tree are invalidated.
    pub fn merge(&self, world: &mut WorldGeometry) -> usize {
        let mut groups: Vec<Vec<Face>> = Vec::new();
        for face in world.faces.drain(..) {
            match groups.iter_mut().find(|g| g[0].same_surface(&face)) {
                Some(group) => group.push(face),
                None => groups.push(vec![face]),
            }
        }

        let before = groups.iter().map(Vec::len).sum::<usize>();
        let merges: usize = groups.iter_mut().map(|group| merge_group(group)).sum();
        world.faces = groups.into_iter().flatten().collect();
        world.clear_tree();

        log::info!(
            "merge: {merges} merges, {before} -> {} faces",
            world.faces.len()
        );
        merges
    }
}

fn merge_group(group: &mut Vec<Face>) -> usize {
    let mut merges = 0;
    loop {
        let mut changed = false;
        let mut i = 0;
        while i < group.len() {
            let mut j = i + 1;
            while j < group.len() {
                match group[i].polygon.try_merge(&group[j].polygon) {
                    Some(merged) => {
                        group[i] = group[i].with_polygon(merged);
                        group.swap_remove(j);
                        merges += 1;
                        changed = true;
                    }
                    None => j += 1,
                }
            }
            i += 1;
        }
        if !changed {
            return merges;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MaterialId, Polygon, TextureProjection};
    use nalgebra::{Point3, Vector4};

    fn rect(x0: f32, x1: f32, material: MaterialId) -> Face {
        let polygon = Polygon::new(vec![
            Point3::new(x0, 0.0, 0.0),
            Point3::new(x1, 0.0, 0.0),
            Point3::new(x1, 1.0, 0.0),
            Point3::new(x0, 1.0, 0.0),
        ]);
        Face::new(polygon, material)
    }

    #[test]
    fn strip_of_quads_becomes_one() {
        let mut world = WorldGeometry::new(vec![
            rect(0.0, 1.0, MaterialId(0)),
            rect(2.0, 3.0, MaterialId(0)),
            rect(1.0, 2.0, MaterialId(0)),
            rect(3.0, 4.0, MaterialId(0)),
        ]);
        assert_eq!(CoplanarMerger.merge(&mut world), 3);
        assert_eq!(world.faces.len(), 1);
        approx::assert_relative_eq!(world.faces[0].polygon.area(), 4.0, epsilon = 1e-4);
        assert_eq!(world.faces[0].polygon.len(), 4);
    }

    #[test]
    fn different_materials_stay_apart() {
        let mut world = WorldGeometry::new(vec![rect(0.0, 1.0, MaterialId(0)), rect(1.0, 2.0, MaterialId(1))]);
        assert_eq!(CoplanarMerger.merge(&mut world), 0);
        assert_eq!(world.faces.len(), 2);
    }

    #[test]
    fn different_projection_stays_apart() {
        let shifted = TextureProjection {
            u: Vector4::new(1.0, 0.0, 0.0, 0.5),
            ..TextureProjection::default()
        };
        let mut world = WorldGeometry::new(vec![
            rect(0.0, 1.0, MaterialId(0)),
            rect(1.0, 2.0, MaterialId(0)).with_projection(shifted),
        ]);
        assert_eq!(CoplanarMerger.merge(&mut world), 0);
    }

    #[test]
    fn gap_prevents_merge() {
        let mut world = WorldGeometry::new(vec![rect(0.0, 1.0, MaterialId(0)), rect(1.5, 2.0, MaterialId(0))]);
        assert_eq!(CoplanarMerger.merge(&mut world), 0);
    }
}
