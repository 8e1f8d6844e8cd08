//! Exact face and bounds assignment to leaves.

use nalgebra::Point3;

use crate::{Aabb, Classification, Cuttable, FaceId, Polygon, WorldGeometry, ROUND_EPSILON};

use super::node::Child;

/// Distance the world box extends past all geometry.
pub const WORLD_MARGIN: f32 = 1.0;

/// Walks a built tree with every face and the world box, recording at each
/// leaf the faces that reach it and the exact bounds of its region.
///
/// The tree builder only decides where planes go; with its epsilon slack a
/// face can end up attributed to the wrong side. This walk splits faces for
/// real (the pieces are thrown away afterwards) so every leaf gets exactly
/// the faces that touch it.
#[derive(Debug, Clone, Copy, Default)]
pub struct LeafAssigner;

/// Counters of one assignment pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssignStats {
    /// Sum of face references over all leaves.
    pub face_refs: usize,
    /// Sum of scene reference links over all leaves.
    pub scene_links: usize,
    pub empty_leaves: usize,
}

impl LeafAssigner {
    /// The box the root region is clipped to.
    pub fn world_bounds(world: &WorldGeometry) -> Aabb {
        world
            .bounds()
            .unwrap_or_else(|| Aabb::new(Point3::origin(), Point3::origin()))
            .expanded(WORLD_MARGIN)
    }

    pub fn assign(&self, world: &mut WorldGeometry) -> AssignStats {
        let mut stats = AssignStats::default();
        let Some(root) = world.root else {
            return stats;
        };

        let pieces: Vec<(FaceId, Polygon)> = world
            .faces
            .iter()
            .enumerate()
            .map(|(i, face)| (FaceId::new(i), face.polygon.clone()))
            .collect();

        let mut stack = vec![(root, pieces, Self::world_bounds(world))];
        while let Some((child, pieces, bounds)) = stack.pop() {
            match child {
                Child::Leaf(leaf) => {
                    let mut faces: Vec<FaceId> = pieces.into_iter().map(|(id, _)| id).collect();
                    faces.sort_unstable();
                    faces.dedup();

                    let scene_refs: Vec<usize> = world
                        .scene_refs
                        .iter()
                        .enumerate()
                        .filter(|(_, r)| r.bounds.overlaps(&bounds, ROUND_EPSILON))
                        .map(|(i, _)| i)
                        .collect();

                    stats.face_refs += faces.len();
                    stats.scene_links += scene_refs.len();
                    if faces.is_empty() {
                        stats.empty_leaves += 1;
                    }
                    world.leaves[leaf.index()].assign(bounds, faces, scene_refs);
                }
                Child::Node(node) => {
                    let node = world.node(node);
                    let plane = node.plane();
                    let mut front = Vec::new();
                    let mut back = Vec::new();

                    for (id, piece) in pieces {
                        match piece.classify(plane) {
                            Classification::Front | Classification::CoplanarFront => {
                                front.push((id, piece))
                            }
                            Classification::Back | Classification::CoplanarBack => {
                                back.push((id, piece))
                            }
                            Classification::Spanning => match piece.cut(plane) {
                                (None, None) => {
                                    front.push((id, piece.clone()));
                                    back.push((id, piece));
                                }
                                (f, b) => {
                                    front.extend(f.map(|f| (id, f)));
                                    back.extend(b.map(|b| (id, b)));
                                }
                            },
                        }
                    }

                    let (front_bounds, back_bounds) = bounds.split(plane);
                    stack.push((node.back(), back, back_bounds.unwrap_or(bounds)));
                    stack.push((node.front(), front, front_bounds.unwrap_or(bounds)));
                }
            }
        }

        log::debug!(
            "leaves: {} face references, {} scene links, {} empty leaves",
            stats.face_refs,
            stats.scene_links,
            stats.empty_leaves
        );
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bsp::{ScoredSelector, TreeBuilder};
    use crate::{Face, MaterialId, SceneReference, StraddlePolicy};

    fn make_face(points: &[[f32; 3]]) -> Face {
        let polygon = Polygon::new(points.iter().map(|p| Point3::new(p[0], p[1], p[2])).collect());
        Face::new(polygon, MaterialId(0))
    }

    fn build_and_assign(faces: Vec<Face>) -> WorldGeometry {
        let mut world = WorldGeometry::new(faces);
        TreeBuilder::new(&ScoredSelector::default(), StraddlePolicy::Duplicate).build(&mut world);
        LeafAssigner.assign(&mut world);
        world
    }

    #[test]
    fn coplanar_face_goes_to_the_side_it_faces() {
        // floor facing up
        let world = build_and_assign(vec![make_face(&[
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ])]);
        let above = world.locate_leaf(Point3::new(0.5, 0.5, 0.5)).unwrap();
        let below = world.locate_leaf(Point3::new(0.5, 0.5, -0.5)).unwrap();
        assert_eq!(world.leaf(above).faces(), &[FaceId(0)]);
        assert!(world.leaf(below).faces().is_empty());

        let bounds = world.leaf(above).bounds().unwrap();
        approx::assert_relative_eq!(bounds.min.z, 0.0, epsilon = 1e-6);
        approx::assert_relative_eq!(bounds.max.z, 1.0);
    }

    #[test]
    fn straddling_face_reaches_both_leaves() {
        let world = build_and_assign(vec![
            make_face(&[[0.0, 0.0, -2.0], [0.0, 4.0, -2.0], [0.0, 4.0, 2.0], [0.0, 0.0, 2.0]]),
            make_face(&[[-2.0, 0.0, 0.0], [2.0, 0.0, 0.0], [2.0, 4.0, 0.0], [-2.0, 4.0, 0.0]]),
        ]);
        let mut holders = 0;
        for leaf in &world.leaves {
            if leaf.faces().contains(&FaceId(1)) {
                holders += 1;
            }
        }
        assert_eq!(holders, 2);
    }

    #[test]
    fn assigned_faces_overlap_leaf_bounds() {
        let world = build_and_assign(vec![
            make_face(&[[0.0, 0.0, -2.0], [0.0, 4.0, -2.0], [0.0, 4.0, 2.0], [0.0, 0.0, 2.0]]),
            make_face(&[[-2.0, 0.0, 0.0], [2.0, 0.0, 0.0], [2.0, 4.0, 0.0], [-2.0, 4.0, 0.0]]),
            make_face(&[[-2.0, 4.0, -2.0], [2.0, 4.0, -2.0], [2.0, 4.0, 2.0], [-2.0, 4.0, 2.0]]),
        ]);
        for leaf in &world.leaves {
            let bounds = leaf.bounds().unwrap();
            for id in leaf.faces() {
                assert!(world.face(*id).bounds().overlaps(bounds, ROUND_EPSILON));
            }
        }
    }

    #[test]
    fn scene_refs_attach_by_bounds() {
        let mut world = WorldGeometry::new(vec![make_face(&[
            [0.0, 0.0, 0.0],
            [4.0, 0.0, 0.0],
            [4.0, 4.0, 0.0],
            [0.0, 4.0, 0.0],
        ])]);
        world.scene_refs.push(SceneReference {
            bounds: Aabb::new(Point3::new(1.0, 1.0, 0.5), Point3::new(2.0, 2.0, 1.0)),
            tag: 9,
        });
        TreeBuilder::new(&ScoredSelector::default(), StraddlePolicy::Duplicate).build(&mut world);
        LeafAssigner.assign(&mut world);

        let above = world.locate_leaf(Point3::new(1.5, 1.5, 0.7)).unwrap();
        let below = world.locate_leaf(Point3::new(1.5, 1.5, -0.5)).unwrap();
        assert_eq!(world.leaf(above).scene_refs(), &[0]);
        assert!(world.leaf(below).scene_refs().is_empty());
    }
}
