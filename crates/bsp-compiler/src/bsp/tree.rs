//! BSP tree construction.

use rustc_hash::FxHashSet;

use crate::progress::Progress;
use crate::{Classification, Cuttable, FaceId, LeafId, NodeId, Plane3D, StraddlePolicy, WorldGeometry};

use super::node::{BspLeaf, BspNode, Child, Side};
use super::selector::PlaneSelector;

/// Counters of one tree build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub nodes: usize,
    pub leaves: usize,
    pub depth: usize,
    /// Faces cut in two by the `Split` policy.
    pub splits: usize,
    /// Faces placed on both sides of a plane.
    pub duplicates: usize,
}

/// Builds the node/leaf arrays of a [`WorldGeometry`] from its faces.
///
/// Each node's plane is chosen by the [`PlaneSelector`] among the faces
/// that reach it. Faces lying on the plane are consumed by the node; the
/// rest go to the front or back subset, straddling faces according to the
/// [`StraddlePolicy`]. An empty subset ends in a leaf.
///
/// Faces are not attached to leaves here; that is the job of
/// [`super::LeafAssigner`], which repeats the walk without epsilon slack.
///
/// ```ignore
/// let stats = TreeBuilder::new(&ScoredSelector::default(), StraddlePolicy::Duplicate)
///     .build(&mut world);
/// ```
#[derive(Debug)]
pub struct TreeBuilder<'a, S: PlaneSelector> {
    selector: &'a S,
    policy: StraddlePolicy,
}

/// Where the result of a pending subset gets linked.
#[derive(Debug, Clone, Copy)]
enum Slot {
    Root,
    Child(NodeId, Side),
}

/// Stand-in child of a node whose subtrees are still on the work stack.
const UNLINKED: Child = Child::Leaf(LeafId(u32::MAX));

impl<'a, S: PlaneSelector> TreeBuilder<'a, S> {
    pub fn new(selector: &'a S, policy: StraddlePolicy) -> Self {
        Self { selector, policy }
    }

    /// Discards any existing tree and builds a new one over all faces.
    ///
    /// Nodes are created in pre-order and the front subtree is built before
    /// the back subtree, exactly as a recursive build would, but with an
    /// explicit stack so deep trees cannot overflow the call stack.
    pub fn build(&self, world: &mut WorldGeometry) -> BuildStats {
        world.clear_tree();

        let mut stats = BuildStats::default();
        let mut duplicated = FxHashSet::default();
        let mut progress = Progress::new("build tree", world.faces.len());

        let mut stack = vec![(world.face_ids().collect::<Vec<_>>(), Slot::Root, 1)];
        while let Some((subset, slot, depth)) = stack.pop() {
            stats.depth = stats.depth.max(depth);

            let child = match self.selector.select(&world.faces, &subset) {
                None => {
                    let id = LeafId::new(world.leaves.len());
                    world.leaves.push(BspLeaf::new());
                    Child::Leaf(id)
                }
                Some(plane) => {
                    let (front, back) =
                        self.partition(world, subset, &plane, &mut duplicated, &mut stats, &mut progress);
                    let id = NodeId::new(world.nodes.len());
                    world.nodes.push(BspNode::new(plane, UNLINKED, UNLINKED));
                    stack.push((back, Slot::Child(id, Side::Back), depth + 1));
                    stack.push((front, Slot::Child(id, Side::Front), depth + 1));
                    Child::Node(id)
                }
            };

            match slot {
                Slot::Root => world.root = Some(child),
                Slot::Child(parent, side) => world.nodes[parent.index()].link(side, child),
            }
        }

        stats.nodes = world.nodes.len();
        stats.leaves = world.leaves.len();
        log::info!(
            "bsp: {} nodes, {} leaves, depth {}, {} faces ({} split, {} duplicated)",
            stats.nodes,
            stats.leaves,
            stats.depth,
            world.faces.len(),
            stats.splits,
            stats.duplicates
        );
        stats
    }

    /// Sorts a subset into front and back lists. Coplanar faces are dropped
    /// from both: the node's plane accounts for them.
    fn partition(
        &self,
        world: &mut WorldGeometry,
        subset: Vec<FaceId>,
        plane: &Plane3D,
        duplicated: &mut FxHashSet<FaceId>,
        stats: &mut BuildStats,
        progress: &mut Progress,
    ) -> (Vec<FaceId>, Vec<FaceId>) {
        let mut front = Vec::new();
        let mut back = Vec::new();

        for id in subset {
            let face = &world.faces[id.index()];
            match face.polygon.classify(plane) {
                Classification::Front => front.push(id),
                Classification::Back => back.push(id),
                Classification::CoplanarFront | Classification::CoplanarBack => progress.tick(),
                Classification::Spanning => {
                    // A duplicated face is shared with another subtree and
                    // must keep its polygon.
                    let pieces = match self.policy {
                        StraddlePolicy::Split if !duplicated.contains(&id) => {
                            match face.polygon.cut(plane) {
                                (Some(f), Some(b)) => Some((f, b)),
                                _ => {
                                    log::debug!("face {id}: degenerate split, duplicating instead");
                                    None
                                }
                            }
                        }
                        _ => None,
                    };

                    match pieces {
                        Some((front_piece, back_piece)) => {
                            let back_face = face.with_polygon(back_piece);
                            world.faces[id.index()].polygon = front_piece;
                            let back_id = FaceId::new(world.faces.len());
                            world.faces.push(back_face);
                            progress.extend(1);
                            stats.splits += 1;
                            front.push(id);
                            back.push(back_id);
                        }
                        None => {
                            duplicated.insert(id);
                            stats.duplicates += 1;
                            front.push(id);
                            back.push(id);
                        }
                    }
                }
            }
        }

        (front, back)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bsp::ScoredSelector;
    use crate::{Face, MaterialId, Polygon};
    use nalgebra::Point3;

    fn make_face(points: &[[f32; 3]]) -> Face {
        let polygon = Polygon::new(points.iter().map(|p| Point3::new(p[0], p[1], p[2])).collect());
        Face::new(polygon, MaterialId(0))
    }

    fn build(faces: Vec<Face>, policy: StraddlePolicy) -> (WorldGeometry, BuildStats) {
        let mut world = WorldGeometry::new(faces);
        let stats = TreeBuilder::new(&ScoredSelector::default(), policy).build(&mut world);
        (world, stats)
    }

    /// A wall at x = 0 facing +x and a floor at z = 0 reaching across it.
    fn crossing_pair() -> Vec<Face> {
        vec![
            make_face(&[[0.0, 0.0, -2.0], [0.0, 4.0, -2.0], [0.0, 4.0, 2.0], [0.0, 0.0, 2.0]]),
            make_face(&[[-2.0, 0.0, 0.0], [2.0, 0.0, 0.0], [2.0, 4.0, 0.0], [-2.0, 4.0, 0.0]]),
        ]
    }

    #[test]
    fn empty_world_is_one_leaf() {
        let (world, stats) = build(vec![], StraddlePolicy::Duplicate);
        assert_eq!(world.root, Some(Child::Leaf(LeafId(0))));
        assert_eq!(stats.leaves, 1);
        assert_eq!(stats.nodes, 0);
    }

    #[test]
    fn single_face_gives_two_leaves() {
        let (world, stats) = build(
            vec![make_face(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]])],
            StraddlePolicy::Duplicate,
        );
        assert_eq!(stats.nodes, 1);
        assert_eq!(stats.leaves, 2);
        let root = world.node(NodeId(0));
        // pre-order, front first
        assert_eq!(root.front(), Child::Leaf(LeafId(0)));
        assert_eq!(root.back(), Child::Leaf(LeafId(1)));
    }

    #[test]
    fn coplanar_faces_share_a_node() {
        let faces = vec![
            make_face(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]),
            make_face(&[[2.0, 0.0, 0.0], [3.0, 0.0, 0.0], [2.0, 1.0, 0.0]]),
        ];
        let (_, stats) = build(faces, StraddlePolicy::Duplicate);
        assert_eq!(stats.nodes, 1);
        assert_eq!(stats.depth, 2);
    }

    #[test]
    fn duplicate_policy_keeps_face_count() {
        let (world, stats) = build(crossing_pair(), StraddlePolicy::Duplicate);
        assert_eq!(world.faces.len(), 2);
        assert_eq!(stats.splits, 0);
        assert!(stats.duplicates <= 1);
    }

    #[test]
    fn split_policy_appends_back_piece() {
        // three parallel floors make a floor plane the better splitter, so
        // the wall is the one that straddles
        let mut faces = crossing_pair();
        faces.push(make_face(&[[-2.0, 0.0, 1.0], [2.0, 0.0, 1.0], [2.0, 4.0, 1.0], [-2.0, 4.0, 1.0]]));
        let total_area: f32 = faces.iter().map(|f| f.polygon.area()).sum();

        let (world, stats) = build(faces, StraddlePolicy::Split);
        assert!(stats.splits >= 1);
        assert_eq!(world.faces.len(), 3 + stats.splits);
        let area: f32 = world.faces.iter().map(|f| f.polygon.area()).sum();
        approx::assert_relative_eq!(area, total_area, epsilon = 1e-3);
        assert!(world.faces.iter().all(|f| f.polygon.is_valid()));
    }

    #[test]
    fn degenerate_split_duplicates_instead() {
        // the wall dips 0.015 below the floor: past ROUND_EPSILON, so it
        // straddles, but the back piece is shorter than MIN_VERTEX_DIST
        let wall = make_face(&[[0.0, 0.0, -0.015], [0.0, 4.0, -0.015], [0.0, 4.0, 4.0], [0.0, 0.0, 4.0]]);
        let floor = make_face(&[[-4.0, -4.0, 0.0], [4.0, -4.0, 0.0], [4.0, 4.0, 0.0], [-4.0, 4.0, 0.0]]);
        let original = wall.polygon.clone();

        let (world, stats) = build(vec![wall, floor], StraddlePolicy::Split);
        assert_eq!(stats.splits, 0);
        assert_eq!(stats.duplicates, 1);
        assert_eq!(world.faces.len(), 2);
        assert_eq!(world.faces[0].polygon, original);

        // the floor plane is the root and the wall reaches both of its sides
        let root = world.node(NodeId(0));
        assert!(root.plane().approx_eq(world.faces[1].polygon.plane()));
        for side in [Side::Front, Side::Back] {
            let Child::Node(child) = root.child(side) else {
                panic!("{side:?} side of the root is a leaf");
            };
            assert!(world.node(child).plane().approx_eq(original.plane()));
        }
    }

    #[test]
    fn every_point_finds_a_leaf() {
        let (world, _) = build(crossing_pair(), StraddlePolicy::Split);
        for point in [
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(-1.0, 1.0, 1.0),
            Point3::new(1.0, 1.0, -1.0),
            Point3::new(-1.0, 1.0, -1.0),
        ] {
            let leaf = world.locate_leaf(point).unwrap();
            assert!(leaf.index() < world.leaves.len());
        }
    }
}
