//! The geometry store every compiler stage reads and rewrites.

use nalgebra::Point3;

use crate::bsp::{BspLeaf, BspNode, Child};
use crate::{Aabb, Face, PlaneSide, SceneReference};

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl $name {
            #[inline]
            pub fn new(index: usize) -> Self {
                Self(index as u32)
            }

            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

handle!(
    /// Index of a face in [`WorldGeometry::faces`].
    ///
    /// Valid until the next stage that removes faces (pruning, merging).
    FaceId
);
handle!(
    /// Index of a node in [`WorldGeometry::nodes`].
    NodeId
);
handle!(
    /// Index of a leaf in [`WorldGeometry::leaves`].
    LeafId
);

/// One entity's static geometry, rewritten in place by the compiler.
///
/// The node and leaf arrays are rebuilt from scratch by every tree pass;
/// the face array persists and is split, merged and pruned along the way.
#[derive(Debug, Clone, Default)]
pub struct WorldGeometry {
    pub faces: Vec<Face>,
    pub nodes: Vec<BspNode>,
    pub leaves: Vec<BspLeaf>,
    /// Entry point of the tree, `None` before the first build.
    pub root: Option<Child>,
    pub scene_refs: Vec<SceneReference>,
    /// Shared, deduplicated vertex buffer referenced by `Face::draw_indices`.
    pub draw_vertices: Vec<Point3<f32>>,
    /// Leaf-to-leaf visibility bits, `leaves.len()²` bits packed into words.
    pub visibility: Vec<u32>,
    /// Flood-fill origins (player starts and the like).
    pub seeds: Vec<Point3<f32>>,
    /// Points known to lie outside the playable volume.
    pub outside_points: Vec<Point3<f32>>,
}

impl WorldGeometry {
    pub fn new(faces: Vec<Face>) -> Self {
        Self {
            faces,
            ..Self::default()
        }
    }

    #[inline]
    pub fn face(&self, id: FaceId) -> &Face {
        &self.faces[id.index()]
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &BspNode {
        &self.nodes[id.index()]
    }

    #[inline]
    pub fn leaf(&self, id: LeafId) -> &BspLeaf {
        &self.leaves[id.index()]
    }

    pub fn face_ids(&self) -> impl Iterator<Item = FaceId> + use<> {
        (0..self.faces.len()).map(FaceId::new)
    }

    pub fn leaf_ids(&self) -> impl Iterator<Item = LeafId> + use<> {
        (0..self.leaves.len()).map(LeafId::new)
    }

    /// Bounds of every face and scene reference.
    pub fn bounds(&self) -> Option<Aabb> {
        self.faces
            .iter()
            .map(Face::bounds)
            .chain(self.scene_refs.iter().map(|r| r.bounds))
            .reduce(|a, b| a.union(&b))
    }

    /// Drops the tree; required after any change that invalidates face ids.
    pub fn clear_tree(&mut self) {
        self.nodes.clear();
        self.leaves.clear();
        self.root = None;
        self.visibility.clear();
    }

    /// Walks the tree down to the leaf containing `point`. Points on a
    /// splitting plane go to the front side.
    pub fn locate_leaf(&self, point: Point3<f32>) -> Option<LeafId> {
        let mut child = self.root?;
        loop {
            match child {
                Child::Leaf(leaf) => return Some(leaf),
                Child::Node(node) => {
                    let node = self.node(node);
                    child = match node.plane().classify_point(point) {
                        PlaneSide::Front | PlaneSide::OnPlane => node.front(),
                        PlaneSide::Back => node.back(),
                    };
                }
            }
        }
    }

    /// Reads the visibility matrix; out-of-range leaves are not visible.
    pub fn is_visible(&self, from: LeafId, to: LeafId) -> bool {
        let count = self.leaves.len();
        if from.index() >= count || to.index() >= count {
            return false;
        }
        let bit = from.index() * count + to.index();
        self.visibility
            .get(bit / 32)
            .is_some_and(|word| word & (1 << (bit % 32)) != 0)
    }

    pub fn inner_leaf_count(&self) -> usize {
        self.leaves.iter().filter(|l| l.is_inner()).count()
    }

    pub fn portal_count(&self) -> usize {
        self.leaves.iter().map(|l| l.portals().len()).sum()
    }
}
