//! BSP tree nodes and leaves.

use crate::{Aabb, FaceId, LeafId, NodeId, Plane3D, Polygon};

/// A child link of a node: either another node or a leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Child {
    Node(NodeId),
    Leaf(LeafId),
}

/// Which half-space of a node's plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Front,
    Back,
}

/// An internal node of the BSP tree.
///
/// Partitions space with a splitting plane. Children are fixed once the
/// builder has linked them; a changed tree is rebuilt from scratch.
#[derive(Debug, Clone)]
pub struct BspNode {
    /// The splitting plane for this node.
    plane: Plane3D,

    /// Subtree in FRONT of the splitting plane.
    front: Child,

    /// Subtree BEHIND the splitting plane.
    back: Child,
}

impl BspNode {
    pub fn new(plane: Plane3D, front: Child, back: Child) -> Self {
        Self { plane, front, back }
    }

    /// Returns a reference to the splitting plane.
    #[inline]
    pub fn plane(&self) -> &Plane3D {
        &self.plane
    }

    #[inline]
    pub fn front(&self) -> Child {
        self.front
    }

    #[inline]
    pub fn back(&self) -> Child {
        self.back
    }

    #[inline]
    pub fn child(&self, side: Side) -> Child {
        match side {
            Side::Front => self.front,
            Side::Back => self.back,
        }
    }

    /// The plane oriented so that `side` is in front of it.
    pub fn plane_facing(&self, side: Side) -> Plane3D {
        match side {
            Side::Front => self.plane.clone(),
            Side::Back => self.plane.flipped(),
        }
    }

    /// Links a child; only the tree builder calls this, while the node is
    /// still under construction.
    pub(super) fn link(&mut self, side: Side, child: Child) {
        match side {
            Side::Front => self.front = child,
            Side::Back => self.back = child,
        }
    }
}

/// A convex region at the bottom of the tree.
#[derive(Debug, Clone, Default)]
pub struct BspLeaf {
    bounds: Option<Aabb>,
    faces: Vec<FaceId>,
    portals: Vec<Polygon>,
    scene_refs: Vec<usize>,
    inner: bool,
}

impl BspLeaf {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bounds of the leaf region, `None` until leaves are assigned.
    #[inline]
    pub fn bounds(&self) -> Option<&Aabb> {
        self.bounds.as_ref()
    }

    /// Faces touching the leaf.
    #[inline]
    pub fn faces(&self) -> &[FaceId] {
        &self.faces
    }

    /// Boundary polygons through which neighbouring leaves can be reached.
    #[inline]
    pub fn portals(&self) -> &[Polygon] {
        &self.portals
    }

    /// Indices into [`crate::WorldGeometry::scene_refs`].
    #[inline]
    pub fn scene_refs(&self) -> &[usize] {
        &self.scene_refs
    }

    /// Whether the flood fill reached this leaf from a seed.
    #[inline]
    pub fn is_inner(&self) -> bool {
        self.inner
    }

    /// Marks the leaf inner. There is no way back to outer.
    #[inline]
    pub fn mark_inner(&mut self) {
        self.inner = true;
    }

    pub fn assign(&mut self, bounds: Aabb, faces: Vec<FaceId>, scene_refs: Vec<usize>) {
        self.bounds = Some(bounds);
        self.faces = faces;
        self.scene_refs = scene_refs;
    }

    pub fn set_portals(&mut self, portals: Vec<Polygon>) {
        self.portals = portals;
    }

    pub fn clear_portals(&mut self) {
        self.portals.clear();
    }
}
