//! Visitor pattern for root-to-leaf tree traversal.
//!
//! Visitors receive every leaf together with the splitting planes on the
//! way down to it, without coupling the walk to a specific use.

use crate::{LeafId, Plane3D, WorldGeometry};

use super::node::{Child, Side};

/// Visitor for processing leaves during a tree walk.
///
/// Common uses include:
/// - Building portals from the bounding planes of a leaf
/// - Counting or collecting leaves in tree order
pub trait LeafVisitor {
    /// Called once per leaf. `path` holds the splitting planes from the root
    /// down, each oriented so the leaf is on its front side.
    fn visit_leaf(&mut self, leaf: LeafId, path: &[Plane3D]);
}

/// A simple visitor that collects every leaf with its path.
#[derive(Debug, Default)]
pub struct CollectingVisitor {
    collected: Vec<(LeafId, Vec<Plane3D>)>,
}

impl CollectingVisitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_paths(self) -> Vec<(LeafId, Vec<Plane3D>)> {
        self.collected
    }
}

impl LeafVisitor for CollectingVisitor {
    fn visit_leaf(&mut self, leaf: LeafId, path: &[Plane3D]) {
        self.collected.push((leaf, path.to_vec()));
    }
}

/// A visitor that calls a closure for each leaf.
pub struct FnVisitor<F>
where
    F: FnMut(LeafId, &[Plane3D]),
{
    func: F,
}

impl<F> FnVisitor<F>
where
    F: FnMut(LeafId, &[Plane3D]),
{
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> LeafVisitor for FnVisitor<F>
where
    F: FnMut(LeafId, &[Plane3D]),
{
    fn visit_leaf(&mut self, leaf: LeafId, path: &[Plane3D]) {
        (self.func)(leaf, path);
    }
}

/// Visits every leaf in pre-order, front subtree first.
pub fn walk_leaves<V: LeafVisitor>(world: &WorldGeometry, visitor: &mut V) {
    let Some(root) = world.root else {
        return;
    };

    let mut path: Vec<Plane3D> = Vec::new();
    let mut stack = vec![(root, 0, None)];
    while let Some((child, depth, plane)) = stack.pop() {
        path.truncate(depth);
        path.extend(plane);
        match child {
            Child::Leaf(leaf) => visitor.visit_leaf(leaf, &path),
            Child::Node(id) => {
                let node = world.node(id);
                let depth = path.len();
                stack.push((node.back(), depth, Some(node.plane_facing(Side::Back))));
                stack.push((node.front(), depth, Some(node.plane_facing(Side::Front))));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bsp::{ScoredSelector, TreeBuilder};
    use crate::{Face, MaterialId, Polygon, StraddlePolicy};
    use nalgebra::Point3;

    fn make_square_at_z(z: f32) -> Face {
        let polygon = Polygon::new(vec![
            Point3::new(0.0, 0.0, z),
            Point3::new(1.0, 0.0, z),
            Point3::new(1.0, 1.0, z),
            Point3::new(0.0, 1.0, z),
        ]);
        Face::new(polygon, MaterialId(0))
    }

    fn stacked_world() -> WorldGeometry {
        let mut world = WorldGeometry::new(vec![make_square_at_z(0.0), make_square_at_z(1.0)]);
        TreeBuilder::new(&ScoredSelector::default(), StraddlePolicy::Duplicate).build(&mut world);
        world
    }

    #[test]
    fn empty_tree_visits_nothing() {
        let mut visitor = CollectingVisitor::new();
        walk_leaves(&WorldGeometry::default(), &mut visitor);
        assert!(visitor.into_paths().is_empty());
    }

    #[test]
    fn visits_leaves_in_creation_order() {
        let world = stacked_world();
        let mut visitor = CollectingVisitor::new();
        walk_leaves(&world, &mut visitor);

        let paths = visitor.into_paths();
        assert_eq!(paths.len(), world.leaves.len());
        for (i, (leaf, _)) in paths.iter().enumerate() {
            assert_eq!(leaf.index(), i);
        }
    }

    #[test]
    fn leaf_is_in_front_of_its_path() {
        let world = stacked_world();
        let probes = [
            Point3::new(0.5, 0.5, 2.0),
            Point3::new(0.5, 0.5, 0.5),
            Point3::new(0.5, 0.5, -1.0),
        ];
        let mut checked = 0;
        let mut visitor = FnVisitor::new(|leaf: LeafId, path: &[Plane3D]| {
            for probe in probes {
                if world.locate_leaf(probe) == Some(leaf) {
                    assert!(path.iter().all(|plane| plane.signed_distance(probe) > 0.0));
                    checked += 1;
                }
            }
        });
        walk_leaves(&world, &mut visitor);
        assert_eq!(checked, probes.len());
    }
}
