//! Portal generation and leaf adjacency.

use crate::bsp::{walk_leaves, BspLeaf, FnVisitor};
use crate::progress::Progress;
use crate::{Cuttable, LeafId, MaterialLibrary, Plane3D, Polygon, Rectangle, WorldGeometry, ROUND_EPSILON};

/// Portals (and portal overlaps) smaller than this are rounding slivers.
pub const MIN_PORTAL_AREA: f32 = 0.01;

/// Builds the portal set of every leaf.
///
/// A leaf's candidate portals lie on the splitting planes of its root path:
/// each is a large square on the plane, clipped by the other path planes
/// and the leaf bounds. Faces in the leaf whose material blocks portals are
/// then cut out of the candidates.
///
/// Portals are not paired with the neighbour's; see [`connection`].
#[derive(Debug)]
pub struct Portalizer<'a, M: MaterialLibrary + ?Sized> {
    materials: &'a M,
}

impl<'a, M: MaterialLibrary + ?Sized> Portalizer<'a, M> {
    pub fn new(materials: &'a M) -> Self {
        Self { materials }
    }

    /// Replaces the portals of every leaf. Returns the total portal count.
    pub fn portalize(&self, world: &mut WorldGeometry) -> usize {
        let mut progress = Progress::new("portals", world.leaves.len());
        let mut found: Vec<(LeafId, Vec<Polygon>)> = Vec::with_capacity(world.leaves.len());

        let view: &WorldGeometry = world;
        let mut visitor = FnVisitor::new(|leaf: LeafId, path: &[Plane3D]| {
            found.push((leaf, self.leaf_portals(view, view.leaf(leaf), path)));
            progress.tick();
        });
        walk_leaves(view, &mut visitor);

        let mut total = 0;
        for (leaf, portals) in found {
            total += portals.len();
            world.leaves[leaf.index()].set_portals(portals);
        }
        log::info!("portals: {total} over {} leaves", world.leaves.len());
        total
    }

    fn leaf_portals(&self, world: &WorldGeometry, leaf: &BspLeaf, path: &[Plane3D]) -> Vec<Polygon> {
        let Some(bounds) = leaf.bounds() else {
            return Vec::new();
        };
        let half_extent = bounds.size().norm();
        let box_planes = bounds.inward_planes();

        let blockers: Vec<&Polygon> = leaf
            .faces()
            .iter()
            .map(|id| world.face(*id))
            .filter(|face| self.materials.flags(face.material).blocks_portals)
            .map(|face| &face.polygon)
            .collect();

        let mut portals = Vec::new();
        for (k, plane) in path.iter().enumerate() {
            let Some(mut base) = Rectangle::on_plane(plane, bounds.center(), half_extent).to_polygon() else {
                continue;
            };

            let clipped = path
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != k)
                .map(|(_, other)| other)
                .chain(box_planes.iter())
                .try_for_each(|clip| {
                    base = base.clip_front(clip)?;
                    Some(())
                });
            if clipped.is_none() || base.area() < MIN_PORTAL_AREA {
                continue;
            }

            let mut pieces = vec![base];
            for blocker in blockers.iter().filter(|b| b.plane().is_coincident(plane)) {
                pieces = pieces.iter().flat_map(|piece| piece.subtract(blocker)).collect();
            }
            portals.extend(pieces.into_iter().filter(|p| p.area() >= MIN_PORTAL_AREA));
        }
        portals
    }
}

/// The shared part of two leaves' portals, if they touch through one.
pub fn connection(a: &BspLeaf, b: &BspLeaf) -> Option<Polygon> {
    let (Some(box_a), Some(box_b)) = (a.bounds(), b.bounds()) else {
        return None;
    };
    if !box_a.overlaps(box_b, ROUND_EPSILON) {
        return None;
    }
    a.portals().iter().find_map(|pa| {
        b.portals()
            .iter()
            .filter_map(|pb| pa.overlap(pb))
            .find(|shared| shared.area() >= MIN_PORTAL_AREA)
    })
}

/// Every leaf connected to `leaf`, with the shared portal part.
pub fn neighbours(world: &WorldGeometry, leaf: LeafId) -> Vec<(LeafId, Polygon)> {
    let this = world.leaf(leaf);
    world
        .leaf_ids()
        .filter(|other| *other != leaf)
        .filter_map(|other| connection(this, world.leaf(other)).map(|shared| (other, shared)))
        .collect()
}
