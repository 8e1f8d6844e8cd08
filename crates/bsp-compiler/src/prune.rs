//! Removal of geometry that cannot be seen from inside the world.

use crate::{FaceId, WorldGeometry};

/// Drops faces and portals the flood fill did not reach.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeometryPruner;

impl GeometryPruner {
    /// Deletes every face not referenced by an inner leaf and returns how
    /// many were removed.
    ///
    /// Surviving faces keep their relative order but get new ids, so the
    /// tree is discarded; build it again before any leaf query.
    pub fn prune_faces(&self, world: &mut WorldGeometry) -> usize {
        let mut keep = vec![false; world.faces.len()];
        for leaf in world.leaves.iter().filter(|l| l.is_inner()) {
            for id in leaf.faces() {
                keep[id.index()] = true;
            }
        }

        let before = world.faces.len();
        let mut flags = keep.into_iter();
        world.faces.retain(|_| flags.next().unwrap_or(false));
        world.clear_tree();

        let removed = before - world.faces.len();
        log::info!("prune: removed {removed} of {before} faces");
        removed
    }

    /// Clears the portals of outer leaves; returns the number of portals
    /// removed. Outer leaves should be empty of faces by now, anything left
    /// is reported.
    pub fn prune_portals(&self, world: &mut WorldGeometry) -> usize {
        let mut removed = 0;
        for (i, leaf) in world.leaves.iter_mut().enumerate() {
            if leaf.is_inner() {
                continue;
            }
            if !leaf.faces().is_empty() {
                log::warn!(
                    "prune: outer leaf {} still references {} faces",
                    i,
                    leaf.faces().len()
                );
            }
            removed += leaf.portals().len();
            leaf.clear_portals();
        }
        log::debug!("prune: removed {removed} outer portals");
        removed
    }

    /// Every face referenced by an inner leaf, sorted.
    pub fn visible_faces(&self, world: &WorldGeometry) -> Vec<FaceId> {
        let mut faces: Vec<FaceId> = world
            .leaves
            .iter()
            .filter(|l| l.is_inner())
            .flat_map(|l| l.faces().iter().copied())
            .collect();
        faces.sort_unstable();
        faces.dedup();
        faces
    }
}
