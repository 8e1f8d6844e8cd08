//! Inner/outer classification of leaves by flood fill.

use rustc_hash::FxHashSet;

use crate::portal::connection;
use crate::{LeafId, WorldGeometry};

/// Counters of one flood fill.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FloodStats {
    pub inner: usize,
    pub outer: usize,
    /// Transitions into leaves pinned outer by an outside point.
    pub refused: usize,
}

/// Marks every leaf reachable from a seed point as inner.
///
/// Reachability runs across portal connections (see
/// [`crate::portal::connection`]). Leaves containing one of the world's
/// outside points are never entered; hitting one means the partition has
/// rounding trouble, which is logged and otherwise ignored.
///
/// Without seed points there is nothing to tell inside from outside and
/// every leaf is inner.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReachabilityClassifier;

impl ReachabilityClassifier {
    pub fn classify(&self, world: &mut WorldGeometry) -> FloodStats {
        let mut stats = FloodStats::default();

        if world.seeds.is_empty() {
            for leaf in &mut world.leaves {
                leaf.mark_inner();
            }
            stats.inner = world.leaves.len();
            log::info!("flood: no seed points, all {} leaves inner", stats.inner);
            return stats;
        }

        let pinned: FxHashSet<LeafId> = world
            .outside_points
            .iter()
            .filter_map(|p| world.locate_leaf(*p))
            .collect();

        let mut worklist = Vec::new();
        for seed in &world.seeds {
            match world.locate_leaf(*seed) {
                Some(leaf) if pinned.contains(&leaf) => {
                    log::warn!("flood: seed {seed:?} lies in a leaf known to be outside, ignored");
                }
                Some(leaf) => worklist.push(leaf),
                None => {}
            }
        }

        let mut inner = vec![false; world.leaves.len()];
        while let Some(leaf) = worklist.pop() {
            if std::mem::replace(&mut inner[leaf.index()], true) {
                continue;
            }
            let this = world.leaf(leaf);
            for other in world.leaf_ids() {
                if other == leaf || inner[other.index()] {
                    continue;
                }
                if connection(this, world.leaf(other)).is_none() {
                    continue;
                }
                if pinned.contains(&other) {
                    log::warn!("flood: leaf {leaf} connects to outside leaf {other}, geometry rounding problem?");
                    stats.refused += 1;
                    continue;
                }
                worklist.push(other);
            }
        }

        for (leaf, reached) in world.leaves.iter_mut().zip(inner) {
            if reached {
                leaf.mark_inner();
            }
        }
        stats.inner = world.inner_leaf_count();
        stats.outer = world.leaves.len() - stats.inner;
        log::info!("flood: {} inner, {} outer leaves", stats.inner, stats.outer);
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bsp::{LeafAssigner, ScoredSelector, TreeBuilder};
    use crate::portal::Portalizer;
    use crate::{Face, MaterialFlags, MaterialId, MaterialTable, Polygon, StraddlePolicy};
    use nalgebra::Point3;

    const GLASS: MaterialId = MaterialId(1);

    fn materials() -> MaterialTable {
        let mut table = MaterialTable::new(MaterialFlags::SOLID);
        table.insert(
            GLASS,
            MaterialFlags {
                blocks_portals: false,
                lightmap: false,
                spherical_harmonics: false,
            },
        );
        table
    }

    fn wall(material: MaterialId) -> WorldGeometry {
        let polygon = Polygon::new(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 4.0, 0.0),
            Point3::new(0.0, 4.0, 4.0),
            Point3::new(0.0, 0.0, 4.0),
        ]);
        let mut world = WorldGeometry::new(vec![Face::new(polygon, material)]);
        TreeBuilder::new(&ScoredSelector::default(), StraddlePolicy::Duplicate).build(&mut world);
        LeafAssigner.assign(&mut world);
        Portalizer::new(&materials()).portalize(&mut world);
        world
    }

    #[test]
    fn no_seeds_marks_everything_inner() {
        let mut world = wall(MaterialId(0));
        let stats = ReachabilityClassifier.classify(&mut world);
        assert_eq!(stats.inner, world.leaves.len());
        assert!(world.leaves.iter().all(|l| l.is_inner()));
    }

    #[test]
    fn flood_crosses_see_through_wall() {
        let mut world = wall(GLASS);
        world.seeds.push(Point3::new(1.0, 2.0, 2.0));
        let stats = ReachabilityClassifier.classify(&mut world);
        assert_eq!(stats.inner, 2);
        assert_eq!(stats.outer, 0);
    }

    #[test]
    fn outside_point_pins_leaf() {
        let mut world = wall(GLASS);
        world.seeds.push(Point3::new(1.0, 2.0, 2.0));
        world.outside_points.push(Point3::new(-1.0, 2.0, 2.0));
        let stats = ReachabilityClassifier.classify(&mut world);
        assert_eq!(stats.inner, 1);
        assert_eq!(stats.refused, 1);

        let behind = world.locate_leaf(Point3::new(-1.0, 2.0, 2.0)).unwrap();
        assert!(!world.leaf(behind).is_inner());
    }
}
