//! Leak detection: boundary sentinels, shortest leak path and trace file.

use std::collections::VecDeque;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use nalgebra::Point3;
use rustc_hash::FxHashMap;

use crate::portal::neighbours;
use crate::{
    CompileError, CompileOptions, Cuttable, Face, LeafId, MaterialId, Rectangle, Result, WorldGeometry,
    MIN_VERTEX_DIST,
};

/// Distance between the geometry and the sentinel box around it.
pub const SENTINEL_MARGIN: f32 = 10.0 * MIN_VERTEX_DIST;

/// Spacing of the samples written to a leak trace.
pub const LEAK_SAMPLE_SPACING: f32 = 2.0;

/// Extension of the leak trace file, next to the map source.
pub const LEAK_TRACE_EXTENSION: &str = "lin";

/// Finds leaks: inner leaves that can see the sentinel box placed around
/// the world.
#[derive(Debug, Clone, Copy, Default)]
pub struct LeakDiagnoser;

impl LeakDiagnoser {
    /// Adds six inward-facing sentinel faces enclosing all geometry.
    /// Returns the number of faces added.
    pub fn inject_sentinels(&self, world: &mut WorldGeometry) -> usize {
        let Some(bounds) = world.bounds() else {
            return 0;
        };
        let before = world.faces.len();
        let sentinels = Rectangle::box_interior(&bounds.expanded(SENTINEL_MARGIN));
        world.faces.extend(
            sentinels
                .iter()
                .filter_map(Rectangle::to_polygon)
                .map(|polygon| Face::new(polygon, MaterialId::SENTINEL)),
        );
        world.faces.len() - before
    }

    /// Removes sentinel faces. Face ids and the tree are invalidated.
    pub fn remove_sentinels(&self, world: &mut WorldGeometry) -> usize {
        let before = world.faces.len();
        world.faces.retain(|face| !face.material.is_sentinel());
        world.clear_tree();
        before - world.faces.len()
    }

    /// The first inner leaf touching a sentinel face.
    pub fn find_leak(&self, world: &WorldGeometry) -> Option<LeafId> {
        world.leaf_ids().find(|id| {
            let leaf = world.leaf(*id);
            leaf.is_inner() && leaf.faces().iter().any(|f| world.face(*f).material.is_sentinel())
        })
    }

    /// Fails with [`CompileError::Leak`] if the flood fill reached a
    /// sentinel. The trace is written next to `options.source_path` when
    /// one is set.
    pub fn check(&self, world: &WorldGeometry, options: &CompileOptions) -> Result<()> {
        let Some(leaf) = self.find_leak(world) else {
            log::debug!("leak check: geometry is sealed");
            return Ok(());
        };

        let (seed, path) = self.leak_path(world, leaf);
        let trace = densify(&path, LEAK_SAMPLE_SPACING);

        let trace_file = options.source_path.as_deref().and_then(|source| {
            let path = source.with_extension(LEAK_TRACE_EXTENSION);
            match write_leak_trace(&path, &trace) {
                Ok(()) => Some(path),
                Err(err) => {
                    log::error!("{err}");
                    None
                }
            }
        });

        let err = CompileError::Leak {
            leaf,
            seed,
            trace,
            trace_file,
        };
        log::error!("{err}");
        Err(err)
    }

    /// Shortest portal path from a seed to `target`: the seed point, the
    /// portal crossings on the way, and a point on the sentinel face in
    /// `target`.
    fn leak_path(&self, world: &WorldGeometry, target: LeafId) -> (Point3<f32>, Vec<Point3<f32>>) {
        for seed in &world.seeds {
            let Some(start) = world.locate_leaf(*seed) else {
                continue;
            };
            let Some(entries) = shortest_path(world, start, target) else {
                continue;
            };

            let last_entry = entries.last().copied().unwrap_or(*seed);
            let mut path = Vec::with_capacity(entries.len() + 2);
            path.push(*seed);
            path.extend(entries);
            path.push(self.sentinel_point(world, target).unwrap_or(last_entry));
            return (*seed, path);
        }

        // only reachable if the flood and this search disagree
        let seed = world.seeds.first().copied().unwrap_or_else(Point3::origin);
        let end = world
            .leaf(target)
            .bounds()
            .map(|b| b.center())
            .unwrap_or(seed);
        log::warn!("leak check: no portal path from a seed to leaf {target}");
        (seed, vec![seed, end])
    }

    /// Centre of the part of a sentinel face inside the leaf bounds.
    fn sentinel_point(&self, world: &WorldGeometry, leaf: LeafId) -> Option<Point3<f32>> {
        let leaf = world.leaf(leaf);
        let planes = leaf.bounds()?.inward_planes();
        leaf.faces()
            .iter()
            .map(|id| world.face(*id))
            .filter(|face| face.material.is_sentinel())
            .find_map(|face| {
                planes
                    .iter()
                    .try_fold(face.polygon.clone(), |polygon, plane| polygon.clip_front(plane))
            })
            .map(|polygon| polygon.centroid())
    }
}

/// Breadth-first search over inner leaves. Returns the portal crossing
/// points from `start` to `target`, in walking order.
fn shortest_path(world: &WorldGeometry, start: LeafId, target: LeafId) -> Option<Vec<Point3<f32>>> {
    let mut came_from: FxHashMap<LeafId, (LeafId, Point3<f32>)> = FxHashMap::default();
    let mut queue = VecDeque::from([start]);
    let mut found = start == target;

    while let Some(leaf) = queue.pop_front() {
        if found {
            break;
        }
        for (next, shared) in neighbours(world, leaf) {
            if next == start || came_from.contains_key(&next) || !world.leaf(next).is_inner() {
                continue;
            }
            came_from.insert(next, (leaf, shared.centroid()));
            if next == target {
                found = true;
                break;
            }
            queue.push_back(next);
        }
    }
    if !found {
        return None;
    }

    let mut entries = Vec::new();
    let mut current = target;
    while let Some((previous, entry)) = came_from.get(&current) {
        entries.push(*entry);
        current = *previous;
    }
    entries.reverse();
    Some(entries)
}

/// Resamples a polyline with roughly `spacing` units between samples.
/// The first and last points are kept exactly.
pub fn densify(path: &[Point3<f32>], spacing: f32) -> Vec<Point3<f32>> {
    let mut samples = Vec::new();
    for pair in path.windows(2) {
        let (from, to) = (pair[0], pair[1]);
        let steps = ((to - from).norm() / spacing).ceil().max(1.0) as usize;
        samples.extend((0..steps).map(|i| from + (to - from) * (i as f32 / steps as f32)));
    }
    samples.extend(path.last());
    samples
}

/// Writes one `x y z` line per trace point.
pub fn write_leak_trace(path: &Path, trace: &[Point3<f32>]) -> Result<()> {
    let mut text = String::with_capacity(trace.len() * 24);
    for p in trace {
        // writing to a String cannot fail
        let _ = writeln!(text, "{} {} {}", p.x, p.y, p.z);
    }
    std::fs::write(path, text).map_err(|source| CompileError::TraceIo {
        path: PathBuf::from(path),
        source,
    })
}
