//! The full compile: tree passes, face processing and the draw mesh.

use crate::bsp::{LeafAssigner, PlaneSelector, ScoredSelector, TreeBuilder};
use crate::chop::FootprintChopper;
use crate::flood::{FloodStats, ReachabilityClassifier};
use crate::interpenetrate::InterpenetrationResolver;
use crate::leak::LeakDiagnoser;
use crate::merge::CoplanarMerger;
use crate::mesh::DrawMeshBuilder;
use crate::portal::Portalizer;
use crate::prune::GeometryPruner;
use crate::{AtlasAllocator, AtlasKind, CompileOptions, MaterialLibrary, Result, WorldGeometry};

/// Summary of a finished compile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileStats {
    pub nodes: usize,
    pub leaves: usize,
    pub inner_leaves: usize,
    pub outer_leaves: usize,
    pub portals: usize,
    pub faces: usize,
    pub pruned_faces: usize,
    pub interpenetration_splits: usize,
    pub merges: usize,
    pub lightmap_chops: usize,
    pub spherical_harmonics_chops: usize,
    pub draw_vertices: usize,
    pub visibility_words: usize,
}

/// Compiles one entity's faces into a runtime tree and draw mesh.
///
/// ```ignore
/// let compiler = Compiler::new(&options, &materials);
/// let stats = compiler.compile(&mut world, &mut atlas)?;
/// ```
#[derive(Debug)]
pub struct Compiler<'a, M: MaterialLibrary + ?Sized, S: PlaneSelector = ScoredSelector> {
    options: &'a CompileOptions,
    materials: &'a M,
    selector: S,
}

impl<'a, M: MaterialLibrary + ?Sized> Compiler<'a, M> {
    pub fn new(options: &'a CompileOptions, materials: &'a M) -> Self {
        Self {
            options,
            materials,
            selector: ScoredSelector::default(),
        }
    }
}

impl<'a, M: MaterialLibrary + ?Sized, S: PlaneSelector> Compiler<'a, M, S> {
    /// Replaces the splitting plane strategy.
    pub fn with_selector<T: PlaneSelector>(self, selector: T) -> Compiler<'a, M, T> {
        Compiler {
            options: self.options,
            materials: self.materials,
            selector,
        }
    }

    /// Runs every stage over `world`.
    ///
    /// On a leak the compile stops with [`crate::CompileError::Leak`] and
    /// `world` is left as the leak check saw it, tree included, so the
    /// leaking leaf can be inspected.
    pub fn compile<A: AtlasAllocator + ?Sized>(
        &self,
        world: &mut WorldGeometry,
        atlas: &mut A,
    ) -> Result<CompileStats> {
        let options = self.options;
        let mut stats = CompileStats::default();
        let input_faces = world.faces.len();
        log::info!(
            "compile: {input_faces} faces, {} scene references, {} seeds",
            world.scene_refs.len(),
            world.seeds.len()
        );

        if options.require_watertight {
            LeakDiagnoser.inject_sentinels(world);
        }

        if world.seeds.is_empty() {
            if options.require_watertight {
                log::warn!("compile: no seed points, leak check skipped");
            }
            LeakDiagnoser.remove_sentinels(world);
        } else {
            self.tree_pass(world);
            if options.require_watertight {
                LeakDiagnoser.check(world, options)?;
            }
            // sentinels of a sealed map are all outer and go with the rest
            GeometryPruner.prune_faces(world);
            stats.pruned_faces = input_faces.saturating_sub(world.faces.len());
        }

        // merging first: the resolver's halves are coplanar neighbours and
        // would be joined again
        if options.merge_coplanar {
            stats.merges = CoplanarMerger.merge(world);
        }
        if options.resolve_interpenetration {
            stats.interpenetration_splits = InterpenetrationResolver.resolve(world);
        }

        let chopper = FootprintChopper::new(self.materials, options.max_tiles_per_face);
        stats.lightmap_chops = chopper.chop(world, AtlasKind::Lightmap, &options.lightmap);
        stats.spherical_harmonics_chops =
            chopper.chop(world, AtlasKind::SphericalHarmonics, &options.spherical_harmonics);
        for kind in AtlasKind::ALL {
            chopper.allocate(world, kind, options.footprint(kind), &mut *atlas)?;
        }

        let flood = self.tree_pass(world);
        stats.portals = world.portal_count() - GeometryPruner.prune_portals(world);

        stats.draw_vertices = DrawMeshBuilder.build(world).vertices;
        stats.visibility_words = emit_all_visible(world);

        stats.nodes = world.nodes.len();
        stats.leaves = world.leaves.len();
        stats.inner_leaves = flood.inner;
        stats.outer_leaves = flood.outer;
        stats.faces = world.faces.len();
        log::info!("compile: done, {stats:?}");
        Ok(stats)
    }

    /// Build, assign, portalize and flood.
    fn tree_pass(&self, world: &mut WorldGeometry) -> FloodStats {
        TreeBuilder::new(&self.selector, self.options.straddle_policy).build(world);
        LeafAssigner.assign(world);
        Portalizer::new(self.materials).portalize(world);
        ReachabilityClassifier.classify(world)
    }
}

/// Fills the visibility matrix with "everything sees everything". Returns
/// the number of words, `(leaves² + 31) / 32`.
pub fn emit_all_visible(world: &mut WorldGeometry) -> usize {
    let bits = world.leaves.len() * world.leaves.len();
    let words = bits.div_ceil(32);
    world.visibility = vec![u32::MAX; words];
    if bits % 32 != 0 {
        if let Some(last) = world.visibility.last_mut() {
            *last = (1 << (bits % 32)) - 1;
        }
    }
    words
}
