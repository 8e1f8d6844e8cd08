//! Chopping faces to fit atlas tiles, and atlas allocation.

use nalgebra::Vector3;

use crate::{
    AtlasAllocator, AtlasKind, CompileError, Cuttable, FootprintSpec, MaterialLibrary, Plane3D, Polygon, Result,
    WorldGeometry,
};

/// Extent of a polygon on its plane's span basis: `(axis, min, max)` per
/// axis.
fn extents(polygon: &Polygon) -> [(Vector3<f32>, f32, f32); 2] {
    let (u, v) = polygon.plane().span_basis();
    [u, v].map(|axis| {
        polygon
            .vertices()
            .iter()
            .map(|p| axis.dot(&p.coords))
            .fold((axis, f32::INFINITY, f32::NEG_INFINITY), |(axis, lo, hi), d| {
                (axis, lo.min(d), hi.max(d))
            })
    })
}

/// Texel size `[width, height]` of a polygon's tile, margins included.
pub fn footprint(polygon: &Polygon, spec: &FootprintSpec) -> [u32; 2] {
    extents(polygon).map(|(_, lo, hi)| spec.texels(hi - lo))
}

/// Splits faces whose texel footprint is larger than an atlas tile.
#[derive(Debug)]
pub struct FootprintChopper<'a, M: MaterialLibrary + ?Sized> {
    materials: &'a M,
    /// Faces needing more tiles than this are reported.
    max_tiles: u32,
}

impl<'a, M: MaterialLibrary + ?Sized> FootprintChopper<'a, M> {
    pub fn new(materials: &'a M, max_tiles: u32) -> Self {
        Self { materials, max_tiles }
    }

    /// Cuts every face needing a `kind` atlas entry at the middle of its
    /// oversized axis until all pieces fit. Returns the number of cuts.
    ///
    /// New pieces are appended; face ids stay valid.
    pub fn chop(&self, world: &mut WorldGeometry, kind: AtlasKind, spec: &FootprintSpec) -> usize {
        let mut worklist: Vec<usize> = (0..world.faces.len())
            .filter(|&i| self.materials.flags(world.faces[i].material).needs_atlas(kind))
            .collect();

        for &i in &worklist {
            let [w, h] = footprint(&world.faces[i].polygon, spec);
            let tiles = w.div_ceil(spec.max_tile_texels.max(1)) * h.div_ceil(spec.max_tile_texels.max(1));
            if tiles > self.max_tiles {
                log::warn!("chop: face {i} needs about {tiles} {kind} tiles ({w}x{h} texels)");
            }
        }

        let mut cuts = 0;
        while let Some(i) = worklist.pop() {
            let polygon = &world.faces[i].polygon;
            let Some(plane) = oversized_axis(polygon, spec) else {
                continue;
            };
            match polygon.cut(&plane) {
                (Some(front), Some(back)) => {
                    let back_face = world.faces[i].with_polygon(back);
                    world.faces[i].polygon = front;
                    world.faces.push(back_face);
                    worklist.push(i);
                    worklist.push(world.faces.len() - 1);
                    cuts += 1;
                }
                _ => log::warn!("chop: face {i} cannot be cut further, {kind} tile stays oversized"),
            }
        }

        log::info!("chop: {cuts} {kind} cuts, {} faces", world.faces.len());
        cuts
    }

    /// Reserves an atlas tile for every face needing one.
    pub fn allocate<A: AtlasAllocator + ?Sized>(
        &self,
        world: &mut WorldGeometry,
        kind: AtlasKind,
        spec: &FootprintSpec,
        atlas: &mut A,
    ) -> Result<usize> {
        let mut placed = 0;
        for face in &mut world.faces {
            if !self.materials.flags(face.material).needs_atlas(kind) {
                continue;
            }
            let [width, height] = footprint(&face.polygon, spec);
            let placement = atlas
                .allocate(kind, width, height)
                .ok_or(CompileError::AtlasFull { kind, width, height })?;
            face.set_placement(kind, placement);
            placed += 1;
        }
        log::debug!("chop: {placed} {kind} tiles allocated");
        Ok(placed)
    }
}

/// The midpoint plane across the first axis whose footprint exceeds the
/// tile size.
fn oversized_axis(polygon: &Polygon, spec: &FootprintSpec) -> Option<Plane3D> {
    extents(polygon)
        .into_iter()
        .find(|(_, lo, hi)| spec.texels(hi - lo) > spec.max_tile_texels)
        .map(|(axis, lo, hi)| Plane3D::new(axis, (lo + hi) * 0.5))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AtlasPlacement, Face, MaterialFlags, MaterialId, MaterialTable};
    use nalgebra::Point3;

    const SPEC: FootprintSpec = FootprintSpec {
        patch_size: 0.25,
        max_tile_texels: 12,
        margin_texels: 1,
    };

    fn rect(x0: f32, x1: f32, y1: f32) -> Face {
        let polygon = Polygon::new(vec![
            Point3::new(x0, 0.0, 0.0),
            Point3::new(x1, 0.0, 0.0),
            Point3::new(x1, y1, 0.0),
            Point3::new(x0, y1, 0.0),
        ]);
        Face::new(polygon, MaterialId(0))
    }

    /// Hands out tiles in a row until `capacity` runs out.
    struct RowAtlas {
        capacity: u32,
        next: u32,
    }

    impl AtlasAllocator for RowAtlas {
        fn allocate(&mut self, _kind: AtlasKind, width: u32, height: u32) -> Option<AtlasPlacement> {
            (self.next < self.capacity).then(|| {
                self.next += 1;
                AtlasPlacement {
                    tile: self.next - 1,
                    offset: [0, 0],
                    size: [width, height],
                }
            })
        }
    }

    #[test]
    fn footprint_counts_margins() {
        // 4 x 1 world units at 0.25 per texel
        assert_eq!(footprint(&rect(0.0, 4.0, 1.0).polygon, &SPEC), [18, 6]);
    }

    #[test]
    fn chopped_faces_fit_and_rechop_is_noop() {
        let materials = MaterialTable::new(MaterialFlags::SOLID);
        let chopper = FootprintChopper::new(&materials, 64);
        let mut world = WorldGeometry::new(vec![rect(0.0, 10.0, 3.0)]);

        let cuts = chopper.chop(&mut world, AtlasKind::Lightmap, &SPEC);
        assert!(cuts > 0);
        assert_eq!(world.faces.len(), cuts + 1);
        for face in &world.faces {
            let [w, h] = footprint(&face.polygon, &SPEC);
            assert!(w <= SPEC.max_tile_texels && h <= SPEC.max_tile_texels);
        }
        let area: f32 = world.faces.iter().map(|f| f.polygon.area()).sum();
        approx::assert_relative_eq!(area, 30.0, epsilon = 1e-3);

        let again = world.clone();
        assert_eq!(chopper.chop(&mut world, AtlasKind::Lightmap, &SPEC), 0);
        assert_eq!(world.faces, again.faces);
    }

    #[test]
    fn faces_without_atlas_are_skipped() {
        let materials = MaterialTable::new(MaterialFlags::SOLID);
        let chopper = FootprintChopper::new(&materials, 64);
        let mut world = WorldGeometry::new(vec![rect(0.0, 10.0, 3.0)]);
        // solid materials carry no spherical-harmonics data
        assert_eq!(chopper.chop(&mut world, AtlasKind::SphericalHarmonics, &SPEC), 0);
        assert_eq!(world.faces.len(), 1);
    }

    #[test]
    fn allocation_fills_placements() {
        let materials = MaterialTable::new(MaterialFlags::SOLID);
        let chopper = FootprintChopper::new(&materials, 64);
        let mut world = WorldGeometry::new(vec![rect(0.0, 2.0, 1.0), rect(3.0, 4.0, 1.0)]);
        let mut atlas = RowAtlas { capacity: 8, next: 0 };

        let placed = chopper.allocate(&mut world, AtlasKind::Lightmap, &SPEC, &mut atlas).unwrap();
        assert_eq!(placed, 2);
        let placement = world.faces[0].placement(AtlasKind::Lightmap).unwrap();
        assert_eq!(placement.size, [10, 6]);
        assert_eq!(world.faces[1].lightmap.map(|p| p.tile), Some(1));
    }

    #[test]
    fn full_atlas_is_an_error() {
        let materials = MaterialTable::new(MaterialFlags::SOLID);
        let chopper = FootprintChopper::new(&materials, 64);
        let mut world = WorldGeometry::new(vec![rect(0.0, 2.0, 1.0), rect(3.0, 4.0, 1.0)]);
        let mut atlas = RowAtlas { capacity: 1, next: 0 };

        let err = chopper
            .allocate(&mut world, AtlasKind::Lightmap, &SPEC, &mut atlas)
            .unwrap_err();
        assert!(matches!(err, CompileError::AtlasFull { kind: AtlasKind::Lightmap, .. }));
    }
}
