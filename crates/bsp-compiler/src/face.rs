//! Faces, materials, atlas placements and other scene objects.

use nalgebra::Vector4;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::{Aabb, Polygon};

/// Reference into the external material system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(pub u32);

impl MaterialId {
    /// Material of the boundary sentinel faces injected around the world to
    /// detect leaks. Never used by real map geometry.
    pub const SENTINEL: MaterialId = MaterialId(u32::MAX);

    #[inline]
    pub fn is_sentinel(self) -> bool {
        self == Self::SENTINEL
    }
}

/// Per-material flags the compiler consults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialFlags {
    /// Faces with this material close off portals (solid walls).
    pub blocks_portals: bool,
    /// Faces need a lightmap atlas entry.
    pub lightmap: bool,
    /// Faces need a spherical-harmonics atlas entry.
    pub spherical_harmonics: bool,
}

impl MaterialFlags {
    pub const SOLID: MaterialFlags = MaterialFlags {
        blocks_portals: true,
        lightmap: true,
        spherical_harmonics: false,
    };

    pub const SENTINEL: MaterialFlags = MaterialFlags {
        blocks_portals: true,
        lightmap: false,
        spherical_harmonics: false,
    };

    /// Returns whether a face of this material needs an entry in `kind`'s atlas.
    pub fn needs_atlas(&self, kind: AtlasKind) -> bool {
        match kind {
            AtlasKind::Lightmap => self.lightmap,
            AtlasKind::SphericalHarmonics => self.spherical_harmonics,
        }
    }
}

impl Default for MaterialFlags {
    fn default() -> Self {
        Self::SOLID
    }
}

/// The external material system, as far as the compiler needs it.
pub trait MaterialLibrary {
    fn flags(&self, material: MaterialId) -> MaterialFlags;
}

/// Table-backed material library with a fallback for unknown materials.
#[derive(Debug, Clone, Default)]
pub struct MaterialTable {
    entries: FxHashMap<MaterialId, MaterialFlags>,
    fallback: MaterialFlags,
}

impl MaterialTable {
    pub fn new(fallback: MaterialFlags) -> Self {
        Self {
            entries: FxHashMap::default(),
            fallback,
        }
    }

    pub fn insert(&mut self, material: MaterialId, flags: MaterialFlags) -> &mut Self {
        self.entries.insert(material, flags);
        self
    }
}

impl MaterialLibrary for MaterialTable {
    fn flags(&self, material: MaterialId) -> MaterialFlags {
        if material.is_sentinel() {
            return MaterialFlags::SENTINEL;
        }
        self.entries.get(&material).copied().unwrap_or(self.fallback)
    }
}

/// Texture projection: `s = u.xyz · p + u.w`, `t = v.xyz · p + v.w`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureProjection {
    pub u: Vector4<f32>,
    pub v: Vector4<f32>,
}

impl Default for TextureProjection {
    fn default() -> Self {
        Self {
            u: Vector4::new(1.0, 0.0, 0.0, 0.0),
            v: Vector4::new(0.0, 1.0, 0.0, 0.0),
        }
    }
}

/// The two atlases a face can be packed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AtlasKind {
    Lightmap,
    SphericalHarmonics,
}

impl AtlasKind {
    pub const ALL: [AtlasKind; 2] = [AtlasKind::Lightmap, AtlasKind::SphericalHarmonics];

    pub fn as_str(&self) -> &'static str {
        match self {
            AtlasKind::Lightmap => "lightmap",
            AtlasKind::SphericalHarmonics => "spherical-harmonics",
        }
    }
}

impl std::fmt::Display for AtlasKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a face's texels live inside an atlas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtlasPlacement {
    pub tile: u32,
    pub offset: [u32; 2],
    pub size: [u32; 2],
}

/// The external atlas packer.
pub trait AtlasAllocator {
    /// Reserves a `width` x `height` texel block, `None` if the atlas is full.
    fn allocate(&mut self, kind: AtlasKind, width: u32, height: u32) -> Option<AtlasPlacement>;
}

/// A renderable planar face.
#[derive(Debug, Clone, PartialEq)]
pub struct Face {
    pub polygon: Polygon,
    pub material: MaterialId,
    pub projection: TextureProjection,
    pub lightmap: Option<AtlasPlacement>,
    pub spherical_harmonics: Option<AtlasPlacement>,
    /// Indices into [`crate::WorldGeometry::draw_vertices`].
    pub draw_indices: Vec<u32>,
}

impl Face {
    pub fn new(polygon: Polygon, material: MaterialId) -> Self {
        Self {
            polygon,
            material,
            projection: TextureProjection::default(),
            lightmap: None,
            spherical_harmonics: None,
            draw_indices: Vec::new(),
        }
    }

    pub fn with_projection(mut self, projection: TextureProjection) -> Self {
        self.projection = projection;
        self
    }

    /// A face on `polygon` carrying every other attribute of `self`.
    pub fn with_polygon(&self, polygon: Polygon) -> Face {
        Face {
            polygon,
            material: self.material,
            projection: self.projection,
            lightmap: self.lightmap,
            spherical_harmonics: self.spherical_harmonics,
            draw_indices: Vec::new(),
        }
    }

    #[inline]
    pub fn bounds(&self) -> Aabb {
        self.polygon.bounds()
    }

    pub fn placement(&self, kind: AtlasKind) -> Option<&AtlasPlacement> {
        match kind {
            AtlasKind::Lightmap => self.lightmap.as_ref(),
            AtlasKind::SphericalHarmonics => self.spherical_harmonics.as_ref(),
        }
    }

    pub fn set_placement(&mut self, kind: AtlasKind, placement: AtlasPlacement) {
        match kind {
            AtlasKind::Lightmap => self.lightmap = Some(placement),
            AtlasKind::SphericalHarmonics => self.spherical_harmonics = Some(placement),
        }
    }

    /// Returns `true` if both faces can be rendered as one surface:
    /// same oriented plane, material and texture projection.
    pub fn same_surface(&self, other: &Face) -> bool {
        self.material == other.material
            && self.projection == other.projection
            && self.polygon.plane().approx_eq(other.polygon.plane())
    }
}

/// A non-face scene object (patch, terrain, model, ...) known only by its
/// bounds. The compiler attaches it to leaves but never inspects it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneReference {
    pub bounds: Aabb,
    /// Opaque handle owned by the caller.
    pub tag: u64,
}
