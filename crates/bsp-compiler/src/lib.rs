//! Batch map compiler: turns the planar faces of a game-world entity into a
//! BSP tree with portals, checks it for leaks, strips what cannot be seen,
//! merges and chops faces for the lightmap atlases and builds a shared
//! draw mesh.
//!
//! The entry point is [`Compiler::compile`]; the stages are also usable on
//! their own.

pub mod bsp;
pub mod chop;
pub mod flood;
pub mod interpenetrate;
pub mod leak;
pub mod merge;
pub mod mesh;
pub mod pipeline;
pub mod portal;
pub mod prune;

mod bounds;
mod cuttable;
mod error;
mod face;
mod options;
mod plane;
mod polygon;
mod progress;
mod rectangle;
mod world;

pub use bounds::Aabb;
pub use cuttable::Cuttable;
pub use error::{CompileError, Result};
pub use face::{
    AtlasAllocator, AtlasKind, AtlasPlacement, Face, MaterialFlags, MaterialId, MaterialLibrary, MaterialTable,
    SceneReference, TextureProjection,
};
pub use options::{CompileOptions, FootprintSpec, StraddlePolicy};
pub use pipeline::{CompileStats, Compiler};
pub use plane::{Classification, Plane3D, PlaneSide, MIN_VERTEX_DIST, ROUND_EPSILON};
pub use polygon::{points_coincide, Polygon};
pub use rectangle::Rectangle;
pub use world::{FaceId, LeafId, NodeId, WorldGeometry};
