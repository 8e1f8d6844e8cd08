//! Binary Space Partitioning tree over the faces of a [`WorldGeometry`].
//!
//! The tree lives in flat node and leaf arrays inside the world and is
//! rebuilt from scratch whenever faces change. Building it takes two walks:
//!
//! - [`TreeBuilder`] picks splitting planes and creates nodes and leaves
//! - [`LeafAssigner`] repeats the descent with exact splits and attaches
//!   faces, bounds and scene references to the leaves
//!
//! # Example
//!
//! ```ignore
//! use bsp_compiler::bsp::{LeafAssigner, ScoredSelector, TreeBuilder};
//! use bsp_compiler::{StraddlePolicy, WorldGeometry};
//!
//! let mut world = WorldGeometry::new(faces);
//! TreeBuilder::new(&ScoredSelector::default(), StraddlePolicy::Duplicate).build(&mut world);
//! LeafAssigner.assign(&mut world);
//!
//! let leaf = world.locate_leaf(eye).unwrap();
//! ```
//!
//! # Architecture
//!
//! - [`BspNode`]: Internal nodes storing a splitting plane and two [`Child`] links
//! - [`BspLeaf`]: Convex regions with their faces, portals and scene references
//! - [`PlaneSelector`]: Strategy trait for choosing splitting planes
//! - [`LeafVisitor`]: Visitor trait receiving each leaf with its root path
//!
//! [`WorldGeometry`]: crate::WorldGeometry

mod leaves;
mod node;
mod selector;
mod tree;
mod visitor;

pub use leaves::{AssignStats, LeafAssigner, WORLD_MARGIN};
pub use node::{BspLeaf, BspNode, Child, Side};
pub use selector::{PlaneSelector, ScoredSelector, SelectorWeights};
pub use tree::{BuildStats, TreeBuilder};
pub use visitor::{walk_leaves, CollectingVisitor, FnVisitor, LeafVisitor};
