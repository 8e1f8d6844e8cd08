//! Error types for the compiler.

use std::path::PathBuf;

use nalgebra::Point3;

use crate::{AtlasKind, LeafId};

/// Result type alias for compiler operations.
pub type Result<T> = std::result::Result<T, CompileError>;

/// Errors that stop a compile.
///
/// Every other anomaly (degenerate splits, oversized footprints, rounding
/// trouble in the flood fill) is logged and worked around.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// The flood fill reached the boundary sentinel: the geometry is not
    /// watertight. `trace` runs from the seed to the leaking leaf.
    #[error("leak: leaf {leaf} is reachable from seed {seed:?}{}", trace_note(.trace_file))]
    Leak {
        leaf: LeafId,
        seed: Point3<f32>,
        trace: Vec<Point3<f32>>,
        trace_file: Option<PathBuf>,
    },

    /// The leak trace could not be written.
    #[error("failed to write leak trace {path:?}: {source}")]
    TraceIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The external atlas packer refused a tile.
    #[error("{kind} atlas has no room for a {width}x{height} tile")]
    AtlasFull { kind: AtlasKind, width: u32, height: u32 },
}

fn trace_note(trace_file: &Option<PathBuf>) -> String {
    match trace_file {
        Some(path) => format!(", trace written to {}", path.display()),
        None => String::new(),
    }
}

impl CompileError {
    pub fn is_leak(&self) -> bool {
        matches!(self, CompileError::Leak { .. })
    }
}
