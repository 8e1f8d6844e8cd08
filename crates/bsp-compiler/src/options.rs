//! Compile options.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::AtlasKind;

/// What the tree builder does with a face straddling the split plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StraddlePolicy {
    /// Put the same face index on both sides. No new geometry, but the face
    /// ends up in two leaves and is drawn twice at runtime.
    #[default]
    Duplicate,
    /// Cut the face in two; the back piece becomes a new face.
    Split,
}

/// Texel footprint rules for one atlas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FootprintSpec {
    /// World units covered by one texel.
    pub patch_size: f32,
    /// Largest tile edge, in texels, the atlas accepts.
    pub max_tile_texels: u32,
    /// Texels of padding added on every side.
    pub margin_texels: u32,
}

impl FootprintSpec {
    pub const LIGHTMAP: FootprintSpec = FootprintSpec {
        patch_size: 16.0,
        max_tile_texels: 128,
        margin_texels: 1,
    };

    pub const SPHERICAL_HARMONICS: FootprintSpec = FootprintSpec {
        patch_size: 32.0,
        max_tile_texels: 64,
        margin_texels: 1,
    };

    /// Texels needed to cover `extent` world units, margin included.
    pub fn texels(&self, extent: f32) -> u32 {
        (extent / self.patch_size).ceil().max(1.0) as u32 + 2 * self.margin_texels
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    pub straddle_policy: StraddlePolicy,
    /// Inject boundary sentinels and fail on leaks.
    pub require_watertight: bool,
    /// Map file the geometry came from; the leak trace is written next to it.
    pub source_path: Option<PathBuf>,
    pub resolve_interpenetration: bool,
    pub merge_coplanar: bool,
    pub lightmap: FootprintSpec,
    pub spherical_harmonics: FootprintSpec,
    /// A face needing more tiles than this is reported.
    pub max_tiles_per_face: u32,
}

impl CompileOptions {
    pub fn footprint(&self, kind: AtlasKind) -> &FootprintSpec {
        match kind {
            AtlasKind::Lightmap => &self.lightmap,
            AtlasKind::SphericalHarmonics => &self.spherical_harmonics,
        }
    }
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            straddle_policy: StraddlePolicy::default(),
            require_watertight: true,
            source_path: None,
            resolve_interpenetration: true,
            merge_coplanar: true,
            lightmap: FootprintSpec::LIGHTMAP,
            spherical_harmonics: FootprintSpec::SPHERICAL_HARMONICS,
            max_tiles_per_face: 64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn texels_include_margin() {
        let spec = FootprintSpec {
            patch_size: 4.0,
            max_tile_texels: 16,
            margin_texels: 1,
        };
        assert_eq!(spec.texels(16.0), 6);
        assert_eq!(spec.texels(17.0), 7);
        assert_eq!(spec.texels(0.0), 3);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let options: CompileOptions =
            serde_json::from_str(r#"{ "straddle_policy": "split", "require_watertight": false }"#)
                .unwrap();
        assert_eq!(options.straddle_policy, StraddlePolicy::Split);
        assert!(!options.require_watertight);
        assert_eq!(options.lightmap, FootprintSpec::LIGHTMAP);
        assert_eq!(options.max_tiles_per_face, 64);
    }

    #[test]
    fn json_round_trip() {
        let options = CompileOptions {
            source_path: Some(PathBuf::from("maps/e1m1.map")),
            ..CompileOptions::default()
        };
        let json = serde_json::to_string(&options).unwrap();
        let back: CompileOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(back, options);
    }
}
