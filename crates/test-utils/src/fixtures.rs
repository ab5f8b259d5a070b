//! Temp-dir fixtures for pipeline tests.

use std::path::PathBuf;
use tempfile::TempDir;

/// A scratch workspace with `tiles/` and `out/` directories, cleaned up on
/// drop.
pub struct PipelineDirs {
    _root: TempDir,
    pub tiles: PathBuf,
    pub out: PathBuf,
}

impl PipelineDirs {
    pub fn new() -> Self {
        let root = TempDir::new().expect("failed to create temp dir");
        let tiles = root.path().join("tiles");
        let out = root.path().join("out");
        std::fs::create_dir_all(&tiles).expect("failed to create tiles dir");
        std::fs::create_dir_all(&out).expect("failed to create out dir");
        Self {
            _root: root,
            tiles,
            out,
        }
    }
}

impl Default for PipelineDirs {
    fn default() -> Self {
        Self::new()
    }
}
