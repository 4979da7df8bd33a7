//! Identity transform for files served as they are on disk.

use std::path::Path;

use crate::{read_source, Result, Transform};

/// Serves file bytes unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticFile;

impl Transform for StaticFile {
    fn transform(&self, path: &Path) -> Result<Vec<u8>> {
        read_source(path)
    }
}
