//! Source transforms for the hotbox dev server.
//!
//! Every transform maps an absolute file path to the bytes a browser should
//! receive, or to a [`TransformError`]. The dev server binds one transform to
//! each cache worker:
//!
//! - [`StaticFile`] - identity transform, returns the file as-is
//! - [`TypeScript`] - strips types in-process with oxc
//! - [`ElmMake`] - runs `elm make` and wraps the output as an ES module
//!
//! Closures with the right signature are transforms too, which keeps test
//! doubles short:
//!
//! ```rust
//! use hotbox_transform::{Transform, TransformError};
//! use std::path::Path;
//!
//! let upper = |path: &Path| -> Result<Vec<u8>, TransformError> {
//!     Ok(path.display().to_string().to_uppercase().into_bytes())
//! };
//! assert_eq!(upper.transform(Path::new("/a.ts")).unwrap(), b"/A.TS");
//! ```

pub mod deps;
pub mod elm;
pub mod error;
pub mod static_file;
pub mod typescript;

use std::path::Path;

pub use deps::{parse_dependency_output, ElmDependencies};
pub use elm::ElmMake;
pub use error::{Result, TransformError};
pub use static_file::StaticFile;
pub use typescript::TypeScript;

/// A conversion from a source file on disk to browser-ready bytes.
///
/// Implementations are called from a blocking thread and may take as long as
/// they need; the caller bounds how long it waits.
pub trait Transform: Send + Sync + 'static {
    /// Convert the file at `path`.
    fn transform(&self, path: &Path) -> Result<Vec<u8>>;
}

impl<F> Transform for F
where
    F: Fn(&Path) -> Result<Vec<u8>> + Send + Sync + 'static,
{
    fn transform(&self, path: &Path) -> Result<Vec<u8>> {
        self(path)
    }
}

/// Read a source file, mapping a missing file to [`TransformError::NotFound`].
pub(crate) fn read_source(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|source| TransformError::from_io(path, source))
}
