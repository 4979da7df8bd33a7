//! Error types for source transforms.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub type Result<T, E = TransformError> = std::result::Result<T, E>;

/// Why a transform could not produce output.
#[derive(Debug, Error)]
pub enum TransformError {
    /// The source file does not exist.
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The source file exists but could not be read.
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The in-process compiler rejected the source.
    #[error("Transform error in {}:\n{}", .path.display(), .messages.join("\n"))]
    Diagnostics {
        path: PathBuf,
        /// One rendered message per diagnostic
        messages: Vec<String>,
    },

    /// An external compiler reported a failure.
    ///
    /// `module` carries a browser-executable module that displays the error,
    /// for dialects that prefer showing failures in the page over a 404.
    #[error("{program} failed for {}:\n{message}", .path.display())]
    Compiler {
        program: String,
        path: PathBuf,
        message: String,
        module: Option<Vec<u8>>,
    },

    /// An external program could not be started.
    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The transform panicked or was cancelled before producing output.
    #[error("Transform for {} aborted: {message}", .path.display())]
    Aborted { path: PathBuf, message: String },
}

impl TransformError {
    pub(crate) fn from_io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            Self::NotFound(path.to_path_buf())
        } else {
            Self::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }

    /// The in-page error module to serve instead of an error status, if any.
    pub fn fallback_module(&self) -> Option<&[u8]> {
        match self {
            Self::Compiler {
                module: Some(module),
                ..
            } => Some(module),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
