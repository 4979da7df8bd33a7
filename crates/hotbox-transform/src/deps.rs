//! Elm source dependency discovery via `find-elm-dependencies`.
//!
//! The tool prints the entry file and every local module it imports as
//! single-quoted absolute paths. The dev server watches each of them so an
//! edit to an imported module reloads the page too.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::LazyLock;

use regex::Regex;

use crate::{Result, TransformError};

static QUOTED_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"'([^']+)'").expect("quoted path pattern is valid"));

/// Runs the dependency finder for Elm entry modules.
#[derive(Debug, Clone)]
pub struct ElmDependencies {
    program: String,
}

impl ElmDependencies {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// List the source files `entry` depends on, including `entry` itself.
    pub fn discover(&self, entry: &Path) -> Result<Vec<PathBuf>> {
        let output = Command::new(&self.program)
            .arg(entry)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .map_err(|source| TransformError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(TransformError::Compiler {
                program: self.program.clone(),
                path: entry.to_path_buf(),
                message: format!("exited with {}", output.status),
                module: None,
            });
        }

        Ok(parse_dependency_output(&String::from_utf8_lossy(
            &output.stdout,
        )))
    }
}

impl Default for ElmDependencies {
    fn default() -> Self {
        Self::new("find-elm-dependencies")
    }
}

/// Extract every single-quoted path from the finder's output.
pub fn parse_dependency_output(stdout: &str) -> Vec<PathBuf> {
    QUOTED_PATH
        .captures_iter(stdout)
        .filter_map(|caps| caps.get(1))
        .map(|m| PathBuf::from(m.as_str()))
        .collect()
}
