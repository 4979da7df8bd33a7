//! Elm compilation through the `elm make` command-line compiler.
//!
//! `elm make` writes an IIFE that attaches `Elm` to `this`. The output is
//! rewritten so the browser can `import { Elm } from "/Main.elm"`.
//!
//! A failed compile is reported as [`TransformError::Compiler`] carrying a
//! small module that replaces the page body with the compiler's message, so
//! the developer sees the error where the app would have been.

use std::path::Path;
use std::process::{Command, Stdio};

use crate::{Result, Transform, TransformError};

const MODULE_PREFIX: &str = "const scope = {};\n";
const MODULE_SUFFIX: &str = "\nexport const { Elm } = scope;\n";

/// Runs `elm make <path> --output=<tmp>.js` and returns the output as an ES module.
#[derive(Debug, Clone)]
pub struct ElmMake {
    program: String,
}

impl ElmMake {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Default for ElmMake {
    fn default() -> Self {
        Self::new("elm")
    }
}

impl Transform for ElmMake {
    fn transform(&self, path: &Path) -> Result<Vec<u8>> {
        if !path.exists() {
            return Err(TransformError::NotFound(path.to_path_buf()));
        }

        let output_file = tempfile::Builder::new()
            .prefix("output.")
            .suffix(".js")
            .tempfile()
            .map_err(|source| TransformError::Io {
                path: std::env::temp_dir(),
                source,
            })?;

        let mut output_arg = std::ffi::OsString::from("--output=");
        output_arg.push(output_file.path());

        let output = Command::new(&self.program)
            .arg("make")
            .arg(path)
            .arg(output_arg)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| TransformError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() || !output.status.success() {
            let message = if stderr.trim().is_empty() {
                format!("{} exited with {}", self.program, output.status)
            } else {
                stderr.into_owned()
            };
            tracing::error!(path = %path.display(), "{}", message);
            return Err(TransformError::Compiler {
                program: self.program.clone(),
                path: path.to_path_buf(),
                module: Some(error_module(&message).into_bytes()),
                message,
            });
        }

        let compiled = std::fs::read_to_string(output_file.path())
            .map_err(|source| TransformError::from_io(output_file.path(), source))?;
        tracing::debug!(path = %path.display(), bytes = compiled.len(), "elm make finished");

        Ok(wrap_module(&compiled).into_bytes())
    }
}

/// Turn `elm make` output into an ES module exporting `Elm`.
pub fn wrap_module(compiled: &str) -> String {
    let mut module =
        String::with_capacity(MODULE_PREFIX.len() + compiled.len() + MODULE_SUFFIX.len());
    module.push_str(MODULE_PREFIX);
    module.push_str(&compiled.replacen("}(this));", "}(scope));", 1));
    module.push_str(MODULE_SUFFIX);
    module
}

/// Build a module that shows `message` in place of the page body.
pub fn error_module(message: &str) -> String {
    let escaped = message
        .replace('\\', "\\\\")
        .replace('`', "\\`")
        .replace("${", "\\${")
        .replace('<', "&lt;");
    format!("document.body.innerHTML = `<pre>{escaped}</pre>`;export const Elm = {{}}")
}
