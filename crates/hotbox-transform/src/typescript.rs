//! In-process TypeScript to JavaScript compilation with oxc.
//!
//! Types are stripped and the remaining syntax is printed back out as an ES
//! module. No bundling, no downleveling, no source maps.

use std::path::Path;

use oxc_allocator::Allocator;
use oxc_codegen::Codegen;
use oxc_parser::Parser;
use oxc_semantic::SemanticBuilder;
use oxc_span::SourceType;
use oxc_transformer::{TransformOptions, Transformer};

use crate::{read_source, Result, Transform, TransformError};

/// Compiles `.ts` (and `.tsx`) sources to JavaScript.
#[derive(Debug, Default)]
pub struct TypeScript {
    options: TransformOptions,
}

impl TypeScript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile TypeScript source text.
    ///
    /// `path` selects the source type (`.ts`, `.tsx`, `.mts`) and is used in
    /// diagnostics; it is not read.
    pub fn compile(&self, path: &Path, source: &str) -> Result<String> {
        let source_type = SourceType::from_path(path).unwrap_or_else(|_| SourceType::ts());
        let allocator = Allocator::default();

        let parsed = Parser::new(&allocator, source, source_type).parse();
        if !parsed.errors.is_empty() || parsed.panicked {
            return Err(diagnostics(path, parsed.errors.iter()));
        }
        let mut program = parsed.program;

        let semantic = SemanticBuilder::new().build(&program);
        if !semantic.errors.is_empty() {
            return Err(diagnostics(path, semantic.errors.iter()));
        }
        let scoping = semantic.semantic.into_scoping();

        let transformed = Transformer::new(&allocator, path, &self.options)
            .build_with_scoping(scoping, &mut program);
        if !transformed.errors.is_empty() {
            return Err(diagnostics(path, transformed.errors.iter()));
        }

        Ok(Codegen::new().build(&program).code)
    }
}

impl Transform for TypeScript {
    fn transform(&self, path: &Path) -> Result<Vec<u8>> {
        let bytes = read_source(path)?;
        let source = String::from_utf8(bytes).map_err(|e| TransformError::Diagnostics {
            path: path.to_path_buf(),
            messages: vec![format!("source is not valid UTF-8: {e}")],
        })?;
        self.compile(path, &source).map(String::into_bytes)
    }
}

fn diagnostics<'a, D>(path: &Path, errors: impl Iterator<Item = &'a D>) -> TransformError
where
    D: std::fmt::Display + 'a,
{
    let mut messages: Vec<String> = errors.map(ToString::to_string).collect();
    if messages.is_empty() {
        messages.push("parser gave up on this file".to_string());
    }
    TransformError::Diagnostics {
        path: path.to_path_buf(),
        messages,
    }
}
