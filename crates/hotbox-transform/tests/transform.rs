//! Integration tests for the transforms against files on disk.

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use hotbox_transform::{StaticFile, Transform, TransformError, TypeScript};
use tempfile::TempDir;

#[test]
fn test_static_file_returns_exact_bytes() {
    let temp = TempDir::new().unwrap();
    let index = temp.path().join("index.html");
    let html = b"<!doctype html>\n<script type=\"module\" src=\"/app.ts\"></script>\n";
    fs::write(&index, html).unwrap();

    assert_eq!(StaticFile.transform(&index).unwrap(), html);
}

#[test]
fn test_static_file_missing_is_not_found() {
    let temp = TempDir::new().unwrap();
    let err = StaticFile
        .transform(&temp.path().join("nope.css"))
        .unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_typescript_file_compiles() {
    let temp = TempDir::new().unwrap();
    let app = temp.path().join("app.ts");
    fs::write(
        &app,
        "type Greeting = string;\nexport function greet(name: string): Greeting {\n  return `hi ${name}`;\n}\n",
    )
    .unwrap();

    let code = String::from_utf8(TypeScript::new().transform(&app).unwrap()).unwrap();
    assert!(code.contains("export function greet(name)"));
    assert!(!code.contains("Greeting"));
}

#[test]
fn test_typescript_missing_file_is_not_found() {
    let temp = TempDir::new().unwrap();
    let err = TypeScript::new()
        .transform(&temp.path().join("app.ts"))
        .unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_typescript_syntax_error_names_file() {
    let temp = TempDir::new().unwrap();
    let app = temp.path().join("broken.ts");
    fs::write(&app, "export const x: = 1;").unwrap();

    let err = TypeScript::new().transform(&app).unwrap_err();
    assert!(matches!(err, TransformError::Diagnostics { .. }));
    assert!(err.to_string().contains("broken.ts"));
}

#[test]
fn test_closure_transform_counts_calls() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let transform = move |path: &Path| -> Result<Vec<u8>, TransformError> {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(path.to_string_lossy().into_owned().into_bytes())
    };

    assert_eq!(transform.transform(Path::new("/x.ts")).unwrap(), b"/x.ts");
    assert_eq!(transform.transform(Path::new("/y.ts")).unwrap(), b"/y.ts");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}
