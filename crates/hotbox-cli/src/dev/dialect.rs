//! Request path resolution and per-extension dispatch.

use path_clean::PathClean;
use percent_encoding::percent_decode_str;
use std::path::{Path, PathBuf};

/// Content type for every compiled dialect.
pub const JAVASCRIPT: &str = "application/javascript";

/// Which cache worker serves a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// Served byte-for-byte
    Static,
    /// `.ts`, compiled in-process
    TypeScript,
    /// `.elm`, compiled by `elm make`
    Elm,
}

impl Dialect {
    /// Pick the dialect from a file extension.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("ts") => Self::TypeScript,
            Some("elm") => Self::Elm,
            _ => Self::Static,
        }
    }

    /// Content type to set on a successful response.
    ///
    /// `None` leaves the header unset so the browser sniffs static files.
    pub fn content_type(self) -> Option<&'static str> {
        match self {
            Self::Static => None,
            Self::TypeScript | Self::Elm => Some(JAVASCRIPT),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::TypeScript => "typescript",
            Self::Elm => "elm",
        }
    }
}

/// Map a request path to a file under `root` and the dialect that serves it.
///
/// `root` must already be canonical. The path is percent-decoded first.
/// Anything that cleans to `root` itself (`/`, `/.`, `/a/..`) serves
/// `index.html`, and a path without an extension is treated as a TypeScript
/// module import. Returns `None` when the decoded path is not UTF-8,
/// contains NUL, or escapes `root`.
pub fn resolve(root: &Path, uri_path: &str) -> Option<(PathBuf, Dialect)> {
    let decoded = percent_decode_str(uri_path).decode_utf8().ok()?;
    if decoded.contains('\0') {
        return None;
    }

    let mut path = root.join(decoded.trim_start_matches('/')).clean();
    if !path.starts_with(root) {
        return None;
    }
    if path == root {
        path = root.join("index.html");
    }

    if path.extension().is_none() {
        path.as_mut_os_string().push(".ts");
    }

    let dialect = Dialect::from_path(&path);
    Some((path, dialect))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_from_extension() {
        assert_eq!(Dialect::from_path(Path::new("/a/b.ts")), Dialect::TypeScript);
        assert_eq!(Dialect::from_path(Path::new("/a/Main.elm")), Dialect::Elm);
        assert_eq!(Dialect::from_path(Path::new("/a/index.html")), Dialect::Static);
        assert_eq!(Dialect::from_path(Path::new("/a/b.tsx")), Dialect::Static);
    }

    #[test]
    fn test_content_type() {
        assert_eq!(Dialect::Static.content_type(), None);
        assert_eq!(Dialect::TypeScript.content_type(), Some(JAVASCRIPT));
        assert_eq!(Dialect::Elm.content_type(), Some(JAVASCRIPT));
    }

    #[test]
    fn test_resolve_index() {
        let root = Path::new("/srv/app");
        let (path, dialect) = resolve(root, "/").unwrap();
        assert_eq!(path, PathBuf::from("/srv/app/index.html"));
        assert_eq!(dialect, Dialect::Static);
    }

    #[test]
    fn test_resolve_root_clean_forms_serve_index() {
        let root = Path::new("/srv/app");
        for uri in ["/.", "/./", "/a/..", "/a/b/../.."] {
            let (path, dialect) = resolve(root, uri).unwrap();
            assert_eq!(path, PathBuf::from("/srv/app/index.html"), "uri {uri}");
            assert_eq!(dialect, Dialect::Static);
        }
    }

    #[test]
    fn test_resolve_percent_decodes() {
        let root = Path::new("/srv/app");
        let (path, _) = resolve(root, "/my%20file.html").unwrap();
        assert_eq!(path, PathBuf::from("/srv/app/my file.html"));

        let (path, _) = resolve(root, "/caf%C3%A9.ts").unwrap();
        assert_eq!(path, PathBuf::from("/srv/app/café.ts"));
    }

    #[test]
    fn test_resolve_rejects_encoded_escapes() {
        let root = Path::new("/srv/app");
        assert!(resolve(root, "/%2e%2e/secret.txt").is_none());
        assert!(resolve(root, "/a%2f..%2f..%2fsecret.txt").is_none());
        assert!(resolve(root, "/bad%00.ts").is_none());
        assert!(resolve(root, "/bad%ff.ts").is_none());
    }

    #[test]
    fn test_resolve_extensionless_import() {
        let root = Path::new("/srv/app");
        let (path, dialect) = resolve(root, "/lib/util").unwrap();
        assert_eq!(path, PathBuf::from("/srv/app/lib/util.ts"));
        assert_eq!(dialect, Dialect::TypeScript);
    }

    #[test]
    fn test_resolve_elm() {
        let root = Path::new("/srv/app");
        let (path, dialect) = resolve(root, "/Main.elm").unwrap();
        assert_eq!(path, PathBuf::from("/srv/app/Main.elm"));
        assert_eq!(dialect, Dialect::Elm);
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        let root = Path::new("/srv/app");
        assert!(resolve(root, "/../secret.txt").is_none());
        assert!(resolve(root, "/a/../../etc/passwd").is_none());
        assert!(resolve(root, "/..").is_none());
        assert!(resolve(root, "/a/../..").is_none());
    }

    #[test]
    fn test_resolve_normalizes_inside_root() {
        let root = Path::new("/srv/app");
        let (path, _) = resolve(root, "/a/../b.ts").unwrap();
        assert_eq!(path, PathBuf::from("/srv/app/b.ts"));
    }
}
