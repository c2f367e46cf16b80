use std::path::{Path, PathBuf};

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};

use crate::{Error, Result};

/// Express `path` relative to `base` using `/` separators.
///
/// Both paths should be absolute and normalized. Components of `base` that
/// are not shared with `path` become `..`.
#[must_use]
pub fn relative_to(path: &Utf8Path, base: &Utf8Path) -> String {
    let path_parts: Vec<Utf8Component<'_>> = path.components().collect();
    let base_parts: Vec<Utf8Component<'_>> = base.components().collect();

    let common = path_parts
        .iter()
        .zip(&base_parts)
        .take_while(|(left, right)| left == right)
        .count();

    let mut parts: Vec<&str> = Vec::new();
    parts.extend(base_parts[common..].iter().map(|_| ".."));
    parts.extend(path_parts[common..].iter().map(Utf8Component::as_str));

    if parts.is_empty() {
        ".".to_owned()
    } else {
        parts.join("/")
    }
}

/// Canonicalize a path and require it to be valid UTF-8.
///
/// # Errors
///
/// Returns [`Error::Io`] when the path cannot be resolved and
/// [`Error::NonUtf8Path`] when it is not representable as UTF-8.
pub fn canonical_utf8(path: impl AsRef<Path>) -> Result<Utf8PathBuf> {
    let original = path.as_ref();
    let canonical = std::fs::canonicalize(original).map_err(|source| Error::Io {
        path: original.display().to_string(),
        source,
    })?;
    utf8(canonical)
}

/// Convert an owned path to UTF-8.
///
/// # Errors
///
/// Returns [`Error::NonUtf8Path`] when the path is not valid UTF-8.
pub fn utf8(path: PathBuf) -> Result<Utf8PathBuf> {
    Utf8PathBuf::from_path_buf(path).map_err(|path| Error::NonUtf8Path {
        path: path.display().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_path_is_relative() {
        assert_eq!(
            relative_to(Utf8Path::new("/repo/src/app/a.cs"), Utf8Path::new("/repo/src")),
            "app/a.cs"
        );
    }

    #[test]
    fn sibling_path_climbs_with_parent_tokens() {
        assert_eq!(
            relative_to(Utf8Path::new("/repo/lib/b.cs"), Utf8Path::new("/repo/src/app")),
            "../../lib/b.cs"
        );
    }

    #[test]
    fn identical_paths_are_dot() {
        assert_eq!(relative_to(Utf8Path::new("/repo"), Utf8Path::new("/repo")), ".");
    }
}
