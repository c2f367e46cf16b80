//! Bounded search for the solution file when none is configured.

use std::collections::VecDeque;
use std::fs;
use std::path::Path;

use camino::Utf8PathBuf;

const SOLUTION_EXTENSION: &str = "sln";

/// Limits that keep the search finite on large or deep trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchLimits {
    /// Maximum directory depth explored below each starting directory.
    pub max_depth: usize,
    /// Maximum number of directory entries inspected per starting directory.
    pub max_entries: usize,
    /// Maximum number of parent directories to climb.
    pub max_ascend: usize,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            max_depth: 8,
            max_entries: 50_000,
            max_ascend: 16,
        }
    }
}

/// Errors reported by the solution search.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    /// The search exhausted its limits without finding a match.
    #[error("no solution file found searching from {start} ({visited} directories visited)")]
    NotFound {
        /// Directory the search started from.
        start: String,
        /// Number of directories inspected.
        visited: usize,
    },
}

/// Find the first `*.sln` file at or below `start`, then at or below each
/// parent of `start`.
///
/// Directories are explored breadth-first in lexical order and hidden
/// directories are skipped, so shallow matches win over deep ones. Files
/// whose path is not valid UTF-8 are ignored.
///
/// # Errors
///
/// Returns [`SearchError::NotFound`] when no file matches within `limits`.
pub fn find_solution(start: &Path, limits: SearchLimits) -> Result<Utf8PathBuf, SearchError> {
    find_with_extension(start, SOLUTION_EXTENSION, limits)
}

fn find_with_extension(
    start: &Path,
    extension: &str,
    limits: SearchLimits,
) -> Result<Utf8PathBuf, SearchError> {
    let mut visited = 0;
    let mut current = Some(start);
    let mut skip: Option<&Path> = None;

    for _ in 0..=limits.max_ascend {
        let Some(dir) = current else {
            break;
        };
        if let Some(found) = search_down(dir, skip, extension, limits, &mut visited) {
            return Ok(found);
        }
        skip = Some(dir);
        current = dir.parent();
    }

    Err(SearchError::NotFound {
        start: start.display().to_string(),
        visited,
    })
}

// `skip` is the subtree already searched on the previous level.
fn search_down(
    root: &Path,
    skip: Option<&Path>,
    extension: &str,
    limits: SearchLimits,
    visited: &mut usize,
) -> Option<Utf8PathBuf> {
    let mut queue = VecDeque::from([(root.to_path_buf(), 0_usize)]);
    let mut inspected = 0_usize;

    while let Some((dir, depth)) = queue.pop_front() {
        *visited += 1;
        let Ok(entries) = fs::read_dir(&dir) else {
            continue;
        };

        let mut files = Vec::new();
        let mut dirs = Vec::new();
        for entry in entries.flatten() {
            inspected += 1;
            if inspected > limits.max_entries {
                tracing::debug!(dir = %root.display(), "solution search entry limit reached");
                return None;
            }
            let path = entry.path();
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            if file_type.is_file() {
                if path.extension().is_some_and(|ext| ext == extension) {
                    files.push(path);
                }
            } else if file_type.is_dir() && !is_hidden(&path) && Some(path.as_path()) != skip {
                dirs.push(path);
            }
        }

        files.sort();
        if let Some(found) = files
            .into_iter()
            .find_map(|path| Utf8PathBuf::from_path_buf(path).ok())
        {
            return Some(found);
        }

        if depth < limits.max_depth {
            dirs.sort();
            queue.extend(dirs.into_iter().map(|dir| (dir, depth + 1)));
        }
    }

    None
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with('.'))
}
