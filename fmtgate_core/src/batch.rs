//! Packs files into include expressions that fit a byte budget.
//!
//! Command lines are limited to roughly 8 KiB on Windows, so a large file
//! set is split across several formatter invocations. Packing is greedy
//! first-fit in set order; minimising the number of batches is not a goal.

use camino::{Utf8Path, Utf8PathBuf};
use fmtgate_api::{FileSet, IncludeBatch};

use crate::paths::relative_to;

/// Default byte budget for one include expression.
pub const DEFAULT_BUDGET_BYTES: usize = 7000;

/// Rewrites repository-relative paths into tokens the formatter understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathRewrite {
    roots: Option<(Utf8PathBuf, Utf8PathBuf)>,
}

impl PathRewrite {
    /// Rewrite paths relative to `tool_root` (the solution directory).
    ///
    /// Both roots are expected to be absolute and canonical.
    #[must_use]
    pub fn new(repo_root: impl Into<Utf8PathBuf>, tool_root: impl Into<Utf8PathBuf>) -> Self {
        Self {
            roots: Some((repo_root.into(), tool_root.into())),
        }
    }

    /// Keep paths repository-relative.
    #[must_use]
    pub const fn identity() -> Self {
        Self { roots: None }
    }

    /// Token for a repository-relative `path`.
    ///
    /// Paths outside the tool root's subtree cannot be expressed with `../`
    /// because the formatter's pattern matcher forbids leaving its root, so
    /// they become `**/<path>`. That may also match other files sharing the
    /// same tail.
    #[must_use]
    pub fn token(&self, path: &str) -> String {
        let Some((repo_root, tool_root)) = &self.roots else {
            return path.to_owned();
        };

        let absolute = repo_root.join(Utf8Path::new(path));
        let relative = relative_to(&absolute, tool_root);
        if relative.starts_with("..") {
            format!("**/{path}")
        } else {
            relative
        }
    }
}

/// Partition `files` into include batches no longer than `budget_bytes`.
///
/// Every file lands in exactly one batch. A token that alone exceeds the
/// budget gets a batch of its own.
#[must_use]
pub fn plan(files: &FileSet, budget_bytes: usize, rewrite: &PathRewrite) -> Vec<IncludeBatch> {
    let mut remaining = files
        .iter()
        .map(|path| (path, rewrite.token(path)))
        .peekable();

    let mut batches = Vec::new();
    while remaining.peek().is_some() {
        let mut batch = IncludeBatch::default();
        while let Some((path, token)) = remaining.next_if(|(_, token)| {
            batch.is_empty() || batch.len_with(token) <= budget_bytes
        }) {
            batch.push(token, path);
        }

        if batch.encoded_len() > budget_bytes {
            tracing::warn!(
                bytes = batch.encoded_len(),
                budget = budget_bytes,
                "single path exceeds the include budget"
            );
        }
        batches.push(batch);
    }

    tracing::debug!(files = files.len(), batches = batches.len(), "planned include batches");
    batches
}
