//! Resolves the files a run should format from the selection and git state.

use camino::Utf8Path;
use fmtgate_api::{ChangeSources, CommitRange, FileSet, ResolvedRange, Selection};

use crate::paths::relative_to;
use crate::repository::Git;
use crate::{ConfigError, Error, Result};

/// Files selected for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSelection {
    /// A raw pattern handed to a tool that matches patterns itself.
    Pattern(String),
    /// Concrete repository-relative paths.
    Files(FileSet),
}

/// Turns a [`Selection`] into concrete files using git queries.
#[derive(Debug)]
pub struct FileSetResolver<'a> {
    git: &'a Git,
    assume_head: bool,
    native_patterns: bool,
}

impl<'a> FileSetResolver<'a> {
    /// Create a resolver backed by `git`.
    #[must_use]
    pub const fn new(git: &'a Git) -> Self {
        Self {
            git,
            assume_head: false,
            native_patterns: true,
        }
    }

    /// Replace commit endpoints that do not name a commit with `HEAD`.
    #[must_use]
    pub const fn assume_head(mut self, enabled: bool) -> Self {
        self.assume_head = enabled;
        self
    }

    /// Whether the downstream tool matches patterns itself; when it does not,
    /// pattern selections are expanded into files.
    #[must_use]
    pub const fn native_patterns(mut self, enabled: bool) -> Self {
        self.native_patterns = enabled;
        self
    }

    /// Resolve the files in scope.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyCommitRange`] when commits are selected
    /// without any endpoint, and propagates git failures.
    pub fn resolve(&self, selection: &Selection, range: &CommitRange) -> Result<FileSelection> {
        match selection {
            Selection::Pattern(pattern) if self.native_patterns => {
                Ok(FileSelection::Pattern(pattern.clone()))
            }
            Selection::Pattern(pattern) => {
                expand_pattern(self.git.root(), pattern).map(FileSelection::Files)
            }
            Selection::Changes(sources) => self
                .changed_files(*sources, range)
                .map(FileSelection::Files),
        }
    }

    fn changed_files(&self, sources: ChangeSources, range: &CommitRange) -> Result<FileSet> {
        let mut files = FileSet::new();

        if sources.modified {
            files.extend(self.git.modified_files()?);
        }

        if sources.staged {
            files.extend(self.git.staged_files()?);
        }

        if sources.commits {
            let range = self.resolve_range(range)?;
            tracing::info!(
                from = %range.from,
                to = %range.to,
                "collecting files changed between commits"
            );
            files.extend(self.git.changed_between(&range.from, &range.to)?);
        }

        tracing::debug!(files = files.len(), "resolved file set");
        Ok(files)
    }

    /// Apply the assume-head policy and resolve the commit range.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyCommitRange`] when neither endpoint is set.
    pub fn resolve_range(&self, range: &CommitRange) -> Result<ResolvedRange> {
        let range = if self.assume_head {
            CommitRange {
                from: self.existing_or_head(range.from.as_deref())?,
                to: self.existing_or_head(range.to.as_deref())?,
            }
        } else {
            range.clone()
        };

        range
            .resolve()
            .ok_or_else(|| Error::Config(ConfigError::EmptyCommitRange))
    }

    fn existing_or_head(&self, revision: Option<&str>) -> Result<Option<String>> {
        let Some(revision) = revision else {
            return Ok(None);
        };
        if self.git.commit_exists(revision)? {
            Ok(Some(revision.to_owned()))
        } else {
            tracing::warn!(commit = revision, "commit not found, using HEAD");
            Ok(Some("HEAD".to_owned()))
        }
    }
}

/// Expand `pattern` against the files under `root`.
///
/// # Errors
///
/// Returns [`Error::Pattern`] when the pattern cannot be parsed.
pub fn expand_pattern(root: &Utf8Path, pattern: &str) -> Result<FileSet> {
    let full = root.join(pattern);
    let entries = glob::glob(full.as_str()).map_err(|source| Error::Pattern {
        pattern: pattern.to_owned(),
        source,
    })?;

    let mut files = FileSet::new();
    for entry in entries {
        let path = match entry {
            Ok(path) => path,
            Err(err) => {
                tracing::debug!(error = %err, "skipping unreadable path");
                continue;
            }
        };
        if !path.is_file() {
            continue;
        }
        let Some(path) = camino::Utf8PathBuf::from_path_buf(path).ok() else {
            continue;
        };
        if path.components().any(|part| part.as_str() == ".git") {
            continue;
        }
        files.insert(relative_to(&path, root));
    }
    Ok(files)
}
