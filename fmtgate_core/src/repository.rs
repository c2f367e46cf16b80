//! Repository discovery on top of libgit2 and git queries through the CLI.

use std::path::Path;

use camino::{Utf8Path, Utf8PathBuf};
use fmtgate_api::FileSet;
use fmtgate_tool_api::CommandSpec;
use git2::{ErrorClass, ErrorCode, Repository as GitRepository};

use crate::paths::{canonical_utf8, utf8};
use crate::process::{ProcessRunner, Timeouts};
use crate::{Error, Result};

/// Handle to the git work tree that fmtgate operates on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    root: Utf8PathBuf,
}

impl Repository {
    /// Discover the repository enclosing `path`, walking upwards.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be canonicalized, does not resolve
    /// to a git repository, or resolves to a bare repository.
    pub fn discover(path: impl AsRef<Path>) -> Result<Self> {
        let canonical = canonical_utf8(path)?;

        let repo = match GitRepository::discover(&canonical) {
            Ok(repo) => repo,
            Err(err)
                if err.class() == ErrorClass::Repository && err.code() == ErrorCode::NotFound =>
            {
                return Err(Error::NotARepository {
                    path: canonical.to_string(),
                })
            }
            Err(err) => return Err(Error::from(err)),
        };

        let workdir = repo.workdir().ok_or_else(|| Error::BareRepository {
            path: canonical.to_string(),
        })?;
        let root = canonical_utf8(workdir).or_else(|_| utf8(workdir.to_path_buf()))?;

        Ok(Self { root })
    }

    /// Absolute path to the work tree root.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }
}

/// Runs git queries from the work tree root.
#[derive(Debug, Clone)]
pub struct Git {
    runner: ProcessRunner,
    root: Utf8PathBuf,
    timeouts: Timeouts,
}

impl Git {
    /// Create a query helper rooted at `repository`.
    #[must_use]
    pub fn new(runner: ProcessRunner, repository: &Repository) -> Self {
        Self {
            runner,
            root: repository.root.clone(),
            timeouts: Timeouts::GIT,
        }
    }

    /// Work tree root the queries run from.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Files staged for commit, excluding deletions.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GitCommand`] when git fails.
    pub fn staged_files(&self) -> Result<FileSet> {
        self.file_list(&["diff", "--name-only", "--diff-filter=ACM", "--cached"])
    }

    /// Modified tracked files plus untracked files that are not ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GitCommand`] when git fails.
    pub fn modified_files(&self) -> Result<FileSet> {
        self.file_list(&["ls-files", "--modified", "--others", "--exclude-standard"])
    }

    /// Files added, copied or modified between two revisions.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GitCommand`] when git fails, e.g. for unknown revisions.
    pub fn changed_between(&self, from: &str, to: &str) -> Result<FileSet> {
        self.file_list(&["diff", "--name-only", "--diff-filter=ACM", from, to])
    }

    /// Working tree files that differ from the index, excluding deletions.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GitCommand`] when git fails.
    pub fn unstaged_changes(&self) -> Result<FileSet> {
        self.file_list(&["diff", "--name-only", "--diff-filter=ACM"])
    }

    /// Whether `revision` names an existing commit object.
    ///
    /// # Errors
    ///
    /// Returns an error only when git cannot be launched.
    pub fn commit_exists(&self, revision: &str) -> Result<bool> {
        let mut exists = false;
        self.runner.run(
            &self.command(&["cat-file", "-t", revision]),
            self.timeouts,
            &mut |line| {
                if line.starts_with("commit") {
                    exists = true;
                }
            },
            &mut |line| tracing::debug!(target: "fmtgate::git", "{line}"),
        )?;
        Ok(exists)
    }

    /// Stream the full working tree diff to `on_line`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GitCommand`] when git fails.
    pub fn stream_diff(&self, on_line: &mut dyn FnMut(&str)) -> Result<()> {
        let args = ["diff"];
        let outcome = self.runner.run(
            &self.command(&args),
            self.timeouts,
            on_line,
            &mut |line| tracing::warn!(target: "fmtgate::git", "{line}"),
        )?;
        if outcome.success() {
            Ok(())
        } else {
            Err(git_failure(&args, outcome.exit_code))
        }
    }

    fn file_list(&self, args: &[&str]) -> Result<FileSet> {
        let mut files = FileSet::new();
        let outcome = self.runner.run(
            &self.command(args),
            self.timeouts,
            &mut |line| {
                let path = line.trim();
                if !path.is_empty() {
                    files.insert(path);
                }
            },
            &mut |line| tracing::warn!(target: "fmtgate::git", "{line}"),
        )?;

        if !outcome.success() {
            return Err(git_failure(args, outcome.exit_code));
        }

        tracing::debug!(args = %args.join(" "), files = files.len(), "git query finished");
        Ok(files)
    }

    // Paths must come back verbatim; quoted names match nothing downstream.
    fn command(&self, args: &[&str]) -> CommandSpec {
        CommandSpec::new("git")
            .args(["-c", "core.quotePath=false"])
            .args(args.iter().copied())
            .current_dir(self.root.clone())
    }
}

fn git_failure(args: &[&str], code: i32) -> Error {
    Error::GitCommand {
        args: args.join(" "),
        code,
    }
}
