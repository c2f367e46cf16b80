//! Checks the working tree for changes left behind by the formatter.

use fmtgate_api::{DiffReport, FileSet};

use crate::repository::Git;
use crate::Result;

/// Reports files whose working-tree content differs after formatting.
#[derive(Debug)]
pub struct DiffVerifier<'a> {
    git: &'a Git,
}

impl<'a> DiffVerifier<'a> {
    /// Create a verifier backed by `git`.
    #[must_use]
    pub const fn new(git: &'a Git) -> Self {
        Self { git }
    }

    /// List changed files, restricted to `targeted` when the run formatted a
    /// concrete file set. Pattern runs pass `None` and see every change.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::GitCommand`] when the diff query fails.
    pub fn verify(&self, targeted: Option<&FileSet>) -> Result<DiffReport> {
        let changed = self.git.unstaged_changes()?;
        let report = restrict(changed, targeted);
        if report.is_clean() {
            tracing::info!("no formatting differences remain");
        } else {
            tracing::warn!(files = report.files.len(), "formatting differences detected");
        }
        Ok(report)
    }
}

/// Keep only the changed paths the run was responsible for.
#[must_use]
pub fn restrict(changed: FileSet, targeted: Option<&FileSet>) -> DiffReport {
    let files = match targeted {
        Some(targeted) => changed.intersection(targeted),
        None => changed,
    };
    DiffReport { files }
}
