use serde::{Deserialize, Serialize};

use super::files::FileSet;

/// Exit code reported for failures without a meaningful process code.
pub const FAILURE_EXIT_CODE: i32 = 1;

/// Result of running one external process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProcessOutcome {
    /// Exit code reported by the process, or 1 when it timed out.
    pub exit_code: i32,
    /// Whether either timeout fired.
    #[serde(default)]
    pub timed_out: bool,
    /// Whether the tool reported that it found nothing to process.
    #[serde(default)]
    pub saw_suppression_marker: bool,
}

impl ProcessOutcome {
    /// Outcome of a process that exited on its own.
    #[must_use]
    pub const fn exited(exit_code: i32) -> Self {
        Self {
            exit_code,
            timed_out: false,
            saw_suppression_marker: false,
        }
    }

    /// Outcome of a process that exceeded one of its timeouts.
    #[must_use]
    pub const fn timed_out() -> Self {
        Self {
            exit_code: FAILURE_EXIT_CODE,
            timed_out: true,
            saw_suppression_marker: false,
        }
    }

    /// Exit code after reinterpretation: a suppression marker turns any
    /// completed run into a success.
    #[must_use]
    pub const fn effective_code(&self) -> i32 {
        if self.saw_suppression_marker && !self.timed_out {
            0
        } else {
            self.exit_code
        }
    }

    /// Whether the effective code signals success.
    #[must_use]
    pub const fn success(&self) -> bool {
        self.effective_code() == 0
    }
}

/// Files that still differ after formatting.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DiffReport {
    /// Changed paths, restricted to the targeted files when applicable.
    pub files: FileSet,
}

impl DiffReport {
    /// Whether no differences remain.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.files.is_empty()
    }
}

/// Overall result of one orchestration run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum RunOutcome {
    /// Every batch succeeded and no unexpected diff remains.
    Formatted {
        /// Number of tool invocations performed.
        invocations: usize,
    },
    /// The selection resolved to no files; the tool was not invoked.
    NothingToFormat,
    /// The tool probe failed; no batch was attempted.
    ToolNotFound {
        /// Installation guidance for the caller.
        install_hint: String,
    },
    /// A batch failed; remaining batches were skipped.
    BatchFailed {
        /// Zero-based index of the failing batch.
        batch: usize,
        /// Outcome of the failing invocation.
        outcome: ProcessOutcome,
    },
    /// Formatting succeeded but targeted files still differ.
    DiffDetected(DiffReport),
}

impl RunOutcome {
    /// Process exit code for the run.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Formatted { .. } | Self::NothingToFormat => 0,
            Self::ToolNotFound { .. } | Self::DiffDetected(_) => FAILURE_EXIT_CODE,
            Self::BatchFailed { outcome, .. } => outcome.effective_code(),
        }
    }
}
