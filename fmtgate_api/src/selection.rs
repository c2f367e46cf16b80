use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Pattern used when the caller selects pattern mode without a pattern.
pub const DEFAULT_PATTERN: &str = "**/*";

/// A single source of files to format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    /// Every file matching a glob pattern.
    Pattern,
    /// Files staged for commit.
    Staged,
    /// Files modified in the working tree, including untracked files.
    Modified,
    /// Files changed between two commits.
    Commits,
}

impl SelectionMode {
    /// Parse a comma separated, case-insensitive list such as `staged,modified`.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::UnknownMode`] for any unrecognised entry.
    pub fn parse_list(value: &str) -> Result<Vec<Self>, SelectionError> {
        value
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::parse)
            .collect()
    }

    /// Lowercase name accepted on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pattern => "pattern",
            Self::Staged => "staged",
            Self::Modified => "modified",
            Self::Commits => "commits",
        }
    }
}

impl FromStr for SelectionMode {
    type Err = SelectionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pattern" => Ok(Self::Pattern),
            "staged" => Ok(Self::Staged),
            "modified" => Ok(Self::Modified),
            "commits" => Ok(Self::Commits),
            _ => Err(SelectionError::UnknownMode {
                value: value.to_owned(),
            }),
        }
    }
}

impl fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Version-control backed sources that may be combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChangeSources {
    /// Include files staged for commit.
    #[serde(default)]
    pub staged: bool,
    /// Include modified and untracked files.
    #[serde(default)]
    pub modified: bool,
    /// Include files changed between the configured commits.
    #[serde(default)]
    pub commits: bool,
}

/// The reduced, validated file selection for a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum Selection {
    /// Format everything matching the pattern.
    Pattern(String),
    /// Format the union of the selected change sources.
    Changes(ChangeSources),
}

impl Selection {
    /// Reduce a list of requested modes into a single selection.
    ///
    /// Precedence rules:
    /// - no modes selects pattern mode;
    /// - pattern mode must be requested alone;
    /// - staged, modified and commits combine into a union.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::PatternNotExclusive`] when pattern mode is
    /// combined with any other mode.
    pub fn reduce(modes: &[SelectionMode], pattern: Option<&str>) -> Result<Self, SelectionError> {
        let pattern = pattern
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_PATTERN);

        if modes.is_empty() {
            return Ok(Self::Pattern(pattern.to_owned()));
        }

        if modes.contains(&SelectionMode::Pattern) {
            if modes.iter().all(|mode| *mode == SelectionMode::Pattern) {
                return Ok(Self::Pattern(pattern.to_owned()));
            }
            return Err(SelectionError::PatternNotExclusive {
                modes: modes.to_vec(),
            });
        }

        let mut sources = ChangeSources::default();
        for mode in modes {
            match mode {
                SelectionMode::Staged => sources.staged = true,
                SelectionMode::Modified => sources.modified = true,
                SelectionMode::Commits => sources.commits = true,
                SelectionMode::Pattern => {}
            }
        }
        Ok(Self::Changes(sources))
    }

    /// Whether the selection formats everything matching a pattern.
    #[must_use]
    pub const fn is_pattern(&self) -> bool {
        matches!(self, Self::Pattern(_))
    }

    /// Whether commits between two revisions are part of the selection.
    #[must_use]
    pub const fn uses_commits(&self) -> bool {
        matches!(self, Self::Changes(sources) if sources.commits)
    }
}

impl Default for Selection {
    fn default() -> Self {
        Self::Pattern(DEFAULT_PATTERN.to_owned())
    }
}

/// Errors raised while interpreting selection modes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    /// A mode name was not recognised.
    #[error(
        "unknown file selection mode '{value}' \
         (expected pattern, staged, modified or commits)"
    )]
    UnknownMode {
        /// Raw value supplied by the caller.
        value: String,
    },
    /// Pattern mode was combined with other modes.
    #[error("pattern selection cannot be combined with other sources: {}", join_modes(.modes))]
    PatternNotExclusive {
        /// All modes that were requested.
        modes: Vec<SelectionMode>,
    },
}

fn join_modes(modes: &[SelectionMode]) -> String {
    modes
        .iter()
        .map(|mode| mode.as_str())
        .collect::<Vec<_>>()
        .join(",")
}
