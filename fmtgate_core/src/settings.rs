//! Folds command-line arguments and the environment into one validated,
//! immutable run configuration.

use std::path::{Path, PathBuf};

use camino::{Utf8Path, Utf8PathBuf};
use fmtgate_api::{CommitRange, Selection, SelectionError, SelectionMode};
use fmtgate_tool_api::Profile;
use fmtgate_tools::{prettier_exclude, Launcher};

use crate::cli::Args;
use crate::locate::{find_solution, SearchError, SearchLimits};
use crate::paths::{canonical_utf8, relative_to};
use crate::Result;

/// Previous successful commit exported by Jenkins.
pub const PREVIOUS_COMMIT_ENV: &str = "GIT_PREVIOUS_SUCCESSFUL_COMMIT";
/// Commit being built, exported by Jenkins.
pub const CURRENT_COMMIT_ENV: &str = "GIT_COMMIT";

const JENKINS_FLAG: &str = "--jenkins";

/// Invalid or incomplete configuration detected before any formatting.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Pattern selection was combined with another source.
    #[error("pattern can't be combined with other sources (got {modes})")]
    PatternNotExclusive {
        /// Requested modes, comma separated.
        modes: String,
    },
    /// A selection mode name was not recognised.
    #[error("unknown files-to-format value '{value}'")]
    UnknownSelectionMode {
        /// Raw value supplied by the caller.
        value: String,
    },
    /// Commits were selected but neither endpoint was supplied.
    #[error("commit selection requires --commit-a or --commit-b")]
    EmptyCommitRange,
    /// The configured solution file does not exist.
    #[error("specified sln file does not exist: {path}")]
    MissingSolution {
        /// Path as given by the caller.
        path: String,
    },
    /// No solution file was configured and none could be found.
    #[error(transparent)]
    SolutionNotFound(#[from] SearchError),
    /// A custom profile and format-only were both requested.
    #[error("--jb-profile cannot be combined with --format-only")]
    ConflictingProfile,
}

impl From<SelectionError> for ConfigError {
    fn from(err: SelectionError) -> Self {
        match err {
            SelectionError::UnknownMode { value } => Self::UnknownSelectionMode { value },
            SelectionError::PatternNotExclusive { modes } => Self::PatternNotExclusive {
                modes: modes
                    .iter()
                    .map(|mode| mode.as_str())
                    .collect::<Vec<_>>()
                    .join(","),
            },
        }
    }
}

/// Validated configuration for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Which files to format.
    pub selection: Selection,
    /// Commit endpoints for commit selections.
    pub range: CommitRange,
    /// Replace unknown commit endpoints with `HEAD`.
    pub assume_head: bool,
    /// Canonical directory the run was started from.
    pub working_dir: Utf8PathBuf,
    /// Solution path relative to `working_dir`, as handed to the formatter.
    pub solution: String,
    /// Canonical directory containing the solution.
    pub tool_root: Utf8PathBuf,
    /// Exclude expression applied to every batch.
    pub exclude: Option<String>,
    /// Formatting profile.
    pub profile: Profile,
    /// Extra formatter arguments.
    pub passthrough: Vec<String>,
    /// How the formatter is launched.
    pub launcher: Launcher,
    /// Skip the formatter availability probe.
    pub skip_probe: bool,
    /// Fall back to one full run when more batches would be needed.
    pub max_runs: Option<usize>,
    /// Byte budget for one include expression.
    pub budget_bytes: usize,
    /// Fail when targeted files still differ after formatting.
    pub fail_on_diff: bool,
    /// Print the full diff on failure.
    pub print_diff: bool,
    /// Print the fix command on failure.
    pub print_fix: bool,
    /// Print each formatter command before it runs.
    pub print_command: bool,
}

impl Settings {
    /// Build settings from parsed arguments.
    ///
    /// `env` looks up environment variables; `cwd` is the directory relative
    /// paths are resolved against.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Config`] for invalid combinations or a missing
    /// solution, and [`crate::Error::Io`] when paths cannot be resolved.
    pub fn from_args(
        args: &Args,
        env: impl Fn(&str) -> Option<String>,
        cwd: &Path,
    ) -> Result<Self> {
        let working_dir = canonical_utf8(cwd)?;

        let mut modes = args
            .files_to_format
            .iter()
            .map(|value| value.parse::<SelectionMode>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(ConfigError::from)?;
        let mut range = CommitRange::new(args.commit_a.as_deref(), args.commit_b.as_deref());
        let mut assume_head = args.assume_head;
        let mut fail_on_diff = args.fail_on_diff;
        let mut print_diff = args.print_diff;
        let mut print_fix = args.print_fix;

        if args.jenkins {
            modes = vec![SelectionMode::Commits];
            range = CommitRange::new(
                args.commit_a.clone().or_else(|| env(PREVIOUS_COMMIT_ENV)),
                args.commit_b.clone().or_else(|| env(CURRENT_COMMIT_ENV)),
            );
            assume_head = true;
            fail_on_diff = true;
            print_diff = true;
            print_fix = true;
        }

        let selection =
            Selection::reduce(&modes, args.pattern.as_deref()).map_err(ConfigError::from)?;
        if selection.uses_commits() && range.is_empty() {
            return Err(ConfigError::EmptyCommitRange.into());
        }

        let profile = match (&args.jb_profile, args.format_only) {
            (Some(_), true) => return Err(ConfigError::ConflictingProfile.into()),
            (Some(name), false) => Profile::Custom(name.clone()),
            (None, true) => Profile::FormatOnly,
            (None, false) => Profile::FullCleanup,
        };

        let launcher = if args.use_global {
            Launcher::Global
        } else if args.long_form {
            Launcher::DotnetToolRun
        } else {
            Launcher::DotnetLocal
        };

        let solution_path = locate_solution(args.solution_file.as_deref(), &working_dir)?;
        let solution_path = canonical_utf8(&solution_path)?;
        let tool_root = solution_path
            .parent()
            .map_or_else(|| working_dir.clone(), Utf8Path::to_path_buf);
        let solution = relative_to(&solution_path, &working_dir);

        Ok(Self {
            selection,
            range,
            assume_head,
            working_dir,
            solution,
            tool_root,
            exclude: args.prettier.then(prettier_exclude),
            profile,
            passthrough: args.jb_args.clone(),
            launcher,
            skip_probe: args.skip_tool_check,
            max_runs: args.max_runs,
            budget_bytes: args.batch_bytes,
            fail_on_diff,
            print_diff,
            print_fix,
            print_command: args.print_command,
        })
    }
}

fn locate_solution(configured: Option<&Path>, working_dir: &Utf8Path) -> Result<PathBuf> {
    if let Some(path) = configured {
        let full = working_dir.as_std_path().join(path);
        if !full.is_file() {
            return Err(ConfigError::MissingSolution {
                path: path.display().to_string(),
            }
            .into());
        }
        return Ok(full);
    }

    tracing::info!("no sln file specified, searching for one");
    let found = find_solution(working_dir.as_std_path(), SearchLimits::default())
        .map_err(ConfigError::from)?;
    tracing::info!(solution = %found, "using solution file");
    Ok(found.into_std_path_buf())
}

/// Command line that reproduces a run without the CI preset.
///
/// `--jenkins` is replaced by the explicit commit selection it stands for.
#[must_use]
pub fn fix_command(argv: &[String], env: impl Fn(&str) -> Option<String>) -> String {
    let mut parts = vec!["fmtgate".to_owned()];
    for arg in argv.iter().skip(1) {
        if arg == JENKINS_FLAG {
            let from = env(PREVIOUS_COMMIT_ENV).unwrap_or_default();
            let to = env(CURRENT_COMMIT_ENV).unwrap_or_default();
            parts.push(format!("-f commits -a {from} -b {to}"));
        } else {
            parts.push(arg.clone());
        }
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use fmtgate_api::ChangeSources;
    use tempfile::TempDir;

    use crate::Error;

    struct Workspace {
        dir: TempDir,
    }

    impl Workspace {
        fn with_solution() -> Self {
            let dir = TempDir::new().expect("tempdir");
            std::fs::create_dir_all(dir.path().join("src")).expect("dirs");
            std::fs::write(dir.path().join("src/App.sln"), "").expect("sln");
            Self { dir }
        }

        fn settings(&self, argv: &[&str]) -> Result<Settings> {
            self.settings_with_env(argv, |_| None)
        }

        fn settings_with_env(
            &self,
            argv: &[&str],
            env: impl Fn(&str) -> Option<String>,
        ) -> Result<Settings> {
            let args = Args::try_parse_from(std::iter::once("fmtgate").chain(argv.iter().copied()))
                .expect("valid arguments");
            Settings::from_args(&args, env, self.dir.path())
        }
    }

    fn jenkins_env(key: &str) -> Option<String> {
        match key {
            PREVIOUS_COMMIT_ENV => Some("abc123".to_owned()),
            CURRENT_COMMIT_ENV => Some("def456".to_owned()),
            _ => None,
        }
    }

    #[test]
    fn defaults_select_everything_with_full_cleanup() {
        let workspace = Workspace::with_solution();
        let settings = workspace.settings(&[]).expect("settings");

        assert_eq!(settings.selection, Selection::Pattern("**/*".to_owned()));
        assert_eq!(settings.profile, Profile::FullCleanup);
        assert_eq!(settings.launcher, Launcher::DotnetLocal);
        assert_eq!(settings.solution, "src/App.sln");
        assert!(settings.tool_root.ends_with("src"));
        assert_eq!(settings.exclude, None);
    }

    #[test]
    fn explicit_solution_is_resolved_against_cwd() {
        let workspace = Workspace::with_solution();
        let settings = workspace
            .settings(&["-s", "src/App.sln"])
            .expect("settings");
        assert_eq!(settings.solution, "src/App.sln");
    }

    #[test]
    fn missing_solution_is_rejected() {
        let workspace = Workspace::with_solution();
        let err = workspace.settings(&["-s", "Other.sln"]).expect_err("missing");
        assert!(matches!(
            err,
            Error::Config(ConfigError::MissingSolution { .. })
        ));
    }

    #[test]
    fn pattern_with_other_modes_is_rejected() {
        let workspace = Workspace::with_solution();
        let err = workspace
            .settings(&["-f", "pattern,staged"])
            .expect_err("conflict");
        assert!(matches!(
            err,
            Error::Config(ConfigError::PatternNotExclusive { .. })
        ));
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let workspace = Workspace::with_solution();
        let err = workspace.settings(&["-f", "everything"]).expect_err("unknown");
        assert!(matches!(
            err,
            Error::Config(ConfigError::UnknownSelectionMode { ref value }) if value == "everything"
        ));
    }

    #[test]
    fn commits_without_endpoints_are_rejected() {
        let workspace = Workspace::with_solution();
        let err = workspace.settings(&["-f", "commits"]).expect_err("empty range");
        assert!(matches!(err, Error::Config(ConfigError::EmptyCommitRange)));
    }

    #[test]
    fn change_sources_combine() {
        let workspace = Workspace::with_solution();
        let settings = workspace
            .settings(&["-f", "staged,Modified"])
            .expect("settings");
        assert_eq!(
            settings.selection,
            Selection::Changes(ChangeSources {
                staged: true,
                modified: true,
                commits: false,
            })
        );
    }

    #[test]
    fn jenkins_preset_reads_commits_from_environment() {
        let workspace = Workspace::with_solution();
        let settings = workspace
            .settings_with_env(&["--jenkins"], jenkins_env)
            .expect("settings");

        assert!(settings.selection.uses_commits());
        assert_eq!(settings.range, CommitRange::new(Some("abc123"), Some("def456")));
        assert!(settings.assume_head);
        assert!(settings.fail_on_diff);
        assert!(settings.print_diff);
        assert!(settings.print_fix);
    }

    #[test]
    fn explicit_commits_win_over_jenkins_environment() {
        let workspace = Workspace::with_solution();
        let settings = workspace
            .settings_with_env(&["--jenkins", "-a", "HEAD~3"], jenkins_env)
            .expect("settings");
        assert_eq!(settings.range, CommitRange::new(Some("HEAD~3"), Some("def456")));
    }

    #[test]
    fn profile_and_launcher_options_are_mapped() {
        let workspace = Workspace::with_solution();
        let settings = workspace
            .settings(&["--format-only", "--long-form", "--prettier"])
            .expect("settings");
        assert_eq!(settings.profile, Profile::FormatOnly);
        assert_eq!(settings.launcher, Launcher::DotnetToolRun);
        assert_eq!(settings.exclude, Some(prettier_exclude()));

        let settings = workspace
            .settings(&["--jb-profile", "Team", "-g"])
            .expect("settings");
        assert_eq!(settings.profile, Profile::Custom("Team".to_owned()));
        assert_eq!(settings.launcher, Launcher::Global);
    }

    #[test]
    fn fix_command_expands_jenkins_preset() {
        let argv: Vec<String> = ["fmtgate", "--jenkins", "--format-only"]
            .iter()
            .map(|arg| (*arg).to_owned())
            .collect();
        assert_eq!(
            fix_command(&argv, jenkins_env),
            "fmtgate -f commits -a abc123 -b def456 --format-only"
        );
    }

    #[test]
    fn fix_command_keeps_plain_arguments() {
        let argv: Vec<String> = ["fmtgate", "-f", "staged"]
            .iter()
            .map(|arg| (*arg).to_owned())
            .collect();
        assert_eq!(fix_command(&argv, |_| None), "fmtgate -f staged");
    }
}
