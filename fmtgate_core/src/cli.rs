use std::path::PathBuf;

use clap::Parser;

use crate::batch::DEFAULT_BUDGET_BYTES;

/// Format git-selected files with ReSharper `cleanupcode`, in batches that
/// fit the command-line limit, and optionally fail when a diff remains.
#[derive(Debug, Clone, Parser)]
#[command(name = "fmtgate", version, about, long_about = None)]
pub struct Args {
    /// Path to the .sln file. Defaults to the first one found near the
    /// current directory.
    #[arg(short = 's', long)]
    pub solution_file: Option<PathBuf>,

    /// Files to format: pattern, staged, modified or commits. Combine
    /// sources with commas, e.g. `staged,modified`. Default is pattern.
    #[arg(short = 'f', long, value_delimiter = ',')]
    pub files_to_format: Vec<String>,

    /// Only files matching this pattern are formatted. Default is `**/*`.
    #[arg(short = 'p', long)]
    pub pattern: Option<String>,

    /// Partial or full hash for commit A.
    #[arg(short = 'a', long)]
    pub commit_a: Option<String>,

    /// Partial or full hash for commit B.
    #[arg(short = 'b', long)]
    pub commit_b: Option<String>,

    /// Maximum number of formatter runs. When more batches are needed a
    /// single full run is performed instead.
    #[arg(short = 'm', long)]
    pub max_runs: Option<usize>,

    /// Argument passed through to `jb cleanupcode`. Repeatable, e.g.
    /// `--jb -d --jb --toolset=12.0`.
    #[arg(long = "jb", value_name = "ARG", allow_hyphen_values = true)]
    pub jb_args: Vec<String>,

    /// Profile passed to `jb cleanupcode` as `--profile`.
    #[arg(long, conflicts_with = "format_only")]
    pub jb_profile: Option<String>,

    /// Only reformat instead of running a full cleanup.
    #[arg(long)]
    pub format_only: bool,

    /// Exit non-zero when formatting leaves a diff behind.
    #[arg(long)]
    pub fail_on_diff: bool,

    /// Skip the check that the jb tool is installed.
    #[arg(long)]
    pub skip_tool_check: bool,

    /// Call jb with `dotnet tool run jb` instead of `dotnet jb`.
    #[arg(long)]
    pub long_form: bool,

    /// CI preset: format files changed between GIT_PREVIOUS_SUCCESSFUL_COMMIT
    /// and GIT_COMMIT and fail on diff.
    #[arg(long)]
    pub jenkins: bool,

    /// Use HEAD when a configured commit does not exist.
    #[arg(long)]
    pub assume_head: bool,

    /// Use the globally installed jb tool.
    #[arg(short = 'g', long)]
    pub use_global: bool,

    /// Print the full diff when fail-on-diff triggers.
    #[arg(long)]
    pub print_diff: bool,

    /// Print the command that fixes formatting when fail-on-diff triggers.
    #[arg(long)]
    pub print_fix: bool,

    /// Print each formatter command before running it.
    #[arg(long)]
    pub print_command: bool,

    /// Exclude file types handled by prettier.
    #[arg(long)]
    pub prettier: bool,

    /// Byte budget for one include expression.
    #[arg(long, default_value_t = DEFAULT_BUDGET_BYTES)]
    pub batch_bytes: usize,

    /// Enable debug logging.
    #[arg(long)]
    pub verbose: bool,
}
