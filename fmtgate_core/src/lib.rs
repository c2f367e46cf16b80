//! Core library for fmtgate's batch formatting workflow.
//!
//! The crate is layered around four responsibilities:
//! - resolving the files in scope from git state
//! - packing those files into size-bounded include expressions
//! - driving the external formatter one batch at a time under dual timeouts
//! - verifying that no formatting differences remain afterwards

#![warn(
    clippy::all,
    clippy::cargo,
    clippy::nursery,
    clippy::pedantic,
    missing_docs
)]
#![cfg_attr(
    not(test),
    deny(
        clippy::dbg_macro,
        clippy::expect_used,
        clippy::panic,
        clippy::print_stderr,
        clippy::print_stdout,
        clippy::todo,
        clippy::unwrap_used
    )
)]

/// Include-expression batch planning.
pub mod batch;
/// Command-line argument definitions.
pub mod cli;
/// File set resolution from git state.
pub mod files;
/// Bounded search for the solution file.
pub mod locate;
/// Sequential formatter invocation with exit-code reinterpretation.
pub mod orchestrator;
/// Relative path helpers shared by planning and configuration.
pub mod paths;
/// End-to-end run sequencing.
pub mod pipeline;
/// External process execution with dual timeouts.
pub mod process;
/// Git repository discovery and queries.
pub mod repository;
/// Validated run configuration.
pub mod settings;
/// Post-run diff verification.
pub mod verify;

pub use settings::ConfigError;

/// Common result type for the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the core library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid or incomplete configuration; nothing was formatted.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Underlying libgit2 operation failed.
    #[error("git error: {source}")]
    Git {
        /// Original libgit2 error.
        #[from]
        source: git2::Error,
    },
    /// Provided path does not correspond to a git repository.
    #[error("path does not reference a git repository: {path}")]
    NotARepository {
        /// Path that failed to resolve to a repository.
        path: String,
    },
    /// Bare repositories have no working tree to format.
    #[error("repository at {path} is bare and unsupported")]
    BareRepository {
        /// Path of the repository lacking a working tree.
        path: String,
    },
    /// A path could not be represented as UTF-8.
    #[error("path is not valid UTF-8: {path}")]
    NonUtf8Path {
        /// Lossy rendering of the offending path.
        path: String,
    },
    /// Filesystem interaction failed.
    #[error("failed to access {path}: {source}")]
    Io {
        /// Filesystem path involved in the failed operation.
        path: String,
        /// Source I/O error returned by the standard library.
        #[source]
        source: std::io::Error,
    },
    /// An external process could not be started.
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// Source I/O error returned by the operating system.
        #[source]
        source: std::io::Error,
    },
    /// Waiting on an external process failed.
    #[error("failed waiting on {program}: {source}")]
    Wait {
        /// Program being waited on.
        program: String,
        /// Source I/O error returned by the operating system.
        #[source]
        source: std::io::Error,
    },
    /// A git query exited unsuccessfully or timed out.
    #[error("failed to run git command `git {args}` (exit code {code})")]
    GitCommand {
        /// Arguments passed to git.
        args: String,
        /// Exit code reported for the query.
        code: i32,
    },
    /// An include pattern could not be expanded.
    #[error("invalid file pattern '{pattern}': {source}")]
    Pattern {
        /// Pattern supplied by the caller.
        pattern: String,
        /// Parse error reported by the glob matcher.
        #[source]
        source: glob::PatternError,
    },
    /// The formatter integration rejected a request.
    #[error(transparent)]
    Tool(#[from] fmtgate_tool_api::ToolError),
}
