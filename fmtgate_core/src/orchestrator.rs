//! Drives the formatter over planned batches, one invocation at a time.

use camino::Utf8PathBuf;
use fmtgate_api::{IncludeBatch, ProcessOutcome, RunOutcome};
use fmtgate_tool_api::{CommandSpec, FormatRequest, FormatTool, Profile};

use crate::process::{ProcessRunner, Timeouts};
use crate::{Error, Result};

/// Invocation settings shared by every batch of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolConfig {
    /// Solution path handed to the formatter, relative to the working directory.
    pub target: String,
    /// Exclude expression applied to every batch.
    pub exclude: Option<String>,
    /// Formatting profile.
    pub profile: Profile,
    /// Extra arguments passed to the formatter unchanged.
    pub passthrough: Vec<String>,
    /// Directory the formatter runs from; `target` is relative to it.
    pub working_dir: Option<Utf8PathBuf>,
    /// Skip the availability probe before the first batch.
    pub skip_probe: bool,
    /// Limits for each batch invocation.
    pub timeouts: Timeouts,
    /// Limits for the availability probe.
    pub probe_timeouts: Timeouts,
}

impl ToolConfig {
    /// Configuration for `target` with default profile and limits.
    #[must_use]
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            exclude: None,
            profile: Profile::default(),
            passthrough: Vec::new(),
            working_dir: None,
            skip_probe: false,
            timeouts: Timeouts::FORMATTER,
            probe_timeouts: Timeouts::PROBE,
        }
    }
}

/// Runs a [`FormatTool`] over include batches with fail-fast semantics.
pub struct FormatOrchestrator<'a> {
    runner: ProcessRunner,
    tool: &'a dyn FormatTool,
    config: &'a ToolConfig,
}

impl<'a> FormatOrchestrator<'a> {
    /// Create an orchestrator for `tool`.
    #[must_use]
    pub fn new(runner: ProcessRunner, tool: &'a dyn FormatTool, config: &'a ToolConfig) -> Self {
        Self {
            runner,
            tool,
            config,
        }
    }

    /// Whether the tool can be launched at all.
    ///
    /// A program that cannot be spawned counts as missing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Wait`] when the probe's status cannot be collected.
    pub fn probe(&self) -> Result<bool> {
        let command = self.tool.probe_command();
        tracing::debug!(tool = self.tool.id(), command = %command, "probing formatter");

        let outcome = self.runner.run(
            &command,
            self.config.probe_timeouts,
            &mut |line| tracing::debug!(target: "fmtgate::tool", "{line}"),
            &mut |line| tracing::debug!(target: "fmtgate::tool", "{line}"),
        );
        match outcome {
            Ok(outcome) => Ok(outcome.success()),
            Err(Error::Spawn { program, source }) => {
                tracing::debug!(%program, error = %source, "formatter could not be started");
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    /// Run every batch in order, stopping at the first failure.
    ///
    /// `on_command` sees each composed command before it is launched.
    ///
    /// # Errors
    ///
    /// Returns an error when the tool rejects a request or a process cannot be
    /// started. Non-zero exits and timeouts are reported as
    /// [`RunOutcome::BatchFailed`].
    pub fn run(
        &self,
        batches: &[IncludeBatch],
        on_command: &mut dyn FnMut(&CommandSpec),
    ) -> Result<RunOutcome> {
        if !self.config.skip_probe && !self.probe()? {
            tracing::error!(tool = self.tool.label(), "formatter is not available");
            return Ok(RunOutcome::ToolNotFound {
                install_hint: self.tool.install_hint(),
            });
        }

        for (index, batch) in batches.iter().enumerate() {
            let outcome = self.run_batch(index, batches.len(), batch, on_command)?;
            if !outcome.success() {
                tracing::error!(
                    batch = index + 1,
                    code = outcome.effective_code(),
                    timed_out = outcome.timed_out,
                    "formatter failed, skipping remaining batches"
                );
                return Ok(RunOutcome::BatchFailed {
                    batch: index,
                    outcome,
                });
            }
        }

        Ok(RunOutcome::Formatted {
            invocations: batches.len(),
        })
    }

    fn run_batch(
        &self,
        index: usize,
        total: usize,
        batch: &IncludeBatch,
        on_command: &mut dyn FnMut(&CommandSpec),
    ) -> Result<ProcessOutcome> {
        let include = batch.expression();
        let request = FormatRequest {
            target: &self.config.target,
            include: &include,
            exclude: self.config.exclude.as_deref(),
            profile: &self.config.profile,
            passthrough: &self.config.passthrough,
        };
        let mut command = self.tool.invocation(&request)?;
        if command.current_dir.is_none() {
            command.current_dir.clone_from(&self.config.working_dir);
        }
        on_command(&command);

        tracing::info!(
            batch = index + 1,
            of = total,
            files = batch.len(),
            "running {}",
            self.tool.label()
        );

        let tool = self.tool;
        let mut saw_marker = false;
        let mut outcome = self.runner.run(
            &command,
            self.config.timeouts,
            &mut |line| tracing::info!(target: "fmtgate::tool", "{line}"),
            &mut |line| {
                if tool.is_nothing_found(line) {
                    saw_marker = true;
                }
                tracing::warn!(target: "fmtgate::tool", "{line}");
            },
        )?;
        outcome.saw_suppression_marker = saw_marker;

        if saw_marker && outcome.exit_code != 0 && !outcome.timed_out {
            tracing::info!(
                batch = index + 1,
                code = outcome.exit_code,
                "formatter found nothing to process, treating as success"
            );
        }
        Ok(outcome)
    }
}
