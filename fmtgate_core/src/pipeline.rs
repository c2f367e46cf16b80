//! Sequences one run: resolve files, plan batches, format, verify.

use fmtgate_api::{FileSet, IncludeBatch, RunOutcome, Selection, DEFAULT_PATTERN};
use fmtgate_tool_api::{CommandSpec, FormatTool};

use crate::batch::{plan, PathRewrite};
use crate::files::{FileSelection, FileSetResolver};
use crate::orchestrator::{FormatOrchestrator, ToolConfig};
use crate::process::{ProcessRunner, Timeouts};
use crate::repository::{Git, Repository};
use crate::settings::Settings;
use crate::verify::DiffVerifier;
use crate::Result;

/// A configured run bound to the repository it operates on.
#[derive(Debug)]
pub struct Pipeline<'a> {
    settings: &'a Settings,
    runner: ProcessRunner,
    repository: Repository,
    git: Git,
    formatter_timeouts: Timeouts,
}

impl<'a> Pipeline<'a> {
    /// Discover the repository enclosing the configured working directory.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::NotARepository`] outside a git work tree.
    pub fn new(settings: &'a Settings) -> Result<Self> {
        let runner = ProcessRunner::new();
        let repository = Repository::discover(&settings.working_dir)?;
        let git = Git::new(runner, &repository);
        tracing::debug!(root = %repository.root(), "discovered repository");

        Ok(Self {
            settings,
            runner,
            repository,
            git,
            formatter_timeouts: Timeouts::FORMATTER,
        })
    }

    /// Override the limits applied to each formatter batch.
    #[must_use]
    pub const fn with_formatter_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.formatter_timeouts = timeouts;
        self
    }

    /// Git helper rooted at the discovered work tree.
    #[must_use]
    pub const fn git(&self) -> &Git {
        &self.git
    }

    /// Execute the run with `tool`.
    ///
    /// `on_command` sees each formatter command before it is launched.
    ///
    /// # Errors
    ///
    /// Returns an error for configuration problems detected while resolving
    /// files, failed git queries and formatter spawn failures. Formatter
    /// failures and remaining diffs are reported through [`RunOutcome`].
    pub fn run(
        &self,
        tool: &dyn FormatTool,
        on_command: &mut dyn FnMut(&CommandSpec),
    ) -> Result<RunOutcome> {
        let settings = self.settings;
        let selection = FileSetResolver::new(&self.git)
            .assume_head(settings.assume_head)
            .native_patterns(tool.supports_native_patterns())
            .resolve(&settings.selection, &settings.range)?;

        // Pattern runs format everything they match, so the diff check is not
        // narrowed even when the pattern was expanded into files here.
        let pattern_run = matches!(settings.selection, Selection::Pattern(_));
        let (batches, targeted) = match selection {
            FileSelection::Pattern(pattern) => (vec![IncludeBatch::pattern(pattern)], None),
            FileSelection::Files(files) if files.is_empty() => {
                tracing::info!("Nothing to format.");
                return Ok(RunOutcome::NothingToFormat);
            }
            FileSelection::Files(files) => {
                let batches = self.plan(&files);
                (batches, (!pattern_run).then_some(files))
            }
        };

        let config = self.tool_config();
        let outcome =
            FormatOrchestrator::new(self.runner, tool, &config).run(&batches, on_command)?;
        if !matches!(outcome, RunOutcome::Formatted { .. }) || !settings.fail_on_diff {
            return Ok(outcome);
        }

        let report = DiffVerifier::new(&self.git).verify(targeted.as_ref())?;
        if report.is_clean() {
            Ok(outcome)
        } else {
            Ok(RunOutcome::DiffDetected(report))
        }
    }

    fn plan(&self, files: &FileSet) -> Vec<IncludeBatch> {
        let settings = self.settings;
        let rewrite = PathRewrite::new(self.repository.root(), settings.tool_root.clone());
        let batches = plan(files, settings.budget_bytes, &rewrite);

        match settings.max_runs {
            Some(max_runs) if batches.len() > max_runs => {
                tracing::info!(
                    batches = batches.len(),
                    max_runs,
                    "too many batches, running one full cleanup instead"
                );
                vec![IncludeBatch::pattern(DEFAULT_PATTERN)]
            }
            _ => batches,
        }
    }

    fn tool_config(&self) -> ToolConfig {
        let settings = self.settings;
        ToolConfig {
            exclude: settings.exclude.clone(),
            profile: settings.profile.clone(),
            passthrough: settings.passthrough.clone(),
            working_dir: Some(settings.working_dir.clone()),
            skip_probe: settings.skip_probe,
            timeouts: self.formatter_timeouts,
            ..ToolConfig::new(settings.solution.clone())
        }
    }
}
