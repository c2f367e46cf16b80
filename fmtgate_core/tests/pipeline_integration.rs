#![cfg(unix)]

mod common;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use common::Fixture;
use fmtgate_api::{ProcessOutcome, RunOutcome};
use fmtgate_core::cli::Args;
use fmtgate_core::pipeline::Pipeline;
use fmtgate_core::process::Timeouts;
use fmtgate_core::settings::Settings;
use fmtgate_core::Result;
use fmtgate_tool_api::{CommandSpec, FormatRequest, FormatTool, ToolResult};
use fmtgate_tools::CleanupCode;
use tempfile::TempDir;

// Shell script standing in for the formatter. Every invocation appends its
// include expression to `calls.log`; the body runs from the work tree root.
struct FakeFormatter {
    scratch: TempDir,
    probe_code: i32,
    native_patterns: bool,
}

impl FakeFormatter {
    fn new(body: &str) -> Self {
        let scratch = TempDir::new().expect("scratch dir");
        let log = scratch.path().join("calls.log");
        let script = format!("#!/bin/sh\necho \"$2\" >> '{}'\n{body}\n", log.display());
        fs::write(scratch.path().join("format.sh"), script).expect("write script");
        Self {
            scratch,
            probe_code: 0,
            native_patterns: true,
        }
    }

    fn missing(mut self) -> Self {
        self.probe_code = 127;
        self
    }

    fn without_native_patterns(mut self) -> Self {
        self.native_patterns = false;
        self
    }

    fn script(&self) -> PathBuf {
        self.scratch.path().join("format.sh")
    }

    fn calls(&self) -> Vec<String> {
        fs::read_to_string(self.scratch.path().join("calls.log"))
            .map(|log| log.lines().map(str::to_owned).collect())
            .unwrap_or_default()
    }
}

impl FormatTool for FakeFormatter {
    fn id(&self) -> &'static str {
        "fake"
    }

    fn label(&self) -> &'static str {
        "fake formatter"
    }

    fn probe_command(&self) -> CommandSpec {
        CommandSpec::new("sh").args(["-c".to_owned(), format!("exit {}", self.probe_code)])
    }

    fn install_hint(&self) -> String {
        "install the fake formatter".to_owned()
    }

    fn invocation(&self, request: &FormatRequest<'_>) -> ToolResult<CommandSpec> {
        Ok(CommandSpec::new("sh")
            .arg(self.script().display().to_string())
            .args([request.target, request.include]))
    }

    fn is_nothing_found(&self, line: &str) -> bool {
        CleanupCode::default().is_nothing_found(line)
    }

    fn supports_native_patterns(&self) -> bool {
        self.native_patterns
    }
}

fn settings(root: &Path, argv: &[&str]) -> Result<Settings> {
    let args = Args::try_parse_from(
        ["fmtgate", "-s", "App.sln"]
            .into_iter()
            .chain(argv.iter().copied()),
    )
    .expect("valid arguments");
    Settings::from_args(&args, |_| None, root)
}

fn run(fixture: &Fixture, tool: &FakeFormatter, argv: &[&str]) -> Result<RunOutcome> {
    let settings = settings(&fixture.root, argv)?;
    let pipeline = Pipeline::new(&settings)?
        .with_formatter_timeouts(Timeouts::new(Duration::from_secs(30), Duration::from_secs(5)));
    pipeline.run(tool, &mut |_| {})
}

fn solution_fixture() -> Fixture {
    let fixture = Fixture::new();
    fixture.write("App.sln", "\n");
    fixture.write("src/x.cs", "class X {}\n");
    fixture.write("src/y.cs", "class Y {}\n");
    fixture.write("src/z.cs", "class Z {}\n");
    fixture.commit_all("base");
    fixture
}

#[test]
fn commit_range_formats_changed_file_in_one_batch() -> Result<()> {
    let fixture = solution_fixture();
    fixture.write("src/x.cs", "class X { }\n");
    fixture.commit_all("change x");

    let tool = FakeFormatter::new("exit 0");
    let outcome = run(&fixture, &tool, &["-f", "commits", "-a", "", "-b", "HEAD"])?;

    assert_eq!(outcome, RunOutcome::Formatted { invocations: 1 });
    assert_eq!(outcome.exit_code(), 0);
    assert_eq!(tool.calls(), vec!["src/x.cs"]);
    Ok(())
}

#[test]
fn pattern_selection_hands_pattern_to_the_tool() -> Result<()> {
    let fixture = solution_fixture();
    let tool = FakeFormatter::new("exit 0");

    let outcome = run(&fixture, &tool, &["-p", "src/**/*.cs"])?;

    assert_eq!(outcome, RunOutcome::Formatted { invocations: 1 });
    assert_eq!(tool.calls(), vec!["src/**/*.cs"]);
    Ok(())
}

#[test]
fn nothing_staged_skips_the_formatter() -> Result<()> {
    let fixture = solution_fixture();
    let tool = FakeFormatter::new("exit 0");

    let outcome = run(&fixture, &tool, &["-f", "staged", "--fail-on-diff"])?;

    assert_eq!(outcome, RunOutcome::NothingToFormat);
    assert_eq!(outcome.exit_code(), 0);
    assert!(tool.calls().is_empty());
    Ok(())
}

#[test]
fn nothing_found_marker_overrides_failing_exit_code() -> Result<()> {
    let fixture = solution_fixture();
    fixture.write("src/x.cs", "class X { }\n");
    let tool = FakeFormatter::new("echo 'No items were found to cleanup.' >&2\nexit 1");

    let outcome = run(&fixture, &tool, &["-f", "modified"])?;

    assert_eq!(outcome, RunOutcome::Formatted { invocations: 1 });
    assert_eq!(outcome.exit_code(), 0);
    Ok(())
}

#[test]
fn failing_batch_stops_the_run() -> Result<()> {
    let fixture = solution_fixture();
    for path in ["src/x.cs", "src/y.cs", "src/z.cs"] {
        fixture.write(path, "changed\n");
    }
    let tool = FakeFormatter::new("exit 2");

    let outcome = run(&fixture, &tool, &["-f", "modified", "--batch-bytes", "10"])?;

    assert_eq!(
        outcome,
        RunOutcome::BatchFailed {
            batch: 0,
            outcome: ProcessOutcome::exited(2),
        }
    );
    assert_eq!(outcome.exit_code(), 2);
    assert_eq!(tool.calls(), vec!["src/x.cs"]);
    Ok(())
}

#[test]
fn small_budget_splits_files_across_batches() -> Result<()> {
    let fixture = solution_fixture();
    for path in ["src/x.cs", "src/y.cs", "src/z.cs"] {
        fixture.write(path, "changed\n");
    }
    let tool = FakeFormatter::new("exit 0");

    let outcome = run(&fixture, &tool, &["-f", "modified", "--batch-bytes", "17"])?;

    assert_eq!(outcome, RunOutcome::Formatted { invocations: 2 });
    assert_eq!(tool.calls(), vec!["src/x.cs;src/y.cs", "src/z.cs"]);
    Ok(())
}

#[test]
fn max_runs_falls_back_to_one_full_run() -> Result<()> {
    let fixture = solution_fixture();
    for path in ["src/x.cs", "src/y.cs", "src/z.cs"] {
        fixture.write(path, "changed\n");
    }
    let tool = FakeFormatter::new("exit 0");

    let outcome = run(
        &fixture,
        &tool,
        &["-f", "modified", "--batch-bytes", "10", "-m", "1"],
    )?;

    assert_eq!(outcome, RunOutcome::Formatted { invocations: 1 });
    assert_eq!(tool.calls(), vec!["**/*"]);
    Ok(())
}

#[test]
fn formatter_changes_to_staged_files_are_reported() -> Result<()> {
    let fixture = solution_fixture();
    fixture.write("src/x.cs", "class X{}\n");
    fixture.stage("src/x.cs");
    fixture.write("src/y.cs", "unrelated edit\n");

    let tool = FakeFormatter::new("printf 'class X { }\\n' > src/x.cs");
    let outcome = run(&fixture, &tool, &["-f", "staged", "--fail-on-diff"])?;

    let RunOutcome::DiffDetected(report) = outcome else {
        panic!("expected a diff, got {outcome:?}");
    };
    assert_eq!(report.files.iter().collect::<Vec<_>>(), vec!["src/x.cs"]);
    assert_eq!(fixture.read("src/x.cs"), "class X { }\n");
    Ok(())
}

#[test]
fn clean_formatting_passes_the_diff_check() -> Result<()> {
    let fixture = solution_fixture();
    fixture.write("src/x.cs", "class X { }\n");
    fixture.stage("src/x.cs");

    let tool = FakeFormatter::new("exit 0");
    let outcome = run(&fixture, &tool, &["-f", "staged", "--fail-on-diff"])?;

    assert_eq!(outcome, RunOutcome::Formatted { invocations: 1 });
    Ok(())
}

#[test]
fn expanded_pattern_run_checks_the_whole_work_tree() -> Result<()> {
    let fixture = solution_fixture();
    let tool =
        FakeFormatter::new("printf 'touched\\n' >> App.sln").without_native_patterns();

    let outcome = run(&fixture, &tool, &["-p", "src/*.cs", "--fail-on-diff"])?;

    assert_eq!(tool.calls(), vec!["src/x.cs;src/y.cs;src/z.cs"]);
    let RunOutcome::DiffDetected(report) = outcome else {
        panic!("expected a diff, got {outcome:?}");
    };
    assert_eq!(report.files.iter().collect::<Vec<_>>(), vec!["App.sln"]);
    Ok(())
}

#[test]
fn missing_formatter_reports_install_hint() -> Result<()> {
    let fixture = solution_fixture();
    let tool = FakeFormatter::new("exit 0").missing();

    let outcome = run(&fixture, &tool, &[])?;

    assert_eq!(
        outcome,
        RunOutcome::ToolNotFound {
            install_hint: "install the fake formatter".to_owned()
        }
    );
    assert_eq!(outcome.exit_code(), 1);
    assert!(tool.calls().is_empty());
    Ok(())
}

#[test]
fn skip_tool_check_bypasses_the_probe() -> Result<()> {
    let fixture = solution_fixture();
    let tool = FakeFormatter::new("exit 0").missing();

    let outcome = run(&fixture, &tool, &["--skip-tool-check"])?;

    assert_eq!(outcome, RunOutcome::Formatted { invocations: 1 });
    Ok(())
}
