//! `fmtgate` command-line entry point.

#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

use std::env;

use anyhow::{Context, Result};
use clap::Parser;
use fmtgate_api::RunOutcome;
use fmtgate_core::cli::Args;
use fmtgate_core::pipeline::Pipeline;
use fmtgate_core::settings::{fix_command, Settings};
use fmtgate_tools::CleanupCode;
use tracing_subscriber::EnvFilter;

fn main() {
    let args = Args::parse();
    if let Err(err) = init_tracing(args.verbose) {
        eprintln!("failed to initialise logging: {err}");
    }

    let code = match run(&args) {
        Ok(code) => code,
        Err(err) => {
            tracing::error!("{err:#}");
            1
        }
    };
    std::process::exit(code);
}

fn init_tracing(verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().or_else(|_| {
        EnvFilter::try_new(format!("fmtgate_core={level},fmtgate={level}"))
    })?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(verbose)
        .try_init()
        .map_err(|err| anyhow::anyhow!(err))
}

fn run(args: &Args) -> Result<i32> {
    let cwd = env::current_dir().context("failed to read the current directory")?;
    let settings = Settings::from_args(args, |key| env::var(key).ok(), &cwd)
        .context("invalid configuration")?;
    let tool = CleanupCode::new(settings.launcher);
    let pipeline = Pipeline::new(&settings)?;

    let print_command = settings.print_command;
    let outcome = pipeline.run(&tool, &mut |command| {
        if print_command {
            println!("{command}");
        }
    })?;

    report(&settings, &pipeline, &outcome)?;
    Ok(outcome.exit_code())
}

fn report(settings: &Settings, pipeline: &Pipeline<'_>, outcome: &RunOutcome) -> Result<()> {
    match outcome {
        RunOutcome::Formatted { invocations } => {
            tracing::info!(invocations, "formatting finished");
        }
        RunOutcome::NothingToFormat | RunOutcome::BatchFailed { .. } => {}
        RunOutcome::ToolNotFound { install_hint } => {
            println!();
            println!("{install_hint}");
        }
        RunOutcome::DiffDetected(report) => {
            println!();
            println!("!!!! Process Aborted !!!!");
            println!("The following files do not match .editorconfig:");
            for path in report.files.iter() {
                println!(" * {path}");
            }

            if settings.print_diff {
                pipeline
                    .git()
                    .stream_diff(&mut |line| println!("{line}"))
                    .context("failed to print the diff")?;
            }

            if settings.print_fix {
                let argv: Vec<String> = env::args().collect();
                println!();
                println!("Run the following command to fix formatting:");
                println!();
                println!("    {}", fix_command(&argv, |key| env::var(key).ok()));
                println!();
            }
        }
    }
    Ok(())
}
