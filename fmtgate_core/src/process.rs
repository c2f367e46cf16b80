//! Runs external commands while streaming their output line by line.
//!
//! Two reader threads drain stdout and stderr and a waiter thread owns the
//! child. All three report over one channel, so callbacks run on the calling
//! thread and never need to be `Send`. The total timeout bounds the child's
//! lifetime; after it exits both streams must close within the inactivity
//! timeout.

use std::io::{BufRead, BufReader, Read};
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use fmtgate_api::{ProcessOutcome, FAILURE_EXIT_CODE};
use fmtgate_tool_api::CommandSpec;
use wait_timeout::ChildExt;

use crate::{Error, Result};

// Extra time granted to the waiter thread to kill and reap a child after the
// total timeout has fired.
const KILL_GRACE: Duration = Duration::from_secs(5);

/// Pair of wall-clock limits applied to one process run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Upper bound on the process lifetime, measured from launch.
    pub total: Duration,
    /// How long each output stream may stay open after the process exits.
    pub inactivity: Duration,
}

impl Timeouts {
    /// Limits for git queries.
    pub const GIT: Self = Self {
        total: Duration::from_secs(10 * 60),
        inactivity: Duration::from_secs(10 * 60),
    };

    /// Limits for a formatter batch: large code bases can take hours, but a
    /// single file should never hold the output open for long.
    pub const FORMATTER: Self = Self {
        total: Duration::from_secs(24 * 60 * 60),
        inactivity: Duration::from_secs(10 * 60),
    };

    /// Limits for the formatter availability probe.
    pub const PROBE: Self = Self {
        total: Duration::from_secs(2 * 60),
        inactivity: Duration::from_secs(60),
    };

    /// Construct explicit limits.
    #[must_use]
    pub const fn new(total: Duration, inactivity: Duration) -> Self {
        Self { total, inactivity }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stream {
    Stdout,
    Stderr,
}

impl Stream {
    const fn index(self) -> usize {
        match self {
            Self::Stdout => 0,
            Self::Stderr => 1,
        }
    }
}

#[derive(Debug)]
enum Event {
    Line(Stream, String),
    Closed(Stream),
    Exited(Option<i32>),
    ExitTimedOut,
    WaitFailed(std::io::Error),
}

/// Launches external commands and enforces the dual timeout.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    /// Create a runner.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Run `command`, delivering each output line to the matching callback.
    ///
    /// Returns the real exit code on normal completion. When the process does
    /// not exit within `timeouts.total`, or a stream stays open longer than
    /// `timeouts.inactivity` after exit, the outcome is marked as timed out
    /// with exit code 1. The direct child is killed when the total timeout
    /// fires; descendants holding the pipes open are abandoned.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Spawn`] when the program cannot be started and
    /// [`Error::Wait`] when the operating system fails to report its status.
    pub fn run(
        &self,
        command: &CommandSpec,
        timeouts: Timeouts,
        on_stdout: &mut dyn FnMut(&str),
        on_stderr: &mut dyn FnMut(&str),
    ) -> Result<ProcessOutcome> {
        let mut process = Command::new(&command.program);
        process
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &command.current_dir {
            process.current_dir(dir);
        }

        tracing::debug!(command = %command.display(), "spawning process");
        let started = Instant::now();
        let mut child = process.spawn().map_err(|source| Error::Spawn {
            program: command.program.clone(),
            source,
        })?;

        let (tx, rx) = mpsc::channel();
        let mut open = [false, false];
        if let Some(stdout) = child.stdout.take() {
            spawn_reader(Stream::Stdout, stdout, tx.clone());
            open[Stream::Stdout.index()] = true;
        }
        if let Some(stderr) = child.stderr.take() {
            spawn_reader(Stream::Stderr, stderr, tx.clone());
            open[Stream::Stderr.index()] = true;
        }

        let total = timeouts.total;
        thread::spawn(move || {
            let event = match child.wait_timeout(total) {
                Ok(Some(status)) => Event::Exited(status.code()),
                Ok(None) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    Event::ExitTimedOut
                }
                Err(err) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    Event::WaitFailed(err)
                }
            };
            let _ = tx.send(event);
        });

        let mut exit: Option<(Instant, Option<i32>)> = None;
        loop {
            if let Some((_, code)) = exit {
                if open.iter().all(|stream_open| !stream_open) {
                    return Ok(ProcessOutcome::exited(exit_code(command, code)));
                }
            }

            let deadline = match exit {
                Some((exited_at, _)) => exited_at + timeouts.inactivity,
                None => started + total + KILL_GRACE,
            };
            let remaining = deadline.saturating_duration_since(Instant::now());

            match rx.recv_timeout(remaining) {
                Ok(Event::Line(Stream::Stdout, line)) => on_stdout(&line),
                Ok(Event::Line(Stream::Stderr, line)) => on_stderr(&line),
                Ok(Event::Closed(stream)) => open[stream.index()] = false,
                Ok(Event::Exited(code)) => exit = Some((Instant::now(), code)),
                Ok(Event::ExitTimedOut) => {
                    tracing::warn!(
                        program = %command.program,
                        timeout_secs = total.as_secs(),
                        "process timed out"
                    );
                    return Ok(ProcessOutcome::timed_out());
                }
                Ok(Event::WaitFailed(source)) => {
                    return Err(Error::Wait {
                        program: command.program.clone(),
                        source,
                    });
                }
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => {
                    tracing::warn!(
                        program = %command.program,
                        exited = exit.is_some(),
                        "process timed out waiting for output to finish"
                    );
                    return Ok(ProcessOutcome::timed_out());
                }
            }
        }
    }
}

fn exit_code(command: &CommandSpec, code: Option<i32>) -> i32 {
    code.unwrap_or_else(|| {
        tracing::warn!(program = %command.program, "process terminated by signal");
        FAILURE_EXIT_CODE
    })
}

fn spawn_reader<R>(stream: Stream, reader: R, tx: Sender<Event>)
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut reader = BufReader::new(reader);
        let mut buffer = Vec::new();
        loop {
            buffer.clear();
            match reader.read_until(b'\n', &mut buffer) {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buffer);
                    let line = line.trim_end_matches(&['\r', '\n'][..]).to_owned();
                    if tx.send(Event::Line(stream, line)).is_err() {
                        return;
                    }
                }
                Err(err) => {
                    tracing::debug!(?stream, error = %err, "stopped reading process output");
                    break;
                }
            }
        }
        let _ = tx.send(Event::Closed(stream));
    });
}
