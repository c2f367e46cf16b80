use std::fmt;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

/// Program and arguments for one external invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    /// Executable name or path.
    pub program: String,
    /// Arguments passed verbatim as argv entries.
    #[serde(default)]
    pub args: Vec<String>,
    /// Working directory; inherits the caller's when absent.
    #[serde(default)]
    pub current_dir: Option<Utf8PathBuf>,
}

impl CommandSpec {
    /// Construct a command without arguments.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    /// Append one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Run the command from `dir`.
    #[must_use]
    pub fn current_dir(mut self, dir: impl Into<Utf8PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Shell-like rendering with `--key=value` values quoted, for display only.
    #[must_use]
    pub fn display(&self) -> String {
        let mut rendered = quote(&self.program);
        for arg in &self.args {
            rendered.push(' ');
            rendered.push_str(&quote_arg(arg));
        }
        rendered
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

fn quote_arg(arg: &str) -> String {
    match arg.split_once('=') {
        Some((key, value)) if key.starts_with("--") => format!("{key}=\"{value}\""),
        _ => quote(arg),
    }
}

fn quote(value: &str) -> String {
    if value.is_empty() || value.contains(char::is_whitespace) {
        format!("\"{value}\"")
    } else {
        value.to_owned()
    }
}

/// Named preset controlling how much work the formatter performs.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "name")]
pub enum Profile {
    /// Light reformat only.
    FormatOnly,
    /// Full cleanup pass.
    #[default]
    FullCleanup,
    /// Tool-specific profile name supplied by the caller.
    Custom(String),
}

/// Everything a tool needs to compose one formatting invocation.
#[derive(Debug, Clone, Copy)]
pub struct FormatRequest<'a> {
    /// Solution or project path, relative to the working directory.
    pub target: &'a str,
    /// Include expression for this batch.
    pub include: &'a str,
    /// Optional exclude expression.
    pub exclude: Option<&'a str>,
    /// Profile selected by the caller.
    pub profile: &'a Profile,
    /// Arguments passed through to the tool unchanged.
    pub passthrough: &'a [String],
}

/// Errors surfaced by formatter integrations.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// The request cannot be turned into a command line.
    #[error("{tool} cannot format this request: {reason}")]
    InvalidRequest {
        /// Tool identifier.
        tool: &'static str,
        /// What was wrong with the request.
        reason: String,
    },
}

/// Convenience result alias for tool operations.
pub type ToolResult<T> = std::result::Result<T, ToolError>;
