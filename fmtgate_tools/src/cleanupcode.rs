use std::env;
use std::path::Path;

use fmtgate_tool_api::{CommandSpec, FormatRequest, FormatTool, Profile, ToolError, ToolResult};

const DOTNET_BIN_ENV: &str = "FMTGATE_DOTNET_BIN";
const JB_BIN_ENV: &str = "FMTGATE_JB_BIN";
const NOTHING_FOUND_MARKER: &str = "No items were found to cleanup";
const INSTALL_COMMAND: &str = "dotnet tool install JetBrains.ReSharper.GlobalTools";
const REFORMAT_PROFILE: &str = "Built-in: Reformat Code";
const FULL_CLEANUP_PROFILE: &str = "Built-in: Full Cleanup";
const SETTINGS_LAYER_FLAGS: [&str; 4] = [
    "-dsl=GlobalAll",
    "-dsl=GlobalPerProduct",
    "-dsl=SolutionPersonal",
    "-dsl=ProjectPersonal",
];

/// How the `jb` command line tool is launched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Launcher {
    /// `dotnet jb` from the repository's tool manifest.
    #[default]
    DotnetLocal,
    /// `dotnet tool run jb`, for SDKs without the short form.
    DotnetToolRun,
    /// A globally installed `jb` executable.
    Global,
}

/// ReSharper `cleanupcode` driven through the `jb` command line tool.
#[derive(Debug, Clone)]
pub struct CleanupCode {
    launcher: Launcher,
    dotnet: String,
    jb: String,
}

impl CleanupCode {
    /// Construct the integration, honouring `FMTGATE_DOTNET_BIN` and
    /// `FMTGATE_JB_BIN` overrides.
    #[must_use]
    pub fn new(launcher: Launcher) -> Self {
        Self {
            launcher,
            dotnet: env::var(DOTNET_BIN_ENV).unwrap_or_else(|_| "dotnet".to_owned()),
            jb: env::var(JB_BIN_ENV).unwrap_or_else(|_| "jb".to_owned()),
        }
    }

    fn base_command(&self) -> CommandSpec {
        match self.launcher {
            Launcher::DotnetLocal => CommandSpec::new(resolve_program(&self.dotnet))
                .args(["jb", "cleanupcode"]),
            Launcher::DotnetToolRun => CommandSpec::new(resolve_program(&self.dotnet))
                .args(["tool", "run", "jb", "cleanupcode"]),
            Launcher::Global => CommandSpec::new(resolve_program(&self.jb)).arg("cleanupcode"),
        }
    }

    fn invalid(&self, reason: &str) -> ToolError {
        ToolError::InvalidRequest {
            tool: self.id(),
            reason: reason.to_owned(),
        }
    }
}

impl Default for CleanupCode {
    fn default() -> Self {
        Self::new(Launcher::default())
    }
}

impl FormatTool for CleanupCode {
    fn id(&self) -> &'static str {
        "cleanupcode"
    }

    fn label(&self) -> &'static str {
        "ReSharper cleanupcode"
    }

    fn probe_command(&self) -> CommandSpec {
        self.base_command().arg("-v")
    }

    fn install_hint(&self) -> String {
        let command = if self.launcher == Launcher::Global {
            format!("{INSTALL_COMMAND} --global")
        } else {
            INSTALL_COMMAND.to_owned()
        };
        format!(
            "looks like the jb dotnet tool isn't installed...\n\
             you can install it by running the following command:\n\n    {command}\n"
        )
    }

    fn invocation(&self, request: &FormatRequest<'_>) -> ToolResult<CommandSpec> {
        // An empty include makes cleanupcode process the whole solution.
        if request.target.trim().is_empty() {
            return Err(self.invalid("no solution or project given"));
        }
        if request.include.trim().is_empty() {
            return Err(self.invalid("empty include expression"));
        }

        let mut command = self.base_command().arg(request.target);
        if let Some(exclude) = request.exclude.filter(|value| !value.is_empty()) {
            command = command.arg(format!("--exclude={exclude}"));
        }
        command = command.arg(format!("--include={}", request.include));

        let mut extra: Vec<String> = Vec::with_capacity(request.passthrough.len() + 5);
        for arg in request.passthrough {
            if !extra.contains(arg) {
                extra.push(arg.clone());
            }
        }

        if !extra.iter().any(|arg| arg.starts_with("--profile")) {
            extra.push(format!("--profile={}", profile_name(request.profile)));
        }

        if !extra
            .iter()
            .any(|arg| arg.starts_with("-dsl") || arg.starts_with("--disable-settings-layers"))
        {
            extra.extend(SETTINGS_LAYER_FLAGS.iter().map(|flag| (*flag).to_owned()));
        }

        Ok(command.args(extra))
    }

    fn is_nothing_found(&self, line: &str) -> bool {
        line.contains(NOTHING_FOUND_MARKER)
    }
}

fn profile_name(profile: &Profile) -> &str {
    match profile {
        Profile::FormatOnly => REFORMAT_PROFILE,
        Profile::FullCleanup => FULL_CLEANUP_PROFILE,
        Profile::Custom(name) => name,
    }
}

// `which` maps `jb` to `jb.cmd` and friends on Windows; unknown names are left
// for the spawn to report.
fn resolve_program(program: &str) -> String {
    if Path::new(program).components().count() > 1 {
        return program.to_owned();
    }
    which::which(program).map_or_else(
        |_| program.to_owned(),
        |path| path.to_string_lossy().into_owned(),
    )
}
