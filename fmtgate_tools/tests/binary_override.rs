use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use fmtgate_tool_api::{FormatRequest, FormatTool, Profile};
use fmtgate_tools::{CleanupCode, Launcher};
use tempfile::TempDir;

static TEST_GUARD: Mutex<()> = Mutex::new(());

#[test]
fn dotnet_override_is_used_for_probe_and_invocation() {
    let _lock = TEST_GUARD.lock().expect("test guard");
    let fake = FakeBinaries::new();

    let tool = CleanupCode::new(Launcher::DotnetLocal);
    let probe = tool.probe_command();
    assert_eq!(Path::new(&probe.program), fake.dotnet());
    assert_eq!(probe.args, vec!["jb", "cleanupcode", "-v"]);

    let profile = Profile::FormatOnly;
    let command = tool
        .invocation(&FormatRequest {
            target: "App.sln",
            include: "src/x.cs",
            exclude: None,
            profile: &profile,
            passthrough: &[],
        })
        .expect("invocation");
    assert_eq!(Path::new(&command.program), fake.dotnet());
    assert!(command
        .args
        .contains(&"--profile=Built-in: Reformat Code".to_owned()));
}

#[test]
fn jb_override_is_used_by_global_launcher() {
    let _lock = TEST_GUARD.lock().expect("test guard");
    let fake = FakeBinaries::new();

    let tool = CleanupCode::new(Launcher::Global);
    let probe = tool.probe_command();
    assert_eq!(Path::new(&probe.program), fake.jb());
    assert_eq!(probe.args, vec!["cleanupcode", "-v"]);
}

struct FakeBinaries {
    _root: TempDir,
    dotnet: PathBuf,
    jb: PathBuf,
}

impl FakeBinaries {
    fn new() -> Self {
        let root = TempDir::new().expect("temp dir");
        let dotnet = root.path().join("dotnet");
        let jb = root.path().join("jb");
        fs::write(&dotnet, "#!/bin/sh\nexit 0\n").expect("write dotnet");
        fs::write(&jb, "#!/bin/sh\nexit 0\n").expect("write jb");
        std::env::set_var("FMTGATE_DOTNET_BIN", &dotnet);
        std::env::set_var("FMTGATE_JB_BIN", &jb);

        Self {
            _root: root,
            dotnet,
            jb,
        }
    }

    fn dotnet(&self) -> &Path {
        &self.dotnet
    }

    fn jb(&self) -> &Path {
        &self.jb
    }
}

impl Drop for FakeBinaries {
    fn drop(&mut self) {
        std::env::remove_var("FMTGATE_DOTNET_BIN");
        std::env::remove_var("FMTGATE_JB_BIN");
    }
}
