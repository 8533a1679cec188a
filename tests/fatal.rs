//! `compile_or_abort` terminates the process. Each case re-runs this test
//! binary as a child with a failure injected at one call site.

mod common;

use std::process::Command;

use common::{FakeModule, RecordingToolchain};
use gcu_backend::{device, ToolchainCall, TopsCompiler};

const CHILD_ENV: &str = "GCU_FATAL_CHILD_CALL";

fn parse_call(name: &str) -> Option<ToolchainCall> {
    [
        ToolchainCall::CreateProgram,
        ToolchainCall::CompileProgram,
        ToolchainCall::GetBinSize,
        ToolchainCall::GetBin,
        ToolchainCall::CreateExecutable,
    ]
    .into_iter()
    .find(|call| call.symbol() == name)
}

/// Child half: does nothing unless launched by `abort_at` below.
#[test]
fn fatal_child_process() {
    let Some(call) = std::env::var(CHILD_ENV).ok().and_then(|name| parse_call(&name)) else {
        return;
    };

    device::select_target("pavo");
    let toolchain = RecordingToolchain::new("a-b")
        .failing_at(call)
        .announcing_destroy();
    let compiler = TopsCompiler::new(&toolchain);
    compiler.compile_or_abort(&FakeModule { name: "child" });

    eprintln!("compile_or_abort returned");
}

fn abort_at(call: ToolchainCall) -> (std::process::ExitStatus, String) {
    let exe = std::env::current_exe().expect("test binary path");
    let output = Command::new(exe)
        .args(["fatal_child_process", "--exact", "--nocapture", "--test-threads=1"])
        .env(CHILD_ENV, call.symbol())
        .output()
        .expect("spawn child test");
    (output.status, String::from_utf8_lossy(&output.stderr).into_owned())
}

#[test]
fn every_call_site_failure_terminates_the_process() {
    for call in [
        ToolchainCall::CreateProgram,
        ToolchainCall::CompileProgram,
        ToolchainCall::GetBinSize,
        ToolchainCall::GetBin,
        ToolchainCall::CreateExecutable,
    ] {
        let (status, stderr) = abort_at(call);

        assert!(!status.success(), "{call}: child exited cleanly\n{stderr}");
        assert!(
            !stderr.contains("compile_or_abort returned"),
            "{call}: execution continued past the failure\n{stderr}"
        );
        assert!(
            stderr.contains(&format!("error[gcu-compile] {call} failed")),
            "{call}: diagnostic does not name the call\n{stderr}"
        );

        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            assert_eq!(status.signal(), Some(6), "{call}: expected SIGABRT");
        }
    }
}

#[test]
fn abort_runs_program_destruction_first() {
    for call in [
        ToolchainCall::CompileProgram,
        ToolchainCall::GetBinSize,
        ToolchainCall::GetBin,
    ] {
        let (_, stderr) = abort_at(call);
        assert_eq!(
            stderr.matches("destroy-program").count(),
            1,
            "{call}: program not destroyed exactly once\n{stderr}"
        );
    }

    let (_, stderr) = abort_at(ToolchainCall::CreateProgram);
    assert!(!stderr.contains("destroy-program"), "{stderr}");
}
