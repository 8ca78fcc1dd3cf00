#![allow(dead_code)]

use std::path::Path;
use std::process::{Command, Output};

/// Runs the binary from `workdir` with a scrubbed model/logging environment.
pub fn run_agent(workdir: &Path, args: &[&str], envs: &[(&str, &str)]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_kk-agent"));
    cmd.current_dir(workdir).args(args);
    for key in [
        "GEMINI_BASE_URL",
        "GEMINI_MODELS",
        "MODEL_TIMEOUT_SECS",
        "DEBUG_DUMP_PATH",
        "LOG_FORMAT",
        "LOG_OUTPUT",
        "LOG_FILE_PATH",
        "RUST_LOG",
    ] {
        cmd.env_remove(key);
    }
    cmd.envs(envs.iter().copied());
    cmd.output().expect("failed to run kk-agent binary")
}

pub fn stdout_json(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(stdout.trim()).unwrap_or_else(|err| {
        panic!("stdout should be a single JSON value ({err}), got:\n{stdout}")
    })
}
