//! Captured execution of the external extraction tool.

use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

/// Output of a finished tool invocation.
#[derive(Debug)]
pub(crate) struct CapturedOutput {
    pub(crate) success: bool,
    pub(crate) exit_code: Option<i32>,
    pub(crate) stdout: String,
    pub(crate) stderr: String,
}

/// Runs `program` with `args` to completion, capturing both streams.
///
/// The child is killed if the returned future is dropped.
pub(crate) async fn run_capture(
    program: &Path,
    args: &[OsString],
) -> Result<CapturedOutput, std::io::Error> {
    debug!(program = %program.display(), arg_count = args.len(), "Spawning resolver tool");

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await?;

    let captured = CapturedOutput {
        success: output.status.success(),
        exit_code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    };
    debug!(
        success = captured.success,
        exit_code = ?captured.exit_code,
        stdout_bytes = captured.stdout.len(),
        "Resolver tool finished"
    );
    Ok(captured)
}
