//! External tool invocation.
//!
//! Content is handed to tools through [`Snapshot`] temporary files owned by
//! the caller's scope; they are removed when dropped, whether the tool
//! succeeded, failed, or was killed.

use std::io::{ErrorKind, Write};
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::time::Instant;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{Error, Result, Termination};

/// Captured result of a tool that finished with an accepted status.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub code: i32,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// Document content stored in a temporary file for the duration of a call.
#[derive(Debug)]
pub struct Snapshot {
    file: NamedTempFile,
}

impl Snapshot {
    pub fn new(label: &str, content: &[u8]) -> Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix(&format!("fmtpatch-{label}-"))
            .tempfile()?;
        file.write_all(content)?;
        file.flush()?;
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// A fresh read handle positioned at the start, for use as child stdin.
    pub fn stdin(&self) -> Result<Stdio> {
        Ok(Stdio::from(self.file.reopen()?))
    }
}

/// Run `command` to completion, capturing stdout and stderr.
///
/// Exit codes outside `success_codes` and signal terminations become
/// [`Error::ProcessFailure`] with the captured stderr. A missing binary is
/// an [`Error::EnvironmentPrecondition`].
pub fn run(tool: &str, command: &mut Command, success_codes: &[i32]) -> Result<ProcessOutput> {
    debug!(
        tool,
        program = %command.get_program().to_string_lossy(),
        args = ?command.get_args().collect::<Vec<_>>(),
        "invoking"
    );
    let start = Instant::now();
    let output = command.output().map_err(|err| {
        if err.kind() == ErrorKind::NotFound {
            Error::EnvironmentPrecondition(format!(
                "{tool} executable not found: {}",
                command.get_program().to_string_lossy()
            ))
        } else {
            Error::Io(err)
        }
    })?;
    let termination = termination(output.status);
    debug!(
        tool,
        %termination,
        stdout_bytes = output.stdout.len(),
        stderr_bytes = output.stderr.len(),
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "finished"
    );

    match termination {
        Termination::Exited(code) if success_codes.contains(&code) => Ok(ProcessOutput {
            code,
            stdout: output.stdout,
            stderr: output.stderr,
        }),
        _ => Err(Error::ProcessFailure {
            tool: tool.to_string(),
            termination,
            diagnostics: String::from_utf8_lossy(&output.stderr).into_owned(),
        }),
    }
}

fn termination(status: ExitStatus) -> Termination {
    if let Some(code) = status.code() {
        return Termination::Exited(code);
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return Termination::Signaled(signal);
        }
    }
    Termination::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_is_removed_on_drop() {
        let snapshot = Snapshot::new("test", b"int x;\n").unwrap();
        let path = snapshot.path().to_path_buf();
        assert_eq!(std::fs::read(&path).unwrap(), b"int x;\n");
        drop(snapshot);
        assert!(!path.exists());
    }

    #[test]
    fn test_missing_binary_is_environment_precondition() {
        let mut command = Command::new("fmtpatch-no-such-tool-9f2c");
        let err = run("formatter", &mut command, &[0]).unwrap_err();
        assert!(matches!(err, Error::EnvironmentPrecondition(msg) if msg.contains("not found")));
    }

    #[cfg(unix)]
    #[test]
    fn test_stdin_from_snapshot_reaches_child() {
        let snapshot = Snapshot::new("stdin", b"hello").unwrap();
        let mut command = Command::new("sh");
        command.args(["-c", "cat"]).stdin(snapshot.stdin().unwrap());
        let output = run("cat", &mut command, &[0]).unwrap();
        assert_eq!(output.stdout, b"hello");
        assert_eq!(output.code, 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_nonzero_exit_captures_stderr() {
        let mut command = Command::new("sh");
        command.args(["-c", "echo 'bad style' >&2; exit 3"]);
        let err = run("formatter", &mut command, &[0]).unwrap_err();
        match err {
            Error::ProcessFailure {
                tool,
                termination,
                diagnostics,
            } => {
                assert_eq!(tool, "formatter");
                assert_eq!(termination, Termination::Exited(3));
                assert_eq!(diagnostics.trim(), "bad style");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_additional_success_codes_are_accepted() {
        let mut command = Command::new("sh");
        command.args(["-c", "printf '1:2 '; exit 1"]);
        let output = run("diff", &mut command, &[0, 1]).unwrap();
        assert_eq!(output.code, 1);
        assert_eq!(output.stdout, b"1:2 ");
    }

    #[cfg(unix)]
    #[test]
    fn test_signal_termination_is_reported() {
        let mut command = Command::new("sh");
        command.args(["-c", "kill -9 $$"]);
        let err = run("formatter", &mut command, &[0]).unwrap_err();
        assert!(matches!(
            err,
            Error::ProcessFailure {
                termination: Termination::Signaled(9),
                ..
            }
        ));
    }
}
