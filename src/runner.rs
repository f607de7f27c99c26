//! Subprocess execution for the external tool.
//!
//! Programs are always started with an explicit argument vector, never
//! through a shell, so characters such as `;`, `|` or `$(...)` inside an
//! argument reach the child untouched. stdout and stderr are drained
//! concurrently while the child runs; large outputs (index dumps, call
//! graphs) cannot fill a pipe and stall the child.

use std::fmt;
use std::io;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;

/// A fully specified, immutable call of an external program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInvocation {
    program: String,
    args: Vec<String>,
    working_dir: PathBuf,
}

impl CommandInvocation {
    pub fn new<I, S>(program: impl Into<String>, args: I, working_dir: impl Into<PathBuf>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            working_dir: working_dir.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }
}

/// A failed invocation. `exit_code` is `None` only when the program could
/// not be started at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFailure {
    pub exit_code: Option<i32>,
    pub stderr: String,
}

impl CommandFailure {
    pub fn launch(program: &str, error: &std::io::Error) -> Self {
        Self {
            exit_code: None,
            stderr: format!("Failed to launch {}: {}", program, error),
        }
    }

    pub fn exited(code: i32, stderr: &str) -> Self {
        let stderr = stderr.trim();
        Self {
            exit_code: Some(code),
            stderr: if stderr.is_empty() {
                format!("Exit code {}", code)
            } else {
                stderr.to_string()
            },
        }
    }

    pub fn is_launch_failure(&self) -> bool {
        self.exit_code.is_none()
    }
}

impl fmt::Display for CommandFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.stderr)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Success { stdout: String },
    Failure(CommandFailure),
}

impl CommandOutcome {
    pub fn success(stdout: impl Into<String>) -> Self {
        CommandOutcome::Success {
            stdout: stdout.into(),
        }
    }

    pub fn into_result(self) -> Result<String, CommandFailure> {
        match self {
            CommandOutcome::Success { stdout } => Ok(stdout),
            CommandOutcome::Failure(failure) => Err(failure),
        }
    }
}

/// Executes command invocations. Implementations never classify failures
/// and never retry; both are caller concerns.
pub trait ProcessRunner: Send + Sync {
    fn run(&self, invocation: &CommandInvocation)
        -> impl Future<Output = CommandOutcome> + Send;
}

impl<T: ProcessRunner> ProcessRunner for Arc<T> {
    fn run(
        &self,
        invocation: &CommandInvocation,
    ) -> impl Future<Output = CommandOutcome> + Send {
        (**self).run(invocation)
    }
}

/// Runs programs as real child processes via `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    async fn run(&self, invocation: &CommandInvocation) -> CommandOutcome {
        tracing::debug!(
            program = invocation.program(),
            args = ?invocation.args(),
            cwd = %invocation.working_dir().display(),
            "spawning external tool"
        );

        let spawned = Command::new(invocation.program())
            .args(invocation.args())
            .current_dir(invocation.working_dir())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let mut child = match spawned {
            Ok(child) => child,
            Err(error) => {
                tracing::warn!(program = invocation.program(), %error, "failed to launch external tool");
                return CommandOutcome::Failure(CommandFailure::launch(invocation.program(), &error));
            }
        };

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let (status, stdout, stderr) = tokio::join!(
            child.wait(),
            drain(stdout, "stdout"),
            drain(stderr, "stderr"),
        );

        let status = match status {
            Ok(status) => status,
            Err(error) => {
                return CommandOutcome::Failure(CommandFailure {
                    exit_code: None,
                    stderr: format!("Failed to wait for {}: {}", invocation.program(), error),
                });
            }
        };

        assemble(invocation.program(), exit_code(status), stdout, stderr)
    }
}

/// Builds the outcome of a finished child. A stream that could not be read
/// to its end makes the run a failure even on exit code 0, so truncated
/// output is never reported as a success.
fn assemble(
    program: &str,
    code: i32,
    stdout: io::Result<Vec<u8>>,
    stderr: io::Result<Vec<u8>>,
) -> CommandOutcome {
    let (stdout, stderr) = match (stdout, stderr) {
        (Ok(stdout), Ok(stderr)) => (stdout, stderr),
        (Err(error), _) => return read_failure(program, "stdout", code, &error),
        (_, Err(error)) => return read_failure(program, "stderr", code, &error),
    };

    tracing::debug!(
        program,
        code,
        stdout_bytes = stdout.len(),
        stderr_bytes = stderr.len(),
        "external tool exited"
    );

    if code == 0 {
        CommandOutcome::Success {
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
        }
    } else {
        CommandOutcome::Failure(CommandFailure::exited(
            code,
            &String::from_utf8_lossy(&stderr),
        ))
    }
}

fn read_failure(program: &str, stream: &str, code: i32, error: &io::Error) -> CommandOutcome {
    tracing::warn!(program, stream, code, %error, "tool output truncated");
    CommandOutcome::Failure(CommandFailure {
        exit_code: Some(code),
        stderr: format!("Failed to read {} of {}: {}", stream, program, error),
    })
}

/// Reads a child stream to its end, line by line, keeping the raw bytes.
/// Returning early drops the reader, which closes the pipe so the child
/// cannot block on a full buffer.
async fn drain<R>(stream: Option<R>, label: &'static str) -> io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let Some(stream) = stream else {
        return Ok(Vec::new());
    };

    let mut reader = BufReader::new(stream);
    let mut buffer = Vec::new();
    loop {
        let start = buffer.len();
        if reader.read_until(b'\n', &mut buffer).await? == 0 {
            break;
        }
        tracing::trace!(
            stream = label,
            line = %String::from_utf8_lossy(&buffer[start..]).trim_end(),
            "tool output"
        );
    }
    Ok(buffer)
}

/// A child killed by a signal was still started, so it gets a conventional
/// shell-style code instead of `None`.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    -1
}
