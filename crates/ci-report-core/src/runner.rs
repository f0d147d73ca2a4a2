//! External command execution.

use async_trait::async_trait;
use std::fmt;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::debug;

/// A command to execute: program, arguments, working directory, extra env.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Executable name or path.
    pub program: String,

    /// Arguments passed verbatim (no shell interpretation).
    pub args: Vec<String>,

    /// Working directory; inherits the process cwd when `None`.
    pub cwd: Option<PathBuf>,

    /// Extra environment variables.
    pub env: Vec<(String, String)>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Command line as shown in step logs, e.g. `make fclean`.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_line())
    }
}

/// Captured result of a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Stdout and stderr, interleaved as written.
    pub output: String,

    /// Exit code; `None` if the process never started or died on a signal.
    pub exit_code: Option<i32>,

    /// Wall-clock duration.
    pub duration: Duration,
}

impl CommandOutput {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            exit_code: Some(0),
            duration: Duration::ZERO,
        }
    }

    pub fn failure(output: impl Into<String>, exit_code: i32) -> Self {
        Self {
            output: output.into(),
            exit_code: Some(exit_code),
            duration: Duration::ZERO,
        }
    }

    /// Whether the command exited with code 0.
    pub fn succeeded(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Binary status: 0 on success, 1 otherwise.
    pub fn status(&self) -> u32 {
        if self.succeeded() {
            0
        } else {
            1
        }
    }
}

/// Executes commands on behalf of the report steps.
///
/// Implementations never fail: a command that cannot be started is reported
/// as a failed [`CommandOutput`] carrying the reason.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, spec: &CommandSpec) -> CommandOutput;
}

/// Runs commands as local subprocesses and waits for them to exit.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemCommandRunner;

#[async_trait]
impl CommandRunner for SystemCommandRunner {
    async fn run(&self, spec: &CommandSpec) -> CommandOutput {
        let start = Instant::now();
        debug!(command = %spec, cwd = ?spec.cwd, "Running command");

        match run_combined(spec).await {
            Ok((output, exit_code)) => CommandOutput {
                output,
                exit_code,
                duration: start.elapsed(),
            },
            Err(e) => {
                debug!(command = %spec, error = %e, "Command failed to start");
                CommandOutput {
                    output: format!("failed to run `{}`: {}\n", spec, e),
                    exit_code: None,
                    duration: start.elapsed(),
                }
            }
        }
    }
}

/// Spawn with stdout and stderr on one pipe, so the output keeps the order
/// in which the child wrote it.
async fn run_combined(spec: &CommandSpec) -> io::Result<(String, Option<i32>)> {
    let (mut reader, writer) = io::pipe()?;

    let mut command = Command::new(&spec.program);
    command
        .args(&spec.args)
        .stdin(Stdio::null())
        .stdout(writer.try_clone()?)
        .stderr(writer);
    if let Some(cwd) = &spec.cwd {
        command.current_dir(cwd);
    }
    for (key, value) in &spec.env {
        command.env(key, value);
    }

    let mut child = command.spawn()?;
    // The command still owns the write ends; the reader sees EOF only once
    // they are closed.
    drop(command);

    let drain = tokio::task::spawn_blocking(move || {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).map(|_| buf)
    });
    let status = child.wait().await?;
    let bytes = drain.await.map_err(io::Error::other)??;

    Ok((String::from_utf8_lossy(&bytes).into_owned(), status.code()))
}
