//! Command executor for running external tools
//!
//! Deployment drives the `aws` and `docker` CLIs through [`CommandExecutor`],
//! so the pipeline can be exercised in tests without either installed.

use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info};

/// Failure to run a command at all, as opposed to a non-zero exit
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Failed to start '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error while running '{command}': {source}")]
    Io {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

/// A program invocation: no shell is involved
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
    /// Written to the child's stdin, then stdin is closed
    pub stdin: Option<String>,
    /// Do not echo output to the log (it may hold credentials)
    pub quiet: bool,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
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

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    pub fn quiet(mut self) -> Self {
        self.quiet = true;
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Result of command execution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandResult {
    /// Check if the command was successful
    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Trait for executing external commands
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    async fn execute(&self, command: &CommandSpec) -> Result<CommandResult, CommandError>;
}

/// Default command executor using tokio::process
pub struct ShellCommandExecutor;

impl ShellCommandExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ShellCommandExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandExecutor for ShellCommandExecutor {
    async fn execute(&self, command: &CommandSpec) -> Result<CommandResult, CommandError> {
        let command_line = command.to_string();
        info!("Running {command_line}");

        let mut process = Command::new(&command.program);
        process
            .args(&command.args)
            .stdin(if command.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &command.working_dir {
            process.current_dir(dir);
        }

        let mut child = process.spawn().map_err(|source| CommandError::Spawn {
            command: command_line.clone(),
            source,
        })?;

        if let (Some(input), Some(mut pipe)) = (&command.stdin, child.stdin.take()) {
            pipe.write_all(input.as_bytes())
                .await
                .map_err(|source| CommandError::Io {
                    command: command_line.clone(),
                    source,
                })?;
            // Dropping the pipe closes stdin
        }

        let echo = !command.quiet;
        let (stdout, stderr) = tokio::join!(
            collect_lines(child.stdout.take(), "stdout", echo),
            collect_lines(child.stderr.take(), "stderr", echo),
        );

        let status = child.wait().await.map_err(|source| CommandError::Io {
            command: command_line.clone(),
            source,
        })?;
        debug!(exit_code = ?status.code(), "{command_line} finished");

        Ok(CommandResult {
            exit_code: status.code().unwrap_or(-1),
            stdout,
            stderr,
        })
    }
}

/// Read a child stream to the end, logging each line as it arrives
async fn collect_lines<R>(reader: Option<R>, stream: &'static str, echo: bool) -> String
where
    R: AsyncRead + Unpin,
{
    let Some(reader) = reader else {
        return String::new();
    };

    let mut lines = BufReader::new(reader).lines();
    let mut collected = String::new();
    while let Ok(Some(line)) = lines.next_line().await {
        if echo && !line.trim().is_empty() {
            info!(stream, "{}", line.trim_end());
        }
        collected.push_str(&line);
        collected.push('\n');
    }
    collected
}

/// Mock command executor for testing
///
/// Commands are matched against registered prefixes of their display form;
/// anything unmatched succeeds with empty output. Every call is recorded.
#[cfg(test)]
#[derive(Default)]
pub struct MockCommandExecutor {
    results: Vec<(String, CommandResult)>,
    calls: std::sync::Mutex<Vec<CommandSpec>>,
}

#[cfg(test)]
impl MockCommandExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_result(
        mut self,
        prefix: &str,
        exit_code: i32,
        stdout: &str,
        stderr: &str,
    ) -> Self {
        self.results.push((
            prefix.to_string(),
            CommandResult {
                exit_code,
                stdout: stdout.to_string(),
                stderr: stderr.to_string(),
            },
        ));
        self
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }

    /// Display form of every recorded call
    pub fn command_lines(&self) -> Vec<String> {
        self.calls().iter().map(ToString::to_string).collect()
    }
}

#[cfg(test)]
#[async_trait]
impl CommandExecutor for MockCommandExecutor {
    async fn execute(&self, command: &CommandSpec) -> Result<CommandResult, CommandError> {
        self.calls.lock().unwrap().push(command.clone());
        let line = command.to_string();
        Ok(self
            .results
            .iter()
            .find(|(prefix, _)| line.starts_with(prefix.as_str()))
            .map(|(_, result)| result.clone())
            .unwrap_or_default())
    }
}
