//! External command execution
//!
//! Every shell-out (`flutter`, `fastlane`, `git`, `gh`) goes through
//! [`CommandRunner`], which returns a [`CommandOutput`] with the exit code,
//! captured output and duration.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use tracing::{debug, info, instrument};

use crate::error::{GantryError, Result};

/// A command to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Executable name or path
    pub program: String,
    /// Arguments
    pub args: Vec<String>,
    /// Working directory
    pub cwd: Option<PathBuf>,
    /// Extra environment variables
    pub env: Vec<(String, String)>,
    /// Data written to the child's stdin
    pub stdin: Option<String>,
    /// Capture stdout/stderr instead of streaming them to the terminal
    pub capture: bool,
}

impl CommandSpec {
    /// Create a new command
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: Vec::new(),
            stdin: None,
            capture: false,
        }
    }

    /// Add an argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add several arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set the working directory
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Add an environment variable
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Add environment variables
    pub fn envs(mut self, vars: impl IntoIterator<Item = (String, String)>) -> Self {
        self.env.extend(vars);
        self
    }

    /// Pipe data into stdin
    pub fn stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    /// Capture output
    pub fn captured(mut self) -> Self {
        self.capture = true;
        self
    }

    /// Command line as the operator would type it
    pub fn display(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            if arg.contains(char::is_whitespace) {
                line.push_str(&format!("\"{}\"", arg.replace('"', "\\\"")));
            } else {
                line.push_str(arg);
            }
        }
        line
    }
}

/// Result of running a command
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// Exit code (None when killed by a signal)
    pub exit_code: Option<i32>,
    /// Captured stdout (empty when streamed)
    pub stdout: String,
    /// Captured stderr (empty when streamed)
    pub stderr: String,
    /// Wall-clock duration
    pub duration: Duration,
}

impl CommandOutput {
    /// A successful, empty output
    pub fn ok() -> Self {
        Self {
            exit_code: Some(0),
            ..Default::default()
        }
    }

    /// A failed output with the given code
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            exit_code: Some(code),
            stderr: stderr.into(),
            ..Default::default()
        }
    }

    /// A successful output with stdout
    pub fn with_stdout(stdout: impl Into<String>) -> Self {
        Self {
            exit_code: Some(0),
            stdout: stdout.into(),
            ..Default::default()
        }
    }

    /// Whether the command exited zero
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs external commands
pub trait CommandRunner {
    /// Run a command; a non-zero exit is not an error at this level
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput>;

    /// Run a command and fail with `ExternalToolFailure` on non-zero exit
    fn run_checked(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        let output = self.run(spec)?;
        if output.success() {
            Ok(output)
        } else {
            Err(GantryError::ExternalToolFailure {
                command: spec.display(),
                exit_code: output.exit_code,
                stderr: output.stderr,
            })
        }
    }
}

/// Runs commands with `std::process`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl SystemRunner {
    /// Create a new runner
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for SystemRunner {
    #[instrument(skip(self, spec), fields(command = %spec.display()))]
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        let start = Instant::now();

        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args);
        if let Some(dir) = &spec.cwd {
            cmd.current_dir(dir);
        }
        for (k, v) in &spec.env {
            cmd.env(k, v);
        }

        cmd.stdin(if spec.stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::inherit()
        });
        if spec.capture {
            cmd.stdout(Stdio::piped());
            cmd.stderr(Stdio::piped());
        } else {
            cmd.stdout(Stdio::inherit());
            cmd.stderr(Stdio::inherit());
        }

        let mut child = cmd.spawn().map_err(|e| GantryError::ExternalToolFailure {
            command: spec.display(),
            exit_code: None,
            stderr: e.to_string(),
        })?;

        if let Some(input) = &spec.stdin {
            if let Some(mut stdin) = child.stdin.take() {
                stdin.write_all(input.as_bytes())?;
            }
        }

        let output = child.wait_with_output()?;
        let duration = start.elapsed();

        info!(
            exit_code = ?output.status.code(),
            duration_ms = duration.as_millis() as u64,
            "command finished"
        );

        Ok(CommandOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            duration,
        })
    }
}

type Effect = Box<dyn Fn(&CommandSpec)>;

/// Records commands instead of running them
///
/// Used for `--dry-run` and as a test double. Queued outputs are returned in
/// order; once the queue is empty every command succeeds.
#[derive(Default)]
pub struct RecordingRunner {
    calls: RefCell<Vec<CommandSpec>>,
    responses: RefCell<VecDeque<CommandOutput>>,
    effect: Option<Effect>,
}

impl RecordingRunner {
    /// Create a new recording runner
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an output for the next call
    pub fn respond(self, output: CommandOutput) -> Self {
        self.responses.borrow_mut().push_back(output);
        self
    }

    /// Run a side effect for every recorded command
    pub fn with_effect<F: Fn(&CommandSpec) + 'static>(mut self, effect: F) -> Self {
        self.effect = Some(Box::new(effect));
        self
    }

    /// Commands recorded so far
    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.borrow().clone()
    }

    /// Recorded command lines
    pub fn command_lines(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|c| c.display()).collect()
    }
}

impl std::fmt::Debug for RecordingRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingRunner")
            .field("calls", &self.calls.borrow().len())
            .finish()
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        debug!(command = %spec.display(), "recording command");
        self.calls.borrow_mut().push(spec.clone());
        if let Some(effect) = &self.effect {
            effect(spec);
        }
        Ok(self
            .responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(CommandOutput::ok))
    }
}
