//! Worker process abstraction.
//!
//! [`Launcher`] creates workers and [`Worker`] is the handle the supervisor
//! keeps; [`ProcessLauncher`] and [`ChildWorker`] are the real
//! implementations on top of `tokio::process`.

use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::pin::Pin;
use std::process::{ExitStatus, Stdio};

use tokio::io::AsyncRead;

use crate::SupervisorError;

/// A boxed future resolving when the worker exits.
pub type WaitFuture<'a> = Pin<Box<dyn Future<Output = io::Result<ExitReport>> + Send + 'a>>;

/// A readable output stream of a worker.
pub type OutputReader = Box<dyn AsyncRead + Send + Unpin>;

/// How a worker terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitReport {
    pub code: Option<i32>,
    pub signal: Option<i32>,
}

impl ExitReport {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl From<ExitStatus> for ExitReport {
    fn from(status: ExitStatus) -> Self {
        #[cfg(unix)]
        let signal = {
            use std::os::unix::process::ExitStatusExt;
            status.signal()
        };
        #[cfg(not(unix))]
        let signal = None;

        Self {
            code: status.code(),
            signal,
        }
    }
}

/// What to do with the worker's diagnostic output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputPolicy {
    /// Pipe stderr and plain stdout lines into the supervisor's log.
    Capture,
    /// Drop it.
    Discard,
}

impl OutputPolicy {
    pub fn from_debug(debug: bool) -> Self {
        if debug { Self::Capture } else { Self::Discard }
    }
}

/// A running worker process.
pub trait Worker: Send + 'static {
    fn pid(&self) -> Option<u32>;

    /// Requests termination without waiting for it.
    fn start_kill(&mut self) -> io::Result<()>;

    /// Resolves when the worker exits. Must be safe to call again after the
    /// returned future was dropped unfinished.
    fn wait(&mut self) -> WaitFuture<'_>;

    /// Stdout carries [`WorkerMessage`](accent_protocol::WorkerMessage) lines.
    fn take_stdout(&mut self) -> Option<OutputReader>;

    fn take_stderr(&mut self) -> Option<OutputReader>;
}

/// Creates worker processes.
pub trait Launcher: Send + 'static {
    fn launch(&mut self, policy: OutputPolicy) -> Result<Box<dyn Worker>, SupervisorError>;
}

/// Spawns a program with fixed arguments.
#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    program: PathBuf,
    args: Vec<String>,
}

impl ProcessLauncher {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Re-executes the running binary with `args`.
    pub fn current_exe(args: Vec<String>) -> io::Result<Self> {
        Ok(Self::new(std::env::current_exe()?, args))
    }

    pub fn program(&self) -> &std::path::Path {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl Launcher for ProcessLauncher {
    fn launch(&mut self, policy: OutputPolicy) -> Result<Box<dyn Worker>, SupervisorError> {
        let stderr = match policy {
            OutputPolicy::Capture => Stdio::piped(),
            OutputPolicy::Discard => Stdio::null(),
        };

        let mut cmd = tokio::process::Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(stderr)
            .kill_on_drop(true);
        accent_color::command::hide_window(&mut cmd);

        let child = cmd.spawn().map_err(|source| SupervisorError::Spawn {
            program: self.program.display().to_string(),
            source,
        })?;
        Ok(Box::new(ChildWorker(child)))
    }
}

/// A worker backed by a real child process.
#[derive(Debug)]
pub struct ChildWorker(tokio::process::Child);

impl Worker for ChildWorker {
    fn pid(&self) -> Option<u32> {
        self.0.id()
    }

    fn start_kill(&mut self) -> io::Result<()> {
        self.0.start_kill()
    }

    fn wait(&mut self) -> WaitFuture<'_> {
        Box::pin(async move { self.0.wait().await.map(ExitReport::from) })
    }

    fn take_stdout(&mut self) -> Option<OutputReader> {
        self.0.stdout.take().map(|s| Box::new(s) as OutputReader)
    }

    fn take_stderr(&mut self) -> Option<OutputReader> {
        self.0.stderr.take().map(|s| Box::new(s) as OutputReader)
    }
}
