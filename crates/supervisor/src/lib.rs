//! Supervisor for the color service worker process.
//!
//! Owns the worker's lifecycle (start, stop, restart on debug toggle) and
//! the start-on-boot flag, and pushes its state to a [`ControlSurface`].
//! All entry points are synchronous and non-blocking: process exits,
//! worker messages, and deferred restarts arrive as [`SupervisorEvent`]s on
//! a channel that the caller's loop feeds back into
//! [`Supervisor::handle_event`].

mod autolaunch;
mod supervisor;
mod worker;

pub use autolaunch::{AutoLaunch, AutoLaunchFuture, RUN_KEY, RunKeyAutoLaunch};
pub use supervisor::{
    ControlSurface, RunningWorker, Supervisor, SupervisorConfig, SupervisorEvent,
    SupervisorStatus, WorkerState,
};
pub use worker::{
    ChildWorker, ExitReport, Launcher, OutputPolicy, OutputReader, ProcessLauncher, WaitFuture,
    Worker,
};

/// Errors produced by the supervisor.
#[derive(Debug, thiserror::Error)]
pub enum SupervisorError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from the start-on-boot collaborator.
#[derive(Debug, thiserror::Error)]
pub enum AutoLaunchError {
    #[error("start-on-boot registration failed: {0}")]
    Registry(#[source] std::io::Error),

    #[error("start-on-boot is only supported on Windows")]
    Unsupported,

    #[error("cannot determine executable path: {0}")]
    ExePath(#[source] std::io::Error),
}
