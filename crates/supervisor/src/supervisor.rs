//! Worker lifecycle state machine.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, oneshot};

use accent_protocol::WorkerMessage;
use accent_protocol::constants::DEFAULT_RESTART_DELAY;
use accent_tray::TrayHandle;

use crate::SupervisorError;
use crate::autolaunch::AutoLaunch;
use crate::worker::{ExitReport, Launcher, OutputPolicy, OutputReader, Worker};

/// Bookkeeping for the live worker.
#[derive(Debug)]
pub struct RunningWorker {
    generation: u64,
    pid: Option<u32>,
    kill: oneshot::Sender<()>,
}

impl RunningWorker {
    /// Increases by one for every successful spawn.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }
}

/// Run state of the worker.
///
/// The handle only exists while running, so the state cannot say stopped
/// while a handle lingers.
#[derive(Debug, Default)]
pub enum WorkerState {
    #[default]
    Stopped,
    Running(RunningWorker),
}

impl WorkerState {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running(_))
    }
}

/// Asynchronous inputs to the supervisor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisorEvent {
    /// A worker process terminated, for whatever reason.
    WorkerExited {
        generation: u64,
        report: Result<ExitReport, String>,
    },
    /// A worker sent a structured message on stdout.
    WorkerMessage {
        generation: u64,
        message: WorkerMessage,
    },
    /// The fallback delay of a deferred restart elapsed.
    RestartDue { ticket: u64 },
}

/// Snapshot rendered by the control surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupervisorStatus {
    pub running: bool,
    pub pid: Option<u32>,
    pub debug: bool,
    pub start_on_boot: bool,
}

/// Renders supervisor state (the tray menu).
pub trait ControlSurface: Send {
    fn refresh(&mut self, status: &SupervisorStatus);
}

impl ControlSurface for TrayHandle {
    fn refresh(&mut self, status: &SupervisorStatus) {
        TrayHandle::refresh(self, status.running, status.debug, status.start_on_boot);
    }
}

/// Initial flags and timing.
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    pub debug: bool,
    pub start_on_boot: bool,
    /// Upper bound on the wait between stop and respawn on a debug toggle.
    pub restart_delay: Duration,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            debug: false,
            start_on_boot: false,
            restart_delay: DEFAULT_RESTART_DELAY,
        }
    }
}

/// A respawn waiting for the old worker's exit or the fallback timer.
#[derive(Debug, Clone, Copy)]
struct PendingRestart {
    ticket: u64,
    awaiting_exit: Option<u64>,
}

/// Keeps one worker process alive on request and mirrors its state.
pub struct Supervisor<L, C> {
    launcher: L,
    surface: C,
    auto_launch: Arc<dyn AutoLaunch>,
    state: WorkerState,
    debug: bool,
    start_on_boot: bool,
    restart_delay: Duration,
    generation: u64,
    ticket: u64,
    pending_restart: Option<PendingRestart>,
    events: mpsc::UnboundedSender<SupervisorEvent>,
}

impl<L: Launcher, C: ControlSurface> Supervisor<L, C> {
    /// Creates a stopped supervisor.
    ///
    /// The returned receiver yields the events the caller must pass back to
    /// [`handle_event`](Self::handle_event).
    pub fn new(
        config: SupervisorConfig,
        launcher: L,
        surface: C,
        auto_launch: Arc<dyn AutoLaunch>,
    ) -> (Self, mpsc::UnboundedReceiver<SupervisorEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();
        let supervisor = Self {
            launcher,
            surface,
            auto_launch,
            state: WorkerState::Stopped,
            debug: config.debug,
            start_on_boot: config.start_on_boot,
            restart_delay: config.restart_delay,
            generation: 0,
            ticket: 0,
            pending_restart: None,
            events,
        };
        (supervisor, events_rx)
    }

    pub fn state(&self) -> &WorkerState {
        &self.state
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    pub fn debug_mode(&self) -> bool {
        self.debug
    }

    pub fn start_on_boot(&self) -> bool {
        self.start_on_boot
    }

    pub fn surface(&self) -> &C {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut C {
        &mut self.surface
    }

    pub fn status(&self) -> SupervisorStatus {
        let pid = match &self.state {
            WorkerState::Running(w) => w.pid,
            WorkerState::Stopped => None,
        };
        SupervisorStatus {
            running: self.state.is_running(),
            pid,
            debug: self.debug,
            start_on_boot: self.start_on_boot,
        }
    }

    /// Pushes the current state to the control surface.
    pub fn refresh(&mut self) {
        let status = self.status();
        self.surface.refresh(&status);
    }

    /// Spawns the worker unless one is already running.
    ///
    /// A spawn failure leaves the state `Stopped` and is returned to the
    /// caller; nothing retries it.
    pub fn start(&mut self) -> Result<(), SupervisorError> {
        if self.state.is_running() {
            tracing::debug!("worker already running");
            return Ok(());
        }

        let policy = OutputPolicy::from_debug(self.debug);
        let mut worker = match self.launcher.launch(policy) {
            Ok(worker) => worker,
            Err(e) => {
                tracing::error!("failed to start worker: {e}");
                return Err(e);
            }
        };

        self.generation += 1;
        let generation = self.generation;
        let pid = worker.pid();

        if let Some(stdout) = worker.take_stdout() {
            forward_output(stdout, generation, policy, Some(self.events.clone()));
        }
        if let Some(stderr) = worker.take_stderr() {
            forward_output(stderr, generation, policy, None);
        }

        let (kill, kill_rx) = oneshot::channel();
        watch_exit(worker, generation, kill_rx, self.events.clone());

        self.state = WorkerState::Running(RunningWorker {
            generation,
            pid,
            kill,
        });
        tracing::info!(generation, ?pid, ?policy, "worker started");
        self.refresh();
        Ok(())
    }

    /// Asks the worker to terminate and forgets it.
    ///
    /// The state becomes `Stopped` at once, whether or not the kill
    /// succeeds; the exit observer reports the actual termination later.
    pub fn stop(&mut self) {
        let worker = match std::mem::take(&mut self.state) {
            WorkerState::Running(worker) => worker,
            WorkerState::Stopped => {
                tracing::debug!("worker not running");
                return;
            }
        };

        if worker.kill.send(()).is_err() {
            tracing::warn!(generation = worker.generation, "worker already gone");
        }
        tracing::info!(generation = worker.generation, "worker stopped");
        self.refresh();
    }

    /// Starts a stopped worker or stops a running one.
    pub fn toggle_server(&mut self) {
        if self.state.is_running() {
            self.stop();
        } else if let Err(e) = self.start() {
            tracing::warn!("server toggle could not start worker: {e}");
        }
    }

    /// Flips debug capture and respawns the worker under the new policy.
    ///
    /// The respawn happens as soon as the old worker's exit is observed,
    /// or after the restart delay if that comes first.
    pub fn toggle_debug_mode(&mut self) {
        self.debug = !self.debug;
        tracing::info!(debug = self.debug, "debug toggled");

        let awaiting_exit = match &self.state {
            WorkerState::Running(w) => Some(w.generation),
            WorkerState::Stopped => None,
        };
        self.stop();

        self.ticket += 1;
        let ticket = self.ticket;
        self.pending_restart = Some(PendingRestart {
            ticket,
            awaiting_exit,
        });

        let events = self.events.clone();
        let delay = self.restart_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = events.send(SupervisorEvent::RestartDue { ticket });
        });

        // `stop` already pushed the new flag when a worker was running.
        if awaiting_exit.is_none() {
            self.refresh();
        }
    }

    /// Flips start-on-boot and hands the change to the collaborator.
    ///
    /// The local flag flips immediately; collaborator failures are logged.
    pub fn toggle_auto_launch(&mut self) {
        self.start_on_boot = !self.start_on_boot;
        let enabled = self.start_on_boot;

        let auto_launch = Arc::clone(&self.auto_launch);
        tokio::spawn(async move {
            if let Err(e) = auto_launch.set_enabled(enabled).await {
                tracing::warn!(enabled, "failed to update start-on-boot: {e}");
            }
        });

        self.refresh();
    }

    /// Applies one asynchronous event.
    pub fn handle_event(&mut self, event: SupervisorEvent) {
        match event {
            SupervisorEvent::WorkerExited { generation, report } => {
                self.on_worker_exit(generation, report)
            }
            SupervisorEvent::WorkerMessage {
                generation,
                message,
            } => match message {
                WorkerMessage::ColorApplied { hex } => {
                    tracing::info!(generation, %hex, "worker applied color");
                }
            },
            SupervisorEvent::RestartDue { ticket } => {
                if self.pending_restart.is_some_and(|p| p.ticket == ticket) {
                    tracing::debug!(ticket, "restart delay elapsed");
                    self.restart_now();
                }
            }
        }
    }

    /// Stops the worker ahead of process exit.
    pub fn shutdown(&mut self) {
        self.pending_restart = None;
        self.stop();
    }

    fn on_worker_exit(&mut self, generation: u64, report: Result<ExitReport, String>) {
        let current = matches!(&self.state, WorkerState::Running(w) if w.generation == generation);

        if current {
            match &report {
                Ok(r) if r.success() => tracing::info!(generation, "worker exited"),
                Ok(r) => tracing::warn!(
                    generation,
                    code = ?r.code,
                    signal = ?r.signal,
                    "worker exited unexpectedly"
                ),
                Err(e) => tracing::warn!(generation, "lost track of worker: {e}"),
            }
            // Crashes are surfaced through state only; no respawn.
            self.state = WorkerState::Stopped;
            self.refresh();
            return;
        }

        tracing::debug!(generation, ?report, "previous worker exited");
        if self
            .pending_restart
            .is_some_and(|p| p.awaiting_exit == Some(generation))
        {
            self.restart_now();
        }
    }

    fn restart_now(&mut self) {
        self.pending_restart = None;
        if let Err(e) = self.start() {
            tracing::warn!("restart failed: {e}");
        }
    }
}

/// Waits for the worker to exit, killing it first if asked to.
fn watch_exit(
    mut worker: Box<dyn Worker>,
    generation: u64,
    mut kill_rx: oneshot::Receiver<()>,
    events: mpsc::UnboundedSender<SupervisorEvent>,
) {
    tokio::spawn(async move {
        let result = tokio::select! {
            result = worker.wait() => result,
            // Fires on an explicit stop and when the supervisor is dropped.
            _ = &mut kill_rx => {
                if let Err(e) = worker.start_kill() {
                    tracing::warn!(generation, "failed to kill worker: {e}");
                }
                worker.wait().await
            }
        };

        let report = result.map_err(|e| e.to_string());
        let _ = events.send(SupervisorEvent::WorkerExited { generation, report });
    });
}

/// Reads worker output line by line.
///
/// With `messages`, lines that parse as [`WorkerMessage`] are forwarded as
/// events. Everything else is logged when capturing and dropped otherwise.
fn forward_output(
    reader: OutputReader,
    generation: u64,
    policy: OutputPolicy,
    messages: Option<mpsc::UnboundedSender<SupervisorEvent>>,
) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    tracing::debug!(generation, "worker output closed: {e}");
                    break;
                }
            };

            if let Some(tx) = &messages {
                if let Some(message) = WorkerMessage::parse_line(&line) {
                    let _ = tx.send(SupervisorEvent::WorkerMessage {
                        generation,
                        message,
                    });
                    continue;
                }
            }

            if policy == OutputPolicy::Capture {
                tracing::info!(target: "worker", generation, "{line}");
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AutoLaunchError;
    use crate::autolaunch::AutoLaunchFuture;
    use std::io;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::io::AsyncWriteExt;
    use tokio::sync::Notify;

    use crate::worker::WaitFuture;

    // -- Fakes --

    struct FakeWorker {
        pid: u32,
        exit_rx: oneshot::Receiver<ExitReport>,
        kill: Arc<Notify>,
        killed: Arc<AtomicBool>,
        stdout: Option<OutputReader>,
    }

    impl Worker for FakeWorker {
        fn pid(&self) -> Option<u32> {
            Some(self.pid)
        }

        fn start_kill(&mut self) -> io::Result<()> {
            self.killed.store(true, Ordering::SeqCst);
            self.kill.notify_one();
            Ok(())
        }

        fn wait(&mut self) -> WaitFuture<'_> {
            Box::pin(async move {
                tokio::select! {
                    report = &mut self.exit_rx => report.map_err(io::Error::other),
                    _ = self.kill.notified() => Ok(ExitReport { code: None, signal: Some(9) }),
                }
            })
        }

        fn take_stdout(&mut self) -> Option<OutputReader> {
            self.stdout.take()
        }

        fn take_stderr(&mut self) -> Option<OutputReader> {
            None
        }
    }

    /// Test-side controls for one launched fake worker.
    struct Launched {
        exit_tx: Option<oneshot::Sender<ExitReport>>,
        killed: Arc<AtomicBool>,
        stdout_tx: Option<tokio::io::DuplexStream>,
        policy: OutputPolicy,
    }

    #[derive(Default)]
    struct LauncherState {
        launched: Vec<Launched>,
        fail_next: bool,
    }

    #[derive(Clone, Default)]
    struct FakeLauncher {
        inner: Arc<Mutex<LauncherState>>,
    }

    impl FakeLauncher {
        fn launches(&self) -> usize {
            self.inner.lock().unwrap().launched.len()
        }

        fn fail_next(&self) {
            self.inner.lock().unwrap().fail_next = true;
        }

        fn policy(&self, index: usize) -> OutputPolicy {
            self.inner.lock().unwrap().launched[index].policy
        }

        fn killed(&self, index: usize) -> bool {
            self.inner.lock().unwrap().launched[index].killed.load(Ordering::SeqCst)
        }

        fn exit(&self, index: usize, code: i32) {
            let tx = self.inner.lock().unwrap().launched[index].exit_tx.take();
            tx.expect("worker still alive")
                .send(ExitReport {
                    code: Some(code),
                    signal: None,
                })
                .unwrap();
        }

        fn take_stdout(&self, index: usize) -> tokio::io::DuplexStream {
            self.inner.lock().unwrap().launched[index]
                .stdout_tx
                .take()
                .unwrap()
        }
    }

    impl Launcher for FakeLauncher {
        fn launch(&mut self, policy: OutputPolicy) -> Result<Box<dyn Worker>, SupervisorError> {
            let mut state = self.inner.lock().unwrap();
            if std::mem::take(&mut state.fail_next) {
                return Err(SupervisorError::Spawn {
                    program: "fake".into(),
                    source: io::Error::from(io::ErrorKind::NotFound),
                });
            }

            let (exit_tx, exit_rx) = oneshot::channel();
            let (stdout_tx, stdout_rx) = tokio::io::duplex(1024);
            let killed = Arc::new(AtomicBool::new(false));
            state.launched.push(Launched {
                exit_tx: Some(exit_tx),
                killed: Arc::clone(&killed),
                stdout_tx: Some(stdout_tx),
                policy,
            });

            Ok(Box::new(FakeWorker {
                pid: 1000 + state.launched.len() as u32,
                exit_rx,
                kill: Arc::new(Notify::new()),
                killed,
                stdout: Some(Box::new(stdout_rx)),
            }))
        }
    }

    #[derive(Default)]
    struct RecordingSurface {
        refreshes: Vec<SupervisorStatus>,
    }

    impl ControlSurface for RecordingSurface {
        fn refresh(&mut self, status: &SupervisorStatus) {
            self.refreshes.push(*status);
        }
    }

    #[derive(Default)]
    struct FakeAutoLaunch {
        calls: Mutex<Vec<bool>>,
        fail: bool,
    }

    impl AutoLaunch for FakeAutoLaunch {
        fn is_enabled(&self) -> AutoLaunchFuture<'_, bool> {
            Box::pin(async move { Ok(self.calls.lock().unwrap().last().copied().unwrap_or(false)) })
        }

        fn set_enabled(&self, enabled: bool) -> AutoLaunchFuture<'_, ()> {
            Box::pin(async move {
                self.calls.lock().unwrap().push(enabled);
                if self.fail {
                    return Err(AutoLaunchError::ExePath(io::Error::other("boom")));
                }
                Ok(())
            })
        }
    }

    type TestSupervisor = Supervisor<FakeLauncher, RecordingSurface>;

    fn supervisor_with(
        config: SupervisorConfig,
        auto_launch: Arc<FakeAutoLaunch>,
    ) -> (
        TestSupervisor,
        mpsc::UnboundedReceiver<SupervisorEvent>,
        FakeLauncher,
    ) {
        let launcher = FakeLauncher::default();
        let (sup, events) = Supervisor::new(
            config,
            launcher.clone(),
            RecordingSurface::default(),
            auto_launch,
        );
        (sup, events, launcher)
    }

    fn supervisor() -> (
        TestSupervisor,
        mpsc::UnboundedReceiver<SupervisorEvent>,
        FakeLauncher,
    ) {
        let config = SupervisorConfig {
            restart_delay: Duration::from_secs(60),
            ..SupervisorConfig::default()
        };
        supervisor_with(config, Arc::new(FakeAutoLaunch::default()))
    }

    async fn next_event(events: &mut mpsc::UnboundedReceiver<SupervisorEvent>) -> SupervisorEvent {
        tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("event within timeout")
            .expect("channel open")
    }

    fn generation(sup: &TestSupervisor) -> Option<u64> {
        match sup.state() {
            WorkerState::Running(w) => Some(w.generation()),
            WorkerState::Stopped => None,
        }
    }

    // -- Start / stop --

    #[tokio::test]
    async fn start_twice_spawns_once() {
        let (mut sup, _events, launcher) = supervisor();

        sup.start().unwrap();
        sup.start().unwrap();

        assert!(sup.is_running());
        assert_eq!(launcher.launches(), 1);
        assert_eq!(sup.surface().refreshes.len(), 1);
        assert!(sup.surface().refreshes[0].running);
        assert_eq!(sup.status().pid, Some(1001));
    }

    #[tokio::test]
    async fn stop_when_stopped_is_noop() {
        let (mut sup, mut events, launcher) = supervisor();

        sup.stop();

        assert!(!sup.is_running());
        assert!(sup.surface().refreshes.is_empty());
        assert_eq!(launcher.launches(), 0);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn stop_kills_and_clears_state_immediately() {
        let (mut sup, mut events, launcher) = supervisor();
        sup.start().unwrap();

        sup.stop();
        assert!(!sup.is_running());
        assert_eq!(sup.surface().refreshes.len(), 2);
        assert!(!sup.surface().refreshes[1].running);

        // The observer reports the kill; it must not change anything.
        let event = next_event(&mut events).await;
        assert!(launcher.killed(0));
        assert!(matches!(
            event,
            SupervisorEvent::WorkerExited { generation: 1, .. }
        ));
        sup.handle_event(event);
        assert!(!sup.is_running());
        assert_eq!(sup.surface().refreshes.len(), 2);
        assert_eq!(launcher.launches(), 1);
    }

    #[tokio::test]
    async fn spawn_failure_stays_stopped() {
        let (mut sup, _events, launcher) = supervisor();
        launcher.fail_next();

        let err = sup.start().unwrap_err();
        assert!(matches!(err, SupervisorError::Spawn { .. }));
        assert!(!sup.is_running());
        assert!(sup.surface().refreshes.is_empty());

        // The operator can retry by hand.
        sup.start().unwrap();
        assert!(sup.is_running());
    }

    #[tokio::test]
    async fn toggle_server_flips_state() {
        let (mut sup, _events, launcher) = supervisor();

        sup.toggle_server();
        assert!(sup.is_running());
        sup.toggle_server();
        assert!(!sup.is_running());
        assert_eq!(launcher.launches(), 1);
    }

    // -- Exit observer --

    #[tokio::test]
    async fn crash_stops_without_respawn() {
        let (mut sup, mut events, launcher) = supervisor();
        sup.start().unwrap();

        launcher.exit(0, 1);
        let event = next_event(&mut events).await;
        match &event {
            SupervisorEvent::WorkerExited { generation, report } => {
                assert_eq!(*generation, 1);
                assert_eq!(report.as_ref().unwrap().code, Some(1));
            }
            other => panic!("unexpected event: {other:?}"),
        }
        sup.handle_event(event);

        assert!(!sup.is_running());
        let last = sup.surface().refreshes.last().unwrap();
        assert!(!last.running);
        assert_eq!(launcher.launches(), 1);

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(events.try_recv().is_err());
        assert_eq!(launcher.launches(), 1);
    }

    #[tokio::test]
    async fn stale_exit_does_not_stop_new_worker() {
        let (mut sup, mut events, launcher) = supervisor();
        sup.start().unwrap();
        sup.stop();
        sup.start().unwrap();
        assert_eq!(generation(&sup), Some(2));

        let event = next_event(&mut events).await;
        assert!(matches!(
            event,
            SupervisorEvent::WorkerExited { generation: 1, .. }
        ));
        sup.handle_event(event);

        assert!(sup.is_running());
        assert_eq!(generation(&sup), Some(2));
        assert_eq!(launcher.launches(), 2);
    }

    // -- Debug toggle --

    #[tokio::test]
    async fn debug_toggle_respawns_after_exit_ack() {
        let (mut sup, mut events, launcher) = supervisor();
        sup.start().unwrap();
        assert_eq!(launcher.policy(0), OutputPolicy::Discard);

        sup.toggle_debug_mode();
        assert!(sup.debug_mode());
        assert!(!sup.is_running());
        // One refresh for start, one for the stop that carries the new flag.
        assert_eq!(sup.surface().refreshes.len(), 2);
        let last = sup.surface().refreshes.last().unwrap();
        assert!(last.debug);
        assert!(!last.running);

        let event = next_event(&mut events).await;
        sup.handle_event(event);

        assert!(sup.is_running());
        assert_eq!(launcher.launches(), 2);
        assert_eq!(launcher.policy(1), OutputPolicy::Capture);

        // A late timer for the same restart is ignored.
        sup.handle_event(SupervisorEvent::RestartDue { ticket: 1 });
        assert_eq!(launcher.launches(), 2);
    }

    #[tokio::test]
    async fn debug_toggle_falls_back_to_delay() {
        let config = SupervisorConfig {
            restart_delay: Duration::from_millis(10),
            ..SupervisorConfig::default()
        };
        let (mut sup, mut events, launcher) =
            supervisor_with(config, Arc::new(FakeAutoLaunch::default()));

        // Nothing running, so only the timer can trigger the start.
        sup.toggle_debug_mode();
        assert!(!sup.is_running());
        assert_eq!(sup.surface().refreshes.len(), 1);
        assert!(sup.surface().refreshes[0].debug);

        let event = next_event(&mut events).await;
        assert_eq!(event, SupervisorEvent::RestartDue { ticket: 1 });
        sup.handle_event(event);

        assert!(sup.is_running());
        assert_eq!(launcher.policy(0), OutputPolicy::Capture);
    }

    #[tokio::test]
    async fn debug_toggle_timer_before_exit_ack_respawns_once() {
        let (mut sup, mut events, launcher) = supervisor();
        sup.start().unwrap();

        sup.toggle_debug_mode();
        assert!(!sup.is_running());

        // The fallback timer wins the race against the old worker's exit.
        sup.handle_event(SupervisorEvent::RestartDue { ticket: 1 });
        assert!(sup.is_running());
        assert_eq!(generation(&sup), Some(2));
        assert_eq!(launcher.launches(), 2);
        assert_eq!(launcher.policy(1), OutputPolicy::Capture);
        let refreshes = sup.surface().refreshes.len();

        // The late exit of generation 1 neither respawns nor stops anything.
        let event = next_event(&mut events).await;
        assert!(matches!(
            event,
            SupervisorEvent::WorkerExited { generation: 1, .. }
        ));
        sup.handle_event(event);

        assert!(sup.is_running());
        assert_eq!(generation(&sup), Some(2));
        assert_eq!(launcher.launches(), 2);
        assert_eq!(sup.surface().refreshes.len(), refreshes);
    }

    #[tokio::test]
    async fn shutdown_cancels_pending_restart() {
        let (mut sup, mut events, launcher) = supervisor();
        sup.start().unwrap();
        sup.toggle_debug_mode();
        sup.shutdown();

        let event = next_event(&mut events).await;
        sup.handle_event(event);
        assert!(!sup.is_running());
        assert_eq!(launcher.launches(), 1);
    }

    // -- Start on boot --

    #[tokio::test]
    async fn auto_launch_toggle_delegates() {
        let auto = Arc::new(FakeAutoLaunch::default());
        let (mut sup, _events, _launcher) =
            supervisor_with(SupervisorConfig::default(), Arc::clone(&auto));

        sup.toggle_auto_launch();
        assert!(sup.start_on_boot());
        assert!(sup.surface().refreshes.last().unwrap().start_on_boot);

        sup.toggle_auto_launch();
        assert!(!sup.start_on_boot());

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(*auto.calls.lock().unwrap(), vec![true, false]);
    }

    #[tokio::test]
    async fn auto_launch_failure_keeps_local_flag() {
        let auto = Arc::new(FakeAutoLaunch {
            fail: true,
            ..FakeAutoLaunch::default()
        });
        let (mut sup, _events, _launcher) =
            supervisor_with(SupervisorConfig::default(), Arc::clone(&auto));

        sup.toggle_auto_launch();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(sup.start_on_boot());
        assert_eq!(auto.calls.lock().unwrap().len(), 1);
    }

    // -- Worker output --

    #[tokio::test]
    async fn worker_messages_become_events() {
        let (mut sup, mut events, launcher) = supervisor();
        sup.start().unwrap();

        let mut stdout = launcher.take_stdout(0);
        stdout.write_all(b"plain output\n").await.unwrap();
        let line = WorkerMessage::ColorApplied {
            hex: "336699".into(),
        }
        .to_line()
        .unwrap();
        stdout.write_all(line.as_bytes()).await.unwrap();

        let event = next_event(&mut events).await;
        assert_eq!(
            event,
            SupervisorEvent::WorkerMessage {
                generation: 1,
                message: WorkerMessage::ColorApplied {
                    hex: "336699".into()
                },
            }
        );
        sup.handle_event(event);
        assert!(sup.is_running());
    }

    // -- Tray surface --

    #[tokio::test]
    async fn tray_handle_is_a_control_surface() {
        let (tray, _event_tx, mut updates) = TrayHandle::new(accent_tray::TrayConfig::default());
        let launcher = FakeLauncher::default();
        let (mut sup, _events) = Supervisor::new(
            SupervisorConfig::default(),
            launcher,
            tray,
            Arc::new(FakeAutoLaunch::default()),
        );

        sup.start().unwrap();
        match updates.try_recv().unwrap() {
            accent_tray::TrayUpdate::Refresh(state) => assert!(state.running),
            other => panic!("unexpected update: {other:?}"),
        }
        assert!(sup.surface().state().running);
    }
}
