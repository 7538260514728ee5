//! Supervisor loop: wires the worker launcher, tray, and start-on-boot
//! registration together.

use std::sync::Arc;

use accent_protocol::APP_NAME;
use accent_supervisor::{
    AutoLaunch, ControlSurface, Launcher, ProcessLauncher, RunKeyAutoLaunch, Supervisor,
    SupervisorConfig,
};
use accent_tray::{TrayConfig, TrayEvent, TrayHandle, TrayUpdate};
use tokio::sync::mpsc;

use crate::config::Config;

/// Runs the supervisor until quit is requested.
pub async fn run(config: Config) -> anyhow::Result<()> {
    // -- Start on boot --
    let auto_launch = Arc::new(RunKeyAutoLaunch::for_current_exe(APP_NAME)?);
    let start_on_boot = match auto_launch.is_enabled().await {
        Ok(enabled) => enabled,
        Err(e) => {
            tracing::warn!("could not read start-on-boot state: {e}");
            false
        }
    };

    // -- Tray --
    let tray_config = TrayConfig {
        app_name: APP_NAME.into(),
    };
    // The event sender belongs to a GUI tray backend, which lives outside
    // this workspace. Holding it keeps `recv_event` pending instead of
    // reporting a closed channel.
    let (tray, _event_tx, update_rx) = TrayHandle::new(tray_config);
    tokio::spawn(log_tray_updates(update_rx));

    // -- Supervisor --
    let launcher = ProcessLauncher::current_exe(config.serve_args().to_args())?;
    let supervisor_config = SupervisorConfig {
        debug: config.debug,
        start_on_boot,
        restart_delay: config.restart_delay(),
    };
    let (mut supervisor, mut events) =
        Supervisor::new(supervisor_config, launcher, tray, auto_launch);

    supervisor.refresh();
    if let Err(e) = supervisor.start() {
        // Stays stopped; the operator can start it from the tray.
        tracing::error!("initial worker start failed: {e}");
    }

    tracing::info!(port = config.port, "tray server ready");

    // -- Main loop --
    loop {
        tokio::select! {
            Some(event) = events.recv() => supervisor.handle_event(event),
            Some(event) = supervisor.surface_mut().recv_event() => {
                if !dispatch(&mut supervisor, event) {
                    tracing::info!("quit requested via tray");
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("SIGINT received, shutting down");
                break;
            }
        }
    }

    // -- Graceful shutdown --
    supervisor.shutdown();
    supervisor.surface().shutdown();
    Ok(())
}

/// Applies one tray click. Returns `false` when the app should exit.
fn dispatch<L: Launcher, C: ControlSurface>(
    supervisor: &mut Supervisor<L, C>,
    event: TrayEvent,
) -> bool {
    match event {
        TrayEvent::ToggleDebug => supervisor.toggle_debug_mode(),
        TrayEvent::ToggleStartOnBoot => supervisor.toggle_auto_launch(),
        TrayEvent::ToggleServer => supervisor.toggle_server(),
        TrayEvent::QuitRequested => return false,
    }
    true
}

/// Stand-in for the tray backend's render side: logs each menu state until
/// shutdown.
///
/// A GUI backend that draws the icon and sends [`TrayEvent`]s for clicks is
/// platform-specific and lives outside this workspace, as `accent_tray`
/// documents.
async fn log_tray_updates(mut updates: mpsc::UnboundedReceiver<TrayUpdate>) {
    while let Some(update) = updates.recv().await {
        match update {
            TrayUpdate::Refresh(state) => {
                let labels: Vec<String> = state
                    .build_menu()
                    .into_iter()
                    .filter(|item| !item.is_separator())
                    .map(|item| item.label)
                    .collect();
                tracing::info!(
                    running = state.running,
                    debug = state.debug,
                    start_on_boot = state.start_on_boot,
                    icon = ?state.icon(),
                    menu = ?labels,
                    "tray updated"
                );
            }
            TrayUpdate::Shutdown => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use accent_supervisor::AutoLaunchFuture;

    struct NoAutoLaunch;

    impl AutoLaunch for NoAutoLaunch {
        fn is_enabled(&self) -> AutoLaunchFuture<'_, bool> {
            Box::pin(async { Ok(false) })
        }

        fn set_enabled(&self, _enabled: bool) -> AutoLaunchFuture<'_, ()> {
            Box::pin(async { Ok(()) })
        }
    }

    fn supervisor() -> Supervisor<ProcessLauncher, TrayHandle> {
        let launcher = ProcessLauncher::new("accent-tray-no-such-worker", vec![]);
        let (tray, _event_tx, _updates) = TrayHandle::new(TrayConfig::default());
        let (supervisor, _events) = Supervisor::new(
            SupervisorConfig::default(),
            launcher,
            tray,
            Arc::new(NoAutoLaunch),
        );
        supervisor
    }

    #[tokio::test]
    async fn quit_ends_the_loop() {
        let mut sup = supervisor();
        assert!(!dispatch(&mut sup, TrayEvent::QuitRequested));
    }

    #[tokio::test]
    async fn toggles_keep_the_loop_running() {
        let mut sup = supervisor();

        assert!(dispatch(&mut sup, TrayEvent::ToggleStartOnBoot));
        assert!(sup.start_on_boot());

        assert!(dispatch(&mut sup, TrayEvent::ToggleDebug));
        assert!(sup.debug_mode());
        assert!(sup.surface().state().debug);
    }

    #[tokio::test]
    async fn failed_server_toggle_stays_stopped() {
        let mut sup = supervisor();
        assert!(dispatch(&mut sup, TrayEvent::ToggleServer));
        assert!(!sup.is_running());
    }
}
