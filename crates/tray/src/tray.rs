//! Tray handle, events, and update types.
//!
//! The system tray GUI needs platform libraries (Shell_NotifyIcon,
//! StatusNotifierItem) and usually the main thread. This module defines the
//! channel-based interface the supervisor uses to talk to it, independent
//! of the GUI backend.

use tokio::sync::mpsc;

use crate::menu::{MenuAction, MenuState};

/// Configuration for the system tray.
#[derive(Debug, Clone)]
pub struct TrayConfig {
    /// Display name shown in the tray tooltip.
    pub app_name: String,
}

impl Default for TrayConfig {
    fn default() -> Self {
        Self {
            app_name: MenuState::default().app_name,
        }
    }
}

/// Events emitted by the tray to the supervisor loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayEvent {
    ToggleDebug,
    ToggleStartOnBoot,
    ToggleServer,
    QuitRequested,
}

impl From<MenuAction> for TrayEvent {
    fn from(action: MenuAction) -> Self {
        match action {
            MenuAction::ToggleDebug => Self::ToggleDebug,
            MenuAction::ToggleStartOnBoot => Self::ToggleStartOnBoot,
            MenuAction::ToggleServer => Self::ToggleServer,
            MenuAction::Exit => Self::QuitRequested,
        }
    }
}

/// Updates sent from the supervisor to the tray.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrayUpdate {
    /// Re-render the menu and icon from this state.
    Refresh(MenuState),
    /// Remove the icon and stop the tray loop.
    Shutdown,
}

/// Supervisor side of the tray interface.
///
/// The tray backend holds the opposite ends of both channels.
#[derive(Debug)]
pub struct TrayHandle {
    update_tx: mpsc::UnboundedSender<TrayUpdate>,
    event_rx: mpsc::UnboundedReceiver<TrayEvent>,
    /// Last state pushed to the tray.
    state: MenuState,
}

impl TrayHandle {
    /// Creates a new tray handle with its channel pair.
    ///
    /// Returns `(handle, event_sender, update_receiver)`; the sender and
    /// receiver go to the tray backend.
    pub fn new(
        config: TrayConfig,
    ) -> (
        Self,
        mpsc::UnboundedSender<TrayEvent>,
        mpsc::UnboundedReceiver<TrayUpdate>,
    ) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let handle = Self {
            update_tx,
            event_rx,
            state: MenuState {
                app_name: config.app_name,
                ..MenuState::default()
            },
        };

        (handle, event_tx, update_rx)
    }

    /// Pushes a new menu state to the tray.
    ///
    /// The app name is kept from the handle's configuration.
    pub fn refresh(&mut self, running: bool, debug: bool, start_on_boot: bool) {
        self.state.running = running;
        self.state.debug = debug;
        self.state.start_on_boot = start_on_boot;
        if self
            .update_tx
            .send(TrayUpdate::Refresh(self.state.clone()))
            .is_err()
        {
            tracing::debug!("tray backend gone, dropping refresh");
        }
    }

    /// Requests the tray to shut down.
    pub fn shutdown(&self) {
        let _ = self.update_tx.send(TrayUpdate::Shutdown);
    }

    /// Waits for the next tray event. Returns `None` once the backend is gone.
    pub async fn recv_event(&mut self) -> Option<TrayEvent> {
        self.event_rx.recv().await
    }

    /// Tries to receive a tray event (non-blocking).
    pub fn try_recv_event(&mut self) -> Option<TrayEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Returns the last pushed menu state.
    pub fn state(&self) -> &MenuState {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tray_handle_creation() {
        let config = TrayConfig {
            app_name: "Test".into(),
        };
        let (handle, _event_tx, _update_rx) = TrayHandle::new(config);
        assert_eq!(handle.state().app_name, "Test");
        assert!(!handle.state().running);
    }

    #[test]
    fn refresh_sends_full_state() {
        let (mut handle, _event_tx, mut update_rx) = TrayHandle::new(TrayConfig::default());

        handle.refresh(true, false, true);
        assert!(handle.state().running);

        match update_rx.try_recv().unwrap() {
            TrayUpdate::Refresh(state) => {
                assert!(state.running);
                assert!(!state.debug);
                assert!(state.start_on_boot);
            }
            other => panic!("unexpected update: {other:?}"),
        }
    }

    #[test]
    fn refresh_without_backend_does_not_panic() {
        let (mut handle, _event_tx, update_rx) = TrayHandle::new(TrayConfig::default());
        drop(update_rx);
        handle.refresh(true, true, true);
        assert!(handle.state().debug);
    }

    #[tokio::test]
    async fn tray_handle_events() {
        let (mut handle, event_tx, _update_rx) = TrayHandle::new(TrayConfig::default());

        // No events yet.
        assert!(handle.try_recv_event().is_none());

        event_tx.send(MenuAction::ToggleServer.into()).unwrap();
        event_tx.send(TrayEvent::QuitRequested).unwrap();
        assert_eq!(handle.recv_event().await, Some(TrayEvent::ToggleServer));
        assert_eq!(handle.try_recv_event(), Some(TrayEvent::QuitRequested));

        drop(event_tx);
        assert_eq!(handle.recv_event().await, None);
    }

    #[test]
    fn tray_handle_shutdown() {
        let (handle, _event_tx, mut update_rx) = TrayHandle::new(TrayConfig::default());

        handle.shutdown();
        assert_eq!(update_rx.try_recv().unwrap(), TrayUpdate::Shutdown);
    }

    #[test]
    fn menu_actions_map_to_events() {
        assert_eq!(TrayEvent::from(MenuAction::Exit), TrayEvent::QuitRequested);
        assert_eq!(
            TrayEvent::from(MenuAction::ToggleStartOnBoot),
            TrayEvent::ToggleStartOnBoot
        );
    }
}
