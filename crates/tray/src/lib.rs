//! System tray control surface for the accent tray server.
//!
//! Models the context menu (run state, debug capture, start-on-boot, exit)
//! and the channels that connect a tray backend to the supervisor:
//! - [`TrayEvent`]: clicks from the tray to the supervisor loop
//! - [`TrayUpdate`]: fresh menu state from the supervisor to the tray
//!
//! The GUI backend itself is platform-specific and lives outside this
//! crate; it only needs to render [`MenuState::build_menu`] and forward
//! clicks as [`TrayEvent`]s.

mod menu;
mod tray;

pub use menu::{MenuAction, MenuItem, MenuState, TrayIcon};
pub use tray::{TrayConfig, TrayEvent, TrayHandle, TrayUpdate};
