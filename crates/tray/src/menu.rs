//! Dynamic context menu for the system tray.

/// Actions that can be triggered from the tray context menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    ToggleDebug,
    ToggleStartOnBoot,
    /// Start the server if stopped, stop it if running.
    ToggleServer,
    /// Stop the server and quit.
    Exit,
}

/// A single menu item.
#[derive(Debug, Clone)]
pub struct MenuItem {
    /// Display text.
    pub label: String,
    /// Whether the item is enabled (clickable).
    pub enabled: bool,
    /// Optional action triggered on click.
    pub action: Option<MenuAction>,
}

impl MenuItem {
    fn action(label: &str, action: MenuAction) -> Self {
        Self {
            label: label.into(),
            enabled: true,
            action: Some(action),
        }
    }

    fn separator() -> Self {
        Self {
            label: String::new(),
            enabled: false,
            action: None,
        }
    }

    /// Separators are represented as disabled empty items.
    pub fn is_separator(&self) -> bool {
        self.label.is_empty() && self.action.is_none()
    }
}

/// Which tray icon to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayIcon {
    /// Server running.
    Active,
    /// Server stopped.
    Idle,
}

/// Current state used to build the context menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuState {
    /// Tooltip and header text.
    pub app_name: String,
    /// Whether the color service worker is running.
    pub running: bool,
    /// Whether worker output is captured and logged.
    pub debug: bool,
    /// Whether the app is registered to start on boot.
    pub start_on_boot: bool,
}

impl Default for MenuState {
    fn default() -> Self {
        Self {
            app_name: "Accent Tray Server".into(),
            running: false,
            debug: false,
            start_on_boot: false,
        }
    }
}

impl MenuState {
    pub fn icon(&self) -> TrayIcon {
        if self.running {
            TrayIcon::Active
        } else {
            TrayIcon::Idle
        }
    }

    /// Builds the menu items from the current state.
    pub fn build_menu(&self) -> Vec<MenuItem> {
        let status = if self.running { "Running" } else { "Stopped" };
        let debug = if self.debug {
            "Disable Debug"
        } else {
            "Enable Debug"
        };
        let boot = if self.start_on_boot {
            "Disable Start On Startup"
        } else {
            "Enable Start On Startup"
        };
        let server = if self.running {
            "Stop Server"
        } else {
            "Start Server"
        };

        vec![
            MenuItem {
                label: format!("{} — {status}", self.app_name),
                enabled: false,
                action: None,
            },
            MenuItem::separator(),
            MenuItem::action(debug, MenuAction::ToggleDebug),
            MenuItem::action(boot, MenuAction::ToggleStartOnBoot),
            MenuItem::separator(),
            MenuItem::action(server, MenuAction::ToggleServer),
            MenuItem::separator(),
            MenuItem::action("Exit", MenuAction::Exit),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(state: &MenuState) -> Vec<String> {
        state.build_menu().into_iter().map(|i| i.label).collect()
    }

    #[test]
    fn default_menu_state() {
        let state = MenuState::default();
        assert!(!state.running);
        assert!(!state.debug);
        assert!(!state.start_on_boot);
        assert_eq!(state.icon(), TrayIcon::Idle);
    }

    #[test]
    fn build_menu_stopped() {
        let items = labels(&MenuState::default());
        assert!(items[0].contains("Stopped"));
        assert!(items.contains(&"Start Server".to_string()));
        assert!(items.contains(&"Enable Debug".to_string()));
        assert!(items.contains(&"Enable Start On Startup".to_string()));
    }

    #[test]
    fn build_menu_running_with_toggles_on() {
        let state = MenuState {
            running: true,
            debug: true,
            start_on_boot: true,
            ..MenuState::default()
        };
        let items = labels(&state);
        assert!(items[0].contains("Running"));
        assert!(items.contains(&"Stop Server".to_string()));
        assert!(items.contains(&"Disable Debug".to_string()));
        assert!(items.contains(&"Disable Start On Startup".to_string()));
        assert_eq!(state.icon(), TrayIcon::Active);
    }

    #[test]
    fn exit_is_last_and_enabled() {
        let items = MenuState::default().build_menu();
        let last = items.last().unwrap();
        assert_eq!(last.action, Some(MenuAction::Exit));
        assert!(last.enabled);
    }

    #[test]
    fn every_action_appears_once() {
        let items = MenuState::default().build_menu();
        for action in [
            MenuAction::ToggleDebug,
            MenuAction::ToggleStartOnBoot,
            MenuAction::ToggleServer,
            MenuAction::Exit,
        ] {
            let count = items.iter().filter(|i| i.action == Some(action)).count();
            assert_eq!(count, 1, "{action:?}");
        }
    }

    #[test]
    fn header_and_separators_are_disabled() {
        let items = MenuState::default().build_menu();
        assert!(!items[0].enabled);
        assert_eq!(items.iter().filter(|i| i.is_separator()).count(), 3);
        assert!(items.iter().filter(|i| i.is_separator()).all(|i| !i.enabled));
    }
}
