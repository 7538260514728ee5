//! Tray server configuration.
//!
//! Configuration is stored as TOML:
//! - Linux: `~/.config/accent-tray/config.toml`
//! - Windows: `%APPDATA%/accent-tray/config.toml`

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use accent_protocol::DEFAULT_PORT;
use accent_protocol::constants::DEFAULT_RESTART_DELAY;

use crate::cli::ServeArgs;

/// Tray server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Loopback port of the color service. Clients must use the same one.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Let browser callers on other origins reach `/setcolor`.
    #[serde(default)]
    pub allow_cross_origin: bool,

    /// Capture and log the worker's output on start.
    #[serde(default)]
    pub debug: bool,

    /// Longest wait before respawning the worker after a debug toggle.
    #[serde(default = "default_restart_delay_ms")]
    pub restart_delay_ms: u64,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_restart_delay_ms() -> u64 {
    DEFAULT_RESTART_DELAY.as_millis() as u64
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            allow_cross_origin: false,
            debug: false,
            restart_delay_ms: default_restart_delay_ms(),
        }
    }
}

impl Config {
    /// Loads configuration from `path` (or the default location), creating
    /// a default file if none exists.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => config_path()?,
        };
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Saves the configuration to `path`.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    pub fn restart_delay(&self) -> Duration {
        Duration::from_millis(self.restart_delay_ms)
    }

    /// Settings handed to the spawned worker.
    pub fn serve_args(&self) -> ServeArgs {
        ServeArgs {
            port: self.port,
            cors: self.allow_cross_origin,
        }
    }
}

/// Per-user lock file held by the running supervisor.
///
/// Lives next to the default configuration file so a `--config` override
/// does not allow a second instance.
pub fn lock_path() -> anyhow::Result<PathBuf> {
    Ok(config_path()?.with_file_name("instance.lock"))
}

/// Returns the platform-specific configuration file path.
fn config_path() -> anyhow::Result<PathBuf> {
    #[cfg(target_os = "linux")]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        Ok(PathBuf::from(home)
            .join(".config")
            .join("accent-tray")
            .join("config.toml"))
    }

    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        Ok(PathBuf::from(appdata)
            .join("accent-tray")
            .join("config.toml"))
    }

    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    {
        Ok(PathBuf::from("/tmp/accent-tray/config.toml"))
    }
}
