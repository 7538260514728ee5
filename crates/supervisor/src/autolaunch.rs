//! Start-on-boot registration.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use crate::AutoLaunchError;

/// A boxed future returned by [`AutoLaunch`] methods.
pub type AutoLaunchFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, AutoLaunchError>> + Send + 'a>>;

/// Key under `HKEY_CURRENT_USER` listing programs started at logon.
pub const RUN_KEY: &str = r"Software\Microsoft\Windows\CurrentVersion\Run";

/// Collaborator that registers the app to start on boot.
pub trait AutoLaunch: Send + Sync + 'static {
    fn is_enabled(&self) -> AutoLaunchFuture<'_, bool>;

    fn set_enabled(&self, enabled: bool) -> AutoLaunchFuture<'_, ()>;
}

/// Registers the app under the per-user `Run` key.
#[derive(Debug, Clone)]
pub struct RunKeyAutoLaunch {
    name: String,
    command: String,
}

impl RunKeyAutoLaunch {
    /// Registers `exe` under the value name `name`.
    pub fn new(name: impl Into<String>, exe: &Path) -> Self {
        Self {
            name: name.into(),
            command: format!("\"{}\"", exe.display()),
        }
    }

    /// Registers the running executable.
    pub fn for_current_exe(name: impl Into<String>) -> Result<Self, AutoLaunchError> {
        let exe = std::env::current_exe().map_err(AutoLaunchError::ExePath)?;
        Ok(Self::new(name, &exe))
    }
}

impl AutoLaunch for RunKeyAutoLaunch {
    fn is_enabled(&self) -> AutoLaunchFuture<'_, bool> {
        Box::pin(async move { run_key::contains(&self.name) })
    }

    fn set_enabled(&self, enabled: bool) -> AutoLaunchFuture<'_, ()> {
        Box::pin(async move {
            if enabled {
                run_key::insert(&self.name, &self.command)?;
            } else {
                run_key::remove(&self.name)?;
            }
            tracing::info!(name = %self.name, enabled, "start-on-boot updated");
            Ok(())
        })
    }
}

#[cfg(windows)]
mod run_key {
    use std::io;

    use winreg::RegKey;
    use winreg::enums::{HKEY_CURRENT_USER, KEY_QUERY_VALUE, KEY_SET_VALUE};

    use super::RUN_KEY;
    use crate::AutoLaunchError;

    fn open(flags: u32) -> io::Result<RegKey> {
        RegKey::predef(HKEY_CURRENT_USER).open_subkey_with_flags(RUN_KEY, flags)
    }

    pub(super) fn contains(name: &str) -> Result<bool, AutoLaunchError> {
        let key = match open(KEY_QUERY_VALUE) {
            Ok(key) => key,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(AutoLaunchError::Registry(e)),
        };
        match key.get_value::<String, _>(name) {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(AutoLaunchError::Registry(e)),
        }
    }

    pub(super) fn insert(name: &str, command: &str) -> Result<(), AutoLaunchError> {
        let key = open(KEY_SET_VALUE).map_err(AutoLaunchError::Registry)?;
        key.set_value(name, &command.to_owned())
            .map_err(AutoLaunchError::Registry)
    }

    pub(super) fn remove(name: &str) -> Result<(), AutoLaunchError> {
        let key = open(KEY_SET_VALUE).map_err(AutoLaunchError::Registry)?;
        match key.delete_value(name) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AutoLaunchError::Registry(e)),
        }
    }
}

#[cfg(not(windows))]
mod run_key {
    use crate::AutoLaunchError;

    pub(super) fn contains(_name: &str) -> Result<bool, AutoLaunchError> {
        Ok(false)
    }

    pub(super) fn insert(_name: &str, _command: &str) -> Result<(), AutoLaunchError> {
        Err(AutoLaunchError::Unsupported)
    }

    pub(super) fn remove(_name: &str) -> Result<(), AutoLaunchError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn launcher() -> RunKeyAutoLaunch {
        RunKeyAutoLaunch::new("AccentTrayServer", Path::new(r"C:\Apps\accent tray.exe"))
    }

    #[test]
    fn command_is_quoted() {
        assert_eq!(launcher().command, r#""C:\Apps\accent tray.exe""#);
    }

    #[test]
    fn run_key_is_relative_to_current_user() {
        assert!(!RUN_KEY.starts_with("HK"));
        assert!(RUN_KEY.ends_with(r"\CurrentVersion\Run"));
    }

    #[cfg(not(windows))]
    #[tokio::test]
    async fn registration_is_windows_only() {
        let l = launcher();
        assert!(!l.is_enabled().await.unwrap());
        assert!(matches!(
            l.set_enabled(true).await,
            Err(AutoLaunchError::Unsupported)
        ));
        l.set_enabled(false).await.unwrap();
    }
}
