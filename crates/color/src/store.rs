//! The configuration store capability and an in-memory implementation.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use crate::StoreError;

/// A boxed future returned by store methods.
pub type StoreFuture<'a> = Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + 'a>>;

/// A typed registry value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryValue {
    Dword(u32),
    Binary(Vec<u8>),
    String(String),
}

impl RegistryValue {
    /// The `reg.exe` type name for this value.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Dword(_) => "REG_DWORD",
            Self::Binary(_) => "REG_BINARY",
            Self::String(_) => "REG_SZ",
        }
    }
}

/// One value to set under a key of the per-user hive.
///
/// `key` is relative to `HKEY_CURRENT_USER`; there is deliberately no way
/// to address another hive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryWrite {
    pub key: &'static str,
    pub name: &'static str,
    pub value: RegistryValue,
}

impl RegistryWrite {
    pub fn new(key: &'static str, name: &'static str, value: RegistryValue) -> Self {
        Self { key, name, value }
    }

    /// Fully qualified key path, e.g. `HKCU\Software\...`.
    pub fn full_key(&self) -> String {
        format!(r"HKCU\{}", self.key)
    }
}

impl fmt::Display for RegistryWrite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\\{}", self.full_key(), self.name)
    }
}

/// An ordered set of writes that succeed or fail as one result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    writes: Vec<RegistryWrite>,
}

impl WriteBatch {
    pub fn writes(&self) -> &[RegistryWrite] {
        &self.writes
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}

impl FromIterator<RegistryWrite> for WriteBatch {
    fn from_iter<I: IntoIterator<Item = RegistryWrite>>(iter: I) -> Self {
        Self {
            writes: iter.into_iter().collect(),
        }
    }
}

/// Capability for mutating the per-user configuration store.
///
/// `write_batch` attempts every write and reports one aggregated result.
/// `broadcast_change` asks running shell components to re-read settings.
/// Neither operation reads values back.
pub trait ConfigStoreWriter: Send + Sync + 'static {
    fn write_batch<'a>(&'a self, batch: &'a WriteBatch) -> StoreFuture<'a>;

    fn broadcast_change(&self) -> StoreFuture<'_>;
}

impl<T: ConfigStoreWriter> ConfigStoreWriter for Arc<T> {
    fn write_batch<'a>(&'a self, batch: &'a WriteBatch) -> StoreFuture<'a> {
        (**self).write_batch(batch)
    }

    fn broadcast_change(&self) -> StoreFuture<'_> {
        (**self).broadcast_change()
    }
}

/// In-memory store that records what it was asked to do.
///
/// Clones share state, so a test can keep one handle while the applier
/// owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    writes: Vec<RegistryWrite>,
    broadcasts: usize,
    fail_writes: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following `write_batch` fail with `reason`.
    pub fn fail_writes(&self, reason: impl Into<String>) {
        self.lock().fail_writes = Some(reason.into());
    }

    /// All writes recorded so far, in order.
    pub fn writes(&self) -> Vec<RegistryWrite> {
        self.lock().writes.clone()
    }

    /// Latest value written to `key\name`, if any.
    pub fn value(&self, key: &str, name: &str) -> Option<RegistryValue> {
        self.lock()
            .writes
            .iter()
            .rev()
            .find(|w| w.key == key && w.name == name)
            .map(|w| w.value.clone())
    }

    pub fn broadcasts(&self) -> usize {
        self.lock().broadcasts
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        // A poisoned lock only means a test panicked mid-write.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl ConfigStoreWriter for MemoryStore {
    fn write_batch<'a>(&'a self, batch: &'a WriteBatch) -> StoreFuture<'a> {
        Box::pin(async move {
            let mut state = self.lock();
            if let Some(reason) = &state.fail_writes {
                return Err(StoreError::Batch {
                    total: batch.len(),
                    failures: batch.writes().iter().map(|w| format!("{w}: {reason}")).collect(),
                });
            }
            state.writes.extend(batch.writes().iter().cloned());
            Ok(())
        })
    }

    fn broadcast_change(&self) -> StoreFuture<'_> {
        Box::pin(async move {
            self.lock().broadcasts += 1;
            Ok(())
        })
    }
}
