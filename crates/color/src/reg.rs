//! Configuration store backed by the `reg` and `rundll32` utilities.

use crate::StoreError;
use crate::command;
use crate::store::{ConfigStoreWriter, RegistryValue, RegistryWrite, StoreFuture, WriteBatch};

const REG: &str = "reg";
const RUNDLL32: &str = "RUNDLL32.EXE";

/// Arguments that make running shell components re-read per-user settings
/// without restarting Explorer.
const REFRESH_ARGS: &[&str] = &["user32.dll,UpdatePerUserSystemParameters", ",1", ",True"];

/// Writes values with one `reg add` invocation each.
///
/// Arguments are passed as a vector, never through a shell, so color data
/// cannot be interpreted as commands. No timeout is applied; a hung `reg`
/// blocks the calling request only.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegCommandStore;

impl RegCommandStore {
    pub fn new() -> Self {
        Self
    }
}

/// Builds the `reg add` argument list for one write.
pub fn reg_add_args(write: &RegistryWrite) -> Vec<String> {
    let data = match &write.value {
        RegistryValue::Dword(v) => v.to_string(),
        RegistryValue::Binary(bytes) => bytes.iter().map(|b| format!("{b:02X}")).collect(),
        RegistryValue::String(s) => s.clone(),
    };

    vec![
        "add".into(),
        write.full_key(),
        "/v".into(),
        write.name.into(),
        "/t".into(),
        write.value.type_name().into(),
        "/d".into(),
        data,
        "/f".into(),
    ]
}

impl ConfigStoreWriter for RegCommandStore {
    fn write_batch<'a>(&'a self, batch: &'a WriteBatch) -> StoreFuture<'a> {
        Box::pin(async move {
            let mut failures = Vec::new();

            for write in batch.writes() {
                if let Err(e) = command::run_checked(REG, &reg_add_args(write)).await {
                    tracing::error!(value = %write, "registry write failed: {e}");
                    failures.push(format!("{write}: {e}"));
                }
            }

            if failures.is_empty() {
                tracing::debug!(count = batch.len(), "registry batch written");
                Ok(())
            } else {
                Err(StoreError::Batch {
                    total: batch.len(),
                    failures,
                })
            }
        })
    }

    fn broadcast_change(&self) -> StoreFuture<'_> {
        Box::pin(async move {
            let args: Vec<String> = REFRESH_ARGS.iter().map(|s| s.to_string()).collect();
            command::run_checked(RUNDLL32, &args).await
        })
    }
}
