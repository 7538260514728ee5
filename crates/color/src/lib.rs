//! Accent color application for the Windows desktop shell.
//!
//! A color string is parsed into a [`ColorDescriptor`], expanded into the
//! handful of encodings the shell expects ([`RegistryEncoding`]), and written
//! as one [`WriteBatch`] through a [`ConfigStoreWriter`]. All writes target
//! the per-user hive; nothing here requires elevation.
//!
//! The store is a capability so tests can swap the `reg.exe` backend
//! ([`RegCommandStore`]) for an in-memory one ([`MemoryStore`]).

pub mod command;

mod applier;
mod descriptor;
mod encoding;
mod reg;
mod store;

pub use applier::{ColorApplier, accent_batch};
pub use descriptor::ColorDescriptor;
pub use encoding::{Channels, PALETTE_SWATCHES, RegistryEncoding};
pub use reg::{RegCommandStore, reg_add_args};
pub use store::{
    ConfigStoreWriter, MemoryStore, RegistryValue, RegistryWrite, StoreFuture, WriteBatch,
};

/// Errors produced by a configuration store backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} exited with {status}: {stderr}")]
    Command {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("{} of {total} writes failed: {}", .failures.len(), .failures.join("; "))]
    Batch { total: usize, failures: Vec<String> },
}

/// Errors produced by [`ColorApplier::apply`].
#[derive(Debug, thiserror::Error)]
pub enum ApplyError {
    #[error("invalid color format {0:?}, use #RRGGBB")]
    InvalidFormat(String),

    #[error("failed to write accent color: {0}")]
    StoreWrite(#[from] StoreError),
}
