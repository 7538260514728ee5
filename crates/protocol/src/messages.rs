//! Messages the worker sends to its supervisor.
//!
//! The channel is informational only: one JSON object per line on the
//! worker's stdout. Anything that does not parse is ordinary output.

use serde::{Deserialize, Serialize};

/// A structured notification from the color service worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WorkerMessage {
    /// A color was written to the configuration store.
    ///
    /// `hex` holds the six digits without the leading `#`.
    ColorApplied { hex: String },
}

impl WorkerMessage {
    /// Encodes the message as a single newline-terminated JSON line.
    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }

    /// Parses one line of worker output, returning `None` for plain text.
    pub fn parse_line(line: &str) -> Option<Self> {
        let trimmed = line.trim();
        if !trimmed.starts_with('{') {
            return None;
        }
        serde_json::from_str(trimmed).ok()
    }
}
