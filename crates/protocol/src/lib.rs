pub mod constants;
pub mod messages;

// Re-export primary types for convenience.
pub use constants::{APP_NAME, DEFAULT_PORT, SET_COLOR_PATH};
pub use messages::WorkerMessage;
