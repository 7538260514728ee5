use std::time::Duration;

/// Port the color service listens on unless configured otherwise.
///
/// Any client issuing `/setcolor` requests must use the same value.
pub const DEFAULT_PORT: u16 = 28546;

/// The only meaningful route exposed by the color service.
pub const SET_COLOR_PATH: &str = "/setcolor";

/// Query parameter carrying the color on [`SET_COLOR_PATH`].
pub const HEX_QUERY_PARAM: &str = "hex";

/// Name used for the start-on-boot registration and the tray tooltip.
pub const APP_NAME: &str = "AccentTrayServer";

/// Fallback delay between stopping and respawning the worker after a
/// debug toggle, used when no exit acknowledgement arrives first.
pub const DEFAULT_RESTART_DELAY: Duration = Duration::from_millis(200);
