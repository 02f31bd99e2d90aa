//! Constants for the fetch module (size limit, timeouts).

/// Maximum accepted image size in bytes (5 MiB).
///
/// Enforced twice: against the declared Content-Length before the body
/// transfer starts, and against the running byte count while streaming.
pub const MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

/// HTTP connect timeout (10 seconds).
///
/// Bounds connection establishment and receipt of the response headers.
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Overall request deadline (60 seconds).
///
/// Bounds body streaming; transfers are capped at [`MAX_IMAGE_BYTES`]
/// anyway, so this only catches stalled connections.
pub const READ_TIMEOUT_SECS: u64 = 60;
