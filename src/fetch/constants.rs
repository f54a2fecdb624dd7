//! Constants for the fetch module (timeouts, redirects, header names).

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default response timeout (5 minutes for large archives).
pub const RESPONSE_TIMEOUT_SECS: u64 = 300;

/// Default idle timeout for pooled connections.
pub const POOL_IDLE_TIMEOUT_SECS: u64 = 90;

/// Upper bound accepted for any configured timeout (1 hour).
pub const MAX_TIMEOUT_SECS: u64 = 3600;

/// Default maximum number of redirect hops followed per request.
pub const DEFAULT_MAX_REDIRECTS: usize = 10;

/// Header carrying the per-handle session identifier.
pub const FETCH_SESSION_HEADER: &str = "x-fetch-session";

/// Number of body chunks buffered between the network stage and the disk writer.
pub const WRITE_CHANNEL_CAPACITY: usize = 16;

/// Phase reported when the HEAD probe fails.
pub const PHASE_EXTRACTING_FILENAME: &str = "Extracting filename";

/// Phase reported when the GET transfer fails.
pub const PHASE_DOWNLOADING_FILE: &str = "Downloading file";
