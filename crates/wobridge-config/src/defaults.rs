//! Built-in defaults shared by the daemon and the proxy core.

use crate::logging::LogFormat;

/// Default address the daemon listens on for JSON-RPC clients.
pub const DEFAULT_LISTEN_ADDRESS: &str = "127.0.0.1:9780";

/// Default log filter expression.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Identifier width of the reference profile, in bytes.
///
/// Identifiers travel hex-encoded, so the reference profile expects 64
/// characters.
pub const DEFAULT_IDENTIFIER_BYTES: usize = 32;

/// Upper bound on a single get-result wait, in seconds.
pub const DEFAULT_RESULT_TIMEOUT_SECS: u64 = 30;

/// Default listen address as an owned value.
pub fn default_listen_address() -> String {
    DEFAULT_LISTEN_ADDRESS.to_owned()
}

/// Default log filter expression.
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format.
pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Default identifier width in bytes.
pub const fn default_identifier_bytes() -> usize {
    DEFAULT_IDENTIFIER_BYTES
}

/// Default get-result timeout in seconds.
pub const fn default_result_timeout_secs() -> u64 {
    DEFAULT_RESULT_TIMEOUT_SECS
}
