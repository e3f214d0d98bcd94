//! Shared configuration for the work order bridge.
//!
//! Configuration is layered by [`ortho_config`]: built-in defaults, then an
//! optional TOML file (`--config-path` or `WOBRIDGE_CONFIG_PATH`), then
//! `WOBRIDGE_*` environment variables, then command-line flags. The daemon
//! consumes the whole [`Config`]; the proxy core only sees the
//! [`BackendProfile`] slice.

mod defaults;
mod logging;
mod profile;

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_IDENTIFIER_BYTES, DEFAULT_LISTEN_ADDRESS, DEFAULT_LOG_FILTER,
    DEFAULT_RESULT_TIMEOUT_SECS, default_identifier_bytes, default_listen_address,
    default_log_filter, default_log_filter_string, default_log_format,
    default_result_timeout_secs,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use profile::BackendProfile;

/// Resolved configuration for the bridge daemon.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "WOBRIDGE")]
pub struct Config {
    /// Socket address the daemon binds for JSON-RPC clients.
    #[ortho_config(default = defaults::default_listen_address())]
    pub listen_address: String,
    /// Endpoint used for reads and submissions against the ledger.
    pub ledger_provider: Option<String>,
    /// Endpoint used for completion-event subscriptions.
    pub event_provider: Option<String>,
    /// Address of the work order registry on the ledger.
    pub registry_address: Option<String>,
    /// Identifier width in bytes.
    #[ortho_config(default = defaults::default_identifier_bytes())]
    pub identifier_bytes: usize,
    /// Get-result timeout in seconds.
    #[ortho_config(default = defaults::default_result_timeout_secs())]
    pub result_timeout_secs: u64,
    /// Filter expression for the tracing subscriber.
    #[ortho_config(default = defaults::default_log_filter_string())]
    pub log_filter: String,
    /// Output format for the tracing subscriber.
    #[ortho_config(default = defaults::default_log_format())]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
            ledger_provider: None,
            event_provider: None,
            registry_address: None,
            identifier_bytes: DEFAULT_IDENTIFIER_BYTES,
            result_timeout_secs: DEFAULT_RESULT_TIMEOUT_SECS,
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// Address the daemon binds.
    #[must_use]
    pub fn listen_address(&self) -> &str {
        &self.listen_address
    }

    /// Log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Upper bound on a single get-result wait.
    #[must_use]
    pub const fn result_timeout(&self) -> Duration {
        Duration::from_secs(self.result_timeout_secs)
    }

    /// Extracts the backend profile consumed by the proxy core.
    #[must_use]
    pub fn backend_profile(&self) -> BackendProfile {
        BackendProfile {
            ledger_provider: self.ledger_provider.clone(),
            event_provider: self.event_provider.clone(),
            registry_address: self.registry_address.clone(),
            identifier_bytes: self.identifier_bytes,
            result_timeout: self.result_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn default_profile_uses_reference_identifier_width() {
        let profile = Config::default().backend_profile();
        assert_eq!(profile.identifier_hex_len(), 64);
        assert_eq!(profile.result_timeout, Duration::from_secs(30));
    }

    #[test]
    fn default_profile_leaves_endpoints_unset() {
        let profile = Config::default().backend_profile();
        assert!(profile.ledger_provider.is_none());
        assert!(profile.event_provider.is_none());
        assert!(profile.registry_address.is_none());
    }

    #[rstest]
    #[case::json("json", LogFormat::Json)]
    #[case::compact("compact", LogFormat::Compact)]
    #[case::upper("COMPACT", LogFormat::Compact)]
    fn log_format_parses_case_insensitively(#[case] input: &str, #[case] expected: LogFormat) {
        assert_eq!(input.parse::<LogFormat>().expect("parse format"), expected);
    }

    #[test]
    fn log_format_rejects_unknown_values() {
        assert!("pretty".parse::<LogFormat>().is_err());
    }
}
