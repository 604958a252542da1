// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Session configuration.

use std::fmt;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// Everything needed to open a session with one device.
///
/// All values are fixed at construction time. The struct can be built in
/// code or deserialized from a host application's settings; missing fields
/// take their defaults.
///
/// | Field | Default |
/// |-------|---------|
/// | `host` | `http://192.0.0.65` |
/// | `port` | `8000` |
/// | `username` | `admin` |
/// | `password` | empty |
/// | `verify_ssl` | `false` |
/// | `latch_seconds` | `5` (0 disables auto-relock) |
/// | `keepalive_interval_seconds` | `30` |
/// | `timeout_seconds` | `30` |
///
/// # Examples
///
/// ```
/// use hikvision_isapi::SessionConfig;
/// use std::time::Duration;
///
/// let config = SessionConfig::new("http://10.0.0.20")
///     .with_credentials("admin", "secret")
///     .with_latch_seconds(3);
/// assert_eq!(config.latch(), Duration::from_secs(3));
/// assert_eq!(config.base_url(), "http://10.0.0.20:8000");
///
/// let config: SessionConfig = serde_json::from_str(
///     r#"{"host": "http://10.0.0.21", "password": "secret", "latch_seconds": 0}"#,
/// ).unwrap();
/// assert!(config.latch().is_zero());
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Device host, optionally with scheme.
    pub host: String,
    /// ISAPI port.
    pub port: u16,
    /// Account name.
    pub username: String,
    /// Account password.
    pub password: String,
    /// Whether TLS certificates are verified.
    pub verify_ssl: bool,
    /// Seconds after which an unlocked door is assumed relocked.
    #[serde(alias = "latch")]
    pub latch_seconds: u64,
    /// Seconds between keepalive polls.
    #[serde(alias = "keepalive")]
    pub keepalive_interval_seconds: u64,
    /// Timeout applied to every request, in seconds.
    #[serde(alias = "timeout")]
    pub timeout_seconds: u64,
}

impl SessionConfig {
    /// Default host of a factory-reset device.
    pub const DEFAULT_HOST: &'static str = "http://192.0.0.65";
    /// Default ISAPI port.
    pub const DEFAULT_PORT: u16 = 8000;
    /// Default account name.
    pub const DEFAULT_USERNAME: &'static str = "admin";
    /// Default latch delay in seconds.
    pub const DEFAULT_LATCH_SECONDS: u64 = 5;
    /// Default keepalive interval in seconds.
    pub const DEFAULT_KEEPALIVE_SECONDS: u64 = 30;
    /// Default request timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

    /// Creates a configuration for `host` with every other value defaulted.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    /// Sets the port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the credentials.
    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    /// Enables or disables TLS certificate verification.
    #[must_use]
    pub fn with_verify_ssl(mut self, verify_ssl: bool) -> Self {
        self.verify_ssl = verify_ssl;
        self
    }

    /// Sets the latch delay. `0` disables auto-relock.
    #[must_use]
    pub fn with_latch_seconds(mut self, seconds: u64) -> Self {
        self.latch_seconds = seconds;
        self
    }

    /// Sets the keepalive interval.
    #[must_use]
    pub fn with_keepalive_interval_seconds(mut self, seconds: u64) -> Self {
        self.keepalive_interval_seconds = seconds;
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout_seconds(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Returns the latch delay.
    #[must_use]
    pub fn latch(&self) -> Duration {
        Duration::from_secs(self.latch_seconds)
    }

    /// Returns the keepalive interval.
    #[must_use]
    pub fn keepalive_interval(&self) -> Duration {
        Duration::from_secs(self.keepalive_interval_seconds)
    }

    /// Returns the request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Returns the device base URL, `host:port`.
    #[must_use]
    pub fn base_url(&self) -> String {
        crate::protocol::base_url(&self.host, self.port)
    }

    /// Returns the bare host name, without scheme, port or path.
    #[must_use]
    pub fn hostname(&self) -> &str {
        let host = self.host.trim();
        let host = host
            .strip_prefix("https://")
            .or_else(|| host.strip_prefix("http://"))
            .unwrap_or(host);

        if let Some(rest) = host.strip_prefix('[') {
            return rest.split(']').next().unwrap_or(rest);
        }

        host.split([':', '/']).next().unwrap_or(host)
    }

    /// Checks the configuration for values no session can work with.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hostname().is_empty() {
            return Err(ConfigError::MissingHost);
        }
        if self.port == 0 {
            return Err(ConfigError::InvalidPort(self.port));
        }
        if self.keepalive_interval_seconds == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        if self.timeout_seconds == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }

    /// Builds the HTTP client configuration for this session.
    #[cfg(feature = "http")]
    #[must_use]
    pub fn to_http_config(&self) -> crate::protocol::HttpConfig {
        crate::protocol::HttpConfig::new(self.host.trim())
            .with_port(self.port)
            .with_credentials(self.username.clone(), self.password.clone())
            .with_verify_ssl(self.verify_ssl)
            .with_timeout(self.timeout())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            host: Self::DEFAULT_HOST.to_string(),
            port: Self::DEFAULT_PORT,
            username: Self::DEFAULT_USERNAME.to_string(),
            password: String::new(),
            verify_ssl: false,
            latch_seconds: Self::DEFAULT_LATCH_SECONDS,
            keepalive_interval_seconds: Self::DEFAULT_KEEPALIVE_SECONDS,
            timeout_seconds: Self::DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("verify_ssl", &self.verify_ssl)
            .field("latch_seconds", &self.latch_seconds)
            .field("keepalive_interval_seconds", &self.keepalive_interval_seconds)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}
