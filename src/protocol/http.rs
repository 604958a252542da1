// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP implementation of [`AuthenticatedClient`] built on reqwest.

use std::time::Duration;

use reqwest::Client;

use crate::error::ProtocolError;
use crate::protocol::{ApiResponse, AuthenticatedClient, Method};

// ============================================================================
// HttpConfig - Construction-time settings for the HTTP client
// ============================================================================

/// Configuration for an HTTP ISAPI client.
///
/// All settings are fixed once the client is built; the client is then shared
/// read-only by every operation of a session.
///
/// # Examples
///
/// ```
/// use hikvision_isapi::protocol::HttpConfig;
/// use std::time::Duration;
///
/// let config = HttpConfig::new("http://192.0.0.65")
///     .with_port(8000)
///     .with_credentials("admin", "password")
///     .with_verify_ssl(false)
///     .with_timeout(Duration::from_secs(10));
///
/// assert_eq!(config.base_url(), "http://192.0.0.65:8000");
/// ```
#[derive(Debug, Clone)]
pub struct HttpConfig {
    host: String,
    port: u16,
    credentials: Option<(String, String)>,
    verify_ssl: bool,
    timeout: Duration,
}

impl HttpConfig {
    /// Default ISAPI port.
    pub const DEFAULT_PORT: u16 = 8000;
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Creates a new HTTP configuration for the specified host.
    ///
    /// The host may carry a scheme (`https://door.local`); `http://` is
    /// assumed otherwise.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: Self::DEFAULT_PORT,
            credentials: None,
            verify_ssl: false,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Sets a custom port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets authentication credentials.
    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.credentials = Some((username.into(), password.into()));
        self
    }

    /// Enables or disables TLS certificate verification.
    ///
    /// Devices ship with self-signed certificates, so verification is off by
    /// default.
    #[must_use]
    pub fn with_verify_ssl(mut self, verify_ssl: bool) -> Self {
        self.verify_ssl = verify_ssl;
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns the credentials if set.
    #[must_use]
    pub fn credentials(&self) -> Option<(&str, &str)> {
        self.credentials
            .as_ref()
            .map(|(u, p)| (u.as_str(), p.as_str()))
    }

    /// Returns whether TLS certificates are verified.
    #[must_use]
    pub fn verify_ssl(&self) -> bool {
        self.verify_ssl
    }

    /// Returns the timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Builds the base URL from this configuration.
    #[must_use]
    pub fn base_url(&self) -> String {
        super::base_url(&self.host, self.port)
    }

    /// Creates an `HttpClient` from this configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the host is empty or the HTTP client cannot be created.
    pub fn into_client(self) -> Result<HttpClient, ProtocolError> {
        if self.host.trim().is_empty() {
            return Err(ProtocolError::InvalidAddress("host is required".to_string()));
        }

        let base_url = self.base_url();

        let client = Client::builder()
            .timeout(self.timeout)
            .danger_accept_invalid_certs(!self.verify_ssl)
            .build()
            .map_err(ProtocolError::Http)?;

        let credentials = self
            .credentials
            .map(|(username, password)| Credentials { username, password });

        Ok(HttpClient {
            base_url,
            client,
            credentials,
            timeout: self.timeout,
        })
    }
}

// ============================================================================
// HttpClient
// ============================================================================

/// HTTP client for ISAPI devices.
///
/// Every request carries HTTP basic credentials. Devices configured for
/// digest-only authentication need a different [`AuthenticatedClient`].
///
/// # Examples
///
/// ```no_run
/// use hikvision_isapi::protocol::{AuthenticatedClient, HttpConfig, Method};
///
/// # async fn example() -> hikvision_isapi::Result<()> {
/// let client = HttpConfig::new("192.0.0.65")
///     .with_credentials("admin", "password")
///     .into_client()?;
/// let response = client
///     .request(Method::Get, "/ISAPI/System/deviceInfo?format=json", None)
///     .await?;
/// println!("{}", response.body());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    base_url: String,
    client: Client,
    credentials: Option<Credentials>,
    timeout: Duration,
}

/// HTTP authentication credentials.
#[derive(Clone)]
struct Credentials {
    username: String,
    password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl HttpClient {
    /// Returns the configured request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn build_url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn classify(&self, err: reqwest::Error) -> ProtocolError {
        if err.is_timeout() {
            ProtocolError::Timeout(super::duration_millis(self.timeout))
        } else if err.is_connect() {
            ProtocolError::ConnectionFailed(err.to_string())
        } else {
            ProtocolError::Http(err)
        }
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => Self::GET,
            Method::Put => Self::PUT,
        }
    }
}

impl AuthenticatedClient for HttpClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<ApiResponse, ProtocolError> {
        let url = self.build_url(path);

        tracing::debug!(url = %url, method = method.as_str(), "Sending HTTP request");

        let mut request = self.client.request(method.into(), &url);
        if let Some(creds) = &self.credentials {
            request = request.basic_auth(&creds.username, Some(&creds.password));
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| self.classify(e))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| self.classify(e))?;

        tracing::debug!(status, body = %body, "Received HTTP response");

        Ok(ApiResponse::new(status, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_config_default_values() {
        let config = HttpConfig::new("192.0.0.65");
        assert_eq!(config.host(), "192.0.0.65");
        assert_eq!(config.port(), 8000);
        assert!(config.credentials().is_none());
        assert!(!config.verify_ssl());
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn base_url_keeps_explicit_scheme() {
        let config = HttpConfig::new("https://door.local/").with_port(443);
        assert_eq!(config.base_url(), "https://door.local:443");
    }

    #[test]
    fn base_url_adds_http_scheme() {
        let config = HttpConfig::new("10.0.0.7").with_port(80);
        assert_eq!(config.base_url(), "http://10.0.0.7:80");
    }

    #[test]
    fn into_client_rejects_empty_host() {
        let result = HttpConfig::new("  ").into_client();
        assert!(matches!(result, Err(ProtocolError::InvalidAddress(_))));
    }

    #[test]
    fn into_client_keeps_settings() {
        let client = HttpConfig::new("http://192.0.0.65")
            .with_credentials("admin", "secret")
            .with_timeout(Duration::from_secs(5))
            .into_client()
            .unwrap();

        assert_eq!(client.base_url(), "http://192.0.0.65:8000");
        assert_eq!(client.timeout(), Duration::from_secs(5));
        assert!(client.credentials.is_some());
        assert_eq!(
            client.build_url("/ISAPI/Security/userCheck?format=json"),
            "http://192.0.0.65:8000/ISAPI/Security/userCheck?format=json"
        );
    }

    #[test]
    fn credentials_debug_hides_password() {
        let creds = Credentials {
            username: "admin".to_string(),
            password: "secret".to_string(),
        };
        let printed = format!("{creds:?}");
        assert!(printed.contains("admin"));
        assert!(!printed.contains("secret"));
    }
}
