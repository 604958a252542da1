// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Authenticated transport used to talk to ISAPI devices.
//!
//! The rest of the library only depends on the [`AuthenticatedClient`] trait.
//! It performs one authenticated request against the device's base URL and
//! hands back the raw status code and body; classifying the outcome is left
//! to the session and door layers.
//!
//! # Implementations
//!
//! - [`HttpClient`]: reqwest-based client using HTTP basic authentication

#[cfg(feature = "http")]
mod http;
#[cfg(test)]
pub(crate) mod scripted;

#[cfg(feature = "http")]
pub use http::{HttpClient, HttpConfig};

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::ProtocolError;

/// HTTP methods used by the ISAPI endpoints this library calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// `GET`
    Get,
    /// `PUT`
    Put,
}

impl Method {
    /// Returns the method name as sent on the wire.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Put => "PUT",
        }
    }
}

/// Raw response from an ISAPI request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    status: u16,
    body: String,
}

impl ApiResponse {
    /// Creates a new response with the given status code and body.
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Returns the HTTP status code.
    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Returns the raw response body.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Returns true for `200 OK`, the only status ISAPI uses for success.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// Returns true if the device refused the credentials.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status, 401 | 403)
    }

    /// Parses the response body as a specific type.
    ///
    /// # Errors
    ///
    /// Returns error if the JSON cannot be parsed into the target type.
    pub fn parse<T: serde::de::DeserializeOwned>(&self) -> Result<T, crate::error::ParseError> {
        serde_json::from_str(&self.body).map_err(Into::into)
    }

    /// Converts a non-`200` response into [`ProtocolError::UnexpectedStatus`].
    ///
    /// # Errors
    ///
    /// Returns error if the status is not `200`.
    pub fn ensure_ok(self) -> Result<Self, ProtocolError> {
        if self.is_ok() {
            Ok(self)
        } else {
            Err(ProtocolError::UnexpectedStatus {
                status: self.status,
                body: self.body,
            })
        }
    }
}

/// An authenticated request capability against one device.
///
/// Implementations own the credentials, TLS settings and base URL. They are
/// shared read-only (`Arc<C>`) between the session, the poll loop and every
/// door of a device, so they must be `Send + Sync`.
pub trait AuthenticatedClient: Send + Sync + 'static {
    /// Returns the base URL requests are resolved against.
    fn base_url(&self) -> &str;

    /// Sends one authenticated request.
    ///
    /// Non-success status codes are not errors at this level; only transport
    /// failures are.
    ///
    /// # Arguments
    ///
    /// * `method` - The HTTP method
    /// * `path` - Path and query relative to the base URL, starting with `/`
    /// * `body` - Optional JSON body
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the request could not be completed.
    fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> impl Future<Output = Result<ApiResponse, ProtocolError>> + Send;
}

/// Sends a request bounded by `timeout` and abandoned when `cancel` fires.
pub(crate) async fn guarded_request<C: AuthenticatedClient>(
    client: &C,
    cancel: &CancellationToken,
    timeout: Duration,
    method: Method,
    path: &str,
    body: Option<&serde_json::Value>,
) -> Result<ApiResponse, ProtocolError> {
    tracing::debug!(method = method.as_str(), path, "Sending ISAPI request");

    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(ProtocolError::Cancelled),
        result = tokio::time::timeout(timeout, client.request(method, path, body)) => {
            result.unwrap_or_else(|_| Err(ProtocolError::Timeout(duration_millis(timeout))))
        }
    }
}

/// Joins a host (with or without scheme) and a port into a base URL.
pub(crate) fn base_url(host: &str, port: u16) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        format!("{host}:{port}")
    } else {
        format!("http://{host}:{port}")
    }
}

pub(crate) fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::scripted::ScriptedClient;
    use super::*;

    #[test]
    fn ensure_ok_rejects_other_statuses() {
        let err = ApiResponse::new(404, "not found").ensure_ok().unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::UnexpectedStatus { status: 404, .. }
        ));
        assert!(ApiResponse::new(200, "").ensure_ok().is_ok());
    }

    #[test]
    fn base_url_with_and_without_scheme() {
        assert_eq!(base_url("http://192.0.0.65", 8000), "http://192.0.0.65:8000");
        assert_eq!(base_url("door.local/", 80), "http://door.local:80");
        assert_eq!(base_url("https://door.local", 443), "https://door.local:443");
    }

    #[test]
    fn unauthorized_statuses() {
        assert!(ApiResponse::new(401, "").is_unauthorized());
        assert!(ApiResponse::new(403, "").is_unauthorized());
        assert!(!ApiResponse::new(500, "").is_unauthorized());
    }

    #[tokio::test(start_paused = true)]
    async fn guarded_request_times_out() {
        let client = ScriptedClient::new().with_delay(Duration::from_secs(60));
        let cancel = CancellationToken::new();

        let result = guarded_request(
            &client,
            &cancel,
            Duration::from_secs(30),
            Method::Get,
            "/ISAPI/Security/userCheck?format=json",
            None,
        )
        .await;

        assert!(matches!(result, Err(ProtocolError::Timeout(30_000))));
    }

    #[tokio::test(start_paused = true)]
    async fn guarded_request_observes_cancellation() {
        let client = ScriptedClient::new().with_delay(Duration::from_secs(10));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = guarded_request(
            &client,
            &cancel,
            Duration::from_secs(30),
            Method::Put,
            "/ISAPI/Security/sessionHeartbeat",
            None,
        )
        .await;

        assert!(matches!(result, Err(ProtocolError::Cancelled)));
        assert_eq!(client.calls("/ISAPI/Security/sessionHeartbeat"), 0);
    }
}
