// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the Hikvision ISAPI library.
//!
//! Transport failures are reported as [`ProtocolError`] by the client layer
//! and classified into the top-level [`Error`] taxonomy at the session and
//! door boundary:
//!
//! | Variant | Meaning | Fatal to setup |
//! |---|---|---|
//! | [`Error::Auth`] | credentials rejected | yes |
//! | [`Error::Unreachable`] | device did not answer properly | yes |
//! | [`Error::IdentityUnavailable`] | no usable MAC address | yes |
//! | [`Error::Transient`] | keepalive failed, retry on next tick | no |
//! | [`Error::UnlockFailed`] | door open command rejected | no |

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// The device rejected the configured credentials.
    #[error("authentication rejected by {base_url}")]
    Auth {
        /// Base URL of the device.
        base_url: String,
    },

    /// The device did not respond, or responded with something unusable,
    /// within the configured timeout.
    #[error("device at {base_url} is unreachable: {source}")]
    Unreachable {
        /// Base URL of the device.
        base_url: String,
        /// The underlying transport failure.
        #[source]
        source: ProtocolError,
    },

    /// The device info carried no usable MAC address, so the device cannot
    /// be uniquely identified.
    #[error("device at {base_url} cannot be identified: {reason}")]
    IdentityUnavailable {
        /// Base URL of the device.
        base_url: String,
        /// Why the identity could not be derived.
        reason: String,
    },

    /// A keepalive failed. The caller retries on the next scheduled tick.
    #[error("transient failure: {0}")]
    Transient(#[source] ProtocolError),

    /// The remote open command for a door was rejected or failed.
    #[error("failed to unlock door {door}: {source}")]
    UnlockFailed {
        /// 1-based door index.
        door: u32,
        /// The underlying failure.
        #[source]
        source: ProtocolError,
    },

    /// Error occurred during value validation.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// Error occurred during protocol communication.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Error occurred while parsing a response.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// The session configuration is invalid.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The operation requires an initialized session.
    #[error("session is not initialized")]
    NotInitialized,

    /// The session has been stopped.
    #[error("session has been stopped")]
    SessionStopped,
}

impl Error {
    /// Returns true if this error must abort setup.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Auth { .. } | Self::Unreachable { .. } | Self::IdentityUnavailable { .. }
        )
    }

    /// Returns true if the failed operation should simply be retried later.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// Errors related to value validation and constraints.
///
/// These errors occur when attempting to create constrained types
/// with invalid values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// The string is not a 48-bit hardware address.
    #[error("invalid MAC address: {0:?}")]
    InvalidMacAddress(String),

    /// Door indices start at 1.
    #[error("door index must be at least 1, got {0}")]
    InvalidDoorIndex(u32),
}

/// Errors related to HTTP communication with the device.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// HTTP request failed.
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Connection to the device failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Request timed out.
    #[error("request timed out after {0} ms")]
    Timeout(u64),

    /// The device answered with a status other than the expected one.
    #[error("unexpected status {status}: {body}")]
    UnexpectedStatus {
        /// HTTP status code.
        status: u16,
        /// Response body, as returned by the device.
        body: String,
    },

    /// The device answered 200 with a body that cannot be used.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Invalid URL or address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// The request was abandoned because the session shut down.
    #[error("request cancelled by session shutdown")]
    Cancelled,
}

/// Errors related to parsing ISAPI responses.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors related to session configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No host was configured.
    #[error("host is required")]
    MissingHost,

    /// The port is not usable.
    #[error("port {0} is not valid")]
    InvalidPort(u16),

    /// The keepalive interval must be positive.
    #[error("keepalive interval must be greater than zero")]
    ZeroInterval,

    /// The request timeout must be positive.
    #[error("request timeout must be greater than zero")]
    ZeroTimeout,
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
