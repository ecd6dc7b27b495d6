// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Digest-authenticating HTTP client for recorders.

use std::time::{Duration, Instant};

use reqwest::header::WWW_AUTHENTICATE;
use reqwest::{Client, StatusCode, Url};

use crate::error::ProtocolError;

use super::digest::{DigestChallenge, new_cnonce};
use super::{Credentials, DeviceRequest, DeviceResponse};

// ============================================================================
// HttpConfig - Transport settings shared by every device request
// ============================================================================

/// Transport configuration for [`DigestClient`].
///
/// # Examples
///
/// ```
/// use dvr_monitor::protocol::HttpConfig;
/// use std::time::Duration;
///
/// let config = HttpConfig::default()
///     .with_timeout(Duration::from_secs(5))
///     .with_accept_invalid_certs(true);
/// assert_eq!(config.timeout(), Duration::from_secs(5));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpConfig {
    timeout: Duration,
    accept_invalid_certs: bool,
}

impl HttpConfig {
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Sets the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Accepts self-signed certificates on HTTPS devices.
    #[must_use]
    pub fn with_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Returns the per-request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns whether invalid certificates are accepted.
    #[must_use]
    pub fn accept_invalid_certs(&self) -> bool {
        self.accept_invalid_certs
    }

    /// Creates a [`DigestClient`] from this configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn into_client(self) -> Result<DigestClient, ProtocolError> {
        DigestClient::new(&self)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Self::DEFAULT_TIMEOUT,
            accept_invalid_certs: false,
        }
    }
}

// ============================================================================
// DigestClient - One request, at most one authenticated retry
// ============================================================================

/// HTTP client that answers a `401` challenge exactly once.
///
/// The first attempt carries no credentials. If the device responds `401`
/// with a `Digest` challenge, the request is repeated with a computed
/// `Authorization` header; a non-Digest challenge is answered with Basic
/// credentials instead. Whatever the retry returns is handed back as is,
/// including a second `401`.
///
/// Cloning is cheap and shares the connection pool.
#[derive(Debug, Clone)]
pub struct DigestClient {
    client: Client,
}

impl DigestClient {
    /// Creates a client.
    ///
    /// # Errors
    ///
    /// Returns error if the underlying HTTP client cannot be built.
    pub fn new(config: &HttpConfig) -> Result<Self, ProtocolError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(ProtocolError::Http)?;
        Ok(Self { client })
    }

    /// Sends a request, retrying once with credentials on `401`.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidAddress`] for an unparsable URL and
    /// [`ProtocolError::Http`] for transport failures. HTTP error statuses
    /// are not errors.
    pub async fn fetch(
        &self,
        credentials: &Credentials,
        request: DeviceRequest,
    ) -> Result<DeviceResponse, ProtocolError> {
        let started = Instant::now();
        let url = Url::parse(request.url())
            .map_err(|e| ProtocolError::InvalidAddress(format!("{}: {e}", request.url())))?;

        let first = self.send(&request, None).await?;
        let response = if first.status() == StatusCode::UNAUTHORIZED {
            // Several challenges may be offered; Digest wins over Basic
            // whatever the order.
            let challenge = first
                .headers()
                .get_all(WWW_AUTHENTICATE)
                .iter()
                .filter_map(|v| v.to_str().ok())
                .find_map(DigestChallenge::parse);
            let auth = match challenge {
                Some(challenge) => Authorization::Digest(challenge.authorization(
                    credentials,
                    request.method().as_str(),
                    &request_uri(&url),
                    &new_cnonce(),
                )),
                None => Authorization::Basic,
            };
            tracing::debug!(url = %request.url(), "Retrying with credentials after 401");
            self.send(&request, Some((auth, credentials))).await?
        } else {
            first
        };

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(ProtocolError::Http)?.to_vec();
        let result = DeviceResponse::new(status, headers, body);

        tracing::debug!(
            method = %request.method(),
            url = %request.url(),
            status,
            content_type = %result.content_type(),
            len = result.body().len(),
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Device request completed"
        );

        Ok(result)
    }

    async fn send(
        &self,
        request: &DeviceRequest,
        auth: Option<(Authorization, &Credentials)>,
    ) -> Result<reqwest::Response, ProtocolError> {
        let mut builder = self
            .client
            .request(request.method().clone(), request.url());
        for (name, value) in request.headers() {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body() {
            builder = builder.body(body.to_vec());
        }
        builder = match auth {
            Some((Authorization::Digest(header), _)) => {
                builder.header(reqwest::header::AUTHORIZATION, header)
            }
            Some((Authorization::Basic, creds)) => {
                builder.basic_auth(creds.username(), Some(creds.password()))
            }
            None => builder,
        };
        builder.send().await.map_err(ProtocolError::Http)
    }
}

enum Authorization {
    Digest(String),
    Basic,
}

/// The `uri` directive: path plus query, as sent on the request line.
fn request_uri(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{query}", url.path()),
        None => url.path().to_string(),
    }
}
