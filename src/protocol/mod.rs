// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP plumbing for talking to recorders.
//!
//! Recorders protect their endpoints with HTTP Digest authentication. The
//! [`DigestClient`] sends each request once without credentials and, when the
//! device answers `401` with a challenge, retries exactly once with a computed
//! `Authorization` header. A failed login is not an error: the caller simply
//! receives the final `401` response.
//!
//! # Examples
//!
//! ```no_run
//! use dvr_monitor::protocol::{Credentials, DeviceRequest, DigestClient, HttpConfig};
//!
//! # async fn example() -> Result<(), dvr_monitor::error::ProtocolError> {
//! let client = DigestClient::new(&HttpConfig::default())?;
//! let creds = Credentials::new("admin", "secret");
//! let response = client
//!     .fetch(&creds, DeviceRequest::get("http://10.0.0.5/ISAPI/System/deviceInfo"))
//!     .await?;
//! println!("{} {}", response.status(), response.text());
//! # Ok(())
//! # }
//! ```

mod digest;
mod http;

pub use digest::{DigestChallenge, NONCE_COUNT, new_cnonce};
pub use http::{DigestClient, HttpConfig};

use std::borrow::Cow;
use std::fmt;

use reqwest::Method;
use reqwest::header::{CONTENT_TYPE, HeaderMap};

use crate::error::ParseError;

/// Login credentials for a device.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    /// Creates a credential pair.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Returns the username.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns the password.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Base URL plus credentials of one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    base_url: String,
    credentials: Credentials,
}

impl Endpoint {
    /// Creates an endpoint. A trailing slash on `base_url` is removed.
    #[must_use]
    pub fn new(base_url: impl Into<String>, credentials: Credentials) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            credentials,
        }
    }

    /// Returns the base URL, e.g. `http://10.0.0.5:80`.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the device credentials.
    #[must_use]
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Joins a path (starting with `/`) onto the base URL.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

/// One outbound request to a device.
#[derive(Debug, Clone)]
pub struct DeviceRequest {
    method: Method,
    url: String,
    headers: Vec<(String, String)>,
    body: Option<Vec<u8>>,
}

impl DeviceRequest {
    /// Creates a request with an arbitrary method.
    #[must_use]
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Creates a `GET` request.
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    /// Creates a `POST` request.
    #[must_use]
    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    /// Creates a `PUT` request.
    #[must_use]
    pub fn put(url: impl Into<String>) -> Self {
        Self::new(Method::PUT, url)
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets a raw body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets a JSON body and content type.
    #[must_use]
    pub fn with_json(self, value: &serde_json::Value) -> Self {
        self.with_header("Content-Type", "application/json")
            .with_body(value.to_string())
    }

    /// Sets an XML body and content type.
    #[must_use]
    pub fn with_xml(self, xml: impl Into<String>) -> Self {
        self.with_header("Content-Type", "application/xml")
            .with_body(xml.into())
    }

    /// Returns the method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the target URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the extra headers.
    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Returns the body, if any.
    #[must_use]
    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }
}

/// A fully read device response.
#[derive(Debug, Clone)]
pub struct DeviceResponse {
    status: u16,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl DeviceResponse {
    /// Creates a response.
    #[must_use]
    pub fn new(status: u16, headers: HeaderMap, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// HTTP status code.
    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Returns true for a 2xx status.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Response headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The `Content-Type` header, or an empty string.
    #[must_use]
    pub fn content_type(&self) -> &str {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
    }

    /// Returns true if the content type mentions JSON.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.content_type().to_ascii_lowercase().contains("json")
    }

    /// Raw body bytes.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Consumes the response, returning the body.
    #[must_use]
    pub fn into_body(self) -> Vec<u8> {
        self.body
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    #[must_use]
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Parses the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Json`] if the body is not valid JSON for `T`.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, ParseError> {
        serde_json::from_slice(&self.body).map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use reqwest::header::HeaderValue;

    use super::*;

    #[test]
    fn credentials_debug_hides_password() {
        let debug = format!("{:?}", Credentials::new("admin", "hunter2"));
        assert!(debug.contains("admin"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn endpoint_strips_trailing_slash() {
        let ep = Endpoint::new("http://10.0.0.1:80//", Credentials::default());
        assert_eq!(ep.url("/cgi-bin/x.cgi"), "http://10.0.0.1:80/cgi-bin/x.cgi");
    }

    #[test]
    fn request_builder() {
        let req = DeviceRequest::put("http://d/ISAPI/System/time").with_xml("<Time/>");
        assert_eq!(req.method(), Method::PUT);
        assert_eq!(req.body(), Some("<Time/>".as_bytes()));
        assert_eq!(
            req.headers(),
            &[("Content-Type".to_string(), "application/xml".to_string())]
        );
    }

    #[test]
    fn response_helpers() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/JSON; charset=utf-8"));
        let res = DeviceResponse::new(200, headers, br#"{"a":1}"#.to_vec());
        assert!(res.is_success());
        assert!(res.is_json());
        let v: serde_json::Value = res.json().unwrap();
        assert_eq!(v["a"], 1);
    }

    #[test]
    fn response_without_content_type() {
        let res = DeviceResponse::new(401, HeaderMap::new(), Vec::new());
        assert!(!res.is_success());
        assert_eq!(res.content_type(), "");
        assert!(!res.is_json());
    }
}
