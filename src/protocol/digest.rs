// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP Digest (RFC 7616, MD5) challenge parsing and response computation.

use md5::{Digest, Md5};

use super::Credentials;

/// Nonce count sent with the single authenticated retry.
pub const NONCE_COUNT: &str = "00000001";

/// A parsed `WWW-Authenticate: Digest ...` challenge.
///
/// # Examples
///
/// ```
/// use dvr_monitor::protocol::DigestChallenge;
///
/// let challenge = DigestChallenge::parse(
///     r#"Digest realm="DS-7208", qop="auth", nonce="abc123", opaque="xyz""#,
/// ).unwrap();
/// assert_eq!(challenge.realm(), "DS-7208");
/// assert_eq!(challenge.qop(), Some("auth"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestChallenge {
    realm: String,
    nonce: String,
    qop: Option<String>,
    opaque: Option<String>,
    algorithm: Option<String>,
}

impl DigestChallenge {
    /// Parses a `WWW-Authenticate` header value.
    ///
    /// Returns `None` if the scheme is not `Digest`.
    #[must_use]
    pub fn parse(header: &str) -> Option<Self> {
        let (scheme, params) = header
            .trim_start()
            .split_once(|c: char| c.is_ascii_whitespace())?;
        if !scheme.eq_ignore_ascii_case("digest") {
            return None;
        }
        let mut challenge = Self {
            realm: String::new(),
            nonce: String::new(),
            qop: None,
            opaque: None,
            algorithm: None,
        };
        for (key, value) in split_params(params) {
            match key.to_ascii_lowercase().as_str() {
                "realm" => challenge.realm = value,
                "nonce" => challenge.nonce = value,
                "opaque" => challenge.opaque = Some(value),
                "algorithm" => challenge.algorithm = Some(value),
                "qop" => {
                    // Only `auth` is implemented; any offered qop is answered with it.
                    challenge.qop = value
                        .split(',')
                        .map(str::trim)
                        .find(|q| !q.is_empty())
                        .map(|_| "auth".to_string());
                }
                _ => {}
            }
        }
        Some(challenge)
    }

    /// Returns the protection realm.
    #[must_use]
    pub fn realm(&self) -> &str {
        &self.realm
    }

    /// Returns the server nonce.
    #[must_use]
    pub fn nonce(&self) -> &str {
        &self.nonce
    }

    /// Returns the quality of protection that will be used, if any.
    #[must_use]
    pub fn qop(&self) -> Option<&str> {
        self.qop.as_deref()
    }

    /// Computes the `response` hash for a request.
    #[must_use]
    pub fn response(&self, credentials: &Credentials, method: &str, uri: &str, cnonce: &str) -> String {
        let ha1 = md5_hex(&format!(
            "{}:{}:{}",
            credentials.username(),
            self.realm,
            credentials.password()
        ));
        let ha2 = md5_hex(&format!("{method}:{uri}"));
        match &self.qop {
            Some(qop) => md5_hex(&format!(
                "{ha1}:{}:{NONCE_COUNT}:{cnonce}:{qop}:{ha2}",
                self.nonce
            )),
            None => md5_hex(&format!("{ha1}:{}:{ha2}", self.nonce)),
        }
    }

    /// Builds the full `Authorization` header value.
    #[must_use]
    pub fn authorization(
        &self,
        credentials: &Credentials,
        method: &str,
        uri: &str,
        cnonce: &str,
    ) -> String {
        let response = self.response(credentials, method, uri, cnonce);
        let mut header = format!(
            r#"Digest username="{}", realm="{}", nonce="{}", uri="{uri}", response="{response}""#,
            credentials.username(),
            self.realm,
            self.nonce,
        );
        if let Some(algorithm) = &self.algorithm {
            header.push_str(&format!(", algorithm={algorithm}"));
        }
        if let Some(qop) = &self.qop {
            header.push_str(&format!(r#", qop={qop}, nc={NONCE_COUNT}, cnonce="{cnonce}""#));
        }
        if let Some(opaque) = &self.opaque {
            header.push_str(&format!(r#", opaque="{opaque}""#));
        }
        header
    }
}

/// Generates a fresh client nonce.
#[must_use]
pub fn new_cnonce() -> String {
    let bytes: [u8; 8] = rand::random();
    hex::encode(bytes)
}

fn md5_hex(input: &str) -> String {
    hex::encode(Md5::digest(input.as_bytes()))
}

/// Splits `k1="v, 1", k2=v2` into pairs, honoring quotes.
fn split_params(input: &str) -> Vec<(String, String)> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    for c in input.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                current.push(c);
            }
            ',' if !quoted => parts.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    parts.push(current);

    parts
        .iter()
        .filter_map(|part| {
            let (key, value) = part.split_once('=')?;
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value);
            Some((key.trim().to_string(), value.to_string()))
        })
        .collect()
}
