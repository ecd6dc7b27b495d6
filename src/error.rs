// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the DVR monitor.
//!
//! Vendor adapters never surface these to their callers: every transport or
//! parse failure is folded into a negative result at the adapter boundary.
//! The types below are used inside adapters, by the registry loader, and by
//! the query façade for addressing and routing failures.

use thiserror::Error;

/// The main error type for this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Error occurred during communication with a device.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Error occurred while parsing a device response.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Error occurred while loading the device registry.
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// No device with this identifier exists in the registry.
    #[error("device not found: {0}")]
    DeviceNotFound(String),

    /// The device lacks a host or a port and cannot be reached.
    #[error("device {0} has no usable address")]
    Unaddressable(String),

    /// No adapter covers the device's vendor.
    #[error("vendor not implemented: {0}")]
    UnsupportedVendor(String),
}

/// Errors related to HTTP communication with a device.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// HTTP request failed (connection refused, DNS, timeout, ...).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid URL or address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

impl ProtocolError {
    /// Returns true if the failure was a request timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Http(e) if e.is_timeout())
    }
}

/// Errors related to parsing device responses.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// XML parsing failed.
    #[error("XML parse error: {0}")]
    Xml(String),
}

impl From<xmltree::ParseError> for ParseError {
    fn from(err: xmltree::ParseError) -> Self {
        Self::Xml(err.to_string())
    }
}

/// Errors related to loading the static device registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The registry file could not be read.
    #[error("failed to read registry: {0}")]
    Io(#[from] std::io::Error),

    /// The registry document is not valid JSON or has the wrong shape.
    #[error("invalid registry document: {0}")]
    Json(#[from] serde_json::Error),

    /// Two devices share the same identifier.
    #[error("duplicate device id: {0}")]
    DuplicateDevice(String),
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_from_registry_error() {
        let err: Error = RegistryError::DuplicateDevice("dvr-1".to_string()).into();
        assert!(matches!(err, Error::Registry(RegistryError::DuplicateDevice(_))));
        assert_eq!(err.to_string(), "registry error: duplicate device id: dvr-1");
    }

    #[test]
    fn unaddressable_display() {
        let err = Error::Unaddressable("dvr-7".to_string());
        assert_eq!(err.to_string(), "device dvr-7 has no usable address");
    }

    #[test]
    fn xml_error_converts() {
        let xml_err = xmltree::Element::parse("<unclosed".as_bytes()).unwrap_err();
        let err: ParseError = xml_err.into();
        assert!(matches!(err, ParseError::Xml(_)));
    }
}
