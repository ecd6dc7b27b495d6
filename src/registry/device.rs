// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Recorder definitions as loaded from the registry.

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::protocol::{Credentials, Endpoint};
use crate::types::Vendor;

use super::DeviceId;

/// Network address and credentials of a recorder.
///
/// The password is accepted on input but never serialized back out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceAuth {
    /// Raw IP address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    /// HTTP port of the recorder's web service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_port: Option<u16>,
    /// Login user.
    #[serde(default)]
    pub username: String,
    /// Login password.
    #[serde(default, skip_serializing)]
    pub password: String,
    /// Dynamic DNS hostname, preferred over `ip` when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ddns: Option<String>,
    /// Whether to use HTTPS.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub https: bool,
}

impl DeviceAuth {
    /// Returns the host to connect to: the DDNS name if set, otherwise the IP.
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        [self.ddns.as_deref(), self.ip.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|h| !h.is_empty())
    }

    /// Returns the login credentials.
    #[must_use]
    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.username, &self.password)
    }
}

/// A recorder in the fleet. Immutable after load.
///
/// # Examples
///
/// ```
/// use dvr_monitor::registry::{Device, DeviceAuth};
/// use dvr_monitor::types::Vendor;
///
/// let device = Device::new("dvr-1", "Loja Centro", Vendor::Intelbras).with_auth(DeviceAuth {
///     ip: Some("10.0.0.5".into()),
///     http_port: Some(8080),
///     username: "admin".into(),
///     password: "secret".into(),
///     ..DeviceAuth::default()
/// });
///
/// let endpoint = device.endpoint().unwrap();
/// assert_eq!(endpoint.base_url(), "http://10.0.0.5:8080");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    /// Registry identifier.
    pub id: DeviceId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Vendor tag.
    pub vendor: Vendor,
    /// Channel count declared by whoever installed the recorder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declared_channels: Option<u32>,
    /// Address and credentials.
    #[serde(default)]
    pub auth: DeviceAuth,
}

impl Device {
    /// Creates a device with no address.
    #[must_use]
    pub fn new(id: impl Into<DeviceId>, name: impl Into<String>, vendor: Vendor) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            vendor,
            declared_channels: None,
            auth: DeviceAuth::default(),
        }
    }

    /// Sets the address and credentials.
    #[must_use]
    pub fn with_auth(mut self, auth: DeviceAuth) -> Self {
        self.auth = auth;
        self
    }

    /// Sets the declared channel count.
    #[must_use]
    pub fn with_declared_channels(mut self, channels: u32) -> Self {
        self.declared_channels = Some(channels);
        self
    }

    /// Builds the endpoint used to reach this device.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unaddressable`] if the host or the port is missing.
    pub fn endpoint(&self) -> Result<Endpoint, Error> {
        let host = self.auth.host();
        let port = self.auth.http_port.filter(|p| *p != 0);
        let (Some(host), Some(port)) = (host, port) else {
            return Err(Error::Unaddressable(self.id.to_string()));
        };
        let scheme = if self.auth.https { "https" } else { "http" };
        Ok(Endpoint::new(
            format!("{scheme}://{host}:{port}"),
            self.auth.credentials(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth(ip: Option<&str>, ddns: Option<&str>, port: Option<u16>) -> DeviceAuth {
        DeviceAuth {
            ip: ip.map(String::from),
            ddns: ddns.map(String::from),
            http_port: port,
            username: "admin".into(),
            password: "pw".into(),
            https: false,
        }
    }

    #[test]
    fn ddns_preferred_over_ip() {
        let device = Device::new("d", "D", Vendor::Hikvision).with_auth(auth(
            Some("10.0.0.1"),
            Some("loja.ddns.net"),
            Some(80),
        ));
        assert_eq!(device.endpoint().unwrap().base_url(), "http://loja.ddns.net:80");
    }

    #[test]
    fn blank_ddns_falls_back_to_ip() {
        let device = Device::new("d", "D", Vendor::Hikvision)
            .with_auth(auth(Some("10.0.0.1"), Some("  "), Some(81)));
        assert_eq!(device.endpoint().unwrap().base_url(), "http://10.0.0.1:81");
    }

    #[test]
    fn missing_port_fails_closed() {
        let device =
            Device::new("d", "D", Vendor::Intelbras).with_auth(auth(Some("10.0.0.1"), None, None));
        assert!(matches!(device.endpoint(), Err(Error::Unaddressable(id)) if id == "d"));
    }

    #[test]
    fn missing_host_fails_closed() {
        let device = Device::new("d", "D", Vendor::Intelbras).with_auth(auth(None, None, Some(80)));
        assert!(device.endpoint().is_err());
    }

    #[test]
    fn https_scheme() {
        let mut a = auth(Some("10.0.0.1"), None, Some(443));
        a.https = true;
        let device = Device::new("d", "D", Vendor::Jfl).with_auth(a);
        assert_eq!(device.endpoint().unwrap().base_url(), "https://10.0.0.1:443");
    }

    #[test]
    fn password_not_serialized() {
        let device = Device::new("d", "D", Vendor::Jfl).with_auth(auth(Some("1.2.3.4"), None, Some(80)));
        let json = serde_json::to_value(&device).unwrap();
        assert_eq!(json["auth"]["username"], "admin");
        assert!(json["auth"].get("password").is_none());
        assert_eq!(json["auth"]["httpPort"], 80);
    }

    #[test]
    fn deserializes_registry_shape() {
        let device: Device = serde_json::from_value(serde_json::json!({
            "id": "dvr-1",
            "name": "Matriz",
            "vendor": "intelbras",
            "declaredChannels": 16,
            "auth": { "ip": "192.168.0.10", "httpPort": 80, "username": "admin", "password": "x" }
        }))
        .unwrap();
        assert_eq!(device.vendor, Vendor::Intelbras);
        assert_eq!(device.declared_channels, Some(16));
        assert_eq!(device.auth.password, "x");
    }
}
