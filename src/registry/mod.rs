// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Static device registry.
//!
//! The registry is loaded once at startup and never mutated. Devices are
//! grouped under the customer ([`Client`]) that owns them, which is the shape
//! the fleet summary reports.
//!
//! # Document Format
//!
//! ```json
//! {
//!   "clients": [
//!     {
//!       "id": "c1",
//!       "name": "Supermercado",
//!       "dvrs": [
//!         {
//!           "id": "dvr-1",
//!           "name": "Frente de loja",
//!           "vendor": "hikvision",
//!           "declaredChannels": 16,
//!           "auth": { "ip": "10.0.0.5", "httpPort": 80, "username": "admin", "password": "..." }
//!         }
//!       ]
//!     }
//!   ]
//! }
//! ```

mod device;
mod device_id;

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub use device::{Device, DeviceAuth};
pub use device_id::DeviceId;

use crate::error::RegistryError;

/// A customer owning one or more recorders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    /// Customer identifier.
    pub id: String,
    /// Customer display name.
    #[serde(default)]
    pub name: String,
    /// Recorders installed at this customer.
    #[serde(default)]
    pub dvrs: Vec<Device>,
}

#[derive(Deserialize)]
struct RegistryDocument {
    clients: Vec<Client>,
}

/// Immutable, indexed list of every known recorder.
///
/// # Examples
///
/// ```
/// use dvr_monitor::registry::Registry;
///
/// let registry = Registry::from_json_str(r#"{
///     "clients": [{ "id": "c1", "name": "Loja", "dvrs": [
///         { "id": "dvr-1", "name": "Caixa", "vendor": "jfl" }
///     ]}]
/// }"#).unwrap();
///
/// assert_eq!(registry.len(), 1);
/// assert!(registry.find("dvr-1").is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Registry {
    clients: Vec<Client>,
    index: HashMap<DeviceId, (usize, usize)>,
}

impl Registry {
    /// Builds a registry from already-parsed clients.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateDevice`] if two devices share an id.
    pub fn new(clients: Vec<Client>) -> Result<Self, RegistryError> {
        let mut index = HashMap::new();
        for (ci, client) in clients.iter().enumerate() {
            for (di, device) in client.dvrs.iter().enumerate() {
                if index.insert(device.id.clone(), (ci, di)).is_some() {
                    return Err(RegistryError::DuplicateDevice(device.id.to_string()));
                }
            }
        }
        Ok(Self { clients, index })
    }

    /// Parses a registry document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is malformed or has duplicate ids.
    pub fn from_json_str(json: &str) -> Result<Self, RegistryError> {
        let doc: RegistryDocument = serde_json::from_str(json)?;
        Self::new(doc.clients)
    }

    /// Reads and parses a registry file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid document.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Looks up a device by id.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&Device> {
        let &(ci, di) = self.index.get(id)?;
        self.clients.get(ci)?.dvrs.get(di)
    }

    /// Returns the customers in registry order.
    #[must_use]
    pub fn clients(&self) -> &[Client] {
        &self.clients
    }

    /// Iterates over every device in registry order.
    pub fn devices(&self) -> impl Iterator<Item = &Device> {
        self.clients.iter().flat_map(|c| c.dvrs.iter())
    }

    /// Number of devices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns true if there are no devices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Vendor;

    const DOC: &str = r#"{
        "clients": [
            { "id": "c1", "name": "A", "dvrs": [
                { "id": "d1", "name": "One", "vendor": "hikvision" },
                { "id": "d2", "name": "Two", "vendor": "intelbras" }
            ]},
            { "id": "c2", "name": "B", "dvrs": [
                { "id": "d3", "name": "Three", "vendor": "acme" }
            ]}
        ]
    }"#;

    #[test]
    fn indexes_all_devices() {
        let registry = Registry::from_json_str(DOC).unwrap();
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.find("d2").unwrap().vendor, Vendor::Intelbras);
        assert_eq!(registry.find("d3").unwrap().vendor, Vendor::Other);
        assert!(registry.find("missing").is_none());
    }

    #[test]
    fn devices_in_registry_order() {
        let registry = Registry::from_json_str(DOC).unwrap();
        let ids: Vec<&str> = registry.devices().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["d1", "d2", "d3"]);
    }

    #[test]
    fn duplicate_ids_rejected() {
        let doc = r#"{ "clients": [
            { "id": "c1", "dvrs": [ { "id": "d1", "vendor": "jfl" } ] },
            { "id": "c2", "dvrs": [ { "id": "d1", "vendor": "jfl" } ] }
        ]}"#;
        assert!(matches!(
            Registry::from_json_str(doc),
            Err(RegistryError::DuplicateDevice(id)) if id == "d1"
        ));
    }

    #[test]
    fn missing_clients_is_an_error() {
        assert!(Registry::from_json_str("{}").is_err());
    }

    #[test]
    fn empty_registry() {
        let registry = Registry::default();
        assert!(registry.is_empty());
        assert_eq!(registry.devices().count(), 0);
    }
}
