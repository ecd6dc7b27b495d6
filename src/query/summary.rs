// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fleet summary: the registry joined with the latest known state.

use serde::Serialize;

use crate::registry::{DeviceAuth, DeviceId, Registry};
use crate::state::StateStore;
use crate::types::{ChannelCounts, DeviceStatus, Vendor};

/// The whole fleet, grouped by customer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FleetSummary {
    /// Customers in registry order.
    pub clients: Vec<ClientSummary>,
}

/// One customer and its recorders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientSummary {
    /// Customer identifier.
    pub id: String,
    /// Customer display name.
    pub name: String,
    /// Recorders with their latest state.
    pub dvrs: Vec<DeviceSummary>,
}

/// One recorder with its latest state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceSummary {
    /// Registry identifier.
    pub id: DeviceId,
    /// Display name.
    pub name: String,
    /// Vendor tag.
    pub vendor: Vendor,
    /// Installer-declared channel count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declared_channels: Option<u32>,
    /// `unknown` until the first poll.
    pub status: DeviceStatus,
    /// Last known counts, omitted until known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counts: Option<ChannelCounts>,
    /// Unix milliseconds of the last write, `null` if never polled.
    pub last_updated: Option<i64>,
    /// Address and user; the password is never serialized.
    pub auth: DeviceAuth,
}

impl FleetSummary {
    /// Builds the summary. Devices never written to report `unknown`.
    #[must_use]
    pub fn build(registry: &Registry, store: &StateStore) -> Self {
        let states = store.snapshot();
        let clients = registry
            .clients()
            .iter()
            .map(|client| ClientSummary {
                id: client.id.clone(),
                name: client.name.clone(),
                dvrs: client
                    .dvrs
                    .iter()
                    .map(|device| {
                        let state = states.get(&device.id);
                        DeviceSummary {
                            id: device.id.clone(),
                            name: device.name.clone(),
                            vendor: device.vendor,
                            declared_channels: device.declared_channels,
                            status: state.map(|s| s.status).unwrap_or_default(),
                            counts: state.and_then(|s| s.counts),
                            last_updated: state.and_then(crate::state::StateEntry::last_updated_ms),
                            auth: device.auth.clone(),
                        }
                    })
                    .collect(),
            })
            .collect();
        Self { clients }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Broadcaster;
    use crate::state::StatusUpdate;
    use crate::types::Overview;

    const DOC: &str = r#"{ "clients": [
        { "id": "c1", "name": "Loja", "dvrs": [
            { "id": "d1", "name": "Caixa", "vendor": "hikvision", "declaredChannels": 8,
              "auth": { "ip": "10.0.0.5", "httpPort": 80, "username": "admin", "password": "pw" } },
            { "id": "d2", "name": "Estoque", "vendor": "intelbras" }
        ]}
    ]}"#;

    #[test]
    fn joins_registry_and_state() {
        let registry = Registry::from_json_str(DOC).unwrap();
        let store = StateStore::new(Broadcaster::new());
        let overview = Overview::from_indices(DeviceStatus::Online, [0, 1].into(), [].into());
        store.update(&"d1".into(), &StatusUpdate::from_overview(&overview));

        let json = serde_json::to_value(FleetSummary::build(&registry, &store)).unwrap();
        let d1 = &json["clients"][0]["dvrs"][0];
        assert_eq!(d1["status"], "online");
        assert_eq!(d1["counts"]["analog"], 2);
        assert_eq!(d1["declaredChannels"], 8);
        assert!(d1["lastUpdated"].is_i64());
        assert_eq!(d1["auth"]["username"], "admin");
        assert!(d1["auth"].get("password").is_none());

        let d2 = &json["clients"][0]["dvrs"][1];
        assert_eq!(d2["status"], "unknown");
        assert!(d2.get("counts").is_none());
        assert!(d2["lastUpdated"].is_null());
    }

    #[test]
    fn empty_registry() {
        let summary = FleetSummary::build(&Registry::default(), &StateStore::new(Broadcaster::new()));
        assert_eq!(serde_json::to_value(summary).unwrap(), serde_json::json!({ "clients": [] }));
    }
}
