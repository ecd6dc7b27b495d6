// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory latest-status map.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;

use crate::event::{Broadcaster, StreamFrame};
use crate::registry::DeviceId;

use super::{StateEntry, StatusUpdate};

/// Latest known status of every device.
///
/// Writes merge into the existing entry, stamp it, and publish a `dvr` frame
/// to the attached [`Broadcaster`]. The lock is released before publishing.
///
/// # Examples
///
/// ```
/// use dvr_monitor::event::Broadcaster;
/// use dvr_monitor::registry::DeviceId;
/// use dvr_monitor::state::{StateStore, StatusUpdate};
/// use dvr_monitor::types::DeviceStatus;
///
/// let store = StateStore::new(Broadcaster::new());
/// let id = DeviceId::from("dvr-1");
///
/// store.update(&id, &StatusUpdate::status(DeviceStatus::Online));
/// assert_eq!(store.get(id.as_str()).unwrap().status, DeviceStatus::Online);
/// ```
#[derive(Debug, Clone)]
pub struct StateStore {
    entries: Arc<RwLock<HashMap<DeviceId, StateEntry>>>,
    broadcaster: Broadcaster,
}

impl StateStore {
    /// Creates an empty store publishing to `broadcaster`.
    #[must_use]
    pub fn new(broadcaster: Broadcaster) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            broadcaster,
        }
    }

    /// The broadcaster writes are published to.
    #[must_use]
    pub fn broadcaster(&self) -> &Broadcaster {
        &self.broadcaster
    }

    /// Merges `update` into the entry for `id`, creating it if needed, and
    /// returns the merged entry.
    pub fn update(&self, id: &DeviceId, update: &StatusUpdate) -> StateEntry {
        let entry = {
            let mut entries = self.entries.write();
            let entry = entries.entry(id.clone()).or_default();
            entry.apply(update, Utc::now());
            entry.clone()
        };

        match StreamFrame::dvr(id, &entry) {
            Ok(frame) => {
                let delivered = self.broadcaster.publish(&frame);
                tracing::trace!(dvr = %id, status = %entry.status, delivered, "State published");
            }
            Err(e) => tracing::warn!(dvr = %id, error = %e, "Failed to serialize state frame"),
        }
        entry
    }

    /// Returns a copy of the entry for `id`.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<StateEntry> {
        self.entries.read().get(id).cloned()
    }

    /// Returns a copy of every entry.
    #[must_use]
    pub fn snapshot(&self) -> HashMap<DeviceId, StateEntry> {
        self.entries.read().clone()
    }

    /// Number of devices with an entry.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if nothing has been written yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChannelCounts, DeviceStatus, Overview};

    #[test]
    fn entries_created_lazily() {
        let store = StateStore::new(Broadcaster::new());
        assert!(store.is_empty());
        assert!(store.get("d1").is_none());

        store.update(&"d1".into(), &StatusUpdate::status(DeviceStatus::Offline));
        assert_eq!(store.len(), 1);
        assert!(store.get("d1").unwrap().last_updated.is_some());
    }

    #[test]
    fn offline_write_keeps_counts() {
        let store = StateStore::new(Broadcaster::new());
        let id = DeviceId::from("d1");
        let overview = Overview::from_indices(DeviceStatus::Online, [0, 1].into(), [2].into());
        store.update(&id, &StatusUpdate::from_overview(&overview));
        let merged = store.update(&id, &StatusUpdate::status(DeviceStatus::Offline));

        assert_eq!(merged.status, DeviceStatus::Offline);
        assert_eq!(merged.counts, Some(ChannelCounts { analog: 2, ip: 1 }));
        assert_eq!(store.get("d1"), Some(merged));
    }

    #[tokio::test]
    async fn update_publishes_frame() {
        let broadcaster = Broadcaster::new();
        let mut sub = broadcaster.subscribe();
        let store = StateStore::new(broadcaster);

        store.update(&"d7".into(), &StatusUpdate::status(DeviceStatus::Online));

        let frame = sub.recv().await.unwrap();
        assert_eq!(frame.event(), "dvr");
        let json: serde_json::Value = serde_json::from_str(frame.data()).unwrap();
        assert_eq!(json["dvrId"], "d7");
        assert_eq!(json["data"]["status"], "online");
    }

    #[test]
    fn independent_devices() {
        let store = StateStore::new(Broadcaster::new());
        store.update(&"a".into(), &StatusUpdate::status(DeviceStatus::Online));
        store.update(&"b".into(), &StatusUpdate::status(DeviceStatus::Offline));
        let all = store.snapshot();
        assert_eq!(all.get("a").map(|e| e.status), Some(DeviceStatus::Online));
        assert_eq!(all.get("b").map(|e| e.status), Some(DeviceStatus::Offline));
    }
}
