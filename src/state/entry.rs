// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-device status entries and partial updates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ChannelCounts, ChannelIndices, DeviceStatus, Overview};

/// Latest known status of one device.
///
/// Serializes as `{status, counts, indices, lastUpdated}` with `lastUpdated`
/// in Unix milliseconds. Fields never observed are `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateEntry {
    /// Last observed reachability.
    pub status: DeviceStatus,
    /// Last known channel counts.
    pub counts: Option<ChannelCounts>,
    /// Last known channel indices.
    pub indices: Option<ChannelIndices>,
    /// When the entry was last written.
    #[serde(with = "chrono::serde::ts_milliseconds_option")]
    pub last_updated: Option<DateTime<Utc>>,
}

impl StateEntry {
    /// Merges `update` into this entry and stamps it with `now`.
    ///
    /// Fields absent from the update keep their previous value.
    pub fn apply(&mut self, update: &StatusUpdate, now: DateTime<Utc>) {
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(counts) = update.counts {
            self.counts = Some(counts);
        }
        if let Some(indices) = &update.indices {
            self.indices = Some(indices.clone());
        }
        self.last_updated = Some(now);
    }

    /// `lastUpdated` in Unix milliseconds.
    #[must_use]
    pub fn last_updated_ms(&self) -> Option<i64> {
        self.last_updated.map(|t| t.timestamp_millis())
    }
}

/// A partial write to a [`StateEntry`].
///
/// # Examples
///
/// ```
/// use dvr_monitor::state::{StateEntry, StatusUpdate};
/// use dvr_monitor::types::{DeviceStatus, Overview};
///
/// let mut entry = StateEntry::default();
/// entry.apply(&StatusUpdate::from_overview(&Overview::from_indices(
///     DeviceStatus::Online,
///     [0, 1].into(),
///     [].into(),
/// )), chrono::Utc::now());
///
/// // A status-only update keeps the counts.
/// entry.apply(&StatusUpdate::status(DeviceStatus::Offline), chrono::Utc::now());
/// assert_eq!(entry.status, DeviceStatus::Offline);
/// assert_eq!(entry.counts.unwrap().analog, 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusUpdate {
    /// New status, if observed.
    pub status: Option<DeviceStatus>,
    /// New counts, if observed.
    pub counts: Option<ChannelCounts>,
    /// New indices, if observed.
    pub indices: Option<ChannelIndices>,
}

impl StatusUpdate {
    /// An update touching only the status.
    #[must_use]
    pub fn status(status: DeviceStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// An update carrying a full overview.
    #[must_use]
    pub fn from_overview(overview: &Overview) -> Self {
        Self {
            status: Some(overview.status),
            counts: Some(overview.counts),
            indices: Some(overview.indices.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).unwrap()
    }

    #[test]
    fn partial_update_preserves_counts() {
        let mut entry = StateEntry::default();
        let overview = Overview::from_indices(DeviceStatus::Online, [0, 1, 2].into(), [5].into());
        entry.apply(&StatusUpdate::from_overview(&overview), at(1_000));
        entry.apply(&StatusUpdate::status(DeviceStatus::Offline), at(2_000));

        assert_eq!(entry.status, DeviceStatus::Offline);
        assert_eq!(entry.counts, Some(ChannelCounts { analog: 3, ip: 1 }));
        assert_eq!(entry.indices.as_ref().map(|i| i.ip.clone()), Some(vec![5]));
        assert_eq!(entry.last_updated_ms(), Some(2_000));
    }

    #[test]
    fn serializes_millis() {
        let mut entry = StateEntry::default();
        entry.apply(&StatusUpdate::status(DeviceStatus::Online), at(1_700_000_000_123));
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "status": "online",
                "counts": null,
                "indices": null,
                "lastUpdated": 1_700_000_000_123_i64
            })
        );
    }

    #[test]
    fn default_entry_is_unknown() {
        let entry = StateEntry::default();
        assert_eq!(entry.status, DeviceStatus::Unknown);
        assert_eq!(entry.last_updated_ms(), None);
    }
}
