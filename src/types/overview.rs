// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Channel population summary of a device.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::DeviceStatus;

/// Number of analog and IP channels on a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChannelCounts {
    /// Analog (coax) inputs.
    pub analog: usize,
    /// IP camera (proxy/remote device) inputs.
    pub ip: usize,
}

impl ChannelCounts {
    /// Total number of channels.
    #[must_use]
    pub fn total(&self) -> usize {
        self.analog + self.ip
    }
}

/// Zero-based channel indices, split by kind.
///
/// Both lists are sorted ascending, free of duplicates and disjoint.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChannelIndices {
    /// Analog channel indices.
    pub analog: Vec<u32>,
    /// IP channel indices.
    pub ip: Vec<u32>,
}

/// Summarized channel counts and index sets of one device.
///
/// Built only through [`Overview::from_indices`] or [`Overview::offline`],
/// which guarantees `counts.analog == indices.analog.len()`,
/// `counts.ip == indices.ip.len()` and that the two index sets never intersect.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeSet;
/// use dvr_monitor::types::{DeviceStatus, Overview};
///
/// let analog: BTreeSet<u32> = [0, 1, 2].into();
/// let ip: BTreeSet<u32> = [2, 3].into();
/// let overview = Overview::from_indices(DeviceStatus::Online, analog, ip);
///
/// assert_eq!(overview.indices.analog, vec![0, 1]);
/// assert_eq!(overview.counts.ip, 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Overview {
    /// Reachability observed while building this overview.
    pub status: DeviceStatus,
    /// Channel counts.
    pub counts: ChannelCounts,
    /// Channel indices.
    pub indices: ChannelIndices,
}

impl Overview {
    /// Builds an overview from zero-based index sets.
    ///
    /// An index present in both sets is kept as IP only.
    #[must_use]
    pub fn from_indices(status: DeviceStatus, analog: BTreeSet<u32>, ip: BTreeSet<u32>) -> Self {
        let analog: Vec<u32> = analog.difference(&ip).copied().collect();
        let ip: Vec<u32> = ip.into_iter().collect();
        Self {
            status,
            counts: ChannelCounts {
                analog: analog.len(),
                ip: ip.len(),
            },
            indices: ChannelIndices { analog, ip },
        }
    }

    /// An empty overview for a device that did not answer.
    #[must_use]
    pub fn offline() -> Self {
        Self {
            status: DeviceStatus::Offline,
            ..Self::default()
        }
    }

    /// Returns true if the device answered at least one probe.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status.is_online()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_match_indices() {
        let overview = Overview::from_indices(
            DeviceStatus::Online,
            [0, 1, 2, 3].into(),
            [6, 7].into(),
        );
        assert_eq!(overview.counts.analog, overview.indices.analog.len());
        assert_eq!(overview.counts.ip, overview.indices.ip.len());
        assert_eq!(overview.counts.total(), 6);
    }

    #[test]
    fn overlapping_indices_are_kept_as_ip() {
        let overview =
            Overview::from_indices(DeviceStatus::Online, [0, 1, 5].into(), [5].into());
        assert_eq!(overview.indices.analog, vec![0, 1]);
        assert_eq!(overview.indices.ip, vec![5]);
    }

    #[test]
    fn offline_is_empty_and_not_ok() {
        let overview = Overview::offline();
        assert!(!overview.is_ok());
        assert_eq!(overview.counts, ChannelCounts::default());
        assert!(overview.indices.analog.is_empty());
    }

    #[test]
    fn serializes_wire_shape() {
        let overview = Overview::from_indices(DeviceStatus::Online, [0].into(), BTreeSet::new());
        let json = serde_json::to_value(&overview).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "status": "online",
                "counts": { "analog": 1, "ip": 0 },
                "indices": { "analog": [0], "ip": [] }
            })
        );
    }
}
