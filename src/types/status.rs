// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device reachability status.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Reachability of a device as last observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    /// At least one probe succeeded.
    Online,
    /// Every probe failed.
    Offline,
    /// Not polled yet, or the device could not be addressed.
    #[default]
    Unknown,
}

impl DeviceStatus {
    /// Returns true for [`DeviceStatus::Online`].
    #[must_use]
    pub fn is_online(self) -> bool {
        matches!(self, Self::Online)
    }

    /// Maps a probe hit count to a status.
    #[must_use]
    pub fn from_hits(hits: usize) -> Self {
        if hits > 0 { Self::Online } else { Self::Offline }
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Online => "online",
            Self::Offline => "offline",
            Self::Unknown => "unknown",
        })
    }
}
