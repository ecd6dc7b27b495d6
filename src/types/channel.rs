// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-channel identity.

use serde::{Deserialize, Serialize};

/// One video channel of a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    /// Zero-based logical channel index.
    pub index: u32,
    /// Display name reported by the device, or a `CAM n` placeholder.
    pub name: String,
    /// Camera connection state; `None` when the device did not say.
    pub online: Option<bool>,
}

impl Channel {
    /// Creates a channel with the default `CAM n` name (1-based).
    #[must_use]
    pub fn unnamed(index: u32) -> Self {
        Self {
            index,
            name: default_name(index),
            online: None,
        }
    }

    /// Sets the display name, ignoring blank names.
    #[must_use]
    pub fn with_name(mut self, name: Option<&str>) -> Self {
        if let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) {
            self.name = name.to_string();
        }
        self
    }

    /// Sets the online flag.
    #[must_use]
    pub fn with_online(mut self, online: Option<bool>) -> Self {
        self.online = online;
        self
    }
}

/// Placeholder name for a zero-based index.
#[must_use]
pub fn default_name(index: u32) -> String {
    format!("CAM {}", index + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unnamed_uses_one_based_label() {
        let ch = Channel::unnamed(0);
        assert_eq!(ch.name, "CAM 1");
        assert_eq!(ch.online, None);
    }

    #[test]
    fn blank_name_is_ignored() {
        let ch = Channel::unnamed(3).with_name(Some("   "));
        assert_eq!(ch.name, "CAM 4");
        let ch = ch.with_name(Some(" Portaria "));
        assert_eq!(ch.name, "Portaria");
    }

    #[test]
    fn online_serializes_as_null_when_unknown() {
        let json = serde_json::to_value(Channel::unnamed(1)).unwrap();
        assert_eq!(json["online"], serde_json::Value::Null);
    }
}
