// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device identifier type.

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Identifier of a recorder, as assigned in the registry.
///
/// Cheap to clone: the scheduler, the store and every broadcast frame carry
/// one.
///
/// # Examples
///
/// ```
/// use dvr_monitor::registry::DeviceId;
///
/// let id = DeviceId::from("dvr-loja-01");
/// assert_eq!(id.as_str(), "dvr-loja-01");
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(Arc<str>);

impl DeviceId {
    /// Creates an identifier from any string.
    #[must_use]
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeviceId({})", self.0)
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for DeviceId {
    fn from(id: String) -> Self {
        Self(Arc::from(id))
    }
}

impl Borrow<str> for DeviceId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for DeviceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn equality() {
        assert_eq!(DeviceId::from("a"), DeviceId::from("a".to_string()));
        assert_ne!(DeviceId::from("a"), DeviceId::from("b"));
    }

    #[test]
    fn lookup_by_str() {
        let mut map = HashMap::new();
        map.insert(DeviceId::from("dvr-1"), 1);
        assert_eq!(map.get("dvr-1"), Some(&1));
    }

    #[test]
    fn debug_and_display() {
        let id = DeviceId::from("dvr-9");
        assert_eq!(format!("{id:?}"), "DeviceId(dvr-9)");
        assert_eq!(id.to_string(), "dvr-9");
    }

    #[test]
    fn serde_transparent() {
        let id: DeviceId = serde_json::from_str("\"x1\"").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"x1\"");
    }
}
