// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Vendor tags and the protocol family each one speaks.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Vendor tag declared for a device in the registry.
///
/// Unknown tags deserialize to [`Vendor::Other`] so that a registry with an
/// unexpected vendor still loads; such devices are reported as unsupported.
///
/// # Examples
///
/// ```
/// use dvr_monitor::types::{AdapterFamily, Vendor};
///
/// let vendor: Vendor = "jfl".parse().unwrap();
/// assert_eq!(vendor.family(), Some(AdapterFamily::Isapi));
/// assert_eq!("acme".parse::<Vendor>().unwrap().family(), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vendor {
    /// Hikvision recorders (ISAPI).
    Hikvision,
    /// JFL recorders, an ISAPI OEM.
    Jfl,
    /// Intelbras recorders (CGI config dumps).
    Intelbras,
    /// Any tag outside the supported set.
    #[serde(other)]
    Other,
}

impl Vendor {
    /// Returns the protocol family used to talk to this vendor, if any.
    #[must_use]
    pub fn family(self) -> Option<AdapterFamily> {
        match self {
            Self::Hikvision | Self::Jfl => Some(AdapterFamily::Isapi),
            Self::Intelbras => Some(AdapterFamily::Cgi),
            Self::Other => None,
        }
    }

    /// Returns the lowercase tag for this vendor.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hikvision => "hikvision",
            Self::Jfl => "jfl",
            Self::Intelbras => "intelbras",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Vendor {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "hikvision" => Self::Hikvision,
            "jfl" => Self::Jfl,
            "intelbras" => Self::Intelbras,
            _ => Self::Other,
        })
    }
}

/// Wire protocol family implemented by one adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdapterFamily {
    /// XML/JSON endpoints under the `/ISAPI` namespace.
    Isapi,
    /// `key=value` configuration dumps served from `/cgi-bin`.
    Cgi,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn isapi_family_shared_by_two_tags() {
        assert_eq!(Vendor::Hikvision.family(), Some(AdapterFamily::Isapi));
        assert_eq!(Vendor::Jfl.family(), Some(AdapterFamily::Isapi));
        assert_eq!(Vendor::Intelbras.family(), Some(AdapterFamily::Cgi));
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("HikVision".parse::<Vendor>().unwrap(), Vendor::Hikvision);
        assert_eq!(" intelbras ".parse::<Vendor>().unwrap(), Vendor::Intelbras);
    }

    #[test]
    fn unknown_tag_deserializes_to_other() {
        let vendor: Vendor = serde_json::from_str("\"dahua\"").unwrap();
        assert_eq!(vendor, Vendor::Other);
        assert!(vendor.family().is_none());
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Vendor::Jfl).unwrap(), "\"jfl\"");
    }
}
