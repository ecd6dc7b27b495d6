// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Recorder storage (hard disk) status.

use serde::{Deserialize, Serialize};

const TIB: f64 = 1_099_511_627_776.0;

/// One disk installed in a recorder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageDisk {
    /// Zero-based disk index.
    pub index: u32,
    /// Name reported by the device, or `HDn`.
    pub name: String,
    /// Capacity in bytes.
    pub total_bytes: u64,
    /// Used space in bytes.
    pub used_bytes: u64,
    /// Free space in bytes.
    pub free_bytes: u64,
    /// Whether the device considers the disk healthy.
    pub health_ok: bool,
    /// Raw state string from the device.
    pub state: String,
    /// Vendor health flag, when reported.
    pub health_data_flag: Option<i64>,
}

impl StorageDisk {
    /// Creates a disk entry, deriving used space from total and free.
    #[must_use]
    pub fn from_total_free(index: u32, name: String, total_bytes: u64, free_bytes: u64) -> Self {
        Self {
            index,
            name,
            total_bytes,
            used_bytes: total_bytes.saturating_sub(free_bytes),
            free_bytes,
            health_ok: true,
            state: String::new(),
            health_data_flag: None,
        }
    }

    /// One-line summary, e.g. `HD 1 total: 1.82 TB usado: 0.40 TB`.
    #[must_use]
    pub fn summary_line(&self) -> String {
        // Precision loss is irrelevant at two decimals of a terabyte.
        #[allow(clippy::cast_precision_loss)]
        let (total, used) = (self.total_bytes as f64 / TIB, self.used_bytes as f64 / TIB);
        format!(
            "HD {} total: {total:.2} TB usado: {used:.2} TB",
            self.index + 1
        )
    }
}

/// Default name for a zero-based disk index.
#[must_use]
pub fn default_disk_name(index: u32) -> String {
    format!("HD{}", index + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn used_is_saturating() {
        let disk = StorageDisk::from_total_free(0, "HD1".into(), 100, 250);
        assert_eq!(disk.used_bytes, 0);
    }

    #[test]
    fn summary_line_in_tib() {
        let disk = StorageDisk::from_total_free(1, "HD2".into(), 2 * 1_099_511_627_776, 1_099_511_627_776);
        assert_eq!(disk.summary_line(), "HD 2 total: 2.00 TB usado: 1.00 TB");
    }

    #[test]
    fn serializes_camel_case() {
        let disk = StorageDisk::from_total_free(0, default_disk_name(0), 10, 4);
        let json = serde_json::to_value(&disk).unwrap();
        assert_eq!(json["totalBytes"], 10);
        assert_eq!(json["usedBytes"], 6);
        assert_eq!(json["name"], "HD1");
    }
}
