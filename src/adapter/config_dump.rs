// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parsers for CGI `key=value` configuration dumps.
//!
//! CGI-family recorders answer configuration queries with one assignment per
//! line:
//!
//! ```text
//! table.Encode[0].MainFormat[0].Video.Compression=H.264
//! table.RemoteDevice.uuid:System_CONFIG_NETCAMERA_INFO_6.Enable=true
//! table.ChannelTitle[2].Name=Portaria
//! ```
//!
//! Keys may or may not carry the `table.` prefix depending on firmware.
//! Indices inside brackets are zero-based.

use std::collections::{BTreeMap, BTreeSet};

use crate::types::{DeviceTime, StorageDisk, default_disk_name};

use super::cluster::dense_cluster;

// ============================================================================
// Line and key helpers
// ============================================================================

/// Iterates over the `(key, value)` assignments of a dump, both trimmed.
pub fn assignments(text: &str) -> impl Iterator<Item = (&str, &str)> {
    text.lines().filter_map(|line| {
        let (key, value) = line.split_once('=')?;
        let key = key.trim();
        (!key.is_empty()).then(|| (key, value.trim()))
    })
}

/// Splits `Name[n].rest` into `(n, "rest")`.
fn indexed<'k>(key: &'k str, name: &str) -> Option<(u32, &'k str)> {
    let rest = key.strip_prefix(name)?.strip_prefix('[')?;
    let (digits, rest) = rest.split_once(']')?;
    let index = parse_index(digits)?;
    Some((index, rest.strip_prefix('.')?))
}

/// Like [`indexed`] but accepts an optional `table.` prefix.
fn table_indexed<'k>(key: &'k str, name: &str) -> Option<(u32, &'k str)> {
    indexed(key.strip_prefix("table.").unwrap_or(key), name)
}

fn parse_index(digits: &str) -> Option<u32> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Interprets the on/off spellings used across firmware versions.
#[must_use]
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "on" | "enable" | "enabled" | "connected" => Some(true),
        "false" | "0" | "off" | "disable" | "disabled" | "disconnected" => Some(false),
        _ => None,
    }
}

// ============================================================================
// Encode
// ============================================================================

/// Channel indices found in an `Encode` dump, reduced to the dense cluster.
///
/// `table.Encode[n].*` keys are preferred; only when none are present are bare
/// `Encode[n].MainFormat*` keys used.
#[must_use]
pub fn encode_indices(text: &str) -> BTreeSet<u32> {
    let tabled: Vec<u32> = assignments(text)
        .filter_map(|(key, _)| key.strip_prefix("table."))
        .filter_map(|key| indexed(key, "Encode").map(|(n, _)| n))
        .collect();
    if !tabled.is_empty() {
        return dense_cluster(tabled);
    }
    dense_cluster(
        assignments(text)
            .filter_map(|(key, _)| indexed(key, "Encode"))
            .filter(|(_, rest)| rest.starts_with("MainFormat"))
            .map(|(n, _)| n),
    )
}

// ============================================================================
// RemoteDevice
// ============================================================================

/// Remote (IP camera) devices declared in a `RemoteDevice` dump.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteDevices {
    entries: BTreeMap<String, Option<bool>>,
    bindings: BTreeSet<u32>,
}

impl RemoteDevices {
    /// Parses a dump.
    ///
    /// Entries are keyed either by bracket index (`RemoteDevice[3].`) or by
    /// uuid (`RemoteDevice.uuid:abc.`). Numeric entries outside the dense
    /// cluster of numeric ids are discarded.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut entries: BTreeMap<String, Option<bool>> = BTreeMap::new();
        let mut bindings = BTreeSet::new();

        for (key, value) in assignments(text) {
            let key = key.strip_prefix("table.").unwrap_or(key);
            let Some((id, prop)) = remote_device_key(key) else {
                continue;
            };
            let enabled = entries.entry(id.to_string()).or_default();
            if prop.eq_ignore_ascii_case("enable")
                && let Some(flag) = parse_flag(value)
            {
                *enabled = Some(flag);
            }
            if is_channel_binding(prop)
                && let Ok(channel) = value.parse::<u32>()
            {
                bindings.insert(channel);
            }
        }

        let numeric: Vec<u32> = entries.keys().filter_map(|k| parse_index(k)).collect();
        let keep = dense_cluster(numeric);
        if !keep.is_empty() {
            entries.retain(|k, _| parse_index(k).is_none_or(|n| keep.contains(&n)));
        }

        Self { entries, bindings }
    }

    /// Number of IP channels: the explicitly enabled entries if any entry
    /// carries an enable flag, otherwise every entry.
    #[must_use]
    pub fn ip_count(&self) -> usize {
        let flagged = self.entries.values().any(Option::is_some);
        if flagged {
            self.entries.values().filter(|e| **e == Some(true)).count()
        } else {
            self.entries.len()
        }
    }

    /// Local channel numbers the remote devices are bound to.
    #[must_use]
    pub fn bindings(&self) -> &BTreeSet<u32> {
        &self.bindings
    }

    /// Returns true if the dump declared no remote devices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Extracts `(id, property)` from `RemoteDevice[n].prop` or
/// `RemoteDevice.uuid:id.prop`.
fn remote_device_key(key: &str) -> Option<(&str, &str)> {
    let rest = key.strip_prefix("RemoteDevice")?;
    if let Some(uuid) = rest.strip_prefix(".uuid:") {
        let (id, prop) = uuid.split_once('.')?;
        return (!id.is_empty()).then_some((id.trim(), prop.trim()));
    }
    let rest = rest.strip_prefix('[')?;
    let (digits, prop) = rest.split_once(']')?;
    parse_index(digits)?;
    Some((digits, prop.strip_prefix('.')?.trim()))
}

/// Matches `Channel[m].{Local,Bind,Dst}{Channel,Chn,Chnnel}`, the same
/// suffixes directly under the device, and `ChannelID` / `ChnID`.
fn is_channel_binding(prop: &str) -> bool {
    if prop == "ChannelID" || prop == "ChnID" {
        return true;
    }
    let prop = match indexed(prop, "Channel") {
        Some((_, inner)) => inner,
        None => prop,
    };
    let prop = ["Local", "Bind", "Dst"]
        .iter()
        .find_map(|p| prop.strip_prefix(p))
        .unwrap_or(prop);
    matches!(prop, "Channel" | "Chn" | "Chnnel")
}

// ============================================================================
// ChannelTitle and camera state
// ============================================================================

/// Display names from a `ChannelTitle` dump. Blank names are skipped.
#[must_use]
pub fn channel_titles(text: &str) -> BTreeMap<u32, String> {
    assignments(text)
        .filter_map(|(key, value)| {
            let (index, prop) = table_indexed(key, "ChannelTitle")?;
            (prop == "Name" && !value.is_empty()).then(|| (index, value.to_string()))
        })
        .collect()
}

/// Per-channel connection state from `State[n].Online`, `Channel[n].Connected`
/// and `VideoInputChannel[n].Online` style dumps.
///
/// Indices are returned as the device wrote them; callers decide the base.
#[must_use]
pub fn channel_states(text: &str) -> BTreeMap<u32, bool> {
    assignments(text)
        .filter_map(|(key, value)| {
            let (index, prop) = ["State", "Channel", "VideoInputChannel"]
                .iter()
                .find_map(|name| table_indexed(key, name))?;
            if prop != "Online" && prop != "Connected" {
                return None;
            }
            Some((index, parse_flag(value)?))
        })
        .collect()
}

// ============================================================================
// Time
// ============================================================================

const TIME_LABELS: [&str; 3] = ["currenttime", "localtime", "devicetime"];

/// Finds the device time in a `getCurrentTime` / `getLocalTime` answer.
///
/// Labelled values (`currentTime=`, `LocalTime:` ...) are returned as
/// written. Failing those, the first bare timestamp anywhere in the text is
/// returned as `YYYY-MM-DD HH:MM:SS`.
#[must_use]
pub fn extract_time(text: &str) -> Option<String> {
    let lower = text.to_ascii_lowercase();
    for label in TIME_LABELS {
        for (pos, _) in lower.match_indices(label) {
            let after = &text[pos + label.len()..];
            let Some(value) = after.strip_prefix('=').or_else(|| after.strip_prefix(':')) else {
                continue;
            };
            let value = value.lines().next().unwrap_or("").trim();
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }
    DeviceTime::find(text).map(|t| t.naive().format("%Y-%m-%d %H:%M:%S").to_string())
}

// ============================================================================
// Storage
// ============================================================================

#[derive(Default)]
struct DiskAccumulator {
    total: f64,
    used: f64,
    name: Option<String>,
    health_flag: Option<i64>,
    state: String,
}

/// Disks from a `storageDevice.cgi?action=getDeviceAllInfo` dump.
///
/// Byte counts are summed across every `Detail[j]` partition of a disk.
#[must_use]
pub fn storage_disks(text: &str) -> Vec<StorageDisk> {
    let mut disks: BTreeMap<u32, DiskAccumulator> = BTreeMap::new();

    for (key, value) in assignments(text) {
        let Some((index, prop)) = indexed(key, "list.info") else {
            continue;
        };
        let disk = disks.entry(index).or_default();
        if let Some((_, field)) = indexed(prop, "Detail") {
            let bytes = value.parse::<f64>().unwrap_or(0.0);
            match field {
                "TotalBytes" => disk.total += bytes,
                "UsedBytes" => disk.used += bytes,
                _ => {}
            }
            continue;
        }
        match prop {
            "Name" => disk.name = Some(value.to_string()).filter(|n| !n.is_empty()),
            "HealthDataFlag" => disk.health_flag = value.parse().ok(),
            "State" => disk.state = value.to_string(),
            _ => {}
        }
    }

    disks
        .into_iter()
        .map(|(index, acc)| {
            let total_bytes = bytes_from_f64(acc.total);
            let used_bytes = bytes_from_f64(acc.used);
            StorageDisk {
                index,
                name: acc.name.unwrap_or_else(|| default_disk_name(index)),
                total_bytes,
                used_bytes,
                free_bytes: total_bytes.saturating_sub(used_bytes),
                health_ok: acc.health_flag == Some(0) && acc.state.eq_ignore_ascii_case("success"),
                state: acc.state,
                health_data_flag: acc.health_flag,
            }
        })
        .collect()
}

/// Converts a device-reported (possibly float formatted) byte count.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn bytes_from_f64(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value as u64
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignments_skip_noise() {
        let pairs: Vec<_> = assignments("Error\r\n a = b \r\n=x\nc=").collect();
        assert_eq!(pairs, vec![("a", "b"), ("c", "")]);
    }

    #[test]
    fn encode_prefers_table_keys() {
        let text = "table.Encode[0].MainFormat[0].Video.FPS=25\n\
                    table.Encode[1].MainFormat[0].Video.FPS=25\n\
                    Encode[9].MainFormat[0].Video.FPS=25\n";
        assert_eq!(encode_indices(text), [0, 1].into());
    }

    #[test]
    fn encode_bare_keys_need_main_format() {
        let text = "Encode[0].MainFormat[0].Video.FPS=25\n\
                    Encode[1].ExtraFormat[0].Video.FPS=25\n\
                    Encode[2].MainFormat[0].Video.FPS=25\n";
        assert_eq!(encode_indices(text), [0, 2].into());
    }

    #[test]
    fn encode_drops_placeholder_slot() {
        let text: String = [0, 1, 2, 3, 4, 5, 6, 7, 40]
            .iter()
            .map(|n| format!("table.Encode[{n}].MainFormat[0].Video.Compression=H.264\n"))
            .collect();
        assert_eq!(encode_indices(&text), (0..=7).collect());
    }

    #[test]
    fn remote_devices_count_enabled_only() {
        let text = "table.RemoteDevice[0].Enable=true\n\
                    table.RemoteDevice[0].Address=10.0.0.1\n\
                    table.RemoteDevice[1].Enable=false\n\
                    RemoteDevice[2].Enable=on\n";
        let remote = RemoteDevices::parse(text);
        assert_eq!(remote.ip_count(), 2);
    }

    #[test]
    fn remote_devices_without_flags_count_all() {
        let text = "table.RemoteDevice.uuid:cam-a.Address=10.0.0.1\n\
                    table.RemoteDevice.uuid:cam-b.Address=10.0.0.2\n";
        let remote = RemoteDevices::parse(text);
        assert_eq!(remote.ip_count(), 2);
        assert!(!remote.is_empty());
    }

    #[test]
    fn remote_devices_drop_sparse_numeric_ids() {
        let text = "table.RemoteDevice[0].Address=a\n\
                    table.RemoteDevice[1].Address=b\n\
                    table.RemoteDevice[99].Address=c\n\
                    table.RemoteDevice.uuid:x.Address=d\n";
        assert_eq!(RemoteDevices::parse(text).ip_count(), 3);
    }

    #[test]
    fn remote_device_bindings() {
        let text = "table.RemoteDevice[0].Channel[0].LocalChannel=6\n\
                    RemoteDevice[1].Channel[0].BindChn=7\n\
                    table.RemoteDevice[2].ChannelID=8\n\
                    table.RemoteDevice[3].Channel[0].Name=ignored\n";
        let remote = RemoteDevices::parse(text);
        assert_eq!(remote.bindings(), &BTreeSet::from([6, 7, 8]));
    }

    #[test]
    fn titles_skip_blank() {
        let text = "table.ChannelTitle[0].Name=Entrada\nChannelTitle[1].Name=\n";
        let titles = channel_titles(text);
        assert_eq!(titles.get(&0).map(String::as_str), Some("Entrada"));
        assert!(!titles.contains_key(&1));
    }

    #[test]
    fn states_from_text_dump() {
        let text = "State[0].Online=true\nChannel[1].Connected = Disconnected\n\
                    VideoInputChannel[2].Online=maybe\nState[3].Name=x\n";
        let states = channel_states(text);
        assert_eq!(states, BTreeMap::from([(0, true), (1, false)]));
    }

    #[test]
    fn time_from_label() {
        assert_eq!(
            extract_time("result=ok\r\ncurrentTime=2024-01-05 14:30:00\r\n").as_deref(),
            Some("2024-01-05 14:30:00")
        );
        assert_eq!(
            extract_time("LocalTime: 2024-01-05 14:30:00").as_deref(),
            Some("2024-01-05 14:30:00")
        );
    }

    #[test]
    fn time_from_bare_timestamp() {
        assert_eq!(
            extract_time("time is 2024-01-05T14:30:00Z").as_deref(),
            Some("2024-01-05 14:30:00")
        );
        assert_eq!(extract_time("Error"), None);
    }

    #[test]
    fn storage_sums_partitions() {
        let text = "list.info[0].Name=/dev/sda\n\
                    list.info[0].State=Success\n\
                    list.info[0].HealthDataFlag=0\n\
                    list.info[0].Detail[0].TotalBytes=1000.0\n\
                    list.info[0].Detail[0].UsedBytes=100.0\n\
                    list.info[0].Detail[1].TotalBytes=3000.0\n\
                    list.info[0].Detail[1].UsedBytes=900.0\n\
                    list.info[1].State=Error\n";
        let disks = storage_disks(text);
        assert_eq!(disks.len(), 2);
        assert_eq!(disks[0].name, "/dev/sda");
        assert_eq!(disks[0].total_bytes, 4000);
        assert_eq!(disks[0].used_bytes, 1000);
        assert_eq!(disks[0].free_bytes, 3000);
        assert!(disks[0].health_ok);
        assert_eq!(disks[1].name, "HD2");
        assert!(!disks[1].health_ok);
        assert_eq!(disks[1].health_data_flag, None);
    }

    #[test]
    fn flag_spellings() {
        assert_eq!(parse_flag("Enabled"), Some(true));
        assert_eq!(parse_flag(" OFF "), Some(false));
        assert_eq!(parse_flag("yes"), None);
    }
}
