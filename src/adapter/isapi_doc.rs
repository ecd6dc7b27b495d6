// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ISAPI document parsing.
//!
//! ISAPI endpoints answer in JSON when asked with `?format=json` and the
//! firmware supports it, and in XML otherwise. XML answers are converted into
//! the same JSON shape (attributes become `@name` keys, repeated elements
//! become arrays, text-only elements become strings) so that one set of
//! extractors handles both encodings.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::{Map, Value};
use xmltree::{Element, XMLNode};

use crate::error::ParseError;
use crate::types::{StorageDisk, default_disk_name};

use super::config_dump::bytes_from_f64;

const MB: f64 = 1_000_000.0;
const MIB: f64 = 1_048_576.0;
const GIB: f64 = 1_073_741_824.0;

// ============================================================================
// XML to JSON
// ============================================================================

/// Parses an XML document into `{ "<root>": <content> }`.
///
/// # Errors
///
/// Returns [`ParseError::Xml`] if the text is not well-formed XML.
///
/// # Examples
///
/// ```
/// use dvr_monitor::adapter::isapi_doc::xml_to_json;
///
/// let doc = xml_to_json(r#"<List><Item id="1"><name> A </name></Item><Item id="2"/></List>"#).unwrap();
/// assert_eq!(doc["List"]["Item"][0]["@id"], "1");
/// assert_eq!(doc["List"]["Item"][0]["name"], "A");
/// ```
pub fn xml_to_json(xml: &str) -> Result<Value, ParseError> {
    let root = Element::parse(xml.trim_start().as_bytes())?;
    let mut doc = Map::new();
    doc.insert(root.name.clone(), element_to_value(&root));
    Ok(Value::Object(doc))
}

fn element_to_value(element: &Element) -> Value {
    let mut fields = Map::new();
    for (name, value) in &element.attributes {
        fields.insert(format!("@{name}"), Value::String(value.clone()));
    }

    let mut text = String::new();
    for child in &element.children {
        match child {
            XMLNode::Element(child) => {
                let value = element_to_value(child);
                match fields.get_mut(&child.name) {
                    Some(Value::Array(items)) => items.push(value),
                    Some(existing) => {
                        let first = existing.take();
                        *existing = Value::Array(vec![first, value]);
                    }
                    None => {
                        fields.insert(child.name.clone(), value);
                    }
                }
            }
            XMLNode::Text(t) | XMLNode::CData(t) => text.push_str(t),
            _ => {}
        }
    }

    let text = text.trim();
    if fields.is_empty() {
        Value::String(text.to_string())
    } else {
        if !text.is_empty() {
            fields.insert("#text".to_string(), Value::String(text.to_string()));
        }
        Value::Object(fields)
    }
}

// ============================================================================
// Value helpers
// ============================================================================

/// A single value or an array of values, as a slice-like list.
fn list(value: Option<&Value>) -> Vec<&Value> {
    match value {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(Value::Null) | None => Vec::new(),
        Some(other) => vec![other],
    }
}

/// Reads an integer from a JSON number or a numeric string.
fn integer(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(integral)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integral))
        }
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation)]
fn integral(f: f64) -> Option<i64> {
    (f.is_finite() && f.fract() == 0.0).then_some(f as i64)
}

fn float(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .filter(|f| f.is_finite() && *f != 0.0)
}

fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
    .filter(|s| !s.is_empty())
}

/// Resolves a channel id: `id`, `channelId`, `logicalChannel`, `@id`,
/// `@channelNo`, then the 1-based position.
fn channel_id(entry: &Value, position: usize) -> i64 {
    ["id", "channelId", "logicalChannel", "@id", "@channelNo"]
        .iter()
        .find_map(|key| integer(entry.get(key)))
        .unwrap_or_else(|| i64::try_from(position + 1).unwrap_or(i64::MAX))
}

/// Converts 1-based device ids into sorted zero-based indices.
#[must_use]
pub fn zero_based(ids: impl IntoIterator<Item = i64>) -> BTreeSet<u32> {
    ids.into_iter()
        .filter_map(|id| u32::try_from(id.saturating_sub(1)).ok())
        .collect()
}

// ============================================================================
// Channel listings
// ============================================================================

/// An enabled analog input from a `VideoInputChannelList`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoInput {
    /// Device (1-based) channel id.
    pub id: i64,
    /// Name or resolution description, when not blank.
    pub label: Option<String>,
}

/// Enabled analog inputs, skipping entries reporting `NO VIDEO`.
///
/// Returns `None` if the document has no `VideoInputChannelList`.
#[must_use]
pub fn video_inputs(doc: &Value) -> Option<Vec<VideoInput>> {
    let root = doc.get("VideoInputChannelList")?;
    let inputs = list(root.get("VideoInputChannel"))
        .into_iter()
        .enumerate()
        .filter(|(_, entry)| input_enabled(entry.get("videoInputEnabled")))
        .filter(|(_, entry)| {
            !text(entry.get("resDesc")).is_some_and(|d| d.eq_ignore_ascii_case("NO VIDEO"))
        })
        .map(|(position, entry)| VideoInput {
            id: channel_id(entry, position),
            label: text(entry.get("name")).or_else(|| text(entry.get("resDesc"))),
        })
        .collect();
    Some(inputs)
}

fn input_enabled(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(other) => !text(Some(other)).is_some_and(|s| s == "0" || s.eq_ignore_ascii_case("false")),
        None => true,
    }
}

/// Ids from an `InputProxyChannelList` (IP cameras).
#[must_use]
pub fn proxy_channel_ids(doc: &Value) -> BTreeSet<i64> {
    let root = doc.get("InputProxyChannelList");
    list(root.and_then(|r| r.get("InputProxyChannel")))
        .into_iter()
        .enumerate()
        .map(|(position, entry)| channel_id(entry, position))
        .collect()
}

/// Per-channel online flags from `workingstatus/chanStatus`, keyed by device
/// (1-based) id.
#[must_use]
pub fn channel_states(doc: &Value) -> BTreeMap<i64, bool> {
    let mut entries = list(doc.get("ChanStatusList").and_then(|l| l.get("ChanStatus")));
    if entries.is_empty() {
        entries = list(doc.get("chanStatus"));
    }
    entries
        .into_iter()
        .filter_map(|entry| {
            let id = ["id", "channel", "chan"]
                .iter()
                .find_map(|key| integer(entry.get(key)))?;
            let state = ["online", "status", "state"]
                .iter()
                .find_map(|key| text(entry.get(key)))
                .unwrap_or_default()
                .to_ascii_lowercase();
            let online = matches!(state.as_str(), "true" | "1" | "online" | "connected");
            Some((id, online))
        })
        .collect()
}

// ============================================================================
// Time
// ============================================================================

/// The `Time.localTime` (or top-level `localTime`) string.
#[must_use]
pub fn local_time(doc: &Value) -> Option<String> {
    text(doc.get("Time").and_then(|t| t.get("localTime"))).or_else(|| text(doc.get("localTime")))
}

// ============================================================================
// Storage
// ============================================================================

/// Disks from `workingstatus/hdStatus?format=json`. Sizes are in MB.
#[must_use]
pub fn disks_from_status(doc: &Value) -> Vec<StorageDisk> {
    let status = doc.get("HDStatus");
    let entries = match status {
        Some(Value::Array(items)) if !items.is_empty() => items.iter().collect(),
        Some(status) => {
            let nested = list(status.get("HDs").and_then(|h| h.get("HD")));
            if nested.is_empty() { list(status.get("HD")) } else { nested }
        }
        None => Vec::new(),
    };

    entries
        .into_iter()
        .enumerate()
        .map(|(position, entry)| {
            let index = integer(entry.get("hdNo"))
                .map(|no| no.saturating_sub(1))
                .or_else(|| integer(entry.get("id")))
                .and_then(|i| u32::try_from(i).ok())
                .unwrap_or_else(|| u32::try_from(position).unwrap_or(u32::MAX));
            let volume = ["volume", "capacity", "total"]
                .iter()
                .find_map(|key| float(entry.get(key)))
                .unwrap_or(0.0);
            let free = ["freeSpace", "free"]
                .iter()
                .find_map(|key| float(entry.get(key)))
                .unwrap_or(0.0);
            let mut disk = StorageDisk::from_total_free(
                index,
                default_disk_name(index),
                bytes_from_f64(volume * MB),
                bytes_from_f64(free * MB),
            );
            disk.state = text(entry.get("status")).unwrap_or_default();
            disk
        })
        .collect()
}

/// Disks from the `ContentMgmt/Storage/hdd` XML listing.
///
/// Ids are 1-based. Capacity units vary by firmware: values below 51 200 are
/// GiB, below 50 TiB expressed in MiB are MiB, anything larger is bytes.
#[must_use]
pub fn disks_from_hdd_list(doc: &Value) -> Vec<StorageDisk> {
    let mut entries = list(doc.get("hddList").and_then(|l| l.get("hdd")));
    if entries.is_empty() {
        entries = list(doc.get("hdd"));
    }

    entries
        .into_iter()
        .enumerate()
        .map(|(position, entry)| {
            let index = integer(entry.get("id"))
                .and_then(|id| u32::try_from(id.saturating_sub(1)).ok())
                .unwrap_or_else(|| u32::try_from(position).unwrap_or(u32::MAX));
            let capacity = ["capacity", "totalSpace", "size"]
                .iter()
                .find_map(|key| float(entry.get(key)));
            let free = ["freeSpace", "free"]
                .iter()
                .find_map(|key| float(entry.get(key)))
                .unwrap_or(0.0);
            let unit = match capacity {
                Some(c) if c < 50.0 * 1024.0 => GIB,
                Some(c) if c < 50.0 * MIB => MIB,
                _ => 1.0,
            };
            let mut disk = StorageDisk::from_total_free(
                index,
                text(entry.get("name")).unwrap_or_else(|| default_disk_name(index)),
                bytes_from_f64(capacity.unwrap_or(0.0) * unit),
                bytes_from_f64(free * unit),
            );
            disk.state = text(entry.get("status")).unwrap_or_default();
            disk
        })
        .collect()
}
