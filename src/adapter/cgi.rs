// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! CGI/text-dump adapter.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::{Value, json};

use crate::protocol::{DeviceRequest, DigestClient, Endpoint};
use crate::types::{Channel, DeviceStatus, DeviceTime, Overview};

use super::config_dump::{self, RemoteDevices};
use super::outcome::{
    ChannelList, ClockSync, ClockSyncOptions, CurrentTime, Ping, Snapshot, StorageReport, SyncStep,
};
use super::{VendorAdapter, get_ok, send, status_of};

const CONFIG: &str = "/cgi-bin/configManager.cgi?action=getConfig&name=";
const CAMERA_STATE: &str = "/cgi-bin/api/LogicDeviceManager/getCameraState";
const CHANNEL_STATE: &str = "/cgi-bin/devVideoInput.cgi?action=getChannelState";
const CURRENT_TIME: &str = "/cgi-bin/global.cgi?action=getCurrentTime";
const LOCAL_TIME: &str = "/cgi-bin/magicBox.cgi?action=getLocalTime";
const SYSTEM_INFO: &str = "/cgi-bin/magicBox.cgi?action=getSystemInfo";
const STORAGE: &str = "/cgi-bin/storageDevice.cgi?action=getDeviceAllInfo";

/// Adapter for devices answering `/cgi-bin/...` requests with config dumps.
///
/// Dump indices are zero-based; the snapshot endpoint takes 1-based channel
/// numbers.
#[derive(Debug, Clone)]
pub struct CgiAdapter {
    client: DigestClient,
}

impl CgiAdapter {
    /// Creates the adapter.
    #[must_use]
    pub fn new(client: DigestClient) -> Self {
        Self { client }
    }

    /// Fetches a named config dump, or `None` if the device did not return a
    /// non-empty 2xx body.
    async fn config(&self, endpoint: &Endpoint, name: &str) -> Option<String> {
        let response = get_ok(&self.client, endpoint, &format!("{CONFIG}{name}")).await?;
        let text = response.text();
        (!text.trim().is_empty()).then(|| text.into_owned())
    }

    /// Camera connection states: the JSON API first, then text dumps.
    async fn camera_states(&self, endpoint: &Endpoint) -> BTreeMap<u32, bool> {
        let request = DeviceRequest::post(endpoint.url(CAMERA_STATE))
            .with_json(&json!({ "uniqueChannels": [-1] }));
        if let Some(response) = send(&self.client, endpoint, request).await
            && response.is_success()
            && let Ok(doc) = response.json::<Value>()
        {
            let states = json_camera_states(&doc);
            if !states.is_empty() {
                return states;
            }
        }

        for path in [CHANNEL_STATE.to_string(), format!("{CONFIG}Channel")] {
            let Some(response) = get_ok(&self.client, endpoint, &path).await else {
                continue;
            };
            let states = config_dump::channel_states(&response.text());
            if !states.is_empty() {
                return states;
            }
        }
        BTreeMap::new()
    }

    async fn read_time(&self, endpoint: &Endpoint, path: &str) -> CurrentTime {
        let Some(response) = send(&self.client, endpoint, DeviceRequest::get(endpoint.url(path))).await
        else {
            return CurrentTime::unavailable(0);
        };
        if !response.is_success() {
            return CurrentTime::unavailable(response.status());
        }
        // A labelled value that holds no timestamp (`currentTime=Error`) is
        // not a reading.
        match config_dump::extract_time(&response.text()) {
            Some(raw) if DeviceTime::find(&raw).is_some() => {
                CurrentTime::read(response.status(), &raw, Some(raw.clone()))
            }
            _ => CurrentTime::unavailable(response.status()),
        }
    }
}

impl VendorAdapter for CgiAdapter {
    async fn overview(&self, endpoint: &Endpoint) -> Overview {
        let encode = self.config(endpoint, "Encode").await;
        let remote = self.config(endpoint, "RemoteDevice").await;
        let hits = usize::from(encode.is_some()) + usize::from(remote.is_some());

        let all = config_dump::encode_indices(encode.as_deref().unwrap_or_default());
        let remote = RemoteDevices::parse(remote.as_deref().unwrap_or_default());
        let (analog, ip) = split_ip_channels(&all, &remote);

        Overview::from_indices(DeviceStatus::from_hits(hits), analog, ip)
    }

    async fn list_channels(&self, endpoint: &Endpoint) -> ChannelList {
        let encode = self.config(endpoint, "Encode").await;
        // No encoder dump means no channels to list, which is still an answer.
        let Some(encode) = encode else {
            return ChannelList { ok: true, channels: Vec::new() };
        };
        let titles = self
            .config(endpoint, "ChannelTitle")
            .await
            .map(|t| config_dump::channel_titles(&t))
            .unwrap_or_default();
        let states = self.camera_states(endpoint).await;

        let channels = config_dump::encode_indices(&encode)
            .into_iter()
            .map(|index| {
                // Some firmware reports state 1-based.
                let online = states
                    .get(&index)
                    .or_else(|| states.get(&(index + 1)))
                    .copied();
                Channel::unnamed(index)
                    .with_name(titles.get(&index).map(String::as_str))
                    .with_online(online)
            })
            .collect();

        ChannelList { ok: true, channels }
    }

    async fn snapshot(&self, endpoint: &Endpoint, index: u32) -> Snapshot {
        let path = format!("/cgi-bin/snapshot.cgi?channel={}", u64::from(index) + 1);
        let Some(response) = send(&self.client, endpoint, DeviceRequest::get(endpoint.url(&path))).await
        else {
            return Snapshot::failed();
        };
        let content_type = match response.content_type() {
            "" => "image/jpeg".to_string(),
            ct => ct.to_string(),
        };
        Snapshot {
            ok: response.is_success(),
            http_status: response.status(),
            content_type,
            bytes: response.into_body(),
        }
    }

    async fn current_time(&self, endpoint: &Endpoint) -> CurrentTime {
        let primary = self.read_time(endpoint, CURRENT_TIME).await;
        if primary.ok {
            return primary;
        }
        tracing::debug!(url = %endpoint.base_url(), "getCurrentTime gave no time, trying getLocalTime");
        let fallback = self.read_time(endpoint, LOCAL_TIME).await;
        if fallback.ok || fallback.http_status != 0 {
            fallback
        } else {
            primary
        }
    }

    async fn sync_clock(&self, endpoint: &Endpoint, options: &ClockSyncOptions) -> ClockSync {
        let path = format!(
            "/cgi-bin/configManager.cgi?action=setConfig&NTP.Address={}&NTP.Enable=true",
            urlencoding::encode(options.host())
        );
        let ok = get_ok(&self.client, endpoint, &path).await.is_some();
        if !ok {
            tracing::warn!(url = %endpoint.base_url(), "NTP setConfig was rejected");
        }
        ClockSync::from_steps(vec![SyncStep { name: "ntp-config", ok }])
    }

    async fn ping(&self, endpoint: &Endpoint) -> Ping {
        let response = send(&self.client, endpoint, DeviceRequest::get(endpoint.url(SYSTEM_INFO))).await;
        Ping::from_status(status_of(response.as_ref()))
    }

    async fn storage(&self, endpoint: &Endpoint) -> StorageReport {
        let response = send(&self.client, endpoint, DeviceRequest::get(endpoint.url(STORAGE))).await;
        let http_status = status_of(response.as_ref());
        match response {
            Some(response) if response.is_success() => StorageReport {
                ok: true,
                http_status,
                disks: config_dump::storage_disks(&response.text()),
            },
            _ => StorageReport {
                http_status,
                ..StorageReport::default()
            },
        }
    }
}

/// Splits the encoder channel set into `(analog, ip)`.
///
/// IP channels are the explicit remote device bindings that are real encoder
/// channels. Without bindings, the highest `ip_count` encoder channels are
/// assumed to be the IP ones, which is how these recorders number them.
fn split_ip_channels(all: &BTreeSet<u32>, remote: &RemoteDevices) -> (BTreeSet<u32>, BTreeSet<u32>) {
    let ip_count = remote.ip_count();

    let mut ip: BTreeSet<u32> = remote.bindings().intersection(all).copied().collect();
    if ip.is_empty() {
        ip = all.iter().rev().take(ip_count).copied().collect();
    }
    let ip: BTreeSet<u32> = ip.into_iter().take(ip_count).collect();

    let analog_count = all.len().saturating_sub(ip_count);
    let analog = all
        .difference(&ip)
        .copied()
        .take(analog_count)
        .collect();
    (analog, ip)
}

/// `{"states":[{"channel":0,"connectionState":"Connected"}, ...]}`
fn json_camera_states(doc: &Value) -> BTreeMap<u32, bool> {
    let Some(states) = doc.get("states").and_then(Value::as_array) else {
        return BTreeMap::new();
    };
    states
        .iter()
        .filter_map(|state| {
            let channel = match state.get("channel")? {
                Value::Number(n) => n.as_u64(),
                Value::String(s) => s.trim().parse().ok(),
                _ => None,
            }?;
            let connected = state.get("connectionState").and_then(Value::as_str) == Some("Connected");
            Some((u32::try_from(channel).ok()?, connected))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote(text: &str) -> RemoteDevices {
        RemoteDevices::parse(text)
    }

    #[test]
    fn split_uses_top_indices_without_bindings() {
        let all: BTreeSet<u32> = (0..=7).collect();
        let (analog, ip) = split_ip_channels(
            &all,
            &remote("table.RemoteDevice[6].Enable=true\ntable.RemoteDevice[7].Enable=true\n"),
        );
        assert_eq!(ip, [6, 7].into());
        assert_eq!(analog, (0..=5).collect());
    }

    #[test]
    fn split_prefers_bindings() {
        let all: BTreeSet<u32> = (0..=7).collect();
        let (analog, ip) = split_ip_channels(
            &all,
            &remote(
                "table.RemoteDevice[0].Enable=true\n\
                 table.RemoteDevice[0].Channel[0].LocalChannel=2\n",
            ),
        );
        assert_eq!(ip, [2].into());
        assert_eq!(analog, [0, 1, 3, 4, 5, 6, 7].into());
    }

    #[test]
    fn split_ignores_bindings_outside_encoder_set() {
        let all: BTreeSet<u32> = (0..4).collect();
        let (analog, ip) = split_ip_channels(
            &all,
            &remote("RemoteDevice[0].Enable=true\nRemoteDevice[0].ChannelID=30\n"),
        );
        assert_eq!(ip, [3].into());
        assert_eq!(analog, [0, 1, 2].into());
    }

    #[test]
    fn split_without_remote_devices() {
        let all: BTreeSet<u32> = (0..4).collect();
        let (analog, ip) = split_ip_channels(&all, &RemoteDevices::default());
        assert!(ip.is_empty());
        assert_eq!(analog, all);
    }

    #[test]
    fn split_caps_analog_when_bindings_are_short() {
        // Three enabled remotes but only one binding: analog is capped so the
        // unbound remotes are not counted as analog.
        let all: BTreeSet<u32> = (0..6).collect();
        let (analog, ip) = split_ip_channels(
            &all,
            &remote(
                "RemoteDevice[0].Enable=true\nRemoteDevice[0].ChannelID=5\n\
                 RemoteDevice[1].Enable=true\nRemoteDevice[2].Enable=true\n",
            ),
        );
        assert_eq!(ip, [5].into());
        assert_eq!(analog, [0, 1, 2].into());
    }

    #[test]
    fn camera_states_from_json() {
        let doc = json!({ "states": [
            { "channel": 0, "connectionState": "Connected" },
            { "channel": "1", "connectionState": "Disconnected" },
            { "connectionState": "Connected" }
        ]});
        assert_eq!(json_camera_states(&doc), BTreeMap::from([(0, true), (1, false)]));
        assert!(json_camera_states(&json!({ "error": 1 })).is_empty());
    }
}
