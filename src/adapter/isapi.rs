// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ISAPI-family adapter.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::{Value, json};

use crate::protocol::{DeviceRequest, DeviceResponse, DigestClient, Endpoint};
use crate::types::{Channel, DeviceStatus, DeviceTime, Overview};

use super::isapi_doc::{self, VideoInput};
use super::outcome::{
    ChannelList, ClockSync, ClockSyncOptions, CurrentTime, Ping, Snapshot, StorageReport, SyncStep,
};
use super::{VendorAdapter, get_ok, send, status_of};

const VIDEO_INPUTS: &str = "/ISAPI/System/Video/inputs/channels";
const PROXY_CHANNELS: &str = "/ISAPI/ContentMgmt/InputProxy/channels";
const CHANNEL_STATUS: &str = "/ISAPI/System/workingstatus/chanStatus?format=json";
const TIME: &str = "/ISAPI/System/time";
const DEVICE_INFO: &str = "/ISAPI/System/deviceInfo";
const HD_STATUS: &str = "/ISAPI/System/workingstatus/hdStatus?format=json";
const HDD_LIST: &str = "/ISAPI/ContentMgmt/Storage/hdd";

/// Adapter for devices speaking the `/ISAPI/...` protocol.
///
/// Device channel ids are 1-based; streaming channels are numbered
/// `channel * 100 + stream` (`101` is channel 1 main stream).
#[derive(Debug, Clone)]
pub struct IsapiAdapter {
    client: DigestClient,
}

impl IsapiAdapter {
    /// Creates the adapter.
    #[must_use]
    pub fn new(client: DigestClient) -> Self {
        Self { client }
    }

    /// Fetches `path` as JSON (`?format=json`), or `None` if the device
    /// answered with anything else.
    async fn json(&self, endpoint: &Endpoint, path: &str) -> Option<(u16, Value)> {
        let response = get_ok(&self.client, endpoint, path).await?;
        if !response.is_json() {
            return None;
        }
        match response.json::<Value>() {
            Ok(doc) => Some((response.status(), doc)),
            Err(e) => {
                tracing::debug!(path, error = %e, "Discarding malformed JSON");
                None
            }
        }
    }

    /// Fetches `path` and parses the body as XML.
    async fn xml(&self, endpoint: &Endpoint, path: &str) -> Option<(u16, Value)> {
        let response = get_ok(&self.client, endpoint, path).await?;
        match isapi_doc::xml_to_json(&response.text()) {
            Ok(doc) => Some((response.status(), doc)),
            Err(e) => {
                tracing::debug!(path, error = %e, "Discarding malformed XML");
                None
            }
        }
    }

    /// Enabled analog inputs, JSON first with an XML fallback.
    async fn video_inputs(&self, endpoint: &Endpoint) -> Option<Vec<VideoInput>> {
        let json_path = format!("{VIDEO_INPUTS}?format=json");
        if let Some((_, doc)) = self.json(endpoint, &json_path).await
            && let Some(inputs) = isapi_doc::video_inputs(&doc)
        {
            return Some(inputs);
        }
        let (_, doc) = self.xml(endpoint, VIDEO_INPUTS).await?;
        Some(isapi_doc::video_inputs(&doc).unwrap_or_default())
    }

    async fn proxy_channels(&self, endpoint: &Endpoint) -> Option<BTreeSet<i64>> {
        let (_, doc) = self.xml(endpoint, PROXY_CHANNELS).await?;
        Some(isapi_doc::proxy_channel_ids(&doc))
    }

    async fn channel_states(&self, endpoint: &Endpoint) -> BTreeMap<i64, bool> {
        self.json(endpoint, CHANNEL_STATUS)
            .await
            .map(|(_, doc)| isapi_doc::channel_states(&doc))
            .unwrap_or_default()
    }

    async fn accepted(&self, endpoint: &Endpoint, request: DeviceRequest) -> bool {
        send(&self.client, endpoint, request)
            .await
            .is_some_and(|r| r.is_success())
    }
}

impl VendorAdapter for IsapiAdapter {
    async fn overview(&self, endpoint: &Endpoint) -> Overview {
        let mut hits = 0;

        let analog = match self.video_inputs(endpoint).await {
            Some(inputs) => {
                hits += 1;
                isapi_doc::zero_based(inputs.iter().map(|i| i.id))
            }
            None => BTreeSet::new(),
        };
        let ip = match self.proxy_channels(endpoint).await {
            Some(ids) => {
                hits += 1;
                isapi_doc::zero_based(ids)
            }
            None => BTreeSet::new(),
        };

        Overview::from_indices(DeviceStatus::from_hits(hits), analog, ip)
    }

    async fn list_channels(&self, endpoint: &Endpoint) -> ChannelList {
        let inputs = self.video_inputs(endpoint).await;
        let proxies = self.proxy_channels(endpoint).await;
        let ok = inputs.is_some() || proxies.is_some();

        let labels: BTreeMap<i64, String> = inputs
            .iter()
            .flatten()
            .filter_map(|i| i.label.clone().map(|l| (i.id, l)))
            .collect();
        let ids: BTreeSet<i64> = inputs
            .iter()
            .flatten()
            .map(|i| i.id)
            .chain(proxies.into_iter().flatten())
            .collect();
        let states = if ids.is_empty() {
            BTreeMap::new()
        } else {
            self.channel_states(endpoint).await
        };

        let channels = ids
            .into_iter()
            .filter_map(|id| {
                let index = u32::try_from(id.checked_sub(1)?).ok()?;
                Some(
                    Channel::unnamed(index)
                        .with_name(labels.get(&id).map(String::as_str))
                        .with_online(states.get(&id).copied()),
                )
            })
            .collect();

        ChannelList { ok, channels }
    }

    async fn snapshot(&self, endpoint: &Endpoint, index: u32) -> Snapshot {
        let channel = u64::from(index) + 1;
        let main = channel * 100 + 1;
        let candidates = [
            format!("/ISAPI/ContentMgmt/StreamingProxy/channels/{main}/picture"),
            format!("/ISAPI/ContentMgmt/StreamingProxy/channels/{main}/picture?snapShotImageType=JPEG"),
            format!("/ISAPI/Streaming/channels/{main}/picture"),
            format!("/ISAPI/ContentMgmt/InputProxy/channels/{channel}/picture"),
            format!("/ISAPI/Streaming/channels/{}/picture", main + 1),
            format!("/ISAPI/Streaming/channels/{channel}/picture?snapShotImageType=JPEG"),
        ];

        for path in &candidates {
            let request =
                DeviceRequest::get(endpoint.url(path)).with_header("Accept", "image/jpeg,*/*");
            let Some(response) = send(&self.client, endpoint, request).await else {
                continue;
            };
            if !response.is_success() || is_document(&response) {
                continue;
            }
            let content_type = match response.content_type() {
                "" => "image/jpeg".to_string(),
                ct => ct.to_string(),
            };
            return Snapshot {
                ok: true,
                http_status: response.status(),
                content_type,
                bytes: response.into_body(),
            };
        }

        tracing::debug!(url = %endpoint.base_url(), index, "No snapshot path produced an image");
        Snapshot::failed()
    }

    async fn current_time(&self, endpoint: &Endpoint) -> CurrentTime {
        let json_path = format!("{TIME}?format=json");
        if let Some((status, doc)) = self.json(endpoint, &json_path).await {
            return time_reading(status, isapi_doc::local_time(&doc));
        }

        let Some(response) = send(&self.client, endpoint, DeviceRequest::get(endpoint.url(TIME))).await
        else {
            return CurrentTime::unavailable(0);
        };
        if !response.is_success() {
            return CurrentTime::unavailable(response.status());
        }
        let local = isapi_doc::xml_to_json(&response.text())
            .ok()
            .and_then(|doc| isapi_doc::local_time(&doc));
        time_reading(response.status(), local)
    }

    async fn sync_clock(&self, endpoint: &Endpoint, options: &ClockSyncOptions) -> ClockSync {
        let id = options.server_id();
        let server_xml = format!(
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8"?>"#,
                r#"<NTPServer version="2.0" xmlns="http://www.isapi.org/ver20/XMLSchema">"#,
                "<id>{id}</id>",
                "<addressingFormatType>host</addressingFormatType>",
                "<hostName>{host}</hostName>",
                "<portNo>{port}</portNo>",
                "<synchronizeInterval>{interval}</synchronizeInterval>",
                "<enabled>true</enabled>",
                "</NTPServer>"
            ),
            id = id,
            host = xml_escape(options.host()),
            port = options.port(),
            interval = options.interval_minutes(),
        );
        let server = self
            .accepted(
                endpoint,
                DeviceRequest::put(endpoint.url(&format!("{TIME}/ntpServers/{id}")))
                    .with_xml(server_xml),
            )
            .await;

        let mut mode = self
            .accepted(
                endpoint,
                DeviceRequest::put(endpoint.url(&format!("{TIME}?format=json")))
                    .with_json(&json!({ "Time": { "timeMode": "NTP" } })),
            )
            .await;
        if !mode {
            let mode_xml = concat!(
                r#"<?xml version="1.0" encoding="UTF-8"?>"#,
                r#"<Time version="2.0" xmlns="http://www.isapi.org/ver20/XMLSchema">"#,
                "<timeMode>NTP</timeMode></Time>"
            );
            mode = self
                .accepted(
                    endpoint,
                    DeviceRequest::put(endpoint.url(TIME)).with_xml(mode_xml),
                )
                .await;
        }

        let test = self
            .accepted(
                endpoint,
                DeviceRequest::post(endpoint.url(&format!("{TIME}/ntpServers/{id}/test"))),
            )
            .await;

        let sync = ClockSync::from_steps(vec![
            SyncStep { name: "ntp-server", ok: server },
            SyncStep { name: "time-mode", ok: mode },
            SyncStep { name: "sync-test", ok: test },
        ]);
        if !sync.ok {
            tracing::warn!(url = %endpoint.base_url(), "Every clock sync step was rejected");
        }
        sync
    }

    async fn ping(&self, endpoint: &Endpoint) -> Ping {
        let response = send(&self.client, endpoint, DeviceRequest::get(endpoint.url(DEVICE_INFO))).await;
        Ping::from_status(status_of(response.as_ref()))
    }

    async fn storage(&self, endpoint: &Endpoint) -> StorageReport {
        if let Some((status, doc)) = self.json(endpoint, HD_STATUS).await {
            return StorageReport {
                ok: true,
                http_status: status,
                disks: isapi_doc::disks_from_status(&doc),
            };
        }

        let response = send(&self.client, endpoint, DeviceRequest::get(endpoint.url(HDD_LIST))).await;
        let http_status = status_of(response.as_ref());
        let Some(response) = response.filter(DeviceResponse::is_success) else {
            return StorageReport {
                http_status,
                ..StorageReport::default()
            };
        };
        match isapi_doc::xml_to_json(&response.text()) {
            Ok(doc) => StorageReport {
                ok: true,
                http_status,
                disks: isapi_doc::disks_from_hdd_list(&doc),
            },
            Err(e) => {
                tracing::debug!(error = %e, "Discarding malformed HDD listing");
                StorageReport {
                    http_status,
                    ..StorageReport::default()
                }
            }
        }
    }
}

/// Devices answer failed captures with an XML or JSON status document.
fn is_document(response: &DeviceResponse) -> bool {
    let ct = response.content_type().to_ascii_lowercase();
    ct.contains("xml") || ct.contains("json")
}

fn time_reading(status: u16, local: Option<String>) -> CurrentTime {
    let raw = local.unwrap_or_default();
    let display = DeviceTime::find(&raw).map(|t| t.display());
    CurrentTime::read(status, &raw, display)
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
