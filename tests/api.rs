// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP façade served on an ephemeral port.

#![cfg(feature = "server")]

use std::sync::Arc;
use std::time::Duration;

use dvr_monitor::adapter::ClockSyncOptions;
use dvr_monitor::api;
use dvr_monitor::event::Broadcaster;
use dvr_monitor::protocol::{DigestClient, HttpConfig};
use dvr_monitor::query::QueryService;
use dvr_monitor::registry::Registry;
use dvr_monitor::state::{StateStore, StatusUpdate};
use dvr_monitor::types::{DeviceStatus, Overview};
use serde_json::{Value, json};
use wiremock::matchers::{any, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Harness {
    base: String,
    store: StateStore,
    http: reqwest::Client,
}

impl Harness {
    async fn get(&self, route: &str) -> reqwest::Response {
        self.http
            .get(format!("{}{route}", self.base))
            .send()
            .await
            .unwrap()
    }

    async fn get_json(&self, route: &str) -> (u16, Value) {
        let response = self.get(route).await;
        let status = response.status().as_u16();
        (status, response.json().await.unwrap())
    }
}

/// Registry with one device per case, every addressable one pointing at
/// `device_port`.
fn registry(device_port: u16) -> Registry {
    let auth = json!({ "ip": "127.0.0.1", "httpPort": device_port, "username": "admin", "password": "pw" });
    let doc = json!({ "clients": [
        { "id": "c1", "name": "Loja", "dvrs": [
            { "id": "hik", "name": "Frente", "vendor": "hikvision", "declaredChannels": 4, "auth": auth },
            { "id": "intel", "name": "Fundo", "vendor": "intelbras", "auth": auth },
            { "id": "acme", "name": "Legado", "vendor": "acme", "auth": auth },
            { "id": "noport", "name": "Sem porta", "vendor": "hikvision",
              "auth": { "ip": "127.0.0.1", "username": "admin" } },
            { "id": "acme-noport", "name": "Legado sem porta", "vendor": "acme",
              "auth": { "ip": "127.0.0.1" } }
        ]}
    ]});
    Registry::from_json_str(&doc.to_string()).unwrap()
}

async fn serve(device: &MockServer) -> Harness {
    let store = StateStore::new(Broadcaster::new());
    let service = QueryService::new(
        Arc::new(registry(device.address().port())),
        store.clone(),
        DigestClient::new(&HttpConfig::default().with_timeout(Duration::from_secs(5))).unwrap(),
        ClockSyncOptions::default(),
    );
    let app = axum::Router::new().nest("/api", api::router(service));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Harness {
        base: format!("http://{addr}/api"),
        store,
        http: reqwest::Client::new(),
    }
}

// ============================================================================
// Dispatch errors
// ============================================================================

#[tokio::test]
async fn unsupported_vendor_is_501_without_device_traffic() {
    let device = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&device)
        .await;
    let h = serve(&device).await;

    let (status, body) = h.get_json("/dvrs/acme/overview").await;
    assert_eq!(status, 501);
    assert_eq!(body, json!({ "status": "unknown" }));

    let (status, body) = h.get_json("/dvrs/acme/channels").await;
    assert_eq!(status, 501);
    assert_eq!(body, json!({ "channels": [] }));

    let (status, body) = h.get_json("/dvrs/acme/current-time").await;
    assert_eq!(status, 501);
    assert_eq!(body, json!({ "timeText": null, "iso": null }));

    let (status, body) = h.get_json("/dvrs/acme/ntp-sync").await;
    assert_eq!(status, 501);
    assert_eq!(body, json!({ "ok": false }));

    assert_eq!(h.get("/dvrs/acme/ping").await.status(), 501);
    assert_eq!(h.get("/dvrs/acme/snapshot/0").await.status(), 501);
}

#[tokio::test]
async fn unknown_device_is_404() {
    let device = MockServer::start().await;
    let h = serve(&device).await;

    for route in ["ping", "overview", "channels", "current-time", "ntp-sync", "storage"] {
        let response = h.get(&format!("/dvrs/nope/{route}")).await;
        assert_eq!(response.status(), 404, "{route}");
    }
    assert_eq!(h.get("/dvrs/nope/snapshot/1").await.status(), 404);
}

#[tokio::test]
async fn missing_address_is_400_even_for_unsupported_vendor() {
    let device = MockServer::start().await;
    let h = serve(&device).await;

    assert_eq!(h.get("/dvrs/noport/overview").await.status(), 400);
    assert_eq!(h.get("/dvrs/acme-noport/overview").await.status(), 400);
}

// ============================================================================
// Device queries
// ============================================================================

#[tokio::test]
async fn overview_is_proxied_and_not_stored() {
    let device = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ISAPI/System/Video/inputs/channels"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "VideoInputChannelList": { "VideoInputChannel": [
                { "id": 1, "videoInputEnabled": true },
                { "id": 2, "videoInputEnabled": true }
            ]}
        })))
        .mount(&device)
        .await;
    let h = serve(&device).await;

    let (status, body) = h.get_json("/dvrs/hik/overview").await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "online");
    assert_eq!(body["counts"], json!({ "analog": 2, "ip": 0 }));
    assert_eq!(body["indices"]["analog"], json!([0, 1]));
    assert!(h.store.get("hik").is_none());
}

#[tokio::test]
async fn ping_maps_device_status() {
    let device = MockServer::start().await;
    Mock::given(path("/ISAPI/System/deviceInfo"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&device)
        .await;
    Mock::given(path("/cgi-bin/magicBox.cgi"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&device)
        .await;
    let h = serve(&device).await;

    assert_eq!(h.get("/dvrs/hik/ping").await.status(), 200);
    assert_eq!(h.get("/dvrs/intel/ping").await.status(), 503);
}

#[tokio::test]
async fn snapshot_serves_image_bytes() {
    let device = MockServer::start().await;
    Mock::given(path("/cgi-bin/snapshot.cgi"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/jpeg")
                .set_body_bytes(vec![0xFF, 0xD8, 0xFF]),
        )
        .mount(&device)
        .await;
    let h = serve(&device).await;

    let response = h.get("/dvrs/intel/snapshot/0").await;
    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "image/jpeg"
    );
    assert_eq!(response.bytes().await.unwrap().as_ref(), &[0xFF, 0xD8, 0xFF]);
}

#[tokio::test]
async fn snapshot_failure_is_502() {
    let device = MockServer::start().await;
    let h = serve(&device).await;

    assert_eq!(h.get("/dvrs/hik/snapshot/0").await.status(), 502);
}

#[tokio::test]
async fn current_time_without_reading_is_dash() {
    let device = MockServer::start().await;
    let h = serve(&device).await;

    let (status, body) = h.get_json("/dvrs/intel/current-time").await;
    assert_eq!(status, 200);
    assert_eq!(body, json!({ "timeText": "-", "iso": null }));
}

#[tokio::test]
async fn ntp_sync_all_rejected_is_502() {
    let device = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(403))
        .mount(&device)
        .await;
    let h = serve(&device).await;

    let (status, body) = h.get_json("/dvrs/hik/ntp-sync").await;
    assert_eq!(status, 502);
    assert_eq!(body, json!({ "ok": false }));
}

// ============================================================================
// Summary and stream
// ============================================================================

#[tokio::test]
async fn summary_reflects_store() {
    let device = MockServer::start().await;
    let h = serve(&device).await;

    let (status, body) = h.get_json("/summary").await;
    assert_eq!(status, 200);
    let hik = &body["clients"][0]["dvrs"][0];
    assert_eq!(hik["status"], "unknown");
    assert!(hik["lastUpdated"].is_null());
    assert!(hik.get("counts").is_none());
    assert!(hik["auth"].get("password").is_none());

    let overview = Overview::from_indices(DeviceStatus::Online, [0, 1, 2].into(), [3].into());
    h.store
        .update(&"hik".into(), &StatusUpdate::from_overview(&overview));

    let (_, body) = h.get_json("/summary").await;
    let hik = &body["clients"][0]["dvrs"][0];
    assert_eq!(hik["status"], "online");
    assert_eq!(hik["counts"], json!({ "analog": 3, "ip": 1 }));
    assert!(hik["lastUpdated"].is_i64());
}

#[tokio::test]
async fn stream_delivers_state_changes() {
    let device = MockServer::start().await;
    let h = serve(&device).await;

    let mut response = h.get("/stream").await;
    assert_eq!(response.status(), 200);
    assert!(
        response.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/event-stream")
    );

    h.store
        .update(&"intel".into(), &StatusUpdate::status(DeviceStatus::Offline));

    let mut received = String::new();
    while !received.contains("\n\n") {
        let chunk = tokio::time::timeout(Duration::from_secs(5), response.chunk())
            .await
            .expect("frame within timeout")
            .unwrap()
            .expect("stream still open");
        received.push_str(&String::from_utf8_lossy(&chunk));
    }

    let field = |name: &str| {
        received
            .lines()
            .find_map(|l| l.strip_prefix(name)?.strip_prefix(':'))
            .map(str::trim)
    };
    assert_eq!(field("event"), Some("dvr"));
    let data = field("data").unwrap();
    let frame: Value = serde_json::from_str(data).unwrap();
    assert_eq!(frame["dvrId"], "intel");
    assert_eq!(frame["data"]["status"], "offline");
    assert_eq!(h.store.broadcaster().subscriber_count(), 1);
}
