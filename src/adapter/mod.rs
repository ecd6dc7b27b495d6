// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Vendor adapters.
//!
//! Each protocol family implements [`VendorAdapter`] over a shared
//! [`DigestClient`]:
//!
//! - [`IsapiAdapter`] for the XML/JSON `/ISAPI/...` namespace, used by both
//!   the `hikvision` and `jfl` vendor tags.
//! - [`CgiAdapter`] for `/cgi-bin/...` endpoints answering with `key=value`
//!   dumps, used by the `intelbras` tag.
//!
//! [`Adapter`] is the closed set of families and is what the scheduler and
//! the query façade hold.
//!
//! All channel indices leaving an adapter are zero-based logical indices.
//!
//! # Examples
//!
//! ```no_run
//! use dvr_monitor::adapter::{Adapter, VendorAdapter};
//! use dvr_monitor::protocol::{Credentials, DigestClient, Endpoint, HttpConfig};
//! use dvr_monitor::types::Vendor;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = DigestClient::new(&HttpConfig::default())?;
//! let adapter = Adapter::for_vendor(Vendor::Hikvision, client).expect("supported");
//! let endpoint = Endpoint::new("http://10.0.0.5:80", Credentials::new("admin", "secret"));
//!
//! let overview = adapter.overview(&endpoint).await;
//! println!("{} analog, {} ip", overview.counts.analog, overview.counts.ip);
//! # Ok(())
//! # }
//! ```

mod cgi;
mod cluster;
pub mod config_dump;
mod isapi;
pub mod isapi_doc;
mod outcome;

pub use cgi::CgiAdapter;
pub use cluster::{CLUSTER_SPAN, dense_cluster, dense_cluster_with_span};
pub use isapi::IsapiAdapter;
pub use outcome::{
    ChannelList, ClockSync, ClockSyncOptions, CurrentTime, Ping, Snapshot, StorageReport,
    SyncStep,
};

use crate::protocol::{DeviceRequest, DeviceResponse, DigestClient, Endpoint};
use crate::types::{AdapterFamily, Overview, Vendor};

/// Operations every vendor adapter provides.
///
/// None of these fail: transport and parse errors are absorbed and reported
/// as a negative result.
#[allow(async_fn_in_trait)]
pub trait VendorAdapter {
    /// Channel counts and indices. `status` is online iff at least one
    /// listing request succeeded.
    async fn overview(&self, endpoint: &Endpoint) -> Overview;

    /// Per-channel identity with a best-effort online flag.
    async fn list_channels(&self, endpoint: &Endpoint) -> ChannelList;

    /// Captures a still image of a zero-based channel.
    async fn snapshot(&self, endpoint: &Endpoint, index: u32) -> Snapshot;

    /// Reads the device clock.
    async fn current_time(&self, endpoint: &Endpoint) -> CurrentTime;

    /// Points the device at an NTP server and requests a sync.
    async fn sync_clock(&self, endpoint: &Endpoint, options: &ClockSyncOptions) -> ClockSync;

    /// Single lightweight liveness probe.
    async fn ping(&self, endpoint: &Endpoint) -> Ping;

    /// Installed disks and their usage.
    async fn storage(&self, endpoint: &Endpoint) -> StorageReport;
}

/// The adapter for one protocol family.
#[derive(Debug, Clone)]
pub enum Adapter {
    /// ISAPI family.
    Isapi(IsapiAdapter),
    /// CGI family.
    Cgi(CgiAdapter),
}

impl Adapter {
    /// Returns the adapter for a vendor, or `None` if none is implemented.
    #[must_use]
    pub fn for_vendor(vendor: Vendor, client: DigestClient) -> Option<Self> {
        vendor.family().map(|family| Self::for_family(family, client))
    }

    /// Returns the adapter for a protocol family.
    #[must_use]
    pub fn for_family(family: AdapterFamily, client: DigestClient) -> Self {
        match family {
            AdapterFamily::Isapi => Self::Isapi(IsapiAdapter::new(client)),
            AdapterFamily::Cgi => Self::Cgi(CgiAdapter::new(client)),
        }
    }

    /// The protocol family.
    #[must_use]
    pub fn family(&self) -> AdapterFamily {
        match self {
            Self::Isapi(_) => AdapterFamily::Isapi,
            Self::Cgi(_) => AdapterFamily::Cgi,
        }
    }
}

impl VendorAdapter for Adapter {
    async fn overview(&self, endpoint: &Endpoint) -> Overview {
        match self {
            Self::Isapi(a) => a.overview(endpoint).await,
            Self::Cgi(a) => a.overview(endpoint).await,
        }
    }

    async fn list_channels(&self, endpoint: &Endpoint) -> ChannelList {
        match self {
            Self::Isapi(a) => a.list_channels(endpoint).await,
            Self::Cgi(a) => a.list_channels(endpoint).await,
        }
    }

    async fn snapshot(&self, endpoint: &Endpoint, index: u32) -> Snapshot {
        match self {
            Self::Isapi(a) => a.snapshot(endpoint, index).await,
            Self::Cgi(a) => a.snapshot(endpoint, index).await,
        }
    }

    async fn current_time(&self, endpoint: &Endpoint) -> CurrentTime {
        match self {
            Self::Isapi(a) => a.current_time(endpoint).await,
            Self::Cgi(a) => a.current_time(endpoint).await,
        }
    }

    async fn sync_clock(&self, endpoint: &Endpoint, options: &ClockSyncOptions) -> ClockSync {
        match self {
            Self::Isapi(a) => a.sync_clock(endpoint, options).await,
            Self::Cgi(a) => a.sync_clock(endpoint, options).await,
        }
    }

    async fn ping(&self, endpoint: &Endpoint) -> Ping {
        match self {
            Self::Isapi(a) => a.ping(endpoint).await,
            Self::Cgi(a) => a.ping(endpoint).await,
        }
    }

    async fn storage(&self, endpoint: &Endpoint) -> StorageReport {
        match self {
            Self::Isapi(a) => a.storage(endpoint).await,
            Self::Cgi(a) => a.storage(endpoint).await,
        }
    }
}

/// Sends a request, folding transport errors into `None`.
async fn send(
    client: &DigestClient,
    endpoint: &Endpoint,
    request: DeviceRequest,
) -> Option<DeviceResponse> {
    let url = request.url().to_string();
    match client.fetch(endpoint.credentials(), request).await {
        Ok(response) => Some(response),
        Err(e) => {
            tracing::debug!(url = %url, error = %e, timeout = e.is_timeout(), "Device request failed");
            None
        }
    }
}

/// Sends a `GET` for `path` and keeps only a 2xx response.
async fn get_ok(client: &DigestClient, endpoint: &Endpoint, path: &str) -> Option<DeviceResponse> {
    send(client, endpoint, DeviceRequest::get(endpoint.url(path)))
        .await
        .filter(DeviceResponse::is_success)
}

/// Status code of an optional response, `0` when there was none.
fn status_of(response: Option<&DeviceResponse>) -> u16 {
    response.map_or(0, DeviceResponse::status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::HttpConfig;

    fn client() -> DigestClient {
        DigestClient::new(&HttpConfig::default()).unwrap()
    }

    #[test]
    fn vendor_dispatch() {
        assert_eq!(
            Adapter::for_vendor(Vendor::Hikvision, client()).map(|a| a.family()),
            Some(AdapterFamily::Isapi)
        );
        assert_eq!(
            Adapter::for_vendor(Vendor::Jfl, client()).map(|a| a.family()),
            Some(AdapterFamily::Isapi)
        );
        assert_eq!(
            Adapter::for_vendor(Vendor::Intelbras, client()).map(|a| a.family()),
            Some(AdapterFamily::Cgi)
        );
        assert!(Adapter::for_vendor(Vendor::Other, client()).is_none());
    }

    #[tokio::test]
    async fn unreachable_device_folds_to_offline() {
        // Port 9 on localhost is reliably closed in test environments.
        let endpoint = Endpoint::new("http://127.0.0.1:9", Default::default());
        for family in [AdapterFamily::Isapi, AdapterFamily::Cgi] {
            let adapter = Adapter::for_family(family, client());
            let overview = adapter.overview(&endpoint).await;
            assert!(!overview.is_ok());
            assert_eq!(overview.counts.total(), 0);
            let ping = adapter.ping(&endpoint).await;
            assert_eq!(ping, Ping { ok: false, http_status: 0 });
        }
    }
}
