// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! On-demand device queries.

use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;

use crate::adapter::{
    Adapter, ChannelList, ClockSync, ClockSyncOptions, CurrentTime, Ping, Snapshot,
    StorageReport, VendorAdapter,
};
use crate::error::Error;
use crate::protocol::{DigestClient, Endpoint};
use crate::registry::{Device, Registry};
use crate::state::StateStore;
use crate::types::Overview;

use super::FleetSummary;

/// Why a query could not be dispatched to a device.
///
/// Checked before any network call, in variant order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// No device has this id.
    #[error("device not found: {0}")]
    NotFound(String),
    /// The device lacks a host or a port.
    #[error("device {0} has no usable address")]
    Unaddressable(String),
    /// No adapter covers the device's vendor.
    #[error("not implemented for vendor {vendor} (device {id})")]
    Unsupported {
        /// Device id.
        id: String,
        /// Vendor tag.
        vendor: String,
    },
}

impl QueryError {
    /// HTTP status code the façade answers with.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Unaddressable(_) => 400,
            Self::Unsupported { .. } => 501,
        }
    }
}

impl From<QueryError> for Error {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::NotFound(id) => Self::DeviceNotFound(id),
            QueryError::Unaddressable(id) => Self::Unaddressable(id),
            QueryError::Unsupported { vendor, .. } => Self::UnsupportedVendor(vendor),
        }
    }
}

/// A device ready to be queried.
struct Target<'a> {
    device: &'a Device,
    endpoint: Endpoint,
    adapter: Adapter,
}

/// Stateless pass-through to vendor adapters.
///
/// Every operation resolves the device, builds its endpoint and picks its
/// adapter before touching the network. Results never go through the state
/// store.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use dvr_monitor::adapter::ClockSyncOptions;
/// use dvr_monitor::event::Broadcaster;
/// use dvr_monitor::protocol::{DigestClient, HttpConfig};
/// use dvr_monitor::query::QueryService;
/// use dvr_monitor::registry::Registry;
/// use dvr_monitor::state::StateStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let service = QueryService::new(
///     Arc::new(Registry::load("public/clients.json")?),
///     StateStore::new(Broadcaster::new()),
///     DigestClient::new(&HttpConfig::default())?,
///     ClockSyncOptions::default(),
/// );
///
/// let ping = service.ping("dvr-1").await?;
/// println!("reachable: {}", ping.ok);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct QueryService {
    registry: Arc<Registry>,
    store: StateStore,
    client: DigestClient,
    clock_sync: ClockSyncOptions,
}

impl QueryService {
    /// Creates the service.
    #[must_use]
    pub fn new(
        registry: Arc<Registry>,
        store: StateStore,
        client: DigestClient,
        clock_sync: ClockSyncOptions,
    ) -> Self {
        Self {
            registry,
            store,
            client,
            clock_sync,
        }
    }

    /// The registry queries are resolved against.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The store the summary reads from.
    #[must_use]
    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Registry joined with the latest known state.
    #[must_use]
    pub fn summary(&self) -> FleetSummary {
        FleetSummary::build(&self.registry, &self.store)
    }

    fn resolve(&self, id: &str) -> Result<Target<'_>, QueryError> {
        let device = self
            .registry
            .find(id)
            .ok_or_else(|| QueryError::NotFound(id.to_string()))?;
        let endpoint = device
            .endpoint()
            .map_err(|_| QueryError::Unaddressable(id.to_string()))?;
        let adapter = Adapter::for_vendor(device.vendor, self.client.clone()).ok_or_else(|| {
            QueryError::Unsupported {
                id: id.to_string(),
                vendor: device.vendor.to_string(),
            }
        })?;
        Ok(Target {
            device,
            endpoint,
            adapter,
        })
    }

    /// Liveness probe.
    ///
    /// # Errors
    ///
    /// Returns a [`QueryError`] if the device cannot be dispatched to.
    pub async fn ping(&self, id: &str) -> Result<Ping, QueryError> {
        let target = self.resolve(id)?;
        let started = Instant::now();
        let ping = target.adapter.ping(&target.endpoint).await;
        log_query("ping", &target, ping.ok, started);
        Ok(ping)
    }

    /// Fresh overview, bypassing the poll schedule.
    ///
    /// # Errors
    ///
    /// Returns a [`QueryError`] if the device cannot be dispatched to.
    pub async fn overview(&self, id: &str) -> Result<Overview, QueryError> {
        let target = self.resolve(id)?;
        let started = Instant::now();
        let overview = target.adapter.overview(&target.endpoint).await;
        log_query("overview", &target, overview.is_ok(), started);
        Ok(overview)
    }

    /// Channel listing.
    ///
    /// # Errors
    ///
    /// Returns a [`QueryError`] if the device cannot be dispatched to.
    pub async fn channels(&self, id: &str) -> Result<ChannelList, QueryError> {
        let target = self.resolve(id)?;
        let started = Instant::now();
        let list = target.adapter.list_channels(&target.endpoint).await;
        log_query("channels", &target, list.ok, started);
        Ok(list)
    }

    /// Still image of a zero-based channel.
    ///
    /// # Errors
    ///
    /// Returns a [`QueryError`] if the device cannot be dispatched to.
    pub async fn snapshot(&self, id: &str, index: u32) -> Result<Snapshot, QueryError> {
        let target = self.resolve(id)?;
        let started = Instant::now();
        let snapshot = target.adapter.snapshot(&target.endpoint, index).await;
        log_query("snapshot", &target, snapshot.ok, started);
        Ok(snapshot)
    }

    /// Device clock.
    ///
    /// # Errors
    ///
    /// Returns a [`QueryError`] if the device cannot be dispatched to.
    pub async fn current_time(&self, id: &str) -> Result<CurrentTime, QueryError> {
        let target = self.resolve(id)?;
        let started = Instant::now();
        let time = target.adapter.current_time(&target.endpoint).await;
        log_query("current-time", &target, time.ok, started);
        Ok(time)
    }

    /// Points the device at the configured NTP server.
    ///
    /// # Errors
    ///
    /// Returns a [`QueryError`] if the device cannot be dispatched to.
    pub async fn sync_clock(&self, id: &str) -> Result<ClockSync, QueryError> {
        let target = self.resolve(id)?;
        let started = Instant::now();
        let sync = target
            .adapter
            .sync_clock(&target.endpoint, &self.clock_sync)
            .await;
        log_query("ntp-sync", &target, sync.ok, started);
        Ok(sync)
    }

    /// Installed disks.
    ///
    /// # Errors
    ///
    /// Returns a [`QueryError`] if the device cannot be dispatched to.
    pub async fn storage(&self, id: &str) -> Result<StorageReport, QueryError> {
        let target = self.resolve(id)?;
        let started = Instant::now();
        let report = target.adapter.storage(&target.endpoint).await;
        log_query("storage", &target, report.ok, started);
        Ok(report)
    }
}

fn log_query(operation: &str, target: &Target<'_>, ok: bool, started: Instant) {
    tracing::info!(
        dvr = %target.device.id,
        operation,
        ok,
        elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        "Query"
    );
}
