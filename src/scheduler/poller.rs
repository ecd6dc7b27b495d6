// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! One poll of one device.

use std::future::Future;

use crate::adapter::{Adapter, VendorAdapter};
use crate::protocol::DigestClient;
use crate::registry::Device;
use crate::state::StatusUpdate;
use crate::types::{DeviceStatus, Overview};

/// Result of polling a device once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// At least one listing succeeded.
    Healthy(Overview),
    /// The device did not answer usefully.
    Offline,
    /// The device cannot be polled: no address or no adapter.
    Unpollable,
}

impl PollOutcome {
    /// Whether this outcome resets the backoff.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy(_))
    }

    /// The store write for this outcome. Failures only touch the status.
    #[must_use]
    pub fn to_update(&self) -> StatusUpdate {
        match self {
            Self::Healthy(overview) => StatusUpdate::from_overview(overview),
            Self::Offline => StatusUpdate::status(DeviceStatus::Offline),
            Self::Unpollable => StatusUpdate::status(DeviceStatus::Unknown),
        }
    }
}

/// Something that can poll a device.
///
/// The scheduler is generic over this so tests can drive it without a
/// network.
pub trait Poll: Send + Sync + 'static {
    /// Polls `device` once. Never fails.
    fn poll(&self, device: &Device) -> impl Future<Output = PollOutcome> + Send;
}

/// Polls real devices through their vendor adapter.
#[derive(Debug, Clone)]
pub struct FleetPoller {
    client: DigestClient,
}

impl FleetPoller {
    /// Creates a poller sharing `client` across all devices.
    #[must_use]
    pub fn new(client: DigestClient) -> Self {
        Self { client }
    }
}

impl Poll for FleetPoller {
    async fn poll(&self, device: &Device) -> PollOutcome {
        let endpoint = match device.endpoint() {
            Ok(endpoint) => endpoint,
            Err(e) => {
                tracing::debug!(dvr = %device.id, error = %e, "Skipping poll");
                return PollOutcome::Unpollable;
            }
        };
        let Some(adapter) = Adapter::for_vendor(device.vendor, self.client.clone()) else {
            tracing::debug!(dvr = %device.id, vendor = %device.vendor, "No adapter for vendor");
            return PollOutcome::Unpollable;
        };

        let overview = adapter.overview(&endpoint).await;
        if overview.is_ok() {
            PollOutcome::Healthy(overview)
        } else {
            PollOutcome::Offline
        }
    }
}
