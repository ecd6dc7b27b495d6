// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Results returned by vendor adapters.
//!
//! Adapters never fail: every operation returns one of these values with
//! `ok == false` and conservative defaults when the device could not be
//! reached or understood. `http_status` is `0` when no HTTP response was
//! received at all.

use serde::Serialize;

use crate::types::{Channel, DeviceTime, StorageDisk};

/// Result of a channel listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChannelList {
    /// Whether the device answered the listing request.
    #[serde(skip)]
    pub ok: bool,
    /// Channels sorted by index.
    pub channels: Vec<Channel>,
}

/// A captured still image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Whether an image was captured.
    pub ok: bool,
    /// Status of the last device response.
    pub http_status: u16,
    /// Content type to serve the bytes with.
    pub content_type: String,
    /// Image bytes; empty on failure.
    pub bytes: Vec<u8>,
}

impl Snapshot {
    /// The result served when no capture path produced an image.
    #[must_use]
    pub fn failed() -> Self {
        Self {
            ok: false,
            http_status: 502,
            content_type: "text/plain".to_string(),
            bytes: Vec::new(),
        }
    }
}

/// A device clock reading.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurrentTime {
    /// Whether the device answered.
    pub ok: bool,
    /// Status of the device response.
    pub http_status: u16,
    /// Human readable time, as rendered for the vendor.
    pub display: Option<String>,
    /// ISO 8601 local time without offset.
    pub iso: Option<String>,
}

impl CurrentTime {
    /// Builds a successful reading from a raw device string.
    ///
    /// `display` is the text shown to users; the ISO value is extracted from
    /// `raw`.
    #[must_use]
    pub fn read(http_status: u16, raw: &str, display: Option<String>) -> Self {
        Self {
            ok: true,
            http_status,
            display,
            iso: DeviceTime::find(raw).map(|t| t.iso()),
        }
    }

    /// A reading that produced no time.
    #[must_use]
    pub fn unavailable(http_status: u16) -> Self {
        Self {
            ok: false,
            http_status,
            display: None,
            iso: None,
        }
    }

    /// Display text, falling back to the ISO value and then to `-`.
    #[must_use]
    pub fn time_text(&self) -> String {
        self.display
            .clone()
            .or_else(|| self.iso.clone())
            .unwrap_or_else(|| "-".to_string())
    }
}

/// One step of a clock sync sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncStep {
    /// What the step did.
    pub name: &'static str,
    /// Whether the device accepted it.
    pub ok: bool,
}

/// Result of a clock sync.
///
/// `ok` is true if **any** step succeeded. Devices vary in which of the
/// calls they support, so partial acceptance is reported as success. This
/// also means a sync whose only successful step was the final test trigger
/// is reported as successful; inspect [`ClockSync::steps`] to tell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClockSync {
    /// Whether at least one step succeeded.
    pub ok: bool,
    /// Individual step outcomes, in order.
    pub steps: Vec<SyncStep>,
}

impl ClockSync {
    /// Builds the result from step outcomes.
    #[must_use]
    pub fn from_steps(steps: Vec<SyncStep>) -> Self {
        Self {
            ok: steps.iter().any(|s| s.ok),
            steps,
        }
    }
}

/// Result of a liveness probe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ping {
    /// True iff the device answered `200`.
    pub ok: bool,
    /// Status received, `0` if none.
    pub http_status: u16,
}

impl Ping {
    /// Builds a ping result from a status code.
    #[must_use]
    pub fn from_status(http_status: u16) -> Self {
        Self {
            ok: http_status == 200,
            http_status,
        }
    }
}

/// Result of a storage query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StorageReport {
    /// Whether the device answered with a usable listing.
    pub ok: bool,
    /// Status of the device response.
    pub http_status: u16,
    /// Installed disks.
    pub disks: Vec<StorageDisk>,
}

impl StorageReport {
    /// One summary line per disk.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.disks.iter().map(StorageDisk::summary_line).collect()
    }
}

/// NTP settings pushed by a clock sync.
///
/// # Examples
///
/// ```
/// use dvr_monitor::adapter::ClockSyncOptions;
///
/// let options = ClockSyncOptions::default().with_host("pool.ntp.org");
/// assert_eq!(options.host(), "pool.ntp.org");
/// assert_eq!(options.port(), 123);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockSyncOptions {
    host: String,
    port: u16,
    interval_minutes: u32,
    server_id: u32,
}

impl ClockSyncOptions {
    /// Default NTP server.
    pub const DEFAULT_HOST: &'static str = "a.ntp.br";
    /// Default NTP port.
    pub const DEFAULT_PORT: u16 = 123;
    /// Default resync interval in minutes.
    pub const DEFAULT_INTERVAL_MINUTES: u32 = 10;
    /// Default server entry id on ISAPI devices.
    pub const DEFAULT_SERVER_ID: u32 = 1;

    /// Sets the NTP server host.
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Sets the NTP server port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the resync interval.
    #[must_use]
    pub fn with_interval_minutes(mut self, minutes: u32) -> Self {
        self.interval_minutes = minutes;
        self
    }

    /// Sets the server entry id.
    #[must_use]
    pub fn with_server_id(mut self, id: u32) -> Self {
        self.server_id = id;
        self
    }

    /// NTP server host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// NTP server port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Resync interval in minutes.
    #[must_use]
    pub fn interval_minutes(&self) -> u32 {
        self.interval_minutes
    }

    /// Server entry id.
    #[must_use]
    pub fn server_id(&self) -> u32 {
        self.server_id
    }
}

impl Default for ClockSyncOptions {
    fn default() -> Self {
        Self {
            host: Self::DEFAULT_HOST.to_string(),
            port: Self::DEFAULT_PORT,
            interval_minutes: Self::DEFAULT_INTERVAL_MINUTES,
            server_id: Self::DEFAULT_SERVER_ID,
        }
    }
}
