// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Process-wide monitor settings.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::adapter::ClockSyncOptions;
use crate::protocol::HttpConfig;
use crate::scheduler::PollPolicy;

/// Everything needed to wire a monitor process.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use dvr_monitor::config::MonitorConfig;
/// use dvr_monitor::scheduler::PollPolicy;
///
/// let config = MonitorConfig::default()
///     .with_port(8080)
///     .with_poll(PollPolicy::default().with_base_interval(Duration::from_secs(30)));
///
/// assert_eq!(config.bind().port(), 8080);
/// assert_eq!(config.keepalive_interval(), Duration::from_secs(15));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    bind: SocketAddr,
    registry_path: PathBuf,
    poll: PollPolicy,
    http: HttpConfig,
    keepalive_interval: Duration,
    clock_sync: ClockSyncOptions,
}

impl MonitorConfig {
    /// Default listen port.
    pub const DEFAULT_PORT: u16 = 3001;
    /// Default registry document.
    pub const DEFAULT_REGISTRY_PATH: &'static str = "public/clients.json";
    /// Default keep-alive period of the live stream.
    pub const DEFAULT_KEEPALIVE: Duration = Duration::from_secs(15);

    /// Sets the listen address.
    #[must_use]
    pub fn with_bind(mut self, bind: SocketAddr) -> Self {
        self.bind = bind;
        self
    }

    /// Sets the listen port, keeping the address.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.bind.set_port(port);
        self
    }

    /// Sets the registry document path.
    #[must_use]
    pub fn with_registry_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.registry_path = path.into();
        self
    }

    /// Sets the poll policy.
    #[must_use]
    pub fn with_poll(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    /// Sets the device transport settings.
    #[must_use]
    pub fn with_http(mut self, http: HttpConfig) -> Self {
        self.http = http;
        self
    }

    /// Sets the keep-alive period.
    #[must_use]
    pub fn with_keepalive_interval(mut self, interval: Duration) -> Self {
        self.keepalive_interval = interval;
        self
    }

    /// Sets the NTP settings pushed by clock syncs.
    #[must_use]
    pub fn with_clock_sync(mut self, clock_sync: ClockSyncOptions) -> Self {
        self.clock_sync = clock_sync;
        self
    }

    /// Listen address.
    #[must_use]
    pub fn bind(&self) -> SocketAddr {
        self.bind
    }

    /// Registry document path.
    #[must_use]
    pub fn registry_path(&self) -> &Path {
        &self.registry_path
    }

    /// Poll policy.
    #[must_use]
    pub fn poll(&self) -> &PollPolicy {
        &self.poll
    }

    /// Device transport settings.
    #[must_use]
    pub fn http(&self) -> &HttpConfig {
        &self.http
    }

    /// Keep-alive period.
    #[must_use]
    pub fn keepalive_interval(&self) -> Duration {
        self.keepalive_interval
    }

    /// NTP settings.
    #[must_use]
    pub fn clock_sync(&self) -> &ClockSyncOptions {
        &self.clock_sync
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from((Ipv4Addr::UNSPECIFIED, Self::DEFAULT_PORT)),
            registry_path: PathBuf::from(Self::DEFAULT_REGISTRY_PATH),
            poll: PollPolicy::default(),
            http: HttpConfig::default(),
            keepalive_interval: Self::DEFAULT_KEEPALIVE,
            clock_sync: ClockSyncOptions::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = MonitorConfig::default();
        assert_eq!(config.bind().to_string(), "0.0.0.0:3001");
        assert_eq!(config.registry_path(), Path::new("public/clients.json"));
        assert_eq!(config.http().timeout(), Duration::from_secs(10));
        assert_eq!(config.clock_sync().host(), "a.ntp.br");
        assert!(config.poll().enabled);
    }

    #[test]
    fn port_keeps_address() {
        let config = MonitorConfig::default()
            .with_bind("127.0.0.1:1".parse().unwrap())
            .with_port(9000);
        assert_eq!(config.bind().to_string(), "127.0.0.1:9000");
    }
}
