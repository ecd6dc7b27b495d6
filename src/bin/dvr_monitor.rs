// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `dvr-monitor` - polls the fleet and serves the status API.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use dvr_monitor::MonitorConfig;
use dvr_monitor::adapter::ClockSyncOptions;
use dvr_monitor::api;
use dvr_monitor::event::Broadcaster;
use dvr_monitor::protocol::{DigestClient, HttpConfig};
use dvr_monitor::query::QueryService;
use dvr_monitor::registry::Registry;
use dvr_monitor::scheduler::{FleetPoller, PollPolicy, PollScheduler};
use dvr_monitor::state::StateStore;

/// Multi-vendor DVR/NVR monitor.
#[derive(Parser, Debug)]
#[command(name = "dvr-monitor", version, about)]
struct Cli {
    /// Listen port.
    #[arg(long, env = "PORT", default_value_t = MonitorConfig::DEFAULT_PORT)]
    port: u16,

    /// Registry document.
    #[arg(long, env = "CLIENTS_PATH", default_value = MonitorConfig::DEFAULT_REGISTRY_PATH)]
    clients_path: PathBuf,

    /// Base poll interval in milliseconds.
    #[arg(long, env = "POLL_INTERVAL_MS", default_value_t = 60_000)]
    poll_interval_ms: u64,

    /// Set to 0 or false to disable background polling.
    #[arg(long, env = "POLL_ENABLED", default_value = "1", action = clap::ArgAction::Set, value_parser = parse_switch)]
    poll_enabled: bool,

    /// Per-request device timeout in milliseconds.
    #[arg(long, env = "HTTP_TIMEOUT_MS", default_value_t = 10_000)]
    http_timeout_ms: u64,

    /// Accept self-signed certificates on HTTPS recorders.
    #[arg(long, env = "ACCEPT_INVALID_CERTS")]
    accept_invalid_certs: bool,

    /// NTP server pushed by clock syncs.
    #[arg(long, env = "NTP_HOST", default_value = ClockSyncOptions::DEFAULT_HOST)]
    ntp_host: String,

    /// NTP server port.
    #[arg(long, env = "NTP_PORT", default_value_t = ClockSyncOptions::DEFAULT_PORT)]
    ntp_port: u16,

    /// Device resync interval in minutes.
    #[arg(long, env = "NTP_INTERVAL_MIN", default_value_t = ClockSyncOptions::DEFAULT_INTERVAL_MINUTES)]
    ntp_interval_min: u32,
}

impl Cli {
    fn into_config(self) -> MonitorConfig {
        MonitorConfig::default()
            .with_port(self.port)
            .with_registry_path(self.clients_path)
            .with_poll(
                PollPolicy::default()
                    .with_base_interval(Duration::from_millis(self.poll_interval_ms))
                    .with_enabled(self.poll_enabled),
            )
            .with_http(
                HttpConfig::default()
                    .with_timeout(Duration::from_millis(self.http_timeout_ms))
                    .with_accept_invalid_certs(self.accept_invalid_certs),
            )
            .with_clock_sync(
                ClockSyncOptions::default()
                    .with_host(self.ntp_host)
                    .with_port(self.ntp_port)
                    .with_interval_minutes(self.ntp_interval_min),
            )
    }
}

/// Anything but `0`, `false`, `off` or `no` enables.
fn parse_switch(raw: &str) -> Result<bool, String> {
    Ok(!matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "off" | "no"
    ))
}

fn load_registry(config: &MonitorConfig) -> Registry {
    match Registry::load(config.registry_path()) {
        Ok(registry) => {
            tracing::info!(
                path = %config.registry_path().display(),
                clients = registry.clients().len(),
                devices = registry.len(),
                "Registry loaded"
            );
            registry
        }
        Err(e) => {
            tracing::error!(
                path = %config.registry_path().display(),
                error = %e,
                "Failed to load registry, starting empty"
            );
            Registry::default()
        }
    }
}

async fn shutdown_signal(cancel: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutting down");
    cancel.cancel();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("dvr_monitor=info")),
        )
        .init();

    let config = Cli::parse().into_config();
    let registry = Arc::new(load_registry(&config));

    let broadcaster = Broadcaster::new();
    let store = StateStore::new(broadcaster.clone());
    let client = DigestClient::new(config.http()).context("building HTTP client")?;

    let cancel = CancellationToken::new();
    let keepalive = broadcaster.spawn_keepalive(config.keepalive_interval(), cancel.child_token());

    let mut scheduler = PollScheduler::new(
        FleetPoller::new(client.clone()),
        store.clone(),
        config.poll().clone(),
    );
    scheduler.start(registry.devices().cloned());

    let service = QueryService::new(registry, store, client, config.clock_sync().clone());
    let app = axum::Router::new().nest("/api", api::router(service));

    let listener = tokio::net::TcpListener::bind(config.bind())
        .await
        .with_context(|| format!("binding {}", config.bind()))?;
    tracing::info!(addr = %config.bind(), "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel.clone()))
        .await
        .context("serving API")?;

    cancel.cancel();
    scheduler.shutdown().await;
    if let Err(e) = keepalive.await {
        tracing::warn!(error = %e, "Keep-alive task ended abnormally");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn switch_values() {
        assert!(!parse_switch("0").unwrap());
        assert!(!parse_switch("False").unwrap());
        assert!(parse_switch("1").unwrap());
        assert!(parse_switch("yes").unwrap());
    }

    #[test]
    fn cli_defaults() {
        let config = Cli::parse_from(["dvr-monitor"]).into_config();
        assert_eq!(config.poll().base_interval, Duration::from_secs(60));
        assert!(config.poll().enabled);
        assert_eq!(config.http().timeout(), Duration::from_secs(10));
        assert_eq!(config.clock_sync().host(), "a.ntp.br");
    }

    #[test]
    fn cli_overrides() {
        let config = Cli::parse_from([
            "dvr-monitor",
            "--port",
            "8080",
            "--poll-enabled",
            "0",
            "--ntp-host",
            "pool.ntp.org",
        ])
        .into_config();
        assert_eq!(config.bind().port(), 8080);
        assert!(!config.poll().enabled);
        assert_eq!(config.clock_sync().host(), "pool.ntp.org");
    }
}
