// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `dvr_monitor` - Polling engine and live status feed for DVR/NVR fleets.
//!
//! Recorders from different vendors speak different, loosely documented
//! HTTP protocols. This crate normalizes them into one model, polls every
//! device on its own schedule, and pushes status changes to live
//! subscribers.
//!
//! # Supported Devices
//!
//! - **ISAPI family** (`hikvision`, `jfl`): XML/JSON endpoints under `/ISAPI`
//! - **CGI family** (`intelbras`): `key=value` config dumps under `/cgi-bin`
//!
//! All devices are reached through a client that completes HTTP Digest
//! challenges on its own.
//!
//! # Architecture
//!
//! ```text
//! Registry -> PollScheduler -> Adapter -> DigestClient -> device
//!                  |
//!                  v
//!             StateStore -> Broadcaster -> subscribers
//!
//! QueryService -> Adapter -> device      (on demand, no store)
//! ```
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use dvr_monitor::event::Broadcaster;
//! use dvr_monitor::protocol::{DigestClient, HttpConfig};
//! use dvr_monitor::registry::Registry;
//! use dvr_monitor::scheduler::{FleetPoller, PollPolicy, PollScheduler};
//! use dvr_monitor::state::StateStore;
//!
//! #[tokio::main]
//! async fn main() -> dvr_monitor::Result<()> {
//!     let registry = Arc::new(Registry::load("public/clients.json")?);
//!     let broadcaster = Broadcaster::new();
//!     let store = StateStore::new(broadcaster.clone());
//!
//!     let mut updates = broadcaster.subscribe();
//!     let client = DigestClient::new(&HttpConfig::default())?;
//!     let mut scheduler = PollScheduler::new(FleetPoller::new(client), store, PollPolicy::default());
//!     scheduler.start(registry.devices().cloned());
//!
//!     while let Some(frame) = updates.recv().await {
//!         println!("{}", frame.data());
//!     }
//!     Ok(())
//! }
//! ```

pub mod adapter;
#[cfg(feature = "server")]
pub mod api;
pub mod config;
pub mod error;
pub mod event;
pub mod protocol;
pub mod query;
pub mod registry;
pub mod scheduler;
pub mod state;
pub mod types;

pub use adapter::{Adapter, VendorAdapter};
pub use config::MonitorConfig;
pub use error::{Error, ParseError, ProtocolError, RegistryError, Result};
pub use query::{QueryError, QueryService};
pub use registry::{Device, DeviceId, Registry};
pub use state::StateStore;
