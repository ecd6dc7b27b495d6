// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP façade.
//!
//! | Route | Answer |
//! |---|---|
//! | `GET /summary` | fleet summary, never fails |
//! | `GET /stream` | `text/event-stream` of `dvr` and `ping` events |
//! | `GET /dvrs/{id}/ping` | 200 or 503, no body |
//! | `GET /dvrs/{id}/overview` | `{status, counts, indices}` |
//! | `GET /dvrs/{id}/channels` | `{channels}`, empty on failure |
//! | `GET /dvrs/{id}/snapshot/{index}` | image bytes, 502 on failure |
//! | `GET /dvrs/{id}/current-time` | `{timeText, iso}` |
//! | `GET /dvrs/{id}/ntp-sync` | `{ok}`, 502 when every step failed |
//! | `GET /dvrs/{id}/storage` | `{disks, lines}`, 502 on failure |
//!
//! Unknown devices answer 404, devices without an address 400 and
//! unsupported vendors 501, before any device is contacted.

mod handlers;
mod stream;

use axum::Router;
use axum::routing::get;

use crate::query::QueryService;

/// Builds the router. Mount it wherever the API should live, e.g. under
/// `/api`.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use dvr_monitor::adapter::ClockSyncOptions;
/// use dvr_monitor::api;
/// use dvr_monitor::event::Broadcaster;
/// use dvr_monitor::protocol::{DigestClient, HttpConfig};
/// use dvr_monitor::query::QueryService;
/// use dvr_monitor::registry::Registry;
/// use dvr_monitor::state::StateStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let service = QueryService::new(
///     Arc::new(Registry::default()),
///     StateStore::new(Broadcaster::new()),
///     DigestClient::new(&HttpConfig::default())?,
///     ClockSyncOptions::default(),
/// );
/// let app = axum::Router::new().nest("/api", api::router(service));
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:3001").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```
pub fn router(service: QueryService) -> Router {
    Router::new()
        .route("/summary", get(handlers::summary))
        .route("/stream", get(stream::stream))
        .route("/dvrs/{id}/ping", get(handlers::ping))
        .route("/dvrs/{id}/overview", get(handlers::overview))
        .route("/dvrs/{id}/channels", get(handlers::channels))
        .route("/dvrs/{id}/snapshot/{index}", get(handlers::snapshot))
        .route("/dvrs/{id}/current-time", get(handlers::current_time))
        .route("/dvrs/{id}/ntp-sync", get(handlers::ntp_sync))
        .route("/dvrs/{id}/storage", get(handlers::storage))
        .with_state(service)
}
