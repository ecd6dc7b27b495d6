// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Request/response handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::{Value, json};

use crate::query::{FleetSummary, QueryError, QueryService};
use crate::types::{DeviceStatus, StorageDisk};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TimeBody {
    time_text: Option<String>,
    iso: Option<String>,
}

#[derive(Serialize)]
struct StorageBody {
    disks: Vec<StorageDisk>,
    lines: Vec<String>,
}

/// Maps a dispatch failure to its status. Unsupported vendors get
/// `unsupported_body` so clients can render a neutral value.
fn rejected(err: &QueryError, unsupported_body: Option<Value>) -> Response {
    let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    tracing::debug!(error = %err, status = status.as_u16(), "Query rejected");
    match (err, unsupported_body) {
        (QueryError::Unsupported { .. }, Some(body)) => (status, Json(body)).into_response(),
        _ => status.into_response(),
    }
}

pub(super) async fn summary(State(service): State<QueryService>) -> Json<FleetSummary> {
    Json(service.summary())
}

pub(super) async fn ping(State(service): State<QueryService>, Path(id): Path<String>) -> Response {
    match service.ping(&id).await {
        Ok(ping) if ping.ok => StatusCode::OK.into_response(),
        Ok(_) => StatusCode::SERVICE_UNAVAILABLE.into_response(),
        Err(e) => rejected(&e, None),
    }
}

pub(super) async fn overview(
    State(service): State<QueryService>,
    Path(id): Path<String>,
) -> Response {
    match service.overview(&id).await {
        Ok(overview) => Json(overview).into_response(),
        Err(e) => rejected(&e, Some(json!({ "status": DeviceStatus::Unknown }))),
    }
}

pub(super) async fn channels(
    State(service): State<QueryService>,
    Path(id): Path<String>,
) -> Response {
    match service.channels(&id).await {
        // A failed listing is already an empty list.
        Ok(list) => Json(list).into_response(),
        Err(e) => rejected(&e, Some(json!({ "channels": [] }))),
    }
}

pub(super) async fn snapshot(
    State(service): State<QueryService>,
    Path((id, index)): Path<(String, u32)>,
) -> Response {
    match service.snapshot(&id, index).await {
        Ok(snapshot) => {
            let status = if snapshot.ok {
                StatusCode::OK
            } else {
                StatusCode::BAD_GATEWAY
            };
            (
                status,
                [(header::CONTENT_TYPE, snapshot.content_type)],
                snapshot.bytes,
            )
                .into_response()
        }
        Err(e) => rejected(&e, None),
    }
}

pub(super) async fn current_time(
    State(service): State<QueryService>,
    Path(id): Path<String>,
) -> Response {
    match service.current_time(&id).await {
        Ok(time) => Json(TimeBody {
            time_text: Some(time.time_text()),
            iso: time.iso,
        })
        .into_response(),
        Err(e) => rejected(
            &e,
            Some(json!({ "timeText": Value::Null, "iso": Value::Null })),
        ),
    }
}

pub(super) async fn ntp_sync(
    State(service): State<QueryService>,
    Path(id): Path<String>,
) -> Response {
    match service.sync_clock(&id).await {
        Ok(sync) => {
            let status = if sync.ok {
                StatusCode::OK
            } else {
                StatusCode::BAD_GATEWAY
            };
            (status, Json(json!({ "ok": sync.ok }))).into_response()
        }
        Err(e) => rejected(&e, Some(json!({ "ok": false }))),
    }
}

pub(super) async fn storage(
    State(service): State<QueryService>,
    Path(id): Path<String>,
) -> Response {
    match service.storage(&id).await {
        Ok(report) => {
            let status = if report.ok {
                StatusCode::OK
            } else {
                StatusCode::BAD_GATEWAY
            };
            let lines = report.lines();
            (
                status,
                Json(StorageBody {
                    disks: report.disks,
                    lines,
                }),
            )
                .into_response()
        }
        Err(e) => rejected(&e, Some(json!({ "disks": [], "lines": [] }))),
    }
}
