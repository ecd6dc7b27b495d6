// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Serialized frames pushed to live subscribers.

use std::sync::Arc;

use serde::Serialize;

use crate::registry::DeviceId;
use crate::state::StateEntry;

/// Event name of a device status frame.
pub const DVR_EVENT: &str = "dvr";
/// Event name of a keep-alive frame.
pub const PING_EVENT: &str = "ping";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DvrPayload<'a> {
    dvr_id: &'a DeviceId,
    data: &'a StateEntry,
}

/// One server-push frame: an event name plus its JSON payload.
///
/// The payload is serialized once when the frame is built and shared by every
/// subscriber it is delivered to.
///
/// # Examples
///
/// ```
/// use dvr_monitor::event::StreamFrame;
///
/// let ping = StreamFrame::ping();
/// assert_eq!(ping.to_sse_text(), "event: ping\ndata: {}\n\n");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamFrame {
    event: &'static str,
    data: Arc<str>,
}

impl StreamFrame {
    /// Builds a `dvr` frame carrying `{dvrId, data}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be serialized.
    pub fn dvr(id: &DeviceId, entry: &StateEntry) -> Result<Self, serde_json::Error> {
        let data = serde_json::to_string(&DvrPayload { dvr_id: id, data: entry })?;
        Ok(Self {
            event: DVR_EVENT,
            data: Arc::from(data),
        })
    }

    /// Builds a keep-alive frame with an empty object payload.
    #[must_use]
    pub fn ping() -> Self {
        Self {
            event: PING_EVENT,
            data: Arc::from("{}"),
        }
    }

    /// Event name.
    #[must_use]
    pub fn event(&self) -> &'static str {
        self.event
    }

    /// JSON payload.
    #[must_use]
    pub fn data(&self) -> &str {
        &self.data
    }

    /// Renders the frame in `text/event-stream` wire format.
    #[must_use]
    pub fn to_sse_text(&self) -> String {
        format!("event: {}\ndata: {}\n\n", self.event, self.data)
    }
}
