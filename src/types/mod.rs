// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Canonical model shared by every vendor adapter.
//!
//! Each adapter translates its vendor's wire format into these types at its
//! boundary, so that the scheduler, the state store and the query façade never
//! see vendor-specific shapes.
//!
//! # Types
//!
//! - [`Vendor`] / [`AdapterFamily`] - Registry vendor tag and the protocol it maps to
//! - [`DeviceStatus`] - Online/Offline/Unknown reachability
//! - [`Overview`] - Channel counts plus zero-based index sets
//! - [`Channel`] - Per-channel name and connection state
//! - [`DeviceTime`] - Normalized device clock reading
//! - [`StorageDisk`] - Hard disk capacity and health

mod channel;
mod device_time;
mod overview;
mod status;
mod storage;
mod vendor;

pub use channel::{Channel, default_name};
pub use device_time::{DeviceTime, DeviceTimeParseError};
pub use overview::{ChannelCounts, ChannelIndices, Overview};
pub use status::DeviceStatus;
pub use storage::{StorageDisk, default_disk_name};
pub use vendor::{AdapterFamily, Vendor};
