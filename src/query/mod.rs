// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! On-demand queries.
//!
//! [`QueryService`] calls vendor adapters directly, outside the poll
//! schedule. Addressing problems come back as [`QueryError`]; device and
//! network failures come back as negative results.

mod service;
mod summary;

pub use service::{QueryError, QueryService};
pub use summary::{ClientSummary, DeviceSummary, FleetSummary};
