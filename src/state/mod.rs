// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Latest known device status.
//!
//! [`StateStore`] maps each device to a [`StateEntry`]. Writes are
//! [`StatusUpdate`]s merged field by field, so an offline report keeps the
//! last known channel counts.

mod entry;
mod store;

pub use entry::{StateEntry, StatusUpdate};
pub use store::StateStore;
