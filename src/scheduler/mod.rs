// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Background polling of the fleet.
//!
//! [`PollScheduler`] spawns one task per device. Each task polls through a
//! [`Poll`] implementation (normally [`FleetPoller`]), writes the outcome to
//! the state store and sleeps for `base_interval × multiplier + jitter`,
//! where the [`Backoff`] multiplier doubles on failure up to the
//! [`PollPolicy`] cap and resets on success. A slow or dead device only
//! delays its own loop.

mod policy;
mod poller;
mod runner;

pub use policy::{Backoff, PollPolicy};
pub use poller::{FleetPoller, Poll, PollOutcome};
pub use runner::PollScheduler;
