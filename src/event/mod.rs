// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Live status push.
//!
//! The [`Broadcaster`] holds one bounded queue per connected subscriber and
//! fans every [`StreamFrame`] out to all of them. The state store publishes a
//! `dvr` frame on each write; a keep-alive task publishes `ping` frames on a
//! fixed period.

mod broadcaster;
mod frame;

pub use broadcaster::{Broadcaster, Subscription};
pub use frame::{DVR_EVENT, PING_EVENT, StreamFrame};
