// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-device poll loops.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::registry::Device;
use crate::state::StateStore;

use super::{Backoff, Poll, PollPolicy};

/// Runs one independent poll loop per device.
///
/// Loops are staggered at start, write every outcome to the [`StateStore`],
/// and back off on failure. They stop when the scheduler's cancellation token
/// fires.
///
/// # Examples
///
/// ```no_run
/// use dvr_monitor::event::Broadcaster;
/// use dvr_monitor::protocol::{DigestClient, HttpConfig};
/// use dvr_monitor::registry::Registry;
/// use dvr_monitor::scheduler::{FleetPoller, PollPolicy, PollScheduler};
/// use dvr_monitor::state::StateStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let registry = Registry::load("public/clients.json")?;
/// let store = StateStore::new(Broadcaster::new());
/// let poller = FleetPoller::new(DigestClient::new(&HttpConfig::default())?);
///
/// let mut scheduler = PollScheduler::new(poller, store, PollPolicy::default());
/// scheduler.start(registry.devices().cloned());
///
/// // ...
/// scheduler.shutdown().await;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct PollScheduler<P> {
    poller: Arc<P>,
    store: StateStore,
    policy: PollPolicy,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl<P: Poll> PollScheduler<P> {
    /// Creates a scheduler. Nothing runs until [`start`](Self::start).
    #[must_use]
    pub fn new(poller: P, store: StateStore, policy: PollPolicy) -> Self {
        Self {
            poller: Arc::new(poller),
            store,
            policy,
            cancel: CancellationToken::new(),
            tasks: Vec::new(),
        }
    }

    /// Token that stops every loop when cancelled.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Number of running loops.
    #[must_use]
    pub fn task_count(&self) -> usize {
        self.tasks.iter().filter(|t| !t.is_finished()).count()
    }

    /// Spawns one loop per device, in order. Does nothing if the policy is
    /// disabled.
    pub fn start(&mut self, devices: impl IntoIterator<Item = Device>) {
        if !self.policy.enabled {
            tracing::info!("Polling disabled");
            return;
        }
        let offset = self.tasks.len();
        for (i, device) in devices.into_iter().enumerate() {
            let start = self.policy.start_offset(offset + i);
            let task = DeviceLoop {
                poller: Arc::clone(&self.poller),
                store: self.store.clone(),
                policy: self.policy.clone(),
                cancel: self.cancel.child_token(),
                device,
            };
            self.tasks.push(tokio::spawn(task.run(start)));
        }
        tracing::info!(devices = self.tasks.len(), "Polling started");
    }

    /// Cancels every loop and waits for them to exit.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        for task in self.tasks {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Poll loop ended abnormally");
            }
        }
        tracing::info!("Polling stopped");
    }
}

struct DeviceLoop<P> {
    poller: Arc<P>,
    store: StateStore,
    policy: PollPolicy,
    cancel: CancellationToken,
    device: Device,
}

impl<P: Poll> DeviceLoop<P> {
    async fn run(self, start: Duration) {
        let id = &self.device.id;
        let mut backoff = Backoff::new(self.policy.max_multiplier);

        if !self.sleep(start).await {
            return;
        }
        loop {
            let outcome = tokio::select! {
                () = self.cancel.cancelled() => break,
                outcome = self.poller.poll(&self.device) => outcome,
            };
            let entry = self.store.update(id, &outcome.to_update());

            if outcome.is_healthy() {
                backoff.on_success();
            } else {
                backoff.on_failure();
            }
            let delay = self.policy.jittered_delay_for(backoff.multiplier());
            tracing::info!(
                dvr = %id,
                status = %entry.status,
                multiplier = backoff.multiplier(),
                next_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "Polled"
            );

            if !self.sleep(delay).await {
                break;
            }
        }
        tracing::debug!(dvr = %id, "Poll loop stopped");
    }

    /// Sleeps for `duration`. Returns false if cancelled first.
    async fn sleep(&self, duration: Duration) -> bool {
        tokio::select! {
            () = self.cancel.cancelled() => false,
            () = tokio::time::sleep(duration) => true,
        }
    }
}
