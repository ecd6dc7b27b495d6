// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fan-out hub for live subscribers.

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::StreamFrame;

/// Default number of frames buffered per subscriber.
const DEFAULT_SINK_CAPACITY: usize = 64;

#[derive(Debug)]
struct Inner {
    sinks: Mutex<HashMap<Uuid, mpsc::Sender<StreamFrame>>>,
    capacity: usize,
}

impl Inner {
    fn remove(&self, id: Uuid) -> bool {
        let removed = self.sinks.lock().remove(&id).is_some();
        if removed {
            tracing::info!(subscriber = %id, "Subscriber disconnected");
        }
        removed
    }
}

/// Broadcasts frames to every connected subscriber.
///
/// Each subscriber owns a bounded queue. Publishing never waits: a subscriber
/// whose queue is closed is removed, and one whose queue is full misses that
/// frame without affecting anyone else.
///
/// Cloning yields a handle to the same subscriber set.
///
/// # Examples
///
/// ```
/// use dvr_monitor::event::{Broadcaster, StreamFrame};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let broadcaster = Broadcaster::new();
/// let mut sub = broadcaster.subscribe();
///
/// assert_eq!(broadcaster.publish(&StreamFrame::ping()), 1);
/// assert_eq!(sub.recv().await.unwrap().event(), "ping");
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Broadcaster {
    inner: Arc<Inner>,
}

impl Broadcaster {
    /// Creates a broadcaster with the default per-subscriber capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_SINK_CAPACITY)
    }

    /// Creates a broadcaster buffering up to `capacity` frames per subscriber.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                sinks: Mutex::new(HashMap::new()),
                capacity: capacity.max(1),
            }),
        }
    }

    /// Registers a new subscriber.
    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::channel(self.inner.capacity);
        let id = Uuid::new_v4();
        let count = {
            let mut sinks = self.inner.sinks.lock();
            sinks.insert(id, tx);
            sinks.len()
        };
        tracing::info!(subscriber = %id, subscribers = count, "Subscriber connected");
        Subscription {
            id,
            receiver: rx,
            hub: Arc::downgrade(&self.inner),
        }
    }

    /// Removes a subscriber. Returns false if it was already gone.
    pub fn unsubscribe(&self, id: Uuid) -> bool {
        self.inner.remove(id)
    }

    /// Number of registered subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.sinks.lock().len()
    }

    /// Delivers a frame to every subscriber and returns how many accepted it.
    pub fn publish(&self, frame: &StreamFrame) -> usize {
        let mut delivered = 0;
        let mut sinks = self.inner.sinks.lock();
        sinks.retain(|id, sink| match sink.try_send(frame.clone()) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                tracing::debug!(subscriber = %id, event = frame.event(), "Subscriber lagging, frame dropped");
                true
            }
            Err(TrySendError::Closed(_)) => {
                tracing::warn!(subscriber = %id, "Subscriber gone, removing");
                false
            }
        });
        delivered
    }

    /// Spawns a task publishing a keep-alive frame every `interval` until
    /// `cancel` fires. The first frame goes out one full interval after start.
    #[must_use]
    pub fn spawn_keepalive(&self, interval: Duration, cancel: CancellationToken) -> JoinHandle<()> {
        let broadcaster = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                tokio::select! {
                    () = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        broadcaster.publish(&StreamFrame::ping());
                    }
                }
            }
            tracing::debug!("Keep-alive stopped");
        })
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving half of a subscription. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    id: Uuid,
    receiver: mpsc::Receiver<StreamFrame>,
    hub: Weak<Inner>,
}

impl Subscription {
    /// Subscriber identifier.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Waits for the next frame. Returns `None` once the broadcaster dropped
    /// this subscriber.
    pub async fn recv(&mut self) -> Option<StreamFrame> {
        self.receiver.recv().await
    }

    /// Polls for the next frame, for use in a `Stream` implementation.
    pub fn poll_recv(&mut self, cx: &mut Context<'_>) -> Poll<Option<StreamFrame>> {
        self.receiver.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            hub.remove(self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_broadcaster_has_no_subscribers() {
        assert_eq!(Broadcaster::new().subscriber_count(), 0);
    }

    #[test]
    fn subscribe_and_unsubscribe() {
        let broadcaster = Broadcaster::new();
        let a = broadcaster.subscribe();
        let _b = broadcaster.subscribe();
        assert_eq!(broadcaster.subscriber_count(), 2);

        assert!(broadcaster.unsubscribe(a.id()));
        assert!(!broadcaster.unsubscribe(a.id()));
        assert_eq!(broadcaster.subscriber_count(), 1);
    }

    #[tokio::test]
    async fn broken_subscriber_does_not_block_others() {
        let broadcaster = Broadcaster::new();
        let mut first = broadcaster.subscribe();
        let mut broken = broadcaster.subscribe();
        let mut third = broadcaster.subscribe();
        // Closed but still registered, as when a connection dies mid-write.
        broken.receiver.close();

        assert_eq!(broadcaster.publish(&StreamFrame::ping()), 2);
        assert_eq!(broadcaster.subscriber_count(), 2);
        assert_eq!(first.recv().await.unwrap().event(), "ping");
        assert_eq!(third.recv().await.unwrap().event(), "ping");
    }

    #[test]
    fn dropping_subscription_unsubscribes() {
        let broadcaster = Broadcaster::new();
        let sub = broadcaster.subscribe();
        let id = sub.id();
        drop(sub);
        assert_eq!(broadcaster.subscriber_count(), 0);
        assert!(!broadcaster.unsubscribe(id));
    }

    #[tokio::test]
    async fn full_subscriber_is_kept_but_skipped() {
        let broadcaster = Broadcaster::with_capacity(1);
        let mut slow = broadcaster.subscribe();

        assert_eq!(broadcaster.publish(&StreamFrame::ping()), 1);
        assert_eq!(broadcaster.publish(&StreamFrame::ping()), 0);
        assert_eq!(broadcaster.subscriber_count(), 1);

        assert!(slow.recv().await.is_some());
        assert_eq!(broadcaster.publish(&StreamFrame::ping()), 1);
    }

    #[test]
    fn clone_shares_subscribers() {
        let a = Broadcaster::new();
        let b = a.clone();
        let _sub = a.subscribe();
        assert_eq!(b.subscriber_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn keepalive_ticks_until_cancelled() {
        let broadcaster = Broadcaster::new();
        let mut sub = broadcaster.subscribe();
        let cancel = CancellationToken::new();
        let handle = broadcaster.spawn_keepalive(Duration::from_secs(15), cancel.clone());

        tokio::time::sleep(Duration::from_secs(14)).await;
        assert!(sub.receiver.try_recv().is_err());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(sub.recv().await.unwrap().event(), "ping");

        cancel.cancel();
        handle.await.unwrap();
    }
}
