// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Server-sent event stream of state changes.

use std::convert::Infallible;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::extract::State;
use axum::response::sse::{Event, Sse};
use tokio_stream::Stream;

use crate::event::Subscription;
use crate::query::QueryService;

/// Adapts a [`Subscription`] into SSE events. Dropping the stream (client
/// gone) unsubscribes.
pub(super) struct FrameStream {
    subscription: Subscription,
}

impl Stream for FrameStream {
    type Item = Result<Event, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.subscription.poll_recv(cx).map(|frame| {
            frame.map(|frame| Ok(Event::default().event(frame.event()).data(frame.data())))
        })
    }
}

pub(super) async fn stream(State(service): State<QueryService>) -> Sse<FrameStream> {
    let subscription = service.store().broadcaster().subscribe();
    Sse::new(FrameStream { subscription })
}
