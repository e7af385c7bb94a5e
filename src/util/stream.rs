// SPDX-License-Identifier: GPL-3.0-or-later
//! [`Stream`][futures::Stream] extensions.
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::{ready, Stream};
use pin_project::pin_project;

pub(crate) trait StreamExt: Stream {
    /// Skip items equal to the item most recently passed through.
    fn filter_repeated(self) -> FilterRepeated<Self>
    where
        Self: Sized,
        Self::Item: PartialEq + Clone,
    {
        FilterRepeated::new(self)
    }
}

impl<St: Stream> StreamExt for St {}

#[pin_project]
#[derive(Debug)]
pub(crate) struct FilterRepeated<St: Stream> {
    #[pin]
    stream: St,
    last_seen: Option<St::Item>,
}

impl<St> FilterRepeated<St>
where
    St: Stream,
    <St as Stream>::Item: PartialEq + Clone,
{
    fn new(stream: St) -> Self {
        Self {
            stream,
            last_seen: None,
        }
    }
}

impl<St> Stream for FilterRepeated<St>
where
    St: Stream,
    <St as Stream>::Item: PartialEq + Clone,
{
    type Item = St::Item;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();
        Poll::Ready(loop {
            if let Some(next_item) = ready!(this.stream.as_mut().poll_next(cx)) {
                if this.last_seen.as_ref() != Some(&next_item) {
                    *this.last_seen = Some(next_item.clone());
                    break Some(next_item);
                }
            } else {
                break None;
            }
        })
    }
}
