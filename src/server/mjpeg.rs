// SPDX-License-Identifier: GPL-3.0-or-later
use std::convert::Infallible;

use bytes::{BufMut, Bytes, BytesMut};
use futures::future;
use futures::stream::StreamExt;
use hyper::Body;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

const BOUNDARY: &str = "thermal_relay_boundary";

/// A `multipart/x-mixed-replace` stream of JPEG images.
#[derive(Clone, Debug)]
pub(crate) struct MjpegStream {
    boundary: String,
    frames: watch::Receiver<Option<Bytes>>,
}

impl MjpegStream {
    pub(crate) fn new(frames: watch::Receiver<Option<Bytes>>) -> Self {
        Self {
            boundary: BOUNDARY.to_string(),
            frames,
        }
    }

    /// A response body that starts with the current image (if there is one), then sends every
    /// new image as it arrives.
    pub(crate) fn body(&self) -> Body {
        let boundary = self.boundary.clone();
        let parts = WatchStream::new(self.frames.clone())
            .filter_map(future::ready)
            .map(move |jpeg| Ok::<_, Infallible>(multipart_part(&boundary, &jpeg)));
        Body::wrap_stream(parts)
    }

    pub(crate) fn content_type(&self) -> String {
        format!("multipart/x-mixed-replace; boundary={}", self.boundary)
    }
}

fn multipart_part(boundary: &str, jpeg: &Bytes) -> Bytes {
    let header = format!(
        "\r\n--{}\r\nContent-Type: image/jpeg\r\nContent-Length: {}\r\n\r\n",
        boundary,
        jpeg.len()
    );
    let mut part = BytesMut::with_capacity(header.len() + jpeg.len());
    part.put_slice(header.as_bytes());
    part.put_slice(jpeg);
    part.freeze()
}
