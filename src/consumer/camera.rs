// SPDX-License-Identifier: GPL-3.0-or-later
use std::sync::Arc;

use bytes::Bytes;
use futures::future::{self, FutureExt};
use futures::StreamExt as _;
use tokio::sync::watch;
use tokio::task::spawn_blocking;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::render::{Fingerprint, FrameRenderer};
use crate::source::{Coordinator, FrameRecord, ListenerId};
use crate::util::{flatten_join_result, StreamExt as _};

type RecordReceiver = watch::Receiver<Option<Arc<FrameRecord>>>;

/// A record tagged with the fingerprint of its values. Two of these are equal when their
/// fingerprints are.
#[derive(Clone, Debug)]
struct Fingerprinted(Fingerprint, Arc<FrameRecord>);

impl From<Arc<FrameRecord>> for Fingerprinted {
    fn from(record: Arc<FrameRecord>) -> Self {
        Self(Fingerprint::of(&record.values), record)
    }
}

impl PartialEq for Fingerprinted {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

/// The image consumer: keeps the most recent rendering of the coordinator's frames.
#[derive(Debug)]
pub struct ThermalCamera {
    coordinator: Arc<Coordinator>,
    listener: ListenerId,
    images: watch::Receiver<Option<Bytes>>,
}

impl ThermalCamera {
    /// Subscribe to `coordinator`.
    ///
    /// Nothing is rendered until the returned [`RenderLoop`] is run.
    pub fn new(coordinator: &Arc<Coordinator>, renderer: FrameRenderer) -> (Self, RenderLoop) {
        let (record_sender, records) = watch::channel(coordinator.latest());
        let listener = coordinator.add_listener(move |record| {
            // Only fails once the render loop has been dropped.
            let _ = record_sender.send(Some(Arc::clone(record)));
        });
        let (image_sender, images) = watch::channel(None);
        let camera = Self {
            coordinator: Arc::clone(coordinator),
            listener,
            images,
        };
        let render_loop = RenderLoop {
            renderer: Arc::new(renderer),
            records,
            images: image_sender,
        };
        (camera, render_loop)
    }

    /// The most recently rendered JPEG, or `None` before the first frame has been rendered.
    pub fn latest_image(&self) -> Option<Bytes> {
        self.images.borrow().clone()
    }

    /// A receiver that is updated with every newly rendered JPEG.
    pub fn subscribe(&self) -> watch::Receiver<Option<Bytes>> {
        self.images.clone()
    }
}

impl Drop for ThermalCamera {
    fn drop(&mut self) {
        self.coordinator.remove_listener(self.listener);
    }
}

/// Renders records as they are published, on a blocking thread.
#[derive(Debug)]
pub struct RenderLoop {
    renderer: Arc<FrameRenderer>,
    records: RecordReceiver,
    images: watch::Sender<Option<Bytes>>,
}

impl RenderLoop {
    /// Render until `cancel` is triggered or the [`ThermalCamera`] is dropped.
    ///
    /// Records with the same values as the previous record are skipped. Frames that fail to
    /// render are logged and the previous image is kept.
    pub async fn run(self, cancel: CancellationToken) -> anyhow::Result<()> {
        let Self {
            renderer,
            records,
            images,
        } = self;
        info!(labels = renderer.has_labels(), "Starting frame renderer");
        let mut records = WatchStream::new(records)
            .filter_map(future::ready)
            .map(Fingerprinted::from)
            .filter_repeated()
            .boxed();
        loop {
            let Fingerprinted(fingerprint, record) = tokio::select! {
                _ = cancel.cancelled() => break,
                next = records.next() => match next {
                    Some(record) => record,
                    None => break,
                },
            };
            trace!(?fingerprint, "Rendering frame");
            let renderer = Arc::clone(&renderer);
            let rendered = spawn_blocking(move || renderer.render(&record))
                .map(flatten_join_result)
                .await;
            match rendered {
                Ok(image) => {
                    debug!(bytes = image.jpeg.len(), "Rendered frame");
                    if images.send(Some(image.jpeg)).is_err() {
                        debug!("Image receivers closed");
                        break;
                    }
                }
                Err(err) => warn!("Unable to render frame: {:#}", err),
            }
        }
        info!("Frame renderer stopped");
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::ThermalCamera;
    use crate::render::{FrameRenderer, RenderSettings};
    use crate::source::{Coordinator, FrameRecord, SourceSettings};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;
    use tokio_util::sync::CancellationToken;
    use url::Url;

    fn coordinator(rows: usize, cols: usize) -> Arc<Coordinator> {
        let mut settings = SourceSettings::new(Url::parse("http://192.0.2.10").unwrap());
        settings.rows = rows;
        settings.columns = cols;
        Arc::new(Coordinator::new(&reqwest::Client::new(), &settings).unwrap())
    }

    fn renderer() -> FrameRenderer {
        let settings = RenderSettings {
            height: 80,
            ..RenderSettings::default()
        };
        FrameRenderer::without_labels(&settings).unwrap()
    }

    #[tokio::test]
    async fn renders_published_frames() {
        let coordinator = coordinator(4, 4);
        let (camera, render_loop) = ThermalCamera::new(&coordinator, renderer());
        assert!(camera.latest_image().is_none());
        let cancel = CancellationToken::new();
        let task = tokio::spawn(render_loop.run(cancel.clone()));
        let mut images = camera.subscribe();
        let values = (0..16).map(|n| n as f32).collect();
        coordinator.publish_record(FrameRecord::from_values(values, 4, 4));
        timeout(Duration::from_secs(5), images.changed())
            .await
            .expect("a frame to be rendered")
            .unwrap();
        let jpeg = camera.latest_image().unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
        cancel.cancel();
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn identical_frames_skipped() {
        let coordinator = coordinator(2, 2);
        let (camera, render_loop) = ThermalCamera::new(&coordinator, renderer());
        let cancel = CancellationToken::new();
        let task = tokio::spawn(render_loop.run(cancel.clone()));
        let mut images = camera.subscribe();
        coordinator.publish_record(FrameRecord::from_values(vec![1.0, 2.0, 3.0, 4.0], 2, 2));
        timeout(Duration::from_secs(5), images.changed())
            .await
            .unwrap()
            .unwrap();
        coordinator.publish_record(FrameRecord::from_values(vec![1.0, 2.0, 3.0, 4.0], 2, 2));
        assert!(
            timeout(Duration::from_millis(300), images.changed())
                .await
                .is_err(),
            "Identical frame was rendered again"
        );
        coordinator.publish_record(FrameRecord::from_values(vec![4.0, 3.0, 2.0, 1.0], 2, 2));
        timeout(Duration::from_secs(5), images.changed())
            .await
            .unwrap()
            .unwrap();
        cancel.cancel();
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn bad_shape_keeps_previous() {
        let coordinator = coordinator(2, 2);
        let (camera, render_loop) = ThermalCamera::new(&coordinator, renderer());
        let cancel = CancellationToken::new();
        let task = tokio::spawn(render_loop.run(cancel.clone()));
        let mut images = camera.subscribe();
        coordinator.publish_record(FrameRecord::from_values(vec![1.0, 2.0, 3.0, 4.0], 2, 2));
        timeout(Duration::from_secs(5), images.changed())
            .await
            .unwrap()
            .unwrap();
        let first = camera.latest_image().unwrap();
        coordinator.publish_record(FrameRecord::from_values(vec![1.0, 2.0, 3.0], 2, 2));
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(camera.latest_image().unwrap(), first);
        cancel.cancel();
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn drop_unsubscribes() {
        let coordinator = coordinator(2, 2);
        let (camera, render_loop) = ThermalCamera::new(&coordinator, renderer());
        drop(camera);
        // The loop ends on its own once nothing can receive images or send records.
        coordinator.publish_record(FrameRecord::from_values(vec![1.0; 4], 2, 2));
        let finished = timeout(
            Duration::from_secs(5),
            render_loop.run(CancellationToken::new()),
        )
        .await;
        assert!(finished.is_ok());
    }
}
