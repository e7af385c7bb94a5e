// SPDX-License-Identifier: GPL-3.0-or-later
use std::fmt;
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use futures::{pin_mut, StreamExt, TryStreamExt};
use parking_lot::Mutex;
use reqwest::Client;
use tokio::time::{sleep, sleep_until, Instant, MissedTickBehavior};
use tokio_util::codec::{FramedRead, LengthDelimitedCodec};
use tokio_util::io::StreamReader;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};
use url::Url;

use crate::error::FetchError;

use super::backoff::Backoff;
use super::listeners::{ListenerId, ListenerList};
use super::payload::{decode_stream_payload, parse_json_frame};
use super::record::{FrameRecord, ScalarKind};
use super::settings::{SourceSettings, TransportMode};

#[derive(Debug, Default)]
struct Canonical {
    sequence: u64,
    record: Option<Arc<FrameRecord>>,
}

/// Keeps the freshest valid [`FrameRecord`] from a thermal source, and tells listeners when
/// it changes.
pub struct Coordinator {
    client: Client,
    settings: SourceSettings,
    endpoint: Url,
    backoff: Backoff,
    next_sequence: AtomicU64,
    canonical: Mutex<Canonical>,
    /// Held while a record is swapped in and dispatched, so listeners see records in order.
    dispatch: Mutex<()>,
    listeners: ListenerList,
}

impl fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coordinator")
            .field("endpoint", &self.endpoint.as_str())
            .field("mode", &self.settings.mode)
            .field("sequence", &self.canonical.lock().sequence)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Coordinator {
    pub fn new(client: &Client, settings: &SourceSettings) -> anyhow::Result<Self> {
        settings
            .validate()
            .map_err(anyhow::Error::msg)
            .context("Invalid source settings")?;
        let endpoint = settings
            .endpoint()
            .with_context(|| format!("Invalid frame path {:?}", settings.path))?;
        Ok(Self {
            client: client.clone(),
            settings: settings.clone(),
            endpoint,
            backoff: Backoff::new(),
            next_sequence: AtomicU64::new(0),
            canonical: Mutex::default(),
            dispatch: Mutex::default(),
            listeners: ListenerList::default(),
        })
    }

    pub fn settings(&self) -> &SourceSettings {
        &self.settings
    }

    /// The most recently published record, if any frame has been received yet.
    pub fn latest(&self) -> Option<Arc<FrameRecord>> {
        self.canonical.lock().record.clone()
    }

    pub fn scalar(&self, kind: ScalarKind) -> Option<f32> {
        self.latest().map(|record| record.scalar(kind))
    }

    /// Register a callback that is run synchronously every time a new record is published.
    ///
    /// Callbacks are run in the order they were added, and should return quickly. Publishing
    /// from within a callback deadlocks.
    pub fn add_listener<F>(&self, callback: F) -> ListenerId
    where
        F: Fn(&Arc<FrameRecord>) + Send + Sync + 'static,
    {
        self.listeners.add(callback)
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    fn take_sequence(&self) -> u64 {
        self.next_sequence.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Replace the canonical record and notify listeners.
    ///
    /// Empty records and records from a fetch that started before the currently published one
    /// are dropped. The record that is canonical afterwards is returned.
    fn publish(&self, sequence: u64, record: FrameRecord) -> Option<Arc<FrameRecord>> {
        if record.is_empty() {
            debug!(sequence, "Keeping previous record in place of an empty frame");
            return self.latest();
        }
        let record = Arc::new(record);
        let _dispatch = self.dispatch.lock();
        {
            let mut canonical = self.canonical.lock();
            if sequence <= canonical.sequence {
                debug!(
                    sequence,
                    published = canonical.sequence,
                    "Discarding stale frame"
                );
                return canonical.record.clone();
            }
            canonical.sequence = sequence;
            canonical.record = Some(Arc::clone(&record));
        }
        trace!(sequence, max = record.max_value, "Publishing frame");
        self.listeners.notify(&record);
        Some(record)
    }

    /// Publish a record that was obtained some other way, as if it had just been fetched.
    pub fn publish_record(&self, record: FrameRecord) -> Option<Arc<FrameRecord>> {
        let sequence = self.take_sequence();
        self.publish(sequence, record)
    }

    async fn request_frame(&self) -> Result<FrameRecord, FetchError> {
        let response = self
            .client
            .get(self.endpoint.clone())
            .timeout(self.settings.timeout)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }
        let body = response.bytes().await?;
        let record = parse_json_frame(
            &body,
            &self.settings.fields,
            self.settings.rows,
            self.settings.columns,
        )?;
        Ok(record)
    }

    /// Request a single frame document and publish it.
    ///
    /// Failures are logged, and the previous record is returned unchanged.
    pub async fn fetch_once(&self) -> Option<Arc<FrameRecord>> {
        let sequence = self.take_sequence();
        match self.request_frame().await {
            Ok(record) => self.publish(sequence, record),
            Err(err) if err.is_timeout() => {
                warn!(endpoint = %self.endpoint, "Timed out fetching frame");
                self.latest()
            }
            Err(err) => {
                warn!(endpoint = %self.endpoint, error = %err, "Unable to fetch frame");
                self.latest()
            }
        }
    }

    async fn poll_loop(&self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.settings.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => (),
            }
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = self.fetch_once() => (),
            }
        }
        debug!("Frame polling cancelled");
    }

    async fn stream_loop(&self, cancel: CancellationToken) {
        let mut backoff = self.backoff.clone();
        loop {
            let result = tokio::select! {
                _ = cancel.cancelled() => break,
                result = self.stream_session(&mut backoff) => result,
            };
            match result {
                Ok(()) => info!("Frame stream closed by the server"),
                Err(err) => warn!(endpoint = %self.endpoint, error = %err, "Frame stream failed"),
            }
            let delay = backoff.next_delay();
            debug!(?delay, "Waiting before reconnecting");
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = sleep(delay) => (),
            }
        }
        debug!("Frame stream cancelled");
    }

    fn publish_values(&self, values: Vec<f32>) {
        let record = FrameRecord::from_values(values, self.settings.rows, self.settings.columns);
        self.publish_record(record);
    }

    /// Read frames from a single stream connection until it ends or fails.
    async fn stream_session(&self, backoff: &mut Backoff) -> Result<(), FetchError> {
        let response = self.client.get(self.endpoint.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }
        info!(endpoint = %self.endpoint, "Connected to frame stream");
        backoff.reset();
        let body = response
            .bytes_stream()
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err));
        let frames = FramedRead::new(StreamReader::new(body), LengthDelimitedCodec::new());
        pin_mut!(frames);
        let mut coalescer = Coalescer::new(self.settings.push_interval, Instant::now());
        loop {
            let deadline = coalescer.pending_deadline();
            tokio::select! {
                frame = frames.next() => match frame {
                    Some(Ok(payload)) => match decode_stream_payload(&payload) {
                        Ok(values) => {
                            if let Some(values) = coalescer.offer(values, Instant::now()) {
                                self.publish_values(values);
                            }
                        }
                        Err(err) => warn!(error = %err, "Skipping stream frame"),
                    },
                    Some(Err(err)) => {
                        if let Some(values) = coalescer.flush() {
                            self.publish_values(values);
                        }
                        return Err(err.into());
                    }
                    None => {
                        if let Some(values) = coalescer.flush() {
                            self.publish_values(values);
                        }
                        return Ok(());
                    }
                },
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    if let Some(values) = coalescer.take_due(Instant::now()) {
                        self.publish_values(values);
                    }
                }
            }
        }
    }

    /// Run the configured transport until `cancel` is triggered.
    pub async fn run(&self, cancel: CancellationToken) {
        info!(endpoint = %self.endpoint, mode = ?self.settings.mode, "Starting frame source");
        match self.settings.mode {
            TransportMode::Poll => self.poll_loop(cancel).await,
            TransportMode::Stream => self.stream_loop(cancel).await,
        }
    }
}

/// Limits how often stream frames are published, keeping only the newest unpublished frame.
#[derive(Debug)]
struct Coalescer {
    interval: Duration,
    last_publish: Instant,
    pending: Option<Vec<f32>>,
}

impl Coalescer {
    fn new(interval: Duration, start: Instant) -> Self {
        Self {
            interval,
            last_publish: start,
            pending: None,
        }
    }

    fn deadline(&self) -> Instant {
        self.last_publish + self.interval
    }

    fn pending_deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|_| self.deadline())
    }

    /// Accept a new frame. It is returned if it should be published right away, otherwise it
    /// replaces any pending frame. Empty frames are ignored.
    fn offer(&mut self, values: Vec<f32>, now: Instant) -> Option<Vec<f32>> {
        if values.is_empty() {
            trace!("Ignoring empty stream frame");
            None
        } else if now >= self.deadline() {
            self.pending = None;
            self.last_publish = now;
            Some(values)
        } else {
            self.pending = Some(values);
            None
        }
    }

    fn take_due(&mut self, now: Instant) -> Option<Vec<f32>> {
        if now >= self.deadline() {
            let values = self.pending.take()?;
            self.last_publish = now;
            Some(values)
        } else {
            None
        }
    }

    fn flush(&mut self) -> Option<Vec<f32>> {
        self.pending.take()
    }
}
