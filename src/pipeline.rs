// SPDX-License-Identifier: GPL-3.0-or-later
use anyhow::Context as _;
use futures::future::{Future, FutureExt};
use futures::ready;
use futures::stream::{FuturesUnordered, Stream};
use pin_project::pin_project;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span};
use tracing_futures::Instrument;

use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use crate::consumer::{MotionSensor, ThermalCamera, Thermometer};
use crate::render::FrameRenderer;
use crate::server::{self, ServerState};
use crate::settings::Settings;
use crate::source::Coordinator;
use crate::util::flatten_join_result;

type InnerTask = Pin<Box<dyn Future<Output = anyhow::Result<()>>>>;
type TaskList = FuturesUnordered<InnerTask>;

/// Everything needed to go from a thermal source to images and sensor values.
///
/// The pipeline is a future that resolves once any of its tasks stops. Stopping one task
/// cancels the rest.
#[pin_project]
pub struct Pipeline {
    coordinator: Arc<Coordinator>,
    camera: Arc<ThermalCamera>,
    motion: Arc<MotionSensor>,
    thermometers: Vec<Thermometer>,
    server_address: Option<SocketAddr>,
    shutdown: CancellationToken,
    #[pin]
    tasks: TaskList,
}

impl Pipeline {
    /// Create every component and start the background tasks. This must be called from
    /// within a Tokio runtime.
    pub fn new(config: Settings) -> anyhow::Result<Self> {
        let shutdown = CancellationToken::new();
        let tasks = TaskList::new();
        info!(
            url = %config.source.url,
            mode = ?config.source.mode,
            "Creating pipeline"
        );
        let client = reqwest::Client::builder()
            .build()
            .context("Unable to create HTTP client")?;
        let coordinator = Arc::new(
            Coordinator::new(&client, &config.source).context("Error configuring frame source")?,
        );
        let coordinator_task = {
            let coordinator = Arc::clone(&coordinator);
            let cancel = shutdown.child_token();
            tokio::spawn(
                async move {
                    coordinator.run(cancel).await;
                    anyhow::Result::<()>::Ok(())
                }
                .instrument(info_span!("coordinator")),
            )
            .map(flatten_join_result)
            .boxed()
        };
        tasks.push(coordinator_task);

        let renderer = FrameRenderer::new(&config.render).context("Error creating renderer")?;
        let (camera, render_loop) = ThermalCamera::new(&coordinator, renderer);
        let camera = Arc::new(camera);
        tasks.push(
            tokio::spawn(
                render_loop
                    .run(shutdown.child_token())
                    .instrument(info_span!("render_loop")),
            )
            .map(flatten_join_result)
            .boxed(),
        );

        let motion = Arc::new(MotionSensor::new(
            &coordinator,
            config.sensors.motion_threshold,
        ));
        let thermometers = Thermometer::all(&coordinator);

        let server_address = if config.server.enabled {
            let state = Arc::new(ServerState {
                camera: Arc::clone(&camera),
                motion: Arc::clone(&motion),
                thermometers: thermometers.clone(),
            });
            let (address, server) =
                server::serve(&config.server, state, shutdown.child_token())
                    .context("Error creating HTTP server")?;
            info!(%address, "Serving images and sensor values");
            tasks.push(server.instrument(info_span!("http_server")).map(Ok).boxed());
            Some(address)
        } else {
            info!("HTTP server disabled");
            None
        };

        Ok(Self {
            coordinator,
            camera,
            motion,
            thermometers,
            server_address,
            shutdown,
            tasks,
        })
    }

    pub fn coordinator(&self) -> &Arc<Coordinator> {
        &self.coordinator
    }

    pub fn camera(&self) -> &Arc<ThermalCamera> {
        &self.camera
    }

    pub fn motion_sensor(&self) -> &Arc<MotionSensor> {
        &self.motion
    }

    pub fn thermometers(&self) -> &[Thermometer] {
        &self.thermometers
    }

    /// The address the HTTP server is listening on, if it is enabled.
    pub fn server_address(&self) -> Option<SocketAddr> {
        self.server_address
    }

    /// A token that stops every task in the pipeline when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }
}

impl Future for Pipeline {
    type Output = anyhow::Result<()>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut this = self.project();
        Poll::Ready(loop {
            match ready!(this.tasks.as_mut().poll_next(cx)) {
                Some(res) => {
                    debug!(result = ?res, "Pipeline terminating");
                    this.shutdown.cancel();
                    break res;
                }
                None => break Ok(()),
            }
        })
    }
}
