// SPDX-License-Identifier: GPL-3.0-or-later
//! An HTTP server for the rendered images and sensor values.
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context as _;
use http::header::{CACHE_CONTROL, CONTENT_TYPE};
use http::{Response, StatusCode};
use hyper::Body;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use warp::filters::BoxedFilter;
use warp::{Filter, Reply};

mod mjpeg;
mod settings;

pub use settings::{MjpegSettings, ServerSettings};

use crate::consumer::{MotionSensor, ThermalCamera, Thermometer};
use crate::source::ScalarKind;
use mjpeg::MjpegStream;

type Route = BoxedFilter<(warp::reply::Response,)>;

/// The consumers the server reports on.
#[derive(Debug)]
pub struct ServerState {
    pub camera: Arc<ThermalCamera>,
    pub motion: Arc<MotionSensor>,
    pub thermometers: Vec<Thermometer>,
}

/// The body of a `/state` response.
#[derive(Debug, Default, PartialEq, Serialize)]
pub(crate) struct StateReport {
    lowest: Option<f32>,
    highest: Option<f32>,
    average: Option<f32>,
    motion: bool,
}

impl StateReport {
    fn collect(state: &ServerState) -> Self {
        let mut report = Self {
            motion: state.motion.is_on(),
            ..Self::default()
        };
        for thermometer in &state.thermometers {
            let value = thermometer.value();
            match thermometer.kind() {
                ScalarKind::Lowest => report.lowest = value,
                ScalarKind::Highest => report.highest = value,
                ScalarKind::Average => report.average = value,
            }
        }
        report
    }
}

fn snapshot_route(state: Arc<ServerState>) -> Route {
    warp::path("snapshot.jpg")
        .and(warp::path::end())
        .map(move || match state.camera.latest_image() {
            Some(jpeg) => Response::builder()
                .header(CONTENT_TYPE, "image/jpeg")
                .header(CACHE_CONTROL, "no-cache")
                .body(Body::from(jpeg))
                .into_response(),
            None => Response::builder()
                .status(StatusCode::SERVICE_UNAVAILABLE)
                .body(Body::from("No frame has been rendered yet"))
                .into_response(),
        })
        .boxed()
}

fn state_route(state: Arc<ServerState>) -> Route {
    warp::path("state")
        .and(warp::path::end())
        .map(move || warp::reply::json(&StateReport::collect(&state)).into_response())
        .boxed()
}

fn mjpeg_route(state: &ServerState) -> Route {
    let mjpeg = MjpegStream::new(state.camera.subscribe());
    warp::path("mjpeg")
        .and(warp::path::end())
        .map(move || {
            Response::builder()
                .status(StatusCode::OK)
                .header(CONTENT_TYPE, mjpeg.content_type())
                .header(CACHE_CONTROL, "no-cache")
                .body(mjpeg.body())
                .into_response()
        })
        .boxed()
}

/// All of the routes enabled by `settings`.
pub(crate) fn routes(state: Arc<ServerState>, settings: &ServerSettings) -> Route {
    let mut combined = snapshot_route(Arc::clone(&state));
    if settings.mjpeg.enabled {
        combined = combined.or(mjpeg_route(&state)).unify().boxed();
    } else {
        debug!("MJPEG stream disabled");
    }
    let combined = combined.or(state_route(state)).unify();
    warp::get().and(combined).boxed()
}

/// Bind the server. It runs until the returned future is dropped or `cancel` is triggered.
pub fn serve(
    settings: &ServerSettings,
    state: Arc<ServerState>,
    cancel: CancellationToken,
) -> anyhow::Result<(SocketAddr, impl Future<Output = ()>)> {
    let bind_address = settings.socket_address();
    debug!(address = ?bind_address, "Creating HTTP server");
    warp::serve(routes(state, settings))
        .try_bind_with_graceful_shutdown(bind_address, async move { cancel.cancelled().await })
        .with_context(|| format!("Unable to bind HTTP server to {}", bind_address))
}

#[cfg(test)]
mod test {
    use super::{serve, ServerSettings, ServerState, StateReport};
    use crate::consumer::{MotionSensor, ThermalCamera, Thermometer};
    use crate::render::{FrameRenderer, RenderSettings};
    use crate::source::{Coordinator, FrameRecord, SourceSettings};
    use std::net::SocketAddr;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;
    use tokio_util::sync::CancellationToken;
    use url::Url;

    struct Harness {
        coordinator: Arc<Coordinator>,
        camera: Arc<ThermalCamera>,
        address: SocketAddr,
        cancel: CancellationToken,
    }

    fn start(settings: ServerSettings) -> Harness {
        let mut source = SourceSettings::new(Url::parse("http://192.0.2.10").unwrap());
        source.rows = 2;
        source.columns = 2;
        let coordinator = Arc::new(Coordinator::new(&reqwest::Client::new(), &source).unwrap());
        let render_settings = RenderSettings {
            height: 40,
            ..RenderSettings::default()
        };
        let renderer = FrameRenderer::without_labels(&render_settings).unwrap();
        let (camera, render_loop) = ThermalCamera::new(&coordinator, renderer);
        let camera = Arc::new(camera);
        let state = Arc::new(ServerState {
            camera: Arc::clone(&camera),
            motion: Arc::new(MotionSensor::new(&coordinator, 8.0)),
            thermometers: Thermometer::all(&coordinator),
        });
        let cancel = CancellationToken::new();
        tokio::spawn(render_loop.run(cancel.clone()));
        let settings = ServerSettings {
            port: 0,
            ..settings
        };
        let (address, server) = serve(&settings, state, cancel.clone()).unwrap();
        tokio::spawn(server);
        Harness {
            coordinator,
            camera,
            address,
            cancel,
        }
    }

    impl Harness {
        fn url(&self, path: &str) -> String {
            format!("http://{}/{}", self.address, path)
        }

        async fn publish_and_render(&self, values: Vec<f32>) {
            let mut images = self.camera.subscribe();
            self.coordinator
                .publish_record(FrameRecord::from_values(values, 2, 2));
            timeout(Duration::from_secs(5), images.changed())
                .await
                .expect("a frame to be rendered")
                .unwrap();
        }
    }

    async fn get_json(url: &str) -> serde_json::Value {
        let body = reqwest::get(url).await.unwrap().bytes().await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn state_before_and_after_data() {
        let harness = start(ServerSettings::default());
        let empty = get_json(&harness.url("state")).await;
        assert_eq!(
            empty,
            serde_json::json!({"lowest": null, "highest": null, "average": null, "motion": false})
        );
        harness
            .coordinator
            .publish_record(FrameRecord::from_values(vec![20.0, 20.0, 20.0, 40.0], 2, 2));
        let full = get_json(&harness.url("state")).await;
        assert_eq!(
            full,
            serde_json::json!({"lowest": 20.0, "highest": 40.0, "average": 25.0, "motion": true})
        );
        harness.cancel.cancel();
    }

    #[tokio::test]
    async fn snapshot_unavailable_until_rendered() {
        let harness = start(ServerSettings::default());
        let response = reqwest::get(harness.url("snapshot.jpg")).await.unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::SERVICE_UNAVAILABLE);
        harness.publish_and_render(vec![1.0, 2.0, 3.0, 4.0]).await;
        let response = reqwest::get(harness.url("snapshot.jpg")).await.unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "image/jpeg");
        let body = response.bytes().await.unwrap();
        assert_eq!(&body[..2], &[0xFF, 0xD8]);
        harness.cancel.cancel();
    }

    #[tokio::test]
    async fn mjpeg_stream() {
        let harness = start(ServerSettings::default());
        harness.publish_and_render(vec![1.0, 2.0, 3.0, 4.0]).await;
        let mut response = reqwest::get(harness.url("mjpeg")).await.unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        assert_eq!(
            response.headers()["content-type"],
            "multipart/x-mixed-replace; boundary=thermal_relay_boundary"
        );
        let mut received = Vec::new();
        let marker = b"Content-Type: image/jpeg";
        while !received.windows(marker.len()).any(|window| window == marker) {
            let chunk = timeout(Duration::from_secs(5), response.chunk())
                .await
                .expect("MJPEG data")
                .unwrap()
                .expect("the stream to stay open");
            received.extend_from_slice(&chunk);
        }
        assert!(received.starts_with(b"\r\n--thermal_relay_boundary\r\n"));
        harness.cancel.cancel();
    }

    #[tokio::test]
    async fn mjpeg_disabled() {
        let mut settings = ServerSettings::default();
        settings.mjpeg.enabled = false;
        let harness = start(settings);
        let response = reqwest::get(harness.url("mjpeg")).await.unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
        harness.cancel.cancel();
    }

    #[test]
    fn report_serializes_nulls() {
        let json = serde_json::to_string(&StateReport::default()).unwrap();
        assert_eq!(
            json,
            r#"{"lowest":null,"highest":null,"average":null,"motion":false}"#
        );
    }
}
