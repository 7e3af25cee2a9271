use crate::gui_bridge::model::VisualizationModel;
use fatiguecore::events::{EventSink, MonitorEvent};
use fatiguecore::session::ControlRequest;
use fatiguecore::telemetry::MetricsRecorder;
use log::{info, warn};
use serde_json::json;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::mpsc::UnboundedSender;
use warp::{http::StatusCode, Filter};

type SharedModel = Arc<RwLock<VisualizationModel>>;

fn read_model(state: &SharedModel) -> RwLockReadGuard<'_, VisualizationModel> {
    match state.read() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn write_model(state: &SharedModel) -> RwLockWriteGuard<'_, VisualizationModel> {
    match state.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Event sink that mirrors session events into the bridge model.
pub struct BridgeSink {
    state: SharedModel,
}

impl EventSink for BridgeSink {
    fn notify(&self, event: &MonitorEvent) {
        write_model(&self.state).apply(event);
    }
}

/// HTTP face of the UI event sink: status out, operator controls in.
pub struct GuiBridge {
    state: SharedModel,
    controls: UnboundedSender<ControlRequest>,
    metrics: Arc<MetricsRecorder>,
}

impl GuiBridge {
    pub fn new(controls: UnboundedSender<ControlRequest>, metrics: Arc<MetricsRecorder>) -> Self {
        Self {
            state: Arc::new(RwLock::new(VisualizationModel::default())),
            controls,
            metrics,
        }
    }

    pub fn sink(&self) -> BridgeSink {
        BridgeSink {
            state: self.state.clone(),
        }
    }

    pub fn routes(
        &self,
    ) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone + Send + Sync + 'static
    {
        let state = self.state.clone();
        let state_filter = warp::any().map(move || state.clone());
        let metrics = self.metrics.clone();
        let metrics_filter = warp::any().map(move || metrics.clone());
        let controls = self.controls.clone();
        let controls_filter = warp::any().map(move || controls.clone());

        let status_route = warp::path!("status")
            .and(warp::get())
            .and(state_filter.clone())
            .map(|state: SharedModel| warp::reply::json(&read_model(&state).status));

        let history_route = warp::path!("history")
            .and(warp::get())
            .and(state_filter)
            .map(|state: SharedModel| warp::reply::json(&read_model(&state).history));

        let metrics_route = warp::path!("metrics")
            .and(warp::get())
            .and(metrics_filter)
            .map(|metrics: Arc<MetricsRecorder>| warp::reply::json(&metrics.snapshot()));

        let request = warp::path!("dismiss")
            .map(|| ControlRequest::DismissAlert)
            .or(warp::path!("toggle").map(|| ControlRequest::ToggleState))
            .unify()
            .or(warp::path!("stream" / "start").map(|| ControlRequest::StartStream))
            .unify()
            .or(warp::path!("stream" / "stop").map(|| ControlRequest::StopStream))
            .unify();

        let control_route = warp::post().and(request).and(controls_filter).map(
            |request: ControlRequest, controls: UnboundedSender<ControlRequest>| {
                match controls.send(request) {
                    Ok(()) => warp::reply::with_status(
                        warp::reply::json(&json!({"status": "accepted", "request": request})),
                        StatusCode::ACCEPTED,
                    ),
                    Err(_) => {
                        warn!("control {:?} dropped: session stopped", request);
                        warp::reply::with_status(
                            warp::reply::json(&json!({"status": "unavailable"})),
                            StatusCode::SERVICE_UNAVAILABLE,
                        )
                    }
                }
            },
        );

        status_route
            .or(history_route)
            .or(metrics_route)
            .or(control_route)
    }

    /// Serves the bridge until `shutdown` resolves.
    pub async fn serve<S>(&self, addr: SocketAddr, shutdown: S)
    where
        S: Future<Output = ()> + Send + 'static,
    {
        let routes = self.routes();
        match warp::serve(routes).try_bind_with_graceful_shutdown(addr, shutdown) {
            Ok((bound, server)) => {
                self.publish_status(&format!("HTTP bridge listening on {}", bound));
                server.await;
            }
            Err(err) => warn!("HTTP bridge disabled, cannot bind {}: {}", addr, err),
        }
    }

    pub fn publish_status(&self, message: &str) {
        info!("[GUI] {}", message);
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> VisualizationModel {
        read_model(&self.state).clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fatiguecore::alarm::StatusSnapshot;
    use fatiguecore::prelude::AlarmCommand;
    use tokio::sync::mpsc::unbounded_channel;

    fn bridge() -> (
        GuiBridge,
        tokio::sync::mpsc::UnboundedReceiver<ControlRequest>,
    ) {
        let (tx, rx) = unbounded_channel();
        (GuiBridge::new(tx, Arc::new(MetricsRecorder::new())), rx)
    }

    #[test]
    fn gui_bridge_updates_state() {
        let (gui, _rx) = bridge();
        gui.sink().notify(&MonitorEvent::Status(StatusSnapshot {
            label: Some("Close".into()),
            alarm_active: true,
            ..Default::default()
        }));
        gui.sink().notify(&MonitorEvent::CommandSent {
            command: AlarmCommand::AlarmOn,
        });
        let model = gui.snapshot();
        assert!(model.status.alarm_active);
        assert_eq!(model.history.len(), 1);
    }

    #[tokio::test]
    async fn status_route_serves_latest_snapshot() {
        let (gui, _rx) = bridge();
        gui.sink().notify(&MonitorEvent::Status(StatusSnapshot {
            label: Some("Open".into()),
            confidence_text: "0.50".into(),
            stream_locator: Some("rtsp://cam1".into()),
            ..Default::default()
        }));

        let response = warp::test::request()
            .method("GET")
            .path("/status")
            .reply(&gui.routes())
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let status: StatusSnapshot = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(status.label.as_deref(), Some("Open"));
        assert_eq!(status.stream_locator.as_deref(), Some("rtsp://cam1"));
    }

    #[tokio::test]
    async fn control_routes_forward_requests() {
        let (gui, mut rx) = bridge();
        let routes = gui.routes();
        for (path, expected) in [
            ("/dismiss", ControlRequest::DismissAlert),
            ("/toggle", ControlRequest::ToggleState),
            ("/stream/start", ControlRequest::StartStream),
            ("/stream/stop", ControlRequest::StopStream),
        ] {
            let response = warp::test::request()
                .method("POST")
                .path(path)
                .reply(&routes)
                .await;
            assert_eq!(response.status(), StatusCode::ACCEPTED);
            assert_eq!(rx.recv().await, Some(expected));
        }
    }

    #[tokio::test]
    async fn control_route_reports_stopped_session() {
        let (gui, rx) = bridge();
        drop(rx);
        let response = warp::test::request()
            .method("POST")
            .path("/dismiss")
            .reply(&gui.routes())
            .await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn get_on_control_path_is_rejected() {
        let (gui, _rx) = bridge();
        let response = warp::test::request()
            .method("GET")
            .path("/dismiss")
            .reply(&gui.routes())
            .await;
        assert_ne!(response.status(), StatusCode::ACCEPTED);
    }
}
