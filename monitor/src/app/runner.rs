use crate::app::config::MonitorConfig;
use crate::generator::device::{SimulatedDevice, SimulatorConfig};
use crate::gui_bridge::bridge::GuiBridge;
use anyhow::Context;
use fatiguecore::alarm::StatusSnapshot;
use fatiguecore::events::{EventFanout, EventSink};
use fatiguecore::prelude::{CommandSink, Disconnected};
use fatiguecore::session::MonitorSession;
use fatiguecore::telemetry::{LogSink, Metrics, MetricsRecorder};
use fatiguecore::transport::LineTransport;
use fatiguecore::video::{ExternalPlayer, NullSurface, VideoSurface};
use log::{error, info};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

/// Where detection lines come from.
#[derive(Debug, Clone)]
pub enum DeviceSource {
    Serial,
    Simulated(SimulatorConfig),
}

pub struct RunSummary {
    pub metrics: Metrics,
    pub final_status: StatusSnapshot,
}

#[derive(Clone)]
pub struct Runner {
    config: MonitorConfig,
}

async fn wait_for_stop(mut stop: watch::Receiver<bool>) {
    while !*stop.borrow() {
        if stop.changed().await.is_err() {
            break;
        }
    }
}

impl Runner {
    pub fn new(config: MonitorConfig) -> Self {
        Self { config }
    }

    /// Wires transport, session, and HTTP bridge together and runs them until
    /// `shutdown` resolves. The serial channel is released before returning.
    pub async fn run<S>(&self, source: DeviceSource, shutdown: S) -> anyhow::Result<RunSummary>
    where
        S: Future<Output = ()>,
    {
        let transport = self.connect(source).await;
        let metrics = Arc::new(MetricsRecorder::new());
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let (line_tx, line_rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = watch::channel(false);

        let bridge = GuiBridge::new(control_tx, metrics.clone());
        let events: Arc<dyn EventSink> = Arc::new(
            EventFanout::new()
                .with(LogSink::new())
                .with(bridge.sink()),
        );

        let commands: Arc<dyn CommandSink> = match &transport {
            Some(transport) => {
                transport
                    .spawn_reader(move |line| {
                        // The session only goes away at shutdown; late lines are dropped.
                        let _ = line_tx.send(line);
                    })
                    .context("starting serial reader thread")?;
                transport.clone()
            }
            None => {
                drop(line_tx);
                bridge.publish_status("serial link unavailable; alarm commands disabled");
                Arc::new(Disconnected)
            }
        };

        let video: Box<dyn VideoSurface> = match &self.config.player {
            Some(player) => Box::new(ExternalPlayer::new(player.clone())),
            None => Box::new(NullSurface::default()),
        };

        let session = MonitorSession::new(&self.config.to_alarm_config(), commands, events)
            .with_metrics(metrics.clone())
            .with_video(video, self.config.autoplay)
            .with_connected(transport.is_some());

        let bind = self.config.bind;
        let bridge_stop = stop_rx.clone();
        let bridge_task = tokio::spawn(async move {
            bridge.serve(bind, wait_for_stop(bridge_stop)).await;
        });
        let session_task = tokio::spawn(session.run(line_rx, control_rx, wait_for_stop(stop_rx)));

        shutdown.await;
        info!("shutting down");
        let _ = stop_tx.send(true);

        let session = session_task.await.context("joining monitor session")?;
        if let Some(transport) = transport {
            tokio::task::spawn_blocking(move || transport.close())
                .await
                .context("closing serial channel")?;
        }
        bridge_task.await.context("joining HTTP bridge")?;

        Ok(RunSummary {
            metrics: metrics.snapshot(),
            final_status: session.snapshot(),
        })
    }

    async fn connect(&self, source: DeviceSource) -> Option<Arc<LineTransport>> {
        let transport_config = self.config.to_transport_config();
        match source {
            DeviceSource::Simulated(simulator) => {
                info!("using simulated device");
                Some(Arc::new(LineTransport::with_device(
                    "simulator",
                    Box::new(SimulatedDevice::new(simulator)),
                    transport_config.poll_interval,
                )))
            }
            DeviceSource::Serial => {
                let opened =
                    tokio::task::spawn_blocking(move || LineTransport::open(&transport_config))
                        .await;
                match opened {
                    Ok(Ok(transport)) => Some(Arc::new(transport)),
                    Ok(Err(err)) => {
                        error!("serial link unavailable: {}", err);
                        None
                    }
                    Err(err) => {
                        error!("serial open task failed: {}", err);
                        None
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use std::time::Duration;

    fn fast_config() -> MonitorConfig {
        MonitorConfig {
            poll_interval_ms: 1,
            bind: SocketAddr::from(([127, 0, 0, 1], 0)),
            ..Default::default()
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn runner_raises_alarm_from_simulated_device() {
        let runner = Runner::new(fast_config());
        let simulator = SimulatorConfig {
            interval_ms: 1,
            noise: 0.0,
            ..Default::default()
        };

        let summary = runner
            .run(
                DeviceSource::Simulated(simulator),
                tokio::time::sleep(Duration::from_millis(1500)),
            )
            .await
            .unwrap();

        assert!(summary.metrics.lines_received >= 50);
        assert!(summary.metrics.alarms_raised >= 1);
        assert_eq!(summary.metrics.decode_errors, 0);
        assert!(summary.final_status.connected);
        assert!(summary.final_status.stream_locator.is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn runner_survives_missing_serial_port() {
        let config = MonitorConfig {
            port: "/dev/does-not-exist-fatigue".into(),
            ..fast_config()
        };
        let summary = Runner::new(config)
            .run(
                DeviceSource::Serial,
                tokio::time::sleep(Duration::from_millis(50)),
            )
            .await
            .unwrap();

        assert!(!summary.final_status.connected);
        assert_eq!(summary.metrics.lines_received, 0);
    }
}
