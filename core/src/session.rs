use crate::alarm::{AlarmMachine, StatusSnapshot};
use crate::events::{EventSink, MonitorEvent};
use crate::prelude::{AlarmCommand, AlarmConfig, CommandSink, VideoError};
use crate::protocol::LineDecoder;
use crate::telemetry::MetricsRecorder;
use crate::video::{NullSurface, VideoSurface};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

/// Operator requests forwarded from the UI.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ControlRequest {
    DismissAlert,
    ToggleState,
    StartStream,
    StopStream,
}

/// Consumer side of the monitor: sole owner of the alarm state.
pub struct MonitorSession {
    decoder: LineDecoder,
    machine: AlarmMachine,
    commands: Arc<dyn CommandSink>,
    events: Arc<dyn EventSink>,
    metrics: Arc<MetricsRecorder>,
    video: Box<dyn VideoSurface>,
    autoplay: bool,
    connected: bool,
}

impl MonitorSession {
    pub fn new(
        config: &AlarmConfig,
        commands: Arc<dyn CommandSink>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            decoder: LineDecoder::new(config),
            machine: AlarmMachine::new(config),
            commands,
            events,
            metrics: Arc::new(MetricsRecorder::new()),
            video: Box::new(NullSurface::default()),
            autoplay: false,
            connected: true,
        }
    }

    pub fn with_video(mut self, video: Box<dyn VideoSurface>, autoplay: bool) -> Self {
        self.video = video;
        self.autoplay = autoplay;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsRecorder>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Marks whether the transport came up; a sink that later loses its
    /// device also reports disconnected.
    pub fn with_connected(mut self, connected: bool) -> Self {
        self.connected = connected;
        self
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        self.machine
            .snapshot(self.connected && self.commands.is_connected())
    }

    pub fn machine(&self) -> &AlarmMachine {
        &self.machine
    }

    pub fn metrics(&self) -> Arc<MetricsRecorder> {
        self.metrics.clone()
    }

    pub fn handle_line(&mut self, line: &str) {
        self.metrics.record_line();
        let record = match self.decoder.decode(line) {
            Ok(record) => record,
            Err(err) => {
                self.emit(MonitorEvent::DecodeFailed {
                    line: line.to_string(),
                    reason: err.to_string(),
                });
                return;
            }
        };

        let outcome = self.machine.on_record(&record);
        if let Some(locator) = outcome.new_locator.clone() {
            self.emit(MonitorEvent::StreamLocator { locator });
            if self.autoplay {
                self.start_stream();
            }
        }
        if outcome.raised() {
            self.emit(MonitorEvent::AlarmRaised {
                fatigue_accumulator: self.machine.state().fatigue_accumulator(),
            });
        }
        if let Some(command) = outcome.command {
            self.dispatch(command);
        }
        self.emit_status();
    }

    pub fn handle_control(&mut self, request: ControlRequest) {
        match request {
            ControlRequest::DismissAlert => {
                let command = self.machine.dismiss_alert();
                self.emit(MonitorEvent::AlarmDismissed);
                self.dispatch(command);
                self.emit_status();
            }
            ControlRequest::ToggleState => {
                let command = self.machine.toggle_state();
                self.dispatch(command);
            }
            ControlRequest::StartStream => self.start_stream(),
            ControlRequest::StopStream => {
                self.video.stop();
                self.emit(MonitorEvent::StreamStopped);
            }
        }
    }

    /// Processes lines and control requests until `shutdown` resolves, then
    /// stops playback.
    pub async fn run<S>(
        mut self,
        mut lines: UnboundedReceiver<String>,
        mut controls: UnboundedReceiver<ControlRequest>,
        shutdown: S,
    ) -> Self
    where
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut lines_open = true;
        self.emit_status();

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                line = lines.recv(), if lines_open => match line {
                    Some(line) => self.handle_line(&line),
                    None => {
                        info!("line source closed");
                        lines_open = false;
                    }
                },
                Some(request) = controls.recv() => self.handle_control(request),
                else => break,
            }
        }

        self.video.stop();
        self
    }

    fn start_stream(&mut self) {
        let Some(locator) = self.machine.stream_locator().map(str::to_string) else {
            warn!("cannot start stream: {}", VideoError::NoLocator);
            return;
        };
        match self.video.load_and_play(&locator) {
            Ok(()) => self.emit(MonitorEvent::StreamStarted { locator }),
            Err(err) => warn!("cannot start stream {}: {}", locator, err),
        }
    }

    fn dispatch(&self, command: AlarmCommand) {
        match self.commands.send_command(command) {
            Ok(()) => self.emit(MonitorEvent::CommandSent { command }),
            Err(err) => self.emit(MonitorEvent::CommandFailed {
                command,
                reason: err.to_string(),
            }),
        }
    }

    fn emit_status(&self) {
        self.emit(MonitorEvent::Status(self.snapshot()));
    }

    fn emit(&self, event: MonitorEvent) {
        self.metrics.notify(&event);
        self.events.notify(&event);
    }
}
