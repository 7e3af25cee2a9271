use crate::events::{EventSink, MonitorEvent};
use log::{debug, info, warn};

/// Writes every session event to the `log` facade.
pub struct LogSink;

impl LogSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for LogSink {
    fn notify(&self, event: &MonitorEvent) {
        match event {
            MonitorEvent::Status(status) => debug!(
                "status label={} confidence={} alarm={} accumulator={:.1}",
                status.label.as_deref().unwrap_or("-"),
                status.confidence_text,
                status.alarm_active,
                status.fatigue_accumulator
            ),
            MonitorEvent::AlarmRaised {
                fatigue_accumulator,
            } => warn!("fatigue alarm raised at accumulator {:.1}", fatigue_accumulator),
            MonitorEvent::AlarmDismissed => info!("fatigue alarm dismissed"),
            MonitorEvent::CommandSent { command } => info!("command {} delivered", command),
            MonitorEvent::CommandFailed { command, reason } => {
                warn!("command {} not delivered: {}", command, reason)
            }
            MonitorEvent::DecodeFailed { line, reason } => {
                warn!("dropping line {:?}: {}", line, reason)
            }
            MonitorEvent::StreamLocator { locator } => info!("stream locator {}", locator),
            MonitorEvent::StreamStarted { locator } => info!("playing {}", locator),
            MonitorEvent::StreamStopped => info!("playback stopped"),
        }
    }
}
