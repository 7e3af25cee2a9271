use crate::alarm::StatusSnapshot;
use crate::prelude::AlarmCommand;
use serde::{Deserialize, Serialize};

/// Notifications emitted by the consumer session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MonitorEvent {
    /// Display fields changed; emitted after every record and control request.
    Status(StatusSnapshot),
    AlarmRaised { fatigue_accumulator: f64 },
    AlarmDismissed,
    CommandSent { command: AlarmCommand },
    CommandFailed { command: AlarmCommand, reason: String },
    DecodeFailed { line: String, reason: String },
    StreamLocator { locator: String },
    StreamStarted { locator: String },
    StreamStopped,
}

/// Receiver of session notifications (display, log, HTTP bridge).
pub trait EventSink: Send + Sync {
    fn notify(&self, event: &MonitorEvent);
}

impl<T: EventSink + ?Sized> EventSink for std::sync::Arc<T> {
    fn notify(&self, event: &MonitorEvent) {
        (**self).notify(event);
    }
}

/// Fans one event out to several sinks.
#[derive(Default)]
pub struct EventFanout {
    sinks: Vec<Box<dyn EventSink>>,
}

impl EventFanout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: impl EventSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }
}

impl EventSink for EventFanout {
    fn notify(&self, event: &MonitorEvent) {
        for sink in &self.sinks {
            sink.notify(event);
        }
    }
}
