use crate::events::{EventSink, MonitorEvent};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Counters derived from the session's event stream.
pub struct MetricsRecorder {
    inner: Mutex<Metrics>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Metrics {
    pub lines_received: usize,
    pub decode_errors: usize,
    pub commands_sent: usize,
    pub command_failures: usize,
    pub alarms_raised: usize,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Metrics::default()),
        }
    }

    pub fn record_line(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.lines_received += 1;
        }
    }

    pub fn snapshot(&self) -> Metrics {
        if let Ok(metrics) = self.inner.lock() {
            *metrics
        } else {
            Metrics::default()
        }
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for MetricsRecorder {
    fn notify(&self, event: &MonitorEvent) {
        let Ok(mut metrics) = self.inner.lock() else {
            return;
        };
        match event {
            MonitorEvent::DecodeFailed { .. } => metrics.decode_errors += 1,
            MonitorEvent::CommandSent { .. } => metrics.commands_sent += 1,
            MonitorEvent::CommandFailed { .. } => metrics.command_failures += 1,
            MonitorEvent::AlarmRaised { .. } => metrics.alarms_raised += 1,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::AlarmCommand;

    #[test]
    fn counts_events_by_kind() {
        let recorder = MetricsRecorder::new();
        recorder.record_line();
        recorder.notify(&MonitorEvent::CommandSent {
            command: AlarmCommand::AlarmOn,
        });
        recorder.notify(&MonitorEvent::DecodeFailed {
            line: "x".into(),
            reason: "bad".into(),
        });
        recorder.notify(&MonitorEvent::AlarmDismissed);

        let metrics = recorder.snapshot();
        assert_eq!(metrics.lines_received, 1);
        assert_eq!(metrics.commands_sent, 1);
        assert_eq!(metrics.decode_errors, 1);
        assert_eq!(metrics.alarms_raised, 0);
    }
}
