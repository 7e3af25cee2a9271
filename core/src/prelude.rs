use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Ordered category list; index 0 is the fatigue-indicating class.
pub const DEFAULT_CATEGORIES: [&str; 2] = ["Close", "Open"];

/// What to do with a record whose label matches no known category.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum UnknownLabelPolicy {
    /// Treat like an alert record and reset the accumulator.
    #[default]
    Reset,
    /// Leave the accumulator untouched.
    Ignore,
}

/// Handling of confidence values outside `[0, 1]`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConfidencePolicy {
    #[default]
    Clamp,
    PassThrough,
}

/// Shared configuration for the decoder and alarm state machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlarmConfig {
    pub categories: Vec<String>,
    pub fatigue_threshold: f64,
    pub fatigue_increment: f64,
    pub unknown_label_policy: UnknownLabelPolicy,
    pub confidence_policy: ConfidencePolicy,
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            categories: DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect(),
            fatigue_threshold: 5.0,
            fatigue_increment: 0.1,
            unknown_label_policy: UnknownLabelPolicy::Reset,
            confidence_policy: ConfidencePolicy::Clamp,
        }
    }
}

/// Timing parameters of the line transport.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub address: String,
    pub baud_rate: u32,
    pub settle_delay: Duration,
    pub connect_timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            address: "/dev/ttyUSB0".into(),
            baud_rate: 115_200,
            settle_delay: Duration::from_secs(2),
            connect_timeout: Duration::from_secs(5),
            poll_interval: Duration::from_millis(100),
        }
    }
}

/// Failure to bring up the serial channel.
#[derive(thiserror::Error, Debug)]
pub enum ConnectError {
    #[error("cannot open {address} at {baud_rate} baud: {reason}")]
    Open {
        address: String,
        baud_rate: u32,
        reason: String,
    },
    #[error("opening {address} did not complete within {timeout:?}")]
    Timeout { address: String, timeout: Duration },
}

/// A line that could not be turned into a detection record.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("empty line")]
    Empty,
    #[error("unrecognized message shape")]
    UnrecognizedShape,
    #[error("malformed structured record: {0}")]
    Structured(String),
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("missing `{0}` segment")]
    MissingSegment(&'static str),
    #[error("invalid confidence `{0}`")]
    InvalidConfidence(String),
}

/// Failure to deliver an outbound command.
#[derive(thiserror::Error, Debug)]
pub enum SendError {
    #[error("channel is not open")]
    SendOnClosedChannel,
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure of the external playback collaborator.
#[derive(thiserror::Error, Debug)]
pub enum VideoError {
    #[error("no stream locator received yet")]
    NoLocator,
    #[error("failed to launch player: {0}")]
    Launch(#[from] std::io::Error),
}

pub type DecodeResult<T> = Result<T, DecodeError>;

/// Commands understood by the remote device.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AlarmCommand {
    AlarmOn,
    AlarmOff,
    AlarmToggle,
}

impl AlarmCommand {
    pub fn as_wire(&self) -> &'static str {
        match self {
            AlarmCommand::AlarmOn => "ALARM_ON",
            AlarmCommand::AlarmOff => "ALARM_OFF",
            AlarmCommand::AlarmToggle => "ALARM_TOGGLE",
        }
    }
}

impl std::fmt::Display for AlarmCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// Outbound side of the transport as seen by the consumer session.
pub trait CommandSink: Send + Sync {
    fn send_command(&self, command: AlarmCommand) -> Result<(), SendError>;

    /// Whether commands can currently reach the device.
    fn is_connected(&self) -> bool {
        true
    }
}

/// Sink standing in for a transport that never connected.
pub struct Disconnected;

impl CommandSink for Disconnected {
    fn send_command(&self, _command: AlarmCommand) -> Result<(), SendError> {
        Err(SendError::SendOnClosedChannel)
    }

    fn is_connected(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_use_wire_names() {
        assert_eq!(AlarmCommand::AlarmOn.to_string(), "ALARM_ON");
        assert_eq!(AlarmCommand::AlarmOff.as_wire(), "ALARM_OFF");
        assert_eq!(AlarmCommand::AlarmToggle.as_wire(), "ALARM_TOGGLE");
    }

    #[test]
    fn disconnected_sink_reports_closed_channel() {
        let err = Disconnected.send_command(AlarmCommand::AlarmOn).unwrap_err();
        assert!(matches!(err, SendError::SendOnClosedChannel));
        assert!(!Disconnected.is_connected());
    }

    #[test]
    fn policies_deserialize_from_snake_case() {
        let policy: UnknownLabelPolicy = serde_json::from_str("\"ignore\"").unwrap();
        assert_eq!(policy, UnknownLabelPolicy::Ignore);
        let policy: ConfidencePolicy = serde_json::from_str("\"pass_through\"").unwrap();
        assert_eq!(policy, ConfidencePolicy::PassThrough);
    }
}
