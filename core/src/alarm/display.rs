use crate::protocol::DetectionRecord;
use serde::{Deserialize, Serialize};

/// Fields shown to the operator.
#[derive(Debug, Clone, Default)]
pub struct DisplayState {
    pub label: Option<String>,
    pub confidence: f64,
    stream_locator: Option<String>,
}

impl DisplayState {
    /// Updates label and confidence; returns the locator if this record set it.
    pub fn apply(&mut self, record: &DetectionRecord) -> Option<String> {
        self.label = Some(record.label.clone());
        self.confidence = record.confidence;

        // The first locator reported wins for the rest of the session.
        match (&self.stream_locator, &record.stream_locator) {
            (None, Some(locator)) => {
                self.stream_locator = Some(locator.clone());
                Some(locator.clone())
            }
            _ => None,
        }
    }

    pub fn stream_locator(&self) -> Option<&str> {
        self.stream_locator.as_deref()
    }
}

/// Notification payload for the UI on every state change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct StatusSnapshot {
    pub label: Option<String>,
    pub confidence: f64,
    pub confidence_text: String,
    pub alarm_active: bool,
    pub stream_locator: Option<String>,
    pub fatigue_accumulator: f64,
    pub connected: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Category;

    #[test]
    fn locator_is_sticky() {
        let mut display = DisplayState::default();
        let first = DetectionRecord::new("Open", 0.5, Some("rtsp://a".into()), Category::Alert);
        let second = DetectionRecord::new("Open", 0.6, Some("rtsp://b".into()), Category::Alert);
        assert_eq!(display.apply(&first).as_deref(), Some("rtsp://a"));
        assert_eq!(display.apply(&second), None);
        assert_eq!(display.stream_locator(), Some("rtsp://a"));
        assert_eq!(display.confidence, 0.6);
    }
}
