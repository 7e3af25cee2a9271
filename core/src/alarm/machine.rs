use crate::alarm::display::{DisplayState, StatusSnapshot};
use crate::alarm::state::{AlarmPhase, AlarmState};
use crate::prelude::{AlarmCommand, AlarmConfig, UnknownLabelPolicy};
use crate::protocol::{Category, DetectionRecord};

/// Result of feeding one record to the machine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordOutcome {
    /// Command to forward to the device, set only on the Idle -> Active edge.
    pub command: Option<AlarmCommand>,
    /// Locator assigned by this record, if it was the first to carry one.
    pub new_locator: Option<String>,
}

impl RecordOutcome {
    pub fn raised(&self) -> bool {
        self.command == Some(AlarmCommand::AlarmOn)
    }
}

/// Idle/Active alarm driven by decoded detections and operator controls.
pub struct AlarmMachine {
    state: AlarmState,
    display: DisplayState,
    unknown_policy: UnknownLabelPolicy,
}

impl AlarmMachine {
    pub fn new(config: &AlarmConfig) -> Self {
        Self {
            state: AlarmState::new(config.fatigue_threshold, config.fatigue_increment),
            display: DisplayState::default(),
            unknown_policy: config.unknown_label_policy,
        }
    }

    pub fn on_record(&mut self, record: &DetectionRecord) -> RecordOutcome {
        let new_locator = self.display.apply(record);

        let command = match (record.category, self.unknown_policy) {
            (Category::Fatigue, _) => self.state.accumulate().then_some(AlarmCommand::AlarmOn),
            (Category::Unknown, UnknownLabelPolicy::Ignore) => None,
            _ => {
                self.state.reset_accumulator();
                None
            }
        };

        RecordOutcome {
            command,
            new_locator,
        }
    }

    /// Clears the alarm. Always yields `ALARM_OFF`, even when already idle.
    pub fn dismiss_alert(&mut self) -> AlarmCommand {
        self.state.clear();
        AlarmCommand::AlarmOff
    }

    /// Advisory to the device only; local state is untouched.
    pub fn toggle_state(&self) -> AlarmCommand {
        AlarmCommand::AlarmToggle
    }

    pub fn phase(&self) -> AlarmPhase {
        self.state.phase()
    }

    pub fn state(&self) -> &AlarmState {
        &self.state
    }

    pub fn stream_locator(&self) -> Option<&str> {
        self.display.stream_locator()
    }

    pub fn snapshot(&self, connected: bool) -> StatusSnapshot {
        StatusSnapshot {
            label: self.display.label.clone(),
            confidence: self.display.confidence,
            confidence_text: format!("{:.2}", self.display.confidence),
            alarm_active: self.state.is_active(),
            stream_locator: self.display.stream_locator().map(str::to_string),
            fatigue_accumulator: self.state.fatigue_accumulator(),
            connected,
        }
    }
}
