use fatiguecore::alarm::StatusSnapshot;
use fatiguecore::events::MonitorEvent;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

pub const HISTORY_LIMIT: usize = 50;

/// Everything the HTTP bridge serves to a display client.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VisualizationModel {
    pub status: StatusSnapshot,
    pub history: VecDeque<MonitorEvent>,
}

impl VisualizationModel {
    pub fn apply(&mut self, event: &MonitorEvent) {
        match event {
            MonitorEvent::Status(status) => self.status = status.clone(),
            other => {
                if self.history.len() == HISTORY_LIMIT {
                    self.history.pop_front();
                }
                self.history.push_back(other.clone());
            }
        }
    }
}
