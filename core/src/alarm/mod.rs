pub mod display;
pub mod machine;
pub mod state;

pub use display::{DisplayState, StatusSnapshot};
pub use machine::{AlarmMachine, RecordOutcome};
pub use state::{AlarmPhase, AlarmState};
