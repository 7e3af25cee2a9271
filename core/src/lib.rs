//! Core of the driver-fatigue monitor.
//!
//! A background reader pulls newline-framed status lines off the serial link,
//! the decoder turns them into detection records, and the alarm state machine
//! decides when to raise `ALARM_ON` and when the operator has cleared it.

pub mod alarm;
pub mod events;
pub mod prelude;
pub mod protocol;
pub mod session;
pub mod telemetry;
pub mod transport;
pub mod video;

pub use events::{EventSink, MonitorEvent};
pub use prelude::{AlarmCommand, AlarmConfig, CommandSink, TransportConfig};
pub use session::{ControlRequest, MonitorSession};
