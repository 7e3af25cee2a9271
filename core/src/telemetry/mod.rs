pub mod log;
pub mod metrics;

pub use log::LogSink;
pub use metrics::{Metrics, MetricsRecorder};
