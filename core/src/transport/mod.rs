pub mod channel;
pub mod device;
pub mod line_buffer;

pub use channel::{ChannelState, LineTransport};
pub use device::{MemoryDevice, SerialDevice};
pub use line_buffer::LineBuffer;
