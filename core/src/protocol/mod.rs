pub mod decoder;
pub mod message;
pub mod record;

pub use decoder::LineDecoder;
pub use message::{DetectionMessage, PrefixedMessage, StructuredMessage};
pub use record::{Category, CategoryMap, DetectionRecord};
