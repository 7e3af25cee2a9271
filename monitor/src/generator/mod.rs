pub mod device;
pub mod lines;
