//! Outbound frame construction.

pub mod counter;
pub mod builder;

pub use counter::FrameCounter;
pub use builder::{PacketBuilder, send_inquiry};
