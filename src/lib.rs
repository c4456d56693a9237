pub mod checksum;
pub mod codec;
pub mod config;
pub mod daemon;
pub mod error;
pub mod identity;
pub mod logging;
pub mod packet;
pub mod transport;

pub use transport::LinkTransport;
#[cfg(target_os = "linux")]
pub use transport::RawTransport;
pub use codec::{LinkFrame, SadpFrame, EthernetHeader, MacAddr, PacketType, QueryType, DecodeMode};

pub use daemon::{CaptureDaemon, DaemonState, StopHandle, PacketListener, PacketEvent};
pub use packet::{FrameCounter, PacketBuilder};
pub use identity::NetworkIdentity;
pub use error::{SadpError, Result};
