use crate::identity::NetworkIdentity;
use std::io::Result;

/// Receive buffer size every link transport must accommodate.
pub const RECEIVE_BUFFER_SIZE: usize = 8192;

/// Trait representing a raw link-layer channel bound to one interface.
/// Object-safe so the daemon can run over a packet socket or a test double.
pub trait LinkTransport: Send + Sync {
    /// Put one complete Ethernet frame on the wire.
    fn send(&self, data: &[u8]) -> Result<usize>;

    /// Block until one frame arrives and copy it into `buffer`.
    /// No timeout; returns the frame length.
    fn receive(&self, buffer: &mut [u8]) -> Result<usize>;

    /// Addresses of the interface this channel is bound to.
    fn identity(&self) -> &NetworkIdentity;
}
