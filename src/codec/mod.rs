//! # SADP Codec Module
//!
//! Encoding and decoding of SADP frames as they appear on the wire.
//!
//! ## Key Types
//!
//! - [`EthernetHeader`] - 14-byte link header (ethertype 0x8033)
//! - [`SadpFrame`] - fixed 38-byte body plus payload
//! - [`LinkFrame`] - header and frame together, the unit handed to a transport
//! - [`QueryType`] / [`PacketType`] - typed views of the raw code bytes
//!
//! ## Example
//!
//! ```ignore
//! use sadp_link::codec::{LinkFrame, DecodeMode};
//!
//! let bytes = frame.encode();
//! let decoded = LinkFrame::decode(&bytes, DecodeMode::Lenient)?;
//! ```

pub mod header;
pub mod frame;

pub use header::*;
pub use frame::*;

use crate::error::{Result, SadpError};


/// Complete on-wire unit: link header followed by the SADP frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkFrame {
    pub header: EthernetHeader,
    pub frame: SadpFrame,
}

impl LinkFrame {
    /// Bytes put on the wire, never fewer than [`MIN_FRAME_LENGTH`].
    pub fn size(&self) -> usize {
        frame_size(self.frame.payload.len())
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.size());
        out.extend_from_slice(&self.header.serialize());
        out.extend_from_slice(&self.frame.serialize());
        out
    }

    /// Decode a captured buffer already known to carry ethertype 0x8033.
    pub fn decode(buffer: &[u8], mode: DecodeMode) -> Result<Self> {
        if buffer.len() < MIN_FRAME_LENGTH {
            return Err(SadpError::MalformedFrame {
                len: buffer.len(),
                minimum: MIN_FRAME_LENGTH,
            });
        }
        let header = EthernetHeader::deserialize(buffer)?;
        let frame = SadpFrame::deserialize(&buffer[EthernetHeader::LENGTH..], mode)?;
        Ok(LinkFrame { header, frame })
    }
}
