use super::header::{EthernetHeader, MacAddr};
use crate::checksum::{checksum, words_le};
use crate::error::{Result, SadpError};
use std::convert::TryInto;
use std::fmt;
use std::net::Ipv4Addr;

/// First byte of every SADP frame.
pub const SADP_PREFIX: u8 = 0x21;
/// Marker value as held in memory; see [`SadpFrame::serialize`] for its wire order.
pub const SADP_MARKER: u16 = 0x0406;
/// Client type of discovery tools.
pub const CLIENT_TYPE_CLIENT: u16 = 0x4201;
/// Client type of devices.
pub const CLIENT_TYPE_SERVER: u16 = 0xF601;

/// Fixed part of the SADP frame, before the payload.
pub const FRAME_BODY_LENGTH: usize = 38;
/// Smallest frame put on the wire, link header included.
pub const MIN_FRAME_LENGTH: usize = 80;
/// Size of the zeroed scratch buffer the checksum is computed over (512 minus the link header).
pub const CHECKSUM_SCRATCH_LENGTH: usize = 512 - EthernetHeader::LENGTH;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PacketType {
    Response = 0x01,
    Request = 0x02,
    Unknown = 0xFF,
}

impl From<u8> for PacketType {
    fn from(v: u8) -> Self {
        match v {
            0x01 => PacketType::Response,
            0x02 => PacketType::Request,
            _ => PacketType::Unknown,
        }
    }
}

impl From<PacketType> for u8 {
    fn from(pt: PacketType) -> u8 {
        pt as u8
    }
}

/// Query codes carried by requests. Device responses use the code plus one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum QueryType {
    DeviceOnlineRequest = 0x02,
    /// Broadcast device location query
    Inquiry = 0x03,
    UpdateIP = 0x06,
    ResetPassword = 0x0A,
    CMSInfo = 0x0C,
    ModifyNetParam = 0x10,
    Unknown = 0xFF,
}

impl QueryType {
    /// Resolve a raw query byte, undoing the +1 offset of responses.
    pub fn resolve(raw: u8, packet_type: PacketType) -> Self {
        let code = match packet_type {
            PacketType::Response => raw.wrapping_sub(1),
            _ => raw,
        };
        QueryType::from(code)
    }

    pub fn label(&self) -> &'static str {
        match self {
            QueryType::DeviceOnlineRequest => "DeviceOnlineRequest",
            QueryType::Inquiry => "Inquiry",
            QueryType::UpdateIP => "UpdateIP",
            QueryType::ResetPassword => "ResetPassword",
            QueryType::CMSInfo => "CMSInfo",
            QueryType::ModifyNetParam => "ModifyNetParam",
            QueryType::Unknown => "Unknown",
        }
    }

    /// Label of the matching device answer, e.g. `InquiryResponse`.
    pub fn response_label(&self) -> &'static str {
        match self {
            QueryType::DeviceOnlineRequest => "DeviceOnlineResponse",
            QueryType::Inquiry => "InquiryResponse",
            QueryType::UpdateIP => "UpdateIPResponse",
            QueryType::ResetPassword => "ResetPasswordResponse",
            QueryType::CMSInfo => "CMSInfoResponse",
            QueryType::ModifyNetParam => "ModifyNetParamResponse",
            QueryType::Unknown => "Unknown",
        }
    }
}

impl From<u8> for QueryType {
    fn from(v: u8) -> Self {
        match v {
            0x02 => QueryType::DeviceOnlineRequest,
            0x03 => QueryType::Inquiry,
            0x06 => QueryType::UpdateIP,
            0x0A => QueryType::ResetPassword,
            0x0C => QueryType::CMSInfo,
            0x10 => QueryType::ModifyNetParam,
            _ => QueryType::Unknown,
        }
    }
}

impl From<QueryType> for u8 {
    fn from(qt: QueryType) -> u8 {
        qt as u8
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Label for a raw query byte. Never fails; unknown codes give `"Unknown"`.
pub fn query_type_label(raw: u8, packet_type: PacketType) -> &'static str {
    QueryType::resolve(raw, packet_type).label()
}

/// Whether decode checks prefix and checksum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodeMode {
    /// Accept anything long enough, like the devices' own tooling does.
    #[default]
    Lenient,
    Strict,
}

/// Total on-wire size for a payload of `payload_len` bytes.
pub fn frame_size(payload_len: usize) -> usize {
    (EthernetHeader::LENGTH + FRAME_BODY_LENGTH + payload_len).max(MIN_FRAME_LENGTH)
}

/// The SADP protocol frame (everything after the Ethernet header).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SadpFrame {
    pub prefix: u8,
    pub packet_type: u8,
    pub client_type: u16,
    pub counter: u32,
    pub marker: u16,
    pub query_type: u8,
    pub parameters: u8,
    pub checksum: u16,
    pub source_mac: MacAddr,
    pub source_ip: Ipv4Addr,
    pub destination_mac: MacAddr,
    pub destination_ip: Ipv4Addr,
    pub subnet_mask: Ipv4Addr,
    pub payload: Vec<u8>,
}

impl SadpFrame {
    pub fn new(packet_type: PacketType, query_type: QueryType, client_type: u16, counter: u32) -> Self {
        SadpFrame {
            prefix: SADP_PREFIX,
            packet_type: packet_type.into(),
            client_type,
            counter,
            marker: SADP_MARKER,
            query_type: query_type.into(),
            parameters: 0x00,
            checksum: 0x0000,
            source_mac: MacAddr::ZERO,
            source_ip: Ipv4Addr::UNSPECIFIED,
            destination_mac: MacAddr::BROADCAST,
            destination_ip: Ipv4Addr::UNSPECIFIED,
            subnet_mask: Ipv4Addr::UNSPECIFIED,
            payload: Vec::new(),
        }
    }

    pub fn packet_type(&self) -> PacketType {
        PacketType::from(self.packet_type)
    }

    /// Query type with the response offset already removed.
    pub fn query_type(&self) -> QueryType {
        QueryType::resolve(self.query_type, self.packet_type())
    }

    pub fn query_label(&self) -> &'static str {
        query_type_label(self.query_type, self.packet_type())
    }

    /// High byte of the client type, used as the checksum discriminant.
    pub fn discriminant(&self) -> u32 {
        (self.client_type >> 8) as u32
    }

    /// Bytes this frame occupies after the link header, padding included.
    pub fn wire_length(&self) -> usize {
        frame_size(self.payload.len()) - EthernetHeader::LENGTH
    }

    /// Serialize into the fixed layout, zero-padded to the minimum frame size.
    ///
    /// Counter and checksum are big-endian. Client type and marker are
    /// written low byte first, which is how they appear in captured traffic
    /// (`01 42`, `06 04`).
    pub fn serialize(&self) -> Vec<u8> {
        let mut buffer = vec![0u8; self.wire_length()];
        self.write_into(&mut buffer);
        buffer
    }

    fn write_into(&self, buffer: &mut [u8]) {
        buffer[0] = self.prefix;
        buffer[1] = self.packet_type;
        buffer[2..4].copy_from_slice(&self.client_type.to_le_bytes());
        buffer[4..8].copy_from_slice(&self.counter.to_be_bytes());
        buffer[8..10].copy_from_slice(&self.marker.to_le_bytes());
        buffer[10] = self.query_type;
        buffer[11] = self.parameters;
        buffer[12..14].copy_from_slice(&self.checksum.to_be_bytes());
        buffer[14..20].copy_from_slice(&self.source_mac.0);
        buffer[20..24].copy_from_slice(&self.source_ip.octets());
        buffer[24..30].copy_from_slice(&self.destination_mac.0);
        buffer[30..34].copy_from_slice(&self.destination_ip.octets());
        buffer[34..38].copy_from_slice(&self.subnet_mask.octets());
        buffer[FRAME_BODY_LENGTH..FRAME_BODY_LENGTH + self.payload.len()].copy_from_slice(&self.payload);
    }

    /// Checksum of this frame with its checksum field taken as zero.
    pub fn compute_checksum(&self) -> Result<u16> {
        let mut scratch = vec![0u8; self.wire_length().max(CHECKSUM_SCRATCH_LENGTH)];
        let mut zeroed = self.clone();
        zeroed.checksum = 0;
        zeroed.write_into(&mut scratch);
        checksum(&words_le(&scratch), self.discriminant())
    }

    /// Compute and store the checksum. Call after every other field is final.
    pub fn seal(&mut self) -> Result<()> {
        self.checksum = self.compute_checksum()?;
        Ok(())
    }

    pub fn verify_checksum(&self) -> Result<()> {
        let expected = self.compute_checksum()?;
        if expected != self.checksum {
            return Err(SadpError::ChecksumMismatch {
                expected,
                actual: self.checksum,
            });
        }
        Ok(())
    }

    /// Decode the bytes following the link header.
    ///
    /// `buffer` must hold at least the 66 bytes an 80-byte link frame leaves
    /// after its header.
    pub fn deserialize(buffer: &[u8], mode: DecodeMode) -> Result<Self> {
        let minimum = MIN_FRAME_LENGTH - EthernetHeader::LENGTH;
        if buffer.len() < minimum {
            return Err(SadpError::MalformedFrame {
                len: buffer.len() + EthernetHeader::LENGTH,
                minimum: MIN_FRAME_LENGTH,
            });
        }

        let frame = SadpFrame {
            prefix: buffer[0],
            packet_type: buffer[1],
            client_type: u16::from_le_bytes([buffer[2], buffer[3]]),
            counter: u32::from_be_bytes([buffer[4], buffer[5], buffer[6], buffer[7]]),
            marker: u16::from_le_bytes([buffer[8], buffer[9]]),
            query_type: buffer[10],
            parameters: buffer[11],
            checksum: u16::from_be_bytes([buffer[12], buffer[13]]),
            source_mac: MacAddr(buffer[14..20].try_into().unwrap_or_default()),
            source_ip: ipv4_at(buffer, 20),
            destination_mac: MacAddr(buffer[24..30].try_into().unwrap_or_default()),
            destination_ip: ipv4_at(buffer, 30),
            subnet_mask: ipv4_at(buffer, 34),
            payload: buffer[FRAME_BODY_LENGTH..].to_vec(),
        };

        if mode == DecodeMode::Strict {
            if frame.prefix != SADP_PREFIX {
                return Err(SadpError::BadPrefix(frame.prefix));
            }
            frame.verify_checksum()?;
        }
        Ok(frame)
    }
}

fn ipv4_at(buffer: &[u8], offset: usize) -> Ipv4Addr {
    Ipv4Addr::new(buffer[offset], buffer[offset + 1], buffer[offset + 2], buffer[offset + 3])
}
