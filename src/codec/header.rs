use crate::error::{Result, SadpError};
use std::convert::TryInto;
use std::fmt;
use std::str::FromStr;

/// Ethertype registered for SADP frames.
pub const SADP_ETHERTYPE: u16 = 0x8033;

/// 6-byte hardware address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MacAddr(pub [u8; 6]);

impl MacAddr {
    pub const BROADCAST: MacAddr = MacAddr([0xFF; 6]);
    pub const ZERO: MacAddr = MacAddr([0x00; 6]);

    pub fn octets(&self) -> [u8; 6] {
        self.0
    }

    pub fn is_broadcast(&self) -> bool {
        *self == Self::BROADCAST
    }
}

impl From<[u8; 6]> for MacAddr {
    fn from(bytes: [u8; 6]) -> Self {
        MacAddr(bytes)
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            b[0], b[1], b[2], b[3], b[4], b[5]
        )
    }
}

/// Accepts `aa:bb:cc:dd:ee:ff`, `aa-bb-cc-dd-ee-ff` or twelve bare hex digits.
impl FromStr for MacAddr {
    type Err = SadpError;

    fn from_str(s: &str) -> Result<Self> {
        let hex: String = s.chars().filter(|c| *c != ':' && *c != '-').collect();
        if hex.len() != 12 || !hex.is_ascii() {
            return Err(SadpError::Config(format!("invalid MAC address '{}'", s)));
        }
        let mut out = [0u8; 6];
        for (i, byte) in out.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16)
                .map_err(|_| SadpError::Config(format!("invalid MAC address '{}'", s)))?;
        }
        Ok(MacAddr(out))
    }
}

/// 14-byte Ethernet II header preceding every SADP frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EthernetHeader {
    pub destination: MacAddr,
    pub source: MacAddr,
    pub ethertype: u16,
}

impl EthernetHeader {
    pub const LENGTH: usize = 14;

    /// Broadcast header carrying the SADP ethertype.
    pub fn sadp_broadcast(source: MacAddr) -> Self {
        EthernetHeader {
            destination: MacAddr::BROADCAST,
            source,
            ethertype: SADP_ETHERTYPE,
        }
    }

    pub fn serialize(&self) -> [u8; 14] {
        let mut buffer = [0u8; 14];
        buffer[0..6].copy_from_slice(&self.destination.0);
        buffer[6..12].copy_from_slice(&self.source.0);
        // network order: 0x8033 goes out as 80 33
        buffer[12..14].copy_from_slice(&self.ethertype.to_be_bytes());
        buffer
    }

    pub fn deserialize(buffer: &[u8]) -> Result<Self> {
        if buffer.len() < Self::LENGTH {
            return Err(SadpError::MalformedFrame {
                len: buffer.len(),
                minimum: Self::LENGTH,
            });
        }
        Ok(EthernetHeader {
            destination: MacAddr(buffer[0..6].try_into().unwrap_or_default()),
            source: MacAddr(buffer[6..12].try_into().unwrap_or_default()),
            ethertype: peek_ethertype(buffer).unwrap_or_default(),
        })
    }

    pub fn is_sadp(&self) -> bool {
        self.ethertype == SADP_ETHERTYPE
    }
}

/// Read the ethertype of a captured frame without decoding anything else.
pub fn peek_ethertype(buffer: &[u8]) -> Option<u16> {
    let bytes: [u8; 2] = buffer.get(12..14)?.try_into().ok()?;
    Some(u16::from_be_bytes(bytes))
}
