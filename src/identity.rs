use crate::codec::MacAddr;
use std::net::{Ipv4Addr, Ipv6Addr};

pub const SCOPE_GLOBAL: u32 = 0x0000;
pub const SCOPE_LOOPBACK: u32 = 0x0010;
pub const SCOPE_LINK_LOCAL: u32 = 0x0020;
pub const SCOPE_SITE_LOCAL: u32 = 0x0040;
pub const SCOPE_COMPAT: u32 = 0x0080;

/// Addresses of the interface SADP frames are sent from.
///
/// Enumerating interfaces is left to the caller; this is just the resolved
/// result, usually built from [`crate::config::InterfaceConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkIdentity {
    pub index: u32,
    pub name: String,
    pub mac: MacAddr,
    pub ipv4: Ipv4Addr,
    pub ipv6: Ipv6Addr,
    /// Scope flags as listed in `/proc/net/if_inet6`.
    pub scope: u32,
}

impl NetworkIdentity {
    pub fn new(index: u32, name: impl Into<String>, mac: MacAddr, ipv4: Ipv4Addr, ipv6: Ipv6Addr) -> Self {
        NetworkIdentity {
            index,
            name: name.into(),
            mac,
            ipv4,
            ipv6,
            scope: SCOPE_GLOBAL,
        }
    }

    pub fn with_scope(mut self, scope: u32) -> Self {
        self.scope = scope;
        self
    }

    /// The 16 raw IPv6 bytes carried in an inquiry payload.
    pub fn ipv6_octets(&self) -> [u8; 16] {
        self.ipv6.octets()
    }

    pub fn is_global(&self) -> bool {
        self.scope == SCOPE_GLOBAL
    }

    pub fn is_loopback(&self) -> bool {
        self.scope & SCOPE_LOOPBACK != 0
    }

    pub fn is_link_local(&self) -> bool {
        self.scope & SCOPE_LINK_LOCAL != 0
    }

    pub fn is_site_local(&self) -> bool {
        self.scope & SCOPE_SITE_LOCAL != 0
    }

    pub fn is_compat(&self) -> bool {
        self.scope & SCOPE_COMPAT != 0
    }
}
