use super::traits::LinkTransport;
use crate::codec::SADP_ETHERTYPE;
use crate::identity::NetworkIdentity;
use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use std::ffi::CString;
use std::io::{Error, ErrorKind, Read, Result};
use std::mem;

/// AF_PACKET socket bound to one interface, filtered to ethertype 0x8033.
///
/// Needs CAP_NET_RAW.
pub struct RawTransport {
    socket: Socket,
    identity: NetworkIdentity,
}

impl RawTransport {
    pub fn new(identity: NetworkIdentity) -> Result<Self> {
        Self::with_protocol(identity, SADP_ETHERTYPE)
    }

    /// Bind for an arbitrary ethertype; `0x0003` (ETH_P_ALL) captures everything.
    pub fn with_protocol(identity: NetworkIdentity, ethertype: u16) -> Result<Self> {
        let socket = Socket::new(
            Domain::PACKET,
            Type::RAW,
            Some(Protocol::from(ethertype.to_be() as i32)),
        )?;

        let index = if identity.index != 0 {
            identity.index
        } else {
            interface_index(&identity.name)?
        };
        socket.bind(&link_address(index, ethertype))?;

        Ok(RawTransport { socket, identity })
    }

    pub fn try_clone(&self) -> Result<Self> {
        Ok(RawTransport {
            socket: self.socket.try_clone()?,
            identity: self.identity.clone(),
        })
    }
}

impl LinkTransport for RawTransport {
    fn send(&self, data: &[u8]) -> Result<usize> {
        self.socket.send(data)
    }

    fn receive(&self, buffer: &mut [u8]) -> Result<usize> {
        (&self.socket).read(buffer)
    }

    fn identity(&self) -> &NetworkIdentity {
        &self.identity
    }
}

fn interface_index(name: &str) -> Result<u32> {
    let c_name = CString::new(name).map_err(|_| Error::new(ErrorKind::InvalidInput, "interface name contains NUL"))?;
    let index = unsafe { libc::if_nametoindex(c_name.as_ptr()) };
    if index == 0 {
        return Err(Error::last_os_error());
    }
    Ok(index)
}

fn link_address(index: u32, ethertype: u16) -> SockAddr {
    // sockaddr_ll fits inside sockaddr_storage; everything not set stays zero.
    let mut storage: libc::sockaddr_storage = unsafe { mem::zeroed() };
    let sll = unsafe { &mut *(&mut storage as *mut libc::sockaddr_storage as *mut libc::sockaddr_ll) };
    sll.sll_family = libc::AF_PACKET as u16;
    sll.sll_protocol = ethertype.to_be();
    sll.sll_ifindex = index as i32;
    unsafe { SockAddr::new(storage, mem::size_of::<libc::sockaddr_ll>() as libc::socklen_t) }
}
