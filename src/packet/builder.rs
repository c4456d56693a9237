use super::counter::FrameCounter;
use crate::codec::{
    EthernetHeader, LinkFrame, MacAddr, PacketType, QueryType, SadpFrame, CLIENT_TYPE_CLIENT,
};
use crate::error::{Result, SadpError};
use crate::identity::NetworkIdentity;
use crate::transport::LinkTransport;
use std::net::Ipv4Addr;
use std::sync::Arc;

/// Builds outbound SADP frames, each signed with a fresh counter value.
#[derive(Debug, Clone)]
pub struct PacketBuilder {
    counter: Arc<FrameCounter>,
}

impl PacketBuilder {
    pub fn new(counter: Arc<FrameCounter>) -> Self {
        PacketBuilder { counter }
    }

    pub fn counter(&self) -> &Arc<FrameCounter> {
        &self.counter
    }

    /// Broadcast inquiry asking every device on the segment to answer.
    ///
    /// Returns `None` when no identity is available.
    pub fn build_inquiry(&self, identity: Option<&NetworkIdentity>) -> Option<LinkFrame> {
        self.inquiry_for(identity?).ok()
    }

    /// General frame primitive.
    ///
    /// Only the inquiry payload is defined; other query types get whatever
    /// payload the caller provides.
    pub fn build_frame(
        &self,
        identity: Option<&NetworkIdentity>,
        packet_type: PacketType,
        query_type: QueryType,
        payload: &[u8],
        client_type: u16,
    ) -> Option<LinkFrame> {
        self.assemble(identity?, packet_type, query_type, payload, client_type).ok()
    }

    /// Inquiry for an identity that is known to be present.
    fn inquiry_for(&self, identity: &NetworkIdentity) -> Result<LinkFrame> {
        let payload = identity.ipv6_octets();
        self.assemble(identity, PacketType::Request, QueryType::Inquiry, &payload, CLIENT_TYPE_CLIENT)
    }

    fn assemble(
        &self,
        identity: &NetworkIdentity,
        packet_type: PacketType,
        query_type: QueryType,
        payload: &[u8],
        client_type: u16,
    ) -> Result<LinkFrame> {
        let mut frame = SadpFrame::new(
            packet_type,
            query_type,
            client_type,
            self.counter.get_and_increment(),
        );
        frame.source_mac = identity.mac;
        frame.source_ip = identity.ipv4;
        frame.destination_mac = MacAddr::BROADCAST;
        frame.destination_ip = Ipv4Addr::UNSPECIFIED;
        frame.payload = payload.to_vec();
        frame.seal()?;

        Ok(LinkFrame {
            header: EthernetHeader::sadp_broadcast(identity.mac),
            frame,
        })
    }
}

/// Build an inquiry from the transport's own identity and send it once.
pub fn send_inquiry(transport: &dyn LinkTransport, builder: &PacketBuilder) -> Result<usize> {
    let bytes = builder.inquiry_for(transport.identity())?.encode();

    #[cfg(feature = "packet-dump")]
    log::trace!(target: "PacketBuilder", "TX {:02x?}", bytes);

    transport.send(&bytes).map_err(SadpError::Transport)
}
