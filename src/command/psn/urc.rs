//! Unsolicited responses for Packet Switched Data Services Commands
use super::types::PacketDomainEventKind;
use atat::atat_derive::AtatResp;
use heapless::String;

/// 18.27 GPRS network registration status +CGREG
#[derive(Debug, Clone, PartialEq, AtatResp)]
pub struct GPRSNetworkRegistration {
    #[at_arg(position = 0)]
    pub stat: u8,
    #[at_arg(position = 1)]
    pub lac: Option<String<8>>,
    #[at_arg(position = 2)]
    pub ci: Option<String<8>>,
    #[at_arg(position = 3)]
    pub act: Option<u8>,
}

/// 18.36 EPS network registration status +CEREG
#[derive(Debug, Clone, PartialEq, AtatResp)]
pub struct EPSNetworkRegistration {
    #[at_arg(position = 0)]
    pub stat: u8,
    #[at_arg(position = 1)]
    pub tac: Option<String<8>>,
    #[at_arg(position = 2)]
    pub ci: Option<String<8>>,
    #[at_arg(position = 3)]
    pub act: Option<u8>,
}

/// 18.25 Packet domain event reporting +CGEV
///
/// Only the 3GPP Rel-10 forms with integer parameters are represented, e.g.
/// `+CGEV: NW PDN DEACT <cid>` or `+CGEV: NW DEACT <p_cid>,<cid>,<event_type>`.
#[derive(Debug, Clone, PartialEq, AtatResp)]
pub struct PacketDomainEvent {
    #[at_arg(position = 0)]
    pub event: PacketDomainEventKind,
    #[at_arg(position = 1)]
    pub cid: Option<u8>,
    #[at_arg(position = 2)]
    pub event_type: Option<u8>,
}

impl PacketDomainEvent {
    /// Context deactivated by either side.
    ///
    /// `Some(None)` is a deactivation whose context id could not be
    /// determined, and therefore concerns every context.
    pub fn deactivated_cid(&self) -> Option<Option<u8>> {
        match self.event {
            PacketDomainEventKind::NetworkPdnDeactivated(cid)
            | PacketDomainEventKind::MePdnDeactivated(cid) => Some(cid),
            PacketDomainEventKind::NetworkDeactivated(_)
            | PacketDomainEventKind::MeDeactivated(_) => Some(self.cid),
            _ => None,
        }
    }

    pub fn is_detach(&self) -> bool {
        matches!(
            self.event,
            PacketDomainEventKind::NetworkDetach | PacketDomainEventKind::MeDetach
        )
    }
}
