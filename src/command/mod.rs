//! AT commands for 3GPP TS 27.007 compliant cellular modules, with the
//! u-blox socket extensions used by the offloaded stack.

pub mod control;
pub mod device_lock;
pub mod general;
pub mod ip_transport_layer;
pub mod mobile_control;
pub mod network_service;
pub mod psn;
pub mod sms;

pub(crate) mod lines;

use atat::atat_derive::{AtatCmd, AtatResp, AtatUrc};

#[derive(Debug, Clone, PartialEq, AtatResp)]
pub struct NoResponse;

#[derive(Clone, AtatCmd)]
#[at_cmd("", NoResponse, timeout_ms = 1000)]
pub struct AT;

#[derive(Debug, Clone, AtatUrc)]
pub enum Urc {
    #[at_urc("+CREG")]
    NetworkRegistration(network_service::urc::NetworkRegistration),
    #[at_urc("+CGREG")]
    GPRSNetworkRegistration(psn::urc::GPRSNetworkRegistration),
    #[at_urc("+CEREG")]
    EPSNetworkRegistration(psn::urc::EPSNetworkRegistration),
    #[at_urc("+CGEV")]
    PacketDomainEvent(psn::urc::PacketDomainEvent),

    #[at_urc("+UUSORD")]
    SocketDataAvailable(ip_transport_layer::urc::SocketDataAvailable),
    #[at_urc("+UUSORF")]
    SocketDataAvailableUDP(ip_transport_layer::urc::SocketDataAvailable),
    #[at_urc("+UUSOCL")]
    SocketClosed(ip_transport_layer::urc::SocketClosed),
}
