//! Unsolicited responses for Internet protocol transport layer Commands
use atat::atat_derive::AtatResp;

/// +UUSORD/+UUSORF
#[derive(Debug, Clone, PartialEq, AtatResp)]
pub struct SocketDataAvailable {
    #[at_arg(position = 0)]
    pub socket: u8,
    #[at_arg(position = 1)]
    pub length: usize,
}

/// +UUSOCL
#[derive(Debug, Clone, PartialEq, AtatResp)]
pub struct SocketClosed {
    #[at_arg(position = 0)]
    pub socket: u8,
}
