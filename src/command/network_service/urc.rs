//! Unsolicited responses for Network service Commands
use atat::atat_derive::AtatResp;
use heapless::String;

/// 7.14 Network registration status +CREG
#[derive(Debug, Clone, PartialEq, AtatResp)]
pub struct NetworkRegistration {
    #[at_arg(position = 0)]
    pub stat: u8,
    #[at_arg(position = 1)]
    pub lac: Option<String<8>>,
    #[at_arg(position = 2)]
    pub ci: Option<String<8>>,
    #[at_arg(position = 3)]
    pub act: Option<u8>,
}
