//! Responses for Network service Commands
use super::types::OperatorSelectionMode;
use atat::atat_derive::AtatResp;
use heapless::{String, Vec};

/// 7.4 Signal quality +CSQ
#[derive(Debug, Clone, PartialEq, AtatResp)]
pub struct SignalQuality {
    #[at_arg(position = 0)]
    pub rssi: u8,
    #[at_arg(position = 1)]
    pub ber: u8,
}

/// 7.5 Operator selection +COPS
#[derive(Debug, Clone, PartialEq, AtatResp)]
pub struct OperatorSelection {
    #[at_arg(position = 0)]
    pub mode: OperatorSelectionMode,
    #[at_arg(position = 1)]
    pub format: Option<u8>,
    #[at_arg(position = 2)]
    pub oper: Option<String<24>>,
    #[at_arg(position = 3)]
    pub act: Option<u8>,
}

/// One entry of the `+COPS=?` operator list.
#[derive(Debug, Clone, PartialEq)]
pub struct OperatorInfo {
    /// 0 unknown, 1 available, 2 current, 3 forbidden
    pub stat: u8,
    pub long: String<24>,
    pub short: String<10>,
    pub numeric: String<6>,
    pub act: Option<u8>,
}

/// 7.5 Operator selection +COPS (test command)
#[derive(Debug, Clone, PartialEq)]
pub struct OperatorList {
    pub operators: Vec<OperatorInfo, 16>,
}

impl atat::AtatResp for OperatorList {}

/// 7.14 Network registration status +CREG
#[derive(Debug, Clone, PartialEq, AtatResp)]
pub struct NetworkRegistrationStatus {
    #[at_arg(position = 0)]
    pub n: u8,
    #[at_arg(position = 1)]
    pub stat: u8,
    #[at_arg(position = 2)]
    pub lac: Option<String<8>>,
    #[at_arg(position = 3)]
    pub ci: Option<String<8>>,
    #[at_arg(position = 4)]
    pub act: Option<u8>,
}
