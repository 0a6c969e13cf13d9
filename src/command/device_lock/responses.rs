//! Responses for Device lock Commands
use super::types::PinStatusCode;

/// 9.1 Enter PIN +CPIN
#[derive(Clone, Debug, PartialEq)]
pub struct PinStatus {
    pub code: PinStatusCode,
}

impl atat::AtatResp for PinStatus {}
