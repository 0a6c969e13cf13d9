//! ### 15 - V24 control and V25ter
//! These commands, unless specifically stated, do not implement set syntax
//! using "=", read ("?"), or test ("=?").
pub mod types;

use super::NoResponse;
use atat::atat_derive::AtatCmd;
use types::{Echo, FlowControl};

/// 15.5 Flow control &K
///
/// Controls the flow control mechanism between DTE and DCE.
#[derive(Clone, AtatCmd)]
#[at_cmd("&K", NoResponse, value_sep = false)]
pub struct SetFlowControl {
    #[at_arg(position = 0)]
    pub value: FlowControl,
}

/// 15.25 Command echo E
///
/// Decides whether the modem echoes the characters received from the DTE
/// during command state.
#[derive(Clone, AtatCmd)]
#[at_cmd("E", NoResponse, value_sep = false)]
pub struct SetEcho {
    #[at_arg(position = 0)]
    pub enabled: Echo,
}
