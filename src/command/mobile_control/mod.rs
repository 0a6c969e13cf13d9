//! ### 5 - Mobile equipment control and status Commands
pub mod types;

use super::NoResponse;
use atat::atat_derive::AtatCmd;
use types::{Functionality, ResetMode, TerminationErrorMode};

/// 5.3 Set module functionality +CFUN
///
/// Selects the level of functionality in the MT.
#[derive(Clone, AtatCmd)]
#[at_cmd("+CFUN", NoResponse, attempts = 1, timeout_ms = 180000)]
pub struct SetModuleFunctionality {
    #[at_arg(position = 0)]
    pub fun: Functionality,
    #[at_arg(position = 1)]
    pub rst: Option<ResetMode>,
}

/// 5.17 Report mobile termination error +CMEE
///
/// Configures the formatting of the result code +CME ERROR: <err> as an
/// indication of an error relating to the functionality of the MT.
#[derive(Clone, AtatCmd)]
#[at_cmd("+CMEE", NoResponse)]
pub struct SetReportMobileTerminationError {
    #[at_arg(position = 0)]
    pub n: TerminationErrorMode,
}
