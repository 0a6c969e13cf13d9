//! ### 9 - Device lock

mod impl_;
pub mod responses;
pub mod types;

use atat::atat_derive::AtatCmd;
use super::NoResponse;

/// 9.1 Enter PIN +CPIN
///
/// Read whether the MT is waiting for a password.
#[derive(Clone)]
pub struct GetPinStatus;

/// 9.1 Enter PIN +CPIN
///
/// Enter PIN. If no PIN request is pending, the corresponding error code is
/// returned. If a wrong PIN is given three times, the PUK must be inserted in
/// place of the PIN.
#[derive(Clone, AtatCmd)]
#[at_cmd("+CPIN", NoResponse, timeout_ms = 10000)]
pub struct SetPin<'a> {
    #[at_arg(position = 0, len = 8)]
    pub pin: &'a str,
}
