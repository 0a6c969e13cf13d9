//! ### 11 - Short Messages Service
pub mod types;

use super::NoResponse;
use atat::atat_derive::AtatCmd;
use types::{MessageFormat, NewMessageIndicationMode};

/// 11.4 Message format +CMGF
///
/// Sets the input and output format of the short messages.
#[derive(Clone, AtatCmd)]
#[at_cmd("+CMGF", NoResponse)]
pub struct SetMessageFormat {
    #[at_arg(position = 0)]
    pub mode: MessageFormat,
}

/// 11.8 New message indication +CNMI
///
/// Selects the procedure for message reception from the network.
#[derive(Clone, AtatCmd)]
#[at_cmd("+CNMI", NoResponse)]
pub struct SetNewMessageIndication {
    #[at_arg(position = 0)]
    pub mode: NewMessageIndicationMode,
    #[at_arg(position = 1)]
    pub mt: u8,
}
