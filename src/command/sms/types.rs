//! Argument and parameter types used by Short Messages Service Commands and Responses
use atat::atat_derive::AtatEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, AtatEnum)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MessageFormat {
    /// 0 (factory-programmed value): PDU mode
    Pdu = 0,
    /// 1: text mode
    Text = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, AtatEnum)]
pub enum NewMessageIndicationMode {
    /// 0: buffer unsolicited result codes in the MT
    Buffer = 0,
    /// 1: discard indication and reject new received message URCs when the
    /// MT-DTE link is reserved
    DiscardWhenReserved = 1,
    /// 2: buffer URCs in the MT when the link is reserved and flush them
    /// afterwards
    BufferWhenReserved = 2,
}
