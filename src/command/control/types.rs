//! Argument and parameter types used by V24 control and V25ter Commands and Responses
use atat::atat_derive::AtatEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, AtatEnum)]
pub enum FlowControl {
    /// 0: disable DTE flow control
    Disabled = 0,
    /// 3 (default and factory-programmed value): enable the RTS/CTS DTE flow
    /// control
    RtsCts = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, AtatEnum)]
pub enum Echo {
    Disable = 0,
    Enable = 1,
}
