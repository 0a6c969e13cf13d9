//! Argument and parameter types used by Internet protocol transport layer Commands and Responses
use atat::atat_derive::AtatEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, AtatEnum)]
pub enum SocketProtocol {
    TCP = 6,
    UDP = 17,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, AtatEnum)]
pub enum HexMode {
    Disabled = 0,
    Enabled = 1,
}
