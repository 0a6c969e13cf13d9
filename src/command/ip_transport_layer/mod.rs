//! ### 25 - Internet protocol transport layer Commands
//!
//! All data commands are issued in hex mode (`+UDCONF=1,1`), so payloads of
//! any content survive the textual channel.
pub mod responses;
pub mod types;
pub mod urc;

use super::NoResponse;
use atat::atat_derive::AtatCmd;
use responses::{
    CreateSocketResponse, SocketData, UDPSendToDataResponse, UDPSocketData,
    WriteSocketDataResponse,
};
use types::{HexMode, SocketProtocol};

/// Bytes moved per +USOWR/+USOST/+USORD/+USORF exchange.
pub const EGRESS_CHUNK_SIZE: usize = 512;
pub const INGRESS_CHUNK_SIZE: usize = 512;

/// 25.3 Create Socket +USOCR
///
/// Creates a socket and associates it with the specified protocol (TCP or
/// UDP), returns a number identifying the socket. Such command corresponds
/// to the BSD socket routine.
#[derive(Clone, AtatCmd)]
#[at_cmd("+USOCR", CreateSocketResponse)]
pub struct CreateSocket {
    #[at_arg(position = 0)]
    pub protocol: SocketProtocol,
    #[at_arg(position = 1)]
    pub local_port: Option<u16>,
}

/// 25.7 Close Socket +USOCL
///
/// Closes the specified socket, like the BSD close routine. In case of
/// remote socket closure the user is notified via the URC +UUSOCL.
#[derive(Clone, AtatCmd)]
#[at_cmd("+USOCL", NoResponse, timeout_ms = 120000)]
pub struct CloseSocket {
    #[at_arg(position = 0)]
    pub socket: u8,
}

/// 25.9 Connect Socket +USOCO
///
/// Establishes a peer-to-peer connection of the socket to the specified
/// remote host on the given remote port, like the BSD connect routine. If
/// the socket is a TCP socket, the command will actually perform the TCP
/// negotiation (3-way handshake) to open a connection. If the socket is a
/// UDP socket, this function will just declare the remote host address and
/// port for later use with other socket operations.
#[derive(Clone, AtatCmd)]
#[at_cmd("+USOCO", NoResponse, timeout_ms = 130000, abortable = true)]
pub struct ConnectSocket<'a> {
    #[at_arg(position = 0)]
    pub socket: u8,
    #[at_arg(position = 1, len = 39)]
    pub remote_addr: &'a str,
    #[at_arg(position = 2)]
    pub remote_port: u16,
}

/// 25.10 Write socket data +USOWR
///
/// Writes the specified amount of data to the specified socket, hex encoded.
/// The number of bytes actually written is returned, and may be lower than
/// requested.
#[derive(Clone, AtatCmd)]
#[at_cmd("+USOWR", WriteSocketDataResponse, timeout_ms = 120000)]
pub struct WriteSocketDataHex<'a> {
    #[at_arg(position = 0)]
    pub socket: u8,
    #[at_arg(position = 1)]
    pub length: usize,
    #[at_arg(position = 2, len = 1024)]
    pub data: &'a str,
}

/// 25.11 SendTo command (UDP only) +USOST
///
/// Writes the specified amount of data to the remote address, hex encoded.
#[derive(Clone, AtatCmd)]
#[at_cmd("+USOST", UDPSendToDataResponse, timeout_ms = 10000)]
pub struct SendToHex<'a> {
    #[at_arg(position = 0)]
    pub socket: u8,
    #[at_arg(position = 1, len = 39)]
    pub remote_addr: &'a str,
    #[at_arg(position = 2)]
    pub remote_port: u16,
    #[at_arg(position = 3)]
    pub length: usize,
    #[at_arg(position = 4, len = 1024)]
    pub data: &'a str,
}

/// 25.12 Read Socket Data +USORD
///
/// Reads the specified amount of data from the specified socket, like the
/// BSD read routine. With <length> 0 the command returns the amount of data
/// pending in the socket.
#[derive(Clone, AtatCmd)]
#[at_cmd("+USORD", SocketData, timeout_ms = 10000)]
pub struct ReadSocketData {
    #[at_arg(position = 0)]
    pub socket: u8,
    #[at_arg(position = 1)]
    pub length: usize,
}

/// 25.13 Receive From command (UDP only) +USORF
///
/// Reads the specified amount of data from the specified UDP socket together
/// with the address of the sender.
#[derive(Clone, AtatCmd)]
#[at_cmd("+USORF", UDPSocketData, timeout_ms = 10000)]
pub struct ReadUDPSocketData {
    #[at_arg(position = 0)]
    pub socket: u8,
    #[at_arg(position = 1)]
    pub length: usize,
}

/// 25.25 Configure Data Mode +UDCONF=1
///
/// Enables or disables the HEX mode for the socket data commands.
#[derive(Clone, AtatCmd)]
#[at_cmd("+UDCONF", NoResponse)]
pub struct SetHexMode {
    /// Always 1, the HEX mode configuration
    #[at_arg(position = 0)]
    pub op_code: u8,
    #[at_arg(position = 1)]
    pub hex_mode: HexMode,
}

#[cfg(test)]
mod tests {
    use super::*;
    use atat::serde_at::from_str;

    #[test]
    fn parse_read_socket_data() {
        let res: SocketData = from_str("+USORD: 3,4,\"DEADBEEF\"").unwrap();
        assert_eq!(res.socket, 3);
        assert_eq!(res.length, 4);
        assert_eq!(res.data.as_deref(), Some("DEADBEEF"));
    }

    #[test]
    fn parse_pending_length() {
        let res: SocketData = from_str("+USORD: 3,12").unwrap();
        assert_eq!(res.length, 12);
        assert_eq!(res.data, None);
    }

    #[test]
    fn parse_udp_socket_data() {
        let res: UDPSocketData = from_str("+USORF: 0,\"192.168.1.10\",4242,2,\"ABCD\"").unwrap();
        assert_eq!(res.remote_addr.as_str(), "192.168.1.10");
        assert_eq!(res.remote_port, 4242);
        assert_eq!(res.length, 2);
        assert_eq!(res.data.as_deref(), Some("ABCD"));
    }
}
