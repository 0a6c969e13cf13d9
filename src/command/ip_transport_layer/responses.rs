//! Responses for Internet protocol transport layer Commands
use super::INGRESS_CHUNK_SIZE;
use atat::atat_derive::AtatResp;
use heapless::String;

/// 25.3 Create Socket +USOCR
#[derive(Debug, Clone, PartialEq, AtatResp)]
pub struct CreateSocketResponse {
    #[at_arg(position = 0)]
    pub socket: u8,
}

/// 25.10 Write socket data +USOWR
#[derive(Debug, Clone, PartialEq, AtatResp)]
pub struct WriteSocketDataResponse {
    #[at_arg(position = 0)]
    pub socket: u8,
    #[at_arg(position = 1)]
    pub length: usize,
}

/// 25.11 UDP Send To data +USOST
#[derive(Debug, Clone, PartialEq, AtatResp)]
pub struct UDPSendToDataResponse {
    #[at_arg(position = 0)]
    pub socket: u8,
    #[at_arg(position = 1)]
    pub length: usize,
}

/// 25.12 Read Socket Data +USORD
#[derive(Debug, Clone, PartialEq, AtatResp)]
pub struct SocketData {
    #[at_arg(position = 0)]
    pub socket: u8,
    #[at_arg(position = 1)]
    pub length: usize,
    // Note: Data max length is `INGRESS_CHUNK_SIZE` * 2, due to hex encoding
    #[at_arg(position = 2)]
    pub data: Option<String<{ INGRESS_CHUNK_SIZE * 2 }>>,
}

/// 25.13 Read UDP Socket Data +USORF
#[derive(Debug, Clone, PartialEq, AtatResp)]
pub struct UDPSocketData {
    #[at_arg(position = 0)]
    pub socket: u8,
    #[at_arg(position = 1)]
    pub remote_addr: String<39>,
    #[at_arg(position = 2)]
    pub remote_port: u16,
    #[at_arg(position = 3)]
    pub length: usize,
    #[at_arg(position = 4)]
    pub data: Option<String<{ INGRESS_CHUNK_SIZE * 2 }>>,
}
