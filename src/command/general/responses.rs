//! Responses for General Commands
use atat::atat_derive::AtatResp;
use atat::heapless_bytes::Bytes;

/// 4.1 Manufacturer identification
/// Text string identifying the manufacturer.
#[derive(Clone, Debug, AtatResp)]
pub struct ManufacturerId {
    #[at_arg(position = 0)]
    pub id: Bytes<64>,
}

/// 4.3 Model identification
/// Text string identifying the model identification.
#[derive(Clone, Debug, AtatResp)]
pub struct ModelId {
    #[at_arg(position = 0)]
    pub model: Bytes<64>,
}

/// 4.5 Firmware version identification
#[derive(Clone, Debug, AtatResp)]
pub struct FirmwareVersion {
    #[at_arg(position = 0)]
    pub version: Bytes<64>,
}

/// 4.7 IMEI identification +CGSN
#[derive(Clone, Debug, AtatResp)]
pub struct IMEI {
    #[at_arg(position = 0)]
    pub imei: u64,
}

/// 4.11 International mobile subscriber identification +CIMI
#[derive(Clone, Debug, AtatResp)]
pub struct IMSI {
    #[at_arg(position = 0)]
    pub imsi: u64,
}

/// 4.12 Card identification +CCID
#[derive(Clone, Debug, AtatResp)]
pub struct CCID {
    #[at_arg(position = 0)]
    pub ccid: u128,
}
