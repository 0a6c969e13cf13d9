//! Responses for Packet Switched Data Services Commands
use super::types::{
    ContextId, GPRSAttachedState, PDPContextStatus, RateControlExceptionReports,
    RateControlUplinkTimeUnit,
};
use atat::atat_derive::AtatResp;
use heapless::{String, Vec};
use no_std_net::IpAddr;

/// One row of the +CGDCONT read command.
#[derive(Debug, Clone, PartialEq)]
pub struct PDPContextDefinition {
    pub cid: ContextId,
    /// Empty when the modem left the field blank
    pub pdp_type: String<8>,
    pub apn: String<99>,
    pub pdp_addr: Option<IpAddr>,
}

/// 18.4 PDP context definition +CGDCONT (read command)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PDPContextDefinitions {
    pub contexts: Vec<PDPContextDefinition, 8>,
}

impl atat::AtatResp for PDPContextDefinitions {}

/// 18.14 PDP context activate or deactivate +CGACT
#[derive(Debug, Clone, PartialEq, AtatResp)]
pub struct PDPContextState {
    #[at_arg(position = 0)]
    pub cid: ContextId,
    #[at_arg(position = 1)]
    pub status: PDPContextStatus,
}

/// 18.14 PDP context activate or deactivate +CGACT (read command)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PDPContextStates {
    pub states: Vec<PDPContextState, 8>,
}

impl atat::AtatResp for PDPContextStates {}

/// 18.16 GPRS attach or detach +CGATT
#[derive(Debug, Clone, PartialEq, AtatResp)]
pub struct GPRSAttached {
    #[at_arg(position = 0)]
    pub state: GPRSAttachedState,
}

/// 18.27 GPRS network registration status +CGREG
#[derive(Debug, Clone, PartialEq, AtatResp)]
pub struct GPRSNetworkRegistrationStatus {
    #[at_arg(position = 0)]
    pub n: u8,
    #[at_arg(position = 1)]
    pub stat: u8,
    #[at_arg(position = 2)]
    pub lac: Option<String<8>>,
    #[at_arg(position = 3)]
    pub ci: Option<String<8>>,
    #[at_arg(position = 4)]
    pub act: Option<u8>,
}

/// 18.36 EPS network registration status +CEREG
#[derive(Debug, Clone, PartialEq, AtatResp)]
pub struct EPSNetworkRegistrationStatus {
    #[at_arg(position = 0)]
    pub n: u8,
    #[at_arg(position = 1)]
    pub stat: u8,
    #[at_arg(position = 2)]
    pub tac: Option<String<8>>,
    #[at_arg(position = 3)]
    pub ci: Option<String<8>>,
    #[at_arg(position = 4)]
    pub act: Option<u8>,
}

/// One row of +CGCONTRDP.
///
/// Everything after `<APN>` is optional; the modem stops printing at the last
/// field it knows about.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PDPContextDynamicParameters {
    pub cid: u8,
    pub bearer_id: u8,
    pub apn: String<99>,
    pub local_addr: Option<IpAddr>,
    pub local_subnet_mask: Option<IpAddr>,
    pub gw_addr: Option<IpAddr>,
    pub dns_prim_addr: Option<IpAddr>,
    pub dns_sec_addr: Option<IpAddr>,
    pub p_cscf_prim_addr: Option<IpAddr>,
    pub p_cscf_sec_addr: Option<IpAddr>,
    pub im_cn_signalling_flag: Option<u8>,
    pub lipa_indication: Option<u8>,
    pub ipv4_mtu: Option<u16>,
    pub wlan_offload: Option<u8>,
    pub local_addr_ind: Option<u8>,
    pub non_ip_mtu: Option<u16>,
    pub serving_plmn_rate_control_value: Option<u32>,
}

/// 18.37 PDP context read dynamic parameters +CGCONTRDP
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PDPContextDynamicParametersList {
    pub params: Vec<PDPContextDynamicParameters, 4>,
}

impl atat::AtatResp for PDPContextDynamicParametersList {}

/// APN rate control +CGAPNRC. Omitted fields read as their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ApnRateControl {
    pub reports: RateControlExceptionReports,
    pub uplink_time_unit: RateControlUplinkTimeUnit,
    pub maximum_uplink_rate: u32,
}

impl atat::AtatResp for ApnRateControl {}

/// APN back-off timer read dynamic parameters +CABTRDP
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ApnBackoffTimer {
    /// Seconds; 0 when no back-off timer is running
    pub residual_backoff_time: u32,
}

impl atat::AtatResp for ApnBackoffTimer {}

/// 18.42 UE's CIoT EPS optimization +CCIOTOPT
#[derive(Debug, Clone, PartialEq, AtatResp)]
pub struct CiotOptimizationConfig {
    #[at_arg(position = 0)]
    pub n: u8,
    #[at_arg(position = 1)]
    pub supported_ue_opt: u8,
    #[at_arg(position = 2)]
    pub preferred_ue_opt: Option<u8>,
}
