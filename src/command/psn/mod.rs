//! ### 18 - Packet Switched Data Services Commands
//!
//! A PDP context can be either primary or secondary. In LTE, PS data
//! connections are referred to as EPS bearers: EPS bearers are conceptually
//! equivalent to the legacy PDP contexts, which are often referred to for sake
//! of simplicity. The initial EPS bearer established during LTE attach
//! procedure is actually a default EPS bearer.

pub(crate) mod impl_;
pub mod responses;
pub mod types;
pub mod urc;

use super::{lines, NoResponse};
use atat::atat_derive::AtatCmd;
use atat::{AtatCmd, InternalError};
use heapless::{String, Vec};
use responses::{
    ApnBackoffTimer, ApnRateControl, CiotOptimizationConfig, EPSNetworkRegistrationStatus,
    GPRSAttached, GPRSNetworkRegistrationStatus, PDPContextDefinition, PDPContextDefinitions,
    PDPContextDynamicParameters, PDPContextDynamicParametersList, PDPContextStates,
};
use types::{
    AuthenticationType, CiotOptimization, CiotOptimizationUrcConfig, ContextId,
    EPSNetworkRegistrationUrcConfig, GPRSAttachedState, GPRSNetworkRegistrationUrcConfig,
    PDPContextStatus, PSEventReportingMode, RateControlExceptionReports,
    RateControlUplinkTimeUnit,
};

/// 18.4 PDP context definition +CGDCONT
///
/// Defines the connection parameters for a PDP context, identified by the
/// local context identification parameter <cid>. If the command is used only
/// with parameter <cid>, the corresponding PDP context becomes undefined.
#[derive(Clone, AtatCmd)]
#[at_cmd("+CGDCONT", NoResponse)]
pub struct SetPDPContextDefinition<'a> {
    #[at_arg(position = 0)]
    pub cid: ContextId,
    #[at_arg(position = 1, len = 8)]
    pub pdp_type: &'a str,
    #[at_arg(position = 2, len = 99)]
    pub apn: &'a str,
}

/// 18.4 PDP context definition +CGDCONT
///
/// The read command lists one `+CGDCONT:` row per defined context.
#[derive(Clone)]
pub struct GetPDPContextDefinitions;

impl AtatCmd for GetPDPContextDefinitions {
    type Response = PDPContextDefinitions;

    const MAX_LEN: usize = 14;

    fn write(&self, buf: &mut [u8]) -> usize {
        lines::write_cmd(buf, format_args!("+CGDCONT?"))
    }

    fn parse(&self, resp: Result<&[u8], InternalError>) -> Result<Self::Response, atat::Error> {
        let resp = resp.map_err(atat::Error::from)?;
        let mut contexts = Vec::new();
        for line in resp.split(|b| *b == b'\n').map(lines::trim) {
            if line.is_empty() {
                continue;
            }
            let mut f = lines::fields(line);
            let cid = f
                .next()
                .and_then(int::<u8>)
                .ok_or(atat::Error::Parse)?;
            let pdp_type = f.next().and_then(quoted).unwrap_or_default();
            let apn = f.next().and_then(quoted).unwrap_or_default();
            let pdp_addr = f
                .next()
                .and_then(quoted::<64>)
                .and_then(|s| impl_::parse_address(&s));
            contexts
                .push(PDPContextDefinition {
                    cid: ContextId(cid),
                    pdp_type,
                    apn,
                    pdp_addr,
                })
                .map_err(|_| atat::Error::Parse)?;
        }
        Ok(PDPContextDefinitions { contexts })
    }
}

/// 18.14 PDP context activate or deactivate +CGACT
///
/// Activates or deactivates the specified PDP context. After the command the
/// MT remains in AT command mode.
#[derive(Clone, AtatCmd)]
#[at_cmd("+CGACT", NoResponse, attempts = 1, timeout_ms = 150000, abortable = true)]
pub struct SetPDPContextState {
    #[at_arg(position = 0)]
    pub status: PDPContextStatus,
    #[at_arg(position = 1)]
    pub cid: Option<ContextId>,
}

/// 18.14 PDP context activate or deactivate +CGACT
#[derive(Clone)]
pub struct GetPDPContextStates;

impl AtatCmd for GetPDPContextStates {
    type Response = PDPContextStates;

    const MAX_LEN: usize = 12;

    fn write(&self, buf: &mut [u8]) -> usize {
        lines::write_cmd(buf, format_args!("+CGACT?"))
    }

    fn parse(&self, resp: Result<&[u8], InternalError>) -> Result<Self::Response, atat::Error> {
        let resp = resp.map_err(atat::Error::from)?;
        Ok(PDPContextStates {
            states: lines::parse_lines(resp)?,
        })
    }
}

/// 18.16 GPRS attach or detach +CGATT
///
/// Register (attach) the MT to, or deregister (detach) the MT from the GPRS
/// service.
#[derive(Clone, AtatCmd)]
#[at_cmd("+CGATT", NoResponse, attempts = 1, timeout_ms = 180000)]
pub struct SetGPRSAttached {
    #[at_arg(position = 0)]
    pub state: GPRSAttachedState,
}

/// 18.16 GPRS attach or detach +CGATT
#[derive(Clone, AtatCmd)]
#[at_cmd("+CGATT?", GPRSAttached, timeout_ms = 3000)]
pub struct GetGPRSAttached;

/// 18.25 Packet switched event reporting +CGEREP
///
/// Enables or disables the sending of the +CGEV URCs from MT to DTE.
#[derive(Clone, AtatCmd)]
#[at_cmd("+CGEREP", NoResponse)]
pub struct SetPacketSwitchedEventReporting {
    #[at_arg(position = 0)]
    pub mode: PSEventReportingMode,
    #[at_arg(position = 1)]
    pub bfr: Option<u8>,
}

/// 18.27 GPRS network registration status +CGREG
#[derive(Clone, AtatCmd)]
#[at_cmd("+CGREG", NoResponse)]
pub struct SetGPRSNetworkRegistrationStatus {
    #[at_arg(position = 0)]
    pub n: GPRSNetworkRegistrationUrcConfig,
}

/// 18.27 GPRS network registration status +CGREG
#[derive(Clone, AtatCmd)]
#[at_cmd("+CGREG?", GPRSNetworkRegistrationStatus)]
pub struct GetGPRSNetworkRegistrationStatus;

/// 18.36 EPS network registration status +CEREG
#[derive(Clone, AtatCmd)]
#[at_cmd("+CEREG", NoResponse)]
pub struct SetEPSNetworkRegistrationStatus {
    #[at_arg(position = 0)]
    pub n: EPSNetworkRegistrationUrcConfig,
}

/// 18.36 EPS network registration status +CEREG
#[derive(Clone, AtatCmd)]
#[at_cmd("+CEREG?", EPSNetworkRegistrationStatus)]
pub struct GetEPSNetworkRegistrationStatus;

/// 18.37 PDP context read dynamic parameters +CGCONTRDP
///
/// Returns the relevant information for an active non secondary PDP context
/// with the context identifier <cid>. If <cid> is omitted the parameters for
/// all active non secondary PDP contexts are returned.
#[derive(Clone)]
pub struct ReadDynamicParameters {
    pub cid: Option<ContextId>,
}

impl AtatCmd for ReadDynamicParameters {
    type Response = PDPContextDynamicParametersList;

    const MAX_LEN: usize = 20;

    fn write(&self, buf: &mut [u8]) -> usize {
        match self.cid {
            Some(ContextId(cid)) => lines::write_cmd(buf, format_args!("+CGCONTRDP={}", cid)),
            None => lines::write_cmd(buf, format_args!("+CGCONTRDP")),
        }
    }

    fn parse(&self, resp: Result<&[u8], InternalError>) -> Result<Self::Response, atat::Error> {
        let resp = resp.map_err(atat::Error::from)?;
        let mut params = Vec::new();
        for line in resp.split(|b| *b == b'\n').map(lines::trim) {
            if line.is_empty() {
                continue;
            }
            let p = parse_dynamic_parameters(line).ok_or(atat::Error::Parse)?;
            params.push(p).map_err(|_| atat::Error::Parse)?;
        }
        Ok(PDPContextDynamicParametersList { params })
    }
}

fn parse_dynamic_parameters(line: &[u8]) -> Option<PDPContextDynamicParameters> {
    let mut f = lines::fields(line);
    let mut p = PDPContextDynamicParameters {
        cid: int(f.next()?)?,
        bearer_id: int(f.next()?)?,
        apn: quoted(f.next()?)?,
        ..Default::default()
    };

    if let Some(local) = f.next().and_then(quoted::<160>) {
        if let Some((addr, mask)) = impl_::parse_address_and_mask(&local) {
            p.local_addr = Some(addr);
            p.local_subnet_mask = mask;
        }
    }
    p.gw_addr = next_addr(&mut f);
    p.dns_prim_addr = next_addr(&mut f);
    p.dns_sec_addr = next_addr(&mut f);
    p.p_cscf_prim_addr = next_addr(&mut f);
    p.p_cscf_sec_addr = next_addr(&mut f);
    p.im_cn_signalling_flag = f.next().and_then(int);
    p.lipa_indication = f.next().and_then(int);
    p.ipv4_mtu = f.next().and_then(int);
    p.wlan_offload = f.next().and_then(int);
    p.local_addr_ind = f.next().and_then(int);
    p.non_ip_mtu = f.next().and_then(int);
    p.serving_plmn_rate_control_value = f.next().and_then(int);
    Some(p)
}

/// 18.42 UE's CIoT EPS optimization +CCIOTOPT
#[derive(Clone, AtatCmd)]
#[at_cmd("+CCIOTOPT", NoResponse)]
pub struct SetCiotOptimizationConfig {
    #[at_arg(position = 0)]
    pub n: CiotOptimizationUrcConfig,
    #[at_arg(position = 1)]
    pub supported_ue_opt: CiotOptimization,
    #[at_arg(position = 2)]
    pub preferred_ue_opt: CiotOptimization,
}

/// 18.42 UE's CIoT EPS optimization +CCIOTOPT
#[derive(Clone, AtatCmd)]
#[at_cmd("+CCIOTOPT?", CiotOptimizationConfig)]
pub struct GetCiotOptimizationConfig;

/// 18.52 Define PDP context authentication parameters +CGAUTH
///
/// Allows the TE to specify authentication parameters for a PDP context
/// identified by the (local) context identification parameter <cid>.
#[derive(Clone, AtatCmd)]
#[at_cmd("+CGAUTH", NoResponse)]
pub struct SetPDPContextAuthentication<'a> {
    #[at_arg(position = 0)]
    pub cid: ContextId,
    #[at_arg(position = 1)]
    pub auth_prot: AuthenticationType,
    #[at_arg(position = 2, len = 64)]
    pub userid: &'a str,
    #[at_arg(position = 3, len = 64)]
    pub password: &'a str,
}

/// 18.47 Set authentication parameters +UAUTHREQ
///
/// u-blox variant of +CGAUTH, accepting automatic selection of the
/// authentication protocol.
#[derive(Clone, AtatCmd)]
#[at_cmd("+UAUTHREQ", NoResponse)]
pub struct SetAuthParameters<'a> {
    #[at_arg(position = 0)]
    pub cid: ContextId,
    #[at_arg(position = 1)]
    pub auth_type: AuthenticationType,
    #[at_arg(position = 2, len = 64)]
    pub username: &'a str,
    #[at_arg(position = 3, len = 64)]
    pub password: &'a str,
}

/// 10.1.51 APN rate control +CGAPNRC (3GPP TS 27.007)
///
/// Returns the APN rate control parameters of the context. A modem without
/// rate control answers with a bare OK.
#[derive(Clone)]
pub struct GetApnRateControl {
    pub cid: ContextId,
}

impl AtatCmd for GetApnRateControl {
    type Response = ApnRateControl;

    const MAX_LEN: usize = 20;

    fn write(&self, buf: &mut [u8]) -> usize {
        lines::write_cmd(buf, format_args!("+CGAPNRC={}", self.cid.0))
    }

    fn parse(&self, resp: Result<&[u8], InternalError>) -> Result<Self::Response, atat::Error> {
        let resp = resp.map_err(atat::Error::from)?;
        let mut rc = ApnRateControl::default();
        let line = lines::trim(resp);
        if line.is_empty() {
            return Ok(rc);
        }

        // <cid> is echoed back first
        let mut f = lines::fields(line).skip(1);
        if let Some(reports) = f.next().and_then(int::<u8>) {
            rc.reports = if reports == 0 {
                RateControlExceptionReports::NotAllowedToBeSent
            } else {
                RateControlExceptionReports::AllowedToBeSent
            };
            if let Some(unit) = f.next().and_then(int::<u8>) {
                rc.uplink_time_unit = RateControlUplinkTimeUnit::from_u8(unit)
                    .ok_or(atat::Error::Parse)?;
                rc.maximum_uplink_rate = f.next().and_then(int).unwrap_or(0);
            }
        }
        Ok(rc)
    }
}

/// 10.1.52 APN back-off timer read dynamic parameters +CABTRDP
/// (3GPP TS 27.007)
#[derive(Clone)]
pub struct GetApnBackoffTimer<'a> {
    pub apn: &'a str,
}

impl<'a> AtatCmd for GetApnBackoffTimer<'a> {
    type Response = ApnBackoffTimer;

    const MAX_LEN: usize = 116;

    fn write(&self, buf: &mut [u8]) -> usize {
        lines::write_cmd(buf, format_args!("+CABTRDP=\"{}\"", self.apn))
    }

    fn parse(&self, resp: Result<&[u8], InternalError>) -> Result<Self::Response, atat::Error> {
        let resp = resp.map_err(atat::Error::from)?;
        let line = lines::trim(resp);
        // <APN>,<residual_backoff_time>,...
        let residual_backoff_time = lines::fields(line)
            .nth(1)
            .and_then(int)
            .unwrap_or(0);
        Ok(ApnBackoffTimer {
            residual_backoff_time,
        })
    }
}

fn next_addr<'a>(f: &mut impl Iterator<Item = &'a [u8]>) -> Option<no_std_net::IpAddr> {
    f.next()
        .and_then(quoted::<64>)
        .and_then(|s| impl_::parse_address(&s))
}

fn int<T: core::str::FromStr>(field: &[u8]) -> Option<T> {
    core::str::from_utf8(field).ok()?.parse().ok()
}

fn quoted<const N: usize>(field: &[u8]) -> Option<String<N>> {
    let s = core::str::from_utf8(lines::unquote(field)).ok()?;
    String::try_from(s).ok()
}
