//! Argument and parameter types used by Packet Switched Data Services Commands and Responses
use atat::atat_derive::{AtatEnum, AtatLen};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize, AtatLen)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ContextId(pub u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, AtatEnum)]
pub enum PDPContextStatus {
    /// 0: deactivated
    Deactivated = 0,
    /// 1: activated
    Activated = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, AtatEnum)]
pub enum GPRSAttachedState {
    Detached = 0,
    Attached = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, AtatEnum)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AuthenticationType {
    /// (factory-programmed value): none
    #[default]
    None = 0,
    /// PAP
    PAP = 1,
    /// CHAP
    CHAP = 2,
    /// automatic selection of authentication type (none/CHAP/PAP)
    Auto = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, AtatEnum)]
pub enum GPRSNetworkRegistrationUrcConfig {
    /// • 0 (default value): network registration URC disabled
    UrcDisabled = 0,
    /// • 1: network registration URC +CGREG: <stat> enabled
    UrcEnabled = 1,
    /// • 2: network registration and location information URC +CGREG:
    ///   <stat>[,<lac>,<ci>[,<AcT>,<rac>]] enabled
    UrcVerbose = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, AtatEnum)]
pub enum EPSNetworkRegistrationUrcConfig {
    /// • 0 (default value): network registration URC disabled
    UrcDisabled = 0,
    /// • 1: network registration URC +CEREG: <stat> enabled
    UrcEnabled = 1,
    /// • 2: network registration and location information URC +CEREG:
    ///   <stat>[,[<tac>],[<ci>],[<AcT>]] enabled
    UrcVerbose = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, AtatEnum)]
pub enum PSEventReportingMode {
    /// • 0 (default value): buffer the +CGEV URCs in the MT; if the buffer is
    ///   full the oldest ones will be discarded
    BufferUrcs = 0,
    /// • 1: discard the +CGEV URCs when MT-DTE link is reserved; otherwise
    ///   forward them directly to the DTE
    DiscardUrcsWhenLinkReserved = 1,
    /// • 2: buffer the +CGEV URCs in the MT when MT-DTE link is reserved and
    ///   flush them to the DTE when the link becomes available
    BufferUrcsWhenLinkReserved = 2,
}

/// Additional exception reports flag of +CGAPNRC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RateControlExceptionReports {
    #[default]
    NotAllowedToBeSent = 0,
    AllowedToBeSent = 1,
}

/// Uplink time unit of +CGAPNRC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RateControlUplinkTimeUnit {
    #[default]
    Unrestricted = 0,
    Minute = 1,
    Hour = 2,
    Day = 3,
    Week = 4,
}

impl RateControlUplinkTimeUnit {
    pub fn from_u8(v: u8) -> Option<Self> {
        Some(match v {
            0 => Self::Unrestricted,
            1 => Self::Minute,
            2 => Self::Hour,
            3 => Self::Day,
            4 => Self::Week,
            _ => return None,
        })
    }
}

/// CIoT EPS optimisation bitmask used by +CCIOTOPT
#[derive(Debug, Clone, Copy, PartialEq, Eq, AtatEnum)]
pub enum CiotOptimization {
    /// 0: no support
    None = 0,
    /// 1: support for control plane CIoT EPS optimization
    ControlPlane = 1,
    /// 2: support for user plane CIoT EPS optimization
    UserPlane = 2,
    /// 3: support for both control plane and user plane CIoT EPS optimization
    Both = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, AtatEnum)]
pub enum CiotOptimizationUrcConfig {
    /// 0: no change in current setting of reporting
    NoChange = 0,
    /// 1: enable reporting of supported network CIoT EPS optimizations
    Enable = 1,
    /// 3: disable reporting and reset the parameters to default
    DisableAndReset = 3,
}

/// The `<event>` token of a +CGEV URC, with the parameter that is glued to
/// it by a space where the event carries one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PacketDomainEventKind {
    NetworkDetach,
    MeDetach,
    NetworkPdnActivated(Option<u8>),
    MePdnActivated(Option<u8>),
    NetworkPdnDeactivated(Option<u8>),
    MePdnDeactivated(Option<u8>),
    /// `NW DEACT <p_cid>`; the deactivated `<cid>` follows as a field
    NetworkDeactivated(Option<u8>),
    MeDeactivated(Option<u8>),
    NetworkActivated(Option<u8>),
    MeActivated(Option<u8>),
    NetworkClass,
    MeClass,
    Other,
}

impl PacketDomainEventKind {
    pub(crate) fn from_bytes(value: &[u8]) -> Self {
        const PREFIXES: &[(&[u8], fn(Option<u8>) -> PacketDomainEventKind)] = &[
            (b"NW PDN ACT" as &[u8], PacketDomainEventKind::NetworkPdnActivated),
            (b"ME PDN ACT" as &[u8], PacketDomainEventKind::MePdnActivated),
            (b"NW PDN DEACT" as &[u8], PacketDomainEventKind::NetworkPdnDeactivated),
            (b"ME PDN DEACT" as &[u8], PacketDomainEventKind::MePdnDeactivated),
            (b"NW DEACT" as &[u8], PacketDomainEventKind::NetworkDeactivated),
            (b"ME DEACT" as &[u8], PacketDomainEventKind::MeDeactivated),
            (b"NW ACT" as &[u8], PacketDomainEventKind::NetworkActivated),
            (b"ME ACT" as &[u8], PacketDomainEventKind::MeActivated),
        ];

        let value = super::super::lines::trim(value);
        match value {
            b"NW DETACH" => return Self::NetworkDetach,
            b"ME DETACH" => return Self::MeDetach,
            _ => {}
        }
        if value.starts_with(b"NW CLASS") {
            return Self::NetworkClass;
        }
        if value.starts_with(b"ME CLASS") {
            return Self::MeClass;
        }

        for (prefix, ctor) in PREFIXES {
            if let Some(rest) = value.strip_prefix(*prefix) {
                // The token must end at a space or at the end of the field
                if !rest.is_empty() && rest[0] != b' ' {
                    continue;
                }
                let id = core::str::from_utf8(super::super::lines::trim(rest))
                    .ok()
                    .and_then(|s| s.parse().ok());
                return ctor(id);
            }
        }
        Self::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packet_domain_event_tokens() {
        assert_eq!(
            PacketDomainEventKind::from_bytes(b"NW PDN DEACT 1"),
            PacketDomainEventKind::NetworkPdnDeactivated(Some(1))
        );
        assert_eq!(
            PacketDomainEventKind::from_bytes(b"ME PDN DEACT"),
            PacketDomainEventKind::MePdnDeactivated(None)
        );
        assert_eq!(
            PacketDomainEventKind::from_bytes(b"NW DEACT 2"),
            PacketDomainEventKind::NetworkDeactivated(Some(2))
        );
        assert_eq!(
            PacketDomainEventKind::from_bytes(b"NW PDN DEACT x"),
            PacketDomainEventKind::NetworkPdnDeactivated(None)
        );
        assert_eq!(
            PacketDomainEventKind::from_bytes(b"NW DETACH"),
            PacketDomainEventKind::NetworkDetach
        );
        assert_eq!(
            PacketDomainEventKind::from_bytes(b"ME CLASS B"),
            PacketDomainEventKind::MeClass
        );
        assert_eq!(
            PacketDomainEventKind::from_bytes(b"REJECT \"IP\""),
            PacketDomainEventKind::Other
        );
    }
}
