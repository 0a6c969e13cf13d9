//! Vendor profiles.
//!
//! A profile is mostly data: timing constants and a [`PropertyTable`]. The
//! few behaviours that genuinely differ between vendors (user
//! authentication, PDP type names, operation timeouts) are trait methods with
//! a 3GPP default.

#[cfg(any(feature = "any-module", feature = "lara-r6"))]
pub(crate) mod lara_r6;
#[cfg(any(feature = "any-module", feature = "sara-r5"))]
pub(crate) mod sara_r5;

#[cfg(any(feature = "any-module", feature = "lara-r6"))]
pub use lara_r6::LaraR6;
#[cfg(any(feature = "any-module", feature = "sara-r5"))]
pub use sara_r5::SaraR5;

use atat::asynch::AtatClient;
use embassy_time::Duration;

use crate::{
    command::{
        general::responses::ModelId,
        mobile_control::types::Functionality,
        psn::{
            types::{AuthenticationType, ContextId},
            SetPDPContextAuthentication,
        },
    },
    config::Credentials,
    context::PdpType,
    error::Error,
    properties::{Property, PropertyTable},
    registration::RadioAccessTechnology,
    AtLock,
};

/// Long running operations a context may wait on, each with its own bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ContextOperation {
    Invalid = -1,
    DeviceReady = 0,
    SimReady = 1,
    Register = 2,
    Attach = 3,
    Connect = 4,
}

impl From<i32> for ContextOperation {
    fn from(v: i32) -> Self {
        match v {
            0 => Self::DeviceReady,
            1 => Self::SimReady,
            2 => Self::Register,
            3 => Self::Attach,
            4 => Self::Connect,
            _ => Self::Invalid,
        }
    }
}

/// Capabilities of a plain 3GPP TS 27.007 modem.
pub const GENERIC_PROPERTIES: PropertyTable = PropertyTable::EMPTY
    .with(Property::CReg, 1)
    .with(Property::CGReg, 1)
    .with(Property::CEReg, 1)
    .with(Property::AtCgauth, 1)
    .with(Property::AtCnmi, 1)
    .with(Property::AtCmgf, 1)
    .with(Property::Ipv4PdpType, 1)
    .with(Property::Ipv6PdpType, 1)
    .with(Property::Ipv4v6PdpType, 1)
    .with(Property::AtCgerep, 1)
    .with(Property::SocketCount, 7)
    .with(Property::IpTcp, 1)
    .with(Property::IpUdp, 1);

pub trait ModuleParams: Copy {
    /// The time for which PWR_ON must be pulled down to effect power-on
    fn power_on_pull_time(&self) -> Option<Duration> {
        None
    }

    /// The time for which PWR_ON must be pulled down to effect power-off
    fn power_off_pull_time(&self) -> Duration {
        Duration::from_millis(3100)
    }

    /// How long to wait before the module is ready after boot
    fn boot_wait(&self) -> Duration {
        Duration::from_secs(5)
    }

    /// How long the reset line has to be held for to reset the cellular module
    fn reset_hold(&self) -> Duration {
        Duration::from_millis(16500)
    }

    /// Backoff between the attempts of the device liveness commands
    fn command_retry_backoff(&self) -> Duration {
        Duration::from_millis(100)
    }

    /// The type of AT+CFUN state to use to switch the radio off: either 0 for
    /// truly off or 4 for "airplane" mode
    fn radio_off_cfun(&self) -> Functionality {
        Functionality::AirplaneMode
    }

    /// Capabilities of the module
    fn properties(&self) -> PropertyTable {
        GENERIC_PROPERTIES
    }

    /// Upper bound for a context waiting on `op`
    fn operation_timeout(&self, op: ContextOperation) -> Duration {
        match op {
            ContextOperation::DeviceReady | ContextOperation::SimReady => {
                Duration::from_millis(300_000)
            }
            _ => Duration::from_millis(1_800_000),
        }
    }

    /// `<PDP_type>` string of `+CGDCONT`
    fn pdp_type_str(&self, pdp_type: PdpType) -> &'static str {
        match pdp_type {
            PdpType::Ipv4 => "IP",
            PdpType::Ipv6 => "IPV6",
            PdpType::Ipv4v6 => "IPV4V6",
            PdpType::NonIp => "Non-IP",
        }
    }

    /// Parse a `<PDP_type>` string as reported by `+CGDCONT?`.
    fn parse_pdp_type(&self, s: &str) -> Option<PdpType> {
        match s {
            "IP" => Some(PdpType::Ipv4),
            "IPV6" => Some(PdpType::Ipv6),
            "IPV4V6" => Some(PdpType::Ipv4v6),
            s if s.eq_ignore_ascii_case("non-ip") => Some(PdpType::NonIp),
            _ => None,
        }
    }

    /// Configure user authentication for `cid`.
    async fn authenticate<AT: AtatClient>(
        &self,
        at: &mut AtLock<'_, AT>,
        cid: ContextId,
        credentials: &Credentials,
    ) -> Result<(), Error> {
        // `+CGAUTH` knows no automatic selection
        let auth_prot = match credentials.auth_type {
            AuthenticationType::Auto => AuthenticationType::CHAP,
            t => t,
        };
        at.send(&SetPDPContextAuthentication {
            cid,
            auth_prot,
            userid: &credentials.username,
            password: &credentials.password,
        })
        .await?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Module {
    #[cfg(any(feature = "any-module", feature = "lara-r6"))]
    LaraR6(lara_r6::LaraR6),
    #[cfg(any(feature = "any-module", feature = "sara-r5"))]
    SaraR5(sara_r5::SaraR5),
    Generic(Generic),
}

impl Module {
    pub fn from_model_id(model_id: &ModelId) -> Self {
        match model_id.model.as_slice() {
            #[cfg(any(feature = "any-module", feature = "lara-r6"))]
            id if id.starts_with(b"LARA-R6") => Self::LaraR6(lara_r6::LaraR6),
            #[cfg(any(feature = "any-module", feature = "sara-r5"))]
            id if id.starts_with(b"SARA-R5") => Self::SaraR5(sara_r5::SaraR5),
            id => {
                warn!(
                    "Attempting to run {:?} using generic module parameters! This may or may not work.",
                    id
                );
                Self::Generic(Generic)
            }
        }
    }
}

macro_rules! inner {
    ($self: ident, $fn: ident $(, $arg: expr)*) => {
        match $self {
            #[cfg(any(feature = "any-module", feature = "lara-r6"))]
            Self::LaraR6(inner) => inner.$fn($($arg),*),
            #[cfg(any(feature = "any-module", feature = "sara-r5"))]
            Self::SaraR5(inner) => inner.$fn($($arg),*),
            Self::Generic(inner) => inner.$fn($($arg),*),
        }
    };
}

impl ModuleParams for Module {
    fn power_on_pull_time(&self) -> Option<Duration> {
        inner!(self, power_on_pull_time)
    }

    fn power_off_pull_time(&self) -> Duration {
        inner!(self, power_off_pull_time)
    }

    fn boot_wait(&self) -> Duration {
        inner!(self, boot_wait)
    }

    fn reset_hold(&self) -> Duration {
        inner!(self, reset_hold)
    }

    fn command_retry_backoff(&self) -> Duration {
        inner!(self, command_retry_backoff)
    }

    fn radio_off_cfun(&self) -> Functionality {
        inner!(self, radio_off_cfun)
    }

    fn properties(&self) -> PropertyTable {
        inner!(self, properties)
    }

    fn operation_timeout(&self, op: ContextOperation) -> Duration {
        inner!(self, operation_timeout, op)
    }

    fn pdp_type_str(&self, pdp_type: PdpType) -> &'static str {
        inner!(self, pdp_type_str, pdp_type)
    }

    fn parse_pdp_type(&self, s: &str) -> Option<PdpType> {
        inner!(self, parse_pdp_type, s)
    }

    async fn authenticate<AT: AtatClient>(
        &self,
        at: &mut AtLock<'_, AT>,
        cid: ContextId,
        credentials: &Credentials,
    ) -> Result<(), Error> {
        match self {
            #[cfg(any(feature = "any-module", feature = "lara-r6"))]
            Self::LaraR6(inner) => inner.authenticate(at, cid, credentials).await,
            #[cfg(any(feature = "any-module", feature = "sara-r5"))]
            Self::SaraR5(inner) => inner.authenticate(at, cid, credentials).await,
            Self::Generic(inner) => inner.authenticate(at, cid, credentials).await,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Generic;

impl ModuleParams for Generic {}

/// Radio access technologies selectable through the `AccessTechnology`
/// property mask.
pub(crate) const fn rat_mask(rats: &[RadioAccessTechnology]) -> u32 {
    let mut mask = 0;
    let mut i = 0;
    while i < rats.len() {
        mask |= 1 << rats[i] as u32;
        i += 1;
    }
    mask
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_timeouts() {
        assert_eq!(
            Generic.operation_timeout(ContextOperation::from(1)),
            Duration::from_millis(300_000)
        );
        assert_eq!(
            Generic.operation_timeout(ContextOperation::from(0)),
            Duration::from_millis(300_000)
        );
        assert_eq!(
            Generic.operation_timeout(ContextOperation::from(-1)),
            Duration::from_millis(1_800_000)
        );
        assert_eq!(
            Generic.operation_timeout(ContextOperation::Connect),
            Duration::from_millis(1_800_000)
        );
    }

    #[test]
    fn pdp_type_names() {
        assert_eq!(Generic.pdp_type_str(PdpType::Ipv4), "IP");
        assert_eq!(Generic.parse_pdp_type("IPV4V6"), Some(PdpType::Ipv4v6));
        assert_eq!(Generic.parse_pdp_type("Non-IP"), Some(PdpType::NonIp));
        assert_eq!(Generic.parse_pdp_type(""), None);
        assert_eq!(Generic.parse_pdp_type("PPP"), None);
    }

    #[test]
    fn unknown_model_runs_generic() {
        let id = ModelId {
            model: atat::heapless_bytes::Bytes::from_slice(b"ACME-X1").unwrap(),
        };
        assert!(matches!(Module::from_model_id(&id), Module::Generic(_)));
        assert_eq!(
            Module::Generic(Generic).boot_wait(),
            Generic.boot_wait()
        );
    }

    #[test]
    fn rat_mask_sets_one_bit_per_technology() {
        assert_eq!(
            rat_mask(&[RadioAccessTechnology::Gsm, RadioAccessTechnology::Eutran]),
            0b1000_0001
        );
    }
}
