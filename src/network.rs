//! Registration, attach and operator handling.

use atat::asynch::AtatClient;
use heapless::{String, Vec};

use crate::{
    command::{
        network_service::{
            self,
            types::{NetworkRegistrationUrcConfig, OperatorSelectionMode, RatSelection},
            GetNetworkRegistrationStatus, GetOperatorSelection, GetSignalQuality, ScanOperators,
            SetNetworkRegistrationStatus, SetOperatorSelection, SetRadioAccessTechnology,
        },
        psn::{
            responses::CiotOptimizationConfig,
            types::{
                CiotOptimization, CiotOptimizationUrcConfig, EPSNetworkRegistrationUrcConfig,
                GPRSAttachedState, GPRSNetworkRegistrationUrcConfig, PSEventReportingMode,
            },
            GetCiotOptimizationConfig, GetEPSNetworkRegistrationStatus, GetGPRSAttached,
            GetGPRSNetworkRegistrationStatus, SetCiotOptimizationConfig,
            SetEPSNetworkRegistrationStatus, SetGPRSAttached, SetGPRSNetworkRegistrationStatus,
            SetPacketSwitchedEventReporting,
        },
    },
    config::OperatorFormat,
    error::Error,
    event::{emit, ConnectionStatus, Event, StatusCallback},
    modules::ModuleParams,
    properties::{Property, PropertyTable},
    registration::{RegistrationChange, RegistrationParams, Status},
    state, AtHandle,
};

pub use crate::registration::{RadioAccessTechnology, RegType};

pub const MAX_OPERATORS: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AttachStatus {
    Detached,
    Attached,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OperatorStatus {
    Unknown,
    Available,
    Current,
    Forbidden,
}

impl From<u8> for OperatorStatus {
    fn from(v: u8) -> Self {
        match v {
            1 => Self::Available,
            2 => Self::Current,
            3 => Self::Forbidden,
            _ => Self::Unknown,
        }
    }
}

/// One entry of an operator scan.
#[derive(Debug, Clone, PartialEq)]
pub struct Operator {
    pub status: OperatorStatus,
    pub long_name: String<24>,
    pub short_name: String<10>,
    pub numeric: String<6>,
    pub act: Option<RadioAccessTechnology>,
}

/// Currently selected operator.
#[derive(Debug, Clone, PartialEq)]
pub struct OperatorParams {
    pub mode: OperatorSelectionMode,
    pub format: Option<u8>,
    pub name: Option<String<24>>,
    pub act: Option<RadioAccessTechnology>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SignalQuality {
    /// Received signal strength in dBm, `None` when not detectable
    pub rssi: Option<i16>,
    /// Channel bit error rate (0-7), `None` when not known
    pub ber: Option<u8>,
}

impl From<network_service::responses::SignalQuality> for SignalQuality {
    fn from(v: network_service::responses::SignalQuality) -> Self {
        Self {
            rssi: match v.rssi {
                99 => None,
                r => Some(-113 + 2 * r as i16),
            },
            ber: match v.ber {
                99 => None,
                b => Some(b),
            },
        }
    }
}

/// Network sub-object of a [`Device`](crate::device::Device).
pub struct Network<'d, AT: AtatClient, M: ModuleParams> {
    at: AtHandle<'d, AT>,
    ch: state::Runner<'d>,
    module: M,
    properties: PropertyTable,
    sink: Option<StatusCallback<'d>>,
}

impl<'d, AT: AtatClient, M: ModuleParams> Clone for Network<'d, AT, M> {
    fn clone(&self) -> Self {
        Self {
            at: self.at,
            ch: self.ch.clone(),
            module: self.module,
            properties: self.properties,
            sink: self.sink,
        }
    }
}

impl<'d, AT: AtatClient, M: ModuleParams> Network<'d, AT, M> {
    pub(crate) fn new(
        at: AtHandle<'d, AT>,
        ch: state::Runner<'d>,
        module: M,
        properties: PropertyTable,
        sink: Option<StatusCallback<'d>>,
    ) -> Self {
        Self {
            at,
            ch,
            module,
            properties,
            sink,
        }
    }

    fn require(&self, property: Property) -> Result<u32, Error> {
        match self.properties.get(property) {
            0 => Err(Error::Unsupported),
            v => Ok(v),
        }
    }

    /// Registration parameters of `reg_type`, refreshed from the modem, or
    /// with `None` the cached parameters of the supported family that takes
    /// precedence (EPS, then GPRS, then circuit switched), preferring a
    /// registered family.
    pub async fn get_registration_params(
        &self,
        reg_type: Option<RegType>,
    ) -> Result<RegistrationParams, Error> {
        let Some(reg_type) = reg_type else {
            return combined_registration(&self.ch.registration(), &self.properties);
        };

        self.require(reg_type.into())?;
        let params = query_registration(&self.at, reg_type).await?;
        apply_registration(&self.ch, self.sink, params.clone());
        Ok(params)
    }

    /// Registration status of every supported family, as last seen.
    pub fn is_registered(&self) -> bool {
        self.ch.registration().is_registered()
    }

    /// Enable or disable registration URCs of `reg_type`, at the level of
    /// detail the property table allows.
    pub async fn set_registration_urc(&self, reg_type: RegType, on: bool) -> Result<(), Error> {
        let mode = self.require(reg_type.into())?;
        set_registration_urc(&self.at, reg_type, if on { mode } else { 0 }).await
    }

    pub async fn set_access_technology(&self, rat: RadioAccessTechnology) -> Result<(), Error> {
        let mask = self.require(Property::AccessTechnology)?;
        if mask & rat.mask() == 0 {
            return Err(Error::Unsupported);
        }
        let selected_act = match rat {
            RadioAccessTechnology::Gsm
            | RadioAccessTechnology::GsmCompact
            | RadioAccessTechnology::Egprs => RatSelection::Gsm,
            RadioAccessTechnology::Utran
            | RadioAccessTechnology::Hsdpa
            | RadioAccessTechnology::Hsupa
            | RadioAccessTechnology::HsdpaHsupa => RatSelection::Umts,
            RadioAccessTechnology::Eutran => RatSelection::Lte,
            RadioAccessTechnology::CatM1 => RatSelection::LteCatM1,
            RadioAccessTechnology::Nb1 => RatSelection::LteCatNb1,
            RadioAccessTechnology::Unknown => return Err(Error::Parameter),
        };
        self.at.send(&SetRadioAccessTechnology { selected_act }).await?;
        Ok(())
    }

    /// Scan for operators.
    ///
    /// An access technology that can't be mapped stops the interpretation
    /// of the scan: that entry and every following one are kept, but with an
    /// unknown status and no access technology.
    pub async fn scan_plmn(&self) -> Result<Vec<Operator, MAX_OPERATORS>, Error> {
        let list = self.at.send(&ScanOperators).await?;

        let mut degraded = false;
        let mut operators = Vec::new();
        for op in list.operators {
            let act = match op.act {
                None => None,
                Some(act) => {
                    let rat = RadioAccessTechnology::from_act(act);
                    if rat.is_none() && !degraded {
                        warn!("Unknown access technology {} in operator scan", act);
                        degraded = true;
                    }
                    rat
                }
            };
            let (status, act) = if degraded {
                (OperatorStatus::Unknown, None)
            } else {
                (OperatorStatus::from(op.stat), act)
            };
            // Both lists share the same capacity
            let _ = operators.push(Operator {
                status,
                long_name: op.long,
                short_name: op.short,
                numeric: op.numeric,
                act,
            });
        }
        Ok(operators)
    }

    /// Register automatically, or manually on `plmn`.
    pub async fn set_registration(&self, plmn: Option<&str>) -> Result<(), Error> {
        set_registration(&self.at, &self.properties, plmn, None).await
    }

    pub async fn get_operator_params(&self) -> Result<OperatorParams, Error> {
        let sel = self.at.send(&GetOperatorSelection).await?;
        Ok(OperatorParams {
            mode: sel.mode,
            format: sel.format,
            name: sel.oper,
            act: sel.act.and_then(RadioAccessTechnology::from_act),
        })
    }

    /// Attach to the packet domain, unless already attached.
    pub async fn set_attach(&self) -> Result<(), Error> {
        set_attach(&self.at).await?;
        self.ch.set_attached(true);
        emit(self.sink, Event::AttachStatus(AttachStatus::Attached));
        Ok(())
    }

    pub async fn get_attach(&self) -> Result<AttachStatus, Error> {
        let res = self.at.send(&GetGPRSAttached).await?;
        Ok(match res.state {
            GPRSAttachedState::Attached => AttachStatus::Attached,
            GPRSAttachedState::Detached => AttachStatus::Detached,
        })
    }

    pub async fn detach(&self) -> Result<(), Error> {
        self.at
            .send(&SetGPRSAttached {
                state: GPRSAttachedState::Detached,
            })
            .await?;
        self.ch.set_attached(false);
        emit(self.sink, Event::AttachStatus(AttachStatus::Detached));
        Ok(())
    }

    pub async fn get_signal_quality(&self) -> Result<SignalQuality, Error> {
        Ok(self.at.send(&GetSignalQuality).await?.into())
    }

    pub async fn set_packet_domain_event_reporting(&self, on: bool) -> Result<(), Error> {
        self.require(Property::AtCgerep)?;
        let mode = if on {
            PSEventReportingMode::DiscardUrcsWhenLinkReserved
        } else {
            PSEventReportingMode::BufferUrcs
        };
        self.at
            .send(&SetPacketSwitchedEventReporting { mode, bfr: None })
            .await?;
        Ok(())
    }

    pub async fn set_ciot_optimization_config(
        &self,
        supported: CiotOptimization,
        preferred: CiotOptimization,
    ) -> Result<(), Error> {
        self.at
            .send(&SetCiotOptimizationConfig {
                n: CiotOptimizationUrcConfig::Enable,
                supported_ue_opt: supported,
                preferred_ue_opt: preferred,
            })
            .await?;
        Ok(())
    }

    pub async fn get_ciot_optimization_config(&self) -> Result<CiotOptimizationConfig, Error> {
        self.at.send(&GetCiotOptimizationConfig).await
    }

    #[allow(dead_code)]
    pub(crate) fn module(&self) -> M {
        self.module
    }
}

pub(crate) async fn query_registration<AT: AtatClient>(
    at: &AtHandle<'_, AT>,
    reg_type: RegType,
) -> Result<RegistrationParams, Error> {
    Ok(match reg_type {
        RegType::Creg => at.send(&GetNetworkRegistrationStatus).await?.into(),
        RegType::Cgreg => at.send(&GetGPRSNetworkRegistrationStatus).await?.into(),
        RegType::Cereg => at.send(&GetEPSNetworkRegistrationStatus).await?.into(),
    })
}

/// `mode` is the property-table encoding: 0 off, 1 status only, 2 with
/// location.
pub(crate) async fn set_registration_urc<AT: AtatClient>(
    at: &AtHandle<'_, AT>,
    reg_type: RegType,
    mode: u32,
) -> Result<(), Error> {
    match reg_type {
        RegType::Creg => {
            at.send(&SetNetworkRegistrationStatus {
                n: NetworkRegistrationUrcConfig::from_mode(mode),
            })
            .await?;
        }
        RegType::Cgreg => {
            let n = match mode {
                0 => GPRSNetworkRegistrationUrcConfig::UrcDisabled,
                1 => GPRSNetworkRegistrationUrcConfig::UrcEnabled,
                _ => GPRSNetworkRegistrationUrcConfig::UrcVerbose,
            };
            at.send(&SetGPRSNetworkRegistrationStatus { n }).await?;
        }
        RegType::Cereg => {
            let n = match mode {
                0 => EPSNetworkRegistrationUrcConfig::UrcDisabled,
                1 => EPSNetworkRegistrationUrcConfig::UrcEnabled,
                _ => EPSNetworkRegistrationUrcConfig::UrcVerbose,
            };
            at.send(&SetEPSNetworkRegistrationStatus { n }).await?;
        }
    }
    Ok(())
}

pub(crate) async fn set_registration<AT: AtatClient>(
    at: &AtHandle<'_, AT>,
    properties: &PropertyTable,
    plmn: Option<&str>,
    format: Option<OperatorFormat>,
) -> Result<(), Error> {
    match plmn {
        None => {
            let current = at.send(&GetOperatorSelection).await?;
            if current.mode != OperatorSelectionMode::Automatic {
                debug!("Switching to automatic operator selection");
                at.send(&SetOperatorSelection {
                    mode: OperatorSelectionMode::Automatic,
                    format: format.map(|f| f as u8),
                    oper: None,
                })
                .await?;
            }
        }
        Some(plmn) => {
            if plmn.is_empty() || plmn.len() > 6 || !plmn.bytes().all(|b| b.is_ascii_digit()) {
                return Err(Error::Parameter);
            }
            let mode = if properties.is_supported(Property::AtCopsFallbackAuto) {
                OperatorSelectionMode::ManualAutomatic
            } else {
                OperatorSelectionMode::Manual
            };
            debug!("Manual registration on {}", plmn);
            at.send(&SetOperatorSelection {
                mode,
                format: Some(2),
                oper: Some(plmn),
            })
            .await?;
        }
    }
    Ok(())
}

pub(crate) async fn set_attach<AT: AtatClient>(at: &AtHandle<'_, AT>) -> Result<(), Error> {
    let res = at.send(&GetGPRSAttached).await?;
    if res.state != GPRSAttachedState::Attached {
        debug!("Attaching to the packet domain");
        at.send(&SetGPRSAttached {
            state: GPRSAttachedState::Attached,
        })
        .await?;
    }
    Ok(())
}

/// Cached registration of the supported family that takes precedence.
pub(crate) fn combined_registration(
    state: &crate::registration::RegistrationState,
    properties: &PropertyTable,
) -> Result<RegistrationParams, Error> {
    let mut supported = RegType::PRECEDENCE
        .iter()
        .copied()
        .filter(|t| properties.is_supported((*t).into()))
        .peekable();

    let first = *supported.peek().ok_or(Error::Unsupported)?;
    let chosen = supported
        .find(|t| state.params(*t).status.is_registered())
        .unwrap_or(first);
    Ok(state.params(chosen))
}

/// Fold `params` into the registration cache and raise the resulting
/// events.
pub(crate) fn apply_registration(
    ch: &state::Runner<'_>,
    sink: Option<StatusCallback<'_>>,
    params: RegistrationParams,
) -> RegistrationChange {
    let reg_type = params.reg_type;
    let status = params.status;
    let act = params.act;
    let cell_id = params.cell_id.clone();

    let (change, previous) = ch.update_registration_with(|r| {
        let previous = r.params(reg_type).status;
        (r.compare_and_set(params), previous)
    });

    if change.act {
        emit(sink, Event::RadioAccessTechnologyChanged { reg_type, act });
    }
    if change.status {
        info!("{:?} registration: {:?} -> {:?}", reg_type, previous, status);
        emit(sink, Event::RegistrationStatusChanged { reg_type, status });

        // Losing packet domain registration takes every data session down
        if reg_type != RegType::Creg
            && previous.is_registered()
            && status == Status::NotRegistering
        {
            emit(
                sink,
                Event::Connection {
                    context: None,
                    status: ConnectionStatus::Disconnected,
                },
            );
        }
    }
    if change.cell_id {
        if let Some(cell_id) = cell_id {
            emit(sink, Event::CellIdChanged { reg_type, cell_id });
        }
    }
    change
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        modules::GENERIC_PROPERTIES,
        test_helpers::{init_logger, sent, MockAtClient, TestConfig, TestModule},
        Resources,
    };
    use core::cell::RefCell;
    use embassy_futures::block_on;

    #[test]
    fn registration_urc_is_unsupported_without_property() {
        init_logger();
        let mut resources = Resources::new(MockAtClient::new());
        let properties = GENERIC_PROPERTIES.with(Property::CGReg, 0);
        let (device, _sm) = crate::new(&mut resources, TestConfig, TestModule, properties, None);
        let network = device.open_network();

        assert_eq!(
            block_on(network.set_registration_urc(RegType::Cgreg, true)),
            Err(Error::Unsupported)
        );
        assert_eq!(
            block_on(network.set_access_technology(RadioAccessTechnology::Eutran)),
            Err(Error::Unsupported)
        );
        assert_eq!(
            block_on(network.get_registration_params(Some(RegType::Cgreg))),
            Err(Error::Unsupported)
        );
        assert!(sent(&device.at).is_empty());
    }

    #[test]
    fn registration_urc_uses_property_level() {
        let mut resources = Resources::new(MockAtClient::new().ok(b""));
        let properties = GENERIC_PROPERTIES.with(Property::CEReg, 2);
        let (device, _sm) = crate::new(&mut resources, TestConfig, TestModule, properties, None);
        let network = device.open_network();

        block_on(network.set_registration_urc(RegType::Cereg, true)).unwrap();
        assert_eq!(sent(&device.at), ["AT+CEREG=2"]);
    }

    #[test]
    fn access_technology_checks_mask() {
        let mut resources = Resources::new(MockAtClient::new().ok(b""));
        let properties = GENERIC_PROPERTIES.with(
            Property::AccessTechnology,
            RadioAccessTechnology::CatM1.mask() | RadioAccessTechnology::Nb1.mask(),
        );
        let (device, _sm) = crate::new(&mut resources, TestConfig, TestModule, properties, None);
        let network = device.open_network();

        assert_eq!(
            block_on(network.set_access_technology(RadioAccessTechnology::Gsm)),
            Err(Error::Unsupported)
        );
        block_on(network.set_access_technology(RadioAccessTechnology::Nb1)).unwrap();
        assert_eq!(sent(&device.at), ["AT+URAT=8"]);
    }

    #[test]
    fn queried_registration_updates_cache_and_raises_events() {
        let events = RefCell::new(std::vec::Vec::new());
        let sink = |e: Event| events.borrow_mut().push(e);
        let mut resources = Resources::new(
            MockAtClient::new()
                .ok(b"+CEREG: 2,5,\"0A1B\",\"01A2D001\",7")
                .ok(b"+CEREG: 2,5,\"0A1B\",\"01A2D001\",7"),
        );
        let (device, _sm) =
            crate::new(&mut resources, TestConfig, TestModule, GENERIC_PROPERTIES, Some(&sink));
        let network = device.open_network();

        let params = block_on(network.get_registration_params(Some(RegType::Cereg))).unwrap();
        assert_eq!(params.status, Status::Roaming);
        assert_eq!(params.act, RadioAccessTechnology::Eutran);
        assert_eq!(events.borrow().len(), 3);

        // Same answer again is not a change
        block_on(network.get_registration_params(Some(RegType::Cereg))).unwrap();
        assert_eq!(events.borrow().len(), 3);

        let combined = block_on(network.get_registration_params(None)).unwrap();
        assert_eq!(combined.reg_type, RegType::Cereg);
        assert!(network.is_registered());
    }

    #[test]
    fn combined_registration_prefers_registered_family() {
        let mut state = crate::registration::RegistrationState::new();
        state.compare_and_set(RegistrationParams {
            reg_type: RegType::Cereg,
            status: Status::Searching,
            act: RadioAccessTechnology::Unknown,
            cell_id: None,
            lac: None,
        });
        state.compare_and_set(RegistrationParams {
            reg_type: RegType::Creg,
            status: Status::Home,
            act: RadioAccessTechnology::Unknown,
            cell_id: None,
            lac: None,
        });

        let params = combined_registration(&state, &GENERIC_PROPERTIES).unwrap();
        assert_eq!(params.reg_type, RegType::Creg);

        let params =
            combined_registration(&state, &GENERIC_PROPERTIES.with(Property::CReg, 0)).unwrap();
        assert_eq!(params.reg_type, RegType::Cereg);

        assert_eq!(
            combined_registration(&state, &PropertyTable::EMPTY),
            Err(Error::Unsupported)
        );
    }

    #[test]
    fn scan_degrades_after_unknown_access_technology() {
        let mut resources = Resources::new(MockAtClient::new().ok(
            b"+COPS: (2,\"Telia\",\"TELIA\",\"24001\",7),(1,\"Odd\",\"ODD\",\"24099\",42),(1,\"Tele2\",\"TELE2\",\"24007\",0),,(0-4),(0-2)",
        ));
        let (device, _sm) =
            crate::new(&mut resources, TestConfig, TestModule, GENERIC_PROPERTIES, None);
        let network = device.open_network();

        let ops = block_on(network.scan_plmn()).unwrap();
        assert_eq!(ops.len(), 3);
        assert_eq!(ops[0].status, OperatorStatus::Current);
        assert_eq!(ops[0].act, Some(RadioAccessTechnology::Eutran));
        assert_eq!(ops[1].status, OperatorStatus::Unknown);
        assert_eq!(ops[1].act, None);
        assert_eq!(ops[2].status, OperatorStatus::Unknown);
        assert_eq!(ops[2].act, None);
        assert_eq!(ops[2].numeric.as_str(), "24007");
    }

    #[test]
    fn manual_registration_and_attach() {
        let mut resources = Resources::new(
            MockAtClient::new()
                .ok(b"")
                .ok(b"+CGATT: 0")
                .ok(b"")
                .ok(b"+COPS: 1,2,\"24001\",7")
                .ok(b""),
        );
        let (device, _sm) =
            crate::new(&mut resources, TestConfig, TestModule, GENERIC_PROPERTIES, None);
        let network = device.open_network();

        assert_eq!(
            block_on(network.set_registration(Some("24O01"))),
            Err(Error::Parameter)
        );
        block_on(network.set_registration(Some("24001"))).unwrap();
        block_on(network.set_attach()).unwrap();
        block_on(network.set_registration(None)).unwrap();
        let sent = sent(&device.at);
        assert_eq!(
            sent[..4],
            ["AT+COPS=1,2,\"24001\"", "AT+CGATT?", "AT+CGATT=1", "AT+COPS?"]
        );
        assert!(sent[4].starts_with("AT+COPS=0"));
    }

    #[test]
    fn signal_quality_in_dbm() {
        assert_eq!(
            SignalQuality::from(network_service::responses::SignalQuality { rssi: 17, ber: 99 }),
            SignalQuality {
                rssi: Some(-79),
                ber: None
            }
        );
    }
}
