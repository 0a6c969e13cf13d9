//! Bring-up of the modem: power, readiness, SIM, signal, registration and
//! attach, each stage retried on its own backoff table.

use atat::asynch::AtatClient;
use embassy_futures::select::{select, Either};
use embassy_time::{Duration, Timer};
use heapless::Vec;

use crate::{
    command::{
        control::{
            types::{Echo, FlowControl},
            SetEcho, SetFlowControl,
        },
        device_lock::{types::PinStatusCode, GetPinStatus, SetPin},
        mobile_control::{types::TerminationErrorMode, SetReportMobileTerminationError},
        network_service::GetSignalQuality,
        psn::{types::PSEventReportingMode, SetPacketSwitchedEventReporting},
        AT,
    },
    config::CellularConfig,
    device::SimState,
    error::Error,
    event::{emit, Event, StatusCallback},
    modules::ModuleParams,
    network::{self, AttachStatus},
    properties::{Property, PropertyTable},
    pwr::PwrCtrl,
    registration::RegType,
    state::{self, CancelState},
    AtHandle,
};

/// Longest retry table a state accepts.
pub const MAX_RETRY_TIMEOUTS: usize = 10;

/// Default upper bound on the retries of one state.
pub const DEFAULT_RETRY_CEILING: u8 = 10;

const STATE_COUNT: usize = BringupState::AttachingNetwork as usize + 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BringupState {
    Init,
    PowerOn,
    DeviceReady,
    SimPin,
    SignalQuality,
    RegisteringNetwork,
    AttachingNetwork,
}

impl BringupState {
    pub const ALL: [BringupState; STATE_COUNT] = [
        BringupState::Init,
        BringupState::PowerOn,
        BringupState::DeviceReady,
        BringupState::SimPin,
        BringupState::SignalQuality,
        BringupState::RegisteringNetwork,
        BringupState::AttachingNetwork,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

/// Errors no amount of retrying will fix.
fn is_terminal(e: &Error) -> bool {
    matches!(
        e,
        Error::SimPinRequired
            | Error::Cancelled
            | Error::Parameter
            | Error::Unsupported
            | Error::IoPin
    )
}

fn default_timeouts() -> Vec<Duration, MAX_RETRY_TIMEOUTS> {
    (0..MAX_RETRY_TIMEOUTS as u32)
        .map(|k| Duration::from_secs(1 << k))
        .collect()
}

/// Drives the modem towards the bring-up state requested by the contexts.
///
/// [`StateMachine::run`] must be polled in a background task.
pub struct StateMachine<'d, AT: AtatClient, C: CellularConfig, M: ModuleParams> {
    at: AtHandle<'d, AT>,
    ch: state::Runner<'d>,
    config: C,
    module: M,
    properties: PropertyTable,
    sink: Option<StatusCallback<'d>>,
    retry_timeouts: [Option<Vec<Duration, MAX_RETRY_TIMEOUTS>>; STATE_COUNT],
    retry_ceiling: u8,
    /// The modem answered before we touched its power pin
    alive: bool,
    powered_by_us: bool,
}

impl<'d, AT, C, M> StateMachine<'d, AT, C, M>
where
    AT: AtatClient,
    C: CellularConfig,
    M: ModuleParams,
{
    pub(crate) fn new(
        at: AtHandle<'d, AT>,
        ch: state::Runner<'d>,
        config: C,
        module: M,
        properties: PropertyTable,
        sink: Option<StatusCallback<'d>>,
    ) -> Self {
        Self {
            at,
            ch,
            config,
            module,
            properties,
            sink,
            retry_timeouts: core::array::from_fn(|_| Some(default_timeouts())),
            retry_ceiling: DEFAULT_RETRY_CEILING,
            alive: false,
            powered_by_us: false,
        }
    }

    /// Waits between the retries of `state`; the last entry repeats once the
    /// table is exhausted. `None` or an empty table disables retries.
    pub fn set_retry_timeouts(
        &mut self,
        state: BringupState,
        timeouts: Option<&[Duration]>,
    ) -> Result<(), Error> {
        let timeouts = timeouts
            .map(|t| Vec::from_slice(t).map_err(|_| Error::Parameter))
            .transpose()?;
        self.retry_timeouts[state.index()] = timeouts;
        Ok(())
    }

    pub fn set_retry_ceiling(&mut self, ceiling: u8) {
        self.retry_ceiling = ceiling;
    }

    pub fn reached_state(&self) -> Option<BringupState> {
        self.ch.reached_state()
    }

    pub async fn run(&mut self) -> ! {
        loop {
            let target = self.ch.wait_for_work().await;
            if let Err(e) = self.run_to_state(target).await {
                error!("Bring-up towards {:?} failed: {:?}", target, e);
            }
        }
    }

    /// Run every state after the reached one, up to and including `target`.
    pub async fn run_to_state(&mut self, target: BringupState) -> Result<(), Error> {
        self.ch.set_cancel(CancelState::Running);
        let res = self.advance(target).await;
        if let Err(e) = &res {
            self.ch.set_failure(e.clone());
            if *e == Error::Cancelled {
                warn!("Bring-up cancelled");
                if let Err(e) = self.stop().await {
                    error!("Stopping after cancel failed: {:?}", e);
                }
            }
        }
        self.ch.set_cancel(CancelState::Idle);
        res
    }

    async fn advance(&mut self, target: BringupState) -> Result<(), Error> {
        for state in BringupState::ALL {
            if state > target {
                break;
            }
            if self.ch.reached_state().is_some_and(|r| state <= r) {
                continue;
            }
            debug!("Bring-up state {:?}", state);
            self.run_with_retries(state).await?;
            self.ch.set_reached_state(Some(state));
        }
        Ok(())
    }

    fn check_cancel(&self) -> Result<(), Error> {
        match self.ch.cancel_state() {
            CancelState::CancelRequested => Err(Error::Cancelled),
            _ => Ok(()),
        }
    }

    async fn run_with_retries(&mut self, state: BringupState) -> Result<(), Error> {
        let mut retry: u8 = 0;
        loop {
            self.check_cancel()?;
            let error = match self.run_state(state).await {
                Ok(()) => return Ok(()),
                Err(e) => e,
            };
            self.check_cancel()?;

            let wait = match &self.retry_timeouts[state.index()] {
                _ if is_terminal(&error) => None,
                Some(t) if !t.is_empty() => Some(t[(retry as usize).min(t.len() - 1)]),
                _ => None,
            };
            let error = match wait {
                Some(_) if retry >= self.retry_ceiling => Error::RetriesExhausted,
                Some(wait) => {
                    retry += 1;
                    warn!("{:?} failed ({:?}), retry {} in {:?}", state, error, retry, wait);
                    emit(self.sink, Event::StateRetry { state, retry });
                    self.wait_or_cancel(wait).await?;
                    continue;
                }
                None => error,
            };

            error!("{:?} failed: {:?}", state, error);
            emit(
                self.sink,
                Event::StateFailed {
                    state,
                    error: error.clone(),
                },
            );
            return Err(error);
        }
    }

    async fn wait_or_cancel(&self, wait: Duration) -> Result<(), Error> {
        match select(Timer::after(wait), self.ch.wait_cancel_requested()).await {
            Either::First(()) => Ok(()),
            Either::Second(()) => Err(Error::Cancelled),
        }
    }

    async fn run_state(&mut self, state: BringupState) -> Result<(), Error> {
        match state {
            BringupState::Init => {
                self.alive = self.at.send(&AT).await.is_ok();
                Ok(())
            }
            BringupState::PowerOn => self.power_on().await,
            BringupState::DeviceReady => self.device_ready().await,
            BringupState::SimPin => self.sim_pin().await,
            BringupState::SignalQuality => self.signal_quality().await,
            BringupState::RegisteringNetwork => self.register().await,
            BringupState::AttachingNetwork => {
                network::set_attach(&self.at).await?;
                self.ch.set_attached(true);
                emit(self.sink, Event::AttachStatus(AttachStatus::Attached));
                Ok(())
            }
        }
    }

    async fn power_on(&mut self) -> Result<(), Error> {
        if self.alive {
            return Ok(());
        }
        if PwrCtrl::new(&mut self.config, self.module).power_up().await? {
            self.powered_by_us = true;
        }
        self.at.send(&AT).await?;
        self.alive = true;
        Ok(())
    }

    async fn device_ready(&mut self) -> Result<(), Error> {
        let mut at = self.at.lock().await;
        at.send(&SetEcho {
            enabled: Echo::Disable,
        })
        .await?;
        at.send(&SetReportMobileTerminationError {
            n: TerminationErrorMode::Enabled,
        })
        .await?;
        if C::FLOW_CONTROL {
            at.send(&SetFlowControl {
                value: FlowControl::RtsCts,
            })
            .await?;
        }
        drop(at);

        emit(self.sink, Event::DeviceReady);
        Ok(())
    }

    async fn sim_pin(&mut self) -> Result<(), Error> {
        let mut code = self.at.send(&GetPinStatus).await?.code;

        if code == PinStatusCode::SimPin {
            let Some(pin) = self.ch.sim_pin() else {
                emit(self.sink, Event::SimStatus(SimState::PinNeeded));
                return Err(Error::SimPinRequired);
            };
            self.at.send(&SetPin { pin: &pin }).await?;
            code = self.at.send(&GetPinStatus).await?.code;
        }

        let sim_state = SimState::from(code);
        emit(self.sink, Event::SimStatus(sim_state));
        match sim_state {
            SimState::Ready => {}
            // PUK and personalisation passwords need the user
            SimState::PukNeeded | SimState::Unknown => return Err(Error::SimPinRequired),
            SimState::PinNeeded => return Err(Error::Device),
        }

        for reg_type in RegType::PRECEDENCE {
            let mode = self.properties.get(reg_type.into());
            if mode != 0 {
                network::set_registration_urc(&self.at, reg_type, mode).await?;
            }
        }
        if self.properties.is_supported(Property::AtCgerep) {
            self.at
                .send(&SetPacketSwitchedEventReporting {
                    mode: PSEventReportingMode::DiscardUrcsWhenLinkReserved,
                    bfr: None,
                })
                .await?;
        }
        Ok(())
    }

    async fn signal_quality(&mut self) -> Result<(), Error> {
        let res = self.at.send(&GetSignalQuality).await?;
        if res.rssi == 99 {
            debug!("No signal yet");
            return Err(Error::NoConnection);
        }
        emit(
            self.sink,
            Event::SignalQuality {
                rssi: res.rssi,
                ber: res.ber,
            },
        );
        Ok(())
    }

    async fn register(&mut self) -> Result<(), Error> {
        if self.ch.is_registered() {
            return Ok(());
        }

        let plmn = self.ch.plmn();
        network::set_registration(
            &self.at,
            &self.properties,
            plmn.as_deref(),
            Some(C::OPERATOR_FORMAT),
        )
        .await?;

        for reg_type in RegType::PRECEDENCE {
            if !self.properties.is_supported(reg_type.into()) {
                continue;
            }
            let params = network::query_registration(&self.at, reg_type).await?;
            network::apply_registration(&self.ch, self.sink, params);
        }

        if self.ch.is_registered() {
            Ok(())
        } else {
            Err(Error::NoConnection)
        }
    }

    /// Forget the progress, keeping the SIM PIN and PLMN.
    pub fn reset(&mut self) {
        self.ch.set_reached_state(None);
        self.ch.set_attached(false);
        self.alive = false;
    }

    /// Pulse the reset pin and forget the progress. The modem loses its
    /// volatile settings, so the next run starts over from `Init`.
    pub async fn hard_reset(&mut self) -> Result<(), Error> {
        PwrCtrl::new(&mut self.config, self.module).reset().await?;
        self.reset();
        Ok(())
    }

    /// Stop the bring-up, powering the modem down if it was powered up
    /// here. Does nothing when there is nothing to stop.
    pub async fn stop(&mut self) -> Result<(), Error> {
        self.ch.set_cancel(CancelState::Idle);
        self.reset();
        if self.powered_by_us {
            self.powered_by_us = false;
            PwrCtrl::new(&mut self.config, self.module)
                .power_down()
                .await?;
        }
        Ok(())
    }
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
    use embassy_futures::{block_on, join::join};
    use embassy_time::Instant;

    fn retries_and_failures(events: &[Event]) -> std::vec::Vec<Event> {
        events
            .iter()
            .filter(|e| matches!(e, Event::StateRetry { .. } | Event::StateFailed { .. }))
            .cloned()
            .collect()
    }

    #[test]
    fn retry_table_is_bounded() {
        let mut resources = Resources::new(MockAtClient::new());
        let (_device, mut sm) =
            crate::new(&mut resources, TestConfig, TestModule, GENERIC_PROPERTIES, None);

        let long = [Duration::from_millis(1); MAX_RETRY_TIMEOUTS + 1];
        assert_eq!(
            sm.set_retry_timeouts(BringupState::SimPin, Some(&long)),
            Err(Error::Parameter)
        );
        assert_eq!(
            sm.set_retry_timeouts(BringupState::SimPin, Some(&long[1..])),
            Ok(())
        );
        assert_eq!(default_timeouts().last(), Some(&Duration::from_secs(512)));
    }

    #[test]
    fn state_fails_after_retry_ceiling() {
        init_logger();
        let events = RefCell::new(std::vec::Vec::new());
        let sink = |e: Event| events.borrow_mut().push(e);
        let mut resources = Resources::new(MockAtClient::new().ok(b""));
        let (device, mut sm) =
            crate::new(&mut resources, TestConfig, TestModule, GENERIC_PROPERTIES, Some(&sink));
        sm.set_retry_timeouts(BringupState::DeviceReady, Some(&[Duration::from_millis(1)]))
            .unwrap();
        sm.set_retry_ceiling(2);

        assert_eq!(
            block_on(sm.run_to_state(BringupState::DeviceReady)),
            Err(Error::RetriesExhausted)
        );
        assert_eq!(sm.reached_state(), Some(BringupState::PowerOn));
        assert_eq!(device.ch.failure(), Some(Error::RetriesExhausted));
        assert_eq!(sent(&device.at), ["AT", "ATE0", "ATE0", "ATE0"]);
        assert_eq!(
            retries_and_failures(&events.borrow()),
            [
                Event::StateRetry {
                    state: BringupState::DeviceReady,
                    retry: 1
                },
                Event::StateRetry {
                    state: BringupState::DeviceReady,
                    retry: 2
                },
                Event::StateFailed {
                    state: BringupState::DeviceReady,
                    error: Error::RetriesExhausted
                },
            ]
        );
    }

    #[test]
    fn retry_waits_follow_table_and_repeat_last_entry() {
        let events = RefCell::new(std::vec::Vec::new());
        let sink = |e: Event| events.borrow_mut().push(e);
        let mut resources = Resources::new(MockAtClient::new().ok(b""));
        let (device, mut sm) =
            crate::new(&mut resources, TestConfig, TestModule, GENERIC_PROPERTIES, Some(&sink));
        sm.set_retry_timeouts(
            BringupState::DeviceReady,
            Some(&[Duration::from_millis(1), Duration::from_millis(20)]),
        )
        .unwrap();
        sm.set_retry_ceiling(3);

        let start = Instant::now();
        assert_eq!(
            block_on(sm.run_to_state(BringupState::DeviceReady)),
            Err(Error::RetriesExhausted)
        );
        // 1ms, then 20ms for the second and the third retry
        assert!(start.elapsed() >= Duration::from_millis(41));
        assert_eq!(sent(&device.at), ["AT", "ATE0", "ATE0", "ATE0", "ATE0"]);
        assert_eq!(
            retries_and_failures(&events.borrow()),
            [
                Event::StateRetry {
                    state: BringupState::DeviceReady,
                    retry: 1
                },
                Event::StateRetry {
                    state: BringupState::DeviceReady,
                    retry: 2
                },
                Event::StateRetry {
                    state: BringupState::DeviceReady,
                    retry: 3
                },
                Event::StateFailed {
                    state: BringupState::DeviceReady,
                    error: Error::RetriesExhausted
                },
            ]
        );
    }

    #[test]
    fn plmn_selects_operator_manually() {
        let mut resources = Resources::new(
            MockAtClient::new()
                .ok(b"")
                .ok(b"+CEREG: 0,1")
                .ok(b"+CGREG: 0,1")
                .ok(b"+CREG: 0,1"),
        );
        let (device, mut sm) =
            crate::new(&mut resources, TestConfig, TestModule, GENERIC_PROPERTIES, None);
        device.ch.set_plmn(Some("24001")).unwrap();
        device.ch.set_reached_state(Some(BringupState::SignalQuality));

        block_on(sm.run_to_state(BringupState::RegisteringNetwork)).unwrap();
        assert_eq!(sm.reached_state(), Some(BringupState::RegisteringNetwork));
        assert!(device.ch.is_registered());
        // No +COPS? on the manual path
        assert_eq!(
            sent(&device.at),
            ["AT+COPS=1,2,\"24001\"", "AT+CEREG?", "AT+CGREG?", "AT+CREG?"]
        );
    }

    #[test]
    fn no_retry_table_fails_at_once() {
        let mut resources = Resources::new(MockAtClient::new().ok(b""));
        let (device, mut sm) =
            crate::new(&mut resources, TestConfig, TestModule, GENERIC_PROPERTIES, None);
        sm.set_retry_timeouts(BringupState::DeviceReady, None)
            .unwrap();

        assert_eq!(
            block_on(sm.run_to_state(BringupState::AttachingNetwork)),
            Err(Error::Atat(atat::Error::Timeout))
        );
        assert_eq!(sent(&device.at), ["AT", "ATE0"]);
    }

    #[test]
    fn missing_sim_pin_is_terminal() {
        let events = RefCell::new(std::vec::Vec::new());
        let sink = |e: Event| events.borrow_mut().push(e);
        let mut resources = Resources::new(
            MockAtClient::new()
                .ok(b"")
                .ok(b"")
                .ok(b"")
                .ok(b"+CPIN: SIM PIN"),
        );
        let (device, mut sm) =
            crate::new(&mut resources, TestConfig, TestModule, GENERIC_PROPERTIES, Some(&sink));
        sm.set_retry_timeouts(BringupState::SimPin, Some(&[Duration::from_millis(1)]))
            .unwrap();

        assert_eq!(
            block_on(sm.run_to_state(BringupState::AttachingNetwork)),
            Err(Error::SimPinRequired)
        );
        assert_eq!(sent(&device.at).len(), 4);
        assert!(events
            .borrow()
            .contains(&Event::SimStatus(SimState::PinNeeded)));
        assert_eq!(
            retries_and_failures(&events.borrow()),
            [Event::StateFailed {
                state: BringupState::SimPin,
                error: Error::SimPinRequired
            }]
        );
        assert_eq!(
            block_on(device.ch.wait_for_attach()),
            Err(Error::SimPinRequired)
        );
    }

    #[test]
    fn personalisation_lock_is_terminal() {
        let events = RefCell::new(std::vec::Vec::new());
        let sink = |e: Event| events.borrow_mut().push(e);
        let mut resources = Resources::new(
            MockAtClient::new()
                .ok(b"")
                .ok(b"")
                .ok(b"")
                .ok(b"+CPIN: PH-NET PIN"),
        );
        let (device, mut sm) =
            crate::new(&mut resources, TestConfig, TestModule, GENERIC_PROPERTIES, Some(&sink));
        sm.set_retry_timeouts(BringupState::SimPin, Some(&[Duration::from_millis(1)]))
            .unwrap();

        assert_eq!(
            block_on(sm.run_to_state(BringupState::AttachingNetwork)),
            Err(Error::SimPinRequired)
        );
        assert_eq!(sent(&device.at), ["AT", "ATE0", "AT+CMEE=1", "AT+CPIN?"]);
        assert!(events
            .borrow()
            .contains(&Event::SimStatus(SimState::Unknown)));
    }

    #[test]
    fn full_bringup() {
        init_logger();
        let events = RefCell::new(std::vec::Vec::new());
        let sink = |e: Event| events.borrow_mut().push(e);
        let mut resources = Resources::new(
            MockAtClient::new()
                // Init, DeviceReady
                .ok(b"")
                .ok(b"")
                .ok(b"")
                // SimPin
                .ok(b"+CPIN: SIM PIN")
                .ok(b"")
                .ok(b"+CPIN: READY")
                .ok(b"")
                .ok(b"")
                .ok(b"")
                .ok(b"")
                // SignalQuality
                .ok(b"+CSQ: 20,0")
                // RegisteringNetwork
                .ok(b"+COPS: 0")
                .ok(b"+CEREG: 0,1")
                .ok(b"+CGREG: 0,1")
                .ok(b"+CREG: 0,1")
                // AttachingNetwork
                .ok(b"+CGATT: 1"),
        );
        let (device, mut sm) =
            crate::new(&mut resources, TestConfig, TestModule, GENERIC_PROPERTIES, Some(&sink));
        device.ch.set_sim_pin(Some("1234")).unwrap();

        block_on(sm.run_to_state(BringupState::AttachingNetwork)).unwrap();
        assert_eq!(sm.reached_state(), Some(BringupState::AttachingNetwork));
        assert!(device.ch.is_attached());
        assert_eq!(device.ch.cancel_state(), CancelState::Idle);

        let sent = sent(&device.at);
        assert_eq!(sent.len(), 16);
        assert_eq!(
            sent[..8],
            [
                "AT",
                "ATE0",
                "AT+CMEE=1",
                "AT+CPIN?",
                "AT+CPIN=\"1234\"",
                "AT+CPIN?",
                "AT+CEREG=1",
                "AT+CGREG=1",
            ]
        );
        assert_eq!(sent[8], "AT+CREG=1");
        assert!(sent[9].starts_with("AT+CGEREP=1"));
        assert_eq!(
            sent[10..],
            ["AT+CSQ", "AT+COPS?", "AT+CEREG?", "AT+CGREG?", "AT+CREG?", "AT+CGATT?"]
        );

        let milestones: std::vec::Vec<Event> = events
            .borrow()
            .iter()
            .filter(|e| {
                matches!(
                    e,
                    Event::DeviceReady
                        | Event::SimStatus(_)
                        | Event::SignalQuality { .. }
                        | Event::AttachStatus(_)
                )
            })
            .cloned()
            .collect();
        assert_eq!(
            milestones,
            [
                Event::DeviceReady,
                Event::SimStatus(SimState::Ready),
                Event::SignalQuality { rssi: 20, ber: 0 },
                Event::AttachStatus(AttachStatus::Attached),
            ]
        );

        // Nothing left to do
        block_on(sm.run_to_state(BringupState::RegisteringNetwork)).unwrap();
        assert_eq!(device.ch.reached_state(), Some(BringupState::AttachingNetwork));
    }

    #[test]
    fn cancel_during_backoff() {
        let mut resources = Resources::new(MockAtClient::new().ok(b""));
        let (device, mut sm) =
            crate::new(&mut resources, TestConfig, TestModule, GENERIC_PROPERTIES, None);
        sm.set_retry_timeouts(BringupState::DeviceReady, Some(&[Duration::from_secs(60)]))
            .unwrap();

        let (res, ()) = block_on(join(
            sm.run_to_state(BringupState::AttachingNetwork),
            async {
                Timer::after(Duration::from_millis(5)).await;
                device.cancel_bringup();
            },
        ));
        assert_eq!(res, Err(Error::Cancelled));
        assert_eq!(device.ch.cancel_state(), CancelState::Idle);
        assert_eq!(device.ch.reached_state(), None);
        assert_eq!(block_on(device.ch.wait_for_attach()), Err(Error::Cancelled));
    }

    #[test]
    fn reset_and_stop_keep_configuration() {
        let mut resources = Resources::new(MockAtClient::new());
        let (device, mut sm) =
            crate::new(&mut resources, TestConfig, TestModule, GENERIC_PROPERTIES, None);
        device.ch.set_plmn(Some("24001")).unwrap();
        device.ch.set_reached_state(Some(BringupState::SimPin));

        sm.reset();
        assert_eq!(sm.reached_state(), None);
        assert_eq!(device.ch.plmn().as_deref(), Some("24001"));

        block_on(sm.stop()).unwrap();
        block_on(sm.stop()).unwrap();
        assert!(sent(&device.at).is_empty());
    }

    #[test]
    fn hard_reset_without_reset_pin_forgets_progress() {
        let mut resources = Resources::new(MockAtClient::new());
        let (device, mut sm) =
            crate::new(&mut resources, TestConfig, TestModule, GENERIC_PROPERTIES, None);
        device.ch.set_reached_state(Some(BringupState::AttachingNetwork));
        device.ch.set_attached(true);

        block_on(sm.hard_reset()).unwrap();
        assert_eq!(sm.reached_state(), None);
        assert!(!device.ch.is_attached());
        assert!(sent(&device.at).is_empty());
    }
}
