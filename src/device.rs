//! The device manager: owner of the command channel, of every context and
//! of the reference counted sub-objects.

use core::cell::{Cell, RefCell};

use atat::{asynch::AtatClient, AtatCmd, UrcSubscription};
use embassy_futures::select::{select3, Either3};
use embassy_sync::{blocking_mutex::raw::NoopRawMutex, signal::Signal};
use embassy_time::Timer;
use heapless::{String, Vec};

use crate::{
    bringup::BringupState,
    command::{
        control::{types::Echo, SetEcho},
        device_lock::{types::PinStatusCode, GetPinStatus, SetPin},
        mobile_control::{
            types::{Functionality, TerminationErrorMode},
            SetModuleFunctionality, SetReportMobileTerminationError,
        },
        psn::types::ContextId,
        Urc, AT,
    },
    config::MAX_APN_LEN,
    context::{Context, ContextArena, ContextHandle, ContextRecord, ContextState, MAX_CONTEXTS},
    error::Error,
    event::{emit, ConnectionStatus, Event, StatusCallback},
    information::Information,
    modules::ModuleParams,
    network::{self, AttachStatus, Network},
    properties::PropertyTable,
    sms::Sms,
    stack::{socket::Socket, SocketCallback, SocketHandle},
    state, AtHandle,
};

/// Attempts of each liveness command before giving up.
const LIVENESS_ATTEMPTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SimState {
    Ready,
    PinNeeded,
    PukNeeded,
    Unknown,
}

impl From<PinStatusCode> for SimState {
    fn from(code: PinStatusCode) -> Self {
        match code {
            PinStatusCode::Ready => Self::Ready,
            PinStatusCode::SimPin => Self::PinNeeded,
            PinStatusCode::SimPuk => Self::PukNeeded,
            _ => Self::Unknown,
        }
    }
}

/// A lazily constructed sub-object and the number of its open handles.
struct SubObject<T> {
    count: u8,
    object: Option<T>,
}

impl<T: Clone> SubObject<T> {
    const fn new() -> Self {
        Self {
            count: 0,
            object: None,
        }
    }

    fn open(&mut self, create: impl FnOnce() -> T) -> T {
        self.count = self.count.saturating_add(1);
        self.object.get_or_insert_with(create).clone()
    }

    fn close(&mut self) {
        self.count = self.count.saturating_sub(1);
        if self.count == 0 {
            self.object = None;
        }
    }

    fn get(&self) -> Option<T> {
        self.object.clone()
    }

    /// Make the next `close` free the object, however often it was opened.
    fn force_close(&mut self) {
        self.count = self.count.min(1);
        self.close();
    }
}

/// One physical modem.
///
/// Created together with its bring-up [`StateMachine`](crate::bringup::StateMachine)
/// by [`crate::new`]. [`Device::run`] must be polled for unsolicited
/// notifications and non-blocking connects to be processed.
pub struct Device<'d, AT: AtatClient, M: ModuleParams> {
    pub(crate) at: AtHandle<'d, AT>,
    pub(crate) ch: state::Runner<'d>,
    pub(crate) module: M,
    pub(crate) properties: PropertyTable,
    pub(crate) sink: Option<StatusCallback<'d>>,
    pub(crate) contexts: RefCell<ContextArena<'d>>,
    /// Wakes [`Device::run`] when a context is waiting for activation.
    pub(crate) kick: Signal<NoopRawMutex, ()>,
    /// Socket payloads are hex encoded
    pub(crate) hex_mode: Cell<bool>,
    network: RefCell<SubObject<Network<'d, AT, M>>>,
    sms: RefCell<SubObject<Sms<'d, AT>>>,
    information: RefCell<SubObject<Information<'d, AT>>>,
}

impl<'d, AT: AtatClient, M: ModuleParams> Device<'d, AT, M> {
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
            contexts: RefCell::new(ContextArena::new()),
            kick: Signal::new(),
            hex_mode: Cell::new(false),
            network: RefCell::new(SubObject::new()),
            sms: RefCell::new(SubObject::new()),
            information: RefCell::new(SubObject::new()),
        }
    }

    pub fn properties(&self) -> &PropertyTable {
        &self.properties
    }

    pub fn open_network(&self) -> Network<'d, AT, M> {
        self.network.borrow_mut().open(|| {
            Network::new(
                self.at,
                self.ch.clone(),
                self.module,
                self.properties,
                self.sink,
            )
        })
    }

    pub fn close_network(&self) {
        self.network.borrow_mut().close()
    }

    pub fn network(&self) -> Option<Network<'d, AT, M>> {
        self.network.borrow().get()
    }

    pub fn open_sms(&self) -> Sms<'d, AT> {
        self.sms
            .borrow_mut()
            .open(|| Sms::new(self.at, self.properties))
    }

    pub fn close_sms(&self) {
        self.sms.borrow_mut().close()
    }

    pub fn sms(&self) -> Option<Sms<'d, AT>> {
        self.sms.borrow().get()
    }

    pub fn open_information(&self) -> Information<'d, AT> {
        self.information
            .borrow_mut()
            .open(|| Information::new(self.at, self.properties))
    }

    pub fn close_information(&self) {
        self.information.borrow_mut().close()
    }

    pub fn information(&self) -> Option<Information<'d, AT>> {
        self.information.borrow().get()
    }

    /// Create a context, appended after every existing one.
    ///
    /// `cp_req` asks for control plane CIoT optimisation, `nonip_req` for a
    /// Non-IP context.
    pub fn create_context(
        &self,
        apn: Option<&str>,
        cp_req: bool,
        nonip_req: bool,
    ) -> Result<ContextHandle, Error> {
        let apn = apn
            .map(|a| String::<MAX_APN_LEN>::try_from(a).map_err(|_| Error::Parameter))
            .transpose()?;
        let record = ContextRecord::new(apn, cp_req, nonip_req, self.properties.socket_count());
        let handle = self.contexts.borrow_mut().insert(record)?;
        debug!("Created context {:?}", handle);
        Ok(handle)
    }

    pub fn context(&self, handle: ContextHandle) -> Option<Context<'_, 'd, AT, M>> {
        self.contexts
            .borrow()
            .get(handle)
            .is_some()
            .then(|| Context::new(self, handle))
    }

    /// Forget a context. `None` and handles of deleted contexts are ignored.
    ///
    /// The modem side context is left as it is; disconnect first to tear
    /// it down.
    pub fn delete_context(&self, handle: Option<ContextHandle>) {
        let Some(handle) = handle else {
            return;
        };
        if self.contexts.borrow_mut().remove(handle).is_some() {
            debug!("Deleted context {:?}", handle);
        }
    }

    /// Handles of every context, in creation order.
    pub fn contexts(&self) -> Vec<ContextHandle, MAX_CONTEXTS> {
        self.contexts.borrow().handles()
    }

    async fn send_with_retries<Cmd: AtatCmd>(&self, cmd: &Cmd) -> Result<Cmd::Response, Error> {
        let mut attempt = 1;
        loop {
            match self.at.send(cmd).await {
                Ok(res) => return Ok(res),
                Err(e) if attempt == LIVENESS_ATTEMPTS => return Err(e),
                Err(_) => {
                    attempt += 1;
                    Timer::after(self.module.command_retry_backoff()).await;
                }
            }
        }
    }

    /// Bring the modem to a known state with the radio on.
    pub async fn init(&self) -> Result<(), Error> {
        debug!("Initializing modem");
        self.send_with_retries(&AT).await?;
        self.send_with_retries(&SetEcho {
            enabled: Echo::Disable,
        })
        .await?;
        self.send_with_retries(&SetReportMobileTerminationError {
            n: TerminationErrorMode::Enabled,
        })
        .await?;
        self.send_with_retries(&SetModuleFunctionality {
            fun: Functionality::Full,
            rst: None,
        })
        .await?;
        Ok(())
    }

    /// Switch the radio off, as configured by the module profile.
    pub async fn shutdown(&self) -> Result<(), Error> {
        debug!("Shutting down modem");
        self.send_with_retries(&SetModuleFunctionality {
            fun: self.module.radio_off_cfun(),
            rst: None,
        })
        .await?;
        self.ch.set_attached(false);
        Ok(())
    }

    pub async fn is_ready(&self) -> Result<(), Error> {
        self.send_with_retries(&AT).await.map(drop)
    }

    pub async fn set_pin(&self, pin: &str) -> Result<(), Error> {
        if pin.is_empty() || pin.len() > state::MAX_PIN_LEN {
            return Err(Error::Parameter);
        }
        self.at.send(&SetPin { pin }).await?;
        Ok(())
    }

    pub async fn get_sim_state(&self) -> Result<SimState, Error> {
        let res = self.at.send(&GetPinStatus).await?;
        Ok(res.code.into())
    }

    /// Cancel a running bring-up. Blocking connects waiting on it fail with
    /// [`Error::Cancelled`].
    pub fn cancel_bringup(&self) {
        self.ch.request_cancel();
    }

    /// Apply one unsolicited notification.
    pub fn handle_urc(&self, urc: Urc) {
        match urc {
            Urc::NetworkRegistration(reg) => {
                network::apply_registration(&self.ch, self.sink, reg.into());
            }
            Urc::GPRSNetworkRegistration(reg) => {
                network::apply_registration(&self.ch, self.sink, reg.into());
            }
            Urc::EPSNetworkRegistration(reg) => {
                network::apply_registration(&self.ch, self.sink, reg.into());
            }
            Urc::PacketDomainEvent(ev) => {
                if let Some(cid) = ev.deactivated_cid() {
                    self.context_deactivated(cid);
                } else if ev.is_detach() {
                    warn!("Detached from the packet domain");
                    self.ch.set_attached(false);
                    self.ch
                        .lower_reached_state(BringupState::RegisteringNetwork);
                    emit(self.sink, Event::AttachStatus(AttachStatus::Detached));
                }
            }
            Urc::SocketDataAvailable(ev) | Urc::SocketDataAvailableUDP(ev) => {
                self.socket_event(ev.socket, |s| s.pending_bytes = ev.length);
            }
            Urc::SocketClosed(ev) => {
                self.socket_event(ev.socket, |s| {
                    s.closed = true;
                    s.connected = false;
                });
            }
        }
    }

    /// `None` stands for a deactivation that could not be attributed, and
    /// concerns every context.
    fn context_deactivated(&self, cid: Option<u8>) {
        match cid {
            Some(cid) => {
                let handle = self.contexts.borrow().find_by_cid(ContextId(cid));
                match handle {
                    Some(handle) => {
                        info!("Context {:?} deactivated by the network", handle);
                        Context::new(self, handle).drop_connection();
                    }
                    None => debug!("Deactivation of unknown cid {}", cid),
                }
            }
            None => {
                warn!("Deactivation of an unknown context, dropping all");
                let callbacks: Vec<_, MAX_CONTEXTS> = self
                    .contexts
                    .borrow_mut()
                    .records_mut()
                    .map(|(_, r)| {
                        if r.state != ContextState::Idle {
                            r.release();
                        }
                        r.callback
                    })
                    .collect();

                let event = Event::Connection {
                    context: None,
                    status: ConnectionStatus::Disconnected,
                };
                emit(self.sink, event.clone());
                for callback in callbacks.into_iter().flatten() {
                    callback(event.clone());
                }
            }
        }
    }

    fn socket_event(&self, id: u8, f: impl FnOnce(&mut Socket<'d>)) {
        let found: Option<(SocketHandle, Option<SocketCallback<'d>>)> = {
            let mut contexts = self.contexts.borrow_mut();
            let socket = contexts
                .records_mut()
                .find_map(|(_, r)| r.sockets.by_id(id));
            socket.map(|s| {
                f(&mut *s);
                (s.handle, s.callback)
            })
        };

        match found {
            Some((handle, Some(callback))) => callback(handle),
            Some(_) => {}
            None => debug!("Event for unknown socket {}", id),
        }
    }

    /// Process unsolicited notifications and activate contexts connected in
    /// non-blocking mode once the bring-up has attached.
    pub async fn run<const CAP: usize, const SUBS: usize>(
        &self,
        mut urcs: UrcSubscription<'_, Urc, CAP, SUBS>,
    ) -> ! {
        loop {
            let pending = self.pending_contexts();
            if !pending.is_empty() {
                if self.ch.is_attached() {
                    for handle in pending {
                        // Reported through the context callback
                        let _ = Context::new(self, handle).activate().await;
                    }
                } else if let Some(e) = self.ch.failure() {
                    warn!("Bring-up failed ({:?}), dropping pending contexts", e);
                    for handle in pending {
                        Context::new(self, handle).drop_connection();
                    }
                }
            }

            if let Either3::First(urc) = select3(
                urcs.next_message_pure(),
                self.ch.wait_attach_change(),
                self.kick.wait(),
            )
            .await
            {
                self.handle_urc(urc);
            }
        }
    }

    fn pending_contexts(&self) -> Vec<ContextHandle, MAX_CONTEXTS> {
        let contexts = self.contexts.borrow();
        contexts
            .handles()
            .into_iter()
            .filter(|h| {
                contexts
                    .get(*h)
                    .is_some_and(|r| r.pending && r.state == ContextState::Activating)
            })
            .collect()
    }
}

impl<'d, AT: AtatClient, M: ModuleParams> Drop for Device<'d, AT, M> {
    fn drop(&mut self) {
        self.network.get_mut().force_close();
        self.sms.get_mut().force_close();
        self.information.get_mut().force_close();
        self.contexts.get_mut().clear();
    }
}
