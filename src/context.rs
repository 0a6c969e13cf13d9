//! Packet data contexts.
//!
//! Contexts live in an arena owned by the [`Device`]; a [`Context`] is a
//! short lived view on one of them, addressed by a [`ContextHandle`]. A
//! handle outlives the context it refers to without harm: every operation on
//! a deleted context fails with [`Error::Parameter`].

use core::future::poll_fn;
use core::task::Poll;

use atat::asynch::AtatClient;
use embassy_futures::select::{select, Either};
use embassy_sync::waitqueue::WakerRegistration;
use embassy_time::with_timeout;
use heapless::{String, Vec};
use no_std_net::IpAddr;

use crate::{
    bringup::BringupState,
    command::psn::{
        responses::{ApnBackoffTimer, ApnRateControl, PDPContextDynamicParameters},
        types::{AuthenticationType, ContextId, PDPContextStatus},
        GetApnBackoffTimer, GetApnRateControl, GetPDPContextDefinitions, GetPDPContextStates,
        ReadDynamicParameters, SetPDPContextDefinition, SetPDPContextState,
    },
    config::{Credentials, MAX_APN_LEN},
    device::Device,
    error::Error,
    event::{emit, ConnectionStatus, Event, StatusCallback},
    modules::{ContextOperation, ModuleParams},
    properties::Property,
    stack::{socket::SocketTable, Stack},
    state::{MAX_PIN_LEN, MAX_PLMN_LEN},
    AtLock,
};

pub const MAX_CONTEXTS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ContextHandle {
    index: u8,
    generation: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PdpType {
    Ipv4,
    Ipv6,
    Ipv4v6,
    NonIp,
}

impl PdpType {
    pub(crate) fn property(self) -> Property {
        match self {
            Self::Ipv4 => Property::Ipv4PdpType,
            Self::Ipv6 => Property::Ipv6PdpType,
            Self::Ipv4v6 => Property::Ipv4v6PdpType,
            Self::NonIp => Property::NonIpPdpType,
        }
    }

    /// Whether a context of this type carries `addr`.
    pub fn carries(self, addr: &IpAddr) -> bool {
        match (self, addr) {
            (Self::Ipv4v6, _) => true,
            (Self::Ipv4, IpAddr::V4(_)) | (Self::Ipv6, IpAddr::V6(_)) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ContextState {
    Idle,
    Activating,
    Connected,
    Disconnecting,
}

/// File handle of the serial link a context runs its data mode over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FileHandle(pub u8);

pub(crate) struct ContextRecord<'d> {
    pub(crate) state: ContextState,
    pub(crate) cid: Option<ContextId>,
    pub(crate) apn: Option<String<MAX_APN_LEN>>,
    pub(crate) credentials: Option<Credentials>,
    pub(crate) auth_type: AuthenticationType,
    pub(crate) stack_type: Option<PdpType>,
    pub(crate) negotiated: Option<PdpType>,
    pub(crate) cp_req: bool,
    pub(crate) nonip_req: bool,
    pub(crate) blocking: bool,
    pub(crate) file_handle: Option<FileHandle>,
    pub(crate) plmn: Option<String<MAX_PLMN_LEN>>,
    pub(crate) sim_pin: Option<String<MAX_PIN_LEN>>,
    /// Non-blocking connect waiting for attach
    pub(crate) pending: bool,
    pub(crate) cancel_requested: bool,
    cancel_waker: WakerRegistration,
    pub(crate) params: Option<PDPContextDynamicParameters>,
    pub(crate) callback: Option<StatusCallback<'d>>,
    pub(crate) sockets: SocketTable<'d>,
}

impl<'d> ContextRecord<'d> {
    pub(crate) fn new(
        apn: Option<String<MAX_APN_LEN>>,
        cp_req: bool,
        nonip_req: bool,
        socket_capacity: usize,
    ) -> Self {
        Self {
            state: ContextState::Idle,
            cid: None,
            apn,
            credentials: None,
            auth_type: AuthenticationType::Auto,
            stack_type: None,
            negotiated: None,
            cp_req,
            nonip_req,
            blocking: true,
            file_handle: None,
            plmn: None,
            sim_pin: None,
            pending: false,
            cancel_requested: false,
            cancel_waker: WakerRegistration::new(),
            params: None,
            callback: None,
            sockets: SocketTable::new(socket_capacity),
        }
    }

    /// Back to idle, giving up everything the last activation acquired.
    pub(crate) fn release(&mut self) {
        self.state = ContextState::Idle;
        self.cid = None;
        self.negotiated = None;
        self.params = None;
        self.pending = false;
        self.cancel_requested = false;
        self.sockets.clear();
    }
}

struct Slot<'d> {
    generation: u16,
    record: Option<ContextRecord<'d>>,
}

/// Context storage of one device, remembering creation order.
pub(crate) struct ContextArena<'d> {
    slots: [Slot<'d>; MAX_CONTEXTS],
    order: Vec<ContextHandle, MAX_CONTEXTS>,
}

impl<'d> ContextArena<'d> {
    pub(crate) fn new() -> Self {
        Self {
            slots: core::array::from_fn(|_| Slot {
                generation: 0,
                record: None,
            }),
            order: Vec::new(),
        }
    }

    pub(crate) fn insert(&mut self, record: ContextRecord<'d>) -> Result<ContextHandle, Error> {
        let index = self
            .slots
            .iter()
            .position(|s| s.record.is_none())
            .ok_or(Error::NoMemory)?;

        let slot = &mut self.slots[index];
        slot.generation = slot.generation.wrapping_add(1);
        slot.record = Some(record);

        let handle = ContextHandle {
            index: index as u8,
            generation: slot.generation,
        };
        // `order` never holds more handles than there are slots
        let _ = self.order.push(handle);
        Ok(handle)
    }

    pub(crate) fn remove(&mut self, handle: ContextHandle) -> Option<ContextRecord<'d>> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        let record = slot.record.take()?;
        self.order.retain(|h| *h != handle);
        Some(record)
    }

    pub(crate) fn get(&self, handle: ContextHandle) -> Option<&ContextRecord<'d>> {
        self.slots
            .get(handle.index as usize)
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.record.as_ref())
    }

    pub(crate) fn get_mut(&mut self, handle: ContextHandle) -> Option<&mut ContextRecord<'d>> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.record.as_mut())
    }

    /// Live handles in creation order.
    pub(crate) fn handles(&self) -> Vec<ContextHandle, MAX_CONTEXTS> {
        self.order.clone()
    }

    pub(crate) fn find_by_cid(&self, cid: ContextId) -> Option<ContextHandle> {
        self.order
            .iter()
            .copied()
            .find(|h| self.get(*h).is_some_and(|r| r.cid == Some(cid)))
    }

    pub(crate) fn records_mut(
        &mut self,
    ) -> impl Iterator<Item = (ContextHandle, &mut ContextRecord<'d>)> + '_ {
        self.slots.iter_mut().enumerate().filter_map(|(index, slot)| {
            let generation = slot.generation;
            slot.record.as_mut().map(|r| {
                (
                    ContextHandle {
                        index: index as u8,
                        generation,
                    },
                    r,
                )
            })
        })
    }

    pub(crate) fn clear(&mut self) {
        for handle in self.handles() {
            self.remove(handle);
        }
    }
}

fn validate_digits<const N: usize>(value: Option<&str>) -> Result<Option<String<N>>, Error> {
    match value {
        None => Ok(None),
        Some(v) if v.is_empty() || !v.bytes().all(|b| b.is_ascii_digit()) => Err(Error::Parameter),
        Some(v) => String::try_from(v).map(Some).map_err(|_| Error::Parameter),
    }
}

/// One packet data context of a [`Device`].
pub struct Context<'a, 'd, AT: AtatClient, M: ModuleParams> {
    device: &'a Device<'d, AT, M>,
    handle: ContextHandle,
}

impl<'a, 'd, AT: AtatClient, M: ModuleParams> Context<'a, 'd, AT, M> {
    pub(crate) fn new(device: &'a Device<'d, AT, M>, handle: ContextHandle) -> Self {
        Self { device, handle }
    }

    pub fn handle(&self) -> ContextHandle {
        self.handle
    }

    fn with<R>(&self, f: impl FnOnce(&mut ContextRecord<'d>) -> R) -> Result<R, Error> {
        let mut contexts = self.device.contexts.borrow_mut();
        let record = contexts.get_mut(self.handle).ok_or(Error::Parameter)?;
        Ok(f(record))
    }

    /// Report a connection status change to the device sink and the
    /// callback attached to this context.
    pub(crate) fn notify(&self, status: ConnectionStatus) {
        let callback = self.with(|r| r.callback).ok().flatten();
        let event = Event::Connection {
            context: Some(self.handle),
            status,
        };
        emit(self.device.sink, event.clone());
        if let Some(callback) = callback {
            callback(event);
        }
    }

    /// Release the context after a failure or a network side deactivation.
    pub(crate) fn drop_connection(&self) {
        if self.with(|r| r.release()).is_ok() {
            self.notify(ConnectionStatus::Disconnected);
        }
    }

    fn cancelled(&self) -> bool {
        self.with(|r| r.cancel_requested).unwrap_or(true)
    }

    /// Resolves once a disconnect asked this context's connect to stop.
    async fn wait_cancelled(&self) {
        poll_fn(|cx| {
            let cancelled = self
                .with(|r| {
                    if !r.cancel_requested {
                        r.cancel_waker.register(cx.waker());
                    }
                    r.cancel_requested
                })
                .unwrap_or(true);
            if cancelled {
                Poll::Ready(())
            } else {
                Poll::Pending
            }
        })
        .await
    }

    /// Whether another context still waits for the bring-up.
    fn others_activating(&self) -> bool {
        let contexts = self.device.contexts.borrow();
        contexts.handles().iter().any(|h| {
            *h != self.handle
                && contexts.get(*h).is_some_and(|r| {
                    r.state == ContextState::Activating && !r.cancel_requested
                })
        })
    }

    /// Set the APN and the user credentials. `None` restores the default:
    /// the modem's own APN, or no authentication.
    pub fn set_credentials(
        &self,
        apn: Option<&str>,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Result<(), Error> {
        let apn = apn
            .map(|a| String::try_from(a).map_err(|_| Error::Parameter))
            .transpose()?;

        self.with(|r| {
            let credentials = match (username, password) {
                (None, None) => None,
                (Some(u), Some(p)) => Some(Credentials::new(u, p, r.auth_type)?),
                _ => return Err(Error::Parameter),
            };
            r.apn = apn;
            r.credentials = credentials;
            Ok(())
        })?
    }

    pub fn set_authentication_type(&self, auth_type: AuthenticationType) -> Result<(), Error> {
        self.with(|r| {
            r.auth_type = auth_type;
            if let Some(c) = r.credentials.as_mut() {
                c.auth_type = auth_type;
            }
        })
    }

    /// In blocking mode `connect()` returns once the context is up; otherwise
    /// it returns right away and progress is reported through the attached
    /// callback.
    pub fn set_blocking(&self, blocking: bool) -> Result<(), Error> {
        self.with(|r| r.blocking = blocking)
    }

    pub fn set_file_handle(&self, file_handle: Option<FileHandle>) -> Result<(), Error> {
        self.with(|r| r.file_handle = file_handle)
    }

    pub fn file_handle(&self) -> Option<FileHandle> {
        self.with(|r| r.file_handle).ok().flatten()
    }

    /// Numeric operator to register on manually during the next connect.
    pub fn set_plmn(&self, plmn: Option<&str>) -> Result<(), Error> {
        let plmn = validate_digits(plmn)?;
        self.with(|r| r.plmn = plmn)
    }

    pub fn set_sim_pin(&self, pin: Option<&str>) -> Result<(), Error> {
        let pin = validate_digits(pin)?;
        self.with(|r| r.sim_pin = pin)
    }

    /// Stack type to request, `None` to pick the widest the modem supports.
    pub fn set_stack_type(&self, stack_type: Option<PdpType>) -> Result<(), Error> {
        if let Some(t) = stack_type {
            if !self.device.properties.is_supported(t.property()) {
                return Err(Error::Unsupported);
            }
        }
        self.with(|r| r.stack_type = stack_type)
    }

    pub fn attach(&self, callback: Option<StatusCallback<'d>>) -> Result<(), Error> {
        self.with(|r| r.callback = callback)
    }

    pub fn state(&self) -> ContextState {
        self.with(|r| r.state).unwrap_or(ContextState::Idle)
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ContextState::Connected
    }

    pub fn cid(&self) -> Option<ContextId> {
        self.with(|r| r.cid).ok().flatten()
    }

    /// Whether the context was created for control plane optimisation.
    pub fn is_control_plane(&self) -> bool {
        self.with(|r| r.cp_req).unwrap_or(false)
    }

    pub fn get_ip_address(&self) -> Option<IpAddr> {
        self.with(|r| r.params.as_ref().and_then(|p| p.local_addr))
            .ok()
            .flatten()
    }

    pub fn stack(&self) -> Stack<'a, 'd, AT, M> {
        Stack::new(self.device, self.handle)
    }

    /// Set the credentials, then [`connect`](Self::connect).
    pub async fn connect_with(
        &self,
        apn: Option<&str>,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Result<(), Error> {
        self.set_credentials(apn, username, password)?;
        self.connect().await
    }

    /// Bring the context up: have the bring-up state machine attach to the
    /// network, then define, authenticate and activate the PDP context.
    pub async fn connect(&self) -> Result<(), Error> {
        let (blocking, pin, plmn) = self.with(|r| match r.state {
            ContextState::Connected => Err(Error::AlreadyConnected),
            ContextState::Activating | ContextState::Disconnecting => Err(Error::Busy),
            ContextState::Idle => Ok((r.blocking, r.sim_pin.clone(), r.plmn.clone())),
        })??;

        self.device.ch.set_sim_pin(pin.as_deref())?;
        self.device.ch.set_plmn(plmn.as_deref())?;

        self.with(|r| {
            r.state = ContextState::Activating;
            r.cancel_requested = false;
        })?;
        debug!("Context {:?} connecting", self.handle);
        self.notify(ConnectionStatus::Connecting);
        self.device
            .ch
            .set_target_state(BringupState::AttachingNetwork);

        if !blocking {
            self.with(|r| r.pending = true)?;
            self.device.kick.signal(());
            return Ok(());
        }

        let timeout = self
            .device
            .module
            .operation_timeout(ContextOperation::Connect);
        let attach = with_timeout(timeout, self.device.ch.wait_for_attach());
        match select(attach, self.wait_cancelled()).await {
            Either::Second(()) => {
                debug!("Context {:?} connect cancelled", self.handle);
                self.drop_connection();
                return Err(Error::Cancelled);
            }
            Either::First(Err(_)) => {
                warn!("Context {:?} timed out waiting for attach", self.handle);
                let _ = self.with(|r| r.release());
                return Err(Error::Timeout);
            }
            Either::First(Ok(Err(e))) => {
                warn!("Context {:?} bring-up failed: {:?}", self.handle, e);
                self.drop_connection();
                return Err(e);
            }
            Either::First(Ok(Ok(()))) => {}
        }

        if self.cancelled() {
            self.drop_connection();
            return Err(Error::Cancelled);
        }
        self.activate().await
    }

    /// Activate a Non-IP context without waiting for the bring-up.
    pub async fn activate_non_ip_context(&self) -> Result<(), Error> {
        if !self
            .device
            .properties
            .is_supported(Property::NonIpPdpType)
        {
            return Err(Error::Unsupported);
        }

        self.with(|r| match r.state {
            ContextState::Connected => Err(Error::AlreadyConnected),
            ContextState::Activating | ContextState::Disconnecting => Err(Error::Busy),
            ContextState::Idle => {
                r.nonip_req = true;
                r.state = ContextState::Activating;
                r.cancel_requested = false;
                Ok(())
            }
        })??;
        self.notify(ConnectionStatus::Connecting);
        self.activate().await
    }

    pub async fn deactivate_non_ip_context(&self) -> Result<(), Error> {
        self.disconnect().await
    }

    /// Run the activation sequence. Expects the context in `Activating`.
    pub(crate) async fn activate(&self) -> Result<(), Error> {
        self.with(|r| r.pending = false)?;

        match self.activate_inner().await {
            Ok(()) => {
                self.notify(ConnectionStatus::GlobalUp);
                Ok(())
            }
            Err(e) => {
                warn!("Context {:?} activation failed: {:?}", self.handle, e);
                self.drop_connection();
                Err(e)
            }
        }
    }

    async fn activate_inner(&self) -> Result<(), Error> {
        let (apn, credentials, stack_type, nonip) = self.with(|r| {
            (
                r.apn.clone(),
                r.credentials.clone(),
                r.stack_type,
                r.nonip_req,
            )
        })?;
        let requested = self.requested_pdp_type(stack_type, nonip)?;
        if credentials.is_some() && !self.device.properties.is_supported(Property::AtCgauth) {
            return Err(Error::Unsupported);
        }

        let mut at = self.device.at.lock().await;
        let (cid, pdp_type) = self
            .find_or_define(&mut at, apn.as_deref(), requested)
            .await?;

        if let Some(credentials) = &credentials {
            self.device
                .module
                .authenticate(&mut at, cid, credentials)
                .await
                .map_err(|e| {
                    warn!("Authentication rejected: {:?}", e);
                    Error::Authentication
                })?;
        }

        if self.cancelled() {
            return Err(Error::Cancelled);
        }

        let states = at.send(&GetPDPContextStates).await?;
        let active = states
            .states
            .iter()
            .any(|s| s.cid == cid && s.status == PDPContextStatus::Activated);
        if !active {
            at.send(&SetPDPContextState {
                status: PDPContextStatus::Activated,
                cid: Some(cid),
            })
            .await?;
        }

        if self.cancelled() {
            let _ = at
                .send(&SetPDPContextState {
                    status: PDPContextStatus::Deactivated,
                    cid: Some(cid),
                })
                .await;
            return Err(Error::Cancelled);
        }

        let params = if pdp_type == PdpType::NonIp {
            None
        } else {
            match at.send(&ReadDynamicParameters { cid: Some(cid) }).await {
                Ok(list) => list.params.into_iter().next(),
                Err(e) => {
                    warn!("No dynamic parameters for cid {}: {:?}", cid.0, e);
                    let _ = at
                        .send(&SetPDPContextState {
                            status: PDPContextStatus::Deactivated,
                            cid: Some(cid),
                        })
                        .await;
                    return Err(e);
                }
            }
        };
        drop(at);

        self.with(|r| {
            r.cid = Some(cid);
            r.negotiated = Some(pdp_type);
            r.params = params;
            r.state = ContextState::Connected;
        })?;
        info!("Context {:?} up on cid {}", self.handle, cid.0);
        Ok(())
    }

    fn requested_pdp_type(
        &self,
        stack_type: Option<PdpType>,
        nonip: bool,
    ) -> Result<PdpType, Error> {
        let properties = &self.device.properties;
        let requested = if nonip {
            PdpType::NonIp
        } else if let Some(t) = stack_type {
            t
        } else {
            [PdpType::Ipv4v6, PdpType::Ipv6, PdpType::Ipv4]
                .into_iter()
                .find(|t| properties.is_supported(t.property()))
                .ok_or(Error::Unsupported)?
        };

        if properties.is_supported(requested.property()) {
            Ok(requested)
        } else {
            Err(Error::Unsupported)
        }
    }

    /// Reuse a modem side definition matching the APN and stack type, or
    /// define a new one on the first free cid.
    async fn find_or_define(
        &self,
        at: &mut AtLock<'_, AT>,
        apn: Option<&str>,
        requested: PdpType,
    ) -> Result<(ContextId, PdpType), Error> {
        let defs = at.send(&GetPDPContextDefinitions).await?;

        let mut cid_max = 0;
        for def in defs.contexts.iter() {
            cid_max = cid_max.max(def.cid.0);

            let Some(pdp_type) = self.device.module.parse_pdp_type(&def.pdp_type) else {
                continue;
            };
            if apn.is_some_and(|apn| !def.apn.eq_ignore_ascii_case(apn)) {
                continue;
            }
            if !self.device.properties.is_supported(pdp_type.property()) {
                continue;
            }
            let taken = self
                .device
                .contexts
                .borrow()
                .find_by_cid(def.cid)
                .is_some_and(|h| h != self.handle);
            if taken {
                continue;
            }
            if pdp_type == requested
                || (pdp_type == PdpType::Ipv4v6 && requested != PdpType::NonIp)
            {
                debug!("Reusing cid {} ({:?})", def.cid.0, pdp_type);
                return Ok((def.cid, pdp_type));
            }
        }

        let cid = ContextId(cid_max + 1);
        debug!("Defining cid {} as {:?}", cid.0, requested);
        at.send(&SetPDPContextDefinition {
            cid,
            pdp_type: self.device.module.pdp_type_str(requested),
            apn: apn.unwrap_or(""),
        })
        .await?;
        Ok((cid, requested))
    }

    /// Take the context down. Idle contexts are left alone; a connect still
    /// waiting for the bring-up is cancelled.
    pub async fn disconnect(&self) -> Result<(), Error> {
        enum Action {
            Done,
            Dropped,
            Cancel,
            Deactivate(ContextId),
        }

        let action = self.with(|r| match r.state {
            ContextState::Idle | ContextState::Disconnecting => Action::Done,
            ContextState::Activating if r.pending => Action::Dropped,
            ContextState::Activating => {
                r.cancel_requested = true;
                r.cancel_waker.wake();
                Action::Cancel
            }
            ContextState::Connected => match r.cid {
                Some(cid) => {
                    r.state = ContextState::Disconnecting;
                    Action::Deactivate(cid)
                }
                None => Action::Dropped,
            },
        })?;

        match action {
            Action::Done => Ok(()),
            Action::Dropped => {
                self.drop_connection();
                Ok(())
            }
            Action::Cancel => {
                debug!("Context {:?} cancelling connect", self.handle);
                if !self.others_activating() {
                    self.device.ch.request_cancel();
                }
                Ok(())
            }
            Action::Deactivate(cid) => {
                let res = self
                    .device
                    .at
                    .send(&SetPDPContextState {
                        status: PDPContextStatus::Deactivated,
                        cid: Some(cid),
                    })
                    .await;
                match res {
                    Ok(_) => {
                        info!("Context {:?} down", self.handle);
                        self.drop_connection();
                        Ok(())
                    }
                    Err(e) => {
                        let _ = self.with(|r| r.state = ContextState::Connected);
                        Err(e)
                    }
                }
            }
        }
    }

    /// Dynamic parameters of this context once active, or of every active
    /// context on the modem before that.
    pub async fn get_pdpcontext_params(
        &self,
    ) -> Result<Vec<PDPContextDynamicParameters, 4>, Error> {
        let cid = self.with(|r| r.cid)?;
        let list = self.device.at.send(&ReadDynamicParameters { cid }).await?;
        Ok(list.params)
    }

    pub async fn get_rate_control(&self) -> Result<ApnRateControl, Error> {
        let cid = self.with(|r| r.cid)?.ok_or(Error::NoConnection)?;
        self.device.at.send(&GetApnRateControl { cid }).await
    }

    pub async fn get_apn_backoff_timer(&self) -> Result<ApnBackoffTimer, Error> {
        let apn = self.with(|r| r.apn.clone())?.ok_or(Error::Parameter)?;
        self.device.at.send(&GetApnBackoffTimer { apn: &apn }).await
    }

    /// PDP type the modem actually applied to the active context.
    pub async fn get_stack_type(&self) -> Result<PdpType, Error> {
        let cid = self.with(|r| r.cid)?.ok_or(Error::NoConnection)?;
        let defs = self.device.at.send(&GetPDPContextDefinitions).await?;
        let def = defs
            .contexts
            .iter()
            .find(|d| d.cid == cid)
            .ok_or(Error::NoConnection)?;

        match self.device.module.parse_pdp_type(&def.pdp_type) {
            Some(t) => {
                let _ = self.with(|r| r.negotiated = Some(t));
                Ok(t)
            }
            None => {
                warn!("Unusable PDP type for cid {}", cid.0);
                Err(Error::NoConnection)
            }
        }
    }
}
