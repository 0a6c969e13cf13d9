//! State shared between the device manager, the bring-up state machine and
//! every context, behind a blocking mutex that is never held across an
//! await point.

use core::cell::RefCell;
use core::future::poll_fn;
use core::task::Poll;

use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::waitqueue::MultiWakerRegistration;
use heapless::String;

use crate::bringup::BringupState;
use crate::error::Error;
use crate::registration::RegistrationState;

pub const MAX_PIN_LEN: usize = 8;
pub const MAX_PLMN_LEN: usize = 6;

const MAX_WAITERS: usize = 4;

/// Cooperative cancellation of a bring-up run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CancelState {
    Idle,
    Running,
    CancelRequested,
}

pub struct State {
    shared: Mutex<NoopRawMutex, RefCell<Shared>>,
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

impl State {
    pub const fn new() -> Self {
        Self {
            shared: Mutex::new(RefCell::new(Shared {
                reached_state: None,
                target_state: None,
                cancel: CancelState::Idle,
                failure: None,
                attached: false,
                registration_state: RegistrationState::new(),
                sim_pin: None,
                plmn: None,
                state_waker: MultiWakerRegistration::new(),
            })),
        }
    }
}

pub struct Shared {
    /// Last bring-up state that completed
    reached_state: Option<BringupState>,
    target_state: Option<BringupState>,
    cancel: CancelState,
    /// Terminal error of the last bring-up run towards `target_state`
    failure: Option<Error>,
    attached: bool,
    registration_state: RegistrationState,
    sim_pin: Option<String<MAX_PIN_LEN>>,
    plmn: Option<String<MAX_PLMN_LEN>>,
    state_waker: MultiWakerRegistration<MAX_WAITERS>,
}

#[derive(Clone)]
pub struct Runner<'d> {
    pub(crate) shared: &'d Mutex<NoopRawMutex, RefCell<Shared>>,
}

impl<'d> Runner<'d> {
    pub fn new(state: &'d mut State) -> Self {
        Self {
            shared: &state.shared,
        }
    }

    fn with<R>(&self, f: impl FnOnce(&mut Shared) -> R) -> R {
        self.shared.lock(|s| f(&mut s.borrow_mut()))
    }

    pub fn update_registration_with<R>(&self, f: impl FnOnce(&mut RegistrationState) -> R) -> R {
        self.with(|s| f(&mut s.registration_state))
    }

    pub fn registration(&self) -> RegistrationState {
        self.with(|s| s.registration_state.clone())
    }

    pub fn is_registered(&self) -> bool {
        self.with(|s| s.registration_state.is_registered())
    }

    pub fn set_attached(&self, attached: bool) {
        self.with(|s| {
            if s.attached != attached {
                debug!("Attach state: {}", attached);
            }
            s.attached = attached;
            s.state_waker.wake();
        })
    }

    pub fn is_attached(&self) -> bool {
        self.with(|s| s.attached)
    }

    /// Resolves once the bring-up reached attach, or with the error that
    /// ended the bring-up run.
    pub async fn wait_for_attach(&self) -> Result<(), Error> {
        poll_fn(|cx| {
            self.with(|s| {
                if s.attached {
                    return Poll::Ready(Ok(()));
                }
                if let Some(e) = s.failure.clone() {
                    return Poll::Ready(Err(e));
                }
                s.state_waker.register(cx.waker());
                Poll::Pending
            })
        })
        .await
    }

    /// Resolves on the next change of the attach flag, or of whether the
    /// bring-up has failed.
    pub async fn wait_attach_change(&self) {
        let old = self.with(|s| (s.attached, s.failure.is_some()));
        poll_fn(|cx| {
            self.with(|s| {
                if (s.attached, s.failure.is_some()) != old {
                    return Poll::Ready(());
                }
                s.state_waker.register(cx.waker());
                Poll::Pending
            })
        })
        .await
    }

    pub fn set_reached_state(&self, state: Option<BringupState>) {
        self.with(|s| {
            s.reached_state = state;
            s.state_waker.wake();
        })
    }

    pub fn reached_state(&self) -> Option<BringupState> {
        self.with(|s| s.reached_state)
    }

    /// Ask the bring-up to run up to `state`. Forgets the failure of any
    /// previous run.
    pub fn set_target_state(&self, state: BringupState) {
        self.with(|s| {
            if s.target_state != Some(state) || s.failure.is_some() {
                debug!("Bring-up target: {:?}", state);
            }
            s.target_state = Some(state);
            s.failure = None;
            s.state_waker.wake();
        })
    }

    /// Resolves once the target lies beyond the reached state and the last
    /// run towards it has not failed.
    pub async fn wait_for_work(&self) -> BringupState {
        poll_fn(|cx| {
            self.with(|s| {
                if let Some(target) = s.target_state {
                    if s.failure.is_none() && s.reached_state.map_or(true, |r| target > r) {
                        return Poll::Ready(target);
                    }
                }
                s.state_waker.register(cx.waker());
                Poll::Pending
            })
        })
        .await
    }

    pub fn set_failure(&self, error: Error) {
        self.with(|s| {
            s.failure = Some(error);
            s.state_waker.wake();
        })
    }

    pub fn failure(&self) -> Option<Error> {
        self.with(|s| s.failure.clone())
    }

    pub fn set_cancel(&self, cancel: CancelState) {
        self.with(|s| {
            s.cancel = cancel;
            s.state_waker.wake();
        })
    }

    /// Request cancellation of a running bring-up. A no-op when nothing runs.
    pub fn request_cancel(&self) {
        self.with(|s| {
            if s.cancel == CancelState::Running {
                s.cancel = CancelState::CancelRequested;
                s.state_waker.wake();
            }
        })
    }

    pub fn cancel_state(&self) -> CancelState {
        self.with(|s| s.cancel)
    }

    pub async fn wait_cancel_requested(&self) {
        poll_fn(|cx| {
            self.with(|s| {
                if s.cancel == CancelState::CancelRequested {
                    return Poll::Ready(());
                }
                s.state_waker.register(cx.waker());
                Poll::Pending
            })
        })
        .await
    }

    /// Forget progress beyond `state`, so the next run repeats what comes
    /// after it.
    pub fn lower_reached_state(&self, state: BringupState) {
        self.with(|s| {
            if s.reached_state.is_some_and(|r| r > state) {
                s.reached_state = Some(state);
                s.state_waker.wake();
            }
        })
    }

    pub fn set_sim_pin(&self, pin: Option<&str>) -> Result<(), Error> {
        let pin = pin
            .map(|p| String::try_from(p).map_err(|_| Error::Parameter))
            .transpose()?;
        self.with(|s| s.sim_pin = pin);
        Ok(())
    }

    pub fn sim_pin(&self) -> Option<String<MAX_PIN_LEN>> {
        self.with(|s| s.sim_pin.clone())
    }

    /// Numeric operator id to register on manually, `None` for automatic
    /// selection.
    pub fn set_plmn(&self, plmn: Option<&str>) -> Result<(), Error> {
        let plmn = match plmn {
            Some(p) if p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit()) => {
                return Err(Error::Parameter)
            }
            Some(p) => Some(String::try_from(p).map_err(|_| Error::Parameter)?),
            None => None,
        };
        self.with(|s| s.plmn = plmn);
        Ok(())
    }

    pub fn plmn(&self) -> Option<String<MAX_PLMN_LEN>> {
        self.with(|s| s.plmn.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plmn_must_be_numeric() {
        let mut state = State::new();
        let ch = Runner::new(&mut state);

        assert_eq!(ch.set_plmn(Some("2400A")), Err(Error::Parameter));
        assert_eq!(ch.set_plmn(Some("2400123")), Err(Error::Parameter));
        assert_eq!(ch.set_plmn(Some("24001")), Ok(()));
        assert_eq!(ch.plmn().as_deref(), Some("24001"));
        assert_eq!(ch.set_plmn(None), Ok(()));
        assert_eq!(ch.plmn(), None);
    }

    #[test]
    fn cancel_only_applies_to_a_running_bringup() {
        let mut state = State::new();
        let ch = Runner::new(&mut state);

        ch.request_cancel();
        assert_eq!(ch.cancel_state(), CancelState::Idle);

        ch.set_cancel(CancelState::Running);
        ch.request_cancel();
        assert_eq!(ch.cancel_state(), CancelState::CancelRequested);
    }

    #[test]
    fn new_target_forgets_previous_failure() {
        let mut state = State::new();
        let ch = Runner::new(&mut state);

        ch.set_failure(Error::RetriesExhausted);
        assert_eq!(
            embassy_futures::block_on(ch.wait_for_attach()),
            Err(Error::RetriesExhausted)
        );

        ch.set_target_state(BringupState::AttachingNetwork);
        assert_eq!(ch.failure(), None);
        ch.set_attached(true);
        assert_eq!(embassy_futures::block_on(ch.wait_for_attach()), Ok(()));
    }
}
