#![cfg_attr(not(test), no_std)]
#![allow(async_fn_in_trait)]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod bringup;
pub mod command;
pub mod config;
pub mod context;
pub mod device;
pub mod error;
pub mod event;
mod hex;
pub mod information;
pub mod modules;
pub mod network;
pub mod properties;
mod pwr;
pub mod registration;
pub mod sms;
pub mod stack;
pub(crate) mod state;

#[cfg(test)]
pub(crate) mod test_helpers;

use atat::{asynch::AtatClient, AtatCmd};
use embassy_sync::{
    blocking_mutex::raw::NoopRawMutex,
    mutex::{Mutex, MutexGuard},
};
use embassy_time::{Duration, Instant, Timer};

use crate::{
    bringup::StateMachine, config::CellularConfig, device::Device, error::Error,
    event::StatusCallback, modules::ModuleParams, properties::PropertyTable,
};

/// The command channel together with the bookkeeping needed to honour the
/// minimum gap between two commands.
pub(crate) struct Channel<AT> {
    pub(crate) client: AT,
    send_delay: Duration,
    last_sent: Option<Instant>,
}

/// Shared access to the command channel.
///
/// `send()` holds the channel for a single command. Sequences that must not
/// be interleaved with other callers use [`AtHandle::lock`] and keep the
/// returned guard alive across every command of the sequence.
pub struct AtHandle<'d, AT: AtatClient>(&'d Mutex<NoopRawMutex, Channel<AT>>);

impl<'d, AT: AtatClient> Clone for AtHandle<'d, AT> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'d, AT: AtatClient> Copy for AtHandle<'d, AT> {}

impl<'d, AT: AtatClient> AtHandle<'d, AT> {
    pub async fn send<Cmd: AtatCmd>(&self, cmd: &Cmd) -> Result<Cmd::Response, Error> {
        self.lock().await.send(cmd).await
    }

    pub async fn lock(&self) -> AtLock<'d, AT> {
        AtLock(self.0.lock().await)
    }
}

/// Exclusive hold on the command channel. Dropping it releases the channel.
pub struct AtLock<'d, AT: AtatClient>(MutexGuard<'d, NoopRawMutex, Channel<AT>>);

impl<'d, AT: AtatClient> AtLock<'d, AT> {
    pub async fn send<Cmd: AtatCmd>(&mut self, cmd: &Cmd) -> Result<Cmd::Response, Error> {
        let ch = &mut *self.0;
        if let Some(last) = ch.last_sent {
            let ready_at = last + ch.send_delay;
            if Instant::now() < ready_at {
                Timer::at(ready_at).await;
            }
        }

        let res = ch.client.send_retry::<Cmd>(cmd).await;
        ch.last_sent = Some(Instant::now());
        res.map_err(|e| {
            debug!("Command failed: {:?}", e);
            Error::from(e)
        })
    }
}

/// Storage for everything a [`Device`] and its bring-up [`StateMachine`]
/// share. Must outlive both.
pub struct Resources<AT: AtatClient> {
    ch: state::State,
    at: Mutex<NoopRawMutex, Channel<AT>>,
}

impl<AT: AtatClient> Resources<AT> {
    pub fn new(client: AT) -> Self {
        Self {
            ch: state::State::new(),
            at: Mutex::new(Channel {
                client,
                send_delay: Duration::from_ticks(0),
                last_sent: None,
            }),
        }
    }
}

/// Create the device manager and the bring-up state machine for one modem.
///
/// `properties` is the capability table of the attached modem, usually
/// `module.properties()`; `PropertyTable::EMPTY` marks every capability as
/// unsupported. `sink` receives every status event raised by either half.
pub fn new<'d, AT, C, M>(
    resources: &'d mut Resources<AT>,
    config: C,
    module: M,
    properties: PropertyTable,
    sink: Option<StatusCallback<'d>>,
) -> (Device<'d, AT, M>, StateMachine<'d, AT, C, M>)
where
    AT: AtatClient,
    C: CellularConfig,
    M: ModuleParams,
{
    let Resources { ch, at } = resources;
    at.get_mut().send_delay = properties.send_delay();

    let at = AtHandle(&*at);
    let ch = state::Runner::new(ch);

    let device = Device::new(at, ch.clone(), module, properties, sink);
    let state_machine = StateMachine::new(at, ch, config, module, properties, sink);

    (device, state_machine)
}
