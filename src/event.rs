//! Status events raised towards the application.

use heapless::String;

use crate::{
    bringup::BringupState,
    context::ContextHandle,
    device::SimState,
    error::Error,
    network::AttachStatus,
    registration::{RadioAccessTechnology, RegType, Status},
};

/// Receiver of every status event of one device.
pub type StatusCallback<'d> = &'d dyn Fn(Event);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectionStatus {
    Connecting,
    GlobalUp,
    Disconnected,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// Connection status of a context, or of every context when `context`
    /// is `None`.
    Connection {
        context: Option<ContextHandle>,
        status: ConnectionStatus,
    },
    RegistrationStatusChanged {
        reg_type: RegType,
        status: Status,
    },
    CellIdChanged {
        reg_type: RegType,
        cell_id: String<8>,
    },
    RadioAccessTechnologyChanged {
        reg_type: RegType,
        act: RadioAccessTechnology,
    },
    AttachStatus(AttachStatus),
    SimStatus(SimState),
    DeviceReady,
    SignalQuality {
        rssi: u8,
        ber: u8,
    },
    /// A bring-up state failed and is scheduled to run again.
    StateRetry {
        state: BringupState,
        retry: u8,
    },
    /// A bring-up state failed for good.
    StateFailed {
        state: BringupState,
        error: Error,
    },
}

pub(crate) fn emit(sink: Option<StatusCallback<'_>>, event: Event) {
    trace!("Status event: {:?}", event);
    if let Some(sink) = sink {
        sink(event);
    }
}
