#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// The modem rejected a command, or the command channel failed to
    /// deliver it
    Atat(atat::Error),
    /// The modem answered, but not with something we can act upon
    Device,

    /// Invalid or out-of-range input, detected before any command is issued
    Parameter,
    /// Capability is absent according to the property table
    Unsupported,
    /// Credentials were rejected during context activation
    Authentication,

    // Resource exhaustion
    NoSocket,
    NoMemory,

    // State-machine preconditions
    AlreadyConnected,
    NoConnection,
    Busy,

    /// A bounded wait expired before the operation completed
    Timeout,
    Cancelled,

    // Bring-up
    SimPinRequired,
    RetriesExhausted,
    PoweredDown,
    IoPin,
}

impl From<atat::Error> for Error {
    fn from(e: atat::Error) -> Self {
        Self::Atat(e)
    }
}

impl From<embassy_time::TimeoutError> for Error {
    fn from(_: embassy_time::TimeoutError) -> Self {
        Self::Timeout
    }
}
