//! Argument and parameter types used by Device lock Commands and Responses

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinStatusCode {
    /// MT is not pending for any password
    Ready,
    /// MT is waiting SIM PIN to be given
    SimPin,
    /// MT is waiting SIM PUK to be given
    SimPuk,
    /// MT is waiting SIM PIN2 to be given
    SimPin2,
    /// MT is waiting SIM PUK2 to be given
    SimPuk2,
    /// MT is waiting network personalization password to be given
    PhNetPin,
    /// MT is waiting network subset personalization password to be given
    PhNetSubPin,
    /// MT is waiting service provider personalization password to be given
    PhSpPin,
    /// MT is waiting corporate personalization password to be given
    PhCorpPin,
    /// MT is waiting phone-to-SIM card password to be given
    PhSimPin,
}

impl PinStatusCode {
    pub(crate) fn from_bytes(value: &[u8]) -> Option<Self> {
        Some(match value {
            b"READY" => Self::Ready,
            b"SIM PIN" => Self::SimPin,
            b"SIM PUK" => Self::SimPuk,
            b"SIM PIN2" => Self::SimPin2,
            b"SIM PUK2" => Self::SimPuk2,
            b"PH-NET PIN" => Self::PhNetPin,
            b"PH-NETSUB PIN" => Self::PhNetSubPin,
            b"PH-SP PIN" => Self::PhSpPin,
            b"PH-CORP PIN" => Self::PhCorpPin,
            b"PH-SIM PIN" => Self::PhSimPin,
            _ => return None,
        })
    }
}
