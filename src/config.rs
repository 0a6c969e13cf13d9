use core::convert::Infallible;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin, PinState};
use heapless::String;

use crate::{command::psn::types::AuthenticationType, error::Error};

pub struct NoPin;

impl ErrorType for NoPin {
    type Error = core::convert::Infallible;
}

impl InputPin for NoPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(true)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(false)
    }
}

impl OutputPin for NoPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

pub struct ReverseOutputPin<P: OutputPin<Error = Infallible>>(pub P);

impl<P: OutputPin<Error = Infallible>> ErrorType for ReverseOutputPin<P> {
    type Error = Infallible;
}

impl<P: OutputPin<Error = Infallible>> OutputPin for ReverseOutputPin<P> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0.set_high()
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.0.set_low()
    }

    fn set_state(&mut self, state: PinState) -> Result<(), Self::Error> {
        match state {
            PinState::Low => self.0.set_state(PinState::High),
            PinState::High => self.0.set_state(PinState::Low),
        }
    }
}

pub struct ReverseInputPin<P: InputPin<Error = Infallible>>(pub P);

impl<P: InputPin<Error = Infallible>> ErrorType for ReverseInputPin<P> {
    type Error = Infallible;
}

impl<P: InputPin<Error = Infallible>> InputPin for ReverseInputPin<P> {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        self.0.is_low()
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.0.is_high()
    }
}

/// Board level wiring of the modem, consumed by the bring-up state machine.
pub trait CellularConfig {
    type ResetPin: OutputPin;
    type PowerPin: OutputPin;
    type VintPin: InputPin;

    const FLOW_CONTROL: bool = false;
    const OPERATOR_FORMAT: OperatorFormat = OperatorFormat::Long;

    fn reset_pin(&mut self) -> Option<&mut Self::ResetPin>;
    fn power_pin(&mut self) -> Option<&mut Self::PowerPin>;
    fn vint_pin(&mut self) -> Option<&mut Self::VintPin>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OperatorFormat {
    Long = 0,
    Short = 1,
    Numeric = 2,
}

pub const MAX_APN_LEN: usize = 99;
pub const MAX_CREDENTIAL_LEN: usize = 64;

/// User authentication for a packet data context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub username: String<MAX_CREDENTIAL_LEN>,
    pub password: String<MAX_CREDENTIAL_LEN>,
    pub auth_type: AuthenticationType,
}

impl Credentials {
    /// Both `username` and `password` are required; an absent or oversized
    /// value is rejected.
    pub fn new(
        username: &str,
        password: &str,
        auth_type: AuthenticationType,
    ) -> Result<Self, Error> {
        Ok(Self {
            username: String::try_from(username).map_err(|_| Error::Parameter)?,
            password: String::try_from(password).map_err(|_| Error::Parameter)?,
            auth_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oversized_credentials_are_rejected() {
        let long = "x".repeat(MAX_CREDENTIAL_LEN + 1);
        assert_eq!(
            Credentials::new(&long, "pw", AuthenticationType::PAP),
            Err(Error::Parameter)
        );
        let creds = Credentials::new("user", "pw", AuthenticationType::CHAP).unwrap();
        assert_eq!(creds.username.as_str(), "user");
    }

    #[test]
    fn reversed_pins_invert_level() {
        let mut pin = ReverseInputPin(NoPin);
        assert_eq!(pin.is_high(), Ok(false));
        assert_eq!(pin.is_low(), Ok(true));
    }
}
