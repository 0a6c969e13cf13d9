//! Short message service setup.

use atat::asynch::AtatClient;

use crate::{
    command::sms::{
        types::{MessageFormat, NewMessageIndicationMode},
        SetMessageFormat, SetNewMessageIndication,
    },
    error::Error,
    properties::{Property, PropertyTable},
    AtHandle,
};

/// SMS sub-object of a [`Device`](crate::device::Device).
pub struct Sms<'d, AT: AtatClient> {
    at: AtHandle<'d, AT>,
    properties: PropertyTable,
}

impl<'d, AT: AtatClient> Clone for Sms<'d, AT> {
    fn clone(&self) -> Self {
        Self {
            at: self.at,
            properties: self.properties,
        }
    }
}

impl<'d, AT: AtatClient> Sms<'d, AT> {
    pub(crate) fn new(at: AtHandle<'d, AT>, properties: PropertyTable) -> Self {
        Self { at, properties }
    }

    /// Select the message format and, where supported, route new message
    /// indications to the host.
    pub async fn initialize(&self, format: MessageFormat) -> Result<(), Error> {
        if !self.properties.is_supported(Property::AtCmgf) {
            return Err(Error::Unsupported);
        }
        let mut at = self.at.lock().await;
        at.send(&SetMessageFormat { mode: format }).await?;

        if self.properties.is_supported(Property::AtCnmi) {
            at.send(&SetNewMessageIndication {
                mode: NewMessageIndicationMode::BufferWhenReserved,
                mt: 1,
            })
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
        test_helpers::{sent, MockAtClient, TestConfig, TestModule},
        Resources,
    };
    use embassy_futures::block_on;

    #[test]
    fn initialize_text_mode() {
        let mut resources = Resources::new(MockAtClient::new().ok(b"").ok(b""));
        let (device, _sm) =
            crate::new(&mut resources, TestConfig, TestModule, GENERIC_PROPERTIES, None);
        let sms = device.open_sms();

        block_on(sms.initialize(MessageFormat::Text)).unwrap();
        assert_eq!(sent(&device.at), ["AT+CMGF=1", "AT+CNMI=2,1"]);
    }

    #[test]
    fn initialize_without_cmgf() {
        let mut resources = Resources::new(MockAtClient::new());
        let properties = GENERIC_PROPERTIES.with(Property::AtCmgf, 0);
        let (device, _sm) = crate::new(&mut resources, TestConfig, TestModule, properties, None);
        let sms = device.open_sms();

        assert_eq!(
            block_on(sms.initialize(MessageFormat::Pdu)),
            Err(Error::Unsupported)
        );
        assert!(sent(&device.at).is_empty());
    }
}
