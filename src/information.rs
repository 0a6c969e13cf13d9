//! Device and subscriber identification.

use atat::asynch::AtatClient;
use heapless::String;

use crate::{
    command::general::{
        types::Snt, GetCCID, GetFirmwareVersion, GetIMEI, GetIMSI, GetManufacturerId, GetModelId,
    },
    error::Error,
    properties::{Property, PropertyTable},
    AtHandle,
};

pub const MAX_ID_LEN: usize = 64;

/// Information sub-object of a [`Device`](crate::device::Device).
pub struct Information<'d, AT: AtatClient> {
    at: AtHandle<'d, AT>,
    properties: PropertyTable,
}

impl<'d, AT: AtatClient> Clone for Information<'d, AT> {
    fn clone(&self) -> Self {
        Self {
            at: self.at,
            properties: self.properties,
        }
    }
}

fn to_string(bytes: &[u8]) -> Result<String<MAX_ID_LEN>, Error> {
    let s = core::str::from_utf8(bytes).map_err(|_| Error::Device)?;
    String::try_from(s.trim()).map_err(|_| Error::Device)
}

impl<'d, AT: AtatClient> Information<'d, AT> {
    pub(crate) fn new(at: AtHandle<'d, AT>, properties: PropertyTable) -> Self {
        Self { at, properties }
    }

    pub async fn get_manufacturer(&self) -> Result<String<MAX_ID_LEN>, Error> {
        let res = self.at.send(&GetManufacturerId).await?;
        to_string(&res.id)
    }

    pub async fn get_model(&self) -> Result<String<MAX_ID_LEN>, Error> {
        let res = self.at.send(&GetModelId).await?;
        to_string(&res.model)
    }

    pub async fn get_revision(&self) -> Result<String<MAX_ID_LEN>, Error> {
        let res = self.at.send(&GetFirmwareVersion).await?;
        to_string(&res.version)
    }

    /// IMEI, or with a module supporting typed `+CGSN`, the IMEISV or SVN.
    pub async fn get_serial_number(&self, snt: Snt) -> Result<u64, Error> {
        let snt = match snt {
            Snt::IMEI => None,
            other if self.properties.is_supported(Property::AtCgsnWithType) => Some(other),
            _ => return Err(Error::Unsupported),
        };
        let res = self.at.send(&GetIMEI { snt }).await?;
        Ok(res.imei)
    }

    pub async fn get_imsi(&self) -> Result<u64, Error> {
        Ok(self.at.send(&GetIMSI).await?.imsi)
    }

    pub async fn get_iccid(&self) -> Result<u128, Error> {
        Ok(self.at.send(&GetCCID).await?.ccid)
    }
}
