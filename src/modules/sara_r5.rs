use super::{rat_mask, ModuleParams, GENERIC_PROPERTIES};
use crate::{
    command::{
        mobile_control::types::Functionality,
        psn::{types::ContextId, SetAuthParameters},
    },
    config::Credentials,
    error::Error,
    properties::{Property, PropertyTable},
    registration::RadioAccessTechnology,
    AtLock,
};
use atat::asynch::AtatClient;
use embassy_time::Duration;

// LTE only: no GPRS registration, EPS registration with location
const PROPERTIES: PropertyTable = GENERIC_PROPERTIES
    .with(Property::CGReg, 0)
    .with(Property::CEReg, 2)
    .with(Property::NonIpPdpType, 1)
    .with(Property::AtCgsnWithType, 1)
    .with(Property::AtSendDelay, 20)
    .with(
        Property::AccessTechnology,
        rat_mask(&[RadioAccessTechnology::CatM1, RadioAccessTechnology::Nb1]),
    );

#[derive(Debug, Clone, Copy)]
pub struct SaraR5;

impl ModuleParams for SaraR5 {
    fn power_on_pull_time(&self) -> Option<Duration> {
        Some(Duration::from_millis(1500))
    }
    fn power_off_pull_time(&self) -> Duration {
        Duration::from_millis(2000)
    }
    fn boot_wait(&self) -> Duration {
        Duration::from_secs(6)
    }
    fn reset_hold(&self) -> Duration {
        Duration::from_millis(150)
    }
    fn radio_off_cfun(&self) -> Functionality {
        Functionality::Minimum
    }
    fn properties(&self) -> PropertyTable {
        PROPERTIES
    }

    /// SARA-R5 configures context authentication through `+UAUTHREQ`, which
    /// also accepts automatic selection.
    async fn authenticate<AT: AtatClient>(
        &self,
        at: &mut AtLock<'_, AT>,
        cid: ContextId,
        credentials: &Credentials,
    ) -> Result<(), Error> {
        at.send(&SetAuthParameters {
            cid,
            auth_type: credentials.auth_type,
            username: &credentials.username,
            password: &credentials.password,
        })
        .await?;
        Ok(())
    }
}
