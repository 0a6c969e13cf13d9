use super::{rat_mask, ModuleParams, GENERIC_PROPERTIES};
use crate::{
    properties::{Property, PropertyTable},
    registration::RadioAccessTechnology,
};
use embassy_time::Duration;

const PROPERTIES: PropertyTable = GENERIC_PROPERTIES
    .with(Property::CReg, 2)
    .with(Property::CGReg, 2)
    .with(Property::CEReg, 2)
    .with(Property::AtCgsnWithType, 1)
    .with(Property::AtCopsFallbackAuto, 1)
    .with(Property::AtSendDelay, 20)
    .with(
        Property::AccessTechnology,
        rat_mask(&[
            RadioAccessTechnology::Gsm,
            RadioAccessTechnology::Utran,
            RadioAccessTechnology::Eutran,
        ]),
    );

#[derive(Debug, Clone, Copy)]
pub struct LaraR6;

impl ModuleParams for LaraR6 {
    fn power_on_pull_time(&self) -> Option<Duration> {
        Some(Duration::from_millis(300))
    }
    fn power_off_pull_time(&self) -> Duration {
        Duration::from_millis(2000)
    }
    fn boot_wait(&self) -> Duration {
        Duration::from_secs(10)
    }
    fn reset_hold(&self) -> Duration {
        Duration::from_millis(150)
    }
    fn properties(&self) -> PropertyTable {
        PROPERTIES
    }
}
