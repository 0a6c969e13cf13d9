use embassy_time::{Duration, Timer};
use embedded_hal::digital::{InputPin as _, OutputPin as _};

use crate::{config::CellularConfig, error::Error, modules::ModuleParams};

const GENERIC_PWR_ON_TIMES: [u16; 2] = [300, 2000];

/// Drives the power related pins of the modem.
pub(crate) struct PwrCtrl<'b, C, M> {
    config: &'b mut C,
    module: M,
}

impl<'b, C, M> PwrCtrl<'b, C, M>
where
    C: CellularConfig,
    M: ModuleParams,
{
    pub(crate) fn new(config: &'b mut C, module: M) -> Self {
        Self { config, module }
    }

    /// Without a VInt pin the modem is assumed to be powered.
    pub(crate) fn has_power(&mut self) -> Result<bool, Error> {
        if let Some(pin) = self.config.vint_pin() {
            pin.is_high().map_err(|_| Error::IoPin)
        } else {
            trace!("No VInt pin configured");
            Ok(true)
        }
    }

    /// Reset the module by driving its `RESET_N` pin low for
    /// `reset_hold()`.
    ///
    /// **NOTE** This function will reset NVM settings!
    pub(crate) async fn reset(&mut self) -> Result<(), Error> {
        warn!("Hard resetting cellular module");
        if let Some(pin) = self.config.reset_pin() {
            pin.set_low().map_err(|_| Error::IoPin)?;
            Timer::after(self.module.reset_hold()).await;
            pin.set_high().map_err(|_| Error::IoPin)?;
            Timer::after(self.module.boot_wait()).await;
        } else {
            warn!("No reset pin configured");
        }
        Ok(())
    }

    /// Pulse `PWR_ON` until VInt reports power. Returns `Ok(false)` when
    /// the modem was already powered and nothing was done.
    pub(crate) async fn power_up(&mut self) -> Result<bool, Error> {
        if self.has_power()? {
            return Ok(false);
        }

        debug!("Attempting to power up device");
        for generic_time in GENERIC_PWR_ON_TIMES {
            let pull_time = self
                .module
                .power_on_pull_time()
                .unwrap_or(Duration::from_millis(generic_time as _));

            let Some(pin) = self.config.power_pin() else {
                warn!("No power pin configured");
                return Ok(false);
            };
            pin.set_low().map_err(|_| Error::IoPin)?;
            Timer::after(pull_time).await;
            pin.set_high().map_err(|_| Error::IoPin)?;

            Timer::after(self.module.boot_wait()).await;

            if self.has_power()? {
                debug!("Powered up");
                return Ok(true);
            }
        }
        Err(Error::PoweredDown)
    }

    pub(crate) async fn power_down(&mut self) -> Result<(), Error> {
        if !self.has_power()? {
            return Ok(());
        }
        if let Some(pin) = self.config.power_pin() {
            pin.set_low().map_err(|_| Error::IoPin)?;
            Timer::after(self.module.power_off_pull_time()).await;
            pin.set_high().map_err(|_| Error::IoPin)?;
            debug!("Powered down");
        } else {
            warn!("No power pin configured");
        }
        Ok(())
    }
}
