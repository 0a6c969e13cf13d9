//! Argument and parameter types used by Network service Commands and Responses
use atat::atat_derive::AtatEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, AtatEnum)]
pub enum OperatorSelectionMode {
    /// • 0 (default value and factory-programmed value): automatic (<oper>
    ///   field is ignored)
    Automatic = 0,
    /// • 1: manual
    Manual = 1,
    /// • 2: deregister from network
    Deregister = 2,
    /// • 3: set only <format>
    FormatOnly = 3,
    /// • 4: manual/automatic; if manual selection fails, automatic mode is
    ///   entered
    ManualAutomatic = 4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, AtatEnum)]
pub enum NetworkRegistrationUrcConfig {
    /// • 0 (default value and factory-programmed value): network registration
    ///   URC disabled
    UrcDisabled = 0,
    /// • 1: network registration URC +CREG: <stat> enabled
    UrcEnabled = 1,
    /// • 2: network registration and location information URC +CREG:
    ///   <stat>[,<lac>,<ci>[,<AcTStatus>]] enabled
    UrcVerbose = 2,
}

impl NetworkRegistrationUrcConfig {
    /// Map a property-table registration mode onto the URC setting.
    pub fn from_mode(mode: u32) -> Self {
        match mode {
            0 => Self::UrcDisabled,
            1 => Self::UrcEnabled,
            _ => Self::UrcVerbose,
        }
    }
}

/// <selected_AcT> of +URAT
#[derive(Debug, Clone, Copy, PartialEq, Eq, AtatEnum)]
pub enum RatSelection {
    /// 0: GSM / GPRS / eGPRS (single mode)
    Gsm = 0,
    /// 2: UMTS (single mode)
    Umts = 2,
    /// 3: LTE (single mode)
    Lte = 3,
    /// 7: LTE Cat M1
    LteCatM1 = 7,
    /// 8: LTE Cat NB1
    LteCatNb1 = 8,
}
