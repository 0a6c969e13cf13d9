//! Registration status cache, one entry per registration family.

use crate::command::{
    network_service::{responses::NetworkRegistrationStatus, urc::NetworkRegistration},
    psn::{
        responses::{EPSNetworkRegistrationStatus, GPRSNetworkRegistrationStatus},
        urc::{EPSNetworkRegistration, GPRSNetworkRegistration},
    },
};
use embassy_time::{Duration, Instant};
use heapless::String;

#[derive(Debug, Clone, Default)]
pub struct CellularRegistrationStatus {
    status: Status,
    updated: Option<Instant>,
    started: Option<Instant>,
}

impl CellularRegistrationStatus {
    pub const fn new() -> Self {
        Self {
            status: Status::None,
            updated: None,
            started: None,
        }
    }

    /// How long the current status has been held at `ts`.
    pub fn duration(&self, ts: Instant) -> Duration {
        self.started
            .and_then(|started| ts.checked_duration_since(started))
            .unwrap_or_else(|| Duration::from_millis(0))
    }

    pub fn updated(&self) -> Option<Instant> {
        self.updated
    }

    pub fn reset(&mut self) {
        self.status = Status::None;
        self.updated = None;
        self.started = None;
    }

    pub fn get_status(&self) -> Status {
        self.status
    }

    pub fn set_status(&mut self, stat: Status) {
        let ts = Instant::now();
        if self.status != stat {
            self.status = stat;
            self.started = Some(ts);
        }
        self.updated = Some(ts);
    }

    pub fn registered(&self) -> bool {
        self.status.is_registered()
    }
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Status {
    #[default]
    None,
    NotRegistering,
    Home,
    Searching,
    Denied,
    OutOfCoverage,
    Roaming,
}

impl Status {
    pub fn is_registered(self) -> bool {
        matches!(self, Self::Home | Self::Roaming)
    }
}

impl From<u8> for Status {
    fn from(v: u8) -> Self {
        match v {
            0 => Self::NotRegistering,
            1 => Self::Home,
            2 => Self::Searching,
            3 => Self::Denied,
            4 => Self::OutOfCoverage,
            5 => Self::Roaming,
            _ => Self::None,
        }
    }
}

/// Registration family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegType {
    /// Circuit switched, `+CREG`
    Creg,
    /// GPRS, `+CGREG`
    Cgreg,
    /// EPS, `+CEREG`
    Cereg,
}

impl RegType {
    /// Families in the order their status takes precedence when combined.
    pub const PRECEDENCE: [RegType; 3] = [RegType::Cereg, RegType::Cgreg, RegType::Creg];
}

/// Radio access technology as reported in the `<AcT>` field of the
/// registration and operator responses.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RadioAccessTechnology {
    Gsm = 0,
    GsmCompact = 1,
    Utran = 2,
    Egprs = 3,
    Hsdpa = 4,
    Hsupa = 5,
    HsdpaHsupa = 6,
    Eutran = 7,
    CatM1 = 8,
    Nb1 = 9,
    #[default]
    Unknown,
}

impl RadioAccessTechnology {
    pub fn from_act(act: u8) -> Option<Self> {
        Some(match act {
            0 => Self::Gsm,
            1 => Self::GsmCompact,
            2 => Self::Utran,
            3 => Self::Egprs,
            4 => Self::Hsdpa,
            5 => Self::Hsupa,
            6 => Self::HsdpaHsupa,
            7 => Self::Eutran,
            8 => Self::CatM1,
            9 => Self::Nb1,
            _ => return None,
        })
    }

    fn from_field(act: Option<u8>) -> Self {
        act.and_then(Self::from_act).unwrap_or_default()
    }

    /// Bit of this technology in the `AccessTechnology` property mask.
    pub fn mask(self) -> u32 {
        match self {
            Self::Unknown => 0,
            rat => 1 << rat as u32,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegistrationParams {
    pub reg_type: RegType,
    pub status: Status,
    pub act: RadioAccessTechnology,
    pub cell_id: Option<String<8>>,
    pub lac: Option<String<8>>,
}

/// What a call to [`RegistrationState::compare_and_set`] changed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RegistrationChange {
    pub status: bool,
    pub cell_id: bool,
    pub act: bool,
}

#[derive(Debug, Clone, Default)]
pub struct FamilyState {
    pub(crate) status: CellularRegistrationStatus,
    pub(crate) act: RadioAccessTechnology,
    pub(crate) cell_id: Option<String<8>>,
    pub(crate) lac: Option<String<8>>,
}

impl FamilyState {
    pub const fn new() -> Self {
        Self {
            status: CellularRegistrationStatus::new(),
            act: RadioAccessTechnology::Unknown,
            cell_id: None,
            lac: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RegistrationState {
    /// CSD (Circuit Switched Data) registration status (registered/searching/roaming etc.).
    pub(crate) csd: FamilyState,
    /// PSD (Packet Switched Data) registration status (registered/searching/roaming etc.).
    pub(crate) psd: FamilyState,
    /// EPS (Evolved Packet Switched) registration status (registered/searching/roaming etc.).
    pub(crate) eps: FamilyState,
}

impl RegistrationState {
    pub const fn new() -> Self {
        Self {
            csd: FamilyState::new(),
            psd: FamilyState::new(),
            eps: FamilyState::new(),
        }
    }

    fn family(&self, reg_type: RegType) -> &FamilyState {
        match reg_type {
            RegType::Creg => &self.csd,
            RegType::Cgreg => &self.psd,
            RegType::Cereg => &self.eps,
        }
    }

    fn family_mut(&mut self, reg_type: RegType) -> &mut FamilyState {
        match reg_type {
            RegType::Creg => &mut self.csd,
            RegType::Cgreg => &mut self.psd,
            RegType::Cereg => &mut self.eps,
        }
    }

    /// Registered in any family.
    pub fn is_registered(&self) -> bool {
        self.csd.status.registered() || self.psd.status.registered() || self.eps.status.registered()
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Last known parameters of one family.
    pub fn params(&self, reg_type: RegType) -> RegistrationParams {
        let family = self.family(reg_type);
        RegistrationParams {
            reg_type,
            status: family.status.get_status(),
            act: family.act,
            cell_id: family.cell_id.clone(),
            lac: family.lac.clone(),
        }
    }

    /// Fold `new_params` into its family, leaving the other families alone.
    pub fn compare_and_set(&mut self, new_params: RegistrationParams) -> RegistrationChange {
        let family = self.family_mut(new_params.reg_type);
        let mut change = RegistrationChange::default();

        if family.status.get_status() != new_params.status {
            change.status = true;
        }
        family.status.set_status(new_params.status);

        if new_params.act != RadioAccessTechnology::Unknown && new_params.act != family.act {
            family.act = new_params.act;
            change.act = true;
        }

        // Update cell identity
        if new_params.cell_id.is_some() && family.cell_id != new_params.cell_id {
            family.cell_id = new_params.cell_id;
            family.lac = new_params.lac;
            change.cell_id = true;
        }

        change
    }
}

impl From<NetworkRegistration> for RegistrationParams {
    fn from(v: NetworkRegistration) -> Self {
        Self {
            reg_type: RegType::Creg,
            status: v.stat.into(),
            act: RadioAccessTechnology::from_field(v.act),
            cell_id: v.ci,
            lac: v.lac,
        }
    }
}

impl From<NetworkRegistrationStatus> for RegistrationParams {
    fn from(v: NetworkRegistrationStatus) -> Self {
        Self {
            reg_type: RegType::Creg,
            status: v.stat.into(),
            act: RadioAccessTechnology::from_field(v.act),
            cell_id: v.ci,
            lac: v.lac,
        }
    }
}

impl From<GPRSNetworkRegistration> for RegistrationParams {
    fn from(v: GPRSNetworkRegistration) -> Self {
        Self {
            reg_type: RegType::Cgreg,
            status: v.stat.into(),
            act: RadioAccessTechnology::from_field(v.act),
            cell_id: v.ci,
            lac: v.lac,
        }
    }
}

impl From<GPRSNetworkRegistrationStatus> for RegistrationParams {
    fn from(v: GPRSNetworkRegistrationStatus) -> Self {
        Self {
            reg_type: RegType::Cgreg,
            status: v.stat.into(),
            act: RadioAccessTechnology::from_field(v.act),
            cell_id: v.ci,
            lac: v.lac,
        }
    }
}

impl From<EPSNetworkRegistration> for RegistrationParams {
    fn from(v: EPSNetworkRegistration) -> Self {
        Self {
            reg_type: RegType::Cereg,
            status: v.stat.into(),
            act: RadioAccessTechnology::from_field(v.act),
            cell_id: v.ci,
            lac: v.tac,
        }
    }
}

impl From<EPSNetworkRegistrationStatus> for RegistrationParams {
    fn from(v: EPSNetworkRegistrationStatus) -> Self {
        Self {
            reg_type: RegType::Cereg,
            status: v.stat.into(),
            act: RadioAccessTechnology::from_field(v.act),
            cell_id: v.ci,
            lac: v.tac,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(reg_type: RegType, stat: u8, ci: Option<&str>) -> RegistrationParams {
        RegistrationParams {
            reg_type,
            status: stat.into(),
            act: RadioAccessTechnology::Unknown,
            cell_id: ci.map(|c| String::try_from(c).unwrap()),
            lac: None,
        }
    }

    #[test]
    fn families_are_tracked_independently() {
        let mut state = RegistrationState::new();

        let change = state.compare_and_set(params(RegType::Cereg, 5, Some("0A0B")));
        assert!(change.status);
        assert!(change.cell_id);
        assert_eq!(state.params(RegType::Cereg).status, Status::Roaming);
        assert_eq!(state.params(RegType::Creg).status, Status::None);
        assert_eq!(state.params(RegType::Cgreg).cell_id, None);
        assert!(state.is_registered());
    }

    #[test]
    fn repeated_status_is_not_a_change() {
        let mut state = RegistrationState::new();
        state.compare_and_set(params(RegType::Cgreg, 2, Some("01")));

        let change = state.compare_and_set(params(RegType::Cgreg, 2, Some("02")));
        assert!(!change.status);
        assert!(change.cell_id);

        let change = state.compare_and_set(params(RegType::Cgreg, 2, None));
        assert_eq!(change, RegistrationChange::default());
        assert_eq!(state.params(RegType::Cgreg).cell_id.as_deref(), Some("02"));
    }

    #[test]
    fn status_duration_runs_from_the_last_change() {
        let mut status = CellularRegistrationStatus::new();
        assert_eq!(status.duration(Instant::now()), Duration::from_millis(0));
        assert_eq!(status.updated(), None);

        status.set_status(Status::Searching);
        let later = Instant::now() + Duration::from_secs(5);
        assert!(status.duration(later) >= Duration::from_secs(5));
        assert!(status.updated().is_some());

        status.reset();
        assert_eq!(status.get_status(), Status::None);
        assert_eq!(status.duration(later), Duration::from_millis(0));
    }

    #[test]
    fn access_technology_mask() {
        assert_eq!(RadioAccessTechnology::Gsm.mask(), 0b1);
        assert_eq!(RadioAccessTechnology::CatM1.mask(), 1 << 8);
        assert_eq!(RadioAccessTechnology::Unknown.mask(), 0);
        assert_eq!(RadioAccessTechnology::from_act(12), None);
    }
}
