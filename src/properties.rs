//! Capability table of the attached modem.
//!
//! One integer per named capability. The table is handed to the device at
//! construction; every component consults it before issuing a command the
//! modem may not implement.

use embassy_time::Duration;

use crate::registration::RegType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Property {
    /// Circuit switched registration (`+CREG`): 0 disabled, 1 enabled, 2
    /// enabled with location information
    CReg,
    /// GPRS registration (`+CGREG`), same encoding as `CReg`
    CGReg,
    /// EPS registration (`+CEREG`), same encoding as `CReg`
    CEReg,
    /// `+CGSN` accepts the `<snt>` argument
    AtCgsnWithType,
    AtCgdata,
    AtCgauth,
    AtCnmi,
    AtCsmp,
    AtCmgf,
    AtCsdh,
    Ipv4PdpType,
    Ipv6PdpType,
    Ipv4v6PdpType,
    NonIpPdpType,
    AtCgerep,
    /// `+COPS` falls back to automatic selection when manual selection fails
    AtCopsFallbackAuto,
    /// Number of sockets the modem can keep open at once
    SocketCount,
    IpTcp,
    IpUdp,
    /// Minimum gap between two commands, in milliseconds
    AtSendDelay,
    /// Bitmask of selectable radio access technologies, bit `n` being
    /// [`RadioAccessTechnology`](crate::network::RadioAccessTechnology) `n`
    AccessTechnology,
}

impl Property {
    pub const COUNT: usize = Property::AccessTechnology as usize + 1;
}

impl From<RegType> for Property {
    fn from(reg_type: RegType) -> Self {
        match reg_type {
            RegType::Creg => Self::CReg,
            RegType::Cgreg => Self::CGReg,
            RegType::Cereg => Self::CEReg,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyTable([u32; Property::COUNT]);

impl Default for PropertyTable {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl PropertyTable {
    /// Every capability unsupported.
    pub const EMPTY: Self = Self([0; Property::COUNT]);

    pub const fn new(values: [u32; Property::COUNT]) -> Self {
        Self(values)
    }

    pub const fn with(mut self, property: Property, value: u32) -> Self {
        self.0[property as usize] = value;
        self
    }

    pub fn get(&self, property: Property) -> u32 {
        self.0[property as usize]
    }

    pub fn is_supported(&self, property: Property) -> bool {
        self.get(property) != 0
    }

    pub fn send_delay(&self) -> Duration {
        Duration::from_millis(self.get(Property::AtSendDelay) as u64)
    }

    pub fn socket_count(&self) -> usize {
        self.get(Property::SocketCount) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_table_supports_nothing() {
        let table = PropertyTable::EMPTY;
        assert!(!table.is_supported(Property::CReg));
        assert!(!table.is_supported(Property::AccessTechnology));
        assert_eq!(table.send_delay(), Duration::from_millis(0));
    }

    #[test]
    fn with_overrides_a_single_entry() {
        const TABLE: PropertyTable = PropertyTable::EMPTY
            .with(Property::CEReg, 2)
            .with(Property::AtSendDelay, 20);

        assert_eq!(TABLE.get(Property::CEReg), 2);
        assert_eq!(TABLE.get(Property::CGReg), 0);
        assert_eq!(TABLE.send_delay(), Duration::from_millis(20));
        assert_eq!(Property::from(RegType::Cgreg), Property::CGReg);
    }
}
