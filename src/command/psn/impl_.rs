use super::types::PacketDomainEventKind;
use core::str::FromStr;
use no_std_net::{IpAddr, Ipv4Addr, Ipv6Addr};
use serde::{de, Deserialize, Deserializer};

impl<'de> Deserialize<'de> for PacketDomainEventKind {
    fn deserialize<D>(deserializer: D) -> core::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct Visitor;

        impl<'de> de::Visitor<'de> for Visitor {
            type Value = PacketDomainEventKind;
            fn expecting(&self, formatter: &mut core::fmt::Formatter) -> core::fmt::Result {
                core::fmt::Formatter::write_str(formatter, "packet domain event")
            }

            fn visit_bytes<E>(self, value: &[u8]) -> core::result::Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(PacketDomainEventKind::from_bytes(value))
            }

            fn visit_str<E>(self, value: &str) -> core::result::Result<Self::Value, E>
            where
                E: de::Error,
            {
                self.visit_bytes(value.as_bytes())
            }
        }

        Deserializer::deserialize_identifier(deserializer, Visitor)
    }
}

/// Parse an address the way +CGCONTRDP and +CGDCONT print them: standard
/// notation when +CGPIAF is set, otherwise dotted decimal with 4 (IPv4) or
/// 16 (IPv6) octets.
pub(crate) fn parse_address(s: &str) -> Option<IpAddr> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if s.contains(':') {
        return IpAddr::from_str(s).ok();
    }

    let mut octets = [0u8; 16];
    let n = parse_octets(s, &mut octets)?;
    octets_to_addr(&octets[..n])
}

/// Split a `<local_addr and subnet_mask>` field into address and mask.
///
/// The modem prints both in one token, either as `a1.a2.a3.a4.m1.m2.m3.m4`
/// (32 octets for IPv6) or as two space separated addresses.
pub(crate) fn parse_address_and_mask(s: &str) -> Option<(IpAddr, Option<IpAddr>)> {
    let s = s.trim();
    if let Some((addr, mask)) = s.split_once(' ') {
        return Some((parse_address(addr)?, parse_address(mask)));
    }
    if s.contains(':') {
        return Some((IpAddr::from_str(s).ok()?, None));
    }

    let mut octets = [0u8; 32];
    let n = parse_octets(s, &mut octets)?;
    match n {
        4 | 16 => Some((octets_to_addr(&octets[..n])?, None)),
        8 | 32 => {
            let half = n / 2;
            Some((
                octets_to_addr(&octets[..half])?,
                octets_to_addr(&octets[half..n]),
            ))
        }
        _ => None,
    }
}

fn parse_octets(s: &str, out: &mut [u8]) -> Option<usize> {
    let mut n = 0;
    for part in s.split('.') {
        *out.get_mut(n)? = part.parse().ok()?;
        n += 1;
    }
    Some(n)
}

fn octets_to_addr(octets: &[u8]) -> Option<IpAddr> {
    match octets.len() {
        4 => Some(IpAddr::V4(Ipv4Addr::new(
            octets[0], octets[1], octets[2], octets[3],
        ))),
        16 => {
            let mut segments = [0u16; 8];
            for (i, seg) in segments.iter_mut().enumerate() {
                *seg = u16::from_be_bytes([octets[2 * i], octets[2 * i + 1]]);
            }
            Some(IpAddr::V6(Ipv6Addr::new(
                segments[0],
                segments[1],
                segments[2],
                segments[3],
                segments[4],
                segments[5],
                segments[6],
                segments[7],
            )))
        }
        _ => None,
    }
}
