//! ### 7 - Network service
pub mod responses;
pub mod types;
pub mod urc;

use super::{lines, NoResponse};
use atat::atat_derive::AtatCmd;
use atat::{AtatCmd, InternalError};
use heapless::{String, Vec};
use responses::{NetworkRegistrationStatus, OperatorInfo, OperatorList, OperatorSelection, SignalQuality};
use types::{NetworkRegistrationUrcConfig, OperatorSelectionMode, RatSelection};

/// 7.4 Signal quality +CSQ
///
/// Returns the received signal strength indication <rssi> and the channel
/// bit error rate <ber>. 99 in either field means not known or not
/// detectable.
#[derive(Clone, AtatCmd)]
#[at_cmd("+CSQ", SignalQuality)]
pub struct GetSignalQuality;

/// 7.5 Operator selection +COPS
///
/// Forces an attempt to select and register with the GSM/UMTS/LTE network
/// operator, that can be chosen in the list of network operators returned by
/// the test command. The operator is given in numeric format when the
/// selection is manual.
#[derive(Clone, AtatCmd)]
#[at_cmd("+COPS", NoResponse, attempts = 1, timeout_ms = 180000)]
pub struct SetOperatorSelection<'a> {
    #[at_arg(position = 0)]
    pub mode: OperatorSelectionMode,
    #[at_arg(position = 1)]
    pub format: Option<u8>,
    #[at_arg(position = 2, len = 6)]
    pub oper: Option<&'a str>,
}

/// 7.5 Operator selection +COPS
#[derive(Clone, AtatCmd)]
#[at_cmd("+COPS?", OperatorSelection, timeout_ms = 180000)]
pub struct GetOperatorSelection;

/// 7.5 Operator selection +COPS
///
/// The test command returns the available operators as a list of
/// parenthesised tuples `(<stat>,long,short,numeric[,<AcT>])`, followed by
/// the supported modes and formats. The derive can't express this grammar,
/// so the response is parsed by hand.
#[derive(Clone)]
pub struct ScanOperators;

impl AtatCmd for ScanOperators {
    type Response = OperatorList;

    const MAX_LEN: usize = 12;
    const MAX_TIMEOUT_MS: u32 = 180_000;
    const ATTEMPTS: u8 = 1;

    fn write(&self, buf: &mut [u8]) -> usize {
        lines::write_cmd(buf, format_args!("+COPS=?"))
    }

    fn parse(&self, resp: Result<&[u8], InternalError>) -> Result<Self::Response, atat::Error> {
        let resp = resp.map_err(atat::Error::from)?;
        let mut operators = Vec::new();
        for line in resp.split(|b| *b == b'\n').map(lines::trim) {
            for field in lines::fields(line) {
                let Some(tuple) = field.strip_prefix(b"(").and_then(|f| f.strip_suffix(b")")) else {
                    continue;
                };
                // The trailing `(0-4),(0-2)` ranges carry no quoted names
                if !tuple.contains(&b'"') {
                    continue;
                }
                let op = OperatorInfo::parse(tuple).ok_or(atat::Error::Parse)?;
                if operators.push(op).is_err() {
                    warn!("Operator list truncated");
                    break;
                }
            }
        }
        Ok(OperatorList { operators })
    }
}

/// 7.14 Network registration status +CREG
///
/// Configures the network registration information. Depending on the <n>
/// parameter value a URC can be issued on changes of the circuit switched
/// registration status or of the network cell.
#[derive(Clone, AtatCmd)]
#[at_cmd("+CREG", NoResponse)]
pub struct SetNetworkRegistrationStatus {
    #[at_arg(position = 0)]
    pub n: NetworkRegistrationUrcConfig,
}

/// 7.14 Network registration status +CREG
#[derive(Clone, AtatCmd)]
#[at_cmd("+CREG?", NetworkRegistrationStatus)]
pub struct GetNetworkRegistrationStatus;

/// 7.7 Radio Access technology (RAT) selection +URAT
///
/// Forces the selection of the Radio Access Technology (RAT) in the
/// protocol stack.
#[derive(Clone, AtatCmd)]
#[at_cmd("+URAT", NoResponse, timeout_ms = 10000)]
pub struct SetRadioAccessTechnology {
    #[at_arg(position = 0)]
    pub selected_act: RatSelection,
}

impl OperatorInfo {
    /// Parse the inside of one `(<stat>,"long","short","numeric"[,<AcT>])`
    /// tuple.
    fn parse(tuple: &[u8]) -> Option<Self> {
        let mut it = lines::fields(tuple);
        let stat = core::str::from_utf8(it.next()?).ok()?.parse().ok()?;
        let long = quoted::<24>(it.next()?)?;
        let short = quoted::<10>(it.next()?)?;
        let numeric = quoted::<6>(it.next()?)?;
        let act = match it.next() {
            Some(f) if !f.is_empty() => Some(core::str::from_utf8(f).ok()?.parse().ok()?),
            _ => None,
        };
        Some(Self {
            stat,
            long,
            short,
            numeric,
            act,
        })
    }
}

fn quoted<const N: usize>(field: &[u8]) -> Option<String<N>> {
    let s = core::str::from_utf8(lines::unquote(field)).ok()?;
    String::try_from(s).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use atat::serde_at::from_str;

    #[test]
    fn parse_operator_scan() {
        let resp = b"+COPS: (2,\"Telia, SE\",\"TELIA\",\"24001\",7),(1,\"Tele2\",\"TELE2\",\"24007\"),,(0-4),(0-2)";
        let list = ScanOperators.parse(Ok(&resp[..])).unwrap();

        assert_eq!(list.operators.len(), 2);
        assert_eq!(list.operators[0].stat, 2);
        assert_eq!(list.operators[0].long.as_str(), "Telia, SE");
        assert_eq!(list.operators[0].numeric.as_str(), "24001");
        assert_eq!(list.operators[0].act, Some(7));
        assert_eq!(list.operators[1].short.as_str(), "TELE2");
        assert_eq!(list.operators[1].act, None);
    }

    #[test]
    fn parse_empty_operator_scan() {
        let list = ScanOperators.parse(Ok(&b"+COPS: ,,(0-4),(0-2)"[..])).unwrap();
        assert!(list.operators.is_empty());
    }

    #[test]
    fn parse_signal_quality() {
        let res: SignalQuality = from_str("+CSQ: 17,99").unwrap();
        assert_eq!(res.rssi, 17);
        assert_eq!(res.ber, 99);
    }

    #[test]
    fn parse_registration_status() {
        let res: NetworkRegistrationStatus = from_str("+CREG: 2,1,\"00C3\",\"A13F\",2").unwrap();
        assert_eq!(res.stat, 1);
        assert_eq!(res.lac.as_deref(), Some("00C3"));
        assert_eq!(res.ci.as_deref(), Some("A13F"));
        assert_eq!(res.act, Some(2));

        let res: NetworkRegistrationStatus = from_str("+CREG: 0,3").unwrap();
        assert_eq!(res.stat, 3);
        assert_eq!(res.ci, None);
    }
}
